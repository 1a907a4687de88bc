use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::errors::{Error, Result};
use crate::expression::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::functions::Registry;
use crate::value::Value;

/// Tree-walking evaluator. Borrows the registry and the owning context's
/// global bindings for the duration of one run.
pub(crate) struct Engine<'a> {
    registry: &'a Registry,
    globals: &'a mut HashMap<String, Value>,
    steps_left: Option<u64>,
}

impl<'a> Engine<'a> {
    pub fn new(
        registry: &'a Registry,
        globals: &'a mut HashMap<String, Value>,
        step_limit: Option<u64>,
    ) -> Self {
        Self {
            registry,
            globals,
            steps_left: step_limit,
        }
    }

    /// Runs every statement, returning the value of the last one.
    pub fn run(&mut self, program: &Program) -> Result<Value> {
        let mut last = Value::Nil;
        for stmt in &program.stmts {
            last = match stmt {
                Stmt::Assign { name, expr } => {
                    let value = self.eval(expr)?;
                    self.globals.insert(name.clone(), value.clone());
                    value
                }
                Stmt::Expr(expr) => self.eval(expr)?,
            };
        }
        Ok(last)
    }

    fn charge(&mut self) -> Result<()> {
        if let Some(left) = &mut self.steps_left {
            if *left == 0 {
                return Err(Error::runtime("evaluation step budget exhausted"));
            }
            *left -= 1;
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        self.charge()?;
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval(item)?);
                }
                Ok(Value::Array(out))
            }
            Expr::Hash(pairs) => {
                let mut out = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    out.push((self.eval(k)?, self.eval(v)?));
                }
                Ok(Value::Hash(out))
            }
            Expr::Var(name) => self
                .globals
                .get(name)
                .cloned()
                .ok_or_else(|| Error::runtime(format!("undefined variable '{name}'"))),
            Expr::Call { name, args } => self.call(name, args),
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                index_value(&target, &index)
            }
            Expr::Unary { op, expr } => {
                let value = self.eval(expr)?;
                unary(*op, value)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                binary(*op, lhs, rhs)
            }
            Expr::And { lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                if lhs.is_truthy() {
                    self.eval(rhs)
                } else {
                    Ok(lhs)
                }
            }
            Expr::Or { lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.eval(rhs)
                }
            }
        }
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<Value> {
        let func = self
            .registry
            .get(name)
            .ok_or_else(|| Error::runtime(format!("undefined function '{name}'")))?;
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg)?);
        }
        if !func.arity().contains(&values.len()) {
            return Err(Error::runtime(format!(
                "wrong number of arguments for '{name}' (given {}, expected {})",
                values.len(),
                fmt_arity(func.arity())
            )));
        }
        func.call(&values)
    }
}

fn fmt_arity(arity: RangeInclusive<usize>) -> String {
    let (start, end) = (*arity.start(), *arity.end());
    if start == end {
        start.to_string()
    } else if end == usize::MAX {
        format!("{start}+")
    } else {
        format!("{start}..{end}")
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => match value {
            Value::Fixnum(n) => n
                .checked_neg()
                .map(Value::Fixnum)
                .ok_or_else(|| Error::runtime("integer overflow in '-'")),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(Error::runtime(format!(
                "cannot negate a {}",
                other.value_type()
            ))),
        },
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ord = compare(&lhs, &rhs).ok_or_else(|| {
                Error::runtime(format!(
                    "comparison of {} with {} failed",
                    lhs.value_type(),
                    rhs.value_type()
                ))
            })?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ord == Ordering::Less,
                BinaryOp::Le => ord != Ordering::Greater,
                BinaryOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        BinaryOp::Add => add(lhs, rhs),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => arith(op, lhs, rhs),
    }
}

fn add(lhs: Value, rhs: Value) -> Result<Value> {
    match (&lhs, &rhs) {
        (Value::Fixnum(a), Value::Fixnum(b)) => a
            .checked_add(*b)
            .map(Value::Fixnum)
            .ok_or_else(|| Error::runtime("integer overflow in '+'")),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::Array(a), Value::Array(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            Ok(Value::Array(out))
        }
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => Ok(Value::Float(a + b)),
            _ => Err(no_operator("+", &lhs, &rhs)),
        },
    }
}

fn arith(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
    let sym = match op {
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        _ => "%",
    };
    if let (Value::Fixnum(a), Value::Fixnum(b)) = (&lhs, &rhs) {
        let (a, b) = (*a, *b);
        if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
            return Err(Error::runtime("divided by 0"));
        }
        // Integer division floors, like the modulo that pairs with it.
        let result = match op {
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => a.checked_div_euclid(b),
            _ => a.checked_rem_euclid(b),
        };
        return result
            .map(Value::Fixnum)
            .ok_or_else(|| Error::runtime(format!("integer overflow in '{sym}'")));
    }
    match (lhs.as_number(), rhs.as_number()) {
        (Some(a), Some(b)) => Ok(Value::Float(match op {
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            _ => a % b,
        })),
        _ => Err(no_operator(sym, &lhs, &rhs)),
    }
}

fn no_operator(sym: &str, lhs: &Value, rhs: &Value) -> Error {
    Error::runtime(format!(
        "no '{sym}' operator between {} and {}",
        lhs.value_type(),
        rhs.value_type()
    ))
}

fn index_value(target: &Value, index: &Value) -> Result<Value> {
    match (target, index) {
        (Value::Array(items), Value::Fixnum(i)) => {
            let len = items.len() as i64;
            let i = if *i < 0 { *i + len } else { *i };
            if i < 0 || i >= len {
                Ok(Value::Nil)
            } else {
                Ok(items[i as usize].clone())
            }
        }
        (Value::Hash(pairs), key) => Ok(pairs
            .iter()
            .find(|(k, _)| values_equal(k, key))
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Nil)),
        _ => Err(Error::runtime(format!(
            "cannot index {} with {}",
            target.value_type(),
            index.value_type()
        ))),
    }
}

/// Structural equality with numeric promotion: `1 == 1.0` holds, hashes
/// compare without regard to pair order.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Hash(xs), Value::Hash(ys)) => {
            xs.len() == ys.len()
                && xs.iter().all(|(k, v)| {
                    ys.iter()
                        .any(|(k2, v2)| values_equal(k, k2) && values_equal(v, v2))
                })
        }
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

/// Ordering is defined for number pairs (with promotion) and string pairs.
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Value::Str(x), Value::Str(y)) = (a, b) {
        return Some(x.cmp(y));
    }
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::parse_program;
    use pretty_assertions::assert_eq;

    fn eval(src: &str) -> Result<Value> {
        let program = parse_program(src)?;
        let registry = Registry::with_builtins();
        let mut globals = HashMap::new();
        Engine::new(&registry, &mut globals, None).run(&program)
    }

    fn eval_ok(src: &str) -> Value {
        eval(src).unwrap()
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(eval_ok("1 + 2"), Value::Fixnum(3));
        assert_eq!(eval_ok("1 + 2 * 3"), Value::Fixnum(7));
        assert_eq!(eval_ok("(1 + 2) * 3"), Value::Fixnum(9));
        assert_eq!(eval_ok("1 + 2.5"), Value::Float(3.5));
        assert_eq!(eval_ok("-3 * -2"), Value::Fixnum(6));
        assert_eq!(eval_ok("10 % 3"), Value::Fixnum(1));
    }

    #[test]
    fn integer_division_floors() {
        assert_eq!(eval_ok("7 / 2"), Value::Fixnum(3));
        assert_eq!(eval_ok("-7 / 2"), Value::Fixnum(-4));
        assert_eq!(eval_ok("-7 % 2"), Value::Fixnum(1));
    }

    #[test]
    fn division_by_integer_zero_fails() {
        let err = eval("1 / 0").unwrap_err();
        assert_eq!(err.to_string(), "runtime error: divided by 0");
        let err = eval("1 % 0").unwrap_err();
        assert_eq!(err.to_string(), "runtime error: divided by 0");
    }

    #[test]
    fn string_and_array_concat() {
        assert_eq!(eval_ok("'Hello' + ' ' + 'World'"), Value::Str("Hello World".into()));
        assert_eq!(
            eval_ok("[1] + [2, 3]"),
            Value::Array(vec![Value::Fixnum(1), Value::Fixnum(2), Value::Fixnum(3)])
        );
        let err = eval("'a' + 1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "runtime error: no '+' operator between string and fixnum"
        );
    }

    #[test]
    fn equality_promotes_numbers() {
        assert_eq!(eval_ok("1 == 1.0"), Value::Bool(true));
        assert_eq!(eval_ok("1 != 2"), Value::Bool(true));
        assert_eq!(eval_ok("[1, 'a'] == [1.0, 'a']"), Value::Bool(true));
        assert_eq!(eval_ok("'a' == :a"), Value::Bool(false));
    }

    #[test]
    fn ordering() {
        assert_eq!(eval_ok("1 < 2"), Value::Bool(true));
        assert_eq!(eval_ok("2.5 >= 2.5"), Value::Bool(true));
        assert_eq!(eval_ok("'abc' < 'abd'"), Value::Bool(true));
        let err = eval("1 < 'a'").unwrap_err();
        assert_eq!(
            err.to_string(),
            "runtime error: comparison of fixnum with string failed"
        );
    }

    #[test]
    fn logical_operators_short_circuit() {
        // The right-hand side must not run at all, or this would be an
        // undefined-function error.
        assert_eq!(eval_ok("false && boom()"), Value::Bool(false));
        assert_eq!(eval_ok("'left' || boom()"), Value::Str("left".into()));
        assert_eq!(eval_ok("nil || 'fallback'"), Value::Str("fallback".into()));
        assert_eq!(eval_ok("true && 42"), Value::Fixnum(42));
        assert_eq!(eval_ok("!nil"), Value::Bool(true));
    }

    #[test]
    fn variables_assign_and_read() {
        assert_eq!(eval_ok("x = 4\ny = x * x\ny + 1"), Value::Fixnum(17));
        let err = eval("missing").unwrap_err();
        assert_eq!(err.to_string(), "runtime error: undefined variable 'missing'");
    }

    #[test]
    fn indexing() {
        assert_eq!(eval_ok("[10, 20, 30][1]"), Value::Fixnum(20));
        assert_eq!(eval_ok("[10, 20, 30][-1]"), Value::Fixnum(30));
        assert_eq!(eval_ok("[10][5]"), Value::Nil);
        assert_eq!(eval_ok("{'a' => 1, :b => 2}[:b]"), Value::Fixnum(2));
        assert_eq!(eval_ok("{'a' => 1}['missing']"), Value::Nil);
        let err = eval("1[0]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "runtime error: cannot index fixnum with fixnum"
        );
    }

    #[test]
    fn call_arity_is_checked() {
        let err = eval("len('a', 'b')").unwrap_err();
        assert_eq!(
            err.to_string(),
            "runtime error: wrong number of arguments for 'len' (given 2, expected 1)"
        );
        let err = eval("nope(1)").unwrap_err();
        assert_eq!(err.to_string(), "runtime error: undefined function 'nope'");
    }

    #[test]
    fn step_budget_is_enforced() {
        let program = parse_program("[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]").unwrap();
        let registry = Registry::with_builtins();
        let mut globals = HashMap::new();
        let err = Engine::new(&registry, &mut globals, Some(5))
            .run(&program)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "runtime error: evaluation step budget exhausted"
        );

        let mut globals = HashMap::new();
        let ok = Engine::new(&registry, &mut globals, Some(100))
            .run(&program)
            .unwrap();
        assert!(ok.is_array());
    }
}
