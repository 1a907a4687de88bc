use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::value::Value;

/// A builtin callable exposed to scripts.
///
/// Arity is declared as a range; the engine rejects calls outside it before
/// `call` runs, so fixed-arity implementations may index `args` directly.
pub trait Function: Send + Sync {
    fn name(&self) -> &'static str;
    fn arity(&self) -> RangeInclusive<usize>;
    fn call(&self, args: &[Value]) -> Result<Value>;
}

/// Thread-safe, clone-cheap name → function map.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn Function>>>,
}

impl Registry {
    /// An empty registry: scripts can evaluate literals and operators but
    /// call nothing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(builtins::Len);
        registry.register(builtins::First);
        registry.register(builtins::Unique);
        registry.register(builtins::Sum);
        registry.register(builtins::Min);
        registry.register(builtins::Max);
        registry.register(builtins::Upper);
        registry.register(builtins::Lower);
        registry.register(builtins::ToS);
        registry.register(builtins::ToI);
        registry.register(builtins::ToF);
        registry.register(builtins::Inspect);
        registry
    }

    /// Registers a function, replacing any existing one with the same name.
    pub fn register<F: Function + 'static>(&mut self, f: F) {
        let map = Arc::make_mut(&mut self.inner);
        map.insert(f.name(), Arc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.inner.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }
}

pub mod builtins {
    use itertools::Itertools;

    use super::*;

    fn expected(func: &str, what: &str, got: &Value) -> Error {
        Error::runtime(format!(
            "{func} expects {what}, got {}",
            got.value_type()
        ))
    }

    pub struct Len;
    impl Function for Len {
        fn name(&self) -> &'static str {
            "len"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            let n = match &args[0] {
                Value::Str(s) => s.chars().count(),
                Value::Array(a) => a.len(),
                Value::Hash(h) => h.len(),
                other => return Err(expected("len", "a string, array, or hash", other)),
            };
            Ok(Value::Fixnum(n as i64))
        }
    }

    pub struct First;
    impl Function for First {
        fn name(&self) -> &'static str {
            "first"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            match &args[0] {
                Value::Array(a) => Ok(a.first().cloned().unwrap_or(Value::Nil)),
                other => Err(expected("first", "an array", other)),
            }
        }
    }

    pub struct Unique;
    impl Function for Unique {
        fn name(&self) -> &'static str {
            "unique"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            match &args[0] {
                // The literal form is a faithful identity key: it separates
                // 1 from 1.0 and from "1".
                Value::Array(a) => Ok(Value::Array(
                    a.iter().cloned().unique_by(|v| v.inspect()).collect(),
                )),
                other => Err(expected("unique", "an array", other)),
            }
        }
    }

    pub struct Sum;
    impl Function for Sum {
        fn name(&self) -> &'static str {
            "sum"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            let items = match &args[0] {
                Value::Array(a) => a,
                other => return Err(expected("sum", "an array", other)),
            };
            let mut int_total: i64 = 0;
            let mut float_total = 0.0f64;
            let mut saw_float = false;
            for item in items {
                match item {
                    Value::Fixnum(n) => {
                        int_total = int_total
                            .checked_add(*n)
                            .ok_or_else(|| Error::runtime("integer overflow in 'sum'"))?;
                        float_total += *n as f64;
                    }
                    Value::Float(f) => {
                        saw_float = true;
                        float_total += f;
                    }
                    other => return Err(expected("sum", "an array of numbers", other)),
                }
            }
            if saw_float {
                Ok(Value::Float(float_total))
            } else {
                Ok(Value::Fixnum(int_total))
            }
        }
    }

    /// Shared picker for `min`/`max`. A single array argument selects over
    /// its elements; multiple arguments select over the arguments.
    fn pick(func: &'static str, args: &[Value], want_greater: bool) -> Result<Value> {
        let items: &[Value] = match args {
            [Value::Array(a)] => a.as_slice(),
            _ => args,
        };
        let mut best: Option<&Value> = None;
        for item in items {
            best = Some(match best {
                None => item,
                Some(current) => {
                    let ord = crate::engine::compare(current, item).ok_or_else(|| {
                        Error::runtime(format!(
                            "{func}: comparison of {} with {} failed",
                            current.value_type(),
                            item.value_type()
                        ))
                    })?;
                    if (ord == std::cmp::Ordering::Less) == want_greater {
                        item
                    } else {
                        current
                    }
                }
            });
        }
        Ok(best.cloned().unwrap_or(Value::Nil))
    }

    pub struct Min;
    impl Function for Min {
        fn name(&self) -> &'static str {
            "min"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=usize::MAX
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            pick("min", args, false)
        }
    }

    pub struct Max;
    impl Function for Max {
        fn name(&self) -> &'static str {
            "max"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=usize::MAX
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            pick("max", args, true)
        }
    }

    pub struct Upper;
    impl Function for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            match &args[0] {
                Value::Str(s) => Ok(Value::Str(s.to_uppercase())),
                other => Err(expected("upper", "a string", other)),
            }
        }
    }

    pub struct Lower;
    impl Function for Lower {
        fn name(&self) -> &'static str {
            "lower"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            match &args[0] {
                Value::Str(s) => Ok(Value::Str(s.to_lowercase())),
                other => Err(expected("lower", "a string", other)),
            }
        }
    }

    pub struct ToS;
    impl Function for ToS {
        fn name(&self) -> &'static str {
            "to_s"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            Ok(Value::Str(args[0].to_string()))
        }
    }

    pub struct ToI;
    impl Function for ToI {
        fn name(&self) -> &'static str {
            "to_i"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            let n = match &args[0] {
                Value::Fixnum(n) => *n,
                Value::Float(f) => *f as i64,
                Value::Str(s) => leading_i64(s),
                Value::Nil => 0,
                other => return Err(expected("to_i", "a number, string, or nil", other)),
            };
            Ok(Value::Fixnum(n))
        }
    }

    pub struct ToF;
    impl Function for ToF {
        fn name(&self) -> &'static str {
            "to_f"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            let f = match &args[0] {
                Value::Fixnum(n) => *n as f64,
                Value::Float(f) => *f,
                Value::Str(s) => leading_f64(s),
                Value::Nil => 0.0,
                other => return Err(expected("to_f", "a number, string, or nil", other)),
            };
            Ok(Value::Float(f))
        }
    }

    pub struct Inspect;
    impl Function for Inspect {
        fn name(&self) -> &'static str {
            "inspect"
        }
        fn arity(&self) -> RangeInclusive<usize> {
            1..=1
        }
        fn call(&self, args: &[Value]) -> Result<Value> {
            Ok(Value::Str(args[0].inspect()))
        }
    }

    /// Longest numeric prefix, zero when there is none.
    fn leading_i64(s: &str) -> i64 {
        let s = s.trim_start();
        let mut end = 0;
        for (i, c) in s.char_indices() {
            if (i == 0 && (c == '-' || c == '+')) || c.is_ascii_digit() {
                end = i + c.len_utf8();
            } else {
                break;
            }
        }
        s[..end].parse().unwrap_or(0)
    }

    fn leading_f64(s: &str) -> f64 {
        let s = s.trim_start();
        let mut end = 0;
        let mut seen_dot = false;
        for (i, c) in s.char_indices() {
            if i == 0 && (c == '-' || c == '+') {
                end = i + 1;
            } else if c.is_ascii_digit() {
                end = i + c.len_utf8();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                end = i + 1;
            } else {
                break;
            }
        }
        s[..end].parse().unwrap_or(0.0)
    }
}
