use crate::errors::Result;
use crate::parser::Cursor;
use crate::value::Value;

/// A parsed script, ready to run any number of times.
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) stmts: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub(crate) enum Stmt {
    Assign { name: String, expr: Expr },
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Literal(Value),
    Array(Vec<Expr>),
    Hash(Vec<(Expr, Expr)>),
    Var(String),
    Call { name: String, args: Vec<Expr> },
    Index { target: Box<Expr>, index: Box<Expr> },
    Unary { op: UnaryOp, expr: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    // Short-circuit forms keep their own nodes so the engine can skip the
    // right-hand side entirely.
    And { lhs: Box<Expr>, rhs: Box<Expr> },
    Or { lhs: Box<Expr>, rhs: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Parses a whole script: statements separated by `;` or newline, the last
/// statement's value being the program's value. Trailing input is an error.
pub(crate) fn parse_program(source: &str) -> Result<Program> {
    let mut p = ExprParser {
        cur: Cursor::new(source),
    };
    p.parse_program()
}

struct ExprParser<'a> {
    cur: Cursor<'a>,
}

impl<'a> ExprParser<'a> {
    fn parse_program(&mut self) -> Result<Program> {
        let mut stmts = Vec::new();
        loop {
            self.cur.skip_ws_nl();
            if self.cur.eof() {
                break;
            }
            stmts.push(self.parse_stmt()?);
            self.cur.skip_ws();
            if self.cur.eof() {
                break;
            }
            if self.cur.consume_char('\n') || self.cur.consume_char(';') {
                continue;
            }
            return Err(self.cur.error("trailing input"));
        }
        Ok(Program { stmts })
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let expr = self.parse_expr()?;
        if let Expr::Var(name) = &expr {
            self.cur.skip_ws();
            // A bare `=` after an identifier makes this an assignment.
            // `==` already belongs to the expression grammar and never
            // reaches this point.
            if self.cur.peek_char() == Some('=')
                && !self.cur.peek_str("==")
                && !self.cur.peek_str("=>")
            {
                self.cur.consume_char('=');
                self.cur.skip_ws_nl();
                let rhs = self.parse_expr()?;
                return Ok(Stmt::Assign {
                    name: name.clone(),
                    expr: rhs,
                });
            }
        }
        Ok(Stmt::Expr(expr))
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        loop {
            self.cur.skip_ws();
            if self.cur.consume_str("||") {
                self.cur.skip_ws_nl();
                let rhs = self.parse_and()?;
                lhs = Expr::Or {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_comparison()?;
        loop {
            self.cur.skip_ws();
            if self.cur.consume_str("&&") {
                self.cur.skip_ws_nl();
                let rhs = self.parse_comparison()?;
                lhs = Expr::And {
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    /// Comparisons do not chain: `a < b < c` is a parse error downstream
    /// because the second `<` becomes trailing input.
    fn parse_comparison(&mut self) -> Result<Expr> {
        let lhs = self.parse_additive()?;
        self.cur.skip_ws();
        let op = if self.cur.consume_str("==") {
            BinaryOp::Eq
        } else if self.cur.consume_str("!=") {
            BinaryOp::Ne
        } else if self.cur.consume_str("<=") {
            BinaryOp::Le
        } else if self.cur.consume_str(">=") {
            BinaryOp::Ge
        } else if self.cur.peek_char() == Some('<') {
            self.cur.consume_char('<');
            BinaryOp::Lt
        } else if self.cur.peek_char() == Some('>') {
            self.cur.consume_char('>');
            BinaryOp::Gt
        } else {
            return Ok(lhs);
        };
        self.cur.skip_ws_nl();
        let rhs = self.parse_additive()?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            self.cur.skip_ws();
            let op = if self.cur.consume_char('+') {
                BinaryOp::Add
            } else if self.cur.consume_char('-') {
                BinaryOp::Sub
            } else {
                break;
            };
            self.cur.skip_ws_nl();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            self.cur.skip_ws();
            let op = if self.cur.consume_char('*') {
                BinaryOp::Mul
            } else if self.cur.peek_char() == Some('/') {
                self.cur.consume_char('/');
                BinaryOp::Div
            } else if self.cur.peek_char() == Some('%') {
                self.cur.consume_char('%');
                BinaryOp::Rem
            } else {
                break;
            };
            self.cur.skip_ws_nl();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        self.cur.skip_ws();
        if self.cur.consume_char('-') {
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(expr),
            });
        }
        if self.cur.peek_char() == Some('!') && !self.cur.peek_str("!=") {
            self.cur.consume_char('!');
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            self.cur.skip_ws();
            if self.cur.consume_char('[') {
                self.cur.skip_ws_nl();
                let index = self.parse_expr()?;
                self.cur.skip_ws_nl();
                self.cur.expect(']')?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        self.cur.skip_ws();
        match self.cur.peek_char() {
            Some('\'' | '"') => {
                let s = self.cur.parse_quoted_string()?;
                Ok(Expr::Literal(Value::Str(s)))
            }
            Some(c) if c.is_ascii_digit() => Ok(Expr::Literal(self.cur.parse_number()?)),
            Some(':') => {
                self.cur.consume_char(':');
                let name = self.cur.parse_identifier()?;
                Ok(Expr::Literal(Value::Symbol(name)))
            }
            Some('(') => {
                self.cur.consume_char('(');
                self.cur.skip_ws_nl();
                let expr = self.parse_expr()?;
                self.cur.skip_ws_nl();
                self.cur.expect(')')?;
                Ok(expr)
            }
            Some('[') => self.parse_array_literal(),
            Some('{') => self.parse_hash_literal(),
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {
                let name = self.cur.parse_identifier()?;
                match name.as_str() {
                    "true" => return Ok(Expr::Literal(Value::Bool(true))),
                    "false" => return Ok(Expr::Literal(Value::Bool(false))),
                    "nil" => return Ok(Expr::Literal(Value::Nil)),
                    _ => {}
                }
                if self.cur.peek_char() == Some('(') {
                    self.cur.consume_char('(');
                    let args = self.parse_call_args()?;
                    self.cur.expect(')')?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Some(c) => Err(self.cur.error(format!("unexpected character '{c}'"))),
            None => Err(self.cur.error("expression expected")),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        self.cur.skip_ws_nl();
        if self.cur.peek_char() == Some(')') {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            self.cur.skip_ws_nl();
            if self.cur.consume_char(',') {
                self.cur.skip_ws_nl();
                continue;
            }
            break;
        }
        Ok(args)
    }

    fn parse_array_literal(&mut self) -> Result<Expr> {
        self.cur.consume_char('[');
        let mut items = Vec::new();
        self.cur.skip_ws_nl();
        if self.cur.consume_char(']') {
            return Ok(Expr::Array(items));
        }
        loop {
            items.push(self.parse_expr()?);
            self.cur.skip_ws_nl();
            if self.cur.consume_char(',') {
                self.cur.skip_ws_nl();
                // trailing comma
                if self.cur.peek_char() == Some(']') {
                    break;
                }
                continue;
            }
            break;
        }
        self.cur.expect(']')?;
        Ok(Expr::Array(items))
    }

    fn parse_hash_literal(&mut self) -> Result<Expr> {
        self.cur.consume_char('{');
        let mut pairs = Vec::new();
        self.cur.skip_ws_nl();
        if self.cur.consume_char('}') {
            return Ok(Expr::Hash(pairs));
        }
        loop {
            let key = self.parse_expr()?;
            self.cur.skip_ws_nl();
            if !self.cur.consume_str("=>") {
                return Err(self.cur.error("expected '=>' in hash literal"));
            }
            self.cur.skip_ws_nl();
            let value = self.parse_expr()?;
            pairs.push((key, value));
            self.cur.skip_ws_nl();
            if self.cur.consume_char(',') {
                self.cur.skip_ws_nl();
                if self.cur.peek_char() == Some('}') {
                    break;
                }
                continue;
            }
            break;
        }
        self.cur.expect('}')?;
        Ok(Expr::Hash(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_program_parses() {
        let program = parse_program("  \n\n ").unwrap();
        assert_eq!(program.stmts.len(), 0);
    }

    #[test]
    fn statements_split_on_newline_and_semicolon() {
        let program = parse_program("a = 1; b = 2\na + b").unwrap();
        assert_eq!(program.stmts.len(), 3);
    }

    #[test]
    fn trailing_input_is_rejected() {
        let err = parse_program("1 + 2 )").unwrap_err();
        assert_eq!(err.to_string(), "parse error: line 1: trailing input");
    }

    #[test]
    fn errors_carry_the_failing_line() {
        let err = parse_program("a = 1\nb = 'unterminated").unwrap_err();
        assert_eq!(err.to_string(), "parse error: line 2: unterminated string");

        let err = parse_program("x = [1,\n2,\n(]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error: line 3: unexpected character ']'"
        );
    }

    #[test]
    fn hash_literal_requires_arrow() {
        let err = parse_program("{'a': 1}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error: line 1: expected '=>' in hash literal"
        );
    }

    #[test]
    fn brackets_may_span_lines() {
        parse_program("[1,\n 2,\n 3]").unwrap();
        parse_program("{'a' => 1,\n 'b' => 2}").unwrap();
        parse_program("len(\n  'abc'\n)").unwrap();
    }
}
