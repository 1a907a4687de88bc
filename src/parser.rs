use crate::errors::Error;
use crate::value::Value;

/// Low-level cursor over source text. Tracks the current line (1-based) so
/// failures can point at the offending line.
pub(crate) struct Cursor<'a> {
    s: &'a str,
    i: usize,
    line: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0, line: 1 }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn peek_str(&self, lit: &str) -> bool {
        self.s[self.i..].starts_with(lit)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.i += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn consume_str(&mut self, lit: &str) -> bool {
        if self.peek_str(lit) {
            for _ in lit.chars() {
                self.bump();
            }
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, c: char) -> Result<(), Error> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    /// Skips spaces and tabs. Newlines stay put so statement boundaries
    /// remain visible to the grammar.
    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == ' ' || c == '\t' || c == '\r' {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Skips all whitespace including newlines. Used inside brackets and
    /// after separators, where a line break cannot end a statement.
    pub fn skip_ws_nl(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    pub fn parse_identifier(&mut self) -> Result<String, Error> {
        match self.peek_char() {
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
            _ => return Err(self.error("identifier expected")),
        }
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '_' || c.is_ascii_alphanumeric() {
                self.bump();
            } else {
                break;
            }
        }
        Ok(self.s[start..self.i].to_string())
    }

    /// Parses an unsigned integer or float literal into a [`Value`].
    /// Leading signs belong to the grammar, not the literal.
    pub fn parse_number(&mut self) -> Result<Value, Error> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.bump();
            } else {
                break;
            }
        }
        if self.i == start {
            return Err(self.error("number expected"));
        }
        let mut is_float = false;
        if self.peek_char() == Some('.') {
            // Only consume the dot when a digit follows; `1.upto` style
            // method syntax is not part of this grammar anyway, but a bare
            // trailing dot should be a clean error at the caller.
            let after_dot = self.s[self.i + 1..].chars().next();
            if matches!(after_dot, Some(d) if d.is_ascii_digit()) {
                is_float = true;
                self.bump();
                while let Some(c) = self.peek_char() {
                    if c.is_ascii_digit() {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }
        let text = &self.s[start..self.i];
        if is_float {
            let f: f64 = text
                .parse()
                .map_err(|_| self.error(format!("bad float literal '{text}'")))?;
            Ok(Value::Float(f))
        } else {
            let n: i64 = text
                .parse()
                .map_err(|_| self.error(format!("integer literal '{text}' out of range")))?;
            Ok(Value::Fixnum(n))
        }
    }

    /// Parses a single- or double-quoted string with the escape set
    /// `\n \t \r \\ \' \"`. Unknown escapes keep the backslash verbatim.
    pub fn parse_quoted_string(&mut self) -> Result<String, Error> {
        let quote = match self.peek_char() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected quoted string")),
        };
        let open_line = self.line;
        self.bump();
        let mut out = String::new();
        while let Some(c) = self.bump() {
            if c == quote {
                return Ok(out);
            }
            if c == '\\' {
                match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some('\'') => out.push('\''),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => break,
                }
            } else {
                out.push(c);
            }
        }
        Err(Error::Parse {
            line: open_line,
            message: "unterminated string".into(),
        })
    }
}
