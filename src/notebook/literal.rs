//! Python literal parser for parameter defaults.
//!
//! Covers what a parameters cell may assign: `None`, `True`, `False`, ints
//! (decimal with `_` separators, `0x`/`0o`/`0b`), floats, strings (single,
//! double and triple quoted, `r`/`u` prefixes, adjacent concatenation),
//! lists, tuples and dicts. Inside brackets values may span lines and carry
//! `#` comments.

use thiserror::Error;

use crate::value::ParamValue;

/// Why a literal could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    /// Input ended inside a string or container; more lines may complete it.
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("{message} at column {column}")]
    Invalid { column: usize, message: String },
}

/// Parse a literal at the start of `text`. Returns the value and the rest of
/// the input after any trailing spaces.
pub fn parse_prefix(text: &str) -> Result<(ParamValue, &str), LiteralError> {
    let mut parser = Parser { src: text, pos: 0 };
    parser.skip_spaces();
    let value = parser.value()?;
    parser.skip_spaces();
    Ok((value, &text[parser.pos..]))
}

/// Parse `text` as exactly one literal.
pub fn parse_literal(text: &str) -> Result<ParamValue, LiteralError> {
    let (value, rest) = parse_prefix(text)?;
    if rest.trim().is_empty() {
        Ok(value)
    } else {
        Err(LiteralError::Invalid {
            column: text.len() - rest.len() + 1,
            message: "unexpected trailing input".into(),
        })
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn invalid<T>(&self, message: impl Into<String>) -> Result<T, LiteralError> {
        Err(LiteralError::Invalid {
            column: self.pos + 1,
            message: message.into(),
        })
    }

    fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }

    /// Whitespace, newlines and comments; only valid inside brackets.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('\\') if self.rest()[1..].starts_with('\n') => self.pos += 2,
                Some('#') => {
                    let line_end = self.rest().find('\n').unwrap_or(self.rest().len());
                    self.pos += line_end;
                }
                _ => return,
            }
        }
    }

    fn value(&mut self) -> Result<ParamValue, LiteralError> {
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('[') => {
                self.bump();
                self.sequence(']').map(ParamValue::List)
            }
            Some('(') => {
                self.bump();
                self.parenthesized()
            }
            Some('{') => {
                self.bump();
                self.mapping()
            }
            Some('"' | '\'') => self.strings(),
            Some(c) if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.word(),
            Some(c) => self.invalid(format!("unexpected character '{c}'")),
        }
    }

    fn word(&mut self) -> Result<ParamValue, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        let word = &self.src[start..self.pos];
        match (word, self.peek()) {
            ("None", _) => Ok(ParamValue::Null),
            ("True", _) => Ok(ParamValue::Bool(true)),
            ("False", _) => Ok(ParamValue::Bool(false)),
            ("r" | "R" | "u" | "U", Some('"' | '\'')) => {
                self.pos = start;
                self.strings()
            }
            _ => {
                self.pos = start;
                self.invalid(format!("`{word}` is not a literal"))
            }
        }
    }

    fn number(&mut self) -> Result<ParamValue, LiteralError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };
        self.skip_spaces();

        let body_start = self.pos;
        let radix = match self.rest().get(..2).map(str::to_ascii_lowercase).as_deref() {
            Some("0x") => 16,
            Some("0o") => 8,
            Some("0b") => 2,
            _ => 10,
        };

        if radix != 10 {
            self.pos += 2;
            let digits_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
                self.bump();
            }
            let digits = self.src[digits_start..self.pos].replace('_', "");
            return match i64::from_str_radix(&digits, radix) {
                Ok(v) => Ok(ParamValue::Int(if negative { -v } else { v })),
                Err(_) => {
                    self.pos = start;
                    self.invalid("invalid integer literal")
                }
            };
        }

        let mut is_float = false;
        let mut prev = None;
        while let Some(c) = self.peek() {
            let accept = match c {
                '0'..='9' | '_' => true,
                '.' | 'e' | 'E' => {
                    is_float = true;
                    true
                }
                '+' | '-' => matches!(prev, Some('e' | 'E')),
                _ => false,
            };
            if !accept {
                break;
            }
            prev = Some(c);
            self.bump();
        }

        let text = self.src[body_start..self.pos].replace('_', "");
        if text.is_empty() || text == "." {
            self.pos = start;
            return self.invalid("expected a number");
        }
        if is_float {
            match text.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(ParamValue::Float(if negative { -v } else { v })),
                _ => {
                    self.pos = start;
                    self.invalid("invalid float literal")
                }
            }
        } else {
            let signed = if negative { format!("-{text}") } else { text };
            match signed.parse::<i64>() {
                Ok(v) => Ok(ParamValue::Int(v)),
                Err(_) => {
                    self.pos = start;
                    self.invalid("integer literal out of range")
                }
            }
        }
    }

    /// One string literal, or several adjacent ones concatenated.
    fn strings(&mut self) -> Result<ParamValue, LiteralError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_spaces();
            match self.peek() {
                Some('"' | '\'') => out.push_str(&self.string()?),
                Some('r' | 'R' | 'u' | 'U')
                    if matches!(self.rest()[1..].chars().next(), Some('"' | '\'')) =>
                {
                    out.push_str(&self.string()?)
                }
                _ => {
                    self.pos = save;
                    return Ok(ParamValue::Str(out));
                }
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let mut raw = false;
        if let Some(c @ ('r' | 'R' | 'u' | 'U')) = self.peek() {
            raw = matches!(c, 'r' | 'R');
            self.bump();
        }
        let Some(quote) = self.bump() else {
            return Err(LiteralError::UnexpectedEnd);
        };
        let triple = self.rest().starts_with(&format!("{quote}{quote}"));
        if triple {
            self.pos += 2;
        }

        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(LiteralError::UnexpectedEnd);
            };
            match c {
                c if c == quote => {
                    if !triple {
                        return Ok(out);
                    }
                    if self.rest().starts_with(&format!("{quote}{quote}")) {
                        self.pos += 2;
                        return Ok(out);
                    }
                    out.push(c);
                }
                '\n' if !triple => return self.invalid("unterminated string literal"),
                '\\' if raw => {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                }
                '\\' => self.escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let Some(c) = self.bump() else {
            return Err(LiteralError::UnexpectedEnd);
        };
        match c {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, len: usize) -> Result<char, LiteralError> {
        let Some(digits) = self.rest().get(..len) else {
            return self.invalid("truncated escape sequence");
        };
        let code = u32::from_str_radix(digits, 16).ok().and_then(char::from_u32);
        match code {
            Some(c) => {
                self.pos += len;
                Ok(c)
            }
            None => self.invalid("invalid escape sequence"),
        }
    }

    /// Comma-separated values up to `close`; a trailing comma is allowed.
    fn sequence(&mut self, close: char) -> Result<Vec<ParamValue>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_trivia();
            match self.bump() {
                Some(',') => {}
                Some(c) if c == close => return Ok(items),
                Some(c) => {
                    self.pos -= c.len_utf8();
                    return self.invalid(format!("expected ',' or '{close}'"));
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    /// `()` and `(a, ...)` are tuples; `(a)` is just `a`.
    fn parenthesized(&mut self) -> Result<ParamValue, LiteralError> {
        self.skip_trivia();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(ParamValue::List(Vec::new()));
        }
        let first = self.value()?;
        self.skip_trivia();
        match self.bump() {
            Some(')') => Ok(first),
            Some(',') => {
                let mut items = vec![first];
                items.extend(self.sequence(')')?);
                Ok(ParamValue::List(items))
            }
            Some(c) => {
                self.pos -= c.len_utf8();
                self.invalid("expected ',' or ')'")
            }
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn mapping(&mut self) -> Result<ParamValue, LiteralError> {
        let mut entries = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(ParamValue::Mapping(entries));
            }
            let key = self.value()?;
            self.skip_trivia();
            match self.bump() {
                Some(':') => {}
                Some(',' | '}') if entries.is_empty() => {
                    return self.invalid("sets are not supported");
                }
                Some(_) => return self.invalid("expected ':'"),
                None => return Err(LiteralError::UnexpectedEnd),
            }
            self.skip_trivia();
            let value = self.value()?;
            entries.push((key, value));
            self.skip_trivia();
            match self.bump() {
                Some(',') => {}
                Some('}') => return Ok(ParamValue::Mapping(entries)),
                Some(c) => {
                    self.pos -= c.len_utf8();
                    return self.invalid("expected ',' or '}'");
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }
}
