//! Boolean close conditions evaluated against the model.
//!
//! The default evaluator understands a small expression language:
//!
//! ```text
//! expr    := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | "(" expr ")" | operand ( ("==" | "!=") operand )?
//! operand := 'text' | "text" | number | true | false | null | dotted.path
//! ```
//!
//! A lone operand is tested for truthiness: `false`, `null`, missing paths,
//! empty strings, zero, and empty containers are false.

use fileroute_core::{Model, TemplateError};
use serde_json::Value;

/// Decides whether a resource's close condition holds.
pub trait ConditionEvaluator: Send + Sync {
    /// Evaluate `expression` against `model`.
    fn evaluate(&self, expression: &str, model: &Model) -> Result<bool, TemplateError>;
}

/// Default evaluator for the expression language above.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleConditionEvaluator;

impl ConditionEvaluator for SimpleConditionEvaluator {
    fn evaluate(&self, expression: &str, model: &Model) -> Result<bool, TemplateError> {
        let tokens = lex(expression)?;
        let mut parser = Parser {
            expression,
            tokens: &tokens,
            pos: 0,
            model,
        };
        let result = parser.or()?;
        if parser.pos != tokens.len() {
            return Err(malformed(expression, "unexpected trailing input"));
        }
        Ok(result)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Tok {
    LParen,
    RParen,
    Not,
    And,
    Or,
    Eq,
    Ne,
    Str(String),
    Num(f64),
    Ident(String),
}

fn malformed(expression: &str, reason: impl Into<String>) -> TemplateError {
    TemplateError::MalformedCondition {
        expression: expression.to_owned(),
        reason: reason.into(),
    }
}

fn lex(expression: &str) -> Result<Vec<Tok>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Tok::LParen),
            ')' => tokens.push(Tok::RParen),
            '!' => {
                if chars.next_if(|&(_, n)| n == '=').is_some() {
                    tokens.push(Tok::Ne);
                } else {
                    tokens.push(Tok::Not);
                }
            }
            '=' => {
                if chars.next_if(|&(_, n)| n == '=').is_none() {
                    return Err(malformed(expression, format!("expected '==' at offset {i}")));
                }
                tokens.push(Tok::Eq);
            }
            '&' | '|' => {
                if chars.next_if(|&(_, n)| n == c).is_none() {
                    return Err(malformed(expression, format!("expected '{c}{c}' at offset {i}")));
                }
                tokens.push(if c == '&' { Tok::And } else { Tok::Or });
            }
            '\'' | '"' => {
                let start = i + 1;
                let end = loop {
                    match chars.next() {
                        Some((j, q)) if q == c => break j,
                        Some(_) => {}
                        None => {
                            return Err(malformed(
                                expression,
                                format!("unterminated string at offset {i}"),
                            ));
                        }
                    }
                };
                tokens.push(Tok::Str(expression[start..end].to_owned()));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut end = i + c.len_utf8();
                while let Some((j, n)) = chars.next_if(|&(_, n)| n.is_ascii_digit() || n == '.') {
                    end = j + n.len_utf8();
                }
                let text = &expression[i..end];
                let number = text
                    .parse::<f64>()
                    .map_err(|_| malformed(expression, format!("invalid number '{text}'")))?;
                tokens.push(Tok::Num(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = i + c.len_utf8();
                while let Some((j, n)) =
                    chars.next_if(|&(_, n)| n.is_alphanumeric() || n == '_' || n == '.')
                {
                    end = j + n.len_utf8();
                }
                tokens.push(Tok::Ident(expression[i..end].to_owned()));
            }
            other => {
                return Err(malformed(
                    expression,
                    format!("unexpected character '{other}' at offset {i}"),
                ));
            }
        }
    }

    if tokens.is_empty() {
        return Err(malformed(expression, "empty expression"));
    }
    Ok(tokens)
}

struct Parser<'a> {
    expression: &'a str,
    tokens: &'a [Tok],
    pos: usize,
    model: &'a Model,
}

impl Parser<'_> {
    fn eat(&mut self, tok: &Tok) -> bool {
        if self.tokens.get(self.pos) == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<bool, TemplateError> {
        let mut value = self.and()?;
        while self.eat(&Tok::Or) {
            let rhs = self.and()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn and(&mut self) -> Result<bool, TemplateError> {
        let mut value = self.unary()?;
        while self.eat(&Tok::And) {
            let rhs = self.unary()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<bool, TemplateError> {
        if self.eat(&Tok::Not) {
            return Ok(!self.unary()?);
        }
        if self.eat(&Tok::LParen) {
            let value = self.or()?;
            if !self.eat(&Tok::RParen) {
                return Err(malformed(self.expression, "missing ')'"));
            }
            return Ok(value);
        }

        let lhs = self.operand()?;
        if self.eat(&Tok::Eq) {
            let rhs = self.operand()?;
            Ok(loosely_equal(&lhs, &rhs))
        } else if self.eat(&Tok::Ne) {
            let rhs = self.operand()?;
            Ok(!loosely_equal(&lhs, &rhs))
        } else {
            Ok(truthy(&lhs))
        }
    }

    fn operand(&mut self) -> Result<Value, TemplateError> {
        let Some(tok) = self.tokens.get(self.pos) else {
            return Err(malformed(self.expression, "expected an operand"));
        };
        self.pos += 1;
        match tok {
            Tok::Str(s) => Ok(Value::String(s.clone())),
            Tok::Num(n) => Ok(serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number)),
            Tok::Ident(name) => Ok(match name.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                path => self.model.lookup(path).cloned().unwrap_or(Value::Null),
            }),
            other => Err(malformed(
                self.expression,
                format!("expected an operand, found {other:?}"),
            )),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn loosely_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(s), other @ (Value::Number(_) | Value::Bool(_)))
        | (other @ (Value::Number(_) | Value::Bool(_)), Value::String(s)) => {
            other.to_string() == *s
                || (other.as_f64().is_some() && s.parse::<f64>().ok() == other.as_f64())
        }
        _ => lhs == rhs,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
