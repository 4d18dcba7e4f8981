//! Boolean condition evaluator for `if` steps.
//!
//! Supports `==`, `!=`, `<`, `>`, `<=`, `>=`, `&&`, `||`, and parentheses
//! over collected-data keys, numbers, quoted strings, and booleans. The
//! planner sometimes writes `data.key` instead of `key`; the prefix is
//! accepted and stripped. A malformed condition evaluates to false rather
//! than raising, so a bad planner script cannot kill a workflow.
//!
//! Precedence, loosest first: `||`, `&&`, comparison.

use std::collections::HashMap;

use serde_json::Value;

/// Evaluate a condition against collected data. Never fails: malformed
/// input evaluates to false.
pub fn evaluate(condition: &str, data: &HashMap<String, Value>) -> bool {
    match eval(condition, data) {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!(condition, error = %e, "Condition failed to evaluate; treating as false");
            false
        }
    }
}

fn eval(condition: &str, data: &HashMap<String, Value>) -> Result<bool, String> {
    let tokens = tokenize(condition)?;
    if tokens.is_empty() {
        return Err("empty condition".to_string());
    }
    let mut parser = Parser { tokens, pos: 0, data };
    let term = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("unexpected trailing token at {}", parser.pos));
    }
    Ok(term.truthy())
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Op(&'static str),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && chars[j] != quote {
                    j += 1;
                }
                if j >= chars.len() {
                    return Err("unterminated string literal".to_string());
                }
                tokens.push(Token::Str(chars[start..j].iter().collect()));
                i = j + 1;
            }
            '=' | '!' | '<' | '>' | '&' | '|' => {
                let next = chars.get(i + 1).copied();
                let op = match (c, next) {
                    ('=', Some('=')) => ("==", 2),
                    ('!', Some('=')) => ("!=", 2),
                    ('<', Some('=')) => ("<=", 2),
                    ('>', Some('=')) => (">=", 2),
                    ('&', Some('&')) => ("&&", 2),
                    ('|', Some('|')) => ("||", 2),
                    ('<', _) => ("<", 1),
                    ('>', _) => (">", 1),
                    _ => return Err(format!("unexpected character '{}'", c)),
                };
                tokens.push(Token::Op(op.0));
                i += op.1;
            }
            _ if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let num = text
                    .parse::<f64>()
                    .map_err(|_| format!("bad number '{}'", text))?;
                tokens.push(Token::Number(num));
            }
            _ if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => return Err(format!("unexpected character '{}'", c)),
        }
    }

    Ok(tokens)
}

// =============================================================================
// Parser / evaluator
// =============================================================================

/// A resolved operand value.
#[derive(Clone, Debug, PartialEq)]
enum Term {
    Num(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl Term {
    fn truthy(&self) -> bool {
        match self {
            Term::Num(n) => *n != 0.0,
            Term::Str(s) => !s.is_empty() && s != "false",
            Term::Bool(b) => *b,
            Term::Null => false,
        }
    }

    /// Numeric view, coercing numeric strings (user answers are stored as
    /// strings, so `"10" > 5` must hold).
    fn as_number(&self) -> Option<f64> {
        match self {
            Term::Num(n) => Some(*n),
            Term::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn as_text(&self) -> String {
        match self {
            Term::Num(n) => n.to_string(),
            Term::Str(s) => s.clone(),
            Term::Bool(b) => b.to_string(),
            Term::Null => String::new(),
        }
    }
}

fn from_value(value: &Value) -> Term {
    match value {
        Value::Number(n) => Term::Num(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => Term::Str(s.clone()),
        Value::Bool(b) => Term::Bool(*b),
        Value::Null => Term::Null,
        other => Term::Str(other.to_string()),
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    data: &'a HashMap<String, Value>,
}

impl Parser<'_> {
    fn peek_op(&self) -> Option<&'static str> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(op)) => Some(op),
            _ => None,
        }
    }

    fn parse_or(&mut self) -> Result<Term, String> {
        let mut left = self.parse_and()?;
        while self.peek_op() == Some("||") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Term::Bool(left.truthy() || right.truthy());
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Term, String> {
        let mut left = self.parse_comparison()?;
        while self.peek_op() == Some("&&") {
            self.pos += 1;
            let right = self.parse_comparison()?;
            left = Term::Bool(left.truthy() && right.truthy());
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Term, String> {
        let left = self.parse_primary()?;
        let op = match self.peek_op() {
            Some(op @ ("==" | "!=" | "<" | ">" | "<=" | ">=")) => op,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_primary()?;
        Ok(Term::Bool(compare(&left, op, &right)?))
    }

    fn parse_primary(&mut self) -> Result<Term, String> {
        match self.tokens.get(self.pos).cloned() {
            Some(Token::LParen) => {
                self.pos += 1;
                let term = self.parse_or()?;
                match self.tokens.get(self.pos) {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(term)
                    }
                    _ => Err("expected ')'".to_string()),
                }
            }
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Term::Num(n))
            }
            Some(Token::Str(s)) => {
                self.pos += 1;
                Ok(Term::Str(s))
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                match name.as_str() {
                    "true" => Ok(Term::Bool(true)),
                    "false" => Ok(Term::Bool(false)),
                    "null" => Ok(Term::Null),
                    _ => {
                        let key = name.strip_prefix("data.").unwrap_or(&name);
                        Ok(self.data.get(key).map_or(Term::Null, from_value))
                    }
                }
            }
            _ => Err("expected operand".to_string()),
        }
    }
}

fn compare(left: &Term, op: &str, right: &Term) -> Result<bool, String> {
    // Numeric comparison when both sides coerce; equality falls back to text.
    if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
        return Ok(match op {
            "==" => l == r,
            "!=" => l != r,
            "<" => l < r,
            ">" => l > r,
            "<=" => l <= r,
            ">=" => l >= r,
            _ => unreachable!(),
        });
    }

    match op {
        "==" => Ok(!matches!((left, right), (Term::Null, _) | (_, Term::Null)) && left.as_text() == right.as_text()),
        "!=" => Ok(matches!((left, right), (Term::Null, _) | (_, Term::Null)) || left.as_text() != right.as_text()),
        _ => Err(format!("ordering comparison '{}' needs numeric operands", op)),
    }
}

// =============================================================================
// Tests
// =============================================================================
