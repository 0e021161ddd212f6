//! Recursive-descent parser for the condition language
//!
//! Grammar:
//!
//! ```text
//! expr   := or
//! or     := and ( '||' and )*
//! and    := unary ( '&&' unary )*
//! unary  := '!' unary | '(' expr ')' | pred
//! pred   := NAME '(' args ')'
//! ```
//!
//! The operator set is closed; anything outside it is a compile error, not
//! a general expression language.

use hauler_event::Value;
use regex::Regex;

use crate::ast::{Expr, Pred};
use crate::duration;
use crate::error::ConditionError;
use crate::lexer::{self, Token};

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;

pub(crate) fn parse(source: &str) -> Result<Expr, ConditionError> {
    let tokens = lexer::tokenize(source)?;
    let mut parser = Parser { tokens, index: 0 };
    let expr = parser.or_expr()?;
    if let Some((_, pos)) = parser.peek_with_pos() {
        return Err(ConditionError::TrailingInput { pos });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    index: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(t, _)| t)
    }

    fn peek_with_pos(&self) -> Option<(&Token, usize)> {
        self.tokens.get(self.index).map(|(t, p)| (t, *p))
    }

    fn next(&mut self) -> Result<(Token, usize), ConditionError> {
        let entry = self
            .tokens
            .get(self.index)
            .cloned()
            .ok_or(ConditionError::UnexpectedEnd)?;
        self.index += 1;
        Ok(entry)
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<(), ConditionError> {
        let (token, pos) = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(ConditionError::UnexpectedToken {
                expected: what,
                found: token.to_string(),
                pos,
            })
        }
    }

    fn or_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.and_expr()?;
        while self.peek() == Some(&Token::OrOr) {
            self.index += 1;
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.unary_expr()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.index += 1;
            let rhs = self.unary_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> Result<Expr, ConditionError> {
        match self.peek() {
            Some(Token::Not) => {
                self.index += 1;
                Ok(Expr::Not(Box::new(self.unary_expr()?)))
            }
            Some(Token::LParen) => {
                self.index += 1;
                let inner = self.or_expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            _ => self.predicate().map(Expr::Pred),
        }
    }

    fn predicate(&mut self) -> Result<Pred, ConditionError> {
        let (token, pos) = self.next()?;
        let name = match token {
            Token::Ident(name) => name,
            other => {
                return Err(ConditionError::UnexpectedToken {
                    expected: "a predicate name",
                    found: other.to_string(),
                    pos,
                });
            }
        };

        self.expect(Token::LParen, "'('")?;

        let pred = match name.as_str() {
            "EQ" => {
                let path = self.path()?;
                self.expect(Token::Comma, "','")?;
                let value = self.value()?;
                Pred::Eq { path, value }
            }
            "IN" => {
                let path = self.path()?;
                self.expect(Token::Comma, "','")?;
                let values = self.value_list()?;
                Pred::In { path, values }
            }
            "Exist" => Pred::Exist { path: self.path()? },
            "HasPrefix" => {
                let path = self.path()?;
                self.expect(Token::Comma, "','")?;
                let prefix = self.string()?;
                Pred::HasPrefix { path, prefix }
            }
            "Match" => {
                let path = self.path()?;
                self.expect(Token::Comma, "','")?;
                let pattern = self.string()?;
                let regex = Regex::new(&pattern).map_err(|source| {
                    ConditionError::InvalidRegex { pattern, source }
                })?;
                Pred::Match { path, regex }
            }
            "Before" => Pred::Before {
                offset: self.duration()?,
            },
            "After" => Pred::After {
                offset: self.duration()?,
            },
            _ => return Err(ConditionError::UnknownOperator(name)),
        };

        self.expect(Token::RParen, "')'")?;
        Ok(pred)
    }

    fn path(&mut self) -> Result<String, ConditionError> {
        let (token, pos) = self.next()?;
        match token {
            Token::Ident(path) => Ok(path),
            other => Err(ConditionError::UnexpectedToken {
                expected: "a field path",
                found: other.to_string(),
                pos,
            }),
        }
    }

    fn string(&mut self) -> Result<String, ConditionError> {
        let (token, pos) = self.next()?;
        match token {
            Token::Str(s) => Ok(s),
            other => Err(ConditionError::UnexpectedToken {
                expected: "a quoted string",
                found: other.to_string(),
                pos,
            }),
        }
    }

    fn duration(&mut self) -> Result<chrono::Duration, ConditionError> {
        let (token, pos) = self.next()?;
        match token {
            Token::NumberLike(lit) => duration::parse(&lit),
            Token::Str(lit) => duration::parse(&lit),
            other => Err(ConditionError::UnexpectedToken {
                expected: "a duration",
                found: other.to_string(),
                pos,
            }),
        }
    }

    fn value_list(&mut self) -> Result<Vec<Value>, ConditionError> {
        self.expect(Token::LBracket, "'['")?;
        let mut values = Vec::new();
        if self.peek() == Some(&Token::RBracket) {
            self.index += 1;
            return Ok(values);
        }
        loop {
            values.push(self.value()?);
            let (token, pos) = self.next()?;
            match token {
                Token::Comma => continue,
                Token::RBracket => break,
                other => {
                    return Err(ConditionError::UnexpectedToken {
                        expected: "',' or ']'",
                        found: other.to_string(),
                        pos,
                    });
                }
            }
        }
        Ok(values)
    }

    fn value(&mut self) -> Result<Value, ConditionError> {
        let (token, pos) = self.next()?;
        match token {
            Token::Str(s) => Ok(Value::String(s)),
            Token::NumberLike(lit) => {
                if let Ok(n) = lit.parse::<i64>() {
                    Ok(Value::from(n))
                } else if let Ok(f) = lit.parse::<f64>() {
                    Ok(Value::from(f))
                } else {
                    Err(ConditionError::InvalidValue(lit))
                }
            }
            Token::Ident(word) => match word.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                "null" => Ok(Value::Null),
                _ => Err(ConditionError::InvalidValue(word)),
            },
            other => Err(ConditionError::UnexpectedToken {
                expected: "a value literal",
                found: other.to_string(),
                pos,
            }),
        }
    }
}
