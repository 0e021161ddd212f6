//! Tokenizer for the condition language

use crate::error::ConditionError;

/// One lexical token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Predicate name or field path (`EQ`, `host.name`, `@timestamp`)
    Ident(String),
    /// Number or duration literal; the parser decides which (`42`, `-24h`)
    NumberLike(String),
    /// Quoted string literal, quotes stripped
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Not,
    AndAnd,
    OrOr,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "'{s}'"),
            Token::NumberLike(s) => write!(f, "'{s}'"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::Comma => f.write_str("','"),
            Token::Not => f.write_str("'!'"),
            Token::AndAnd => f.write_str("'&&'"),
            Token::OrOr => f.write_str("'||'"),
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '@'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | '@')
}

/// Tokenize a condition source into `(token, byte_offset)` pairs.
pub(crate) fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, ConditionError> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut chars = source.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push((Token::LParen, pos));
            }
            ')' => {
                chars.next();
                tokens.push((Token::RParen, pos));
            }
            '[' => {
                chars.next();
                tokens.push((Token::LBracket, pos));
            }
            ']' => {
                chars.next();
                tokens.push((Token::RBracket, pos));
            }
            ',' => {
                chars.next();
                tokens.push((Token::Comma, pos));
            }
            '!' => {
                chars.next();
                tokens.push((Token::Not, pos));
            }
            '&' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '&')) => {
                        chars.next();
                        tokens.push((Token::AndAnd, pos));
                    }
                    _ => return Err(ConditionError::UnexpectedChar { ch: '&', pos }),
                }
            }
            '|' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '|')) => {
                        chars.next();
                        tokens.push((Token::OrOr, pos));
                    }
                    _ => return Err(ConditionError::UnexpectedChar { ch: '|', pos }),
                }
            }
            '"' | '\'' => {
                let quote = ch;
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    if c == '\\' {
                        // Only the quote and backslash escape; regexes keep
                        // their own escapes intact.
                        match chars.next() {
                            Some((_, esc)) if esc == quote || esc == '\\' => value.push(esc),
                            Some((_, esc)) => {
                                value.push('\\');
                                value.push(esc);
                            }
                            None => break,
                        }
                    } else if c == quote {
                        closed = true;
                        break;
                    } else {
                        value.push(c);
                    }
                }
                if !closed {
                    return Err(ConditionError::UnexpectedEnd);
                }
                tokens.push((Token::Str(value), pos));
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' => {
                let start = pos;
                chars.next();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '.' {
                        chars.next();
                    } else {
                        break;
                    }
                }
                let end = chars.peek().map_or(bytes.len(), |&(p, _)| p);
                tokens.push((Token::NumberLike(source[start..end].to_string()), start));
            }
            c if is_ident_start(c) => {
                let start = pos;
                chars.next();
                while let Some(&(_, c)) = chars.peek() {
                    if is_ident_continue(c) {
                        chars.next();
                    } else {
                        break;
                    }
                }
                let end = chars.peek().map_or(bytes.len(), |&(p, _)| p);
                tokens.push((Token::Ident(source[start..end].to_string()), start));
            }
            other => return Err(ConditionError::UnexpectedChar { ch: other, pos }),
        }
    }

    Ok(tokens)
}
