//! Scanner turning source text into a token stream.
//!
//! Newlines are significant (they end statements) and come through as
//! [`TokenKind::Newline`]. Line comments start with `#` or `//`; block
//! comments `/* */` nest.

use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct LexError {
    pub message: String,
    pub line: u32,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).scan()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn scan(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(c) = self.advance() {
            match c {
                ' ' | '\t' | '\r' => {}
                '\n' => {
                    self.push(TokenKind::Newline);
                    self.line += 1;
                }
                '#' => self.line_comment(),
                '(' => self.push(TokenKind::LeftParen),
                ')' => self.push(TokenKind::RightParen),
                '{' => self.push(TokenKind::LeftBrace),
                '}' => self.push(TokenKind::RightBrace),
                '[' => self.push(TokenKind::LeftBracket),
                ']' => self.push(TokenKind::RightBracket),
                ',' => self.push(TokenKind::Comma),
                '.' => self.push(TokenKind::Dot),
                ':' => self.push(TokenKind::Colon),
                '%' => self.push(TokenKind::Percent),
                '|' => self.push(TokenKind::Pipe),
                '+' => {
                    let kind = if self.eat('=') {
                        TokenKind::PlusEqual
                    } else {
                        TokenKind::Plus
                    };
                    self.push(kind);
                }
                '-' => {
                    let kind = if self.eat('=') {
                        TokenKind::MinusEqual
                    } else {
                        TokenKind::Minus
                    };
                    self.push(kind);
                }
                '*' => {
                    let kind = if self.eat('=') {
                        TokenKind::StarEqual
                    } else {
                        TokenKind::Star
                    };
                    self.push(kind);
                }
                '/' => {
                    if self.eat('/') {
                        self.line_comment();
                    } else if self.eat('*') {
                        self.block_comment()?;
                    } else if self.eat('=') {
                        self.push(TokenKind::SlashEqual);
                    } else {
                        self.push(TokenKind::Slash);
                    }
                }
                '=' => {
                    let kind = if self.eat('=') {
                        TokenKind::EqualEqual
                    } else if self.eat('>') {
                        TokenKind::Arrow
                    } else {
                        TokenKind::Equal
                    };
                    self.push(kind);
                }
                '!' => {
                    if self.eat('=') {
                        self.push(TokenKind::BangEqual);
                    } else {
                        return Err(self.error("unexpected character `!`, use `not`"));
                    }
                }
                '<' => {
                    let kind = if self.eat('=') {
                        TokenKind::LessEqual
                    } else {
                        TokenKind::Less
                    };
                    self.push(kind);
                }
                '>' => {
                    let kind = if self.eat('=') {
                        TokenKind::GreaterEqual
                    } else {
                        TokenKind::Greater
                    };
                    self.push(kind);
                }
                '"' => self.string()?,
                c if c.is_ascii_digit() => self.number(c),
                c if c.is_alphabetic() || c == '_' => self.identifier(c),
                c => return Err(self.error(format!("unexpected character `{c}`"))),
            }
        }
        self.push(TokenKind::Eof);
        Ok(self.tokens)
    }

    fn string(&mut self) -> Result<(), LexError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error("unterminated string")),
                Some('"') => break,
                Some('\\') => {
                    let escape = self
                        .advance()
                        .ok_or_else(|| self.error("unterminated string"))?;
                    value.push(match escape {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        '\\' => '\\',
                        '"' => '"',
                        other => {
                            return Err(self.error(format!("unknown escape `\\{other}`")));
                        }
                    });
                }
                Some('\n') => {
                    self.line += 1;
                    value.push('\n');
                }
                Some(c) => value.push(c),
            }
        }
        self.push(TokenKind::Str(value));
        Ok(())
    }

    fn number(&mut self, first: char) {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.pos += 1;
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        // Only digits and at most one dot made it in, so this parses.
        let value: f64 = text.parse().unwrap_or(f64::NAN);
        self.push(TokenKind::Number(value));
    }

    fn identifier(&mut self, first: char) {
        let mut word = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier(word));
        self.push(kind);
    }

    fn line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn block_comment(&mut self) -> Result<(), LexError> {
        let mut depth = 1u32;
        while depth > 0 {
            match self.advance() {
                None => return Err(self.error("unterminated block comment")),
                Some('\n') => self.line += 1,
                Some('/') if self.eat('*') => depth += 1,
                Some('*') if self.eat('/') => depth -= 1,
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token {
            kind,
            line: self.line,
        });
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            line: self.line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn scans_assignment_line() {
        assert_eq!(
            kinds("x = 1 + 2\n"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Equal,
                TokenKind::Number(1.0),
                TokenKind::Plus,
                TokenKind::Number(2.0),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_keywords_and_identifiers() {
        assert_eq!(
            kinds("when other task give escape skip index"),
            vec![
                TokenKind::When,
                TokenKind::Other,
                TokenKind::Task,
                TokenKind::Give,
                TokenKind::Escape,
                TokenKind::Skip,
                TokenKind::Identifier("index".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_compound_operators_and_arrow() {
        assert_eq!(
            kinds("+= -= *= /= == != <= >= =>"),
            vec![
                TokenKind::PlusEqual,
                TokenKind::MinusEqual,
                TokenKind::StarEqual,
                TokenKind::SlashEqual,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Arrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_string_escapes() {
        assert_eq!(
            kinds(r#""a\tb\n\"q\"""#),
            vec![TokenKind::Str("a\tb\n\"q\"".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn scans_decimal_numbers_without_eating_method_dots() {
        assert_eq!(
            kinds("3.25 arr.len"),
            vec![
                TokenKind::Number(3.25),
                TokenKind::Identifier("arr".into()),
                TokenKind::Dot,
                TokenKind::Identifier("len".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_do_not_produce_tokens() {
        assert_eq!(
            kinds("1 # trailing\n// whole line\n/* block /* nested */ still */ 2"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Newline,
                TokenKind::Newline,
                TokenKind::Number(2.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("x = \"oops").unwrap_err();
        assert!(err.message.contains("unterminated"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn error_carries_the_line_number() {
        let err = tokenize("ok = 1\nbad = ;\n").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
