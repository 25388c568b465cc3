use std::fmt::Display;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::eval::Op;

#[derive(Error, Debug, Diagnostic)]
pub enum ParseError {
    #[error("Unexpected character '{token}' in input")]
    #[diagnostic(help("only digits, whitespace and the operators `+ - * /` are allowed"))]
    UnexpectedCharacter {
        #[source_code]
        src: NamedSource<String>,

        #[label("this character")]
        bad_bit: SourceSpan,

        token: char,
    },

    #[error("Expected {expected}, found {found}")]
    #[diagnostic(help("an expression alternates integers and operators, like `12 + 3 * 4`"))]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,

        #[label("here")]
        bad_bit: SourceSpan,

        expected: TokenKind,
        found: TokenKind,
    },

    #[error("Integer literal `{literal}` is too large")]
    #[diagnostic(help("integer literals must fit in a signed 64-bit integer"))]
    IntegerOverflow {
        #[source_code]
        src: NamedSource<String>,

        #[label("this numeric literal")]
        bad_bit: SourceSpan,

        literal: String,
    },
}

impl ParseError {
    /// Byte offset of the offending input.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnexpectedCharacter { bad_bit, .. }
            | ParseError::UnexpectedToken { bad_bit, .. }
            | ParseError::IntegerOverflow { bad_bit, .. } => bad_bit.offset(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    /// Only present on `Integer` tokens.
    pub value: Option<i64>,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Integer,
    Plus,
    Minus,
    Multiply,
    Divide,
    EndOfInput,
}

impl TokenKind {
    pub fn operator(self) -> Option<Op> {
        match self {
            TokenKind::Plus => Some(Op::Plus),
            TokenKind::Minus => Some(Op::Minus),
            TokenKind::Multiply => Some(Op::Multiply),
            TokenKind::Divide => Some(Op::Divide),
            TokenKind::Integer | TokenKind::EndOfInput => None,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Integer => write!(f, "an integer"),
            TokenKind::Plus => write!(f, "`+`"),
            TokenKind::Minus => write!(f, "`-`"),
            TokenKind::Multiply => write!(f, "`*`"),
            TokenKind::Divide => write!(f, "`/`"),
            TokenKind::EndOfInput => write!(f, "end of input"),
        }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal;
        match (self.kind, self.value) {
            (TokenKind::Integer, Some(n)) => write!(f, "INTEGER {lit} {n}"),
            (TokenKind::Integer, None) => write!(f, "INTEGER {lit} null"),
            (TokenKind::Plus, _) => write!(f, "PLUS {lit} null"),
            (TokenKind::Minus, _) => write!(f, "MINUS {lit} null"),
            (TokenKind::Multiply, _) => write!(f, "MULTIPLY {lit} null"),
            (TokenKind::Divide, _) => write!(f, "DIVIDE {lit} null"),
            (TokenKind::EndOfInput, _) => write!(f, "EOF {lit} null"),
        }
    }
}

pub struct Lexer<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    byte: usize,
    /// `None` once `byte` has reached the end of `whole`.
    current: Option<char>,
    finished: bool,
}

impl<'de> Lexer<'de> {
    pub fn new(filename: Option<&'de str>, input: &'de str) -> Self {
        Lexer {
            filename,
            whole: input,
            byte: 0,
            current: input.chars().next(),
            finished: false,
        }
    }

    pub fn current(&self) -> Option<char> {
        self.current
    }

    pub fn byte(&self) -> usize {
        self.byte
    }

    pub(crate) fn source(&self) -> NamedSource<String> {
        NamedSource::new(self.filename.unwrap_or("<input>"), self.whole.to_string())
    }

    pub fn advance(&mut self) {
        if let Some(c) = self.current {
            self.byte += c.len_utf8();
            self.current = self.whole[self.byte..].chars().next();
        }
    }

    pub fn skip_whitespace(&mut self) {
        while self.current.is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Must be called with the cursor on a digit.
    pub fn read_integer(&mut self) -> Result<i64, ParseError> {
        let start = self.byte;
        while self.current.is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let literal = &self.whole[start..self.byte];
        // the literal is all digits, so the only way to fail is overflow
        literal.parse().map_err(|_| ParseError::IntegerOverflow {
            src: self.source(),
            bad_bit: SourceSpan::from(start..self.byte),
            literal: literal.to_string(),
        })
    }

    pub fn next_token(&mut self) -> Result<Token<'de>, ParseError> {
        loop {
            let start = self.byte;
            let Some(c) = self.current else {
                return Ok(Token {
                    kind: TokenKind::EndOfInput,
                    literal: "",
                    value: None,
                    offset: start,
                });
            };

            let kind = match c {
                c if c.is_whitespace() => {
                    self.skip_whitespace();
                    continue;
                }
                '0'..='9' => {
                    let value = self.read_integer()?;
                    return Ok(Token {
                        kind: TokenKind::Integer,
                        literal: &self.whole[start..self.byte],
                        value: Some(value),
                        offset: start,
                    });
                }
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Multiply,
                '/' => TokenKind::Divide,
                c => {
                    return Err(ParseError::UnexpectedCharacter {
                        src: self.source(),
                        bad_bit: SourceSpan::from(start..start + c.len_utf8()),
                        token: c,
                    });
                }
            };

            self.advance();
            return Ok(Token {
                kind,
                literal: &self.whole[start..self.byte],
                value: None,
                offset: start,
            });
        }
    }
}

/// Yields every token up to and including `EndOfInput`, or up to the first error.
impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if !matches!(token, Ok(Token { kind, .. }) if kind != TokenKind::EndOfInput) {
            self.finished = true;
        }
        Some(token)
    }
}
