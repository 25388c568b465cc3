use std::fmt::Display;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::{
    Lexer,
    lex::{ParseError, Token, TokenKind},
    number::{ArithmeticFault, Number},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Plus => write!(f, "+"),
            Op::Minus => write!(f, "-"),
            Op::Multiply => write!(f, "*"),
            Op::Divide => write!(f, "/"),
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
#[error("Division by zero")]
#[diagnostic(help("the left-hand side `{dividend}` cannot be divided by zero"))]
pub struct DivisionByZero {
    #[source_code]
    src: NamedSource<String>,

    #[label("this divisor")]
    bad_bit: SourceSpan,

    pub dividend: Number,
}

#[derive(Error, Debug, Diagnostic)]
#[error("Arithmetic overflow in `{lhs} {op} {rhs}`")]
#[diagnostic(help("intermediate results must fit in a signed 64-bit integer or a finite float"))]
pub struct ArithmeticOverflow {
    #[source_code]
    src: NamedSource<String>,

    #[label("this operation overflows")]
    bad_bit: SourceSpan,

    pub op: Op,
    pub lhs: Number,
    pub rhs: Number,
}

#[derive(Error, Debug, Diagnostic)]
pub enum EvalError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    DivisionByZero(#[from] DivisionByZero),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Overflow(#[from] ArithmeticOverflow),
}

/// Evaluates `term (op term)*` strictly left to right, with no precedence.
pub fn evaluate(text: &str) -> Result<Number, EvalError> {
    Evaluator::new(None, text)?.expr()
}

/// Pulls tokens from its [`Lexer`] on demand and folds them into a [`Number`]
/// as they are consumed. Always holds exactly one unconsumed token.
pub struct Evaluator<'de> {
    lexer: Lexer<'de>,
    current: Token<'de>,
}

impl<'de> Evaluator<'de> {
    pub fn new(filename: Option<&'de str>, text: &'de str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(filename, text);
        let current = lexer.next_token()?;
        Ok(Evaluator { lexer, current })
    }

    pub fn current(&self) -> &Token<'de> {
        &self.current
    }

    /// Consumes the current token if it has the `expected` kind and returns it.
    pub fn eat(&mut self, expected: TokenKind) -> Result<Token<'de>, ParseError> {
        if self.current.kind != expected {
            return Err(self.mismatch(&self.current, expected));
        }
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    pub fn term(&mut self) -> Result<Number, ParseError> {
        let token = self.eat(TokenKind::Integer)?;
        token
            .value
            .map(Number::Integer)
            .ok_or_else(|| self.mismatch(&token, TokenKind::Integer))
    }

    pub fn expr(mut self) -> Result<Number, EvalError> {
        let mut result = self.term()?;

        while let Some(op) = self.current.kind.operator() {
            let kind = self.current.kind;
            let operator = self.eat(kind)?;
            let operand = self.current;
            let rhs = self.term()?;

            let lhs = result;
            result = lhs
                .apply(op, rhs)
                .map_err(|fault| self.arithmetic_error(fault, op, lhs, rhs, &operator, &operand))?;
        }

        // anything but an operator after a term must be the end
        self.eat(TokenKind::EndOfInput)?;
        Ok(result)
    }

    fn mismatch(&self, token: &Token<'de>, expected: TokenKind) -> ParseError {
        ParseError::UnexpectedToken {
            src: self.lexer.source(),
            bad_bit: SourceSpan::from(token.offset..token.offset + token.literal.len()),
            expected,
            found: token.kind,
        }
    }

    fn arithmetic_error(
        &self,
        fault: ArithmeticFault,
        op: Op,
        lhs: Number,
        rhs: Number,
        operator: &Token<'de>,
        operand: &Token<'de>,
    ) -> EvalError {
        let operand_end = operand.offset + operand.literal.len();
        match fault {
            ArithmeticFault::DivisionByZero => DivisionByZero {
                src: self.lexer.source(),
                bad_bit: SourceSpan::from(operand.offset..operand_end),
                dividend: lhs,
            }
            .into(),
            ArithmeticFault::Overflow => ArithmeticOverflow {
                src: self.lexer.source(),
                bad_bit: SourceSpan::from(operator.offset..operand_end),
                op,
                lhs,
                rhs,
            }
            .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_primes_the_first_token() {
        let evaluator = Evaluator::new(None, "  42 + 1").unwrap();
        assert_eq!(evaluator.current().kind, TokenKind::Integer);
        assert_eq!(evaluator.current().value, Some(42));
    }

    #[test]
    fn eat_advances_only_on_a_match() {
        let mut evaluator = Evaluator::new(None, "1 + 2").unwrap();
        let err = evaluator.eat(TokenKind::Plus).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken {
                expected: TokenKind::Plus,
                found: TokenKind::Integer,
                ..
            }
        ));
        assert_eq!(evaluator.current().kind, TokenKind::Integer);

        let eaten = evaluator.eat(TokenKind::Integer).unwrap();
        assert_eq!(eaten.value, Some(1));
        assert_eq!(evaluator.current().kind, TokenKind::Plus);
    }

    #[test]
    fn term_reads_an_integer() {
        let mut evaluator = Evaluator::new(None, "17").unwrap();
        assert_eq!(evaluator.term().unwrap(), Number::Integer(17));
        assert_eq!(evaluator.current().kind, TokenKind::EndOfInput);
    }

    #[test]
    fn term_rejects_an_operator() {
        let mut evaluator = Evaluator::new(None, "* 3").unwrap();
        let err = evaluator.term().unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedToken {
                expected: TokenKind::Integer,
                found: TokenKind::Multiply,
                ..
            }
        ));
        assert_eq!(err.offset(), 0);
    }

    #[test]
    fn left_to_right_without_precedence() {
        assert_eq!(evaluate("2+3*4").unwrap(), Number::Integer(20));
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), Number::Integer(3));
        assert_eq!(evaluate("1 + 2 * 3 - 4 / 2").unwrap(), Number::Float(2.5));
    }

    #[test]
    fn missing_operand_at_end() {
        let err = evaluate("2 +").unwrap_err();
        match err {
            EvalError::Parse(ParseError::UnexpectedToken {
                expected, found, ..
            }) => {
                assert_eq!(expected, TokenKind::Integer);
                assert_eq!(found, TokenKind::EndOfInput);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn adjacent_integers_are_rejected() {
        let err = evaluate("1 2").unwrap_err();
        assert!(matches!(
            err,
            EvalError::Parse(ParseError::UnexpectedToken {
                expected: TokenKind::EndOfInput,
                found: TokenKind::Integer,
                ..
            })
        ));
    }

    #[test]
    fn division_by_zero_points_at_the_divisor() {
        match evaluate("8 / 2 / 0").unwrap_err() {
            EvalError::DivisionByZero(err) => {
                assert_eq!(err.dividend, Number::Float(4.0));
                assert_eq!(err.bad_bit.offset(), 8);
                assert_eq!(err.bad_bit.len(), 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn overflow_spans_the_operation() {
        match evaluate("9223372036854775807 + 1").unwrap_err() {
            EvalError::Overflow(err) => {
                assert_eq!(err.op, Op::Plus);
                assert_eq!(err.lhs, Number::Integer(i64::MAX));
                assert_eq!(err.rhs, Number::Integer(1));
                assert_eq!(err.bad_bit.offset(), 20);
                assert_eq!(err.bad_bit.len(), 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            evaluate("2 +").unwrap_err().to_string(),
            "Expected an integer, found end of input"
        );
        assert_eq!(evaluate("5/0").unwrap_err().to_string(), "Division by zero");
        assert_eq!(
            evaluate("2&3").unwrap_err().to_string(),
            "Unexpected character '&' in input"
        );
    }
}
