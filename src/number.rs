use std::fmt::Display;

use crate::eval::Op;

/// Running result of an evaluation. Stays an integer until the first division.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticFault {
    DivisionByZero,
    Overflow,
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Integer(n) => n == 0,
            Number::Float(n) => n == 0.0,
        }
    }

    pub fn apply(self, op: Op, rhs: Number) -> Result<Number, ArithmeticFault> {
        match op {
            Op::Divide => {
                if rhs.is_zero() {
                    return Err(ArithmeticFault::DivisionByZero);
                }
                finite(self.as_f64() / rhs.as_f64())
            }
            Op::Plus | Op::Minus | Op::Multiply => match (self, rhs) {
                (Number::Integer(lhs), Number::Integer(rhs)) => {
                    let n = match op {
                        Op::Plus => lhs.checked_add(rhs),
                        Op::Minus => lhs.checked_sub(rhs),
                        _ => lhs.checked_mul(rhs),
                    };
                    n.map(Number::Integer).ok_or(ArithmeticFault::Overflow)
                }
                (lhs, rhs) => {
                    let (lhs, rhs) = (lhs.as_f64(), rhs.as_f64());
                    finite(match op {
                        Op::Plus => lhs + rhs,
                        Op::Minus => lhs - rhs,
                        _ => lhs * rhs,
                    })
                }
            },
        }
    }
}

fn finite(n: f64) -> Result<Number, ArithmeticFault> {
    if n.is_finite() {
        Ok(Number::Float(n))
    } else {
        Err(ArithmeticFault::Overflow)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Integer(n)
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{n}"),
            Number::Float(n) if *n == n.trunc() => write!(f, "{n}.0"),
            Number::Float(n) => write!(f, "{n}"),
        }
    }
}
