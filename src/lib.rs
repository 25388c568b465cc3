pub mod eval;
pub mod lex;
pub mod number;
pub mod repl;

pub use eval::{EvalError, Evaluator, evaluate};
pub use lex::Lexer;
pub use number::Number;
