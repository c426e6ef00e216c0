//! The embedded expression language used by `exp=`, `var` and `wait` values.
//!
//! Source text flows lexer → Pratt parser → AST → tree-walking evaluator,
//! with variables held in a chain of shared [`env::Environment`] scopes.

pub mod ast;
pub mod builtins;
pub mod env;
pub mod eval;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod token;

pub use env::{Env, Environment};
pub use eval::{eval_program, eval_str};
pub use object::Object;
pub use parser::{parse, ParseError};
