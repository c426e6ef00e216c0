//! The outer script language: text, labels and tags.
//!
//! Script text flows through [`lexer`] → [`parser`] → [`queue::CommandQueue`]
//! → [`interp::Interpreter`], which calls a host [`interp::Executor`].
//!
//! # Quick start
//!
//! ```rust
//! use vns::script::{Executor, Interpreter, Interrupt};
//!
//! #[derive(Default)]
//! struct Collect(String);
//!
//! impl Executor for Collect {
//!     fn print_text(&mut self, text: &str) -> Result<(), Interrupt> {
//!         self.0.push_str(text);
//!         Ok(())
//!     }
//!     fn start_new_line(&mut self) -> Result<(), Interrupt> {
//!         self.0.push('\n');
//!         Ok(())
//!     }
//!     fn wait_any_key(&mut self) -> Result<(), Interrupt> { Ok(()) }
//!     fn start_new_page(&mut self) -> Result<(), Interrupt> { Ok(()) }
//!     fn wait_time(&mut self, _millis: i32) -> Result<(), Interrupt> { Ok(()) }
//!     fn indent(&mut self, _count: u32) -> Result<(), Interrupt> { Ok(()) }
//! }
//!
//! let mut interp = Interpreter::new();
//! let mut out = Collect::default();
//! interp.execute("[var n=6]n is [embed exp=n][r]", &mut out).unwrap();
//! assert_eq!(out.0, "n is 6\n");
//! ```

pub mod command;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod queue;

pub use command::{Command, CommandKind, Font, ReferenceVariable, Rgb, Variable};
pub use interp::{Executor, Interpreter, Interrupt, RunError};
pub use lexer::SyntaxError;
pub use parser::{parse_script, ParsedScript};
pub use queue::{CommandId, CommandQueue};
