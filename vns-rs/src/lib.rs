//! `vns`: a tag-based visual novel script engine.
//!
//! [`script`] turns script text into a command queue and drives a host
//! [`script::Executor`]; [`expr`] is the embedded expression language used
//! by `var`, `if`, `eval` and `embed`.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod console;
pub mod expr;
pub mod logger;
pub mod scan;
pub mod script;
