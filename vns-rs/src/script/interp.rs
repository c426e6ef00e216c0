//! Script interpreter.
//!
//! Owns the global variable [`Env`] for one run, parses a script into a
//! [`ParsedScript`] and drains its queue, handing presentation commands to a
//! host [`Executor`] and handling control flow itself.

use thiserror::Error;

use crate::catalog::{Catalog, Message};
use crate::expr::{self, Env, Environment, Object};
use crate::logger::{Logger, Severity};
use crate::scan::Position;

use super::command::{Command, CommandKind, Font};
use super::lexer::{self, SyntaxError};
use super::parser::{ParsedScript, Parser};
use super::queue::CommandId;

// ── Executor ──────────────────────────────────────────────────────────────────

/// Raised by an executor callback to stop the script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("interrupted: {reason}")]
pub struct Interrupt {
    pub reason: String,
}

impl Interrupt {
    pub fn new(reason: impl Into<String>) -> Self {
        Interrupt {
            reason: reason.into(),
        }
    }
}

/// Presentation callbacks implemented by the host.
///
/// Called synchronously in command order; the next command is not taken
/// from the queue until the callback returns.  Returning `Err` ends the run.
pub trait Executor {
    fn print_text(&mut self, text: &str) -> Result<(), Interrupt>;
    fn start_new_line(&mut self) -> Result<(), Interrupt>;
    fn wait_any_key(&mut self) -> Result<(), Interrupt>;
    fn start_new_page(&mut self) -> Result<(), Interrupt>;
    fn wait_time(&mut self, millis: i32) -> Result<(), Interrupt>;
    fn indent(&mut self, count: u32) -> Result<(), Interrupt>;

    /// Apply a text style; an all-unset [`Font`] restores the defaults.
    fn set_font(&mut self, _font: &Font) -> Result<(), Interrupt> {
        Ok(())
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RunError {
    #[error("syntax error at {0}")]
    Syntax(#[from] SyntaxError),
    #[error("script rejected: {errors} error(s)")]
    Rejected { errors: usize },
    #[error(transparent)]
    Interrupted(#[from] Interrupt),
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// What to do with the cursor after one command.
enum Flow {
    Next,
    /// Continue at this command.
    At(CommandId),
    /// Continue just after this command.
    After(CommandId),
}

pub struct Interpreter {
    env: Env,
    logger: Logger,
    catalog: Catalog,
    strict: bool,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_catalog(Catalog::new())
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Interpreter {
            env: Environment::new(),
            logger: Logger::new(),
            catalog,
            strict: false,
        }
    }

    /// In strict mode any Error diagnostic prevents execution.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut Logger {
        &mut self.logger
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn get_var(&self, name: &str) -> Option<Object> {
        self.env.borrow().get(name)
    }

    pub fn set_var(&mut self, name: &str, value: Object) {
        self.env.borrow_mut().set(name, value);
    }

    /// Parse `src`.  Variables already set on the interpreter count as
    /// defined.
    pub fn parse(&mut self, src: &str) -> Result<ParsedScript, SyntaxError> {
        let tokens = lexer::tokenize(src)?;
        let mut parser = Parser::new(&mut self.logger, &self.catalog);
        for name in self.env.borrow().names() {
            parser.declare(name);
        }
        Ok(parser.parse(tokens))
    }

    /// Parse and run `src`.
    ///
    /// A script with a broken `if` structure never runs; in strict mode
    /// neither does one with any Error diagnostic.
    pub fn execute(&mut self, src: &str, exec: &mut dyn Executor) -> Result<(), RunError> {
        // The logger spans every run; only this script's errors count.
        let before = self.logger.count(Severity::Error);
        let mut script = match self.parse(src) {
            Ok(s) => s,
            Err(e) => {
                self.logger.error(e.to_string(), Some(e.position()));
                return Err(e.into());
            }
        };
        let errors = self.logger.count(Severity::Error) - before;
        if script.structural_errors > 0 || (self.strict && errors > 0) {
            return Err(RunError::Rejected { errors });
        }
        self.run(&mut script, exec)
    }

    /// Drain `script`'s queue from its current cursor.
    pub fn run(&mut self, script: &mut ParsedScript, exec: &mut dyn Executor) -> Result<(), RunError> {
        log::debug!("running {} commands", script.queue.len());
        loop {
            let Some((id, _)) = script.queue.dequeue() else {
                break;
            };
            match self.step(script, id, exec)? {
                Flow::Next => {}
                Flow::At(target) => {
                    script.queue.seek(target);
                }
                Flow::After(target) => {
                    if script.queue.seek(target) {
                        script.queue.dequeue();
                    }
                }
            }
        }
        log::debug!("script finished");
        Ok(())
    }

    fn step(
        &mut self,
        script: &ParsedScript,
        id: CommandId,
        exec: &mut dyn Executor,
    ) -> Result<Flow, Interrupt> {
        let Some(cmd) = script.queue.get(id) else {
            return Ok(Flow::Next);
        };
        let at = script.position(id);
        match cmd {
            Command::PrintText { text } => exec.print_text(text)?,
            Command::NewLine => exec.start_new_line()?,
            Command::WaitKey => exec.wait_any_key()?,
            Command::NewPage => exec.start_new_page()?,
            Command::InsertIndent { count } => exec.indent(*count)?,
            Command::Font(font) => exec.set_font(font)?,
            Command::Label { name, .. } => log::trace!("passing label {name}"),

            Command::WaitTime { time } => {
                let env = &self.env;
                let catalog = &self.catalog;
                let resolved = time.resolve_with(|name| match env.borrow().get(name) {
                    Some(Object::Integer(ms)) => Ok(ms),
                    Some(other) => Err(catalog.format(Message::WaitNotInteger, &[&name, &other.type_name()])),
                    None => Err(catalog.format(Message::UndefinedVariable, &[&name])),
                });
                match resolved {
                    Ok(ms) => exec.wait_time(ms)?,
                    Err(msg) => self.logger.error(msg, at),
                }
            }

            Command::DefineVariables { variables } => {
                for var in variables {
                    if let Some(value) = self.evaluate(&var.value, at) {
                        log::debug!("{} = {value}", var.name);
                        self.env.borrow_mut().set(var.name.as_str(), value);
                    }
                }
            }

            Command::Eval { expression } => {
                self.evaluate(expression, at);
            }

            Command::Embed { expression } => {
                if let Some(value) = self.evaluate(expression, at) {
                    exec.print_text(&value.to_string())?;
                }
            }

            Command::Jump { target } => {
                let label = script.queue.find_commands(CommandKind::Label).into_iter().find(|&l| {
                    matches!(script.queue.get(l), Some(Command::Label { name, .. }) if name == target)
                });
                match label {
                    Some(l) => {
                        log::debug!("jump to {target} ({l})");
                        return Ok(Flow::At(l));
                    }
                    None => log::warn!("jump target {target} not found; continuing"),
                }
            }

            Command::If {
                expression,
                related,
            } => {
                if self.condition(expression, at) {
                    return Ok(Flow::Next);
                }
                for &branch in related {
                    match script.queue.get(branch) {
                        Some(Command::Elif { expression }) => {
                            if self.condition(expression, script.position(branch)) {
                                return Ok(Flow::After(branch));
                            }
                        }
                        Some(Command::Else | Command::EndIf) => return Ok(Flow::After(branch)),
                        _ => {}
                    }
                }
            }

            // Reached by finishing a taken branch: skip to the endif.
            Command::Elif { .. } | Command::Else => {
                if let Some(end) = owning_endif(script, id) {
                    return Ok(Flow::After(end));
                }
            }
            Command::EndIf => {}
        }
        Ok(Flow::Next)
    }

    /// Evaluate `src` in the global environment; failures are logged and
    /// yield `None`.
    fn evaluate(&mut self, src: &str, at: Option<Position>) -> Option<Object> {
        let failure = match expr::eval_str(src, &self.env) {
            Ok(Object::Error(msg)) => msg,
            Ok(value) => return Some(value),
            Err(errors) => errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        };
        let msg = self.catalog.format(Message::EvaluationFailed, &[&src, &failure]);
        self.logger.error(msg, at);
        None
    }

    /// A failed condition counts as false.
    fn condition(&mut self, src: &str, at: Option<Position>) -> bool {
        self.evaluate(src, at).is_some_and(|v| v.is_truthy())
    }
}

/// The `EndIf` closing the `if` that lists `branch` among its markers.
fn owning_endif(script: &ParsedScript, branch: CommandId) -> Option<CommandId> {
    script
        .queue
        .find_commands(CommandKind::If)
        .into_iter()
        .find_map(|id| match script.queue.get(id) {
            Some(Command::If { related, .. }) if related.contains(&branch) => related.last().copied(),
            _ => None,
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
