//! Diagnostic message catalog.
//!
//! Every author-facing message goes through a [`Catalog`] passed to the
//! parser and interpreter, so a host can replace the English templates.
//! Templates use positional placeholders: `{0}`, `{1}`, …

use std::collections::HashMap;
use std::fmt::{self, Write as _};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    DuplicateLabel,
    EmptyLabelName,
    MissingAttribute,
    UnknownTag,
    UnknownAttribute,
    UndefinedVariable,
    UndefinedJumpTarget,
    InvalidInteger,
    InvalidBool,
    InvalidColor,
    InvalidVariableName,
    ExpressionSyntax,
    UnterminatedIf,
    MultipleElse,
    MisplacedElse,
    ElifAfterElse,
    StrayBranch,
    EvaluationFailed,
    WaitNotInteger,
    ParseSummary,
}

impl Message {
    pub fn default_template(self) -> &'static str {
        match self {
            Message::DuplicateLabel => "'{0}' is already used as label name",
            Message::EmptyLabelName => "label has no name",
            Message::MissingAttribute => "[{0}] requires attribute '{1}'",
            Message::UnknownTag => "unknown tag [{0}] ignored",
            Message::UnknownAttribute => "unknown attribute '{1}' in [{0}] ignored",
            Message::UndefinedVariable => "variable '{0}' is not defined",
            Message::UndefinedJumpTarget => "jump target '{0}' is not defined",
            Message::InvalidInteger => "attribute '{0}' expects an integer, got '{1}'",
            Message::InvalidBool => "attribute '{0}' expects true or false, got '{1}'",
            Message::InvalidColor => "attribute '{0}' expects a colour like 0xRRGGBB, got '{1}'",
            Message::InvalidVariableName => "'{0}' is not a valid variable name",
            Message::ExpressionSyntax => "syntax error in expression '{0}': {1}",
            Message::UnterminatedIf => "[if] is not closed by [endif]",
            Message::MultipleElse => "[if] has more than one [else]",
            Message::MisplacedElse => "[else] must be the last branch before [endif]",
            Message::ElifAfterElse => "[elif] cannot follow [else]",
            Message::StrayBranch => "[{0}] without a matching [if]",
            Message::EvaluationFailed => "evaluating '{0}' failed: {1}",
            Message::WaitNotInteger => "wait time '{0}' is {1}, not INTEGER",
            Message::ParseSummary => "parsed {0} commands and {1} labels",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    overrides: HashMap<Message, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the template for `msg`.
    pub fn set(&mut self, msg: Message, template: impl Into<String>) {
        self.overrides.insert(msg, template.into());
    }

    pub fn template(&self, msg: Message) -> &str {
        self.overrides
            .get(&msg)
            .map(String::as_str)
            .unwrap_or_else(|| msg.default_template())
    }

    /// Render `msg` with `args` substituted for its placeholders.
    ///
    /// A placeholder with no matching argument is left as written.
    pub fn format(&self, msg: Message, args: &[&dyn fmt::Display]) -> String {
        let template = self.template(msg);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let index = after
                .find('}')
                .and_then(|close| after[..close].parse::<usize>().ok().map(|i| (i, close)));
            match index {
                Some((i, close)) if i < args.len() => {
                    let _ = write!(out, "{}", args[i]);
                    rest = &after[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
