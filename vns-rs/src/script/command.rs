//! Executable script commands.
//!
//! The parser turns each label, tag and text run into one [`Command`].
//! Commands are immutable once enqueued, except that an `If` learns its
//! related branches during structural validation and a [`ReferenceVariable`]
//! fills in its value the first time it is resolved.

use std::cell::OnceCell;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::queue::CommandId;

// ── ReferenceVariable ─────────────────────────────────────────────────────────

/// A literal value, or the name of a variable resolved on first use.
///
/// Once resolved the value never changes, even if the variable does.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceVariable<T> {
    name: String,
    value: OnceCell<T>,
}

impl<T: Copy> ReferenceVariable<T> {
    pub fn literal(value: T) -> Self {
        ReferenceVariable {
            name: String::new(),
            value: OnceCell::from(value),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        ReferenceVariable {
            name: name.into(),
            value: OnceCell::new(),
        }
    }

    /// The variable name; empty for a literal.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }

    pub fn value(&self) -> Option<T> {
        self.value.get().copied()
    }

    /// The stored value, or the result of `lookup(name)` stored for next
    /// time.  A failed lookup leaves the cell unresolved.
    pub fn resolve_with<E>(&self, lookup: impl FnOnce(&str) -> Result<T, E>) -> Result<T, E> {
        if let Some(v) = self.value.get() {
            return Ok(*v);
        }
        let v = lookup(&self.name)?;
        Ok(*self.value.get_or_init(|| v))
    }
}

impl<T: Copy + fmt::Display> fmt::Display for ReferenceVariable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.value()) {
            (true, Some(v)) => write!(f, "{v}"),
            (false, Some(v)) => write!(f, "{}={v}", self.name),
            (_, None) => f.write_str(&self.name),
        }
    }
}

// ── Font ──────────────────────────────────────────────────────────────────────

static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:0[xX]|#)?([0-9A-Fa-f]{6})$").unwrap_or_else(|_| unreachable!())
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Accepts `0xRRGGBB`, `#RRGGBB` or `RRGGBB`.
    pub fn parse(s: &str) -> Option<Rgb> {
        let caps = COLOR_RE.captures(s.trim())?;
        let n = u32::from_str_radix(caps.get(1)?.as_str(), 16).ok()?;
        Some(Rgb {
            r: (n >> 16) as u8,
            g: (n >> 8) as u8,
            b: n as u8,
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Text style.  `None` fields are left as they are; an all-`None` font
/// restores the defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    pub size: Option<i32>,
    pub face: Option<String>,
    pub color: Option<Rgb>,
    pub ruby_size: Option<i32>,
    pub ruby_offset: Option<i32>,
    pub ruby_face: Option<String>,
    pub shadow: Option<bool>,
    pub shadow_color: Option<Rgb>,
    pub edge: Option<bool>,
    pub edge_color: Option<Rgb>,
    pub bold: Option<bool>,
}

impl Font {
    pub fn is_reset(&self) -> bool {
        *self == Font::default()
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reset() {
            return f.write_str("reset");
        }
        let mut parts: Vec<String> = Vec::new();
        let mut add = |key: &str, v: Option<String>| {
            if let Some(v) = v {
                parts.push(format!("{key}={v}"));
            }
        };
        add("size", self.size.map(|v| v.to_string()));
        add("face", self.face.clone());
        add("color", self.color.map(|v| v.to_string()));
        add("rubysize", self.ruby_size.map(|v| v.to_string()));
        add("rubyoffset", self.ruby_offset.map(|v| v.to_string()));
        add("rubyface", self.ruby_face.clone());
        add("shadow", self.shadow.map(|v| v.to_string()));
        add("shadowcolor", self.shadow_color.map(|v| v.to_string()));
        add("edge", self.edge.map(|v| v.to_string()));
        add("edgecolor", self.edge_color.map(|v| v.to_string()));
        add("bold", self.bold.map(|v| v.to_string()));
        f.write_str(&parts.join(" "))
    }
}

// ── Command ───────────────────────────────────────────────────────────────────

/// One `name=value` pair of a `var` tag; `value` is expression source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PrintText { text: String },
    NewLine,
    WaitKey,
    NewPage,
    InsertIndent { count: u32 },
    WaitTime { time: ReferenceVariable<i32> },
    DefineVariables { variables: Vec<Variable> },
    Jump { target: String },
    Label { name: String, headline: String },
    /// `related` lists the branch markers (`Elif`…, `Else`, `EndIf`) in
    /// order; it stays empty until the structure has been validated.
    If { expression: String, related: Vec<CommandId> },
    Elif { expression: String },
    Else,
    EndIf,
    Eval { expression: String },
    Embed { expression: String },
    Font(Font),
}

/// Fieldless mirror of [`Command`], for typed queue scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    PrintText,
    NewLine,
    WaitKey,
    NewPage,
    InsertIndent,
    WaitTime,
    DefineVariables,
    Jump,
    Label,
    If,
    Elif,
    Else,
    EndIf,
    Eval,
    Embed,
    Font,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::PrintText { .. } => CommandKind::PrintText,
            Command::NewLine => CommandKind::NewLine,
            Command::WaitKey => CommandKind::WaitKey,
            Command::NewPage => CommandKind::NewPage,
            Command::InsertIndent { .. } => CommandKind::InsertIndent,
            Command::WaitTime { .. } => CommandKind::WaitTime,
            Command::DefineVariables { .. } => CommandKind::DefineVariables,
            Command::Jump { .. } => CommandKind::Jump,
            Command::Label { .. } => CommandKind::Label,
            Command::If { .. } => CommandKind::If,
            Command::Elif { .. } => CommandKind::Elif,
            Command::Else => CommandKind::Else,
            Command::EndIf => CommandKind::EndIf,
            Command::Eval { .. } => CommandKind::Eval,
            Command::Embed { .. } => CommandKind::Embed,
            Command::Font(_) => CommandKind::Font,
        }
    }

    pub fn is(&self, kind: CommandKind) -> bool {
        self.kind() == kind
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PrintText { text } => write!(f, "text {text:?}"),
            Command::NewLine => f.write_str("newline"),
            Command::WaitKey => f.write_str("waitkey"),
            Command::NewPage => f.write_str("newpage"),
            Command::InsertIndent { count } => write!(f, "indent {count}"),
            Command::WaitTime { time } => write!(f, "wait {time}"),
            Command::DefineVariables { variables } => {
                f.write_str("var")?;
                for v in variables {
                    write!(f, " {}={}", v.name, v.value)?;
                }
                Ok(())
            }
            Command::Jump { target } => write!(f, "jump {target}"),
            Command::Label { name, headline } if headline.is_empty() => write!(f, "label {name}"),
            Command::Label { name, headline } => write!(f, "label {name} {headline:?}"),
            Command::If {
                expression,
                related,
            } => {
                write!(f, "if {expression}")?;
                if !related.is_empty() {
                    let ids: Vec<String> = related.iter().map(|id| id.to_string()).collect();
                    write!(f, " -> {}", ids.join(", "))?;
                }
                Ok(())
            }
            Command::Elif { expression } => write!(f, "elif {expression}"),
            Command::Else => f.write_str("else"),
            Command::EndIf => f.write_str("endif"),
            Command::Eval { expression } => write!(f, "eval {expression}"),
            Command::Embed { expression } => write!(f, "embed {expression}"),
            Command::Font(font) => write!(f, "font {font}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
