//! Runtime values produced by the evaluator.
//!
//! Evaluation never panics and never returns `Err`: failures are
//! [`Object::Error`] values that every evaluation step passes straight
//! through.

use std::fmt;
use std::rc::Rc;

use super::ast::FunctionLiteral;
use super::env::Env;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Integer(i32),
    Double(f64),
    Str(String),
    Boolean(bool),
    Null,
    /// Carries a `return` value up to the nearest function or program root.
    ReturnValue(Box<Object>),
    Error(String),
    Function(Rc<Function>),
    Builtin(Builtin),
}

pub const TRUE: Object = Object::Boolean(true);
pub const FALSE: Object = Object::Boolean(false);
pub const NULL: Object = Object::Null;

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        if b {
            TRUE
        } else {
            FALSE
        }
    }
}

impl Object {
    pub fn error(msg: impl Into<String>) -> Self {
        Object::Error(msg.into())
    }

    /// Upper-case type name, as used in error messages and by `type()`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Double(_) => "DOUBLE",
            Object::Str(_) => "STRING",
            Object::Boolean(_) => "BOOLEAN",
            Object::Null => "NULL",
            Object::ReturnValue(_) => "RETURN_VALUE",
            Object::Error(_) => "ERROR",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
        }
    }

    /// Everything except `false` and `null` is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    /// Equality for operands whose types differ or have no value operator.
    ///
    /// Booleans and null are shared singletons, so they compare by value;
    /// functions compare by identity; anything else is never identical.
    pub fn identical(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Null, Object::Null) => true,
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
            (Object::Builtin(a), Object::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(n) => write!(f, "{n}"),
            Object::Double(x) => {
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Object::Str(s) => f.write_str(s),
            Object::Boolean(b) => write!(f, "{b}"),
            Object::Null => f.write_str("null"),
            Object::ReturnValue(v) => write!(f, "{v}"),
            Object::Error(msg) => write!(f, "ERROR: {msg}"),
            Object::Function(func) => write!(f, "{}", func.literal),
            Object::Builtin(b) => write!(f, "builtin {}", b.name),
        }
    }
}

// ── Function ──────────────────────────────────────────────────────────────────

/// A user function closed over the environment it was defined in.
pub struct Function {
    pub literal: Rc<FunctionLiteral>,
    pub env: Env,
}

// The captured environment may contain this very function.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.literal.parameters)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

// ── Builtin ───────────────────────────────────────────────────────────────────

pub type BuiltinFn = fn(&[Object]) -> Object;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!FALSE.is_truthy());
        assert!(!NULL.is_truthy());
        assert!(TRUE.is_truthy());
        assert!(Object::Integer(0).is_truthy());
        assert!(Object::Str(String::new()).is_truthy());
    }

    #[test]
    fn display() {
        assert_eq!(Object::Integer(-3).to_string(), "-3");
        assert_eq!(Object::Double(2.0).to_string(), "2.0");
        assert_eq!(Object::Double(0.25).to_string(), "0.25");
        assert_eq!(Object::Str("hi".into()).to_string(), "hi");
        assert_eq!(NULL.to_string(), "null");
        assert_eq!(Object::error("boom").to_string(), "ERROR: boom");
    }

    #[test]
    fn identical_only_for_singletons() {
        assert!(TRUE.identical(&Object::from(true)));
        assert!(NULL.identical(&NULL));
        assert!(!TRUE.identical(&FALSE));
        assert!(!Object::Integer(1).identical(&Object::Integer(1)));
        assert!(!Object::Integer(1).identical(&Object::Str("1".into())));
    }
}
