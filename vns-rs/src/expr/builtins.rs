//! Builtin functions available to every expression.
//!
//! Builtins are looked up only after the environment chain misses, so a
//! script may shadow them with its own bindings.

use super::object::{Builtin, Object};

const BUILTINS: &[Builtin] = &[
    Builtin { name: "length", func: length },
    Builtin { name: "str", func: to_str },
    Builtin { name: "int", func: int },
    Builtin { name: "double", func: double },
    Builtin { name: "type", func: type_of },
];

pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).copied()
}

pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

fn single<'a>(args: &'a [Object]) -> Result<&'a Object, Object> {
    match args {
        [one] => Ok(one),
        _ => Err(Object::error(format!(
            "wrong number of arguments. got={}, want=1",
            args.len()
        ))),
    }
}

fn unsupported(name: &str, arg: &Object) -> Object {
    Object::error(format!(
        "argument to `{name}` not supported, got {}",
        arg.type_name()
    ))
}

/// `length(s)`: character count of a string.
fn length(args: &[Object]) -> Object {
    let arg = match single(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    match arg {
        Object::Str(s) => Object::Integer(i32::try_from(s.chars().count()).unwrap_or(i32::MAX)),
        other => unsupported("length", other),
    }
}

/// `str(x)`: display form of any value.
fn to_str(args: &[Object]) -> Object {
    match single(args) {
        Ok(Object::Str(s)) => Object::Str(s.clone()),
        Ok(other) => Object::Str(other.to_string()),
        Err(e) => e,
    }
}

/// `int(x)`: truncate a double, parse a string, map a boolean to 0/1.
fn int(args: &[Object]) -> Object {
    let arg = match single(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    match arg {
        Object::Integer(n) => Object::Integer(*n),
        Object::Double(x) => Object::Integer(*x as i32),
        Object::Boolean(b) => Object::Integer(i32::from(*b)),
        Object::Str(s) => match s.trim().parse::<i32>() {
            Ok(n) => Object::Integer(n),
            Err(_) => Object::error(format!("could not convert {s:?} to INTEGER")),
        },
        other => unsupported("int", other),
    }
}

/// `double(x)`: widen an integer, parse a string.
fn double(args: &[Object]) -> Object {
    let arg = match single(args) {
        Ok(a) => a,
        Err(e) => return e,
    };
    match arg {
        Object::Integer(n) => Object::Double(f64::from(*n)),
        Object::Double(x) => Object::Double(*x),
        Object::Str(s) => match s.trim().parse::<f64>() {
            Ok(x) => Object::Double(x),
            Err(_) => Object::error(format!("could not convert {s:?} to DOUBLE")),
        },
        other => unsupported("double", other),
    }
}

/// `type(x)`: the value's type name as a string.
fn type_of(args: &[Object]) -> Object {
    match single(args) {
        Ok(arg) => Object::Str(arg.type_name().to_string()),
        Err(e) => e,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
