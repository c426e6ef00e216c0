//! Tree-walking evaluator.
//!
//! Operators dispatch on the runtime types of both operands.  Any step that
//! sees an [`Object::Error`] returns it immediately, so later operands and
//! arguments are never evaluated once something has failed.

use std::rc::Rc;

use super::ast::{Block, Expression, InfixOp, PrefixOp, Program, Statement};
use super::builtins;
use super::env::{Env, Environment};
use super::object::{Function, Object, NULL};
use super::parser::{self, ParseError};

/// Nested user-function calls deeper than this produce an error object.
pub const MAX_CALL_DEPTH: usize = 128;

/// Strings longer than this many bytes are never built.
pub const MAX_STRING_LEN: usize = 1 << 24;

/// Evaluate a whole program.  A top-level `return` ends it with that value.
pub fn eval_program(program: &Program, env: &Env) -> Object {
    Evaluator::default().program(program, env)
}

pub fn eval_expression(expr: &Expression, env: &Env) -> Object {
    Evaluator::default().expression(expr, env)
}

/// Parse and evaluate `src` in `env`.
pub fn eval_str(src: &str, env: &Env) -> Result<Object, Vec<ParseError>> {
    let program = parser::parse(src)?;
    Ok(eval_program(&program, env))
}

#[derive(Default)]
struct Evaluator {
    depth: usize,
}

impl Evaluator {
    fn program(&mut self, program: &Program, env: &Env) -> Object {
        let mut result = NULL;
        for stmt in &program.statements {
            result = self.statement(stmt, env);
            match result {
                Object::ReturnValue(v) => return *v,
                Object::Error(_) => return result,
                _ => {}
            }
        }
        result
    }

    /// Unlike [`program`](Self::program), a `return` stays wrapped so it
    /// keeps unwinding through enclosing blocks.
    fn block(&mut self, block: &Block, env: &Env) -> Object {
        let mut result = NULL;
        for stmt in &block.statements {
            result = self.statement(stmt, env);
            if matches!(result, Object::ReturnValue(_) | Object::Error(_)) {
                return result;
            }
        }
        result
    }

    fn statement(&mut self, stmt: &Statement, env: &Env) -> Object {
        match stmt {
            Statement::Let { name, value } => {
                let v = self.expression(value, env);
                if v.is_error() {
                    return v;
                }
                env.borrow_mut().set(name.as_str(), v);
                NULL
            }
            Statement::Return(value) => {
                let v = self.expression(value, env);
                if v.is_error() {
                    return v;
                }
                Object::ReturnValue(Box::new(v))
            }
            Statement::Expression(e) => self.expression(e, env),
            Statement::Block(b) => self.block(b, env),
        }
    }

    fn expression(&mut self, expr: &Expression, env: &Env) -> Object {
        match expr {
            Expression::Integer(n) => Object::Integer(*n),
            Expression::Double(x) => Object::Double(*x),
            Expression::Str(s) => Object::Str(s.clone()),
            Expression::Boolean(b) => Object::from(*b),
            Expression::Identifier(name) => identifier(name, env),

            Expression::Prefix { op, right } => {
                let right = self.expression(right, env);
                if right.is_error() {
                    return right;
                }
                eval_prefix(*op, right)
            }

            Expression::Infix { left, op, right } => {
                let left = self.expression(left, env);
                if left.is_error() {
                    return left;
                }
                let right = self.expression(right, env);
                if right.is_error() {
                    return right;
                }
                eval_infix(*op, left, right)
            }

            Expression::Assign { name, value } => {
                let v = self.expression(value, env);
                if v.is_error() {
                    return v;
                }
                env.borrow_mut().set(name.as_str(), v.clone());
                v
            }

            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                let cond = self.expression(condition, env);
                if cond.is_error() {
                    return cond;
                }
                if cond.is_truthy() {
                    self.block(consequence, env)
                } else if let Some(alt) = alternative {
                    self.block(alt, env)
                } else {
                    NULL
                }
            }

            Expression::Function(literal) => Object::Function(Rc::new(Function {
                literal: Rc::clone(literal),
                env: Rc::clone(env),
            })),

            Expression::Call {
                function,
                arguments,
            } => {
                let callee = self.expression(function, env);
                if callee.is_error() {
                    return callee;
                }
                let mut args = Vec::with_capacity(arguments.len());
                for a in arguments {
                    let v = self.expression(a, env);
                    if v.is_error() {
                        return v;
                    }
                    args.push(v);
                }
                self.apply(&callee, args)
            }
        }
    }

    fn apply(&mut self, callee: &Object, args: Vec<Object>) -> Object {
        match callee {
            Object::Function(func) => {
                if self.depth >= MAX_CALL_DEPTH {
                    return Object::error("maximum call depth exceeded");
                }
                let scope = Environment::enclosed(&func.env);
                {
                    let mut scope = scope.borrow_mut();
                    let mut args = args.into_iter();
                    for param in &func.literal.parameters {
                        scope.set(param.as_str(), args.next().unwrap_or(NULL));
                    }
                }
                self.depth += 1;
                let result = self.block(&func.literal.body, &scope);
                self.depth -= 1;
                match result {
                    Object::ReturnValue(v) => *v,
                    other => other,
                }
            }
            Object::Builtin(b) => (b.func)(&args),
            other => Object::error(format!("not a function: {}", other.type_name())),
        }
    }
}

fn identifier(name: &str, env: &Env) -> Object {
    if let Some(v) = env.borrow().get(name) {
        return v;
    }
    match builtins::lookup(name) {
        Some(b) => Object::Builtin(b),
        None => Object::error(format!("undefined identifier {name}")),
    }
}

// ── Operators ─────────────────────────────────────────────────────────────────

fn eval_prefix(op: PrefixOp, right: Object) -> Object {
    match op {
        PrefixOp::Not => Object::from(!right.is_truthy()),
        PrefixOp::Neg => match right {
            Object::Integer(n) => Object::Integer(n.wrapping_neg()),
            Object::Double(x) => Object::Double(-x),
            other => Object::error(format!("unknown operator -{}", other.type_name())),
        },
    }
}

fn too_long(len: usize, op: InfixOp, r: impl std::fmt::Display) -> Object {
    Object::error(format!(
        "string too long: {len} bytes {op} {r} exceeds {MAX_STRING_LEN}"
    ))
}

/// `l` followed by `r`, refused when `len` (an upper bound) is too large.
fn concat(l: &str, r: impl std::fmt::Display, len: Option<usize>) -> Object {
    match len {
        Some(n) if n <= MAX_STRING_LEN => Object::Str(format!("{l}{r}")),
        _ => too_long(l.len(), InfixOp::Add, r),
    }
}

fn eval_infix(op: InfixOp, left: Object, right: Object) -> Object {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => integer_infix(op, *l, *r),
        (Object::Double(l), Object::Double(r)) => double_infix(op, *l, *r),
        (Object::Str(l), Object::Str(r)) => match op {
            InfixOp::Add => concat(l, r, l.len().checked_add(r.len())),
            InfixOp::Lt => Object::from(l < r),
            InfixOp::Gt => Object::from(l > r),
            InfixOp::Le => Object::from(l <= r),
            InfixOp::Ge => Object::from(l >= r),
            InfixOp::Eq => Object::from(l == r),
            InfixOp::Ne => Object::from(l != r),
            _ => unknown_operator(op, &left, &right),
        },
        (Object::Str(l), Object::Integer(r)) => match op {
            InfixOp::Mul => match usize::try_from(*r) {
                Ok(count) => match l.len().checked_mul(count) {
                    Some(len) if len <= MAX_STRING_LEN => Object::Str(l.repeat(count)),
                    _ => too_long(l.len(), op, *r),
                },
                Err(_) => Object::error(format!("negative repeat count: {l:?} * {r}")),
            },
            InfixOp::Add => concat(l, r, Some(l.len() + 11)),
            _ => fallback(op, &left, &right),
        },
        (Object::Boolean(l), Object::Boolean(r)) => match op {
            InfixOp::And => Object::from(*l && *r),
            InfixOp::Or => Object::from(*l || *r),
            InfixOp::Eq => Object::from(l == r),
            InfixOp::Ne => Object::from(l != r),
            _ => unknown_operator(op, &left, &right),
        },
        _ => fallback(op, &left, &right),
    }
}

fn integer_infix(op: InfixOp, l: i32, r: i32) -> Object {
    match op {
        InfixOp::Add => Object::Integer(l.wrapping_add(r)),
        InfixOp::Sub => Object::Integer(l.wrapping_sub(r)),
        InfixOp::Mul => Object::Integer(l.wrapping_mul(r)),
        InfixOp::Div => {
            if r == 0 {
                Object::error(format!("division by zero: {l} / 0"))
            } else {
                Object::Integer(l.wrapping_div(r))
            }
        }
        InfixOp::Lt => Object::from(l < r),
        InfixOp::Gt => Object::from(l > r),
        InfixOp::Le => Object::from(l <= r),
        InfixOp::Ge => Object::from(l >= r),
        InfixOp::Eq => Object::from(l == r),
        InfixOp::Ne => Object::from(l != r),
        InfixOp::And | InfixOp::Or => {
            unknown_operator(op, &Object::Integer(l), &Object::Integer(r))
        }
    }
}

fn double_infix(op: InfixOp, l: f64, r: f64) -> Object {
    match op {
        InfixOp::Add => Object::Double(l + r),
        InfixOp::Sub => Object::Double(l - r),
        InfixOp::Mul => Object::Double(l * r),
        InfixOp::Div => Object::Double(l / r),
        InfixOp::Lt => Object::from(l < r),
        InfixOp::Gt => Object::from(l > r),
        InfixOp::Le => Object::from(l <= r),
        InfixOp::Ge => Object::from(l >= r),
        InfixOp::Eq => Object::from(l == r),
        InfixOp::Ne => Object::from(l != r),
        InfixOp::And | InfixOp::Or => {
            unknown_operator(op, &Object::Double(l), &Object::Double(r))
        }
    }
}

/// `==`/`!=` by identity; anything else is a mismatch or unknown.
fn fallback(op: InfixOp, left: &Object, right: &Object) -> Object {
    match op {
        InfixOp::Eq => Object::from(left.identical(right)),
        InfixOp::Ne => Object::from(!left.identical(right)),
        _ if left.type_name() != right.type_name() => Object::error(format!(
            "type mismatch: {} {op} {}",
            left.type_name(),
            right.type_name()
        )),
        _ => unknown_operator(op, left, right),
    }
}

fn unknown_operator(op: InfixOp, left: &Object, right: &Object) -> Object {
    Object::error(format!(
        "unknown operator {} {op} {}",
        left.type_name(),
        right.type_name()
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
