//! Chained variable scopes.
//!
//! An [`Env`] is shared: the interpreter holds the global one for the whole
//! run, and every function value holds the one it was defined in.  A call
//! gets a fresh enclosed scope that is dropped when the call returns.
//!
//! A closure stored in the scope it captures forms an `Rc` cycle and is not
//! freed until the process exits; scripts are short-lived so this is
//! accepted.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::object::Object;

pub type Env = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Env>,
}

impl Environment {
    /// A new top-level scope.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> Env {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// A new scope whose lookups fall back to `outer`.
    pub fn enclosed(outer: &Env) -> Env {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    /// Look `name` up here, then in each enclosing scope.
    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.get(name) {
            Some(v) => Some(v.clone()),
            None => self.outer.as_ref()?.borrow().get(name),
        }
    }

    /// Bind `name` in this scope only; an outer binding is left alone.
    pub fn set(&mut self, name: impl Into<String>, value: Object) {
        self.store.insert(name.into(), value);
    }

    /// Whether `name` is bound in this scope (ignoring outer scopes).
    pub fn contains_local(&self, name: &str) -> bool {
        self.store.contains_key(name)
    }

    /// Locally bound names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.store.keys().map(String::as_str).collect();
        v.sort_unstable();
        v
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
