//! Scoped variable environment for the target interpreter.

use std::collections::BTreeMap;

use crate::target::interp::Value;

/// Scoped bindings with push/pop semantics.
///
/// Lookups search from the innermost scope outward; `define` always binds in
/// the innermost scope. Lambda calls push a scope for their parameters, so a
/// parameter shadows the caller's binding of the same name.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<BTreeMap<String, Value>>,
}

impl Environment {
    /// An environment with one global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![BTreeMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(BTreeMap::new());
    }

    /// Pop the innermost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Update `name` in the innermost scope that binds it.
    /// Returns `false` if no scope does.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self
            .scopes
            .iter_mut()
            .rev()
            .find(|scope| scope.contains_key(name))
        {
            Some(scope) => {
                scope.insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_and_pop() {
        let mut env = Environment::new();
        env.define("x", Value::Number(1.0));
        env.push_scope();
        env.define("x", Value::Number(2.0));
        assert_eq!(env.get("x"), Some(&Value::Number(2.0)));
        env.pop_scope();
        assert_eq!(env.get("x"), Some(&Value::Number(1.0)));
        env.pop_scope();
        assert_eq!(env.depth(), 1);
    }

    #[test]
    fn test_set_updates_outer_binding() {
        let mut env = Environment::new();
        env.define("i", Value::Number(0.0));
        env.push_scope();
        assert!(env.set("i", Value::Number(3.0)));
        assert!(!env.set("j", Value::Number(3.0)));
        env.pop_scope();
        assert_eq!(env.get("i"), Some(&Value::Number(3.0)));
    }
}
