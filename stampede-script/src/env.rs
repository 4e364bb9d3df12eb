//! Lexical environments.
//!
//! Scopes form a parent chain. Lookup and assignment walk outward;
//! assignment to a name that is nowhere defined lands in the global
//! scope.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
pub struct Environment {
    parent: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::default()))
    }

    pub fn child(parent: Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            parent: Some(parent),
            values: HashMap::new(),
        }))
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(start: &Rc<RefCell<Environment>>, name: &str) -> Option<Value> {
        let mut current = Rc::clone(start);
        loop {
            if let Some(value) = current.borrow().values.get(name) {
                return Some(value.clone());
            }
            let parent = current.borrow().parent.clone();
            match parent {
                Some(p) => current = p,
                None => return None,
            }
        }
    }

    pub fn is_defined(start: &Rc<RefCell<Environment>>, name: &str) -> bool {
        Environment::get(start, name).is_some()
    }

    /// Assign to the nearest scope that defines `name`; when none does,
    /// define it in the outermost (global) scope.
    pub fn assign(start: &Rc<RefCell<Environment>>, name: &str, value: Value) {
        let mut current = Rc::clone(start);
        loop {
            {
                let mut env = current.borrow_mut();
                if env.values.contains_key(name) {
                    env.values.insert(name.to_string(), value);
                    return;
                }
            }
            let parent = current.borrow().parent.clone();
            match parent {
                Some(p) => current = p,
                None => {
                    current.borrow_mut().define(name, value);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_walks_the_parent_chain() {
        let global = Environment::new();
        global.borrow_mut().define("x", Value::Number(1.0));
        let inner = Environment::child(Rc::clone(&global));

        assert_eq!(Environment::get(&inner, "x"), Some(Value::Number(1.0)));
        assert_eq!(Environment::get(&inner, "y"), None);
    }

    #[test]
    fn define_shadows_without_touching_the_outer_binding() {
        let global = Environment::new();
        global.borrow_mut().define("x", Value::Number(1.0));
        let inner = Environment::child(Rc::clone(&global));
        inner.borrow_mut().define("x", Value::Number(2.0));

        assert_eq!(Environment::get(&inner, "x"), Some(Value::Number(2.0)));
        assert_eq!(Environment::get(&global, "x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn assign_updates_the_nearest_defining_scope() {
        let global = Environment::new();
        global.borrow_mut().define("x", Value::Number(1.0));
        let inner = Environment::child(Rc::clone(&global));

        Environment::assign(&inner, "x", Value::Number(5.0));
        assert_eq!(Environment::get(&global, "x"), Some(Value::Number(5.0)));
    }

    #[test]
    fn assign_to_an_unknown_name_lands_in_the_global_scope() {
        let global = Environment::new();
        let inner = Environment::child(Rc::clone(&global));

        Environment::assign(&inner, "fresh", Value::Bool(true));
        assert_eq!(Environment::get(&global, "fresh"), Some(Value::Bool(true)));
        assert!(inner.borrow().values.get("fresh").is_none());
    }
}
