//! Runtime values.
//!
//! Arrays, dicts, and instances have shared mutable identity: cloning a
//! `Value` clones the handle, not the contents. Dicts keep keys sorted so
//! iteration and display are deterministic.

use crate::ast::{Expr, Stmt};
use crate::env::Environment;
use crate::interp::{Interpreter, Interrupt};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<BTreeMap<String, Value>>>),
    Function(Rc<Function>),
    Native(Rc<NativeFn>),
    Model(Rc<Model>),
    Instance(Rc<Instance>),
}

/// A user-defined function: a task, method, or lambda.
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: Rc<RefCell<Environment>>,
}

pub type NativeImpl = fn(&mut Interpreter, Vec<Value>, u32) -> Result<Value, Interrupt>;

pub struct NativeFn {
    pub name: &'static str,
    pub arity: Arity,
    pub f: NativeImpl,
}

#[derive(Debug, Clone, Copy)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exact(want) => n == want,
            Arity::AtLeast(min) => n >= min,
            Arity::Range(min, max) => n >= min && n <= max,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Range(a, b) => write!(f, "{a} to {b}"),
        }
    }
}

/// A model (class). Structs are models with `struct_fields` set, which
/// synthesizes a positional constructor.
pub struct Model {
    pub name: String,
    pub parent: Option<Rc<Model>>,
    pub field_inits: Vec<(String, Option<Expr>)>,
    pub methods: BTreeMap<String, Rc<Function>>,
    pub hidden: Vec<String>,
    pub struct_fields: Option<Vec<String>>,
}

impl Model {
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }
        self.parent.as_ref().and_then(|p| p.find_method(name))
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        if self.hidden.iter().any(|h| h == name) {
            return true;
        }
        self.parent.as_ref().is_some_and(|p| p.is_hidden(name))
    }
}

pub struct Instance {
    pub model: Rc<Model>,
    pub fields: RefCell<BTreeMap<String, Value>>,
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::Str(s.into())
    }

    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
            Value::Function(_) | Value::Native(_) => "task",
            Value::Model(_) => "model",
            Value::Instance(_) => "instance",
        }
    }

    /// Display form with strings quoted, used inside array and dict
    /// listings.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{s}\""),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Model(a), Value::Model(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(items) => {
                let items = items.borrow();
                let parts: Vec<String> = items.iter().map(Value::repr).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Dict(entries) => {
                let entries = entries.borrow();
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.repr()))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Value::Function(func) => write!(f, "<task {}>", func.name),
            Value::Native(native) => write!(f, "<native {}>", native.name),
            Value::Model(model) => write!(f, "<model {}>", model.name),
            Value::Instance(instance) => write!(f, "<{} instance>", instance.model.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr())
    }
}
