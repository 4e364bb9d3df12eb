//! Tree-walking evaluator.
//!
//! `give`, `escape`, and `skip` unwind through [`Interrupt`] alongside
//! runtime errors; a call absorbs `give`, loops absorb `escape` and
//! `skip`, and `try` absorbs errors.

use crate::ast::*;
use crate::builtins;
use crate::env::Environment;
use crate::value::{Function, Instance, Model, Value};
use crate::{lexer, parser};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct RuntimeError {
    pub message: String,
    pub line: u32,
}

/// Non-local exits during evaluation.
#[derive(Debug)]
pub enum Interrupt {
    Error(RuntimeError),
    Return(Value),
    Break,
    Continue,
}

impl From<RuntimeError> for Interrupt {
    fn from(err: RuntimeError) -> Self {
        Interrupt::Error(err)
    }
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    env: Rc<RefCell<Environment>>,
    pub(crate) out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter writing `out` and `print` output to the given sink.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        let globals = Environment::new();
        builtins::install(&globals);
        Self {
            env: Rc::clone(&globals),
            globals,
            out,
        }
    }

    pub fn globals(&self) -> &Rc<RefCell<Environment>> {
        &self.globals
    }

    /// Execute a whole program.
    pub fn run(&mut self, program: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in program {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(Interrupt::Error(err)) => return Err(err),
                Err(_) => {
                    return Err(RuntimeError {
                        message: "control flow outside of a loop or task".to_string(),
                        line: stmt.line,
                    })
                }
            }
        }
        Ok(())
    }

    /// Evaluate a single expression, for the REPL.
    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match self.evaluate(expr) {
            Ok(value) => Ok(value),
            Err(Interrupt::Error(err)) => Err(err),
            Err(_) => Err(RuntimeError {
                message: "control flow outside of a loop or task".to_string(),
                line: expr.line,
            }),
        }
    }

    // ---- statements ----

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Interrupt> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            StmtKind::Out(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{value}")
                    .map_err(|e| self.error(stmt.line, format!("write failed: {e}")))?;
                Ok(())
            }
            StmtKind::VarDecl { name, init } => {
                let value = self.evaluate(init)?;
                if Environment::is_defined(&self.env, name) {
                    Environment::assign(&self.env, name, value);
                } else {
                    self.env.borrow_mut().define(name.clone(), value);
                }
                Ok(())
            }
            StmtKind::Block(body) => {
                self.execute_block(body, Environment::child(Rc::clone(&self.env)))
            }
            StmtKind::When {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            StmtKind::While { condition, body } => {
                while self.evaluate(condition)?.truthy() {
                    match self.execute(body) {
                        Ok(()) | Err(Interrupt::Continue) => {}
                        Err(Interrupt::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            StmtKind::Repeat {
                variable,
                start,
                end,
                body,
            } => {
                let start = self.number_bound(start, "repeat")?;
                let end = self.number_bound(end, "repeat")?;
                let loop_env = Environment::child(Rc::clone(&self.env));
                let prev = std::mem::replace(&mut self.env, Rc::clone(&loop_env));

                let step = if start <= end { 1.0 } else { -1.0 };
                let mut i = start;
                let mut result = Ok(());
                while (step > 0.0 && i <= end) || (step < 0.0 && i >= end) {
                    loop_env
                        .borrow_mut()
                        .define(variable.clone(), Value::Number(i));
                    match self.execute(body) {
                        Ok(()) | Err(Interrupt::Continue) => {}
                        Err(Interrupt::Break) => break,
                        Err(other) => {
                            result = Err(other);
                            break;
                        }
                    }
                    i += step;
                }

                self.env = prev;
                result
            }
            StmtKind::ForEach {
                variable,
                iterable,
                body,
            } => {
                let items: Vec<Value> = match self.evaluate(iterable)? {
                    Value::Array(items) => items.borrow().clone(),
                    Value::Str(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
                    Value::Dict(entries) => entries
                        .borrow()
                        .keys()
                        .cloned()
                        .map(Value::string)
                        .collect(),
                    other => {
                        return Err(self.error(
                            stmt.line,
                            format!("cannot iterate over a {}", other.type_name()),
                        ))
                    }
                };

                let loop_env = Environment::child(Rc::clone(&self.env));
                let prev = std::mem::replace(&mut self.env, Rc::clone(&loop_env));
                let mut result = Ok(());
                for item in items {
                    loop_env.borrow_mut().define(variable.clone(), item);
                    match self.execute(body) {
                        Ok(()) | Err(Interrupt::Continue) => {}
                        Err(Interrupt::Break) => break,
                        Err(other) => {
                            result = Err(other);
                            break;
                        }
                    }
                }
                self.env = prev;
                result
            }
            StmtKind::Task { name, params, body } => {
                let func = Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: Rc::clone(&self.env),
                };
                self.env
                    .borrow_mut()
                    .define(name.clone(), Value::Function(Rc::new(func)));
                Ok(())
            }
            StmtKind::Give(value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(Interrupt::Return(value))
            }
            StmtKind::Escape => Err(Interrupt::Break),
            StmtKind::Skip => Err(Interrupt::Continue),
            StmtKind::Model(decl) => self.declare_model(decl, stmt.line),
            StmtKind::Struct { name, fields } => {
                let model = Model {
                    name: name.clone(),
                    parent: None,
                    field_inits: fields.iter().map(|f| (f.clone(), None)).collect(),
                    methods: BTreeMap::new(),
                    hidden: Vec::new(),
                    struct_fields: Some(fields.clone()),
                };
                self.env
                    .borrow_mut()
                    .define(name.clone(), Value::Model(Rc::new(model)));
                Ok(())
            }
            StmtKind::Use(path) => self.load_module(path, stmt.line),
            StmtKind::Try {
                body,
                catch_var,
                catch_body,
            } => match self.execute(body) {
                Err(Interrupt::Error(err)) => {
                    let catch_env = Environment::child(Rc::clone(&self.env));
                    catch_env
                        .borrow_mut()
                        .define(catch_var.clone(), Value::string(err.message));
                    let prev = std::mem::replace(&mut self.env, catch_env);
                    let result = self.execute(catch_body);
                    self.env = prev;
                    result
                }
                other => other,
            },
            StmtKind::Throw(expr) => {
                let value = self.evaluate(expr)?;
                Err(self.error(stmt.line, value.to_string()))
            }
        }
    }

    pub(crate) fn execute_block(
        &mut self,
        body: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> Result<(), Interrupt> {
        let prev = std::mem::replace(&mut self.env, env);
        let mut result = Ok(());
        for stmt in body {
            result = self.execute(stmt);
            if result.is_err() {
                break;
            }
        }
        self.env = prev;
        result
    }

    fn declare_model(&mut self, decl: &ModelDecl, line: u32) -> Result<(), Interrupt> {
        let parent = match &decl.parent {
            Some(name) => match Environment::get(&self.env, name) {
                Some(Value::Model(model)) => Some(model),
                Some(other) => {
                    return Err(self.error(
                        line,
                        format!("`{name}` is a {}, not a model", other.type_name()),
                    ))
                }
                None => return Err(self.error(line, format!("undefined parent model `{name}`"))),
            },
            None => None,
        };

        let mut methods = BTreeMap::new();
        let mut hidden = Vec::new();
        for method in &decl.methods {
            if method.hidden {
                hidden.push(method.name.clone());
            }
            methods.insert(
                method.name.clone(),
                Rc::new(Function {
                    name: format!("{}.{}", decl.name, method.name),
                    params: method.params.clone(),
                    body: Rc::clone(&method.body),
                    closure: Rc::clone(&self.env),
                }),
            );
        }

        let mut field_inits = Vec::new();
        for field in &decl.fields {
            if field.hidden {
                hidden.push(field.name.clone());
            }
            field_inits.push((field.name.clone(), field.value.clone()));
        }

        let model = Model {
            name: decl.name.clone(),
            parent,
            field_inits,
            methods,
            hidden,
            struct_fields: None,
        };
        self.env
            .borrow_mut()
            .define(decl.name.clone(), Value::Model(Rc::new(model)));
        Ok(())
    }

    fn load_module(&mut self, path: &str, line: u32) -> Result<(), Interrupt> {
        debug!(path, "loading module");
        let source = std::fs::read_to_string(path)
            .map_err(|e| self.error(line, format!("cannot read `{path}`: {e}")))?;
        let tokens = lexer::tokenize(&source)
            .map_err(|e| self.error(line, format!("in `{path}`: {e}")))?;
        let program = parser::parse(tokens).map_err(|errs| {
            let details: Vec<String> = errs.iter().map(ToString::to_string).collect();
            self.error(line, format!("in `{path}`: {}", details.join("; ")))
        })?;
        // Modules execute in the global scope.
        self.execute_block(&program, Rc::clone(&self.globals))
    }

    // ---- expressions ----

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, Interrupt> {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(match lit {
                Literal::Nil => Value::Nil,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::Str(s) => Value::string(s.as_str()),
            }),
            ExprKind::Identifier(name) => Environment::get(&self.env, name)
                .ok_or_else(|| self.error(line, format!("undefined variable `{name}`"))),
            ExprKind::SelfRef => Environment::get(&self.env, "self")
                .ok_or_else(|| self.error(line, "`self` outside of a model")),
            ExprKind::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                    UnaryOp::Neg => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(self.error(
                            line,
                            format!("cannot negate a {}", other.type_name()),
                        )),
                    },
                }
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.binary_op(*op, left, right, line)
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.evaluate(left)?;
                match op {
                    LogicalOp::Or if left.truthy() => Ok(left),
                    LogicalOp::And if !left.truthy() => Ok(left),
                    _ => self.evaluate(right),
                }
            }
            ExprKind::Call { callee, args } => {
                let callee = self.evaluate(callee)?;
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(self.evaluate(arg)?);
                }
                self.call(callee, evaluated, line)
            }
            ExprKind::Index { object, index } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                self.index_get(object, index, line)
            }
            ExprKind::GetProperty { object, name } => {
                let via_self = matches!(object.kind, ExprKind::SelfRef);
                let object = self.evaluate(object)?;
                self.property_get(object, name, via_self, line)
            }
            ExprKind::Array(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate(element)?);
                }
                Ok(Value::Array(Rc::new(RefCell::new(items))))
            }
            ExprKind::Dict(pairs) => {
                let mut entries = BTreeMap::new();
                for (key, value) in pairs {
                    let key = match self.evaluate(key)? {
                        Value::Str(s) => s.to_string(),
                        Value::Number(n) => Value::Number(n).to_string(),
                        other => {
                            return Err(self.error(
                                line,
                                format!("dictionary key must be a string, got {}", other.type_name()),
                            ))
                        }
                    };
                    let value = self.evaluate(value)?;
                    entries.insert(key, value);
                }
                Ok(Value::Dict(Rc::new(RefCell::new(entries))))
            }
            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value)?;
                Environment::assign(&self.env, name, value.clone());
                Ok(value)
            }
            ExprKind::AssignIndex {
                object,
                index,
                value,
            } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                let value = self.evaluate(value)?;
                self.index_set(object, index, value, line)
            }
            ExprKind::SetProperty {
                object,
                name,
                value,
            } => {
                let via_self = matches!(object.kind, ExprKind::SelfRef);
                let object = self.evaluate(object)?;
                let value = self.evaluate(value)?;
                self.property_set(object, name, value, via_self, line)
            }
            ExprKind::Lambda { params, body } => Ok(Value::Function(Rc::new(Function {
                name: "lambda".to_string(),
                params: params.clone(),
                body: Rc::clone(body),
                closure: Rc::clone(&self.env),
            }))),
        }
    }

    fn binary_op(
        &self,
        op: BinaryOp,
        left: Value,
        right: Value,
        line: u32,
    ) -> Result<Value, Interrupt> {
        use BinaryOp::*;
        let result = match (op, &left, &right) {
            (Add, Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Add, Value::Str(_), _) | (Add, _, Value::Str(_)) => {
                Value::string(format!("{left}{right}"))
            }
            (Add, Value::Array(a), Value::Array(b)) => {
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Value::Array(Rc::new(RefCell::new(items)))
            }
            (Sub, Value::Number(a), Value::Number(b)) => Value::Number(a - b),
            (Mul, Value::Number(a), Value::Number(b)) => Value::Number(a * b),
            (Mul, Value::Str(s), Value::Number(n)) | (Mul, Value::Number(n), Value::Str(s)) => {
                if *n < 0.0 || n.fract() != 0.0 {
                    return Err(self.error(
                        line,
                        "string repetition count must be a non-negative integer",
                    ));
                }
                Value::string(s.repeat(*n as usize))
            }
            (Div, Value::Number(a), Value::Number(b)) => {
                if *b == 0.0 {
                    return Err(self.error(line, "division by zero"));
                }
                Value::Number(a / b)
            }
            (Mod, Value::Number(a), Value::Number(b)) => Value::Number(a % b),
            (Eq, _, _) => Value::Bool(left == right),
            (Ne, _, _) => Value::Bool(left != right),
            (Lt, Value::Number(a), Value::Number(b)) => Value::Bool(a < b),
            (Le, Value::Number(a), Value::Number(b)) => Value::Bool(a <= b),
            (Gt, Value::Number(a), Value::Number(b)) => Value::Bool(a > b),
            (Ge, Value::Number(a), Value::Number(b)) => Value::Bool(a >= b),
            (In, item, Value::Array(items)) => {
                Value::Bool(items.borrow().iter().any(|v| v == item))
            }
            (In, Value::Str(needle), Value::Str(hay)) => Value::Bool(hay.contains(needle.as_ref())),
            (In, Value::Str(key), Value::Dict(entries)) => {
                Value::Bool(entries.borrow().contains_key(key.as_ref()))
            }
            _ => {
                return Err(self.error(
                    line,
                    format!(
                        "cannot apply `{}` to {} and {}",
                        op.symbol(),
                        left.type_name(),
                        right.type_name()
                    ),
                ))
            }
        };
        Ok(result)
    }

    fn index_get(&self, object: Value, index: Value, line: u32) -> Result<Value, Interrupt> {
        match (&object, &index) {
            (Value::Array(items), Value::Number(n)) => {
                let items = items.borrow();
                let idx = self.array_index(*n, items.len(), line)?;
                Ok(items[idx].clone())
            }
            (Value::Str(s), Value::Number(n)) => {
                let len = s.chars().count();
                let idx = self.array_index(*n, len, line)?;
                let c = s.chars().nth(idx).map(|c| c.to_string()).unwrap_or_default();
                Ok(Value::string(c))
            }
            (Value::Dict(entries), Value::Str(key)) => Ok(entries
                .borrow()
                .get(key.as_ref())
                .cloned()
                .unwrap_or(Value::Nil)),
            _ => Err(self.error(
                line,
                format!(
                    "cannot index a {} with a {}",
                    object.type_name(),
                    index.type_name()
                ),
            )),
        }
    }

    fn index_set(
        &self,
        object: Value,
        index: Value,
        value: Value,
        line: u32,
    ) -> Result<Value, Interrupt> {
        match (&object, &index) {
            (Value::Array(items), Value::Number(n)) => {
                let mut items = items.borrow_mut();
                let idx = self.array_index(*n, items.len(), line)?;
                items[idx] = value.clone();
                Ok(value)
            }
            (Value::Dict(entries), Value::Str(key)) => {
                entries.borrow_mut().insert(key.to_string(), value.clone());
                Ok(value)
            }
            _ => Err(self.error(
                line,
                format!(
                    "cannot index a {} with a {}",
                    object.type_name(),
                    index.type_name()
                ),
            )),
        }
    }

    fn array_index(&self, n: f64, len: usize, line: u32) -> Result<usize, Interrupt> {
        if n.fract() != 0.0 {
            return Err(self.error(line, format!("index {n} is not an integer")));
        }
        if n < 0.0 || n as usize >= len {
            return Err(self.error(
                line,
                format!("index {} out of bounds (length {len})", Value::Number(n)),
            ));
        }
        Ok(n as usize)
    }

    fn property_get(
        &mut self,
        object: Value,
        name: &str,
        via_self: bool,
        line: u32,
    ) -> Result<Value, Interrupt> {
        match &object {
            Value::Instance(instance) => {
                if instance.model.is_hidden(name) && !via_self {
                    return Err(self.error(
                        line,
                        format!("`{name}` is hidden on {}", instance.model.name),
                    ));
                }
                if let Some(value) = instance.fields.borrow().get(name) {
                    return Ok(value.clone());
                }
                if let Some(method) = instance.model.find_method(name) {
                    return Ok(Value::Function(bind_method(&method, object.clone())));
                }
                Err(self.error(
                    line,
                    format!("undefined property `{name}` on {}", instance.model.name),
                ))
            }
            Value::Array(items) => match name {
                "len" => Ok(Value::Number(items.borrow().len() as f64)),
                _ => Err(self.error(line, format!("arrays have no property `{name}`"))),
            },
            Value::Str(s) => match name {
                "len" => Ok(Value::Number(s.chars().count() as f64)),
                _ => Err(self.error(line, format!("strings have no property `{name}`"))),
            },
            Value::Dict(entries) => Ok(entries.borrow().get(name).cloned().unwrap_or(Value::Nil)),
            other => Err(self.error(
                line,
                format!("a {} has no properties", other.type_name()),
            )),
        }
    }

    fn property_set(
        &mut self,
        object: Value,
        name: &str,
        value: Value,
        via_self: bool,
        line: u32,
    ) -> Result<Value, Interrupt> {
        match &object {
            Value::Instance(instance) => {
                if instance.model.is_hidden(name) && !via_self {
                    return Err(self.error(
                        line,
                        format!("`{name}` is hidden on {}", instance.model.name),
                    ));
                }
                instance
                    .fields
                    .borrow_mut()
                    .insert(name.to_string(), value.clone());
                Ok(value)
            }
            Value::Dict(entries) => {
                entries.borrow_mut().insert(name.to_string(), value.clone());
                Ok(value)
            }
            other => Err(self.error(
                line,
                format!("cannot set a property on a {}", other.type_name()),
            )),
        }
    }

    /// Invoke a callable value. `give` is absorbed here; `escape` and
    /// `skip` pass through to the nearest loop.
    pub fn call(&mut self, callee: Value, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
        match callee {
            Value::Function(func) => {
                if args.len() != func.params.len() {
                    return Err(self.error(
                        line,
                        format!(
                            "{} expects {} argument(s), got {}",
                            func.name,
                            func.params.len(),
                            args.len()
                        ),
                    ));
                }
                let env = Environment::child(Rc::clone(&func.closure));
                {
                    let mut scope = env.borrow_mut();
                    for (param, arg) in func.params.iter().zip(args) {
                        scope.define(param.clone(), arg);
                    }
                }
                match self.execute_block(&func.body, env) {
                    Ok(()) => Ok(Value::Nil),
                    Err(Interrupt::Return(value)) => Ok(value),
                    Err(other) => Err(other),
                }
            }
            Value::Native(native) => {
                if !native.arity.accepts(args.len()) {
                    return Err(self.error(
                        line,
                        format!(
                            "{} expects {} argument(s), got {}",
                            native.name,
                            native.arity,
                            args.len()
                        ),
                    ));
                }
                (native.f)(self, args, line)
            }
            Value::Model(model) => self.instantiate(model, args, line),
            other => Err(self.error(line, format!("cannot call a {}", other.type_name()))),
        }
    }

    fn instantiate(
        &mut self,
        model: Rc<Model>,
        args: Vec<Value>,
        line: u32,
    ) -> Result<Value, Interrupt> {
        let instance = Rc::new(Instance {
            model: Rc::clone(&model),
            fields: RefCell::new(BTreeMap::new()),
        });
        let value = Value::Instance(Rc::clone(&instance));

        self.apply_field_defaults(&model, &instance)?;

        if let Some(fields) = &model.struct_fields {
            if args.len() != fields.len() {
                return Err(self.error(
                    line,
                    format!(
                        "{} expects {} field value(s), got {}",
                        model.name,
                        fields.len(),
                        args.len()
                    ),
                ));
            }
            let mut map = instance.fields.borrow_mut();
            for (field, arg) in fields.iter().zip(args) {
                map.insert(field.clone(), arg);
            }
            return Ok(value);
        }

        if let Some(init) = model.find_method("init") {
            let bound = bind_method(&init, value.clone());
            self.call(Value::Function(bound), args, line)?;
        } else if !args.is_empty() {
            return Err(self.error(
                line,
                format!("{} has no init taking arguments", model.name),
            ));
        }
        Ok(value)
    }

    /// Field defaults run base models first so a child can override.
    fn apply_field_defaults(
        &mut self,
        model: &Rc<Model>,
        instance: &Rc<Instance>,
    ) -> Result<(), Interrupt> {
        if let Some(parent) = &model.parent {
            self.apply_field_defaults(parent, instance)?;
        }
        for (name, default) in &model.field_inits {
            let value = match default {
                Some(expr) => self.evaluate(expr)?,
                None => Value::Nil,
            };
            instance.fields.borrow_mut().insert(name.clone(), value);
        }
        Ok(())
    }

    fn number_bound(&mut self, expr: &Expr, what: &str) -> Result<f64, Interrupt> {
        match self.evaluate(expr)? {
            Value::Number(n) => Ok(n),
            other => Err(self.error(
                expr.line,
                format!("{what} bounds must be numbers, got {}", other.type_name()),
            )),
        }
    }

    fn error(&self, line: u32, message: impl Into<String>) -> Interrupt {
        Interrupt::Error(RuntimeError {
            message: message.into(),
            line,
        })
    }
}

fn bind_method(method: &Rc<Function>, instance: Value) -> Rc<Function> {
    let env = Environment::child(Rc::clone(&method.closure));
    env.borrow_mut().define("self", instance);
    Rc::new(Function {
        name: method.name.clone(),
        params: method.params.clone(),
        body: Rc::clone(&method.body),
        closure: env,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_program(source: &str) -> Interpreter {
        let mut interp = Interpreter::new();
        let tokens = lexer::tokenize(source).unwrap();
        let program = parser::parse(tokens).unwrap();
        interp.run(&program).unwrap();
        interp
    }

    fn run_err(source: &str) -> RuntimeError {
        let mut interp = Interpreter::new();
        let tokens = lexer::tokenize(source).unwrap();
        let program = parser::parse(tokens).unwrap();
        interp.run(&program).unwrap_err()
    }

    fn global(interp: &Interpreter, name: &str) -> Value {
        Environment::get(interp.globals(), name)
            .unwrap_or_else(|| panic!("`{name}` is not defined"))
    }

    fn number(interp: &Interpreter, name: &str) -> f64 {
        match global(interp, name) {
            Value::Number(n) => n,
            other => panic!("`{name}` is {other:?}, not a number"),
        }
    }

    fn text(interp: &Interpreter, name: &str) -> String {
        match global(interp, name) {
            Value::Str(s) => s.to_string(),
            other => panic!("`{name}` is {other:?}, not a string"),
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn arithmetic_follows_precedence() {
        let interp = run_program("x = 1 + 2 * 3 - 4 / 2\n");
        assert_eq!(number(&interp, "x"), 5.0);
    }

    #[test]
    fn modulo_works_on_numbers() {
        let interp = run_program("x = 7 % 3\n");
        assert_eq!(number(&interp, "x"), 1.0);
    }

    #[test]
    fn plus_concatenates_when_either_side_is_a_string() {
        let interp = run_program("a = \"n=\" + 4\nb = 4 + \"!\"\n");
        assert_eq!(text(&interp, "a"), "n=4");
        assert_eq!(text(&interp, "b"), "4!");
    }

    #[test]
    fn star_repeats_strings() {
        let interp = run_program("s = \"ab\" * 3\n");
        assert_eq!(text(&interp, "s"), "ababab");
    }

    #[test]
    fn plus_concatenates_arrays() {
        let interp = run_program("a = [1] + [2, 3]\nn = a.len\n");
        assert_eq!(number(&interp, "n"), 3.0);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let err = run_err("ok = 1\nx = 1 / 0\n");
        assert!(err.message.contains("division by zero"));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let err = run_err("x = missing + 1\n");
        assert!(err.message.contains("undefined variable `missing`"));
    }

    #[test]
    fn when_other_chain_picks_the_first_truthy_branch() {
        let interp = run_program(
            "x = 5\nlabel = \"\"\nwhen x > 10 {\n  label = \"big\"\n}\nother when x > 3 {\n  label = \"mid\"\n}\nother {\n  label = \"small\"\n}\n",
        );
        assert_eq!(text(&interp, "label"), "mid");
    }

    #[test]
    fn while_loop_honors_escape_and_skip() {
        let interp = run_program(
            "sum = 0\ni = 0\nwhile true {\n  i += 1\n  when i > 10 {\n    escape\n  }\n  when i % 2 == 0 {\n    skip\n  }\n  sum += i\n}\n",
        );
        // 1 + 3 + 5 + 7 + 9
        assert_eq!(number(&interp, "sum"), 25.0);
    }

    #[test]
    fn repeat_bounds_are_inclusive_in_both_directions() {
        let interp = run_program(
            "up = 0\nrepeat i = 1 to 3 {\n  up += i\n}\ndown = \"\"\nrepeat i = 3 to 1 {\n  down += str(i)\n}\n",
        );
        assert_eq!(number(&interp, "up"), 6.0);
        assert_eq!(text(&interp, "down"), "321");
    }

    #[test]
    fn foreach_iterates_arrays_strings_and_sorted_dict_keys() {
        let interp = run_program(
            "total = 0\nget n in [1, 2, 3] {\n  total += n\n}\nchars = \"\"\nget c in \"abc\" {\n  chars += c\n}\nks = \"\"\nget k in {b: 2, a: 1} {\n  ks += k\n}\n",
        );
        assert_eq!(number(&interp, "total"), 6.0);
        assert_eq!(text(&interp, "chars"), "abc");
        assert_eq!(text(&interp, "ks"), "ab");
    }

    #[test]
    fn tasks_recurse_and_give_values() {
        let interp = run_program(
            "task fib(n) {\n  when n < 2 {\n    give n\n  }\n  give fib(n - 1) + fib(n - 2)\n}\nx = fib(6)\n",
        );
        assert_eq!(number(&interp, "x"), 8.0);
    }

    #[test]
    fn task_without_give_yields_nil() {
        let interp = run_program("task noop() {\n  1 + 1\n}\nx = noop()\n");
        assert_eq!(global(&interp, "x"), Value::Nil);
    }

    #[test]
    fn lambdas_close_over_their_defining_scope() {
        let interp = run_program(
            "task make_counter() {\n  count = 0\n  give || {\n    count += 1\n    give count\n  }\n}\nbump = make_counter()\nbump()\nsecond = bump()\n",
        );
        assert_eq!(number(&interp, "second"), 2.0);
    }

    #[test]
    fn arrow_lambdas_give_their_expression() {
        let interp = run_program("double = |x| => x * 2\ny = double(21)\n");
        assert_eq!(number(&interp, "y"), 42.0);
    }

    #[test]
    fn compound_assignment_works_through_indexes() {
        let interp = run_program("arr = [1, 2]\narr[0] += 5\nx = arr[0]\n");
        assert_eq!(number(&interp, "x"), 6.0);
    }

    #[test]
    fn arrays_share_identity_across_bindings() {
        let interp = run_program("a = [1]\nb = a\nb[0] = 9\nx = a[0]\n");
        assert_eq!(number(&interp, "x"), 9.0);
    }

    #[test]
    fn in_tests_arrays_substrings_and_dict_keys() {
        let interp = run_program(
            "a = 2 in [1, 2]\nb = \"ell\" in \"hello\"\nc = \"k\" in {k: 1}\nd = 5 in [1, 2]\n",
        );
        assert_eq!(global(&interp, "a"), Value::Bool(true));
        assert_eq!(global(&interp, "b"), Value::Bool(true));
        assert_eq!(global(&interp, "c"), Value::Bool(true));
        assert_eq!(global(&interp, "d"), Value::Bool(false));
    }

    #[test]
    fn logical_operators_short_circuit_to_operand_values() {
        let interp = run_program("a = nil or \"fallback\"\nb = true and 7\nc = false and missing\n");
        assert_eq!(text(&interp, "a"), "fallback");
        assert_eq!(number(&interp, "b"), 7.0);
        assert_eq!(global(&interp, "c"), Value::Bool(false));
    }

    #[test]
    fn models_construct_through_init_and_bind_self() {
        let interp = run_program(
            "model Point {\n  init(x, y) {\n    self.x = x\n    self.y = y\n  }\n  sum() {\n    give self.x + self.y\n  }\n}\np = Point(3, 4)\ns = p.sum()\n",
        );
        assert_eq!(number(&interp, "s"), 7.0);
    }

    #[test]
    fn extends_inherits_init_and_dispatches_overrides() {
        let interp = run_program(
            "model Animal {\n  init(name) {\n    self.name = name\n  }\n  speak() {\n    give \"...\"\n  }\n  greet() {\n    give self.name + \" says \" + self.speak()\n  }\n}\nmodel Dog extends Animal {\n  speak() {\n    give \"woof\"\n  }\n}\nd = Dog(\"rex\")\ng = d.greet()\n",
        );
        assert_eq!(text(&interp, "g"), "rex says woof");
    }

    #[test]
    fn hidden_members_are_reachable_only_through_self() {
        let interp = run_program(
            "model Safe {\n  hidden code = 42\n  peek() {\n    give self.code\n  }\n}\ns = Safe()\nx = s.peek()\n",
        );
        assert_eq!(number(&interp, "x"), 42.0);

        let err = run_err("model Safe {\n  hidden code = 42\n}\ns = Safe()\nx = s.code\n");
        assert!(err.message.contains("hidden"));
    }

    #[test]
    fn structs_take_their_fields_positionally() {
        let interp = run_program("struct Point {\n  x, y\n}\np = Point(1, 2)\ns = p.x + p.y\n");
        assert_eq!(number(&interp, "s"), 3.0);
    }

    #[test]
    fn try_catch_binds_the_error_message() {
        let interp = run_program(
            "msg = \"\"\ntry {\n  throw \"boom\"\n} catch e {\n  msg = e\n}\n",
        );
        assert_eq!(text(&interp, "msg"), "boom");
    }

    #[test]
    fn runtime_errors_are_catchable() {
        let interp = run_program(
            "msg = \"\"\ntry {\n  x = 1 / 0\n} catch e {\n  msg = e\n}\n",
        );
        assert_eq!(text(&interp, "msg"), "division by zero");
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let err = run_err("task add(a, b) {\n  give a + b\n}\nx = add(1)\n");
        assert!(err.message.contains("expects 2 argument(s), got 1"));
    }

    #[test]
    fn give_at_the_top_level_is_an_error() {
        let err = run_err("give 1\n");
        assert!(err.message.contains("control flow"));
    }

    #[test]
    fn index_out_of_bounds_is_an_error() {
        let err = run_err("a = [1]\nx = a[3]\n");
        assert!(err.message.contains("out of bounds"));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn dict_access_via_property_and_index() {
        let interp = run_program(
            "d = {count: 1}\nd.count += 1\nd[\"extra\"] = 5\nx = d[\"count\"] + d.extra\nmissing = d.absent\n",
        );
        assert_eq!(number(&interp, "x"), 7.0);
        assert_eq!(global(&interp, "missing"), Value::Nil);
    }

    #[test]
    fn out_writes_the_display_form() {
        let buf = SharedBuf::default();
        let mut interp = Interpreter::with_output(Box::new(buf.clone()));
        let tokens = lexer::tokenize("out 3.0 + 1\nout \"hi\"\nout [1, \"a\"]\n").unwrap();
        let program = parser::parse(tokens).unwrap();
        interp.run(&program).unwrap();

        let written = String::from_utf8(buf.0.borrow().clone()).unwrap();
        assert_eq!(written, "4\nhi\n[1, \"a\"]\n");
    }

    #[test]
    fn blocks_scope_declarations_but_assign_outward() {
        let interp = run_program("x = 1\n{\n  x = 2\n  y = 10\n}\n");
        // `x` was visible, so the block assigned it; `y` was not, so the
        // declaration stayed local to the block.
        assert_eq!(number(&interp, "x"), 2.0);
        assert!(Environment::get(interp.globals(), "y").is_none());
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
        }
    }
}
