//! Syntax tree produced by the parser.
//!
//! Function bodies are shared via `Rc` so closures and methods can hold
//! them without cloning statement trees.

use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    SelfRef,
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    GetProperty {
        object: Box<Expr>,
        name: String,
    },
    Array(Vec<Expr>),
    /// `{key: value}`; bare identifier keys are lowered to string literals
    /// by the parser.
    Dict(Vec<(Expr, Expr)>),
    Assign {
        name: String,
        value: Box<Expr>,
    },
    AssignIndex {
        object: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },
    SetProperty {
        object: Box<Expr>,
        name: String,
        value: Box<Expr>,
    },
    Lambda {
        params: Vec<String>,
        body: Rc<Vec<Stmt>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expr(Expr),
    Out(Expr),
    /// `name = expr` in statement position: assigns when `name` is already
    /// visible, declares in the current scope otherwise.
    VarDecl {
        name: String,
        init: Expr,
    },
    Block(Vec<Stmt>),
    When {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    /// `repeat i = start to end`, bounds inclusive, counting down when
    /// start > end.
    Repeat {
        variable: String,
        start: Expr,
        end: Expr,
        body: Box<Stmt>,
    },
    /// `get x in iterable`.
    ForEach {
        variable: String,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Task {
        name: String,
        params: Vec<String>,
        body: Rc<Vec<Stmt>>,
    },
    Give(Option<Expr>),
    Escape,
    Skip,
    Model(ModelDecl),
    Struct {
        name: String,
        fields: Vec<String>,
    },
    Use(String),
    Try {
        body: Box<Stmt>,
        catch_var: String,
        catch_body: Box<Stmt>,
    },
    Throw(Expr),
}

#[derive(Debug, Clone)]
pub struct ModelDecl {
    pub name: String,
    pub parent: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub hidden: bool,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub hidden: bool,
    pub params: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
}
