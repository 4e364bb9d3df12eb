//! A small dynamically typed scripting language for load-test fixtures
//! and service stubs.
//!
//! The pipeline is [`lexer::tokenize`] -> [`parser::parse`] ->
//! [`Interpreter::run`]. Scripts declare tasks (functions), models
//! (classes), and structs; control flow uses `when`/`other`, `while`,
//! `repeat .. to`, and `get .. in`, with `give`/`escape`/`skip` for
//! returning and loop control. Builtins cover strings, arrays, dicts,
//! math, files, JSON, and plain HTTP so a script can poke the services a
//! load test targets.

pub mod ast;
pub mod builtins;
pub mod env;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;

pub use interp::{Interpreter, RuntimeError};
pub use lexer::LexError;
pub use parser::ParseError;
pub use value::Value;

/// Everything that can go wrong between source text and execution.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("parse failed with {} error(s)", .0.len())]
    Parse(Vec<ParseError>),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Lex, parse, and execute `source` on the given interpreter.
pub fn run_source(interp: &mut Interpreter, source: &str) -> Result<(), ScriptError> {
    let tokens = lexer::tokenize(source)?;
    let program = parser::parse(tokens).map_err(ScriptError::Parse)?;
    interp.run(&program)?;
    Ok(())
}
