//! CLI entry point: run a script file, or start a REPL when no file is
//! given. Exit codes follow sysexits: 65 for lex/parse errors, 66 for an
//! unreadable file, 70 for a runtime error.

use clap::Parser;
use stampede_script::ast::StmtKind;
use stampede_script::{lexer, parser, run_source, Interpreter, ScriptError, Value};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "stampede-script", version, about = "Run behavior scripts, or start a REPL.")]
struct Args {
    /// Script file to execute; omit to start a REPL.
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    let _ = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "stampede_script=info".into()),
        )
        .try_init();

    let args = Args::parse();
    match args.script {
        Some(path) => run_file(&path),
        None => repl(),
    }
}

fn run_file(path: &Path) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read `{}`: {err}", path.display());
            return ExitCode::from(66);
        }
    };

    let mut interp = Interpreter::new();
    match run_source(&mut interp, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ScriptError::Lex(err)) => {
            eprintln!("error: {err}");
            ExitCode::from(65)
        }
        Err(ScriptError::Parse(errors)) => {
            for err in &errors {
                eprintln!("error: {err}");
            }
            ExitCode::from(65)
        }
        Err(ScriptError::Runtime(err)) => {
            eprintln!("error: {err}");
            ExitCode::from(70)
        }
    }
}

fn repl() -> ExitCode {
    println!("stampede-script {}", env!("CARGO_PKG_VERSION"));
    println!("type `exit` to leave");

    let mut interp = Interpreter::new();
    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { ">>> " } else { "... " };
        print!("{prompt}");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                eprintln!("error: {err}");
                break;
            }
        }

        if buffer.is_empty() && line.trim() == "exit" {
            break;
        }
        buffer.push_str(&line);

        // Keep reading while delimiters are open.
        if open_delimiters(&buffer) > 0 {
            continue;
        }

        evaluate_chunk(&mut interp, &buffer);
        buffer.clear();
    }
    ExitCode::SUCCESS
}

/// Net count of unclosed braces, brackets, and parens outside strings.
fn open_delimiters(source: &str) -> i32 {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in source.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' => depth -= 1,
            _ => {}
        }
    }
    depth
}

fn evaluate_chunk(interp: &mut Interpreter, source: &str) {
    let tokens = match lexer::tokenize(source) {
        Ok(tokens) => tokens,
        Err(err) => {
            eprintln!("error: {err}");
            return;
        }
    };
    let program = match parser::parse(tokens) {
        Ok(program) => program,
        Err(errors) => {
            for err in errors {
                eprintln!("error: {err}");
            }
            return;
        }
    };

    // Echo the value of a bare expression.
    if let [stmt] = program.as_slice() {
        if let StmtKind::Expr(expr) = &stmt.kind {
            match interp.eval_expr(expr) {
                Ok(Value::Nil) => {}
                Ok(value) => println!("{value}"),
                Err(err) => eprintln!("error: {err}"),
            }
            return;
        }
    }

    if let Err(err) = interp.run(&program) {
        eprintln!("error: {err}");
    }
}
