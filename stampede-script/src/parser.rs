//! Recursive-descent parser.
//!
//! Precedence, loosest to tightest: assignment, `or`, `and`, equality,
//! comparison (including `in`), term, factor, unary, call/index/property,
//! primary. On an error the parser synchronizes to the next statement
//! boundary and keeps going, so one run can report several errors.

use crate::ast::*;
use crate::token::{Token, TokenKind};
use std::rc::Rc;

#[derive(Debug, Clone, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: u32,
}

pub fn parse(tokens: Vec<Token>) -> Result<Vec<Stmt>, Vec<ParseError>> {
    let mut parser = Parser { tokens, pos: 0 };
    let mut program = Vec::new();
    let mut errors = Vec::new();

    loop {
        parser.skip_newlines();
        if parser.at_end() {
            break;
        }
        match parser.declaration() {
            Ok(stmt) => program.push(stmt),
            Err(err) => {
                errors.push(err);
                parser.synchronize();
            }
        }
    }

    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    // ---- statements ----

    fn declaration(&mut self) -> Result<Stmt, ParseError> {
        if self.eat(&TokenKind::Task) {
            return self.task_statement();
        }
        if self.eat(&TokenKind::Model) {
            return self.model_statement();
        }
        if self.eat(&TokenKind::Struct) {
            return self.struct_statement();
        }
        if self.eat(&TokenKind::Use) {
            return self.use_statement();
        }
        self.statement()
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.peek().line;
        if self.eat(&TokenKind::Out) {
            let value = self.expression()?;
            return Ok(stmt(StmtKind::Out(value), line));
        }
        if self.eat(&TokenKind::When) {
            return self.when_statement();
        }
        if self.eat(&TokenKind::While) {
            let condition = self.expression()?;
            let body = Box::new(self.branch_body()?);
            return Ok(stmt(StmtKind::While { condition, body }, line));
        }
        if self.eat(&TokenKind::Repeat) {
            let variable = self.expect_identifier("expected loop variable after `repeat`")?;
            self.expect(&TokenKind::Equal, "expected `=` after loop variable")?;
            let start = self.expression()?;
            self.expect(&TokenKind::To, "expected `to` in repeat bounds")?;
            let end = self.expression()?;
            let body = Box::new(self.branch_body()?);
            return Ok(stmt(
                StmtKind::Repeat {
                    variable,
                    start,
                    end,
                    body,
                },
                line,
            ));
        }
        if self.eat(&TokenKind::Get) {
            let variable = self.expect_identifier("expected variable after `get`")?;
            self.expect(&TokenKind::In, "expected `in` after loop variable")?;
            let iterable = self.expression()?;
            let body = Box::new(self.branch_body()?);
            return Ok(stmt(
                StmtKind::ForEach {
                    variable,
                    iterable,
                    body,
                },
                line,
            ));
        }
        if self.eat(&TokenKind::Give) {
            let value = if matches!(
                self.peek().kind,
                TokenKind::Newline | TokenKind::Eof | TokenKind::RightBrace
            ) {
                None
            } else {
                Some(self.expression()?)
            };
            return Ok(stmt(StmtKind::Give(value), line));
        }
        if self.eat(&TokenKind::Escape) {
            return Ok(stmt(StmtKind::Escape, line));
        }
        if self.eat(&TokenKind::Skip) {
            return Ok(stmt(StmtKind::Skip, line));
        }
        if self.eat(&TokenKind::Try) {
            return self.try_statement();
        }
        if self.eat(&TokenKind::Throw) {
            let value = self.expression()?;
            return Ok(stmt(StmtKind::Throw(value), line));
        }
        // `{` in statement position always opens a block; dict literals
        // only occur in expression position.
        if self.eat(&TokenKind::LeftBrace) {
            return self.block_statement();
        }
        self.expression_statement()
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        let line = expr.line;
        // A bare assignment in statement position declares or assigns.
        if let ExprKind::Assign { name, value } = expr.kind {
            return Ok(stmt(StmtKind::VarDecl { name, init: *value }, line));
        }
        Ok(stmt(StmtKind::Expr(expr), line))
    }

    fn block_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.previous_line();
        let body = self.block_body()?;
        Ok(stmt(StmtKind::Block(body), line))
    }

    fn block_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat(&TokenKind::RightBrace) {
                return Ok(body);
            }
            if self.at_end() {
                return Err(self.error("expected `}` to close block"));
            }
            body.push(self.declaration()?);
        }
    }

    /// A loop or branch body: a braced block or a single statement.
    fn branch_body(&mut self) -> Result<Stmt, ParseError> {
        self.skip_newlines();
        if self.eat(&TokenKind::LeftBrace) {
            self.block_statement()
        } else {
            self.statement()
        }
    }

    fn when_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.previous_line();
        let condition = self.expression()?;
        let then_branch = Box::new(self.branch_body()?);

        // `other` may sit on the line after the closing brace.
        let checkpoint = self.pos;
        self.skip_newlines();
        let else_branch = if self.eat(&TokenKind::Other) {
            self.skip_newlines();
            if self.eat(&TokenKind::When) {
                Some(Box::new(self.when_statement()?))
            } else if self.eat(&TokenKind::LeftBrace) {
                Some(Box::new(self.block_statement()?))
            } else {
                Some(Box::new(self.statement()?))
            }
        } else {
            self.pos = checkpoint;
            None
        };

        Ok(stmt(
            StmtKind::When {
                condition,
                then_branch,
                else_branch,
            },
            line,
        ))
    }

    fn task_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.previous_line();
        let name = self.expect_identifier("expected task name")?;
        self.expect(&TokenKind::LeftParen, "expected `(` after task name")?;
        let params = self.parameter_list()?;
        self.skip_newlines();
        self.expect(&TokenKind::LeftBrace, "expected `{` before task body")?;
        let body = Rc::new(self.block_body()?);
        Ok(stmt(StmtKind::Task { name, params, body }, line))
    }

    fn model_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.previous_line();
        let name = self.expect_identifier("expected model name")?;
        let parent = if self.eat(&TokenKind::Extends) {
            Some(self.expect_identifier("expected parent model name")?)
        } else {
            None
        };
        self.expect(&TokenKind::LeftBrace, "expected `{` after model name")?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat(&TokenKind::RightBrace) {
                break;
            }
            if self.at_end() {
                return Err(self.error("expected `}` to close model"));
            }
            if self.eat(&TokenKind::Init) {
                self.expect(&TokenKind::LeftParen, "expected `(` after `init`")?;
                let params = self.parameter_list()?;
                self.skip_newlines();
                self.expect(&TokenKind::LeftBrace, "expected `{` before init body")?;
                let body = Rc::new(self.block_body()?);
                methods.push(MethodDecl {
                    name: "init".to_string(),
                    hidden: false,
                    params,
                    body,
                });
                continue;
            }

            let hidden = if self.eat(&TokenKind::Hidden) {
                true
            } else {
                self.eat(&TokenKind::Shown);
                false
            };
            let member = self.expect_identifier("expected member name")?;
            if self.eat(&TokenKind::LeftParen) {
                let params = self.parameter_list()?;
                self.skip_newlines();
                self.expect(&TokenKind::LeftBrace, "expected `{` before method body")?;
                let body = Rc::new(self.block_body()?);
                methods.push(MethodDecl {
                    name: member,
                    hidden,
                    params,
                    body,
                });
            } else if self.eat(&TokenKind::Equal) {
                let value = self.expression()?;
                fields.push(FieldDecl {
                    name: member,
                    hidden,
                    value: Some(value),
                });
            } else {
                fields.push(FieldDecl {
                    name: member,
                    hidden,
                    value: None,
                });
            }
        }

        Ok(stmt(
            StmtKind::Model(ModelDecl {
                name,
                parent,
                fields,
                methods,
            }),
            line,
        ))
    }

    fn struct_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.previous_line();
        let name = self.expect_identifier("expected struct name")?;
        self.expect(&TokenKind::LeftBrace, "expected `{` before struct body")?;

        let mut fields = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat(&TokenKind::RightBrace) {
                break;
            }
            if self.at_end() {
                return Err(self.error("expected `}` to close struct"));
            }
            fields.push(self.expect_identifier("expected field name")?);
            self.eat(&TokenKind::Comma);
        }

        Ok(stmt(StmtKind::Struct { name, fields }, line))
    }

    fn use_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.previous_line();
        let token = self.advance();
        match token.kind {
            TokenKind::Str(path) => Ok(stmt(StmtKind::Use(path), line)),
            _ => Err(ParseError {
                message: "expected file path string after `use`".to_string(),
                line: token.line,
            }),
        }
    }

    fn try_statement(&mut self) -> Result<Stmt, ParseError> {
        let line = self.previous_line();
        self.expect(&TokenKind::LeftBrace, "expected `{` after `try`")?;
        let body = Box::new(self.block_statement()?);
        self.skip_newlines();
        self.expect(&TokenKind::Catch, "expected `catch` after try block")?;
        let catch_var = self.expect_identifier("expected variable name after `catch`")?;
        self.skip_newlines();
        self.expect(&TokenKind::LeftBrace, "expected `{` after catch variable")?;
        let catch_body = Box::new(self.block_statement()?);
        Ok(stmt(
            StmtKind::Try {
                body,
                catch_var,
                catch_body,
            },
            line,
        ))
    }

    fn parameter_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params = Vec::new();
        if !matches!(self.peek().kind, TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier("expected parameter name")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen, "expected `)` after parameters")?;
        Ok(params)
    }

    // ---- expressions ----

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let target = self.or_expr()?;

        if self.eat(&TokenKind::Equal) {
            let value = self.assignment()?;
            return self.make_assignment(target, value);
        }
        for (token, op) in [
            (TokenKind::PlusEqual, BinaryOp::Add),
            (TokenKind::MinusEqual, BinaryOp::Sub),
            (TokenKind::StarEqual, BinaryOp::Mul),
            (TokenKind::SlashEqual, BinaryOp::Div),
        ] {
            if self.eat(&token) {
                let rhs = self.assignment()?;
                let line = target.line;
                let value = Expr {
                    kind: ExprKind::Binary {
                        op,
                        left: Box::new(target.clone()),
                        right: Box::new(rhs),
                    },
                    line,
                };
                return self.make_assignment(target, value);
            }
        }

        Ok(target)
    }

    fn make_assignment(&self, target: Expr, value: Expr) -> Result<Expr, ParseError> {
        let line = target.line;
        let kind = match target.kind {
            ExprKind::Identifier(name) => ExprKind::Assign {
                name,
                value: Box::new(value),
            },
            ExprKind::Index { object, index } => ExprKind::AssignIndex {
                object,
                index,
                value: Box::new(value),
            },
            ExprKind::GetProperty { object, name } => ExprKind::SetProperty {
                object,
                name,
                value: Box::new(value),
            },
            _ => {
                return Err(ParseError {
                    message: "invalid assignment target".to_string(),
                    line,
                })
            }
        };
        Ok(Expr { kind, line })
    }

    fn or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.and_expr()?;
        while self.eat(&TokenKind::Or) {
            let right = self.and_expr()?;
            left = logical(LogicalOp::Or, left, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.equality()?;
        while self.eat(&TokenKind::And) {
            let right = self.equality()?;
            left = logical(LogicalOp::And, left, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.comparison()?;
        loop {
            let op = if self.eat(&TokenKind::EqualEqual) {
                BinaryOp::Eq
            } else if self.eat(&TokenKind::BangEqual) {
                BinaryOp::Ne
            } else {
                return Ok(left);
            };
            let right = self.comparison()?;
            left = binary(op, left, right);
        }
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.term()?;
        loop {
            let op = if self.eat(&TokenKind::Less) {
                BinaryOp::Lt
            } else if self.eat(&TokenKind::LessEqual) {
                BinaryOp::Le
            } else if self.eat(&TokenKind::Greater) {
                BinaryOp::Gt
            } else if self.eat(&TokenKind::GreaterEqual) {
                BinaryOp::Ge
            } else if self.eat(&TokenKind::In) {
                BinaryOp::In
            } else {
                return Ok(left);
            };
            let right = self.term()?;
            left = binary(op, left, right);
        }
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.factor()?;
        loop {
            let op = if self.eat(&TokenKind::Plus) {
                BinaryOp::Add
            } else if self.eat(&TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.factor()?;
            left = binary(op, left, right);
        }
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;
        loop {
            let op = if self.eat(&TokenKind::Star) {
                BinaryOp::Mul
            } else if self.eat(&TokenKind::Slash) {
                BinaryOp::Div
            } else if self.eat(&TokenKind::Percent) {
                BinaryOp::Mod
            } else {
                return Ok(left);
            };
            let right = self.unary()?;
            left = binary(op, left, right);
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let line = self.peek().line;
        if self.eat(&TokenKind::Minus) {
            let operand = Box::new(self.unary()?);
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand,
                },
                line,
            });
        }
        if self.eat(&TokenKind::Not) {
            let operand = Box::new(self.unary()?);
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand,
                },
                line,
            });
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;
        loop {
            let line = self.peek().line;
            if self.eat(&TokenKind::LeftParen) {
                let mut args = Vec::new();
                self.skip_newlines();
                if !matches!(self.peek().kind, TokenKind::RightParen) {
                    loop {
                        args.push(self.expression()?);
                        self.skip_newlines();
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                        self.skip_newlines();
                    }
                }
                self.expect(&TokenKind::RightParen, "expected `)` after arguments")?;
                expr = Expr {
                    kind: ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    line,
                };
            } else if self.eat(&TokenKind::LeftBracket) {
                let index = Box::new(self.expression()?);
                self.expect(&TokenKind::RightBracket, "expected `]` after index")?;
                expr = Expr {
                    kind: ExprKind::Index {
                        object: Box::new(expr),
                        index,
                    },
                    line,
                };
            } else if self.eat(&TokenKind::Dot) {
                let token = self.advance();
                let name = token.kind.word().map(str::to_string).ok_or(ParseError {
                    message: "expected property name after `.`".to_string(),
                    line: token.line,
                })?;
                expr = Expr {
                    kind: ExprKind::GetProperty {
                        object: Box::new(expr),
                        name,
                    },
                    line,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance();
        let line = token.line;
        let kind = match token.kind {
            TokenKind::Number(n) => ExprKind::Literal(Literal::Number(n)),
            TokenKind::Str(s) => ExprKind::Literal(Literal::Str(s)),
            TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
            TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
            TokenKind::Nil => ExprKind::Literal(Literal::Nil),
            TokenKind::SelfKw => ExprKind::SelfRef,
            TokenKind::Identifier(name) => ExprKind::Identifier(name),
            TokenKind::LeftParen => {
                let inner = self.expression()?;
                self.expect(&TokenKind::RightParen, "expected `)` after expression")?;
                return Ok(inner);
            }
            TokenKind::LeftBracket => return self.array_literal(line),
            TokenKind::LeftBrace => return self.dict_literal(line),
            TokenKind::Pipe => return self.lambda(line),
            _ => {
                return Err(ParseError {
                    message: "expected expression".to_string(),
                    line,
                })
            }
        };
        Ok(Expr { kind, line })
    }

    fn array_literal(&mut self, line: u32) -> Result<Expr, ParseError> {
        let mut elements = Vec::new();
        self.skip_newlines();
        if !matches!(self.peek().kind, TokenKind::RightBracket) {
            loop {
                elements.push(self.expression()?);
                self.skip_newlines();
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
        }
        self.expect(&TokenKind::RightBracket, "expected `]` after array elements")?;
        Ok(Expr {
            kind: ExprKind::Array(elements),
            line,
        })
    }

    fn dict_literal(&mut self, line: u32) -> Result<Expr, ParseError> {
        let mut pairs = Vec::new();
        loop {
            self.skip_newlines();
            if self.eat(&TokenKind::RightBrace) {
                break;
            }
            if self.at_end() {
                return Err(self.error("expected `}` after dictionary"));
            }

            let entry = self.expression()?;
            // `{x = 1}` parses as an assignment; reuse its parts.
            if let ExprKind::Assign { name, value } = entry.kind {
                let key = Expr {
                    kind: ExprKind::Literal(Literal::Str(name)),
                    line: entry.line,
                };
                pairs.push((key, *value));
            } else {
                let mut key = entry;
                if !self.eat(&TokenKind::Equal) {
                    self.expect(&TokenKind::Colon, "expected `:` or `=` after dictionary key")?;
                }
                // Bare identifier keys mean their own name.
                if let ExprKind::Identifier(name) = key.kind {
                    key = Expr {
                        kind: ExprKind::Literal(Literal::Str(name)),
                        line: key.line,
                    };
                }
                let value = self.expression()?;
                pairs.push((key, value));
            }

            if self.eat(&TokenKind::Comma) {
                continue;
            }
        }
        Ok(Expr {
            kind: ExprKind::Dict(pairs),
            line,
        })
    }

    fn lambda(&mut self, line: u32) -> Result<Expr, ParseError> {
        let mut params = Vec::new();
        if !matches!(self.peek().kind, TokenKind::Pipe) {
            loop {
                params.push(self.expect_identifier("expected parameter name")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::Pipe, "expected `|` after lambda parameters")?;
        self.skip_newlines();

        let body = if self.eat(&TokenKind::Arrow) {
            self.skip_newlines();
            let value = self.expression()?;
            let value_line = value.line;
            Rc::new(vec![stmt(StmtKind::Give(Some(value)), value_line)])
        } else if self.eat(&TokenKind::LeftBrace) {
            Rc::new(self.block_body()?)
        } else {
            let value = self.expression()?;
            let value_line = value.line;
            Rc::new(vec![stmt(StmtKind::Give(Some(value)), value_line)])
        };

        Ok(Expr {
            kind: ExprKind::Lambda { params, body },
            line,
        })
    }

    // ---- plumbing ----

    fn peek(&self) -> &Token {
        static EOF: Token = Token {
            kind: TokenKind::Eof,
            line: 0,
        };
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    fn at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn expect_identifier(&mut self, message: &str) -> Result<String, ParseError> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error(message)),
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek().kind, TokenKind::Newline) {
            self.pos += 1;
        }
    }

    fn previous_line(&self) -> u32 {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map_or(1, |t| t.line)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            line: self.peek().line,
        }
    }

    /// Drop tokens through the next statement boundary. The failing parse
    /// may already have consumed the terminating newline.
    fn synchronize(&mut self) {
        if self.pos > 0
            && matches!(
                self.tokens.get(self.pos - 1).map(|t| &t.kind),
                Some(TokenKind::Newline)
            )
        {
            return;
        }
        while !self.at_end() {
            if matches!(self.advance().kind, TokenKind::Newline) {
                return;
            }
        }
    }
}

fn stmt(kind: StmtKind, line: u32) -> Stmt {
    Stmt { kind, line }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let line = left.line;
    Expr {
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        line,
    }
}

fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    let line = left.line;
    Expr {
        kind: ExprKind::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    fn parse_source(source: &str) -> Vec<Stmt> {
        parse(lexer::tokenize(source).unwrap()).unwrap()
    }

    fn parse_errors(source: &str) -> Vec<ParseError> {
        parse(lexer::tokenize(source).unwrap()).unwrap_err()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let program = parse_source("x = 1 + 2 * 3\n");
        let StmtKind::VarDecl { init, .. } = &program[0].kind else {
            panic!("expected var decl");
        };
        let ExprKind::Binary { op, right, .. } = &init.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn bare_assignment_statement_becomes_a_declaration() {
        let program = parse_source("count = 0\n");
        assert!(matches!(
            &program[0].kind,
            StmtKind::VarDecl { name, .. } if name == "count"
        ));
    }

    #[test]
    fn compound_assignment_desugars_to_binary() {
        let program = parse_source("x += 2\n");
        let StmtKind::VarDecl { name, init } = &program[0].kind else {
            panic!("expected var decl");
        };
        assert_eq!(name, "x");
        assert!(matches!(
            init.kind,
            ExprKind::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn when_chains_through_other_when() {
        let program = parse_source("when x > 1 {\n  out 1\n}\nother when x > 0 {\n  out 2\n}\nother {\n  out 3\n}\n");
        let StmtKind::When { else_branch, .. } = &program[0].kind else {
            panic!("expected when");
        };
        let inner = else_branch.as_ref().expect("first else");
        let StmtKind::When { else_branch, .. } = &inner.kind else {
            panic!("expected chained when");
        };
        assert!(else_branch.is_some());
    }

    #[test]
    fn repeat_carries_both_bounds() {
        let program = parse_source("repeat i = 1 to 5 {\n  out i\n}\n");
        assert!(matches!(
            &program[0].kind,
            StmtKind::Repeat { variable, .. } if variable == "i"
        ));
    }

    #[test]
    fn task_declaration_parses_params_and_body() {
        let program = parse_source("task add(a, b) {\n  give a + b\n}\n");
        let StmtKind::Task { name, params, body } = &program[0].kind else {
            panic!("expected task");
        };
        assert_eq!(name, "add");
        assert_eq!(params, &["a".to_string(), "b".to_string()]);
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn lambda_with_arrow_body_gives_its_expression() {
        let program = parse_source("double = |x| => x * 2\n");
        let StmtKind::VarDecl { init, .. } = &program[0].kind else {
            panic!("expected var decl");
        };
        let ExprKind::Lambda { params, body } = &init.kind else {
            panic!("expected lambda");
        };
        assert_eq!(params, &["x".to_string()]);
        assert!(matches!(body[0].kind, StmtKind::Give(Some(_))));
    }

    #[test]
    fn dict_literal_lowers_identifier_keys_to_strings() {
        let program = parse_source("d = {name: \"x\", count = 2}\n");
        let StmtKind::VarDecl { init, .. } = &program[0].kind else {
            panic!("expected var decl");
        };
        let ExprKind::Dict(pairs) = &init.kind else {
            panic!("expected dict");
        };
        assert!(matches!(
            &pairs[0].0.kind,
            ExprKind::Literal(Literal::Str(k)) if k == "name"
        ));
        assert!(matches!(
            &pairs[1].0.kind,
            ExprKind::Literal(Literal::Str(k)) if k == "count"
        ));
    }

    #[test]
    fn model_declaration_collects_members() {
        let program = parse_source(
            "model Point {\n  init(x, y) {\n    self.x = x\n    self.y = y\n  }\n  hidden secret = 1\n  dist() {\n    give self.x + self.y\n  }\n}\n",
        );
        let StmtKind::Model(decl) = &program[0].kind else {
            panic!("expected model");
        };
        assert_eq!(decl.name, "Point");
        assert_eq!(decl.methods.len(), 2);
        assert_eq!(decl.fields.len(), 1);
        assert!(decl.fields[0].hidden);
    }

    #[test]
    fn invalid_assignment_target_is_an_error() {
        let errors = parse_errors("1 + 2 = 3\n");
        assert!(errors[0].message.contains("assignment target"));
    }

    #[test]
    fn parser_recovers_and_reports_multiple_errors() {
        let errors = parse_errors("x = \ny = \n");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 1);
        assert_eq!(errors[1].line, 2);
    }

    #[test]
    fn in_operator_parses_as_comparison() {
        let program = parse_source("found = 2 in [1, 2]\n");
        let StmtKind::VarDecl { init, .. } = &program[0].kind else {
            panic!("expected var decl");
        };
        assert!(matches!(
            init.kind,
            ExprKind::Binary {
                op: BinaryOp::In,
                ..
            }
        ));
    }
}
