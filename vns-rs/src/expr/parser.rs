//! Pratt parser for the expression language.
//!
//! Two dispatch tables drive it: one maps a token kind to the function that
//! parses an expression *starting* with that token, the other maps a token
//! kind to the function that extends an already-parsed left operand, paired
//! with that operator's binding precedence.
//!
//! Precedence (lowest → highest):
//!   lowest  →  assign  →  or  →  and  →  equals  →  less/greater  →
//!   sum  →  product  →  prefix  →  call
//!
//! Errors are collected rather than returned early: a statement that fails
//! to parse is abandoned, the parser skips to the next `;`, and carries on.

use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::scan::Position;

use super::ast::{Block, Expression, FunctionLiteral, InfixOp, PrefixOp, Program, Statement};
use super::lexer::Lexer;
use super::token::{Token, TokenKind};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{position}: expected next token to be {expected}, got {actual} instead")]
    UnexpectedToken {
        expected: TokenKind,
        actual: TokenKind,
        position: Position,
    },
    #[error("{position}: no prefix parse function for {kind} found")]
    NoPrefixParse { kind: TokenKind, position: Position },
    #[error("{position}: could not parse {literal:?} as integer")]
    InvalidInteger { literal: String, position: Position },
    #[error("{position}: could not parse {literal:?} as double")]
    InvalidDouble { literal: String, position: Position },
    #[error("{position}: cannot assign to {target}")]
    InvalidAssignTarget { target: String, position: Position },
    #[error("{position}: expression nested too deeply")]
    TooDeep { position: Position },
}

/// Expressions and blocks nested deeper than this are rejected.
pub const MAX_NESTING: usize = 256;

// ── Precedence ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Assign,
    Or,
    And,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

type PrefixParseFn = fn(&mut Parser) -> Option<Expression>;
type InfixParseFn = fn(&mut Parser, Expression) -> Option<Expression>;

// ── Parser ────────────────────────────────────────────────────────────────────

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    depth: usize,
    prefix_fns: HashMap<TokenKind, PrefixParseFn>,
    infix_fns: HashMap<TokenKind, (InfixParseFn, Precedence)>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut p = Parser {
            tokens,
            pos: 0,
            errors: Vec::new(),
            depth: 0,
            prefix_fns: HashMap::new(),
            infix_fns: HashMap::new(),
        };

        p.prefix_fns.insert(TokenKind::Ident, Parser::parse_identifier);
        p.prefix_fns.insert(TokenKind::Int, Parser::parse_integer);
        p.prefix_fns.insert(TokenKind::Double, Parser::parse_double);
        p.prefix_fns.insert(TokenKind::Str, Parser::parse_string);
        p.prefix_fns.insert(TokenKind::True, Parser::parse_boolean);
        p.prefix_fns.insert(TokenKind::False, Parser::parse_boolean);
        p.prefix_fns.insert(TokenKind::Bang, Parser::parse_prefix);
        p.prefix_fns.insert(TokenKind::Minus, Parser::parse_prefix);
        p.prefix_fns.insert(TokenKind::LeftParen, Parser::parse_grouped);
        p.prefix_fns.insert(TokenKind::If, Parser::parse_if);
        p.prefix_fns.insert(TokenKind::Function, Parser::parse_function);

        use Precedence as P;
        for (kind, prec) in [
            (TokenKind::Plus, P::Sum),
            (TokenKind::Minus, P::Sum),
            (TokenKind::Asterisk, P::Product),
            (TokenKind::Slash, P::Product),
            (TokenKind::Lt, P::LessGreater),
            (TokenKind::Gt, P::LessGreater),
            (TokenKind::Le, P::LessGreater),
            (TokenKind::Ge, P::LessGreater),
            (TokenKind::Eq, P::Equals),
            (TokenKind::NotEq, P::Equals),
            (TokenKind::And, P::And),
            (TokenKind::Or, P::Or),
        ] {
            p.infix_fns.insert(kind, (Parser::parse_infix as InfixParseFn, prec));
        }
        p.infix_fns
            .insert(TokenKind::Assign, (Parser::parse_assign as InfixParseFn, P::Assign));
        p.infix_fns
            .insert(TokenKind::LeftParen, (Parser::parse_call as InfixParseFn, P::Call));
        p
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    // ── Token cursor ──────────────────────────────────────────────────────────

    fn cur(&self) -> &Token {
        // The lexer always ends the stream with Eof; clamp to it.
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + 1).min(last)]
    }

    fn next_token(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur().is(kind)
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek().is(kind)
    }

    /// Advance if the next token is `kind`; otherwise record an error.
    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            true
        } else {
            let (actual, position) = (self.peek().kind, self.peek().position);
            self.errors.push(ParseError::UnexpectedToken {
                expected: kind,
                actual,
                position,
            });
            false
        }
    }

    fn peek_precedence(&self) -> Precedence {
        self.infix_fns
            .get(&self.peek().kind)
            .map(|&(_, prec)| prec)
            .unwrap_or(Precedence::Lowest)
    }

    fn cur_precedence(&self) -> Precedence {
        self.infix_fns
            .get(&self.cur().kind)
            .map(|&(_, prec)| prec)
            .unwrap_or(Precedence::Lowest)
    }

    // ── Statements ────────────────────────────────────────────────────────────

    /// Parse the whole token stream.  Check [`errors`](Self::errors) after.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.cur_is(TokenKind::Eof) {
            match self.parse_statement() {
                Some(stmt) => program.statements.push(stmt),
                None => self.synchronize(),
            }
            self.next_token();
        }
        program
    }

    /// Step one level deeper, or record [`ParseError::TooDeep`] and refuse.
    /// Every successful call is paired with a [`leave`](Self::leave).
    fn enter(&mut self) -> bool {
        if self.depth >= MAX_NESTING {
            let position = self.cur().position;
            self.errors.push(ParseError::TooDeep { position });
            return false;
        }
        self.depth += 1;
        true
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Skip to the end of the current statement after an error.
    fn synchronize(&mut self) {
        while !self.cur_is(TokenKind::Semicolon) && !self.cur_is(TokenKind::Eof) {
            self.next_token();
        }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur().kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::LeftBrace => self.parse_block().map(Statement::Block),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur().literal.clone();
        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Statement::Expression(expr))
    }

    /// Parse `{ … }`.  On entry the current token is `{`; on success it is
    /// the matching `}`.
    fn parse_block(&mut self) -> Option<Block> {
        if !self.enter() {
            return None;
        }
        let block = self.parse_block_body();
        self.leave();
        block
    }

    fn parse_block_body(&mut self) -> Option<Block> {
        let mut block = Block::default();
        self.next_token();
        while !self.cur_is(TokenKind::RightBrace) {
            if self.cur_is(TokenKind::Eof) {
                let position = self.cur().position;
                self.errors.push(ParseError::UnexpectedToken {
                    expected: TokenKind::RightBrace,
                    actual: TokenKind::Eof,
                    position,
                });
                return None;
            }
            block.statements.push(self.parse_statement()?);
            self.next_token();
        }
        Some(block)
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        if !self.enter() {
            return None;
        }
        let expr = self.parse_operators(precedence);
        self.leave();
        expr
    }

    fn parse_operators(&mut self, precedence: Precedence) -> Option<Expression> {
        let Some(&prefix) = self.prefix_fns.get(&self.cur().kind) else {
            let (kind, position) = (self.cur().kind, self.cur().position);
            self.errors.push(ParseError::NoPrefixParse { kind, position });
            return None;
        };
        let mut left = prefix(self)?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            let Some(&(infix, _)) = self.infix_fns.get(&self.peek().kind) else {
                return Some(left);
            };
            self.next_token();
            left = infix(self, left)?;
        }
        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression::Identifier(self.cur().literal.clone()))
    }

    fn parse_integer(&mut self) -> Option<Expression> {
        let (literal, position) = (self.cur().literal.clone(), self.cur().position);
        self.integer_literal(literal, position)
    }

    fn integer_literal(&mut self, literal: String, position: Position) -> Option<Expression> {
        match literal.parse::<i32>() {
            Ok(n) => Some(Expression::Integer(n)),
            Err(_) => {
                let err = ParseError::InvalidInteger { literal, position };
                self.errors.push(err);
                None
            }
        }
    }

    fn parse_double(&mut self) -> Option<Expression> {
        let tok = self.cur();
        match tok.literal.parse::<f64>() {
            Ok(x) => Some(Expression::Double(x)),
            Err(_) => {
                let err = ParseError::InvalidDouble {
                    literal: tok.literal.clone(),
                    position: tok.position,
                };
                self.errors.push(err);
                None
            }
        }
    }

    fn parse_string(&mut self) -> Option<Expression> {
        Some(Expression::Str(self.cur().literal.clone()))
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        Some(Expression::Boolean(self.cur_is(TokenKind::True)))
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        let op = if self.cur_is(TokenKind::Bang) {
            PrefixOp::Not
        } else {
            PrefixOp::Neg
        };
        // `-<int>` is one literal so that i32::MIN is writable.
        if op == PrefixOp::Neg && self.peek_is(TokenKind::Int) {
            let position = self.cur().position;
            self.next_token();
            let literal = format!("-{}", self.cur().literal);
            return self.integer_literal(literal, position);
        }
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            op,
            right: Box::new(right),
        })
    }

    fn parse_grouped(&mut self) -> Option<Expression> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RightParen) {
            return None;
        }
        Some(expr)
    }

    fn parse_if(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LeftParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RightParen) || !self.expect_peek(TokenKind::LeftBrace) {
            return None;
        }
        let consequence = self.parse_block()?;

        let mut alternative = None;
        if self.peek_is(TokenKind::Else) {
            self.next_token();
            if !self.expect_peek(TokenKind::LeftBrace) {
                return None;
            }
            alternative = Some(self.parse_block()?);
        }

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LeftParen) {
            return None;
        }
        let parameters = self.parse_parameters()?;
        if !self.expect_peek(TokenKind::LeftBrace) {
            return None;
        }
        let body = self.parse_block()?;
        Some(Expression::Function(Rc::new(FunctionLiteral { parameters, body })))
    }

    fn parse_parameters(&mut self) -> Option<Vec<String>> {
        let mut params = Vec::new();
        if self.peek_is(TokenKind::RightParen) {
            self.next_token();
            return Some(params);
        }
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        params.push(self.cur().literal.clone());
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            params.push(self.cur().literal.clone());
        }
        if !self.expect_peek(TokenKind::RightParen) {
            return None;
        }
        Some(params)
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        let op = match self.cur().kind {
            TokenKind::Plus => InfixOp::Add,
            TokenKind::Minus => InfixOp::Sub,
            TokenKind::Asterisk => InfixOp::Mul,
            TokenKind::Slash => InfixOp::Div,
            TokenKind::Lt => InfixOp::Lt,
            TokenKind::Gt => InfixOp::Gt,
            TokenKind::Le => InfixOp::Le,
            TokenKind::Ge => InfixOp::Ge,
            TokenKind::Eq => InfixOp::Eq,
            TokenKind::NotEq => InfixOp::Ne,
            TokenKind::And => InfixOp::And,
            _ => InfixOp::Or,
        };
        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// `name = value`, right-associative.
    fn parse_assign(&mut self, left: Expression) -> Option<Expression> {
        let position = self.cur().position;
        let Expression::Identifier(name) = left else {
            self.errors.push(ParseError::InvalidAssignTarget {
                target: left.to_string(),
                position,
            });
            return None;
        };
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Expression::Assign {
            name,
            value: Box::new(value),
        })
    }

    fn parse_call(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_arguments()?;
        Some(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_arguments(&mut self) -> Option<Vec<Expression>> {
        let mut args = Vec::new();
        if self.peek_is(TokenKind::RightParen) {
            self.next_token();
            return Some(args);
        }
        self.next_token();
        args.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            args.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(TokenKind::RightParen) {
            return None;
        }
        Some(args)
    }
}

/// Lex and parse `src`.  Returns every error found if there was any.
pub fn parse(src: &str) -> Result<Program, Vec<ParseError>> {
    let mut parser = Parser::new(Lexer::new(src).tokenize());
    let program = parser.parse_program();
    if parser.errors.is_empty() {
        Ok(program)
    } else {
        Err(parser.errors)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
