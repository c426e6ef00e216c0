//! Expression lexer.
//!
//! Single pass, no lookahead beyond two characters.  Whitespace (including
//! newlines) separates tokens and is otherwise ignored.

use crate::scan::{Position, Scanner};

use super::token::{Token, TokenKind};

pub struct Lexer<'a> {
    scan: Scanner<'a>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            scan: Scanner::new(src),
            done: false,
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.scan.peek(), Some(c) if c.is_whitespace()) {
            self.scan.advance();
        }
    }

    /// Produce the next token.  After the input is exhausted this keeps
    /// returning `Eof`.
    pub fn next_token(&mut self) -> Token {
        self.skip_ws();
        let start = self.scan.position();
        let ch = match self.scan.advance() {
            None => return Token::new(TokenKind::Eof, "", start),
            Some(c) => c,
        };

        let kind = match ch {
            '0'..='9' => return self.read_number(start),
            '"' | '\'' => return self.read_string(ch, start),
            c if is_ident_start(c) => return self.read_ident(c, start),
            '=' => {
                if self.scan.eat('=') {
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.scan.eat('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.scan.eat('=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.scan.eat('=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.scan.eat('&') {
                    TokenKind::And
                } else {
                    TokenKind::Illegal
                }
            }
            '|' => {
                if self.scan.eat('|') {
                    TokenKind::Or
                } else {
                    TokenKind::Illegal
                }
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Slash,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            _ => TokenKind::Illegal,
        };
        Token::new(kind, self.scan.slice_from(start), start)
    }

    fn skip_digits(&mut self) {
        while matches!(self.scan.peek(), Some('0'..='9')) {
            self.scan.advance();
        }
    }

    fn read_number(&mut self, start: Position) -> Token {
        self.skip_digits();
        let mut kind = TokenKind::Int;
        if self.scan.peek() == Some('.') && matches!(self.scan.peek2(), Some('0'..='9')) {
            kind = TokenKind::Double;
            self.scan.advance();
            self.skip_digits();
        }
        Token::new(kind, self.scan.slice_from(start), start)
    }

    fn read_string(&mut self, quote: char, start: Position) -> Token {
        let mut s = String::new();
        loop {
            match self.scan.advance() {
                // Unterminated: hand the raw text to the parser as Illegal.
                None => return Token::new(TokenKind::Illegal, self.scan.slice_from(start), start),
                Some('\\') => match self.scan.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => {
                        return Token::new(TokenKind::Illegal, self.scan.slice_from(start), start)
                    }
                },
                Some(c) if c == quote => break,
                Some(c) => s.push(c),
            }
        }
        Token::new(TokenKind::Str, s, start)
    }

    fn read_ident(&mut self, first: char, start: Position) -> Token {
        let mut word = String::new();
        word.push(first);
        self.scan.take_while(is_ident_continue, &mut word);
        let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Ident);
        Token::new(kind, word, start)
    }

    /// Lex the whole input.  The returned vector always ends with `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token();
            let eof = t.is(TokenKind::Eof);
            tokens.push(t);
            if eof {
                break;
            }
        }
        tokens
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields every token including the final `Eof`, then `None`.
    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let t = self.next_token();
        self.done = t.is(TokenKind::Eof);
        Some(t)
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
