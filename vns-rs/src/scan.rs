//! Character scanner shared by the script lexer and the expression lexer.
//!
//! Both lexers walk their input one `char` at a time and stamp every token
//! with a [`Position`]; the bookkeeping for that lives here.

use std::fmt;

// ── Position ──────────────────────────────────────────────────────────────────

/// A location in source text.
///
/// `offset` is a byte offset; `line` and `column` are 1-based and count
/// characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ── Scanner ───────────────────────────────────────────────────────────────────

/// Forward-only cursor over a `&str`.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    src: &'a str,
    pos: Position,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Scanner {
            src,
            pos: Position::default(),
        }
    }

    /// Position of the next unread character.
    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos.offset >= self.src.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.src[self.pos.offset..].chars().next()
    }

    /// The character after [`peek`](Self::peek).
    pub fn peek2(&self) -> Option<char> {
        let mut it = self.src[self.pos.offset..].chars();
        it.next();
        it.next()
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos.offset += ch.len_utf8();
        if ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(ch)
    }

    /// Consume `ch` if it is next.
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume characters while `pred` holds, appending them to `buf`.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool, buf: &mut String) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            buf.push(c);
            self.advance();
        }
    }

    /// Source text between `start` and the current position.
    pub fn slice_from(&self, start: Position) -> &'a str {
        self.slice(start, self.pos)
    }

    pub fn slice(&self, start: Position, end: Position) -> &'a str {
        &self.src[start.offset..end.offset]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
