//! Script lexer.
//!
//! Splits script text into text runs, labels and tags.  Structural
//! characters:
//!
//! | Input | Meaning |
//! |-------|---------|
//! | `:name` or `:name\|headline` at line start | label |
//! | `[name attr=value …]` anywhere | tag |
//! | `@name attr=value …` at line start | tag running to end of line |
//! | `\[` `\]` `\\` `\@` `\:` | the literal character |
//!
//! Leading blanks before `:` or `@` are ignored.  Raw line breaks are not
//! text: a visible break needs `[r]`.  Attribute values may be quoted
//! (`text="a b"`), in which case `\"` and `\\` are the only escapes.

use thiserror::Error;

use crate::scan::{Position, Scanner};

// ── Tokens ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Tag {
    /// The first attribute called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Text(String),
    Label { name: String, headline: String },
    Tag(Tag),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The source text the token was read from, escapes included.
    pub literal: String,
    pub position: Position,
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Malformed tag syntax.  Unlike other script problems this stops parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("{position}: tag is not closed by ']'")]
    UnterminatedTag { position: Position },
    #[error("{position}: tag has no name")]
    EmptyTagName { position: Position },
    #[error("{position}: attribute '{attribute}' has no '=value'")]
    MissingEquals { attribute: String, position: Position },
    #[error("{position}: quoted attribute value is not closed")]
    UnterminatedQuote { position: Position },
}

impl SyntaxError {
    pub fn position(&self) -> Position {
        match self {
            SyntaxError::UnterminatedTag { position }
            | SyntaxError::EmptyTagName { position }
            | SyntaxError::MissingEquals { position, .. }
            | SyntaxError::UnterminatedQuote { position } => *position,
        }
    }
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum TagEnd {
    /// `[ … ]`
    Bracket,
    /// `@ …` up to the end of the line.
    Line,
}

pub struct Lexer<'a> {
    scan: Scanner<'a>,
    tokens: Vec<Token>,
    text: String,
    text_start: Position,
    text_end: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            scan: Scanner::new(src),
            tokens: Vec::new(),
            text: String::new(),
            text_start: Position::default(),
            text_end: Position::default(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut line_start = true;
        loop {
            if line_start {
                line_start = false;
                if self.line_marker()? {
                    continue;
                }
            }
            let at = self.scan.position();
            let Some(ch) = self.scan.advance() else { break };
            match ch {
                '\n' => line_start = true,
                '\r' => {}
                '\\' => match self.scan.peek() {
                    Some(c @ ('[' | ']' | '\\' | '@' | ':')) => {
                        self.scan.advance();
                        self.push_text(c, at);
                    }
                    _ => self.push_text('\\', at),
                },
                '[' => {
                    self.flush_text();
                    let tag = self.read_tag(at, TagEnd::Bracket)?;
                    self.push_token(TokenKind::Tag(tag), at);
                }
                c => self.push_text(c, at),
            }
        }
        self.flush_text();
        Ok(self.tokens)
    }

    /// Handle a `:` label or `@` tag line if the line holds one.
    fn line_marker(&mut self) -> Result<bool, SyntaxError> {
        let mut ahead = self.scan.clone();
        while matches!(ahead.peek(), Some(' ' | '\t')) {
            ahead.advance();
        }
        let at = ahead.position();
        match ahead.peek() {
            Some(':') => {
                ahead.advance();
                self.scan = ahead;
                self.flush_text();
                let (name, headline) = self.read_label();
                self.push_token(TokenKind::Label { name, headline }, at);
                Ok(true)
            }
            Some('@') => {
                ahead.advance();
                self.scan = ahead;
                self.flush_text();
                let tag = self.read_tag(at, TagEnd::Line)?;
                self.push_token(TokenKind::Tag(tag), at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Push a token spanning `start` to the current position.
    fn push_token(&mut self, kind: TokenKind, start: Position) {
        self.tokens.push(Token {
            kind,
            literal: self.scan.slice_from(start).to_string(),
            position: start,
        });
    }

    fn push_text(&mut self, c: char, at: Position) {
        if self.text.is_empty() {
            self.text_start = at;
        }
        self.text.push(c);
        self.text_end = self.scan.position();
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.tokens.push(Token {
                kind: TokenKind::Text(std::mem::take(&mut self.text)),
                literal: self.scan.slice(self.text_start, self.text_end).to_string(),
                position: self.text_start,
            });
        }
    }

    /// After `:`.  The headline, if any, runs to the end of the line.
    fn read_label(&mut self) -> (String, String) {
        let mut name = String::new();
        self.scan
            .take_while(|c| !matches!(c, ' ' | '\t' | '[' | '\n' | '\r' | '|'), &mut name);
        let mut headline = String::new();
        if self.scan.eat('|') {
            self.scan.take_while(|c| c != '\n', &mut headline);
        }
        (name, headline.trim().to_string())
    }

    fn skip_blanks(&mut self, end: TagEnd) {
        while let Some(c) = self.scan.peek() {
            let blank = match end {
                TagEnd::Bracket => c.is_whitespace(),
                TagEnd::Line => c == ' ' || c == '\t' || c == '\r',
            };
            if !blank {
                break;
            }
            self.scan.advance();
        }
    }

    /// After `[` or `@`.
    fn read_tag(&mut self, start: Position, end: TagEnd) -> Result<Tag, SyntaxError> {
        let mut name = String::new();
        self.scan
            .take_while(|c| !c.is_whitespace() && c != ']' && c != '[', &mut name);
        if name.is_empty() {
            return Err(SyntaxError::EmptyTagName { position: start });
        }

        let mut attributes = Vec::new();
        loop {
            self.skip_blanks(end);
            match (end, self.scan.peek()) {
                (TagEnd::Bracket, Some(']')) => {
                    self.scan.advance();
                    break;
                }
                (TagEnd::Bracket, None) => {
                    return Err(SyntaxError::UnterminatedTag { position: start })
                }
                (TagEnd::Line, None | Some('\n')) => break,
                _ => {}
            }

            let at = self.scan.position();
            let mut attr = String::new();
            self.scan
                .take_while(|c| !c.is_whitespace() && c != '=' && c != ']', &mut attr);
            if !self.scan.eat('=') {
                return Err(SyntaxError::MissingEquals {
                    attribute: attr,
                    position: at,
                });
            }
            let value = if self.scan.peek() == Some('"') {
                self.read_quoted()?
            } else {
                let mut v = String::new();
                self.scan
                    .take_while(|c| !c.is_whitespace() && c != ']', &mut v);
                v
            };
            attributes.push(Attribute { name: attr, value });
        }
        Ok(Tag { name, attributes })
    }

    fn read_quoted(&mut self) -> Result<String, SyntaxError> {
        let start = self.scan.position();
        self.scan.advance();
        let mut value = String::new();
        loop {
            match self.scan.advance() {
                None => return Err(SyntaxError::UnterminatedQuote { position: start }),
                Some('"') => return Ok(value),
                Some('\\') => match self.scan.peek() {
                    Some(c @ ('"' | '\\')) => {
                        self.scan.advance();
                        value.push(c);
                    }
                    _ => value.push('\\'),
                },
                Some(c) => value.push(c),
            }
        }
    }
}

/// Tokenize a whole script.
pub fn tokenize(src: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(src).tokenize()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src)
            .expect("lexes")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn text(s: &str) -> TokenKind {
        TokenKind::Text(s.to_string())
    }

    fn tag(name: &str, attrs: &[(&str, &str)]) -> TokenKind {
        TokenKind::Tag(Tag {
            name: name.to_string(),
            attributes: attrs
                .iter()
                .map(|(n, v)| Attribute {
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        })
    }

    fn label(name: &str, headline: &str) -> TokenKind {
        TokenKind::Label {
            name: name.to_string(),
            headline: headline.to_string(),
        }
    }

    #[test]
    fn text_and_tags() {
        assert_eq!(
            kinds("Hello[l]World[r]"),
            vec![text("Hello"), tag("l", &[]), text("World"), tag("r", &[])]
        );
    }

    #[test]
    fn attributes() {
        assert_eq!(
            kinds("[wait time=1000][var a=1 b=x+1]"),
            vec![
                tag("wait", &[("time", "1000")]),
                tag("var", &[("a", "1"), ("b", "x+1")]),
            ]
        );
    }

    #[test]
    fn quoted_values() {
        assert_eq!(
            kinds(r#"[if exp="a == \"x y\""]"#),
            vec![tag("if", &[("exp", "a == \"x y\"")])]
        );
        assert_eq!(kinds(r#"[eval exp="a\\b"]"#), vec![tag("eval", &[("exp", "a\\b")])]);
    }

    #[test]
    fn labels_with_headline() {
        assert_eq!(
            kinds(":start|The Beginning\nText"),
            vec![label("start", "The Beginning"), text("Text")]
        );
        assert_eq!(kinds("  :plain\n"), vec![label("plain", "")]);
    }

    #[test]
    fn label_followed_by_tag_on_same_line() {
        assert_eq!(kinds(":a[l]"), vec![label("a", ""), tag("l", &[])]);
    }

    #[test]
    fn colon_mid_line_is_text() {
        assert_eq!(kinds("Time: 10"), vec![text("Time: 10")]);
    }

    #[test]
    fn tag_lines() {
        assert_eq!(
            kinds("one\n@wait time=500\ntwo"),
            vec![text("one"), tag("wait", &[("time", "500")]), text("two")]
        );
        assert_eq!(kinds("  @cm"), vec![tag("cm", &[])]);
    }

    #[test]
    fn newlines_are_dropped() {
        assert_eq!(kinds("a\r\nb\nc"), vec![text("abc")]);
    }

    #[test]
    fn escapes() {
        assert_eq!(kinds(r"\[not a tag\]"), vec![text("[not a tag]")]);
        assert_eq!(kinds("\\:x"), vec![text(":x")]);
        assert_eq!(kinds(r"a\@b\\c\n"), vec![text(r"a@b\c\n")]);
    }

    #[test]
    fn stray_close_bracket_is_text() {
        assert_eq!(kinds("a]b"), vec![text("a]b")]);
    }

    #[test]
    fn whitespace_inside_brackets() {
        assert_eq!(
            kinds("[jump\n   target=end ]"),
            vec![tag("jump", &[("target", "end")])]
        );
    }

    #[test]
    fn positions() {
        let tokens = tokenize("ab\n[l]\n:x").expect("lexes");
        assert_eq!(tokens[0].position, Position { offset: 0, line: 1, column: 1 });
        assert_eq!(tokens[1].position, Position { offset: 3, line: 2, column: 1 });
        assert_eq!(tokens[2].position.line, 3);
    }

    #[test]
    fn literals_keep_source_text() {
        let src = "say \\[hi\\]\n@wait time=5\n:top|Head\n[if exp=\"a == 1\"]";
        let literals: Vec<String> = tokenize(src)
            .expect("lexes")
            .into_iter()
            .map(|t| t.literal)
            .collect();
        assert_eq!(
            literals,
            vec![
                "say \\[hi\\]",
                "@wait time=5",
                ":top|Head",
                "[if exp=\"a == 1\"]",
            ]
        );
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(
            tokenize("text [wait time=1"),
            Err(SyntaxError::UnterminatedTag { position }) if position.column == 6
        ));
        assert!(matches!(tokenize("[]"), Err(SyntaxError::EmptyTagName { .. })));
        assert!(matches!(tokenize("[ l]"), Err(SyntaxError::EmptyTagName { .. })));
        assert!(matches!(
            tokenize("[wait time]"),
            Err(SyntaxError::MissingEquals { ref attribute, .. }) if attribute == "time"
        ));
        assert!(matches!(
            tokenize("[eval exp=\"1 + 2]"),
            Err(SyntaxError::UnterminatedQuote { .. })
        ));
    }

    #[test]
    fn error_message() {
        let err = tokenize("\n  [jump").unwrap_err();
        assert_eq!(err.to_string(), "2:3: tag is not closed by ']'");
        assert_eq!(err.position().line, 2);
    }
}
