//! Script parser: tags to commands, labels, jumps and `if` structure.
//!
//! Problems an author can fix are logged to the [`Logger`] and parsing
//! carries on, so one pass reports as much as possible.  Only malformed tag
//! syntax (a [`SyntaxError`] from the lexer) stops it.
//!
//! After the token stream is consumed two checks run over the whole queue:
//! every `jump` must name a label that exists, and every `if` must be
//! closed by an `endif` with its `elif`/`else` branches in a legal order.
//! An `If` only learns its related branch list when its sequence passes.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::{Catalog, Message};
use crate::expr;
use crate::expr::token::TokenKind as ExprTokenKind;
use crate::logger::Logger;
use crate::scan::Position;

use super::command::{Command, CommandKind, Font, ReferenceVariable, Rgb, Variable};
use super::lexer::{self, SyntaxError, Tag, Token, TokenKind};
use super::queue::{CommandId, CommandQueue};

static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{Alphabetic}_][\p{Alphabetic}\p{N}_]*$").unwrap_or_else(|_| unreachable!())
});

const FONT_ATTRIBUTES: &[&str] = &[
    "size",
    "face",
    "color",
    "rubysize",
    "rubyoffset",
    "rubyface",
    "shadow",
    "shadowcolor",
    "edge",
    "edgecolor",
    "bold",
];

/// Attributes a tag accepts; `None` for tags that take arbitrary names.
fn known_attributes(tag: &str) -> Option<&'static [&'static str]> {
    let attrs: &'static [&'static str] = match tag {
        "wait" => &["time"],
        "indent" => &["count"],
        "jump" => &["target"],
        "if" | "elif" | "eval" | "embed" => &["exp"],
        "font" => FONT_ATTRIBUTES,
        "var" => return None,
        _ => &[],
    };
    Some(attrs)
}

/// Whether `name` can be bound and looked up by the expression language.
pub fn is_variable_name(name: &str) -> bool {
    IDENT_RE.is_match(name) && ExprTokenKind::keyword(name).is_none()
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub headline: String,
    pub id: CommandId,
}

/// Everything one parse produces.
#[derive(Debug, Default)]
pub struct ParsedScript {
    pub queue: CommandQueue,
    pub labels: HashMap<String, Label>,
    /// Source position of each command, indexed by [`CommandId`].
    pub positions: Vec<Position>,
    pub structural_errors: usize,
}

impl ParsedScript {
    pub fn position(&self, id: CommandId) -> Option<Position> {
        self.positions.get(id.index()).copied()
    }
}

// ── Structure problems ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Structure {
    Unterminated,
    MultipleElse,
    MisplacedElse,
    ElifAfterElse,
}

impl Structure {
    fn message(self) -> Message {
        match self {
            Structure::Unterminated => Message::UnterminatedIf,
            Structure::MultipleElse => Message::MultipleElse,
            Structure::MisplacedElse => Message::MisplacedElse,
            Structure::ElifAfterElse => Message::ElifAfterElse,
        }
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

pub struct Parser<'a> {
    logger: &'a mut Logger,
    catalog: &'a Catalog,
    out: ParsedScript,
    text: String,
    text_at: Position,
    indent: Option<u32>,
    line_start: bool,
    declared: HashSet<String>,
    jumps: Vec<(String, Position)>,
}

impl<'a> Parser<'a> {
    pub fn new(logger: &'a mut Logger, catalog: &'a Catalog) -> Self {
        Parser {
            logger,
            catalog,
            out: ParsedScript::default(),
            text: String::new(),
            text_at: Position::default(),
            indent: None,
            line_start: true,
            declared: HashSet::new(),
            jumps: Vec::new(),
        }
    }

    /// Treat `name` as defined before the script starts (host-provided
    /// variables).
    pub fn declare(&mut self, name: impl Into<String>) {
        self.declared.insert(name.into());
    }

    pub fn parse(mut self, tokens: Vec<Token>) -> ParsedScript {
        log::debug!("parsing {} script tokens", tokens.len());
        for token in tokens {
            log::trace!("{}: {:?}", token.position, token.literal);
            match token.kind {
                TokenKind::Text(s) => {
                    if self.text.is_empty() {
                        self.text_at = token.position;
                    }
                    self.text.push_str(&s);
                }
                TokenKind::Label { name, headline } => {
                    self.flush_text();
                    self.label(name, headline, token.position);
                }
                TokenKind::Tag(tag) => {
                    if !tag.name.eq_ignore_ascii_case("var") {
                        self.flush_text();
                    }
                    self.tag(&tag, token.position);
                }
            }
        }
        self.flush_text();
        self.check_jumps();
        self.check_structure();

        let summary = self.catalog.format(
            Message::ParseSummary,
            &[&self.out.queue.len(), &self.out.labels.len()],
        );
        self.logger.info(summary, None);
        self.out
    }

    fn enqueue(&mut self, command: Command, at: Position) -> CommandId {
        log::trace!("{at}: {command}");
        match command {
            Command::NewLine | Command::NewPage => self.line_start = true,
            Command::PrintText { .. } => self.line_start = false,
            _ => {}
        }
        self.out.positions.push(at);
        self.out.queue.enqueue(command)
    }

    fn error(&mut self, msg: Message, args: &[&dyn std::fmt::Display], at: Position) {
        let text = self.catalog.format(msg, args);
        self.logger.error(text, Some(at));
    }

    fn warn(&mut self, msg: Message, args: &[&dyn std::fmt::Display], at: Position) {
        let text = self.catalog.format(msg, args);
        self.logger.warn(text, Some(at));
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        let at = self.text_at;
        if let Some(count) = self.indent {
            if self.line_start {
                self.enqueue(Command::InsertIndent { count }, at);
            }
        }
        self.enqueue(Command::PrintText { text }, at);
    }

    fn label(&mut self, name: String, headline: String, at: Position) {
        if name.is_empty() {
            self.error(Message::EmptyLabelName, &[], at);
            return;
        }
        if self.out.labels.contains_key(&name) {
            self.error(Message::DuplicateLabel, &[&name], at);
            return;
        }
        let id = self.enqueue(
            Command::Label {
                name: name.clone(),
                headline: headline.clone(),
            },
            at,
        );
        self.out.labels.insert(name.clone(), Label { name, headline, id });
    }

    // ── Tags ──────────────────────────────────────────────────────────────────

    fn tag(&mut self, tag: &Tag, at: Position) {
        let name = tag.name.to_ascii_lowercase();
        if let Some(known) = known_attributes(&name) {
            for attr in &tag.attributes {
                if !known.contains(&attr.name.as_str()) {
                    self.warn(Message::UnknownAttribute, &[&name, &attr.name], at);
                }
            }
        }

        match name.as_str() {
            "l" => {
                self.enqueue(Command::WaitKey, at);
            }
            "r" => {
                self.enqueue(Command::NewLine, at);
            }
            "cm" => {
                self.enqueue(Command::NewPage, at);
            }
            "wait" => self.wait(tag, at),
            "var" => self.var(tag, at),
            "indent" => {
                let count = match tag.get("count") {
                    None => 1,
                    Some(v) => match v.parse::<u32>() {
                        Ok(n) => n,
                        Err(_) => {
                            self.error(Message::InvalidInteger, &[&"count", &v], at);
                            1
                        }
                    },
                };
                self.indent = Some(count);
            }
            "endindent" => self.indent = None,
            "jump" => match tag.get("target") {
                Some(target) => {
                    self.jumps.push((target.to_string(), at));
                    self.enqueue(
                        Command::Jump {
                            target: target.to_string(),
                        },
                        at,
                    );
                }
                None => self.error(Message::MissingAttribute, &[&name, &"target"], at),
            },
            "if" | "elif" => {
                // Enqueued even without `exp` so the branch structure holds.
                let expression = match tag.get("exp") {
                    Some(e) => {
                        self.check_expression(e, at);
                        e.to_string()
                    }
                    None => {
                        self.error(Message::MissingAttribute, &[&name, &"exp"], at);
                        String::new()
                    }
                };
                let cmd = if name == "if" {
                    Command::If {
                        expression,
                        related: Vec::new(),
                    }
                } else {
                    Command::Elif { expression }
                };
                self.enqueue(cmd, at);
            }
            "else" => {
                self.enqueue(Command::Else, at);
            }
            "endif" => {
                self.enqueue(Command::EndIf, at);
            }
            "eval" | "embed" => match tag.get("exp") {
                Some(e) => {
                    if let Some(program) = self.check_expression(e, at) {
                        if name == "eval" {
                            for bound in program.bound_names() {
                                self.declared.insert(bound.to_string());
                            }
                        }
                    }
                    let expression = e.to_string();
                    let cmd = if name == "eval" {
                        Command::Eval { expression }
                    } else {
                        Command::Embed { expression }
                    };
                    self.enqueue(cmd, at);
                }
                None => self.error(Message::MissingAttribute, &[&name, &"exp"], at),
            },
            "font" => {
                let font = self.font(tag, at);
                self.enqueue(Command::Font(font), at);
            }
            "resetfont" => {
                self.enqueue(Command::Font(Font::default()), at);
            }
            _ => self.warn(Message::UnknownTag, &[&tag.name], at),
        }
    }

    fn wait(&mut self, tag: &Tag, at: Position) {
        let Some(value) = tag.get("time") else {
            self.error(Message::MissingAttribute, &[&"wait", &"time"], at);
            return;
        };
        let time = if let Ok(ms) = value.parse::<i32>() {
            ReferenceVariable::literal(ms)
        } else if is_variable_name(value) {
            if !self.declared.contains(value) {
                self.error(Message::UndefinedVariable, &[&value], at);
            }
            ReferenceVariable::named(value)
        } else {
            self.error(Message::InvalidInteger, &[&"time", &value], at);
            return;
        };
        self.enqueue(Command::WaitTime { time }, at);
    }

    fn var(&mut self, tag: &Tag, at: Position) {
        if tag.attributes.is_empty() {
            self.error(Message::MissingAttribute, &[&"var", &"name=value"], at);
            return;
        }
        let mut variables = Vec::new();
        for attr in &tag.attributes {
            if !is_variable_name(&attr.name) {
                self.error(Message::InvalidVariableName, &[&attr.name], at);
                continue;
            }
            if self.check_expression(&attr.value, at).is_none() {
                continue;
            }
            self.declared.insert(attr.name.clone());
            variables.push(Variable {
                name: attr.name.clone(),
                value: attr.value.clone(),
            });
        }
        if !variables.is_empty() {
            self.enqueue(Command::DefineVariables { variables }, at);
        }
    }

    fn font(&mut self, tag: &Tag, at: Position) -> Font {
        let mut font = Font::default();
        for attr in &tag.attributes {
            let v = attr.value.as_str();
            match attr.name.as_str() {
                "size" => font.size = self.int_attr("size", v, at),
                "rubysize" => font.ruby_size = self.int_attr("rubysize", v, at),
                "rubyoffset" => font.ruby_offset = self.int_attr("rubyoffset", v, at),
                "face" => font.face = Some(v.to_string()),
                "rubyface" => font.ruby_face = Some(v.to_string()),
                "color" => font.color = self.color_attr("color", v, at),
                "shadowcolor" => font.shadow_color = self.color_attr("shadowcolor", v, at),
                "edgecolor" => font.edge_color = self.color_attr("edgecolor", v, at),
                "shadow" => font.shadow = self.bool_attr("shadow", v, at),
                "edge" => font.edge = self.bool_attr("edge", v, at),
                "bold" => font.bold = self.bool_attr("bold", v, at),
                _ => {}
            }
        }
        font
    }

    fn int_attr(&mut self, attr: &str, value: &str, at: Position) -> Option<i32> {
        let parsed = value.parse().ok();
        if parsed.is_none() {
            self.error(Message::InvalidInteger, &[&attr, &value], at);
        }
        parsed
    }

    fn bool_attr(&mut self, attr: &str, value: &str, at: Position) -> Option<bool> {
        match value {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                self.error(Message::InvalidBool, &[&attr, &value], at);
                None
            }
        }
    }

    fn color_attr(&mut self, attr: &str, value: &str, at: Position) -> Option<Rgb> {
        let parsed = Rgb::parse(value);
        if parsed.is_none() {
            self.error(Message::InvalidColor, &[&attr, &value], at);
        }
        parsed
    }

    /// Parse `src` as an expression, logging every syntax error.
    fn check_expression(&mut self, src: &str, at: Position) -> Option<expr::ast::Program> {
        match expr::parse(src) {
            Ok(program) => Some(program),
            Err(errors) => {
                for e in errors {
                    self.error(Message::ExpressionSyntax, &[&src, &e], at);
                }
                None
            }
        }
    }

    // ── Whole-script checks ───────────────────────────────────────────────────

    fn check_jumps(&mut self) {
        let jumps = std::mem::take(&mut self.jumps);
        for (target, at) in jumps {
            if !self.out.labels.contains_key(&target) {
                self.error(Message::UndefinedJumpTarget, &[&target], at);
            }
        }
    }

    fn check_structure(&mut self) {
        let mut problems = Vec::new();
        let mut relations = Vec::new();
        let queue = &self.out.queue;
        let mut i = 0;
        while i < queue.len() {
            let id = CommandId(i);
            match queue.get(id).map(Command::kind) {
                Some(CommandKind::If) => {
                    match inspect_sequence(queue, id, &mut relations, &mut problems) {
                        Some(end) => i = end.index() + 1,
                        None => break,
                    }
                }
                Some(k @ (CommandKind::Elif | CommandKind::Else | CommandKind::EndIf)) => {
                    problems.push((None, id, k));
                    i += 1;
                }
                _ => i += 1,
            }
        }

        for (if_id, related) in relations {
            if let Some(Command::If { related: slot, .. }) = self.out.queue.get_mut(if_id) {
                *slot = related;
            }
        }

        self.out.structural_errors = problems.len();
        for (problem, id, kind) in problems {
            let at = self.out.position(id).unwrap_or_default();
            match problem {
                Some(p) => self.error(p.message(), &[], at),
                None => {
                    let tag = match kind {
                        CommandKind::Elif => "elif",
                        CommandKind::Else => "else",
                        _ => "endif",
                    };
                    self.error(Message::StrayBranch, &[&tag], at);
                }
            }
        }
    }
}

type Problem = (Option<Structure>, CommandId, CommandKind);

/// Collect the branch markers belonging to the `If` at `if_id`, recursing
/// into nested `If`s.  Returns the id of the closing `EndIf`, or `None` if
/// the queue ends first.  A valid sequence is recorded in `relations`.
fn inspect_sequence(
    queue: &CommandQueue,
    if_id: CommandId,
    relations: &mut Vec<(CommandId, Vec<CommandId>)>,
    problems: &mut Vec<Problem>,
) -> Option<CommandId> {
    let mut related: Vec<(CommandId, CommandKind)> = Vec::new();
    let mut i = if_id.index() + 1;
    while let Some(cmd) = queue.get(CommandId(i)) {
        let id = CommandId(i);
        match cmd.kind() {
            CommandKind::If => match inspect_sequence(queue, id, relations, problems) {
                Some(end) => {
                    i = end.index() + 1;
                    continue;
                }
                None => break,
            },
            k @ (CommandKind::Elif | CommandKind::Else) => related.push((id, k)),
            CommandKind::EndIf => {
                related.push((id, CommandKind::EndIf));
                match inspect_related(&related) {
                    Ok(()) => relations.push((if_id, related.iter().map(|&(id, _)| id).collect())),
                    Err((p, at)) => problems.push((Some(p), at, CommandKind::If)),
                }
                return Some(id);
            }
            _ => {}
        }
        i += 1;
    }
    problems.push((Some(Structure::Unterminated), if_id, CommandKind::If));
    None
}

/// Check the order of one `if`'s branch markers.  On failure returns the
/// problem and the marker it was found at.
fn inspect_related(related: &[(CommandId, CommandKind)]) -> Result<(), (Structure, CommandId)> {
    let elses: Vec<usize> = related
        .iter()
        .enumerate()
        .filter(|(_, (_, k))| *k == CommandKind::Else)
        .map(|(i, _)| i)
        .collect();
    if elses.len() > 1 {
        return Err((Structure::MultipleElse, related[elses[1]].0));
    }
    if let Some(&e) = elses.first() {
        if let Some((id, _)) = related[e..].iter().find(|(_, k)| *k == CommandKind::Elif) {
            return Err((Structure::ElifAfterElse, *id));
        }
        if e + 2 != related.len() {
            return Err((Structure::MisplacedElse, related[e].0));
        }
    }
    let endifs = related.iter().filter(|(_, k)| *k == CommandKind::EndIf).count();
    match related.last() {
        Some((_, CommandKind::EndIf)) if endifs == 1 => Ok(()),
        Some(&(id, _)) => Err((Structure::Unterminated, id)),
        None => Err((Structure::Unterminated, CommandId(0))),
    }
}

/// Lex and parse a whole script.
pub fn parse_script(
    src: &str,
    logger: &mut Logger,
    catalog: &Catalog,
) -> Result<ParsedScript, SyntaxError> {
    let tokens = lexer::tokenize(src)?;
    Ok(Parser::new(logger, catalog).parse(tokens))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Severity;

    fn parse(src: &str) -> (ParsedScript, Logger) {
        let mut logger = Logger::new();
        let script = parse_script(src, &mut logger, &Catalog::new()).expect("no syntax error");
        (script, logger)
    }

    fn commands(script: &ParsedScript) -> Vec<Command> {
        script.queue.iter().cloned().collect()
    }

    fn errors(logger: &Logger) -> Vec<String> {
        logger
            .entries()
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .map(|e| e.message.clone())
            .collect()
    }

    fn text(s: &str) -> Command {
        Command::PrintText { text: s.into() }
    }

    #[test]
    fn label_var_jump_sequence() {
        let (script, logger) = parse(":start|headline\n[var wtime=1000]Hello[jump target=start]");
        assert_eq!(
            commands(&script),
            vec![
                Command::Label {
                    name: "start".into(),
                    headline: "headline".into()
                },
                Command::DefineVariables {
                    variables: vec![Variable {
                        name: "wtime".into(),
                        value: "1000".into()
                    }]
                },
                text("Hello"),
                Command::Jump {
                    target: "start".into()
                },
            ]
        );
        assert!(!logger.has_errors());
        assert_eq!(script.labels["start"].id, CommandId(0));
    }

    #[test]
    fn simple_tags() {
        let (script, _) = parse("a[l]b[r]c[cm]");
        assert_eq!(
            commands(&script),
            vec![
                text("a"),
                Command::WaitKey,
                text("b"),
                Command::NewLine,
                text("c"),
                Command::NewPage
            ]
        );
    }

    #[test]
    fn var_does_not_split_text() {
        let (script, _) = parse("Hel[var a=1]lo");
        assert_eq!(commands(&script)[1], text("Hello"));
    }

    #[test]
    fn duplicate_label_logged_once() {
        let (script, logger) = parse(":a|first\n:a|second\n");
        assert_eq!(errors(&logger), vec!["'a' is already used as label name"]);
        assert_eq!(script.labels["a"].headline, "first");
        assert_eq!(script.queue.find_commands(CommandKind::Label).len(), 1);
    }

    #[test]
    fn undefined_jump_target() {
        let (_, logger) = parse("[jump target=nowhere]");
        assert_eq!(errors(&logger), vec!["jump target 'nowhere' is not defined"]);
    }

    #[test]
    fn forward_jump_is_fine() {
        let (_, logger) = parse("[jump target=later]skipped\n:later\n");
        assert!(!logger.has_errors());
    }

    #[test]
    fn wait_forms() {
        let (script, logger) = parse("[var w=10][wait time=500][wait time=w][wait time=zzz][wait time=1.5]");
        let cmds = commands(&script);
        assert!(matches!(&cmds[1], Command::WaitTime { time } if time.value() == Some(500)));
        assert!(matches!(&cmds[2], Command::WaitTime { time } if time.name() == "w" && !time.is_resolved()));
        assert!(matches!(&cmds[3], Command::WaitTime { time } if time.name() == "zzz"));
        assert_eq!(cmds.len(), 4);
        assert_eq!(
            errors(&logger),
            vec![
                "variable 'zzz' is not defined",
                "attribute 'time' expects an integer, got '1.5'"
            ]
        );
    }

    #[test]
    fn eval_declares_variables() {
        let (_, logger) = parse("[eval exp=\"let t = 100\"][wait time=t]");
        assert!(!logger.has_errors());
    }

    #[test]
    fn missing_attributes() {
        let (script, logger) = parse("[wait][jump][eval][if]x[endif]");
        assert_eq!(
            errors(&logger),
            vec![
                "[wait] requires attribute 'time'",
                "[jump] requires attribute 'target'",
                "[eval] requires attribute 'exp'",
                "[if] requires attribute 'exp'",
            ]
        );
        assert!(script.queue.get(CommandId(0)).is_some_and(|c| c.is(CommandKind::If)));
    }

    #[test]
    fn unknown_tags_and_attributes_warn() {
        let (script, logger) = parse("[bogus][l foo=1]");
        assert_eq!(logger.count(Severity::Warning), 2);
        assert!(!logger.has_errors());
        assert_eq!(commands(&script), vec![Command::WaitKey]);
    }

    #[test]
    fn invalid_variable_names() {
        let (script, logger) = parse("[var 1x=2 let=3 ok=4]");
        assert_eq!(errors(&logger).len(), 2);
        match &commands(&script)[0] {
            Command::DefineVariables { variables } => {
                assert_eq!(variables.len(), 1);
                assert_eq!(variables[0].name, "ok");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn expression_syntax_checked() {
        let (_, logger) = parse("[if exp=\"1 +\"]a[endif][var x=\"let\"]");
        let errs = errors(&logger);
        assert_eq!(errs.len(), 2);
        assert!(errs[0].starts_with("syntax error in expression '1 +'"));
    }

    #[test]
    fn indent_before_line_starts() {
        let (script, _) = parse("[indent count=2]one[r]two[l]three[endindent][r]four");
        assert_eq!(
            commands(&script),
            vec![
                Command::InsertIndent { count: 2 },
                text("one"),
                Command::NewLine,
                Command::InsertIndent { count: 2 },
                text("two"),
                Command::WaitKey,
                text("three"),
                Command::NewLine,
                text("four"),
            ]
        );
    }

    #[test]
    fn font_tags() {
        let (script, logger) =
            parse("[font size=24 color=0xff0000 bold=true face=Gothic][resetfont][font size=big edge=maybe]");
        let cmds = commands(&script);
        match &cmds[0] {
            Command::Font(f) => {
                assert_eq!(f.size, Some(24));
                assert_eq!(f.color, Some(Rgb { r: 255, g: 0, b: 0 }));
                assert_eq!(f.bold, Some(true));
                assert_eq!(f.face.as_deref(), Some("Gothic"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cmds[1], Command::Font(Font::default()));
        assert_eq!(cmds[2], Command::Font(Font::default()));
        assert_eq!(errors(&logger).len(), 2);
    }

    #[test]
    fn nested_if_is_valid() {
        let (script, logger) = parse("[if exp=a][if exp=b]x[endif][endif]");
        assert_eq!(script.structural_errors, 0);
        assert!(!logger.has_errors());
        assert!(matches!(
            script.queue.get(CommandId(0)),
            Some(Command::If { related, .. }) if related == &vec![CommandId(4)]
        ));
        assert!(matches!(
            script.queue.get(CommandId(1)),
            Some(Command::If { related, .. }) if related == &vec![CommandId(3)]
        ));
    }

    #[test]
    fn branches_collected() {
        let (script, _) = parse("[if exp=a]1[elif exp=b]2[else]3[endif]");
        assert!(matches!(
            script.queue.get(CommandId(0)),
            Some(Command::If { related, .. })
                if related == &vec![CommandId(2), CommandId(4), CommandId(6)]
        ));
    }

    #[test]
    fn elif_after_else() {
        let (script, logger) = parse("[if exp=a][else][elif exp=b][endif]");
        assert_eq!(script.structural_errors, 1);
        assert_eq!(errors(&logger), vec!["[elif] cannot follow [else]"]);
        assert!(matches!(script.queue.get(CommandId(0)), Some(Command::If { related, .. }) if related.is_empty()));
    }

    #[test]
    fn two_elses() {
        let (script, logger) = parse("[if exp=a][else][else][endif]");
        assert_eq!(script.structural_errors, 1);
        assert_eq!(errors(&logger), vec!["[if] has more than one [else]"]);
    }

    #[test]
    fn missing_endif() {
        let (script, logger) = parse("[if exp=a]x[if exp=b]y[endif]");
        assert_eq!(script.structural_errors, 1);
        assert_eq!(errors(&logger), vec!["[if] is not closed by [endif]"]);
        // the inner, closed, if is still valid
        assert!(matches!(script.queue.get(CommandId(2)), Some(Command::If { related, .. }) if related.len() == 1));
    }

    #[test]
    fn stray_branches() {
        let (script, logger) = parse("[else][endif][elif exp=1]");
        assert_eq!(script.structural_errors, 3);
        assert_eq!(
            errors(&logger),
            vec![
                "[else] without a matching [if]",
                "[endif] without a matching [if]",
                "[elif] without a matching [if]",
            ]
        );
    }

    #[test]
    fn positions_recorded() {
        let (script, _) = parse("ab\n[l]");
        assert_eq!(script.position(CommandId(1)).map(|p| p.line), Some(2));
    }

    #[test]
    fn syntax_error_stops_parse() {
        let mut logger = Logger::new();
        let err = parse_script("ok [wait", &mut logger, &Catalog::new()).unwrap_err();
        assert!(matches!(err, SyntaxError::UnterminatedTag { .. }));
    }

    #[test]
    fn summary_is_informational() {
        let (_, logger) = parse(":a\nx");
        assert_eq!(logger.count(Severity::Information), 1);
        assert!(logger.history().contains("parsed 2 commands and 1 labels"));
    }
}
