//! End-to-end script runs through the public API with a recording executor.

use vns::catalog::{Catalog, Message};
use vns::expr::Object;
use vns::logger::Severity;
use vns::script::{Command, CommandKind, Executor, Font, Interpreter, Interrupt, RunError, Rgb};

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    fonts: Vec<Font>,
}

impl Executor for Recorder {
    fn print_text(&mut self, text: &str) -> Result<(), Interrupt> {
        self.events.push(text.to_owned());
        Ok(())
    }
    fn start_new_line(&mut self) -> Result<(), Interrupt> {
        self.events.push("<r>".into());
        Ok(())
    }
    fn wait_any_key(&mut self) -> Result<(), Interrupt> {
        self.events.push("<l>".into());
        Ok(())
    }
    fn start_new_page(&mut self) -> Result<(), Interrupt> {
        self.events.push("<cm>".into());
        Ok(())
    }
    fn wait_time(&mut self, millis: i32) -> Result<(), Interrupt> {
        self.events.push(format!("<wait {millis}>"));
        Ok(())
    }
    fn indent(&mut self, count: u32) -> Result<(), Interrupt> {
        self.events.push(format!("<indent {count}>"));
        Ok(())
    }
    fn set_font(&mut self, font: &Font) -> Result<(), Interrupt> {
        self.events.push("<font>".into());
        self.fonts.push(font.clone());
        Ok(())
    }
}

fn run(src: &str) -> (Recorder, Interpreter) {
    let mut interp = Interpreter::new();
    let mut rec = Recorder::default();
    if let Err(e) = interp.execute(src, &mut rec) {
        panic!("script failed: {e}\n{}", interp.logger().history());
    }
    (rec, interp)
}

// ── Scenes ────────────────────────────────────────────────────────────────────

#[test]
fn looping_scene() {
    let src = r#"[var name="'Alice'" visits=0]
@cm
:opening|The Beginning
Hello, [embed exp=name]![r]
@wait time=300
[eval exp="visits = visits + 1"]
[if exp="visits < 3"]
Again \[[embed exp=visits]\][r]
[jump target=opening]
[endif]
Bye[l]
"#;
    let (rec, interp) = run(src);
    let greet = ["Hello, ", "Alice", "!", "<r>", "<wait 300>"];
    let mut expected: Vec<String> = vec!["<cm>".into()];
    for n in 1..=2 {
        expected.extend(greet.iter().map(|s| s.to_string()));
        expected.extend(["Again [".to_string(), n.to_string(), "]".into(), "<r>".into()]);
    }
    expected.extend(greet.iter().map(|s| s.to_string()));
    expected.extend(["Bye".to_string(), "<l>".into()]);

    assert_eq!(rec.events, expected);
    assert_eq!(interp.get_var("visits"), Some(Object::Integer(3)));
    assert!(!interp.logger().has_errors(), "{}", interp.logger().history());
}

#[test]
fn functions_and_builtins_from_script() {
    let src = "[eval exp=\"let sq = function(x) { x * x };\"]\
               [embed exp=\"sq(7)\"] \
               [embed exp=\"length('abcd')\"] \
               [embed exp=\"'ab' * 3\"] \
               [embed exp=\"type(1.5)\"]";
    let (rec, _) = run(src);
    assert_eq!(rec.events, vec!["49", " ", "4", " ", "ababab", " ", "DOUBLE"]);
}

#[test]
fn fonts_reach_executor() {
    let (rec, _) = run("[font color=0xff0000 bold=true]red[resetfont]plain");
    assert_eq!(rec.events, vec!["<font>", "red", "<font>", "plain"]);
    assert_eq!(rec.fonts[0].color, Some(Rgb { r: 255, g: 0, b: 0 }));
    assert_eq!(rec.fonts[0].bold, Some(true));
    assert!(rec.fonts[1].is_reset());
}

#[test]
fn invalid_font_field_is_left_unset() {
    let (rec, interp) = run("[font color=red size=24]x");
    assert_eq!(rec.fonts[0].color, None);
    assert_eq!(rec.fonts[0].size, Some(24));
    assert_eq!(interp.logger().count(Severity::Error), 1);
}

#[test]
fn indent_block() {
    let (rec, _) = run("[indent count=2]a[r]b[endindent][r]c");
    assert_eq!(
        rec.events,
        vec!["<indent 2>", "a", "<r>", "<indent 2>", "b", "<r>", "c"]
    );
}

#[test]
fn var_tag_does_not_split_text() {
    let (rec, _) = run("one [var x=1]two");
    assert_eq!(rec.events, vec!["one two"]);
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

#[test]
fn warnings_do_not_block_execution() {
    let (rec, interp) = run("[sparkle]text[wait time=5 speed=2]");
    assert_eq!(rec.events, vec!["text", "<wait 5>"]);
    let logger = interp.logger();
    assert_eq!(logger.count(Severity::Warning), 2);
    assert!(!logger.has_errors());
    assert!(logger.history_at(Severity::Warning).contains("unknown tag [sparkle]"));
}

#[test]
fn custom_catalog_messages() {
    let mut catalog = Catalog::new();
    catalog.set(Message::UndefinedJumpTarget, "no scene called {0}");
    let mut interp = Interpreter::with_catalog(catalog);
    interp
        .execute("[jump target=epilogue]x", &mut Recorder::default())
        .unwrap();
    assert!(interp.logger().history().contains("no scene called epilogue"));
}

#[test]
fn duplicate_label_reported() {
    let (_, interp) = run(":a\n:a\n");
    assert!(interp
        .logger()
        .history()
        .contains("'a' is already used as label name"));
}

#[test]
fn unclosed_if_rejects_whole_script() {
    let mut interp = Interpreter::new();
    let mut rec = Recorder::default();
    let err = interp
        .execute("intro[if exp=true]a[else]b[else]c[endif]", &mut rec)
        .unwrap_err();
    assert!(matches!(err, RunError::Rejected { .. }));
    assert!(rec.events.is_empty());
    assert!(interp.logger().history().contains("more than one [else]"));
}

#[test]
fn unterminated_tag_is_syntax_error() {
    let mut interp = Interpreter::new();
    let err = interp
        .execute("line one\n[wait time=1", &mut Recorder::default())
        .unwrap_err();
    match err {
        RunError::Syntax(e) => assert_eq!(e.position().line, 2),
        other => panic!("unexpected {other:?}"),
    }
}

// ── Parsing without running ──────────────────────────────────────────────────

#[test]
fn parse_builds_queue_and_labels() {
    let mut interp = Interpreter::new();
    let script = interp
        .parse(":start|Chapter 1\nHi[l][jump target=start]")
        .unwrap();
    let kinds: Vec<CommandKind> = script.queue.iter().map(Command::kind).collect();
    assert_eq!(
        kinds,
        vec![
            CommandKind::Label,
            CommandKind::PrintText,
            CommandKind::WaitKey,
            CommandKind::Jump,
        ]
    );
    let start = &script.labels["start"];
    assert_eq!(start.headline, "Chapter 1");
    assert_eq!(script.queue.find_commands(CommandKind::Label), vec![start.id]);
}
