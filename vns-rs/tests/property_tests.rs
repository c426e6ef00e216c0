use proptest::prelude::*;
use vns::catalog::Catalog;
use vns::expr::lexer::Lexer;
use vns::expr::token::TokenKind;
use vns::expr::{eval_str, Environment, Object};
use vns::logger::Logger;
use vns::script::lexer::tokenize;
use vns::script::{parse_script, Command, CommandId, CommandQueue};

proptest! {
    /// The script lexer returns Ok or Err on any input but never panics.
    #[test]
    fn script_lexer_does_not_panic(s in "\\PC*") {
        let _ = tokenize(&s);
    }

    /// Script-shaped input exercises tags, labels and escapes more often.
    #[test]
    fn script_parser_does_not_panic(s in "[a-z \\[\\]=\"@:|\\\\\n0-9]{0,64}") {
        let mut logger = Logger::new();
        let _ = parse_script(&s, &mut logger, &Catalog::new());
    }

    #[test]
    fn expr_lexer_does_not_panic(s in "\\PC*") {
        let tokens = Lexer::new(&s).tokenize();
        prop_assert!(tokens.last().is_some_and(|t| t.kind == TokenKind::Eof));
    }

    #[test]
    fn expr_parser_does_not_panic(s in "[a-z0-9 +*/<>=!(){},;\"-]{0,48}") {
        let _ = vns::expr::parse(&s);
    }
}

proptest! {
    #[test]
    fn script_token_positions_are_monotone(s in "[a-z \\[\\]=@:\n]{0,64}") {
        if let Ok(tokens) = tokenize(&s) {
            for pair in tokens.windows(2) {
                prop_assert!(pair[0].position.offset <= pair[1].position.offset);
            }
        }
    }

    #[test]
    fn expr_token_positions_are_monotone(s in "\\PC{0,64}") {
        let tokens = Lexer::new(&s).tokenize();
        for pair in tokens.windows(2) {
            prop_assert!(pair[0].position.offset <= pair[1].position.offset);
            prop_assert!(pair[0].position.line <= pair[1].position.line);
        }
    }
}

proptest! {
    /// Dequeue visits every command once, in order, and then stays exhausted.
    #[test]
    fn queue_dequeues_in_order(n in 0usize..40) {
        let mut q = CommandQueue::new();
        for _ in 0..n {
            q.enqueue(Command::NewLine);
        }
        for i in 0..n {
            let (id, _) = q.dequeue().unwrap();
            prop_assert_eq!(id, CommandId(i));
        }
        prop_assert!(q.dequeue().is_none());
        prop_assert!(q.dequeue().is_none());
        prop_assert_eq!(q.cursor(), n);
    }

    #[test]
    fn queue_seek_bounds(n in 1usize..40, target in 0usize..80) {
        let mut q = CommandQueue::new();
        for _ in 0..n {
            q.enqueue(Command::WaitKey);
        }
        let before = q.cursor();
        let moved = q.seek(CommandId(target));
        prop_assert_eq!(moved, target < n);
        if moved {
            let (id, _) = q.dequeue().unwrap();
            prop_assert_eq!(id, CommandId(target));
        } else {
            prop_assert_eq!(q.cursor(), before);
        }
    }
}

proptest! {
    #[test]
    fn integer_arithmetic_wraps(a in any::<i32>(), b in any::<i32>()) {
        let env = Environment::new();
        env.borrow_mut().set("a", Object::Integer(a));
        env.borrow_mut().set("b", Object::Integer(b));
        prop_assert_eq!(eval_str("a + b", &env).unwrap(), Object::Integer(a.wrapping_add(b)));
        prop_assert_eq!(eval_str("a * b", &env).unwrap(), Object::Integer(a.wrapping_mul(b)));
        prop_assert_eq!(eval_str("a < b", &env).unwrap(), Object::Boolean(a < b));
    }
}
