//! Dropping a syntax tree must release everything it allocated.
use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
};

use sable_compiler::{
    compile_str,
    lex::{log_syntax_error, TokenIter},
    parsing::{parse_file, Parser},
};

struct CountingAlloc;

thread_local! {
    /// Bytes currently allocated by this thread.
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = LIVE.try_with(|live| live.set(live.get() + layout.size() as isize));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let _ = LIVE.try_with(|live| live.set(live.get() - layout.size() as isize));
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn live_bytes() -> isize {
    LIVE.with(Cell::get)
}

const SOURCE: &str = include_str!("structs.sable");
const BROKEN: &str = "fn a() { const x = ; } fn b() { mut y = \"s\" + \"t\"; while (y) { y = y; } }";

#[test]
fn test_drop_frees_everything() {
    let before = live_bytes();
    {
        let mut reporter = log_syntax_error;
        let mut parser = Parser::new(TokenIter::new("structs.sable", SOURCE, &mut reporter));
        let (file, errors) = parse_file(&mut parser);
        assert!(errors.is_empty());
        assert!(live_bytes() > before);
        drop(file);
    }
    assert_eq!(live_bytes(), before);

    {
        let mut reporter = log_syntax_error;
        let mut parser = Parser::new(TokenIter::new("broken.sable", BROKEN, &mut reporter));
        let (file, errors) = parse_file(&mut parser);
        assert_eq!(errors.len(), 1);
        drop((file, errors));
    }
    assert_eq!(live_bytes(), before);

    {
        let program = compile_str("structs.sable", SOURCE);
        assert!(program.is_ok());
    }
    {
        let errors = compile_str("broken.sable", BROKEN);
        assert!(errors.is_err());
    }
    assert_eq!(live_bytes(), before);
}

/// Conditionals with `else if` and `else` arms nested inside loops.
fn nested_source(levels: usize) -> String {
    let mut body = String::from("n = n + 1;");
    for level in 0..levels {
        body = if level % 2 == 0 {
            format!("if (a) {{ {body} }} else if (n < {level}) {{ n = {level}; }} else {{ mut t{level} = n; n = t{level}; }}")
        } else {
            format!("while (n < 100) {{ {body} }}")
        };
    }
    format!("fn deep(a: bool, mut n: int) {{ {body} }}")
}

#[test]
fn test_drop_nested_tree() {
    let source = nested_source(12);
    let before = live_bytes();
    {
        let mut reporter = log_syntax_error;
        let mut parser = Parser::new(TokenIter::new("nested.sable", &source, &mut reporter));
        let (file, errors) = parse_file(&mut parser);
        assert!(errors.is_empty());
        assert_eq!(file.functions[0].body.nodes.len(), 1);
        drop(file);
    }
    assert_eq!(live_bytes(), before);

    {
        let program = compile_str("nested.sable", &source);
        assert!(program.is_ok());
    }
    assert_eq!(live_bytes(), before);
}
