//! End-to-end block edits against files on disk
//!
//! Covers the locate → rewrite → persist pipeline through the public API

use block_patcher::{
    locate, persist, rewrite, BlockEdit, BlockLocator, Delimiters, EditError, EditResult,
    Imbalance, LineSequence, LocateError, Span,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_replace_then_splice_in_memory() {
    let lines = ["fn f() {", "  body", "}", "fn g() {}"];

    let span = locate(&lines, "fn f()", 0).unwrap();
    assert_eq!(span, Span::new(0, 3));

    let patched = rewrite(&lines, span, &["fn f() { changed }"]).unwrap();
    assert_eq!(patched, vec!["fn f() { changed }", "fn g() {}"]);
}

#[test]
fn test_missing_anchor_leaves_file_unchanged() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("lib.rs");
    let content = "fn f() {\n  body\n}\nfn g() {}\n";
    fs::write(&file, content).unwrap();

    let err = BlockEdit::replace(&file, "fn missing", "fn missing() {}")
        .apply()
        .unwrap_err();

    assert!(matches!(
        err,
        EditError::Locate(LocateError::AnchorNotFound { .. })
    ));
    assert_eq!(fs::read_to_string(&file).unwrap(), content);
}

#[test]
fn test_unclosed_block_is_unbalanced() {
    let err = locate(&["fn f() {", "  body"], "fn f()", 0).unwrap_err();

    assert_eq!(
        err,
        LocateError::UnbalancedBlock {
            anchor: "fn f()".to_string(),
            start: 0,
            imbalance: Imbalance::NeverClosed { depth: 1 },
        }
    );
}

#[test]
fn test_manual_pipeline_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("lib.rs");
    let content = "use std::fmt;\n\nimpl fmt::Display for X {\n    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {\n        write!(f, \"x\")\n    }\n}\n";
    fs::write(&file, content).unwrap();

    let source = LineSequence::parse(&fs::read_to_string(&file).unwrap());
    let span = locate(source.lines(), "impl fmt::Display", 0).unwrap();
    assert_eq!(span, Span::new(2, 7));

    let same = rewrite(source.lines(), span, &source.lines()[span.range()]).unwrap();
    persist(&file, &same.concat()).unwrap();

    assert_eq!(fs::read_to_string(&file).unwrap(), content);
}

#[test]
fn test_whole_file_replacement() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("lib.rs");
    fs::write(&file, "a\nb\n").unwrap();

    let source = LineSequence::parse(&fs::read_to_string(&file).unwrap());
    let replaced = rewrite(source.lines(), Span::full(source.len()), &["c\n"]).unwrap();
    persist(&file, &replaced.concat()).unwrap();

    assert_eq!(fs::read_to_string(&file).unwrap(), "c\n");
}

#[test]
fn test_delete_nested_method_keeps_impl() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("lib.rs");
    fs::write(
        &file,
        "impl Foo {\n    fn a(&self) {\n        if x { y() }\n    }\n    fn b(&self) {}\n}\n",
    )
    .unwrap();

    let result = BlockEdit::delete(&file, "fn a(").apply().unwrap();

    assert_eq!(
        result,
        EditResult::Removed {
            file: file.clone(),
            span: Span::new(1, 4),
        }
    );
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "impl Foo {\n    fn b(&self) {}\n}\n"
    );
}

#[test]
fn test_paren_delimited_call() {
    let lines = ["let v = vec!(", "    (1, 2),", "    (3, 4),", ");", "next();"];
    let locator = BlockLocator::new(Delimiters::PARENS);

    assert_eq!(locator.locate(&lines, "vec!(", 0), Ok(Span::new(0, 4)));
}

#[test]
fn test_non_utf8_file_rejected() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bin.rs");
    fs::write(&file, [0xff, 0xfe, b'{', b'}']).unwrap();

    let err = BlockEdit::delete(&file, "{").apply().unwrap_err();

    assert!(matches!(err, EditError::InvalidUtf8(_)));
    assert_eq!(fs::read(&file).unwrap(), vec![0xff, 0xfe, b'{', b'}']);
}
