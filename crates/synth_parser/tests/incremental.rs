//! Incremental retokenization must agree with a full tokenize.

use std::sync::Arc;

use proptest::prelude::*;
use proptest::sample::Index;
use synth_parser::{
    CssLanguage, IncrementalLanguage, IncrementalTokenizer, Lexer, MarkdownLanguage, apply_edit,
    tokenize_with,
};

const CSS_PIECES: &[&str] = &[
    "a", "b2", "{", "}", ":", ";", " ", "\n", "color", "red", "12px", "1.", "-", "--x", ".5",
    "#fff", "#", "@media", "@", "/*", "*/", "*", "/", "\"", "'", "\\", "(", ")", ",",
    "!important", "é", "%",
];

const MD_PIECES: &[&str] = &[
    "# ", "#", "######", "\n", "\n\n", "text", " ", "  ", "\t", "```", "~~~", "``", "js", "- ",
    "* ", "1. ", "2)", "> ", ">", "---", "***", "[x] ", "[ ]", "é", "\r\n",
];

fn pieces(vocab: &'static [&'static str]) -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(vocab), 0..40)
}

/// Replaces pieces `a..b` of `old` with `new`, retokenizes and compares with a
/// full tokenize of the result.
fn check_edit(
    lexer: Arc<dyn Lexer>,
    old: &[&str],
    a: Index,
    b: Index,
    new: &[&str],
) -> Result<(), TestCaseError> {
    let i = a.index(old.len() + 1);
    let j = i + b.index(old.len() + 1 - i);
    let source: String = old.concat();
    let start: usize = old[..i].iter().map(|p| p.len()).sum();
    let end: usize = start + old[i..j].iter().map(|p| p.len()).sum::<usize>();
    let replacement: String = new.concat();

    let (text, edit) = apply_edit(&source, start as u32, end as u32, &replacement)
        .map_err(|e| TestCaseError::fail(e.to_string()))?;

    let mut tokenizer = IncrementalTokenizer::new(Arc::clone(&lexer));
    tokenizer.tokenize(&source);
    let result = tokenizer.retokenize(&text, &edit);
    let full = tokenize_with(lexer.as_ref(), Arc::from(text.as_str()));

    prop_assert!(
        result.stream.same_tokens(&full),
        "source {:?} -> {:?}\nincremental: {:?}\nfull: {:?}",
        source,
        text,
        result.stream.tokens,
        full.tokens
    );
    prop_assert!(result.stream.is_well_formed());
    prop_assert!((0.0..=1.0).contains(&result.stats.reuse_rate));
    prop_assert_eq!(result.stats.total_tokens, full.len());
    prop_assert_eq!(
        result.stats.reused_tokens + result.stats.new_tokens,
        result.stats.total_tokens
    );
    Ok(())
}

proptest! {
    #[test]
    fn test_css_retokenize_matches_full(
        old in pieces(CSS_PIECES),
        new in pieces(CSS_PIECES),
        a in any::<Index>(),
        b in any::<Index>(),
    ) {
        check_edit(CssLanguage::new().lexer(), &old, a, b, &new)?;
    }

    #[test]
    fn test_markdown_retokenize_matches_full(
        old in pieces(MD_PIECES),
        new in pieces(MD_PIECES),
        a in any::<Index>(),
        b in any::<Index>(),
    ) {
        check_edit(MarkdownLanguage::new().lexer(), &old, a, b, &new)?;
    }
}

#[test]
fn test_successive_edits_keep_stream_in_sync() {
    let css = CssLanguage::new();
    let mut tokenizer = IncrementalTokenizer::new(css.lexer());
    let mut text = String::from("a { color: red; }\nb { margin: 0 }\n");
    tokenizer.tokenize(&text);

    let edits = [
        (11, 14, "blue"),
        (0, 1, "a.b"),
        (19, 19, "/* open"),
        (19, 26, ""),
        (3, 3, "\"str\""),
    ];
    for (start, end, replacement) in edits {
        let (next, edit) = apply_edit(&text, start, end, replacement).unwrap();
        let result = tokenizer.retokenize(&next, &edit);
        let full = tokenize_with(&*css.lexer(), Arc::from(next.as_str()));
        assert!(result.stream.same_tokens(&full), "after editing into {next:?}");
        text = next;
    }
}

#[test]
fn test_reuse_rate_on_large_css_document() {
    let rules: String = (0..200)
        .map(|i| format!(".c{i} {{ color: red; margin: {i}px; }}\n"))
        .collect();
    let css = CssLanguage::new();
    let mut tokenizer = IncrementalTokenizer::new(css.lexer());
    tokenizer.tokenize(&rules);

    let at = rules.find("red").unwrap() as u32;
    let (text, edit) = apply_edit(&rules, at, at + 3, "blue").unwrap();
    let result = tokenizer.retokenize(&text, &edit);
    assert!(rules.len() > 1024);
    assert!(
        result.stats.reuse_rate > 0.5,
        "reuse rate {}",
        result.stats.reuse_rate
    );
}

#[test]
fn test_reuse_rate_on_large_markdown_document() {
    let doc: String = (0..100)
        .map(|i| format!("## Section {i}\n\nParagraph {i} line one\nline two\n\n"))
        .collect();
    let md = MarkdownLanguage::new();
    let mut tokenizer = IncrementalTokenizer::new(md.lexer());
    tokenizer.tokenize(&doc);

    let at = doc.find("Paragraph 50").unwrap() as u32;
    let (text, edit) = apply_edit(&doc, at, at + 9, "Text").unwrap();
    let result = tokenizer.retokenize(&text, &edit);
    let full = tokenize_with(&*md.lexer(), Arc::from(text.as_str()));
    assert!(result.stream.same_tokens(&full));
    assert!(
        result.stats.reuse_rate > 0.9,
        "reuse rate {}",
        result.stats.reuse_rate
    );
}
