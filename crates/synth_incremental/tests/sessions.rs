use std::sync::Arc;

use pretty_assertions::assert_eq;
use synth_incremental::{
    IncrementalConfig, IncrementalError, IncrementalParser, ParserState, SessionManager, Strategy,
};
use synth_parser::{CssLanguage, IncrementalLanguage, MarkdownLanguage, apply_edit};

fn markdown() -> Arc<dyn IncrementalLanguage> {
    Arc::new(MarkdownLanguage::new())
}

#[test]
fn test_parse_update_cycle_on_markdown() {
    let mut parser = IncrementalParser::new(markdown(), IncrementalConfig::default(), None);
    let doc: String = (0..50)
        .map(|i| format!("## Part {i}\n\nBody of part {i}.\n\n"))
        .collect();
    parser.parse(&doc).unwrap();
    assert_eq!(parser.state(), ParserState::Parsed);

    let at = doc.find("Body of part 25").unwrap() as u32;
    let (text, edit) = apply_edit(&doc, at, at + 4, "Text").unwrap();
    let stats = parser.update(&text, &edit).unwrap().stats;

    assert_eq!(stats.strategy, Strategy::Incremental);
    assert!(stats.token_reuse_rate > 0.9);
    // 49 untouched sections (heading + text, paragraph + text) and the
    // heading of the edited one.
    assert_eq!(stats.measured_reused_nodes, 49 * 4 + 2);
    assert!(stats.estimated_reused_nodes > 0);
    assert_eq!(parser.state(), ParserState::Updated);

    let index = parser.index().unwrap();
    let node = index.find_containing(at).unwrap();
    let tree = parser.tree().unwrap();
    assert_eq!(tree.text(node), "Text of part 25.");
}

#[test]
fn test_whole_document_replacement_is_full() {
    let mut parser = IncrementalParser::new(
        Arc::new(CssLanguage::new()),
        IncrementalConfig::default(),
        None,
    );
    parser.parse("a { b: c }").unwrap();
    let stats = parser.update_text("@media x {}").unwrap().stats;
    assert_eq!(stats.strategy, Strategy::Full);
    assert_eq!(stats.estimated_reused_nodes, 0);
    assert_eq!(stats.measured_reused_nodes, 0);
}

#[test]
fn test_session_discipline() {
    let mut sessions = SessionManager::new(IncrementalConfig::default(), None);
    assert!(matches!(
        sessions.tree("doc.md"),
        Err(IncrementalError::SessionNotFound { .. })
    ));

    let parser = IncrementalParser::new(markdown(), IncrementalConfig::default(), None);
    assert!(matches!(
        parser.index(),
        Err(IncrementalError::TreeStructure(_))
    ));

    sessions.open("doc.md", markdown(), "# Title\n").unwrap();
    let updated = sessions.update_text("doc.md", "# Title\n\nmore\n").unwrap();
    assert_eq!(updated.tree.children(updated.tree.root()).len(), 2);
    assert_eq!(
        sessions.index("doc.md").unwrap().find_by_type("paragraph").len(),
        1
    );
}
