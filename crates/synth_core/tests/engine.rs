use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use synth_ast::Tree;
use synth_core::{ParseOptions, Synth, SynthConfig};
use synth_parser::apply_edit;
use synth_plugin::{Plugin, node_stats, strip_comments};

fn engine() -> Synth {
    Synth::new(SynthConfig::default()).unwrap()
}

fn counter(calls: &Arc<AtomicUsize>) -> Plugin {
    let calls = Arc::clone(calls);
    Plugin::sync("count", "1.0.0", move |tree| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(tree)
    })
}

fn remote() -> Plugin {
    Plugin::asynchronous("remote", "1.0.0", |mut tree: Tree| async move {
        tokio::task::yield_now().await;
        tree.set_metadata("remote", true);
        Ok(tree)
    })
}

#[test]
fn test_sync_parse_with_async_plugin_has_no_side_effects() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut synth = engine();
    synth.use_plugin(counter(&calls));

    let options = ParseOptions::new().with_plugin(remote());
    let err = synth.parse("css", "a{}", &options).unwrap_err();
    assert!(err.is_async_plugin_in_sync_path());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(synth.pool().stats().allocated, 0);
}

#[tokio::test]
async fn test_parse_async_runs_registered_then_per_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut synth = engine();
    synth
        .use_plugin(strip_comments())
        .use_plugin(counter(&calls));

    let options = ParseOptions::new().with_plugin(remote()).with_plugin(node_stats());
    let parsed = synth
        .parse_async("css", "/* x */ a { b: c }", &options)
        .await
        .unwrap();

    let metadata = &parsed.tree().meta().metadata;
    assert_eq!(metadata["remote"], true);
    assert_eq!(metadata["nodeStats"]["Comment"], serde_json::Value::Null);
    assert_eq!(metadata["nodeStats"]["StyleRule"], 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(synth.pipeline().plugins().len(), 2);
}

#[test]
fn test_registered_plugin_output() {
    let mut synth = engine();
    synth.use_plugin(strip_comments());
    let parsed = synth
        .parse("css", "/* a */ b { c: d }", &ParseOptions::new())
        .unwrap();
    insta::assert_snapshot!(parsed.tree().dump().trim_end(), @r###"
    root [0..18]
      StyleRule [8..18] {"selector":"b"}
        Declaration [12..16] {"important":false,"property":"c","value":"d"}
    "###);
}

#[test]
fn test_parse_path_uses_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    fs::write(&path, "# Notes\n\n- [x] done\n").unwrap();

    let synth = engine();
    let parsed = synth
        .parse_path(&path, &ParseOptions::new().with_index(true))
        .unwrap();
    assert_eq!(parsed.tree().language(), "markdown");
    assert!(parsed.has_index());
    assert_eq!(parsed.index().find_by_type("listItem").len(), 1);
    assert_eq!(
        parsed.tree().meta().metadata["path"],
        path.display().to_string()
    );

    let err = synth
        .parse_path(dir.path().join("notes.txt"), &ParseOptions::new())
        .unwrap_err();
    assert!(err.is_parse());
}

#[test]
fn test_session_walkthrough() {
    let mut synth = engine();
    synth.open_session("style.css", "css", "a{color:red}").unwrap();

    let (text, edit) = apply_edit("a{color:red}", 8, 11, "blue").unwrap();
    let updated = synth
        .sessions_mut()
        .update("style.css", &text, &edit)
        .unwrap();
    assert!(updated.stats.token_reuse_rate > 0.0);

    let index = synth.sessions_mut().index("style.css").unwrap();
    let decl = index.find_by_type("Declaration")[0];
    let tree = synth.sessions_mut().tree("style.css").unwrap();
    assert_eq!(tree.node(decl).unwrap().field("value"), Some("blue".into()));

    let err = synth
        .sessions_mut()
        .update_text("other.css", "x")
        .unwrap_err();
    assert!(synth_core::SynthError::from(err).is_session_not_found());
}

fn kinds(tree: &Tree) -> Vec<String> {
    tree.descendants(tree.root())
        .into_iter()
        .map(|id| tree.kind_name(id).to_string())
        .collect()
}

#[test]
fn test_session_updates_run_registered_plugins() {
    let mut synth = engine();
    synth.use_plugin(strip_comments());

    let opened = synth
        .open_session("style.css", "css", "/* a */ b{c:d}")
        .unwrap();
    assert_eq!(kinds(opened), vec!["StyleRule", "Declaration"]);

    let (text, edit) = apply_edit("/* a */ b{c:d}", 14, 14, " /* c */ e{f:g}").unwrap();
    let updated = synth.update_session("style.css", &text, &edit).unwrap();
    assert_eq!(
        kinds(updated.tree),
        vec!["StyleRule", "Declaration", "StyleRule", "Declaration"]
    );
    assert!(updated.stats.total_tokens > 0);

    let updated = synth
        .update_session_text("style.css", "x{} /* d */")
        .unwrap();
    assert_eq!(kinds(updated.tree), vec!["StyleRule"]);

    // The bare session manager hands back the tree as built.
    let raw = synth
        .sessions_mut()
        .update_text("style.css", "/* e */ y{}")
        .unwrap();
    assert_eq!(kinds(raw.tree), vec!["Comment", "StyleRule"]);
}

#[test]
fn test_sessions_reject_async_registered_plugins() {
    let mut synth = engine();
    synth.use_plugin(remote());

    let err = synth.open_session("a.css", "css", "a{}").unwrap_err();
    assert!(err.is_async_plugin_in_sync_path());
    assert!(!synth.sessions().contains("a.css"));
}
