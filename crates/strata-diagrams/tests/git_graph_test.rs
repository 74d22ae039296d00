use strata_diagrams::git_graph::{CommitType, Db};
use strata_diagrams::{Config, RenderOptions, git_graph, render_svg};

const MERGE: &str = "gitGraph
commit
branch feature
checkout feature
commit
checkout main
merge feature
";

#[test]
fn merge_commit_has_both_heads_as_parents() {
    let mut db = Db::new(&Config::default());
    git_graph::parse_into(MERGE, &mut db).expect("parse ok");

    let commits = db.commits();
    assert_eq!(commits.len(), 3);
    let (main_head, feature_head) = (commits[0], commits[1]);
    assert_eq!(main_head.branch, "main");
    assert_eq!(feature_head.branch, "feature");

    let head = db.head().expect("head commit");
    assert_eq!(head.commit_type, CommitType::Merge);
    assert_eq!(head.branch, "main");
    assert_eq!(head.parents, vec![main_head.id.clone(), feature_head.id.clone()]);
    assert_eq!(db.current_branch(), "main");
}

#[test]
fn merge_into_empty_branch_is_rejected_with_line() {
    let text = "gitGraph\nbranch feature\ncommit\ncheckout main\nmerge feature\n";
    let mut db = Db::new(&Config::default());
    let err = git_graph::parse_into(text, &mut db).unwrap_err();
    assert_eq!(
        err.message(),
        Some("Incorrect usage of \"merge\". Current branch (main)has no commits")
    );
    assert_eq!(err.hash().map(|h| h.line), Some(5));
}

#[test]
fn merge_renders_as_svg() {
    let svg = render_svg(MERGE, &RenderOptions::default()).expect("render ok");
    let doc = roxmltree::Document::parse(&svg).expect("well-formed svg");
    assert_eq!(doc.root_element().attribute("class"), Some("gitGraph"));

    let branch_labels: Vec<&str> = doc
        .descendants()
        .filter(|n| {
            n.attribute("class")
                .is_some_and(|c| c.starts_with("branch-label"))
        })
        .filter_map(|n| n.descendants().find_map(|d| d.text()))
        .collect();
    assert_eq!(branch_labels, vec!["main", "feature"]);

    let merges = doc
        .descendants()
        .filter(|n| {
            n.attribute("class")
                .is_some_and(|c| c.split_whitespace().any(|t| t == "commit-merge0"))
        })
        .count();
    assert_eq!(merges, 1);
}

#[test]
fn duplicate_commit_ids_are_warnings() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("strata_diagrams=warn")
        .with_test_writer()
        .try_init();

    let text = "gitGraph\ncommit id: \"x\"\ncommit id: \"x\"\n";
    let mut db = Db::new(&Config::default());
    git_graph::parse_into(text, &mut db).expect("duplicates are not fatal");
    assert_eq!(db.warnings(), ["Commit ID x already exists"]);
    assert_eq!(db.commits().len(), 1);
}
