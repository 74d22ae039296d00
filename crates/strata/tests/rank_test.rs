use strata::graphlib::{Graph, GraphOptions};
use strata::rank::{self, feasible_tree, longest_path, network_simplex};
use strata::util::normalize_ranks;
use strata::{EdgeLabel, GraphLabel, LayoutGraph, NodeLabel, Ranker};

fn new_graph() -> LayoutGraph {
    let mut g: LayoutGraph = Graph::new(GraphOptions::multigraph());
    g.set_graph(GraphLabel::default());
    g.set_default_node_label(NodeLabel::default);
    g.set_default_edge_label(EdgeLabel::default);
    g
}

fn gansner_graph() -> LayoutGraph {
    let mut g = new_graph();
    g.set_path(&["a", "b", "c", "d", "h"]);
    g.set_path(&["a", "e", "g", "h"]);
    g.set_path(&["a", "f", "g"]);
    g
}

fn rank_of(g: &LayoutGraph, v: &str) -> i32 {
    g.node(v).and_then(|n| n.rank).unwrap()
}

fn assert_feasible(g: &LayoutGraph) {
    for (e, label) in g.edge_labels() {
        let span = rank_of(g, &e.w) - rank_of(g, &e.v);
        assert!(
            span >= label.minlen as i32,
            "edge {e} spans {span}, needs {}",
            label.minlen
        );
    }
}

#[test]
fn longest_path_puts_sinks_on_rank_zero() {
    let mut g = new_graph();
    g.set_path(&["a", "b", "c"]);
    g.set_edge("a", "c");

    longest_path(&mut g);
    assert_eq!(rank_of(&g, "c"), 0);
    assert_eq!(rank_of(&g, "b"), -1);
    assert_eq!(rank_of(&g, "a"), -2);
}

#[test]
fn longest_path_honours_minlen() {
    let mut g = new_graph();
    g.set_edge_with_label("a", "b", EdgeLabel::default().with_minlen(3));

    longest_path(&mut g);
    normalize_ranks(&mut g);
    assert_eq!(rank_of(&g, "a"), 0);
    assert_eq!(rank_of(&g, "b"), 3);
}

#[test]
fn network_simplex_ranks_a_single_node() {
    let mut g = new_graph();
    g.ensure_node("a");
    network_simplex(&mut g);
    normalize_ranks(&mut g);
    assert_eq!(rank_of(&g, "a"), 0);
}

#[test]
fn network_simplex_finds_the_optimum_for_the_gansner_graph() {
    let mut g = gansner_graph();
    network_simplex(&mut g);
    normalize_ranks(&mut g);

    let ranks: Vec<(&str, i32)> = ["a", "b", "c", "d", "h", "e", "f", "g"]
        .into_iter()
        .map(|v| (v, rank_of(&g, v)))
        .collect();
    assert_eq!(
        ranks,
        vec![
            ("a", 0),
            ("b", 1),
            ("c", 2),
            ("d", 3),
            ("h", 4),
            ("e", 1),
            ("f", 1),
            ("g", 2)
        ]
    );
}

#[test]
fn network_simplex_pulls_heavy_edges_short() {
    let mut g = new_graph();
    g.set_path(&["a", "b", "c", "d"]);
    g.set_edge_with_label("a", "x", EdgeLabel::weighted(10.0));
    g.set_edge("x", "d");

    network_simplex(&mut g);
    normalize_ranks(&mut g);
    assert_eq!(rank_of(&g, "x"), 1);
    assert_feasible(&g);
}

#[test]
fn network_simplex_handles_disconnected_components() {
    let mut g = new_graph();
    g.set_path(&["a", "b", "c"]);
    g.set_path(&["x", "y"]);
    g.ensure_node("lonely");

    network_simplex(&mut g);
    assert_feasible(&g);
    assert!(g.node("lonely").unwrap().rank.is_some());
}

#[test]
fn feasible_tree_spans_a_connected_graph_with_tight_edges() {
    let mut g = new_graph();
    g.set_path(&["a", "b", "c"]);
    g.set_edge_with_label("a", "c", EdgeLabel::default().with_minlen(1));
    longest_path(&mut g);

    let t = feasible_tree(&mut g);
    assert_eq!(t.node_count(), 3);
    assert_eq!(t.edge_count(), 2);
    for e in t.edges() {
        let span = (rank_of(&g, &e.w) - rank_of(&g, &e.v)).abs();
        assert_eq!(span, 1);
    }
}

#[test]
fn every_ranker_respects_minlen() {
    for ranker in [Ranker::NetworkSimplex, Ranker::TightTree, Ranker::LongestPath] {
        let mut g = gansner_graph();
        g.graph_mut().ranker = ranker;
        g.set_edge_with_label("b", "g", EdgeLabel::default().with_minlen(2));

        rank::rank(&mut g);
        assert_feasible(&g);
    }
}

#[test]
fn ranker_none_keeps_existing_ranks() {
    let mut g = new_graph();
    g.set_node("a", NodeLabel::default().with_rank(4));
    g.set_node("b", NodeLabel::default().with_rank(9));
    g.set_edge("a", "b");
    g.graph_mut().ranker = Ranker::None;

    rank::rank(&mut g);
    assert_eq!(rank_of(&g, "a"), 4);
    assert_eq!(rank_of(&g, "b"), 9);
}
