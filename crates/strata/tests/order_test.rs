use strata::graphlib::{Graph, GraphOptions};
use strata::order::{self, Relationship, build_layer_graph, cross_count, init_order};
use strata::util::build_layer_matrix;
use strata::{Cluster, EdgeLabel, GraphLabel, LayoutGraph, NodeLabel};

fn new_graph() -> LayoutGraph {
    let mut g: LayoutGraph = Graph::new(GraphOptions::compound());
    g.set_graph(GraphLabel::default());
    g.set_default_edge_label(EdgeLabel::default);
    g
}

fn ranked(g: &mut LayoutGraph, rank: i32, vs: &[&str]) {
    for (i, v) in vs.iter().enumerate() {
        g.set_node(
            *v,
            NodeLabel {
                rank: Some(rank),
                order: Some(i),
                ..Default::default()
            },
        );
    }
}

fn layer(vs: &[&str]) -> Vec<String> {
    vs.iter().map(|v| v.to_string()).collect()
}

#[test]
fn cross_count_is_zero_without_crossings() {
    let mut g = new_graph();
    g.set_edge("a", "c");
    g.set_edge("b", "d");
    assert_eq!(cross_count(&g, &[layer(&["a", "b"]), layer(&["c", "d"])]), 0.0);
}

#[test]
fn cross_count_weights_each_crossing() {
    let mut g = new_graph();
    g.set_edge_with_label("a", "d", EdgeLabel::weighted(2.0));
    g.set_edge_with_label("b", "c", EdgeLabel::weighted(3.0));
    assert_eq!(cross_count(&g, &[layer(&["a", "b"]), layer(&["c", "d"])]), 6.0);
}

#[test]
fn cross_count_sums_over_layers() {
    let mut g = new_graph();
    g.set_path(&["a", "d", "f"]);
    g.set_path(&["b", "c", "e"]);
    let layering = [layer(&["a", "b"]), layer(&["c", "d"]), layer(&["f", "e"])];
    assert_eq!(cross_count(&g, &layering), 2.0);
}

#[test]
fn init_order_groups_connected_nodes() {
    let mut g = new_graph();
    ranked(&mut g, 0, &["a", "b"]);
    ranked(&mut g, 1, &["c", "d"]);
    g.set_edge("a", "d");
    g.set_edge("b", "c");

    let layering = init_order(&g);
    assert_eq!(layering, vec![layer(&["a", "b"]), layer(&["d", "c"])]);
}

#[test]
fn build_layer_graph_sums_parallel_edges_and_keeps_clusters() {
    let mut g: LayoutGraph = Graph::new(GraphOptions::compound());
    g.set_graph(GraphLabel::default());
    ranked(&mut g, 0, &["a"]);
    ranked(&mut g, 1, &["b", "bl1", "br1"]);
    g.set_node(
        "sg",
        NodeLabel {
            cluster: Some(Cluster {
                min_rank: 1,
                max_rank: 1,
                border_left: vec![None, Some("bl1".into())],
                border_right: vec![None, Some("br1".into())],
                ..Default::default()
            }),
            ..Default::default()
        },
    );
    for v in ["b", "bl1", "br1"] {
        g.set_parent(v, "sg").unwrap();
    }
    g.set_edge_named("a", "b", Some("x"), Some(EdgeLabel::weighted(2.0)));
    g.set_edge_named("a", "b", Some("y"), Some(EdgeLabel::weighted(3.0)));

    let nodes: Vec<String> = g.node_ids();
    let lg = build_layer_graph(&g, 1, Relationship::InEdges, &nodes).unwrap();
    let root = lg.graph().root.clone();
    assert!(!g.has_node(&root));
    assert_eq!(lg.edge("a", "b", None), Some(&5.0));
    assert_eq!(lg.parent("b"), Some("sg"));
    assert_eq!(lg.parent("sg"), Some(root.as_str()));
    assert_eq!(lg.node("sg").unwrap().border_left.as_deref(), Some("bl1"));
    assert_eq!(lg.node("sg").unwrap().border_right.as_deref(), Some("br1"));
    assert!(lg.parent("a").is_none());
}

#[test]
fn order_removes_avoidable_crossings() {
    let mut g = new_graph();
    ranked(&mut g, 0, &["a", "b", "c"]);
    ranked(&mut g, 1, &["d", "e", "f"]);
    ranked(&mut g, 2, &["g", "h", "i"]);
    g.set_path(&["a", "f", "g"]);
    g.set_path(&["b", "e", "h"]);
    g.set_path(&["c", "d", "i"]);
    g.set_edge("a", "e");

    order::order(&mut g).unwrap();
    let layering = build_layer_matrix(&g);
    assert_eq!(cross_count(&g, &layering), 0.0);
}

#[test]
fn order_assigns_a_permutation_per_rank() {
    let mut g = new_graph();
    ranked(&mut g, 0, &["a", "b", "c", "d"]);
    ranked(&mut g, 1, &["e", "f", "g", "h"]);
    for (v, w) in [("a", "h"), ("b", "g"), ("c", "f"), ("d", "e"), ("a", "e"), ("d", "h")] {
        g.set_edge(v, w);
    }

    order::order(&mut g).unwrap();
    for rank in 0..=1 {
        let mut orders: Vec<usize> = g
            .node_labels()
            .filter(|(_, n)| n.rank == Some(rank))
            .filter_map(|(_, n)| n.order)
            .collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }
}

#[test]
fn order_is_never_worse_than_the_initial_ordering() {
    let mut g = new_graph();
    ranked(&mut g, 0, &["a", "b", "c"]);
    ranked(&mut g, 1, &["d", "e", "f"]);
    for (v, w) in [("a", "f"), ("a", "d"), ("b", "d"), ("b", "f"), ("c", "e"), ("c", "d")] {
        g.set_edge(v, w);
    }
    let initial = cross_count(&g, &init_order(&g));

    order::order(&mut g).unwrap();
    assert!(cross_count(&g, &build_layer_matrix(&g)) <= initial);
}

#[test]
fn order_keeps_cluster_members_contiguous() {
    let mut g = new_graph();
    ranked(&mut g, 0, &["a", "b", "c"]);
    ranked(&mut g, 1, &["x", "y", "z"]);
    g.set_node(
        "sg",
        NodeLabel {
            cluster: Some(Cluster {
                min_rank: 1,
                max_rank: 1,
                ..Default::default()
            }),
            ..Default::default()
        },
    );
    g.set_parent("x", "sg").unwrap();
    g.set_parent("z", "sg").unwrap();
    g.set_edge("a", "x");
    g.set_edge("b", "y");
    g.set_edge("c", "z");

    order::order(&mut g).unwrap();
    let layering = build_layer_matrix(&g);
    let pos = |v: &str| layering[1].iter().position(|w| w == v).unwrap();
    assert_eq!(pos("x").abs_diff(pos("z")), 1);
}
