use strata::graphlib::{Graph, GraphOptions};
use strata::{EdgeLabel, GraphLabel, LayoutGraph, NodeKind, NodeLabel, Point, normalize};

fn new_graph() -> LayoutGraph {
    let mut g: LayoutGraph = Graph::new(GraphOptions::compound());
    g.set_graph(GraphLabel::default());
    g.set_default_edge_label(EdgeLabel::default);
    g
}

#[test]
fn leaves_short_edges_alone() {
    let mut g = new_graph();
    g.set_node("a", NodeLabel::default().with_rank(0));
    g.set_node("b", NodeLabel::default().with_rank(1));
    g.set_edge("a", "b");

    normalize::run(&mut g);
    assert_eq!(g.node_count(), 2);
    assert!(g.has_edge("a", "b", None));
    assert!(g.graph().dummy_chains.is_empty());
}

#[test]
fn splits_long_edges_into_a_dummy_chain() {
    let mut g = new_graph();
    g.set_node("a", NodeLabel::default().with_rank(0));
    g.set_node("b", NodeLabel::default().with_rank(3));
    g.set_edge_with_label("a", "b", EdgeLabel::weighted(4.0));

    normalize::run(&mut g);
    assert!(!g.has_edge("a", "b", None));
    assert_eq!(g.node_count(), 4);
    assert_eq!(g.edge_count(), 3);
    assert_eq!(g.graph().dummy_chains.len(), 1);

    let mut v = g.graph().dummy_chains[0].clone();
    let mut ranks = Vec::new();
    while v != "b" {
        let node = g.node(&v).unwrap();
        assert!(matches!(node.kind, NodeKind::Edge(_)));
        ranks.push(node.rank.unwrap());
        let next = g.successors(&v)[0].to_string();
        assert_eq!(g.edge(&v, &next, None).unwrap().weight, 4.0);
        v = next;
    }
    assert_eq!(ranks, vec![1, 2]);
}

#[test]
fn sizes_the_label_dummy() {
    let mut g = new_graph();
    g.set_node("a", NodeLabel::default().with_rank(0));
    g.set_node("b", NodeLabel::default().with_rank(2));
    let mut label = EdgeLabel::default().with_size(30.0, 12.0);
    label.label_rank = Some(1);
    g.set_edge_with_label("a", "b", label);

    normalize::run(&mut g);
    let dummy = g.graph().dummy_chains[0].clone();
    let node = g.node(&dummy).unwrap();
    assert!(matches!(node.kind, NodeKind::EdgeLabel(_)));
    assert_eq!((node.width, node.height), (30.0, 12.0));
}

#[test]
fn undo_turns_dummies_into_points_and_label_position() {
    let mut g = new_graph();
    g.set_node("a", NodeLabel::default().with_rank(0));
    g.set_node("b", NodeLabel::default().with_rank(3));
    let mut label = EdgeLabel::default().with_size(30.0, 12.0);
    label.label_rank = Some(2);
    g.set_edge_with_label("a", "b", label);

    normalize::run(&mut g);
    let mut v = g.graph().dummy_chains[0].clone();
    let mut y = 10.0;
    while v != "b" {
        let node = g.node_mut(&v).unwrap();
        node.x = 5.0;
        node.y = y;
        y += 10.0;
        v = g.successors(&v)[0].to_string();
    }

    normalize::undo(&mut g);
    assert_eq!(g.node_count(), 2);
    let edge = g.edge("a", "b", None).unwrap();
    assert_eq!(edge.points, vec![Point::new(5.0, 10.0), Point::new(5.0, 20.0)]);
    assert_eq!((edge.x, edge.y), (Some(5.0), Some(20.0)));
    assert_eq!((edge.width, edge.height), (30.0, 12.0));
}

#[test]
fn keeps_parallel_edges_apart() {
    let mut g: LayoutGraph = Graph::new(GraphOptions::compound());
    g.set_graph(GraphLabel::default());
    g.set_node("a", NodeLabel::default().with_rank(0));
    g.set_node("b", NodeLabel::default().with_rank(2));
    g.set_edge_named("a", "b", Some("x"), Some(EdgeLabel::default()));
    g.set_edge_named("a", "b", Some("y"), Some(EdgeLabel::default()));

    normalize::run(&mut g);
    assert_eq!(g.graph().dummy_chains.len(), 2);
    normalize::undo(&mut g);
    assert!(g.has_edge("a", "b", Some("x")));
    assert!(g.has_edge("a", "b", Some("y")));
    assert_eq!(g.edge("a", "b", Some("x")).unwrap().points.len(), 1);
}
