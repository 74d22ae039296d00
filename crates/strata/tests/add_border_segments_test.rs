use strata::add_border_segments::add_border_segments;
use strata::graphlib::{Graph, GraphOptions};
use strata::{Cluster, EdgeLabel, GraphLabel, LayoutGraph, NodeKind, NodeLabel};

fn new_graph() -> LayoutGraph {
    let mut g: LayoutGraph = Graph::new(GraphOptions::compound());
    g.set_graph(GraphLabel::default());
    g.set_default_edge_label(EdgeLabel::default);
    g
}

fn cluster(g: &mut LayoutGraph, v: &str, min_rank: i32, max_rank: i32) {
    g.set_node(
        v,
        NodeLabel {
            cluster: Some(Cluster {
                min_rank,
                max_rank,
                border_top: Some(format!("{v}_top")),
                border_bottom: Some(format!("{v}_bottom")),
                ..Default::default()
            }),
            ..Default::default()
        },
    );
}

#[test]
fn does_nothing_without_clusters() {
    let mut g = new_graph();
    g.set_node("a", NodeLabel::default().with_rank(0));
    add_border_segments(&mut g).unwrap();
    assert_eq!(g.node_count(), 1);
}

#[test]
fn adds_a_left_and_right_border_per_rank() {
    let mut g = new_graph();
    cluster(&mut g, "sg", 1, 2);
    g.set_parent("a", "sg").unwrap();
    g.set_node("a", NodeLabel::default().with_rank(1));

    add_border_segments(&mut g).unwrap();
    let c = g.node("sg").unwrap().cluster.clone().unwrap();
    assert_eq!(c.border_left.len(), 3);
    assert_eq!(c.border_left[0], None);

    for rank in 1..=2 {
        let bl = c.border_left[rank].clone().unwrap();
        let br = c.border_right[rank].clone().unwrap();
        let (l, r) = (g.node(&bl).unwrap(), g.node(&br).unwrap());
        assert!(matches!(l.kind, NodeKind::BorderLeft));
        assert!(matches!(r.kind, NodeKind::BorderRight));
        assert_eq!(l.rank, Some(rank as i32));
        assert_eq!(g.parent(&bl), Some("sg"));
        assert_eq!(g.parent(&br), Some("sg"));
    }

    let (bl1, bl2) = (c.border_left[1].clone().unwrap(), c.border_left[2].clone().unwrap());
    assert!(g.has_edge(&bl1, &bl2, None));
    let (br1, br2) = (c.border_right[1].clone().unwrap(), c.border_right[2].clone().unwrap());
    assert!(g.has_edge(&br1, &br2, None));
}

#[test]
fn handles_nested_clusters() {
    let mut g = new_graph();
    cluster(&mut g, "outer", 0, 2);
    cluster(&mut g, "inner", 1, 1);
    g.set_parent("inner", "outer").unwrap();
    g.set_parent("a", "inner").unwrap();
    g.set_node("a", NodeLabel::default().with_rank(1));

    add_border_segments(&mut g).unwrap();
    let outer = g.node("outer").unwrap().cluster.clone().unwrap();
    let inner = g.node("inner").unwrap().cluster.clone().unwrap();
    assert_eq!(outer.border_left.iter().flatten().count(), 3);
    assert_eq!(inner.border_left.iter().flatten().count(), 1);
    let inner_bl = inner.border_left[1].clone().unwrap();
    assert_eq!(g.parent(&inner_bl), Some("inner"));
}
