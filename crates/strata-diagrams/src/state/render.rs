use rustc_hash::FxHashSet;
use strata::graphlib::{Graph, GraphOptions};
use strata::{EdgeLabel, GraphLabel, LabelPos, LayoutGraph, NodeLabel, Point};
use tracing::{debug, debug_span};

use super::{DIAGRAM_TYPE, Db, NotePosition, State, StateType};
use crate::style::style_attr;
use crate::svg::{self, Bounds, Element};
use crate::text::{TextMeasurer, TextStyle};
use crate::{Config, Result, Theme};

const START_SIZE: f64 = 14.0;
const CHOICE_SIZE: f64 = 28.0;
const TITLE_HEIGHT_PAD: f64 = 4.0;

struct Options {
    diagram_padding: f64,
    node_spacing: f64,
    rank_spacing: f64,
    padding: f64,
    note_margin: f64,
    fork_width: f64,
    fork_height: f64,
    radius: f64,
    font_size: f64,
    divider_margin: f64,
}

impl Options {
    fn from_config(config: &Config) -> Self {
        Self {
            diagram_padding: config.f64_or("state.diagramPadding", 8.0),
            node_spacing: config.f64_or("state.nodeSpacing", 50.0),
            rank_spacing: config.f64_or("state.rankSpacing", 50.0),
            padding: config.f64_or("state.padding", 8.0),
            note_margin: config.f64_or("state.noteMargin", 10.0),
            fork_width: config.f64_or("state.forkWidth", 70.0),
            fork_height: config.f64_or("state.forkHeight", 7.0),
            radius: config.f64_or("state.radius", 5.0),
            font_size: config.f64_or("state.fontSize", 16.0),
            divider_margin: config.f64_or("state.dividerMargin", 10.0),
        }
    }
}

/// What a node shows: a single label, or a title over a list of descriptions.
struct NodeText {
    title: String,
    body: Vec<String>,
}

fn node_text(state: &State) -> NodeText {
    match state.descriptions.as_slice() {
        [] => NodeText {
            title: state.id.clone(),
            body: Vec::new(),
        },
        [only] => NodeText {
            title: only.clone(),
            body: Vec::new(),
        },
        many => NodeText {
            title: state.id.clone(),
            body: many.to_vec(),
        },
    }
}

/// Descends through composites to the first plain state, which edges attach to in their place.
fn first_leaf<'a>(db: &'a Db, clusters: &FxHashSet<&str>, id: &'a str) -> &'a str {
    let mut current = id;
    while clusters.contains(current) {
        let Some(child) = db.children(Some(current)).into_iter().next() else {
            break;
        };
        current = child.id.as_str();
    }
    current
}

struct Edge {
    name: String,
    v: String,
    w: String,
    label: Option<String>,
}

/// Builds the compound layout graph: composites become clusters, transitions become edges.
fn build_graph(
    db: &Db,
    opts: &Options,
    style: &TextStyle,
    measurer: &dyn TextMeasurer,
) -> Result<(LayoutGraph, FxHashSet<String>, Vec<Edge>)> {
    let mut g: LayoutGraph = Graph::new(GraphOptions::compound());
    g.set_graph(GraphLabel {
        rankdir: db.direction(),
        nodesep: opts.node_spacing,
        ranksep: opts.rank_spacing,
        marginx: 8.0,
        marginy: 8.0,
        ..Default::default()
    });

    let clusters: FxHashSet<&str> = db
        .states()
        .filter_map(|s| s.parent.as_deref())
        .collect();
    let horizontal = db.direction().is_horizontal();

    for state in db.states() {
        let label = if clusters.contains(state.id.as_str()) {
            NodeLabel::default()
        } else {
            let (w, h) = node_size(state, opts, horizontal, style, measurer);
            NodeLabel::new(w, h)
        };
        g.set_node(state.id.clone(), label);
    }
    for state in db.states() {
        if let Some(parent) = state.parent.as_deref() {
            g.set_parent(state.id.clone(), parent)?;
        }
    }

    let mut edges = Vec::new();
    let label_style = TextStyle::sized(opts.font_size * 0.875);
    for (i, rel) in db.relations().iter().enumerate() {
        let v = first_leaf(db, &clusters, &rel.from).to_string();
        let w = first_leaf(db, &clusters, &rel.to).to_string();
        let mut label = EdgeLabel::default();
        label.labelpos = LabelPos::C;
        if let Some(text) = rel.label.as_deref() {
            let m = measurer.measure(text, &label_style);
            label = label.with_size(m.width + 4.0, m.height + 4.0);
        }
        let name = format!("edge{i}");
        g.set_edge_named(v.clone(), w.clone(), Some(name.clone()), Some(label));
        edges.push(Edge {
            name,
            v,
            w,
            label: rel.label.clone(),
        });
    }

    let clusters = clusters.into_iter().map(str::to_string).collect();
    Ok((g, clusters, edges))
}

fn node_size(
    state: &State,
    opts: &Options,
    horizontal: bool,
    style: &TextStyle,
    measurer: &dyn TextMeasurer,
) -> (f64, f64) {
    match state.state_type {
        StateType::Start | StateType::End => (START_SIZE, START_SIZE),
        StateType::Choice => (CHOICE_SIZE, CHOICE_SIZE),
        StateType::Fork | StateType::Join if horizontal => (opts.fork_height, opts.fork_width),
        StateType::Fork | StateType::Join => (opts.fork_width, opts.fork_height),
        StateType::Default | StateType::Divider => {
            let text = node_text(state);
            let title = measurer.measure(&text.title, style);
            if text.body.is_empty() {
                return (title.width + 2.0 * opts.padding, title.height + 2.0 * opts.padding);
            }
            let body = measurer.measure(&text.body.join("\n"), style);
            (
                title.width.max(body.width) + 2.0 * opts.padding,
                title.height + body.height + opts.divider_margin + 2.0 * opts.padding,
            )
        }
    }
}

/// Renders the state diagram as an SVG tree.
pub fn render(db: &Db, config: &Config, theme: &Theme, measurer: &dyn TextMeasurer) -> Result<Element> {
    let _span = debug_span!("render", diagram = DIAGRAM_TYPE).entered();
    let opts = Options::from_config(config);
    let style = TextStyle {
        font_family: Some(theme.font_family.clone()),
        font_size: opts.font_size,
        font_weight: None,
    };

    let (mut g, clusters, edges) = build_graph(db, &opts, &style, measurer)?;
    strata::layout(&mut g)?;
    debug!(
        nodes = g.node_count(),
        edges = g.edge_count(),
        width = g.graph().width,
        height = g.graph().height,
        "laid out state diagram"
    );

    let mut bounds = Bounds::default();
    let marker_id = "state-arrow";
    let defs = Element::new("defs").child(svg::arrow_marker(marker_id, &theme.transition_color));

    let mut cluster_group = svg::group().class("clusters");
    let mut by_depth: Vec<&State> = db
        .states()
        .filter(|s| clusters.contains(&s.id))
        .collect();
    by_depth.sort_by_key(|s| depth(db, s));
    for state in by_depth {
        let Some(n) = g.node(&state.id) else {
            continue;
        };
        bounds.include_rect(n.x - n.width / 2.0, n.y - n.height / 2.0, n.width, n.height);
        cluster_group.push(draw_cluster(state, n, &opts, theme, &style, measurer));
    }

    let mut edge_group = svg::group().class("edgePaths");
    let mut label_group = svg::group().class("edgeLabels");
    let label_style = TextStyle::sized(opts.font_size * 0.875);
    for edge in &edges {
        let Some(e) = g.edge(&edge.v, &edge.w, Some(&edge.name)) else {
            continue;
        };
        for p in &e.points {
            bounds.include_point(p.x, p.y);
        }
        edge_group.push(
            svg::path(svg::curved_path(&e.points))
                .class("transition")
                .attr("id", &edge.name)
                .attr("fill", "none")
                .attr("stroke", &theme.transition_color)
                .attr("stroke-width", 1)
                .attr("marker-end", format!("url(#{marker_id})")),
        );
        if let (Some(text), Some(x), Some(y)) = (edge.label.as_deref(), e.x, e.y) {
            let m = measurer.measure(text, &label_style);
            let (w, h) = (m.width + 4.0, m.height + 4.0);
            bounds.include_rect(x - w / 2.0, y - h / 2.0, w, h);
            label_group.push(
                svg::group()
                    .class("edgeLabel")
                    .child(
                        svg::centered_rect(x, y, w, h)
                            .attr("fill", &theme.edge_label_background),
                    )
                    .child(
                        svg::text(x, y, text)
                            .attr("text-anchor", "middle")
                            .attr("dominant-baseline", "central")
                            .num("font-size", label_style.font_size)
                            .attr("fill", &theme.transition_label_color),
                    ),
            );
        }
    }

    let mut node_group = svg::group().class("nodes");
    let mut note_group = svg::group().class("notes");
    for state in db.states().filter(|s| !clusters.contains(&s.id)) {
        let Some(n) = g.node(&state.id) else {
            continue;
        };
        bounds.include_rect(n.x - n.width / 2.0, n.y - n.height / 2.0, n.width, n.height);
        node_group.push(draw_state(db, state, n, &opts, theme, &style, measurer));
        if let Some(note) = state.note.as_ref() {
            let m = measurer.measure(&note.text, &style);
            let (w, h) = (m.width + 2.0 * opts.padding, m.height + 2.0 * opts.padding);
            let offset = n.width / 2.0 + opts.note_margin + w / 2.0;
            let cx = match note.position {
                NotePosition::LeftOf => n.x - offset,
                NotePosition::RightOf => n.x + offset,
            };
            bounds.include_rect(cx - w / 2.0, n.y - h / 2.0, w, h);
            note_group.push(draw_note(&note.text, Point::new(cx, n.y), (w, h), n, theme));
        }
    }

    let doc = svg::document(DIAGRAM_TYPE, bounds, opts.diagram_padding);
    let doc = svg::accessibility(doc, db.acc_title(), db.acc_descr());
    Ok(doc
        .child(defs)
        .child(cluster_group)
        .child(edge_group)
        .child(label_group)
        .child(node_group)
        .child(note_group))
}

fn depth(db: &Db, state: &State) -> usize {
    let mut depth = 0;
    let mut current = state.parent.as_deref();
    while let Some(id) = current {
        depth += 1;
        current = db.state(id).and_then(|s| s.parent.as_deref());
    }
    depth
}

fn class_styles(db: &Db, state: &State) -> (Vec<String>, Vec<String>) {
    let mut styles = Vec::new();
    let mut text_styles = Vec::new();
    for class in &state.classes {
        if let Some(def) = db.classes().get(class) {
            styles.extend(def.styles.iter().cloned());
            text_styles.extend(def.text_styles.iter().cloned());
        }
    }
    styles.extend(state.styles.iter().cloned());
    (styles, text_styles)
}

fn draw_cluster(
    state: &State,
    n: &NodeLabel,
    opts: &Options,
    theme: &Theme,
    style: &TextStyle,
    measurer: &dyn TextMeasurer,
) -> Element {
    let (x, y) = (n.x - n.width / 2.0, n.y - n.height / 2.0);
    let g = svg::group().class("cluster").attr("id", &state.id);
    if state.state_type == StateType::Divider {
        return g.child(
            svg::rect(x, y, n.width, n.height)
                .class("divider")
                .attr("fill", "none")
                .attr("stroke", &theme.state_border)
                .attr("stroke-dasharray", "10,10"),
        );
    }
    let text = node_text(state);
    let title_h = measurer.measure(&text.title, style).height + TITLE_HEIGHT_PAD;
    g.child(
        svg::rect(x, y, n.width, n.height)
            .class("composite")
            .num("rx", opts.radius)
            .attr("fill", &theme.composite_background)
            .attr("stroke", &theme.state_border),
    )
    .child(
        svg::rect(x, y, n.width, title_h)
            .class("composite-title")
            .num("rx", opts.radius)
            .attr("fill", &theme.composite_title_background)
            .attr("stroke", &theme.state_border),
    )
    .child(
        svg::text(n.x, y + title_h / 2.0, &text.title)
            .class("state-title")
            .attr("text-anchor", "middle")
            .attr("dominant-baseline", "central")
            .attr("fill", &theme.state_label_color),
    )
}

fn draw_state(
    db: &Db,
    state: &State,
    n: &NodeLabel,
    opts: &Options,
    theme: &Theme,
    style: &TextStyle,
    measurer: &dyn TextMeasurer,
) -> Element {
    let (styles, text_styles) = class_styles(db, state);
    let mut classes = String::from("node statediagram-state");
    for c in &state.classes {
        classes.push(' ');
        classes.push_str(c);
    }
    let g = svg::group().class(&classes).attr("id", &state.id);

    match state.state_type {
        StateType::Start => g.child(
            svg::circle(n.x, n.y, START_SIZE / 2.0)
                .class("state-start")
                .attr("fill", &theme.special_state_color)
                .attr("stroke", &theme.special_state_color),
        ),
        StateType::End => g
            .child(
                svg::circle(n.x, n.y, START_SIZE / 2.0)
                    .class("state-end")
                    .attr("fill", &theme.state_bkg)
                    .attr("stroke", &theme.special_state_color)
                    .attr("stroke-width", 2),
            )
            .child(
                svg::circle(n.x, n.y, START_SIZE / 2.0 - 3.0)
                    .class("state-end-inner")
                    .attr("fill", &theme.special_state_color),
            ),
        StateType::Fork | StateType::Join => g.child(
            svg::centered_rect(n.x, n.y, n.width, n.height)
                .class("fork-join")
                .attr("fill", &theme.special_state_color)
                .attr("stroke", &theme.special_state_color),
        ),
        StateType::Choice => {
            let (hw, hh) = (n.width / 2.0, n.height / 2.0);
            g.child(
                svg::polygon(&[
                    (n.x, n.y - hh),
                    (n.x + hw, n.y),
                    (n.x, n.y + hh),
                    (n.x - hw, n.y),
                ])
                .class("choice")
                .attr("fill", &theme.state_bkg)
                .attr("stroke", &theme.state_border),
            )
        }
        StateType::Default | StateType::Divider => {
            let text = node_text(state);
            let mut g = g.child(
                svg::centered_rect(n.x, n.y, n.width, n.height)
                    .class("basic")
                    .num("rx", opts.radius)
                    .num("ry", opts.radius)
                    .attr("fill", &theme.state_bkg)
                    .attr("stroke", &theme.state_border)
                    .attr_opt("style", &style_attr(&styles)),
            );
            let top = n.y - n.height / 2.0;
            if text.body.is_empty() {
                return g.child(
                    svg::text(n.x, n.y, &text.title)
                        .class("state-label")
                        .attr("text-anchor", "middle")
                        .attr("dominant-baseline", "central")
                        .attr("fill", &theme.state_label_color)
                        .attr_opt("style", &style_attr(&text_styles)),
                );
            }
            let title_h = measurer.measure(&text.title, style).height;
            let divider_y = top + opts.padding + title_h + opts.divider_margin / 2.0;
            let left = n.x - n.width / 2.0;
            g.push(
                svg::text(n.x, top + opts.padding + title_h / 2.0, &text.title)
                    .class("state-title")
                    .attr("text-anchor", "middle")
                    .attr("dominant-baseline", "central")
                    .attr("fill", &theme.state_label_color),
            );
            g.push(
                svg::line(left, divider_y, left + n.width, divider_y)
                    .class("divider")
                    .attr("stroke", &theme.state_border),
            );
            g.push(
                svg::text(
                    left + opts.padding,
                    divider_y + opts.divider_margin / 2.0 + style.font_size,
                    &text.body.join("\n"),
                )
                .class("state-description")
                .attr("fill", &theme.state_label_color)
                .attr_opt("style", &style_attr(&text_styles)),
            );
            g
        }
    }
}

fn draw_note(text: &str, center: Point, (w, h): (f64, f64), state: &NodeLabel, theme: &Theme) -> Element {
    let toward = if center.x < state.x {
        center.x + w / 2.0
    } else {
        center.x - w / 2.0
    };
    let edge = if center.x < state.x {
        state.x - state.width / 2.0
    } else {
        state.x + state.width / 2.0
    };
    svg::group()
        .class("note")
        .child(
            svg::line(toward, center.y, edge, state.y)
                .class("note-edge")
                .attr("stroke", &theme.note_border_color)
                .attr("stroke-dasharray", "3,3"),
        )
        .child(
            svg::centered_rect(center.x, center.y, w, h)
                .class("note-box")
                .attr("fill", &theme.note_bkg_color)
                .attr("stroke", &theme.note_border_color),
        )
        .child(
            svg::text(center.x, center.y, text)
                .class("note-text")
                .attr("text-anchor", "middle")
                .attr("dominant-baseline", "central")
                .attr("fill", &theme.note_text_color),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::DeterministicTextMeasurer;
    use crate::state::parse_into;

    fn render_text(text: &str, config: &Config, theme: &Theme) -> Result<Element> {
        let mut db = Db::new();
        parse_into(text, &mut db)?;
        render(&db, config, theme, &DeterministicTextMeasurer::default())
    }

    fn layout_for(text: &str) -> (Db, LayoutGraph) {
        let mut db = Db::new();
        parse_into(text, &mut db).unwrap();
        let opts = Options::from_config(&Config::default());
        let measurer = DeterministicTextMeasurer::default();
        let (mut g, _, _) = build_graph(&db, &opts, &TextStyle::default(), &measurer).unwrap();
        strata::layout(&mut g).unwrap();
        (db, g)
    }

    #[test]
    fn transitions_flow_down_the_ranks() {
        let (_, g) = layout_for("stateDiagram\n[*] --> A\nA --> B\nB --> [*]\n");
        let y = |id: &str| g.node(id).unwrap().y;
        assert!(y("root_start") < y("A"));
        assert!(y("A") < y("B"));
        assert!(y("B") < y("root_end"));
    }

    #[test]
    fn composites_contain_their_children() {
        let (_, g) = layout_for(
            "stateDiagram\n[*] --> Outer\nstate Outer {\n  [*] --> In1\n  In1 --> In2\n}\nOuter --> Done\n",
        );
        let outer = g.node("Outer").unwrap();
        for child in ["In1", "In2", "Outer_start"] {
            let c = g.node(child).unwrap();
            assert!(c.x - c.width / 2.0 >= outer.x - outer.width / 2.0 - 1e-6);
            assert!(c.x + c.width / 2.0 <= outer.x + outer.width / 2.0 + 1e-6);
            assert!(c.y - c.height / 2.0 >= outer.y - outer.height / 2.0 - 1e-6);
            assert!(c.y + c.height / 2.0 <= outer.y + outer.height / 2.0 + 1e-6);
        }
        assert_eq!(g.parent("In1"), Some("Outer"));
    }

    #[test]
    fn edges_into_composites_attach_to_their_first_state() {
        let (db, g) = layout_for("stateDiagram\nA --> Outer\nstate Outer {\n  Inner\n}\n");
        assert_eq!(db.relations().len(), 1);
        assert!(g.edge("A", "Inner", Some("edge0")).is_some());
    }

    #[test]
    fn fork_bars_turn_with_the_direction() {
        let db_text = "stateDiagram\ndirection LR\nstate f <<fork>>\nA --> f\n";
        let (_, g) = layout_for(db_text);
        let f = g.node("f").unwrap();
        assert!(f.height > f.width);
    }

    #[test]
    fn rendered_svg_has_nodes_edges_and_notes() {
        let svg = render_text(
            "stateDiagram-v2\n[*] --> Still\nStill --> Moving : push\nnote right of Moving : rolling\nMoving --> [*]\n",
            &Config::default(),
            &Theme::default(),
        )
        .unwrap();
        assert_eq!(svg.find_by_class("transition").len(), 3);
        assert_eq!(svg.find_by_class("edgeLabel").len(), 1);
        assert_eq!(svg.find_by_class("statediagram-state").len(), 4);
        assert_eq!(svg.find_by_class("note").len(), 1);
        assert_eq!(svg.find_by_class("state-start").len(), 1);
        assert_eq!(svg.find_by_class("state-end").len(), 1);
    }

    #[test]
    fn class_styles_reach_the_shape() {
        let svg = render_text(
            "stateDiagram\nclassDef hot fill:#f00\nA:::hot --> B\n",
            &Config::default(),
            &Theme::default(),
        )
        .unwrap();
        let shapes = svg.find_by_class("basic");
        assert_eq!(shapes[0].get_attr("style"), Some("fill:#f00"));
        assert_eq!(shapes[1].get_attr("style"), None);
    }
}
