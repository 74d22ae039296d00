use strata::graphlib::{Graph, GraphOptions};
use strata::{EdgeLabel, GraphLabel, LabelPos, LayoutGraph, NodeLabel};
use tracing::{debug, debug_span, warn};

use super::{DIAGRAM_TYPE, Db, RelationshipKind};
use crate::style::style_attr;
use crate::svg::{self, Bounds, Element};
use crate::text::{TextMeasurer, TextStyle};
use crate::{Config, Result, Theme};

const ARROW_MARKER: &str = "requirement-arrow";
const CONTAINS_MARKER: &str = "requirement-contains";

struct Options {
    diagram_padding: f64,
    node_spacing: f64,
    rank_spacing: f64,
    rect_min_width: f64,
    rect_padding: f64,
    font_size: f64,
}

impl Options {
    fn from_config(config: &Config) -> Self {
        Self {
            diagram_padding: config.f64_or("requirement.diagramPadding", 8.0),
            node_spacing: config.f64_or("requirement.nodeSpacing", 50.0),
            rank_spacing: config.f64_or("requirement.rankSpacing", 50.0),
            rect_min_width: config.f64_or("requirement.rectMinWidth", 200.0),
            rect_padding: config.f64_or("requirement.rectPadding", 10.0),
            font_size: config.f64_or("requirement.fontSize", 14.0),
        }
    }
}

/// The text stacked inside a requirement or element box.
struct BoxSpec {
    id: String,
    kind: String,
    name: String,
    body: Vec<String>,
    styles: Vec<String>,
    text_styles: Vec<String>,
}

fn box_specs(db: &Db) -> Vec<BoxSpec> {
    let mut out = Vec::new();
    for r in db.requirements() {
        let mut body = Vec::new();
        if !r.requirement_id.is_empty() {
            body.push(format!("ID: {}", r.requirement_id));
        }
        if !r.text.is_empty() {
            body.push(format!("Text: {}", r.text));
        }
        if let Some(risk) = r.risk {
            body.push(format!("Risk: {risk}"));
        }
        if let Some(method) = r.verify_method {
            body.push(format!("Verification: {method}"));
        }
        out.push(BoxSpec {
            id: r.name.clone(),
            kind: format!("<<{}>>", r.kind),
            name: r.name.clone(),
            body,
            styles: r.css_styles.clone(),
            text_styles: db.text_styles(&r.classes),
        });
    }
    for e in db.elements() {
        let mut body = Vec::new();
        if !e.element_type.is_empty() {
            body.push(format!("Type: {}", e.element_type));
        }
        if !e.doc_ref.is_empty() {
            body.push(format!("Doc Ref: {}", e.doc_ref));
        }
        out.push(BoxSpec {
            id: e.name.clone(),
            kind: "<<Element>>".to_string(),
            name: e.name.clone(),
            body,
            styles: e.css_styles.clone(),
            text_styles: db.text_styles(&e.classes),
        });
    }
    out
}

/// Line heights of the kind, name and body lines, in that order.
struct BoxMetrics {
    width: f64,
    height: f64,
    kind_h: f64,
    name_h: f64,
    body_h: Vec<f64>,
}

fn measure_box(spec: &BoxSpec, opts: &Options, style: &TextStyle, measurer: &dyn TextMeasurer) -> BoxMetrics {
    let bold = style.clone().bold();
    let kind = measurer.measure(&spec.kind, style);
    let name = measurer.measure(&spec.name, &bold);
    let body: Vec<_> = spec.body.iter().map(|l| measurer.measure(l, style)).collect();

    let max_w = body
        .iter()
        .map(|m| m.width)
        .fold(kind.width.max(name.width), f64::max);
    let gap = if body.is_empty() { 0.0 } else { opts.rect_padding };
    let height = 2.0 * opts.rect_padding
        + kind.height
        + name.height
        + gap
        + body.iter().map(|m| m.height).sum::<f64>();
    BoxMetrics {
        width: (max_w + 2.0 * opts.rect_padding).max(opts.rect_min_width),
        height,
        kind_h: kind.height,
        name_h: name.height,
        body_h: body.iter().map(|m| m.height).collect(),
    }
}

struct Edge {
    name: String,
    src: String,
    dst: String,
    kind: RelationshipKind,
    label: String,
}

/// Renders the requirement diagram as an SVG tree.
pub fn render(db: &Db, config: &Config, theme: &Theme, measurer: &dyn TextMeasurer) -> Result<Element> {
    let _span = debug_span!("render", diagram = DIAGRAM_TYPE).entered();
    let opts = Options::from_config(config);
    let style = TextStyle {
        font_family: Some(theme.font_family.clone()),
        font_size: opts.font_size,
        font_weight: None,
    };

    let mut g: LayoutGraph = Graph::new(GraphOptions::multigraph());
    g.set_graph(GraphLabel {
        rankdir: db.direction(),
        nodesep: opts.node_spacing,
        ranksep: opts.rank_spacing,
        marginx: 8.0,
        marginy: 8.0,
        ..Default::default()
    });

    let specs = box_specs(db);
    let mut metrics = Vec::with_capacity(specs.len());
    for spec in &specs {
        let m = measure_box(spec, &opts, &style, measurer);
        g.set_node(spec.id.clone(), NodeLabel::new(m.width, m.height));
        metrics.push(m);
    }

    let mut edges = Vec::new();
    for (i, rel) in db.relationships().iter().enumerate() {
        if !db.has_node(&rel.src) || !db.has_node(&rel.dst) {
            warn!(
                src = %rel.src,
                dst = %rel.dst,
                kind = %rel.kind,
                "skipping relationship with an undeclared endpoint"
            );
            continue;
        }
        let label = format!("<<{}>>", rel.kind);
        let m = measurer.measure(&label, &style);
        let mut edge_label = EdgeLabel::default().with_size(m.width + 4.0, m.height + 4.0);
        edge_label.labelpos = LabelPos::C;
        let name = format!("{}-{}-{i}", rel.src, rel.dst);
        g.set_edge_named(rel.src.clone(), rel.dst.clone(), Some(name.clone()), Some(edge_label));
        edges.push(Edge {
            name,
            src: rel.src.clone(),
            dst: rel.dst.clone(),
            kind: rel.kind,
            label,
        });
    }

    strata::layout(&mut g)?;
    debug!(
        nodes = g.node_count(),
        edges = g.edge_count(),
        width = g.graph().width,
        height = g.graph().height,
        "laid out requirement diagram"
    );

    let mut bounds = Bounds::default();
    let defs = Element::new("defs")
        .child(svg::arrow_marker(ARROW_MARKER, &theme.relation_color))
        .child(contains_marker(&theme.relation_color));

    let mut edge_group = svg::group().class("relationships");
    let mut label_group = svg::group().class("relationship-labels");
    for edge in &edges {
        let Some(e) = g.edge(&edge.src, &edge.dst, Some(&edge.name)) else {
            continue;
        };
        for p in &e.points {
            bounds.include_point(p.x, p.y);
        }
        let mut path = svg::path(svg::curved_path(&e.points))
            .class("relationshipLine")
            .attr("id", &edge.name)
            .attr("fill", "none")
            .attr("stroke", &theme.relation_color)
            .attr("stroke-width", 1);
        path = if edge.kind == RelationshipKind::Contains {
            path.attr("marker-start", format!("url(#{CONTAINS_MARKER})"))
        } else {
            path.attr("stroke-dasharray", "10,7")
                .attr("marker-end", format!("url(#{ARROW_MARKER})"))
        };
        edge_group.push(path);

        if let (Some(x), Some(y)) = (e.x, e.y) {
            bounds.include_rect(x - e.width / 2.0, y - e.height / 2.0, e.width, e.height);
            label_group.push(
                svg::group()
                    .class("relationshipLabel")
                    .child(
                        svg::centered_rect(x, y, e.width, e.height)
                            .attr("fill", &theme.relation_label_background),
                    )
                    .child(
                        svg::text(x, y, &edge.label)
                            .attr("text-anchor", "middle")
                            .attr("dominant-baseline", "central")
                            .num("font-size", opts.font_size)
                            .attr("fill", &theme.relation_label_color),
                    ),
            );
        }
    }

    let mut node_group = svg::group().class("nodes");
    for (spec, m) in specs.iter().zip(&metrics) {
        let Some(n) = g.node(&spec.id) else {
            continue;
        };
        bounds.include_rect(n.x - n.width / 2.0, n.y - n.height / 2.0, n.width, n.height);
        node_group.push(draw_box(spec, m, n, &opts, theme));
    }

    let doc = svg::document(DIAGRAM_TYPE, bounds, opts.diagram_padding);
    let doc = svg::accessibility(doc, db.acc_title(), db.acc_descr());
    Ok(doc
        .child(defs)
        .child(edge_group)
        .child(label_group)
        .child(node_group))
}

/// Circle with a cross, drawn at the container end of a `contains` relationship.
fn contains_marker(color: &str) -> Element {
    Element::new("marker")
        .attr("id", CONTAINS_MARKER)
        .attr("refX", 0)
        .attr("refY", 9)
        .attr("markerWidth", 20)
        .attr("markerHeight", 20)
        .attr("orient", "auto")
        .child(
            svg::circle(10.0, 10.0, 9.0)
                .attr("fill", "none")
                .attr("stroke", color),
        )
        .child(
            svg::path("M 1 10 H 19 M 10 1 V 19")
                .attr("stroke", color)
                .attr("stroke-width", 1),
        )
}

fn draw_box(spec: &BoxSpec, m: &BoxMetrics, n: &NodeLabel, opts: &Options, theme: &Theme) -> Element {
    let left = n.x - n.width / 2.0;
    let top = n.y - n.height / 2.0;
    let text_style = style_attr(&spec.text_styles);
    let label = |x: f64, y: f64, text: &str, anchor: &str| {
        svg::text(x, y, text)
            .attr("text-anchor", anchor)
            .attr("dominant-baseline", "central")
            .num("font-size", opts.font_size)
            .attr("fill", &theme.requirement_text_color)
            .attr_opt("style", &text_style)
    };

    let mut g = svg::group()
        .class("node requirementBox")
        .attr("id", &spec.id)
        .child(
            svg::rect(left, top, n.width, n.height)
                .class("requirement-rect")
                .attr("fill", &theme.requirement_background)
                .attr("stroke", &theme.requirement_border_color)
                .num("stroke-width", theme.requirement_border_size)
                .attr_opt("style", &style_attr(&spec.styles)),
        );

    let mut y = top + opts.rect_padding;
    g.push(label(n.x, y + m.kind_h / 2.0, &spec.kind, "middle").class("requirement-kind"));
    y += m.kind_h;
    g.push(
        label(n.x, y + m.name_h / 2.0, &spec.name, "middle")
            .class("requirement-name")
            .attr("font-weight", "bold"),
    );
    y += m.name_h;

    if !spec.body.is_empty() {
        let divider = y + opts.rect_padding / 2.0;
        g.push(
            svg::line(left, divider, left + n.width, divider)
                .class("divider")
                .attr("stroke", &theme.requirement_border_color),
        );
        y += opts.rect_padding;
        for (line, h) in spec.body.iter().zip(&m.body_h) {
            g.push(label(left + opts.rect_padding, y + h / 2.0, line, "start").class("requirement-field"));
            y += h;
        }
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::parse_into;
    use crate::text::DeterministicTextMeasurer;

    const CHAIN: &str = "requirementDiagram
requirement test_req {
  id: 1
  text: the test text.
  risk: high
  verifymethod: test
}
element test_entity {
  type: simulation
}
test_entity - satisfies -> test_req
";

    fn render_text(text: &str) -> Element {
        let mut db = Db::new();
        parse_into(text, &mut db).unwrap();
        render(
            &db,
            &Config::default(),
            &Theme::default(),
            &DeterministicTextMeasurer::default(),
        )
        .unwrap()
    }

    #[test]
    fn boxes_list_their_fields() {
        let svg = render_text(CHAIN);
        let boxes = svg.find_by_class("requirementBox");
        assert_eq!(boxes.len(), 2);
        let fields: Vec<String> = boxes[0]
            .find_by_class("requirement-field")
            .iter()
            .map(|e| e.text_content())
            .collect();
        assert_eq!(
            fields,
            vec!["ID: 1", "Text: the test text.", "Risk: High", "Verification: Test"]
        );
        assert_eq!(
            boxes[0].find_by_class("requirement-kind")[0].text_content(),
            "<<Requirement>>"
        );
        assert_eq!(
            boxes[1].find_by_class("requirement-kind")[0].text_content(),
            "<<Element>>"
        );
    }

    #[test]
    fn relationships_are_labelled_and_flow_down() {
        let svg = render_text(CHAIN);
        let labels = svg.find_by_class("relationshipLabel");
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text_content(), "<<satisfies>>");
        let line = &svg.find_by_class("relationshipLine")[0];
        assert_eq!(line.get_attr("marker-end"), Some("url(#requirement-arrow)"));
        assert_eq!(line.get_attr("stroke-dasharray"), Some("10,7"));

        let rects = svg.find_by_class("requirement-rect");
        let y = |e: &Element| e.get_attr("y").unwrap().parse::<f64>().unwrap();
        // test_entity is the source, so it sits on the higher rank.
        assert!(y(rects[1]) < y(rects[0]));
    }

    #[test]
    fn contains_uses_a_start_marker() {
        let svg = render_text("requirementDiagram\nelement a {\n}\nelement b {\n}\na - contains -> b\n");
        let line = &svg.find_by_class("relationshipLine")[0];
        assert_eq!(line.get_attr("marker-start"), Some("url(#requirement-contains)"));
        assert_eq!(line.get_attr("stroke-dasharray"), None);
    }

    #[test]
    fn undeclared_endpoints_are_skipped() {
        let svg = render_text("requirementDiagram\nelement a {\n}\na - traces -> ghost\n");
        assert_eq!(svg.find_by_class("requirementBox").len(), 1);
        assert!(svg.find_by_class("relationshipLine").is_empty());
    }

    #[test]
    fn boxes_respect_the_minimum_width() {
        let svg = render_text("requirementDiagram\nelement a {\n}\n");
        let rect = &svg.find_by_class("requirement-rect")[0];
        assert_eq!(rect.get_attr("width"), Some("200"));
        assert!(svg.find_by_class("divider").is_empty());
    }

    #[test]
    fn styles_reach_the_box() {
        let svg = render_text(
            "requirementDiagram\nelement a {\n}\nclassDef hot fill:#f00,color:white\na:::hot\n",
        );
        let rect = &svg.find_by_class("requirement-rect")[0];
        assert_eq!(rect.get_attr("style"), Some("fill:#f00;color:white"));
        let name = &svg.find_by_class("requirement-name")[0];
        assert_eq!(name.get_attr("style"), Some("fill:white"));
    }
}
