//! A small SVG element tree.
//!
//! Renderers build [`Element`]s with the chaining helpers below and serialize the finished tree
//! with `to_string()`. Attribute order is insertion order so output is stable.

use std::fmt::{self, Write as _};

use indexmap::IndexMap;
use strata::Point;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Like [`Element::attr`] but formats the number the way every renderer does.
    pub fn num(self, name: &str, value: f64) -> Self {
        self.attr(name, fmt(value))
    }

    /// Skips empty values so optional styles don't produce `style=""`.
    pub fn attr_opt(self, name: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.attr(name, value)
        }
    }

    pub fn set_attr(&mut self, name: &str, value: impl fmt::Display) {
        self.attrs.insert(name.to_string(), value.to_string());
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Every descendant named `name`, in document order.
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = vec![self];
        while let Some(e) = stack.pop() {
            if e.name == name && !std::ptr::eq(e, self) {
                out.push(e);
            }
            let children: Vec<&Element> = e.elements().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Descendants carrying `class` among their space-separated classes.
    pub fn find_by_class(&self, class: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = vec![self];
        while let Some(e) = stack.pop() {
            if e
                .get_attr("class")
                .is_some_and(|c| c.split_whitespace().any(|c| c == class))
            {
                out.push(e);
            }
            let children: Vec<&Element> = e.elements().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        let mut stack: Vec<&Node> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => stack.extend(e.children.iter().rev()),
            }
        }
        out
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            let _ = write!(out, " {k}=\"");
            escape_xml_into(out, v);
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_into(out),
                Node::Text(t) => escape_xml_into(out, t),
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_into(&mut out);
        f.write_str(&out)
    }
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_xml_into(&mut out, text);
    out
}

pub fn escape_xml_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Stringifies a coordinate: three fractional digits at most, no `-0`, `0` for non-finite input.
pub fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut v = (v * 1000.0).round() / 1000.0;
    if v == 0.0 {
        v = 0.0;
    }
    format!("{v}")
}

/// Axis-aligned extent of everything a renderer has drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }
}

impl Bounds {
    pub fn include_point(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn include_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.include_point(x, y);
        self.include_point(x + width, y + height);
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_x - self.min_x }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_y - self.min_y }
    }
}

/// Root `<svg>` whose viewBox covers `bounds` plus `padding` on every side.
pub fn document(diagram_type: &str, bounds: Bounds, padding: f64) -> Element {
    let (x, y) = if bounds.is_empty() {
        (0.0, 0.0)
    } else {
        (bounds.min_x, bounds.min_y)
    };
    let width = bounds.width() + 2.0 * padding;
    let height = bounds.height() + 2.0 * padding;
    Element::new("svg")
        .attr("xmlns", SVG_NS)
        .attr("class", diagram_type)
        .num("width", width)
        .num("height", height)
        .attr(
            "viewBox",
            format!(
                "{} {} {} {}",
                fmt(x - padding),
                fmt(y - padding),
                fmt(width),
                fmt(height)
            ),
        )
        .attr("role", "graphics-document document")
        .attr("aria-roledescription", diagram_type)
}

/// Adds `<title>`/`<desc>` children and the matching aria attributes.
pub fn accessibility(mut svg: Element, title: Option<&str>, descr: Option<&str>) -> Element {
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        svg.set_attr("aria-labelledby", "chart-title");
        svg.push(Element::new("title").attr("id", "chart-title").text(title));
    }
    if let Some(descr) = descr.filter(|d| !d.is_empty()) {
        svg.set_attr("aria-describedby", "chart-desc");
        svg.push(Element::new("desc").attr("id", "chart-desc").text(descr));
    }
    svg
}

pub fn group() -> Element {
    Element::new("g")
}

pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Element {
    Element::new("rect")
        .num("x", x)
        .num("y", y)
        .num("width", width)
        .num("height", height)
}

/// Rectangle given by its centre, as layout results are.
pub fn centered_rect(cx: f64, cy: f64, width: f64, height: f64) -> Element {
    rect(cx - width / 2.0, cy - height / 2.0, width, height)
}

pub fn circle(cx: f64, cy: f64, r: f64) -> Element {
    Element::new("circle").num("cx", cx).num("cy", cy).num("r", r)
}

pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Element {
    Element::new("line")
        .num("x1", x1)
        .num("y1", y1)
        .num("x2", x2)
        .num("y2", y2)
}

pub fn path(d: impl Into<String>) -> Element {
    Element::new("path").attr("d", d.into())
}

pub fn polygon(points: &[(f64, f64)]) -> Element {
    let pts = points
        .iter()
        .map(|(x, y)| format!("{},{}", fmt(*x), fmt(*y)))
        .collect::<Vec<_>>()
        .join(" ");
    Element::new("polygon").attr("points", pts)
}

/// One `<text>`, with a `<tspan>` per line when the label has several.
pub fn text(x: f64, y: f64, content: &str) -> Element {
    let lines: Vec<&str> = content.split('\n').collect();
    let el = Element::new("text").num("x", x).num("y", y);
    if lines.len() == 1 {
        return el.text(content);
    }
    lines.iter().enumerate().fold(el, |el, (i, l)| {
        el.child(
            Element::new("tspan")
                .num("x", x)
                .attr("dy", if i == 0 { "0" } else { "1.2em" })
                .text(*l),
        )
    })
}

/// `M x,y L x,y ...` through every point.
pub fn polyline_path(points: &[Point]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{},{}", fmt(p.x), fmt(p.y));
    }
    d
}

/// A smooth path through `points`: straight first and last segments, quadratic curves through
/// the interior points' midpoints.
pub fn curved_path(points: &[Point]) -> String {
    if points.len() < 3 {
        return polyline_path(points);
    }
    let mut d = format!("M{},{}", fmt(points[0].x), fmt(points[0].y));
    for pair in points[1..points.len() - 1].windows(2) {
        let (c, n) = (pair[0], pair[1]);
        let mid = Point::new((c.x + n.x) / 2.0, (c.y + n.y) / 2.0);
        let _ = write!(d, "Q{},{} {},{}", fmt(c.x), fmt(c.y), fmt(mid.x), fmt(mid.y));
    }
    let (c, last) = (points[points.len() - 2], points[points.len() - 1]);
    let _ = write!(d, "Q{},{} {},{}", fmt(c.x), fmt(c.y), fmt(last.x), fmt(last.y));
    d
}

/// `<marker>` with a filled triangle pointing along the path.
pub fn arrow_marker(id: &str, color: &str) -> Element {
    Element::new("marker")
        .attr("id", id)
        .attr("viewBox", "0 0 10 10")
        .attr("refX", "9")
        .attr("refY", "5")
        .attr("markerUnits", "userSpaceOnUse")
        .attr("markerWidth", "8")
        .attr("markerHeight", "8")
        .attr("orient", "auto")
        .child(path("M0,0L10,5L0,10z").attr("fill", color).attr("stroke", color))
}
