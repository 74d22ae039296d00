use serde::Serialize;
use tracing::{debug, debug_span};

use super::{DIAGRAM_TYPE, Db};
use crate::svg::{self, Bounds, Element, fmt};
use crate::text::TextMeasurer;
use crate::{Config, Result, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XAxisPosition {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YAxisPosition {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct Options {
    chart_width: f64,
    chart_height: f64,
    title_padding: f64,
    title_font_size: f64,
    quadrant_padding: f64,
    x_axis_label_padding: f64,
    y_axis_label_padding: f64,
    x_axis_label_font_size: f64,
    y_axis_label_font_size: f64,
    quadrant_label_font_size: f64,
    quadrant_text_top_padding: f64,
    point_text_padding: f64,
    point_label_font_size: f64,
    point_radius: f64,
    x_axis_position: XAxisPosition,
    y_axis_position: YAxisPosition,
    internal_border_width: f64,
    external_border_width: f64,
}

impl Options {
    fn from_config(config: &Config) -> Self {
        let f = |key: &str, default: f64| config.f64_or(&format!("quadrantChart.{key}"), default);
        Self {
            chart_width: f("chartWidth", 500.0),
            chart_height: f("chartHeight", 500.0),
            title_padding: f("titlePadding", 10.0),
            title_font_size: f("titleFontSize", 20.0),
            quadrant_padding: f("quadrantPadding", 5.0),
            x_axis_label_padding: f("xAxisLabelPadding", 5.0),
            y_axis_label_padding: f("yAxisLabelPadding", 5.0),
            x_axis_label_font_size: f("xAxisLabelFontSize", 16.0),
            y_axis_label_font_size: f("yAxisLabelFontSize", 16.0),
            quadrant_label_font_size: f("quadrantLabelFontSize", 16.0),
            quadrant_text_top_padding: f("quadrantTextTopPadding", 5.0),
            point_text_padding: f("pointTextPadding", 5.0),
            point_label_font_size: f("pointLabelFontSize", 12.0),
            point_radius: f("pointRadius", 5.0),
            x_axis_position: match config.get_str("quadrantChart.xAxisPosition") {
                Some("bottom") => XAxisPosition::Bottom,
                _ => XAxisPosition::Top,
            },
            y_axis_position: match config.get_str("quadrantChart.yAxisPosition") {
                Some("right") => YAxisPosition::Right,
                _ => YAxisPosition::Left,
            },
            internal_border_width: f("quadrantInternalBorderStrokeWidth", 1.0),
            external_border_width: f("quadrantExternalBorderStrokeWidth", 2.0),
        }
    }
}

/// A positioned label. `anchor` and `baseline` are the SVG `text-anchor` and
/// `dominant-baseline` values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextItem {
    pub text: String,
    pub fill: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub anchor: &'static str,
    pub baseline: &'static str,
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuadrantBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    pub text: TextItem,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorderLine {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub stroke: String,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedPoint {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub fill: String,
    pub stroke_color: String,
    pub stroke_width: String,
    pub text: TextItem,
}

/// Everything the chart draws, in chart coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub title: Option<TextItem>,
    pub quadrants: Vec<QuadrantBox>,
    pub border_lines: Vec<BorderLine>,
    pub points: Vec<PlacedPoint>,
    pub axis_labels: Vec<TextItem>,
}

fn scale_linear(domain: (f64, f64), range: (f64, f64), v: f64) -> f64 {
    let (d0, d1) = domain;
    let (r0, r1) = range;
    if d1 == d0 {
        return r0;
    }
    r0 + (v - d0) / (d1 - d0) * (r1 - r0)
}

/// Places quadrants, axis labels, borders and points.
pub fn layout(db: &Db, config: &Config, theme: &Theme) -> Layout {
    let cfg = Options::from_config(config);
    let axes = db.axes();

    let title_text = db.title().unwrap_or("").trim();
    let show_title = !title_text.is_empty();
    let show_x_axis = !axes.x_left.trim().is_empty() || !axes.x_right.trim().is_empty();
    let show_y_axis = !axes.y_bottom.trim().is_empty() || !axes.y_top.trim().is_empty();

    // Points take the top edge for quadrant labels, so the x axis moves down.
    let x_axis_position = if db.points().is_empty() {
        cfg.x_axis_position
    } else {
        XAxisPosition::Bottom
    };

    let x_axis_space = cfg.x_axis_label_padding * 2.0 + cfg.x_axis_label_font_size;
    let x_axis_top = if show_x_axis && x_axis_position == XAxisPosition::Top {
        x_axis_space
    } else {
        0.0
    };
    let x_axis_bottom = if show_x_axis && x_axis_position == XAxisPosition::Bottom {
        x_axis_space
    } else {
        0.0
    };
    let y_axis_space = cfg.y_axis_label_padding * 2.0 + cfg.y_axis_label_font_size;
    let y_axis_left = if show_y_axis && cfg.y_axis_position == YAxisPosition::Left {
        y_axis_space
    } else {
        0.0
    };
    let y_axis_right = if show_y_axis && cfg.y_axis_position == YAxisPosition::Right {
        y_axis_space
    } else {
        0.0
    };
    let title_space = if show_title {
        cfg.title_font_size + cfg.title_padding * 2.0
    } else {
        0.0
    };

    let left = cfg.quadrant_padding + y_axis_left;
    let top = cfg.quadrant_padding + x_axis_top + title_space;
    let width = cfg.chart_width - cfg.quadrant_padding * 2.0 - y_axis_left - y_axis_right;
    let height =
        cfg.chart_height - cfg.quadrant_padding * 2.0 - x_axis_top - x_axis_bottom - title_space;
    let (half_w, half_h) = (width / 2.0, height / 2.0);

    let quadrant_specs = [
        (left + half_w, top, &theme.quadrant1_fill, &theme.quadrant1_text_fill),
        (left, top, &theme.quadrant2_fill, &theme.quadrant2_text_fill),
        (left, top + half_h, &theme.quadrant3_fill, &theme.quadrant3_text_fill),
        (left + half_w, top + half_h, &theme.quadrant4_fill, &theme.quadrant4_text_fill),
    ];
    let quadrants = quadrant_specs
        .into_iter()
        .enumerate()
        .map(|(i, (x, y, fill, text_fill))| {
            let (text_y, baseline) = if db.points().is_empty() {
                (y + half_h / 2.0, "middle")
            } else {
                (y + cfg.quadrant_text_top_padding, "hanging")
            };
            QuadrantBox {
                x,
                y,
                width: half_w,
                height: half_h,
                fill: fill.clone(),
                text: TextItem {
                    text: db.quadrant_text(i + 1).to_string(),
                    fill: text_fill.clone(),
                    x: x + half_w / 2.0,
                    y: text_y,
                    font_size: cfg.quadrant_label_font_size,
                    anchor: "middle",
                    baseline,
                    rotation: 0.0,
                },
            }
        })
        .collect();

    let mut axis_labels = Vec::new();
    if show_x_axis {
        let centered = !axes.x_right.trim().is_empty();
        let y = match x_axis_position {
            XAxisPosition::Top => cfg.x_axis_label_padding + title_space,
            XAxisPosition::Bottom => {
                cfg.x_axis_label_padding + top + height + cfg.quadrant_padding
            }
        };
        let shift = if centered { half_w / 2.0 } else { 0.0 };
        let anchor = if centered { "middle" } else { "start" };
        for (text, x) in [(&axes.x_left, left + shift), (&axes.x_right, left + half_w + shift)] {
            if text.trim().is_empty() {
                continue;
            }
            axis_labels.push(TextItem {
                text: text.clone(),
                fill: theme.quadrant_x_axis_text_fill.clone(),
                x,
                y,
                font_size: cfg.x_axis_label_font_size,
                anchor,
                baseline: "hanging",
                rotation: 0.0,
            });
        }
    }
    if show_y_axis {
        let centered = !axes.y_top.trim().is_empty();
        let x = match cfg.y_axis_position {
            YAxisPosition::Left => cfg.y_axis_label_padding,
            YAxisPosition::Right => cfg.y_axis_label_padding + left + width + cfg.quadrant_padding,
        };
        let shift = if centered { half_h / 2.0 } else { 0.0 };
        let anchor = if centered { "middle" } else { "start" };
        for (text, y) in [
            (&axes.y_bottom, top + height - shift),
            (&axes.y_top, top + half_h - shift),
        ] {
            if text.trim().is_empty() {
                continue;
            }
            axis_labels.push(TextItem {
                text: text.clone(),
                fill: theme.quadrant_y_axis_text_fill.clone(),
                x,
                y,
                font_size: cfg.y_axis_label_font_size,
                anchor,
                baseline: "hanging",
                rotation: -90.0,
            });
        }
    }

    let half_border = cfg.external_border_width / 2.0;
    let external = |x1, y1, x2, y2| BorderLine {
        x1,
        y1,
        x2,
        y2,
        stroke: theme.quadrant_external_border_stroke_fill.clone(),
        stroke_width: cfg.external_border_width,
    };
    let internal = |x1, y1, x2, y2| BorderLine {
        x1,
        y1,
        x2,
        y2,
        stroke: theme.quadrant_internal_border_stroke_fill.clone(),
        stroke_width: cfg.internal_border_width,
    };
    let border_lines = vec![
        external(left - half_border, top, left + width + half_border, top),
        external(left + width, top + half_border, left + width, top + height - half_border),
        external(left - half_border, top + height, left + width + half_border, top + height),
        external(left, top + half_border, left, top + height - half_border),
        internal(left + half_w, top + half_border, left + half_w, top + height - half_border),
        internal(left + half_border, top + half_h, left + width - half_border, top + half_h),
    ];

    let points = db
        .points()
        .iter()
        .map(|p| {
            let styles = db.point_styles(p);
            let x = scale_linear((0.0, 1.0), (left, left + width), p.x);
            let y = scale_linear((0.0, 1.0), (top + height, top), p.y);
            PlacedPoint {
                x,
                y,
                radius: styles.radius.unwrap_or(cfg.point_radius),
                fill: styles
                    .color
                    .clone()
                    .unwrap_or_else(|| theme.quadrant_point_fill.clone()),
                stroke_color: styles
                    .stroke_color
                    .unwrap_or_else(|| theme.quadrant_point_fill.clone()),
                stroke_width: styles.stroke_width.unwrap_or_else(|| "0px".to_string()),
                text: TextItem {
                    text: p.text.clone(),
                    fill: theme.quadrant_point_text_fill.clone(),
                    x,
                    y: y + cfg.point_text_padding,
                    font_size: cfg.point_label_font_size,
                    anchor: "middle",
                    baseline: "hanging",
                    rotation: 0.0,
                },
            }
        })
        .collect();

    let title = show_title.then(|| TextItem {
        text: title_text.to_string(),
        fill: theme.quadrant_title_fill.clone(),
        x: cfg.chart_width / 2.0,
        y: cfg.title_padding,
        font_size: cfg.title_font_size,
        anchor: "middle",
        baseline: "hanging",
        rotation: 0.0,
    });

    Layout {
        width: cfg.chart_width,
        height: cfg.chart_height,
        title,
        quadrants,
        border_lines,
        points,
        axis_labels,
    }
}

fn draw_text(item: &TextItem) -> Element {
    svg::text(0.0, 0.0, &item.text)
        .attr("fill", &item.fill)
        .num("font-size", item.font_size)
        .attr("text-anchor", item.anchor)
        .attr("dominant-baseline", item.baseline)
        .attr(
            "transform",
            format!(
                "translate({}, {}) rotate({})",
                fmt(item.x),
                fmt(item.y),
                fmt(item.rotation)
            ),
        )
}

/// Renders the quadrant chart as an SVG tree. Text sizes come from config, so the measurer is
/// not consulted.
pub fn render(db: &Db, config: &Config, theme: &Theme, _measurer: &dyn TextMeasurer) -> Result<Element> {
    let _span = debug_span!("render", diagram = DIAGRAM_TYPE).entered();
    let layout = layout(db, config, theme);
    debug!(
        points = layout.points.len(),
        width = layout.width,
        height = layout.height,
        "laid out quadrant chart"
    );

    let mut bounds = Bounds::default();
    bounds.include_rect(0.0, 0.0, layout.width, layout.height);
    let doc = svg::document(DIAGRAM_TYPE, bounds, 0.0);
    let doc = svg::accessibility(doc, db.acc_title(), db.acc_descr());

    let mut main = svg::group().class("main");

    let mut quadrants = svg::group().class("quadrants");
    for q in &layout.quadrants {
        quadrants.push(
            svg::group()
                .class("quadrant")
                .child(svg::rect(q.x, q.y, q.width, q.height).attr("fill", &q.fill))
                .child(draw_text(&q.text)),
        );
    }
    main.push(quadrants);

    let mut borders = svg::group().class("border");
    for line in &layout.border_lines {
        borders.push(
            svg::line(line.x1, line.y1, line.x2, line.y2)
                .attr("stroke", &line.stroke)
                .num("stroke-width", line.stroke_width),
        );
    }
    main.push(borders);

    let mut points = svg::group().class("data-points");
    for p in &layout.points {
        points.push(
            svg::group()
                .class("data-point")
                .child(
                    svg::circle(p.x, p.y, p.radius)
                        .attr("fill", &p.fill)
                        .attr("stroke", &p.stroke_color)
                        .attr("stroke-width", &p.stroke_width),
                )
                .child(draw_text(&p.text)),
        );
    }
    main.push(points);

    let mut labels = svg::group().class("labels");
    for label in &layout.axis_labels {
        labels.push(draw_text(label).class("label"));
    }
    main.push(labels);

    let mut title = svg::group().class("title");
    if let Some(t) = &layout.title {
        title.push(draw_text(t));
    }
    main.push(title);

    Ok(doc.child(main))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadrant_chart::parse_into;
    use crate::text::DeterministicTextMeasurer;

    fn layout_of(text: &str) -> Layout {
        let mut db = Db::new();
        parse_into(text, &mut db).unwrap();
        layout(&db, &Config::default(), &Theme::default())
    }

    #[test]
    fn points_scale_onto_the_plot_with_y_inverted() {
        let l = layout_of("quadrantChart\nA: [0.5, 0.5]\nB: [0, 1]\nC: [1, 0]\n");
        let xy: Vec<(f64, f64)> = l.points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(xy, vec![(250.0, 250.0), (5.0, 5.0), (495.0, 495.0)]);
        assert_eq!(l.points[0].text.y, 255.0);
        assert_eq!(l.points[0].radius, 5.0);
        assert_eq!(l.points[0].stroke_width, "0px");
    }

    #[test]
    fn title_and_axes_shrink_the_plot() {
        let l = layout_of(
            "quadrantChart\ntitle T\nx-axis Low --> High\ny-axis Bottom --> Top\nP: [0, 1]\n",
        );
        // Title takes 40px on top, the x axis 26px at the bottom, the y axis 26px on the left.
        let q2 = &l.quadrants[1];
        assert_eq!((q2.x, q2.y), (31.0, 45.0));
        assert_eq!(q2.width, (500.0 - 10.0 - 26.0) / 2.0);
        assert_eq!(q2.height, (500.0 - 10.0 - 26.0 - 40.0) / 2.0);
        assert_eq!((l.points[0].x, l.points[0].y), (31.0, 45.0));

        assert_eq!(l.axis_labels.len(), 4);
        let x_low = &l.axis_labels[0];
        assert_eq!(x_low.anchor, "middle");
        assert_eq!(x_low.y, 5.0 + 45.0 + 424.0 + 5.0);
        let y_bottom = &l.axis_labels[2];
        assert_eq!(y_bottom.rotation, -90.0);
        assert_eq!(y_bottom.x, 5.0);
    }

    #[test]
    fn x_axis_stays_on_top_without_points() {
        let l = layout_of("quadrantChart\nx-axis Low\nquadrant-1 Q1\n");
        assert_eq!(l.axis_labels.len(), 1);
        assert_eq!(l.axis_labels[0].y, 5.0);
        assert_eq!(l.axis_labels[0].anchor, "start");
        assert_eq!(l.quadrants[0].y, 31.0);
        assert_eq!(l.quadrants[0].text.baseline, "middle");
    }

    #[test]
    fn quadrant_labels_move_to_the_top_when_points_exist() {
        let l = layout_of("quadrantChart\nquadrant-1 Q1\nP: [0.2, 0.2]\n");
        assert_eq!(l.quadrants[0].text.text, "Q1");
        assert_eq!(l.quadrants[0].text.baseline, "hanging");
        assert_eq!(l.quadrants[0].text.y, l.quadrants[0].y + 5.0);
    }

    #[test]
    fn point_styles_reach_the_circle() {
        let l = layout_of(
            "quadrantChart\nclassDef big radius: 12\nP:::big: [0.2, 0.2] color: #ff0000, stroke-width: 2px\n",
        );
        assert_eq!(l.points[0].radius, 12.0);
        assert_eq!(l.points[0].fill, "#ff0000");
        assert_eq!(l.points[0].stroke_width, "2px");
    }

    #[test]
    fn renders_quadrants_borders_and_points() {
        let mut db = Db::new();
        parse_into("quadrantChart\ntitle Reach\nquadrant-1 Go\nA: [0.3, 0.6]\n", &mut db).unwrap();
        let svg = render(
            &db,
            &Config::default(),
            &Theme::default(),
            &DeterministicTextMeasurer::default(),
        )
        .unwrap();
        assert_eq!(svg.find_by_class("quadrant").len(), 4);
        assert_eq!(svg.find_by_class("border")[0].find_all("line").len(), 6);
        assert_eq!(svg.find_by_class("data-point").len(), 1);
        assert_eq!(svg.find_by_class("title")[0].text_content(), "Reach");
        assert_eq!(svg.get_attr("viewBox"), Some("0 0 500 500"));
    }
}
