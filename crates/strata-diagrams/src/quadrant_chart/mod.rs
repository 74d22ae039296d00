//! Quadrant charts: four labelled quadrants with points placed on a unit square.

mod parse;
mod render;

pub use parse::{Stmt, parse, parse_into};
pub use render::{Layout, layout, render};

use indexmap::IndexMap;
use serde::Serialize;

use crate::{Error, ParseHash, Result};

pub const DIAGRAM_TYPE: &str = "quadrantChart";

/// Per-point overrides, from inline styles or a `classDef`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointStyles {
    pub radius: Option<f64>,
    pub color: Option<String>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<String>,
}

impl PointStyles {
    /// Parses `key: value` pairs. Only the four point properties are accepted.
    pub fn parse(styles: &[String]) -> Result<Self> {
        let mut out = Self::default();
        for raw in styles {
            let style = raw.trim();
            if style.is_empty() {
                continue;
            }
            let Some((key, value)) = style.split_once(':') else {
                return Err(style_error(format!("style named {style} is not supported.")));
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "radius" => {
                    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
                        return Err(style_error(format!(
                            "value for {key} {value} is invalid, please use a valid number"
                        )));
                    }
                    out.radius = value.parse().ok();
                }
                "color" | "stroke-color" => {
                    if !is_hex_color(value) {
                        return Err(style_error(format!(
                            "value for {key} {value} is invalid, please use a valid hex code"
                        )));
                    }
                    if key == "color" {
                        out.color = Some(value.to_string());
                    } else {
                        out.stroke_color = Some(value.to_string());
                    }
                }
                "stroke-width" => {
                    if !is_px(value) {
                        return Err(style_error(format!(
                            "value for {key} {value} is invalid, please use a valid number of pixels (eg. 10px)"
                        )));
                    }
                    out.stroke_width = Some(value.to_string());
                }
                _ => return Err(style_error(format!("style named {key} is not supported."))),
            }
        }
        Ok(out)
    }

    /// `self` with unset properties taken from `fallback`.
    pub fn or(&self, fallback: Option<&PointStyles>) -> PointStyles {
        let Some(f) = fallback else {
            return self.clone();
        };
        PointStyles {
            radius: self.radius.or(f.radius),
            color: self.color.clone().or_else(|| f.color.clone()),
            stroke_color: self.stroke_color.clone().or_else(|| f.stroke_color.clone()),
            stroke_width: self.stroke_width.clone().or_else(|| f.stroke_width.clone()),
        }
    }
}

fn style_error(message: String) -> Error {
    Error::parse(DIAGRAM_TYPE, message, ParseHash::default())
}

fn is_hex_color(value: &str) -> bool {
    let v = value.strip_prefix('#').unwrap_or(value);
    (v.len() == 3 || v.len() == 6) && v.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_px(value: &str) -> bool {
    value
        .strip_suffix("px")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub class_name: Option<String>,
    pub styles: PointStyles,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axes {
    pub x_left: String,
    pub x_right: String,
    pub y_bottom: String,
    pub y_top: String,
}

#[derive(Debug, Clone, Default)]
pub struct Db {
    title: Option<String>,
    quadrants: [String; 4],
    axes: Axes,
    points: Vec<Point>,
    classes: IndexMap<String, PointStyles>,
    acc_title: Option<String>,
    acc_descr: Option<String>,
}

impl Db {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Sets the label of quadrant `n` (1 = top right, counter-clockwise).
    pub fn set_quadrant_text(&mut self, n: usize, text: impl Into<String>) {
        if let Some(slot) = n.checked_sub(1).and_then(|i| self.quadrants.get_mut(i)) {
            *slot = text.into();
        }
    }

    pub fn quadrant_text(&self, n: usize) -> &str {
        n.checked_sub(1)
            .and_then(|i| self.quadrants.get(i))
            .map_or("", String::as_str)
    }

    pub fn set_x_axis(&mut self, left: impl Into<String>, right: Option<String>) {
        self.axes.x_left = left.into();
        self.axes.x_right = right.unwrap_or_default();
    }

    pub fn set_y_axis(&mut self, bottom: impl Into<String>, top: Option<String>) {
        self.axes.y_bottom = bottom.into();
        self.axes.y_top = top.unwrap_or_default();
    }

    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    pub fn add_class(&mut self, name: impl Into<String>, styles: &[String]) -> Result<()> {
        let styles = PointStyles::parse(styles)?;
        self.classes.insert(name.into(), styles);
        Ok(())
    }

    pub fn classes(&self) -> &IndexMap<String, PointStyles> {
        &self.classes
    }

    /// Adds a point; both coordinates must lie in `[0, 1]`.
    pub fn add_point(
        &mut self,
        text: impl Into<String>,
        class_name: Option<String>,
        x: f64,
        y: f64,
        styles: &[String],
    ) -> Result<()> {
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            return Err(Error::parse(
                DIAGRAM_TYPE,
                format!("invalid point coordinate [{x}, {y}]: values must be between 0 and 1"),
                ParseHash::default(),
            ));
        }
        let styles = PointStyles::parse(styles)?;
        self.points.push(Point {
            text: text.into(),
            x,
            y,
            class_name,
            styles,
        });
        Ok(())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Effective styles of `point`: inline styles win over its class.
    pub fn point_styles(&self, point: &Point) -> PointStyles {
        let class = point.class_name.as_deref().and_then(|c| self.classes.get(c));
        point.styles.or(class)
    }

    pub fn set_acc_title(&mut self, title: impl Into<String>) {
        self.acc_title = Some(title.into());
    }

    pub fn acc_title(&self) -> Option<&str> {
        self.acc_title.as_deref()
    }

    pub fn set_acc_descr(&mut self, descr: impl Into<String>) {
        self.acc_descr = Some(descr.into());
    }

    pub fn acc_descr(&self) -> Option<&str> {
        self.acc_descr.as_deref()
    }

    pub fn apply(&mut self, stmt: Stmt) -> Result<()> {
        match stmt {
            Stmt::Title(t) => self.set_title(t),
            Stmt::XAxis { left, right } => self.set_x_axis(left, right),
            Stmt::YAxis { bottom, top } => self.set_y_axis(bottom, top),
            Stmt::Quadrant { n, text } => self.set_quadrant_text(n, text),
            Stmt::ClassDef { name, styles } => self.add_class(name, &styles)?,
            Stmt::Point {
                text,
                class_name,
                x,
                y,
                styles,
            } => self.add_point(text, class_name, x, y, &styles)?,
            Stmt::AccTitle(t) => self.set_acc_title(t),
            Stmt::AccDescr(d) => self.set_acc_descr(d),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_all_point_styles() {
        let styles = PointStyles::parse(&strings(&[
            "radius: 10",
            "color: #ff0000",
            "stroke-color: #ff00ff",
            "stroke-width: 10px",
        ]))
        .unwrap();
        assert_eq!(styles.radius, Some(10.0));
        assert_eq!(styles.color.as_deref(), Some("#ff0000"));
        assert_eq!(styles.stroke_color.as_deref(), Some("#ff00ff"));
        assert_eq!(styles.stroke_width.as_deref(), Some("10px"));
        assert_eq!(PointStyles::parse(&[]).unwrap(), PointStyles::default());
    }

    #[test]
    fn rejects_unknown_or_malformed_styles() {
        let err = PointStyles::parse(&strings(&["test_name: value"])).unwrap_err();
        assert_eq!(err.message(), Some("style named test_name is not supported."));

        let err = PointStyles::parse(&strings(&["radius: f"])).unwrap_err();
        assert_eq!(
            err.message(),
            Some("value for radius f is invalid, please use a valid number")
        );

        let err = PointStyles::parse(&strings(&["color: red"])).unwrap_err();
        assert!(err.message().unwrap().contains("valid hex code"));

        let err = PointStyles::parse(&strings(&["stroke-width: 10"])).unwrap_err();
        assert!(err.message().unwrap().contains("number of pixels"));
    }

    #[test]
    fn points_outside_the_unit_square_are_rejected() {
        let mut db = Db::new();
        db.add_point("ok", None, 0.0, 1.0, &[]).unwrap();
        assert!(db.add_point("bad", None, 1.2, 0.4, &[]).is_err());
        assert!(db.add_point("bad", None, 0.5, -0.1, &[]).is_err());
        assert_eq!(db.points().len(), 1);
    }

    #[test]
    fn inline_styles_override_class_styles() {
        let mut db = Db::new();
        db.add_class("c", &strings(&["color: #109060", "radius: 10"]))
            .unwrap();
        db.add_point("p", Some("c".into()), 0.5, 0.5, &strings(&["radius: 3"]))
            .unwrap();
        let styles = db.point_styles(&db.points()[0]);
        assert_eq!(styles.radius, Some(3.0));
        assert_eq!(styles.color.as_deref(), Some("#109060"));
    }

    #[test]
    fn quadrant_numbers_outside_one_to_four_are_ignored() {
        let mut db = Db::new();
        db.set_quadrant_text(1, "Leaders");
        db.set_quadrant_text(0, "nope");
        db.set_quadrant_text(5, "nope");
        assert_eq!(db.quadrant_text(1), "Leaders");
        assert_eq!(db.quadrant_text(2), "");
        assert_eq!(db.quadrant_text(5), "");
    }

    #[test]
    fn clear_resets_everything() {
        let mut db = Db::new();
        db.set_title("t");
        db.add_point("p", None, 0.1, 0.1, &[]).unwrap();
        db.clear();
        assert!(db.title().is_none());
        assert!(db.points().is_empty());
    }
}
