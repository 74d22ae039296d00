//! `classDef` style classes shared by the state and requirement diagrams.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyleClass {
    pub id: String,
    pub styles: Vec<String>,
    /// Styles that apply to the label text rather than the shape.
    pub text_styles: Vec<String>,
}

impl StyleClass {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Adds comma-separated `key:value` pairs. A `color` style is also recorded as a text
    /// `fill` so labels pick it up.
    pub fn add_styles(&mut self, raw: &str) {
        for style in split_styles(raw) {
            if style.starts_with("color") {
                self.text_styles.push(style.replace("fill", "bgFill").replacen("color", "fill", 1));
            }
            self.styles.push(style);
        }
    }
}

/// Splits a style list on `,`, trimming each entry and dropping anything after a `;`.
pub fn split_styles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.split(';').next().unwrap_or_default().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins styles into an SVG `style` attribute value.
pub fn style_attr(styles: &[String]) -> String {
    styles
        .iter()
        .map(|s| s.trim_end_matches(';'))
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_styles_also_style_text() {
        let mut class = StyleClass::new("bad");
        class.add_styles("fill:#f00, color:white;ignored, stroke-width:2px");
        assert_eq!(class.styles, vec!["fill:#f00", "color:white", "stroke-width:2px"]);
        assert_eq!(class.text_styles, vec!["fill:white"]);
    }

    #[test]
    fn style_attr_joins_with_semicolons() {
        let styles = vec!["fill:#f00".to_string(), "stroke:#000;".to_string()];
        assert_eq!(style_attr(&styles), "fill:#f00;stroke:#000");
    }
}
