//! Label measurement.
//!
//! Renderers size nodes from their labels through [`TextMeasurer`], so a caller with access to
//! real font metrics can plug them in. [`DeterministicTextMeasurer`] estimates from character
//! counts and is what `render_svg` uses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f64,
    pub font_weight: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: 16.0,
            font_weight: None,
        }
    }
}

impl TextStyle {
    pub fn sized(font_size: f64) -> Self {
        Self {
            font_size,
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.font_weight = Some("bold".to_string());
        self
    }

    fn is_bold(&self) -> bool {
        matches!(self.font_weight.as_deref(), Some("bold" | "bolder" | "600" | "700" | "800" | "900"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    /// Average glyph width as a fraction of the font size; `0` means 0.6.
    pub char_width_factor: f64,
    /// Line height as a fraction of the font size; `0` means 1.2.
    pub line_height_factor: f64,
}

impl DeterministicTextMeasurer {
    /// Splits on newlines and the `<br>` spellings labels use for line breaks.
    pub fn normalized_text_lines(text: &str) -> Vec<String> {
        let t = text
            .replace("<br/>", "\n")
            .replace("<br />", "\n")
            .replace("<br>", "\n");
        t.split('\n').map(str::to_string).collect()
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let char_width_factor = if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        };
        let line_height_factor = if self.line_height_factor == 0.0 {
            1.2
        } else {
            self.line_height_factor
        };

        let lines = Self::normalized_text_lines(text);
        let font_size = style.font_size.max(1.0);
        let max_chars = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let weight = if style.is_bold() { 1.1 } else { 1.0 };

        TextMetrics {
            width: max_chars as f64 * font_size * char_width_factor * weight,
            height: lines.len() as f64 * font_size * line_height_factor,
            line_count: lines.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_the_widest_line() {
        let m = DeterministicTextMeasurer::default();
        let metrics = m.measure("ab<br>abcd", &TextStyle::sized(10.0));
        assert_eq!(metrics.line_count, 2);
        assert!((metrics.width - 24.0).abs() < 1e-9);
        assert!((metrics.height - 24.0).abs() < 1e-9);
    }

    #[test]
    fn empty_text_is_one_empty_line() {
        let m = DeterministicTextMeasurer::default();
        let metrics = m.measure("", &TextStyle::default());
        assert_eq!(metrics.width, 0.0);
        assert_eq!(metrics.line_count, 1);
    }

    #[test]
    fn bold_text_is_wider() {
        let m = DeterministicTextMeasurer::default();
        let plain = m.measure("state", &TextStyle::default());
        let bold = m.measure("state", &TextStyle::default().bold());
        assert!(bold.width > plain.width);
    }
}
