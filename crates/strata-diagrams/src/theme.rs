//! Colours and fonts for every renderer.
//!
//! A named theme starts from a [`Palette`] of base colours; [`Theme::from_palette`] derives the
//! per-diagram colours from it. `themeVariables` in the [`Config`] may override both: base
//! colours are applied first so the derived colours follow them, then every key is applied to
//! the finished theme. Indexed git colours are addressed as `git0`..`git7`,
//! `gitInv0`..`gitInv7`, and `gitBranchLabel0`..`gitBranchLabel7`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::{Config, Result};

pub const GIT_COLOR_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Palette {
    pub dark_mode: bool,
    pub background: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub tertiary_color: String,
    pub line_color: String,
    pub text_color: String,
    pub note_bkg_color: String,
    pub note_text_color: String,
    pub note_border_color: String,
    pub font_family: String,
    pub font_size: f64,
    pub git: Vec<String>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            dark_mode: false,
            background: "#ffffff".to_string(),
            primary_color: "#ECECFF".to_string(),
            secondary_color: "#ffffde".to_string(),
            tertiary_color: "#f6ffe4".to_string(),
            line_color: "#333333".to_string(),
            text_color: "#333333".to_string(),
            note_bkg_color: "#fff5ad".to_string(),
            note_text_color: "#333333".to_string(),
            note_border_color: "#aaaa33".to_string(),
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 16.0,
            git: strings(&[
                "#0000ec", "#dede00", "#9dec00", "#0076ec", "#00ecec", "#00ec76", "#ec00ec",
                "#ec0000",
            ]),
        }
    }
}

impl Palette {
    pub fn named(name: &str) -> Option<Self> {
        let base = Self::default();
        let palette = match name {
            "default" | "base" => base,
            "dark" => Self {
                dark_mode: true,
                background: "#333333".to_string(),
                primary_color: "#1f2020".to_string(),
                secondary_color: "#5a5a5a".to_string(),
                tertiary_color: "#2d2e2e".to_string(),
                line_color: "#cccccc".to_string(),
                text_color: "#cccccc".to_string(),
                note_bkg_color: "#fff5ad".to_string(),
                note_text_color: "#1f2020".to_string(),
                note_border_color: "#aaaa33".to_string(),
                git: strings(&[
                    "#3e3eb2", "#a0a03c", "#73a030", "#3c6ea0", "#3ca0a0", "#3ca06e", "#a03ca0",
                    "#a03c3c",
                ]),
                ..base
            },
            "forest" => Self {
                primary_color: "#cde498".to_string(),
                secondary_color: "#cdffb2".to_string(),
                tertiary_color: "#f0f0f0".to_string(),
                line_color: "#008000".to_string(),
                git: strings(&[
                    "#6ca23a", "#b8d86f", "#2f6b2f", "#5e9d56", "#91c483", "#3a8c5a", "#a3c44f",
                    "#47753b",
                ]),
                ..base
            },
            "neutral" => Self {
                primary_color: "#eeeeee".to_string(),
                secondary_color: "#dddddd".to_string(),
                tertiary_color: "#f4f4f4".to_string(),
                line_color: "#666666".to_string(),
                note_bkg_color: "#ffffcc".to_string(),
                note_border_color: "#999999".to_string(),
                git: strings(&[
                    "#333333", "#555555", "#777777", "#999999", "#444444", "#666666", "#888888",
                    "#aaaaaa",
                ]),
                ..base
            },
            _ => return None,
        };
        Some(palette)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub font_family: String,
    pub font_size: f64,

    pub background: String,
    pub primary_color: String,
    pub primary_text_color: String,
    pub primary_border_color: String,
    pub secondary_color: String,
    pub tertiary_color: String,
    pub line_color: String,
    pub text_color: String,
    pub title_color: String,

    pub note_bkg_color: String,
    pub note_text_color: String,
    pub note_border_color: String,

    pub state_bkg: String,
    pub state_border: String,
    pub state_label_color: String,
    pub composite_background: String,
    pub composite_title_background: String,
    pub special_state_color: String,
    pub transition_color: String,
    pub transition_label_color: String,
    pub edge_label_background: String,

    pub git: Vec<String>,
    pub git_inv: Vec<String>,
    pub git_branch_label: Vec<String>,
    pub commit_label_color: String,
    pub commit_label_background: String,
    pub commit_label_font_size: f64,
    pub tag_label_color: String,
    pub tag_label_background: String,
    pub tag_label_border: String,
    pub tag_label_font_size: f64,

    pub quadrant1_fill: String,
    pub quadrant2_fill: String,
    pub quadrant3_fill: String,
    pub quadrant4_fill: String,
    pub quadrant1_text_fill: String,
    pub quadrant2_text_fill: String,
    pub quadrant3_text_fill: String,
    pub quadrant4_text_fill: String,
    pub quadrant_point_fill: String,
    pub quadrant_point_text_fill: String,
    pub quadrant_x_axis_text_fill: String,
    pub quadrant_y_axis_text_fill: String,
    pub quadrant_title_fill: String,
    pub quadrant_internal_border_stroke_fill: String,
    pub quadrant_external_border_stroke_fill: String,

    pub requirement_background: String,
    pub requirement_border_color: String,
    pub requirement_border_size: f64,
    pub requirement_text_color: String,
    pub relation_color: String,
    pub relation_label_background: String,
    pub relation_label_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_palette(&Palette::default())
    }
}

impl Theme {
    pub fn named(name: &str) -> Option<Self> {
        Palette::named(name).map(|p| Self::from_palette(&p))
    }

    pub fn from_palette(p: &Palette) -> Self {
        let primary_text = invert(&p.primary_color).unwrap_or_else(|| p.text_color.clone());
        let primary_border = if p.dark_mode {
            mix(&p.primary_color, "#ffffff", 0.3)
        } else {
            mix(&p.primary_color, "#000000", 0.35)
        }
        .unwrap_or_else(|| p.line_color.clone());
        let edge_label_background =
            mix(&p.background, &p.text_color, 0.1).unwrap_or_else(|| "#e8e8e8".to_string());
        let git = pad_colors(&p.git, &p.primary_color);
        let git_inv = git
            .iter()
            .map(|c| invert(c).unwrap_or_else(|| c.clone()))
            .collect();
        let git_branch_label = git.iter().map(|c| contrast_text(c)).collect();
        let quadrant1 = p.primary_color.clone();
        let adjust_or = |c: &str, delta: i16| adjust(c, delta).unwrap_or_else(|| c.to_string());

        Self {
            font_family: p.font_family.clone(),
            font_size: p.font_size,

            background: p.background.clone(),
            primary_color: p.primary_color.clone(),
            primary_text_color: primary_text.clone(),
            primary_border_color: primary_border.clone(),
            secondary_color: p.secondary_color.clone(),
            tertiary_color: p.tertiary_color.clone(),
            line_color: p.line_color.clone(),
            text_color: p.text_color.clone(),
            title_color: p.text_color.clone(),

            note_bkg_color: p.note_bkg_color.clone(),
            note_text_color: p.note_text_color.clone(),
            note_border_color: p.note_border_color.clone(),

            state_bkg: p.primary_color.clone(),
            state_border: primary_border.clone(),
            state_label_color: primary_text.clone(),
            composite_background: p.background.clone(),
            composite_title_background: p.tertiary_color.clone(),
            special_state_color: p.line_color.clone(),
            transition_color: p.line_color.clone(),
            transition_label_color: p.text_color.clone(),
            edge_label_background: edge_label_background.clone(),

            git,
            git_inv,
            git_branch_label,
            commit_label_color: invert(&p.secondary_color).unwrap_or_else(|| p.text_color.clone()),
            commit_label_background: p.secondary_color.clone(),
            commit_label_font_size: 10.0,
            tag_label_color: primary_text.clone(),
            tag_label_background: p.primary_color.clone(),
            tag_label_border: primary_border.clone(),
            tag_label_font_size: 10.0,

            quadrant2_fill: adjust_or(&quadrant1, 5),
            quadrant3_fill: adjust_or(&quadrant1, 10),
            quadrant4_fill: adjust_or(&quadrant1, 15),
            quadrant1_fill: quadrant1.clone(),
            quadrant1_text_fill: primary_text.clone(),
            quadrant2_text_fill: adjust_or(&primary_text, -5),
            quadrant3_text_fill: adjust_or(&primary_text, -10),
            quadrant4_text_fill: adjust_or(&primary_text, -15),
            quadrant_point_fill: mix(&quadrant1, "#000000", 0.5).unwrap_or_else(|| quadrant1.clone()),
            quadrant_point_text_fill: primary_text.clone(),
            quadrant_x_axis_text_fill: primary_text.clone(),
            quadrant_y_axis_text_fill: primary_text.clone(),
            quadrant_title_fill: primary_text.clone(),
            quadrant_internal_border_stroke_fill: primary_border.clone(),
            quadrant_external_border_stroke_fill: primary_border.clone(),

            requirement_background: p.primary_color.clone(),
            requirement_border_color: primary_border,
            requirement_border_size: 1.0,
            requirement_text_color: primary_text,
            relation_color: p.line_color.clone(),
            relation_label_background: edge_label_background,
            relation_label_color: p.text_color.clone(),
        }
    }

    /// Resolves `theme` and `themeVariables` from a diagram configuration. Unknown theme names
    /// fall back to the default theme.
    pub fn from_config(config: &Config) -> Result<Self> {
        let name = config.get_str("theme").unwrap_or("default");
        let mut palette = Palette::named(name).unwrap_or_else(|| {
            warn!(theme = name, "unknown theme, using default");
            Palette::default()
        });
        let Some(variables) = config.get("themeVariables").and_then(Value::as_object) else {
            return Ok(Self::from_palette(&palette));
        };
        if !variables.is_empty() {
            palette = merge_into(&palette, variables)?;
        }
        let theme = Self::from_palette(&palette);
        theme.with_variables(variables)
    }

    /// Applies raw `themeVariables` on top of this theme.
    pub fn with_variables(&self, variables: &Map<String, Value>) -> Result<Self> {
        let mut value = serde_json::to_value(self)?;
        let Some(fields) = value.as_object_mut() else {
            return Ok(self.clone());
        };
        for (key, v) in variables {
            if let Some((list, ix)) = indexed_color(key) {
                if let (Some(slot), Some(color)) = (
                    fields
                        .get_mut(list)
                        .and_then(Value::as_array_mut)
                        .and_then(|a| a.get_mut(ix)),
                    v.as_str(),
                ) {
                    *slot = Value::String(color.to_string());
                }
                continue;
            }
            if fields.contains_key(key) {
                fields.insert(key.clone(), css_value(key, v));
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Colour of git lane `ix`, cycling through the palette.
    pub fn git_color(&self, ix: usize) -> &str {
        cycle(&self.git, ix, &self.primary_color)
    }

    pub fn git_inv_color(&self, ix: usize) -> &str {
        cycle(&self.git_inv, ix, &self.primary_text_color)
    }

    pub fn git_branch_label_color(&self, ix: usize) -> &str {
        cycle(&self.git_branch_label, ix, &self.text_color)
    }
}

fn cycle<'a>(colors: &'a [String], ix: usize, fallback: &'a str) -> &'a str {
    if colors.is_empty() {
        return fallback;
    }
    &colors[ix % colors.len()]
}

fn merge_into(palette: &Palette, variables: &Map<String, Value>) -> Result<Palette> {
    let mut value = serde_json::to_value(palette)?;
    if let Some(fields) = value.as_object_mut() {
        for (key, v) in variables {
            if let Some(("git", ix)) = indexed_color(key) {
                if let (Some(slot), Some(color)) = (
                    fields
                        .get_mut("git")
                        .and_then(Value::as_array_mut)
                        .and_then(|a| a.get_mut(ix)),
                    v.as_str(),
                ) {
                    *slot = Value::String(color.to_string());
                }
            } else if fields.contains_key(key) {
                fields.insert(key.clone(), css_value(key, v));
            }
        }
    }
    Ok(serde_json::from_value(value)?)
}

/// `git3` → `("git", 3)`, `gitInv0` → `("gitInv", 0)`, `gitBranchLabel7` → `("gitBranchLabel", 7)`.
fn indexed_color(key: &str) -> Option<(&'static str, usize)> {
    for list in ["gitBranchLabel", "gitInv", "git"] {
        if let Some(ix) = key.strip_prefix(list).and_then(|d| d.parse::<usize>().ok()) {
            return (ix < GIT_COLOR_COUNT).then_some((list, ix));
        }
    }
    None
}

/// Font sizes are often written as CSS lengths (`"14px"`).
fn css_value(key: &str, v: &Value) -> Value {
    if key.ends_with("FontSize") || key == "fontSize" {
        if let Some(n) = v
            .as_str()
            .and_then(|s| s.trim().trim_end_matches("px").trim().parse::<f64>().ok())
        {
            return Value::from(n);
        }
    }
    v.clone()
}

fn pad_colors(colors: &[String], fallback: &str) -> Vec<String> {
    (0..GIT_COLOR_COUNT)
        .map(|i| colors.get(i).cloned().unwrap_or_else(|| fallback.to_string()))
        .collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Accepts `#rgb` and `#rrggbb`.
pub fn parse_hex(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut it = hex.chars().map(|c| channel(&format!("{c}{c}")));
            Some((it.next()??, it.next()??, it.next()??))
        }
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

fn to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

pub fn invert(hex: &str) -> Option<String> {
    let (r, g, b) = parse_hex(hex)?;
    Some(to_hex((255 - r, 255 - g, 255 - b)))
}

/// Adds `delta` to every channel, clamping to `0..=255`.
pub fn adjust(hex: &str, delta: i16) -> Option<String> {
    let (r, g, b) = parse_hex(hex)?;
    let adj = |c: u8| (c as i16 + delta).clamp(0, 255) as u8;
    Some(to_hex((adj(r), adj(g), adj(b))))
}

/// Linear blend from `a` (t = 0) to `b` (t = 1).
pub fn mix(a: &str, b: &str, t: f64) -> Option<String> {
    let (ar, ag, ab) = parse_hex(a)?;
    let (br, bg, bb) = parse_hex(b)?;
    let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round().clamp(0.0, 255.0) as u8;
    Some(to_hex((lerp(ar, br), lerp(ag, bg), lerp(ab, bb))))
}

/// Black or white, whichever reads better on `background`.
fn contrast_text(background: &str) -> String {
    let Some((r, g, b)) = parse_hex(background) else {
        return "#ffffff".to_string();
    };
    let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    let color = if luma > 150.0 { "#000000" } else { "#ffffff" };
    color.to_string()
}
