//! Diagram configuration.
//!
//! [`Config`] wraps a JSON object so user overrides can be merged onto the defaults without a
//! typed field for every knob. Values are looked up by dotted path, e.g.
//! `config.get_f64("quadrantChart.chartWidth")`.

use serde_json::{Map, Value, json};

use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct Config(Value);

impl Default for Config {
    fn default() -> Self {
        Self(defaults())
    }
}

impl Config {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Parses `text` as a JSON object and merges it onto the defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(text)?;
        let mut config = Self::default();
        config.deep_merge(&overrides);
        Ok(config)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get(dotted_path)?.as_str()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.get(dotted_path)?.as_bool()
    }

    /// Numbers may also be written as strings (`"20"`, `"0.5px"` is not accepted).
    pub fn get_f64(&self, dotted_path: &str) -> Option<f64> {
        match self.get(dotted_path)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_i64(&self, dotted_path: &str) -> Option<i64> {
        match self.get(dotted_path)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn f64_or(&self, dotted_path: &str, fallback: f64) -> f64 {
        self.get_f64(dotted_path).unwrap_or(fallback)
    }

    pub fn bool_or(&self, dotted_path: &str, fallback: bool) -> bool {
        self.get_bool(dotted_path).unwrap_or(fallback)
    }

    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur.entry(seg).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

fn defaults() -> Value {
    json!({
        "theme": "default",
        "themeVariables": {},
        "fontFamily": "\"trebuchet ms\", verdana, arial, sans-serif",
        "fontSize": 16,
        "state": {
            "diagramPadding": 8,
            "nodeSpacing": 50,
            "rankSpacing": 50,
            "padding": 8,
            "noteMargin": 10,
            "forkWidth": 70,
            "forkHeight": 7,
            "radius": 5,
            "sizeUnit": 5,
            "fontSize": 16,
            "titleFontSize": 16,
            "dividerMargin": 10
        },
        "gitGraph": {
            "diagramPadding": 8,
            "titleTopMargin": 25,
            "showBranches": true,
            "showCommitLabel": true,
            "rotateCommitLabel": true,
            "parallelCommits": false,
            "mainBranchName": "main",
            "mainBranchOrder": 0
        },
        "quadrantChart": {
            "chartWidth": 500,
            "chartHeight": 500,
            "titleFontSize": 20,
            "titlePadding": 10,
            "quadrantPadding": 5,
            "xAxisLabelPadding": 5,
            "yAxisLabelPadding": 5,
            "xAxisLabelFontSize": 16,
            "yAxisLabelFontSize": 16,
            "quadrantLabelFontSize": 16,
            "quadrantTextTopPadding": 5,
            "pointTextPadding": 5,
            "pointLabelFontSize": 12,
            "pointRadius": 5,
            "xAxisPosition": "top",
            "yAxisPosition": "left",
            "quadrantInternalBorderStrokeWidth": 1,
            "quadrantExternalBorderStrokeWidth": 2
        },
        "requirement": {
            "diagramPadding": 8,
            "nodeSpacing": 50,
            "rankSpacing": 50,
            "rectMinWidth": 200,
            "rectPadding": 10,
            "lineHeight": 20,
            "fontSize": 14
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_paths_read_defaults() {
        let config = Config::default();
        assert_eq!(config.get_str("gitGraph.mainBranchName"), Some("main"));
        assert_eq!(config.get_f64("quadrantChart.chartWidth"), Some(500.0));
        assert_eq!(config.get_bool("gitGraph.showBranches"), Some(true));
        assert_eq!(config.get_str("gitGraph.missing"), None);
    }

    #[test]
    fn from_json_merges_onto_defaults() {
        let config = Config::from_json(r#"{"gitGraph":{"mainBranchName":"trunk"}}"#).unwrap();
        assert_eq!(config.get_str("gitGraph.mainBranchName"), Some("trunk"));
        assert_eq!(config.get_bool("gitGraph.showCommitLabel"), Some(true));
    }

    #[test]
    fn set_value_creates_intermediate_objects() {
        let mut config = Config::empty_object();
        config.set_value("a.b.c", json!(3));
        assert_eq!(config.get_i64("a.b.c"), Some(3));
        config.set_value("a.b", json!("x"));
        assert_eq!(config.get_str("a.b"), Some("x"));
    }

    #[test]
    fn numbers_can_be_strings() {
        let mut config = Config::empty_object();
        config.set_value("n", json!(" 12.5 "));
        assert_eq!(config.get_f64("n"), Some(12.5));
    }
}
