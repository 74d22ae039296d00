//! Diagram type detection and source preprocessing.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramType {
    State,
    GitGraph,
    QuadrantChart,
    Requirement,
}

impl DiagramType {
    pub fn id(self) -> &'static str {
        match self {
            Self::State => "stateDiagram",
            Self::GitGraph => "gitGraph",
            Self::QuadrantChart => "quadrantChart",
            Self::Requirement => "requirement",
        }
    }
}

struct Detectors {
    frontmatter: Regex,
    any_comment: Regex,
    rules: Vec<(DiagramType, Regex)>,
}

fn detectors() -> &'static Detectors {
    static DETECTORS: OnceLock<Detectors> = OnceLock::new();
    DETECTORS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("detector pattern is valid");
        Detectors {
            frontmatter: re(r"(?s)^-{3}\s*[\n\r](.*?)[\n\r]-{3}\s*[\n\r]+"),
            any_comment: re(r"(?m)\s*%%.*\n"),
            rules: vec![
                (DiagramType::GitGraph, re(r"^\s*gitGraph")),
                (DiagramType::State, re(r"^\s*stateDiagram(-v2)?")),
                (DiagramType::QuadrantChart, re(r"^\s*quadrantChart")),
                (DiagramType::Requirement, re(r"^\s*requirement(Diagram)?")),
            ],
        }
    })
}

/// Source text with front matter and `%%{...}%%` directives removed, plus the JSON bodies of
/// any `init` directives in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preprocessed {
    pub text: String,
    pub init: Vec<Value>,
}

pub fn preprocess(text: &str) -> Preprocessed {
    let text = text.replace("\r\n", "\n");
    let no_frontmatter = detectors().frontmatter.replace(&text, "");
    let (text, directives) = split_directives(&no_frontmatter);
    let init = directives
        .iter()
        .filter_map(|d| init_directive_json(d))
        .collect();
    Preprocessed { text, init }
}

pub fn detect_diagram_type(text: &str) -> Result<DiagramType> {
    let d = detectors();
    let no_frontmatter = d.frontmatter.replace(text, "");
    let (no_directives, _) = split_directives(&no_frontmatter);
    let cleaned = d.any_comment.replace_all(&no_directives, "\n");

    d.rules
        .iter()
        .find(|(_, re)| re.is_match(&cleaned))
        .map(|(ty, _)| *ty)
        .ok_or_else(|| Error::UnknownDiagram {
            text: cleaned.trim().to_string(),
        })
}

/// Removes every `%%{ ... }%%` block, returning the remaining text and each block's body.
fn split_directives(text: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(text.len());
    let mut bodies = Vec::new();
    let mut pos = 0;
    while let Some(rel) = text[pos..].find("%%{") {
        let start = pos + rel;
        out.push_str(&text[pos..start]);
        let after_start = start + 3;
        let Some(rel_end) = text[after_start..].find("}%%") else {
            return (out, bodies);
        };
        bodies.push(text[after_start..after_start + rel_end].to_string());
        pos = after_start + rel_end + 3;
    }
    out.push_str(&text[pos..]);
    (out, bodies)
}

/// `init: {...}` / `initialize: {...}` with a strict JSON body.
fn init_directive_json(body: &str) -> Option<Value> {
    let body = body.trim();
    let rest = body
        .strip_prefix("initialize")
        .or_else(|| body.strip_prefix("init"))?
        .trim_start()
        .strip_prefix(':')?;
    match serde_json::from_str::<Value>(rest.trim()) {
        Ok(v) if v.is_object() => Some(v),
        Ok(_) => None,
        Err(err) => {
            warn!(%err, "ignoring init directive that is not valid JSON");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_diagram_keyword() {
        assert_eq!(detect_diagram_type("gitGraph\n commit").unwrap(), DiagramType::GitGraph);
        assert_eq!(detect_diagram_type("stateDiagram-v2\n").unwrap(), DiagramType::State);
        assert_eq!(detect_diagram_type("  stateDiagram").unwrap(), DiagramType::State);
        assert_eq!(
            detect_diagram_type("quadrantChart\n").unwrap(),
            DiagramType::QuadrantChart
        );
        assert_eq!(
            detect_diagram_type("requirementDiagram\n").unwrap(),
            DiagramType::Requirement
        );
    }

    #[test]
    fn skips_frontmatter_directives_and_comments() {
        let text = "---\ntitle: x\n---\n%%{init: {\"theme\":\"dark\"}}%%\n%% note\ngitGraph\n";
        assert_eq!(detect_diagram_type(text).unwrap(), DiagramType::GitGraph);
    }

    #[test]
    fn unknown_text_is_an_error() {
        assert!(matches!(
            detect_diagram_type("flowchart LR"),
            Err(Error::UnknownDiagram { .. })
        ));
    }

    #[test]
    fn preprocess_collects_init_directives() {
        let p = preprocess("%%{init: {\"theme\":\"forest\"}}%%\nquadrantChart\n");
        assert_eq!(p.text.trim(), "quadrantChart");
        assert_eq!(p.init.len(), 1);
        assert_eq!(p.init[0]["theme"], "forest");
    }
}
