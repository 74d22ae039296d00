#![forbid(unsafe_code)]

//! Diagram front ends for `strata`.
//!
//! Each diagram family has a hand-written parser that applies statements to a caller-owned
//! database, and a renderer that turns the database into an SVG [`svg::Element`] tree. Graph
//! shaped diagrams (state and requirement) are positioned with the layered layout engine in
//! `strata`; git graphs and quadrant charts use their own coordinate rules.
//!
//! [`render_svg`] ties the pieces together for the common case of one source text in and one
//! SVG document out.

pub mod config;
pub mod detect;
pub mod error;
pub mod git_graph;
pub mod quadrant_chart;
pub mod requirement;
mod source;
pub mod state;
pub mod style;
pub mod svg;
pub mod text;
pub mod theme;

pub use config::Config;
pub use detect::{DiagramType, Preprocessed, detect_diagram_type, preprocess};
pub use error::{Error, ParseHash, Result};
pub use theme::Theme;

use text::DeterministicTextMeasurer;
use tracing::debug;

/// Inputs shared by every diagram rendered through [`render_svg`].
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Site configuration. `init` directives in the source are merged on top of it.
    pub config: Config,
    pub measurer: DeterministicTextMeasurer,
}

impl RenderOptions {
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }
}

/// Detects the diagram type of `text`, parses it into a fresh database and renders it to an
/// SVG document string.
pub fn render_svg(text: &str, options: &RenderOptions) -> Result<String> {
    let pre = preprocess(text);
    let mut config = options.config.clone();
    for init in &pre.init {
        config.deep_merge(init);
    }

    let diagram_type = detect_diagram_type(&pre.text)?;
    let theme = Theme::from_config(&config)?;
    debug!(diagram_type = diagram_type.id(), "rendering diagram");

    let measurer = &options.measurer;
    let svg = match diagram_type {
        DiagramType::State => {
            let mut db = state::Db::new();
            state::parse_into(&pre.text, &mut db)?;
            state::render(&db, &config, &theme, measurer)?
        }
        DiagramType::GitGraph => {
            let mut db = git_graph::Db::new(&config);
            git_graph::parse_into(&pre.text, &mut db)?;
            git_graph::render(&db, &config, &theme, measurer)?
        }
        DiagramType::QuadrantChart => {
            let mut db = quadrant_chart::Db::new();
            quadrant_chart::parse_into(&pre.text, &mut db)?;
            quadrant_chart::render(&db, &config, &theme, measurer)?
        }
        DiagramType::Requirement => {
            let mut db = requirement::Db::new();
            requirement::parse_into(&pre.text, &mut db)?;
            requirement::render(&db, &config, &theme, measurer)?
        }
    };
    Ok(svg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_svg_dispatches_on_header() {
        let options = RenderOptions::default();
        let svg = render_svg("stateDiagram-v2\n[*] --> A\nA --> [*]\n", &options).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("stateDiagram"));

        let svg = render_svg("quadrantChart\ntitle Reach\nA: [0.2, 0.4]\n", &options).unwrap();
        assert!(svg.contains("quadrantChart"));
    }

    #[test]
    fn unknown_header_is_rejected() {
        let err = render_svg("pie\n\"a\": 1\n", &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownDiagram { .. }));
    }

    #[test]
    fn init_directive_overrides_theme() {
        let text = "%%{init: {\"theme\": \"dark\"}}%%\nquadrantChart\nA: [0.5, 0.5]\n";
        let dark = render_svg(text, &RenderOptions::default()).unwrap();
        let plain = render_svg("quadrantChart\nA: [0.5, 0.5]\n", &RenderOptions::default()).unwrap();
        assert_ne!(dark, plain);

        let mut config = Config::default();
        config.deep_merge(&serde_json::json!({ "theme": "dark" }));
        let options = RenderOptions::default().with_config(config);
        let site_dark = render_svg("quadrantChart\nA: [0.5, 0.5]\n", &options).unwrap();
        assert_eq!(site_dark, dark);
    }

    #[test]
    fn parse_errors_carry_the_diagram_type() {
        let err = render_svg("requirementDiagram\nrequirement r {\n", &RenderOptions::default())
            .unwrap_err();
        match err {
            Error::DiagramParse { diagram_type, .. } => assert_eq!(diagram_type, "requirement"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
