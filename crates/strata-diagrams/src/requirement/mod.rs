//! Requirement diagrams: requirements, the elements that satisfy them, and typed relationships.

mod parse;
mod render;

pub use parse::{ElementBody, RequirementBody, Stmt, parse, parse_into};
pub use render::render;

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use strata::RankDir;

use crate::style::{StyleClass, split_styles};

pub const DIAGRAM_TYPE: &str = "requirement";

/// Class every requirement and element starts with.
pub const DEFAULT_CLASS: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RequirementKind {
    Requirement,
    Functional,
    Interface,
    Performance,
    Physical,
    DesignConstraint,
}

impl RequirementKind {
    /// The block keyword, matched case-insensitively.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "requirement" => Some(Self::Requirement),
            "functionalrequirement" => Some(Self::Functional),
            "interfacerequirement" => Some(Self::Interface),
            "performancerequirement" => Some(Self::Performance),
            "physicalrequirement" => Some(Self::Physical),
            "designconstraint" => Some(Self::DesignConstraint),
            _ => None,
        }
    }
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Requirement => "Requirement",
            Self::Functional => "Functional Requirement",
            Self::Interface => "Interface Requirement",
            Self::Performance => "Performance Requirement",
            Self::Physical => "Physical Requirement",
            Self::DesignConstraint => "Design Constraint",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Risk {
    Low,
    Medium,
    High,
}

impl Risk {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerifyMethod {
    Analysis,
    Demonstration,
    Inspection,
    Test,
}

impl VerifyMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "analysis" => Some(Self::Analysis),
            "demonstration" => Some(Self::Demonstration),
            "inspection" => Some(Self::Inspection),
            "test" => Some(Self::Test),
            _ => None,
        }
    }
}

impl fmt::Display for VerifyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Analysis => "Analysis",
            Self::Demonstration => "Demonstration",
            Self::Inspection => "Inspection",
            Self::Test => "Test",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Contains,
    Copies,
    Derives,
    Satisfies,
    Verifies,
    Refines,
    Traces,
}

impl RelationshipKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contains" => Some(Self::Contains),
            "copies" => Some(Self::Copies),
            "derives" => Some(Self::Derives),
            "satisfies" => Some(Self::Satisfies),
            "verifies" => Some(Self::Verifies),
            "refines" => Some(Self::Refines),
            "traces" => Some(Self::Traces),
            _ => None,
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Contains => "contains",
            Self::Copies => "copies",
            Self::Derives => "derives",
            Self::Satisfies => "satisfies",
            Self::Verifies => "verifies",
            Self::Refines => "refines",
            Self::Traces => "traces",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub name: String,
    pub kind: RequirementKind,
    pub requirement_id: String,
    pub text: String,
    pub risk: Option<Risk>,
    pub verify_method: Option<VerifyMethod>,
    pub css_styles: Vec<String>,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub name: String,
    pub element_type: String,
    pub doc_ref: String,
    pub css_styles: Vec<String>,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub src: String,
    pub dst: String,
}

#[derive(Debug, Clone, Default)]
pub struct Db {
    requirements: IndexMap<String, Requirement>,
    elements: IndexMap<String, Element>,
    relationships: Vec<Relationship>,
    classes: IndexMap<String, StyleClass>,
    direction: RankDir,
    acc_title: Option<String>,
    acc_descr: Option<String>,
}

/// Style targets: a requirement or an element of the same name.
enum Node<'a> {
    Requirement(&'a mut Requirement),
    Element(&'a mut Element),
}

impl Node<'_> {
    fn css_styles(&mut self) -> &mut Vec<String> {
        match self {
            Node::Requirement(r) => &mut r.css_styles,
            Node::Element(e) => &mut e.css_styles,
        }
    }

    fn classes(&mut self) -> &mut Vec<String> {
        match self {
            Node::Requirement(r) => &mut r.classes,
            Node::Element(e) => &mut e.classes,
        }
    }
}

impl Db {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Declares a requirement. A second declaration of the same name is ignored.
    pub fn add_requirement(&mut self, name: &str, kind: RequirementKind, body: RequirementBody) {
        if self.requirements.contains_key(name) {
            return;
        }
        self.requirements.insert(
            name.to_string(),
            Requirement {
                name: name.to_string(),
                kind,
                requirement_id: body.id,
                text: body.text,
                risk: body.risk,
                verify_method: body.verify_method,
                css_styles: Vec::new(),
                classes: vec![DEFAULT_CLASS.to_string()],
            },
        );
    }

    /// Declares an element. A second declaration of the same name is ignored.
    pub fn add_element(&mut self, name: &str, body: ElementBody) {
        if self.elements.contains_key(name) {
            return;
        }
        self.elements.insert(
            name.to_string(),
            Element {
                name: name.to_string(),
                element_type: body.element_type,
                doc_ref: body.doc_ref,
                css_styles: Vec::new(),
                classes: vec![DEFAULT_CLASS.to_string()],
            },
        );
    }

    /// Records a relationship. Endpoints are not checked here; the renderer skips edges whose
    /// endpoints were never declared.
    pub fn add_relationship(&mut self, kind: RelationshipKind, src: &str, dst: &str) {
        self.relationships.push(Relationship {
            kind,
            src: src.to_string(),
            dst: dst.to_string(),
        });
    }

    fn node_mut(&mut self, id: &str) -> Option<Node<'_>> {
        if let Some(r) = self.requirements.get_mut(id) {
            return Some(Node::Requirement(r));
        }
        self.elements.get_mut(id).map(Node::Element)
    }

    /// `style a,b fill:#f9f,stroke:#333`.
    pub fn set_css_style(&mut self, ids: &[String], styles: &[String]) {
        for id in ids {
            if let Some(mut node) = self.node_mut(id) {
                for style in styles {
                    node.css_styles().extend(split_styles(style));
                }
            }
        }
    }

    /// `class a,b c1,c2` and the `a:::c1` shorthand. Styles of already defined classes are
    /// copied onto the node.
    pub fn set_class(&mut self, ids: &[String], class_names: &[String]) {
        for id in ids {
            let defined: Vec<Vec<String>> = class_names
                .iter()
                .map(|c| {
                    self.classes
                        .get(c)
                        .map(|def| def.styles.clone())
                        .unwrap_or_default()
                })
                .collect();
            let Some(mut node) = self.node_mut(id) else {
                continue;
            };
            for (class, styles) in class_names.iter().zip(defined) {
                node.classes().push(class.clone());
                node.css_styles().extend(styles);
            }
        }
    }

    /// `classDef c1,c2 fill:#f9f`. Nodes that already carry the class pick up the styles.
    pub fn define_class(&mut self, ids: &[String], styles: &[String]) {
        for id in ids {
            let class = self
                .classes
                .entry(id.clone())
                .or_insert_with(|| StyleClass::new(id.clone()));
            for style in styles {
                class.add_styles(style);
            }
            let added: Vec<String> = styles.iter().flat_map(|s| split_styles(s)).collect();
            for r in self.requirements.values_mut().filter(|r| r.classes.contains(id)) {
                r.css_styles.extend(added.iter().cloned());
            }
            for e in self.elements.values_mut().filter(|e| e.classes.contains(id)) {
                e.css_styles.extend(added.iter().cloned());
            }
        }
    }

    pub fn set_direction(&mut self, direction: RankDir) {
        self.direction = direction;
    }

    pub fn direction(&self) -> RankDir {
        self.direction
    }

    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.values()
    }

    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        self.requirements.get(name)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.get(name)
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn classes(&self) -> &IndexMap<String, StyleClass> {
        &self.classes
    }

    /// Text styles from every class `classes` names.
    pub fn text_styles(&self, classes: &[String]) -> Vec<String> {
        classes
            .iter()
            .filter_map(|c| self.classes.get(c))
            .flat_map(|c| c.text_styles.iter().cloned())
            .collect()
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.requirements.contains_key(name) || self.elements.contains_key(name)
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

    pub fn apply(&mut self, stmt: Stmt) {
        match stmt {
            Stmt::Direction(d) => self.set_direction(d),
            Stmt::Requirement {
                name,
                kind,
                body,
                classes,
            } => {
                self.add_requirement(&name, kind, body);
                if !classes.is_empty() {
                    self.set_class(&[name], &classes);
                }
            }
            Stmt::Element {
                name,
                body,
                classes,
            } => {
                self.add_element(&name, body);
                if !classes.is_empty() {
                    self.set_class(&[name], &classes);
                }
            }
            Stmt::Relationship { kind, src, dst } => self.add_relationship(kind, &src, &dst),
            Stmt::Style { ids, styles } => self.set_css_style(&ids, &styles),
            Stmt::ClassDef { ids, styles } => self.define_class(&ids, &styles),
            Stmt::Class { ids, classes } => self.set_class(&ids, &classes),
            Stmt::AccTitle(t) => self.set_acc_title(t),
            Stmt::AccDescr(d) => self.set_acc_descr(d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_declaration_wins() {
        let mut db = Db::new();
        let body = RequirementBody {
            id: "1".into(),
            ..Default::default()
        };
        db.add_requirement("r", RequirementKind::Functional, body);
        db.add_requirement("r", RequirementKind::Physical, RequirementBody::default());
        let r = db.requirement("r").unwrap();
        assert_eq!(r.kind, RequirementKind::Functional);
        assert_eq!(r.requirement_id, "1");
        assert_eq!(r.classes, vec!["default"]);
    }

    #[test]
    fn class_styles_apply_in_either_order() {
        let mut db = Db::new();
        db.add_requirement("early", RequirementKind::Requirement, RequirementBody::default());
        db.add_element("late", ElementBody::default());

        db.set_class(&ids(&["early"]), &ids(&["hot"]));
        db.define_class(&ids(&["hot"]), &ids(&["fill:#f00,color:white"]));
        db.set_class(&ids(&["late"]), &ids(&["hot"]));

        assert_eq!(db.requirement("early").unwrap().css_styles, vec!["fill:#f00", "color:white"]);
        assert_eq!(db.element("late").unwrap().css_styles, vec!["fill:#f00", "color:white"]);
        assert_eq!(db.text_styles(&db.element("late").unwrap().classes), vec!["fill:white"]);
    }

    #[test]
    fn styles_on_unknown_nodes_are_ignored() {
        let mut db = Db::new();
        db.set_css_style(&ids(&["ghost"]), &ids(&["fill:#fff"]));
        db.set_class(&ids(&["ghost"]), &ids(&["c"]));
        assert!(!db.has_node("ghost"));
    }

    #[test]
    fn kinds_display_their_titles() {
        assert_eq!(RequirementKind::from_keyword("designConstraint"), Some(RequirementKind::DesignConstraint));
        assert_eq!(RequirementKind::DesignConstraint.to_string(), "Design Constraint");
        assert_eq!(RelationshipKind::parse("Satisfies"), Some(RelationshipKind::Satisfies));
        assert_eq!(RelationshipKind::Satisfies.to_string(), "satisfies");
        assert_eq!(Risk::parse("HIGH"), Some(Risk::High));
        assert_eq!(VerifyMethod::parse("demonstration").map(|v| v.to_string()).as_deref(), Some("Demonstration"));
        assert_eq!(Risk::parse("extreme"), None);
    }
}
