//! State diagrams.
//!
//! The parser produces a nested statement list; [`Db::apply_document`] flattens it into states
//! that remember their parent, so composite states become clusters of the layout graph. `[*]`
//! resolves to a start or end pseudo-state scoped to the enclosing composite (`root_start`,
//! `Idle_end`, ...). Concurrency dividers (`--`) split a composite into regions, each its own
//! `divider-id-<n>` state.

mod parse;
mod render;

pub use parse::{StateRef, StateStmt, Stmt, parse, parse_into};
pub use render::render;

use indexmap::IndexMap;
use serde::Serialize;
use strata::RankDir;
use tracing::debug;

use crate::style::{StyleClass, split_styles};

pub const DIAGRAM_TYPE: &str = "stateDiagram";

const ROOT_SCOPE: &str = "root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    #[default]
    Default,
    Start,
    End,
    Fork,
    Join,
    Choice,
    Divider,
}

impl StateType {
    /// The `<<...>>` annotations a declaration may carry.
    pub fn from_annotation(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fork" => Some(Self::Fork),
            "join" => Some(Self::Join),
            "choice" => Some(Self::Choice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotePosition {
    LeftOf,
    RightOf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub position: NotePosition,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub id: String,
    pub state_type: StateType,
    pub descriptions: Vec<String>,
    pub note: Option<Note>,
    pub classes: Vec<String>,
    pub styles: Vec<String>,
    pub parent: Option<String>,
    /// Declared with a `{ ... }` body.
    pub composite: bool,
    /// `direction` given inside the composite body.
    pub direction: Option<RankDir>,
}

impl State {
    fn new(id: &str, state_type: StateType, parent: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            state_type,
            descriptions: Vec::new(),
            note: None,
            classes: Vec::new(),
            styles: Vec::new(),
            parent: parent.map(str::to_string),
            composite: false,
            direction: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Db {
    states: IndexMap<String, State>,
    relations: Vec<Relation>,
    classes: IndexMap<String, StyleClass>,
    direction: Option<RankDir>,
    acc_title: Option<String>,
    acc_descr: Option<String>,
    divider_count: usize,
}

impl Db {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Adds `id` under `parent`, or upgrades an existing default state to `state_type`. A state
    /// keeps the parent it was first seen with.
    pub fn add_state(&mut self, id: &str, state_type: StateType, parent: Option<&str>) -> &mut State {
        let state = self
            .states
            .entry(id.to_string())
            .or_insert_with(|| State::new(id, state_type, parent));
        if state.state_type == StateType::Default && state_type != StateType::Default {
            state.state_type = state_type;
        }
        state
    }

    /// Appends a description line; a leading `:` and surrounding whitespace are dropped.
    pub fn add_description(&mut self, id: &str, descr: &str) {
        let clean = descr.trim().trim_start_matches(':').trim();
        if clean.is_empty() {
            return;
        }
        self.add_state(id, StateType::Default, None)
            .descriptions
            .push(clean.to_string());
    }

    /// Records a transition. Repeating a self transition replaces its label.
    pub fn add_relation(&mut self, from: &str, to: &str, label: Option<&str>) {
        self.add_state(from, StateType::Default, None);
        self.add_state(to, StateType::Default, None);
        let label = label.map(str::trim).filter(|l| !l.is_empty()).map(str::to_string);
        if from == to {
            if let Some(existing) = self
                .relations
                .iter_mut()
                .find(|r| r.from == from && r.to == to)
            {
                existing.label = label;
                return;
            }
        }
        self.relations.push(Relation {
            from: from.to_string(),
            to: to.to_string(),
            label,
        });
    }

    pub fn set_note(&mut self, id: &str, note: Note) {
        self.add_state(id, StateType::Default, None).note = Some(note);
    }

    pub fn add_style_class(&mut self, id: &str, styles: &str) {
        let id = id.trim();
        self.classes
            .entry(id.to_string())
            .or_insert_with(|| StyleClass::new(id))
            .add_styles(styles);
    }

    /// Applies `class` to every id in the comma-separated `ids`.
    pub fn set_css_class(&mut self, ids: &str, class: &str) {
        for id in ids.split(',').map(str::trim).filter(|id| !id.is_empty()) {
            self.add_state(id, StateType::Default, None)
                .classes
                .push(class.trim().to_string());
        }
    }

    /// Replaces the inline styles of every id in the comma-separated `ids`.
    pub fn set_style(&mut self, ids: &str, styles: &str) {
        let styles = split_styles(styles);
        for id in ids.split(',').map(str::trim).filter(|id| !id.is_empty()) {
            self.add_state(id, StateType::Default, None).styles = styles.clone();
        }
    }

    pub fn set_direction(&mut self, direction: RankDir) {
        self.direction = Some(direction);
    }

    pub fn direction(&self) -> RankDir {
        self.direction.unwrap_or_default()
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

    /// States in the order they were first mentioned.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    pub fn state(&self, id: &str) -> Option<&State> {
        self.states.get(id)
    }

    /// Direct children of `parent`, or the top-level states for `None`.
    pub fn children(&self, parent: Option<&str>) -> Vec<&State> {
        self.states
            .values()
            .filter(|s| s.parent.as_deref() == parent)
            .collect()
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn classes(&self) -> &IndexMap<String, StyleClass> {
        &self.classes
    }

    /// Replays a parsed document onto the database.
    pub fn apply_document(&mut self, doc: Vec<(usize, Stmt)>) {
        self.apply_doc(ROOT_SCOPE, None, doc);
    }

    fn apply_doc(&mut self, scope: &str, parent: Option<&str>, doc: Vec<(usize, Stmt)>) {
        for (_, stmt) in doc {
            match stmt {
                Stmt::State(s) => self.apply_state(scope, parent, s),
                Stmt::Relation { from, to, label } => {
                    let from = self.apply_ref(scope, parent, from, true);
                    let to = self.apply_ref(scope, parent, to, false);
                    self.add_relation(&from, &to, label.as_deref());
                }
                Stmt::Note { id, note } => {
                    self.add_state(&id, StateType::Default, parent);
                    self.set_note(&id, note);
                }
                Stmt::Divider => debug!(scope, "divider outside a composite state ignored"),
                Stmt::Direction(d) => match parent.and_then(|p| self.states.get_mut(p)) {
                    Some(state) => state.direction = Some(d),
                    None => self.direction = Some(d),
                },
                Stmt::ClassDef { id, styles } => self.add_style_class(&id, &styles),
                Stmt::Class { ids, class } => self.set_css_class(&ids, &class),
                Stmt::Style { ids, styles } => self.set_style(&ids, &styles),
                Stmt::AccTitle(t) => self.set_acc_title(t),
                Stmt::AccDescr(d) => self.set_acc_descr(d),
            }
        }
    }

    fn resolve_id(scope: &str, id: &str, first: bool) -> (String, StateType) {
        if id == "[*]" {
            if first {
                (format!("{scope}_start"), StateType::Start)
            } else {
                (format!("{scope}_end"), StateType::End)
            }
        } else {
            (id.to_string(), StateType::Default)
        }
    }

    fn apply_ref(&mut self, scope: &str, parent: Option<&str>, r: StateRef, first: bool) -> String {
        let (id, state_type) = Self::resolve_id(scope, &r.id, first);
        self.add_state(&id, state_type, parent).classes.extend(r.classes);
        id
    }

    fn apply_state(&mut self, scope: &str, parent: Option<&str>, s: StateStmt) {
        let (id, resolved) = Self::resolve_id(scope, &s.id, true);
        let state_type = if resolved == StateType::Default {
            s.state_type
        } else {
            resolved
        };
        self.add_state(&id, state_type, parent).classes.extend(s.classes);
        if let Some(descr) = s.description.as_deref() {
            self.add_description(&id, descr);
        }
        if let Some(doc) = s.doc {
            self.add_state(&id, state_type, parent).composite = true;
            self.apply_composite(&id, doc);
        }
    }

    fn apply_composite(&mut self, id: &str, doc: Vec<(usize, Stmt)>) {
        if !doc.iter().any(|(_, s)| matches!(s, Stmt::Divider)) {
            self.apply_doc(id, Some(id), doc);
            return;
        }
        let mut regions: Vec<Vec<(usize, Stmt)>> = vec![Vec::new()];
        for (line, stmt) in doc {
            match stmt {
                Stmt::Divider => regions.push(Vec::new()),
                stmt => {
                    if let Some(region) = regions.last_mut() {
                        region.push((line, stmt));
                    }
                }
            }
        }
        for region in regions.into_iter().filter(|r| !r.is_empty()) {
            self.divider_count += 1;
            let divider = format!("divider-id-{}", self.divider_count);
            self.add_state(&divider, StateType::Divider, Some(id)).composite = true;
            self.apply_doc(&divider, Some(divider.as_str()), region);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_keep_their_first_parent_and_upgrade_type() {
        let mut db = Db::new();
        db.add_state("A", StateType::Default, Some("outer"));
        db.add_state("A", StateType::Fork, None);
        let a = db.state("A").unwrap();
        assert_eq!(a.parent.as_deref(), Some("outer"));
        assert_eq!(a.state_type, StateType::Fork);

        db.add_state("A", StateType::Join, None);
        assert_eq!(db.state("A").unwrap().state_type, StateType::Fork);
    }

    #[test]
    fn descriptions_are_trimmed() {
        let mut db = Db::new();
        db.add_description("A", " : waiting ");
        db.add_description("A", "   ");
        assert_eq!(db.state("A").unwrap().descriptions, vec!["waiting"]);
    }

    #[test]
    fn self_transitions_keep_the_latest_label() {
        let mut db = Db::new();
        db.add_relation("A", "A", Some("first"));
        db.add_relation("A", "A", Some("second"));
        db.add_relation("A", "B", None);
        assert_eq!(db.relations().len(), 2);
        assert_eq!(db.relations()[0].label.as_deref(), Some("second"));
    }

    #[test]
    fn style_statements_replace_and_classes_accumulate() {
        let mut db = Db::new();
        db.set_style("A,B", "fill:#f00, stroke:#000");
        db.set_style("A", "fill:#0f0");
        db.set_css_class("A, B", "hot");
        db.add_style_class("hot", "color:red");
        assert_eq!(db.state("A").unwrap().styles, vec!["fill:#0f0"]);
        assert_eq!(db.state("B").unwrap().styles, vec!["fill:#f00", "stroke:#000"]);
        assert_eq!(db.state("B").unwrap().classes, vec!["hot"]);
        assert_eq!(db.classes()["hot"].text_styles, vec!["fill:red"]);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut db = Db::new();
        db.add_relation("A", "B", None);
        db.set_direction(RankDir::LR);
        db.clear();
        assert_eq!(db.states().count(), 0);
        assert!(db.relations().is_empty());
        assert_eq!(db.direction(), RankDir::TB);
    }
}
