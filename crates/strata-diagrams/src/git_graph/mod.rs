//! Git graph diagrams.
//!
//! [`Db`] replays `commit`/`branch`/`checkout`/`merge`/`cherry-pick` operations and enforces
//! the same rules git would: no duplicate branches, no merging a branch into itself, no
//! cherry-picking a merge without naming the parent, and so on.

mod parse;
mod render;

pub use parse::{CherryPickArgs, CommitArgs, Document, MergeArgs, Stmt, parse, parse_into};
pub use render::render;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{Config, Error, ParseHash, Result};

pub const DIAGRAM_TYPE: &str = "gitGraph";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitType {
    #[default]
    Normal,
    Reverse,
    Highlight,
    Merge,
    CherryPick,
}

impl CommitType {
    /// The types a user may request with `type:`.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "NORMAL" => Some(Self::Normal),
            "REVERSE" => Some(Self::Reverse),
            "HIGHLIGHT" => Some(Self::Highlight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Direction {
    #[default]
    LR,
    TB,
    BT,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LR" => Some(Self::LR),
            "TB" => Some(Self::TB),
            "BT" => Some(Self::BT),
            _ => None,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::TB | Self::BT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub id: String,
    pub message: String,
    pub seq: usize,
    pub commit_type: CommitType,
    /// `type:` given on a merge; drawn instead of the merge symbol.
    pub custom_type: Option<CommitType>,
    pub tags: Vec<String>,
    pub parents: Vec<String>,
    pub branch: String,
    pub custom_id: bool,
}

impl Commit {
    pub fn symbol_type(&self) -> CommitType {
        self.custom_type.unwrap_or(self.commit_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    pub name: String,
    pub head: Option<String>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Db {
    commits: IndexMap<String, Commit>,
    branches: IndexMap<String, Branch>,
    head: Option<String>,
    current_branch: String,
    direction: Direction,
    seq: usize,
    warnings: Vec<String>,
    acc_title: Option<String>,
    acc_descr: Option<String>,
    main_branch: String,
    main_branch_order: i64,
}

impl Default for Db {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Db {
    /// A database whose trunk is `gitGraph.mainBranchName` (default `main`).
    pub fn new(config: &Config) -> Self {
        let main_branch = config
            .get_str("gitGraph.mainBranchName")
            .unwrap_or("main")
            .to_string();
        let mut db = Self {
            commits: IndexMap::new(),
            branches: IndexMap::new(),
            head: None,
            current_branch: main_branch.clone(),
            direction: Direction::default(),
            seq: 0,
            warnings: Vec::new(),
            acc_title: None,
            acc_descr: None,
            main_branch,
            main_branch_order: config.get_i64("gitGraph.mainBranchOrder").unwrap_or(0),
        };
        db.clear();
        db
    }

    pub fn clear(&mut self) {
        self.commits.clear();
        self.branches.clear();
        self.head = None;
        self.direction = Direction::default();
        self.seq = 0;
        self.warnings.clear();
        self.acc_title = None;
        self.acc_descr = None;
        self.current_branch = self.main_branch.clone();
        self.branches.insert(
            self.main_branch.clone(),
            Branch {
                name: self.main_branch.clone(),
                head: None,
                order: Some(self.main_branch_order),
            },
        );
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn direction(&self) -> Direction {
        self.direction
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

    pub fn current_branch(&self) -> &str {
        &self.current_branch
    }

    pub fn head(&self) -> Option<&Commit> {
        self.head.as_ref().and_then(|id| self.commits.get(id))
    }

    pub fn commit_by_id(&self, id: &str) -> Option<&Commit> {
        self.commits.get(id)
    }

    /// All commits in the order they were made.
    pub fn commits(&self) -> Vec<&Commit> {
        let mut out: Vec<&Commit> = self.commits.values().collect();
        out.sort_by_key(|c| c.seq);
        out
    }

    /// Branches sorted by their `order:`. Branches without one keep their creation order,
    /// slotted between orders 0 and 1.
    pub fn branches(&self) -> Vec<&Branch> {
        let mut entries: Vec<(&Branch, f64)> = self
            .branches
            .values()
            .enumerate()
            .map(|(i, b)| {
                let order = match b.order {
                    Some(o) => o as f64,
                    None => format!("0.{i}").parse::<f64>().unwrap_or(0.0),
                };
                (b, order)
            })
            .collect();
        entries.sort_by(|a, b| a.1.total_cmp(&b.1));
        entries.into_iter().map(|(b, _)| b).collect()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn next_id(&self) -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("{}-{}", self.seq, &hex[..7])
    }

    fn branch_head(&self, branch: &str) -> Option<&Commit> {
        self.branches
            .get(branch)
            .and_then(|b| b.head.as_deref())
            .and_then(|id| self.commits.get(id))
    }

    fn push_commit(&mut self, commit: Commit) {
        let id = commit.id.clone();
        self.seq += 1;
        self.head = Some(id.clone());
        self.commits.insert(id.clone(), commit);
        if let Some(branch) = self.branches.get_mut(&self.current_branch) {
            branch.head = Some(id);
        }
    }

    /// Adds a commit on the current branch. Reusing an id replaces the earlier commit and is
    /// recorded as a warning.
    pub fn commit(&mut self, args: CommitArgs) {
        let id = match args.id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => self.next_id(),
        };
        if self.commits.contains_key(&id) {
            warn!(id = %id, "duplicate commit id");
            self.warnings.push(format!("Commit ID {id} already exists"));
        }
        let commit = Commit {
            id,
            message: args.message,
            seq: self.seq,
            commit_type: args.commit_type,
            custom_type: None,
            tags: args.tags,
            parents: self.head.iter().cloned().collect(),
            branch: self.current_branch.clone(),
            custom_id: false,
        };
        self.push_commit(commit);
    }

    /// Creates `name` at the current head and checks it out.
    pub fn branch(&mut self, name: &str, order: Option<i64>) -> Result<()> {
        if self.branches.contains_key(name) {
            return Err(db_error(
                format!(
                    "Trying to create an existing branch. (Help: Either use a new name if you want create a new branch or try using \"checkout {name}\")"
                ),
                &format!("branch {name}"),
                [format!("\"checkout {name}\"")],
            ));
        }
        self.branches.insert(
            name.to_string(),
            Branch {
                name: name.to_string(),
                head: self.head.clone(),
                order,
            },
        );
        self.checkout(name)
    }

    pub fn checkout(&mut self, name: &str) -> Result<()> {
        let Some(branch) = self.branches.get(name) else {
            return Err(db_error(
                format!(
                    "Trying to checkout branch which is not yet created. (Help try using \"branch {name}\")"
                ),
                &format!("checkout {name}"),
                [format!("\"branch {name}\"")],
            ));
        };
        self.head = branch.head.clone();
        self.current_branch = name.to_string();
        Ok(())
    }

    /// Merges `args.branch` into the current branch with a two-parent commit.
    pub fn merge(&mut self, args: MergeArgs) -> Result<()> {
        let current = self.current_branch.clone();
        let other = args.branch;
        let text = format!("merge {other}");

        if current == other {
            return Err(db_error(
                "Incorrect usage of \"merge\". Cannot merge a branch to itself",
                &text,
                ["branch abc"],
            ));
        }
        let Some(current_head) = self.branch_head(&current).cloned() else {
            return Err(db_error(
                format!("Incorrect usage of \"merge\". Current branch ({current})has no commits"),
                &text,
                ["commit"],
            ));
        };
        if !self.branches.contains_key(&other) {
            return Err(db_error(
                format!("Incorrect usage of \"merge\". Branch to be merged ({other}) does not exist"),
                &text,
                [format!("\"branch {other}\"")],
            ));
        }
        let Some(other_head) = self.branch_head(&other).cloned() else {
            return Err(db_error(
                format!("Incorrect usage of \"merge\". Branch to be merged ({other}) has no commits"),
                &text,
                ["\"commit\""],
            ));
        };
        if current_head.branch == other {
            return Err(db_error(
                format!("Cannot merge branch '{other}' into itself."),
                &text,
                ["branch abc"],
            ));
        }
        if current_head.id == other_head.id {
            return Err(db_error(
                "Incorrect usage of \"merge\". Both branches have same head",
                &text,
                ["branch abc"],
            ));
        }
        let custom_id = args.id.filter(|id| !id.is_empty());
        if let Some(id) = custom_id.as_deref() {
            if self.commits.contains_key(id) {
                return Err(db_error(
                    format!(
                        "Incorrect usage of \"merge\". Commit with id:{id} already exists, use different custom id"
                    ),
                    &format!("merge {other} {id}"),
                    [format!("merge {other} {id}_UNIQUE")],
                ));
            }
        }

        let commit = Commit {
            id: custom_id.clone().unwrap_or_else(|| self.next_id()),
            message: format!("merged branch {other} into {current}"),
            seq: self.seq,
            commit_type: CommitType::Merge,
            custom_type: args.commit_type,
            tags: args.tags,
            parents: vec![current_head.id, other_head.id],
            branch: current,
            custom_id: custom_id.is_some(),
        };
        self.push_commit(commit);
        Ok(())
    }

    /// Copies commit `args.id` onto the current branch.
    pub fn cherry_pick(&mut self, args: CherryPickArgs) -> Result<()> {
        let text = format!("cherryPick {}", args.id);
        let Some(source) = self.commits.get(&args.id).cloned() else {
            return Err(db_error(
                "Incorrect usage of \"cherryPick\". Source commit id should exist and provided",
                &text,
                ["cherry-pick abc"],
            ));
        };
        let parent = args.parent.filter(|p| !p.is_empty());
        if let Some(parent) = parent.as_deref() {
            if !source.parents.iter().any(|p| p == parent) {
                return Err(db_error(
                    "Invalid operation: The specified parent commit is not an immediate parent of the cherry-picked commit.",
                    &text,
                    ["cherry-pick abc parent: abc"],
                ));
            }
        }
        if source.commit_type == CommitType::Merge && parent.is_none() {
            return Err(db_error(
                "Incorrect usage of cherry-pick: If the source commit is a merge commit, an immediate parent commit must be specified.",
                &text,
                ["cherry-pick abc parent: abc"],
            ));
        }
        if source.branch == self.current_branch {
            return Err(db_error(
                "Incorrect usage of \"cherryPick\". Source commit is already on current branch",
                &text,
                ["cherry-pick abc"],
            ));
        }
        let Some(head) = self.branch_head(&self.current_branch).map(|c| c.id.clone()) else {
            return Err(db_error(
                format!(
                    "Incorrect usage of \"cherry-pick\". Current branch ({})has no commits",
                    self.current_branch
                ),
                &text,
                ["cherry-pick abc"],
            ));
        };

        let tags = match args.tags {
            Some(tags) => tags.into_iter().filter(|t| !t.is_empty()).collect(),
            None => {
                let mut tag = format!("cherry-pick:{}", source.id);
                if source.commit_type == CommitType::Merge {
                    tag.push_str(&format!("|parent:{}", parent.unwrap_or_default()));
                }
                vec![tag]
            }
        };
        let commit = Commit {
            id: self.next_id(),
            message: format!("cherry-picked {} into {}", source.message, self.current_branch),
            seq: self.seq,
            commit_type: CommitType::CherryPick,
            custom_type: None,
            tags,
            parents: vec![head, source.id],
            branch: self.current_branch.clone(),
            custom_id: false,
        };
        self.push_commit(commit);
        Ok(())
    }

    pub fn apply(&mut self, stmt: Stmt) -> Result<()> {
        match stmt {
            Stmt::Commit(args) => self.commit(args),
            Stmt::Branch { name, order } => self.branch(&name, order)?,
            Stmt::Checkout(name) => self.checkout(&name)?,
            Stmt::Merge(args) => self.merge(args)?,
            Stmt::CherryPick(args) => self.cherry_pick(args)?,
            Stmt::AccTitle(t) => self.set_acc_title(t),
            Stmt::AccDescr(d) => self.set_acc_descr(d),
        }
        Ok(())
    }
}

fn db_error<I, S>(message: impl Into<String>, text: &str, expected: I) -> Error
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let hash = ParseHash {
        text: text.to_string(),
        token: text.to_string(),
        line: 0,
        expected: Vec::new(),
    }
    .expecting(expected);
    Error::parse(DIAGRAM_TYPE, message, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with(ops: impl FnOnce(&mut Db) -> Result<()>) -> Db {
        let mut db = Db::default();
        ops(&mut db).unwrap();
        db
    }

    #[test]
    fn starts_on_the_configured_main_branch() {
        let mut config = Config::default();
        config.set_value("gitGraph.mainBranchName", "trunk".into());
        let db = Db::new(&config);
        assert_eq!(db.current_branch(), "trunk");
        assert_eq!(db.branches().len(), 1);
        assert!(db.head().is_none());
    }

    #[test]
    fn commits_chain_parents_on_the_current_branch() {
        let db = db_with(|db| {
            db.commit(CommitArgs::default());
            db.commit(CommitArgs::default());
            Ok(())
        });
        let commits = db.commits();
        assert_eq!(commits.len(), 2);
        assert!(commits[0].parents.is_empty());
        assert_eq!(commits[1].parents, vec![commits[0].id.clone()]);
        assert!(commits[0].id.starts_with("0-"));
        assert_eq!(commits[0].id.len(), "0-".len() + 7);
    }

    #[test]
    fn merge_creates_a_two_parent_commit() {
        let db = db_with(|db| {
            db.commit(CommitArgs::default());
            db.branch("feature", None)?;
            db.commit(CommitArgs::default());
            db.checkout("main")?;
            db.merge(MergeArgs::new("feature"))
        });
        let commits = db.commits();
        let head = db.head().unwrap();
        assert_eq!(head.commit_type, CommitType::Merge);
        assert_eq!(head.parents, vec![commits[0].id.clone(), commits[1].id.clone()]);
        assert_eq!(head.message, "merged branch feature into main");
        assert!(!head.custom_id);
    }

    #[test]
    fn merge_errors_carry_expected_hints() {
        let mut db = Db::default();
        db.commit(CommitArgs::default());
        db.branch("feature", None).unwrap();
        db.checkout("main").unwrap();
        let err = db.merge(MergeArgs::new("feature")).unwrap_err();
        assert_eq!(
            err.message(),
            Some("Incorrect usage of \"merge\". Both branches have same head")
        );
        assert_eq!(err.hash().unwrap().text, "merge feature");
        assert_eq!(err.hash().unwrap().expected, vec!["branch abc"]);
    }

    #[test]
    fn duplicate_commit_ids_warn() {
        let db = db_with(|db| {
            for _ in 0..2 {
                db.commit(CommitArgs {
                    id: Some("x".to_string()),
                    ..Default::default()
                });
            }
            Ok(())
        });
        assert_eq!(db.warnings(), ["Commit ID x already exists"]);
        assert_eq!(db.commits().len(), 1);
    }

    #[test]
    fn cherry_pick_of_a_merge_names_the_parent_in_its_tag() {
        let db = db_with(|db| {
            db.commit(CommitArgs::with_id("ZERO"));
            db.branch("feature", None)?;
            db.branch("release", None)?;
            db.checkout("feature")?;
            db.commit(CommitArgs::with_id("A"));
            db.checkout("main")?;
            db.merge(MergeArgs {
                id: Some("M".to_string()),
                ..MergeArgs::new("feature")
            })?;
            db.checkout("release")?;
            db.commit(CommitArgs::with_id("C"));
            db.cherry_pick(CherryPickArgs {
                id: "M".to_string(),
                parent: Some("ZERO".to_string()),
                tags: None,
            })
        });
        let head = db.head().unwrap();
        assert_eq!(head.commit_type, CommitType::CherryPick);
        assert_eq!(head.tags, vec!["cherry-pick:M|parent:ZERO"]);
        assert_eq!(head.parents, vec!["C".to_string(), "M".to_string()]);
    }

    #[test]
    fn clear_resets_to_a_fresh_main_branch() {
        let mut db = db_with(|db| {
            db.commit(CommitArgs::default());
            db.branch("x", Some(2))
        });
        db.clear();
        assert_eq!(db.current_branch(), "main");
        assert!(db.commits().is_empty());
        assert_eq!(db.branches().len(), 1);
    }
}
