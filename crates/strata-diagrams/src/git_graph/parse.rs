use tracing::debug_span;

use super::{CommitType, DIAGRAM_TYPE, Db, Direction};
use crate::source::{Accessibility, Source, accessibility};
use crate::{Error, ParseHash, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitArgs {
    pub id: Option<String>,
    pub message: String,
    pub tags: Vec<String>,
    pub commit_type: CommitType,
}

impl CommitArgs {
    pub fn with_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeArgs {
    pub branch: String,
    pub id: Option<String>,
    pub tags: Vec<String>,
    pub commit_type: Option<CommitType>,
}

impl MergeArgs {
    pub fn new(branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CherryPickArgs {
    pub id: String,
    pub parent: Option<String>,
    /// `None` means "use the default `cherry-pick:<id>` tag"; an explicit empty tag clears it.
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Commit(CommitArgs),
    Branch { name: String, order: Option<i64> },
    Checkout(String),
    Merge(MergeArgs),
    CherryPick(CherryPickArgs),
    AccTitle(String),
    AccDescr(String),
}

/// Parsed source: the header's direction and each statement with its line number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub direction: Option<Direction>,
    pub statements: Vec<(usize, Stmt)>,
}

/// Parses `text` and replays it onto `db`. Database errors report the failing line.
pub fn parse_into(text: &str, db: &mut Db) -> Result<()> {
    let _span = debug_span!("parse", diagram = DIAGRAM_TYPE).entered();
    let doc = parse(text)?;
    if let Some(direction) = doc.direction {
        db.set_direction(direction);
    }
    for (line, stmt) in doc.statements {
        db.apply(stmt).map_err(|e| e.at_line(line))?;
    }
    Ok(())
}

pub fn parse(text: &str) -> Result<Document> {
    let mut src = Source::new(text);
    let Some((line_no, header)) = src.next_statement() else {
        return Err(error(0, "", "empty input", ["gitGraph"]));
    };
    let mut doc = Document {
        direction: parse_header(line_no, header)?,
        statements: Vec::new(),
    };

    while let Some((line_no, line)) = src.next_statement() {
        if let Some(acc) = accessibility(DIAGRAM_TYPE, line, &mut src)? {
            let stmt = match acc {
                Accessibility::Title(t) => Stmt::AccTitle(t),
                Accessibility::Descr(d) => Stmt::AccDescr(d),
            };
            doc.statements.push((line_no, stmt));
            continue;
        }
        let stmt = parse_statement(line_no, line)?;
        doc.statements.push((line_no, stmt));
    }
    Ok(doc)
}

fn parse_header(line_no: usize, line: &str) -> Result<Option<Direction>> {
    let Some(rest) = line.strip_prefix("gitGraph") else {
        return Err(error(line_no, line, "expected gitGraph header", ["gitGraph"]));
    };
    let rest = rest.trim().trim_end_matches(':').trim();
    if rest.is_empty() {
        return Ok(None);
    }
    match Direction::parse(rest) {
        Some(d) => Ok(Some(d)),
        None => Err(error(
            line_no,
            line,
            format!("invalid direction: {rest}"),
            ["LR", "TB", "BT"],
        )),
    }
}

fn parse_statement(line_no: usize, line: &str) -> Result<Stmt> {
    let mut lp = LineParser::new(line, line_no);
    let Some(cmd) = lp.parse_word_until_ws_or_colon() else {
        return Err(error(line_no, line, "expected a statement", STATEMENTS));
    };

    match cmd {
        "commit" => {
            lp.skip_ws();
            let mut args = CommitArgs::default();
            if lp.peek_char() == Some('"') {
                args.message = lp.parse_quoted()?;
                return Ok(Stmt::Commit(args));
            }
            for (key, value) in lp.parse_kv_pairs()? {
                match key {
                    "id" => args.id = Some(value),
                    "msg" => args.message = value,
                    "tag" => args.tags.push(value),
                    "type" => args.commit_type = commit_type(line_no, line, &value)?,
                    _ => return Err(unknown_key(line_no, line, key, &["id", "msg", "tag", "type"])),
                }
            }
            Ok(Stmt::Commit(args))
        }
        "branch" => {
            let name = lp.parse_name_token()?;
            let mut order = None;
            for (key, value) in lp.parse_kv_pairs()? {
                if key != "order" {
                    return Err(unknown_key(line_no, line, key, &["order"]));
                }
                let parsed = value.trim().parse::<i64>().map_err(|_| {
                    error(line_no, line, format!("invalid branch order: {value}"), ["NUM"])
                })?;
                order = Some(parsed);
            }
            Ok(Stmt::Branch { name, order })
        }
        "checkout" | "switch" => Ok(Stmt::Checkout(lp.parse_name_token()?)),
        "merge" => {
            let mut args = MergeArgs::new(&lp.parse_name_token()?);
            for (key, value) in lp.parse_kv_pairs()? {
                match key {
                    "id" => args.id = Some(value),
                    "tag" => args.tags.push(value),
                    "type" => args.commit_type = Some(commit_type(line_no, line, &value)?),
                    _ => return Err(unknown_key(line_no, line, key, &["id", "tag", "type"])),
                }
            }
            Ok(Stmt::Merge(args))
        }
        "cherry-pick" | "cherryPick" => {
            let mut args = CherryPickArgs::default();
            for (key, value) in lp.parse_kv_pairs()? {
                match key {
                    "id" => args.id = value,
                    "parent" => args.parent = Some(value),
                    "tag" => args.tags.get_or_insert_with(Vec::new).push(value),
                    _ => return Err(unknown_key(line_no, line, key, &["id", "parent", "tag"])),
                }
            }
            Ok(Stmt::CherryPick(args))
        }
        _ => Err(error(
            line_no,
            line,
            format!("Unknown statement: {cmd}"),
            STATEMENTS,
        )),
    }
}

const STATEMENTS: [&str; 6] = ["commit", "branch", "checkout", "switch", "merge", "cherry-pick"];

fn commit_type(line_no: usize, line: &str, raw: &str) -> Result<CommitType> {
    CommitType::from_keyword(raw.trim()).ok_or_else(|| {
        error(
            line_no,
            line,
            format!("Unknown commit type: {}", raw.trim()),
            ["NORMAL", "REVERSE", "HIGHLIGHT"],
        )
    })
}

fn unknown_key(line_no: usize, line: &str, key: &str, expected: &[&str]) -> Error {
    error(
        line_no,
        line,
        format!("unexpected attribute: {key}"),
        expected.iter().map(|k| format!("{k}:")),
    )
}

fn error<I, S>(line_no: usize, line: &str, message: impl Into<String>, expected: I) -> Error
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Error::parse(
        DIAGRAM_TYPE,
        message,
        ParseHash::at(line_no, line).expecting(expected),
    )
}

/// Cursor over one statement line.
struct LineParser<'a> {
    input: &'a str,
    pos: usize,
    line_no: usize,
}

impl<'a> LineParser<'a> {
    fn new(input: &'a str, line_no: usize) -> Self {
        Self {
            input,
            pos: 0,
            line_no,
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn fail(&self, message: impl Into<String>, expected: &[&str]) -> Error {
        error(self.line_no, self.input, message, expected.iter().copied())
    }

    fn parse_word_until_ws_or_colon(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == ':' {
                break;
            }
            self.bump();
        }
        (self.pos > start).then(|| &self.input[start..self.pos])
    }

    fn consume_char(&mut self, ch: char) -> bool {
        self.skip_ws();
        if self.peek_char() == Some(ch) {
            self.bump();
            return true;
        }
        false
    }

    fn parse_quoted(&mut self) -> Result<String> {
        self.skip_ws();
        if self.peek_char() != Some('"') {
            return Err(self.fail("expected quoted string", &["\""]));
        }
        self.bump();
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '"' {
                break;
            }
            self.bump();
        }
        if self.peek_char() != Some('"') {
            return Err(self.fail("unterminated quoted string", &["\""]));
        }
        let s = self.input[start..self.pos].to_string();
        self.bump();
        Ok(s)
    }

    fn parse_name_token(&mut self) -> Result<String> {
        self.skip_ws();
        if self.peek_char() == Some('"') {
            return self.parse_quoted();
        }
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                break;
            }
            self.bump();
        }
        if self.pos == start {
            return Err(self.fail("expected name", &["NAME"]));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_kv_pairs(&mut self) -> Result<Vec<(&'a str, String)>> {
        let mut out = Vec::new();
        while !self.is_eof() {
            self.skip_ws();
            if self.is_eof() {
                break;
            }
            let Some(key) = self.parse_word_until_ws_or_colon() else {
                return Err(self.fail("expected attribute name", &["id:", "tag:", "type:"]));
            };
            if !self.consume_char(':') {
                return Err(self.fail(format!("expected ':' after {key}"), &[":"]));
            }
            self.skip_ws();
            let value = if self.peek_char() == Some('"') {
                self.parse_quoted()?
            } else {
                self.parse_word_until_ws_or_colon()
                    .unwrap_or_default()
                    .to_string()
            };
            out.push((key, value));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_db(text: &str) -> Db {
        let mut db = Db::default();
        parse_into(text, &mut db).unwrap();
        db
    }

    fn parse_err(text: &str) -> String {
        let mut db = Db::default();
        let err = parse_into(text, &mut db).unwrap_err();
        err.message().unwrap_or_default().to_string()
    }

    fn branch_names(db: &Db) -> Vec<&str> {
        db.branches().iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn should_handle_gitgraph_definition_and_defaults() {
        let db = parse_db("gitGraph:\n commit\n");
        assert_eq!(db.commits().len(), 1);
        assert_eq!(db.current_branch(), "main");
        assert_eq!(db.direction(), Direction::LR);
        assert_eq!(db.branches().len(), 1);
    }

    #[test]
    fn should_handle_set_direction_tb_and_bt() {
        assert_eq!(parse_db("gitGraph TB:\ncommit\n").direction(), Direction::TB);
        assert_eq!(parse_db("gitGraph BT:\ncommit\n").direction(), Direction::BT);
    }

    #[test]
    fn should_checkout_and_switch_branch() {
        let db = parse_db("gitGraph:\nbranch new\ncheckout new\n");
        assert!(db.commits().is_empty());
        assert_eq!(db.current_branch(), "new");

        let db = parse_db("gitGraph:\nbranch new\nswitch new\n");
        assert_eq!(db.current_branch(), "new");
    }

    #[test]
    fn should_add_commits_to_checked_out_branch() {
        let db = parse_db("gitGraph:\nbranch new\ncheckout new\ncommit\ncommit\n");
        let commits = db.commits();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].branch, "new");
        assert_eq!(commits[1].branch, "new");
        assert_eq!(commits[1].parents.len(), 1);
    }

    #[test]
    fn should_handle_commit_with_args_and_message_variants() {
        let db = parse_db("gitGraph:\ncommit \"a commit\"\n");
        assert_eq!(db.commits()[0].message, "a commit");

        let db = parse_db("gitGraph:\ncommit msg: \"test commit\"\n");
        assert_eq!(db.commits()[0].message, "test commit");

        let db = parse_db("gitGraph:\ncommit id:\"1111\"\n");
        assert_eq!(db.commits()[0].id, "1111");

        let db = parse_db("gitGraph:\ncommit type: HIGHLIGHT\n");
        assert_eq!(db.commits()[0].commit_type, CommitType::Highlight);

        let db = parse_db(
            "gitGraph:\ncommit id:\"1111\" type:REVERSE tag: \"test tag\" msg:\"test msg\"\n",
        );
        let c = db.commits()[0];
        assert_eq!(c.id, "1111");
        assert_eq!(c.commit_type, CommitType::Reverse);
        assert_eq!(c.message, "test msg");
        assert_eq!(c.tags, vec!["test tag"]);
    }

    #[test]
    fn commits_may_carry_several_tags() {
        let db = parse_db("gitGraph\ncommit tag:\"v1\" tag:\"stable\"\n");
        assert_eq!(db.commits()[0].tags, vec!["v1", "stable"]);
    }

    #[test]
    fn should_handle_new_branch_creation_and_names() {
        for name in ["testBranch", "azAZ_-./test", "1.0.1"] {
            let db = parse_db(&format!("gitGraph:\ncommit\nbranch {name}\n"));
            assert_eq!(db.current_branch(), name);
            assert_eq!(db.branches().len(), 2);
        }
    }

    #[test]
    fn should_allow_quoted_branch_names_and_merge() {
        let db = parse_db(
            "gitGraph:\ncommit\nbranch \"branch\"\ncheckout \"branch\"\ncommit\ncheckout main\nmerge \"branch\"\n",
        );
        assert_eq!(db.commits().len(), 3);
        assert_eq!(db.current_branch(), "main");
        assert_eq!(branch_names(&db), vec!["main", "branch"]);
    }

    #[test]
    fn should_handle_branch_order_sorting() {
        let db = parse_db(
            "gitGraph:\ncommit\nbranch test1 order: 3\nbranch test2 order: 2\nbranch test3 order: 1\n",
        );
        assert_eq!(branch_names(&db), vec!["main", "test3", "test2", "test1"]);

        let db = parse_db("gitGraph:\ncommit\nbranch test1 order: 1\nbranch test2\nbranch test3\n");
        assert_eq!(branch_names(&db), vec!["main", "test2", "test3", "test1"]);
    }

    #[test]
    fn should_support_cherry_picking_commits() {
        let base = "gitGraph\ncommit id: \"ZERO\"\nbranch develop\ncommit id:\"A\"\ncheckout main\n";
        let db = parse_db(&format!("{base}cherry-pick id:\"A\"\n"));
        let commits = db.commits();
        assert_eq!(commits.len(), 3);
        assert_eq!(commits[2].branch, "main");
        assert_eq!(commits[2].tags, vec!["cherry-pick:A"]);

        let db = parse_db(&format!("{base}cherry-pick id:\"A\" tag:\"MyTag\"\n"));
        assert_eq!(db.commits()[2].tags, vec!["MyTag"]);

        let db = parse_db(&format!("{base}cherry-pick id:\"A\" tag:\"\"\n"));
        assert!(db.commits()[2].tags.is_empty());
    }

    #[test]
    fn should_support_cherry_picking_merge_commits_and_validate_parent() {
        let base = "gitGraph\ncommit id: \"ZERO\"\nbranch feature\nbranch release\ncheckout feature\ncommit id: \"A\"\ncommit id: \"B\"\ncheckout main\nmerge feature id: \"M\"\ncheckout release\ncommit id: \"C\"\n";
        let err = parse_err(&format!("{base}cherry-pick id:\"M\"\n"));
        assert_eq!(
            err,
            "Incorrect usage of cherry-pick: If the source commit is a merge commit, an immediate parent commit must be specified."
        );

        let err = parse_err(&format!("{base}cherry-pick id:\"M\" parent: \"A\"\n"));
        assert_eq!(
            err,
            "Invalid operation: The specified parent commit is not an immediate parent of the cherry-picked commit."
        );

        let db = parse_db(&format!("{base}cherry-pick id:\"M\" parent: \"B\"\n"));
        assert_eq!(db.head().unwrap().tags, vec!["cherry-pick:M|parent:B"]);
    }

    #[test]
    fn cherry_pick_rejects_unknown_and_local_commits() {
        let err = parse_err("gitGraph\ncommit id:\"A\"\ncherry-pick id:\"Z\"\n");
        assert_eq!(
            err,
            "Incorrect usage of \"cherryPick\". Source commit id should exist and provided"
        );
        let err = parse_err("gitGraph\ncommit id:\"A\"\ncherry-pick id:\"A\"\n");
        assert_eq!(
            err,
            "Incorrect usage of \"cherryPick\". Source commit is already on current branch"
        );
    }

    #[test]
    fn should_throw_error_when_try_to_branch_existing_branch() {
        let err = parse_err("gitGraph\ncommit\nbranch testBranch\ncommit\nbranch main\n");
        assert!(err.starts_with("Trying to create an existing branch."));
    }

    #[test]
    fn should_throw_error_when_try_to_checkout_unknown_branch() {
        let mut db = Db::default();
        let err = parse_into("gitGraph\ncommit\ncheckout testBranch\n", &mut db).unwrap_err();
        assert_eq!(
            err.message(),
            Some(
                "Trying to checkout branch which is not yet created. (Help try using \"branch testBranch\")"
            )
        );
        let hash = err.hash().unwrap();
        assert_eq!(hash.line, 3);
        assert_eq!(hash.expected, vec!["\"branch testBranch\""]);
    }

    #[test]
    fn should_throw_error_when_trying_to_merge_without_commits_or_unknown_branch() {
        assert_eq!(
            parse_err("gitGraph\nmerge testBranch\n"),
            "Incorrect usage of \"merge\". Current branch (main)has no commits"
        );
        assert_eq!(
            parse_err("gitGraph\ncommit\nmerge testBranch\n"),
            "Incorrect usage of \"merge\". Branch to be merged (testBranch) does not exist"
        );
        assert_eq!(
            parse_err("gitGraph\nbranch test1\ncheckout main\ncommit\nmerge test1\n"),
            "Incorrect usage of \"merge\". Branch to be merged (test1) has no commits"
        );
    }

    #[test]
    fn should_throw_error_when_trying_to_merge_branch_to_itself() {
        assert_eq!(
            parse_err("gitGraph\ncommit\nbranch testBranch\nmerge testBranch\n"),
            "Incorrect usage of \"merge\". Cannot merge a branch to itself"
        );
    }

    #[test]
    fn should_throw_error_when_using_existing_id_as_merge_id() {
        let err = parse_err(
            "gitGraph\ncommit id: \"1-111\"\nbranch testBranch\ncommit id: \"2-222\"\ncheckout main\nmerge testBranch id: \"1-111\"\n",
        );
        assert_eq!(
            err,
            "Incorrect usage of \"merge\". Commit with id:1-111 already exists, use different custom id"
        );
    }

    #[test]
    fn merge_type_overrides_the_drawn_symbol() {
        let db = parse_db(
            "gitGraph\ncommit\nbranch b\ncommit\ncheckout main\nmerge b id:\"M\" type: HIGHLIGHT tag:\"v2\"\n",
        );
        let head = db.head().unwrap();
        assert_eq!(head.commit_type, CommitType::Merge);
        assert_eq!(head.symbol_type(), CommitType::Highlight);
        assert!(head.custom_id);
        assert_eq!(head.tags, vec!["v2"]);
    }

    #[test]
    fn should_handle_accessibility_title_and_description() {
        let db = parse_db(
            "gitGraph:\naccTitle: This is a title\naccDescr {\n  This is a description\n  using multiple lines\n}\ncommit\n",
        );
        assert_eq!(db.acc_title(), Some("This is a title"));
        assert_eq!(
            db.acc_descr(),
            Some("This is a description\nusing multiple lines")
        );
    }

    #[test]
    fn comments_are_ignored() {
        let db = parse_db("%% leading\ngitGraph\n  %% a comment\ncommit %% trailing\n");
        assert_eq!(db.commits().len(), 1);
    }

    #[test]
    fn syntax_errors_point_at_the_line() {
        let err = parse_into("gitGraph\ncommit\nrebase main\n", &mut Db::default()).unwrap_err();
        assert_eq!(err.message(), Some("Unknown statement: rebase"));
        assert_eq!(err.hash().unwrap().line, 3);

        let err = parse_into("gitGraph\ncommit type: SQUASH\n", &mut Db::default()).unwrap_err();
        assert_eq!(err.message(), Some("Unknown commit type: SQUASH"));

        assert!(parse("graph TD\n").is_err());
    }

    #[test]
    fn should_work_with_unsafe_properties_as_ids_and_branch_names() {
        for prop in ["__proto__", "constructor"] {
            let db = parse_db(&format!(
                "gitGraph\ncommit id:\"{prop}\"\nbranch {prop}\ncheckout {prop}\ncommit\ncheckout main\nmerge {prop}\n"
            ));
            assert_eq!(db.commits().len(), 3);
            assert_eq!(db.commits()[0].id, prop);
            assert_eq!(db.current_branch(), "main");
        }
    }
}
