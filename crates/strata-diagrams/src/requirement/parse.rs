use strata::RankDir;
use tracing::debug_span;

use super::{DIAGRAM_TYPE, Db, RelationshipKind, RequirementKind, Risk, VerifyMethod};
use crate::source::{self, Accessibility, Source, keyword_ci};
use crate::{Error, ParseHash, Result};

/// Fields of a `requirement name { ... }` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementBody {
    pub id: String,
    pub text: String,
    pub risk: Option<Risk>,
    pub verify_method: Option<VerifyMethod>,
}

/// Fields of an `element name { ... }` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementBody {
    pub element_type: String,
    pub doc_ref: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Direction(RankDir),
    Requirement {
        name: String,
        kind: RequirementKind,
        body: RequirementBody,
        classes: Vec<String>,
    },
    Element {
        name: String,
        body: ElementBody,
        classes: Vec<String>,
    },
    Relationship {
        kind: RelationshipKind,
        src: String,
        dst: String,
    },
    Style { ids: Vec<String>, styles: Vec<String> },
    ClassDef { ids: Vec<String>, styles: Vec<String> },
    Class { ids: Vec<String>, classes: Vec<String> },
    AccTitle(String),
    AccDescr(String),
}

/// Parses `text` and applies every statement to `db`.
pub fn parse_into(text: &str, db: &mut Db) -> Result<()> {
    for (_, stmt) in parse(text)? {
        db.apply(stmt);
    }
    Ok(())
}

pub fn parse(text: &str) -> Result<Vec<(usize, Stmt)>> {
    let _span = debug_span!("parse", diagram = DIAGRAM_TYPE).entered();
    let mut src = Source::new(text);
    let mut out = Vec::new();

    match src.next_statement() {
        Some((_, line)) if line.eq_ignore_ascii_case("requirementDiagram") => {}
        Some((n, line)) => {
            return Err(Error::parse(
                DIAGRAM_TYPE,
                "expected requirementDiagram",
                ParseHash::at(n, line).expecting(["requirementDiagram"]),
            ));
        }
        None => {
            return Err(Error::parse(
                DIAGRAM_TYPE,
                "expected requirementDiagram",
                ParseHash::at(0, "").expecting(["requirementDiagram"]),
            ));
        }
    }

    while let Some((n, line)) = src.next_statement() {
        let stmt = parse_line(&mut src, n, line)?;
        out.push((n, stmt));
    }
    Ok(out)
}

fn error(line: usize, text: &str, message: impl Into<String>) -> Error {
    Error::parse(DIAGRAM_TYPE, message, ParseHash::at(line, text))
}

fn parse_line(src: &mut Source<'_>, n: usize, line: &str) -> Result<Stmt> {
    match source::accessibility(DIAGRAM_TYPE, line, src)? {
        Some(Accessibility::Title(t)) => return Ok(Stmt::AccTitle(t)),
        Some(Accessibility::Descr(d)) => return Ok(Stmt::AccDescr(d)),
        None => {}
    }

    if let Some(rest) = keyword_ci(line, "direction") {
        return parse_direction(rest)
            .map(Stmt::Direction)
            .ok_or_else(|| {
                Error::parse(
                    DIAGRAM_TYPE,
                    format!("invalid direction: {rest}"),
                    ParseHash::at(n, line).expecting(["TB", "BT", "LR", "RL"]),
                )
            });
    }

    if let Some(head) = line.strip_suffix('{') {
        let head = head.trim_end();
        let (keyword, rest) = head.split_once(char::is_whitespace).unwrap_or((head, ""));
        if let Some(kind) = RequirementKind::from_keyword(keyword) {
            let (name, classes) = name_and_classes(n, line, rest)?;
            let body = requirement_body(src, n)?;
            return Ok(Stmt::Requirement {
                name,
                kind,
                body,
                classes,
            });
        }
        if keyword.eq_ignore_ascii_case("element") {
            let (name, classes) = name_and_classes(n, line, rest)?;
            let body = element_body(src, n)?;
            return Ok(Stmt::Element {
                name,
                body,
                classes,
            });
        }
    }

    if let Some(rest) = keyword_ci(line, "style") {
        let (ids, styles) = id_list(rest).map_err(|m| error(n, line, m))?;
        let styles = csv(styles);
        if ids.is_empty() || styles.is_empty() {
            return Err(error(n, line, format!("invalid style statement: {line}")));
        }
        return Ok(Stmt::Style { ids, styles });
    }
    if let Some(rest) = keyword_ci(line, "classDef") {
        let (ids, styles) = id_list(rest).map_err(|m| error(n, line, m))?;
        let styles = csv(styles);
        if ids.is_empty() || styles.is_empty() {
            return Err(error(n, line, format!("invalid classDef statement: {line}")));
        }
        return Ok(Stmt::ClassDef { ids, styles });
    }
    if let Some(rest) = keyword_ci(line, "class") {
        let (ids, classes) = id_list(rest).map_err(|m| error(n, line, m))?;
        let classes = csv(classes);
        if ids.is_empty() || classes.is_empty() {
            return Err(error(n, line, format!("invalid class statement: {line}")));
        }
        return Ok(Stmt::Class { ids, classes });
    }

    if let Some(stmt) = parse_relationship(n, line)? {
        return Ok(stmt);
    }

    if let Some((target, classes)) = line.split_once(":::") {
        let target = value(n, line, target)?;
        let classes = csv(classes);
        if target.is_empty() || classes.is_empty() {
            return Err(error(n, line, format!("invalid class shorthand statement: {line}")));
        }
        return Ok(Stmt::Class {
            ids: vec![target],
            classes,
        });
    }

    Err(Error::parse(
        DIAGRAM_TYPE,
        format!("unexpected requirement statement: {line}"),
        ParseHash::at(n, line).expecting([
            "requirement",
            "element",
            "direction",
            "style",
            "classDef",
            "class",
            "RELATIONSHIP",
        ]),
    ))
}

fn parse_direction(s: &str) -> Option<RankDir> {
    match s.trim().to_ascii_uppercase().as_str() {
        "TB" | "TD" => Some(RankDir::TB),
        "BT" => Some(RankDir::BT),
        "LR" => Some(RankDir::LR),
        "RL" => Some(RankDir::RL),
        _ => None,
    }
}

/// `name`, `"quoted name"`, optionally followed by `:::c1,c2`.
fn name_and_classes(n: usize, line: &str, rest: &str) -> Result<(String, Vec<String>)> {
    let (name, classes) = match rest.split_once(":::") {
        Some((name, classes)) => (name, csv(classes)),
        None => (rest, Vec::new()),
    };
    let name = value(n, line, name)?;
    if name.is_empty() {
        return Err(error(n, line, "requirement or element name is empty"));
    }
    Ok((name, classes))
}

/// A bare or double-quoted value; nothing may follow the closing quote.
fn value(n: usize, line: &str, raw: &str) -> Result<String> {
    let raw = raw.trim();
    let Some(quoted) = raw.strip_prefix('"') else {
        return Ok(raw.to_string());
    };
    let Some((inner, rest)) = quoted.split_once('"') else {
        return Err(error(n, line, "unterminated string"));
    };
    if !rest.trim().is_empty() {
        return Err(error(
            n,
            line,
            format!("unexpected trailing tokens after string: {}", rest.trim()),
        ));
    }
    Ok(inner.trim().to_string())
}

/// Reads `key: value` lines up to the closing `}`.
fn block_fields<'a>(src: &mut Source<'a>, open: usize) -> Result<Vec<(usize, &'a str, &'a str, &'a str)>> {
    let mut fields = Vec::new();
    while let Some((n, line)) = src.next_statement() {
        if line == "}" {
            return Ok(fields);
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(Error::parse(
                DIAGRAM_TYPE,
                format!("invalid block line: {line}"),
                ParseHash::at(n, line).expecting(["}"]),
            ));
        };
        fields.push((n, line, key.trim(), value.trim()));
    }
    Err(Error::parse(
        DIAGRAM_TYPE,
        "unterminated block",
        ParseHash::at(open, "{").expecting(["}"]),
    ))
}

fn requirement_body(src: &mut Source<'_>, open: usize) -> Result<RequirementBody> {
    let mut body = RequirementBody::default();
    for (n, line, key, raw) in block_fields(src, open)? {
        let v = value(n, line, raw)?;
        match key.to_ascii_lowercase().as_str() {
            "id" => body.id = v,
            "text" => body.text = v,
            "risk" => {
                body.risk = Some(
                    Risk::parse(&v).ok_or_else(|| error(n, line, format!("invalid risk level: {v}")))?,
                );
            }
            "verifymethod" => {
                body.verify_method = Some(
                    VerifyMethod::parse(&v)
                        .ok_or_else(|| error(n, line, format!("invalid verify method: {v}")))?,
                );
            }
            _ => {
                return Err(Error::parse(
                    DIAGRAM_TYPE,
                    format!("unexpected requirement body key: {key}"),
                    ParseHash::at(n, line).expecting(["id", "text", "risk", "verifymethod"]),
                ));
            }
        }
    }
    Ok(body)
}

fn element_body(src: &mut Source<'_>, open: usize) -> Result<ElementBody> {
    let mut body = ElementBody::default();
    for (n, line, key, raw) in block_fields(src, open)? {
        let v = value(n, line, raw)?;
        match key.to_ascii_lowercase().as_str() {
            "type" => body.element_type = v,
            "docref" => body.doc_ref = v,
            _ => {
                return Err(Error::parse(
                    DIAGRAM_TYPE,
                    format!("unexpected element body key: {key}"),
                    ParseHash::at(n, line).expecting(["type", "docref"]),
                ));
            }
        }
    }
    Ok(body)
}

/// `a - kind -> b` or `a <- kind - b`. `None` when the line has neither arrow.
fn parse_relationship(n: usize, line: &str) -> Result<Option<Stmt>> {
    let (src, kind, dst) = if let Some((left, rest)) = line.split_once("<-") {
        let Some((kind, right)) = rest.split_once('-') else {
            return Err(error(n, line, format!("invalid relationship statement: {line}")));
        };
        (right, kind, left)
    } else if let Some((left, right)) = line.split_once("->") {
        let Some((src, kind)) = left.split_once('-') else {
            return Err(error(n, line, format!("invalid relationship statement: {line}")));
        };
        (src, kind, right)
    } else {
        return Ok(None);
    };
    let Some(kind) = RelationshipKind::parse(kind) else {
        return Err(Error::parse(
            DIAGRAM_TYPE,
            format!("unknown relationship type: {}", kind.trim()),
            ParseHash::at(n, line).expecting([
                "contains",
                "copies",
                "derives",
                "satisfies",
                "verifies",
                "refines",
                "traces",
            ]),
        ));
    };
    Ok(Some(Stmt::Relationship {
        kind,
        src: value(n, line, src)?,
        dst: value(n, line, dst)?,
    }))
}

/// Leading comma-separated ids (bare or quoted) and whatever follows them.
fn id_list(input: &str) -> std::result::Result<(Vec<String>, &str), String> {
    let mut ids = Vec::new();
    let mut cur = input.trim_start();
    while !cur.is_empty() {
        let (id, rest) = if let Some(quoted) = cur.strip_prefix('"') {
            quoted
                .split_once('"')
                .ok_or_else(|| "unterminated string".to_string())?
        } else {
            let end = cur
                .find(|c: char| c == ',' || c.is_whitespace())
                .unwrap_or(cur.len());
            cur.split_at(end)
        };
        ids.push(id.to_string());
        cur = rest.trim_start();
        match cur.strip_prefix(',') {
            Some(next) => cur = next.trim_start(),
            None => break,
        }
    }
    Ok((ids, cur))
}

fn csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
