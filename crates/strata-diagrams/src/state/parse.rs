use strata::RankDir;
use tracing::{debug, debug_span};

use super::{DIAGRAM_TYPE, Db, Note, NotePosition, StateType};
use crate::source::{Accessibility, Source, accessibility, keyword, keyword_ci};
use crate::{Error, ParseHash, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct StateStmt {
    pub id: String,
    pub state_type: StateType,
    pub description: Option<String>,
    pub classes: Vec<String>,
    /// Body of a composite state.
    pub doc: Option<Vec<(usize, Stmt)>>,
}

impl StateStmt {
    fn new(id: String) -> Self {
        Self {
            id,
            state_type: StateType::Default,
            description: None,
            classes: Vec::new(),
            doc: None,
        }
    }
}

/// One end of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRef {
    pub id: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    State(StateStmt),
    Relation {
        from: StateRef,
        to: StateRef,
        label: Option<String>,
    },
    Note {
        id: String,
        note: Note,
    },
    Divider,
    Direction(RankDir),
    ClassDef {
        id: String,
        styles: String,
    },
    Class {
        ids: String,
        class: String,
    },
    Style {
        ids: String,
        styles: String,
    },
    AccTitle(String),
    AccDescr(String),
}

pub fn parse_into(text: &str, db: &mut Db) -> Result<()> {
    let _span = debug_span!("parse", diagram = DIAGRAM_TYPE).entered();
    let doc = parse(text)?;
    db.apply_document(doc);
    Ok(())
}

/// Parses a state diagram. The `stateDiagram`/`stateDiagram-v2` header is optional.
pub fn parse(text: &str) -> Result<Vec<(usize, Stmt)>> {
    let mut parser = Parser {
        src: Source::new(text),
        pending: None,
    };
    if let Some((line_no, line)) = parser.next() {
        if !is_header(line) {
            parser.pending = Some((line_no, line));
        }
    }
    parser.parse_doc(None)
}

fn is_header(line: &str) -> bool {
    keyword(line, "stateDiagram").is_some() || keyword(line, "stateDiagram-v2").is_some()
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

struct Parser<'a> {
    src: Source<'a>,
    pending: Option<(usize, &'a str)>,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Option<(usize, &'a str)> {
        self.pending.take().or_else(|| self.src.next_statement())
    }

    /// Statements up to the end of input, or up to the `}` closing `composite`.
    fn parse_doc(&mut self, composite: Option<(usize, &str)>) -> Result<Vec<(usize, Stmt)>> {
        let mut doc = Vec::new();
        loop {
            let Some((line_no, line)) = self.next() else {
                return match composite {
                    Some((open, id)) => Err(error(
                        open,
                        id,
                        format!("composite state {id} is never closed"),
                        ["}"],
                    )),
                    None => Ok(doc),
                };
            };
            if line == "}" {
                if composite.is_some() {
                    return Ok(doc);
                }
                return Err(error(line_no, line, "unexpected '}'", ["state", "ID"]));
            }
            if let Some(stmt) = self.parse_line(line_no, line)? {
                doc.push((line_no, stmt));
            }
        }
    }

    fn parse_line(&mut self, line_no: usize, line: &'a str) -> Result<Option<Stmt>> {
        if line == "--" {
            return Ok(Some(Stmt::Divider));
        }
        if let Some(acc) = accessibility(DIAGRAM_TYPE, line, &mut self.src)? {
            return Ok(Some(match acc {
                Accessibility::Title(t) => Stmt::AccTitle(t),
                Accessibility::Descr(d) => Stmt::AccDescr(d),
            }));
        }
        if let Some(rest) = keyword(line, "direction") {
            return match parse_direction(rest) {
                Some(d) => Ok(Some(Stmt::Direction(d))),
                None => Err(error(
                    line_no,
                    line,
                    format!("invalid direction: {rest}"),
                    ["TB", "BT", "LR", "RL"],
                )),
            };
        }
        if let Some(rest) = keyword(line, "classDef") {
            let Some((id, styles)) = rest.split_once(char::is_whitespace) else {
                return Err(error(line_no, line, "classDef needs a name and styles", ["STYLE_OPTS"]));
            };
            return Ok(Some(Stmt::ClassDef {
                id: id.to_string(),
                styles: styles.trim().to_string(),
            }));
        }
        if let Some(rest) = keyword(line, "class") {
            let Some((ids, class)) = rest.rsplit_once(char::is_whitespace) else {
                return Err(error(line_no, line, "class needs state ids and a class name", ["CLASSENTITY_IDS"]));
            };
            return Ok(Some(Stmt::Class {
                ids: ids.trim().to_string(),
                class: class.to_string(),
            }));
        }
        if let Some(rest) = keyword(line, "style") {
            let Some((ids, styles)) = rest.split_once(char::is_whitespace) else {
                return Err(error(line_no, line, "style needs state ids and styles", ["STYLEDEF_STYLEOPTS"]));
            };
            return Ok(Some(Stmt::Style {
                ids: ids.to_string(),
                styles: styles.trim().to_string(),
            }));
        }
        if keyword_ci(line, "hide empty description").is_some() || keyword_ci(line, "scale").is_some() {
            debug!(line, "presentation hint ignored");
            return Ok(None);
        }
        if let Some(rest) = keyword(line, "note") {
            return self.parse_note(line_no, line, rest);
        }
        if let Some(rest) = keyword(line, "state") {
            return self.parse_state(line_no, line, rest).map(|s| Some(Stmt::State(s)));
        }
        if let Some((lhs, rhs)) = line.split_once("-->") {
            let from = state_ref(line_no, line, lhs)?;
            let (target, label) = split_description(rhs);
            let to = state_ref(line_no, line, target)?;
            return Ok(Some(Stmt::Relation {
                from,
                to,
                label: label.map(str::to_string),
            }));
        }

        let (target, description) = split_description(line);
        let r = state_ref(line_no, line, target)?;
        Ok(Some(Stmt::State(StateStmt {
            description: description.map(str::to_string),
            classes: r.classes,
            ..StateStmt::new(r.id)
        })))
    }

    fn parse_state(&mut self, line_no: usize, line: &'a str, rest: &'a str) -> Result<StateStmt> {
        let (body, composite) = match rest.strip_suffix('{') {
            Some(body) => (body.trim(), true),
            None => (rest, false),
        };

        let mut description = None;
        let mut id_part = body;
        if let Some(quoted) = body.strip_prefix('"') {
            let Some((descr, after)) = quoted.split_once('"') else {
                return Err(error(line_no, line, "unterminated state description", ["\""]));
            };
            let Some(id) = keyword(after.trim(), "as") else {
                return Err(error(line_no, line, "expected 'as' after state description", ["as"]));
            };
            description = Some(descr.to_string());
            id_part = id;
        }

        let mut state_type = StateType::Default;
        if let Some(start) = id_part.find("<<") {
            let annotation = id_part[start + 2..].trim_end().trim_end_matches(">>").trim();
            state_type = StateType::from_annotation(annotation).ok_or_else(|| {
                error(
                    line_no,
                    line,
                    format!("unknown state annotation: <<{annotation}>>"),
                    ["<<fork>>", "<<join>>", "<<choice>>"],
                )
            })?;
            id_part = id_part[..start].trim();
        }

        let (target, inline_descr) = split_description(id_part);
        if inline_descr.is_some() {
            description = inline_descr.map(str::to_string);
        }
        let r = state_ref(line_no, line, target)?;
        let doc = if composite {
            Some(self.parse_doc(Some((line_no, r.id.as_str())))?)
        } else {
            None
        };
        Ok(StateStmt {
            id: r.id,
            state_type,
            description,
            classes: r.classes,
            doc,
        })
    }

    /// `note left of X : text` or a block ending with `end note`. Floating notes (`note "..." as
    /// N`) are accepted and dropped.
    fn parse_note(&mut self, line_no: usize, line: &'a str, rest: &'a str) -> Result<Option<Stmt>> {
        if rest.starts_with('"') {
            debug!(line, "floating note ignored");
            return Ok(None);
        }
        let (position, target) = if let Some(t) = keyword_ci(rest, "left of") {
            (NotePosition::LeftOf, t)
        } else if let Some(t) = keyword_ci(rest, "right of") {
            (NotePosition::RightOf, t)
        } else {
            return Err(error(
                line_no,
                line,
                "expected note position",
                ["left of", "right of"],
            ));
        };

        if let Some((id, text)) = target.split_once(':') {
            return Ok(Some(Stmt::Note {
                id: ident(line_no, line, id.trim())?,
                note: Note {
                    position,
                    text: text.trim().to_string(),
                },
            }));
        }

        let id = ident(line_no, line, target.trim())?;
        let mut lines: Vec<&str> = Vec::new();
        while let Some((_, raw)) = self.src.next_raw() {
            if raw.eq_ignore_ascii_case("end note") {
                while lines.last().is_some_and(|l| l.is_empty()) {
                    lines.pop();
                }
                let start = lines.iter().take_while(|l| l.is_empty()).count();
                return Ok(Some(Stmt::Note {
                    id,
                    note: Note {
                        position,
                        text: lines[start..].join("\n"),
                    },
                }));
            }
            lines.push(raw);
        }
        Err(error(line_no, line, "note block is never closed", ["end note"]))
    }
}

fn parse_direction(s: &str) -> Option<RankDir> {
    match s.trim() {
        "TB" | "TD" => Some(RankDir::TB),
        "BT" => Some(RankDir::BT),
        "LR" => Some(RankDir::LR),
        "RL" => Some(RankDir::RL),
        _ => None,
    }
}

/// Splits `id : description` at the first `:` that is not part of a `:::class` suffix.
fn split_description(s: &str) -> (&str, Option<&str>) {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if s[i..].starts_with(":::") {
            i += 3;
            continue;
        }
        if bytes[i] == b':' {
            return (s[..i].trim(), Some(s[i + 1..].trim()));
        }
        i += 1;
    }
    (s.trim(), None)
}

/// `id`, `id:::class`, or `[*]`.
fn state_ref(line_no: usize, line: &str, s: &str) -> Result<StateRef> {
    let mut parts = s.trim().split(":::");
    let id = ident(line_no, line, parts.next().unwrap_or_default().trim())?;
    let classes = parts
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    Ok(StateRef { id, classes })
}

fn ident(line_no: usize, line: &str, s: &str) -> Result<String> {
    if s.is_empty() || s.contains(char::is_whitespace) {
        return Err(error(
            line_no,
            line,
            format!("invalid state id: '{s}'"),
            ["ID", "[*]"],
        ));
    }
    Ok(s.to_string())
}
