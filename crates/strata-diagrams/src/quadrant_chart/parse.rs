use super::{DIAGRAM_TYPE, Db};
use crate::source::{self, Accessibility, Source, keyword_ci};
use crate::{Error, ParseHash, Result};
use tracing::debug_span;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Title(String),
    XAxis { left: String, right: Option<String> },
    YAxis { bottom: String, top: Option<String> },
    Quadrant { n: usize, text: String },
    ClassDef { name: String, styles: Vec<String> },
    Point {
        text: String,
        class_name: Option<String>,
        x: f64,
        y: f64,
        styles: Vec<String>,
    },
    AccTitle(String),
    AccDescr(String),
}

/// Appended to the lone axis label of `x-axis low -->`.
const AXIS_ARROW: &str = " ⟶";

/// Parses `text` and applies every statement to `db`.
pub fn parse_into(text: &str, db: &mut Db) -> Result<()> {
    for (line, stmt) in parse(text)? {
        db.apply(stmt).map_err(|e| e.at_line(line))?;
    }
    Ok(())
}

pub fn parse(text: &str) -> Result<Vec<(usize, Stmt)>> {
    let _span = debug_span!("parse", diagram = DIAGRAM_TYPE).entered();
    let mut src = Source::new(text);
    let mut out = Vec::new();
    let mut saw_header = false;

    while let Some((line_no, line)) = src.next_statement() {
        if saw_header {
            match source::accessibility(DIAGRAM_TYPE, line, &mut src)? {
                Some(Accessibility::Title(t)) => {
                    out.push((line_no, Stmt::AccTitle(t)));
                    continue;
                }
                Some(Accessibility::Descr(d)) => {
                    out.push((line_no, Stmt::AccDescr(d)));
                    continue;
                }
                None => {}
            }
        }
        for stmt in split_semicolons(line) {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            if !saw_header {
                if !stmt.eq_ignore_ascii_case(DIAGRAM_TYPE) {
                    return Err(Error::parse(
                        DIAGRAM_TYPE,
                        "expected quadrantChart",
                        ParseHash::at(line_no, stmt).expecting([DIAGRAM_TYPE]),
                    ));
                }
                saw_header = true;
                continue;
            }
            out.push((line_no, parse_statement(line_no, stmt)?));
        }
    }

    if !saw_header {
        return Err(Error::parse(
            DIAGRAM_TYPE,
            "expected quadrantChart",
            ParseHash::at(src.line(), "").expecting([DIAGRAM_TYPE]),
        ));
    }
    Ok(out)
}

fn parse_statement(line_no: usize, stmt: &str) -> Result<Stmt> {
    let err = |message: String| Error::parse(DIAGRAM_TYPE, message, ParseHash::at(line_no, stmt));

    if let Some(rest) = keyword_ci(stmt, "title") {
        return Ok(Stmt::Title(rest.to_string()));
    }
    if let Some(rest) = keyword_ci(stmt, "x-axis") {
        let (left, right) = parse_axis(rest).map_err(err)?;
        return Ok(Stmt::XAxis { left, right });
    }
    if let Some(rest) = keyword_ci(stmt, "y-axis") {
        let (bottom, top) = parse_axis(rest).map_err(err)?;
        return Ok(Stmt::YAxis { bottom, top });
    }
    for n in 1..=4 {
        if let Some(rest) = keyword_ci(stmt, &format!("quadrant-{n}")) {
            return Ok(Stmt::Quadrant {
                n,
                text: text_value(rest).map_err(err)?,
            });
        }
    }
    if let Some(rest) = keyword_ci(stmt, "classDef") {
        let (name, styles) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if name.is_empty() {
            return Err(err("expected classDef name".to_string()));
        }
        return Ok(Stmt::ClassDef {
            name: name.to_string(),
            styles: style_list(styles),
        });
    }
    if let Some(point) = parse_point(stmt).map_err(err)? {
        return Ok(point);
    }
    Err(Error::parse(
        DIAGRAM_TYPE,
        format!("Unrecognized statement: {stmt}"),
        ParseHash::at(line_no, stmt).expecting([
            "title", "x-axis", "y-axis", "quadrant-1", "quadrant-2", "quadrant-3", "quadrant-4",
            "classDef", "POINT",
        ]),
    ))
}

/// `low --> high`, `low -->` or just `low`.
fn parse_axis(rest: &str) -> std::result::Result<(String, Option<String>), String> {
    let Some((start, end)) = find_outside_quotes(rest, axis_arrow_len) else {
        return Ok((text_value(rest)?, None));
    };
    let mut low = text_value(&rest[..start])?;
    let high = rest[end..].trim();
    if high.is_empty() {
        low.push_str(AXIS_ARROW);
        return Ok((low, None));
    }
    Ok((low, Some(text_value(high)?)))
}

/// Length of a `-->` (two or more dashes then `>`) at the start of `s`.
fn axis_arrow_len(s: &str) -> Option<usize> {
    let dashes = s.bytes().take_while(|b| *b == b'-').count();
    (dashes >= 2 && s.as_bytes().get(dashes) == Some(&b'>')).then_some(dashes + 1)
}

/// First match of `matcher` outside double quotes, as a byte range.
fn find_outside_quotes(s: &str, matcher: impl Fn(&str) -> Option<usize>) -> Option<(usize, usize)> {
    let mut in_quotes = false;
    for (i, c) in s.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if !in_quotes {
            if let Some(len) = matcher(&s[i..]) {
                return Some((i, i + len));
            }
        }
    }
    None
}

/// Plain text, `"quoted"` text, or a `"`markdown`"` string.
fn text_value(raw: &str) -> std::result::Result<String, String> {
    let t = raw.trim();
    if let Some(inner) = t.strip_prefix("\"`") {
        return inner
            .strip_suffix("`\"")
            .map(str::to_string)
            .ok_or_else(|| "unterminated markdown string".to_string());
    }
    if let Some(inner) = t.strip_prefix('"') {
        return inner
            .strip_suffix('"')
            .map(str::to_string)
            .ok_or_else(|| "unterminated string".to_string());
    }
    Ok(t.to_string())
}

fn style_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `Label[:::class]: [x, y] [style, ...]`. `None` when the line has no `: [` at all.
fn parse_point(stmt: &str) -> std::result::Result<Option<Stmt>, String> {
    let colon = find_outside_quotes(stmt, |s| {
        let rest = s.strip_prefix(':')?;
        rest.trim_start().starts_with('[').then_some(1)
    });
    let Some((colon, _)) = colon else {
        return Ok(None);
    };
    let head = stmt[..colon].trim_end();
    let (label, class_name) = match head.rsplit_once(":::") {
        Some((label, class))
            if !class.is_empty()
                && class.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            (label, Some(class.to_string()))
        }
        _ => (head, None),
    };
    let text = text_value(label)?;

    let tail = stmt[colon + 1..].trim_start();
    let inner = tail.strip_prefix('[').unwrap_or(tail);
    let (coords, after) = inner
        .split_once(']')
        .ok_or_else(|| "unterminated point coordinate; missing ']'".to_string())?;
    let mut xy = coords.split(',').map(str::trim);
    let x = coordinate(xy.next().unwrap_or(""))?;
    let y = coordinate(xy.next().unwrap_or(""))?;
    if xy.next().is_some() {
        return Err(format!("invalid point coordinate [{coords}]"));
    }
    Ok(Some(Stmt::Point {
        text,
        class_name,
        x,
        y,
        styles: style_list(after),
    }))
}

fn coordinate(raw: &str) -> std::result::Result<f64, String> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid point coordinate '{raw}'"))
}

fn split_semicolons(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                out.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&line[start..]);
    out
}
