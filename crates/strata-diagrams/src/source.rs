//! Line-oriented scanning shared by the hand-written diagram parsers.

use crate::{Error, ParseHash, Result};

/// Cursor over the lines of a diagram source.
pub(crate) struct Source<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Source<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    /// 1-based number of the line most recently returned.
    pub(crate) fn line(&self) -> usize {
        self.pos
    }

    /// Next line verbatim (trimmed), including blank and comment lines.
    pub(crate) fn next_raw(&mut self) -> Option<(usize, &'a str)> {
        let line = self.lines.get(self.pos)?;
        self.pos += 1;
        Some((self.pos, line.trim()))
    }

    /// Next line with content: blank lines and `%%` comments are skipped and trailing comments
    /// outside quotes are cut off.
    pub(crate) fn next_statement(&mut self) -> Option<(usize, &'a str)> {
        while let Some((n, line)) = self.next_raw() {
            let line = strip_comment(line).trim();
            if !line.is_empty() {
                return Some((n, line));
            }
        }
        None
    }
}

/// Cuts `line` at the first `%%` outside double quotes.
pub(crate) fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_quotes = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => in_quotes = !in_quotes,
            b'%' if !in_quotes && bytes.get(i + 1) == Some(&b'%') => return &line[..i],
            _ => {}
        }
        i += 1;
    }
    line
}

/// If `line` starts with `keyword` as a whole word, the rest of the line (trimmed).
pub(crate) fn keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        _ => None,
    }
}

/// [`keyword`] ignoring ASCII case.
pub(crate) fn keyword_ci<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &line[keyword.len()..];
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        _ => None,
    }
}

pub(crate) enum Accessibility {
    Title(String),
    Descr(String),
}

/// Parses `accTitle: ...`, `accDescr: ...` and the multi-line `accDescr { ... }` form.
pub(crate) fn accessibility(
    diagram_type: &str,
    line: &str,
    src: &mut Source<'_>,
) -> Result<Option<Accessibility>> {
    if let Some(rest) = line.strip_prefix("accTitle") {
        let Some(value) = rest.trim_start().strip_prefix(':') else {
            return Ok(None);
        };
        return Ok(Some(Accessibility::Title(value.trim().to_string())));
    }
    let Some(rest) = line.strip_prefix("accDescr") else {
        return Ok(None);
    };
    let rest = rest.trim_start();
    if let Some(value) = rest.strip_prefix(':') {
        return Ok(Some(Accessibility::Descr(value.trim().to_string())));
    }
    let Some(body) = rest.strip_prefix('{') else {
        return Ok(None);
    };
    if let Some(end) = body.find('}') {
        return Ok(Some(Accessibility::Descr(body[..end].trim().to_string())));
    }

    let start = src.line();
    let mut lines: Vec<&str> = Vec::new();
    if !body.trim().is_empty() {
        lines.push(body.trim());
    }
    while let Some((_, raw)) = src.next_raw() {
        if let Some(end) = raw.find('}') {
            let last = raw[..end].trim();
            if !last.is_empty() {
                lines.push(last);
            }
            return Ok(Some(Accessibility::Descr(lines.join("\n"))));
        }
        lines.push(raw);
    }
    Err(Error::parse(
        diagram_type,
        "unterminated accDescr block",
        ParseHash::at(start, line).expecting(["}"]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_statement_skips_blank_and_comment_lines() {
        let mut src = Source::new("a\n\n  %% note\n b %% trailing\n");
        assert_eq!(src.next_statement(), Some((1, "a")));
        assert_eq!(src.next_statement(), Some((4, "b")));
        assert_eq!(src.next_statement(), None);
    }

    #[test]
    fn comments_inside_quotes_survive() {
        assert_eq!(strip_comment(r#"commit msg: "50%% done" %% x"#), r#"commit msg: "50%% done" "#);
    }

    #[test]
    fn keywords_match_whole_words() {
        assert_eq!(keyword("state A", "state"), Some("A"));
        assert_eq!(keyword("stateA", "state"), None);
        assert_eq!(keyword_ci("TITLE hello", "title"), Some("hello"));
    }

    #[test]
    fn multi_line_acc_descr() {
        let mut src = Source::new("accDescr {\nfirst\n  second\n}\n");
        let (_, line) = src.next_statement().unwrap();
        match accessibility("test", line, &mut src).unwrap() {
            Some(Accessibility::Descr(d)) => assert_eq!(d, "first\nsecond"),
            _ => panic!("expected a description"),
        }
    }

    #[test]
    fn unterminated_acc_descr_is_an_error() {
        let mut src = Source::new("accDescr {\nfirst\n");
        let (_, line) = src.next_statement().unwrap();
        let err = accessibility("test", line, &mut src).err().unwrap();
        assert_eq!(err.hash().unwrap().line, 1);
    }
}
