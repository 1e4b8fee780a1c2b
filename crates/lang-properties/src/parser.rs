//! Parser for `.properties` files.
//!
//! Produces a `FILE > PROPERTIES_LIST > (PROPERTY | COMMENT)*` element tree.
//! Keys and values are unescaped; continuation lines are joined.

use crate::model::{ATTR_KEY, ATTR_TEXT, ATTR_VALUE, COMMENT, FILE, PROPERTIES_LIST, PROPERTY};
use stubdex_api::models::{Element, TextRange};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

pub fn parse(source: &str) -> Result<Element, ParseError> {
    let whole = TextRange::new(0, source.len() as u32);
    let mut list = Element::new(PROPERTIES_LIST).with_range(whole);

    let lines = physical_lines(source);
    let mut i = 0;
    while i < lines.len() {
        let (offset, raw) = lines[i];
        let line_no = i + 1;
        i += 1;

        let trimmed = raw.trim_start_matches(is_blank);
        if trimmed.is_empty() {
            continue;
        }
        let start = offset + (raw.len() - trimmed.len());

        if trimmed.starts_with('#') || trimmed.starts_with('!') {
            let range = TextRange::new(start as u32, (offset + raw.len()) as u32);
            list.push_child(
                Element::new(COMMENT)
                    .with_range(range)
                    .with_attr(ATTR_TEXT, trimmed[1..].trim()),
            );
            continue;
        }

        let mut logical = String::new();
        let mut current = trimmed;
        let mut end = offset + raw.len();
        loop {
            if !has_continuation(current) {
                logical.push_str(current);
                break;
            }
            logical.push_str(&current[..current.len() - 1]);
            let Some(&(next_offset, next_raw)) = lines.get(i) else {
                break;
            };
            i += 1;
            current = next_raw.trim_start_matches(is_blank);
            end = next_offset + next_raw.len();
        }

        let (key, value) = split_entry(&logical, line_no)?;
        list.push_child(
            Element::new(PROPERTY)
                .with_range(TextRange::new(start as u32, end as u32))
                .with_attr(ATTR_KEY, key)
                .with_attr(ATTR_VALUE, value),
        );
    }

    Ok(Element::new(FILE).with_range(whole).with_child(list))
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// `(byte offset, line without terminator)` for each physical line.
fn physical_lines(source: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut offset = 0;
    for piece in source.split_inclusive('\n') {
        out.push((offset, piece.trim_end_matches(|c| c == '\n' || c == '\r')));
        offset += piece.len();
    }
    out
}

/// An odd number of trailing backslashes continues the line.
fn has_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(logical: &str, line: usize) -> Result<(String, String), ParseError> {
    let mut key_end = logical.len();
    let mut escaped = false;
    for (idx, c) in logical.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = idx;
                break;
            }
            c if is_blank(c) => {
                key_end = idx;
                break;
            }
            _ => {}
        }
    }

    let raw_key = &logical[..key_end];
    let mut rest = logical[key_end..].trim_start_matches(is_blank);
    if let Some(stripped) = rest.strip_prefix('=').or_else(|| rest.strip_prefix(':')) {
        rest = stripped.trim_start_matches(is_blank);
    }

    Ok((unescape(raw_key, line)?, unescape(rest, line)?))
}

fn unescape(s: &str, line: usize) -> Result<String, ParseError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let unit = read_unit(&mut chars, line)?;
                let decoded = if (0xD800..0xDC00).contains(&unit) {
                    // High surrogate: the low half must follow as another escape.
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(ParseError::new(line, "unpaired surrogate escape"));
                    }
                    let low = read_unit(&mut chars, line)?;
                    char::decode_utf16([unit, low]).next().and_then(|r| r.ok())
                } else {
                    char::from_u32(unit as u32)
                };
                out.push(decoded.ok_or_else(|| ParseError::new(line, "invalid \\u escape"))?);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

fn read_unit(chars: &mut impl Iterator<Item = char>, line: usize) -> Result<u16, ParseError> {
    let hex: String = chars.take(4).collect();
    if hex.chars().count() != 4 {
        return Err(ParseError::new(line, "truncated \\u escape"));
    }
    u16::from_str_radix(&hex, 16)
        .map_err(|_| ParseError::new(line, format!("invalid \\u escape '{}'", hex)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(source: &str) -> Vec<(String, String)> {
        let file = parse(source).unwrap();
        file.children[0]
            .children
            .iter()
            .filter(|e| e.kind.as_str() == PROPERTY)
            .map(|e| {
                (
                    e.attr(ATTR_KEY).unwrap().to_string(),
                    e.attr(ATTR_VALUE).unwrap().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn separators() {
        assert_eq!(
            entries("a=1\nb : 2\nc 3\nd\n  e=  spaced value "),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "3".to_string()),
                ("d".to_string(), String::new()),
                ("e".to_string(), "spaced value ".to_string()),
            ]
        );
    }

    #[test]
    fn comments_are_kept_as_elements() {
        let file = parse("# header\n! other\nkey=value\n").unwrap();
        let list = &file.children[0];
        let kinds: Vec<_> = list.children.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec![COMMENT, COMMENT, PROPERTY]);
        assert_eq!(list.children[0].attr(ATTR_TEXT), Some("header"));
    }

    #[test]
    fn continuation_lines_are_joined() {
        let source = "list = a, \\\n       b, \\\n       c\nnext=1\n";
        assert_eq!(
            entries(source),
            vec![
                ("list".to_string(), "a, b, c".to_string()),
                ("next".to_string(), "1".to_string()),
            ]
        );
        let file = parse(source).unwrap();
        let range = file.children[0].children[0].range.unwrap();
        assert_eq!(&source[range.start as usize..range.end as usize], "list = a, \\\n       b, \\\n       c");
    }

    #[test]
    fn escapes() {
        assert_eq!(
            entries("my\\ key=tab\\there\nuni=\\u00e9\\uD83D\\uDE00\nslash=c:\\\\dir\\\\\n"),
            vec![
                ("my key".to_string(), "tab\there".to_string()),
                ("uni".to_string(), "é😀".to_string()),
                ("slash".to_string(), "c:\\dir\\".to_string()),
            ]
        );
    }

    #[test]
    fn bad_unicode_escape_is_an_error() {
        let err = parse("ok=1\nbad=\\u12G4\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(parse("lone=\\uD83D\n").is_err());
    }

    #[test]
    fn crlf_and_blank_lines() {
        assert_eq!(
            entries("\r\n  \r\na=1\r\nb=2"),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }
}
