//! Python-literal encoding for the collection columns of the cache.
//!
//! Lists are written the way Python's `repr` prints them (`['a', None]`) so
//! caches stay readable by the notebooks that consume them. The parser
//! accepts lists, tuples, sets (`{'a'}`, `set()`), either quote style, and
//! the common backslash escapes.

use std::collections::BTreeSet;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid literal at byte {position}: {message}")]
pub struct LiteralError {
    pub position: usize,
    pub message: String,
}

impl LiteralError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LiteralError>;

/// Quote a string like Python's `repr`.
pub fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Encode strings as a list literal: `['a', 'b']`.
pub fn encode_list<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let parts: Vec<String> = items.into_iter().map(repr_str).collect();
    format!("[{}]", parts.join(", "))
}

/// Encode optional strings as a list literal, absent values as `None`.
pub fn encode_optional_list(items: &[Option<String>]) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|item| match item {
            Some(s) => repr_str(s),
            None => "None".to_string(),
        })
        .collect();
    format!("[{}]", parts.join(", "))
}

/// Parse a collection literal whose elements may be `None`.
pub fn parse_optional_list(input: &str) -> Result<Vec<Option<String>>> {
    Parser::new(input).parse_collection()
}

/// Parse a collection literal of strings, rejecting `None` elements.
pub fn parse_list(input: &str) -> Result<Vec<String>> {
    parse_optional_list(input)?
        .into_iter()
        .enumerate()
        .map(|(i, item)| item.ok_or_else(|| LiteralError::new(0, format!("element {i} is None"))))
        .collect()
}

/// Parse a collection literal into a set of strings.
pub fn parse_set(input: &str) -> Result<BTreeSet<String>> {
    Ok(parse_list(input)?.into_iter().collect())
}

struct Parser<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn end(&self) -> usize {
        self.src.len()
    }

    fn expect_keyword(&mut self, start: usize, keyword: &str) -> Result<()> {
        for expected in keyword.chars() {
            match self.chars.next() {
                Some((_, c)) if c == expected => {}
                _ => return Err(LiteralError::new(start, format!("expected `{keyword}`"))),
            }
        }
        Ok(())
    }

    fn parse_collection(&mut self) -> Result<Vec<Option<String>>> {
        self.skip_ws();
        let close = match self.chars.next() {
            // Blank cells decode as empty collections.
            None => return Ok(Vec::new()),
            Some((_, '[')) => ']',
            Some((_, '(')) => ')',
            Some((_, '{')) => '}',
            Some((i, 's')) => {
                self.expect_keyword(i, "et()")?;
                self.finish()?;
                return Ok(Vec::new());
            }
            Some((i, c)) => {
                return Err(LiteralError::new(i, format!("expected a list, found {c:?}")));
            }
        };

        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.chars.peek().copied() {
                Some((_, c)) if c == close => {
                    self.chars.next();
                    break;
                }
                Some((_, '\'' | '"')) => items.push(Some(self.parse_string()?)),
                Some((i, 'N')) => {
                    self.expect_keyword(i, "None")?;
                    items.push(None);
                }
                Some((i, c)) => {
                    return Err(LiteralError::new(i, format!("unexpected character {c:?}")));
                }
                None => {
                    return Err(LiteralError::new(self.end(), format!("missing closing {close:?}")));
                }
            }

            self.skip_ws();
            match self.chars.next() {
                Some((_, ',')) => {}
                Some((_, c)) if c == close => break,
                Some((i, c)) => {
                    return Err(LiteralError::new(
                        i,
                        format!("expected ',' or {close:?}, found {c:?}"),
                    ));
                }
                None => {
                    return Err(LiteralError::new(self.end(), format!("missing closing {close:?}")));
                }
            }
        }

        self.finish()?;
        Ok(items)
    }

    fn finish(&mut self) -> Result<()> {
        self.skip_ws();
        match self.chars.next() {
            Some((i, c)) => Err(LiteralError::new(i, format!("trailing character {c:?}"))),
            None => Ok(()),
        }
    }

    fn parse_string(&mut self) -> Result<String> {
        let (start, quote) = match self.chars.next() {
            Some(pair) => pair,
            None => return Err(LiteralError::new(self.end(), "expected a string")),
        };
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err(LiteralError::new(start, "unterminated string")),
                Some((_, c)) if c == quote => return Ok(out),
                Some((i, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, '0')) => out.push('\0'),
                    Some((_, 'x')) => out.push(self.parse_hex(i, 2)?),
                    Some((_, 'u')) => out.push(self.parse_hex(i, 4)?),
                    Some((_, 'U')) => out.push(self.parse_hex(i, 8)?),
                    Some((_, c @ ('\\' | '\'' | '"'))) => out.push(c),
                    // Python keeps unknown escapes verbatim
                    Some((_, c)) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err(LiteralError::new(start, "unterminated string")),
                },
                Some((_, c)) => out.push(c),
            }
        }
    }

    fn parse_hex(&mut self, escape_at: usize, digits: usize) -> Result<char> {
        let mut value = 0u32;
        for _ in 0..digits {
            let digit = self
                .chars
                .next()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or_else(|| LiteralError::new(escape_at, "invalid hex escape"))?;
            value = value * 16 + digit;
        }
        char::from_u32(value).ok_or_else(|| LiteralError::new(escape_at, "invalid code point"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repr_matches_python() {
        assert_eq!(repr_str("rock"), "'rock'");
        assert_eq!(repr_str("Guns N' Roses"), "\"Guns N' Roses\"");
        assert_eq!(repr_str("say \"hi\""), "'say \"hi\"'");
        assert_eq!(repr_str("it's \"x\""), "'it\\'s \"x\"'");
        assert_eq!(repr_str("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_encode_lists() {
        assert_eq!(encode_list(["rock", "pop"]), "['rock', 'pop']");
        assert_eq!(encode_list(std::iter::empty::<&str>()), "[]");
        assert_eq!(
            encode_optional_list(&[Some("4Z8W".into()), None]),
            "['4Z8W', None]"
        );
    }

    #[test]
    fn test_round_trip_awkward_values() {
        let ids = vec![Some("6rqhFgbbKwnb9MLmUQDhG6".to_string()), None, Some("x'y\"z\\".to_string())];
        assert_eq!(parse_optional_list(&encode_optional_list(&ids)).unwrap(), ids);

        let names = vec!["Guns N' Roses".to_string(), "Sigur Rós".to_string(), "tab\there".to_string()];
        let encoded = encode_list(names.iter().map(String::as_str));
        assert_eq!(parse_list(&encoded).unwrap(), names);
    }

    #[test]
    fn test_parse_set_forms() {
        let expected: BTreeSet<String> = ["pop", "rock"].iter().map(|s| s.to_string()).collect();
        assert_eq!(parse_set("{'rock', 'pop'}").unwrap(), expected);
        assert_eq!(parse_set("['pop', 'rock', 'pop']").unwrap(), expected);
        assert_eq!(parse_set("(\"rock\", 'pop',)").unwrap(), expected);
        assert!(parse_set("set()").unwrap().is_empty());
        assert!(parse_set("[]").unwrap().is_empty());
        assert!(parse_set("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_escapes() {
        assert_eq!(parse_list(r"['\x41é\n']").unwrap(), vec!["Aé\n".to_string()]);
        assert_eq!(parse_list(r"['\d']").unwrap(), vec!["\\d".to_string()]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_optional_list("['a'").is_err());
        assert!(parse_optional_list("['a' 'b']").is_err());
        assert!(parse_optional_list("['a'] x").is_err());
        assert!(parse_optional_list("[Nope]").is_err());
        assert!(parse_optional_list("'a'").is_err());
        assert!(parse_list("['a', None]").is_err());

        let err = parse_optional_list("['a', 7]").unwrap_err();
        assert_eq!(err.position, 6);
    }
}
