// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Self-describing text encoding.
//!
//! A file is a short program, one statement per line:
//!
//! ```text
//! hoard-native 1
//! key "users" "42"
//! expires 1700000000.000000000
//! map 2
//! set "name" "alice"
//! set "avatar" base64("iVBORw0K")
//! loaded
//! ```
//!
//! Every value carries its own type through its syntax: `null`, `true`/`false`,
//! decimal integers, floats in round-trip form (always with `.`, an exponent,
//! `NaN` or `inf`), quoted strings, `base64("…")` for opaque bytes and
//! `bincode(base64("…"))` for nested containers. A top-level map or list is
//! written one element per line (`set`/`push`), each element in its own
//! smallest form, instead of as one opaque blob. Scalars therefore decode
//! straight from their literal.
//!
//! The trailing `loaded` line is written last. A file without it, or with any
//! statement out of place, is rejected as a whole.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hoard_tier::{Entry, Error, Key, Result, Value, codec};

use super::{Encoder, Record};

const HEADER: &str = "hoard-native 1";
const LOADED: &str = "loaded";

/// Encoder writing the self-describing text format.
///
/// # Examples
///
/// ```
/// use hoard_fs::{Encoder, NativeEncoder};
/// use hoard_tier::{Entry, Key};
///
/// let bytes = NativeEncoder.serialize(&Key::new(["greeting"]), &Entry::new("say \"hi\"")).unwrap();
/// let text = String::from_utf8(bytes.clone()).unwrap();
/// assert!(text.contains(r#"data "say \"hi\"""#));
///
/// let record = NativeEncoder.decode(&bytes).unwrap();
/// assert_eq!(record.entry, Entry::new("say \"hi\""));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeEncoder;

impl Encoder for NativeEncoder {
    fn serialize(&self, key: &Key, entry: &Entry) -> Result<Vec<u8>> {
        // Elements of a top-level container are encoded one level down.
        if entry.data().depth() > Value::MAX_DEPTH {
            return Err(Error::Encode(format!(
                "value nests deeper than {} lists or maps",
                Value::MAX_DEPTH
            )));
        }
        let mut out = String::new();
        out.push_str(HEADER);
        out.push('\n');

        out.push_str("key");
        for segment in key.segments() {
            out.push(' ');
            push_quoted(&mut out, segment);
        }
        out.push('\n');

        out.push_str("expires ");
        push_expiration(&mut out, entry.expiration())?;
        out.push('\n');

        match entry.data() {
            Value::Map(map) => {
                out.push_str(&format!("map {}\n", map.len()));
                for (name, value) in map {
                    out.push_str("set ");
                    push_quoted(&mut out, name);
                    out.push(' ');
                    push_expr(&mut out, value)?;
                    out.push('\n');
                }
            }
            Value::List(items) => {
                out.push_str(&format!("list {}\n", items.len()));
                for value in items {
                    out.push_str("push ");
                    push_expr(&mut out, value)?;
                    out.push('\n');
                }
            }
            value => {
                out.push_str("data ");
                push_expr(&mut out, value)?;
                out.push('\n');
            }
        }

        out.push_str(LOADED);
        out.push('\n');
        Ok(out.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Option<Record> {
        let text = std::str::from_utf8(bytes).ok()?;
        let mut lines = text.split('\n');

        if lines.next()? != HEADER {
            return None;
        }
        let key = parse_key(lines.next()?.strip_prefix("key")?)?;
        let expiration = parse_expiration(lines.next()?.strip_prefix("expires ")?)?;

        let body = lines.next()?;
        let data = if let Some(expr) = body.strip_prefix("data ") {
            parse_whole_expr(expr)?
        } else if let Some(count) = body.strip_prefix("map ") {
            let count: usize = count.parse().ok()?;
            let mut map = BTreeMap::new();
            for _ in 0..count {
                let (name, rest) = parse_string(lines.next()?.strip_prefix("set ")?)?;
                map.insert(name, parse_whole_expr(rest.strip_prefix(' ')?)?);
            }
            Value::Map(map)
        } else if let Some(count) = body.strip_prefix("list ") {
            let count: usize = count.parse().ok()?;
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(parse_whole_expr(lines.next()?.strip_prefix("push ")?)?);
            }
            Value::List(items)
        } else {
            return None;
        };

        if lines.next()? != LOADED {
            return None;
        }
        // Only the final newline may follow the marker.
        match (lines.next(), lines.next()) {
            (None | Some(""), None) => {}
            _ => return None,
        }
        if data.depth() > Value::MAX_DEPTH {
            return None;
        }

        Some(Record {
            key,
            entry: Entry::from_parts(data, expiration),
        })
    }

    fn file_extension(&self) -> &'static str {
        "hoard"
    }
}

fn push_expiration(out: &mut String, expiration: Option<SystemTime>) -> Result<()> {
    let Some(expiration) = expiration else {
        out.push_str("never");
        return Ok(());
    };
    let since_epoch = expiration
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Encode(format!("expiration precedes the Unix epoch by {:?}", e.duration())))?;
    out.push_str(&format!("{}.{:09}", since_epoch.as_secs(), since_epoch.subsec_nanos()));
    Ok(())
}

fn push_expr(out: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(i) => out.push_str(&i.to_string()),
        Value::Float(f) => out.push_str(&format!("{f:?}")),
        Value::String(s) => push_quoted(out, s),
        Value::Bytes(bytes) => {
            out.push_str("base64(\"");
            out.push_str(&STANDARD.encode(bytes));
            out.push_str("\")");
        }
        Value::List(_) | Value::Map(_) => {
            out.push_str("bincode(base64(\"");
            out.push_str(&STANDARD.encode(codec::encode(value)?));
            out.push_str("\"))");
        }
    }
    Ok(())
}

fn push_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{{{:x}}}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn parse_key(mut rest: &str) -> Option<Key> {
    let mut segments = Vec::new();
    while !rest.is_empty() {
        let (segment, remaining) = parse_string(rest.strip_prefix(' ')?)?;
        segments.push(segment);
        rest = remaining;
    }
    Some(Key::new(segments))
}

fn parse_expiration(s: &str) -> Option<Option<SystemTime>> {
    if s == "never" {
        return Some(None);
    }
    let (secs, nanos) = s.split_once('.')?;
    if nanos.len() != 9 || !secs.bytes().chain(nanos.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let secs: u64 = secs.parse().ok()?;
    let nanos: u32 = nanos.parse().ok()?;
    UNIX_EPOCH.checked_add(Duration::new(secs, nanos)).map(Some)
}

/// Parses an expression that must span the rest of the line.
fn parse_whole_expr(s: &str) -> Option<Value> {
    match parse_expr(s)? {
        (value, "") => Some(value),
        _ => None,
    }
}

fn parse_expr(s: &str) -> Option<(Value, &str)> {
    if s.starts_with('"') {
        let (string, rest) = parse_string(s)?;
        return Some((Value::String(string), rest));
    }
    if let Some(inner) = s.strip_prefix("base64(") {
        let (encoded, rest) = parse_string(inner)?;
        let bytes = STANDARD.decode(encoded).ok()?;
        return Some((Value::Bytes(bytes), rest.strip_prefix(')')?));
    }
    if let Some(inner) = s.strip_prefix("bincode(base64(") {
        let (encoded, rest) = parse_string(inner)?;
        let value: Value = codec::decode(&STANDARD.decode(encoded).ok()?)?;
        return Some((value, rest.strip_prefix("))")?));
    }

    let end = s.find(' ').unwrap_or(s.len());
    let (token, rest) = s.split_at(end);
    let value = match token {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match token.parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Float(token.parse::<f64>().ok()?),
        },
    };
    Some((value, rest))
}

/// Parses a quoted string literal, returning its contents and the remaining input.
fn parse_string(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('"')?;
    let mut out = String::new();
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, &body[i + 1..])),
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    '0' => out.push('\0'),
                    'u' => {
                        if chars.next()?.1 != '{' {
                            return None;
                        }
                        let mut hex = String::new();
                        loop {
                            match chars.next()?.1 {
                                '}' => break,
                                d if d.is_ascii_hexdigit() && hex.len() < 6 => hex.push(d),
                                _ => return None,
                            }
                        }
                        out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
                    }
                    _ => return None,
                }
            }
            c if c.is_control() => return None,
            c => out.push(c),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(entry: &Entry) -> String {
        let bytes = NativeEncoder.serialize(&Key::new(["k"]), entry).expect("encodable");
        String::from_utf8(bytes).expect("native output is UTF-8")
    }

    #[test]
    fn scalars_render_as_literals() {
        assert!(render(&Entry::new(true)).contains("\ndata true\n"));
        assert!(render(&Entry::new(-17)).contains("\ndata -17\n"));
        assert!(render(&Entry::new(1.0)).contains("\ndata 1.0\n"));
        assert!(render(&Entry::new(Value::Null)).contains("\ndata null\n"));
    }

    #[test]
    fn control_characters_are_escaped() {
        let text = render(&Entry::new("tab\tquote\"slash\\bell\u{7}"));
        assert!(text.contains(r#"data "tab\tquote\"slash\\bell\u{7}""#), "got: {text}");
    }

    #[test]
    fn top_level_map_is_written_per_entry() {
        let map = BTreeMap::from([
            ("a".to_owned(), Value::from(1)),
            ("b".to_owned(), Value::from(vec![1_u8, 2])),
            ("c".to_owned(), Value::from(vec![Value::from(1)])),
        ]);
        let text = render(&Entry::new(map));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[3], "map 3");
        assert_eq!(lines[4], r#"set "a" 1"#);
        assert_eq!(lines[5], r#"set "b" base64("AQI=")"#);
        assert!(lines[6].starts_with(r#"set "c" bincode(base64(""#));
        assert_eq!(lines[7], LOADED);
    }

    #[test]
    fn expiration_keeps_nanoseconds() {
        let at = UNIX_EPOCH + Duration::new(1_700_000_000, 5);
        let text = render(&Entry::with_expiration(1, at));
        assert!(text.contains("\nexpires 1700000000.000000005\n"));
        assert_eq!(parse_expiration("1700000000.000000005"), Some(Some(at)));
        assert_eq!(parse_expiration("never"), Some(None));
        assert_eq!(parse_expiration("17.5"), None);
    }

    #[test]
    fn expiration_before_epoch_is_an_encode_error() {
        let entry = Entry::with_expiration(1, UNIX_EPOCH - Duration::from_secs(1));
        let err = NativeEncoder.serialize(&Key::new(["k"]), &entry).expect_err("pre-epoch");
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn missing_marker_is_a_miss() {
        let text = render(&Entry::new(5));
        let truncated = text.trim_end().trim_end_matches(LOADED);
        assert!(NativeEncoder.decode(truncated.as_bytes()).is_none());
    }

    #[test]
    fn short_map_is_a_miss() {
        let text = format!("{HEADER}\nkey \"k\"\nexpires never\nmap 2\nset \"a\" 1\n{LOADED}\n");
        assert!(NativeEncoder.decode(text.as_bytes()).is_none());
    }

    #[test]
    fn trailing_statements_are_rejected() {
        let text = format!("{}data 1\n", render(&Entry::new(5)));
        assert!(NativeEncoder.decode(text.as_bytes()).is_none());
    }

    #[test]
    fn nesting_limit_counts_the_top_level_container() {
        let deepest = (1..Value::MAX_DEPTH).fold(Value::Null, |inner, _| Value::from(vec![inner]));
        let at_limit = Entry::new(vec![deepest.clone()]);
        let bytes = NativeEncoder.serialize(&Key::new(["k"]), &at_limit).expect("at the limit");
        assert_eq!(NativeEncoder.decode(&bytes).expect("decodable").entry, at_limit);

        let past = Entry::new(vec![Value::from(vec![deepest.clone()])]);
        let err = NativeEncoder.serialize(&Key::new(["k"]), &past).expect_err("past the limit");
        assert!(matches!(err, Error::Encode(_)));

        // Hand-written: a top-level list around an element already at the limit.
        let element = STANDARD.encode(codec::encode(&Value::from(vec![deepest])).expect("at the limit"));
        let text = format!("{HEADER}\nkey \"k\"\nexpires never\nlist 1\npush bincode(base64(\"{element}\"))\n{LOADED}\n");
        assert!(NativeEncoder.decode(text.as_bytes()).is_none());
    }

    #[test]
    fn string_parser_handles_unicode_escapes() {
        assert_eq!(parse_string(r#""a\u{1f}b" rest"#), Some(("a\u{1f}b".to_owned(), " rest")));
        assert_eq!(parse_string(r#""\u{110000}""#), None);
        assert_eq!(parse_string(r#""unterminated"#), None);
        assert_eq!(parse_string(r#""bad \q escape""#), None);
    }
}
