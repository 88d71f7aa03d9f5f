//! Binding path resolution over nested JSON.
//!
//! A binding path is a `.`-separated list of segments. Each segment is either
//! a bare key (`footer`) or a key followed by one non-negative index in
//! brackets (`cards[0]`):
//!
//! ```text
//! hero.title            → document["hero"]["title"]
//! services.cards[2].body → document["services"]["cards"][2]["body"]
//! ```
//!
//! Resolution walks the segments strictly left to right, each one applied to
//! the value the previous one produced. Any structural mismatch (missing key,
//! non-array under an index, index out of range, scalar where a container was
//! expected) collapses to `None`. Paths come straight from page markup, so a
//! misauthored path must degrade to a no-op and never to an error.
//!
//! ## Presence, not truthiness
//!
//! A key that exists is a hit even when its value is `null`, `0`, `false` or
//! `""`. Callers that care about those cases (the injector does) inspect the
//! returned value themselves.

use serde_json::Value;

/// One parsed segment of a binding path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// `footer`
    Key(&'a str),
    /// `cards[0]`
    Index(&'a str, usize),
}

/// Parse a single segment.
///
/// Returns `None` when the segment is empty, or when it has the indexed shape
/// but the index does not fit in a `usize`. Segments that merely look odd
/// (`my-key[0]`, `a[b]`) are treated as plain keys, which then simply fail to
/// resolve against real documents.
pub fn parse_segment(segment: &str) -> Option<Segment<'_>> {
    if segment.is_empty() {
        return None;
    }
    match split_indexed(segment) {
        Some((key, digits)) => digits.parse::<usize>().ok().map(|i| Segment::Index(key, i)),
        None => Some(Segment::Key(segment)),
    }
}

/// Match `key[digits]` where key is `[A-Za-z0-9_]+` and digits is `[0-9]+`.
fn split_indexed(segment: &str) -> Option<(&str, &str)> {
    let inner = segment.strip_suffix(']')?;
    let open = inner.find('[')?;
    let (key, digits) = (&inner[..open], &inner[open + 1..]);
    let key_ok = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let digits_ok = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    (key_ok && digits_ok).then_some((key, digits))
}

/// Resolve `path` against `document`.
///
/// Returns the terminal value (object, array or scalar) or `None` when the
/// path is empty, malformed, or leaves the document's structure.
pub fn resolve<'v>(document: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = document;
    for raw in path.split('.') {
        current = match parse_segment(raw)? {
            Segment::Index(key, index) => current.as_object()?.get(key)?.as_array()?.get(index)?,
            Segment::Key(key) => step_key(current, key)?,
        };
    }
    Some(current)
}

fn step_key<'v>(current: &'v Value, key: &str) -> Option<&'v Value> {
    match current {
        Value::Object(map) => map.get(key),
        // `items.0` reaches into arrays the same way the browser's property
        // lookup does.
        Value::Array(items) if is_canonical_index(key) => {
            key.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        _ => None,
    }
}

/// Digits only, with no leading zero unless the key is `0` itself.
fn is_canonical_index(key: &str) -> bool {
    !key.is_empty()
        && key.bytes().all(|b| b.is_ascii_digit())
        && (key == "0" || !key.starts_with('0'))
}
