//! # Route Parser Module
//!
//! Turns a route pattern such as `/user/{id:\d+}[/{name}]` into the ordered
//! list of concrete shapes it stands for.
//!
//! ## Pattern syntax
//!
//! - `{name}` is a placeholder matching one or more non-slash characters.
//! - `{name:regex}` constrains the placeholder with a custom regex. The regex
//!   may contain balanced braces (`{id:\d{4}}`) but no capturing groups.
//! - `[...]` marks an optional tail. Optional parts may nest
//!   (`/a[/b[/c]]`) but only at the end of the pattern.
//!
//! ## Expansion
//!
//! A pattern with `k` optional parts expands to `k + 1` [`ParsedRoute`]s,
//! shortest first, each one extending the previous:
//!
//! ```rust
//! use routecraft::parser::{RouteParser, StdRouteParser};
//!
//! let variants = StdRouteParser.parse("/archive[/{year}[/{month}]]").unwrap();
//! assert_eq!(variants.len(), 3);
//! assert_eq!(variants[0].to_string(), "/archive");
//! assert_eq!(variants[2].to_string(), "/archive/{year}/{month}");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BadRoute;
use crate::regex_util::has_capturing_group;


/// Constraint used for placeholders declared without one.
pub const DEFAULT_PLACEHOLDER_REGEX: &str = "[^/]+";

/// A piece of a parsed route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Literal text, matched byte for byte.
    Literal(String),
    /// A named variable constrained by a regex.
    Placeholder { name: String, pattern: String },
}

/// One concrete (non-optional) shape of a route pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedRoute {
    segments: Vec<Segment>,
}

impl ParsedRoute {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// A route without placeholders is static and matched by string equality.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// The literal path of a static route, `None` if the route has placeholders.
    #[must_use]
    pub fn static_path(&self) -> Option<String> {
        if !self.is_static() {
            return None;
        }
        let mut path = String::new();
        for segment in &self.segments {
            if let Segment::Literal(text) = segment {
                path.push_str(text);
            }
        }
        Some(path)
    }

    /// Placeholder names in left-to-right order.
    pub fn placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

impl fmt::Display for ParsedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Placeholder { name, pattern } if pattern == DEFAULT_PLACEHOLDER_REGEX => {
                    write!(f, "{{{name}}}")?
                }
                Segment::Placeholder { name, pattern } => write!(f, "{{{name}:{pattern}}}")?,
            }
        }
        Ok(())
    }
}

/// Parses route patterns into their concrete variants.
pub trait RouteParser {
    /// Parse `route` into its variants, shortest first.
    fn parse(&self, route: &str) -> Result<Vec<ParsedRoute>, BadRoute>;
}

/// The `{name:regex}` / `[optional]` pattern syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdRouteParser;

impl RouteParser for StdRouteParser {
    fn parse(&self, route: &str) -> Result<Vec<ParsedRoute>, BadRoute> {
        let without_closing = route.trim_end_matches(']');
        let num_optionals = route.len() - without_closing.len();

        let placeholders = placeholder_spans(without_closing);
        let segments = split_outside(without_closing, b'[', &placeholders);

        if num_optionals != segments.len() - 1 {
            if contains_outside(without_closing, b']', &placeholders) {
                return Err(BadRoute::OptionalNotAtEnd {
                    route: route.to_string(),
                });
            }
            return Err(BadRoute::UnbalancedOptionals {
                route: route.to_string(),
            });
        }

        let mut current = String::with_capacity(without_closing.len());
        let mut variants = Vec::with_capacity(segments.len());
        for (n, segment) in segments.iter().enumerate() {
            if segment.is_empty() && n != 0 {
                return Err(BadRoute::EmptyOptional {
                    route: route.to_string(),
                });
            }
            current.push_str(segment);
            variants.push(parse_placeholders(&current)?);
        }
        Ok(variants)
    }
}

/// A `{...}` placeholder located in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    name: String,
    pattern: Option<String>,
}

/// Finds every well-formed placeholder in `route`. A `{` that does not open
/// a well-formed placeholder is left as literal text.
fn placeholder_spans(route: &str) -> Vec<Span> {
    let bytes = route.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(span) = scan_placeholder(route, i) {
                i = span.end;
                spans.push(span);
                continue;
            }
        }
        i += 1;
    }
    spans
}

/// Scans `{ name (: pattern)? }` starting at the `{` at `start`.
fn scan_placeholder(route: &str, start: usize) -> Option<Span> {
    let bytes = route.as_bytes();
    let mut i = start + 1;
    skip_whitespace(bytes, &mut i);

    let name_start = i;
    match bytes.get(i) {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => i += 1,
        _ => return None,
    }
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'-') {
        i += 1;
    }
    let name = route[name_start..i].to_string();
    skip_whitespace(bytes, &mut i);

    match bytes.get(i) {
        Some(b'}') => Some(Span {
            start,
            end: i + 1,
            name,
            pattern: None,
        }),
        Some(b':') => {
            i += 1;
            let pattern_start = i;
            let mut depth = 0usize;
            while i < bytes.len() {
                match bytes[i] {
                    b'{' => depth += 1,
                    b'}' if depth == 0 => {
                        return Some(Span {
                            start,
                            end: i + 1,
                            name,
                            pattern: Some(route[pattern_start..i].trim().to_string()),
                        });
                    }
                    b'}' => depth -= 1,
                    _ => {}
                }
                i += 1;
            }
            None
        }
        _ => None,
    }
}

fn skip_whitespace(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn inside_placeholder(pos: usize, spans: &[Span]) -> bool {
    spans.iter().any(|s| pos >= s.start && pos < s.end)
}

/// Splits `route` on `delimiter`, ignoring occurrences inside placeholders.
fn split_outside<'a>(route: &'a str, delimiter: u8, spans: &[Span]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for (pos, byte) in route.bytes().enumerate() {
        if byte == delimiter && !inside_placeholder(pos, spans) {
            parts.push(&route[last..pos]);
            last = pos + 1;
        }
    }
    parts.push(&route[last..]);
    parts
}

fn contains_outside(route: &str, delimiter: u8, spans: &[Span]) -> bool {
    route
        .bytes()
        .enumerate()
        .any(|(pos, byte)| byte == delimiter && !inside_placeholder(pos, spans))
}

/// Placeholder constraints are checked against the regex engine here so that
/// compiling combined route regexes later cannot fail on user input.
fn validate_pattern(name: &str, pattern: &str) -> Result<(), BadRoute> {
    if has_capturing_group(pattern) {
        return Err(BadRoute::CapturingGroup {
            name: name.to_string(),
            pattern: pattern.to_string(),
        });
    }
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| BadRoute::InvalidPattern {
        name: name.to_string(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Splits one optional-free pattern into literal and placeholder segments.
fn parse_placeholders(route: &str) -> Result<ParsedRoute, BadRoute> {
    let spans = placeholder_spans(route);
    let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
    let mut seen: Vec<&str> = Vec::with_capacity(spans.len());
    let mut offset = 0;

    for span in &spans {
        if span.start > offset {
            segments.push(Segment::Literal(route[offset..span.start].to_string()));
        }
        if seen.contains(&span.name.as_str()) {
            return Err(BadRoute::DuplicatePlaceholder {
                name: span.name.clone(),
                route: route.to_string(),
            });
        }
        seen.push(&span.name);

        let pattern = span
            .pattern
            .clone()
            .unwrap_or_else(|| DEFAULT_PLACEHOLDER_REGEX.to_string());
        validate_pattern(&span.name, &pattern)?;
        segments.push(Segment::Placeholder {
            name: span.name.clone(),
            pattern,
        });
        offset = span.end;
    }
    if offset < route.len() {
        segments.push(Segment::Literal(route[offset..].to_string()));
    }
    Ok(ParsedRoute::new(segments))
}
