//! Serializes a compiled [`Regex`] as its source text.
//!
//! Deserializing recompiles the pattern, so a tampered or truncated cache
//! entry fails here instead of at dispatch time.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serializer};

/// Compiled-size ceiling for combined route regexes. A trie over a few
/// thousand routes exceeds the engine's 10 MiB default.
const COMBINED_SIZE_LIMIT: usize = 64 * (1 << 20);

/// Compiles a combined route regex.
pub fn build(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source)
        .size_limit(COMBINED_SIZE_LIMIT)
        .build()
}

pub fn serialize<S: Serializer>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(regex.as_str())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Regex, D::Error> {
    let source = String::deserialize(deserializer)?;
    build(&source).map_err(serde::de::Error::custom)
}
