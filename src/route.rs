//! Route values.
//!
//! A [`Route`] is what the registration phase knows about one method + one
//! concrete shape of a pattern: the regex fragment the shape compiles to, the
//! names of its variables and the handler it dispatches to. Once compiled,
//! the parts a dispatcher needs survive as a [`RouteTarget`].

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::parser::{ParsedRoute, Segment};

/// Arbitrary metadata attached to a route and returned on a match.
pub type ExtraParameters = IndexMap<String, serde_json::Value>;

/// Extra parameter key holding the route's name.
pub const ROUTE_NAME: &str = "_name";

/// Method string that matches when no specific method did.
pub const ANY_METHOD: &str = "*";

/// One registered method + shape.
#[derive(Debug, Clone)]
pub struct Route<H> {
    pub method: String,
    pub handler: H,
    /// Unanchored regex fragment, one capturing group per variable.
    pub regex: String,
    /// Placeholder names in left-to-right order.
    pub variables: Vec<Arc<str>>,
    pub extra: ExtraParameters,
    matcher: Regex,
}

impl<H> Route<H> {
    /// Builds the route for `parsed`, quoting literal text and wrapping each
    /// placeholder constraint in a capturing group.
    pub fn new(method: &str, parsed: &ParsedRoute, handler: H, extra: ExtraParameters) -> Result<Self> {
        let (regex, variables) = build_regex(parsed);
        let matcher = Regex::new(&format!("^{regex}$"))?;
        Ok(Self {
            method: method.to_string(),
            handler,
            regex,
            variables,
            extra,
            matcher,
        })
    }

    /// A route without variables is matched by string equality.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.variables.is_empty()
    }

    /// Whether this route's regex matches the whole of `path`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// The compiled part of this route.
    #[must_use]
    pub fn target(&self) -> RouteTarget<H>
    where
        H: Clone,
    {
        RouteTarget {
            handler: self.handler.clone(),
            variables: self.variables.clone(),
            extra: self.extra.clone(),
        }
    }
}

fn build_regex(parsed: &ParsedRoute) -> (String, Vec<Arc<str>>) {
    let mut regex = String::new();
    let mut variables = Vec::new();
    for segment in parsed.segments() {
        match segment {
            Segment::Literal(text) => regex.push_str(&regex::escape(text)),
            Segment::Placeholder { name, pattern } => {
                regex.push('(');
                regex.push_str(pattern);
                regex.push(')');
                variables.push(Arc::from(name.as_str()));
            }
        }
    }
    (regex, variables)
}

/// What a dispatcher hands back for a matched route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTarget<H> {
    pub handler: H,
    /// Variable names, in capture order.
    pub variables: Vec<Arc<str>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extra: ExtraParameters,
}
