//! Chunked alternation with marks.
//!
//! Each method's variable routes are cut into chunks of roughly equal size.
//! A chunk is one anchored alternation:
//!
//! ```text
//! ^(?:/user/([^/]+)(?P<m0>)|/user/([^/]+)/edit(?P<m1>)|/post/(\d+)(?P<m2>))$
//! ```
//!
//! The regex engine resolves alternations leftmost-first, so the earliest
//! registered route that matches wins. Exactly one mark group participates in
//! a match; its index identifies the route, and the route's variables are the
//! groups immediately before it.

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{regex_serde, DataGenerator, DispatchTable, RouteRegistry, VariableRoutes};
use crate::dispatcher::ParamVec;
use crate::error::Result;
use crate::parser::ParsedRoute;
use crate::regex_util::chunk_size;
use crate::route::{ExtraParameters, Route, RouteTarget};

/// Generator for [`Strategy::MarkBased`](super::Strategy::MarkBased).
#[derive(Debug, Clone)]
pub struct MarkBasedGenerator<H> {
    registry: RouteRegistry<H>,
    approx_chunk_size: usize,
}

impl<H: Clone> Default for MarkBasedGenerator<H> {
    fn default() -> Self {
        Self::with_chunk_size(super::DEFAULT_APPROX_CHUNK_SIZE)
    }
}

impl<H: Clone> MarkBasedGenerator<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator aiming for `approx_chunk_size` routes per combined regex.
    pub fn with_chunk_size(approx_chunk_size: usize) -> Self {
        Self {
            registry: RouteRegistry::new(),
            approx_chunk_size: approx_chunk_size.max(1),
        }
    }
}

impl<H: Clone> DataGenerator<H> for MarkBasedGenerator<H> {
    fn add_route(
        &mut self,
        method: &str,
        route: &ParsedRoute,
        handler: H,
        extra: ExtraParameters,
    ) -> Result<()> {
        self.registry.add_route(method, route, handler, extra)
    }

    fn compile(&self) -> Result<DispatchTable<H>> {
        let mut chunks: IndexMap<String, Vec<Chunk<H>>> = IndexMap::new();
        for (method, routes) in self.registry.variable_routes_by_method() {
            let size = chunk_size(routes.len(), self.approx_chunk_size);
            let compiled = routes
                .chunks(size)
                .map(Chunk::compile)
                .collect::<Result<Vec<_>>>()?;
            chunks.insert(method.to_string(), compiled);
        }

        let table = DispatchTable {
            static_routes: self.registry.static_routes().clone(),
            variable_routes: VariableRoutes::MarkBased(ChunkedRoutes { chunks }),
        };
        info!(
            strategy = "mark_based",
            static_routes = table.static_count(),
            variable_routes = self.registry.variable_routes().len(),
            chunks = ?chunk_counts(&table.variable_routes),
            approx_chunk_size = self.approx_chunk_size,
            "Dispatch table compiled"
        );
        Ok(table)
    }
}

fn chunk_counts<H>(routes: &VariableRoutes<H>) -> Vec<(String, usize)> {
    match routes {
        VariableRoutes::MarkBased(chunked) => chunked
            .chunks
            .iter()
            .map(|(method, chunks)| (method.clone(), chunks.len()))
            .collect(),
        VariableRoutes::Trie(_) => Vec::new(),
    }
}

/// Compiled chunks per method, methods in first-registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkedRoutes<H> {
    pub chunks: IndexMap<String, Vec<Chunk<H>>>,
}

impl<H> ChunkedRoutes<H> {
    pub fn find(&self, method: &str, uri: &str) -> Option<(&RouteTarget<H>, ParamVec)> {
        self.chunks
            .get(method)?
            .iter()
            .find_map(|chunk| chunk.find(uri))
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.chunks.keys().map(String::as_str)
    }

    /// Checks that every route's mark and variable groups exist in its
    /// chunk's regex.
    pub fn validate(&self) -> Result<(), String> {
        for (method, chunks) in &self.chunks {
            for (n, chunk) in chunks.iter().enumerate() {
                chunk
                    .validate()
                    .map_err(|reason| format!("{method} chunk {n}: {reason}"))?;
            }
        }
        Ok(())
    }
}

/// One combined regex and the routes it covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk<H> {
    #[serde(with = "regex_serde")]
    pub regex: Regex,
    pub routes: Vec<MarkedRoute<H>>,
}

/// A route inside a chunk, keyed by the index of its mark group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkedRoute<H> {
    pub mark: usize,
    pub target: RouteTarget<H>,
}

impl<H: Clone> Chunk<H> {
    fn compile(routes: &[&Route<H>]) -> Result<Self> {
        let mut pattern = String::from("^(?:");
        let mut marked = Vec::with_capacity(routes.len());
        let mut group = 1;

        for (n, route) in routes.iter().enumerate() {
            if n > 0 {
                pattern.push('|');
            }
            pattern.push_str(&route.regex);
            pattern.push_str("(?P<m");
            pattern.push_str(&n.to_string());
            pattern.push_str(">)");

            group += route.variables.len();
            marked.push(MarkedRoute {
                mark: group,
                target: route.target(),
            });
            group += 1;
        }
        pattern.push_str(")$");

        Ok(Self {
            regex: regex_serde::build(&pattern)?,
            routes: marked,
        })
    }
}

impl<H> Chunk<H> {
    pub fn find(&self, uri: &str) -> Option<(&RouteTarget<H>, ParamVec)> {
        let caps = self.regex.captures(uri)?;
        let route = self.routes.iter().find(|r| caps.get(r.mark).is_some())?;
        let first = route.mark.checked_sub(route.target.variables.len())?;
        Some((&route.target, collect_params(&caps, &route.target.variables, first..)))
    }

    fn validate(&self) -> Result<(), String> {
        let names: Vec<Option<&str>> = self.regex.capture_names().collect();
        for (n, route) in self.routes.iter().enumerate() {
            check_mark(&names, route.mark, n)?;
            let variables = route.target.variables.len();
            if route.mark <= variables {
                return Err(format!(
                    "mark m{n} at group {} cannot follow {variables} variable(s)",
                    route.mark
                ));
            }
            check_variable_groups(&names, route.mark - variables..route.mark)?;
        }
        Ok(())
    }
}

/// Fails unless group `mark` is the mark named `m<n>`.
pub(crate) fn check_mark(names: &[Option<&str>], mark: usize, n: usize) -> Result<(), String> {
    let expected = format!("m{n}");
    match names.get(mark) {
        Some(Some(name)) if *name == expected => Ok(()),
        _ => Err(format!("group {mark} is not mark {expected}")),
    }
}

/// Fails unless every index in `groups` is an unnamed capture group.
pub(crate) fn check_variable_groups(
    names: &[Option<&str>],
    groups: impl IntoIterator<Item = usize>,
) -> Result<(), String> {
    for group in groups {
        match names.get(group) {
            Some(None) if group > 0 => {}
            _ => return Err(format!("group {group} is not a variable group")),
        }
    }
    Ok(())
}

/// Pairs `names` with the capture groups yielded by `groups`.
pub(crate) fn collect_params(
    caps: &Captures<'_>,
    names: &[Arc<str>],
    groups: impl IntoIterator<Item = usize>,
) -> ParamVec {
    names
        .iter()
        .zip(groups)
        .map(|(name, group)| {
            let value = caps.get(group).map_or("", |m| m.as_str());
            (Arc::clone(name), value.to_string())
        })
        .collect()
}
