//! # Generator Module
//!
//! Data generators collect routes during registration and compile them into
//! a [`DispatchTable`]: an exact-match map for static routes plus a compact
//! structure of combined regexes for variable routes.
//!
//! ## Strategies
//!
//! Two interchangeable compilation strategies are provided, selected with
//! [`Strategy`]:
//!
//! - [`Strategy::MarkBased`] splits each method's variable routes into chunks
//!   of roughly [`DEFAULT_APPROX_CHUNK_SIZE`] routes and joins every chunk into
//!   one alternation. An empty named group (the "mark") after each
//!   alternative tells the dispatcher which route matched.
//! - [`Strategy::Trie`] folds the variable routes of all methods into a
//!   single regex shaped like a prefix tree, so routes sharing a long prefix
//!   (`/api/v1/users/([^/]+)/...`) test that prefix once.
//!
//! Both strategies dispatch identically. Registration order is the only
//! tie-break between routes that match the same URI.
//!
//! ## Registration errors
//!
//! Registration is shared by both strategies ([`RouteRegistry`]):
//!
//! - a second static route for the same method and path, or a second variable
//!   route with the same method and regex, is an
//!   [`Error::DuplicateRoute`](crate::error::Error::DuplicateRoute);
//! - a static route that an earlier variable route of the same method already
//!   matches is an [`Error::ShadowedRoute`](crate::error::Error::ShadowedRoute).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::dispatcher::ParamVec;
use crate::error::{Error, Result};
use crate::parser::ParsedRoute;
use crate::route::{ExtraParameters, Route, RouteTarget};

mod mark_based;
mod regex_serde;
mod trie;

pub use mark_based::{Chunk, ChunkedRoutes, MarkBasedGenerator};
pub use trie::{TrieGenerator, TrieRoutes};

/// Approximate number of routes per combined regex for the chunked strategy.
pub const DEFAULT_APPROX_CHUNK_SIZE: usize = 30;

/// Compiles registered routes into a [`DispatchTable`].
pub trait DataGenerator<H> {
    /// Registers one concrete route shape for `method`.
    fn add_route(
        &mut self,
        method: &str,
        route: &ParsedRoute,
        handler: H,
        extra: ExtraParameters,
    ) -> Result<()>;

    /// Builds the dispatch table for everything registered so far.
    fn compile(&self) -> Result<DispatchTable<H>>;
}

/// Which compilation algorithm to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Per-method chunks of alternations with marks.
    #[default]
    MarkBased,
    /// One prefix-tree shaped regex over all methods.
    Trie,
}

impl Strategy {
    /// A fresh generator for this strategy.
    ///
    /// `approx_chunk_size` only affects [`Strategy::MarkBased`].
    #[must_use]
    pub fn generator<H: Clone + 'static>(
        self,
        approx_chunk_size: Option<usize>,
    ) -> Box<dyn DataGenerator<H>> {
        match self {
            Strategy::MarkBased => Box::new(MarkBasedGenerator::with_chunk_size(
                approx_chunk_size.unwrap_or(DEFAULT_APPROX_CHUNK_SIZE),
            )),
            Strategy::Trie => Box::new(TrieGenerator::new()),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::MarkBased => "mark_based",
            Strategy::Trie => "trie",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "mark_based" | "mark" | "chunked" => Ok(Strategy::MarkBased),
            "trie" => Ok(Strategy::Trie),
            other => Err(format!("unknown routing strategy \"{other}\"")),
        }
    }
}

/// Static routes: path → method → target, both maps in registration order.
pub type StaticRoutes<H> = IndexMap<String, IndexMap<String, RouteTarget<H>>>;

/// Compiled, immutable routing data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchTable<H> {
    pub static_routes: StaticRoutes<H>,
    pub variable_routes: VariableRoutes<H>,
}

impl<H> DispatchTable<H> {
    /// Number of static (path, method) pairs.
    #[must_use]
    pub fn static_count(&self) -> usize {
        self.static_routes.values().map(IndexMap::len).sum()
    }
}

/// Compiled variable routes, in the shape of the strategy that built them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum VariableRoutes<H> {
    MarkBased(ChunkedRoutes<H>),
    Trie(TrieRoutes<H>),
}

impl<H> VariableRoutes<H> {
    /// Finds the first route registered for `method` whose regex matches `uri`.
    #[inline]
    pub fn find(&self, method: &str, uri: &str) -> Option<(&RouteTarget<H>, ParamVec)> {
        match self {
            VariableRoutes::MarkBased(chunks) => chunks.find(method, uri),
            VariableRoutes::Trie(trie) => trie.find(method, uri),
        }
    }

    /// Whether any variable route is registered for `method`.
    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        self.methods().any(|m| m == method)
    }

    /// Methods with variable routes, in first-registration order.
    pub fn methods(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            VariableRoutes::MarkBased(chunks) => Box::new(chunks.methods()),
            VariableRoutes::Trie(trie) => Box::new(trie.methods()),
        }
    }

    #[must_use]
    pub fn strategy(&self) -> Strategy {
        match self {
            VariableRoutes::MarkBased(_) => Strategy::MarkBased,
            VariableRoutes::Trie(_) => Strategy::Trie,
        }
    }

    /// Checks that the route bookkeeping agrees with the compiled regexes.
    ///
    /// Tables built by a generator always pass; deserialized ones may not.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            VariableRoutes::MarkBased(chunks) => chunks.validate(),
            VariableRoutes::Trie(trie) => trie.validate(),
        }
    }
}

/// Route bookkeeping shared by every strategy.
#[derive(Debug, Clone)]
pub struct RouteRegistry<H> {
    static_routes: StaticRoutes<H>,
    /// Variable routes of all methods in registration order.
    variable_routes: Vec<Route<H>>,
    variable_keys: HashSet<(String, String)>,
}

impl<H> Default for RouteRegistry<H> {
    fn default() -> Self {
        Self {
            static_routes: IndexMap::new(),
            variable_routes: Vec::new(),
            variable_keys: HashSet::new(),
        }
    }
}

impl<H: Clone> RouteRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(
        &mut self,
        method: &str,
        parsed: &ParsedRoute,
        handler: H,
        extra: ExtraParameters,
    ) -> Result<()> {
        let route = Route::new(method, parsed, handler, extra)?;
        match parsed.static_path() {
            Some(path) => self.add_static(path, route),
            None => self.add_variable(route),
        }
    }

    fn add_static(&mut self, path: String, route: Route<H>) -> Result<()> {
        let taken = self
            .static_routes
            .get(&path)
            .is_some_and(|methods| methods.contains_key(&route.method));
        if taken {
            return Err(Error::DuplicateRoute {
                method: route.method,
                route: path,
            });
        }

        if let Some(shadowing) = self
            .variable_routes
            .iter()
            .find(|r| r.method == route.method && r.matches(&path))
        {
            return Err(Error::ShadowedRoute {
                method: route.method,
                route: path,
                shadowed_by: shadowing.regex.clone(),
            });
        }

        debug!(method = %route.method, path = %path, kind = "static", "Route registered");
        self.static_routes
            .entry(path)
            .or_default()
            .insert(route.method.clone(), route.target());
        Ok(())
    }

    fn add_variable(&mut self, route: Route<H>) -> Result<()> {
        let key = (route.method.clone(), route.regex.clone());
        if self.variable_keys.contains(&key) {
            return Err(Error::DuplicateRoute {
                method: route.method,
                route: route.regex,
            });
        }

        debug!(
            method = %route.method,
            regex = %route.regex,
            variables = ?route.variables,
            kind = "variable",
            "Route registered"
        );
        self.variable_keys.insert(key);
        self.variable_routes.push(route);
        Ok(())
    }

    #[must_use]
    pub fn static_routes(&self) -> &StaticRoutes<H> {
        &self.static_routes
    }

    /// Variable routes of all methods, in registration order.
    #[must_use]
    pub fn variable_routes(&self) -> &[Route<H>] {
        &self.variable_routes
    }

    /// Variable routes grouped by method; methods and routes keep
    /// registration order.
    #[must_use]
    pub fn variable_routes_by_method(&self) -> IndexMap<&str, Vec<&Route<H>>> {
        let mut by_method: IndexMap<&str, Vec<&Route<H>>> = IndexMap::new();
        for route in &self.variable_routes {
            by_method.entry(route.method.as_str()).or_default().push(route);
        }
        by_method
    }
}
