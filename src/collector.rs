//! # Route Collector
//!
//! The registration façade: parses patterns, applies group prefixes, expands
//! multi-method registrations and feeds every concrete variant to the
//! [`DataGenerator`] of the chosen [`Strategy`].
//!
//! ```rust,ignore
//! let mut routes = RouteCollector::new(Strategy::Trie);
//! routes.get("/", "index")?;
//! routes.add_group("/admin", |admin| {
//!     admin.add_route(["GET", "POST"], "/users", "users")?;
//!     admin.add_group("/settings", |s| {
//!         s.put("/{key}", "set")?;
//!         Ok(())
//!     })
//! })?;
//! let data = routes.into_route_data()?;
//! ```
//!
//! A route carrying a string `_name` extra parameter is also recorded in the
//! named-route registry used by [`UriGenerator`](crate::uri::UriGenerator).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dispatcher::Dispatcher;
use crate::error::{BadRoute, Result};
use crate::generator::{DataGenerator, DispatchTable, Strategy};
use crate::parser::{RouteParser, StdRouteParser};
use crate::route::{ExtraParameters, ANY_METHOD, ROUTE_NAME};
use crate::uri::{NamedRoutes, UriGenerator};

/// Anything that names one or more HTTP methods.
pub trait IntoMethods {
    fn into_methods(self) -> Vec<String>;
}

impl IntoMethods for &str {
    fn into_methods(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoMethods for String {
    fn into_methods(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoMethods for http::Method {
    fn into_methods(self) -> Vec<String> {
        vec![self.as_str().to_string()]
    }
}

impl IntoMethods for &http::Method {
    fn into_methods(self) -> Vec<String> {
        vec![self.as_str().to_string()]
    }
}

impl<T: IntoMethods, const N: usize> IntoMethods for [T; N] {
    fn into_methods(self) -> Vec<String> {
        self.into_iter().flat_map(IntoMethods::into_methods).collect()
    }
}

impl<T: IntoMethods> IntoMethods for Vec<T> {
    fn into_methods(self) -> Vec<String> {
        self.into_iter().flat_map(IntoMethods::into_methods).collect()
    }
}

impl<T: IntoMethods + Clone> IntoMethods for &[T] {
    fn into_methods(self) -> Vec<String> {
        self.iter().cloned().flat_map(IntoMethods::into_methods).collect()
    }
}

/// Compiled routes plus the named-route registry; what a cache stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteData<H> {
    pub table: DispatchTable<H>,
    pub named_routes: NamedRoutes,
}

impl<H> RouteData<H> {
    /// Splits the data into a dispatcher and a URI generator.
    pub fn into_parts(self) -> Result<(Dispatcher<H>, UriGenerator)> {
        let generator = UriGenerator::new(self.named_routes)?;
        Ok((Dispatcher::new(self.table), generator))
    }
}

/// Builds a route table.
pub struct RouteCollector<H> {
    parser: Box<dyn RouteParser>,
    generator: Box<dyn DataGenerator<H>>,
    strategy: Strategy,
    group_prefix: String,
    named_routes: NamedRoutes,
    route_count: usize,
}

impl<H> std::fmt::Debug for RouteCollector<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteCollector")
            .field("strategy", &self.strategy)
            .field("group_prefix", &self.group_prefix)
            .field("named_routes", &self.named_routes.len())
            .field("route_count", &self.route_count)
            .finish_non_exhaustive()
    }
}

macro_rules! method_shortcuts {
    ($(
        $(#[$doc:meta])*
        $name:ident => $method:expr,
    )*) => {$(
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, pattern: &str, handler: H) -> Result<&mut Self> {
            self.add_route($method, pattern, handler)
        }
    )*};
}

impl<H: Clone + 'static> RouteCollector<H> {
    /// A collector compiling with `strategy` and its default chunk size.
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self::with_chunk_size(strategy, None)
    }

    /// A collector compiling with `strategy`; `approx_chunk_size` only
    /// affects [`Strategy::MarkBased`].
    #[must_use]
    pub fn with_chunk_size(strategy: Strategy, approx_chunk_size: Option<usize>) -> Self {
        Self {
            parser: Box::new(StdRouteParser),
            generator: strategy.generator(approx_chunk_size),
            strategy,
            group_prefix: String::new(),
            named_routes: NamedRoutes::new(),
            route_count: 0,
        }
    }
}

impl<H: Clone> RouteCollector<H> {
    /// Replaces the pattern parser.
    #[must_use]
    pub fn with_parser(mut self, parser: impl RouteParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Registers `pattern` for every method in `methods`.
    ///
    /// # Arguments
    ///
    /// * `methods` - `"GET"`, `http::Method::POST`, `["GET", "HEAD"]`, ...
    /// * `pattern` - Route pattern, prefixed with the current group prefix
    /// * `handler` - Value returned on a match
    pub fn add_route(
        &mut self,
        methods: impl IntoMethods,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self> {
        self.add_route_with_extra(methods, pattern, handler, ExtraParameters::new())
    }

    /// Like [`add_route`](Self::add_route), attaching `extra` to the route.
    ///
    /// A string `_name` entry registers the route for URI generation.
    pub fn add_route_with_extra(
        &mut self,
        methods: impl IntoMethods,
        pattern: &str,
        handler: H,
        extra: ExtraParameters,
    ) -> Result<&mut Self> {
        let full = format!("{}{}", self.group_prefix, pattern);
        let variants = self.parser.parse(&full)?;

        let name = route_name(&extra)?;
        if let Some(name) = name {
            if self.named_routes.contains_key(name) {
                return Err(BadRoute::DuplicateRouteName {
                    name: name.to_string(),
                }
                .into());
            }
        }

        let methods = methods.into_methods();
        for method in &methods {
            for variant in &variants {
                self.generator
                    .add_route(method, variant, handler.clone(), extra.clone())?;
            }
        }
        self.route_count += 1;

        if let Some(name) = name {
            debug!(name = %name, pattern = %full, variants = variants.len(), "Named route registered");
            self.named_routes
                .insert(name.to_string(), variants.into_iter().rev().collect());
        }
        Ok(self)
    }

    /// Registers every route added inside `define` under `prefix`.
    ///
    /// Groups nest; the prefix is restored when `define` returns, even on error.
    pub fn add_group<F>(&mut self, prefix: &str, define: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let previous_len = self.group_prefix.len();
        self.group_prefix.push_str(prefix);
        let result = define(self);
        self.group_prefix.truncate(previous_len);
        result.map(|()| self)
    }

    method_shortcuts![
        /// Equivalent to `add_route("GET", pattern, handler)`.
        get => "GET",
        /// Equivalent to `add_route("POST", pattern, handler)`.
        post => "POST",
        /// Equivalent to `add_route("PUT", pattern, handler)`.
        put => "PUT",
        /// Equivalent to `add_route("DELETE", pattern, handler)`.
        delete => "DELETE",
        /// Equivalent to `add_route("PATCH", pattern, handler)`.
        patch => "PATCH",
        /// Equivalent to `add_route("HEAD", pattern, handler)`.
        head => "HEAD",
        /// Equivalent to `add_route("OPTIONS", pattern, handler)`.
        options => "OPTIONS",
        /// Registers a fallback for every method, consulted after the
        /// request's own method (and `GET` for `HEAD`).
        any => ANY_METHOD,
    ];

    /// Compiles everything registered so far.
    pub fn route_data(&self) -> Result<RouteData<H>> {
        Ok(RouteData {
            table: self.generator.compile()?,
            named_routes: self.named_routes.clone(),
        })
    }

    pub fn into_route_data(self) -> Result<RouteData<H>> {
        let table = self.generator.compile()?;
        debug!(
            strategy = %self.strategy,
            routes = self.route_count,
            named_routes = self.named_routes.len(),
            "Route collection finished"
        );
        Ok(RouteData {
            table,
            named_routes: self.named_routes,
        })
    }
}

fn route_name(extra: &ExtraParameters) -> Result<Option<&str>, BadRoute> {
    match extra.get(ROUTE_NAME) {
        None => Ok(None),
        Some(serde_json::Value::String(name)) if !name.is_empty() => Ok(Some(name)),
        Some(other) => Err(BadRoute::InvalidRouteName {
            value: other.to_string(),
        }),
    }
}
