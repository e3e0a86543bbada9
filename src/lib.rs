//! # routecraft
//!
//! **routecraft** is a regex-based URL router: it compiles a set of route
//! patterns into a handful of combined regular expressions and maps an
//! `(HTTP method, URI)` pair to a handler plus the variables extracted from
//! the URI. It also runs the other way, generating a URI from a route name
//! and substitution values.
//!
//! ## Overview
//!
//! Routes are written as patterns with placeholders and optional tails:
//!
//! ```text
//! /users                       static, matched by string equality
//! /users/{id}                  one variable, default pattern [^/]+
//! /users/{id:\d+}              custom pattern (non-capturing constraints only)
//! /posts/{id:\d+}[/{slug}]     optional tail, registers /posts/{id} and /posts/{id}/{slug}
//! /archive[/{year}[/{month}]]  nested optionals, shortest variant first
//! ```
//!
//! A dispatch answers with a [`DispatchResult`]: `Found` (handler, variables
//! and the route's extra parameters), `MethodNotAllowed` (the methods that
//! would have matched) or `NotFound`.
//!
//! ## Architecture
//!
//! Data flows one way, from patterns to a compiled, immutable table:
//!
//! - **[`parser`]** - turns a pattern into its concrete variants
//! - **[`route`]** - the registration-time route value and what survives compilation
//! - **[`generator`]** - duplicate/shadow detection and the two compilation strategies
//! - **[`dispatcher`]** - static lookup, combined-regex matching and the fallback policy
//! - **[`uri`]** - reverse routing for named routes
//! - **[`collector`]** - the registration API: groups, method shortcuts, named routes
//! - **[`cache`]** - storing compiled tables in memory or on disk
//! - **[`config`]** / **[`logging`]** - environment and file based settings
//!
//! ## Compilation Strategies
//!
//! | Strategy | Shape | Suited to |
//! |---|---|---|
//! | [`Strategy::MarkBased`] | per method, chunks of ~30 routes joined into one alternation | general route sets |
//! | [`Strategy::Trie`] | one prefix-tree regex over every method | deep REST hierarchies sharing long prefixes |
//!
//! Both dispatch identically; registration order is the only tie-break
//! between routes matching the same URI.
//!
//! ## Quick Start
//!
//! ```rust
//! use routecraft::{simple_dispatcher, DispatchResult, Strategy};
//! use serde_json::json;
//!
//! let (dispatcher, uris) = simple_dispatcher(Strategy::MarkBased, |r| {
//!     r.get("/", "index")?;
//!     r.add_route_with_extra(
//!         ["GET", "POST"],
//!         "/post/{id:\\d+}[/{slug}]",
//!         "post",
//!         [("_name".to_string(), json!("post.show"))].into_iter().collect(),
//!     )?;
//!     r.add_group("/admin", |admin| {
//!         admin.any("/{page}", "admin")?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! })?;
//!
//! match dispatcher.dispatch("GET", "/post/7/hello") {
//!     DispatchResult::Found(m) => {
//!         assert_eq!(*m.handler, "post");
//!         assert_eq!(m.variable("slug"), Some("hello"));
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//!
//! assert_eq!(
//!     dispatcher.dispatch("DELETE", "/post/7"),
//!     DispatchResult::MethodNotAllowed(vec!["GET".into(), "POST".into()])
//! );
//!
//! let uri = uris.for_route("post.show", [("id", "7")])?;
//! assert_eq!(uri.path, "/post/7");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Caching
//!
//! [`cached_dispatcher`] stores the compiled table through a [`Cache`] so
//! later starts skip parsing and compilation:
//!
//! ```rust,ignore
//! let config = RouterConfig::from_env();
//! let cache = FileCache::new(config.cache_dir.clone().unwrap_or_else(std::env::temp_dir));
//! let (dispatcher, uris) = cached_dispatcher(&config, &cache, |r| {
//!     r.get("/users/{id}", "show_user".to_string())?;
//!     Ok(())
//! })?;
//! ```
//!
//! ## Logging
//!
//! The library emits `tracing` events (`info!` per compiled table, `debug!`
//! per registered route and per dispatch, `warn!` for slow dispatches and
//! invalid cache entries). Install a subscriber to see them, e.g. with
//! [`logging::init_logging`].

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod cache;
pub mod cli;
pub mod collector;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod generator;
pub mod logging;
pub mod parser;
pub mod regex_util;
pub mod route;
pub mod uri;

pub use cache::{Cache, FileCache, MemoryCache, NullCache};
pub use collector::{IntoMethods, RouteCollector, RouteData};
pub use config::RouterConfig;
pub use dispatcher::{DispatchResult, Dispatcher, Matched, ParamVec};
pub use error::{BadRoute, Error, Result, UriCouldNotBeGenerated};
pub use generator::{DataGenerator, DispatchTable, Strategy};
pub use parser::{ParsedRoute, RouteParser, Segment, StdRouteParser};
pub use route::{ExtraParameters, ANY_METHOD, ROUTE_NAME};
pub use uri::{GeneratedUri, UriGenerator};

/// Registers routes with `define` and compiles them with `strategy`.
///
/// # Arguments
///
/// * `strategy` - How variable routes are compiled
/// * `define` - Registers routes on the given collector
///
/// # Returns
///
/// The dispatcher and the URI generator for the named routes
pub fn simple_dispatcher<H, F>(strategy: Strategy, define: F) -> Result<(Dispatcher<H>, UriGenerator)>
where
    H: Clone + 'static,
    F: FnOnce(&mut RouteCollector<H>) -> Result<()>,
{
    let mut collector = RouteCollector::new(strategy);
    define(&mut collector)?;
    collector.into_route_data()?.into_parts()
}

/// Like [`simple_dispatcher`], reading and storing the compiled routes
/// through `cache` under `config.cache_key`.
///
/// `define` only runs on a cache miss, or always when
/// `config.cache_disabled` is set.
pub fn cached_dispatcher<H, F, C>(
    config: &RouterConfig,
    cache: &C,
    define: F,
) -> Result<(Dispatcher<H>, UriGenerator)>
where
    H: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    F: FnOnce(&mut RouteCollector<H>) -> Result<()>,
    C: Cache,
{
    let load = || {
        let mut collector = RouteCollector::with_chunk_size(config.strategy, config.approx_chunk_size);
        define(&mut collector)?;
        collector.into_route_data()
    };
    let data = if config.cache_disabled {
        load()?
    } else {
        cache.get(&config.cache_key, load)?
    };
    data.into_parts()
}
