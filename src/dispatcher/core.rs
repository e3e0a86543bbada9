use smallvec::SmallVec;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::generator::{DispatchTable, Strategy};
use crate::route::{ExtraParameters, RouteTarget, ANY_METHOD};

/// Maximum number of route variables stored inline before spilling to the heap.
/// Most routes carry four or fewer (`/users/{id}/posts/{post}`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Extracted route variables, in the order they appear in the pattern.
///
/// Names are shared with the compiled table; only the values are allocated
/// per dispatch.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Dispatches taking longer than this are logged as slow.
const SLOW_DISPATCH: Duration = Duration::from_millis(1);

/// Outcome of a single dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult<'a, H> {
    /// A route matched.
    Found(Matched<'a, H>),
    /// The URI matched, but only for other methods (never empty).
    MethodNotAllowed(Vec<String>),
    /// No route matched the URI for any method.
    NotFound,
}

impl<'a, H> DispatchResult<'a, H> {
    /// The match, if any.
    #[must_use]
    pub fn found(self) -> Option<Matched<'a, H>> {
        match self {
            DispatchResult::Found(matched) => Some(matched),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, DispatchResult::Found(_))
    }

    /// Short status label, used in logs and by the CLI.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            DispatchResult::Found(_) => "found",
            DispatchResult::MethodNotAllowed(_) => "method_not_allowed",
            DispatchResult::NotFound => "not_found",
        }
    }
}

/// A matched route: handler, variables and the route's extra parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Matched<'a, H> {
    pub handler: &'a H,
    pub variables: ParamVec,
    pub extra: &'a ExtraParameters,
}

impl<H> Matched<'_, H> {
    /// Value of the variable `name`.
    ///
    /// When a name occurs more than once the last occurrence wins.
    ///
    /// # Arguments
    /// * `name` - The placeholder name (e.g., "id")
    ///
    /// # Returns
    /// The captured value if the route has such a variable
    #[inline]
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// The route's name, if it was registered with one.
    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        self.extra
            .get(crate::route::ROUTE_NAME)
            .and_then(serde_json::Value::as_str)
    }
}

/// Matches requests against a compiled [`DispatchTable`].
///
/// The table is immutable; a `Dispatcher` can be shared between threads
/// (e.g. behind an `Arc`) whenever `H` can.
#[derive(Debug, Clone)]
pub struct Dispatcher<H> {
    table: DispatchTable<H>,
}

impl<H> Dispatcher<H> {
    #[must_use]
    pub fn new(table: DispatchTable<H>) -> Self {
        Self { table }
    }

    /// The compiled table this dispatcher reads from.
    #[must_use]
    pub fn table(&self) -> &DispatchTable<H> {
        &self.table
    }

    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.table.variable_routes.strategy()
    }

    /// Maps `method` and `uri` to a handler.
    ///
    /// Lookup order:
    ///
    /// 1. static routes of `method`, then variable routes of `method`;
    /// 2. for `HEAD` only, the same with `GET`;
    /// 3. the same with the `*` method;
    /// 4. otherwise every other method whose routes match `uri` is collected
    ///    (static methods first, then variable methods, each in registration
    ///    order) into [`DispatchResult::MethodNotAllowed`], or
    ///    [`DispatchResult::NotFound`] if there are none.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method, compared case-sensitively (`GET`, `POST`, ...)
    /// * `uri` - Request path without query string (e.g., `/users/123`)
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// match dispatcher.dispatch("GET", "/users/123") {
    ///     DispatchResult::Found(m) => println!("user {}", m.variable("id").unwrap_or_default()),
    ///     DispatchResult::MethodNotAllowed(allowed) => println!("allow: {}", allowed.join(", ")),
    ///     DispatchResult::NotFound => println!("404"),
    /// }
    /// ```
    #[must_use]
    pub fn dispatch(&self, method: &str, uri: &str) -> DispatchResult<'_, H> {
        let start = Instant::now();
        let result = self.resolve(method, uri);
        let elapsed = start.elapsed();

        if elapsed > SLOW_DISPATCH {
            warn!(
                method = %method,
                uri = %uri,
                outcome = result.status(),
                duration_us = elapsed.as_micros(),
                strategy = %self.strategy(),
                "Slow route matching detected"
            );
        } else {
            match &result {
                DispatchResult::Found(matched) => debug!(
                    method = %method,
                    uri = %uri,
                    variables = ?matched.variables,
                    duration_us = elapsed.as_micros(),
                    "Route matched"
                ),
                DispatchResult::MethodNotAllowed(allowed) => debug!(
                    method = %method,
                    uri = %uri,
                    allowed = ?allowed,
                    duration_us = elapsed.as_micros(),
                    "Method not allowed"
                ),
                DispatchResult::NotFound => debug!(
                    method = %method,
                    uri = %uri,
                    duration_us = elapsed.as_micros(),
                    "No route matched"
                ),
            }
        }
        result
    }

    /// Dispatches an [`http::Request`] on its method and path.
    #[must_use]
    pub fn dispatch_request<B>(&self, request: &http::Request<B>) -> DispatchResult<'_, H> {
        self.dispatch(request.method().as_str(), request.uri().path())
    }

    fn resolve(&self, method: &str, uri: &str) -> DispatchResult<'_, H> {
        if let Some(found) = self.lookup(method, uri) {
            return DispatchResult::Found(found);
        }
        if method == http::Method::HEAD.as_str() {
            if let Some(found) = self.lookup(http::Method::GET.as_str(), uri) {
                return DispatchResult::Found(found);
            }
        }
        if let Some(found) = self.lookup(ANY_METHOD, uri) {
            return DispatchResult::Found(found);
        }

        let allowed = self.allowed_methods(method, uri);
        if allowed.is_empty() {
            DispatchResult::NotFound
        } else {
            DispatchResult::MethodNotAllowed(allowed)
        }
    }

    fn lookup(&self, method: &str, uri: &str) -> Option<Matched<'_, H>> {
        if let Some(target) = self
            .table
            .static_routes
            .get(uri)
            .and_then(|methods| methods.get(method))
        {
            return Some(matched(target, ParamVec::new()));
        }
        self.table
            .variable_routes
            .find(method, uri)
            .map(|(target, variables)| matched(target, variables))
    }

    /// Other methods that have a route for `uri`, first-seen order.
    fn allowed_methods(&self, method: &str, uri: &str) -> Vec<String> {
        let mut allowed: Vec<String> = Vec::new();
        if let Some(methods) = self.table.static_routes.get(uri) {
            allowed.extend(methods.keys().filter(|m| *m != method).cloned());
        }
        for candidate in self.table.variable_routes.methods() {
            if candidate == method || allowed.iter().any(|m| m == candidate) {
                continue;
            }
            if self.table.variable_routes.find(candidate, uri).is_some() {
                allowed.push(candidate.to_string());
            }
        }
        allowed
    }
}

fn matched<H>(target: &RouteTarget<H>, variables: ParamVec) -> Matched<'_, H> {
    Matched {
        handler: &target.handler,
        variables,
        extra: &target.extra,
    }
}
