//! # Error Module
//!
//! All errors in this crate are configuration-time mistakes: a malformed route
//! pattern, two routes competing for the same path, or a URI that cannot be
//! generated from the values supplied. None of them are transient, so nothing
//! here is retried.
//!
//! Dispatching never fails. "No route matched" is reported through
//! [`DispatchResult`](crate::dispatcher::DispatchResult), not through [`Error`].

use thiserror::Error;

/// A route pattern that cannot be parsed or registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadRoute {
    /// The number of `[` does not match the number of trailing `]`.
    #[error("number of opening '[' and closing ']' does not match in route \"{route}\"")]
    UnbalancedOptionals { route: String },

    /// A `]` appears somewhere other than the end of the pattern.
    #[error("optional segments can only occur at the end of route \"{route}\"")]
    OptionalNotAtEnd { route: String },

    /// `[]` with nothing inside.
    #[error("empty optional part in route \"{route}\"")]
    EmptyOptional { route: String },

    /// The same placeholder is declared twice in one expansion of a pattern.
    #[error("cannot use the same placeholder \"{name}\" twice in route \"{route}\"")]
    DuplicatePlaceholder { name: String, route: String },

    /// A placeholder constraint contains a capturing group.
    #[error("regex \"{pattern}\" for parameter \"{name}\" contains a capturing group")]
    CapturingGroup { name: String, pattern: String },

    /// The regex engine rejected a placeholder constraint.
    #[error("regex \"{pattern}\" for parameter \"{name}\" is invalid: {reason}")]
    InvalidPattern {
        name: String,
        pattern: String,
        reason: String,
    },

    /// Two routes were registered under the same name.
    #[error("cannot register two routes under the name \"{name}\"")]
    DuplicateRouteName { name: String },

    /// The reserved `_name` extra parameter is not a non-empty string.
    #[error("route name must be a non-empty string, got {value}")]
    InvalidRouteName { value: String },
}

/// Reasons a URI could not be produced by [`UriGenerator`](crate::uri::UriGenerator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriCouldNotBeGenerated {
    #[error("there is no route with name \"{name}\" defined")]
    RouteIsUndefined { name: String },

    #[error(
        "route \"{name}\" expects at least parameter values for [{}], but received [{}]",
        .missing.join(","),
        .given.join(",")
    )]
    InsufficientParameters {
        name: String,
        missing: Vec<String>,
        given: Vec<String>,
    },

    #[error("route \"{name}\" expects the parameter [{parameter}] to match the regex `{pattern}`")]
    ParameterDoesNotMatch {
        name: String,
        parameter: String,
        pattern: String,
    },
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    BadRoute(#[from] BadRoute),

    #[error("cannot register two routes matching \"{route}\" for method \"{method}\"")]
    DuplicateRoute { method: String, route: String },

    #[error(
        "static route \"{route}\" is shadowed by previously defined variable route \"{shadowed_by}\" for method \"{method}\""
    )]
    ShadowedRoute {
        method: String,
        route: String,
        shadowed_by: String,
    },

    #[error(transparent)]
    UriCouldNotBeGenerated(#[from] UriCouldNotBeGenerated),

    /// A cached blob is not a well-formed route table. Caches treat this as a miss.
    #[error("cache entry \"{key}\" is invalid: {reason}")]
    InvalidCacheEntry { key: String, reason: String },

    #[error("failed to compile route regex: {0}")]
    Compile(#[from] regex::Error),

    #[error("cache i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize route data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
