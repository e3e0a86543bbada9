//! # URI Generation
//!
//! The reverse of dispatching: renders a concrete path for a named route from
//! a set of substitution values.
//!
//! A route registered as `/post/{id:\d+}[/{slug}]` under the name
//! `post.show` has two variants. Generation tries the longest one first and
//! falls back to shorter ones when substitutions are missing:
//!
//! ```rust,ignore
//! let uri = generator.for_route("post.show", [("id", "7"), ("slug", "hello")])?;
//! assert_eq!(uri.path, "/post/7/hello");
//!
//! let uri = generator.for_route("post.show", [("id", "7"), ("page", "2")])?;
//! assert_eq!(uri.path, "/post/7");
//! assert_eq!(uri.unmatched_substitutions["page"], "2");
//! ```
//!
//! Every value must fully match its placeholder's regex. Values are inserted
//! as given; percent-encoding is left to the caller.

use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;

use crate::error::{Result, UriCouldNotBeGenerated};
use crate::parser::{ParsedRoute, Segment};

/// Named routes: name → parsed variants, longest first.
pub type NamedRoutes = IndexMap<String, Vec<ParsedRoute>>;

/// A generated path and the substitutions it did not use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUri {
    pub path: String,
    /// Substitutions that are not placeholders of the chosen variant, in the
    /// order they were given. Typically appended as a query string.
    pub unmatched_substitutions: IndexMap<String, String>,
}

/// Renders paths for named routes.
#[derive(Debug, Clone, Default)]
pub struct UriGenerator {
    routes: NamedRoutes,
    /// Anchored placeholder regexes, keyed by pattern source.
    validators: HashMap<String, Regex>,
}

impl UriGenerator {
    /// Builds a generator and compiles every placeholder regex it may need.
    pub fn new(routes: NamedRoutes) -> Result<Self> {
        let mut validators = HashMap::new();
        for variants in routes.values() {
            for variant in variants {
                for segment in variant.segments() {
                    if let Segment::Placeholder { pattern, .. } = segment {
                        if !validators.contains_key(pattern) {
                            let anchored = Regex::new(&format!("^(?:{pattern})$"))?;
                            validators.insert(pattern.clone(), anchored);
                        }
                    }
                }
            }
        }
        Ok(Self { routes, validators })
    }

    #[must_use]
    pub fn routes(&self) -> &NamedRoutes {
        &self.routes
    }

    #[must_use]
    pub fn has_route(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Renders the route `name` with `substitutions`.
    ///
    /// # Errors
    ///
    /// - [`UriCouldNotBeGenerated::RouteIsUndefined`] for an unknown name
    /// - [`UriCouldNotBeGenerated::InsufficientParameters`] when no variant
    ///   has all its placeholders supplied; the shortest variant's missing
    ///   names are reported
    /// - [`UriCouldNotBeGenerated::ParameterDoesNotMatch`] when a value
    ///   does not match its placeholder's regex
    pub fn for_route<I, K, V>(
        &self,
        name: &str,
        substitutions: I,
    ) -> Result<GeneratedUri, UriCouldNotBeGenerated>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let variants = self
            .routes
            .get(name)
            .ok_or_else(|| UriCouldNotBeGenerated::RouteIsUndefined {
                name: name.to_string(),
            })?;
        let substitutions: IndexMap<String, String> = substitutions
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut missing = Vec::new();
        for variant in variants {
            missing = variant
                .placeholder_names()
                .filter(|p| !substitutions.contains_key(*p))
                .map(str::to_string)
                .collect();
            if missing.is_empty() {
                return self.render(name, variant, substitutions);
            }
        }

        Err(UriCouldNotBeGenerated::InsufficientParameters {
            name: name.to_string(),
            missing,
            given: substitutions.into_keys().collect(),
        })
    }

    fn render(
        &self,
        name: &str,
        variant: &ParsedRoute,
        mut substitutions: IndexMap<String, String>,
    ) -> Result<GeneratedUri, UriCouldNotBeGenerated> {
        let mut path = String::new();
        for segment in variant.segments() {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder {
                    name: parameter,
                    pattern,
                } => {
                    let value = substitutions.shift_remove(parameter).unwrap_or_default();
                    let valid = self
                        .validators
                        .get(pattern)
                        .is_some_and(|re| re.is_match(&value));
                    if !valid {
                        return Err(UriCouldNotBeGenerated::ParameterDoesNotMatch {
                            name: name.to_string(),
                            parameter: parameter.clone(),
                            pattern: pattern.clone(),
                        });
                    }
                    path.push_str(&value);
                }
            }
        }
        Ok(GeneratedUri {
            path,
            unmatched_substitutions: substitutions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{RouteParser, StdRouteParser};

    fn generator(routes: &[(&str, &str)]) -> UriGenerator {
        let mut named = NamedRoutes::new();
        for (name, pattern) in routes {
            let mut variants = StdRouteParser.parse(pattern).unwrap();
            variants.reverse();
            named.insert(name.to_string(), variants);
        }
        UriGenerator::new(named).unwrap()
    }

    #[test]
    fn test_generates_path() {
        let g = generator(&[("post.fetch", r"/post/{id:\d+}")]);
        let uri = g.for_route("post.fetch", [("id", "123")]).unwrap();
        assert_eq!(uri.path, "/post/123");
        assert!(uri.unmatched_substitutions.is_empty());
    }

    #[test]
    fn test_missing_parameter_is_named() {
        let g = generator(&[("post.fetch", r"/post/{id:\d+}")]);
        let err = g
            .for_route("post.fetch", Vec::<(String, String)>::new())
            .unwrap_err();
        assert_eq!(
            err,
            UriCouldNotBeGenerated::InsufficientParameters {
                name: "post.fetch".to_string(),
                missing: vec!["id".to_string()],
                given: vec![],
            }
        );
    }

    #[test]
    fn test_value_must_match_whole_regex() {
        let g = generator(&[("post.fetch", r"/post/{id:\d+}")]);
        for value in ["abc", "12a", "a12"] {
            let err = g.for_route("post.fetch", [("id", value)]).unwrap_err();
            assert!(
                matches!(err, UriCouldNotBeGenerated::ParameterDoesNotMatch { ref parameter, .. } if parameter == "id"),
                "{value}: {err:?}"
            );
        }
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let g = generator(&[("lang", "/{lang:en|de}")]);
        assert!(g.for_route("lang", [("lang", "de")]).is_ok());
        assert!(g.for_route("lang", [("lang", "english")]).is_err());
        assert!(g.for_route("lang", [("lang", "xde")]).is_err());
    }

    #[test]
    fn test_longest_variant_first_then_fallback() {
        let g = generator(&[("post.show", r"/post/{id:\d+}[/{slug}]")]);
        let uri = g
            .for_route("post.show", [("id", "7"), ("slug", "hello")])
            .unwrap();
        assert_eq!(uri.path, "/post/7/hello");

        let uri = g.for_route("post.show", [("page", "2"), ("id", "7")]).unwrap();
        assert_eq!(uri.path, "/post/7");
        assert_eq!(
            uri.unmatched_substitutions.into_iter().collect::<Vec<_>>(),
            vec![("page".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_unknown_route() {
        let g = generator(&[]);
        let err = g.for_route("nope", [("a", "b")]).unwrap_err();
        assert_eq!(err.to_string(), "there is no route with name \"nope\" defined");
    }
}
