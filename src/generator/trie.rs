//! Hierarchical trie compilation.
//!
//! Variable routes of every method are folded into one prefix tree keyed by
//! their regex text and emitted as a single nested alternation. The subject
//! matched against it is the URI, a NUL byte, and the method:
//!
//! ```text
//! ^(?:/user/(?:([^/]+)\x00(?:GET|HEAD)(?P<m0>)|([^/]+)/edit\x00(?:GET)(?P<m1>)))$
//! ```
//!
//! Putting the method in the subject keeps the engine's leftmost-first
//! priority per method: a route of another method can never hide a later
//! route of the requested one. Routes that share a regex and were registered
//! back to back collapse into one leaf with a handler per method.
//!
//! Only literal prefixes are shared (see
//! [`AtomMemo`](crate::regex_util::AtomMemo)); a branch point never comes
//! after a placeholder group, whose variable length would otherwise let a
//! later route win over an earlier one. A new route only ever merges into
//! the most recently inserted branch, which keeps the emission order equal
//! to registration order.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::mark_based::{check_mark, check_variable_groups, collect_params};
use super::{regex_serde, DataGenerator, DispatchTable, RouteRegistry, VariableRoutes};
use crate::dispatcher::ParamVec;
use crate::error::Result;
use crate::parser::ParsedRoute;
use crate::regex_util::AtomMemo;
use crate::route::{ExtraParameters, Route, RouteTarget};

/// Separates the URI from the method in the matched subject.
const METHOD_SEPARATOR: char = '\0';

/// Generator for [`Strategy::Trie`](super::Strategy::Trie).
#[derive(Debug, Clone)]
pub struct TrieGenerator<H> {
    registry: RouteRegistry<H>,
}

impl<H: Clone> Default for TrieGenerator<H> {
    fn default() -> Self {
        Self {
            registry: RouteRegistry::new(),
        }
    }
}

impl<H: Clone> TrieGenerator<H> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: Clone> DataGenerator<H> for TrieGenerator<H> {
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
        let routes = self.registry.variable_routes();
        let mut memo = AtomMemo::new();

        let mut root = Node::new(String::new());
        for route in routes {
            root.insert(route, &mut memo);
        }

        let mut methods: Vec<String> = Vec::new();
        for route in routes {
            if !methods.contains(&route.method) {
                methods.push(route.method.clone());
            }
        }

        let matcher = if routes.is_empty() {
            None
        } else {
            let mut emitter = Emitter {
                memo: &mut memo,
                pattern: String::from("^"),
                next_group: 1,
                leaves: Vec::new(),
            };
            emitter.node(&root, 0, &mut Vec::new());
            emitter.pattern.push('$');
            Some(TrieMatcher {
                regex: regex_serde::build(&emitter.pattern)?,
                leaves: emitter.leaves,
            })
        };

        let trie = TrieRoutes { methods, matcher };
        info!(
            strategy = "trie",
            static_routes = self.registry.static_routes().values().map(IndexMap::len).sum::<usize>(),
            variable_routes = routes.len(),
            leaves = trie.leaf_count(),
            regex_len = trie.regex().map_or(0, |r| r.as_str().len()),
            "Dispatch table compiled"
        );
        let table = DispatchTable {
            static_routes: self.registry.static_routes().clone(),
            variable_routes: VariableRoutes::Trie(trie),
        };
        Ok(table)
    }
}

enum Child<H> {
    Node(Node<H>),
    Leaf(PendingLeaf<H>),
}

impl<H> Child<H> {
    fn key(&self) -> &str {
        match self {
            Child::Node(node) => &node.prefix,
            Child::Leaf(leaf) => &leaf.regex,
        }
    }
}

/// Routes sharing `prefix`, the full regex text from the root.
struct Node<H> {
    prefix: String,
    children: Vec<Child<H>>,
}

/// Routes of one regex, one target per method.
struct PendingLeaf<H> {
    regex: String,
    targets: IndexMap<String, RouteTarget<H>>,
}

impl<H: Clone> PendingLeaf<H> {
    fn new(route: &Route<H>) -> Self {
        let mut targets = IndexMap::new();
        targets.insert(route.method.clone(), route.target());
        Self {
            regex: route.regex.clone(),
            targets,
        }
    }
}

impl<H: Clone> Node<H> {
    fn new(prefix: String) -> Self {
        Self {
            prefix,
            children: Vec::new(),
        }
    }

    fn insert(&mut self, route: &Route<H>, memo: &mut AtomMemo) {
        let own = self.prefix.len();

        if let Some(last) = self.children.last_mut() {
            if let Child::Leaf(leaf) = &mut *last {
                if leaf.regex == route.regex {
                    leaf.targets.insert(route.method.clone(), route.target());
                    return;
                }
            }

            let common = memo.common_literal_prefix_len(last.key(), &route.regex);
            if common > own {
                if let Child::Node(node) = &mut *last {
                    if common == node.prefix.len() {
                        node.insert(route, memo);
                        return;
                    }
                }
                let split = Child::Node(Node::new(route.regex[..common].to_string()));
                let previous = std::mem::replace(last, split);
                if let Child::Node(node) = last {
                    node.children.push(previous);
                    node.children.push(Child::Leaf(PendingLeaf::new(route)));
                }
                return;
            }
        }

        self.children.push(Child::Leaf(PendingLeaf::new(route)));
    }
}

/// Writes the nested alternation and records where each leaf's groups are.
struct Emitter<'m, H> {
    memo: &'m mut AtomMemo,
    pattern: String,
    next_group: usize,
    leaves: Vec<TrieLeaf<H>>,
}

impl<H: Clone> Emitter<'_, H> {
    fn node(&mut self, node: &Node<H>, from: usize, groups: &mut Vec<usize>) {
        self.text(&node.prefix, from, groups);
        self.pattern.push_str("(?:");
        for (n, child) in node.children.iter().enumerate() {
            if n > 0 {
                self.pattern.push('|');
            }
            let depth = groups.len();
            match child {
                Child::Node(inner) => self.node(inner, node.prefix.len(), groups),
                Child::Leaf(leaf) => self.leaf(leaf, node.prefix.len(), groups),
            }
            groups.truncate(depth);
        }
        self.pattern.push(')');
    }

    fn leaf(&mut self, leaf: &PendingLeaf<H>, from: usize, groups: &mut Vec<usize>) {
        self.text(&leaf.regex, from, groups);

        self.pattern.push_str(r"\x00(?:");
        for (n, method) in leaf.targets.keys().enumerate() {
            if n > 0 {
                self.pattern.push('|');
            }
            self.pattern.push_str(&regex::escape(method));
        }
        self.pattern.push(')');

        let mark = self.next_group;
        self.next_group += 1;
        self.pattern.push_str("(?P<m");
        self.pattern.push_str(&self.leaves.len().to_string());
        self.pattern.push_str(">)");

        self.leaves.push(TrieLeaf {
            mark,
            groups: groups.clone(),
            targets: leaf.targets.clone(),
        });
    }

    /// Emits `regex[from..]` and assigns indices to the groups in it.
    fn text(&mut self, regex: &str, from: usize, groups: &mut Vec<usize>) {
        self.pattern.push_str(&regex[from..]);
        for _ in 0..self.memo.groups_between(regex, from, regex.len()) {
            groups.push(self.next_group);
            self.next_group += 1;
        }
    }
}

/// Compiled trie: one regex over every method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrieRoutes<H> {
    /// Methods with variable routes, in first-registration order.
    pub methods: Vec<String>,
    pub matcher: Option<TrieMatcher<H>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrieMatcher<H> {
    #[serde(with = "regex_serde")]
    pub regex: Regex,
    pub leaves: Vec<TrieLeaf<H>>,
}

/// A leaf of the compiled trie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrieLeaf<H> {
    /// Index of the leaf's mark group.
    pub mark: usize,
    /// Indices of the groups holding the leaf's variables, in order.
    pub groups: Vec<usize>,
    pub targets: IndexMap<String, RouteTarget<H>>,
}

impl<H> TrieRoutes<H> {
    pub fn find(&self, method: &str, uri: &str) -> Option<(&RouteTarget<H>, ParamVec)> {
        let matcher = self.matcher.as_ref()?;
        if !self.methods.iter().any(|m| m == method) {
            return None;
        }

        let mut subject = String::with_capacity(uri.len() + method.len() + 1);
        subject.push_str(uri);
        subject.push(METHOD_SEPARATOR);
        subject.push_str(method);

        let caps = matcher.regex.captures(&subject)?;
        let leaf = matcher.leaves.iter().find(|l| caps.get(l.mark).is_some())?;
        let target = leaf.targets.get(method)?;
        let params = collect_params(&caps, &target.variables, leaf.groups.iter().copied());
        Some((target, params))
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(String::as_str)
    }

    #[must_use]
    pub fn regex(&self) -> Option<&Regex> {
        self.matcher.as_ref().map(|m| &m.regex)
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.matcher.as_ref().map_or(0, |m| m.leaves.len())
    }

    /// Checks that every leaf's mark and variable groups exist in the regex
    /// and that each target has one group per variable.
    pub fn validate(&self) -> Result<(), String> {
        let Some(matcher) = &self.matcher else {
            return Ok(());
        };
        let names: Vec<Option<&str>> = matcher.regex.capture_names().collect();
        for (n, leaf) in matcher.leaves.iter().enumerate() {
            check_mark(&names, leaf.mark, n)?;
            check_variable_groups(&names, leaf.groups.iter().copied())?;
            for (method, target) in &leaf.targets {
                if target.variables.len() != leaf.groups.len() {
                    return Err(format!(
                        "leaf m{n} has {} group(s) but {method} expects {} variable(s)",
                        leaf.groups.len(),
                        target.variables.len()
                    ));
                }
            }
        }
        Ok(())
    }
}
