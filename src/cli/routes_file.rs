//! Route definitions read from a YAML, JSON or TOML file.
//!
//! ```yaml
//! routes:
//!   - method: GET
//!     pattern: /
//!     handler: index
//!   - methods: [GET, HEAD]
//!     pattern: "/post/{id:\\d+}[/{slug}]"
//!     handler: show_post
//!     name: post.show
//! groups:
//!   - prefix: /admin
//!     routes:
//!       - method: "*"
//!         pattern: /{page}
//!         handler: admin
//! ```

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

use crate::collector::RouteCollector;
use crate::config::Format;
use crate::error::Result;
use crate::route::{ExtraParameters, ROUTE_NAME};

/// Method used when an entry names none.
const DEFAULT_METHOD: &str = "GET";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutesFile {
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteEntry {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    pub pattern: String,
    pub handler: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub extra: ExtraParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupEntry {
    pub prefix: String,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

impl RoutesFile {
    /// Reads a routes file; returns the definitions and the raw bytes.
    pub fn load(path: &Path) -> anyhow::Result<(Self, Vec<u8>)> {
        let content = std::fs::read(path)
            .with_context(|| format!("failed to read routes file {}", path.display()))?;
        let text = std::str::from_utf8(&content)
            .with_context(|| format!("routes file {} is not UTF-8", path.display()))?;
        let file = Format::from_path(path)
            .parse(text)
            .with_context(|| format!("failed to parse routes file {}", path.display()))?;
        Ok((file, content))
    }

    /// Registers every route and group, in file order.
    pub fn register(&self, collector: &mut RouteCollector<String>) -> Result<()> {
        register_all(collector, &self.routes, &self.groups)
    }
}

fn register_all(
    collector: &mut RouteCollector<String>,
    routes: &[RouteEntry],
    groups: &[GroupEntry],
) -> Result<()> {
    for route in routes {
        route.register(collector)?;
    }
    for group in groups {
        collector.add_group(&group.prefix, |inner| {
            register_all(inner, &group.routes, &group.groups)
        })?;
    }
    Ok(())
}

impl RouteEntry {
    fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.method.iter().cloned().collect();
        methods.extend(self.methods.iter().cloned());
        if methods.is_empty() {
            methods.push(DEFAULT_METHOD.to_string());
        }
        methods
    }

    fn register(&self, collector: &mut RouteCollector<String>) -> Result<()> {
        let mut extra = self.extra.clone();
        if let Some(name) = &self.name {
            extra.insert(ROUTE_NAME.to_string(), serde_json::Value::String(name.clone()));
        }
        collector.add_route_with_extra(self.methods(), &self.pattern, self.handler.clone(), extra)?;
        Ok(())
    }
}
