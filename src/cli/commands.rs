use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use super::routes_file::RoutesFile;
use crate::cache::{content_key, FileCache, NullCache};
use crate::cached_dispatcher;
use crate::collector::RouteCollector;
use crate::config::RouterConfig;
use crate::dispatcher::{DispatchResult, Dispatcher};
use crate::generator::{Strategy, VariableRoutes};
use crate::uri::UriGenerator;

/// Command-line interface for routecraft
///
/// Compiles a routes file and answers dispatch and URI generation queries
/// against it.
#[derive(Debug, Parser)]
#[command(name = "routecraft", version)]
#[command(about = "Compile, inspect and query URL route tables", long_about = None)]
pub struct Cli {
    /// Router configuration file (YAML, JSON or TOML); ROUTECRAFT_* variables otherwise
    #[arg(long, global = true, env = "ROUTECRAFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that compiles a routes file
#[derive(Debug, Clone, clap::Args)]
pub struct RoutesArgs {
    /// Routes file (YAML, JSON or TOML)
    #[arg(short, long)]
    pub routes: PathBuf,

    /// Compilation strategy: mark_based or trie
    #[arg(short, long)]
    pub strategy: Option<Strategy>,

    /// Cache compiled routes in this directory, keyed by the file's content
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Dispatch one request and print the result as JSON
    Dispatch {
        #[command(flatten)]
        routes: RoutesArgs,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path
        #[arg(short, long)]
        uri: String,
    },
    /// Generate the path of a named route
    Uri {
        #[command(flatten)]
        routes: RoutesArgs,

        /// Route name
        #[arg(short, long)]
        name: String,

        /// Substitution as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Print the compiled route table
    Inspect {
        #[command(flatten)]
        routes: RoutesArgs,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got \"{s}\""))?;
    if key.is_empty() {
        return Err(format!("empty key in \"{s}\""));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse arguments from the process and run the selected command
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_command(&cli, &mut out)
}

/// Run `cli`, writing command output to `out`
pub fn run_command(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    let base = match &cli.config {
        Some(path) => RouterConfig::from_file(path)?,
        None => RouterConfig::from_env(),
    };

    match &cli.command {
        Commands::Dispatch {
            routes,
            method,
            uri,
        } => {
            let (dispatcher, _) = load(routes, &base)?;
            let result = dispatcher.dispatch(method, uri);
            writeln!(out, "{}", serde_json::to_string_pretty(&result_json(&result))?)?;
        }
        Commands::Uri {
            routes,
            name,
            params,
        } => {
            let (_, generator) = load(routes, &base)?;
            let generated = generator.for_route(name, params.iter().cloned())?;
            let mut line = generated.path;
            if !generated.unmatched_substitutions.is_empty() {
                let query: Vec<String> = generated
                    .unmatched_substitutions
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                line.push('?');
                line.push_str(&query.join("&"));
            }
            writeln!(out, "{line}")?;
        }
        Commands::Inspect { routes } => {
            let (dispatcher, generator) = load(routes, &base)?;
            inspect(&dispatcher, &generator, out)?;
        }
    }
    Ok(())
}

/// Compiles (or loads from cache) the routes named by `args`
fn load(
    args: &RoutesArgs,
    base: &RouterConfig,
) -> anyhow::Result<(Dispatcher<String>, UriGenerator)> {
    let (file, content) = RoutesFile::load(&args.routes)?;

    let mut config = base.clone();
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = Some(dir.clone());
    }
    config.cache_key = content_key(
        &format!("{}.{}", config.cache_key, config.strategy),
        &content,
    );

    let define = |collector: &mut RouteCollector<String>| file.register(collector);
    let loaded = match config.cache_dir.clone() {
        Some(dir) if !config.cache_disabled => {
            cached_dispatcher(&config, &FileCache::new(dir), define)
        }
        _ => cached_dispatcher(&config, &NullCache, define),
    }
    .with_context(|| format!("failed to compile routes from {}", args.routes.display()))?;

    info!(
        routes_file = %args.routes.display(),
        strategy = %config.strategy,
        cache_key = %config.cache_key,
        "Routes loaded"
    );
    Ok(loaded)
}

fn result_json(result: &DispatchResult<'_, String>) -> serde_json::Value {
    match result {
        DispatchResult::Found(matched) => {
            let variables: serde_json::Map<String, serde_json::Value> = matched
                .variables
                .iter()
                .map(|(k, v)| (k.to_string(), json!(v)))
                .collect();
            json!({
                "status": result.status(),
                "handler": matched.handler,
                "variables": variables,
                "extra": matched.extra,
            })
        }
        DispatchResult::MethodNotAllowed(allowed) => json!({
            "status": result.status(),
            "allowed_methods": allowed,
        }),
        DispatchResult::NotFound => json!({ "status": result.status() }),
    }
}

fn inspect(
    dispatcher: &Dispatcher<String>,
    generator: &UriGenerator,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let table = dispatcher.table();
    writeln!(out, "strategy: {}", dispatcher.strategy())?;

    writeln!(out, "static routes:")?;
    for (path, methods) in &table.static_routes {
        for (method, target) in methods {
            writeln!(out, "  {method:<7} {path} -> {}", target.handler)?;
        }
    }

    match &table.variable_routes {
        VariableRoutes::MarkBased(chunked) => {
            for (method, chunks) in &chunked.chunks {
                writeln!(out, "{method}: {} chunk(s)", chunks.len())?;
                for chunk in chunks {
                    let handlers: Vec<&str> = chunk
                        .routes
                        .iter()
                        .map(|r| r.target.handler.as_str())
                        .collect();
                    writeln!(out, "  {}", chunk.regex.as_str())?;
                    writeln!(out, "    -> {}", handlers.join(", "))?;
                }
            }
        }
        VariableRoutes::Trie(trie) => {
            writeln!(out, "methods: {}", trie.methods.join(", "))?;
            if let Some(regex) = trie.regex() {
                writeln!(out, "trie ({} leaves):", trie.leaf_count())?;
                writeln!(out, "  {}", regex.as_str())?;
            }
        }
    }

    if !generator.routes().is_empty() {
        writeln!(out, "named routes:")?;
        for (name, variants) in generator.routes() {
            let shapes: Vec<String> = variants.iter().map(ToString::to_string).collect();
            writeln!(out, "  {name}: {}", shapes.join(" | "))?;
        }
    }
    Ok(())
}

