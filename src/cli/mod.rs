//! # CLI Module
//!
//! Command-line access to a route table defined in a file.
//!
//! ## Commands
//!
//! ### `dispatch`
//!
//! Match one request and print the outcome as JSON:
//!
//! ```bash
//! routecraft dispatch --routes routes.yaml --method GET --uri /post/7
//! ```
//!
//! ### `uri`
//!
//! Render the path of a named route. Parameters that are not placeholders of
//! the route are appended as a query string:
//!
//! ```bash
//! routecraft uri --routes routes.yaml --name post.show --param id=7 --param page=2
//! ```
//!
//! ### `inspect`
//!
//! Print the static routes, the compiled regexes and the named routes:
//!
//! ```bash
//! routecraft inspect --routes routes.yaml --strategy trie
//! ```
//!
//! ## Common Options
//!
//! - `--strategy <mark_based|trie>` overrides the configured strategy
//! - `--cache-dir <DIR>` stores the compiled table under a key derived from
//!   the routes file's SHA-256, so unchanged files load without compiling
//! - `--config <FILE>` reads [`RouterConfig`](crate::config::RouterConfig)
//!   from a file instead of `ROUTECRAFT_*` variables
//!
//! The routes file format is described in [`routes_file`].

mod commands;
pub mod routes_file;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, run_command, Cli, Commands, RoutesArgs};
