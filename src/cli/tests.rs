//! Unit tests for CLI commands

use crate::cli::{run_command, Cli, Commands};
use clap::Parser;
use std::path::Path;

const ROUTES_YAML: &str = r#"
routes:
  - method: GET
    pattern: /
    handler: index
  - methods: [GET, HEAD]
    pattern: "/post/{id:\\d+}[/{slug}]"
    handler: show_post
    name: post.show
  - method: POST
    pattern: /post
    handler: create_post
groups:
  - prefix: /admin
    routes:
      - method: "*"
        pattern: /{page}
        handler: admin
"#;

fn write_routes(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("routes.yaml");
    std::fs::write(&path, ROUTES_YAML).unwrap();
    path
}

fn run(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    run_command(&cli, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_dispatch_command_parses() {
    let cli = Cli::try_parse_from([
        "routecraft",
        "dispatch",
        "--routes",
        "routes.yaml",
        "--method",
        "POST",
        "--uri",
        "/post",
        "--strategy",
        "trie",
    ])
    .unwrap();

    match cli.command {
        Commands::Dispatch {
            routes,
            method,
            uri,
        } => {
            assert_eq!(routes.routes.to_string_lossy(), "routes.yaml");
            assert_eq!(routes.strategy, Some(crate::Strategy::Trie));
            assert_eq!(method, "POST");
            assert_eq!(uri, "/post");
        }
        _ => panic!("Expected Dispatch command"),
    }
}

#[test]
fn test_invalid_arguments_are_rejected() {
    assert!(Cli::try_parse_from(["routecraft", "dispatch", "--uri", "/"]).is_err());
    assert!(Cli::try_parse_from([
        "routecraft", "inspect", "--routes", "r.yaml", "--strategy", "radix"
    ])
    .is_err());
    assert!(Cli::try_parse_from([
        "routecraft", "uri", "--routes", "r.yaml", "--name", "x", "--param", "novalue"
    ])
    .is_err());
}

#[test]
fn test_dispatch_prints_json_result() {
    let dir = tempfile::tempdir().unwrap();
    let routes = write_routes(dir.path());
    let routes = routes.to_str().unwrap();

    for strategy in ["mark_based", "trie"] {
        let output = run(&[
            "routecraft", "dispatch", "-r", routes, "-s", strategy, "-m", "HEAD", "-u", "/post/7/hi",
        ]);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["status"], "found");
        assert_eq!(value["handler"], "show_post");
        assert_eq!(value["variables"]["id"], "7");
        assert_eq!(value["variables"]["slug"], "hi");
        assert_eq!(value["extra"]["_name"], "post.show");

        let output = run(&[
            "routecraft", "dispatch", "-r", routes, "-s", strategy, "-m", "DELETE", "-u", "/post",
        ]);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["status"], "method_not_allowed");
        assert_eq!(value["allowed_methods"], serde_json::json!(["POST"]));

        let output = run(&[
            "routecraft", "dispatch", "-r", routes, "-s", strategy, "-m", "PUT", "-u", "/admin/users",
        ]);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["handler"], "admin");
    }
}

#[test]
fn test_uri_command_appends_unused_params() {
    let dir = tempfile::tempdir().unwrap();
    let routes = write_routes(dir.path());
    let routes = routes.to_str().unwrap();

    let output = run(&[
        "routecraft", "uri", "-r", routes, "-n", "post.show", "-p", "id=7", "-p", "page=2",
    ]);
    assert_eq!(output.trim(), "/post/7?page=2");
}

#[test]
fn test_inspect_with_file_cache() {
    let dir = tempfile::tempdir().unwrap();
    let routes = write_routes(dir.path());
    let routes = routes.to_str().unwrap();
    let cache_dir = dir.path().join("cache");
    let cache = cache_dir.to_str().unwrap();

    let first = run(&["routecraft", "inspect", "-r", routes, "-s", "trie", "--cache-dir", cache]);
    assert!(first.contains("strategy: trie"));
    assert!(first.contains("post.show"));
    assert_eq!(std::fs::read_dir(&cache_dir).unwrap().count(), 1);

    let second = run(&["routecraft", "inspect", "-r", routes, "-s", "trie", "--cache-dir", cache]);
    assert_eq!(first, second);
}
