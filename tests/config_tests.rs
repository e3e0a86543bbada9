use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use routecraft::config::{Format, DEFAULT_CACHE_KEY};
use routecraft::{RouterConfig, Strategy};
use tempfile::tempdir;

fn from_vars(vars: &[(&str, &str)]) -> RouterConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    RouterConfig::from_lookup(|name| vars.get(name).cloned())
}

#[test]
fn test_defaults_without_variables() {
    let config = from_vars(&[]);
    assert_eq!(config, RouterConfig::default());
    assert_eq!(config.strategy, Strategy::MarkBased);
    assert_eq!(config.cache_key, DEFAULT_CACHE_KEY);
    assert!(!config.cache_disabled);
    assert!(config.cache_dir.is_none());
}

#[test]
fn test_environment_overrides() {
    let config = from_vars(&[
        ("ROUTECRAFT_STRATEGY", "trie"),
        ("ROUTECRAFT_CHUNK_SIZE", "12"),
        ("ROUTECRAFT_CACHE_DISABLED", "yes"),
        ("ROUTECRAFT_CACHE_KEY", "shop.routes"),
        ("ROUTECRAFT_CACHE_DIR", "/var/cache/shop"),
    ]);
    assert_eq!(config.strategy, Strategy::Trie);
    assert_eq!(config.approx_chunk_size, Some(12));
    assert!(config.cache_disabled);
    assert_eq!(config.cache_key, "shop.routes");
    assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/shop")));
}

#[test]
fn test_invalid_values_fall_back_to_defaults() {
    let config = from_vars(&[
        ("ROUTECRAFT_STRATEGY", "radix"),
        ("ROUTECRAFT_CHUNK_SIZE", "0"),
        ("ROUTECRAFT_CACHE_DISABLED", "maybe"),
        ("ROUTECRAFT_CACHE_KEY", "   "),
        ("ROUTECRAFT_CACHE_DIR", ""),
    ]);
    assert_eq!(config, RouterConfig::default());
}

#[test]
fn test_from_yaml_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("router.yaml");
    fs::write(
        &path,
        "strategy: trie\napprox_chunk_size: 20\ncache_key: shop.routes\n",
    )
    .unwrap();
    let config = RouterConfig::from_file(&path).unwrap();
    assert_eq!(config.strategy, Strategy::Trie);
    assert_eq!(config.approx_chunk_size, Some(20));
    assert_eq!(config.cache_key, "shop.routes");
    assert!(!config.cache_disabled);
}

#[test]
fn test_from_json_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("router.json");
    fs::write(&path, r#"{"cache_disabled": true, "cache_dir": "/tmp/routes"}"#).unwrap();
    let config = RouterConfig::from_file(&path).unwrap();
    assert_eq!(config.strategy, Strategy::MarkBased);
    assert!(config.cache_disabled);
    assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/routes")));
}

#[test]
fn test_from_toml_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("router.toml");
    fs::write(&path, "strategy = \"mark_based\"\ncache_key = \"api\"\n").unwrap();
    let config = RouterConfig::from_file(&path).unwrap();
    assert_eq!(config.strategy, Strategy::MarkBased);
    assert_eq!(config.cache_key, "api");
}

#[test]
fn test_file_errors_name_the_path() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");
    let err = RouterConfig::from_file(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("absent.yaml"), "{err:#}");

    let bad = dir.path().join("bad.yml");
    fs::write(&bad, "strategy: [not, a, strategy]\n").unwrap();
    let err = RouterConfig::from_file(&bad).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config"), "{err:#}");
}

#[test]
fn test_format_from_extension() {
    assert_eq!(Format::from_path(&PathBuf::from("a.yml")), Format::Yaml);
    assert_eq!(Format::from_path(&PathBuf::from("a.yaml")), Format::Yaml);
    assert_eq!(Format::from_path(&PathBuf::from("a.toml")), Format::Toml);
    assert_eq!(Format::from_path(&PathBuf::from("a.json")), Format::Json);
    assert_eq!(Format::from_path(&PathBuf::from("routes")), Format::Json);
}
