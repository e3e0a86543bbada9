use std::cell::Cell;
use std::fs;

use routecraft::cache::content_key;
use routecraft::{
    cached_dispatcher, Cache, FileCache, MemoryCache, NullCache, Result, RouteCollector,
    RouteData, RouterConfig, Strategy,
};
use tempfile::tempdir;

fn define(r: &mut RouteCollector<String>) -> Result<()> {
    r.get("/users", "list_users".to_string())?;
    r.get("/users/{id:\\d+}", "get_user".to_string())?;
    r.post("/users/{id:\\d+}/avatar", "upload_avatar".to_string())?;
    Ok(())
}

fn counted_loader<'a>(
    calls: &'a Cell<usize>,
    strategy: Strategy,
) -> impl FnOnce() -> Result<RouteData<String>> + 'a {
    move || {
        calls.set(calls.get() + 1);
        let mut collector = RouteCollector::new(strategy);
        define(&mut collector)?;
        collector.into_route_data()
    }
}

fn assert_user_route(data: RouteData<String>) {
    let (dispatcher, _) = data.into_parts().unwrap();
    let m = dispatcher.dispatch("GET", "/users/12").found().unwrap();
    assert_eq!(m.handler, "get_user");
    assert_eq!(m.variable("id"), Some("12"));
}

#[test]
fn test_memory_cache_runs_loader_once() {
    let cache = MemoryCache::new();
    let calls = Cell::new(0);
    for strategy in [Strategy::MarkBased, Strategy::Trie] {
        let key = format!("routes.{strategy}");
        let first = cache.get(&key, counted_loader(&calls, strategy)).unwrap();
        let second = cache.get(&key, counted_loader(&calls, strategy)).unwrap();
        assert_user_route(first);
        assert_user_route(second);
    }
    assert_eq!(calls.get(), 2);
    assert_eq!(cache.len(), 2);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_memory_cache_invalid_entry_is_a_miss() {
    let cache = MemoryCache::new();
    cache.insert_raw("routes", "{\"table\": 42}");
    let calls = Cell::new(0);
    let data = cache
        .get("routes", counted_loader(&calls, Strategy::MarkBased))
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_user_route(data);

    // the invalid entry was replaced
    cache
        .get("routes", counted_loader(&calls, Strategy::MarkBased))
        .unwrap();
    assert_eq!(calls.get(), 1);
}

fn single_route_blob(strategy: Strategy) -> String {
    let mut collector = RouteCollector::new(strategy);
    collector.get("/u/{id}", "get_user".to_string()).unwrap();
    serde_json::to_string(&collector.into_route_data().unwrap()).unwrap()
}

#[test]
fn test_entry_with_mismatched_mark_is_a_miss() {
    let blob = single_route_blob(Strategy::MarkBased);
    assert!(blob.contains("\"mark\":2"), "{blob}");
    let tampered = blob.replace("\"mark\":2", "\"mark\":0");

    let cache = MemoryCache::new();
    cache.insert_raw("routes", tampered);
    let calls = Cell::new(0);
    let data = cache
        .get("routes", counted_loader(&calls, Strategy::MarkBased))
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_user_route(data);
}

#[test]
fn test_entry_with_out_of_range_trie_group_is_a_miss() {
    let blob = single_route_blob(Strategy::Trie);
    assert!(blob.contains("\"groups\":[1]"), "{blob}");
    let tampered = blob.replace("\"groups\":[1]", "\"groups\":[9]");

    let dir = tempdir().unwrap();
    let cache = FileCache::new(dir.path());
    fs::write(cache.path_for("routes"), tampered).unwrap();
    let calls = Cell::new(0);
    let data = cache
        .get("routes", counted_loader(&calls, Strategy::Trie))
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_user_route(data);
}

#[test]
fn test_memory_cache_loader_error_is_not_stored() {
    let cache = MemoryCache::new();
    let err = cache
        .get::<String, _>("routes", || {
            let mut collector = RouteCollector::new(Strategy::Trie);
            collector.get("/a", "a".to_string())?;
            collector.get("/a", "b".to_string())?;
            collector.into_route_data()
        })
        .unwrap_err();
    assert!(err.to_string().contains("/a"), "{err}");
    assert!(cache.is_empty());
}

#[test]
fn test_file_cache_persists_between_instances() {
    let dir = tempdir().unwrap();
    let calls = Cell::new(0);

    let data = FileCache::new(dir.path())
        .get("app.routes", counted_loader(&calls, Strategy::Trie))
        .unwrap();
    assert_user_route(data);
    assert!(dir.path().join("app.routes.json").exists());

    let data = FileCache::new(dir.path())
        .get("app.routes", counted_loader(&calls, Strategy::Trie))
        .unwrap();
    assert_user_route(data);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_file_cache_recovers_from_corrupt_entry() {
    let dir = tempdir().unwrap();
    let cache = FileCache::new(dir.path().join("nested"));
    let path = cache.path_for("routes");
    fs::create_dir_all(cache.dir()).unwrap();
    fs::write(&path, "not json at all").unwrap();

    let calls = Cell::new(0);
    let data = cache
        .get("routes", counted_loader(&calls, Strategy::MarkBased))
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_user_route(data);

    let stored = fs::read_to_string(&path).unwrap();
    assert!(stored.starts_with('{'));
    let leftovers: Vec<_> = fs::read_dir(cache.dir())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_null_cache_always_loads() {
    let calls = Cell::new(0);
    for _ in 0..3 {
        NullCache
            .get("routes", counted_loader(&calls, Strategy::Trie))
            .unwrap();
    }
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_cached_dispatcher_uses_cache() {
    let cache = MemoryCache::new();
    let config = RouterConfig::default();
    let calls = Cell::new(0);
    for _ in 0..2 {
        let (dispatcher, _) = cached_dispatcher(&config, &cache, |r| {
            calls.set(calls.get() + 1);
            define(r)
        })
        .unwrap();
        assert!(dispatcher.dispatch("POST", "/users/3/avatar").is_found());
    }
    assert_eq!(calls.get(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_cached_dispatcher_bypasses_disabled_cache() {
    let cache = MemoryCache::new();
    let config = RouterConfig {
        cache_disabled: true,
        ..RouterConfig::default()
    };
    let calls = Cell::new(0);
    for _ in 0..2 {
        cached_dispatcher(&config, &cache, |r| {
            calls.set(calls.get() + 1);
            define(r)
        })
        .unwrap();
    }
    assert_eq!(calls.get(), 2);
    assert!(cache.is_empty());
}

#[test]
fn test_content_key_tracks_route_definitions() {
    let a = content_key("routes", b"GET /users");
    let b = content_key("routes", b"GET /users/{id}");
    assert_ne!(a, b);
    assert!(a.starts_with("routes-"));
}
