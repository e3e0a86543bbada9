#![allow(dead_code)]

use routecraft::{
    simple_dispatcher, DispatchResult, Dispatcher, Result, RouteCollector, Strategy, UriGenerator,
};

/// Every compilation strategy; dispatch tests run once per entry.
pub const STRATEGIES: [Strategy; 2] = [Strategy::MarkBased, Strategy::Trie];

pub fn build<F>(strategy: Strategy, define: F) -> (Dispatcher<&'static str>, UriGenerator)
where
    F: FnOnce(&mut RouteCollector<&'static str>) -> Result<()>,
{
    simple_dispatcher(strategy, define)
        .unwrap_or_else(|e| panic!("failed to build {strategy} dispatcher: {e}"))
}

pub fn assert_found(
    dispatcher: &Dispatcher<&'static str>,
    method: &str,
    uri: &str,
    expected_handler: &str,
    expected_vars: &[(&str, &str)],
) {
    match dispatcher.dispatch(method, uri) {
        DispatchResult::Found(m) => {
            assert_eq!(
                *m.handler, expected_handler,
                "Handler mismatch for {method} {uri} ({})",
                dispatcher.strategy()
            );
            let vars: Vec<(&str, &str)> = m
                .variables
                .iter()
                .map(|(k, v)| (k.as_ref(), v.as_str()))
                .collect();
            assert_eq!(
                vars,
                expected_vars,
                "Variables mismatch for {method} {uri} ({})",
                dispatcher.strategy()
            );
        }
        other => panic!(
            "Expected {method} {uri} to match {expected_handler} ({}), got {other:?}",
            dispatcher.strategy()
        ),
    }
}

pub fn assert_not_found(dispatcher: &Dispatcher<&'static str>, method: &str, uri: &str) {
    assert_eq!(
        dispatcher.dispatch(method, uri),
        DispatchResult::NotFound,
        "Expected {method} {uri} to be not found ({})",
        dispatcher.strategy()
    );
}

pub fn assert_not_allowed(
    dispatcher: &Dispatcher<&'static str>,
    method: &str,
    uri: &str,
    allowed: &[&str],
) {
    let expected: Vec<String> = allowed.iter().map(|m| m.to_string()).collect();
    assert_eq!(
        dispatcher.dispatch(method, uri),
        DispatchResult::MethodNotAllowed(expected),
        "Allowed methods mismatch for {method} {uri} ({})",
        dispatcher.strategy()
    );
}
