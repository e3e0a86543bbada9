use super::*;
use crate::generator::{DataGenerator, Strategy};
use crate::parser::{RouteParser, StdRouteParser};
use crate::route::{ExtraParameters, ROUTE_NAME};

fn build(strategy: Strategy, routes: &[(&str, &str, &'static str)]) -> Dispatcher<&'static str> {
    let mut generator = strategy.generator(None);
    for (method, pattern, handler) in routes {
        for parsed in StdRouteParser.parse(pattern).unwrap() {
            generator
                .add_route(method, &parsed, *handler, ExtraParameters::new())
                .unwrap();
        }
    }
    Dispatcher::new(generator.compile().unwrap())
}

fn strategies() -> [Strategy; 2] {
    [Strategy::MarkBased, Strategy::Trie]
}

#[test]
fn test_static_lookup_has_no_variables() {
    for strategy in strategies() {
        let d = build(strategy, &[("GET", "/about", "about")]);
        let m = d.dispatch("GET", "/about").found().unwrap();
        assert_eq!(*m.handler, "about");
        assert!(m.variables.is_empty());
    }
}

#[test]
fn test_head_falls_back_to_get() {
    for strategy in strategies() {
        let d = build(strategy, &[("GET", "/x", "get"), ("GET", "/v/{id}", "get_v")]);
        assert_eq!(*d.dispatch("HEAD", "/x").found().unwrap().handler, "get");
        let m = d.dispatch("HEAD", "/v/3").found().unwrap();
        assert_eq!(*m.handler, "get_v");
        assert_eq!(m.variable("id"), Some("3"));
    }
}

#[test]
fn test_explicit_head_is_not_shadowed() {
    for strategy in strategies() {
        let d = build(strategy, &[("GET", "/x", "get"), ("HEAD", "/x", "head")]);
        assert_eq!(*d.dispatch("HEAD", "/x").found().unwrap().handler, "head");
    }
}

#[test]
fn test_any_method_is_consulted_last() {
    for strategy in strategies() {
        let d = build(
            strategy,
            &[("*", "/y/{p}", "any"), ("POST", "/y/{p:\\d+}", "post")],
        );
        assert_eq!(*d.dispatch("POST", "/y/1").found().unwrap().handler, "post");
        assert_eq!(*d.dispatch("POST", "/y/a").found().unwrap().handler, "any");
        assert_eq!(*d.dispatch("PATCH", "/y/1").found().unwrap().handler, "any");
    }
}

#[test]
fn test_method_not_allowed_lists_static_then_variable_methods() {
    for strategy in strategies() {
        let d = build(
            strategy,
            &[
                ("GET", "/r/1", "get"),
                ("POST", "/r/1", "post"),
                ("PUT", "/r/1", "put_static"),
                ("PUT", "/r/{id}", "put"),
                ("PATCH", "/r/{id}", "patch"),
            ],
        );
        assert_eq!(
            d.dispatch("DELETE", "/r/1"),
            DispatchResult::MethodNotAllowed(vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "PATCH".to_string(),
            ])
        );
        assert_eq!(
            d.dispatch("DELETE", "/r/2"),
            DispatchResult::MethodNotAllowed(vec!["PUT".to_string(), "PATCH".to_string()])
        );
        assert_eq!(d.dispatch("DELETE", "/elsewhere"), DispatchResult::NotFound);
    }
}

#[test]
fn test_variable_lookup_last_duplicate_name_wins() {
    let m = Matched {
        handler: &"h",
        variables: [
            (std::sync::Arc::from("id"), "org".to_string()),
            (std::sync::Arc::from("id"), "user".to_string()),
        ]
        .into_iter()
        .collect(),
        extra: &ExtraParameters::new(),
    };
    assert_eq!(m.variable("id"), Some("user"));
    assert_eq!(m.variable("missing"), None);
    assert_eq!(m.route_name(), None);
}

#[test]
fn test_extra_parameters_are_returned() {
    for strategy in strategies() {
        let mut generator = strategy.generator(None);
        let mut extra = ExtraParameters::new();
        extra.insert(ROUTE_NAME.to_string(), serde_json::json!("user.show"));
        extra.insert("auth".to_string(), serde_json::json!(true));
        let parsed = StdRouteParser.parse("/user/{id}").unwrap().remove(0);
        generator.add_route("GET", &parsed, "show", extra).unwrap();
        let d = Dispatcher::new(generator.compile().unwrap());

        let m = d.dispatch("GET", "/user/5").found().unwrap();
        assert_eq!(m.route_name(), Some("user.show"));
        assert_eq!(m.extra["auth"], serde_json::json!(true));
    }
}

#[test]
fn test_dispatch_request_uses_path_only() {
    for strategy in strategies() {
        let d = build(strategy, &[("POST", "/items/{id}", "create")]);
        let request = http::Request::builder()
            .method(http::Method::POST)
            .uri("https://example.com/items/9?debug=1")
            .body(())
            .unwrap();
        let result = d.dispatch_request(&request);
        assert_eq!(result.status(), "found");
        assert_eq!(result.found().unwrap().variable("id"), Some("9"));
    }
}
