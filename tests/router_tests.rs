use basecore::error::FrameworkError;
use basecore::router::Router;
use http::Method;

fn zoo() -> Router {
    let mut router = Router::new();
    router
        .get("/", "Zoo", "root")
        .unwrap()
        .get("/zoo/animals", "Animals", "index")
        .unwrap()
        .post("/zoo/animals", "Animals", "create")
        .unwrap()
        .get("/zoo/animals/new", "Animals", "form")
        .unwrap()
        .get("/zoo/animals/{id}", "Animals", "show")
        .unwrap()
        .put("/zoo/animals/{id}", "Animals", "update")
        .unwrap()
        .patch("/zoo/animals/{id}", "Animals", "patch")
        .unwrap()
        .delete("/zoo/animals/{id}", "Animals", "delete")
        .unwrap()
        .get("/zoo/keepers/{keeper:[0-9]+}/animals/{}", "Keepers", "animal")
        .unwrap();
    router
}

fn target(router: &Router, method: Method, path: &str) -> (String, String) {
    let info = router.resolve(&method, path).unwrap();
    (info.class().to_string(), info.method().to_string())
}

#[test]
fn test_verbs_route_to_their_actions() {
    let router = zoo();
    let cases = [
        (Method::GET, "/", "root"),
        (Method::GET, "/zoo/animals", "index"),
        (Method::POST, "/zoo/animals", "create"),
        (Method::GET, "/zoo/animals/42", "show"),
        (Method::PUT, "/zoo/animals/42", "update"),
        (Method::PATCH, "/zoo/animals/42", "patch"),
        (Method::DELETE, "/zoo/animals/42", "delete"),
    ];
    for (method, path, action) in cases {
        assert_eq!(target(&router, method.clone(), path).1, action, "{method} {path}");
    }
}

#[test]
fn test_first_registered_wins() {
    let router = zoo();
    // `/zoo/animals/new` is registered before `/zoo/animals/{id}`
    assert_eq!(target(&router, Method::GET, "/zoo/animals/new").1, "form");

    let mut reversed = Router::new();
    reversed
        .get("/zoo/animals/{id}", "Animals", "show")
        .unwrap()
        .get("/zoo/animals/new", "Animals", "form")
        .unwrap();
    assert_eq!(target(&reversed, Method::GET, "/zoo/animals/new").1, "show");
}

#[test]
fn test_unknown_path_is_404() {
    let err = zoo().resolve(&Method::GET, "/zoo/keepers").unwrap_err();
    assert_eq!(
        err,
        FrameworkError::RouteNotFound {
            method: Method::GET,
            path: "/zoo/keepers".into()
        }
    );
}

#[test]
fn test_known_path_wrong_method_is_405() {
    let err = zoo().resolve(&Method::POST, "/zoo/animals/42").unwrap_err();
    match err {
        FrameworkError::MethodNotAllowed { method, allowed, .. } => {
            assert_eq!(method, Method::POST);
            assert_eq!(
                allowed,
                vec![Method::GET, Method::PUT, Method::PATCH, Method::DELETE]
            );
        }
        other => panic!("expected 405, got {other:?}"),
    }
}

#[test]
fn test_allowed_methods_are_deduplicated() {
    let mut router = Router::new();
    router
        .get("/a/{x}", "A", "one")
        .unwrap()
        .get("/a/{y}", "A", "two")
        .unwrap();
    match router.resolve(&Method::DELETE, "/a/1").unwrap_err() {
        FrameworkError::MethodNotAllowed { allowed, .. } => assert_eq!(allowed, vec![Method::GET]),
        other => panic!("expected 405, got {other:?}"),
    }
}

#[test]
fn test_trailing_slash_is_ignored() {
    let router = zoo();
    assert_eq!(target(&router, Method::GET, "/zoo/animals/").1, "index");
    assert_eq!(target(&router, Method::GET, "/zoo/animals/7/").1, "show");

    let mut slashed = Router::new();
    slashed.get("/reports/", "Reports", "index").unwrap();
    assert_eq!(target(&slashed, Method::GET, "/reports").1, "index");
}

#[test]
fn test_empty_path_is_root() {
    assert_eq!(target(&zoo(), Method::GET, "").1, "root");
}

#[test]
fn test_literals_are_case_sensitive() {
    let err = zoo().resolve(&Method::GET, "/Zoo/Animals").unwrap_err();
    assert!(matches!(err, FrameworkError::RouteNotFound { .. }));
}

#[test]
fn test_captures_are_percent_decoded() {
    let info = zoo().resolve(&Method::GET, "/zoo/animals/red%20panda").unwrap();
    assert_eq!(info.params().get("id"), Some("red panda"));
}

#[test]
fn test_constrained_and_positional_captures() {
    let router = zoo();
    let info = router
        .resolve(&Method::GET, "/zoo/keepers/12/animals/otter")
        .unwrap();
    assert_eq!(info.class(), "Keepers");
    assert_eq!(info.params().get("keeper"), Some("12"));
    assert_eq!(info.params().positional().collect::<Vec<_>>(), vec!["otter"]);
    assert_eq!(info.pattern(), "/zoo/keepers/{keeper:[0-9]+}/animals/{}");

    assert!(router
        .resolve(&Method::GET, "/zoo/keepers/bob/animals/otter")
        .is_err());
}

#[test]
fn test_invalid_pattern_is_rejected_and_not_registered() {
    let mut router = Router::new();
    let err = router.get("/broken/{id", "X", "y").unwrap_err();
    assert!(matches!(err, FrameworkError::InvalidPattern { .. }));
    assert!(router.is_empty());
}

#[test]
fn test_entries_keep_registration_order() {
    let router = zoo();
    let patterns: Vec<_> = router
        .entries()
        .iter()
        .map(|e| (e.method().clone(), e.pattern().to_string()))
        .collect();
    assert_eq!(patterns.len(), router.len());
    assert_eq!(patterns[0], (Method::GET, "/".to_string()));
    assert_eq!(patterns[2], (Method::POST, "/zoo/animals".to_string()));
    router.dump_routes();
}
