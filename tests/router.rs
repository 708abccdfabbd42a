use route_template::{ErrorKind, Method, Params, Router};

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs.iter().copied().collect()
}

#[test]
fn first_match_wins_by_registration_order() {
    let mut router = Router::new();
    router.register("/users/:id", None).unwrap().to("users.show").unwrap();
    router.register("/users/*rest", None).unwrap().to("users.catchall").unwrap();

    let found = router.find_first("/users/42", None).unwrap();
    assert_eq!(found.target.unwrap().to_string(), "users.show");
    assert_eq!(found.params, params(&[("id", "42")]));
    assert_eq!(found.next, 1);
}

#[test]
fn find_all_preserves_registration_order() {
    let mut router = Router::new();
    router.register("/users/:id", None).unwrap().to("users.show").unwrap();
    router.register("/users/*rest", None).unwrap().to("users.catchall").unwrap();

    let all = router.find_all("/users/42", None);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].target.as_ref().unwrap().action(), "show");
    assert_eq!(all[1].target.as_ref().unwrap().action(), "catchall");
    assert_eq!(all[1].params, params(&[("rest", "42")]));
}

#[test]
fn resume_strictly_after_matched_index() {
    let mut router = Router::new();
    router.register("/users/:id", None).unwrap();
    router.register("/users/*rest", None).unwrap();

    let first = router.find_first("/users/42", None).unwrap();
    let second = router.find_next("/users/42", None, first.next).unwrap();
    assert_eq!(second.next, 2);
    assert!(router.find_next("/users/42", None, second.next).is_none());
}

#[test]
fn method_helpers_bind_their_method() {
    let mut router = Router::new();
    router.post("/users").unwrap().to("users.create").unwrap();
    router.get("/users").unwrap().to("users.index").unwrap();

    let found = router.find_first("/users", Some(Method::Get)).unwrap();
    assert_eq!(found.target.unwrap().action(), "index");
    assert!(router.find_first("/users", Some(Method::Delete)).is_none());

    let posted = router.find_first("/users", Some(Method::Post)).unwrap();
    assert_eq!(posted.target.unwrap().action(), "create");
}

#[test]
fn head_is_served_by_get_and_reported_as_head() {
    let mut router = Router::new();
    router.get("/users/:id").unwrap();

    let found = router.find_first("/users/9", Some(Method::Head)).unwrap();
    assert_eq!(found.method, Some(Method::Head));
    assert_eq!(found.params, params(&[("id", "9")]));
}

#[test]
fn no_method_matches_bound_routes() {
    let mut router = Router::new();
    router.post("/users").unwrap();
    assert!(router.find_first("/users", None).is_some());
}

#[test]
fn head_not_registrable_through_router() {
    let mut router = Router::new();
    let err = router.register("/x", Some(Method::Head)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidMethod);
}

#[test]
fn builder_chain_configures_one_route() {
    let mut router = Router::new();
    let handle = router
        .get("/users/:id")
        .unwrap()
        .constrain("id", r"\d+")
        .unwrap()
        .to("users.show")
        .unwrap()
        .name("user");
    assert_eq!(handle.index(), 0);
    assert_eq!(handle.route().name(), Some("user"));

    assert!(router.find_first("/users/abc", Some(Method::Get)).is_none());
    let found = router.find_first("/users/42", Some(Method::Get)).unwrap();
    assert_eq!(found.target.unwrap().to_string(), "users.show");
}

#[test]
fn url_appends_encoded_remainder() {
    let mut router = Router::new();
    router.get("/users/:id").unwrap().name("user");

    let uri = router
        .url("user", &params(&[("id", "7"), ("q", "a b")]), false)
        .unwrap()
        .unwrap();
    assert_eq!(uri, "/users/7?q=a%20b");
}

#[test]
fn url_without_remainder_has_no_query() {
    let mut router = Router::new();
    router.get("/users/:id").unwrap().name("user");

    let uri = router.url("user", &params(&[("id", "7")]), false).unwrap().unwrap();
    assert_eq!(uri, "/users/7");
}

#[test]
fn url_skip_query() {
    let mut router = Router::new();
    router.get("/users/:id").unwrap().name("user");

    let uri = router
        .url("user", &params(&[("id", "7"), ("tab", "posts")]), true)
        .unwrap()
        .unwrap();
    assert_eq!(uri, "/users/7");
}

#[test]
fn url_unknown_name_is_a_configuration_error() {
    let router = Router::new();
    let err = router.url("nonexistent", &Params::new(), false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownRouteName);
}

#[test]
fn url_generation_failure_is_not_an_error() {
    let mut router = Router::new();
    router
        .get("/users/:id")
        .unwrap()
        .constrain("id", r"\d+")
        .unwrap()
        .name("user");

    assert_eq!(router.url("user", &Params::new(), false).unwrap(), None);
    assert_eq!(
        router.url("user", &params(&[("id", "abc")]), false).unwrap(),
        None
    );
}

#[test]
fn name_overwrite_redirects_lookup_but_keeps_sequence() {
    let mut router = Router::new();
    router.register("/old/:id", None).unwrap().name("thing");
    router.register("/new/:id", None).unwrap().name("thing");

    let uri = router.url("thing", &params(&[("id", "1")]), false).unwrap().unwrap();
    assert_eq!(uri, "/new/1");
    // both routes still participate in dispatch
    assert!(router.find_first("/old/1", None).is_some());
    assert!(router.find_first("/new/1", None).is_some());
    assert_eq!(router.routes().len(), 2);
    assert_eq!(router.route_named("thing").unwrap().uri(), "/new/:id");
}

#[test]
fn unknown_constraint_name_through_builder() {
    let mut router = Router::new();
    let err = router
        .get("/users/:id")
        .unwrap()
        .constrain("nope", r"\d+")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownIdentifier);
}
