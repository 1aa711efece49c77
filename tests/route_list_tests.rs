#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Unit tests for the router broker
//!
//! # Test Coverage
//!
//! Validates `RouteList` composition and dispatch:
//! - First-hit matching in insertion order
//! - Domain and path scoping with nested lists
//! - One-way routes: construction only, never matched
//! - Dispatch-cache key selection and bucketed construction
//! - Cache transparency against the linear-scan mode
//! - Mutation (`add` / `prepend` / `modify`) and cache invalidation
//!
//! # Key Test Cases
//!
//! - `cache_key_picks_the_most_discriminating_constant`
//! - `bucketed_construction_prefers_the_pinned_route`
//! - `cache_and_linear_scan_agree`: the cache never changes results

mod common;

use common::{params, reference, request, request_on};
use maskroute::{Route, RouteList, Router, RouterError, RuntimeConfig, ONE_WAY};

fn pinned(mask: &str, presenter: &str) -> Route {
    Route::builder(mask)
        .constant("presenter", presenter)
        .build()
        .unwrap()
}

#[test]
fn first_matching_route_wins() {
    let mut list = RouteList::new();
    list.add_route("<presenter>", 0).unwrap();
    list.add(
        Route::builder("<name>").build().unwrap(),
        0,
    );

    let matched = list.match_request(&request("/blog")).unwrap();
    assert_eq!(matched.get_str("presenter"), Some("blog"));
    assert!(matched.get("name").is_none());

    list.prepend(Route::new("<name>").unwrap(), 0);
    let matched = list.match_request(&request("/blog")).unwrap();
    assert_eq!(matched.get_str("name"), Some("blog"));
}

#[test]
fn empty_list_matches_nothing() {
    let list = RouteList::new();
    assert!(list.match_request(&request("/anything")).is_none());
    assert!(list
        .construct_url(&params(&[("presenter", "x")]), &reference())
        .is_none());
}

#[test]
fn domain_scoped_list() {
    let mut root = RouteList::new();
    let mut scoped = root.with_domain("%sld%.example.com");
    scoped.add_route("<presenter>", 0).unwrap();
    scoped.end();

    let matched = root.match_request(&request_on("api.example.com", "/x"));
    assert_eq!(matched.unwrap().get_str("presenter"), Some("x"));

    assert!(root.match_request(&request_on("other.org", "/x")).is_none());
}

#[test]
fn domain_scoped_construction_adjusts_the_reference_host() {
    let mut root = RouteList::new();
    let mut scoped = root.with_domain("admin.example.com");
    scoped.add_route("<presenter>", 0).unwrap();
    scoped.end();

    let url = root.construct_url(&params(&[("presenter", "users")]), &reference());
    assert_eq!(url.as_deref(), Some("http://admin.example.com/users"));
}

#[test]
fn path_scoped_list() {
    let mut root = RouteList::new();
    let mut admin = root.with_path("/admin");
    admin.add_route("<presenter>", 0).unwrap();
    admin.end();

    let matched = root.match_request(&request("/admin/users"));
    assert_eq!(matched.unwrap().get_str("presenter"), Some("users"));

    assert!(root.match_request(&request("/users")).is_none());

    let url = root.construct_url(&params(&[("presenter", "users")]), &reference());
    assert_eq!(url.as_deref(), Some("http://example.com/admin/users"));
}

#[test]
fn end_returns_the_parent_for_further_registration() {
    let mut root = RouteList::new();
    let admin = root.with_path("/admin");
    let parent = admin.end();
    parent.add_route("<presenter>", 0).unwrap();

    assert_eq!(root.len(), 2);
    let matched = root.match_request(&request("/blog")).unwrap();
    assert_eq!(matched.get_str("presenter"), Some("blog"));
}

#[test]
fn lists_nest_as_plain_routers() {
    let mut inner = RouteList::new();
    inner.add_route("<presenter>/<action>", 0).unwrap();

    let mut outer = RouteList::new();
    outer.add(inner, 0);

    let matched = outer.match_request(&request("/shop/list")).unwrap();
    assert_eq!(matched.get_str("presenter"), Some("shop"));
}

#[test]
fn one_way_routes_construct_but_never_match() {
    let mut list = RouteList::new();
    list.add(
        Route::builder("old-blog/<id \\d+>")
            .constant("presenter", "blog")
            .build()
            .unwrap(),
        ONE_WAY,
    );

    assert!(list.match_request(&request("/old-blog/7")).is_none());

    let url = list.construct_url(&params(&[("presenter", "blog"), ("id", "7")]), &reference());
    assert_eq!(url.as_deref(), Some("http://example.com/old-blog/7"));
}

#[test]
fn cache_key_picks_the_most_discriminating_constant() {
    let mut list = RouteList::new();
    list.add(
        Route::builder("en/<action>").constant("lang", "en").build().unwrap(),
        0,
    );
    list.add(pinned("a-page/<action>", "a"), 0);
    list.add(pinned("b-page/<action>", "b"), 0);
    list.add(pinned("c-page/<action>", "c"), 0);
    list.warm_up();

    assert_eq!(list.cache_key(), Some("presenter"));
}

#[test]
fn bucketed_construction_prefers_the_pinned_route() {
    common::init_tracing();
    let mut list = RouteList::new();
    list.add(pinned("a-page/<action>", "a"), 0);
    list.add(pinned("b-page/<action>", "b"), 0);
    list.add(pinned("c-page/<action>", "c"), 0);
    list.add_route("<presenter>/<action>", 0).unwrap();
    list.warm_up();
    assert_eq!(list.cache_key(), Some("presenter"));

    let url = list.construct_url(&params(&[("presenter", "b"), ("action", "view")]), &reference());
    assert_eq!(url.as_deref(), Some("http://example.com/b-page/view"));

    // unknown and absent values fall back to the universal bucket
    let url = list.construct_url(&params(&[("presenter", "zzz"), ("action", "view")]), &reference());
    assert_eq!(url.as_deref(), Some("http://example.com/zzz/view"));
    assert!(list
        .construct_url(&params(&[("action", "view")]), &reference())
        .is_none());
}

#[test]
fn universal_route_keeps_insertion_order_inside_buckets() {
    let mut list = RouteList::new();
    list.add_route("<presenter>/<action>", 0).unwrap();
    list.add(pinned("b-page/<action>", "b"), 0);
    list.warm_up();

    // the universal route was registered first, so it wins the bucket
    let url = list.construct_url(&params(&[("presenter", "b"), ("action", "view")]), &reference());
    assert_eq!(url.as_deref(), Some("http://example.com/b/view"));
}

#[test]
fn one_way_route_lands_in_a_reachable_bucket() {
    let mut list = RouteList::new();
    list.add(pinned("a-page/<action>", "a"), 0);
    list.add(pinned("old/<action>", "legacy"), ONE_WAY);
    list.warm_up();

    // "legacy" never voted for the key but still constructs
    let url = list.construct_url(
        &params(&[("presenter", "legacy"), ("action", "view")]),
        &reference(),
    );
    assert_eq!(url.as_deref(), Some("http://example.com/old/view"));
}

#[test]
fn cache_and_linear_scan_agree() {
    let setup = |mut list: RouteList| {
        list.add(pinned("a-page/<action>", "a"), 0);
        list.add(pinned("b-page/<action>", "b"), 0);
        list.add(
            Route::builder("legacy/<action>")
                .constant("presenter", "old")
                .build()
                .unwrap(),
            ONE_WAY,
        );
        list.add_route("<presenter>/<action>", 0).unwrap();
        list
    };
    let cached = setup(RouteList::with_config(RuntimeConfig {
        dispatch_cache: true,
    }));
    let linear = setup(RouteList::with_config(RuntimeConfig {
        dispatch_cache: false,
    }));
    cached.warm_up();

    for mapping in [
        params(&[("presenter", "a"), ("action", "view")]),
        params(&[("presenter", "b"), ("action", "edit")]),
        params(&[("presenter", "old"), ("action", "view")]),
        params(&[("presenter", "misc"), ("action", "view")]),
        params(&[("action", "view")]),
    ] {
        assert_eq!(
            cached.construct_url(&mapping, &reference()),
            linear.construct_url(&mapping, &reference()),
        );
    }
}

#[test]
fn warm_up_is_idempotent() {
    let mut list = RouteList::new();
    list.add(pinned("a-page/<action>", "a"), 0);
    list.warm_up();
    let key = list.cache_key().map(str::to_string);
    list.warm_up();
    assert_eq!(list.cache_key(), key.as_deref());
}

#[test]
fn mutation_invalidates_the_dispatch_cache() {
    let mut list = RouteList::new();
    list.add(pinned("a-page/<action>", "a"), 0);
    list.warm_up();
    assert!(list.cache_key().is_some());

    list.add(pinned("d-page/<action>", "d"), 0);
    assert_eq!(list.cache_key(), None);

    // rebuilt lazily; the new route is dispatchable
    let url = list.construct_url(&params(&[("presenter", "d"), ("action", "view")]), &reference());
    assert_eq!(url.as_deref(), Some("http://example.com/d-page/view"));
    assert!(list.cache_key().is_some());
}

#[test]
fn modify_replaces_and_deletes() {
    let mut list = RouteList::new();
    list.add_route("<presenter>", 0).unwrap();
    list.add_route("pages/<presenter>", 0).unwrap();

    list.modify(0, Some(Box::new(Route::new("articles/<presenter>").unwrap())))
        .unwrap();
    let matched = list.match_request(&request("/articles/seven")).unwrap();
    assert_eq!(matched.get_str("presenter"), Some("seven"));

    list.modify(0, None).unwrap();
    assert_eq!(list.len(), 1);
    assert!(list.match_request(&request("/articles/seven")).is_none());
    assert!(list.match_request(&request("/pages/seven")).is_some());
}

#[test]
fn modify_out_of_range() {
    let mut list = RouteList::new();
    list.add_route("<presenter>", 0).unwrap();
    assert!(matches!(
        list.modify(3, None),
        Err(RouterError::OutOfRange { index: 3, len: 1 })
    ));
}

#[test]
fn scoped_lists_compose() {
    let mut root = RouteList::new();
    let mut api = root.with_domain("api.example.com");
    let mut v1 = api.with_path("/v1");
    v1.add_route("<presenter>/<action>", 0).unwrap();
    v1.end();
    api.end();
    root.add_route("<presenter>", 0).unwrap();
    root.warm_up();

    let matched = root
        .match_request(&request_on("api.example.com", "/v1/users/list"))
        .unwrap();
    assert_eq!(matched.get_str("presenter"), Some("users"));

    // the fallback route still serves the bare host
    let matched = root.match_request(&request("/about")).unwrap();
    assert_eq!(matched.get_str("presenter"), Some("about"));

    let url = root.construct_url(
        &params(&[("presenter", "users"), ("action", "list")]),
        &reference(),
    );
    assert_eq!(url.as_deref(), Some("http://api.example.com/v1/users/list"));
}
