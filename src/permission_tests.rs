use std::sync::Arc;

use super::*;
use crate::router::{constant_routes, dynamic_routes, RouteMeta};

fn v(xs: &[&str]) -> Vec<String> { xs.iter().map(|s| s.to_string()).collect() }

fn store(third_level: bool) -> PermissionStore {
    let cfg = RouterConfig { third_level_route_cache: third_level, ..Default::default() };
    PermissionStore::new(&constant_routes(), &dynamic_routes(), cfg)
}

fn root_names(f: &RouteForest) -> Vec<String> {
    f.roots().iter().filter_map(|&r| f.node(r).name.clone()).collect()
}

#[test]
fn user_sees_staff_and_user_routes() {
    let s = store(false);
    let add = s.set_routes(&v(&["user"]));
    assert_eq!(root_names(&add), vec!["Notice", "BookManagement", "SmartRecommendation"]);
    assert_eq!(s.routes().len(), constant_routes().len() + 3);
}

#[test]
fn root_sees_only_root_routes() {
    let s = store(false);
    let add = s.set_routes(&v(&["root"]));
    assert_eq!(root_names(&add), vec!["Dashboard", "UserManagement"]);
}

#[test]
fn unknown_role_sees_nothing_gated() {
    let s = store(false);
    assert!(s.set_routes(&v(&["DEFAULT_ROLE"])).is_empty());
    assert_eq!(s.routes().len(), constant_routes().len());
}

#[test]
fn set_all_routes_is_unfiltered() {
    let s = store(false);
    assert_eq!(s.set_all_routes().len(), dynamic_routes().len());
}

#[test]
fn kept_parent_loses_pruned_children() {
    let gated = vec![RouteDef::new("/p").named("P")
        .child(RouteDef::new("a").named("A").meta(RouteMeta::default().with_roles(&["admin"])))
        .child(RouteDef::new("b").named("B"))];
    let f = RouteForest::from_defs(&gated);
    let out = PermissionStore::compute_accessible_routes(&v(&["user"]), &f);
    assert_eq!(out.names(), vec!["P", "B"]);

    let only_gated = RouteForest::from_defs(&[RouteDef::new("/q").named("Q")
        .child(RouteDef::new("a").named("A").meta(RouteMeta::default().with_roles(&["admin"])))]);
    let out = PermissionStore::compute_accessible_routes(&v(&["user"]), &only_gated);
    let q = out.find_root("Q").unwrap();
    assert!(!out.has_children(q));
}

#[test]
fn empty_role_list_is_no_requirement() {
    let f = RouteForest::from_defs(&[RouteDef::new("/open").named("Open").meta(RouteMeta { roles: Some(vec![]), ..Default::default() })]);
    assert_eq!(PermissionStore::compute_accessible_routes(&[], &f).len(), 1);
}

#[test]
fn flattening_applies_only_when_configured() {
    let deep = vec![RouteDef::new("/m").named("M")
        .child(RouteDef::new("x").named("X").child(RouteDef::new("y").named("Y")))];
    let flat_cfg = RouterConfig { third_level_route_cache: true, ..Default::default() };
    let s = PermissionStore::new(&[], &deep, flat_cfg);
    let add = s.set_all_routes();
    let m = add.find_root("M").unwrap();
    assert_eq!(add.children(m).len(), 2);
    // the menu copy keeps the original nesting
    let all = s.routes();
    let m = all.find_root("M").unwrap();
    assert_eq!(all.children(m).len(), 1);

    let s = PermissionStore::new(&[], &deep, RouterConfig::default());
    let add = s.set_all_routes();
    assert_eq!(add.children(add.find_root("M").unwrap()).len(), 1);
}

#[test]
fn claim_is_exclusive() {
    let s = store(false);
    assert_eq!(s.try_claim(), Claim::Claimed);
    assert_eq!(s.try_claim(), Claim::InFlight);
    s.complete();
    assert_eq!(s.try_claim(), Claim::Ready);
    s.reset();
    assert_eq!(s.state(), MaterializeState::Empty);
    assert_eq!(s.try_claim(), Claim::Claimed);
    s.fail();
    assert_eq!(s.state(), MaterializeState::Empty);
}

#[tokio::test]
async fn waiters_wake_when_claim_settles() {
    let s = Arc::new(store(false));
    assert_eq!(s.try_claim(), Claim::Claimed);
    let waiter = {
        let s = s.clone();
        tokio::spawn(async move { s.wait_settled().await })
    };
    tokio::task::yield_now().await;
    s.complete();
    assert_eq!(waiter.await.unwrap(), MaterializeState::Ready);
}

#[tokio::test]
async fn materializer_trait_filters_by_roles() {
    let s = store(false);
    let roles = v(&["admin"]);
    let out = s.materialize(Some(&roles)).await.unwrap();
    assert_eq!(root_names(&out), vec!["Notice", "BookManagement"]);
    assert_eq!(s.materialize(None).await.unwrap().len(), 5);
}

#[test]
fn unsettled_claim_guard_releases_on_drop() {
    let s = store(false);
    assert_eq!(s.try_claim(), Claim::Claimed);
    s.set_routes(&v(&["admin"]));
    drop(ClaimGuard::new(&s));
    assert_eq!(s.state(), MaterializeState::Empty);
    assert!(s.routes().is_empty());

    assert_eq!(s.try_claim(), Claim::Claimed);
    ClaimGuard::new(&s).complete();
    assert_eq!(s.state(), MaterializeState::Ready);
}

#[test]
fn abandoned_claim_leaves_a_settled_state_alone() {
    let s = store(false);
    assert_eq!(s.try_claim(), Claim::Claimed);
    let claim = ClaimGuard::new(&s);
    s.reset();
    assert_eq!(s.try_claim(), Claim::Claimed);
    s.complete();
    drop(claim);
    assert_eq!(s.state(), MaterializeState::Ready);
}

#[tokio::test]
async fn waiters_wake_when_a_claim_is_abandoned() {
    let s = Arc::new(store(false));
    assert_eq!(s.try_claim(), Claim::Claimed);
    let waiter = {
        let s = s.clone();
        tokio::spawn(async move { s.wait_settled().await })
    };
    tokio::task::yield_now().await;
    drop(ClaimGuard::new(&s));
    assert_eq!(waiter.await.unwrap(), MaterializeState::Empty);
}
