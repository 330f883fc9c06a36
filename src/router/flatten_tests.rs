use super::*;
use crate::router::route::{RouteDef, RouteMeta};

fn four_levels() -> RouteForest {
    RouteForest::from_defs(&[RouteDef::new("/a").named("A").child(
        RouteDef::new("b").named("B").child(
            RouteDef::new("c").named("C").child(RouteDef::new("d").named("D")),
        ),
    )])
}

#[test]
fn four_level_chain_becomes_two_levels() {
    let flat = flatten(&four_levels()).to_defs();
    assert_eq!(flat.len(), 1);
    let a = &flat[0];
    assert_eq!(a.name.as_deref(), Some("A"));
    let kids: Vec<(&str, &str)> = a.children.iter().map(|c| (c.name.as_deref().unwrap(), c.path.as_str())).collect();
    assert_eq!(kids, vec![("B", "/a/b"), ("C", "/a/b/c"), ("D", "/a/b/c/d")]);
    // nothing below the first level any more, B's nested children included
    assert!(a.children.iter().all(|c| c.children.is_empty()));
}

#[test]
fn two_level_routes_pass_through() {
    let src = RouteForest::from_defs(&[
        RouteDef::new("/book").named("BookManagement")
            .child(RouteDef::new("list").named("bookList"))
            .child(RouteDef::new("record").named("recordList")),
        RouteDef::new("/login"),
    ]);
    assert_eq!(flatten(&src), src);
}

#[test]
fn flatten_is_idempotent() {
    let once = flatten(&four_levels());
    assert_eq!(flatten(&once), once);
}

#[test]
fn flatten_does_not_mutate_input() {
    let src = four_levels();
    let before = src.to_defs();
    let _ = flatten(&src);
    assert_eq!(src.to_defs(), before);
}

#[test]
fn names_are_preserved() {
    let src = RouteForest::from_defs(&[
        RouteDef::new("/m").named("M")
            .child(RouteDef::new("x").named("X").child(RouteDef::new("y").named("Y")))
            .child(RouteDef::new("z").named("Z")),
        RouteDef::new("/n").named("N").child(RouteDef::new("o").named("O")),
    ]);
    let mut before = src.names();
    let mut after = flatten(&src).names();
    before.sort();
    after.sort();
    assert_eq!(before, after);
}

#[test]
fn duplicate_names_collapse_to_first() {
    let src = RouteForest::from_defs(&[RouteDef::new("/m").named("M")
        .child(RouteDef::new("x").named("X").child(RouteDef::new("dup").named("Dup")))
        .child(RouteDef::new("y").named("Y").child(RouteDef::new("dup2").named("Dup")))]);
    let flat = flatten(&src).to_defs();
    let paths: Vec<&str> = flat[0].children.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["/m/x", "/m/x/dup", "/m/y"]);
}

#[test]
fn unnamed_descendants_are_kept_by_path() {
    let src = RouteForest::from_defs(&[RouteDef::new("/m").named("M")
        .child(RouteDef::new("x").child(RouteDef::new("y")))]);
    let flat = flatten(&src).to_defs();
    let paths: Vec<&str> = flat[0].children.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["/m/x", "/m/x/y"]);
}

#[test]
fn absolute_descendant_paths_stay_absolute() {
    let src = RouteForest::from_defs(&[RouteDef::new("/m").named("M")
        .child(RouteDef::new("x").named("X").child(RouteDef::new("/elsewhere").named("E").meta(RouteMeta::titled("E"))))]);
    let flat = flatten(&src).to_defs();
    let e = flat[0].children.iter().find(|c| c.name.as_deref() == Some("E")).unwrap();
    assert_eq!(e.path, "/elsewhere");
    assert_eq!(e.meta.title.as_deref(), Some("E"));
}
