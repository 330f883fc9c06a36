//! Randomized route trees checked against the filtering and flattening rules.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use libris::identity::roles_admit;
use libris::permission::PermissionStore;
use libris::router::flatten::is_multi_level;
use libris::router::{flatten, RouteDef, RouteForest, RouteMeta};

const ROLES: [&str; 3] = ["user", "admin", "root"];

fn random_meta(rng: &mut StdRng) -> RouteMeta {
    match rng.gen_range(0..4) {
        0 => RouteMeta::default(),
        1 => RouteMeta { roles: Some(Vec::new()), ..Default::default() },
        _ => {
            let picked: Vec<&str> = ROLES.iter().copied().filter(|_| rng.gen_bool(0.5)).collect();
            RouteMeta::default().with_roles(&picked)
        }
    }
}

fn random_tree(rng: &mut StdRng, depth: usize, counter: &mut usize, absolute: bool) -> RouteDef {
    *counter += 1;
    let seg = format!("r{}", counter);
    let path = if absolute { format!("/{}", seg) } else { seg.clone() };
    let mut def = RouteDef::new(&path).named(&format!("N{}", counter)).meta(random_meta(rng));
    if depth > 0 {
        for _ in 0..rng.gen_range(0..4) {
            def = def.child(random_tree(rng, depth - 1, counter, false));
        }
    }
    def
}

fn random_table(seed: u64) -> Vec<RouteDef> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut counter = 0;
    (0..rng.gen_range(1..6)).map(|_| random_tree(&mut rng, 3, &mut counter, true)).collect()
}

fn admitted_count(def: &RouteDef, roles: &[String]) -> usize {
    if !roles_admit(def.meta.role_requirement(), roles) {
        return 0;
    }
    1 + def.children.iter().map(|c| admitted_count(c, roles)).sum::<usize>()
}

fn every_node_admitted(def: &RouteDef, roles: &[String]) -> bool {
    roles_admit(def.meta.role_requirement(), roles) && def.children.iter().all(|c| every_node_admitted(c, roles))
}

fn node_count(def: &RouteDef) -> usize { 1 + def.children.iter().map(node_count).sum::<usize>() }

#[test]
fn filtering_keeps_exactly_the_admitted_subtrees() {
    for seed in 0..200u64 {
        let table = random_table(seed);
        let forest = RouteForest::from_defs(&table);
        for role in ROLES {
            let roles = vec![role.to_string()];
            let kept = PermissionStore::compute_accessible_routes(&roles, &forest).to_defs();
            assert!(kept.iter().all(|d| every_node_admitted(d, &roles)), "seed {}", seed);
            let expected: usize = table.iter().map(|d| admitted_count(d, &roles)).sum();
            assert_eq!(kept.iter().map(node_count).sum::<usize>(), expected, "seed {}", seed);
        }
    }
}

#[test]
fn flattening_leaves_two_levels_and_keeps_every_name() {
    for seed in 0..200u64 {
        let forest = RouteForest::from_defs(&random_table(seed));
        let flat = flatten(&forest);
        assert!(flat.roots().iter().all(|&r| !is_multi_level(&flat, r)), "seed {}", seed);

        let mut before = forest.names();
        let mut after = flat.names();
        before.sort();
        after.sort();
        assert_eq!(before, after, "seed {}", seed);

        assert_eq!(flatten(&flat).to_defs(), flat.to_defs(), "seed {}", seed);
    }
}
