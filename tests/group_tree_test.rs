//! Tests for the nested-set GroupTree

use rstest::{fixture, rstest};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tenancy::domain::{
    Dataset, DomainError, GroupChanges, GroupId, GroupTree, NewTenantGroup, TenantGroup,
};

fn add(tree: &mut GroupTree, name: &str, parent: Option<GroupId>) -> GroupId {
    let mut new = NewTenantGroup::new(name, name.to_lowercase().replace(' ', "-"));
    if let Some(p) = parent {
        new = new.with_parent(p);
    }
    tree.insert(new).expect("insert group")
}

fn bounds(tree: &GroupTree, id: GroupId) -> (u32, u32) {
    let g = tree.get(id).expect("group exists");
    (g.left_bound(), g.right_bound())
}

fn names<'a>(groups: impl Iterator<Item = &'a TenantGroup>) -> Vec<String> {
    groups.map(|g| g.name.clone()).collect()
}

struct World {
    tree: GroupTree,
    americas: GroupId,
    canada: GroupId,
    mexico: GroupId,
    europe: GroupId,
    germany: GroupId,
}

/// Americas(Canada, Mexico), Europe(Germany)
#[fixture]
fn world() -> World {
    let mut tree = GroupTree::new();
    let americas = add(&mut tree, "Americas", None);
    let mexico = add(&mut tree, "Mexico", Some(americas));
    let canada = add(&mut tree, "Canada", Some(americas));
    let europe = add(&mut tree, "Europe", None);
    let germany = add(&mut tree, "Germany", Some(europe));
    World {
        tree,
        americas,
        canada,
        mexico,
        europe,
        germany,
    }
}

/// Every node's interval is valid and children tile their parent.
fn assert_nested_sets(tree: &GroupTree) {
    tree.check_integrity().expect("bookkeeping is consistent");
    for g in tree.iter() {
        assert!(g.left_bound() < g.right_bound(), "{} has an empty interval", g.name);
        assert_eq!((g.right_bound() - g.left_bound() - 1) % 2, 0);
        match g.parent() {
            None => {
                assert_eq!(g.left_bound(), 1);
                assert_eq!(g.depth(), 0);
            }
            Some(p) => {
                let parent = tree.get(p).expect("parent exists");
                assert_eq!(parent.tree_id(), g.tree_id());
                assert_eq!(parent.depth() + 1, g.depth());
                assert!(parent.left_bound() < g.left_bound());
                assert!(g.right_bound() < parent.right_bound());
            }
        }
    }
}

// ============================================================
// Insert
// ============================================================

#[test]
fn given_americas_when_adding_mexico_then_canada_then_children_ordered_by_name() {
    let mut tree = GroupTree::new();
    let americas = add(&mut tree, "Americas", None);
    let mexico = add(&mut tree, "Mexico", Some(americas));
    let canada = add(&mut tree, "Canada", Some(americas));

    assert_eq!(bounds(&tree, americas), (1, 6));
    assert_eq!(bounds(&tree, canada), (2, 3));
    assert_eq!(bounds(&tree, mexico), (4, 5));
    assert_eq!(tree.get(canada).unwrap().depth(), 1);
    assert_eq!(
        names(tree.children_of(americas).unwrap()),
        vec!["Canada", "Mexico"]
    );
    assert_nested_sets(&tree);
}

#[rstest]
fn given_forest_when_adding_root_then_gets_next_tree_id(world: World) {
    let mut tree = world.tree;
    let asia = add(&mut tree, "Asia", None);

    let g = tree.get(asia).unwrap();
    assert_eq!(g.tree_id(), 3);
    assert_eq!((g.left_bound(), g.right_bound()), (1, 2));
    // roots list by name, independent of tree id
    assert_eq!(names(tree.roots()), vec!["Americas", "Asia", "Europe"]);
}

#[rstest]
fn given_forest_when_adding_to_one_tree_then_other_tree_untouched(world: World) {
    let mut tree = world.tree;
    let before = tree.get(world.germany).unwrap().clone();

    add(&mut tree, "Brazil", Some(world.americas));

    assert_eq!(tree.get(world.germany).unwrap(), &before);
    assert_eq!(bounds(&tree, world.americas), (1, 8));
    assert_nested_sets(&tree);
}

#[rstest]
fn given_existing_slug_when_adding_then_validation_error_on_slug(world: World) {
    let mut tree = world.tree;
    let err = tree
        .insert(NewTenantGroup::new("Nordics", "europe"))
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(ref v) if v.has_field("slug")));
    assert!(!err.fields().contains(&"name"));
    assert_eq!(tree.len(), 5);
}

#[test]
fn given_unknown_parent_when_adding_then_validation_error_on_parent() {
    let mut tree = GroupTree::new();
    let err = tree
        .insert(NewTenantGroup::new("Orphan", "orphan").with_parent(GroupId::new()))
        .unwrap_err();
    assert_eq!(err.fields(), vec!["parent"]);
    assert!(tree.is_empty());
}

// ============================================================
// Traversal
// ============================================================

#[rstest]
fn given_nested_group_when_querying_ancestors_then_root_first(world: World) {
    let mut tree = world.tree;
    let quebec = add(&mut tree, "Quebec", Some(world.canada));

    assert_eq!(
        names(tree.ancestors_of(quebec).unwrap()),
        vec!["Americas", "Canada"]
    );
    assert_eq!(tree.ancestors_of(world.americas).unwrap().count(), 0);
}

#[rstest]
fn given_nested_group_when_querying_descendants_then_pre_order(world: World) {
    let mut tree = world.tree;
    add(&mut tree, "Quebec", Some(world.canada));

    assert_eq!(
        names(tree.descendants_of(world.americas).unwrap()),
        vec!["Canada", "Quebec", "Mexico"]
    );
    assert_eq!(tree.descendant_count(world.americas).unwrap(), 3);
    assert!(tree.is_descendant_of(world.mexico, world.americas).unwrap());
    assert!(!tree.is_descendant_of(world.americas, world.mexico).unwrap());
    assert!(!tree.is_descendant_of(world.germany, world.americas).unwrap());
}

#[rstest]
fn given_forest_when_iterating_then_each_tree_in_pre_order(world: World) {
    assert_eq!(
        names(world.tree.iter()),
        vec!["Americas", "Canada", "Mexico", "Europe", "Germany"]
    );
    let lefts: Vec<u32> = world
        .tree
        .iter()
        .filter(|g| g.tree_id() == world.tree.get(world.americas).unwrap().tree_id())
        .map(|g| g.left_bound())
        .collect();
    assert!(lefts.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn given_unknown_id_when_traversing_then_not_found() {
    let tree = GroupTree::new();
    assert!(matches!(
        tree.children_of(GroupId::new()),
        Err(DomainError::NotFound { .. })
    ));
}

// ============================================================
// Move / rename
// ============================================================

#[rstest]
fn given_group_when_moving_under_own_descendant_then_rejected_and_unchanged(world: World) {
    let mut tree = world.tree;
    let before: Vec<TenantGroup> = tree.iter().cloned().collect();

    let err = tree.move_to(world.americas, Some(world.canada)).unwrap_err();

    assert_eq!(err.fields(), vec!["parent"]);
    let after: Vec<TenantGroup> = tree.iter().cloned().collect();
    assert_eq!(before, after);
}

#[rstest]
fn given_group_when_moving_under_itself_then_rejected(world: World) {
    let mut tree = world.tree;
    let err = tree.move_to(world.canada, Some(world.canada)).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[rstest]
fn given_leaf_when_moving_to_other_tree_then_both_trees_renumbered(world: World) {
    let mut tree = world.tree;

    tree.move_to(world.mexico, Some(world.europe)).unwrap();

    let mexico = tree.get(world.mexico).unwrap();
    assert_eq!(mexico.parent(), Some(world.europe));
    assert_eq!(mexico.tree_id(), tree.get(world.europe).unwrap().tree_id());
    assert_eq!(bounds(&tree, world.americas), (1, 4));
    assert_eq!(bounds(&tree, world.europe), (1, 6));
    assert_eq!(
        names(tree.children_of(world.europe).unwrap()),
        vec!["Germany", "Mexico"]
    );
    assert_nested_sets(&tree);
}

#[rstest]
fn given_subtree_when_moving_then_descendants_follow(world: World) {
    let mut tree = world.tree;
    let quebec = add(&mut tree, "Quebec", Some(world.canada));

    tree.move_to(world.canada, Some(world.germany)).unwrap();

    let quebec = tree.get(quebec).unwrap();
    assert_eq!(quebec.depth(), 3);
    assert_eq!(
        names(tree.ancestors_of(quebec.id).unwrap()),
        vec!["Europe", "Germany", "Canada"]
    );
    assert_nested_sets(&tree);
}

#[rstest]
fn given_child_when_moving_to_root_then_becomes_new_tree(world: World) {
    let mut tree = world.tree;

    tree.move_to(world.canada, None).unwrap();

    let canada = tree.get(world.canada).unwrap();
    assert!(canada.is_root());
    assert_eq!(canada.depth(), 0);
    assert_eq!((canada.left_bound(), canada.right_bound()), (1, 2));
    assert_eq!(canada.tree_id(), 3);
    assert_eq!(bounds(&tree, world.americas), (1, 4));
    assert_nested_sets(&tree);
}

#[rstest]
fn given_child_when_renamed_then_resorted_among_siblings(world: World) {
    let mut tree = world.tree;

    tree.update(
        world.canada,
        GroupChanges {
            name: Some("Peru".into()),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(bounds(&tree, world.mexico), (2, 3));
    assert_eq!(bounds(&tree, world.canada), (4, 5));
    assert_nested_sets(&tree);
}

#[rstest]
fn given_other_group_name_when_renaming_then_validation_error(world: World) {
    let mut tree = world.tree;
    let err = tree
        .update(
            world.canada,
            GroupChanges {
                name: Some("Mexico".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.fields(), vec!["name"]);
    assert_eq!(tree.get(world.canada).unwrap().name, "Canada");
}

// ============================================================
// Delete
// ============================================================

#[rstest]
fn given_group_with_children_when_deleting_without_cascade_then_protected(world: World) {
    let mut tree = world.tree;

    let err = tree.delete(world.americas, false).unwrap_err();

    match err {
        DomainError::Protected { dependents, .. } => assert_eq!(dependents, 2),
        other => panic!("expected protected error, got {other:?}"),
    }
    assert_eq!(tree.len(), 5);
}

#[rstest]
fn given_group_with_children_when_deleting_with_cascade_then_subtree_removed(world: World) {
    let mut tree = world.tree;

    let removed = tree.delete(world.americas, true).unwrap();

    assert_eq!(names(removed.iter()), vec!["Americas", "Canada", "Mexico"]);
    assert_eq!(names(tree.iter()), vec!["Europe", "Germany"]);
    assert_nested_sets(&tree);
}

#[rstest]
fn given_leaf_when_deleting_then_gap_closed(world: World) {
    let mut tree = world.tree;

    tree.delete(world.canada, false).unwrap();

    assert_eq!(bounds(&tree, world.americas), (1, 4));
    assert_eq!(bounds(&tree, world.mexico), (2, 3));
    assert_nested_sets(&tree);
}

// ============================================================
// Rebuild
// ============================================================

fn positions(tree: &GroupTree) -> Vec<(GroupId, tenancy::domain::TreePosition)> {
    let mut out: Vec<_> = tree.iter().map(|g| (g.id, g.position())).collect();
    out.sort_by_key(|(id, _)| id.0);
    out
}

#[rstest]
fn given_consistent_forest_when_rebuilding_twice_then_identical(world: World) {
    let mut tree = world.tree;
    add(&mut tree, "Quebec", Some(world.canada));
    tree.move_to(world.germany, Some(world.americas)).unwrap();

    let before = positions(&tree);
    tree.rebuild().unwrap();
    let once = positions(&tree);
    tree.rebuild().unwrap();
    let twice = positions(&tree);

    assert_eq!(before, once);
    assert_eq!(once, twice);
}

#[test]
fn given_records_without_bookkeeping_when_rebuilding_then_restores_invariants() {
    let json = r#"[
        {"id": "00000000-0000-0000-0000-000000000001", "name": "Europe", "slug": "europe"},
        {"id": "00000000-0000-0000-0000-000000000002", "name": "Germany", "slug": "germany",
         "parent": "00000000-0000-0000-0000-000000000001"},
        {"id": "00000000-0000-0000-0000-000000000003", "name": "Americas", "slug": "americas"},
        {"id": "00000000-0000-0000-0000-000000000004", "name": "Austria", "slug": "austria",
         "parent": "00000000-0000-0000-0000-000000000001"}
    ]"#;
    let records: Vec<TenantGroup> = serde_json::from_str(json).unwrap();
    let mut tree = GroupTree::from_records(records).unwrap();
    assert!(matches!(
        tree.check_integrity(),
        Err(DomainError::InconsistentTree(_))
    ));

    tree.rebuild().unwrap();

    assert_nested_sets(&tree);
    let americas = tree.get_by_slug("americas").unwrap();
    let europe = tree.get_by_slug("europe").unwrap();
    assert_eq!((americas.tree_id(), europe.tree_id()), (1, 2));
    assert_eq!((europe.left_bound(), europe.right_bound()), (1, 6));
    assert_eq!(tree.get_by_slug("austria").unwrap().left_bound(), 2);
}

#[test]
fn given_parent_cycle_when_loading_then_rejected_on_parent() {
    let json = r#"[
        {"id": "00000000-0000-0000-0000-000000000001", "name": "A", "slug": "a",
         "parent": "00000000-0000-0000-0000-000000000002"},
        {"id": "00000000-0000-0000-0000-000000000002", "name": "B", "slug": "b",
         "parent": "00000000-0000-0000-0000-000000000001"},
        {"id": "00000000-0000-0000-0000-000000000003", "name": "C", "slug": "c"}
    ]"#;
    let records: Vec<TenantGroup> = serde_json::from_str(json).unwrap();

    let err = GroupTree::from_records(records).unwrap_err();

    assert_eq!(err.fields(), vec!["parent"]);
    assert!(serde_json::from_str::<GroupTree>(json).is_err());
    let dataset = format!(r#"{{"revision": 1, "groups": {json}}}"#);
    assert!(serde_json::from_str::<Dataset>(&dataset).is_err());
}

#[test]
fn given_self_parent_when_loading_then_rejected() {
    let json = r#"[
        {"id": "00000000-0000-0000-0000-000000000001", "name": "A", "slug": "a",
         "parent": "00000000-0000-0000-0000-000000000001"}
    ]"#;
    let records: Vec<TenantGroup> = serde_json::from_str(json).unwrap();

    let err = GroupTree::from_records(records).unwrap_err();

    assert_eq!(err.fields(), vec!["parent"]);
}

fn unnumbered_europe() -> GroupTree {
    let json = r#"[
        {"id": "00000000-0000-0000-0000-000000000001", "name": "Europe", "slug": "europe"},
        {"id": "00000000-0000-0000-0000-000000000002", "name": "Germany", "slug": "germany",
         "parent": "00000000-0000-0000-0000-000000000001"},
        {"id": "00000000-0000-0000-0000-000000000003", "name": "Austria", "slug": "austria",
         "parent": "00000000-0000-0000-0000-000000000001"}
    ]"#;
    let records: Vec<TenantGroup> = serde_json::from_str(json).unwrap();
    GroupTree::from_records(records).unwrap()
}

#[test]
fn given_records_without_bookkeeping_when_counting_descendants_then_inconsistent_until_rebuilt() {
    let mut tree = unnumbered_europe();
    let europe = tree.get_by_slug("europe").unwrap().id;

    assert!(matches!(
        tree.descendant_count(europe),
        Err(DomainError::InconsistentTree(_))
    ));

    tree.rebuild().unwrap();

    assert_eq!(tree.descendant_count(europe).unwrap(), 2);
}

#[test]
fn given_records_without_bookkeeping_when_mutating_then_inconsistent_and_untouched() {
    let mut tree = unnumbered_europe();
    let europe = tree.get_by_slug("europe").unwrap().id;
    let germany = tree.get_by_slug("germany").unwrap().id;
    let austria = tree.get_by_slug("austria").unwrap().id;
    let before = positions(&tree);

    let results = [
        tree.move_to(germany, Some(austria)).err(),
        tree.move_to(germany, None).err(),
        tree.delete(europe, true).err(),
        tree.insert(NewTenantGroup::new("Poland", "poland").with_parent(europe))
            .err(),
        tree.update(
            germany,
            GroupChanges {
                name: Some("Deutschland".into()),
                ..Default::default()
            },
        )
        .err(),
    ];

    for err in results {
        assert!(matches!(err, Some(DomainError::InconsistentTree(_))), "{err:?}");
    }
    assert_eq!(positions(&tree), before);
    assert_eq!(tree.len(), 3);
}

#[test]
fn given_records_without_bookkeeping_when_moving_under_descendant_then_cycle_rejected() {
    let mut tree = unnumbered_europe();
    let europe = tree.get_by_slug("europe").unwrap().id;
    let germany = tree.get_by_slug("germany").unwrap().id;

    let err = tree.move_to(europe, Some(germany)).unwrap_err();

    assert_eq!(err.fields(), vec!["parent"]);
}

#[test]
fn given_forest_when_serialized_then_round_trips_with_bookkeeping() {
    let World { tree, .. } = world();
    let json = serde_json::to_string(&tree).unwrap();
    let restored: GroupTree = serde_json::from_str(&json).unwrap();

    assert_eq!(positions(&restored), positions(&tree));
    restored.check_integrity().unwrap();
}

// ============================================================
// Random operation sequences
// ============================================================

fn pick(rng: &mut StdRng, tree: &GroupTree) -> Option<GroupId> {
    let ids: Vec<GroupId> = tree.iter().map(|g| g.id).collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids[rng.random_range(0..ids.len())])
    }
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
#[case(2024)]
fn given_random_mutations_when_applied_then_invariants_hold_after_each_step(#[case] seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = GroupTree::new();
    let mut counter = 0u32;

    for step in 0..200 {
        counter += 1;
        let before = positions(&tree);
        match rng.random_range(0..4) {
            0 => {
                let parent = if rng.random_bool(0.7) { pick(&mut rng, &tree) } else { None };
                add(&mut tree, &format!("G{counter}"), parent);
            }
            1 => {
                if let Some(id) = pick(&mut rng, &tree) {
                    let target = if rng.random_bool(0.8) { pick(&mut rng, &tree) } else { None };
                    if tree.move_to(id, target).is_err() {
                        assert_eq!(positions(&tree), before, "seed {seed} step {step}");
                    }
                }
            }
            2 => {
                if let Some(id) = pick(&mut rng, &tree) {
                    let changes = GroupChanges {
                        name: Some(format!("R{counter}")),
                        ..Default::default()
                    };
                    tree.update(id, changes).unwrap();
                }
            }
            _ => {
                if let Some(id) = pick(&mut rng, &tree) {
                    let cascade = rng.random_bool(0.3);
                    if tree.delete(id, cascade).is_err() {
                        assert!(!cascade);
                        assert_eq!(positions(&tree), before, "seed {seed} step {step}");
                    }
                }
            }
        }

        assert_nested_sets(&tree);
        for g in tree.iter() {
            let expected = tree.descendants_of(g.id).unwrap().count();
            assert_eq!(tree.descendant_count(g.id).unwrap(), expected);
        }
        let mut rebuilt = tree.clone();
        rebuilt.rebuild().unwrap();
        let once = positions(&rebuilt);
        rebuilt.rebuild().unwrap();
        assert_eq!(positions(&rebuilt), once, "seed {seed} step {step}");
        assert_nested_sets(&rebuilt);
    }
}
