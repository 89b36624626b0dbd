extern crate std;

use std::{
    collections::{BTreeMap, BTreeSet},
    ops::Range,
    prelude::v1::*,
};

use proptest::prelude::*;

use crate::model::{self, TestNode};

use super::*;

fn insert_find_all<Tr: OrderedTree<TestNode> + Default>(keys: &[u32]) {
    let mut tree = Tr::default();

    for &key in keys {
        assert!(tree.insert(TestNode::new(key)).is_none());
        tree.assert_invariants();
    }

    for key in keys {
        let node = tree.find(key).expect("item not found");
        assert_eq!(node.key(), key);
        tree.assert_invariants();
    }
}

fn insert_remove_all<Tr: OrderedTree<TestNode> + Default>(keys: &[u32]) {
    let mut tree = Tr::default();

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys {
        let node = tree.remove(key).expect("item not found");
        assert_eq!(node.key, *key);
        assert!(tree.find(key).is_none());
        tree.assert_invariants();
    }

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        tree.remove(key).expect("item not found");
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
}

// Runs `f` on every permutation of `0..n`.
fn permutations(n: u32, f: &mut impl FnMut(&[u32])) {
    fn go(prefix: &mut Vec<u32>, rest: &mut Vec<u32>, f: &mut impl FnMut(&[u32])) {
        if rest.is_empty() {
            f(prefix);
            return;
        }

        for i in 0..rest.len() {
            let key = rest.remove(i);
            prefix.push(key);
            go(prefix, rest, f);
            prefix.pop();
            rest.insert(i, key);
        }
    }

    go(&mut Vec::new(), &mut (0..n).collect(), f);
}

#[test]
fn zero_elems_find() {
    insert_find_all::<BinarySearchTree<TestNode>>(&[]);
    insert_find_all::<SplayTree<TestNode>>(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all::<BinarySearchTree<TestNode>>(&[0]);
    insert_find_all::<SplayTree<TestNode>>(&[0]);
}

#[test]
fn up_to_five_elems_find() {
    for n in 2..=5 {
        permutations(n, &mut |keys| {
            insert_find_all::<BinarySearchTree<TestNode>>(keys);
            insert_find_all::<SplayTree<TestNode>>(keys);
        });
    }
}

#[test]
fn remove_one() {
    insert_remove_all::<BinarySearchTree<TestNode>>(&[0]);
    insert_remove_all::<SplayTree<TestNode>>(&[0]);
}

#[test]
fn up_to_five_elems_remove() {
    for n in 2..=5 {
        permutations(n, &mut |keys| {
            insert_remove_all::<BinarySearchTree<TestNode>>(keys);
            insert_remove_all::<SplayTree<TestNode>>(keys);
        });
    }
}

fn keys<Tr: OrderedTree<TestNode>>(tree: &Tr) -> Vec<u32> {
    tree.iter().map(|n| n.key).collect()
}

fn tree_of<Tr: OrderedTree<TestNode> + Default>(keys: &[u32]) -> Tr {
    let mut tree = Tr::default();
    for &key in keys {
        tree.insert(TestNode::new(key));
    }
    tree
}

#[test]
fn remove_leaves_the_rest_in_order() {
    fn check<Tr: OrderedTree<TestNode> + Default>() {
        let mut tree: Tr = tree_of(&[10, 100, 50, 200]);
        assert_eq!(tree.remove(&10).map(|n| n.key), Some(10));
        tree.assert_invariants();
        assert_eq!(keys(&tree), [50, 100, 200]);
    }

    check::<BinarySearchTree<TestNode>>();
    check::<SplayTree<TestNode>>();
}

#[test]
fn bst_find_and_remove() {
    let mut tree: BinarySearchTree<TestNode> = tree_of(&[50, 30, 70, 20, 40]);

    assert_eq!(tree.find(&40).map(|n| n.key), Some(40));
    assert_eq!(tree.remove(&30).map(|n| n.key), Some(30));
    tree.assert_invariants();
    assert_eq!(keys(&tree), [20, 40, 50, 70]);
}

#[test]
fn splay_find_moves_to_root() {
    let mut tree: SplayTree<TestNode> = tree_of(&[50, 30, 70, 20, 40, 60, 80, 10]);

    for key in [80, 10, 40, 60, 50, 20] {
        assert!(tree.find(&key).is_some());
        assert_eq!(tree.root().map(|n| n.key), Some(key));
        tree.assert_invariants();
    }
}

#[test]
fn prune_removes_node_and_descendants() {
    fn check<Tr: OrderedTree<TestNode> + Default>() {
        let mut tree: Tr = tree_of(&[50, 30, 70, 20, 40, 60, 80, 10]);
        let before = tree.len();

        let pruned = tree.prune(&30).expect("30 is present");
        let descendants = pruned.len() - 1;
        assert_eq!(tree.len(), before - (descendants + 1));
        tree.assert_invariants();

        for node in pruned.iter() {
            assert!(tree.find(&node.key).is_none());
        }
        assert!(tree.prune(&30).is_none());

        let removed = tree.remove(&70).map(|n| n.key);
        assert_eq!(removed, Some(70));
        assert_eq!(tree.len(), before - (descendants + 1) - 1);
    }

    check::<BinarySearchTree<TestNode>>();
    check::<SplayTree<TestNode>>();
}

#[test]
fn graft_disjoint_subtree() {
    fn check<Tr: OrderedTree<TestNode> + Default>() {
        let mut tree: Tr = tree_of(&[50, 10, 90]);

        let sub = Subtree::new(TestNode::new(30))
            .with_left(Subtree::new(TestNode::new(20)))
            .with_right(Subtree::new(TestNode::new(40)));
        assert!(tree.graft(sub).is_empty());
        tree.assert_invariants();

        for key in [10, 20, 30, 40, 50, 90] {
            assert_eq!(tree.find(&key).map(|n| n.key), Some(key));
        }
        assert_eq!(tree.len(), 6);
    }

    check::<BinarySearchTree<TestNode>>();
    check::<SplayTree<TestNode>>();
}

#[test]
fn graft_with_collisions() {
    fn check<Tr: OrderedTree<TestNode> + Default>() {
        let mut tree: Tr = tree_of(&[50, 10, 90]);

        // 50 and 10 collide; their children still have to land.
        let sub = Subtree::new(TestNode::new(50))
            .with_left(Subtree::new(TestNode::new(10)).with_right(Subtree::new(TestNode::new(20))))
            .with_right(Subtree::new(TestNode::new(70)));

        let mut rejected: Vec<u32> = tree.graft(sub).into_iter().map(|n| n.key).collect();
        rejected.sort_unstable();
        assert_eq!(rejected, [10, 50]);
        tree.assert_invariants();

        assert_eq!(keys(&tree), [10, 20, 50, 70, 90]);
    }

    check::<BinarySearchTree<TestNode>>();
    check::<SplayTree<TestNode>>();
}

#[test]
fn graft_misordered_subtree() {
    fn check<Tr: OrderedTree<TestNode> + Default>() {
        let mut tree: Tr = tree_of(&[50]);

        // Not a search tree: 60 sits on the left of 40.
        let sub = Subtree::new(TestNode::new(40))
            .with_left(Subtree::new(TestNode::new(60)))
            .with_right(Subtree::new(TestNode::new(45)));

        assert!(tree.graft(sub).is_empty());
        tree.assert_invariants();
        assert_eq!(keys(&tree), [40, 45, 50, 60]);
    }

    check::<BinarySearchTree<TestNode>>();
    check::<SplayTree<TestNode>>();
}

#[test]
fn graft_duplicates_inside_subtree() {
    fn check<Tr: OrderedTree<TestNode> + Default>() {
        let mut tree: Tr = tree_of(&[50]);

        // 30 appears twice and 50 collides with the tree.
        let seventy = Subtree::new(TestNode::new(70)).with_left(Subtree::new(TestNode::new(50)));
        let sub: Subtree<TestNode> = Subtree::new(TestNode::new(30))
            .with_left(Subtree::new(TestNode::new(30)))
            .with_right(seventy);
        let grafted = sub.len();

        let mut rejected: Vec<u32> = tree.graft(sub).into_iter().map(|n| n.key).collect();
        rejected.sort_unstable();
        assert_eq!(rejected, [30, 50]);
        tree.assert_invariants();

        assert_eq!(keys(&tree), [30, 50, 70]);
        assert_eq!(tree.len() + rejected.len(), 1 + grafted);
    }

    check::<BinarySearchTree<TestNode>>();
    check::<SplayTree<TestNode>>();
}

// Grafts a subtree of any shape onto a tree built from `base` and checks that every key ends up
// in the tree exactly once.
fn graft_arbitrary_shape<Tr: OrderedTree<TestNode> + Default>(base: &[u32], nodes: &[(u32, u32)]) {
    let mut tree: Tr = tree_of(base);
    let before = tree.len();

    let Some(sub) = model::shaped_subtree(nodes) else {
        return;
    };
    let grafted = sub.len();

    let rejected = tree.graft(sub);
    tree.assert_invariants();
    assert_eq!(tree.len() + rejected.len(), before + grafted);

    let all_keys: BTreeSet<u32> = base
        .iter()
        .chain(nodes.iter().map(|(key, _)| key))
        .copied()
        .collect();
    assert_eq!(keys(&tree), all_keys.into_iter().collect::<Vec<_>>());

    for node in &rejected {
        assert!(tree.find(&node.key).is_some());
    }
}

fn parents(tree: &BinarySearchTree<TestNode>) -> BTreeMap<u32, Option<u32>> {
    tree.iter()
        .map(|n| (n.key, crate::node::parent_of(n).map(|p| p.key)))
        .collect()
}

#[test]
fn bst_remove_reparents_at_most_two() {
    // The removed node's children are adopted by whatever takes its place. Beyond those, only the
    // successor and the successor's right child may end up under a new parent.
    for n in 1..=6 {
        permutations(n, &mut |keys| {
            for &removed in keys {
                let mut tree: BinarySearchTree<TestNode> = tree_of(keys);
                let before = parents(&tree);

                tree.remove(&removed).expect("key was inserted");
                tree.assert_invariants();

                let mut reparented = 0;
                for (key, parent) in parents(&tree) {
                    let old = before[&key];
                    if old != Some(removed) && old != parent {
                        reparented += 1;
                    }
                }
                assert!(reparented <= 2, "removing {removed} from {keys:?} moved {reparented}");
            }
        });
    }
}

#[test]
fn cursor_fails_after_mutation() {
    fn check<Tr: OrderedTree<TestNode> + Default>() {
        let mut tree: Tr = tree_of(&[2, 1, 3]);

        let mut cursor = tree.cursor();
        assert_eq!(cursor.next(&tree).unwrap().map(|n| n.key), Some(1));
        assert_eq!(cursor.next(&tree).unwrap().map(|n| n.key), Some(2));

        let before = tree.stamp();
        tree.insert(TestNode::new(4));
        assert!(tree.stamp().generation() > before.generation());

        assert_eq!(
            cursor.next(&tree).map(|n| n.map(|n| n.key)),
            Err(TreeError::ConcurrentModification {
                expected: before.generation(),
                found: tree.stamp().generation(),
            })
        );
        assert!(cursor.get(&tree).is_err());

        // A fresh cursor sees the new element.
        let mut cursor = tree.cursor();
        let mut seen = Vec::new();
        while let Some(node) = cursor.next(&tree).unwrap() {
            seen.push(node.key);
        }
        assert_eq!(seen, [1, 2, 3, 4]);

        tree.remove(&1);
        assert!(cursor.move_next(&tree).is_err());
    }

    check::<BinarySearchTree<TestNode>>();
    check::<SplayTree<TestNode>>();
}

#[test]
fn cursor_survives_non_structural_operations() {
    let mut tree: BinarySearchTree<TestNode> = tree_of(&[2, 1, 3]);

    let mut cursor = tree.cursor();
    assert_eq!(cursor.next(&tree).unwrap().map(|n| n.key), Some(1));

    // Duplicate inserts, misses and lookups leave a plain tree untouched.
    assert!(tree.insert(TestNode::new(2)).is_some());
    assert!(tree.remove(&7).is_none());
    assert!(tree.find(&3).is_some());

    assert_eq!(cursor.next(&tree).unwrap().map(|n| n.key), Some(2));
    assert_eq!(cursor.generation(), tree.stamp().generation());
}

#[test]
#[should_panic(expected = "cursor used with a tree it was not created from")]
fn cursor_rejects_other_tree() {
    let tree: BinarySearchTree<TestNode> = tree_of(&[1]);
    let other: BinarySearchTree<TestNode> = tree_of(&[1]);

    let mut cursor = tree.cursor();
    let _ = cursor.move_next(&other);
}

#[test]
fn observer_sees_rotation_edits() {
    let mut edits = Vec::new();

    let sub: Subtree<BinaryNode<u32>> =
        Subtree::new(BinaryNode::new(2)).with_left(Subtree::new(BinaryNode::new(1)));
    let one = core::ptr::NonNull::from(sub.root().left().unwrap());

    let rotated = unsafe { rotate::rotate_l(&mut |m: Modification| edits.push(m), one) }.unwrap();
    assert_eq!(rotated.node, one);
    assert!(rotated.parent.is_none());

    // 2 trades 1 for 1's empty right slot, 1 adopts 2, then both parent pointers move.
    assert_eq!(
        edits,
        [
            Modification::Abandon,
            Modification::Adopt,
            Modification::Adopt,
            Modification::Move,
            Modification::Move,
        ]
    );

    // `sub` still believes 2 is its root; hand ownership to the lifted node instead.
    let (_, len) = sub.into_raw();
    drop(unsafe { Subtree::from_raw(one, len) });
}

#[test]
fn bst_set_and_splay_set_agree() {
    let keys = [50, 30, 70, 20, 40, 60, 80];
    let mut bst: BstSet<u32> = keys.into_iter().collect();
    let mut splay: SplaySet<u32> = keys.into_iter().collect();

    for key in [30, 80, 5] {
        assert_eq!(bst.remove(&key), splay.remove(&key));
    }

    assert_eq!(
        bst.iter().collect::<Vec<_>>(),
        splay.iter().collect::<Vec<_>>()
    );
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn bst_btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence::<BinarySearchTree<TestNode>>(ops);
    }

    #[test]
    fn splay_btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence::<SplayTree<TestNode>>(ops);
    }

    #[test]
    fn bst_graft_arbitrary_shapes(
        base in proptest::collection::vec(0u32..60, 0..30),
        nodes in proptest::collection::vec((0u32..60, any::<u32>()), 0..30),
    ) {
        graft_arbitrary_shape::<BinarySearchTree<TestNode>>(&base, &nodes);
    }

    #[test]
    fn splay_graft_arbitrary_shapes(
        base in proptest::collection::vec(0u32..60, 0..30),
        nodes in proptest::collection::vec((0u32..60, any::<u32>()), 0..30),
    ) {
        graft_arbitrary_shape::<SplayTree<TestNode>>(&base, &nodes);
    }

    #[test]
    fn bst_cursor_equivalence(
        values in proptest::collection::vec(0u32..1000, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence::<BinarySearchTree<TestNode>>(values, ops);
    }

    #[test]
    fn splay_cursor_equivalence(
        values in proptest::collection::vec(0u32..1000, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence::<SplayTree<TestNode>>(values, ops);
    }
}
