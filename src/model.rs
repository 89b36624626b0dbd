//! Operation models checking both trees against `std::collections::BTreeSet`.
//!
//! Used by the property tests and, with the `model` feature, by the fuzz targets.
extern crate std;

use std::{collections::BTreeSet, prelude::v1::*, ptr::NonNull};

use arbitrary::Arbitrary;
use cordyceps::Linked;
use proptest::strategy::{Just, Strategy};

use crate::{BinarySearchTree, Links, OrderedTree, Subtree, TreeError, TreeNode};

#[derive(Debug)]
#[repr(C)]
pub struct TestNode {
    pub links: Links<TestNode>,
    pub key: u32,
}

impl TestNode {
    pub(crate) fn new(key: u32) -> Box<TestNode> {
        Box::new(TestNode {
            links: Links::new(),
            key,
        })
    }
}

unsafe impl Linked<Links<TestNode>> for TestNode {
    type Handle = Box<TestNode>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        NonNull::new(Box::into_raw(r)).unwrap()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<TestNode>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl TreeNode<Links<TestNode>> for TestNode {
    type Key = u32;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

impl ItemValue {
    // Resolves to a present key most of the time, so lookups and removals mostly hit.
    fn resolve(self, sorted: &[u32]) -> u32 {
        match self {
            ItemValue::Index(idx) => {
                if sorted.is_empty() {
                    idx as u32
                } else {
                    sorted[idx % sorted.len()]
                }
            }
            ItemValue::Random(v) => v,
        }
    }
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    Find(ItemValue),
    Remove(ItemValue),
    Prune(ItemValue),
    Graft(Vec<ItemValue>),
    /// Grafts a subtree of any shape; each key carries the path bits that place it.
    GraftShaped(Vec<(ItemValue, u32)>),
    First,
    Last,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        match self {
            Op::Insert(item) => FinalOp::Insert(item.resolve(sorted)),
            Op::Find(item) => FinalOp::Find(item.resolve(sorted)),
            Op::Remove(item) => FinalOp::Remove(item.resolve(sorted)),
            Op::Prune(item) => FinalOp::Prune(item.resolve(sorted)),
            Op::Graft(items) => {
                FinalOp::Graft(items.into_iter().map(|i| i.resolve(sorted)).collect())
            }
            Op::GraftShaped(items) => FinalOp::GraftShaped(
                items
                    .into_iter()
                    .map(|(i, path)| (i.resolve(sorted), path))
                    .collect(),
            ),
            Op::First => FinalOp::First,
            Op::Last => FinalOp::Last,
        }
    }
}

#[derive(Clone, Debug)]
enum FinalOp {
    Insert(u32),
    Find(u32),
    Remove(u32),
    Prune(u32),
    Graft(Vec<u32>),
    GraftShaped(Vec<(u32, u32)>),
    First,
    Last,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        4 => value_strategy().prop_map(Op::Insert),
        2 => value_strategy().prop_map(Op::Find),
        2 => value_strategy().prop_map(Op::Remove),
        1 => value_strategy().prop_map(Op::Prune),
        1 => proptest::collection::vec(value_strategy(), 0..8).prop_map(Op::Graft),
        1 => proptest::collection::vec((value_strategy(), proptest::arbitrary::any::<u32>()), 0..12)
            .prop_map(Op::GraftShaped),
        1 => Just(Op::First),
        1 => Just(Op::Last),
    ]
}

// Builds a detached subtree holding `keys` (duplicates dropped) in insertion order.
fn subtree_of(keys: &[u32]) -> Option<Subtree<TestNode>> {
    let mut scratch: BinarySearchTree<TestNode> = BinarySearchTree::new();
    for &key in keys {
        scratch.insert(TestNode::new(key));
    }

    let root = scratch.root().map(|n| n.key)?;
    scratch.prune(&root)
}

/// Builds a subtree of `(key, path)` pairs with no regard for search order.
///
/// The first pair is the root. Every other pair goes to the left subtree if the low bit of its path
/// is clear and to the right otherwise, and is placed there by the remaining bits. Keys may repeat.
pub fn shaped_subtree(nodes: &[(u32, u32)]) -> Option<Subtree<TestNode>> {
    let (&(key, _), rest) = nodes.split_first()?;

    let mut left = Vec::new();
    let mut right = Vec::new();
    for &(key, path) in rest {
        if path & 1 == 0 {
            left.push((key, path >> 1));
        } else {
            right.push((key, path >> 1));
        }
    }

    let mut sub: Subtree<TestNode> = Subtree::new(TestNode::new(key));
    if let Some(left) = shaped_subtree(&left) {
        sub = sub.with_left(left);
    }
    if let Some(right) = shaped_subtree(&right) {
        sub = sub.with_right(right);
    }
    Some(sub)
}

pub fn run_btree_equivalence<Tr>(ops: Vec<Op>)
where
    Tr: OrderedTree<TestNode> + Default,
{
    let mut btree = BTreeSet::new();
    let mut tree = Tr::default();

    #[inline]
    #[allow(clippy::boxed_local)]
    fn node_key(node: Box<TestNode>) -> u32 {
        node.key
    }

    #[inline]
    fn ref_key(node: core::pin::Pin<&TestNode>) -> u32 {
        node.key
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let sorted: Vec<u32> = btree.iter().copied().collect();
        let final_op = op.finalize(&sorted);

        match final_op.clone() {
            FinalOp::Insert(value) => {
                let from_btree = if btree.insert(value) {
                    None
                } else {
                    Some(value)
                };
                let from_tree = tree.insert(TestNode::new(value)).map(node_key);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Find(value) => {
                let from_btree = btree.get(&value).copied();
                let from_tree = tree.find(&value).map(ref_key);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Remove(value) => {
                let from_btree = btree.remove(&value).then_some(value);
                let from_tree = tree.remove(&value).map(node_key);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Prune(value) => {
                let pruned: Option<Vec<u32>> = tree
                    .prune(&value)
                    .map(|sub| sub.iter().map(|n| n.key).collect());

                match pruned {
                    None => assert!(!btree.contains(&value), "FinalOp #{op_id}: {final_op:?}"),
                    Some(keys) => {
                        // A subtree always spans a contiguous run of the sorted keys.
                        let (lo, hi) = (keys[0], keys[keys.len() - 1]);
                        let expected: Vec<u32> = btree.range(lo..=hi).copied().collect();
                        assert_eq!(keys, expected, "FinalOp #{op_id}: {final_op:?}");
                        assert!(keys.contains(&value));

                        for key in keys {
                            btree.remove(&key);
                        }
                    }
                }
            }

            FinalOp::Graft(values) => {
                let Some(subtree) = subtree_of(&values) else {
                    continue;
                };

                let distinct: BTreeSet<u32> = values.iter().copied().collect();
                let expected_rejected: Vec<u32> = distinct.intersection(&btree).copied().collect();

                let mut rejected: Vec<u32> =
                    tree.graft(subtree).into_iter().map(node_key).collect();
                rejected.sort_unstable();

                assert_eq!(rejected, expected_rejected, "FinalOp #{op_id}: {final_op:?}");
                btree.extend(distinct);
            }

            FinalOp::GraftShaped(nodes) => {
                let Some(subtree) = shaped_subtree(&nodes) else {
                    continue;
                };
                let grafted = subtree.len();
                let before = tree.len();

                // One node per new key lands; every other copy comes back.
                let mut expected_rejected: Vec<u32> = nodes.iter().map(|&(key, _)| key).collect();
                let distinct: BTreeSet<u32> = expected_rejected.iter().copied().collect();
                for key in distinct.difference(&btree) {
                    if let Some(idx) = expected_rejected.iter().position(|k| k == key) {
                        expected_rejected.swap_remove(idx);
                    }
                }
                expected_rejected.sort_unstable();

                let mut rejected: Vec<u32> =
                    tree.graft(subtree).into_iter().map(node_key).collect();
                rejected.sort_unstable();

                assert_eq!(rejected, expected_rejected, "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(tree.len() + rejected.len(), before + grafted);
                btree.extend(distinct);
            }

            FinalOp::First => {
                let from_btree = btree.first().copied();
                let from_tree = tree.first().map(ref_key);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last().copied();
                let from_tree = tree.last().map(ref_key);

                assert_eq!(from_btree, from_tree, "FinalOp #{op_id}: {final_op:?}");
            }
        }

        tree.assert_invariants();
        assert_eq!(btree.len(), tree.len());
        assert!(btree.iter().zip(tree.iter()).all(|(&a, b)| a == b.key));
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    // Get is not an operation as it's executed on every loop iteration to check equivalence.
    MoveNext,
    Insert(ItemValue),
    Remove(ItemValue),
    Find(ItemValue),
    Reset,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        8 => Just(CursorOp::MoveNext),
        1 => value_strategy().prop_map(CursorOp::Insert),
        1 => value_strategy().prop_map(CursorOp::Remove),
        1 => value_strategy().prop_map(CursorOp::Find),
        2 => Just(CursorOp::Reset),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub values: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

impl<'a> arbitrary::Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        fn value(u: &mut arbitrary::Unstructured<'_>) -> u32 {
            u32::arbitrary(u).unwrap_or(0)
        }

        fn op(u: &mut arbitrary::Unstructured<'_>) -> CursorOp {
            CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext)
        }

        let num_values = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let values = core::iter::repeat_with(|| value(u))
            .take(num_values.into())
            .collect();

        let ops = core::iter::repeat_with(|| op(u))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { values, ops })
    }
}

/// Walks a cursor alongside an index into a sorted `Vec`.
///
/// While the tree's stamp is unchanged the cursor must agree with the index; after any structural
/// modification every step must fail until the cursor is recreated.
pub fn run_cursor_equivalence<Tr>(mut values: Vec<u32>, ops: Vec<CursorOp>)
where
    Tr: OrderedTree<TestNode> + Default,
{
    values.sort_unstable();
    values.dedup();

    let mut vec = Vec::new();
    let mut tree = Tr::default();

    for val in values {
        vec.push(val);
        tree.insert(TestNode::new(val));
    }

    fn vec_curs_next(v: &[u32], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_add(1).filter(|&i| i < v.len()),
            None => (!v.is_empty()).then_some(0),
        }
    }

    fn assert_stale<T>(result: Result<T, TreeError>) {
        assert!(matches!(
            result,
            Err(TreeError::ConcurrentModification { .. })
        ));
    }

    let mut vec_curs = None;
    let mut cursor = tree.cursor();
    let mut created = tree.stamp();

    for op in ops {
        match op {
            CursorOp::MoveNext => {
                let result = cursor.move_next(&tree);
                if tree.stamp() == created {
                    assert!(result.is_ok());
                    vec_curs = vec_curs_next(&vec, vec_curs);
                } else {
                    assert_stale(result);
                }
            }

            CursorOp::Insert(item) => {
                let value = item.resolve(&vec);
                if tree.insert(TestNode::new(value)).is_none() {
                    assert_ne!(tree.stamp(), created);
                    if let Err(idx) = vec.binary_search(&value) {
                        vec.insert(idx, value);
                    }
                }
            }

            CursorOp::Remove(item) => {
                let value = item.resolve(&vec);
                if tree.remove(&value).is_some() {
                    assert_ne!(tree.stamp(), created);
                    if let Ok(idx) = vec.binary_search(&value) {
                        vec.remove(idx);
                    }
                }
            }

            CursorOp::Find(item) => {
                let value = item.resolve(&vec);
                let found = tree.find(&value).map(|n| n.key);
                assert_eq!(found, vec.binary_search(&value).ok().map(|i| vec[i]));
            }

            CursorOp::Reset => {
                cursor = tree.cursor();
                created = tree.stamp();
                vec_curs = None;
            }
        }

        let got = cursor.get(&tree);
        if tree.stamp() == created {
            let got = got.map(|n| n.map(|n| n.key));
            assert_eq!(got, Ok(vec_curs.map(|i| vec[i])));
        } else {
            assert_stale(got);
        }
    }
}
