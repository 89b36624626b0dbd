use core::{borrow::Borrow, fmt, pin::Pin};

use crate::{
    raw::{pin, RawTree},
    Iter, Links, OrderedTree, Stamp, Subtree, TreeNode,
};

/// An intrusive, unbalanced binary search tree.
///
/// Nodes are placed by key and never rebalanced, so the shape follows insertion order and
/// operations take time proportional to the tree's height. Removing a node with two children
/// moves its in-order successor node into its place.
pub struct BinarySearchTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) raw: RawTree<T>,
}

impl<T> BinarySearchTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub fn new() -> BinarySearchTree<T> {
        BinarySearchTree {
            raw: RawTree::new(),
        }
    }

    /// Returns a reference to the node corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        unsafe { pin(self.raw.get_raw(key)) }
    }

    /// Returns `true` if the tree contains a node with key `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.get_raw(key).is_some()
    }
}

impl<T> OrderedTree<T> for BinarySearchTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn len(&self) -> usize {
        self.raw.len()
    }

    fn stamp(&self) -> Stamp {
        self.raw.stamp
    }

    fn root(&self) -> Option<Pin<&T>> {
        unsafe { pin(self.raw.root) }
    }

    fn first(&self) -> Option<Pin<&T>> {
        unsafe { pin(self.raw.first()) }
    }

    fn last(&self) -> Option<Pin<&T>> {
        unsafe { pin(self.raw.last()) }
    }

    fn iter(&self) -> Iter<'_, T> {
        self.raw.iter()
    }

    /// Inserts `item` as a new leaf.
    ///
    /// This operation completes in _O(h)_ time, where _h_ is the height of the tree.
    fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        self.raw.insert(item).err().map(|(rejected, _)| rejected)
    }

    fn find<Q>(&mut self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.raw.get_raw(key)?;
        let (removed, _) = unsafe { self.raw.unlink(node) };
        Some(removed)
    }

    fn prune<Q>(&mut self, key: &Q) -> Option<Subtree<T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.raw.get_raw(key)?;
        let (subtree, _) = unsafe { self.raw.detach(node) };
        Some(subtree)
    }

    fn graft(&mut self, subtree: Subtree<T>) -> Vec<T::Handle> {
        let (rejected, _) = self.raw.graft(subtree);
        rejected
    }

    fn clear(&mut self) {
        self.raw.clear();
    }

    fn assert_invariants(&self) {
        self.raw.assert_invariants();
    }
}

impl<T> Default for BinarySearchTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BinarySearchTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|n| n.key())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryNode;

    fn tree_of(keys: &[u32]) -> BinarySearchTree<BinaryNode<u32>> {
        let mut tree = BinarySearchTree::<BinaryNode<u32>>::new();
        for &key in keys {
            assert!(tree.insert(BinaryNode::new(key)).is_none());
        }
        tree.assert_invariants();
        tree
    }

    fn keys(tree: &BinarySearchTree<BinaryNode<u32>>) -> Vec<u32> {
        tree.iter().map(|n| *n.item()).collect()
    }

    #[test]
    fn shape_follows_insertion_order() {
        let tree = tree_of(&[50, 30, 70, 20, 40]);

        let root = tree.root().unwrap();
        assert_eq!(*root.item(), 50);
        assert_eq!(root.left().map(|n| *n.item()), Some(30));
        assert_eq!(root.right().map(|n| *n.item()), Some(70));
        assert_eq!(tree.first().map(|n| *n.item()), Some(20));
        assert_eq!(tree.last().map(|n| *n.item()), Some(70));
    }

    #[test]
    fn remove_two_children_moves_successor_node() {
        let mut tree = tree_of(&[50, 30, 70, 20, 40]);

        let forty: *const BinaryNode<u32> = tree.get(&40).unwrap().get_ref();
        let removed = tree.remove(&30).unwrap();
        assert_eq!(removed.into_item(), 30);
        tree.assert_invariants();

        // The successor node itself now sits where 30 was.
        let root = tree.root().unwrap();
        let moved = root.get_ref().left().unwrap();
        assert!(core::ptr::eq(moved, forty));
        assert_eq!(moved.left().map(|n| *n.item()), Some(20));
        assert_eq!(keys(&tree), [20, 40, 50, 70]);
    }

    #[test]
    fn remove_root_and_missing() {
        let mut tree = tree_of(&[10, 100, 50, 200]);

        assert!(tree.remove(&7).is_none());
        assert_eq!(tree.remove(&10).map(|n| n.into_item()), Some(10));
        tree.assert_invariants();
        assert_eq!(keys(&tree), [50, 100, 200]);
        assert_eq!(tree.root().map(|n| *n.item()), Some(100));
    }

    #[test]
    fn prune_then_graft_elsewhere() {
        let mut tree = tree_of(&[50, 30, 70, 20, 40, 60, 80]);

        let pruned = tree.prune(&70).unwrap();
        assert_eq!(pruned.len(), 3);
        assert_eq!(tree.len(), 4);
        tree.assert_invariants();
        assert!(tree.prune(&70).is_none());

        let mut other = tree_of(&[100]);
        assert!(other.graft(pruned).is_empty());
        other.assert_invariants();
        assert_eq!(keys(&other), [60, 70, 80, 100]);
    }
}
