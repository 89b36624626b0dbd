use core::{borrow::Borrow, fmt, marker::PhantomData};

use crate::{BinaryNode, BinarySearchTree, Cursor, OrderedTree, SplayTree, Subtree};

/// An ordered set of keys stored in [`BinaryNode`]s of an [`OrderedTree`].
///
/// The set allocates a node per key and hides the node handles.
pub struct TreeSet<K, Tr>
where
    K: Ord + fmt::Debug,
    Tr: OrderedTree<BinaryNode<K>>,
{
    tree: Tr,
    _key: PhantomData<fn() -> K>,
}

/// An ordered set based on an unbalanced [`BinarySearchTree`].
pub type BstSet<K> = TreeSet<K, BinarySearchTree<BinaryNode<K>>>;

/// An ordered set based on a [`SplayTree`].
pub type SplaySet<K> = TreeSet<K, SplayTree<BinaryNode<K>>>;

impl<K, Tr> TreeSet<K, Tr>
where
    K: Ord + fmt::Debug,
    Tr: OrderedTree<BinaryNode<K>> + Default,
{
    /// Creates a new, empty set.
    pub fn new() -> Self {
        Self {
            tree: Tr::default(),
            _key: PhantomData,
        }
    }
}

impl<K, Tr> TreeSet<K, Tr>
where
    K: Ord + fmt::Debug,
    Tr: OrderedTree<BinaryNode<K>>,
{
    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the underlying tree, for use with a [`Cursor`] or for inspecting its shape.
    pub fn as_tree(&self) -> &Tr {
        &self.tree
    }

    /// Adds `key` to the set.
    ///
    /// Returns `false` if an equal key was already present; the set is left as it was.
    pub fn add(&mut self, key: K) -> bool {
        self.tree.insert(BinaryNode::new(key)).is_none()
    }

    /// Returns `true` if the set contains `key`.
    #[inline]
    pub fn contains<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(key).is_some()
    }

    /// Removes `key` from the set, returning whether it was present.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Removes and returns the key equal to `key`.
    #[inline]
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(key).map(BinaryNode::into_item)
    }

    /// Removes `key` along with every key stored beneath it, returning them in order.
    pub fn prune<Q>(&mut self, key: &Q) -> Option<Vec<K>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let subtree = self.tree.prune(key)?;
        Some(
            subtree
                .into_handles()
                .into_iter()
                .map(BinaryNode::into_item)
                .collect(),
        )
    }

    /// Grafts a subtree of keys into the set, returning the keys that were already present.
    pub fn graft(&mut self, subtree: Subtree<BinaryNode<K>>) -> Vec<K> {
        self.tree
            .graft(subtree)
            .into_iter()
            .map(BinaryNode::into_item)
            .collect()
    }

    /// Returns the least key in the set.
    pub fn first(&self) -> Option<&K> {
        self.tree.first().map(|node| node.get_ref().item())
    }

    /// Returns the greatest key in the set.
    pub fn last(&self) -> Option<&K> {
        self.tree.last().map(|node| node.get_ref().item())
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &K> + '_ {
        self.tree.iter().map(BinaryNode::item)
    }

    /// Returns a cursor over the set's nodes; step it with [`as_tree`](Self::as_tree).
    pub fn cursor(&self) -> Cursor<BinaryNode<K>> {
        self.tree.cursor()
    }

    /// Clears the set, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<K, Tr> Default for TreeSet<K, Tr>
where
    K: Ord + fmt::Debug,
    Tr: OrderedTree<BinaryNode<K>> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, Tr> Extend<K> for TreeSet<K, Tr>
where
    K: Ord + fmt::Debug,
    Tr: OrderedTree<BinaryNode<K>>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.add(key);
        }
    }
}

impl<K, Tr> FromIterator<K> for TreeSet<K, Tr>
where
    K: Ord + fmt::Debug,
    Tr: OrderedTree<BinaryNode<K>> + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<K, Tr> fmt::Debug for TreeSet<K, Tr>
where
    K: Ord + fmt::Debug,
    Tr: OrderedTree<BinaryNode<K>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(key: u32) -> Subtree<BinaryNode<u32>> {
        Subtree::new(BinaryNode::new(key))
    }

    #[test]
    fn bst_set_basics() {
        let mut set: BstSet<u32> = [50, 30, 70, 20, 40].into_iter().collect();
        assert_eq!(set.len(), 5);
        assert!(!set.add(40));
        assert!(set.contains(&40));

        assert!(set.remove(&30));
        assert!(!set.remove(&30));
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), [20, 40, 50, 70]);
        assert_eq!(set.first(), Some(&20));
        assert_eq!(set.last(), Some(&70));
    }

    #[test]
    fn splay_set_prune_and_graft() {
        let mut set: SplaySet<u32> = (1..=7).collect();

        // Ascending inserts leave a left spine below the root, so pruning 4 takes 1..=4.
        assert_eq!(set.prune(&4), Some(vec![1, 2, 3, 4]));
        assert_eq!(set.len(), 3);
        assert_eq!(set.prune(&4), None);

        let rejected = set.graft(leaf(6).with_left(leaf(2)).with_right(leaf(9)));
        assert_eq!(rejected, [6]);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), [2, 5, 6, 7, 9]);
        assert_eq!(format!("{set:?}"), "{2, 5, 6, 7, 9}");

        assert_eq!(set.take(&9), Some(9));
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn cursor_over_set() {
        let set: BstSet<&str> = ["b", "a", "c"].into_iter().collect();
        let mut cursor = set.cursor();

        let mut seen = Vec::new();
        while let Some(node) = cursor.next(set.as_tree()).unwrap() {
            seen.push(*node.item());
        }
        assert_eq!(seen, ["a", "b", "c"]);
    }
}
