use core::{borrow::Borrow, fmt, pin::Pin, ptr::NonNull};

use crate::{
    node::{links, set_child, set_parent, subtree_len, Dir},
    raw::{pin, RawTree, Search},
    rotate::{self, maximum, minimum},
    Iter, Links, OrderedTree, Stamp, Subtree, TreeError, TreeNode,
};

/// An intrusive splay tree.
///
/// Every access moves the node it touched to the root with a sequence of zig-zig, zig-zag and zig
/// rotations, so recently used keys stay near the top. Operations complete in amortized
/// _O(log(n))_ time, although a single operation may take _O(n)_.
///
/// Because lookups restructure the tree, they take `&mut self` and invalidate cursors.
/// [`first`](OrderedTree::first), [`last`](OrderedTree::last) and iteration leave the shape alone.
pub struct SplayTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) raw: RawTree<T>,
}

impl<T> SplayTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub fn new() -> SplayTree<T> {
        SplayTree {
            raw: RawTree::new(),
        }
    }

    // Splays `node` to the root.
    fn splay(&mut self, node: NonNull<T>) {
        let root = unsafe { rotate::splay(&mut self.raw.stamp, node) };
        self.raw.root = Some(root);
    }

    // Joins two parentless subtrees whose keys are disjoint and ordered, returning the new root.
    //
    // The maximum of `left` is splayed to its root and gets `right` as its right child.
    unsafe fn join(&mut self, left: NonNull<T>, right: NonNull<T>) -> Result<NonNull<T>, TreeError> {
        unsafe {
            let max = maximum(left);
            let min = minimum(right);

            let (max_key, min_key) = (max.as_ref().key(), min.as_ref().key());
            if max_key >= min_key {
                return Err(TreeError::misordered(max_key, min_key));
            }

            let top = rotate::splay(&mut self.raw.stamp, max);
            debug_assert!(links(top).right().is_none());

            set_child(&mut self.raw.stamp, top, Dir::Right, Some(right));
            set_parent(&mut self.raw.stamp, right, Some(top));

            Ok(top)
        }
    }

    // Unlinks the root node and joins what was below it.
    unsafe fn remove_root(&mut self) -> Option<T::Handle> {
        let root = self.raw.root?;

        unsafe {
            let left = links(root).left();
            let right = links(root).right();

            for (dir, child) in [(Dir::Left, left), (Dir::Right, right)] {
                if let Some(child) = child {
                    set_child(&mut self.raw.stamp, root, dir, None);
                    set_parent(&mut self.raw.stamp, child, None);
                }
            }

            self.raw.set_root(None);
            self.raw.len -= 1;

            match (left, right) {
                (None, None) => {}
                (Some(only), None) | (None, Some(only)) => self.raw.set_root(Some(only)),
                (Some(left), Some(right)) => match self.join(left, right) {
                    Ok(top) => self.raw.set_root(Some(top)),
                    Err(_err) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(err = %_err, "splay join out of order, regrafting right subtree");

                        self.raw.set_root(Some(left));

                        let right_len = subtree_len(right);
                        self.raw.len -= right_len;
                        let (rejected, _) = self.raw.graft(Subtree::from_raw(right, right_len));
                        debug_assert!(rejected.is_empty());
                    }
                },
            }

            Some(T::from_ptr(root))
        }
    }
}

impl<T> OrderedTree<T> for SplayTree<T>
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

    /// Inserts `item` and splays it to the root.
    ///
    /// If the key is already present, the resident node is splayed instead and `item` is returned.
    fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        match self.raw.insert(item) {
            Ok(inserted) => {
                self.splay(inserted);
                None
            }
            Err((rejected, existing)) => {
                self.splay(existing);
                Some(rejected)
            }
        }
    }

    /// Looks up `key`, splaying the matching node to the root.
    ///
    /// If there is no match, the last node visited by the search is splayed instead.
    fn find<Q>(&mut self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.raw.search(key) {
            Search::Found(node) => {
                self.splay(node);
                unsafe { pin(Some(node)) }
            }
            Search::Vacant { parent, .. } => {
                if let Some(parent) = parent {
                    self.splay(parent);
                }
                None
            }
        }
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key)?;
        unsafe { self.remove_root() }
    }

    /// Cuts out the subtree rooted at `key`, then splays the node it hung from.
    ///
    /// If there is no match, the last node visited by the search is splayed instead.
    fn prune<Q>(&mut self, key: &Q) -> Option<Subtree<T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.raw.search(key) {
            Search::Found(node) => {
                let (subtree, parent) = unsafe { self.raw.detach(node) };
                if let Some(parent) = parent {
                    self.splay(parent);
                }
                Some(subtree)
            }
            Search::Vacant { parent, .. } => {
                if let Some(parent) = parent {
                    self.splay(parent);
                }
                None
            }
        }
    }

    /// Grafts `subtree` like a plain search tree would, then splays the first node attached.
    fn graft(&mut self, subtree: Subtree<T>) -> Vec<T::Handle> {
        let (rejected, first_attached) = self.raw.graft(subtree);
        if let Some(first) = first_attached {
            self.splay(first);
        }
        rejected
    }

    fn clear(&mut self) {
        self.raw.clear();
    }

    fn assert_invariants(&self) {
        self.raw.assert_invariants();
    }
}

impl<T> Default for SplayTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SplayTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|n| n.key())).finish()
    }
}
