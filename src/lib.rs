//! Intrusive binary search trees: a plain unbalanced [`BinarySearchTree`] and a self-adjusting
//! [`SplayTree`].
//!
//! Both trees store caller-allocated nodes that embed [`Links`] and hand them back when they are
//! removed. Besides the usual insert, find and remove, whole subtrees can be cut out with `prune`
//! and put back (or moved between trees) with `graft`.
//!
//! Every structural change made by a tree advances its [`Stamp`]. A [`Cursor`] created from a tree
//! fails with [`TreeError::ConcurrentModification`] once the tree has been modified behind it.
//!
//! The [`rotate`] module exposes the rotations both trees are built from, for use on any linked
//! nodes.
//#![no_std]

use core::{borrow::Borrow, fmt, pin::Pin};

use cordyceps::Linked;

mod bst;
mod cursor;
mod debug;
mod error;
mod iter;
mod node;
mod raw;
pub mod rotate;
mod set;
mod splay;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use crate::{
    bst::BinarySearchTree,
    cursor::Cursor,
    error::TreeError,
    iter::Iter,
    node::{BinaryNode, Links, Modification, Observer, Subtree},
    raw::Stamp,
    set::{BstSet, SplaySet, TreeSet},
    splay::SplayTree,
};

/// A node that can be linked into a tree.
pub trait TreeNode<L>: Linked<L> {
    type Key: Ord + fmt::Debug;

    fn key(&self) -> &Self::Key;
}

/// The operations shared by [`BinarySearchTree`] and [`SplayTree`].
///
/// A duplicate insert, a missing key and a rejected graft node are ordinary results, never errors.
/// Lookups take `&mut self` because a self-adjusting tree restructures itself on every access.
pub trait OrderedTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns the number of nodes in the tree.
    fn len(&self) -> usize;

    /// Returns `true` if the tree contains no nodes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the tree's current modification stamp.
    fn stamp(&self) -> Stamp;

    /// Returns the root node.
    fn root(&self) -> Option<Pin<&T>>;

    /// Returns the node with the least key, without restructuring the tree.
    fn first(&self) -> Option<Pin<&T>>;

    /// Returns the node with the greatest key, without restructuring the tree.
    fn last(&self) -> Option<Pin<&T>>;

    /// Returns an in-order iterator over the nodes.
    fn iter(&self) -> Iter<'_, T>;

    /// Returns a cursor positioned before the first node.
    ///
    /// The cursor does not borrow the tree; it is handed the tree on every step and fails once the
    /// tree has changed since the cursor was created.
    fn cursor(&self) -> Cursor<T> {
        Cursor::new(self.stamp())
    }

    /// Inserts `item`.
    ///
    /// Returns `None` if the item was linked, or gives `item` back if its key is already present.
    fn insert(&mut self, item: T::Handle) -> Option<T::Handle>;

    /// Looks up the node with key `key`.
    fn find<Q>(&mut self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized;

    /// Unlinks the node with key `key` and returns it.
    fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized;

    /// Cuts out the node with key `key` together with all of its descendants.
    ///
    /// Detaching the subtree rewrites only the links between the node and its parent. The
    /// descendants are then walked once to count them, so the tree's `len` and the returned
    /// [`Subtree::len`] stay exact; this makes the whole call _O(k)_ for a subtree of _k_ nodes.
    fn prune<Q>(&mut self, key: &Q) -> Option<Subtree<T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized;

    /// Links every node of `subtree` into the tree.
    ///
    /// Nodes whose keys are already present are returned. Every other node of `subtree` ends up
    /// in the tree and can be found by its key.
    fn graft(&mut self, subtree: Subtree<T>) -> Vec<T::Handle>;

    /// Unlinks and drops every node.
    fn clear(&mut self);

    /// Panics unless keys are in strict order, every parent pointer matches and `len` is exact.
    #[doc(hidden)]
    fn assert_invariants(&self);
}
