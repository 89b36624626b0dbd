use core::{pin::Pin, ptr::NonNull};

use crate::{
    node::{successor, Link},
    raw::pin,
    Links, OrderedTree, Stamp, TreeError, TreeNode,
};

/// A cursor over an [`OrderedTree`] that detects structural modification.
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that precedes the
/// first element and follows the last. It starts at the ghost.
///
/// The cursor does not borrow the tree between steps. Instead, every step takes the tree and
/// compares its [`Stamp`] against the one recorded when the cursor was created; after any
/// structural modification (an insert, a removal, or a restructuring lookup on a splay tree),
/// every step fails with [`TreeError::ConcurrentModification`].
///
/// # Panics
///
/// Steps panic if handed a tree other than the one the cursor was created from.
pub struct Cursor<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    stamp: Stamp,
    ptr: Link<T>,
}

impl<T> Cursor<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new(stamp: Stamp) -> Cursor<T> {
        Cursor { stamp, ptr: None }
    }

    fn check<Tr>(&self, tree: &Tr) -> Result<(), TreeError>
    where
        Tr: OrderedTree<T> + ?Sized,
    {
        let found = tree.stamp();
        assert!(
            self.stamp.same_tree(&found),
            "cursor used with a tree it was not created from"
        );

        if found == self.stamp {
            Ok(())
        } else {
            Err(TreeError::ConcurrentModification {
                expected: self.stamp.generation(),
                found: found.generation(),
            })
        }
    }

    /// Moves the cursor to the next element of the tree.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the first
    /// element. If it is pointing to the last element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_next<Tr>(&mut self, tree: &Tr) -> Result<(), TreeError>
    where
        Tr: OrderedTree<T> + ?Sized,
    {
        self.check(tree)?;

        self.ptr = match self.ptr {
            None => tree.first().map(|first| NonNull::from(first.get_ref())),
            // SAFETY: the stamp is unchanged, so `ptr` is still linked into `tree`.
            Some(ptr) => unsafe { successor(ptr) },
        };

        Ok(())
    }

    /// Returns the element the cursor points to.
    ///
    /// This returns `Ok(None)` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get<'tree, Tr>(&self, tree: &'tree Tr) -> Result<Option<Pin<&'tree T>>, TreeError>
    where
        Tr: OrderedTree<T> + ?Sized,
    {
        self.check(tree)?;
        Ok(unsafe { pin(self.ptr) })
    }

    /// Advances the cursor and returns the element it lands on.
    ///
    /// Stepping past the last element yields `Ok(None)`; stepping again starts over at the first.
    pub fn next<'tree, Tr>(&mut self, tree: &'tree Tr) -> Result<Option<Pin<&'tree T>>, TreeError>
    where
        Tr: OrderedTree<T> + ?Sized,
    {
        self.move_next(tree)?;
        self.get(tree)
    }

    /// Returns the generation of the tree this cursor was created at.
    pub fn generation(&self) -> u64 {
        self.stamp.generation()
    }
}

impl<T> core::fmt::Debug for Cursor<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("stamp", &self.stamp)
            .field("at_ghost", &self.ptr.is_none())
            .finish()
    }
}
