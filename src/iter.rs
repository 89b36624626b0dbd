use core::{iter::FusedIterator, marker::PhantomData};

use crate::{
    node::{links, which_child, Dir, Link},
    Links, TreeNode,
};

enum CameFrom {
    Parent,
    LeftChild,
    Here,
    RightChild,
}

/// An in-order iterator over the nodes of a tree or subtree.
pub struct Iter<'tree, T: TreeNode<Links<T>> + ?Sized> {
    front_cur: Link<T>,
    front_from: CameFrom,

    len: usize,
    _tree: PhantomData<&'tree T>,
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> Iter<'tree, T> {
    // `root` must be parentless and have exactly `len` nodes below it, all outliving `'tree`.
    pub(crate) fn new(root: Link<T>, len: usize) -> Self {
        Iter {
            front_cur: root,
            front_from: CameFrom::Parent,
            len,
            _tree: PhantomData,
        }
    }
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let mut cur = self.front_cur?;

        loop {
            match self.front_from {
                CameFrom::Parent => {
                    // Upon entering a new subtree, find the minimum element.
                    while let Some(left) = unsafe { links(cur).left() } {
                        cur = left;
                    }

                    // Once the minimum is found, its (empty) left subtree has been exhausted.
                    self.front_from = CameFrom::LeftChild;
                }

                CameFrom::LeftChild => {
                    // The left subtree has been exhausted, so this node is up next. Save off the
                    // iterator state and return it.
                    self.front_cur = Some(cur);
                    self.front_from = CameFrom::Here;
                    self.len -= 1;

                    return Some(unsafe { cur.as_ref() });
                }

                CameFrom::Here | CameFrom::RightChild => {
                    if matches!(self.front_from, CameFrom::Here) {
                        // The current node was just yielded; visit its right subtree, if any.
                        if let Some(right) = unsafe { links(cur).right() } {
                            self.front_from = CameFrom::Parent;
                            cur = right;
                            continue;
                        }
                    }

                    // This subtree is exhausted; ascend one level.
                    let Some(parent) = (unsafe { links(cur).parent() }) else {
                        self.front_cur = None;
                        return None;
                    };

                    self.front_from = match unsafe { which_child(parent, cur) } {
                        Dir::Left => CameFrom::LeftChild,
                        Dir::Right => CameFrom::RightChild,
                    };
                    cur = parent;
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> ExactSizeIterator for Iter<'tree, T> {}

impl<'tree, T: TreeNode<Links<T>> + ?Sized> FusedIterator for Iter<'tree, T> {}
