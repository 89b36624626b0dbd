//! Rotations on linked binary tree nodes.
//!
//! Each rotation is named after the shape it undoes, as seen from the node `n` being lifted:
//! `L`/`R` when `n` is the left/right child of its parent, and `XY` when `n`'s parent is the `X`
//! child of the grandparent and `n` is the `Y` child of its parent. Every rotation leaves all
//! touched parent pointers consistent and reattaches the lifted node under the old top's parent,
//! reported as [`Rotated::parent`]. When that is `None` the lifted node is a new root and the
//! caller must record it.
//!
//! Rotations never compare keys. [`splay`] does, to pick the rotation for each step.

use core::ptr::NonNull;

use crate::{
    node::{
        links, maybe_set_parent, replace_child, same_link, same_node, set_child, set_parent,
        which_child, Dir,
    },
    Links, Observer, TreeError, TreeNode,
};

/// The outcome of a single rotation.
#[derive(Debug)]
pub struct Rotated<T: ?Sized> {
    /// The lifted node, now the root of the rotated subtree.
    pub node: NonNull<T>,
    /// The node the rotated subtree hangs from, or `None` if `node` is now parentless.
    pub parent: Option<NonNull<T>>,
}

// Derives would demand `T: PartialEq`; only the node addresses are compared.
impl<T: ?Sized> PartialEq for Rotated<T> {
    fn eq(&self, other: &Self) -> bool {
        same_node(self.node, other.node) && same_link(self.parent, other.parent)
    }
}

impl<T: ?Sized> Eq for Rotated<T> {}

//      r              r
//      |              |
//      a              b
//    /   \          /   \
//   b     c   ->   d     a
//  / \                  / \
// d   e                e   c
/// Lifts `node`, the left child of its parent, one level.
///
/// # Safety
///
/// `node` must be a live node whose links form a consistent binary tree.
pub unsafe fn rotate_l<T, O>(obs: &mut O, node: NonNull<T>) -> Result<Rotated<T>, TreeError>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe { rotate_once(obs, node, Dir::Left, "L") }
}

//      r              r
//      |              |
//      a              c
//    /   \          /   \
//   b     c   ->   a     e
//        / \      / \
//       d   e    b   d
/// Lifts `node`, the right child of its parent, one level.
///
/// # Safety
///
/// `node` must be a live node whose links form a consistent binary tree.
pub unsafe fn rotate_r<T, O>(obs: &mut O, node: NonNull<T>) -> Result<Rotated<T>, TreeError>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe { rotate_once(obs, node, Dir::Right, "R") }
}

//         r              r
//         |              |
//         a              d
//       /   \          /   \
//      b     c   ->   f     b
//     / \                  / \
//    d   e                g   a
//   / \                      / \
//  f   g                    e   c
/// Zig-zig: lifts `node` two levels when it and its parent are both left children.
///
/// # Safety
///
/// `node` must be a live node whose links form a consistent binary tree.
pub unsafe fn rotate_ll<T, O>(obs: &mut O, node: NonNull<T>) -> Result<Rotated<T>, TreeError>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe { zig_zig(obs, node, Dir::Left, "LL") }
}

//         r                  r
//         |                  |
//         a                  e
//       /   \              /   \
//      b     c     ->     c     g
//           / \          / \
//          d   e        a   f
//             / \      / \
//            f   g    b   d
/// Zig-zig: lifts `node` two levels when it and its parent are both right children.
///
/// # Safety
///
/// `node` must be a live node whose links form a consistent binary tree.
pub unsafe fn rotate_rr<T, O>(obs: &mut O, node: NonNull<T>) -> Result<Rotated<T>, TreeError>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe { zig_zig(obs, node, Dir::Right, "RR") }
}

//         r                  r
//         |                  |
//         a                  e
//       /   \              /   \
//      b     c     ->     b     a
//     / \                / \   / \
//    d   e              d   f g   c
//       / \
//      f   g
/// Zig-zag: lifts `node`, the right child of a left child, two levels.
///
/// # Safety
///
/// `node` must be a live node whose links form a consistent binary tree.
pub unsafe fn rotate_lr<T, O>(obs: &mut O, node: NonNull<T>) -> Result<Rotated<T>, TreeError>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe { zig_zag(obs, node, Dir::Left, "LR") }
}

//         r                  r
//         |                  |
//         a                  d
//       /   \              /   \
//      b     c     ->     a     c
//           / \          / \   / \
//          d   e        b   f g   e
//         / \
//        f   g
/// Zig-zag: lifts `node`, the left child of a right child, two levels.
///
/// # Safety
///
/// `node` must be a live node whose links form a consistent binary tree.
pub unsafe fn rotate_rl<T, O>(obs: &mut O, node: NonNull<T>) -> Result<Rotated<T>, TreeError>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe { zig_zag(obs, node, Dir::Right, "RL") }
}

/// Moves `node` to the root of its tree and returns it.
///
/// Each step compares keys to decide on which side of its parent (and grandparent) the node sits.
///
/// # Safety
///
/// `node` must be a live node whose links form a consistent binary search tree.
pub unsafe fn splay<T, O>(obs: &mut O, node: NonNull<T>) -> NonNull<T>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe {
        while let Some(parent) = links(node).parent() {
            let node_is_left = parent.as_ref().key() > node.as_ref().key();

            let step = match links(parent).parent() {
                Some(grandparent) => {
                    let parent_is_left = grandparent.as_ref().key() > parent.as_ref().key();

                    match (parent_is_left, node_is_left) {
                        (true, true) => rotate_ll(obs, node),
                        (true, false) => rotate_lr(obs, node),
                        (false, true) => rotate_rl(obs, node),
                        (false, false) => rotate_rr(obs, node),
                    }
                }
                None if node_is_left => rotate_l(obs, node),
                None => rotate_r(obs, node),
            };

            step.expect("splay step lost an ancestor");
        }
    }

    node
}

/// Returns the leftmost node of the subtree rooted at `node`.
///
/// # Safety
///
/// `node` must be a live node whose links form a consistent binary tree.
#[inline]
pub unsafe fn minimum<T>(node: NonNull<T>) -> NonNull<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    let mut cur = node;
    while let Some(left) = unsafe { links(cur).left() } {
        cur = left;
    }
    cur
}

/// Returns the rightmost node of the subtree rooted at `node`.
///
/// # Safety
///
/// `node` must be a live node whose links form a consistent binary tree.
#[inline]
pub unsafe fn maximum<T>(node: NonNull<T>) -> NonNull<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    let mut cur = node;
    while let Some(right) = unsafe { links(cur).right() } {
        cur = right;
    }
    cur
}

// Lifts `up`, the `dir` child of its parent `down`, one level.
//
// `across` goes from the `!dir` child of `up` to the `dir` child of `down`.
unsafe fn rotate_once<T, O>(
    obs: &mut O,
    up: NonNull<T>,
    dir: Dir,
    name: &'static str,
) -> Result<Rotated<T>, TreeError>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe {
        let down = links(up).parent().ok_or_else(|| TreeError::no_parent(name))?;
        debug_assert_eq!(which_child(down, up), dir, "rotation {name} on the wrong side");

        let r = links(down).parent();
        let across = links(up).child(!dir);

        set_child(obs, down, dir, across);
        maybe_set_parent(obs, across, Some(down));

        set_child(obs, up, !dir, Some(down));
        set_parent(obs, down, Some(up));
        set_parent(obs, up, r);

        reattach(obs, r, down, up)
    }
}

// `x` is the `dir` child of `p`, which is the `dir` child of `g`.
unsafe fn zig_zig<T, O>(
    obs: &mut O,
    x: NonNull<T>,
    dir: Dir,
    name: &'static str,
) -> Result<Rotated<T>, TreeError>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe {
        let p = links(x).parent().ok_or_else(|| TreeError::no_parent(name))?;
        let g = links(p).parent().ok_or_else(|| TreeError::no_grandparent(name))?;
        debug_assert_eq!(which_child(g, p), dir, "rotation {name} on the wrong side");
        debug_assert_eq!(which_child(p, x), dir, "rotation {name} on the wrong side");

        let r = links(g).parent();
        let p_inner = links(p).child(!dir);
        let x_inner = links(x).child(!dir);

        set_child(obs, g, dir, p_inner);
        maybe_set_parent(obs, p_inner, Some(g));
        set_parent(obs, g, Some(p));

        set_child(obs, p, dir, x_inner);
        maybe_set_parent(obs, x_inner, Some(p));
        set_child(obs, p, !dir, Some(g));
        set_parent(obs, p, Some(x));

        set_child(obs, x, !dir, Some(p));
        set_parent(obs, x, r);

        reattach(obs, r, g, x)
    }
}

// `x` is the `!dir` child of `p`, which is the `dir` child of `g`.
unsafe fn zig_zag<T, O>(
    obs: &mut O,
    x: NonNull<T>,
    dir: Dir,
    name: &'static str,
) -> Result<Rotated<T>, TreeError>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe {
        let p = links(x).parent().ok_or_else(|| TreeError::no_parent(name))?;
        let g = links(p).parent().ok_or_else(|| TreeError::no_grandparent(name))?;
        debug_assert_eq!(which_child(g, p), dir, "rotation {name} on the wrong side");
        debug_assert_eq!(which_child(p, x), !dir, "rotation {name} on the wrong side");

        let r = links(g).parent();
        let to_p = links(x).child(dir);
        let to_g = links(x).child(!dir);

        set_child(obs, g, dir, to_g);
        maybe_set_parent(obs, to_g, Some(g));
        set_parent(obs, g, Some(x));

        set_child(obs, p, !dir, to_p);
        maybe_set_parent(obs, to_p, Some(p));
        set_parent(obs, p, Some(x));

        set_child(obs, x, dir, Some(p));
        set_child(obs, x, !dir, Some(g));
        set_parent(obs, x, r);

        reattach(obs, r, g, x)
    }
}

#[inline]
unsafe fn reattach<T, O>(
    obs: &mut O,
    r: Option<NonNull<T>>,
    old_top: NonNull<T>,
    new_top: NonNull<T>,
) -> Result<Rotated<T>, TreeError>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    if let Some(r) = r {
        unsafe { replace_child(obs, r, old_top, Some(new_top)) };
    }

    Ok(Rotated {
        node: new_top,
        parent: r,
    })
}
