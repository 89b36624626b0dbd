use core::{
    cell::UnsafeCell,
    fmt,
    marker::PhantomPinned,
    mem::{self, ManuallyDrop},
    ops::Not,
    pin::Pin,
    ptr::NonNull,
};

use cordyceps::Linked;

use crate::{iter::Iter, TreeNode};

pub(crate) type Link<T> = Option<NonNull<T>>;

/// Intrusive links embedded in every node of a binary tree.
///
/// The children are owned through the tree; the parent is a non-owning back-pointer.
pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    _unpin: PhantomPinned,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// A structural change made to a node's links.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Modification {
    /// A child slot let go of its previous child.
    Abandon,
    /// A child slot took a new child (or was emptied).
    Adopt,
    /// A node's parent pointer changed.
    Move,
}

/// Receives link modifications as they happen.
///
/// Trees use this to stamp their structure; rotations accept any observer, including a closure.
pub trait Observer {
    fn notify(&mut self, modification: Modification);
}

impl<F: FnMut(Modification)> Observer for F {
    fn notify(&mut self, modification: Modification) {
        self(modification)
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                _unpin: PhantomPinned,
            }),
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    #[inline]
    pub(crate) fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    pub(crate) fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    pub(crate) fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    pub(crate) fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .finish()
    }
}

// Observed link edits ========================================================
//
// Every assignment made by a tree goes through these, so the tree's observer sees
// `Abandon`/`Adopt` for child slots and `Move` for parent pointers.

#[inline]
pub(crate) unsafe fn links<'a, T>(node: NonNull<T>) -> &'a Links<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    unsafe { T::links(node).as_ref() }
}

#[inline]
pub(crate) unsafe fn links_mut<'a, T>(node: NonNull<T>) -> &'a mut Links<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    unsafe { T::links(node).as_mut() }
}

pub(crate) unsafe fn set_child<T, O>(
    obs: &mut O,
    parent: NonNull<T>,
    dir: Dir,
    child: Link<T>,
) -> Link<T>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe {
        let old = links_mut(parent).set_child(dir, None);
        if old.is_some() {
            obs.notify(Modification::Abandon);
        }

        links_mut(parent).set_child(dir, child);
        obs.notify(Modification::Adopt);

        old
    }
}

pub(crate) unsafe fn set_parent<T, O>(obs: &mut O, node: NonNull<T>, parent: Link<T>) -> Link<T>
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    let old = unsafe { links_mut(node).set_parent(parent) };
    obs.notify(Modification::Move);
    old
}

#[inline]
pub(crate) unsafe fn maybe_set_parent<T, O>(obs: &mut O, opt_node: Link<T>, parent: Link<T>)
where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    let Some(node) = opt_node else {
        return;
    };

    unsafe { set_parent(obs, node, parent) };
}

/// Returns `true` if `a` and `b` point at the same node, ignoring any pointer metadata.
#[inline]
pub(crate) fn same_node<T: ?Sized>(a: NonNull<T>, b: NonNull<T>) -> bool {
    a.cast::<()>() == b.cast::<()>()
}

#[inline]
pub(crate) fn same_link<T: ?Sized>(a: Link<T>, b: Link<T>) -> bool {
    a.map(NonNull::cast::<()>) == b.map(NonNull::cast::<()>)
}

/// Returns which child of `parent` the node `child` is.
///
/// `child` must be a child of `parent`.
#[inline]
pub(crate) unsafe fn which_child<T>(parent: NonNull<T>, child: NonNull<T>) -> Dir
where
    T: TreeNode<Links<T>> + ?Sized,
{
    if same_link(unsafe { links(parent).left() }, Some(child)) {
        Dir::Left
    } else {
        debug_assert_eq!(unsafe { links(parent).right() }, Some(child));
        Dir::Right
    }
}

// Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
//
// `new_child`'s parent pointer is not updated.
pub(crate) unsafe fn replace_child<T, O>(
    obs: &mut O,
    parent: NonNull<T>,
    old_child: NonNull<T>,
    new_child: Link<T>,
) where
    T: TreeNode<Links<T>> + ?Sized,
    O: Observer + ?Sized,
{
    unsafe {
        let dir = if same_link(links(parent).left(), Some(old_child)) {
            Dir::Left
        } else if same_link(links(parent).right(), Some(old_child)) {
            Dir::Right
        } else {
            unreachable!("`old_child` must be a child of `parent`");
        };

        if let Some(new_child) = new_child {
            debug_assert_ne!(
                links(parent).child(!dir),
                Some(new_child),
                "`new_child` must not be a child of `parent`"
            );
        }

        set_child(obs, parent, dir, new_child);
    }
}

/// Returns the in-order successor of `node`, climbing no higher than the topmost parentless node.
pub(crate) unsafe fn successor<T>(node: NonNull<T>) -> Link<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    unsafe {
        if let Some(right) = links(node).right() {
            return Some(crate::rotate::minimum(right));
        }

        let mut cur = node;
        while let Some(parent) = links(cur).parent() {
            if same_link(links(parent).left(), Some(cur)) {
                return Some(parent);
            }
            cur = parent;
        }

        None
    }
}

/// Counts the nodes in the subtree rooted at `root`.
pub(crate) unsafe fn subtree_len<T>(root: NonNull<T>) -> usize
where
    T: TreeNode<Links<T>> + ?Sized,
{
    let mut len = 0;
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        len += 1;
        unsafe {
            stack.extend(links(node).left());
            stack.extend(links(node).right());
        }
    }

    len
}

/// Frees every node in the parentless subtree rooted at `root`.
pub(crate) unsafe fn drop_subtree<T>(root: NonNull<T>)
where
    T: TreeNode<Links<T>> + ?Sized,
{
    let mut opt_cur = Some(root);

    // `cur` is always either `root` or a left child, so its right child can be elevated into the
    // parent's left slot.
    while let Some(cur) = opt_cur {
        unsafe {
            let cur = crate::rotate::minimum(cur);
            let parent = links(cur).parent();
            let right = links(cur).right();

            if let Some(parent) = parent {
                links_mut(parent).set_left(right);
            }
            if let Some(right) = right {
                links_mut(right).set_parent(parent);
            }

            links_mut(cur).clear();
            drop(T::from_ptr(cur));

            opt_cur = right.or(parent);
        }
    }
}

// Node accessors ==============================================================

#[inline]
pub(crate) fn parent_of<T>(node: &T) -> Option<&T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    unsafe { links(NonNull::from(node)).parent().map(|p| p.as_ref()) }
}

#[inline]
pub(crate) fn child_of<T>(node: &T, dir: Dir) -> Option<&T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    unsafe { links(NonNull::from(node)).child(dir).map(|c| c.as_ref()) }
}

/// The stock tree node: a single ordered key and its links.
#[repr(C)]
pub struct BinaryNode<K> {
    links: Links<BinaryNode<K>>,
    item: K,
}

impl<K> BinaryNode<K> {
    /// Returns a new, unlinked node holding `item`.
    pub fn new(item: K) -> Box<BinaryNode<K>> {
        Box::new(BinaryNode {
            links: Links::new(),
            item,
        })
    }

    /// Returns the key stored in the node.
    #[inline]
    pub fn item(&self) -> &K {
        &self.item
    }

    /// Consumes an unlinked node, returning its key.
    pub fn into_item(self: Box<Self>) -> K {
        debug_assert!(self.links.is_leaf() && self.links.parent().is_none());
        self.item
    }
}

impl<K: Ord + fmt::Debug> BinaryNode<K> {
    /// Returns the node's left child.
    pub fn left(&self) -> Option<&Self> {
        child_of(self, Dir::Left)
    }

    /// Returns the node's right child.
    pub fn right(&self) -> Option<&Self> {
        child_of(self, Dir::Right)
    }

    /// Returns the node's parent, or `None` at the root of a tree or subtree.
    pub fn parent(&self) -> Option<&Self> {
        parent_of(self)
    }

    /// Returns the number of children (0, 1 or 2).
    pub fn degree(&self) -> usize {
        self.left().is_some() as usize + self.right().is_some() as usize
    }

    pub fn is_leaf(&self) -> bool {
        self.links.is_leaf()
    }

    pub fn is_root(&self) -> bool {
        self.links.parent().is_none()
    }
}

impl<K: fmt::Debug> fmt::Debug for BinaryNode<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryNode")
            .field("item", &self.item)
            .finish_non_exhaustive()
    }
}

unsafe impl<K> Linked<Links<BinaryNode<K>>> for BinaryNode<K> {
    type Handle = Box<BinaryNode<K>>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<BinaryNode<K>>> {
        // SAFETY: Self is #[repr(C)] and `links` is first field
        ptr.cast()
    }
}

impl<K: Ord + fmt::Debug> TreeNode<Links<BinaryNode<K>>> for BinaryNode<K> {
    type Key = K;

    fn key(&self) -> &Self::Key {
        &self.item
    }
}

/// An owned, detached subtree.
///
/// Built by hand with [`Subtree::new`], [`with_left`](Subtree::with_left) and
/// [`with_right`](Subtree::with_right) for grafting, or returned by `prune`. The shape is not
/// checked for search-tree order; trees check it when the subtree is grafted. Dropping a
/// `Subtree` frees all of its nodes.
pub struct Subtree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: NonNull<T>,
    len: usize,
}

impl<T> Subtree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a single-node subtree.
    pub fn new(item: T::Handle) -> Self {
        let root = T::into_ptr(item);
        unsafe { links_mut(root).clear() };

        Subtree { root, len: 1 }
    }

    // `root` must be parentless and own the `len` nodes below it.
    pub(crate) unsafe fn from_raw(root: NonNull<T>, len: usize) -> Self {
        debug_assert!(unsafe { links(root).parent() }.is_none());
        Subtree { root, len }
    }

    pub(crate) fn into_raw(self) -> (NonNull<T>, usize) {
        let this = ManuallyDrop::new(self);
        (this.root, this.len)
    }

    /// Sets `left` as the left child of the root, dropping any previous left subtree.
    #[must_use]
    pub fn with_left(self, left: Subtree<T>) -> Self {
        self.attach(Dir::Left, left)
    }

    /// Sets `right` as the right child of the root, dropping any previous right subtree.
    #[must_use]
    pub fn with_right(self, right: Subtree<T>) -> Self {
        self.attach(Dir::Right, right)
    }

    fn attach(mut self, dir: Dir, child: Subtree<T>) -> Self {
        let (child, child_len) = child.into_raw();

        unsafe {
            if let Some(old) = links_mut(self.root).set_child(dir, Some(child)) {
                links_mut(old).set_parent(None);
                self.len -= subtree_len(old);
                drop_subtree(old);
            }
            links_mut(child).set_parent(Some(self.root));
        }

        self.len += child_len;
        self
    }

    /// Returns the root node.
    pub fn root(&self) -> Pin<&T> {
        unsafe { Pin::new_unchecked(self.root.as_ref()) }
    }

    /// Returns the number of nodes in the subtree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: a subtree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an in-order iterator over the subtree.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(Some(self.root), self.len)
    }

    /// Unlinks every node, returning them in key order.
    pub fn into_handles(self) -> Vec<T::Handle> {
        let nodes: Vec<NonNull<T>> = self.iter().map(NonNull::from).collect();
        let _ = self.into_raw();

        nodes
            .into_iter()
            .map(|node| unsafe {
                links_mut(node).clear();
                T::from_ptr(node)
            })
            .collect()
    }
}

impl<T> Drop for Subtree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        unsafe { drop_subtree(self.root) };
    }
}

impl<T> fmt::Debug for Subtree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|n| n.key())).finish()
    }
}
