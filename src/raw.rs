use core::{
    borrow::Borrow,
    cmp::Ordering,
    pin::Pin,
    ptr::NonNull,
    sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
};

use crate::{
    iter::Iter,
    node::{
        drop_subtree, links, links_mut, maybe_set_parent, replace_child, same_node, set_child,
        set_parent, subtree_len, Dir, Link,
    },
    rotate::{maximum, minimum},
    Links, Modification, Observer, Subtree, TreeError, TreeNode,
};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(0);

/// Identifies a tree and how many structural modifications it has seen.
///
/// Every link assignment made by a tree advances its generation. Cursors remember the stamp
/// they were created with and refuse to continue once it has moved on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Stamp {
    tree: u64,
    generation: u64,
}

impl Stamp {
    pub(crate) fn new() -> Stamp {
        Stamp {
            tree: NEXT_TREE_ID.fetch_add(1, AtomicOrdering::Relaxed),
            generation: 0,
        }
    }

    /// Returns the number of structural modifications made so far.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub(crate) fn same_tree(&self, other: &Stamp) -> bool {
        self.tree == other.tree
    }
}

impl Observer for Stamp {
    fn notify(&mut self, modification: Modification) {
        self.generation = self.generation.wrapping_add(1);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            tree = self.tree,
            generation = self.generation,
            ?modification,
            "link modified"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = modification;
    }
}

// Where a key lives, or would live, in a tree.
pub(crate) enum Search<T: ?Sized> {
    Found(NonNull<T>),
    Vacant {
        // The last node visited, `None` only for an empty tree.
        parent: Link<T>,
        dir: Dir,
        // The nearest keys on either side of the vacant slot.
        lower: Link<T>,
        upper: Link<T>,
    },
}

/// The state shared by both tree flavors: the root, the node count and the stamp.
///
/// All structural edits go through the observed link functions with `stamp` as the observer.
pub(crate) struct RawTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) root: Link<T>,
    pub(crate) len: usize,
    pub(crate) stamp: Stamp,
}

impl<T> RawTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    pub(crate) fn new() -> RawTree<T> {
        RawTree {
            root: None,
            len: 0,
            stamp: Stamp::new(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        debug_assert_eq!(self.len == 0, self.root.is_none());
        self.len
    }

    pub(crate) fn search<Q>(&self, key: &Q) -> Search<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut parent = None;
        let mut dir = Dir::Left;
        let mut lower = None;
        let mut upper = None;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Less => {
                        upper = Some(cur);
                        dir = Dir::Left;
                    }
                    Ordering::Equal => return Search::Found(cur),
                    Ordering::Greater => {
                        lower = Some(cur);
                        dir = Dir::Right;
                    }
                }

                parent = Some(cur);
                opt_cur = links(cur).child(dir);
            }
        }

        Search::Vacant {
            parent,
            dir,
            lower,
            upper,
        }
    }

    pub(crate) fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(node) => Some(node),
            Search::Vacant { .. } => None,
        }
    }

    #[inline]
    pub(crate) fn first(&self) -> Link<T> {
        self.root.map(|root| unsafe { minimum(root) })
    }

    #[inline]
    pub(crate) fn last(&self) -> Link<T> {
        self.root.map(|root| unsafe { maximum(root) })
    }

    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.root, self.len)
    }

    // Replaces the root pointer, notifying the stamp like a child slot would.
    #[inline]
    pub(crate) fn set_root(&mut self, root: Link<T>) {
        if self.root.is_some() {
            self.stamp.notify(Modification::Abandon);
        }
        self.root = root;
        self.stamp.notify(Modification::Adopt);
    }

    #[inline]
    pub(crate) unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { replace_child(&mut self.stamp, parent, old_child, new_child) },
            None => self.set_root(new_child),
        }
    }

    // Hangs `node` (and whatever is below it) in the vacant slot `dir` of `parent`, or at the root
    // when `parent` is `None`. The node count is not updated.
    pub(crate) unsafe fn attach(&mut self, node: NonNull<T>, parent: Link<T>, dir: Dir) {
        unsafe {
            match parent {
                Some(parent) => {
                    debug_assert!(links(parent).child(dir).is_none());
                    set_child(&mut self.stamp, parent, dir, Some(node));
                }
                None => {
                    debug_assert!(self.root.is_none());
                    self.set_root(Some(node));
                }
            }

            set_parent(&mut self.stamp, node, parent);
        }
    }

    /// Links `item` as a new leaf.
    ///
    /// If an equal key is already present, `item` is handed back along with the resident node.
    pub(crate) fn insert(
        &mut self,
        item: T::Handle,
    ) -> Result<NonNull<T>, (T::Handle, NonNull<T>)> {
        let ptr = T::into_ptr(item);

        unsafe {
            match self.search(ptr.as_ref().key()) {
                Search::Found(existing) => Err((T::from_ptr(ptr), existing)),
                Search::Vacant { parent, dir, .. } => {
                    links_mut(ptr).clear();
                    self.attach(ptr, parent, dir);
                    self.len += 1;
                    Ok(ptr)
                }
            }
        }
    }

    // Unlinks `node`, putting its in-order successor node in its place if it has two children.
    //
    // Returns the node that now occupies the removed node's position (or its parent, if it was
    // replaced by nothing); this is where a self-adjusting tree resumes.
    pub(crate) unsafe fn unlink(&mut self, node: NonNull<T>) -> (T::Handle, Link<T>) {
        unsafe {
            let parent = links(node).parent();
            let left = links(node).left();
            let right = links(node).right();

            let resume = match (left, right) {
                (Some(left), Some(right)) => {
                    let successor = minimum(right);

                    if !same_node(successor, right) {
                        // Elevate the successor's right child into its old slot.
                        let successor_parent = links(successor)
                            .parent()
                            .expect("successor below `right` must have a parent");
                        let successor_right = links(successor).right();

                        replace_child(&mut self.stamp, successor_parent, successor, successor_right);
                        maybe_set_parent(&mut self.stamp, successor_right, Some(successor_parent));

                        set_child(&mut self.stamp, successor, Dir::Right, Some(right));
                        set_parent(&mut self.stamp, right, Some(successor));
                    }

                    self.replace_child_or_set_root(parent, node, Some(successor));
                    set_parent(&mut self.stamp, successor, parent);
                    set_child(&mut self.stamp, successor, Dir::Left, Some(left));
                    set_parent(&mut self.stamp, left, Some(successor));

                    Some(successor)
                }

                (Some(child), None) | (None, Some(child)) => {
                    self.replace_child_or_set_root(parent, node, Some(child));
                    set_parent(&mut self.stamp, child, parent);

                    Some(child)
                }

                (None, None) => {
                    self.replace_child_or_set_root(parent, node, None);

                    parent
                }
            };

            links_mut(node).clear();
            self.len -= 1;

            (T::from_ptr(node), resume)
        }
    }

    // Cuts the subtree rooted at `node` out of the tree, returning it and `node`'s former parent.
    pub(crate) unsafe fn detach(&mut self, node: NonNull<T>) -> (Subtree<T>, Link<T>) {
        unsafe {
            let parent = links(node).parent();
            self.replace_child_or_set_root(parent, node, None);
            set_parent(&mut self.stamp, node, None);

            let len = subtree_len(node);
            self.len -= len;

            #[cfg(feature = "tracing")]
            tracing::debug!(key = ?node.as_ref().key(), len, "pruned subtree");

            (Subtree::from_raw(node, len), parent)
        }
    }

    /// Grafts every node of `subtree` into the tree.
    ///
    /// Each pending root is placed in the slot its key searches to. A root whose key is already
    /// present is rejected and its children become pending roots. A root whose subtree does not
    /// fit its slot is attached as a leaf and its children become pending roots.
    ///
    /// Returns the rejected nodes and the first node attached.
    pub(crate) fn graft(&mut self, subtree: Subtree<T>) -> (Vec<T::Handle>, Link<T>) {
        let (root, _) = subtree.into_raw();
        let mut rejected = Vec::new();
        let mut first_attached = None;
        let mut pending = vec![root];

        while let Some(top) = pending.pop() {
            unsafe {
                match self.search(top.as_ref().key()) {
                    Search::Found(_) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(key = ?top.as_ref().key(), "graft collision, regrafting children");

                        pending.extend(split_children(top).into_iter().flatten());
                        rejected.push(T::from_ptr(top));
                    }

                    Search::Vacant {
                        parent,
                        dir,
                        lower,
                        upper,
                    } => {
                        match check_subtree(top, lower, upper) {
                            Ok(len) => {
                                self.attach(top, parent, dir);
                                self.len += len;
                            }
                            Err(_err) => {
                                #[cfg(feature = "tracing")]
                                tracing::debug!(
                                    key = ?top.as_ref().key(),
                                    err = %_err,
                                    "grafted subtree does not fit, attaching its root alone"
                                );

                                pending.extend(split_children(top).into_iter().flatten());
                                self.attach(top, parent, dir);
                                self.len += 1;
                            }
                        }

                        first_attached.get_or_insert(top);
                    }
                }
            }
        }

        (rejected, first_attached)
    }

    pub(crate) fn clear(&mut self) {
        if let Some(root) = self.root {
            self.set_root(None);
            unsafe { drop_subtree(root) };
        }

        self.len = 0;
    }

    pub(crate) fn assert_invariants(&self) {
        let Some(root) = self.root else {
            assert_eq!(self.len, 0);
            return;
        };

        unsafe {
            assert_eq!(links(root).parent(), None, "root has a parent");

            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                for child in [links(node).left(), links(node).right()].into_iter().flatten() {
                    assert_eq!(
                        links(child).parent(),
                        Some(node),
                        "child of {:?} has a stale parent pointer",
                        node.as_ref().key()
                    );
                    stack.push(child);
                }
            }

            if let Err(err) = check_subtree(root, None, None) {
                panic!("{err}");
            }
            assert_eq!(subtree_len(root), self.len, "node count out of sync");
        }
    }
}

impl<T> Drop for RawTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

/// Pins a node of a tree for as long as the caller's borrow of that tree.
///
/// # Safety
///
/// `ptr` must be a node owned by a tree that outlives `'a` and is not mutated during `'a`.
#[inline]
pub(crate) unsafe fn pin<'a, T: ?Sized>(ptr: Link<T>) -> Option<Pin<&'a T>> {
    ptr.map(|p| unsafe { Pin::new_unchecked(p.as_ref()) })
}

// Detaches both children of a node outside any tree, returning them as parentless roots.
unsafe fn split_children<T>(node: NonNull<T>) -> [Link<T>; 2]
where
    T: TreeNode<Links<T>> + ?Sized,
{
    unsafe {
        let children = [
            links_mut(node).set_child(Dir::Left, None),
            links_mut(node).set_child(Dir::Right, None),
        ];

        for child in children.into_iter().flatten() {
            links_mut(child).set_parent(None);
        }

        children
    }
}

// Checks that the in-order keys of the subtree at `root` strictly increase and lie strictly
// between `lower` and `upper`, returning the subtree's size.
pub(crate) unsafe fn check_subtree<T>(
    root: NonNull<T>,
    lower: Link<T>,
    upper: Link<T>,
) -> Result<usize, TreeError>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    let mut prev: Option<&T::Key> = lower.map(|n| unsafe { n.as_ref() }.key());
    let mut stack = Vec::new();
    let mut opt_cur = Some(root);
    let mut len = 0;

    unsafe {
        loop {
            while let Some(cur) = opt_cur {
                stack.push(cur);
                opt_cur = links(cur).left();
            }

            let Some(node) = stack.pop() else {
                break;
            };

            let key = node.as_ref().key();
            if let Some(prev) = prev {
                if prev >= key {
                    return Err(TreeError::misordered(prev, key));
                }
            }

            prev = Some(key);
            len += 1;
            opt_cur = links(node).right();
        }

        if let (Some(prev), Some(upper)) = (prev, upper) {
            let upper = upper.as_ref().key();
            if prev >= upper {
                return Err(TreeError::misordered(prev, upper));
            }
        }
    }

    Ok(len)
}
