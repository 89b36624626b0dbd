use std::{collections::VecDeque, fmt};

use crate::{
    node::links, raw::RawTree, BinarySearchTree, Links, SplayTree, TreeNode,
};

impl<T> RawTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
    T::Key: fmt::Display,
{
    fn dotgraph<W: fmt::Write>(&self, name: &str, mut w: W) -> fmt::Result {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T: ?Sized> {
            Node(core::ptr::NonNull<T>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut edges = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let node = match queue.pop_front() {
                    Some(Item::Node(node)) => node,
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                let key = unsafe { node.as_ref().key() };
                write!(w, "\"graph{name}-{key}\" [label=\"{key}\"]; ")?;

                for child in unsafe { [links(node).left(), links(node).right()] } {
                    match child {
                        Some(child) => {
                            let child_key = unsafe { child.as_ref().key() };
                            queue.push_back(Item::Node(child));
                            writeln!(edges, "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";")?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(edges, "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";")?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&edges)?;

        w.write_str(" }\n}")
    }
}

impl<T> BinarySearchTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
    T::Key: fmt::Display,
{
    /// Writes the tree's shape as a Graphviz digraph named `name`.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, w: W) -> fmt::Result {
        self.raw.dotgraph(name, w)
    }
}

impl<T> SplayTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
    T::Key: fmt::Display,
{
    /// Writes the tree's shape as a Graphviz digraph named `name`.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, w: W) -> fmt::Result {
        self.raw.dotgraph(name, w)
    }
}

#[cfg(test)]
mod tests {
    use crate::{BinaryNode, OrderedTree, SplayTree};

    #[test]
    fn dotgraph_lists_nodes_and_edges() {
        let mut tree: SplayTree<BinaryNode<u32>> = SplayTree::new();
        let mut out = String::new();

        tree.dotgraph("empty", &mut out).unwrap();
        assert_eq!(out, "digraph \"graph-empty\" {}");

        for key in [2u32, 1] {
            tree.insert(BinaryNode::new(key));
        }

        out.clear();
        tree.dotgraph("t", &mut out).unwrap();
        assert!(out.contains("\"grapht-1\" [label=\"1\"]"));
        assert!(out.contains("\"grapht-1\" -> \"grapht-2\";"));
        assert!(out.contains("\"grapht-2\" -> \"grapht-missing"));
    }
}
