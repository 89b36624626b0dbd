use cordyceps_splay::{BinaryNode, OrderedTree, SplayTree, Subtree};

type Tree = SplayTree<BinaryNode<u32>>;

fn show(tree: &Tree, what: &str) {
    tree.assert_invariants();

    let keys = tree.iter().map(|node| *node.item()).collect::<Vec<_>>();
    let root = tree.root().map(|node| *node.item());
    println!("{what:<16} root={root:?} keys={keys:?}");
}

fn main() {
    let mut tree: Tree = SplayTree::new();

    for key in [2, 0, 3, 4, 5, 1, 6] {
        tree.insert(BinaryNode::new(key));
        show(&tree, &format!("insert {key}"));
    }

    tree.find(&3);
    show(&tree, "find 3");

    let pruned = tree.prune(&1).expect("1 was inserted");
    println!(
        "pruned {:?}",
        pruned.iter().map(|node| *node.item()).collect::<Vec<_>>()
    );
    show(&tree, "prune 1");

    let rejected = tree.graft(pruned);
    assert!(rejected.is_empty());
    show(&tree, "graft back");

    // 3 is already present, 9 is not.
    let sub = Subtree::new(BinaryNode::new(3)).with_right(Subtree::new(BinaryNode::new(9)));
    let rejected = tree.graft(sub);
    println!("rejected {rejected:?}");
    show(&tree, "graft 3, 9");

    let zero = tree.remove(&0).map(BinaryNode::into_item);
    assert_eq!(zero, Some(0));
    show(&tree, "remove 0");

    let mut dot = String::new();
    tree.dotgraph("demo", &mut dot).expect("writing to a String cannot fail");
    println!("{dot}");
}
