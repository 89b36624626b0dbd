#![no_main]
use libfuzzer_sys::fuzz_target;

use cordyceps_splay::{
    model::{run_btree_equivalence, Op, TestNode},
    BinarySearchTree, SplayTree,
};

fuzz_target!(|ops: Vec<Op>| {
    run_btree_equivalence::<BinarySearchTree<TestNode>>(ops.clone());
    run_btree_equivalence::<SplayTree<TestNode>>(ops);
});
