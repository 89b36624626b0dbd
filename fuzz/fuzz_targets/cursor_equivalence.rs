#![no_main]

use cordyceps_splay::{
    model::{run_cursor_equivalence, CursorEquivalenceInput, TestNode},
    BinarySearchTree, SplayTree,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: CursorEquivalenceInput| {
    run_cursor_equivalence::<BinarySearchTree<TestNode>>(input.values.clone(), input.ops.clone());
    run_cursor_equivalence::<SplayTree<TestNode>>(input.values, input.ops);
});
