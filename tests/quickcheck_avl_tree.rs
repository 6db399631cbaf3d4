use quickcheck::{Arbitrary, Gen, TestResult};
use quickcheck_macros::*;
use std::collections::BTreeSet;

use avl_menu::avl_tree::*;

const KEY_SPACE: i32 = 64;

#[derive(Clone, Debug)]
enum TreeOp {
    Insert(Key),
    Remove(Key),
    Contains(Key),
}

#[derive(Clone, Debug)]
struct Ops {
    ops: Vec<TreeOp>,
}

impl Arbitrary for TreeOp {
    fn arbitrary(g: &mut Gen) -> Self {
        let op = usize::arbitrary(g) % 100;
        let key = i32::arbitrary(g) % KEY_SPACE;
        match op {
            0..55 => TreeOp::Insert(key),
            55..85 => TreeOp::Remove(key),
            85..100 => TreeOp::Contains(key),
            _ => unreachable!(),
        }
    }
}

impl Arbitrary for Ops {
    fn arbitrary(g: &mut Gen) -> Self {
        let ops = Vec::<TreeOp>::arbitrary(g);
        Ops { ops }
    }
}

fn apply(tree: &mut AvlTree, op: &TreeOp) -> bool {
    match op {
        TreeOp::Insert(k) => tree.insert(*k),
        TreeOp::Remove(k) => tree.remove(*k),
        TreeOp::Contains(k) => tree.contains(*k),
    }
}

fn apply_naive(naive: &mut BTreeSet<Key>, op: &TreeOp) -> bool {
    match op {
        TreeOp::Insert(k) => naive.insert(*k),
        TreeOp::Remove(k) => naive.remove(k),
        TreeOp::Contains(k) => naive.contains(k),
    }
}

// Worst-case AVL height for n nodes.
fn height_bound(n: usize) -> f64 {
    1.4405 * ((n + 2) as f64).log2()
}

#[quickcheck]
fn qc_prop_tree_matches_naive(ops: Ops) -> TestResult {
    let mut tree = AvlTree::new();
    let mut naive = BTreeSet::new();

    for op in &ops.ops {
        let res = apply(&mut tree, op);
        let res_naive = apply_naive(&mut naive, op);
        if res != res_naive {
            println!(
                "Failed on op: {:?}\ngood: {:?}\nnaive: {:?} ({:?})",
                op, res, res_naive, naive
            );
            return TestResult::failed();
        }
        if let Err(violation) = tree.check_invariants() {
            println!("Failed on op: {:?}: {}\n{}", op, violation, tree.render_shape());
            return TestResult::failed();
        }
        let keys = tree.iter().collect::<Vec<Key>>();
        let keys_naive = naive.iter().copied().collect::<Vec<Key>>();
        if keys != keys_naive || tree.len() != naive.len() {
            println!(
                "Failed on op: {:?}\ngood: {:?}\nnaive: {:?}",
                op, keys, keys_naive
            );
            return TestResult::failed();
        }
        if tree.height() as f64 > height_bound(tree.len()) {
            println!("Failed on op: {:?}: height {}", op, tree.height());
            return TestResult::failed();
        }
    }

    TestResult::passed()
}

#[quickcheck]
fn qc_inorder_is_sorted_key_set(keys: Vec<Key>) -> bool {
    let mut tree = AvlTree::new();
    keys.iter().for_each(|&k| {
        tree.insert(k);
    });
    let expected = keys.iter().copied().collect::<BTreeSet<Key>>();
    tree.iter().eq(expected.into_iter()) && tree.check_invariants().is_ok()
}

#[quickcheck]
fn qc_reinsert_is_noop(keys: Vec<Key>, pick: usize) -> TestResult {
    if keys.is_empty() {
        return TestResult::discard();
    }
    let mut tree = AvlTree::new();
    keys.iter().for_each(|&k| {
        tree.insert(k);
    });
    let before = tree.render_shape();
    let key = keys[pick % keys.len()];
    TestResult::from_bool(!tree.insert(key) && tree.render_shape() == before)
}

#[quickcheck]
fn qc_remove_missing_is_noop(keys: Vec<Key>, missing: Key) -> TestResult {
    if keys.contains(&missing) {
        return TestResult::discard();
    }
    let mut tree = AvlTree::new();
    keys.iter().for_each(|&k| {
        tree.insert(k);
    });
    let before = tree.render_shape();
    TestResult::from_bool(!tree.remove(missing) && tree.render_shape() == before)
}

#[quickcheck]
fn qc_remove_all_empties_tree(keys: Vec<Key>) -> bool {
    let mut tree = AvlTreeDebug::new_with_debug_writer(Some(String::new()));
    keys.iter().for_each(|&k| {
        tree.insert(k);
    });
    keys.iter().for_each(|&k| {
        tree.remove(k);
    });
    tree.is_empty() && tree.height() == 0 && tree.len() == 0
}
