use std::cell::RefCell;
use std::cmp::{max, Ordering};
use std::fmt::Write;
use std::iter;
use std::marker::PhantomData;
use std::ops::RangeInclusive;

use rand::Rng;

use crate::error::InvariantViolation;

pub type Key = i32;

/// Keys drawn by `Tree::insert_random`.
pub const RANDOM_KEYS: RangeInclusive<Key> = -1000..=1000;

pub trait ConfigT {
    const DEBUG: bool;
    const CHECK_INVARIANTS: bool; // panic on the first broken invariant after a mutation
}

#[macro_export]
macro_rules! debug {
    ($writer:expr, $($arg:tt)+) => {
        if Config::DEBUG {
            match $writer {
                Some(ref w) => {
                    use std::fmt::Write as _;
                    let _ = writeln!(w.borrow_mut(), $($arg)+);
                }
                None => {
                    eprintln!($($arg)+);
                }
            }
        }
    };
}

struct Node {
    key: Key,
    height: usize,
    left: Option<usize>,
    right: Option<usize>,
}

struct NodePool {
    nodes: Vec<Node>,
    free_list: Vec<usize>,
}

impl NodePool {
    fn new() -> Self {
        NodePool {
            nodes: Vec::new(),
            free_list: Vec::new(),
        }
    }

    fn alloc(&mut self, key: Key) -> usize {
        let node = Node {
            key,
            height: 1,
            left: None,
            right: None,
        };
        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx] = node;
            idx
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn free(&mut self, idx: usize) {
        self.free_list.push(idx);
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free_list.clear();
    }

    fn live(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }
}

pub struct Tree<Config: ConfigT> {
    pool: NodePool,
    root: Option<usize>,
    len: usize,
    debug_writer: Option<RefCell<Box<dyn std::fmt::Write>>>,
    _config: PhantomData<Config>,
}

impl<Config: ConfigT> Tree<Config> {
    pub fn new() -> Self {
        Self::new_with_debug_writer::<String>(None)
    }

    pub fn new_with_debug_writer<Writer: std::fmt::Write + 'static>(
        debug_writer: Option<Writer>,
    ) -> Self {
        Tree {
            pool: NodePool::new(),
            root: None,
            len: 0,
            debug_writer: debug_writer
                .map(|w| RefCell::new(Box::new(w) as Box<dyn std::fmt::Write>)),
            _config: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn height(&self) -> usize {
        self.height_of(self.root)
    }

    pub fn root_key(&self) -> Option<Key> {
        self.root.map(|r| self.pool.nodes[r].key)
    }

    fn height_of(&self, idx: Option<usize>) -> usize {
        idx.map_or(0, |i| self.pool.nodes[i].height)
    }

    fn update_height(&mut self, idx: usize) {
        let lh = self.height_of(self.pool.nodes[idx].left);
        let rh = self.height_of(self.pool.nodes[idx].right);
        self.pool.nodes[idx].height = max(lh, rh) + 1;
    }

    fn balance_factor(&self, idx: Option<usize>) -> isize {
        match idx {
            None => 0,
            Some(i) => {
                let lh = self.height_of(self.pool.nodes[i].left) as isize;
                let rh = self.height_of(self.pool.nodes[i].right) as isize;
                lh - rh
            }
        }
    }

    fn rotate_right(&mut self, y: usize) -> usize {
        debug!(self.debug_writer, "rotate right at {}", self.pool.nodes[y].key);
        let x = self.pool.nodes[y].left.expect("rotate_right on None");
        let t2 = self.pool.nodes[x].right;
        self.pool.nodes[x].right = Some(y);
        self.pool.nodes[y].left = t2;
        self.update_height(y);
        self.update_height(x);
        x
    }

    fn rotate_left(&mut self, x: usize) -> usize {
        debug!(self.debug_writer, "rotate left at {}", self.pool.nodes[x].key);
        let y = self.pool.nodes[x].right.expect("rotate_left on None");
        let t2 = self.pool.nodes[y].left;
        self.pool.nodes[y].left = Some(x);
        self.pool.nodes[x].right = t2;
        self.update_height(x);
        self.update_height(y);
        y
    }

    fn rotate_left_right(&mut self, idx: usize) -> usize {
        let l = self.pool.nodes[idx].left.expect("rotate_left_right on None");
        let new_left = self.rotate_left(l);
        self.pool.nodes[idx].left = Some(new_left);
        self.rotate_right(idx)
    }

    fn rotate_right_left(&mut self, idx: usize) -> usize {
        let r = self.pool.nodes[idx].right.expect("rotate_right_left on None");
        let new_right = self.rotate_right(r);
        self.pool.nodes[idx].right = Some(new_right);
        self.rotate_left(idx)
    }

    // Only the subtree holding `key` grew, so its relation to the child picks the case.
    fn rebalance_after_insert(&mut self, idx: usize, key: Key) -> usize {
        self.update_height(idx);
        let bf = self.balance_factor(Some(idx));
        let node_key = self.pool.nodes[idx].key;
        if bf > 1 {
            let l = self.pool.nodes[idx].left.expect("left-heavy node without left child");
            if key < self.pool.nodes[l].key {
                debug!(self.debug_writer, "left-left case at {}", node_key);
                return self.rotate_right(idx);
            }
            debug!(self.debug_writer, "left-right case at {}", node_key);
            return self.rotate_left_right(idx);
        }
        if bf < -1 {
            let r = self.pool.nodes[idx].right.expect("right-heavy node without right child");
            if key > self.pool.nodes[r].key {
                debug!(self.debug_writer, "right-right case at {}", node_key);
                return self.rotate_left(idx);
            }
            debug!(self.debug_writer, "right-left case at {}", node_key);
            return self.rotate_right_left(idx);
        }
        idx
    }

    fn rebalance_after_remove(&mut self, idx: usize) -> usize {
        self.update_height(idx);
        let bf = self.balance_factor(Some(idx));
        let node_key = self.pool.nodes[idx].key;
        if bf > 1 {
            if self.balance_factor(self.pool.nodes[idx].left) >= 0 {
                debug!(self.debug_writer, "left-left case at {}", node_key);
                return self.rotate_right(idx);
            }
            debug!(self.debug_writer, "left-right case at {}", node_key);
            return self.rotate_left_right(idx);
        }
        if bf < -1 {
            if self.balance_factor(self.pool.nodes[idx].right) <= 0 {
                debug!(self.debug_writer, "right-right case at {}", node_key);
                return self.rotate_left(idx);
            }
            debug!(self.debug_writer, "right-left case at {}", node_key);
            return self.rotate_right_left(idx);
        }
        idx
    }

    fn insert_node(&mut self, idx: Option<usize>, key: Key) -> (usize, bool) {
        if let Some(i) = idx {
            let inserted = match key.cmp(&self.pool.nodes[i].key) {
                Ordering::Less => {
                    let (l, inserted) = self.insert_node(self.pool.nodes[i].left, key);
                    self.pool.nodes[i].left = Some(l);
                    inserted
                }
                Ordering::Greater => {
                    let (r, inserted) = self.insert_node(self.pool.nodes[i].right, key);
                    self.pool.nodes[i].right = Some(r);
                    inserted
                }
                Ordering::Equal => false,
            };
            if !inserted {
                return (i, false);
            }
            (self.rebalance_after_insert(i, key), true)
        } else {
            (self.pool.alloc(key), true)
        }
    }

    pub fn insert(&mut self, key: Key) -> bool {
        let (root, inserted) = self.insert_node(self.root, key);
        self.root = Some(root);
        if inserted {
            self.len += 1;
            debug!(self.debug_writer, "insert {}: height {}", key, self.height());
        } else {
            debug!(self.debug_writer, "insert {}: already present", key);
        }
        self.after_mutation();
        inserted
    }

    pub fn insert_random<R: Rng>(&mut self, count: usize, rng: &mut R) -> usize {
        let mut inserted = 0;
        for _ in 0..count {
            if self.insert(rng.random_range(RANDOM_KEYS)) {
                inserted += 1;
            }
        }
        inserted
    }

    fn find(&self, key: Key) -> Option<usize> {
        let mut cur = self.root;
        while let Some(i) = cur {
            match key.cmp(&self.pool.nodes[i].key) {
                Ordering::Less => cur = self.pool.nodes[i].left,
                Ordering::Greater => cur = self.pool.nodes[i].right,
                Ordering::Equal => return Some(i),
            }
        }
        None
    }

    pub fn contains(&self, key: Key) -> bool {
        self.find(key).is_some()
    }

    fn min_node(&self, mut idx: usize) -> usize {
        while let Some(l) = self.pool.nodes[idx].left {
            idx = l;
        }
        idx
    }

    fn max_node(&self, mut idx: usize) -> usize {
        while let Some(r) = self.pool.nodes[idx].right {
            idx = r;
        }
        idx
    }

    pub fn min(&self) -> Option<Key> {
        self.root.map(|r| self.pool.nodes[self.min_node(r)].key)
    }

    pub fn max(&self) -> Option<Key> {
        self.root.map(|r| self.pool.nodes[self.max_node(r)].key)
    }

    fn remove_node(&mut self, idx: Option<usize>, key: Key) -> (Option<usize>, bool) {
        let Some(i) = idx else {
            return (None, false);
        };
        let removed = match key.cmp(&self.pool.nodes[i].key) {
            Ordering::Less => {
                let (l, removed) = self.remove_node(self.pool.nodes[i].left, key);
                self.pool.nodes[i].left = l;
                removed
            }
            Ordering::Greater => {
                let (r, removed) = self.remove_node(self.pool.nodes[i].right, key);
                self.pool.nodes[i].right = r;
                removed
            }
            Ordering::Equal => match (self.pool.nodes[i].left, self.pool.nodes[i].right) {
                (None, child) | (child, None) => {
                    self.pool.free(i);
                    return (child, true);
                }
                (Some(_), Some(r)) => {
                    let succ_key = self.pool.nodes[self.min_node(r)].key;
                    debug!(self.debug_writer, "copy successor {} into {}", succ_key, key);
                    self.pool.nodes[i].key = succ_key;
                    let (r, removed) = self.remove_node(Some(r), succ_key);
                    debug_assert!(removed);
                    self.pool.nodes[i].right = r;
                    true
                }
            },
        };
        if !removed {
            return (Some(i), false);
        }
        (Some(self.rebalance_after_remove(i)), true)
    }

    pub fn remove(&mut self, key: Key) -> bool {
        let (root, removed) = self.remove_node(self.root, key);
        self.root = root;
        if removed {
            self.len -= 1;
            debug!(self.debug_writer, "remove {}: height {}", key, self.height());
        } else {
            debug!(self.debug_writer, "remove {}: not found", key);
        }
        self.after_mutation();
        removed
    }

    pub fn clear(&mut self) {
        debug!(self.debug_writer, "clear: dropped {} keys", self.len);
        self.pool.clear();
        self.root = None;
        self.len = 0;
    }

    // restartable: each call starts a fresh descent
    pub fn iter(&self) -> impl Iterator<Item = Key> + '_ {
        let mut stack = Vec::new();
        let mut cur = self.root;
        iter::from_fn(move || {
            while let Some(i) = cur {
                stack.push(i);
                cur = self.pool.nodes[i].left;
            }
            let i = stack.pop()?;
            cur = self.pool.nodes[i].right;
            Some(self.pool.nodes[i].key)
        })
    }

    pub fn render_shape(&self) -> String {
        fn traverse<Config: ConfigT>(
            tree: &Tree<Config>,
            idx: Option<usize>,
            level: usize,
            out: &mut String,
        ) {
            if let Some(i) = idx {
                let node = &tree.pool.nodes[i];
                traverse(tree, node.left, level + 1, out);
                writeln!(out, "{}{} (h={})", "  ".repeat(level), node.key, node.height)
                    .expect("writing to String cannot fail");
                traverse(tree, node.right, level + 1, out);
            }
        }
        let mut out = String::new();
        traverse(self, self.root, 0, &mut out);
        out
    }

    fn check_subtree(
        &self,
        idx: Option<usize>,
        lower: Option<Key>,
        upper: Option<Key>,
        reachable: &mut [bool],
    ) -> Result<usize, InvariantViolation> {
        let Some(i) = idx else {
            return Ok(0);
        };
        let node = &self.pool.nodes[i];
        reachable[i] = true;
        if lower.is_some_and(|lo| node.key <= lo) || upper.is_some_and(|hi| node.key >= hi) {
            return Err(InvariantViolation::Order {
                key: node.key,
                lower,
                upper,
            });
        }
        let lh = self.check_subtree(node.left, lower, Some(node.key), reachable)?;
        let rh = self.check_subtree(node.right, Some(node.key), upper, reachable)?;
        let actual = max(lh, rh) + 1;
        if node.height != actual {
            return Err(InvariantViolation::Height {
                key: node.key,
                cached: node.height,
                actual,
            });
        }
        let balance_factor = lh as isize - rh as isize;
        if balance_factor.abs() > 1 {
            return Err(InvariantViolation::Balance {
                key: node.key,
                balance_factor,
            });
        }
        Ok(actual)
    }

    /// Verifies ordering, cached heights, balance, and arena accounting.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut reachable = vec![false; self.pool.nodes.len()];
        self.check_subtree(self.root, None, None, &mut reachable)?;
        if let Some(&index) = self.pool.free_list.iter().find(|&&i| reachable[i]) {
            return Err(InvariantViolation::FreedNodeReachable { index });
        }
        let reachable = reachable.iter().filter(|&&r| r).count();
        if reachable != self.len || self.pool.live() != self.len {
            return Err(InvariantViolation::Count {
                reachable,
                expected: self.len,
            });
        }
        Ok(())
    }

    fn after_mutation(&self) {
        if Config::CHECK_INVARIANTS {
            if let Err(violation) = self.check_invariants() {
                panic!("AVL invariant broken: {}", violation);
            }
        }
    }
}

impl<Config: ConfigT> Default for Tree<Config> {
    fn default() -> Self {
        Tree::new()
    }
}

pub struct ReleaseConfig {}
pub struct DebugConfig {}

impl ConfigT for ReleaseConfig {
    const DEBUG: bool = false;
    const CHECK_INVARIANTS: bool = false;
}

impl ConfigT for DebugConfig {
    const DEBUG: bool = true;
    const CHECK_INVARIANTS: bool = true;
}

pub type AvlTree = Tree<ReleaseConfig>;
pub type AvlTreeDebug = Tree<DebugConfig>;
