use thiserror::Error;

use crate::avl_tree::Key;

/// The first broken invariant found by `Tree::check_invariants`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("key {key} is out of order (allowed range {lower:?}..{upper:?}, exclusive)")]
    Order {
        key: Key,
        lower: Option<Key>,
        upper: Option<Key>,
    },
    #[error("node {key} caches height {cached}, but its subtree has height {actual}")]
    Height {
        key: Key,
        cached: usize,
        actual: usize,
    },
    #[error("node {key} has balance factor {balance_factor}")]
    Balance { key: Key, balance_factor: isize },
    #[error("{reachable} nodes reachable from the root, but {expected} are live")]
    Count { reachable: usize, expected: usize },
    #[error("freed slot {index} is still linked into the tree")]
    FreedNodeReachable { index: usize },
}

/// Errors from reading a menu command or its argument.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("unexpected end of input")]
    Eof,
    #[error("Invalid choice! Please try again.")]
    InvalidChoice(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Invalid count: {0}")]
    InvalidCount(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
