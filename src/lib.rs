pub mod avl_tree;
pub mod error;
pub mod menu;
pub mod shared_string_writer;
