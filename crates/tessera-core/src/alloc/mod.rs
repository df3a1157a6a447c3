//! Collection types used by the dispatch core.
//!
//! This module provides:
//! - Re-exports of hash collections using AHash
//! - `SlotMap`, generational storage backing a world's views

pub mod slots;

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};
