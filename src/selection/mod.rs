//! Deterministic, quota-respecting sample selection.
//!
//! Turns heterogeneous, unevenly-sized source catalogs into a reproducible
//! training manifest: per-source floors are granted first, the remaining
//! role capacity is split proportionally to availability, and clip choice
//! within a source is a seeded shuffle. Re-running with the same seed
//! yields byte-identical manifests regardless of host or invocation order.

mod allocation;
mod selector;

pub use selector::{SelectionConfig, select};
