//! Cache core: lifecycle, guarded accessors, and eviction.

mod eviction;
mod iter;
mod lifecycle;
mod operations;
mod types;

pub use iter::Entries;
pub use types::{Eviction, SharedCache, StatsSnapshot};

#[cfg(test)]
mod tests;
