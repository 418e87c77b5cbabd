//! Derived-value cache: lazily recomputed values with explicit invalidation,
//! and time-parameterized values that are recomputed on every access.
//!
//! # Invariants
//! - A `Cached` value is recomputed at most once between invalidations.
//! - A `Cached` value whose registered dependency recomputed since it was last
//!   read is treated as dirty, transitively.
//! - A `TimeSensitive` value never memoizes.

mod cached;
mod time_sensitive;

pub use cached::{Cached, Dependency};
pub use time_sensitive::TimeSensitive;

pub fn crate_info() -> &'static str {
    concat!("cubestack-cache v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("cache"));
    }
}
