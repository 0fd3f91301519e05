//! Host-side errors.
//!
//! These are raised while a circuit or its witness is being assembled. A
//! violated in-circuit invariant is not an `Error`: it produces a circuit with
//! no satisfying witness, which only shows up when proving.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{len} elements do not fit in an array of capacity {capacity}")]
    CapacityExceeded { len: usize, capacity: usize },

    #[error("value has {bits} significant bits, at most 255 are representable")]
    ScalarTooWide { bits: u64 },

    #[error("witness error: {0}")]
    Witness(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
