//! Oblivious, fixed-shape data structures for plonky2 circuits.
//!
//! [`gadgets::bounded_array::BoundedArrayTarget`] is an array whose logical
//! length is only known at proving time while the circuit it produces has a
//! fixed shape. [`gadgets::fixed_scalar::FixedScalar255Target`] is a 255-bit
//! decomposition of a non-native scalar that supports bitwise XOR.

use plonky2::{
    field::goldilocks_field::GoldilocksField,
    plonk::{circuit_data::CircuitConfig, config::PoseidonGoldilocksConfig},
};

#[macro_use]
mod macros;

pub mod error;
pub mod gadgets;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{Error, Result};

pub type F = GoldilocksField;
pub const D: usize = 2;
pub type C = PoseidonGoldilocksConfig;

/// Configuration for circuits made of bounded arrays over native elements.
pub fn circuit_config() -> CircuitConfig {
    CircuitConfig::standard_recursion_config()
}

/// Configuration for circuits that convert between [`FixedScalar255Target`]
/// and non-native scalars; the u32 arithmetic gates need the wider layout.
///
/// [`FixedScalar255Target`]: gadgets::fixed_scalar::FixedScalar255Target
pub fn scalar_circuit_config() -> CircuitConfig {
    CircuitConfig::standard_ecc_config()
}
