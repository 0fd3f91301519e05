//! Poseidon hashing and hash-based equality for [`CircuitElement`]s.

use plonky2::{
    field::extension::Extendable,
    hash::{
        hash_types::{HashOut, HashOutTarget, RichField},
        poseidon::PoseidonHash,
    },
    iop::target::BoolTarget,
    plonk::{circuit_builder::CircuitBuilder, config::Hasher},
};

use super::element::{CircuitElement, WitnessElement};

pub fn hash_element<F: RichField + Extendable<D>, const D: usize, T: CircuitElement>(
    builder: &mut CircuitBuilder<F, D>,
    x: &T,
) -> HashOutTarget {
    builder.hash_n_to_hash_no_pad::<PoseidonHash>(x.flatten())
}

pub fn hashes_equal<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    lhs: HashOutTarget,
    rhs: HashOutTarget,
) -> BoolTarget {
    let mut equal = builder._true();
    for (&l, &r) in lhs.elements.iter().zip(rhs.elements.iter()) {
        let limb_equal = builder.is_equal(l, r);
        equal = builder.and(equal, limb_equal);
    }
    equal
}

/// Equality of two elements, decided by comparing their hashes.
pub fn elements_equal<F: RichField + Extendable<D>, const D: usize, T: CircuitElement>(
    builder: &mut CircuitBuilder<F, D>,
    lhs: &T,
    rhs: &T,
) -> BoolTarget {
    let lhs = hash_element(builder, lhs);
    let rhs = hash_element(builder, rhs);
    hashes_equal(builder, lhs, rhs)
}

/// Native counterpart of [`hash_element`].
pub fn hash_value<F: RichField, T: WitnessElement<F>>(value: &T::Value) -> HashOut<F> {
    PoseidonHash::hash_no_pad(&T::value_to_fields(value))
}
