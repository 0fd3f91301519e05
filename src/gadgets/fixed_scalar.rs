//! A scalar as 255 explicit bits, so that bitwise XOR can be computed one bit
//! at a time.
//!
//! Bits are little-endian. Scalars come from and go back to non-native field
//! elements (`NonNativeTarget<FF>`). In circuit, going back reinterprets the
//! 255-bit integer as the limbs of an `FF` element without reducing it, which
//! is only canonical when the order of `FF` exceeds 2^255, as for P-256 and
//! secp256k1 scalars. The host side [`FixedScalar255::to_scalar`] reduces.

use std::{array, ops::BitXor};

use num::{BigUint, Zero};
use plonky2::{
    field::{
        extension::Extendable,
        types::{Field, PrimeField},
    },
    hash::hash_types::RichField,
    iop::{
        target::{BoolTarget, Target},
        witness::PartialWitness,
    },
    plonk::circuit_builder::CircuitBuilder,
};
use plonky2_ecdsa::gadgets::{
    biguint::BigUintTarget,
    nonnative::{CircuitBuilderNonNative, NonNativeTarget},
};

use super::{
    bits::{bits_to_limbs_le, limbs_to_bits_le},
    element::{CircuitElement, WitnessElement},
};
use crate::{Error, Result};

pub const SCALAR_BITS: usize = 255;

/// Host-side value of a [`FixedScalar255Target`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FixedScalar255 {
    bits: [bool; SCALAR_BITS],
}

impl FixedScalar255 {
    pub fn from_bits(bits: [bool; SCALAR_BITS]) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> &[bool; SCALAR_BITS] {
        &self.bits
    }

    pub fn from_biguint(value: &BigUint) -> Result<Self> {
        if value.bits() > SCALAR_BITS as u64 {
            return Err(Error::ScalarTooWide { bits: value.bits() });
        }
        Ok(Self {
            bits: array::from_fn(|i| value.bit(i as u64)),
        })
    }

    /// Decomposes the canonical representative of `scalar`. Fails for fields
    /// wider than 255 bits when the representative does not fit.
    pub fn from_scalar<FF: PrimeField>(scalar: &FF) -> Result<Self> {
        Self::from_biguint(&scalar.to_canonical_biguint())
    }

    /// `Σ bit_i · 2^i`, unreduced.
    pub fn to_biguint(&self) -> BigUint {
        self.bits.iter().rev().fold(BigUint::zero(), |acc, &bit| {
            (acc << 1u32) + BigUint::from(bit as u8)
        })
    }

    /// `to_biguint` reduced modulo the order of `FF`.
    pub fn to_scalar<FF: Field>(&self) -> FF {
        FF::from_noncanonical_biguint(self.to_biguint())
    }

    pub fn xor(&self, other: &Self) -> Self {
        Self {
            bits: array::from_fn(|i| self.bits[i] != other.bits[i]),
        }
    }
}

impl Default for FixedScalar255 {
    fn default() -> Self {
        Self {
            bits: [false; SCALAR_BITS],
        }
    }
}

impl BitXor for FixedScalar255 {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        self.xor(&rhs)
    }
}

#[derive(Clone, Debug)]
pub struct FixedScalar255Target {
    bits: Vec<BoolTarget>,
}

impl FixedScalar255Target {
    pub fn add_virtual<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
    ) -> Self {
        Self {
            bits: (0..SCALAR_BITS)
                .map(|_| builder.add_virtual_bool_target_safe())
                .collect(),
        }
    }

    pub fn constant<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
        value: &FixedScalar255,
    ) -> Self {
        Self {
            bits: value
                .bits
                .iter()
                .map(|&bit| builder.constant_bool(bit))
                .collect(),
        }
    }

    pub fn bits(&self) -> &[BoolTarget] {
        &self.bits
    }

    /// Decomposes an integer given as u32 limbs. Bits above 254 must be zero.
    pub fn from_biguint<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
        value: &BigUintTarget,
    ) -> Self {
        let mut bits = limbs_to_bits_le(builder, &value.limbs);
        for &bit in bits.iter().skip(SCALAR_BITS) {
            builder.assert_zero(bit.target);
        }
        bits.truncate(SCALAR_BITS);
        let zero = builder._false();
        bits.resize(SCALAR_BITS, zero);
        Self { bits }
    }

    /// Decomposes the canonical representative of `x`.
    pub fn from_nonnative<F: RichField + Extendable<D>, const D: usize, FF: PrimeField>(
        builder: &mut CircuitBuilder<F, D>,
        x: &NonNativeTarget<FF>,
    ) -> Self {
        let canonical = builder.nonnative_to_canonical_biguint(x);
        Self::from_biguint(builder, &canonical)
    }

    pub fn to_biguint<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
    ) -> BigUintTarget {
        BigUintTarget {
            limbs: bits_to_limbs_le(builder, &self.bits),
        }
    }

    /// Recomposes the bits and reinterprets the limbs as an `FF` element. No
    /// reduction takes place; see the module docs.
    pub fn to_nonnative<F: RichField + Extendable<D>, const D: usize, FF: PrimeField>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
    ) -> NonNativeTarget<FF> {
        let value = self.to_biguint(builder);
        builder.biguint_to_nonnative(&value)
    }

    /// Per-bit `a + b - 2ab`.
    pub fn xor<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        other: &Self,
    ) -> Self {
        measure_gates!(builder, "FixedScalar255Target::xor", {
            let bits = self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(a, b)| {
                    let sum = builder.add(a.target, b.target);
                    let xor = builder.arithmetic(-F::TWO, F::ONE, a.target, b.target, sum);
                    BoolTarget::new_unsafe(xor)
                })
                .collect();
            Self { bits }
        })
    }

    pub fn connect<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        other: &Self,
    ) {
        for (a, b) in self.bits.iter().zip(&other.bits) {
            builder.connect(a.target, b.target);
        }
    }

    pub fn set_targets<F: RichField>(
        &self,
        pw: &mut PartialWitness<F>,
        value: &FixedScalar255,
    ) -> Result<()> {
        self.set_witness(pw, value)?;
        Ok(())
    }
}

impl CircuitElement for FixedScalar255Target {
    const SIZE: usize = SCALAR_BITS;

    fn flatten(&self) -> Vec<Target> {
        self.bits.iter().map(|bit| bit.target).collect()
    }

    fn from_flattened<F: RichField + Extendable<D>, const D: usize>(
        _builder: &mut CircuitBuilder<F, D>,
        targets: &[Target],
    ) -> Self {
        Self {
            bits: targets[..SCALAR_BITS]
                .iter()
                .map(|&t| BoolTarget::new_unsafe(t))
                .collect(),
        }
    }
}

impl<F: RichField> WitnessElement<F> for FixedScalar255Target {
    type Value = FixedScalar255;

    fn add_virtual<const D: usize>(builder: &mut CircuitBuilder<F, D>) -> Self
    where
        F: Extendable<D>,
    {
        FixedScalar255Target::add_virtual(builder)
    }

    fn value_to_fields(value: &FixedScalar255) -> Vec<F> {
        value.bits.iter().map(|&bit| F::from_bool(bit)).collect()
    }

    fn value_from_fields(fields: &[F]) -> FixedScalar255 {
        FixedScalar255 {
            bits: array::from_fn(|i| !fields[i].is_zero()),
        }
    }
}

#[cfg(test)]
mod tests {
    use plonky2::plonk::circuit_builder::CircuitBuilder;
    use plonky2_ecdsa::{field::p256_scalar::P256Scalar, gadgets::biguint::WitnessBigUint};
    use rand::{RngCore, rngs::OsRng};

    use super::*;
    use crate::{
        C, D, F, circuit_config,
        gadgets::bounded_array::{BoundedArray, ScalarArrayTarget},
        scalar_circuit_config,
        test_utils::{init_logger, is_satisfiable},
    };

    /// A random integer below 2^255.
    fn random_value() -> BigUint {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        bytes[31] &= 0x7f;
        BigUint::from_bytes_le(&bytes)
    }

    fn random_scalar() -> FixedScalar255 {
        FixedScalar255::from_biguint(&random_value()).expect("below 2^255")
    }

    #[test]
    fn test_xor_matches_integer_xor() -> Result<()> {
        let (a, b) = (random_value(), random_value());
        let bits_a = FixedScalar255::from_biguint(&a)?;
        let bits_b = FixedScalar255::from_biguint(&b)?;
        let xored = bits_a ^ bits_b;
        assert_eq!(xored.to_biguint(), &a ^ &b);

        assert_eq!(xored ^ bits_b, bits_a);
        assert_eq!(xored ^ bits_a, bits_b);
        assert_eq!(bits_a.xor(&bits_b), bits_b.xor(&bits_a));
        assert_eq!(bits_a ^ bits_a, FixedScalar255::default());

        let all_ones = FixedScalar255::from_bits([true; SCALAR_BITS]);
        assert_eq!(all_ones.to_biguint(), (BigUint::from(1u8) << SCALAR_BITS) - 1u8);
        assert_eq!((bits_a ^ all_ones).to_biguint(), &a ^ all_ones.to_biguint());
        Ok(())
    }

    #[test]
    fn test_scalar_round_trip() -> Result<()> {
        let one = BigUint::from(1u8);
        let max = (BigUint::from(1u8) << SCALAR_BITS) - 1u8;
        for value in [BigUint::zero(), one, random_value(), max] {
            let scalar = P256Scalar::from_noncanonical_biguint(value.clone());
            let bits = FixedScalar255::from_scalar(&scalar)?;
            assert_eq!(bits.to_biguint(), value);
            assert_eq!(bits.to_scalar::<P256Scalar>(), scalar);
        }
        assert!(FixedScalar255::from_scalar(&P256Scalar::ONE)?.bits()[0]);
        Ok(())
    }

    #[test]
    fn test_rejects_values_wider_than_255_bits() {
        let wide = BigUint::from(1u8) << SCALAR_BITS;
        assert!(matches!(
            FixedScalar255::from_biguint(&wide),
            Err(Error::ScalarTooWide { bits: 256 })
        ));
        assert!(FixedScalar255::from_scalar(&P256Scalar::NEG_ONE).is_err());
    }

    #[test]
    fn test_xor_circuit() -> anyhow::Result<()> {
        init_logger();
        let mut builder = CircuitBuilder::<F, D>::new(circuit_config());
        let a = FixedScalar255Target::add_virtual(&mut builder);
        let b = FixedScalar255Target::add_virtual(&mut builder);
        let xored = a.xor(&mut builder, &b);
        let expected = FixedScalar255Target::add_virtual(&mut builder);
        xored.connect(&mut builder, &expected);
        let back = xored.xor(&mut builder, &b);
        back.connect(&mut builder, &a);
        let swapped = b.xor(&mut builder, &a);
        swapped.connect(&mut builder, &xored);

        let even_bits = FixedScalar255::from_bits(array::from_fn(|i| i % 2 == 0));
        let mask = FixedScalar255Target::constant(&mut builder, &even_bits);
        let flipped = a.xor(&mut builder, &mask);
        let expected_flipped = FixedScalar255Target::add_virtual(&mut builder);
        flipped.connect(&mut builder, &expected_flipped);
        let data = builder.build::<C>();

        let (a_value, b_value) = (random_scalar(), random_scalar());
        let mut pw = PartialWitness::new();
        a.set_targets(&mut pw, &a_value)?;
        b.set_targets(&mut pw, &b_value)?;
        expected.set_targets(&mut pw, &(a_value ^ b_value))?;
        expected_flipped.set_targets(&mut pw, &(a_value ^ even_bits))?;
        let proof = data.prove(pw)?;
        data.verify(proof)?;

        let mut pw = PartialWitness::new();
        a.set_targets(&mut pw, &a_value)?;
        b.set_targets(&mut pw, &b_value)?;
        expected.set_targets(&mut pw, &(a_value ^ b_value))?;
        expected_flipped.set_targets(&mut pw, &a_value)?;
        assert!(!is_satisfiable(&data, pw));

        let mut pw = PartialWitness::new();
        a.set_targets(&mut pw, &a_value)?;
        b.set_targets(&mut pw, &b_value)?;
        expected.set_targets(&mut pw, &a_value)?;
        expected_flipped.set_targets(&mut pw, &(a_value ^ even_bits))?;
        assert!(!is_satisfiable(&data, pw));
        Ok(())
    }

    #[test]
    fn test_nonnative_round_trip() -> anyhow::Result<()> {
        let mut builder = CircuitBuilder::<F, D>::new(scalar_circuit_config());
        let x = builder.add_virtual_nonnative_target::<P256Scalar>();
        let bits = FixedScalar255Target::from_nonnative(&mut builder, &x);
        let expected = FixedScalar255Target::add_virtual(&mut builder);
        bits.connect(&mut builder, &expected);
        let back = bits.to_nonnative::<F, D, P256Scalar>(&mut builder);
        builder.connect_nonnative(&x, &back);
        let data = builder.build::<C>();

        let value = random_value();
        let mut pw = PartialWitness::new();
        pw.set_biguint_target(&x.value, &value)?;
        expected.set_targets(&mut pw, &FixedScalar255::from_biguint(&value)?)?;
        let proof = data.prove(pw)?;
        data.verify(proof)?;

        // The canonical representative of -1 needs all 256 bits.
        let wide = P256Scalar::NEG_ONE.to_canonical_biguint();
        let mut pw = PartialWitness::new();
        pw.set_biguint_target(&x.value, &wide)?;
        expected.set_targets(&mut pw, &FixedScalar255::default())?;
        assert!(!is_satisfiable(&data, pw));
        Ok(())
    }

    #[test]
    fn test_scalar_array() -> anyhow::Result<()> {
        let mut builder = CircuitBuilder::<F, D>::new(circuit_config());
        let input = ScalarArrayTarget::<2>::add_virtual(&mut builder);
        let value = FixedScalar255Target::add_virtual(&mut builder);
        let mut array = input.clone();
        array.push(&mut builder, &value);
        let last = builder.one();
        let read = array.get(&mut builder, last);
        read.connect(&mut builder, &value);
        array.assert_includes(&mut builder, &value);
        let data = builder.build::<C>();

        let (first, second) = (random_scalar(), random_scalar());
        let mut pw = PartialWitness::new();
        input.set_targets(&mut pw, &BoundedArray::from_values(vec![first])?)?;
        value.set_targets(&mut pw, &second)?;
        let proof = data.prove(pw)?;
        data.verify(proof)
    }
}
