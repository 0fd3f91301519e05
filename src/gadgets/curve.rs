//! Curve points and ECDSA public keys as array elements.
//!
//! A point is laid out as the u32 limbs of `x` followed by the u32 limbs of
//! `y`, as produced by `add_virtual_affine_point_target`. The point at
//! infinity has no affine coordinates; it is encoded as all-zero limbs, which
//! makes it the null element.

use num::BigUint;
use plonky2::{
    field::{
        extension::Extendable,
        types::{Field, PrimeField, PrimeField64},
    },
    hash::hash_types::RichField,
    iop::target::Target,
    plonk::circuit_builder::CircuitBuilder,
};
use plonky2_ecdsa::{
    curve::{
        curve_types::{AffinePoint, Curve},
        ecdsa::ECDSAPublicKey,
    },
    gadgets::{
        biguint::BigUintTarget,
        curve::{AffinePointTarget, CircuitBuilderCurve},
        ecdsa::ECDSAPublicKeyTarget,
        nonnative::{CircuitBuilderNonNative, NonNativeTarget},
    },
};
use plonky2_u32::gadgets::arithmetic_u32::U32Target;

use super::{
    bits::LIMB_BITS,
    element::{CircuitElement, WitnessElement},
};

fn coordinate_from_targets<F: RichField + Extendable<D>, const D: usize, FF: Field>(
    builder: &mut CircuitBuilder<F, D>,
    limbs: &[Target],
) -> NonNativeTarget<FF> {
    let limbs = limbs.iter().map(|&t| U32Target(t)).collect();
    builder.biguint_to_nonnative(&BigUintTarget { limbs })
}

fn coordinate_to_fields<F: Field, FF: PrimeField>(x: &FF) -> Vec<F> {
    let mut digits = x.to_canonical_biguint().to_u32_digits();
    digits.resize(FF::BITS.div_ceil(LIMB_BITS), 0);
    digits.into_iter().map(F::from_canonical_u32).collect()
}

fn coordinate_from_fields<F: PrimeField64, FF: Field>(limbs: &[F]) -> FF {
    let digits = limbs.iter().map(|l| l.to_canonical_u64() as u32).collect();
    FF::from_noncanonical_biguint(BigUint::new(digits))
}

impl<C: Curve> CircuitElement for AffinePointTarget<C> {
    const SIZE: usize = 2 * C::BaseField::BITS.div_ceil(LIMB_BITS);

    fn flatten(&self) -> Vec<Target> {
        self.x
            .value
            .limbs
            .iter()
            .chain(&self.y.value.limbs)
            .map(|limb| limb.0)
            .collect()
    }

    fn from_flattened<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
        targets: &[Target],
    ) -> Self {
        let (x, y) = targets[..Self::SIZE].split_at(Self::SIZE / 2);
        AffinePointTarget {
            x: coordinate_from_targets(builder, x),
            y: coordinate_from_targets(builder, y),
        }
    }
}

impl<F: RichField, C: Curve> WitnessElement<F> for AffinePointTarget<C> {
    type Value = AffinePoint<C>;

    fn add_virtual<const D: usize>(builder: &mut CircuitBuilder<F, D>) -> Self
    where
        F: Extendable<D>,
    {
        builder.add_virtual_affine_point_target::<C>()
    }

    fn value_to_fields(point: &AffinePoint<C>) -> Vec<F> {
        if point.zero {
            return vec![F::ZERO; Self::SIZE];
        }
        let mut fields = coordinate_to_fields(&point.x);
        fields.extend(coordinate_to_fields::<F, _>(&point.y));
        fields
    }

    fn value_from_fields(fields: &[F]) -> AffinePoint<C> {
        let (x, y) = fields[..Self::SIZE].split_at(Self::SIZE / 2);
        AffinePoint {
            x: coordinate_from_fields(x),
            y: coordinate_from_fields(y),
            zero: fields[..Self::SIZE].iter().all(|f| f.is_zero()),
        }
    }
}

impl<C: Curve> CircuitElement for ECDSAPublicKeyTarget<C> {
    const SIZE: usize = AffinePointTarget::<C>::SIZE;

    fn flatten(&self) -> Vec<Target> {
        self.0.flatten()
    }

    fn from_flattened<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
        targets: &[Target],
    ) -> Self {
        ECDSAPublicKeyTarget(AffinePointTarget::from_flattened(builder, targets))
    }
}

impl<F: RichField, C: Curve> WitnessElement<F> for ECDSAPublicKeyTarget<C> {
    type Value = ECDSAPublicKey<C>;

    fn add_virtual<const D: usize>(builder: &mut CircuitBuilder<F, D>) -> Self
    where
        F: Extendable<D>,
    {
        ECDSAPublicKeyTarget(builder.add_virtual_affine_point_target::<C>())
    }

    fn value_to_fields(pk: &ECDSAPublicKey<C>) -> Vec<F> {
        <AffinePointTarget<C> as WitnessElement<F>>::value_to_fields(&pk.0)
    }

    fn value_from_fields(fields: &[F]) -> ECDSAPublicKey<C> {
        ECDSAPublicKey(<AffinePointTarget<C> as WitnessElement<F>>::value_from_fields(fields))
    }
}
