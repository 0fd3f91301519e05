//! Capabilities an element type needs in order to live inside a
//! [`BoundedArrayTarget`](super::bounded_array::BoundedArrayTarget).
//!
//! Every element has a fixed width in field elements. Its null value is the
//! element decoded from an all-zero vector, which is what padding slots hold.

use std::fmt::Debug;

use plonky2::{
    field::{extension::Extendable, types::Field},
    hash::hash_types::{HashOut, HashOutTarget, RichField},
    iop::{
        target::{BoolTarget, Target},
        witness::{PartialWitness, WitnessWrite},
    },
    plonk::circuit_builder::CircuitBuilder,
};

/// A circuit value with a fixed-size field representation.
pub trait CircuitElement: Clone + Debug {
    /// Number of targets in the flattened representation.
    const SIZE: usize;

    fn flatten(&self) -> Vec<Target>;

    /// Rebuilds an element from exactly [`Self::SIZE`] targets. Adds no
    /// constraints.
    fn from_flattened<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
        targets: &[Target],
    ) -> Self;

    fn null<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
    ) -> Self {
        let zero = builder.zero();
        Self::from_flattened(builder, &vec![zero; Self::SIZE])
    }

    /// Returns `x` if `b` is true and `y` otherwise.
    fn select<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
        b: BoolTarget,
        x: &Self,
        y: &Self,
    ) -> Self {
        let selected: Vec<Target> = x
            .flatten()
            .into_iter()
            .zip(y.flatten())
            .map(|(x, y)| builder.select(b, x, y))
            .collect();
        Self::from_flattened(builder, &selected)
    }
}

/// A [`CircuitElement`] that can be allocated as a witness and filled from a
/// host-side value.
pub trait WitnessElement<F: RichField>: CircuitElement {
    type Value: Clone + Debug;

    fn add_virtual<const D: usize>(builder: &mut CircuitBuilder<F, D>) -> Self
    where
        F: Extendable<D>;

    fn value_to_fields(value: &Self::Value) -> Vec<F>;

    fn value_from_fields(fields: &[F]) -> Self::Value;

    fn null_value() -> Self::Value {
        Self::value_from_fields(&vec![F::ZERO; Self::SIZE])
    }

    fn set_witness(&self, pw: &mut PartialWitness<F>, value: &Self::Value) -> anyhow::Result<()> {
        for (target, value) in self.flatten().into_iter().zip(Self::value_to_fields(value)) {
            pw.set_target(target, value)?;
        }
        Ok(())
    }
}

impl CircuitElement for Target {
    const SIZE: usize = 1;

    fn flatten(&self) -> Vec<Target> {
        vec![*self]
    }

    fn from_flattened<F: RichField + Extendable<D>, const D: usize>(
        _builder: &mut CircuitBuilder<F, D>,
        targets: &[Target],
    ) -> Self {
        targets[0]
    }
}

impl<F: RichField> WitnessElement<F> for Target {
    type Value = F;

    fn add_virtual<const D: usize>(builder: &mut CircuitBuilder<F, D>) -> Self
    where
        F: Extendable<D>,
    {
        builder.add_virtual_target()
    }

    fn value_to_fields(value: &F) -> Vec<F> {
        vec![*value]
    }

    fn value_from_fields(fields: &[F]) -> F {
        fields[0]
    }
}

impl CircuitElement for BoolTarget {
    const SIZE: usize = 1;

    fn flatten(&self) -> Vec<Target> {
        vec![self.target]
    }

    // Selections between booleans stay boolean, so the range check done when
    // the wire was created still holds.
    fn from_flattened<F: RichField + Extendable<D>, const D: usize>(
        _builder: &mut CircuitBuilder<F, D>,
        targets: &[Target],
    ) -> Self {
        BoolTarget::new_unsafe(targets[0])
    }
}

impl<F: RichField> WitnessElement<F> for BoolTarget {
    type Value = bool;

    fn add_virtual<const D: usize>(builder: &mut CircuitBuilder<F, D>) -> Self
    where
        F: Extendable<D>,
    {
        builder.add_virtual_bool_target_safe()
    }

    fn value_to_fields(value: &bool) -> Vec<F> {
        vec![F::from_bool(*value)]
    }

    fn value_from_fields(fields: &[F]) -> bool {
        !fields[0].is_zero()
    }
}

impl CircuitElement for HashOutTarget {
    const SIZE: usize = 4;

    fn flatten(&self) -> Vec<Target> {
        self.elements.to_vec()
    }

    fn from_flattened<F: RichField + Extendable<D>, const D: usize>(
        _builder: &mut CircuitBuilder<F, D>,
        targets: &[Target],
    ) -> Self {
        HashOutTarget {
            elements: std::array::from_fn(|i| targets[i]),
        }
    }
}

impl<F: RichField> WitnessElement<F> for HashOutTarget {
    type Value = HashOut<F>;

    fn add_virtual<const D: usize>(builder: &mut CircuitBuilder<F, D>) -> Self
    where
        F: Extendable<D>,
    {
        builder.add_virtual_hash()
    }

    fn value_to_fields(value: &HashOut<F>) -> Vec<F> {
        value.elements.to_vec()
    }

    fn value_from_fields(fields: &[F]) -> HashOut<F> {
        HashOut {
            elements: std::array::from_fn(|i| fields[i]),
        }
    }
}

/// Fixed-width tuples of field elements.
impl<const N: usize> CircuitElement for [Target; N] {
    const SIZE: usize = N;

    fn flatten(&self) -> Vec<Target> {
        self.to_vec()
    }

    fn from_flattened<F: RichField + Extendable<D>, const D: usize>(
        _builder: &mut CircuitBuilder<F, D>,
        targets: &[Target],
    ) -> Self {
        std::array::from_fn(|i| targets[i])
    }
}

impl<F: RichField, const N: usize> WitnessElement<F> for [Target; N] {
    type Value = [F; N];

    fn add_virtual<const D: usize>(builder: &mut CircuitBuilder<F, D>) -> Self
    where
        F: Extendable<D>,
    {
        std::array::from_fn(|_| builder.add_virtual_target())
    }

    fn value_to_fields(value: &[F; N]) -> Vec<F> {
        value.to_vec()
    }

    fn value_from_fields(fields: &[F]) -> [F; N] {
        std::array::from_fn(|i| fields[i])
    }
}

#[cfg(test)]
mod tests {
    use plonky2::{
        field::types::Field,
        iop::witness::PartialWitness,
        plonk::circuit_builder::CircuitBuilder,
    };

    use super::*;
    use crate::{C, D, F, circuit_config};

    #[test]
    fn test_null_values_are_zero() {
        assert_eq!(<Target as WitnessElement<F>>::null_value(), F::ZERO);
        assert!(!<BoolTarget as WitnessElement<F>>::null_value());
        assert_eq!(
            <HashOutTarget as WitnessElement<F>>::null_value(),
            HashOut::<F>::default()
        );
        assert_eq!(<[Target; 2] as WitnessElement<F>>::null_value(), [F::ZERO; 2]);
    }

    #[test]
    fn test_select_point() -> anyhow::Result<()> {
        let mut builder = CircuitBuilder::<F, D>::new(circuit_config());
        let b = builder.add_virtual_bool_target_safe();
        let x = <[Target; 2] as WitnessElement<F>>::add_virtual(&mut builder);
        let y = <[Target; 2] as WitnessElement<F>>::add_virtual(&mut builder);
        let picked = <[Target; 2]>::select(&mut builder, b, &x, &y);
        let expected = <[Target; 2] as WitnessElement<F>>::add_virtual(&mut builder);
        for (p, e) in picked.iter().zip(expected.iter()) {
            builder.connect(*p, *e);
        }
        let data = builder.build::<C>();

        for choose_x in [true, false] {
            let x_value = [F::from_canonical_u64(3), F::from_canonical_u64(4)];
            let y_value = [F::from_canonical_u64(5), F::from_canonical_u64(6)];
            let mut pw = PartialWitness::new();
            pw.set_bool_target(b, choose_x)?;
            x.set_witness(&mut pw, &x_value)?;
            y.set_witness(&mut pw, &y_value)?;
            expected.set_witness(&mut pw, if choose_x { &x_value } else { &y_value })?;
            let proof = data.prove(pw)?;
            data.verify(proof)?;
        }
        Ok(())
    }
}
