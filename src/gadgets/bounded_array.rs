//! Arrays with a fixed capacity and a length only known at proving time.
//!
//! A [`BoundedArrayTarget<T, CAP>`] always holds exactly `CAP` slots. The
//! first `length` of them are the logical content; every slot at or past
//! `length` holds the null element of `T`. No operation indexes the slots
//! with a wire value: indices and lengths are turned into boolean masks over
//! all `CAP` positions and values are combined with
//! [`select_by_mask`](super::select::select_by_mask). The gates an operation
//! adds therefore depend on `CAP` alone.
//!
//! Out-of-range accesses and length overflows are not reported as errors.
//! They add a constraint that no witness can satisfy, so proving fails.

use std::fmt;

use itertools::Itertools;
use plonky2::{
    field::{
        extension::Extendable,
        types::{Field, PrimeField64},
    },
    hash::{
        hash_types::{HashOut, HashOutTarget, RichField},
        poseidon::PoseidonHash,
    },
    iop::{
        target::{BoolTarget, Target},
        witness::PartialWitness,
    },
    plonk::{circuit_builder::CircuitBuilder, config::Hasher},
};
use plonky2_ecdsa::gadgets::{curve::AffinePointTarget, ecdsa::ECDSAPublicKeyTarget};
use serde::{Deserialize, Serialize};

use super::{
    element::{CircuitElement, WitnessElement},
    fixed_scalar::FixedScalar255Target,
    hashable::{elements_equal, hash_element, hashes_equal},
    select::{
        assert_false, assert_in_range, assert_one_hot, assert_true, is_equal_constant,
        select_by_mask,
    },
};
use crate::{Error, Result};

pub type FieldArrayTarget<const CAP: usize> = BoundedArrayTarget<Target, CAP>;
pub type BoolArrayTarget<const CAP: usize> = BoundedArrayTarget<BoolTarget, CAP>;
pub type HashArrayTarget<const CAP: usize> = BoundedArrayTarget<HashOutTarget, CAP>;
pub type ScalarArrayTarget<const CAP: usize> = BoundedArrayTarget<FixedScalar255Target, CAP>;
pub type GroupArrayTarget<C, const CAP: usize> = BoundedArrayTarget<AffinePointTarget<C>, CAP>;
pub type PublicKeyArrayTarget<C, const CAP: usize> =
    BoundedArrayTarget<ECDSAPublicKeyTarget<C>, CAP>;

#[derive(Clone, Debug)]
pub struct BoundedArrayTarget<T, const CAP: usize> {
    length: Target,
    slots: Vec<T>,
}

impl<T: CircuitElement, const CAP: usize> BoundedArrayTarget<T, CAP> {
    /// An array holding `values`, with the length fixed as a constant.
    pub fn new<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
        values: Vec<T>,
    ) -> Result<Self> {
        if values.len() > CAP {
            return Err(Error::CapacityExceeded {
                len: values.len(),
                capacity: CAP,
            });
        }
        let length = builder.constant(F::from_canonical_usize(values.len()));
        let null = T::null(builder);
        let mut slots = values;
        slots.resize(CAP, null);
        Ok(Self { length, slots })
    }

    pub fn empty<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
    ) -> Self {
        let length = builder.zero();
        let null = T::null(builder);
        Self {
            length,
            slots: vec![null; CAP],
        }
    }

    pub fn capacity(&self) -> usize {
        CAP
    }

    pub fn length(&self) -> Target {
        self.length
    }

    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    /// `mask[i] = (i == index)`.
    ///
    /// Also constrains `index < length`: a running flag records whether
    /// position `length` has been passed, and the index may not fall on or
    /// after it. The mask is asserted one-hot, which rules out `index >= CAP`.
    pub fn index_mask<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        index: Target,
    ) -> Vec<BoolTarget> {
        let mut length_reached = builder._false();
        let mut mask = Vec::with_capacity(CAP);
        for i in 0..CAP {
            let at_length = is_equal_constant(builder, self.length, i);
            length_reached = builder.or(length_reached, at_length);
            let is_index = is_equal_constant(builder, index, i);
            let out_of_bounds = builder.and(is_index, length_reached);
            assert_false(builder, out_of_bounds);
            mask.push(is_index);
        }
        assert_one_hot(builder, &mask);
        mask
    }

    /// `mask[i] = (i < n)`, built as a flag switched off once at `i == n`.
    pub fn length_mask<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        n: Target,
    ) -> Vec<BoolTarget> {
        let mut before_n = builder._true();
        let mut mask = Vec::with_capacity(CAP);
        for i in 0..CAP {
            let at_n = is_equal_constant(builder, n, i);
            let not_at_n = builder.not(at_n);
            before_n = builder.and(before_n, not_at_n);
            mask.push(before_n);
        }
        mask
    }

    pub fn get<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        index: Target,
    ) -> T {
        measure_gates!(builder, "BoundedArrayTarget::get", {
            let mask = self.index_mask(builder, index);
            select_by_mask(builder, &mask, &self.slots)
        })
    }

    pub fn set<F: RichField + Extendable<D>, const D: usize>(
        &mut self,
        builder: &mut CircuitBuilder<F, D>,
        index: Target,
        value: &T,
    ) {
        let mask = self.index_mask(builder, index);
        for (slot, bit) in self.slots.iter_mut().zip(mask) {
            *slot = T::select(builder, bit, value, slot);
        }
    }

    /// Adds `n` to the length, asserting the result is at most `CAP`.
    pub fn increment_length<F: RichField + Extendable<D>, const D: usize>(
        &mut self,
        builder: &mut CircuitBuilder<F, D>,
        n: Target,
    ) {
        let length = builder.add(self.length, n);
        assert_in_range(builder, length, CAP);
        self.length = length;
    }

    /// Subtracts `n` from the length, asserting it does not underflow.
    pub fn decrement_length<F: RichField + Extendable<D>, const D: usize>(
        &mut self,
        builder: &mut CircuitBuilder<F, D>,
        n: Target,
    ) {
        let length = builder.sub(self.length, n);
        assert_in_range(builder, length, CAP);
        self.length = length;
    }

    pub fn push<F: RichField + Extendable<D>, const D: usize>(
        &mut self,
        builder: &mut CircuitBuilder<F, D>,
        value: &T,
    ) {
        let one = builder.one();
        self.increment_length(builder, one);
        let last = builder.add_const(self.length, F::NEG_ONE);
        self.set(builder, last, value);
    }

    /// Drops the last `n` elements and nulls their slots.
    pub fn pop<F: RichField + Extendable<D>, const D: usize>(
        &mut self,
        builder: &mut CircuitBuilder<F, D>,
        n: Target,
    ) {
        assert_in_range(builder, n, CAP);
        let remaining = builder.sub(self.length, n);
        let keep = self.length_mask(builder, remaining);
        self.decrement_length(builder, n);

        let null = T::null(builder);
        for (slot, bit) in self.slots.iter_mut().zip(keep) {
            *slot = T::select(builder, bit, slot, &null);
        }
    }

    /// `self` followed by `other`.
    pub fn concat<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        other: &Self,
    ) -> Self {
        measure_gates!(builder, "BoundedArrayTarget::concat", {
            let mut joined = other.clone();
            joined.shift_right(builder, self.length);

            let mut before_end = builder._true();
            for (i, (slot, own)) in joined.slots.iter_mut().zip(&self.slots).enumerate() {
                let at_end = is_equal_constant(builder, self.length, i);
                let not_at_end = builder.not(at_end);
                before_end = builder.and(before_end, not_at_end);
                *slot = T::select(builder, before_end, own, slot);
            }
            joined
        })
    }

    /// The elements at positions `start..end`.
    pub fn slice<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        start: Target,
        end: Target,
    ) -> Self {
        let mut sliced = self.clone();
        sliced.shift_left(builder, start);
        let span = builder.sub(end, start);
        let excess = builder.sub(sliced.length, span);
        sliced.pop(builder, excess);
        sliced
    }

    /// Inserts `value` before position `index`, which must be below the
    /// current length.
    pub fn insert<F: RichField + Extendable<D>, const D: usize>(
        &mut self,
        builder: &mut CircuitBuilder<F, D>,
        index: Target,
        value: &T,
    ) {
        let zero = builder.zero();
        let one = builder.one();
        let head = self.slice(builder, zero, index);
        let mut tail = self.slice(builder, index, self.length);
        tail.shift_right(builder, one);
        tail.set(builder, zero, value);
        *self = head.concat(builder, &tail);
    }

    /// Whether any of the `CAP` slots equals `value`.
    ///
    /// Padding slots take part, so the null element is reported as included
    /// whenever the array is not full.
    pub fn includes<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        value: &T,
    ) -> BoolTarget {
        measure_gates!(builder, "BoundedArrayTarget::includes", {
            let needle = hash_element(builder, value);
            let matches: Vec<Target> = self
                .slots
                .iter()
                .map(|slot| {
                    let slot = hash_element(builder, slot);
                    hashes_equal(builder, slot, needle).target
                })
                .collect();
            let count = builder.add_many(matches);
            let zero = builder.zero();
            let none = builder.is_equal(count, zero);
            builder.not(none)
        })
    }

    pub fn assert_includes<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        value: &T,
    ) {
        let included = self.includes(builder, value);
        assert_true(builder, included);
    }

    /// Drops the first `n` elements, moving the rest to the front.
    ///
    /// Shifting by the whole length is rejected.
    pub fn shift_left<F: RichField + Extendable<D>, const D: usize>(
        &mut self,
        builder: &mut CircuitBuilder<F, D>,
        n: Target,
    ) {
        measure_gates!(builder, "BoundedArrayTarget::shift_left", {
            let whole = builder.is_equal(n, self.length);
            assert_false(builder, whole);
            self.decrement_length(builder, n);

            let null = T::null(builder);
            let mask: Vec<BoolTarget> = (0..CAP)
                .map(|k| is_equal_constant(builder, n, k))
                .collect();
            assert_one_hot(builder, &mask);

            let shifted: Vec<T> = (0..CAP)
                .map(|i| {
                    let candidates: Vec<T> = (0..CAP)
                        .map(|k| self.slots.get(i + k).unwrap_or(&null).clone())
                        .collect();
                    select_by_mask(builder, &mask, &candidates)
                })
                .collect();
            self.slots = shifted;
        })
    }

    /// Moves every element `n` positions up, filling the front with nulls.
    pub fn shift_right<F: RichField + Extendable<D>, const D: usize>(
        &mut self,
        builder: &mut CircuitBuilder<F, D>,
        n: Target,
    ) {
        measure_gates!(builder, "BoundedArrayTarget::shift_right", {
            self.increment_length(builder, n);

            let null = T::null(builder);
            let mask: Vec<BoolTarget> = (0..=CAP)
                .map(|k| is_equal_constant(builder, n, k))
                .collect();
            assert_one_hot(builder, &mask);

            let shifted: Vec<T> = (0..CAP)
                .map(|i| {
                    let candidates: Vec<T> = (0..=CAP)
                        .map(|k| {
                            if i < k {
                                null.clone()
                            } else {
                                self.slots[i - k].clone()
                            }
                        })
                        .collect();
                    select_by_mask(builder, &mask, &candidates)
                })
                .collect();
            self.slots = shifted;
        })
    }

    /// Poseidon hash of all `CAP` slots, padding included. The length is not
    /// hashed.
    pub fn hash<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
    ) -> HashOutTarget {
        builder.hash_n_to_hash_no_pad::<PoseidonHash>(self.flatten_slots())
    }

    /// Applies `f(builder, element, index)` to every logical element. Slots
    /// past the length become null whatever `f` returns for them.
    pub fn map<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        mut f: impl FnMut(&mut CircuitBuilder<F, D>, &T, Target) -> T,
    ) -> Self {
        let mut mapped = self.clone();
        let null = T::null(builder);
        let mut before_end = builder._true();
        for (i, slot) in mapped.slots.iter_mut().enumerate() {
            let at_end = is_equal_constant(builder, self.length, i);
            let not_at_end = builder.not(at_end);
            before_end = builder.and(before_end, not_at_end);
            let index = builder.constant(F::from_canonical_usize(i));
            let image = f(builder, &*slot, index);
            *slot = T::select(builder, before_end, &image, &null);
        }
        mapped
    }

    /// All `CAP` slots as raw targets, without the length.
    pub fn flatten_slots(&self) -> Vec<Target> {
        self.slots.iter().flat_map(CircuitElement::flatten).collect()
    }

    /// Asserts that both arrays have the same length and the same slots.
    pub fn connect<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        other: &Self,
    ) {
        for (lhs, rhs) in self.flatten().into_iter().zip(other.flatten()) {
            builder.connect(lhs, rhs);
        }
    }

    /// Hash-based equality over the length and all slots.
    pub fn equals<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
        other: &Self,
    ) -> BoolTarget {
        elements_equal(builder, self, other)
    }

    /// Constrains every slot at or past `length` to be null.
    fn assert_padding_null<F: RichField + Extendable<D>, const D: usize>(
        &self,
        builder: &mut CircuitBuilder<F, D>,
    ) {
        let mut length_reached = builder._false();
        for (i, slot) in self.slots.iter().enumerate() {
            let at_length = is_equal_constant(builder, self.length, i);
            length_reached = builder.or(length_reached, at_length);
            for target in slot.flatten() {
                let padding = builder.mul(length_reached.target, target);
                builder.assert_zero(padding);
            }
        }
    }
}

impl<T, const CAP: usize> BoundedArrayTarget<T, CAP> {
    /// An array whose length and slots are supplied by the witness. The
    /// length is range checked and the padding is constrained to be null.
    pub fn add_virtual<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
    ) -> Self
    where
        T: WitnessElement<F>,
    {
        let length = builder.add_virtual_target();
        assert_in_range(builder, length, CAP);
        let slots = (0..CAP).map(|_| T::add_virtual(builder)).collect();
        let array = Self { length, slots };
        array.assert_padding_null(builder);
        array
    }

    pub fn set_targets<F: RichField>(
        &self,
        pw: &mut PartialWitness<F>,
        value: &BoundedArray<T::Value, CAP>,
    ) -> Result<()>
    where
        T: WitnessElement<F>,
    {
        self.set_witness(pw, value)?;
        Ok(())
    }
}

/// Serialized as `[length] ++ slots`.
impl<T: CircuitElement, const CAP: usize> CircuitElement for BoundedArrayTarget<T, CAP> {
    const SIZE: usize = 1 + CAP * T::SIZE;

    fn flatten(&self) -> Vec<Target> {
        std::iter::once(self.length)
            .chain(self.flatten_slots())
            .collect()
    }

    fn from_flattened<F: RichField + Extendable<D>, const D: usize>(
        builder: &mut CircuitBuilder<F, D>,
        targets: &[Target],
    ) -> Self {
        Self {
            length: targets[0],
            slots: targets[1..Self::SIZE]
                .chunks(T::SIZE)
                .map(|chunk| T::from_flattened(builder, chunk))
                .collect(),
        }
    }
}

impl<F: RichField, T: WitnessElement<F>, const CAP: usize> WitnessElement<F>
    for BoundedArrayTarget<T, CAP>
{
    type Value = BoundedArray<T::Value, CAP>;

    fn add_virtual<const D: usize>(builder: &mut CircuitBuilder<F, D>) -> Self
    where
        F: Extendable<D>,
    {
        BoundedArrayTarget::add_virtual(builder)
    }

    fn value_to_fields(value: &Self::Value) -> Vec<F> {
        std::iter::once(F::from_canonical_usize(value.length))
            .chain(value.slots.iter().flat_map(T::value_to_fields))
            .collect()
    }

    fn value_from_fields(fields: &[F]) -> Self::Value {
        BoundedArray {
            length: fields[0].to_canonical_u64() as usize,
            slots: fields[1..Self::SIZE]
                .chunks(T::SIZE)
                .map(T::value_from_fields)
                .collect(),
        }
    }
}

/// Host-side contents of a [`BoundedArrayTarget`].
///
/// Padding slots hold the null value of the element type, the value decoded
/// from all-zero fields. [`BoundedArray::from_values`] pads with
/// `V::default()`, which is that value for the native element types; curve
/// points go through [`BoundedArray::with_padding`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedArray<V, const CAP: usize> {
    length: usize,
    slots: Vec<V>,
}

impl<V: Clone, const CAP: usize> BoundedArray<V, CAP> {
    /// `values` followed by copies of `null` up to the capacity.
    pub fn with_padding(values: Vec<V>, null: V) -> Result<Self> {
        if values.len() > CAP {
            return Err(Error::CapacityExceeded {
                len: values.len(),
                capacity: CAP,
            });
        }
        let length = values.len();
        let mut slots = values;
        slots.resize(CAP, null);
        Ok(Self { length, slots })
    }
}

impl<V: Clone + Default, const CAP: usize> BoundedArray<V, CAP> {
    pub fn from_values(values: Vec<V>) -> Result<Self> {
        Self::with_padding(values, V::default())
    }

    pub fn empty() -> Self {
        Self {
            length: 0,
            slots: vec![V::default(); CAP],
        }
    }
}

impl<V, const CAP: usize> BoundedArray<V, CAP> {
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        CAP
    }

    /// The logical content.
    pub fn values(&self) -> &[V] {
        &self.slots[..self.length]
    }

    pub fn slots(&self) -> &[V] {
        &self.slots
    }
}

impl<V: Clone + Default, const CAP: usize> Default for BoundedArray<V, CAP> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Shows the logical content only.
impl<V: fmt::Display, const CAP: usize> fmt::Display for BoundedArray<V, CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.values().iter().join(", "))
    }
}

/// Native counterpart of [`BoundedArrayTarget::hash`].
pub fn hash_slots<F: RichField, T: WitnessElement<F>, const CAP: usize>(
    array: &BoundedArray<T::Value, CAP>,
) -> HashOut<F> {
    let fields: Vec<F> = array.slots.iter().flat_map(T::value_to_fields).collect();
    PoseidonHash::hash_no_pad(&fields)
}
