//! Oblivious selection and assertion helpers.
//!
//! Nothing here branches on a wire value: a choice among several options is
//! always a weighted sum over a boolean mask, so the number and kind of gates
//! depend only on the number of options.

use plonky2::{
    field::{extension::Extendable, types::Field},
    hash::hash_types::RichField,
    iop::target::{BoolTarget, Target},
    plonk::circuit_builder::CircuitBuilder,
};

use super::element::CircuitElement;

/// Computes `Σ mask[i] · options[i]` element-wise.
///
/// The result is the option under the single true mask bit as long as the
/// mask is one-hot; see [`assert_one_hot`].
pub fn select_by_mask<F: RichField + Extendable<D>, const D: usize, T: CircuitElement>(
    builder: &mut CircuitBuilder<F, D>,
    mask: &[BoolTarget],
    options: &[T],
) -> T {
    assert_eq!(mask.len(), options.len(), "one mask bit per option");
    let zero = builder.zero();
    let mut acc = vec![zero; T::SIZE];
    for (bit, option) in mask.iter().zip(options) {
        for (sum, target) in acc.iter_mut().zip(option.flatten()) {
            *sum = builder.mul_add(bit.target, target, *sum);
        }
    }
    T::from_flattened(builder, &acc)
}

/// Asserts that exactly one bit of `mask` is set.
pub fn assert_one_hot<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    mask: &[BoolTarget],
) {
    let active = builder.add_many(mask.iter().map(|bit| bit.target));
    let one = builder.one();
    builder.connect(active, one);
}

pub fn assert_true<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    b: BoolTarget,
) {
    let t = builder._true();
    builder.connect(b.target, t.target);
}

pub fn assert_false<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    b: BoolTarget,
) {
    builder.assert_zero(b.target);
}

/// `x == c` for a constant `c`.
pub fn is_equal_constant<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    x: Target,
    c: usize,
) -> BoolTarget {
    let c = builder.constant(F::from_canonical_usize(c));
    builder.is_equal(x, c)
}

/// Asserts `x ∈ {0, …, max}` by comparing against every candidate value.
pub fn assert_in_range<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    x: Target,
    max: usize,
) {
    let mut found = builder._false();
    for i in 0..=max {
        let matches = is_equal_constant(builder, x, i);
        found = builder.or(found, matches);
    }
    assert_true(builder, found);
}
