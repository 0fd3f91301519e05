use std::panic::{self, AssertUnwindSafe};

use plonky2::{
    field::types::Field,
    iop::{target::Target, witness::PartialWitness},
    plonk::{circuit_builder::CircuitBuilder, circuit_data::CircuitData},
};

use crate::{C, D, F};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Whether `pw` extends to a witness that proves and verifies.
///
/// Conflicting copy constraints surface as an error or a panic during witness
/// generation depending on where they are detected; both count as
/// unsatisfiable.
pub(crate) fn is_satisfiable(data: &CircuitData<F, C, D>, pw: PartialWitness<F>) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| data.prove(pw))) {
        Ok(Ok(proof)) => data.verify(proof).is_ok(),
        _ => false,
    }
}

pub(crate) fn fields(values: &[u64]) -> Vec<F> {
    values.iter().map(|&v| F::from_canonical_u64(v)).collect()
}

pub(crate) fn constants(builder: &mut CircuitBuilder<F, D>, values: &[u64]) -> Vec<Target> {
    values
        .iter()
        .map(|&v| builder.constant(F::from_canonical_u64(v)))
        .collect()
}
