use plonky2::{
    field::extension::Extendable,
    hash::hash_types::RichField,
    iop::target::BoolTarget,
    plonk::circuit_builder::CircuitBuilder,
};
use plonky2_u32::gadgets::arithmetic_u32::U32Target;

pub const LIMB_BITS: usize = 32;

/// Splits little-endian u32 limbs into little-endian bits. The split range
/// checks every limb.
pub fn limbs_to_bits_le<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    limbs: &[U32Target],
) -> Vec<BoolTarget> {
    limbs
        .iter()
        .flat_map(|limb| builder.split_le(limb.0, LIMB_BITS))
        .collect()
}

/// Packs little-endian bits into little-endian u32 limbs; the last limb may
/// be narrower.
pub fn bits_to_limbs_le<F: RichField + Extendable<D>, const D: usize>(
    builder: &mut CircuitBuilder<F, D>,
    bits: &[BoolTarget],
) -> Vec<U32Target> {
    bits.chunks(LIMB_BITS)
        .map(|chunk| U32Target(builder.le_sum(chunk.iter())))
        .collect()
}

#[cfg(test)]
mod tests {
    use plonky2::{
        field::types::Field,
        iop::witness::{PartialWitness, WitnessWrite},
    };

    use super::*;
    use crate::{C, D, F, circuit_config, test_utils::is_satisfiable};

    #[test]
    fn test_limbs_bits_round_trip() -> anyhow::Result<()> {
        let mut builder = CircuitBuilder::<F, D>::new(circuit_config());
        let limbs: Vec<U32Target> = builder
            .add_virtual_targets(2)
            .into_iter()
            .map(U32Target)
            .collect();
        let bits = limbs_to_bits_le(&mut builder, &limbs);
        assert_eq!(bits.len(), 2 * LIMB_BITS);
        let packed = bits_to_limbs_le(&mut builder, &bits);
        for (l, p) in limbs.iter().zip(packed.iter()) {
            builder.connect(l.0, p.0);
        }
        // Bit 1 of the first limb.
        builder.register_public_input(bits[1].target);
        let data = builder.build::<C>();

        let mut pw = PartialWitness::new();
        pw.set_target(limbs[0].0, F::from_canonical_u32(0b10))?;
        pw.set_target(limbs[1].0, F::from_canonical_u32(u32::MAX))?;
        let proof = data.prove(pw)?;
        assert_eq!(proof.public_inputs, vec![F::ONE]);
        data.verify(proof)?;

        let mut pw = PartialWitness::new();
        pw.set_target(limbs[0].0, F::from_canonical_u64(1 << 32))?;
        pw.set_target(limbs[1].0, F::ZERO)?;
        assert!(!is_satisfiable(&data, pw));
        Ok(())
    }
}
