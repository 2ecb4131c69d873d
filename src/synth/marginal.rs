use crate::catalog::{Catalog, Operation, Selection};
use crate::program::Program;
use crate::synth::strategy::strategy_for;
use crate::synth::{SynthError, MAX_INSTRUCTIONS};
use rand::seq::SliceRandom;
use rand::Rng;

// =============================================================================
// MARGINAL - isolation-harness program sweeps
// =============================================================================

/// Arguments of one isolation sweep.
#[derive(Debug, Clone)]
pub struct MarginalParams {
    /// Restrict the sweep to one mnemonic; `None` sweeps the whole selection.
    pub opcode: Option<String>,
    pub max_op_count: u32,
    pub step_op_count: u32,
    /// Shuffle the repetition counts so measurement order and repetition
    /// count are uncorrelated.
    pub shuffle_counts: bool,
}

/// Build the isolation program repeating `op` exactly `op_count` times.
///
/// Program shape is a pure function of the arguments; for a fixed
/// `max_op_count`, byte length and instruction count do not depend on
/// `op_count`.
pub fn synthesize(op: &Operation, op_count: u32, max_op_count: u32) -> Program {
    assert!(
        op_count <= max_op_count,
        "op_count {} exceeds max_op_count {}",
        op_count,
        max_op_count
    );
    assert!(
        max_op_count <= MAX_INSTRUCTIONS,
        "max_op_count {} exceeds the instruction ceiling {}",
        max_op_count,
        MAX_INSTRUCTIONS
    );

    let code = strategy_for(&op.mnemonic).synthesize(op, op_count, max_op_count);
    Program {
        bytecode: code.to_hex(),
        label: op.mnemonic.clone(),
        op_count,
    }
}

/// Sweep `op_count = 0, step, 2·step, … ≤ max_op_count` for every operation
/// in scope, in catalog order.
///
/// The count list is drawn up once and, when shuffling is on, permuted once
/// with `rng`; every operation then reuses the same order.
pub fn sweep<R: Rng>(
    catalog: &Catalog,
    selection: &Selection,
    params: &MarginalParams,
    rng: &mut R,
) -> Result<Vec<Program>, SynthError> {
    assert!(params.step_op_count >= 1, "step_op_count must be positive");

    let operations: Vec<&Operation> = match &params.opcode {
        Some(mnemonic) => {
            let op = catalog
                .by_mnemonic(mnemonic)
                .filter(|op| selection.contains(op.id))
                .ok_or_else(|| SynthError::UnknownOpcode(mnemonic.clone()))?;
            vec![op]
        }
        None => selection
            .iter()
            .map(|id| catalog.get(id).expect("selection is catalog-checked"))
            .collect(),
    };

    let mut op_counts: Vec<u32> = (0..=params.max_op_count)
        .step_by(params.step_op_count as usize)
        .collect();
    if params.shuffle_counts {
        op_counts.shuffle(rng);
    }

    let mut programs = Vec::with_capacity(operations.len() * op_counts.len());
    for op in operations {
        for &op_count in &op_counts {
            programs.push(synthesize(op, op_count, params.max_op_count));
        }
    }
    Ok(programs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_catalog() -> Catalog {
        Catalog::load(concat!(env!("CARGO_MANIFEST_DIR"), "/data/opcodes.csv")).unwrap()
    }

    fn test_selection(catalog: &Catalog) -> Selection {
        Selection::load(
            concat!(env!("CARGO_MANIFEST_DIR"), "/data/selection.csv"),
            catalog,
        )
        .unwrap()
    }

    fn params(opcode: Option<&str>) -> MarginalParams {
        MarginalParams {
            opcode: opcode.map(str::to_string),
            max_op_count: 10,
            step_op_count: 5,
            shuffle_counts: false,
        }
    }

    #[test]
    fn test_single_opcode_sweep_covers_all_counts() {
        let catalog = test_catalog();
        let selection = test_selection(&catalog);
        let mut rng = StdRng::seed_from_u64(0);

        let programs = sweep(&catalog, &selection, &params(Some("ADD")), &mut rng).unwrap();

        let counts: Vec<u32> = programs.iter().map(|p| p.op_count).collect();
        assert_eq!(counts, [0, 5, 10]);
        assert!(programs.iter().all(|p| p.label == "ADD"));
    }

    #[test]
    fn test_full_sweep_emits_every_selected_operation() {
        let catalog = test_catalog();
        let selection = test_selection(&catalog);
        let mut rng = StdRng::seed_from_u64(0);

        let programs = sweep(&catalog, &selection, &params(None), &mut rng).unwrap();

        assert_eq!(programs.len(), selection.iter().count() * 3);
        for id in selection.iter() {
            let mnemonic = &catalog.get(id).unwrap().mnemonic;
            assert_eq!(
                programs.iter().filter(|p| &p.label == mnemonic).count(),
                3,
                "{}",
                mnemonic
            );
        }
    }

    #[test]
    fn test_shuffle_reorders_counts_consistently() {
        let catalog = test_catalog();
        let selection = test_selection(&catalog);
        let shuffled = MarginalParams {
            shuffle_counts: true,
            max_op_count: 50,
            ..params(None)
        };

        let mut rng = StdRng::seed_from_u64(7);
        let programs = sweep(&catalog, &selection, &shuffled, &mut rng).unwrap();

        let per_op = 11; // 0..=50 step 5
        let first: Vec<u32> = programs[..per_op].iter().map(|p| p.op_count).collect();
        let mut sorted = first.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..=50).step_by(5).collect::<Vec<u32>>());

        // every operation sees the same permutation
        for chunk in programs.chunks(per_op) {
            let counts: Vec<u32> = chunk.iter().map(|p| p.op_count).collect();
            assert_eq!(counts, first);
        }

        // same seed, same permutation
        let mut rng = StdRng::seed_from_u64(7);
        let again = sweep(&catalog, &selection, &shuffled, &mut rng).unwrap();
        assert_eq!(programs, again);
    }

    #[test]
    fn test_unknown_mnemonic_is_an_error() {
        let catalog = test_catalog();
        let selection = test_selection(&catalog);
        let mut rng = StdRng::seed_from_u64(0);

        let result = sweep(&catalog, &selection, &params(Some("NOSUCH")), &mut rng);
        assert!(matches!(result, Err(SynthError::UnknownOpcode(_))));
    }

    #[test]
    #[should_panic]
    fn test_op_count_above_max_panics() {
        let catalog = test_catalog();
        let add = catalog.by_mnemonic("ADD").unwrap();
        synthesize(add, 11, 10);
    }

    #[test]
    #[should_panic]
    fn test_max_above_instruction_ceiling_panics() {
        let catalog = test_catalog();
        let add = catalog.by_mnemonic("ADD").unwrap();
        synthesize(add, 0, MAX_INSTRUCTIONS + 1);
    }
}
