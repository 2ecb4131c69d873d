use crate::bytecode::asm::{self, Asm};
use crate::catalog::{Catalog, Selection};
use crate::synth::SynthError;
use rand::seq::SliceRandom;
use rand::Rng;

// =============================================================================
// RANDOM - randomized stack-consistent program synthesis
// =============================================================================
//
// Draws operations uniformly from fixed sampling classes, pushes whatever
// operands the drawn operation still needs, and tracks the returns the
// previous operation left on the stack. The emitted program never underflows
// the stack; in clean-stack mode it also ends with an empty stack.

const ARITHMETIC_OPS: [u16; 9] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];
const EXP_OPS: [u16; 1] = [0x0a];
const BITWISE_OPS: [u16; 4] = [0x16, 0x17, 0x18, 0x19];
// need a byte index in 0..=31 on top of the stack
const BYTE_OPS: [u16; 2] = [0x1a, 0x0b];
// need a shift amount in 0..=255 on top of the stack
const SHIFT_OPS: [u16; 3] = [0x1b, 0x1c, 0x1d];
const COMPARISON_OPS: [u16; 5] = [0x10, 0x11, 0x12, 0x13, 0x14];
const ISZERO_OPS: [u16; 1] = [0x15];
const NULLARY_OPS: [u16; 16] = [
    0x30, 0x32, 0x33, 0x34, 0x38, 0x3a, 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47, 0x58, 0x59,
    0x5a,
];
const POP_OPS: [u16; 1] = [0x50];
const JUMPDEST_OPS: [u16; 1] = [0x5b];

/// Arguments of one randomized synthesis call.
///
/// At least one of `ops_limit` and `bytecode_limit` must be set; the caller
/// defaults `ops_limit` when neither is given on the command line.
#[derive(Debug, Clone)]
pub struct RandomParams {
    /// Instruction-count limit, pushes and cleanup POPs included.
    pub ops_limit: Option<u32>,
    /// Byte-length limit of the emitted code.
    pub bytecode_limit: Option<usize>,
    /// Mnemonic drawn with probability one half ahead of the uniform draw.
    pub dominant: Option<String>,
    /// Width of operand push immediates, in 1..=32.
    pub push_width: u8,
    /// Pop every operation's results so each iteration starts from an empty
    /// stack.
    pub clean_stack: bool,
    /// Draw each operand's width uniformly from 1..=push_width instead of
    /// always using push_width.
    pub randomize_push_width: bool,
}

/// One drawable entry. DUPs and SWAPs would overwhelm the universe if every
/// depth were an entry of its own, so each family is one class entry and the
/// depth is drawn only after the class is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Op(u16),
    DupClass,
    SwapClass,
}

/// The sampling universe: the fixed class lists filtered by the selection.
#[derive(Debug, Clone)]
struct Universe {
    entries: Vec<Entry>,
    dup_ids: Vec<u16>,
    swap_ids: Vec<u16>,
}

impl Universe {
    fn build(selection: &Selection) -> Result<Self, SynthError> {
        let mut entries: Vec<Entry> = ARITHMETIC_OPS
            .iter()
            .chain(&EXP_OPS)
            .chain(&BITWISE_OPS)
            .chain(&BYTE_OPS)
            .chain(&SHIFT_OPS)
            .chain(&COMPARISON_OPS)
            .chain(&ISZERO_OPS)
            .chain(&NULLARY_OPS)
            .chain(&POP_OPS)
            .chain(&JUMPDEST_OPS)
            .copied()
            .filter(|&id| selection.contains(id))
            .map(Entry::Op)
            .collect();

        let dup_ids: Vec<u16> = (0x80..=0x8f).filter(|&id| selection.contains(id)).collect();
        let swap_ids: Vec<u16> = (0x90..=0x9f).filter(|&id| selection.contains(id)).collect();
        if !dup_ids.is_empty() {
            entries.push(Entry::DupClass);
        }
        if !swap_ids.is_empty() {
            entries.push(Entry::SwapClass);
        }

        if entries.is_empty() {
            return Err(SynthError::EmptyUniverse);
        }
        Ok(Self {
            entries,
            dup_ids,
            swap_ids,
        })
    }

    fn draw<R: Rng>(&self, rng: &mut R) -> u16 {
        let entry = *self.entries.choose(rng).expect("universe is non-empty");
        self.resolve(entry, rng)
    }

    fn resolve<R: Rng>(&self, entry: Entry, rng: &mut R) -> u16 {
        match entry {
            Entry::Op(id) => id,
            Entry::DupClass => *self.dup_ids.choose(rng).expect("class entry implies ids"),
            Entry::SwapClass => *self.swap_ids.choose(rng).expect("class entry implies ids"),
        }
    }
}

/// Generate one random program. Returns the hex bytecode and the emitted
/// instruction count.
///
/// Iterations are atomic: an operation and its operand pushes are committed
/// together or not at all. The first iteration always commits, so a limit
/// smaller than one full iteration still yields one operation; after that,
/// an iteration that would cross a limit is discarded and generation stops.
pub fn synthesize<R: Rng>(
    catalog: &Catalog,
    selection: &Selection,
    params: &RandomParams,
    rng: &mut R,
) -> Result<(String, u32), SynthError> {
    assert!(
        params.ops_limit.is_some() || params.bytecode_limit.is_some(),
        "at least one limit must be set"
    );
    if !(1..=32).contains(&params.push_width) {
        return Err(SynthError::PushWidthOutOfRange(params.push_width));
    }

    let universe = Universe::build(selection)?;
    let dominant = match &params.dominant {
        Some(mnemonic) => {
            let op = catalog
                .by_mnemonic(mnemonic)
                .filter(|op| universe.entries.contains(&Entry::Op(op.id)))
                .ok_or_else(|| SynthError::UnknownDominant(mnemonic.clone()))?;
            Some(op.id)
        }
        None => None,
    };

    let mut program = Asm::new();
    // returns the previous operation left on the stack; only ever one
    // operation deep
    let mut pending_returns: u32 = 0;

    loop {
        let id = match dominant {
            Some(id) if rng.gen_bool(0.5) => id,
            _ => universe.draw(rng),
        };
        let op = catalog.get(id).expect("universe ids are catalog-checked");

        let mut step = Asm::new();
        let carried = if params.clean_stack { 0 } else { pending_returns };
        if BYTE_OPS.contains(&id) {
            if carried == 0 {
                random_push(&mut step, rng, params.push_width, params.randomize_push_width);
            }
            step.push(&[rng.gen_range(0..=31u8)]);
        } else if SHIFT_OPS.contains(&id) {
            if carried == 0 {
                random_push(&mut step, rng, params.push_width, params.randomize_push_width);
            }
            random_push(&mut step, rng, 1, false);
        } else {
            for _ in 0..op.removed_from_stack.saturating_sub(carried) {
                random_push(&mut step, rng, params.push_width, params.randomize_push_width);
            }
        }
        step.op(op.encoded);
        if params.clean_stack {
            for _ in 0..op.added_to_stack {
                step.op(asm::POP);
            }
        }

        let fits_ops = params
            .ops_limit
            .is_none_or(|limit| program.instruction_count() + step.instruction_count() <= limit);
        let fits_bytes = params
            .bytecode_limit
            .is_none_or(|limit| program.byte_len() + step.byte_len() <= limit);
        let first = program.instruction_count() == 0;
        if !fits_ops || !fits_bytes {
            if first {
                program.extend(&step);
            }
            break;
        }

        program.extend(&step);
        if !params.clean_stack {
            pending_returns = op.added_to_stack;
        }
    }

    Ok((program.to_hex(), program.instruction_count()))
}

fn random_push<R: Rng>(step: &mut Asm, rng: &mut R, push_width: u8, randomize: bool) {
    let width = if randomize {
        rng.gen_range(1..=push_width)
    } else {
        push_width
    };
    let mut immediate = vec![0u8; width as usize];
    rng.fill_bytes(&mut immediate);
    step.push(&immediate);
}
