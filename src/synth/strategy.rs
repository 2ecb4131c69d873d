use crate::bytecode::asm::{self, Asm};
use crate::catalog::Operation;
use std::collections::HashMap;
use std::sync::LazyLock;

// =============================================================================
// STRATEGY - per-opcode-class isolation program templates
// =============================================================================
//
// Every strategy builds one program for (operation, op_count, max_op_count)
// such that the program's byte length and instruction count are the same for
// every op_count in 0..=max_op_count. Only the ratio of real occurrences of
// the measured operation to equally-sized filler changes, which is what makes
// comparing outputs across op_count a valid marginal-cost measurement.

/// A bytecode template for one class of operations.
pub trait Strategy: Send + Sync {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm;
}

static REGISTRY: LazyLock<HashMap<&'static str, Box<dyn Strategy>>> = LazyLock::new(|| {
    let mut registry: HashMap<&'static str, Box<dyn Strategy>> = HashMap::new();
    registry.insert("KECCAK256", Box::new(Keccak256));
    registry.insert("MCOPY", Box::new(MCopy));
    registry.insert("TLOAD", Box::new(TransientLoad));
    registry.insert("TSTORE", Box::new(TransientStore { fresh_slot: false }));
    registry.insert("TSTORE0", Box::new(TransientStore { fresh_slot: true }));
    registry.insert("CREATE", Box::new(Create));
    registry.insert("EXTCODESIZE", Box::new(ExtCode));
    registry.insert("EXTCODEHASH", Box::new(ExtCode));
    for name in ["CALL", "STATICCALL", "DELEGATECALL"] {
        registry.insert(name, Box::new(CallOp));
    }
    registry.insert("EXTCODECOPY", Box::new(ExtCodeCopy));
    for name in ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"] {
        registry.insert(name, Box::new(Log));
    }
    for name in ["RETURN", "REVERT", "TLOAD_EXT", "TSTORE_EXT"] {
        registry.insert(name, Box::new(SubcontextPair));
    }
    registry
});

/// Look up the template for a mnemonic; plain operations fall back to the
/// generic padding-to-constant template.
pub fn strategy_for(mnemonic: &str) -> &'static dyn Strategy {
    static DEFAULT: PaddedSlots = PaddedSlots;
    match REGISTRY.get(mnemonic) {
        Some(strategy) => strategy.as_ref(),
        None => &DEFAULT,
    }
}

// =============================================================================
// Shared assembly helpers
// =============================================================================

/// Init code that returns `runtime` as the deployed account code.
///
/// The runtime is stored right-aligned in memory word 0 of the creation
/// context and returned from there.
fn init_code(runtime: &[u8]) -> Asm {
    assert!(!runtime.is_empty() && runtime.len() <= 24, "runtime too long");
    let len = runtime.len() as u8;
    let mut code = Asm::new();
    code.push(runtime);
    code.push0();
    code.op(asm::MSTORE);
    code.push1(len); // size
    code.push1(32 - len); // offset
    code.op(asm::RETURN);
    code
}

/// Store `init` right-aligned in memory word 0 and CREATE an account from
/// it. Leaves the new account's address on the stack.
fn deploy(program: &mut Asm, init: &Asm) {
    let len = init.byte_len() as u8;
    program.push(init.code());
    program.push0();
    program.op(asm::MSTORE);
    program.push1(len); // size
    program.push1(32 - len); // offset
    program.push0(); // value
    program.op(asm::CREATE);
}

/// The padding-to-constant slot body.
///
/// Emits one operand tuple per potential invocation (`operands` is called
/// `max_op_count` times), then `op_count` real slots and the rest filler
/// slots. Every slot consumes exactly `arity_in` pooled operands and has
/// identical byte and instruction length, so the program stays balanced and
/// its total length does not depend on `op_count`.
fn padded_slots(
    program: &mut Asm,
    op: &Operation,
    op_count: u32,
    max_op_count: u32,
    operands: impl Fn(&mut Asm, u32),
) {
    for slot in 0..max_op_count {
        operands(program, slot);
    }

    let arity_in = op.removed_from_stack;
    let arity_out = op.added_to_stack;
    let immediate = op.immediate_size.unwrap_or(0) as usize;
    let slot_instrs = (1 + arity_out).max(arity_in);

    for _ in 0..op_count {
        if immediate > 0 {
            program.push(&vec![0u8; immediate]);
        } else {
            program.op(op.encoded);
        }
        for _ in 0..arity_out {
            program.op(asm::POP);
        }
        for _ in 0..slot_instrs - 1 - arity_out {
            program.op(asm::JUMPDEST);
        }
    }
    for _ in op_count..max_op_count {
        for _ in 0..arity_in {
            program.op(asm::POP);
        }
        let mut padding = slot_instrs - arity_in;
        if immediate > 0 {
            // mirror the measured push's immediate, byte for byte
            program.push(&vec![0u8; immediate]);
            program.op(asm::POP);
            padding -= 2;
        }
        for _ in 0..padding {
            program.op(asm::JUMPDEST);
        }
    }
}

/// A run of JUMPDESTs standing in for a real invocation sequence of `len`
/// single-byte instructions.
fn jumpdest_filler(program: &mut Asm, len: u32) {
    for _ in 0..len {
        program.op(asm::JUMPDEST);
    }
}

// =============================================================================
// Padding-to-constant family
// =============================================================================

/// Plain arithmetic/stack/context operations: constant operands, no setup.
struct PaddedSlots;

impl Strategy for PaddedSlots {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm {
        let mut program = Asm::new();
        padded_slots(&mut program, op, op_count, max_op_count, |program, _| {
            for _ in 0..op.removed_from_stack {
                program.push1(0x03);
            }
        });
        program
    }
}

/// KECCAK256 over the first memory word, pre-filled so the hash reads
/// initialized memory.
struct Keccak256;

impl Strategy for Keccak256 {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm {
        let mut program = Asm::new();
        program.push(&[0xff; 32]);
        program.push0();
        program.op(asm::MSTORE);
        padded_slots(&mut program, op, op_count, max_op_count, |program, _| {
            program.push1(0x20); // size
            program.push0(); // offset
        });
        program
    }
}

/// MCOPY of the last byte of the first memory word onto its first byte, so
/// the copy itself never expands memory.
struct MCopy;

impl Strategy for MCopy {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm {
        let mut program = Asm::new();
        program.push1(0xff);
        program.push0();
        program.op(asm::MSTORE);
        padded_slots(&mut program, op, op_count, max_op_count, |program, _| {
            program.push1(0x01); // length
            program.push1(0x1f); // source offset
            program.push0(); // destination offset
        });
        program
    }
}

/// TLOAD of one transient slot written in the preamble.
struct TransientLoad;

impl Strategy for TransientLoad {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm {
        let mut program = Asm::new();
        program.push1(0xff); // value
        program.push1(0xff); // key
        program.op(asm::TSTORE);
        padded_slots(&mut program, op, op_count, max_op_count, |program, _| {
            program.push1(0xff);
        });
        program
    }
}

/// TSTORE, either rewriting one slot (`TSTORE`) or touching a fresh slot on
/// every invocation (`TSTORE0`).
struct TransientStore {
    fresh_slot: bool,
}

impl Strategy for TransientStore {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm {
        let mut program = Asm::new();
        padded_slots(&mut program, op, op_count, max_op_count, |program, slot| {
            // values start at 16 so every invocation stores a distinct,
            // non-zero byte
            let value = 16 + slot as u8;
            program.push1(value);
            program.push1(if self.fresh_slot { value } else { 0x01 }); // key
        });
        program
    }
}

/// CREATE from init code staged in memory by the preamble.
struct Create;

impl Strategy for Create {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm {
        let init = init_code(&[0x00]); // deployed code: a single STOP
        let len = init.byte_len() as u8;

        let mut program = Asm::new();
        program.push(init.code());
        program.push0();
        program.op(asm::MSTORE);
        padded_slots(&mut program, op, op_count, max_op_count, |program, _| {
            program.push1(len); // size
            program.push1(32 - len); // offset
            program.push0(); // value
        });
        program
    }
}

// =============================================================================
// Deployment-harness family
// =============================================================================

/// EXTCODESIZE/EXTCODEHASH against one deployed account whose address stays
/// on the stack and is duplicated per invocation.
struct ExtCode;

impl Strategy for ExtCode {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm {
        let mut program = Asm::new();
        deploy(&mut program, &init_code(&[0x00]));
        for _ in 0..op_count {
            program.op(asm::dup(1)); // address
            program.op(op.encoded);
            program.op(asm::POP);
        }
        for _ in op_count..max_op_count {
            jumpdest_filler(&mut program, 3);
        }
        program.op(asm::POP); // the address
        program
    }
}

/// EXTCODECOPY of one word of a deployed account's code into already-touched
/// memory. The argument window sits below the invocations and is duplicated
/// with single-byte DUPs.
struct ExtCodeCopy;

impl Strategy for ExtCodeCopy {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm {
        let mut program = Asm::new();
        deploy(&mut program, &init_code(&[0x00]));
        program.push1(0x20); // length
        program.push0(); // offset
        program.push0(); // destination offset
        for _ in 0..op_count {
            program.op(asm::dup(3)); // length
            program.op(asm::dup(3)); // offset
            program.op(asm::dup(3)); // destination offset
            program.op(asm::dup(7)); // address
            program.op(op.encoded);
        }
        for _ in op_count..max_op_count {
            jumpdest_filler(&mut program, 5);
        }
        for _ in 0..4 {
            program.op(asm::POP);
        }
        program
    }
}

/// CALL/STATICCALL/DELEGATECALL into one deployed account. The full argument
/// window is pushed once; each real invocation duplicates it with
/// single-byte DUPs so real and filler sequences stay byte-for-byte equal in
/// length.
struct CallOp;

impl Strategy for CallOp {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm {
        let window = op.removed_from_stack; // 7 for CALL, 6 otherwise
        let mut program = Asm::new();
        deploy(&mut program, &init_code(&[0x00]));
        program.push0(); // ret length
        program.push0(); // ret offset
        program.push1(0x20); // args length
        program.push0(); // args offset
        if window == 7 {
            program.push0(); // value
            program.op(asm::dup(6)); // address
        } else {
            program.op(asm::dup(5)); // address
        }
        program.push(&[0xff, 0xff]); // gas

        for _ in 0..op_count {
            for _ in 0..window {
                program.op(asm::dup(window));
            }
            program.op(op.encoded);
            program.op(asm::POP); // call status
        }
        for _ in op_count..max_op_count {
            jumpdest_filler(&mut program, window + 2);
        }
        for _ in 0..window + 1 {
            program.op(asm::POP);
        }
        program
    }
}

/// LOG0..LOG4 over the pre-filled first memory word. Topic and range
/// arguments are pushed once and duplicated per invocation.
struct Log;

impl Strategy for Log {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm {
        let window = op.removed_from_stack; // topics + offset/size pair
        let mut program = Asm::new();
        program.push(&[0xff; 32]);
        program.push0();
        program.op(asm::MSTORE);
        for _ in 0..window - 2 {
            program.push1(0xff); // topic
        }
        program.push1(0x20); // size
        program.push0(); // offset

        for _ in 0..op_count {
            for _ in 0..window {
                program.op(asm::dup(window));
            }
            program.op(op.encoded);
        }
        for _ in op_count..max_op_count {
            jumpdest_filler(&mut program, window + 1);
        }
        for _ in 0..window {
            program.op(asm::POP);
        }
        program
    }
}

/// Operations observable only from inside an entered context: subcontext
/// exits (RETURN/REVERT) and the transient-storage measurement variants.
///
/// Two accounts are deployed whose runtimes are byte-for-byte equal in
/// length and instruction count and differ only in the measured operation
/// vs. a JUMPDEST placeholder. Real invocations enter the first account,
/// substitutes the second, through byte-identical call sequences.
struct SubcontextPair;

impl SubcontextPair {
    fn runtimes(op: &Operation) -> (Vec<u8>, Vec<u8>) {
        match op.mnemonic.as_str() {
            // exit with an empty range; the substitute falls through to the
            // implicit stop
            "RETURN" | "REVERT" => (
                vec![asm::PUSH0, asm::PUSH0, op.encoded],
                vec![asm::PUSH0, asm::PUSH0, asm::JUMPDEST],
            ),
            "TLOAD_EXT" => (
                vec![0x60, 0xff, op.encoded, asm::POP],
                vec![0x60, 0xff, asm::JUMPDEST, asm::JUMPDEST],
            ),
            "TSTORE_EXT" => (
                vec![0x60, 0x01, 0x60, 0xff, op.encoded],
                vec![0x60, 0x01, 0x60, 0xff, asm::JUMPDEST],
            ),
            other => unreachable!("no subcontext pair for '{}'", other),
        }
    }

    /// Call the account whose address is stored at memory `slot`.
    fn enter(program: &mut Asm, slot: u8, call_op: u8) {
        program.push0(); // ret length
        program.push0(); // ret offset
        program.push0(); // args length
        program.push0(); // args offset
        if call_op == asm::CALL {
            program.push0(); // value
        }
        program.push1(slot);
        program.op(asm::MLOAD); // callee address
        program.push(&[0xff, 0xff]); // gas
        program.op(call_op);
        program.op(asm::POP); // call status
    }
}

impl Strategy for SubcontextPair {
    fn synthesize(&self, op: &Operation, op_count: u32, max_op_count: u32) -> Asm {
        let (real, substitute) = Self::runtimes(op);
        let call_op = match op.mnemonic.as_str() {
            // the transient variants mutate state in the callee
            "TLOAD_EXT" | "TSTORE_EXT" => asm::CALL,
            _ => asm::STATICCALL,
        };

        let mut program = Asm::new();
        deploy(&mut program, &init_code(&real));
        program.push1(0x40);
        program.op(asm::MSTORE);
        deploy(&mut program, &init_code(&substitute));
        program.push1(0x60);
        program.op(asm::MSTORE);

        for _ in 0..op_count {
            Self::enter(&mut program, 0x40, call_op);
        }
        for _ in op_count..max_op_count {
            Self::enter(&mut program, 0x60, call_op);
        }
        program
    }
}

#[cfg(test)]
pub(crate) fn subcontext_runtimes(op: &Operation) -> (Vec<u8>, Vec<u8>) {
    SubcontextPair::runtimes(op)
}
