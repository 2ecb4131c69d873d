//! Test-only decoder that replays generated hex against the catalog.
//!
//! Used by the synthesizer tests to check that emitted programs are
//! well-formed: every byte decodes to a known instruction and the running
//! stack balance never goes negative.

use crate::catalog::Catalog;

/// One decoded instruction: the opcode byte plus its push immediate, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instr {
    pub opcode: u8,
    pub immediate: Vec<u8>,
}

pub fn bytes_from_hex(hex: &str) -> Vec<u8> {
    assert!(hex.len() % 2 == 0, "odd-length hex string");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("non-hex digit"))
        .collect()
}

/// Split a hex program into instructions, consuming push immediates.
pub fn decode(hex: &str) -> Vec<Instr> {
    let bytes = bytes_from_hex(hex);
    let mut instrs = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let opcode = bytes[i];
        i += 1;
        let width = if (0x60..=0x7f).contains(&opcode) {
            (opcode - 0x5f) as usize
        } else {
            0
        };
        assert!(i + width <= bytes.len(), "push immediate runs past the end");
        let immediate = bytes[i..i + width].to_vec();
        i += width;
        instrs.push(Instr { opcode, immediate });
    }
    instrs
}

/// Running stack balance after each instruction.
///
/// Panics on an opcode the catalog does not know, or on a balance that goes
/// negative (a stack underflow in the generated program).
pub fn stack_trace(instrs: &[Instr], catalog: &Catalog) -> Vec<i64> {
    let mut balance: i64 = 0;
    let mut trace = Vec::with_capacity(instrs.len());
    for instr in instrs {
        let (removed, added) = if (0x5f..=0x7f).contains(&instr.opcode) {
            (0, 1)
        } else {
            let op = catalog
                .get(instr.opcode as u16)
                .unwrap_or_else(|| panic!("unknown opcode {:#04x}", instr.opcode));
            (op.removed_from_stack as i64, op.added_to_stack as i64)
        };
        balance -= removed;
        assert!(
            balance >= 0,
            "stack underflow at opcode {:#04x}",
            instr.opcode
        );
        balance += added;
        trace.push(balance);
    }
    trace
}
