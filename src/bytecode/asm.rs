// =============================================================================
// ASM - append-only EVM bytecode buffer
// =============================================================================

// Opcode bytes the synthesizers emit structurally, independent of the
// operation catalog.
pub const POP: u8 = 0x50;
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const JUMPDEST: u8 = 0x5b;
pub const TSTORE: u8 = 0x5d;
pub const PUSH0: u8 = 0x5f;
pub const CREATE: u8 = 0xf0;
pub const CALL: u8 = 0xf1;
pub const RETURN: u8 = 0xf3;
pub const STATICCALL: u8 = 0xfa;

/// `DUPn` opcode byte for a depth in 1..=16.
pub const fn dup(depth: u32) -> u8 {
    assert!(depth >= 1 && depth <= 16);
    0x80 + depth as u8 - 1
}

/// `SWAPn` opcode byte for a depth in 1..=16.
pub const fn swap(depth: u32) -> u8 {
    assert!(depth >= 1 && depth <= 16);
    0x90 + depth as u8 - 1
}

/// An append-only bytecode buffer.
///
/// Every emission goes through here so that byte length and instruction
/// count are tracked in exactly one place. A PUSH and its immediate count as
/// one instruction, matching how the generators report program sizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Asm {
    code: Vec<u8>,
    instructions: u32,
}

impl Asm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bare opcode byte.
    pub fn op(&mut self, opcode: u8) {
        self.code.push(opcode);
        self.instructions += 1;
    }

    /// Append a `PUSH1`..`PUSH32` carrying the given immediate bytes.
    pub fn push(&mut self, immediate: &[u8]) {
        assert!(
            !immediate.is_empty() && immediate.len() <= 32,
            "push immediate must be 1..=32 bytes, got {}",
            immediate.len()
        );
        self.code.push(0x60 + immediate.len() as u8 - 1);
        self.code.extend_from_slice(immediate);
        self.instructions += 1;
    }

    /// Append a `PUSH0`.
    pub fn push0(&mut self) {
        self.op(PUSH0);
    }

    /// Append a `PUSH1` of a single byte value.
    pub fn push1(&mut self, value: u8) {
        self.push(&[value]);
    }

    /// Append another buffer, carrying its instruction count over.
    pub fn extend(&mut self, other: &Asm) {
        self.code.extend_from_slice(&other.code);
        self.instructions += other.instructions;
    }

    pub fn byte_len(&self) -> usize {
        self.code.len()
    }

    pub fn instruction_count(&self) -> u32 {
        self.instructions
    }

    /// The raw code bytes, e.g. for embedding as a push immediate.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Render as a string of lowercase hexadecimal byte pairs.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.code.len() * 2);
        for byte in &self.code {
            out.push_str(&format!("{:02x}", byte));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_appends_single_byte() {
        let mut asm = Asm::new();
        asm.op(POP);
        asm.op(JUMPDEST);

        assert_eq!(asm.to_hex(), "505b");
        assert_eq!(asm.byte_len(), 2);
        assert_eq!(asm.instruction_count(), 2);
    }

    #[test]
    fn test_push_encodes_width_in_opcode() {
        let mut asm = Asm::new();
        asm.push(&[0x03]);
        asm.push(&[0xff, 0xff]);

        // PUSH1 03, PUSH2 ffff
        assert_eq!(asm.to_hex(), "600361ffff");
        assert_eq!(asm.instruction_count(), 2);
    }

    #[test]
    fn test_push32_uses_top_of_push_range() {
        let mut asm = Asm::new();
        asm.push(&[0xab; 32]);

        assert!(asm.to_hex().starts_with("7fab"));
        assert_eq!(asm.byte_len(), 33);
        assert_eq!(asm.instruction_count(), 1);
    }

    #[test]
    #[should_panic]
    fn test_push_rejects_oversized_immediate() {
        let mut asm = Asm::new();
        asm.push(&[0u8; 33]);
    }

    #[test]
    fn test_extend_carries_instruction_count() {
        let mut a = Asm::new();
        a.push1(0x01);
        let mut b = Asm::new();
        b.op(POP);
        b.op(POP);

        a.extend(&b);
        assert_eq!(a.instruction_count(), 3);
        assert_eq!(a.to_hex(), "60015050");
    }

    #[test]
    fn test_dup_swap_encoding() {
        assert_eq!(dup(1), 0x80);
        assert_eq!(dup(16), 0x8f);
        assert_eq!(swap(1), 0x90);
        assert_eq!(swap(16), 0x9f);
    }
}
