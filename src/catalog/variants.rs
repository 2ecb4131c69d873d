use crate::catalog::operation::Operation;

// =============================================================================
// VARIANTS - derived PUSH/DUP/SWAP sub-catalog
// =============================================================================
//
// The tabular source only lists operations with a single form. The
// width/depth-indexed families are derived here with a fixed formula mapping
// the index to encoded value and arity. Pure derivation, no I/O.

/// `PUSH1..=PUSH32`, `DUP1..=DUP16` and `SWAP1..=SWAP16`.
pub fn derived() -> Vec<Operation> {
    let mut ops = Vec::with_capacity(32 + 16 + 16);

    for width in 1u16..=32 {
        ops.push(Operation {
            id: 0x60 + width - 1,
            mnemonic: format!("PUSH{}", width),
            encoded: 0x60 + width as u8 - 1,
            removed_from_stack: 0,
            added_to_stack: 1,
            immediate_size: Some(width as u8),
        });
    }

    for depth in 1u16..=16 {
        ops.push(Operation {
            id: 0x80 + depth - 1,
            mnemonic: format!("DUP{}", depth),
            encoded: 0x80 + depth as u8 - 1,
            removed_from_stack: depth as u32,
            added_to_stack: depth as u32 + 1,
            immediate_size: None,
        });
        ops.push(Operation {
            id: 0x90 + depth - 1,
            mnemonic: format!("SWAP{}", depth),
            encoded: 0x90 + depth as u8 - 1,
            removed_from_stack: depth as u32 + 1,
            added_to_stack: depth as u32 + 1,
            immediate_size: None,
        });
    }

    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_count() {
        assert_eq!(derived().len(), 64);
    }

    #[test]
    fn test_push_variants() {
        let ops = derived();
        let push1 = ops.iter().find(|o| o.mnemonic == "PUSH1").unwrap();
        let push32 = ops.iter().find(|o| o.mnemonic == "PUSH32").unwrap();

        assert_eq!(push1.encoded, 0x60);
        assert_eq!(push1.immediate_size, Some(1));
        assert_eq!(push32.encoded, 0x7f);
        assert_eq!(push32.immediate_size, Some(32));
        assert_eq!(push32.removed_from_stack, 0);
        assert_eq!(push32.added_to_stack, 1);
    }

    #[test]
    fn test_dup_swap_arities() {
        let ops = derived();
        let dup16 = ops.iter().find(|o| o.mnemonic == "DUP16").unwrap();
        let swap1 = ops.iter().find(|o| o.mnemonic == "SWAP1").unwrap();

        assert_eq!(dup16.encoded, 0x8f);
        assert_eq!(dup16.removed_from_stack, 16);
        assert_eq!(dup16.added_to_stack, 17);
        assert_eq!(swap1.encoded, 0x90);
        assert_eq!(swap1.removed_from_stack, 2);
        assert_eq!(swap1.added_to_stack, 2);
    }
}
