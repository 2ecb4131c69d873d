// =============================================================================
// PROGRAM - record pairing generated bytecode with its metadata
// =============================================================================

/// One generated program.
///
/// `label` is the measured operation's mnemonic for isolation programs and
/// the run index for randomized programs. `op_count` is the repetition count
/// for isolation programs and the total emitted instruction count for
/// randomized programs. Created by a synthesizer call, consumed by the
/// output formatter, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub bytecode: String,
    pub label: String,
    pub op_count: u32,
}
