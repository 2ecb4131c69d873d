// =============================================================================
// OPERATION - one catalog entry
// =============================================================================

/// Metadata for one operation the generators can emit.
///
/// `id` is the catalog identifier. For real opcodes it equals the encoded
/// byte; measurement variants such as `TLOAD_EXT` or `TSTORE0` carry
/// identifiers above `0xff` and share the encoded byte of the operation they
/// measure. Entries are immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub id: u16,
    pub mnemonic: String,
    /// The byte emitted into generated programs.
    pub encoded: u8,
    /// Stack arity in: values the operation consumes.
    pub removed_from_stack: u32,
    /// Stack arity out: values the operation produces.
    pub added_to_stack: u32,
    /// Immediate width in bytes for parameterized push-style operations.
    pub immediate_size: Option<u8>,
}
