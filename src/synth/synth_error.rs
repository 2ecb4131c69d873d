use thiserror::Error;

/// Invalid-argument failures raised at the start of a synthesis call,
/// before any byte is emitted. There are no recoverable errors: once the
/// arguments validate, generation is a total function of its random draws.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("push width {0} is outside 1..=32")]
    PushWidthOutOfRange(u8),

    #[error("dominant operation '{0}' is not in the sampling universe")]
    UnknownDominant(String),

    #[error("opcode '{0}' is not in the current selection")]
    UnknownOpcode(String),

    #[error("the current selection leaves the sampling universe empty")]
    EmptyUniverse,
}
