pub mod marginal;
pub mod random;
pub mod strategy;
pub mod synth_error;

pub use synth_error::SynthError;

/// Global ceiling on the measured-instruction count of a single program.
/// Exceeding it is a programmer error, not a recoverable condition.
pub const MAX_INSTRUCTIONS: u32 = 128;
