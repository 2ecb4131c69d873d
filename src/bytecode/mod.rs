pub mod asm;

#[cfg(test)]
pub mod decode;

pub use asm::Asm;
