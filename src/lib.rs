//! Cycle-accurate simulator of a 5-stage pipelined MIPS-like CPU with
//! a direct-mapped write-through cache over a flat 1 MiB memory.

pub mod alu;
pub mod cpu;
pub mod encoder;
pub mod instruction;
pub mod loader;
pub mod machine;
pub mod memory;
pub mod pipeline;
pub mod trace;

pub mod error;
