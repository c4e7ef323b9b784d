use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("failed to load program image: {0}")]
    LoadError(#[from] LoaderError),

    #[error("memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Faults the memory layer can signal back to a pipeline stage.
///
/// These are the only two memory fault kinds; they are reported to the
/// caller, never silently corrected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("out-of-bounds access at {address:#010x} (capacity {capacity:#x})")]
    OutOfBounds { address: u32, capacity: usize },

    #[error("unaligned word access at {address:#010x}")]
    UnalignedAccess { address: u32 },
}

/// Errors related to program image loading
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to read program image '{0}': {1}")]
    FileReadError(PathBuf, #[source] std::io::Error),

    #[error("program image '{0}' is {1} bytes, not a multiple of 4")]
    TruncatedImage(PathBuf, usize),

    #[error("program image of {0} bytes does not fit in the text section")]
    ImageTooLarge(usize),
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;

/// Type alias for Result with MemoryError
pub type MemoryResult<T> = Result<T, MemoryError>;
