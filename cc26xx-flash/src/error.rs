use crate::memory::{InvalidDataLengthError, MemoryNotAlignedError};
use thiserror::Error;

/// Errors reported by a [`TargetAccess`](crate::TargetAccess) implementation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("A transfer of {length} bytes at address {address:#010x} failed")]
    Transfer { address: u64, length: usize },
    #[error(transparent)]
    MemoryNotAligned(#[from] MemoryNotAlignedError),
    #[error(transparent)]
    InvalidDataLength(#[from] InvalidDataLengthError),
    #[error("No working area of {size:#x} bytes is available")]
    WorkingAreaUnavailable { size: u32 },
    #[error("A command record could not be encoded")]
    Encoding(#[from] scroll::Error),
    #[error("The operation timed out")]
    Timeout,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
