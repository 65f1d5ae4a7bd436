use std::time::Duration;

use cc26xx_target::Family;
use thiserror::Error;

use crate::error;

/// Describes any error that happened during, or in preparation for, a flash operation.
#[derive(Error, Debug)]
pub enum FlashError {
    /// The core has to be halted for flash operations.
    #[error("Target not halted")]
    NotHalted,

    /// The configured bank number is not 0.
    #[error("Flash bank {0} does not exist, the device only has bank 0")]
    InvalidBank(u32),

    /// A sector range is empty or exceeds the bank.
    #[error("Sectors {first}..={last} are outside of the {count} sectors of the bank")]
    InvalidSectorRange {
        /// First requested sector.
        first: usize,
        /// Last requested sector.
        last: usize,
        /// Number of sectors in the bank.
        count: usize,
    },

    /// A byte range exceeds the bank.
    #[error("The range {offset:#x}..{end:#x} exceeds the flash size of {size:#x} bytes")]
    OutOfBounds {
        /// Start of the range, relative to the bank.
        offset: u32,
        /// End of the range, exclusive.
        end: u64,
        /// Size of the bank in bytes.
        size: u64,
    },

    /// The registry holds no helper for the family of the device.
    #[error("No helper algorithm is registered for the {0} family")]
    NoHelperAlgorithm(Family),

    /// The target refused to hand out a working area.
    #[error("A working area of {size:#x} bytes for the helper algorithm could not be allocated")]
    WorkingAreaAllocation {
        /// Requested size in bytes.
        size: u32,
        /// The error reported by the target.
        #[source]
        source: error::Error,
    },
    /// The working area does not start where the helper is linked to run.
    #[error(
        "The working area was allocated at {actual:#010x}, \
         but the helper algorithm must run at {expected:#010x}"
    )]
    WorkingAreaMisplaced {
        /// Load address of the helper.
        expected: u64,
        /// Start of the allocated area.
        actual: u64,
    },

    /// The core could not be started at the helper entry point.
    #[error("{family}: Failed to start flash helper algorithm")]
    AlgorithmStart {
        /// Name of the device type.
        family: &'static str,
        /// The error reported by the target.
        #[source]
        source: error::Error,
    },

    /// Reading back the helper image gave different bytes.
    #[error("The RAM contents did not match the helper algorithm after loading it")]
    FlashAlgorithmNotLoaded,

    /// A slot was still busy when the flash timeout passed.
    #[error("{family}: Flash operation did not complete within {timeout:?}")]
    Timeout {
        /// Name of the device type.
        family: &'static str,
        /// The timeout that passed.
        timeout: Duration,
    },

    /// The helper reported an error in a status word.
    #[error("{family}: Flash operation failed, status word reads {status:#010x}")]
    AlgorithmFailed {
        /// Name of the device type.
        family: &'static str,
        /// The status word, the helper's error code.
        status: u32,
    },

    /// Accessing target memory failed.
    #[error("Something during memory interaction went wrong")]
    Memory(#[source] error::Error),
    /// Querying or controlling the core failed.
    #[error("Something during the interaction with the core went wrong")]
    Core(#[source] error::Error),
}

impl FlashError {
    /// Returns `true` if the helper could not get the target RAM it needs.
    pub fn is_resource_unavailable(&self) -> bool {
        matches!(
            self,
            FlashError::WorkingAreaAllocation { .. } | FlashError::WorkingAreaMisplaced { .. }
        )
    }
}
