use crate::error::Error;
use crate::memory::MemoryInterface;

use std::time::Duration;

/// Execution state of a core as last observed over the debug connection.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum CoreStatus {
    /// Executing instructions.
    Running,
    /// Stopped under debugger control.
    Halted,
    /// Locked up after an unrecoverable fault.
    LockedUp,
    /// Not queried yet, or the query failed.
    Unknown,
}

impl CoreStatus {
    /// Whether the core is stopped.
    pub fn is_halted(&self) -> bool {
        matches!(self, CoreStatus::Halted)
    }

    /// Whether the core is executing.
    pub fn is_running(&self) -> bool {
        self == &Self::Running
    }
}

/// The processor mode a routine is started in.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum CoreMode {
    /// Thread mode, the mode the core leaves reset in.
    #[default]
    Thread,
    /// Handler mode, as used by exception handlers.
    Handler,
}

/// A block of target RAM handed out by the target's working area allocator.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct WorkingArea {
    /// Start address of the block.
    pub address: u64,
    /// Size of the block in bytes.
    pub size: u32,
}

/// The primitives the flash engine needs from a debug connection to a core.
///
/// Implementations wrap the debug probe and its transport; the engine
/// never talks to the probe directly.
pub trait TargetAccess: MemoryInterface {
    /// Returns the current status of the core.
    fn status(&mut self) -> Result<CoreStatus, Error>;

    /// Request the core to halt, and wait at most `timeout` for it to do so.
    fn halt(&mut self, timeout: Duration) -> Result<(), Error>;

    /// Reserve `size` bytes of target RAM.
    fn allocate_working_area(&mut self, size: u32) -> Result<WorkingArea, Error>;

    /// Give a block obtained from [`TargetAccess::allocate_working_area`] back.
    fn free_working_area(&mut self, area: WorkingArea) -> Result<(), Error>;

    /// Start executing code at `entry` without waiting for it to return.
    fn start_algorithm(&mut self, entry: u64, mode: CoreMode) -> Result<(), Error>;

    /// Wait at most `timeout` for a routine started with
    /// [`TargetAccess::start_algorithm`] to halt, and restore the core state.
    fn wait_algorithm(&mut self, timeout: Duration) -> Result<(), Error>;
}
