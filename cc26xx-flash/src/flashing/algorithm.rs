use cc26xx_target::{AlgorithmLayout, RawHelperAlgorithm};

use super::{FlashError, FlashOptions, FlashProgress};
use crate::{Clock, CoreMode, KeepAlive, TargetAccess, WorkingArea};

/// Everything a running helper needs besides the target itself.
pub(super) struct HelperContext<'a> {
    pub algorithm: &'a RawHelperAlgorithm,
    pub layout: &'static AlgorithmLayout,
    /// Prefix for diagnostics, the name of the device type.
    pub name: &'static str,
    pub options: &'a FlashOptions,
    pub clock: &'a dyn Clock,
    pub keep_alive: &'a KeepAlive,
    pub progress: &'a FlashProgress,
}

/// A helper algorithm loaded into target RAM and running on the core.
///
/// The guard owns the working area for as long as it lives. It is stopped
/// exactly once, either through [`ActiveAlgorithm::stop`] or when it is
/// dropped, which also covers every early return of a flash operation.
pub(super) struct ActiveAlgorithm<'a, T: TargetAccess> {
    pub(super) target: &'a mut T,
    working_area: &'a mut Option<WorkingArea>,
    pub(super) context: HelperContext<'a>,
    started: bool,
    stopped: bool,
}

impl<'a, T: TargetAccess> ActiveAlgorithm<'a, T> {
    /// Load the helper into its working area and start it in thread mode.
    ///
    /// A working area left over from an earlier run is released first.
    pub fn start(
        target: &'a mut T,
        working_area: &'a mut Option<WorkingArea>,
        context: HelperContext<'a>,
    ) -> Result<Self, FlashError> {
        if let Some(stale) = working_area.take() {
            tracing::debug!("Releasing stale working area at {:#010x}", stale.address);
            if let Err(error) = target.free_working_area(stale) {
                tracing::warn!("Failed to free stale working area: {}", error);
            }
        }

        let mut active = Self {
            target,
            working_area,
            context,
            started: false,
            stopped: false,
        };
        active.load()?;

        Ok(active)
    }

    #[tracing::instrument(skip_all, fields(name = self.context.name))]
    fn load(&mut self) -> Result<(), FlashError> {
        let layout = self.context.layout;

        let area = self
            .target
            .allocate_working_area(layout.working_size)
            .map_err(|source| {
                tracing::error!("{}: Failed to allocate working area", self.context.name);
                FlashError::WorkingAreaAllocation {
                    size: layout.working_size,
                    source,
                }
            })?;
        *self.working_area = Some(area);

        if area.address != layout.load_address {
            tracing::error!(
                "{}: Working area at {:#010x} instead of {:#010x}",
                self.context.name,
                area.address,
                layout.load_address
            );
            return Err(FlashError::WorkingAreaMisplaced {
                expected: layout.load_address,
                actual: area.address,
            });
        }

        let instructions = &self.context.algorithm.instructions;
        tracing::debug!(
            "Loading '{}' ({} bytes) to {:#010x}",
            self.context.algorithm.name,
            instructions.len(),
            layout.load_address
        );
        self.target
            .write_8(layout.load_address, instructions)
            .map_err(FlashError::Memory)?;

        if self.context.options.verify_algorithm {
            let mut readback = vec![0; instructions.len()];
            self.target
                .read_8(layout.load_address, &mut readback)
                .map_err(FlashError::Memory)?;

            if let Some(offset) = readback
                .iter()
                .zip(instructions.iter())
                .position(|(read, written)| read != written)
            {
                tracing::error!(
                    "Helper algorithm differs at {:#010x}",
                    layout.load_address + offset as u64
                );
                return Err(FlashError::FlashAlgorithmNotLoaded);
            }
        }

        self.target
            .start_algorithm(layout.entry, CoreMode::Thread)
            .map_err(|source| {
                tracing::error!(
                    "{}: Failed to start flash helper algorithm",
                    self.context.name
                );
                FlashError::AlgorithmStart {
                    family: self.context.name,
                    source,
                }
            })?;
        self.started = true;

        Ok(())
    }

    /// Halt the core, join the helper and release the working area.
    ///
    /// Failures are logged and otherwise ignored. Calling this more than
    /// once has no further effect.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        // Halting a core that already stopped fails on some transports.
        if let Err(error) = self.target.halt(self.context.options.halt_timeout) {
            tracing::debug!("Ignoring failure to halt the core: {}", error);
        }

        if self.started {
            if let Err(error) = self
                .target
                .wait_algorithm(self.context.options.flash_timeout)
            {
                tracing::warn!(
                    "{}: Flash helper algorithm did not finish cleanly: {}",
                    self.context.name,
                    error
                );
            }
        }

        if let Some(area) = self.working_area.take() {
            if let Err(error) = self.target.free_working_area(area) {
                tracing::warn!("Failed to free working area: {}", error);
            }
        }
    }

    pub fn layout(&self) -> &'static AlgorithmLayout {
        self.context.layout
    }

    pub fn progress(&self) -> &FlashProgress {
        self.context.progress
    }
}

impl<T: TargetAccess> Drop for ActiveAlgorithm<'_, T> {
    fn drop(&mut self) {
        self.stop();
    }
}
