use std::ops::RangeInclusive;

use super::algorithm::{ActiveAlgorithm, HelperContext};
use super::handshake::{Command, CommandRecord, PingPong};
use super::profile::{FCFG1_ICEPICK_ID, FCFG1_USER_ID, FLASH_SIZE_INFO, SRAM_SIZE_INFO};
use super::{
    AlgorithmRegistry, DeviceProfile, EraseState, FlashError, FlashOptions, FlashProgress,
    SectorTable,
};
use crate::{Clock, KeepAlive, MonotonicClock, TargetAccess, WorkingArea};

/// Address of the first flash byte.
pub const FLASH_BASE_ADDRESS: u64 = 0;

/// The word handed to the helper with every sector erase.
const ERASED_WORD: [u8; 4] = [0xff; 4];

/// The internal flash of a CC26xx/CC13xx device.
///
/// All operations run against a halted core. Erase and write load the
/// family's helper algorithm into target RAM, drive it through the
/// [ping-pong protocol](super::handshake) and stop it again before they
/// return, whether they succeed or not.
///
/// ```no_run
/// use cc26xx_flash::flashing::{AlgorithmRegistry, FlashBank};
/// use cc26xx_flash::TargetAccess;
///
/// fn program(target: impl TargetAccess, image: &[u8]) -> anyhow::Result<()> {
///     let mut registry = AlgorithmRegistry::new();
///     registry.add_from_file("targets/cc26xx.yaml")?;
///
///     let mut bank = FlashBank::new(target, registry);
///     let sectors = bank.probe()?.num_sectors;
///     bank.erase(0, sectors - 1)?;
///     bank.write(image, 0)?;
///     Ok(())
/// }
/// ```
pub struct FlashBank<T: TargetAccess> {
    target: T,
    registry: AlgorithmRegistry,
    options: FlashOptions,
    clock: Box<dyn Clock>,
    keep_alive: KeepAlive,
    progress: FlashProgress,
    profile: Option<DeviceProfile>,
    sectors: SectorTable,
    /// `Some` exactly while a helper algorithm owns target RAM.
    working_area: Option<WorkingArea>,
}

impl<T: TargetAccess> FlashBank<T> {
    /// Create an unprobed bank with default options.
    pub fn new(target: T, registry: AlgorithmRegistry) -> Self {
        Self {
            target,
            registry,
            options: FlashOptions::default(),
            clock: Box::new(MonotonicClock::new()),
            keep_alive: KeepAlive::empty(),
            progress: FlashProgress::empty(),
            profile: None,
            sectors: SectorTable::default(),
            working_area: None,
        }
    }

    /// Replace the default [`FlashOptions`].
    pub fn with_options(mut self, options: FlashOptions) -> Self {
        self.options = options;
        self
    }

    /// Measure timeouts with `clock` instead of the wall clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Call `keep_alive` while waiting on slow flash operations.
    pub fn with_keep_alive(mut self, keep_alive: KeepAlive) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Report erase and write progress to `progress`.
    pub fn with_progress(mut self, progress: FlashProgress) -> Self {
        self.progress = progress;
        self
    }

    /// The options in effect.
    pub fn options(&self) -> &FlashOptions {
        &self.options
    }

    /// The target the bank talks to.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Mutable access to the target.
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Give the target back.
    pub fn into_target(self) -> T {
        self.target
    }

    /// The resolved device profile, once the bank has been probed.
    pub fn profile(&self) -> Option<&DeviceProfile> {
        self.profile.as_ref()
    }

    /// The sectors of the bank. Empty until the bank has been probed.
    pub fn sectors(&self) -> &SectorTable {
        &self.sectors
    }

    /// Whether a helper algorithm currently owns target RAM.
    ///
    /// This is only ever `true` from within a flash operation.
    pub fn is_algorithm_running(&self) -> bool {
        self.working_area.is_some()
    }

    fn ensure_halted(&mut self) -> Result<(), FlashError> {
        let status = self.target.status().map_err(FlashError::Core)?;
        if !status.is_halted() {
            tracing::error!("Target not halted");
            return Err(FlashError::NotHalted);
        }
        Ok(())
    }

    /// Identify the device and rebuild the sector table.
    ///
    /// Reads the factory configuration and size registers. Unknown devices
    /// resolve to the agama family. Every sector starts out as
    /// [`EraseState::Unknown`].
    #[tracing::instrument(skip(self))]
    pub fn probe(&mut self) -> Result<&DeviceProfile, FlashError> {
        self.ensure_halted()?;

        let mut read = |address: u64| {
            self.target
                .read_word_32(address)
                .map_err(FlashError::Memory)
        };
        let icepick_id = read(FCFG1_ICEPICK_ID)?;
        let user_id = read(FCFG1_USER_ID)?;
        let flash_size_info = read(FLASH_SIZE_INFO)?;
        let sram_size_code = read(SRAM_SIZE_INFO)?;

        let profile = DeviceProfile::resolve(icepick_id, user_id, sram_size_code, flash_size_info);
        tracing::info!(
            "Found {} ({} family): {} sectors of {:#x} bytes, {:#x} bytes SRAM",
            profile.name(),
            profile.family,
            profile.num_sectors,
            profile.sector_length,
            profile.sram_size
        );

        self.sectors = SectorTable::new(profile.num_sectors, profile.sector_length);
        Ok(self.profile.insert(profile))
    }

    /// Probe the bank unless it already has been.
    pub fn auto_probe(&mut self) -> Result<DeviceProfile, FlashError> {
        if self.options.bank_number != 0 {
            return Err(FlashError::InvalidBank(self.options.bank_number));
        }

        match &self.profile {
            Some(profile) => Ok(profile.clone()),
            None => self.probe().cloned(),
        }
    }

    fn check_sector_range(&self, first: usize, last: usize) -> Result<(), FlashError> {
        let count = self.sectors.len();
        if first > last || last >= count {
            return Err(FlashError::InvalidSectorRange { first, last, count });
        }
        Ok(())
    }

    fn check_byte_range(&self, offset: u32, length: usize) -> Result<(), FlashError> {
        let size = self.sectors.iter().map(|sector| sector.size as u64).sum();
        let end = offset as u64 + length as u64;
        if end > size {
            return Err(FlashError::OutOfBounds { offset, end, size });
        }
        Ok(())
    }

    /// Load and start the helper, hand it to `operation` and stop it again.
    fn run_algorithm<R>(
        &mut self,
        profile: &DeviceProfile,
        operation: impl FnOnce(&mut ActiveAlgorithm<'_, T>) -> Result<R, FlashError>,
    ) -> Result<R, FlashError> {
        let algorithm = self
            .registry
            .get(profile.family)
            .ok_or(FlashError::NoHelperAlgorithm(profile.family))?;

        let context = HelperContext {
            algorithm,
            layout: profile.family.layout(),
            name: profile.name(),
            options: &self.options,
            clock: self.clock.as_ref(),
            keep_alive: &self.keep_alive,
            progress: &self.progress,
        };

        let mut active = ActiveAlgorithm::start(&mut self.target, &mut self.working_area, context)?;
        let result = operation(&mut active);
        active.stop();

        result
    }

    /// Erase the sectors `first..=last`.
    ///
    /// A request covering the whole bank is carried out as a
    /// [mass erase](Self::mass_erase). On success the sectors are marked as
    /// erased. On failure the sector table is left as it was.
    #[tracing::instrument(skip(self))]
    pub fn erase(&mut self, first: usize, last: usize) -> Result<(), FlashError> {
        self.ensure_halted()?;
        let profile = self.auto_probe()?;
        self.check_sector_range(first, last)?;

        if self.options.bank_number == 0 && first == 0 && last == profile.num_sectors - 1 {
            return self.mass_erase();
        }

        let sector_length = profile.sector_length;
        let sectors = first..=last;
        self.progress.started_erasing(sectors.clone().count());

        let result = self.run_algorithm(&profile, |active| {
            // Both buffers hold the all-ones word for the whole run.
            active.load_buffer(0, &ERASED_WORD)?;
            if first != last {
                active.load_buffer(1, &ERASED_WORD)?;
            }

            let mut ping_pong = PingPong::new();
            for sector in sectors.clone() {
                let address = FLASH_BASE_ADDRESS + sector as u64 * sector_length as u64;
                ping_pong.post(
                    active,
                    Command::EraseAndProgram,
                    address,
                    ERASED_WORD.len() as u32,
                )?;
                active.progress().sector_erased(address, sector_length);
            }

            ping_pong.finish(active)
        });

        self.finish_erase(sectors, result)
    }

    /// Erase the whole flash with a single command.
    #[tracing::instrument(skip(self))]
    pub fn mass_erase(&mut self) -> Result<(), FlashError> {
        self.ensure_halted()?;
        let profile = self.auto_probe()?;

        self.progress.started_erasing(profile.num_sectors);

        let result = self.run_algorithm(&profile, |active| {
            let record = CommandRecord::new(
                Command::EraseAll,
                FLASH_BASE_ADDRESS,
                ERASED_WORD.len() as u32,
                active.layout().buffers[0],
            );
            active.post_command(0, &record)?;
            active.wait_done(0)
        });

        let all = 0..=profile.num_sectors.saturating_sub(1);
        self.finish_erase(all, result)
    }

    fn finish_erase(
        &mut self,
        sectors: RangeInclusive<usize>,
        result: Result<(), FlashError>,
    ) -> Result<(), FlashError> {
        match result {
            Ok(()) => {
                self.sectors.mark(sectors, EraseState::Erased);
                self.progress.finished_erasing();
                Ok(())
            }
            Err(error) => {
                self.progress.failed_erasing();
                Err(error)
            }
        }
    }

    /// Program `data` to the flash, starting `offset` bytes into the bank.
    ///
    /// The data is split into chunks of at most one sector. The target range
    /// is expected to be erased. On success every sector overlapping the
    /// range is marked as not erased. An empty `data` does nothing.
    #[tracing::instrument(skip(self, data), fields(length = data.len()))]
    pub fn write(&mut self, data: &[u8], offset: u32) -> Result<(), FlashError> {
        self.ensure_halted()?;
        let profile = self.auto_probe()?;

        if data.is_empty() {
            tracing::debug!("Nothing to write");
            return Ok(());
        }
        self.check_byte_range(offset, data.len())?;

        let sector_length = profile.sector_length;
        self.progress.started_programming(data.len() as u64);

        let result = self.run_algorithm(&profile, |active| {
            let start = active.now();
            let mut ping_pong = PingPong::new();
            let mut address = FLASH_BASE_ADDRESS + offset as u64;

            for chunk in data.chunks(sector_length as usize) {
                ping_pong.post_data(active, Command::Program, address, chunk)?;
                active
                    .progress()
                    .page_programmed(address, chunk.len() as u32);
                address += chunk.len() as u64;

                active.keep_alive_since(start);
            }

            ping_pong.finish(active)
        });

        match result {
            Ok(()) => {
                let sectors = self.sectors.overlapping(offset, data.len() as u32);
                self.sectors.mark(sectors, EraseState::NotErased);
                self.progress.finished_programming();
                Ok(())
            }
            Err(error) => {
                self.progress.failed_programming();
                Err(error)
            }
        }
    }

    /// Read `data.len()` bytes, starting `offset` bytes into the bank.
    pub fn read(&mut self, offset: u32, data: &mut [u8]) -> Result<(), FlashError> {
        self.auto_probe()?;
        self.check_byte_range(offset, data.len())?;

        self.target
            .read_8(FLASH_BASE_ADDRESS + offset as u64, data)
            .map_err(FlashError::Memory)
    }

    /// Read every sector back and record whether it is erased.
    pub fn erase_check(&mut self) -> Result<(), FlashError> {
        self.ensure_halted()?;
        self.auto_probe()?;

        let mut states = Vec::with_capacity(self.sectors.len());
        for sector in self.sectors.iter() {
            let mut contents = vec![0; sector.size as usize];
            self.target
                .read_8(FLASH_BASE_ADDRESS + sector.offset as u64, &mut contents)
                .map_err(FlashError::Memory)?;

            states.push(if contents.iter().all(|byte| *byte == 0xff) {
                EraseState::Erased
            } else {
                EraseState::NotErased
            });
        }

        for (index, state) in states.into_iter().enumerate() {
            self.sectors.mark(index..=index, state);
        }
        Ok(())
    }

    /// The devices have no sector protection, so this only validates the range.
    pub fn protect(&mut self, set: bool, first: usize, last: usize) -> Result<(), FlashError> {
        self.auto_probe()?;
        self.check_sector_range(first, last)?;
        tracing::debug!("Ignoring protect({}) of sectors {}..={}", set, first, last);
        Ok(())
    }

    /// Sectors are never protected.
    pub fn protect_check(&mut self) -> Result<(), FlashError> {
        self.auto_probe()?;
        Ok(())
    }

    /// A human readable description of the device.
    pub fn info(&self) -> String {
        let (name, icepick_id, user_id, flash_size, sram_size) = match &self.profile {
            Some(profile) => (
                profile.name(),
                profile.icepick_id,
                profile.user_id,
                profile.flash_size(),
                profile.sram_size,
            ),
            None => ("Unrecognized", 0, 0, 0, 0),
        };

        format!(
            "{name} device: ICEPick ID {icepick_id:#010x}, USER ID {user_id:#010x}\n\
             flash size = {flash_size:#x}, SRAM size = {sram_size:#x}"
        )
    }
}

impl<T: TargetAccess> std::fmt::Debug for FlashBank<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlashBank")
            .field("options", &self.options)
            .field("profile", &self.profile)
            .field("sectors", &self.sectors)
            .field("working_area", &self.working_area)
            .finish_non_exhaustive()
    }
}
