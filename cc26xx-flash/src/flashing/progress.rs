/// Progress reporting for erase and program operations.
///
/// Wraps a callback which receives a [`ProgressEvent`] whenever an operation
/// starts, hands a sector or chunk to the helper, or ends.
///
/// # Example
///
/// ```
/// use cc26xx_flash::flashing::FlashProgress;
///
/// let progress = FlashProgress::new(|event| println!("{event:?}"));
/// ```
pub struct FlashProgress {
    handler: Box<dyn Fn(ProgressEvent)>,
}

impl FlashProgress {
    /// Report events to `handler`.
    pub fn new(handler: impl Fn(ProgressEvent) + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// A `FlashProgress` which drops every event.
    pub fn empty() -> Self {
        Self::new(|_| {})
    }

    fn emit(&self, event: ProgressEvent) {
        (self.handler)(event);
    }

    pub(super) fn started_erasing(&self, sectors: usize) {
        self.emit(ProgressEvent::StartedErasing { sectors });
    }

    pub(super) fn sector_erased(&self, address: u64, size: u32) {
        self.emit(ProgressEvent::SectorErased { address, size });
    }

    pub(super) fn failed_erasing(&self) {
        self.emit(ProgressEvent::FailedErasing);
    }

    pub(super) fn finished_erasing(&self) {
        self.emit(ProgressEvent::FinishedErasing);
    }

    pub(super) fn started_programming(&self, length: u64) {
        self.emit(ProgressEvent::StartedProgramming { length });
    }

    pub(super) fn page_programmed(&self, address: u64, size: u32) {
        self.emit(ProgressEvent::PageProgrammed { address, size });
    }

    pub(super) fn failed_programming(&self) {
        self.emit(ProgressEvent::FailedProgramming);
    }

    pub(super) fn finished_programming(&self) {
        self.emit(ProgressEvent::FinishedProgramming);
    }
}

impl Default for FlashProgress {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for FlashProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlashProgress").finish_non_exhaustive()
    }
}

/// Events reported through [`FlashProgress`].
///
/// A successful erase reports `StartedErasing`, one `SectorErased` per
/// sector (none for a mass erase) and `FinishedErasing`. A successful write
/// reports `StartedProgramming`, one `PageProgrammed` per chunk and
/// `FinishedProgramming`.
///
/// A failing operation ends with `FailedErasing` or `FailedProgramming`
/// instead, and reports nothing after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// An erase operation started.
    StartedErasing {
        /// Number of sectors covered by the operation.
        sectors: usize,
    },
    /// The erase command of one sector was handed to the helper.
    SectorErased {
        /// Address of the sector.
        address: u64,
        /// Sector length in bytes.
        size: u32,
    },
    /// An erase operation failed.
    FailedErasing,
    /// An erase operation completed.
    FinishedErasing,
    /// A write operation started.
    StartedProgramming {
        /// Number of bytes to program.
        length: u64,
    },
    /// The helper accepted one chunk of data.
    PageProgrammed {
        /// Flash address of the chunk.
        address: u64,
        /// Chunk length in bytes.
        size: u32,
    },
    /// A write operation failed.
    FailedProgramming,
    /// A write operation completed.
    FinishedProgramming,
}
