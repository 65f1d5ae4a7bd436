use std::ops::RangeInclusive;

/// What is known about the contents of a sector.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EraseState {
    /// The sector is known to be erased.
    Erased,
    /// The sector is known to hold data.
    NotErased,
    /// Nothing is known about the sector.
    #[default]
    Unknown,
}

/// A sector of the flash bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashSector {
    /// Offset of the sector from the start of the bank.
    pub offset: u32,
    /// Size of the sector in bytes.
    pub size: u32,
    /// Always `false`, the devices have no sector protection.
    pub is_protected: bool,
    /// What is known about the contents.
    pub erase_state: EraseState,
}

/// The sectors of a probed flash bank, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectorTable {
    sectors: Vec<FlashSector>,
}

impl SectorTable {
    /// `count` unprotected sectors of `sector_length` bytes, all in state [`EraseState::Unknown`].
    pub fn new(count: usize, sector_length: u32) -> Self {
        let sectors = (0..count)
            .map(|index| FlashSector {
                offset: index as u32 * sector_length,
                size: sector_length,
                is_protected: false,
                erase_state: EraseState::Unknown,
            })
            .collect();

        Self { sectors }
    }

    /// Number of sectors.
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    /// Whether the table is empty, as it is before probing.
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Iterate over the sectors in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &FlashSector> {
        self.sectors.iter()
    }

    /// The sector at `index`, if the bank has one.
    pub fn get(&self, index: usize) -> Option<&FlashSector> {
        self.sectors.get(index)
    }

    /// Set the state of every sector in `range`.
    ///
    /// Indices beyond the end of the table are ignored.
    pub(crate) fn mark(&mut self, range: RangeInclusive<usize>, state: EraseState) {
        for sector in self.sectors.iter_mut().take(range.end() + 1).skip(*range.start()) {
            sector.erase_state = state;
        }
    }

    /// The sectors overlapping the byte range `offset..offset + length`.
    ///
    /// `length` must not be zero.
    pub(crate) fn overlapping(&self, offset: u32, length: u32) -> RangeInclusive<usize> {
        let sector_length = self.sectors.first().map_or(1, |sector| sector.size) as u64;
        let first = offset as u64 / sector_length;
        let last = (offset as u64 + length as u64 - 1) / sector_length;

        first as usize..=last as usize
    }
}
