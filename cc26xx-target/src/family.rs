use serde::{Deserialize, Serialize};

/// Address every helper algorithm image is linked against.
pub const ALGO_BASE_ADDRESS: u64 = 0x2000_0000;

/// Offset of the status word inside a parameter block.
pub const STATUS_OFFSET: u64 = 0x0c;

const CHAMELEON_SECTOR_LENGTH: u32 = 0x1000;
const AGAMA_SECTOR_LENGTH: u32 = 0x2000;

const CHAMELEON_BUFFER_0: u64 = 0x2000_1c00;
const CHAMELEON_BUFFER_1: u64 = 0x2000_2c00;
const CHAMELEON_PARAMS_0: u64 = 0x2000_1bd8;
const CHAMELEON_PARAMS_1: u64 = 0x2000_1bec;

const AGAMA_BUFFER_0: u64 = 0x2000_2000;
const AGAMA_BUFFER_1: u64 = 0x2000_4000;
const AGAMA_PARAMS_0: u64 = 0x2000_1fd8;
const AGAMA_PARAMS_1: u64 = 0x2000_1fec;

/// The silicon generations served by this driver.
///
/// Each generation ships its own helper algorithm, compiled for a fixed
/// RAM layout described by [`AlgorithmLayout`].
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// CC26x0, CC26x1 and CC13x0 devices.
    Chameleon,
    /// CC26x2 and CC13x2 devices.
    Agama,
}

impl Family {
    /// The fixed RAM layout the family's helper algorithm was built for.
    pub fn layout(&self) -> &'static AlgorithmLayout {
        match self {
            Family::Chameleon => &AlgorithmLayout::CHAMELEON,
            Family::Agama => &AlgorithmLayout::AGAMA,
        }
    }

    /// Length of one flash sector.
    pub fn sector_length(&self) -> u32 {
        self.layout().sector_length
    }

    /// Lower case name, as used in target description files.
    pub fn name(&self) -> &'static str {
        match self {
            Family::Chameleon => "chameleon",
            Family::Agama => "agama",
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Target RAM addresses shared between the host and a helper algorithm.
///
/// These values are a closed contract with the helper image: the image is
/// position dependent, and it polls exactly these parameter blocks and
/// fills exactly these buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmLayout {
    /// Where the image has to be loaded.
    pub load_address: u64,
    /// Where execution of the image starts.
    pub entry: u64,
    /// Size of the working area, from the load address to the end of the second buffer.
    pub working_size: u32,
    /// Length of a flash sector, which is also the size of each data buffer.
    pub sector_length: u32,
    /// Data buffers of the two slots.
    pub buffers: [u64; 2],
    /// Parameter blocks of the two slots.
    pub params: [u64; 2],
    /// Status words of the two slots.
    pub status: [u64; 2],
}

impl AlgorithmLayout {
    /// Layout of the chameleon helper algorithm.
    pub const CHAMELEON: AlgorithmLayout = AlgorithmLayout {
        load_address: ALGO_BASE_ADDRESS,
        entry: ALGO_BASE_ADDRESS,
        working_size: (CHAMELEON_BUFFER_1 + CHAMELEON_SECTOR_LENGTH as u64 - ALGO_BASE_ADDRESS)
            as u32,
        sector_length: CHAMELEON_SECTOR_LENGTH,
        buffers: [CHAMELEON_BUFFER_0, CHAMELEON_BUFFER_1],
        params: [CHAMELEON_PARAMS_0, CHAMELEON_PARAMS_1],
        status: [
            CHAMELEON_PARAMS_0 + STATUS_OFFSET,
            CHAMELEON_PARAMS_1 + STATUS_OFFSET,
        ],
    };

    /// Layout of the agama helper algorithm.
    pub const AGAMA: AlgorithmLayout = AlgorithmLayout {
        load_address: ALGO_BASE_ADDRESS,
        entry: ALGO_BASE_ADDRESS,
        working_size: (AGAMA_BUFFER_1 + AGAMA_SECTOR_LENGTH as u64 - ALGO_BASE_ADDRESS) as u32,
        sector_length: AGAMA_SECTOR_LENGTH,
        buffers: [AGAMA_BUFFER_0, AGAMA_BUFFER_1],
        params: [AGAMA_PARAMS_0, AGAMA_PARAMS_1],
        status: [AGAMA_PARAMS_0 + STATUS_OFFSET, AGAMA_PARAMS_1 + STATUS_OFFSET],
    };

    /// The largest image that fits below the first parameter block.
    pub fn max_image_size(&self) -> u64 {
        self.params[0] - self.load_address
    }
}
