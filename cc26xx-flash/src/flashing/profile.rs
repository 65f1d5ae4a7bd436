//! Device identification from the factory configuration registers.

use cc26xx_target::Family;

/// FCFG1 register holding the ICEPick device identifier.
pub(crate) const FCFG1_ICEPICK_ID: u64 = 0x5000_1318;
/// FCFG1 register holding the user identifier.
pub(crate) const FCFG1_USER_ID: u64 = 0x5000_1294;
/// Register whose low byte holds the number of flash sectors.
pub(crate) const FLASH_SIZE_INFO: u64 = 0x4003_002c;
/// Register holding the SRAM size code.
pub(crate) const SRAM_SIZE_INFO: u64 = 0x4008_2250;

/// Upper bound for the sector count reported by the flash size register.
pub const MAX_SECTOR_COUNT: usize = 128;

const ICEPICK_ID_MASK: u32 = 0x0fff_ffff;
const ICEPICK_REV_MASK: u32 = 0xf000_0000;

const CC26X0_ICEPICK_ID: u32 = 0x0b99_a02f;
const CC26X1_ICEPICK_ID: u32 = 0x0b9b_d02f;
const CC13X0_ICEPICK_ID: u32 = 0x0b9b_e02f;

/// Set in the user ID of CC13x2 parts, clear on CC26x2 parts.
const USER_ID_CC13_MASK: u32 = 0x0080_0000;

/// The device variants distinguished by the driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// CC26x0, chameleon family.
    Cc26x0,
    /// CC26x1, chameleon family.
    Cc26x1,
    /// CC13x0, chameleon family.
    Cc13x0,
    /// CC26x2, agama family.
    Cc26x2,
    /// CC13x2, agama family.
    Cc13x2,
}

impl DeviceType {
    /// Decode the device type from the ICEPick ID and the user ID.
    ///
    /// Unrecognized ICEPick IDs are treated as the newest known devices.
    pub fn from_ids(icepick_id: u32, user_id: u32) -> Self {
        match icepick_id & ICEPICK_ID_MASK {
            CC26X0_ICEPICK_ID => DeviceType::Cc26x0,
            CC26X1_ICEPICK_ID => DeviceType::Cc26x1,
            CC13X0_ICEPICK_ID => DeviceType::Cc13x0,
            // CC13x2/CC26x2, and anything not listed above.
            _ => {
                if user_id & USER_ID_CC13_MASK != 0 {
                    DeviceType::Cc13x2
                } else {
                    DeviceType::Cc26x2
                }
            }
        }
    }

    /// The name used in diagnostics and [`FlashBank::info`](super::FlashBank::info).
    pub fn name(&self) -> &'static str {
        match self {
            DeviceType::Cc26x0 => "CC26x0",
            DeviceType::Cc26x1 => "CC26x1",
            DeviceType::Cc13x0 => "CC13x0",
            DeviceType::Cc26x2 => "CC26x2",
            DeviceType::Cc13x2 => "CC13x2",
        }
    }

    /// The silicon family, which decides the RAM layout of the helper.
    pub fn family(&self) -> Family {
        match self {
            DeviceType::Cc26x0 | DeviceType::Cc26x1 | DeviceType::Cc13x0 => Family::Chameleon,
            DeviceType::Cc26x2 | DeviceType::Cc13x2 => Family::Agama,
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Select the silicon family from the ICEPick ID.
pub fn family(icepick_id: u32) -> Family {
    match icepick_id & ICEPICK_ID_MASK {
        CC26X0_ICEPICK_ID | CC26X1_ICEPICK_ID | CC13X0_ICEPICK_ID => Family::Chameleon,
        _ => Family::Agama,
    }
}

/// Decode the SRAM size in bytes from the size code.
///
/// Codes above 3 decode like 3.
pub fn sram_size(icepick_id: u32, size_code: u32) -> u32 {
    match family(icepick_id) {
        Family::Chameleon => match icepick_id & ICEPICK_REV_MASK {
            // PG1 silicon had less SRAM available.
            0x0000_0000 | 0x1000_0000 => match size_code {
                0 => 0x800,
                1 => 0x1000,
                2 => 0x2000,
                _ => 0x4000,
            },
            _ => match size_code {
                0 => 0x1000,
                1 => 0x2800,
                2 => 0x4000,
                _ => 0x5000,
            },
        },
        Family::Agama => match size_code {
            0 => 0x8000,
            1 => 0xc000,
            2 => 0x10000,
            _ => 0x14000,
        },
    }
}

/// Everything the driver knows about the attached device.
///
/// A profile is resolved once, when the bank is probed, and never changes
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Raw ICEPick ID register.
    pub icepick_id: u32,
    /// Raw user ID register.
    pub user_id: u32,
    /// Device type decoded from the ID registers.
    pub device_type: DeviceType,
    /// Family decoded from the ICEPick ID.
    pub family: Family,
    /// Length of one flash sector in bytes.
    pub sector_length: u32,
    /// SRAM size in bytes.
    pub sram_size: u32,
    /// Number of flash sectors, capped at [`MAX_SECTOR_COUNT`].
    pub num_sectors: usize,
}

impl DeviceProfile {
    /// Resolve a profile from the raw register values.
    ///
    /// This never fails: register values which match no known device
    /// resolve to the agama defaults.
    pub fn resolve(
        icepick_id: u32,
        user_id: u32,
        sram_size_code: u32,
        flash_size_info: u32,
    ) -> Self {
        let device_type = DeviceType::from_ids(icepick_id, user_id);
        let family = family(icepick_id);
        let num_sectors = ((flash_size_info & 0xff) as usize).min(MAX_SECTOR_COUNT);

        Self {
            icepick_id,
            user_id,
            device_type,
            family,
            sector_length: family.sector_length(),
            sram_size: sram_size(icepick_id, sram_size_code),
            num_sectors,
        }
    }

    /// Total size of the flash in bytes.
    pub fn flash_size(&self) -> u64 {
        self.num_sectors as u64 * self.sector_length as u64
    }

    /// Name used to prefix diagnostics.
    pub fn name(&self) -> &'static str {
        self.device_type.name()
    }
}
