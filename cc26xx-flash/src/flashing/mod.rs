//! Flash programming operations.
//!
//! This module drives the internal flash of CC26xx/CC13xx devices. The
//! device is identified from its factory configuration, then a small helper
//! algorithm is loaded into target RAM which performs the actual erase and
//! program work, fed through two alternating command slots.
//!
//! ## Examples
//!
//! ### Programming an image
//!
//! ```no_run
//! use cc26xx_flash::flashing::{AlgorithmRegistry, FlashBank, FlashOptions, FlashProgress};
//! use cc26xx_flash::TargetAccess;
//!
//! fn program(target: impl TargetAccess, image: &[u8]) -> anyhow::Result<()> {
//!     let mut registry = AlgorithmRegistry::new();
//!     registry.add_from_file("targets/cc26xx.yaml")?;
//!
//!     let options = FlashOptions::from_yaml("flash_timeout_ms: 10000")?;
//!     let mut bank = FlashBank::new(target, registry)
//!         .with_options(options)
//!         .with_progress(FlashProgress::new(|event| println!("{event:?}")));
//!
//!     bank.mass_erase()?;
//!     bank.write(image, 0)?;
//!     Ok(())
//! }
//! ```

mod algorithm;
mod bank;
mod error;
pub mod handshake;
mod options;
mod profile;
mod progress;
mod registry;
mod sector;

pub use bank::{FlashBank, FLASH_BASE_ADDRESS};
pub use error::FlashError;
pub use options::{FlashOptions, FLASH_TIMEOUT, KEEP_ALIVE_AFTER};
pub use profile::{family, sram_size, DeviceProfile, DeviceType, MAX_SECTOR_COUNT};
pub use progress::{FlashProgress, ProgressEvent};
pub use registry::{AlgorithmRegistry, RegistryError};
pub use sector::{EraseState, FlashSector, SectorTable};
