//! # Flash programming for TI CC26xx/CC13xx devices
//!
//! This crate erases and programs the internal flash of CC26x0, CC26x1,
//! CC13x0, CC26x2 and CC13x2 devices through an on-chip debugger. It does not
//! talk to a debug probe itself: the connection is supplied by implementing
//! [`TargetAccess`] on top of whatever debug transport is in use.
//!
//! The entry point is [`flashing::FlashBank`].
//!
//! ## Probing a device
//!
//! ```no_run
//! use cc26xx_flash::flashing::{AlgorithmRegistry, FlashBank};
//! use cc26xx_flash::TargetAccess;
//!
//! fn identify(target: impl TargetAccess) -> anyhow::Result<()> {
//!     let mut bank = FlashBank::new(target, AlgorithmRegistry::new());
//!     bank.probe()?;
//!
//!     println!("{}", bank.info());
//!     Ok(())
//! }
//! ```

mod clock;
#[warn(missing_docs)]
mod core;
mod error;
#[warn(missing_docs)]
pub mod flashing;
mod memory;


pub use crate::clock::{Clock, KeepAlive, MonotonicClock};
pub use crate::core::{CoreMode, CoreStatus, TargetAccess, WorkingArea};
pub use crate::error::Error;
pub use crate::memory::{InvalidDataLengthError, MemoryInterface, MemoryNotAlignedError};
