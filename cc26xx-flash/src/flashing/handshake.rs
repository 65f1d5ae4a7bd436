//! The ping-pong protocol spoken with a running helper algorithm.
//!
//! The helper polls two parameter blocks. The host fills the data buffer of
//! one slot, posts a [`CommandRecord`] with the status word set to
//! [`BUFFER_FULL`], and flips to the other slot. Before reusing a slot the
//! host waits until the helper has reset its status word to
//! [`BUFFER_EMPTY`], so one slot is being executed while the next is filled.

use scroll::{Pread, Pwrite, LE};

use super::algorithm::ActiveAlgorithm;
use super::FlashError;
use crate::TargetAccess;

/// Status word of a slot the helper has finished with.
pub const BUFFER_EMPTY: u32 = 0x0000_0000;
/// Status word of a slot holding a command the helper has not finished yet.
pub const BUFFER_FULL: u32 = 0xffff_ffff;

/// Commands understood by the helper algorithms.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum Command {
    /// Erase the whole flash.
    EraseAll = 1,
    /// Program the buffer without erasing first.
    Program = 2,
    /// Erase the sectors covered by the range, then program the buffer.
    EraseAndProgram = 3,
}

impl Command {
    /// The command with the wire value `code`, if there is one.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Command::EraseAll),
            2 => Some(Command::Program),
            3 => Some(Command::EraseAndProgram),
            _ => None,
        }
    }
}

/// The parameter block of one slot, as laid out in target RAM.
///
/// Five little endian words: flash address, byte count, command code,
/// status word and the address of the data buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pread, Pwrite)]
pub struct CommandRecord {
    /// Flash address of the operation.
    pub address: u32,
    /// Number of bytes covered.
    pub length: u32,
    /// A [`Command`] code.
    pub command: u32,
    /// [`BUFFER_FULL`] while the helper owns the slot.
    pub status: u32,
    /// Address of the data buffer of the slot.
    pub buffer: u32,
}

impl CommandRecord {
    /// Size of an encoded record in bytes.
    pub const SIZE: usize = 20;

    /// A record handing `command` to the helper.
    pub fn new(command: Command, address: u64, length: u32, buffer: u64) -> Self {
        Self {
            address: address as u32,
            length,
            command: command as u32,
            status: BUFFER_FULL,
            buffer: buffer as u32,
        }
    }

    /// The little endian bytes written to target RAM.
    pub fn encode(&self) -> Result<[u8; Self::SIZE], scroll::Error> {
        let mut bytes = [0; Self::SIZE];
        bytes.pwrite_with(*self, 0, LE)?;
        Ok(bytes)
    }

    /// Parse a record from the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, scroll::Error> {
        bytes.pread_with(0, LE)
    }
}

impl<T: TargetAccess> ActiveAlgorithm<'_, T> {
    /// Copy `data` into the buffer of `slot`.
    pub(super) fn load_buffer(&mut self, slot: usize, data: &[u8]) -> Result<(), FlashError> {
        self.target
            .write_8(self.layout().buffers[slot], data)
            .map_err(FlashError::Memory)
    }

    /// Write `record` to the parameter block of `slot`.
    ///
    /// The status word is part of the block, so the helper picks the
    /// command up as soon as this write lands.
    pub(super) fn post_command(
        &mut self,
        slot: usize,
        record: &CommandRecord,
    ) -> Result<(), FlashError> {
        tracing::trace!("Posting {:x?} to slot {}", record, slot);
        let bytes = record
            .encode()
            .map_err(|error| FlashError::Memory(error.into()))?;

        self.target
            .write_mem_32bit(self.layout().params[slot], &bytes)
            .map_err(FlashError::Memory)
    }

    /// Poll the status word of `slot` until the helper releases it.
    ///
    /// Every poll after the keep-alive threshold signals the session. When
    /// the flash timeout passes, the last value read decides the outcome.
    #[tracing::instrument(skip(self), fields(name = self.context.name))]
    pub(super) fn wait_done(&mut self, slot: usize) -> Result<(), FlashError> {
        let address = self.layout().status[slot];
        let options = self.context.options;
        let clock = self.context.clock;
        let start = clock.now();

        let mut status = BUFFER_FULL;
        while status == BUFFER_FULL {
            status = self
                .target
                .read_word_32(address)
                .map_err(FlashError::Memory)?;

            let elapsed = clock.now().saturating_sub(start);
            if elapsed > options.keep_alive_after {
                self.context.keep_alive.signal();
            }
            if elapsed > options.flash_timeout {
                break;
            }
        }

        match status {
            BUFFER_EMPTY => Ok(()),
            BUFFER_FULL => {
                tracing::error!("{}: Flash operation failed", self.context.name);
                Err(FlashError::Timeout {
                    family: self.context.name,
                    timeout: options.flash_timeout,
                })
            }
            status => {
                tracing::error!(
                    "{}: Flash operation failed, status {:#010x}",
                    self.context.name,
                    status
                );
                Err(FlashError::AlgorithmFailed {
                    family: self.context.name,
                    status,
                })
            }
        }
    }

    /// Signal the session if `since` lies further back than the keep-alive threshold.
    pub(super) fn keep_alive_since(&self, since: std::time::Duration) {
        if self.context.clock.now().saturating_sub(since) > self.context.options.keep_alive_after {
            self.context.keep_alive.signal();
        }
    }

    pub(super) fn now(&self) -> std::time::Duration {
        self.context.clock.now()
    }
}

/// Alternates commands between the two slots.
///
/// Round `i` is posted to slot `i % 2`. Posting a round waits for the other
/// slot, so at most two commands are in flight.
#[derive(Debug, Default)]
pub(super) struct PingPong {
    rounds: usize,
}

impl PingPong {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot the next round will be posted to.
    pub fn slot(&self) -> usize {
        self.rounds % 2
    }

    /// Post a command using whatever the slot buffer currently holds.
    pub fn post<T: TargetAccess>(
        &mut self,
        active: &mut ActiveAlgorithm<'_, T>,
        command: Command,
        address: u64,
        length: u32,
    ) -> Result<(), FlashError> {
        let slot = self.slot();
        let record = CommandRecord::new(command, address, length, active.layout().buffers[slot]);
        active.post_command(slot, &record)?;

        self.rounds += 1;
        active.wait_done(self.slot())
    }

    /// Fill the slot buffer with `data` and post a command covering it.
    pub fn post_data<T: TargetAccess>(
        &mut self,
        active: &mut ActiveAlgorithm<'_, T>,
        command: Command,
        address: u64,
        data: &[u8],
    ) -> Result<(), FlashError> {
        active.load_buffer(self.slot(), data)?;
        self.post(active, command, address, data.len() as u32)
    }

    /// Wait for the most recently posted round.
    pub fn finish<T: TargetAccess>(
        self,
        active: &mut ActiveAlgorithm<'_, T>,
    ) -> Result<(), FlashError> {
        match self.rounds.checked_sub(1) {
            Some(last) => active.wait_done(last % 2),
            None => Ok(()),
        }
    }
}
