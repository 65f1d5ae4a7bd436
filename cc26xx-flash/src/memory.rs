use crate::error::Error;

/// {function_name} needs a data length that is a multiple of {alignment} bytes
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub struct InvalidDataLengthError {
    /// The rejecting accessor.
    pub function_name: &'static str,
    /// Required granularity of the length in bytes.
    pub alignment: usize,
}

impl InvalidDataLengthError {
    pub fn new(function_name: &'static str, alignment: usize) -> Self {
        Self {
            function_name,
            alignment,
        }
    }
}

/// Access to {address:#010x} is not aligned to {alignment} bytes
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub struct MemoryNotAlignedError {
    /// The address of the access.
    pub address: u64,
    /// Required alignment in bytes.
    pub alignment: usize,
}

/// Access to the memory of a halted target.
///
/// Only the byte-wise accessors have to be provided, the word accessors
/// assume a little endian target.
pub trait MemoryInterface {
    /// Read a block of 8bit words at `address`.
    fn read_8(&mut self, address: u64, data: &mut [u8]) -> Result<(), Error>;

    /// Write a block of 8bit words to `address`.
    fn write_8(&mut self, address: u64, data: &[u8]) -> Result<(), Error>;

    /// Read a block of 32bit words at `address`.
    ///
    /// `address` must be word aligned, otherwise [`Error::MemoryNotAligned`]
    /// is returned.
    fn read_32(&mut self, address: u64, data: &mut [u32]) -> Result<(), Error> {
        if address % 4 != 0 {
            return Err(MemoryNotAlignedError {
                address,
                alignment: 4,
            }
            .into());
        }

        let mut buffer = vec![0u8; data.len() * 4];
        self.read_8(address, &mut buffer)?;
        for (value, bytes) in data.iter_mut().zip(buffer.chunks_exact(4)) {
            *value = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        Ok(())
    }

    /// Read a 32bit word at `address`.
    ///
    /// `address` must be word aligned, otherwise [`Error::MemoryNotAligned`]
    /// is returned.
    fn read_word_32(&mut self, address: u64) -> Result<u32, Error> {
        let mut word = 0;
        self.read_32(address, std::slice::from_mut(&mut word))?;
        Ok(word)
    }

    /// Write a block of 32bit words to `address`.
    ///
    /// `address` must be word aligned, otherwise [`Error::MemoryNotAligned`]
    /// is returned.
    fn write_32(&mut self, address: u64, data: &[u32]) -> Result<(), Error> {
        if address % 4 != 0 {
            return Err(MemoryNotAlignedError {
                address,
                alignment: 4,
            }
            .into());
        }

        let buffer: Vec<u8> = data.iter().flat_map(|word| word.to_le_bytes()).collect();
        self.write_8(address, &buffer)
    }

    /// Write a 32bit word to `address`.
    fn write_word_32(&mut self, address: u64, data: u32) -> Result<(), Error> {
        self.write_32(address, std::slice::from_ref(&data))
    }

    /// Write bytes using 32 bit memory access.
    ///
    /// `data` has to be a multiple of 4 bytes long.
    fn write_mem_32bit(&mut self, address: u64, data: &[u8]) -> Result<(), Error> {
        if data.len() % 4 != 0 {
            return Err(InvalidDataLengthError::new("write_mem_32bit", 4).into());
        }

        let words: Vec<u32> = data
            .chunks_exact(4)
            .map(|a| u32::from_le_bytes([a[0], a[1], a[2], a[3]]))
            .collect();
        self.write_32(address, &words)
    }
}
