use crate::serialize::{base64_bytes, hex_address};
use crate::Family;

use serde::{Deserialize, Serialize};

/// The raw description of a flash helper algorithm, as read from a target
/// description file.
///
/// The instructions are an opaque, position dependent machine code image.
/// It only works when loaded at the address it was linked for, which has to
/// be the `load_address` of its family's [`AlgorithmLayout`](crate::AlgorithmLayout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHelperAlgorithm {
    /// The name of the helper algorithm.
    pub name: String,
    /// The description of the algorithm.
    #[serde(default)]
    pub description: String,
    /// The silicon family this image was built for.
    pub family: Family,
    /// The address the image was linked against.
    #[serde(serialize_with = "hex_address")]
    pub load_address: u64,
    /// The machine code of the helper, base64 encoded in description files.
    #[serde(with = "base64_bytes")]
    pub instructions: Vec<u8>,
}

impl RawHelperAlgorithm {
    /// Checks the declared load address and the image size against the family layout.
    pub fn check_layout(&self) -> Result<(), LayoutMismatch> {
        let layout = self.family.layout();

        if self.load_address != layout.load_address {
            return Err(LayoutMismatch::LoadAddress {
                expected: layout.load_address,
                actual: self.load_address,
            });
        }

        if self.instructions.len() as u64 > layout.max_image_size() {
            return Err(LayoutMismatch::TooLarge {
                size: self.instructions.len(),
                max: layout.max_image_size(),
            });
        }

        Ok(())
    }
}

/// A helper algorithm description does not fit its family's RAM layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMismatch {
    /// The image was linked for a different address.
    LoadAddress {
        /// The address required by the family layout.
        expected: u64,
        /// The address declared by the description.
        actual: u64,
    },
    /// The image would overlap the parameter blocks.
    TooLarge {
        /// Image size in bytes.
        size: usize,
        /// The largest size the layout allows.
        max: u64,
    },
}

impl std::fmt::Display for LayoutMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutMismatch::LoadAddress { expected, actual } => write!(
                f,
                "image is linked for {actual:#010x}, but the family layout requires {expected:#010x}"
            ),
            LayoutMismatch::TooLarge { size, max } => write!(
                f,
                "image of {size} bytes exceeds the {max} bytes available below the parameter blocks"
            ),
        }
    }
}

impl std::error::Error for LayoutMismatch {}
