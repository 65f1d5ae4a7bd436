//! Target description schema
//!
//! Flashing a CC26xx or CC13xx device requires a small helper algorithm which
//! runs from target RAM. The helper images are opaque machine code, each built
//! for a fixed RAM layout of its silicon family.
//!
//! This crate contains the fixed per-family layouts, and the schema structs
//! for the YAML files that carry the helper images.
//!
#![warn(missing_docs)]

mod description;
mod family;
mod helper_algorithm;
mod serialize;

pub use description::{TargetDescription, TargetDescriptionSource};
pub use family::{AlgorithmLayout, Family, ALGO_BASE_ADDRESS, STATUS_OFFSET};
pub use helper_algorithm::{LayoutMismatch, RawHelperAlgorithm};
