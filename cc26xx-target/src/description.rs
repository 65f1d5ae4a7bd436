use crate::RawHelperAlgorithm;

use serde::{Deserialize, Serialize};

/// Source of a target description.
///
/// This is used for diagnostics, when
/// an error related to a target description occurs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetDescriptionSource {
    /// The description was compiled into the host tool.
    BuiltIn,
    /// The description was loaded from an external file at runtime.
    External,
}

/// A target description file, bundling the helper algorithms of one or
/// more silicon families.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDescription {
    /// Name of the description, used in log messages.
    pub name: String,
    /// The helper algorithms contained in this description.
    #[serde(default)]
    pub algorithms: Vec<RawHelperAlgorithm>,
}
