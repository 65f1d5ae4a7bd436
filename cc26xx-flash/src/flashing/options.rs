use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Upper bound for a single helper command, and for joining the helper.
pub const FLASH_TIMEOUT: Duration = Duration::from_millis(8000);

/// Time after which waits start signalling the debugger session that they are still alive.
pub const KEEP_ALIVE_AFTER: Duration = Duration::from_millis(500);

/// Options for a [`FlashBank`](super::FlashBank).
///
/// The defaults match the timing the helper algorithms were qualified with.
/// All fields can be given in YAML, durations in milliseconds:
///
/// ```
/// use cc26xx_flash::flashing::FlashOptions;
///
/// let options = FlashOptions::from_yaml("flash_timeout_ms: 10000\nverify_algorithm: true")?;
///
/// assert_eq!(options.flash_timeout, std::time::Duration::from_secs(10));
/// assert!(options.verify_algorithm);
/// # Ok::<(), serde_yaml::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlashOptions {
    /// Number of the flash bank. The devices only have bank 0.
    pub bank_number: u32,
    /// How long a single command may keep its status word busy.
    #[serde(rename = "flash_timeout_ms", deserialize_with = "millis")]
    pub flash_timeout: Duration,
    /// After this time, every poll of a status word emits a keep-alive.
    #[serde(rename = "keep_alive_after_ms", deserialize_with = "millis")]
    pub keep_alive_after: Duration,
    /// How long to wait for the core to halt when stopping the helper.
    #[serde(rename = "halt_timeout_ms", deserialize_with = "millis")]
    pub halt_timeout: Duration,
    /// Read the helper algorithm back after loading it, and compare.
    pub verify_algorithm: bool,
}

impl FlashOptions {
    /// Parse options from a YAML document. Missing fields keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

impl Default for FlashOptions {
    fn default() -> Self {
        Self {
            bank_number: 0,
            flash_timeout: FLASH_TIMEOUT,
            keep_alive_after: KEEP_ALIVE_AFTER,
            halt_timeout: Duration::from_millis(100),
            verify_algorithm: false,
        }
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
