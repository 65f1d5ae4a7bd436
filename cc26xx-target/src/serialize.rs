//! Serde helpers for the target description format.

use serde::{Deserializer, Serializer};

/// Writes addresses as hex strings to human-readable formats such as YAML.
pub(crate) fn hex_address<S>(address: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if serializer.is_human_readable() {
        serializer.collect_str(&format_args!("{address:#x}"))
    } else {
        serializer.serialize_u64(*address)
    }
}

/// Machine code images are stored as standard base64 text.
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};

    use super::{Deserializer, Serializer};

    pub(crate) fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Base64Visitor;

        impl<'de> serde::de::Visitor<'de> for Base64Visitor {
            type Value = Vec<u8>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "base64 ASCII text")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                general_purpose::STANDARD
                    .decode(v.trim())
                    .map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(Base64Visitor)
    }
}
