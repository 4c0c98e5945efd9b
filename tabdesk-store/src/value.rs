//! Stored values: the encoding tag and the forgiving decoder.

use crate::error::StoreResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// How a value is turned into stored text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// Lossless JSON serialization of compound data.
    #[default]
    Structured,
    /// Opaque text, stored and returned verbatim.
    Raw,
}

impl Encoding {
    /// Tag persisted in the `data_type` column.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Structured => "json",
            Self::Raw => "raw",
        }
    }

    /// Any tag other than `json` reads back as raw text.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "json" => Self::Structured,
            _ => Self::Raw,
        }
    }
}

/// Result of reading a stored value.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Structured text that parsed as JSON.
    Structured(Value),
    /// Raw text, returned as requested.
    Raw(String),
    /// Structured decoding was requested but the text did not parse; this is
    /// the stored text as-is.
    Fallback(String),
}

impl Decoded {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// The value as a string slice: JSON strings, raw text or fallback text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Structured(v) => v.as_str(),
            Self::Raw(s) | Self::Fallback(s) => Some(s),
        }
    }

    /// Collapses to JSON; raw and fallback text become JSON strings.
    pub fn into_json(self) -> Value {
        match self {
            Self::Structured(v) => v,
            Self::Raw(s) | Self::Fallback(s) => Value::String(s),
        }
    }

    /// Deserializes into `T` via [`Decoded::into_json`].
    pub fn deserialize<T: DeserializeOwned>(self) -> StoreResult<T> {
        Ok(serde_json::from_value(self.into_json())?)
    }
}

impl From<Value> for Decoded {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<&str> for Decoded {
    fn from(value: &str) -> Self {
        Self::Structured(Value::String(value.to_string()))
    }
}

/// Encodes `value` to stored text.
///
/// Raw encoding stores JSON strings bare and anything else as its JSON text.
pub fn encode<T: Serialize + ?Sized>(value: &T, encoding: Encoding) -> StoreResult<String> {
    match encoding {
        Encoding::Structured => Ok(serde_json::to_string(value)?),
        Encoding::Raw => Ok(match serde_json::to_value(value)? {
            Value::String(s) => s,
            other => other.to_string(),
        }),
    }
}

/// Decodes stored text. Never fails: unparsable structured text comes back
/// as [`Decoded::Fallback`].
pub fn decode(text: String, encoding: Encoding) -> Decoded {
    match encoding {
        Encoding::Raw => Decoded::Raw(text),
        Encoding::Structured => match serde_json::from_str(&text) {
            Ok(value) => Decoded::Structured(value),
            Err(_) => Decoded::Fallback(text),
        },
    }
}
