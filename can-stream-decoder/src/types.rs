//! Core types for the CAN stream decoder library
//!
//! This module defines the values that flow through the dispatcher: the frame
//! parsed from one input line, the decode result produced for it, and the
//! error type shared by every stage.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Raw value extracted from a frame payload for one signal.
///
/// Signed signals are sign-extended; unsigned signals are zero-extended and
/// reinterpreted. Float signals carry their IEEE bit pattern.
pub type RawValue = i64;

/// Largest payload a classic CAN frame can carry
pub const MAX_FRAME_BYTES: usize = 8;

/// One CAN frame parsed from a monitor-tool line
///
/// Lives for a single decode cycle and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Bus interface token from the line (e.g. "can0")
    pub bus: String,
    /// CAN message identifier
    pub can_id: u32,
    /// Payload bytes; length equals the declared byte count (0-8)
    pub data: Vec<u8>,
}

impl Frame {
    /// Declared byte count, which always matches the payload length
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

/// Errors that can occur while loading catalogs or decoding frames
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("could not load DBC '{path}' for bus '{bus}': {reason}")]
    CatalogLoadError {
        bus: String,
        path: String,
        reason: String,
    },

    #[error("bus '{0}' is already registered")]
    DuplicateBus(String),

    #[error("could not parse bus parameter '{0}', expected <bus name>:<DBC filename>")]
    InvalidBusSpec(String),

    #[error("Invalid signal definition: {0}")]
    InvalidSignalDefinition(String),

    #[error("Signal '{signal}' needs {required} payload bytes but frame has {available}")]
    SignalOutOfRange {
        signal: String,
        required: usize,
        available: usize,
    },

    #[error("Failed to serialize output: {0}")]
    OutputError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Value shown for one signal in a decode result
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayedValue {
    /// Label from the signal's value descriptions
    Label(String),
    /// Physical value after scaling
    Physical(f64),
}

impl fmt::Display for DisplayedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayedValue::Label(label) => write!(f, "{}", label),
            DisplayedValue::Physical(value) => write!(f, "{}", value),
        }
    }
}

impl Serialize for DisplayedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            DisplayedValue::Label(label) => serializer.serialize_str(label),
            DisplayedValue::Physical(value) => serializer.serialize_f64(*value),
        }
    }
}

/// A decoded signal in catalog-declared position
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    /// Signal name from the catalog
    pub name: String,
    /// Description label or physical value
    pub value: DisplayedValue,
    /// Raw value before scaling (useful for debugging)
    pub raw_value: RawValue,
}

/// Output of decoding one frame against its message definition
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeResult {
    /// Bus the frame arrived on
    pub bus: String,
    /// CAN message identifier
    pub message_id: u32,
    /// Message name from the catalog
    pub message_name: String,
    /// Signals in catalog-declared order
    pub signals: Vec<DecodedSignal>,
}

/// Serializes the signal list as an object whose keys keep declared order.
struct SignalMap<'a>(&'a [DecodedSignal]);

impl Serialize for SignalMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for signal in self.0 {
            map.serialize_entry(&signal.name, &signal.value)?;
        }
        map.end()
    }
}

impl Serialize for DecodeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("DecodeResult", 4)?;
        record.serialize_field("bus", &self.bus)?;
        record.serialize_field("message_id", &self.message_id)?;
        record.serialize_field("message_name", &self.message_name)?;
        record.serialize_field("signals", &SignalMap(&self.signals))?;
        record.end()
    }
}
