//! Message catalog data model
//!
//! A catalog holds the message definitions loaded for one bus, in the order
//! the source file declared them.

use crate::types::RawValue;
use std::collections::HashMap;

/// A complete CAN message definition
#[derive(Debug, Clone)]
pub struct MessageDefinition {
    /// CAN message ID
    pub id: u32,
    /// Message name
    pub name: String,
    /// All signals in this message, in declared order
    pub signals: Vec<SignalDefinition>,
    /// Multiplexer signal name (if multiplexed)
    pub multiplexer_signal: Option<String>,
}

impl MessageDefinition {
    /// True if this message has a multiplexor signal
    pub fn is_multiplexed(&self) -> bool {
        self.multiplexer_signal.is_some()
    }

    /// The multiplexor signal, if any
    pub fn multiplexer(&self) -> Option<&SignalDefinition> {
        let name = self.multiplexer_signal.as_deref()?;
        self.signals.iter().find(|s| s.name == name)
    }
}

/// A CAN signal definition
#[derive(Debug, Clone)]
pub struct SignalDefinition {
    /// Signal name
    pub name: String,
    /// Start bit in the CAN frame (LSB for Intel, MSB for Motorola)
    pub start_bit: u64,
    /// Length in bits
    pub length: u64,
    /// Byte order
    pub byte_order: ByteOrder,
    /// Value type (signed/unsigned/float)
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Value descriptions in declared order
    pub value_descriptions: Vec<ValueDescription>,
    /// Multiplexer info (None if not multiplexed)
    pub multiplexer_info: Option<MultiplexerInfo>,
}

/// Label attached to one raw value of a signal
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDescription {
    pub raw: RawValue,
    pub label: String,
}

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
    /// IEEE 754 single precision
    Float32,
    /// IEEE 754 double precision
    Float64,
}

/// Multiplexer information for multiplexed signals
#[derive(Debug, Clone)]
pub struct MultiplexerInfo {
    /// Multiplexer value(s) for which this signal is active
    pub multiplexer_values: Vec<u64>,
}

/// Message definitions loaded for one bus
///
/// Read-only once built. Lookup by identifier returns the first message
/// declared with that identifier.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Source file the catalog was loaded from
    source: String,
    /// Messages in declared order
    messages: Vec<MessageDefinition>,
    /// CAN ID -> index of first message declared with that ID
    index: HashMap<u32, usize>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            messages: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a catalog from messages in declared order
    pub fn from_messages(source: impl Into<String>, messages: Vec<MessageDefinition>) -> Self {
        let mut catalog = Self::new(source);
        for message in messages {
            catalog.add_message(message);
        }
        catalog
    }

    /// Append a message definition
    pub fn add_message(&mut self, message: MessageDefinition) {
        let msg_idx = self.messages.len();
        if self.index.contains_key(&message.id) {
            log::warn!(
                "{}: duplicate message ID 0x{:X} ({}), first definition is kept",
                self.source,
                message.id,
                message.name
            );
        } else {
            self.index.insert(message.id, msg_idx);
        }
        self.messages.push(message);
    }

    /// Find the message definition for a CAN ID
    pub fn find_message(&self, can_id: u32) -> Option<&MessageDefinition> {
        self.index.get(&can_id).and_then(|idx| self.messages.get(*idx))
    }

    /// All messages in declared order
    pub fn messages(&self) -> &[MessageDefinition] {
        &self.messages
    }

    /// Source file name
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get catalog statistics
    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            num_messages: self.messages.len(),
            num_signals: self.messages.iter().map(|msg| msg.signals.len()).sum(),
        }
    }
}

/// Catalog statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn plain_signal(name: &str, start_bit: u64, length: u64) -> SignalDefinition {
        SignalDefinition {
            name: name.to_string(),
            start_bit,
            length,
            byte_order: ByteOrder::LittleEndian,
            value_type: ValueType::Unsigned,
            factor: 1.0,
            offset: 0.0,
            value_descriptions: Vec::new(),
            multiplexer_info: None,
        }
    }

    pub(crate) fn message(id: u32, name: &str, signals: Vec<SignalDefinition>) -> MessageDefinition {
        MessageDefinition {
            id,
            name: name.to_string(),
            signals,
            multiplexer_signal: None,
        }
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::new("empty.dbc");
        let stats = catalog.stats();
        assert_eq!(stats.num_messages, 0);
        assert_eq!(stats.num_signals, 0);
        assert!(catalog.find_message(0x100).is_none());
    }

    #[test]
    fn test_find_message() {
        let catalog = Catalog::from_messages(
            "test.dbc",
            vec![
                message(0x100, "Speed", vec![plain_signal("kph", 0, 8)]),
                message(0x200, "Engine", vec![plain_signal("rpm", 0, 16), plain_signal("temp", 16, 8)]),
            ],
        );

        assert_eq!(catalog.find_message(0x200).unwrap().name, "Engine");
        assert!(catalog.find_message(0x999).is_none());

        let stats = catalog.stats();
        assert_eq!(stats.num_messages, 2);
        assert_eq!(stats.num_signals, 3);
    }

    #[test]
    fn test_first_declared_message_wins() {
        let catalog = Catalog::from_messages(
            "dup.dbc",
            vec![
                message(0x100, "First", vec![]),
                message(0x100, "Second", vec![]),
            ],
        );

        assert_eq!(catalog.find_message(0x100).unwrap().name, "First");
        assert_eq!(catalog.messages().len(), 2);
    }
}
