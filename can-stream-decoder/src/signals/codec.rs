//! Signal codec
//!
//! Extracts raw values from frame payloads and converts them to physical
//! values. Bit numbering follows DBC conventions: Intel signals start at their
//! LSB and grow upward, Motorola signals start at their MSB and walk down each
//! byte before continuing at bit 7 of the next byte.

use crate::signals::database::{ByteOrder, SignalDefinition, ValueType};
use crate::types::{DecoderError, RawValue, Result};

impl SignalDefinition {
    /// Number of payload bytes this signal's bit span touches
    pub fn required_bytes(&self) -> usize {
        let start_bit = self.start_bit;
        let length = self.length;

        let bytes = match self.byte_order {
            ByteOrder::LittleEndian => start_bit.saturating_add(length).saturating_add(7) / 8,
            ByteOrder::BigEndian => {
                let bits_first_byte = start_bit % 8 + 1;
                let remaining = length.saturating_sub(bits_first_byte);
                (start_bit / 8 + 1).saturating_add(remaining.saturating_add(7) / 8)
            }
        };
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }

    /// Extract the raw value of this signal from a frame payload
    ///
    /// Fails when the bit span reaches past the payload; absent bytes are
    /// never read as zero.
    pub fn decode(&self, data: &[u8]) -> Result<RawValue> {
        let length = self.length as usize;
        if length == 0 || length > 64 {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "signal '{}' has unsupported length {}",
                self.name, self.length
            )));
        }

        let required = self.required_bytes();
        if required > data.len() {
            return Err(DecoderError::SignalOutOfRange {
                signal: self.name.clone(),
                required,
                available: data.len(),
            });
        }

        // The span fits in the payload, so the start bit is below 64
        let bits = match self.byte_order {
            ByteOrder::LittleEndian => extract_little_endian(data, self.start_bit as usize, length),
            ByteOrder::BigEndian => extract_big_endian(data, self.start_bit as usize, length),
        };

        Ok(match self.value_type {
            ValueType::Signed => sign_extend(bits, length),
            ValueType::Unsigned | ValueType::Float32 | ValueType::Float64 => bits as i64,
        })
    }

    /// Apply factor and offset to a raw value
    pub fn raw_to_physical(&self, raw: RawValue) -> f64 {
        let value = match self.value_type {
            ValueType::Signed => raw as f64,
            ValueType::Unsigned => raw as u64 as f64,
            ValueType::Float32 => f32::from_bits(raw as u64 as u32) as f64,
            ValueType::Float64 => f64::from_bits(raw as u64),
        };
        self.offset + self.factor * value
    }

    /// Label for a raw value; the first matching description wins
    pub fn describe(&self, raw: RawValue) -> Option<&str> {
        self.value_descriptions
            .iter()
            .find(|desc| desc.raw == raw)
            .map(|desc| desc.label.as_str())
    }
}

/// Extract signal with little-endian (Intel) byte order
fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
    let mut result: u64 = 0;

    for i in 0..length {
        let bit_pos = start_bit + i;
        let bit_value = (data[bit_pos / 8] >> (bit_pos % 8)) & 0x01;
        result |= (bit_value as u64) << i;
    }

    result
}

/// Extract signal with big-endian (Motorola) byte order
fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
    let mut result: u64 = 0;
    let mut byte_idx = start_bit / 8;
    let mut bit_in_byte = start_bit % 8;

    for _ in 0..length {
        let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
        result = (result << 1) | bit_value as u64;

        if bit_in_byte == 0 {
            bit_in_byte = 7;
            byte_idx += 1;
        } else {
            bit_in_byte -= 1;
        }
    }

    result
}

/// Sign-extend a value from N bits to 64 bits
fn sign_extend(value: u64, bit_length: usize) -> i64 {
    if bit_length == 0 || bit_length >= 64 {
        return value as i64;
    }

    let sign_bit = 1u64 << (bit_length - 1);
    if (value & sign_bit) != 0 {
        let mask = !0u64 << bit_length;
        (value | mask) as i64
    } else {
        value as i64
    }
}
