//! Message Decoding Engine
//!
//! Turns a frame and its resolved message definition into a [`DecodeResult`],
//! substituting value-description labels where the catalog defines one.

use crate::signals::database::{MessageDefinition, SignalDefinition};
use crate::types::{DecodeResult, DecodedSignal, DisplayedValue, Frame, RawValue, Result};

/// Message decoder - extracts signals from CAN frames
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode the signals of `message_def` from `frame`
    ///
    /// Every declared signal appears, in catalog-declared order. With
    /// `skip_inactive_multiplexed`, multiplexed signals whose switch value
    /// does not match the decoded multiplexor are left out.
    /// Any signal that fails to decode fails the whole frame.
    pub fn decode_message(
        frame: &Frame,
        message_def: &MessageDefinition,
        skip_inactive_multiplexed: bool,
    ) -> Result<DecodeResult> {
        let multiplexer_value = match message_def.multiplexer() {
            Some(mux_signal) if skip_inactive_multiplexed => {
                Some(mux_signal.decode(&frame.data)? as u64)
            }
            _ => None,
        };

        let mut signals = Vec::with_capacity(message_def.signals.len());
        for signal in &message_def.signals {
            if skip_inactive_multiplexed && !Self::is_active(signal, multiplexer_value) {
                log::trace!(
                    "Skipping multiplexed signal {} (selector {:?})",
                    signal.name,
                    multiplexer_value
                );
                continue;
            }

            let raw_value = signal.decode(&frame.data)?;
            signals.push(DecodedSignal {
                name: signal.name.clone(),
                value: Self::display_value(signal, raw_value),
                raw_value,
            });
        }

        Ok(DecodeResult {
            bus: frame.bus.clone(),
            message_id: frame.can_id,
            message_name: message_def.name.clone(),
            signals,
        })
    }

    /// Description label for the raw value, or the physical value if none
    fn display_value(signal: &SignalDefinition, raw_value: RawValue) -> DisplayedValue {
        match signal.describe(raw_value) {
            Some(label) => DisplayedValue::Label(label.to_string()),
            None => DisplayedValue::Physical(signal.raw_to_physical(raw_value)),
        }
    }

    fn is_active(signal: &SignalDefinition, multiplexer_value: Option<u64>) -> bool {
        match (&signal.multiplexer_info, multiplexer_value) {
            (None, _) => true,
            (Some(mux_info), Some(current)) => mux_info.multiplexer_values.contains(&current),
            (Some(_), None) => false,
        }
    }
}
