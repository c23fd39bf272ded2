//! DBC file parser
//!
//! Parses Vector DBC files and converts them into a [`Catalog`].

use crate::signals::database::{
    ByteOrder, Catalog, MessageDefinition, MultiplexerInfo, SignalDefinition, ValueDescription,
    ValueType,
};
use crate::types::{DecoderError, RawValue, Result};
use std::path::Path;

/// Parse a DBC file into a catalog
pub fn parse_dbc_file(path: &Path) -> Result<Catalog> {
    log::info!("Parsing DBC file: {:?}", path);

    // Read as bytes first to handle non-UTF8 encodings
    let bytes = std::fs::read(path).map_err(|e| {
        DecoderError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    let dbc_content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            // Latin-1 maps every byte to the code point of the same value
            log::warn!("DBC file {:?} is not UTF-8, trying Latin-1 encoding", path);
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let source_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.dbc");

    let catalog = parse_dbc_str(&dbc_content, source_filename)?;

    log::info!(
        "Parsed {} messages from {:?}",
        catalog.messages().len(),
        path
    );

    Ok(catalog)
}

/// Parse DBC content already held in memory
pub fn parse_dbc_str(content: &str, source: &str) -> Result<Catalog> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes()).map_err(|e| {
        DecoderError::DbcParseError(format!("Failed to parse DBC {}: {:?}", source, e))
    })?;

    let mut messages = Vec::new();
    for dbc_msg in dbc.messages() {
        messages.push(convert_message(&dbc, dbc_msg)?);
    }

    Ok(Catalog::from_messages(source, messages))
}

/// Convert a can-dbc message to our MessageDefinition
fn convert_message(dbc: &can_dbc::DBC, dbc_msg: &can_dbc::Message) -> Result<MessageDefinition> {
    let multiplexer_signal_name = dbc_msg
        .signals()
        .iter()
        .find(|sig| matches!(sig.multiplexer_indicator(), can_dbc::MultiplexIndicator::Multiplexor))
        .map(|sig| sig.name().to_string());

    let message_id = dbc_msg.message_id().0;
    let mut signals = Vec::with_capacity(dbc_msg.signals().len());
    for dbc_sig in dbc_msg.signals() {
        signals.push(convert_signal(
            dbc,
            message_id,
            dbc_sig,
            multiplexer_signal_name.as_deref(),
        )?);
    }

    Ok(MessageDefinition {
        id: message_id,
        name: dbc_msg.message_name().to_string(),
        signals,
        multiplexer_signal: multiplexer_signal_name,
    })
}

/// Convert a can-dbc signal to our SignalDefinition
fn convert_signal(
    dbc: &can_dbc::DBC,
    message_id: u32,
    dbc_sig: &can_dbc::Signal,
    multiplexer_signal_name: Option<&str>,
) -> Result<SignalDefinition> {
    let byte_order = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    let extended_type =
        dbc.extended_value_type_for_signal(can_dbc::MessageId(message_id), dbc_sig.name());
    let value_type = match (extended_type, *dbc_sig.value_type()) {
        (Some(can_dbc::SignalExtendedValueType::IEEEfloat32Bit), _) => ValueType::Float32,
        (Some(can_dbc::SignalExtendedValueType::IEEEdouble64bit), _) => ValueType::Float64,
        (_, can_dbc::ValueType::Signed) => ValueType::Signed,
        (_, can_dbc::ValueType::Unsigned) => ValueType::Unsigned,
    };

    let length = *dbc_sig.signal_size();
    let expected_length = match value_type {
        ValueType::Float32 => Some(32),
        ValueType::Float64 => Some(64),
        _ => None,
    };
    if let Some(expected) = expected_length {
        if length != expected {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "float signal '{}' is {} bits, expected {}",
                dbc_sig.name(),
                length,
                expected
            )));
        }
    }

    let value_descriptions: Vec<ValueDescription> = dbc
        .value_descriptions_for_signal(can_dbc::MessageId(message_id), dbc_sig.name())
        .map(|descs| {
            descs
                .iter()
                .map(|desc| ValueDescription {
                    raw: description_raw(*desc.a(), value_type),
                    label: desc.b().to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let multiplexer_info = match *dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::MultiplexedSignal(switch_value)
        | can_dbc::MultiplexIndicator::MultiplexorAndMultiplexedSignal(switch_value) => {
            if multiplexer_signal_name.is_none() {
                return Err(DecoderError::InvalidSignalDefinition(format!(
                    "Multiplexed signal '{}' but no multiplexer found",
                    dbc_sig.name()
                )));
            }
            Some(MultiplexerInfo {
                multiplexer_values: vec![switch_value],
            })
        }
        _ => None,
    };

    Ok(SignalDefinition {
        name: dbc_sig.name().to_string(),
        start_bit: *dbc_sig.start_bit(),
        length,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        value_descriptions,
        multiplexer_info,
    })
}

/// Raw value a description applies to, in the same encoding `decode` yields
///
/// Unsigned 64-bit values above `i64::MAX` are stored bit-reinterpreted.
fn description_raw(value: f64, value_type: ValueType) -> RawValue {
    match value_type {
        ValueType::Unsigned if value > i64::MAX as f64 => value as u64 as RawValue,
        _ => value as RawValue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = r#"
VERSION ""

NS_ :
    NS_DESC_
    CM_
    BA_DEF_
    BA_
    VAL_
    SIG_VALTYPE_

BS_:

BU_: ECU1 ECU2
"#;

    fn dbc(body: &str) -> String {
        format!("{}\n{}\n", HEADER, body)
    }

    #[test]
    fn test_parse_simple_dbc_file() {
        let content = dbc(r#"
BO_ 291 EngineData: 8 ECU1
 SG_ EngineSpeed : 0|16@1+ (1,0) [0|8000] "rpm" ECU2
 SG_ EngineTemp : 16|8@1+ (1,-40) [-40|215] "C" ECU2

BO_ 512 BatteryStatus: 8 ECU1
 SG_ BatteryVoltage : 0|16@1+ (0.01,0) [0|16] "V" ECU2
"#);

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let catalog = parse_dbc_file(temp_file.path()).unwrap();
        assert_eq!(catalog.messages().len(), 2);

        let msg1 = catalog.find_message(291).unwrap();
        assert_eq!(msg1.name, "EngineData");
        let names: Vec<&str> = msg1.signals.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["EngineSpeed", "EngineTemp"]);

        let temp = &msg1.signals[1];
        assert_eq!(temp.start_bit, 16);
        assert_eq!(temp.length, 8);
        assert_eq!(temp.offset, -40.0);
        assert_eq!(temp.byte_order, ByteOrder::LittleEndian);
    }

    #[test]
    fn test_parse_value_descriptions() {
        let content = dbc(r#"
BO_ 256 Speed: 1 ECU1
 SG_ state : 0|2@1+ (1,0) [0|3] "" ECU2

VAL_ 256 state 0 "IDLE" 1 "ACTIVE" 2 "FAULT" ;
"#);

        let catalog = parse_dbc_str(&content, "inline.dbc").unwrap();
        let state = &catalog.find_message(0x100).unwrap().signals[0];
        assert_eq!(state.value_descriptions.len(), 3);
        assert_eq!(state.describe(1), Some("ACTIVE"));
    }

    #[test]
    fn test_parse_multiplexed_signals() {
        let content = dbc(r#"
BO_ 512 MultiplexedMsg: 8 ECU1
 SG_ Mode M : 0|8@1+ (1,0) [0|3] "" ECU1
 SG_ SignalA m0 : 8|16@1+ (1,0) [0|100] "%" ECU1
 SG_ SignalB m1 : 8|16@1+ (0.1,0) [0|1000] "mV" ECU1
"#);

        let catalog = parse_dbc_str(&content, "mux.dbc").unwrap();
        let msg = catalog.find_message(512).unwrap();
        assert!(msg.is_multiplexed());
        assert_eq!(msg.multiplexer_signal, Some("Mode".to_string()));

        let sig_b = msg.signals.iter().find(|s| s.name == "SignalB").unwrap();
        let mux = sig_b.multiplexer_info.as_ref().unwrap();
        assert_eq!(mux.multiplexer_values, vec![1]);
    }

    #[test]
    fn test_parse_big_endian_signed() {
        let content = dbc(r#"
BO_ 768 Torque: 2 ECU1
 SG_ Demand : 7|16@0- (0.1,0) [-3276.8|3276.7] "Nm" ECU2
"#);

        let catalog = parse_dbc_str(&content, "torque.dbc").unwrap();
        let demand = &catalog.find_message(768).unwrap().signals[0];
        assert_eq!(demand.byte_order, ByteOrder::BigEndian);
        assert_eq!(demand.value_type, ValueType::Signed);
    }

    #[test]
    fn test_start_bit_above_u16_is_kept() {
        let content = dbc(r#"
BO_ 256 Far: 1 ECU1
 SG_ far : 65536|8@1+ (1,0) [0|255] "" ECU2
"#);

        let catalog = parse_dbc_str(&content, "far.dbc").unwrap();
        let far = &catalog.find_message(256).unwrap().signals[0];
        assert_eq!(far.start_bit, 65536);
        assert!(matches!(
            far.decode(&[0x2A]),
            Err(DecoderError::SignalOutOfRange { .. })
        ));
    }

    #[test]
    fn test_unsigned_64_bit_description_matches_decoded_raw() {
        let content = dbc(r#"
BO_ 768 Counter: 8 ECU1
 SG_ count : 0|64@1+ (1,0) [0|0] "" ECU2

VAL_ 768 count 18446744073709551615 "INVALID" 3 "THREE" ;
"#);

        let catalog = parse_dbc_str(&content, "counter.dbc").unwrap();
        let count = &catalog.find_message(768).unwrap().signals[0];
        let raw = count.decode(&[0xFF; 8]).unwrap();
        assert_eq!(count.describe(raw), Some("INVALID"));
        assert_eq!(count.describe(3), Some("THREE"));
    }

    #[test]
    fn test_description_raw_encoding() {
        assert_eq!(description_raw(18446744073709551615.0, ValueType::Unsigned), -1);
        assert_eq!(description_raw(-2.0, ValueType::Signed), -2);
        assert_eq!(description_raw(5.0, ValueType::Unsigned), 5);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = parse_dbc_file(Path::new("/nonexistent/catalog.dbc"));
        assert!(matches!(result, Err(DecoderError::DbcParseError(_))));
    }
}
