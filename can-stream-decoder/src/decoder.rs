//! Streaming dispatcher
//!
//! This module provides the primary interface for the decoder library. The
//! Dispatcher owns the bus registry and turns each input line into at most
//! one output record.

use crate::config::DecoderConfig;
use crate::frame_parser::{parse_line, LineMatch, Mismatch};
use crate::message_decoder::MessageDecoder;
use crate::output;
use crate::registry::BusRegistry;
use crate::types::{DecodeResult, DecoderError, Result};
use std::io::{BufRead, Write};

/// What happened to one input line
#[derive(Debug)]
pub enum LineOutcome {
    /// The frame resolved to a message and every signal decoded
    Decoded(DecodeResult),
    /// The line is not a frame
    NotAFrame(Mismatch),
    /// No catalog is bound to the frame's bus
    UnknownBus(String),
    /// The message ID is excluded by the configured filter
    Filtered(u32),
    /// The bus catalog has no message with this ID
    UnknownMessage { bus: String, can_id: u32 },
    /// A signal could not be decoded; the frame is dropped
    DecodeFailed(DecoderError),
}

/// Counters collected over one stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Lines read from the input
    pub lines: usize,
    /// Lines that parsed as frames
    pub frames: usize,
    /// Records written to the output
    pub emitted: usize,
    /// Frames dropped because a signal failed to decode
    pub decode_failures: usize,
}

/// Decodes a stream of candump lines against the registered buses
pub struct Dispatcher {
    registry: BusRegistry,
    config: DecoderConfig,
}

impl Dispatcher {
    /// Create a dispatcher over a fully loaded registry
    pub fn new(registry: BusRegistry, config: DecoderConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &BusRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Classify and decode one line without writing anything
    pub fn decode_line(&self, line: &str) -> LineOutcome {
        let frame = match parse_line(line) {
            LineMatch::Matched(frame) => frame,
            LineMatch::NoMatch(reason) => return LineOutcome::NotAFrame(reason),
        };

        let Some(catalog) = self.registry.resolve(&frame.bus) else {
            return LineOutcome::UnknownBus(frame.bus);
        };

        if !self.config.should_process_message(frame.can_id) {
            return LineOutcome::Filtered(frame.can_id);
        }

        let Some(message_def) = catalog.find_message(frame.can_id) else {
            return LineOutcome::UnknownMessage {
                bus: frame.bus,
                can_id: frame.can_id,
            };
        };

        log::debug!(
            "Decoding message: {} (ID 0x{:X}) on {}",
            message_def.name,
            frame.can_id,
            frame.bus
        );

        match MessageDecoder::decode_message(
            &frame,
            message_def,
            self.config.skip_inactive_multiplexed,
        ) {
            Ok(result) => LineOutcome::Decoded(result),
            Err(e) => LineOutcome::DecodeFailed(e),
        }
    }

    /// Decode one line and write its record, if any
    ///
    /// Returns whether a record was written. Only output errors are returned;
    /// every per-line problem is logged and skipped.
    pub fn process_line<W: Write>(&self, line: &str, out: &mut W) -> Result<bool> {
        let mut stats = StreamStats::default();
        self.handle_line(line, out, &mut stats)?;
        Ok(stats.emitted > 0)
    }

    /// Process every line of `input` until end of stream
    ///
    /// Lines are read as raw bytes and converted lossily, so a line with
    /// invalid UTF-8 is skipped like any other non-frame line.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, out: &mut W) -> Result<StreamStats> {
        let mut stats = StreamStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            stats.lines += 1;

            let text = String::from_utf8_lossy(&buf);
            let line = text.trim_end_matches(&['\n', '\r'][..]);
            self.handle_line(line, out, &mut stats)?;
        }

        Ok(stats)
    }

    fn handle_line<W: Write>(&self, line: &str, out: &mut W, stats: &mut StreamStats) -> Result<()> {
        let outcome = self.decode_line(line);
        if !matches!(outcome, LineOutcome::NotAFrame(_)) {
            stats.frames += 1;
        }

        match outcome {
            LineOutcome::Decoded(result) => {
                output::emit(out, &result, self.config.output_format)?;
                out.flush()?;
                stats.emitted += 1;
            }
            LineOutcome::NotAFrame(reason) => {
                log::trace!("Ignoring line {:?}: {}", line, reason);
            }
            LineOutcome::UnknownBus(bus) => {
                log::trace!("Unknown bus: {}", bus);
            }
            LineOutcome::Filtered(can_id) => {
                log::trace!("Filtered CAN ID: 0x{:X}", can_id);
            }
            LineOutcome::UnknownMessage { bus, can_id } => {
                log::trace!("Unknown CAN ID: 0x{:X} on {}", can_id, bus);
            }
            LineOutcome::DecodeFailed(e) => {
                stats.decode_failures += 1;
                log::warn!("Failed to decode frame {:?}: {}", line, e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::database::tests::{message, plain_signal};
    use crate::signals::Catalog;

    fn dispatcher(config: DecoderConfig) -> Dispatcher {
        let mut registry = BusRegistry::new();
        registry
            .register(
                "can0",
                Catalog::from_messages(
                    "test.dbc",
                    vec![message(0x100, "Speed", vec![plain_signal("kph", 0, 8)])],
                ),
            )
            .unwrap();
        Dispatcher::new(registry, config)
    }

    #[test]
    fn test_decode_line_outcomes() {
        let d = dispatcher(DecoderConfig::new());

        assert!(matches!(d.decode_line("can0 100 [1] 32"), LineOutcome::Decoded(_)));
        assert!(matches!(d.decode_line("garbage"), LineOutcome::NotAFrame(_)));
        assert!(matches!(d.decode_line("can9 100 [1] 32"), LineOutcome::UnknownBus(ref b) if b == "can9"));
        assert!(matches!(
            d.decode_line("can0 999 [1] 32"),
            LineOutcome::UnknownMessage { can_id: 0x999, .. }
        ));
        assert!(matches!(d.decode_line("can0 100 [0]"), LineOutcome::DecodeFailed(_)));
    }

    #[test]
    fn test_message_filter() {
        let d = dispatcher(DecoderConfig::new().with_message_filter(vec![0x200]));
        assert!(matches!(d.decode_line("can0 100 [1] 32"), LineOutcome::Filtered(0x100)));
    }

    #[test]
    fn test_process_line_writes_only_decoded() {
        let d = dispatcher(DecoderConfig::new());
        let mut out = Vec::new();

        assert!(d.process_line("can0 100 [1] 32", &mut out).unwrap());
        assert!(!d.process_line("can0 999 [1] 32", &mut out).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "kph: 50\n");
    }

    #[test]
    fn test_run_counts() {
        let d = dispatcher(DecoderConfig::new());
        let input = b"can0 100 [1] 32\r\nnoise\ncan1 100 [1] 01\ncan0 100 [0]\ncan0 100 [1] 0A";
        let mut out = Vec::new();

        let stats = d.run(&input[..], &mut out).unwrap();
        assert_eq!(
            stats,
            StreamStats {
                lines: 5,
                frames: 4,
                emitted: 2,
                decode_failures: 1,
            }
        );
        assert_eq!(String::from_utf8(out).unwrap(), "kph: 50\nkph: 10\n");
    }
}
