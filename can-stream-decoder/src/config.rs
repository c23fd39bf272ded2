//! Decoder configuration types
//!
//! Settings chosen once per run: how results are rendered and which message
//! identifiers are of interest.

use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};

/// Configuration for the streaming dispatcher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Output encoding for decoded frames
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Optional: only decode these specific CAN message IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,

    /// Leave out multiplexed signals whose switch value is not selected
    #[serde(default)]
    pub skip_inactive_multiplexed: bool,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: select the output encoding
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Builder method: only emit multiplexed signals selected by the multiplexor
    pub fn with_skip_inactive_multiplexed(mut self, skip: bool) -> Self {
        self.skip_inactive_multiplexed = skip;
        self
    }

    /// Check if a message ID should be processed
    pub fn should_process_message(&self, can_id: u32) -> bool {
        match &self.message_filter {
            Some(messages) => messages.contains(&can_id),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_output_format(OutputFormat::Json)
            .with_message_filter(vec![0x100]);

        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.message_filter, Some(vec![0x100]));
        assert!(!config.skip_inactive_multiplexed);

        let config = config.with_skip_inactive_multiplexed(true);
        assert!(config.skip_inactive_multiplexed);
    }

    #[test]
    fn test_filter_logic() {
        let config = DecoderConfig::new().with_message_filter(vec![0x123, 0x456]);

        assert!(config.should_process_message(0x123));
        assert!(config.should_process_message(0x456));
        assert!(!config.should_process_message(0x789));
    }

    #[test]
    fn test_no_filters() {
        let config = DecoderConfig::new();
        assert_eq!(config.output_format, OutputFormat::Human);
        assert!(config.should_process_message(0x7FF));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: DecoderConfig = serde_json::from_str(r#"{"output_format":"json"}"#).unwrap();
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(config.message_filter.is_none());
        assert!(!config.skip_inactive_multiplexed);
    }
}
