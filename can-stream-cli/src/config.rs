//! Configuration loading and merging
//!
//! Settings come from an optional TOML file and the command line. Buses from
//! the file are registered first, then those given with `--bus`.

use anyhow::{Context, Result};
use can_stream_decoder::{BusSpec, DecoderConfig, OutputFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default, rename = "bus")]
    pub buses: Vec<BusConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BusConfig {
    pub name: String,
    pub catalog: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterConfig {
    pub message_ids: Option<Vec<u32>>,
    #[serde(default)]
    pub skip_inactive_multiplexed: bool,
}

/// Problems with the combined command line and config file
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error("At least one --bus=<bus name>:<DBC filename> argument required")]
    NoBuses,
}

/// Settings for one run after merging all sources
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub buses: Vec<BusSpec>,
    pub decoder: DecoderConfig,
}

/// Command-line values that take part in merging
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub buses: Vec<BusSpec>,
    pub json: bool,
    pub message_ids: Vec<u32>,
    pub skip_inactive_multiplexed: bool,
}

/// Load configuration from a TOML file
///
/// Relative catalog paths are resolved against the file's directory.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let Some(base) = path.parent() {
        for bus in &mut config.buses {
            if bus.catalog.is_relative() {
                bus.catalog = base.join(&bus.catalog);
            }
        }
    }

    Ok(config)
}

/// Merge the config file (if any) with command-line values
pub fn resolve_settings(file: Option<AppConfig>, cli: CliOverrides) -> Result<Settings> {
    let file = file.unwrap_or_default();

    let mut buses: Vec<BusSpec> = file
        .buses
        .into_iter()
        .map(|bus| BusSpec::new(bus.name, bus.catalog))
        .collect();
    buses.extend(cli.buses);

    if buses.is_empty() {
        return Err(ArgumentError::NoBuses.into());
    }

    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        file.output.format
    };

    let mut decoder = DecoderConfig::new()
        .with_output_format(output_format)
        .with_skip_inactive_multiplexed(
            cli.skip_inactive_multiplexed || file.filter.skip_inactive_multiplexed,
        );
    let mut message_ids = file.filter.message_ids.unwrap_or_default();
    message_ids.extend(cli.message_ids);
    if !message_ids.is_empty() {
        decoder = decoder.with_message_filter(message_ids);
    }

    Ok(Settings { buses, decoder })
}
