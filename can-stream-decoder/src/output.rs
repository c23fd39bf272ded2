//! Output rendering
//!
//! Human output is one `name: value, ...` line per frame. JSON output is one
//! pretty-printed object per frame, indented with four spaces.

use crate::types::{DecodeResult, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Output encoding, selected once per run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-joined `name: value` pairs
    #[default]
    Human,
    /// Structured record with bus, id, name and signals
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Human => write!(f, "human"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a decode result without a trailing newline
pub fn render(result: &DecodeResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(render_human(result)),
        OutputFormat::Json => render_json(result),
    }
}

/// Write a decode result followed by a newline
pub fn emit<W: Write>(out: &mut W, result: &DecodeResult, format: OutputFormat) -> Result<()> {
    let rendered = render(result, format)?;
    writeln!(out, "{}", rendered)?;
    Ok(())
}

fn render_human(result: &DecodeResult) -> String {
    result
        .signals
        .iter()
        .map(|signal| format!("{}: {}", signal.name, signal.value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_json(result: &DecodeResult) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    result.serialize(&mut serializer)?;

    // serde_json only ever writes UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
