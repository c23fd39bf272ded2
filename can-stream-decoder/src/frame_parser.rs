//! candump line parser
//!
//! Turns one line of monitor-tool output such as
//!
//! ```text
//! can0  123   [4]  DE AD BE EF
//! ```
//!
//! into a [`Frame`]. Anything that does not fit that shape is reported as
//! [`LineMatch::NoMatch`] so callers never see a partially populated frame.

use crate::types::{Frame, MAX_FRAME_BYTES};

/// Outcome of matching a line against the frame shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMatch {
    /// The line is a well-formed frame
    Matched(Frame),
    /// The line is not a frame, with the first reason found
    NoMatch(Mismatch),
}

/// Why a line did not match the frame shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Mismatch {
    #[error("empty line")]
    Empty,

    #[error("missing message identifier")]
    MissingId,

    #[error("invalid message identifier '{0}'")]
    InvalidId(String),

    #[error("missing byte count")]
    MissingByteCount,

    #[error("invalid byte count '{0}'")]
    InvalidByteCount(String),

    #[error("invalid data byte '{0}'")]
    InvalidByte(String),

    #[error("declared {declared} data bytes but found {found}")]
    ByteCountMismatch { declared: usize, found: usize },
}

/// Number of hex digits in a standard message identifier
const ID_DIGITS: usize = 3;

/// Parse one input line
pub fn parse_line(line: &str) -> LineMatch {
    match parse_frame(line) {
        Ok(frame) => LineMatch::Matched(frame),
        Err(reason) => LineMatch::NoMatch(reason),
    }
}

fn parse_frame(line: &str) -> Result<Frame, Mismatch> {
    let mut tokens = line.split_whitespace();

    let bus = tokens.next().ok_or(Mismatch::Empty)?;
    let id_token = tokens.next().ok_or(Mismatch::MissingId)?;
    let can_id = parse_id(id_token)?;
    let count_token = tokens.next().ok_or(Mismatch::MissingByteCount)?;
    let declared = parse_byte_count(count_token)?;

    let data = tokens.map(parse_byte).collect::<Result<Vec<u8>, Mismatch>>()?;
    if data.len() != declared {
        return Err(Mismatch::ByteCountMismatch {
            declared,
            found: data.len(),
        });
    }

    Ok(Frame {
        bus: bus.to_string(),
        can_id,
        data,
    })
}

fn is_hex(token: &str, digits: usize) -> bool {
    token.len() == digits && token.bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_id(token: &str) -> Result<u32, Mismatch> {
    if !is_hex(token, ID_DIGITS) {
        return Err(Mismatch::InvalidId(token.to_string()));
    }
    u32::from_str_radix(token, 16).map_err(|_| Mismatch::InvalidId(token.to_string()))
}

/// Parses `[n]` with `0 <= n <= 8`
fn parse_byte_count(token: &str) -> Result<usize, Mismatch> {
    let invalid = || Mismatch::InvalidByteCount(token.to_string());

    let digits = token
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(invalid)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    match digits.parse::<usize>() {
        Ok(count) if count <= MAX_FRAME_BYTES => Ok(count),
        _ => Err(invalid()),
    }
}

fn parse_byte(token: &str) -> Result<u8, Mismatch> {
    if !is_hex(token, 2) {
        return Err(Mismatch::InvalidByte(token.to_string()));
    }
    u8::from_str_radix(token, 16).map_err(|_| Mismatch::InvalidByte(token.to_string()))
}
