// ── Wire protocol ──
//
// One request per connection, plain text, at most MAX_PAYLOAD bytes:
//
//   "Need object count"      count query, answered with decimal text
//   "<prefix>_<index>:<value>"  measurement report, no reply
//
// The prefix is ignored but must not itself contain '_': exactly one
// underscore separates prefix from payload. The index is zero-based on
// the wire; entity ids start at 1, so id = index + 1. Anything that
// fails to parse is dropped silently.

use fleetwatch_core::model::EntityId;
use thiserror::Error;

/// Exact count-query payload.
pub const COUNT_QUERY: &str = "Need object count";

/// Upper bound on a request payload; longer input is truncated by the
/// single fixed-size read.
pub const MAX_PAYLOAD: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    /// Reply with the number of registered entities.
    CountQuery,
    /// Upsert `value` for the entity derived from the wire index.
    Measurement { id: EntityId, value: f64 },
}

/// Why a payload was dropped. Only ever logged at debug level; the
/// sender gets no reply either way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty payload")]
    Empty,
    #[error("payload is not valid utf-8")]
    NotUtf8,
    #[error("no '_<index>:<value>' section in {0:?}")]
    MissingSeparator(String),
    #[error("bad entity index {0:?}")]
    BadIndex(String),
    #[error("bad measurement value {0:?}")]
    BadValue(String),
}

/// Parse one raw request payload.
pub fn parse(raw: &[u8]) -> Result<Request, ProtocolError> {
    let text = std::str::from_utf8(raw).map_err(|_| ProtocolError::NotUtf8)?;
    // Tolerate NUL padding and a trailing newline from casual probes.
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if text.is_empty() {
        return Err(ProtocolError::Empty);
    }
    if text == COUNT_QUERY {
        return Ok(Request::CountQuery);
    }

    // Split at the first '_'; a second one lands in the index and fails
    // the parse below, so only single-underscore payloads get through.
    let (_, tail) = text
        .split_once('_')
        .ok_or_else(|| ProtocolError::MissingSeparator(text.to_owned()))?;
    let (index, value) = tail
        .split_once(':')
        .ok_or_else(|| ProtocolError::MissingSeparator(text.to_owned()))?;

    let index: u32 = index
        .parse()
        .map_err(|_| ProtocolError::BadIndex(index.to_owned()))?;
    // Wire indices are zero-based; ids start at 1.
    let id = index
        .checked_add(1)
        .and_then(|raw| EntityId::new(raw).ok())
        .ok_or_else(|| ProtocolError::BadIndex(index.to_string()))?;

    let value: f64 = value
        .parse()
        .map_err(|_| ProtocolError::BadValue(value.to_owned()))?;
    if !value.is_finite() {
        return Err(ProtocolError::BadValue(value.to_string()));
    }

    Ok(Request::Measurement { id, value })
}
