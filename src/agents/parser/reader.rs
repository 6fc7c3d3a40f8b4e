//! Event stream reader
//!
//! Classifies raw stream items (JSON objects shaped like the service's wire
//! events) into [`StreamEvent`]s, and interprets decoded text chunks.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tracing::debug;

use super::wire::TracePart;
use crate::agents::domain::StreamEvent;
use crate::agents::error::ParseDiagnostic;

/// Markers of service-side failures leaking into the answer stream
pub const DEFAULT_SYSTEM_ERROR_MARKERS: [&str; 3] =
    ["RerunData", "InternalServerError", "ValidationException"];

/// Preview length of a filtered chunk in diagnostics
const FILTERED_PREVIEW_CHARS: usize = 100;

/// Classify one raw stream item.
///
/// Returns `None` for items that are neither chunks nor traces, or chunks
/// without a byte payload.
pub fn read_event(raw: &Value) -> Option<Result<StreamEvent, ParseDiagnostic>> {
    if let Some(chunk) = raw.get("chunk") {
        let bytes = chunk.get("bytes")?;
        return Some(decode_bytes(bytes).map(StreamEvent::bytes));
    }

    if let Some(trace) = raw.get("trace") {
        return Some(
            serde_json::from_value::<TracePart>(trace.clone())
                .map(StreamEvent::from)
                .map_err(|e| ParseDiagnostic::TraceParse(e.to_string())),
        );
    }

    debug!("Ignoring stream item without chunk or trace");
    None
}

/// Read a recorded stream in JSON Lines form (one raw item per line)
pub fn read_json_lines(input: &str) -> Vec<Result<StreamEvent, ParseDiagnostic>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match serde_json::from_str::<Value>(line) {
            Ok(raw) => read_event(&raw),
            Err(e) => Some(Err(ParseDiagnostic::Decode(format!("line {}: {}", idx + 1, e)))),
        })
        .collect()
}

/// Chunk bytes are base64 on the wire; an array of byte values is also accepted
fn decode_bytes(bytes: &Value) -> Result<Vec<u8>, ParseDiagnostic> {
    match bytes {
        Value::String(encoded) => STANDARD
            .decode(encoded)
            .map_err(|e| ParseDiagnostic::Decode(format!("invalid base64 chunk: {}", e))),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| ParseDiagnostic::Decode(format!("invalid byte value: {}", item)))
            })
            .collect(),
        other => Err(ParseDiagnostic::Decode(format!(
            "unsupported chunk payload: {}",
            other
        ))),
    }
}

/// What to do with one text chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Append this text to the final answer
    Append(String),
    /// Nothing to append
    Skip,
    /// Drop the chunk and record a diagnostic
    Reject(ParseDiagnostic),
}

/// Interpret the decoded text of one chunk.
///
/// JSON objects contribute their string `text` field, or else their string
/// `content` field. JSON strings and arrays contribute nothing. Other text,
/// bare numbers and literals included, is appended verbatim unless it is
/// blank or looks like the start of a JSON payload.
pub fn interpret_chunk(decoded: &str, markers: &[String]) -> ChunkOutcome {
    if markers.iter().any(|m| decoded.contains(m.as_str())) {
        let preview: String = decoded.chars().take(FILTERED_PREVIEW_CHARS).collect();
        return ChunkOutcome::Reject(ParseDiagnostic::FilteredSystemError(preview));
    }

    match serde_json::from_str::<Value>(decoded) {
        Ok(Value::Object(fields)) => ["text", "content"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .map_or(ChunkOutcome::Skip, |text| ChunkOutcome::Append(text.to_string())),
        Ok(Value::String(_) | Value::Array(_)) => ChunkOutcome::Skip,
        _ if decoded.trim().is_empty() || decoded.starts_with('{') => ChunkOutcome::Skip,
        _ => ChunkOutcome::Append(decoded.to_string()),
    }
}
