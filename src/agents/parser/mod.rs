//! Response parsing
//!
//! A [`ResponseParser`] consumes the events of one invocation in order and
//! produces a [`ParsedResult`]. Each event is handled on its own: a bad
//! chunk or trace becomes a diagnostic and parsing continues.

pub mod assembler;
pub mod classifier;
pub mod reader;
mod trace;
mod wire;

pub use assembler::{dedup_lines, synthesize};
pub use classifier::{classify, Classification};
pub use reader::{
    interpret_chunk, read_event, read_json_lines, ChunkOutcome,
    DEFAULT_SYSTEM_ERROR_MARKERS,
};

use tracing::{debug, warn};

use crate::agents::config::AgentCatalog;
use crate::agents::domain::{ParsedResult, StreamEvent};
use crate::agents::error::{ParseDiagnostic, RuntimeError};

/// Default system-error markers as owned strings
pub fn default_markers() -> Vec<String> {
    DEFAULT_SYSTEM_ERROR_MARKERS
        .iter()
        .map(|m| m.to_string())
        .collect()
}

/// Incremental parser for one invocation's event stream
#[derive(Debug, Default)]
pub struct ResponseParser {
    result: ParsedResult,
    markers: Vec<String>,
}

impl ResponseParser {
    /// Create a parser filtering the given system-error markers
    pub fn new(markers: Vec<String>) -> Self {
        Self {
            result: ParsedResult::default(),
            markers,
        }
    }

    pub fn with_default_markers() -> Self {
        Self::new(default_markers())
    }

    /// Consume one event
    pub fn push(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::TextChunk { bytes } => self.push_chunk(bytes),
            StreamEvent::TraceEvent {
                collaborator_name,
                sections,
            } => trace::interpret(&mut self.result, collaborator_name, sections),
        }
    }

    fn push_chunk(&mut self, bytes: Vec<u8>) {
        let decoded = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                self.record(ParseDiagnostic::Decode(e.to_string()));
                return;
            }
        };

        let outcome = interpret_chunk(&decoded, &self.markers);
        self.result.raw_chunks.push(decoded);

        match outcome {
            ChunkOutcome::Append(text) => self.result.final_response.push_str(&text),
            ChunkOutcome::Skip => {}
            ChunkOutcome::Reject(diagnostic) => self.record(diagnostic),
        }
    }

    /// Record a diagnostic raised outside the parser (e.g. by the reader)
    pub fn record(&mut self, diagnostic: ParseDiagnostic) {
        debug!(%diagnostic, "Recovered parse diagnostic");
        self.result.errors.push(diagnostic);
    }

    /// Record that the stream failed midway; events seen so far are kept
    pub fn interrupt(&mut self, error: &RuntimeError) {
        warn!(error = %error, "Response stream interrupted");
        self.result
            .errors
            .push(ParseDiagnostic::StreamInterrupted(error.message().to_string()));
    }

    /// Run the assembly passes and return the result
    pub fn finish(mut self, catalog: &AgentCatalog) -> ParsedResult {
        assembler::assemble(&mut self.result, catalog);
        debug!(
            chars = self.result.final_response.chars().count(),
            collaborators = self.result.collaborators.len(),
            steps = self.result.steps.len(),
            diagnostics = self.result.errors.len(),
            "Response assembled"
        );
        self.result
    }
}

/// Parse a complete sequence of reader outputs
pub fn parse_events<I>(events: I, markers: Vec<String>, catalog: &AgentCatalog) -> ParsedResult
where
    I: IntoIterator<Item = Result<StreamEvent, ParseDiagnostic>>,
{
    let mut parser = ResponseParser::new(markers);
    for event in events {
        match event {
            Ok(event) => parser.push(event),
            Err(diagnostic) => parser.record(diagnostic),
        }
    }
    parser.finish(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::domain::{Observation, TraceBody, TraceStep};

    fn parse(events: Vec<StreamEvent>) -> ParsedResult {
        parse_events(
            events.into_iter().map(Ok),
            default_markers(),
            &AgentCatalog::default(),
        )
    }

    #[test]
    fn test_json_chunks_concatenate() {
        let result = parse(vec![
            StreamEvent::text(r#"{"text": "Hello, "}"#),
            StreamEvent::text(r#"{"text": "world"}"#),
        ]);
        assert_eq!(result.final_response, "Hello, world");
        assert_eq!(result.raw_chunks.len(), 2);
    }

    #[test]
    fn test_no_events() {
        let result = parse(vec![]);
        assert!(result.final_response.is_empty());
        assert!(!result.collaboration_detected());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_collaborator_only_synthesizes() {
        let result = parse(vec![StreamEvent::observation(Observation::collaborator(
            "DrafterAgent",
            "Here is the draft",
        ))]);
        assert!(result.final_response.contains("Here is the draft"));
        assert!(result.collaboration_detected());
    }

    #[test]
    fn test_finish_lengths_keep_longest() {
        let result = parse(
            [5, 20, 3]
                .iter()
                .map(|n| StreamEvent::observation(Observation::finish("x".repeat(*n))))
                .collect(),
        );
        assert_eq!(result.final_response.len(), 20);
    }

    #[test]
    fn test_invalid_utf8_is_diagnostic() {
        let result = parse(vec![
            StreamEvent::bytes(vec![0xff, 0xfe]),
            StreamEvent::text("still here"),
        ]);
        assert_eq!(result.final_response, "still here");
        assert!(matches!(result.errors[0], ParseDiagnostic::Decode(_)));
        assert_eq!(result.raw_chunks, vec!["still here".to_string()]);
    }

    #[test]
    fn test_system_error_filtered_but_logged() {
        let result = parse(vec![
            StreamEvent::text("RerunData: retry later"),
            StreamEvent::text("Answer"),
        ]);
        assert_eq!(result.final_response, "Answer");
        assert_eq!(result.raw_chunks.len(), 2);
        assert_eq!(
            result.errors,
            vec![ParseDiagnostic::FilteredSystemError(
                "RerunData: retry later".to_string()
            )]
        );
    }

    #[test]
    fn test_custom_markers() {
        let result = parse_events(
            vec![Ok(StreamEvent::text("RerunData is fine here"))],
            vec!["Boom".to_string()],
            &AgentCatalog::default(),
        );
        assert_eq!(result.final_response, "RerunData is fine here");
    }

    #[test]
    fn test_reader_diagnostics_do_not_abort() {
        let result = parse_events(
            vec![
                Err(ParseDiagnostic::TraceParse("bad shape".to_string())),
                Ok(StreamEvent::text("ok")),
            ],
            default_markers(),
            &AgentCatalog::default(),
        );
        assert_eq!(result.final_response, "ok");
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_interrupt_keeps_partial_result() {
        let mut parser = ResponseParser::with_default_markers();
        parser.push(StreamEvent::text("partial answer"));
        parser.interrupt(&RuntimeError::Stream("connection reset".to_string()));
        let result = parser.finish(&AgentCatalog::default());

        assert_eq!(result.final_response, "partial answer");
        assert_eq!(
            result.errors,
            vec![ParseDiagnostic::StreamInterrupted(
                "connection reset".to_string()
            )]
        );
    }

    #[test]
    fn test_mixed_stream_dedups() {
        let result = parse(vec![
            StreamEvent::trace(vec![TraceBody::Orchestration(TraceStep::reasoning(
                "thinking",
            ))]),
            StreamEvent::text("Line A\n"),
            StreamEvent::text("Line A\nLine B"),
        ]);
        assert_eq!(result.final_response, "Line A\nLine B");
        assert_eq!(result.steps.len(), 1);
    }
}
