//! Stream events produced by a single agent invocation

/// Collaborator name used when a collaborator observation omits it
pub const UNNAMED_COLLABORATOR: &str = "Agent";

/// One item of an invocation's response stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A fragment of the streamed final answer
    TextChunk { bytes: Vec<u8> },
    /// A diagnostic trace of one internal orchestration step
    TraceEvent {
        /// Collaborator that emitted the trace, when the router forwarded it
        collaborator_name: Option<String>,
        /// Trace sections, ordered pre-processing, orchestration, post-processing
        sections: Vec<TraceBody>,
    },
}

impl StreamEvent {
    /// Create a text chunk from UTF-8 text
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextChunk {
            bytes: text.into().into_bytes(),
        }
    }

    /// Create a text chunk from raw bytes
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::TextChunk {
            bytes: bytes.into(),
        }
    }

    /// Create a trace event emitted by the invoked agent itself
    pub fn trace(sections: Vec<TraceBody>) -> Self {
        Self::collaborator_trace(None::<String>, sections)
    }

    /// Create a trace event, optionally attributed to a collaborator
    pub fn collaborator_trace(name: Option<impl Into<String>>, mut sections: Vec<TraceBody>) -> Self {
        sections.sort_by_key(TraceBody::position);
        Self::TraceEvent {
            collaborator_name: name.map(Into::into),
            sections,
        }
    }

    /// Shorthand for a trace holding a single orchestration observation
    pub fn observation(observation: Observation) -> Self {
        Self::trace(vec![TraceBody::Orchestration(TraceStep::observation(observation))])
    }

    /// Whether this event is a trace
    pub fn is_trace(&self) -> bool {
        matches!(self, Self::TraceEvent { .. })
    }
}

/// One section of a trace event
#[derive(Debug, Clone, PartialEq)]
pub enum TraceBody {
    PreProcessing(TraceStep),
    Orchestration(TraceStep),
    PostProcessing(TraceStep),
}

impl TraceBody {
    /// Traversal position: pre-processing, then orchestration, then post-processing
    fn position(&self) -> u8 {
        match self {
            TraceBody::PreProcessing(_) => 0,
            TraceBody::Orchestration(_) => 1,
            TraceBody::PostProcessing(_) => 2,
        }
    }
}

/// Content shared by all trace sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceStep {
    /// Model input or rationale recorded for this step
    pub reasoning_text: Option<String>,
    /// Observation, only meaningful in orchestration sections
    pub observation: Option<Observation>,
}

impl TraceStep {
    /// A step carrying only reasoning text
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            reasoning_text: Some(text.into()),
            observation: None,
        }
    }

    /// A step carrying only an observation
    pub fn observation(observation: Observation) -> Self {
        Self {
            reasoning_text: None,
            observation: Some(observation),
        }
    }
}

/// What the router observed after one orchestration step
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// A collaborator agent answered
    AgentCollaboratorOutput { agent_name: String, text: String },
    /// An action group returned output
    ActionGroupOutput { text: String },
    /// A knowledge base lookup returned references
    KnowledgeBaseOutput { reference_count: usize },
    /// The router produced its final answer
    FinishOutput { text: String },
    /// Any other observation type; ignored by the interpreter
    Unrecognized { kind: String },
}

impl Observation {
    pub fn collaborator(agent_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::AgentCollaboratorOutput {
            agent_name: agent_name.into(),
            text: text.into(),
        }
    }

    pub fn finish(text: impl Into<String>) -> Self {
        Self::FinishOutput { text: text.into() }
    }

    pub fn action(text: impl Into<String>) -> Self {
        Self::ActionGroupOutput { text: text.into() }
    }

    pub fn knowledge_base(reference_count: usize) -> Self {
        Self::KnowledgeBaseOutput { reference_count }
    }
}
