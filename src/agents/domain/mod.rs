//! Domain types for the agent pipeline
//!
//! Core abstractions shared by the parser, the runners and the runtime adapters.

mod event;
mod message;
mod result;

pub use event::*;
pub use message::*;
pub use result::*;
