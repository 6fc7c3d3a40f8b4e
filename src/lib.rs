//! # Chorus - Multi-Agent Chat Front-End
//!
//! Chorus forwards user requests to agents hosted on Amazon Bedrock Agents
//! and renders their streamed, trace-annotated answers.
//!
//! ## Features
//!
//! - **Three workflow modes**: router orchestration, agent sequences, single agent
//! - **Robust parsing**: noisy or partially malformed streams still yield an answer
//! - **Collaboration detection**: collaborator outputs are extracted from traces
//! - **Retries**: throttling and timeouts are retried with class-specific delays
//! - **Diagnostics**: setup validation, router diagnosis and connection test
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chorus::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let settings = Settings::new()?;
//!     println!("{} agents configured", settings.agents.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Agents**: domain types, the runtime port, parsing and orchestration
//! - **Config**: configuration loading and validation
//! - **App / CLI**: command-line shell

pub mod agents;
pub mod app;
pub mod cli;
pub mod config;
