use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::agents::session::WorkflowMode;

/// Chat front-end for multi-agent orchestration on Amazon Bedrock Agents
#[derive(Parser, Debug, Clone)]
#[command(name = "chorus", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "CHORUS_CONFIG", default_value = "chorus.toml", global = true)]
    pub config: PathBuf,

    /// AWS region of the agent runtime
    #[arg(long, env = "CHORUS_REGION", global = true)]
    pub region: Option<String>,

    /// Catalog key of the router agent
    #[arg(long, env = "CHORUS_ROUTER", global = true)]
    pub router: Option<String>,

    /// Show orchestration steps and parse diagnostics
    #[arg(short, long, env = "CHORUS_DEBUG", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Send one query and print the answer
    Ask {
        /// The question
        query: String,

        #[command(flatten)]
        workflow: WorkflowArgs,

        /// Plain-text files appended to the query
        #[arg(long = "attach", value_name = "FILE")]
        attachments: Vec<PathBuf>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive conversation on one session
    Chat {
        #[command(flatten)]
        workflow: WorkflowArgs,
    },

    /// Parse a recorded event stream (JSON Lines) without calling the service
    Replay {
        /// Recorded stream file
        file: PathBuf,

        /// Agent the stream was recorded from (defaults to the router)
        #[arg(long)]
        agent: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the configuration and the agent catalog
    Validate,

    /// Probe the router agent with a known orchestration request
    Diagnose {
        /// Run the connection test instead of the diagnosis
        #[arg(long)]
        connection: bool,
    },
}

/// How queries are routed
#[derive(Args, Debug, Clone, Default)]
pub struct WorkflowArgs {
    /// Workflow mode
    #[arg(short, long, value_enum, default_value_t = WorkflowMode::Intelligent)]
    pub mode: WorkflowMode,

    /// Agent keys, in order (sequence mode) or the one agent (single mode)
    #[arg(short, long = "agent", value_name = "KEY", value_delimiter = ',')]
    pub agents: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["chorus", "validate"]);
        assert_eq!(cli.config, PathBuf::from("chorus.toml"));
        assert!(cli.region.is_none());
        assert!(cli.router.is_none());
        assert!(!cli.debug);
        assert!(matches!(cli.command, Command::Validate));
    }

    #[test]
    fn test_ask_with_args() {
        let cli = Cli::parse_from([
            "chorus",
            "--config",
            "custom.toml",
            "--region",
            "eu-west-1",
            "ask",
            "Compare these contracts",
            "--mode",
            "sequence",
            "--agent",
            "quality,drafter",
            "--attach",
            "a.txt",
            "--json",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.region, Some("eu-west-1".to_string()));

        let Command::Ask {
            query,
            workflow,
            attachments,
            json,
        } = cli.command
        else {
            panic!("expected ask");
        };
        assert_eq!(query, "Compare these contracts");
        assert_eq!(workflow.mode, WorkflowMode::Sequence);
        assert_eq!(workflow.agents, vec!["quality".to_string(), "drafter".to_string()]);
        assert_eq!(attachments, vec![PathBuf::from("a.txt")]);
        assert!(json);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["chorus", "diagnose", "--connection", "--debug"]);
        assert!(cli.debug);
        assert!(matches!(cli.command, Command::Diagnose { connection: true }));
    }

    #[test]
    fn test_replay_args() {
        let cli = Cli::parse_from(["chorus", "replay", "stream.jsonl", "--agent", "quality"]);
        let Command::Replay { file, agent, json } = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(file, PathBuf::from("stream.jsonl"));
        assert_eq!(agent, Some("quality".to_string()));
        assert!(!json);
    }
}
