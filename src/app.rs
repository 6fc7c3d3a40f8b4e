//! Command handlers behind the CLI

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::agents::diagnostics::{diagnose_router, test_router_connection, ConnectionTest};
use crate::agents::executor::{AgentExecutor, AgentReply};
use crate::agents::orchestration::{AgentTrace, OrchestrationEngine, WorkflowResult};
use crate::agents::parser::read_json_lines;
use crate::agents::prompt::Document;
use crate::agents::retry::RetryingInvoker;
use crate::agents::runtime::{AgentRuntime, BedrockRuntime, ScriptedRuntime};
use crate::agents::session::ChatSession;
use crate::agents::ParsedResult;
use crate::cli::{Cli, Command, WorkflowArgs};
use crate::config::validator::ConfigValidator;
use crate::config::Settings;

/// Run one CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::new_with_cli(&cli)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    debug!(agents = settings.agents.len(), router = %settings.router, "Configuration loaded");

    match cli.command {
        Command::Validate => validate(&settings),
        Command::Replay { file, agent, json } => {
            let executor = build_executor(&settings, Arc::new(ScriptedRuntime::default()))?;
            replay(&executor, &file, agent.as_deref(), json, cli.debug)
        }
        Command::Ask {
            query,
            workflow,
            attachments,
            json,
        } => {
            let engine = build_engine(&settings).await?;
            let mut session = new_session(&workflow, cli.debug);
            for path in &attachments {
                session.attachments.push(load_document(path).await?);
            }
            let result = engine.submit(&mut session, &query).await;
            print_result(&result, json, cli.debug)?;
            if result.is_completed() {
                Ok(())
            } else {
                anyhow::bail!("Workflow failed")
            }
        }
        Command::Chat { workflow } => {
            let engine = build_engine(&settings).await?;
            chat(&engine, new_session(&workflow, cli.debug)).await
        }
        Command::Diagnose { connection } => {
            let engine = build_engine(&settings).await?;
            let session = ChatSession::default();
            diagnose(engine.executor(), &session.session_id, connection).await
        }
    }
}

fn new_session(workflow: &WorkflowArgs, debug: bool) -> ChatSession {
    ChatSession::new(workflow.mode)
        .with_sequence(workflow.agents.clone())
        .with_selected(workflow.agents.clone())
        .with_debug(debug)
}

fn ensure_valid(settings: &Settings) -> anyhow::Result<()> {
    if let Err(errors) = ConfigValidator::validate(settings) {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Invalid configuration:\n  • {}", messages.join("\n  • "));
    }
    Ok(())
}

fn build_executor(
    settings: &Settings,
    runtime: Arc<dyn AgentRuntime>,
) -> anyhow::Result<AgentExecutor> {
    ensure_valid(settings)?;
    let invoker = RetryingInvoker::new(runtime, settings.retry.policy());
    Ok(AgentExecutor::new(
        invoker,
        Arc::new(settings.catalog()),
        settings.router.clone(),
        settings.parser.system_error_markers.clone(),
    ))
}

async fn build_engine(settings: &Settings) -> anyhow::Result<OrchestrationEngine> {
    let runtime = BedrockRuntime::from_settings(&settings.runtime).await?;
    info!(region = ?settings.runtime.region, "Agent runtime ready");
    Ok(OrchestrationEngine::new(build_executor(
        settings,
        Arc::new(runtime),
    )?))
}

async fn load_document(path: &Path) -> anyhow::Result<Document> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Document::from_bytes(name, bytes)?)
}

fn validate(settings: &Settings) -> anyhow::Result<()> {
    let validation = ConfigValidator::validate(settings);
    let setup = ConfigValidator::setup_report(settings);

    if let Err(errors) = &validation {
        println!("❌ Invalid configuration: {} problems detected", errors.len());
        for error in errors {
            println!("  • {}", error);
        }
    }

    if setup.valid {
        println!("✅ Valid configuration: {} agents configured", setup.total_agents);
    } else {
        println!("❌ Incomplete agent setup: {} problems detected", setup.issues.len());
        for issue in &setup.issues {
            println!("  • {}", issue);
        }
        println!(
            "Configured agents: {}/{}",
            setup.configured_agents, setup.total_agents
        );
    }

    if validation.is_err() || !setup.valid {
        anyhow::bail!("Configuration check failed");
    }
    Ok(())
}

fn replay(
    executor: &AgentExecutor,
    file: &Path,
    agent: Option<&str>,
    json: bool,
    debug: bool,
) -> anyhow::Result<()> {
    let input = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let events = read_json_lines(&input);
    let agent_key = agent.unwrap_or_else(|| executor.router_key());

    let reply: AgentReply = executor.replay(agent_key, events)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", reply.text);
        if debug {
            print_trace(&reply.agent_key, &reply.parsed);
        }
    }
    Ok(())
}

async fn diagnose(executor: &AgentExecutor, session_id: &str, connection: bool) -> anyhow::Result<()> {
    if connection {
        let outcome = test_router_connection(executor, session_id).await;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        if let ConnectionTest::Failed { .. } = outcome {
            anyhow::bail!("Connection test failed");
        }
        return Ok(());
    }

    let diagnosis = diagnose_router(executor, session_id)
        .await
        .map_err(|e| anyhow::anyhow!("Diagnostic error: {}", e))?;
    println!("{}", serde_json::to_string_pretty(&diagnosis)?);
    Ok(())
}

async fn chat(engine: &OrchestrationEngine, mut session: ChatSession) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!(
        "Session {} ({} mode). Commands: /attach <file>, /reset, /quit",
        session.session_id, session.mode
    );

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line.split_once(' ').unwrap_or((line, "")) {
            ("", _) => continue,
            ("/quit" | "/exit", _) => break,
            ("/reset", _) => {
                session.reset();
                println!("New session {}", session.session_id);
            }
            ("/attach", path) if !path.trim().is_empty() => {
                match load_document(Path::new(path.trim())).await {
                    Ok(document) => {
                        println!("✅ {} attached", document.name);
                        session.attachments.push(document);
                    }
                    Err(e) => println!("❌ {:#}", e),
                }
            }
            _ => {
                let result = engine.submit(&mut session, line).await;
                print_result(&result, false, session.debug)?;
            }
        }
    }
    Ok(())
}

fn print_result(result: &WorkflowResult, json: bool, debug: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    match result {
        WorkflowResult::Failed { error } => println!("{}", error),
        WorkflowResult::Completed(report) => {
            println!("{}", report.final_text);
            if debug {
                println!("\nAgents: {} ({})", report.agent_names.join(", "), report.selection_method);
                if let Some(optimized) = &report.optimized_query {
                    println!("Optimized query: {}", optimized);
                }
                for AgentTrace { agent_key, parsed } in &report.traces {
                    print_trace(agent_key, parsed);
                }
            }
        }
    }
    Ok(())
}

fn print_trace(agent_key: &str, parsed: &ParsedResult) {
    println!("\n🔍 {} orchestration steps:", agent_key);
    for step in &parsed.steps {
        match &step.agent {
            Some(agent) => println!("  [{}] {}: {}", step.kind, agent, step.preview),
            None => println!("  [{}] {}", step.kind, step.preview),
        }
    }
    for name in &parsed.trace_info {
        println!("  {}", name);
    }
    for diagnostic in &parsed.errors {
        println!("  ⚠️ {}", diagnostic);
    }
}
