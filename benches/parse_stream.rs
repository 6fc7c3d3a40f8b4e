use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chorus::agents::config::{AgentCatalog, AgentDescriptor, IconMatching};
use chorus::agents::parser::{default_markers, parse_events, read_json_lines};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

fn catalog() -> AgentCatalog {
    let agents = ["router", "quality", "drafter", "negotiation"]
        .iter()
        .map(|key| AgentDescriptor {
            key: key.to_string(),
            name: format!("{} agent", key),
            icon: "🤖".to_string(),
            description: String::new(),
            agent_id: "AGENT".to_string(),
            alias_id: "ALIAS".to_string(),
        })
        .collect();
    AgentCatalog::new(agents, IconMatching::default())
}

/// A recorded router stream: one collaborator hand-off per round, then chunks
fn recorded_stream(rounds: usize) -> String {
    let mut lines = Vec::new();
    for i in 0..rounds {
        lines.push(json!({
            "trace": {
                "collaboratorName": "router",
                "trace": { "orchestrationTrace": {
                    "rationale": { "text": format!("Step {}: ask the quality agent", i) }
                }}
            }
        }));
        lines.push(json!({
            "trace": {
                "trace": { "orchestrationTrace": { "observation": {
                    "type": "AGENT_COLLABORATOR",
                    "agentCollaboratorInvocationOutput": {
                        "agentCollaboratorName": "QualityAgent",
                        "output": { "text": format!("Finding {}\nNo issues", i) }
                    }
                }}}
            }
        }));
        let chunk = json!({ "text": format!("Part {} of the answer.\n", i) }).to_string();
        lines.push(json!({ "chunk": { "bytes": STANDARD.encode(chunk) } }));
    }
    lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn benchmark_read_json_lines(c: &mut Criterion) {
    let input = recorded_stream(100);

    c.bench_function("read_json_lines", |b| {
        b.iter(|| read_json_lines(black_box(&input)))
    });
}

fn benchmark_parse_events(c: &mut Criterion) {
    let catalog = catalog();
    let mut group = c.benchmark_group("parse_events");

    for rounds in [10, 100, 1000] {
        let events = read_json_lines(&recorded_stream(rounds));
        group.bench_with_input(BenchmarkId::from_parameter(rounds), &events, |b, events| {
            b.iter(|| {
                parse_events(
                    black_box(events.clone()),
                    default_markers(),
                    &catalog,
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_read_json_lines, benchmark_parse_events);
criterion_main!(benches);
