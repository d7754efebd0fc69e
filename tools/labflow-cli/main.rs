use clap::{Parser, ValueEnum};
use labflow::prelude::*;
use serde::Deserialize;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// --- JSON Deserialization Structs (Input Format Specific) ---
// These structs match the `flowchart.json` description format.

#[derive(Deserialize)]
struct RawFlowchart {
    nodes: Vec<RawNode>,
    #[serde(default)]
    connections: Vec<RawConnection>,
    #[serde(default)]
    values: Vec<RawValue>,
}

#[derive(Deserialize)]
struct RawNode {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RawConnection {
    from: String,
    to: String,
}

#[derive(Deserialize)]
struct RawValue {
    terminal: String,
    value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Runs a labflow flowchart description and reports every terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the flowchart description JSON file
    flowchart_path: String,

    /// Treat the input as a saved snapshot instead of a description
    #[arg(long)]
    snapshot: bool,

    /// Save a snapshot after running (`.json` for JSON, anything else for binary)
    #[arg(short, long)]
    save: Option<String>,

    /// Do not run source nodes before applying values
    #[arg(long)]
    no_update: bool,

    /// Maximum nesting of node updates
    #[arg(long, default_value_t = labflow::flowchart::DEFAULT_MAX_PROPAGATION_DEPTH)]
    max_depth: usize,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let start = Instant::now();

    let mut flowchart = Flowchart::builder()
        .with_max_propagation_depth(cli.max_depth)
        .build();

    if cli.snapshot {
        let state = FlowchartState::from_file(&cli.flowchart_path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load snapshot '{}': {}", cli.flowchart_path, e))
        });
        flowchart
            .load_state(&state)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to restore snapshot: {}", e)));
    } else {
        let json = fs::read_to_string(&cli.flowchart_path).unwrap_or_else(|e| {
            exit_with_error(&format!(
                "Failed to read flowchart file '{}': {}",
                cli.flowchart_path, e
            ))
        });
        let raw: RawFlowchart = serde_json::from_str(&json)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse flowchart JSON: {}", e)));
        build(&mut flowchart, raw, !cli.no_update);
    }
    let elapsed = start.elapsed();

    match cli.format {
        ReportFormat::Text => print_text_report(&flowchart),
        ReportFormat::Json => print_json_report(&flowchart),
    }

    if let Some(path) = cli.save {
        flowchart
            .save_state()
            .save(&path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save snapshot: {}", e)));
        eprintln!("Snapshot written to '{}'", path);
    }
    eprintln!("Finished in {:?}", elapsed);
}

/// Adds nodes, connects them, runs the sources and applies the value assignments.
fn build(flowchart: &mut Flowchart, raw: RawFlowchart, run_sources: bool) {
    for node in &raw.nodes {
        let behavior = flowchart
            .library()
            .create(&node.type_name, &node.params)
            .unwrap_or_else(|e| exit_with_error(&format!("Node '{}': {}", node.name, e)));
        flowchart
            .add_boxed_node(&node.name, behavior)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    }

    for connection in &raw.connections {
        let from = resolve(flowchart, &connection.from);
        let to = resolve(flowchart, &connection.to);
        if let Err(e) = flowchart.connect(from, to) {
            exit_with_error(&format!(
                "Cannot connect {} -> {}: {}",
                connection.from, connection.to, e
            ));
        }
    }

    if run_sources {
        for node in flowchart.nodes() {
            let is_source = flowchart.node(node).is_ok_and(|n| {
                n.terminals()
                    .into_iter()
                    .all(|t| flowchart.terminal(t).is_ok_and(|t| t.is_output()))
            });
            if is_source {
                if let Err(e) = flowchart.update(node) {
                    tracing::warn!(node = %node, error = %e, "source node failed");
                }
            }
        }
    }

    for assignment in &raw.values {
        let terminal = resolve(flowchart, &assignment.terminal);
        let value = Value::from_json(&assignment.value);
        if let Err(e) = flowchart.set_value(terminal, value, true) {
            exit_with_error(&format!("Cannot set {}: {}", assignment.terminal, e));
        }
    }
}

/// Resolves a `node.terminal` address.
fn resolve(flowchart: &Flowchart, address: &str) -> TerminalId {
    let Some((node, terminal)) = address.split_once('.') else {
        exit_with_error(&format!("'{}' is not a node.terminal address", address));
    };
    flowchart
        .find_terminal(node, terminal)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()))
}

fn describe_value(value: &TerminalValue) -> String {
    match value {
        TerminalValue::Single(None) => "-".to_string(),
        TerminalValue::Single(Some(v)) => v.to_string(),
        TerminalValue::Multi(entries) => {
            let mut parts: Vec<String> = entries
                .iter()
                .map(|(peer, v)| {
                    let v = v.as_ref().map_or("-".to_string(), ToString::to_string);
                    format!("{}: {}", peer, v)
                })
                .collect();
            parts.sort();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

fn print_text_report(flowchart: &Flowchart) {
    for node_id in flowchart.nodes() {
        let Ok(node) = flowchart.node(node_id) else {
            continue;
        };
        println!("{} ({}), {} update(s)", node.name(), node.type_name(), node.update_count());
        if let Some(e) = node.last_error() {
            println!("  ! {}", e);
        }
        for terminal_id in node.terminals() {
            let (Ok(t), Ok(status)) = (flowchart.terminal(terminal_id), flowchart.status(terminal_id)) else {
                continue;
            };
            let arrow = if t.is_input() { "<-" } else { "->" };
            println!(
                "  {} {:<12} [{}] {}",
                arrow,
                t.name(),
                status,
                describe_value(t.value())
            );
        }
    }
}

fn print_json_report(flowchart: &Flowchart) {
    let mut nodes = Vec::new();
    for node_id in flowchart.nodes() {
        let Ok(node) = flowchart.node(node_id) else {
            continue;
        };
        let mut terminals = Vec::new();
        for terminal_id in node.terminals() {
            let (Ok(t), Ok(status)) = (flowchart.terminal(terminal_id), flowchart.status(terminal_id)) else {
                continue;
            };
            let value = match t.value() {
                TerminalValue::Single(v) => v.as_ref().map_or(serde_json::Value::Null, Value::to_json),
                TerminalValue::Multi(entries) => serde_json::Value::Object(
                    entries
                        .iter()
                        .map(|(peer, v)| {
                            let v = v.as_ref().map_or(serde_json::Value::Null, Value::to_json);
                            (flowchart.label(*peer), v)
                        })
                        .collect(),
                ),
            };
            terminals.push(serde_json::json!({
                "name": t.name(),
                "direction": t.direction(),
                "status": status.to_string(),
                "value": value,
            }));
        }
        nodes.push(serde_json::json!({
            "name": node.name(),
            "type": node.type_name(),
            "updates": node.update_count(),
            "error": node.last_error().map(ToString::to_string),
            "terminals": terminals,
        }));
    }
    match serde_json::to_string_pretty(&serde_json::Value::Array(nodes)) {
        Ok(report) => println!("{}", report),
        Err(e) => exit_with_error(&format!("Failed to render report: {}", e)),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
