// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, bail, Context, Result};
use rowflow::config::{load_config, RuntimeBuilder};
use rowflow::engine::{RunHandle, RunResult};
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

struct CliArgs {
    graph_file: String,
    json: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut graph_file = None;
    let mut json = false;

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            flag if flag.starts_with("--") => bail!("unknown flag {}", flag),
            path if graph_file.is_none() => graph_file = Some(path.to_string()),
            extra => bail!("unexpected argument {}", extra),
        }
    }

    let graph_file = graph_file.ok_or_else(|| anyhow!("missing graph file"))?;
    Ok(CliArgs { graph_file, json })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: {} <graph.yaml|graph.toml> [--json]", args[0]);
            eprintln!("Example: {} configs/linear.yaml", args[0]);
            std::process::exit(2);
        }
    };

    match run_graph(&cli).await {
        Ok(result) if result.success => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run_graph(cli: &CliArgs) -> Result<RunResult> {
    let config = load_config(&cli.graph_file)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("failed to load {}", cli.graph_file))?;
    let (graph, launcher) = RuntimeBuilder::from_config(&config)?;

    if !cli.json {
        println!("📋 Graph: {}", cli.graph_file);
        println!(
            "🔧 Steps: {}  Hops: {}  Buffer: {}  Safe mode: {}",
            graph.steps().len(),
            graph.hops().len(),
            graph.run_options().buffer_size,
            graph.run_options().safe_mode
        );
    }

    let handle = launcher.launch(&graph)?;
    let result = wait_with_interrupts(handle).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }
    Ok(result)
}

/// First Ctrl-C drains the run, the second one aborts it.
async fn wait_with_interrupts(handle: RunHandle) -> Result<RunResult> {
    let mut interrupts = 0;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while !handle.is_finished() {
        tokio::select! {
            signal = &mut ctrl_c => {
                signal.context("failed to listen for Ctrl-C")?;
                interrupts += 1;
                if interrupts == 1 {
                    eprintln!("⏸️  Stopping safely; press Ctrl-C again to abort");
                    handle.safe_stop();
                } else {
                    eprintln!("⛔ Aborting run");
                    handle.stop_all();
                }
                // Listen for the next press
                ctrl_c.set(tokio::signal::ctrl_c());
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }
    }

    Ok(handle.wait().await?)
}

fn print_summary(result: &RunResult) {
    println!("\n📊 Run Results:");
    println!("⏱️  Duration: {} ms", result.duration_ms);
    if let Some(mode) = result.stop_mode {
        println!("🛑 Stopped: {:?}", mode);
    }

    println!(
        "\n  {:<24} {:>6} {:>10} {:>10} {:>10} {:>7}  state",
        "step", "copies", "read", "written", "rejected", "errors"
    );
    for step in &result.steps {
        println!(
            "  {:<24} {:>6} {:>10} {:>10} {:>10} {:>7}  {}",
            step.step_id,
            step.copies,
            step.lines_read,
            step.lines_written,
            step.lines_rejected,
            step.errors,
            step.state
        );
    }

    match &result.failure {
        None => println!("\n✅ Run succeeded"),
        Some(failure) => println!("\n❌ {}", failure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let cli = parse_args(&args(&["rowflow", "graph.yaml", "--json"])).unwrap();
        assert_eq!(cli.graph_file, "graph.yaml");
        assert!(cli.json);

        let cli = parse_args(&args(&["rowflow", "graph.toml"])).unwrap();
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_args_rejects_bad_input() {
        assert!(parse_args(&args(&["rowflow"])).is_err());
        assert!(parse_args(&args(&["rowflow", "--verbose", "g.yaml"])).is_err());
        assert!(parse_args(&args(&["rowflow", "a.yaml", "b.yaml"])).is_err());
    }
}
