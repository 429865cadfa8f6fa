use std::sync::Arc;

use anyhow::Context;
use attune::config::{AttuneConfig, OutputFormat};
use attune::kernel::gate::ReplyDirective;
use attune::kernel::session::{ConversationSession, SessionStep};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const BREAKDOWN_PREFIX: &str = "/why ";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    tracing::info!("Attune booting...");

    // 2. Config + Catalog (fail fast: a broken catalog never serves a request)
    let config = AttuneConfig::from_env()?;
    let source = match &config.catalog_path {
        Some(path) => path.display().to_string(),
        None => "builtin".to_string(),
    };
    let detector = Arc::new(
        attune::load_detector(&config).with_context(|| format!("failed to load rule catalog ({})", source))?,
    );
    let mut session = ConversationSession::new(detector.clone(), config.telemetry_capacity);

    // 3. Console Loop
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    println!("Type a message to classify it. Prefix with '{}' for a signal breakdown.", BREAKDOWN_PREFIX.trim());

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(BREAKDOWN_PREFIX) {
            let breakdown = detector.signal_breakdown(rest);
            tracing::debug!(signals = breakdown.total(), "Signal breakdown requested");
            println!("{}", serde_json::to_string_pretty(&breakdown)?);
            continue;
        }

        let step = session.step(&line);
        match config.output {
            OutputFormat::Json => println!("{}", serde_json::to_string(&step)?),
            OutputFormat::Pretty => print_pretty(&step),
        }
    }

    // 4. Session Summary
    let snap = session.telemetry.snapshot();
    tracing::info!(
        classified = snap.classification_stats.classified,
        fallbacks = snap.classification_stats.fallbacks,
        collisions = snap.classification_stats.collisions,
        closures = snap.gate_stats.closures,
        avg_confidence = snap.classification_stats.avg_confidence,
        "Session ended"
    );

    Ok(())
}

fn print_pretty(step: &SessionStep) {
    let result = &step.result;
    let cluster = result.cluster.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
    println!(
        "[turn {}] {}/{} (confidence {:.2}, {} signals{})",
        step.turn,
        cluster,
        result.sub_state.as_deref().unwrap_or("-"),
        result.confidence,
        result.signals.len(),
        if result.used_fallback { ", fallback" } else { "" }
    );

    match &step.directive {
        ReplyDirective::Acknowledge(text) => println!("  reply: {}", text),
        ReplyDirective::Generate { instruction, allowed_next } => {
            println!("  {}", instruction.replace('\n', "\n  "));
            let next: Vec<String> = allowed_next.iter().map(|c| c.to_string()).collect();
            println!("  allowed next: [{}]", next.join(", "));
        }
        ReplyDirective::Unguided => println!("  (no state instruction)"),
    }
}
