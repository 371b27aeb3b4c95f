/*
newsbrief - interactive news digest
Reads a topic per line, searches the past day's news for it and prints an LLM-written
bullet digest with source links.
*/

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::Notify;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use newsbrief::app::build_driver;
use newsbrief::repl::LoopOutcome;

#[derive(Parser, Debug)]
#[command(name = "newsbrief", about = "Summarize the past day's news on a topic")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum news items fetched per topic (overrides news.max_results)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_results: Option<u64>,

    /// Override log level (info, debug, warn, error) or a filter directive
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the interactive prompt and digests
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match dotenv::dotenv() {
        Ok(path) => debug!(path = ?path, "loaded .env"),
        Err(e) => debug!(%e, "no .env loaded"),
    }

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await
    .context("failed to load configuration")?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    let max_results = args.max_results.map(|n| n as usize);
    // Reported once, by the error returned from main
    let driver = build_driver(&config, max_results, |var| std::env::var(var).ok())?;

    let shutdown = Arc::new(Notify::new());
    let notifier = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, stopping at next prompt");
            notifier.notify_one();
        }
    });
    let driver = driver.with_shutdown(shutdown);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let summary = driver
        .run(stdin, &mut stdout)
        .await
        .context("digest loop stopped")?;

    info!(outcome = ?summary.outcome, topics = summary.topics_processed, "bye");

    if summary.outcome == LoopOutcome::Interrupted {
        // The pending stdin read lives on a blocking thread the runtime would wait for
        println!();
        std::process::exit(0);
    }
    Ok(())
}
