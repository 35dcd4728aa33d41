// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging and Ctrl-C handling
// 3. Run the mirror
// 4. Print the report and exit with the proper code (0 = success, 2 = error)
//
// Individual pages that fail to download or save don't make the run fail;
// they show up in the report instead.
// =============================================================================

mod cli; // src/cli.rs - command-line parsing

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use site_mirror::crawl::Phase;
use site_mirror::{Mirror, MirrorReport};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (seeds, rejected) = cli::parse_seeds(&cli.urls);
    for (arg, reason) in &rejected {
        tracing::warn!(url = %arg, reason = %reason, "Skipping invalid url");
    }

    let config = cli.mirror_config(seeds);
    let mirror = Mirror::new(config);

    if !cli.json {
        println!(
            "🔍 Mirroring {} site(s) into {}",
            mirror.config().seeds.len(),
            mirror.config().output_dir.display()
        );
    }

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let report = mirror.run(cancel).await.context("mirror failed to start")?;

    print_results(&report, cli.json)?;
    Ok(0)
}

// RUST_LOG wins; otherwise info, or debug with --verbose
//
// Logs go to stderr so --json output on stdout stays machine readable.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Cancels the crawl on Ctrl-C, or SIGTERM on Unix
async fn cancel_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Could not listen for Ctrl-C");
                return;
            }
        }
        _ = terminate => {}
    }

    tracing::info!("Interrupted, finishing up");
    cancel.cancel();
}

// Prints the report either as a table or JSON
fn print_results(report: &MirrorReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_table(report);
    }
    Ok(())
}

fn print_table(report: &MirrorReport) {
    if !report.skipped.is_empty() {
        println!();
        println!("{:<60} {:<10} {:<30}", "URL", "PHASE", "CAUSE");
        println!("{}", "=".repeat(100));

        for skipped in &report.skipped {
            // Truncate URL if too long for display
            let url_display = if skipped.url.chars().count() > 57 {
                format!("{}...", skipped.url.chars().take(57).collect::<String>())
            } else {
                skipped.url.clone()
            };

            let phase = match skipped.phase {
                Phase::Fetch => "🌐 fetch",
                Phase::Persist => "💾 save",
            };

            println!("{:<60} {:<10} {:<30}", url_display, phase, skipped.cause);
        }
    }

    println!();
    println!("📊 Summary:");
    println!("   ✅ Saved: {}", report.saved.len());
    println!("   ❌ Skipped: {}", report.skipped.len());
    for phase in [Phase::Fetch, Phase::Persist] {
        let count = report.skipped_in(phase).count();
        if count > 0 {
            println!("      {}: {}", phase, count);
        }
    }
    println!("   📋 Total: {}", report.total());
}
