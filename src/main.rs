mod cli;
mod download;
mod model;
mod orchestrator;
mod render;
mod service;
mod session;
#[cfg(test)]
mod testutil;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_tracing(args.verbose, args.is_interactive());
    let is_interactive = args.is_interactive();

    match cli::run(args).await {
        Ok(()) => {
            // Explicitly exit with code 0 on success for one-shot modes
            if !is_interactive {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Log to stderr. `RUST_LOG` wins over `-v`; the TUI owns the terminal, so it only logs when
/// `RUST_LOG` asks for it.
fn init_tracing(verbose: u8, interactive: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if interactive => return,
        Err(_) => EnvFilter::new(format!("warn,pharma_analyst={level}")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
