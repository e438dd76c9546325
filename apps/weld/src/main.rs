//! # Weld - Composition Exporter
//!
//! The main binary for Weld.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   apps/weld (THE BINARY)                 │
//! │                                                          │
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────────┐   │
//! │  │    CLI      │   │   Settings   │   │   Compiler   │   │
//! │  │   (clap)    │   │ (weld.toml)  │   │  (command)   │   │
//! │  └──────┬──────┘   └──────┬───────┘   └──────┬───────┘   │
//! │         └─────────────────┼──────────────────┘           │
//! │                           ▼                              │
//! │                   ┌───────────────┐                      │
//! │                   │   weld-core   │                      │
//! │                   │ (THE PIPELINE)│                      │
//! │                   └───────────────┘                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! weld inspect -d design.json
//! weld validate -d design.json
//! weld export -d design.json -o out --rename ExportBean0=Combo
//! weld hash -a out/Combo.jar
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weld::cli;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // WELD_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("WELD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "weld=info,weld_core=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Weld startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗    ██╗███████╗██╗     ██████╗
  ██║    ██║██╔════╝██║     ██╔══██╗
  ██║ █╗ ██║█████╗  ██║     ██║  ██║
  ██║███╗██║██╔══╝  ██║     ██║  ██║
  ╚███╔███╔╝███████╗███████╗██████╔╝
   ╚══╝╚══╝ ╚══════╝╚══════╝╚═════╝

  Composition Exporter v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
