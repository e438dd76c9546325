//! # Weld CLI Module
//!
//! ## Available Commands
//!
//! - `inspect` - Show the units of a design with their nodes, edges and interface
//! - `validate` - Report every constraint violation of every unit
//! - `export` - Package each unit into its own archive
//! - `hash` - Compute the BLAKE3 digest of a packaged archive

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use weld_core::WeldError;

use crate::settings::Settings;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Weld - export wired component compositions
///
/// Groups the components of a design by their bindings and packages each
/// group as one self-contained component.
#[derive(Parser, Debug)]
#[command(name = "weld")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (defaults to ./weld.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show units, nodes, edges and interface flags
    Inspect {
        /// Design file (JSON)
        #[arg(short, long)]
        design: PathBuf,
    },

    /// Report constraint violations; fails if there are any
    Validate {
        /// Design file (JSON)
        #[arg(short, long)]
        design: PathBuf,
    },

    /// Package each unit into its own archive
    Export {
        /// Design file (JSON)
        #[arg(short, long)]
        design: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Artifact name (defaults to the unit name)
        #[arg(short, long)]
        name: Option<String>,

        /// Export only this unit (after renames)
        #[arg(short, long)]
        unit: Option<String>,

        /// Rename a unit, as Old=New (repeatable)
        #[arg(long, value_name = "OLD=NEW")]
        rename: Vec<String>,

        /// Generate property change notification support
        #[arg(long)]
        change_support: bool,

        /// Overwrite existing artifacts
        #[arg(short, long)]
        force: bool,
    },

    /// Compute BLAKE3 digest of a packaged archive
    Hash {
        /// Archive path
        #[arg(short, long)]
        archive: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), WeldError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Inspect { design } => {
            let settings = Settings::load(cli.config.as_deref())?;
            cmd_inspect(&design, &settings, json_mode, cli.verbose)
        }
        Commands::Validate { design } => {
            let settings = Settings::load(cli.config.as_deref())?;
            cmd_validate(&design, &settings, json_mode)
        }
        Commands::Export {
            design,
            output,
            name,
            unit,
            rename,
            change_support,
            force,
        } => {
            let mut settings = Settings::load(cli.config.as_deref())?;
            settings.export.change_support |= change_support;
            let request = ExportRequest {
                output,
                name,
                unit,
                renames: parse_renames(&rename)?,
                force,
            };
            cmd_export(&design, settings, request, json_mode).await
        }
        Commands::Hash { archive } => cmd_hash(&archive, json_mode),
    }
}
