//! # Weld
//!
//! Command-line front end of the composition export pipeline.
//!
//! - `cli`: clap commands and their implementations
//! - `design`: JSON design files (component descriptors plus wrappers)
//! - `settings`: `weld.toml` and environment overrides
//! - `prompt`: terminal node selection
//! - `compiler`: external compiler behind `BuildService`

pub mod cli;
pub mod compiler;
pub mod design;
pub mod prompt;
pub mod settings;
