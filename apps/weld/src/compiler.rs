//! # External Compiler
//!
//! `CommandBuild` runs a configured program over the generated sources:
//!
//! ```text
//! <program> <args...> [-cp <classpath>] -d <source_root> <sources...>
//! ```
//!
//! Packing is the weld archive format, same as `ArchiveBuild`.

use crate::settings::CompilerSettings;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;
use weld_core::{ArchiveBuild, BuildService, WeldError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuild {
    program: String,
    args: Vec<String>,
}

impl CommandBuild {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &CompilerSettings) -> Self {
        Self::new(settings.program.clone(), settings.args.clone())
    }
}

impl BuildService for CommandBuild {
    fn compile(&self, source_root: &Path, classpath: &[PathBuf]) -> Result<Vec<PathBuf>, WeldError> {
        let sources = files_with_extension(source_root, "java")?;
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if !classpath.is_empty() {
            let joined = std::env::join_paths(classpath)
                .map_err(|e| WeldError::Build(format!("invalid classpath: {}", e)))?;
            command.arg("-cp").arg(joined);
        }
        command.arg("-d").arg(source_root).args(&sources);

        tracing::debug!(program = %self.program, sources = sources.len(), "compiling");
        let output = command
            .output()
            .map_err(|e| WeldError::Build(format!("cannot run {}: {}", self.program, e)))?;
        if !output.status.success() {
            return Err(WeldError::Build(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        files_with_extension(source_root, "class")
    }

    fn pack(&self, output_file: &Path, content_root: &Path) -> Result<PathBuf, WeldError> {
        ArchiveBuild.pack(output_file, content_root)
    }
}

/// Every file below `root` with the given extension, sorted.
fn files_with_extension(root: &Path, extension: &str) -> Result<Vec<PathBuf>, WeldError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| WeldError::Io(format!("cannot list {}: {}", root.display(), e)))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == extension) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}
