//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::compiler::CommandBuild;
use crate::design::DesignFile;
use crate::prompt::TerminalSelector;
use crate::settings::Settings;
use std::path::{Path, PathBuf};
use weld_core::{
    Archive, ArchiveBuild, BuildService, CancelFlag, CompositionNode, CompositionUnit, Exporter,
    Feature, SynthesisOutcome, WeldError, archive_digest,
};

/// Export options that only apply to `weld export`.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub output: PathBuf,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub renames: Vec<(String, String)>,
    pub force: bool,
}

/// Parse `Old=New` pairs.
pub fn parse_renames(raw: &[String]) -> Result<Vec<(String, String)>, WeldError> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(old, new)| (old.trim().to_string(), new.trim().to_string()))
                .filter(|(old, new)| !old.is_empty() && !new.is_empty())
                .ok_or_else(|| WeldError::Config(format!("invalid rename '{}', expected Old=New", pair)))
        })
        .collect()
}

/// Artifact name for one unit. A requested name shared by several units
/// gets the unit name appended.
pub fn artifact_name(requested: Option<&str>, unit: &str, shared: bool) -> String {
    match requested {
        Some(name) if shared => format!("{}-{}", name.trim_end_matches(".jar"), unit),
        Some(name) => name.to_string(),
        None => unit.to_string(),
    }
}

/// Load a design and prepare its units, prompting when inference fails.
pub fn prepare(
    design_path: &Path,
    settings: &Settings,
    build: &dyn BuildService,
) -> Result<Exporter, WeldError> {
    let design = DesignFile::load(design_path)?;
    let mut selector = TerminalSelector::stdio();
    Exporter::new(
        &design.wrappers,
        &design.components,
        &mut selector,
        build,
        settings.export.clone(),
    )
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn print_failures(exporter: &Exporter) {
    for failure in exporter.failures() {
        println!("Skipped {}: {}", failure.name, failure.error);
    }
}

fn failures_json(exporter: &Exporter) -> serde_json::Value {
    exporter
        .failures()
        .iter()
        .map(|f| serde_json::json!({ "unit": f.name, "error": f.error.to_string() }))
        .collect()
}

// =============================================================================
// INSPECT COMMAND
// =============================================================================

fn exported_names<T: Feature>(features: &[T]) -> Vec<&str> {
    features
        .iter()
        .filter(|f| f.is_exported())
        .map(|f| f.name())
        .collect()
}

fn node_json(unit: &CompositionUnit, node: &CompositionNode, verbose: bool) -> serde_json::Value {
    let edges: Vec<serde_json::Value> = node
        .edges
        .iter()
        .map(|e| {
            serde_json::json!({
                "to": unit.node(e.end).map(|n| n.name.as_str()),
                "kind": e.kind.label(),
            })
        })
        .collect();
    let mut value = serde_json::json!({
        "name": node.name,
        "type": node.component.type_name,
        "input": node.input_interface,
        "output": node.output_interface,
        "edges": edges,
    });
    if verbose && let Some(object) = value.as_object_mut() {
        object.insert("properties".into(), serde_json::json!(exported_names(&node.properties)));
        object.insert("methods".into(), serde_json::json!(exported_names(&node.methods)));
        object.insert("events".into(), serde_json::json!(exported_names(&node.events)));
    }
    value
}

fn print_unit(unit: &CompositionUnit, verbose: bool) {
    println!("Unit {}", unit.name);
    for node in unit.nodes() {
        let mut flags = Vec::new();
        if node.input_interface {
            flags.push("input");
        }
        if node.output_interface {
            flags.push("output");
        }
        println!(
            "  {} ({}) [{}]",
            node.name,
            node.component.type_name,
            flags.join(", ")
        );
        for edge in &node.edges {
            if let Some(end) = unit.node(edge.end) {
                println!("    -> {} ({})", end.name, edge.kind.label());
            }
        }
        if verbose {
            println!("    properties: {}", exported_names(&node.properties).join(", "));
            println!("    methods:    {}", exported_names(&node.methods).join(", "));
            println!("    events:     {}", exported_names(&node.events).join(", "));
        }
    }
}

/// Show every unit of a design.
pub fn cmd_inspect(
    design: &Path,
    settings: &Settings,
    json_mode: bool,
    verbose: bool,
) -> Result<(), WeldError> {
    let exporter = prepare(design, settings, &ArchiveBuild)?;

    if json_mode {
        let units: Vec<serde_json::Value> = exporter
            .units()
            .iter()
            .map(|unit| {
                let nodes: Vec<serde_json::Value> = unit
                    .nodes()
                    .iter()
                    .map(|n| node_json(unit, n, verbose))
                    .collect();
                serde_json::json!({ "name": unit.name, "nodes": nodes })
            })
            .collect();
        print_json(&serde_json::json!({
            "units": units,
            "failures": failures_json(&exporter),
        }));
        return Ok(());
    }

    println!("Weld Design");
    println!("===========");
    println!("Design:    {:?}", design);
    println!("Units:     {}", exporter.units().len());
    println!("Resources: {}", exporter.resources().len());
    println!();
    for unit in exporter.units() {
        print_unit(unit, verbose);
    }
    print_failures(&exporter);
    Ok(())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Report violations of every unit. Fails when any unit has one.
pub fn cmd_validate(design: &Path, settings: &Settings, json_mode: bool) -> Result<(), WeldError> {
    let exporter = prepare(design, settings, &ArchiveBuild)?;
    let report = exporter.validate_all();
    let total: usize = report.iter().map(|(_, v)| v.len()).sum();

    if json_mode {
        let units: Vec<serde_json::Value> = report
            .iter()
            .map(|(name, violations)| {
                let violations: Vec<serde_json::Value> = violations
                    .iter()
                    .map(|v| serde_json::json!({ "kind": v.kind(), "message": v.message() }))
                    .collect();
                serde_json::json!({ "unit": name, "violations": violations })
            })
            .collect();
        print_json(&serde_json::json!({
            "units": units,
            "failures": failures_json(&exporter),
        }));
    } else {
        for (name, violations) in &report {
            if violations.is_empty() {
                println!("{}: ok", name);
                continue;
            }
            println!("{}:", name);
            for violation in violations {
                println!("  - {}", violation);
            }
        }
        print_failures(&exporter);
    }

    if total > 0 {
        return Err(WeldError::Config(format!("{} constraint violations", total)));
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

struct UnitResult {
    unit: String,
    artifact: String,
    outcome: Result<SynthesisOutcome, WeldError>,
}

/// Export the selected units, each into its own archive.
///
/// Runs on a blocking worker; Ctrl+C cancels the unit in progress and every
/// unit after it.
pub async fn cmd_export(
    design: &Path,
    settings: Settings,
    request: ExportRequest,
    json_mode: bool,
) -> Result<(), WeldError> {
    let build: Box<dyn BuildService + Send> = match &settings.compiler {
        Some(compiler) => Box::new(CommandBuild::from_settings(compiler)),
        None => Box::new(ArchiveBuild),
    };
    let mut exporter = prepare(design, &settings, build.as_ref())?;

    for (old, new) in &request.renames {
        let unit = exporter
            .unit_mut(old)
            .ok_or_else(|| WeldError::Config(format!("no unit named {}", old)))?;
        unit.name = new.clone();
    }

    let selected: Vec<(usize, String)> = exporter
        .units()
        .iter()
        .enumerate()
        .filter(|(_, u)| request.unit.as_ref().is_none_or(|wanted| *wanted == u.name))
        .map(|(i, u)| (i, u.name.clone()))
        .collect();
    if let Some(wanted) = &request.unit
        && selected.is_empty()
    {
        return Err(WeldError::Config(format!("no unit named {}", wanted)));
    }
    let shared = selected.len() > 1;
    let targets: Vec<(usize, String, String)> = selected
        .into_iter()
        .map(|(i, unit)| {
            let artifact = artifact_name(request.name.as_deref(), &unit, shared);
            (i, unit, artifact)
        })
        .collect();

    let cancel = CancelFlag::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling export");
                cancel.cancel();
            }
        }
    });

    let output = request.output.clone();
    let force = request.force;
    let (exporter, results) = tokio::task::spawn_blocking(move || {
        let results: Vec<UnitResult> = targets
            .into_iter()
            .map(|(index, unit, artifact)| {
                let outcome =
                    exporter.export_unit(index, &output, &artifact, build.as_ref(), cancel.clone(), force);
                UnitResult {
                    unit,
                    artifact,
                    outcome,
                }
            })
            .collect();
        (exporter, results)
    })
    .await
    .map_err(|e| WeldError::Build(format!("export worker failed: {}", e)))?;
    watcher.abort();

    report_export(&exporter, &results, json_mode);

    if results
        .iter()
        .any(|r| matches!(r.outcome, Err(WeldError::Cancelled)))
    {
        return Err(WeldError::Cancelled);
    }
    let failed = exporter.failures().len()
        + results
            .iter()
            .filter(|r| !matches!(r.outcome, Ok(SynthesisOutcome::Packaged(_))))
            .count();
    if failed > 0 {
        return Err(WeldError::Config(format!(
            "{} of {} units not exported",
            failed,
            exporter.failures().len() + results.len()
        )));
    }
    Ok(())
}

fn report_export(exporter: &Exporter, results: &[UnitResult], json_mode: bool) {
    if json_mode {
        let units: Vec<serde_json::Value> = results
            .iter()
            .map(|r| match &r.outcome {
                Ok(SynthesisOutcome::Packaged(artifact)) => serde_json::json!({
                    "unit": r.unit,
                    "status": "packaged",
                    "path": artifact.path,
                    "generated": artifact.generated,
                    "sources": artifact.sources,
                }),
                Ok(SynthesisOutcome::Rejected(violations)) => serde_json::json!({
                    "unit": r.unit,
                    "status": "rejected",
                    "violations": violations.iter().map(|v| v.message()).collect::<Vec<_>>(),
                }),
                Err(e) => serde_json::json!({
                    "unit": r.unit,
                    "status": "failed",
                    "artifact": r.artifact,
                    "error": e.to_string(),
                }),
            })
            .collect();
        print_json(&serde_json::json!({
            "units": units,
            "failures": failures_json(exporter),
        }));
        return;
    }

    for result in results {
        match &result.outcome {
            Ok(SynthesisOutcome::Packaged(artifact)) => {
                println!("Exported {} to {}", result.unit, artifact.path.display());
                if let Some(sources) = &artifact.sources {
                    println!("  sources kept in {}", sources.display());
                }
            }
            Ok(SynthesisOutcome::Rejected(violations)) => {
                println!("Rejected {}:", result.unit);
                for violation in violations {
                    println!("  - {}", violation);
                }
            }
            Err(e) => println!("Failed {} ({}): {}", result.unit, result.artifact, e),
        }
    }
    print_failures(exporter);
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Print the BLAKE3 digest of a packaged archive.
pub fn cmd_hash(archive: &Path, json_mode: bool) -> Result<(), WeldError> {
    let bytes = std::fs::read(archive)
        .map_err(|e| WeldError::Io(format!("cannot read {}: {}", archive.display(), e)))?;
    let entries = Archive::from_bytes(&bytes)?.entries().len();
    let digest = archive_digest(&bytes);

    if json_mode {
        print_json(&serde_json::json!({
            "archive": archive,
            "entries": entries,
            "blake3": digest,
        }));
        return Ok(());
    }

    println!("Archive: {:?}", archive);
    println!("Entries: {}", entries);
    println!("BLAKE3:  {}", digest);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_need_both_sides() {
        let parsed = parse_renames(&["ExportBean0 = Combo".to_string()]).expect("parse");
        assert_eq!(parsed, vec![("ExportBean0".to_string(), "Combo".to_string())]);
        assert!(parse_renames(&["Combo".to_string()]).is_err());
        assert!(parse_renames(&["=Combo".to_string()]).is_err());
    }

    #[test]
    fn shared_artifact_name_gets_unit_suffix() {
        assert_eq!(artifact_name(None, "Combo", true), "Combo");
        assert_eq!(artifact_name(Some("bundle.jar"), "Combo", false), "bundle.jar");
        assert_eq!(artifact_name(Some("bundle.jar"), "Combo", true), "bundle-Combo");
    }
}
