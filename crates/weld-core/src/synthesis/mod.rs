//! # Artifact Synthesis
//!
//! Turns a validated unit into one packaged artifact:
//! - the composed class, its metadata class and a JSON metadata twin
//! - one adapter class per property-binding edge
//! - persisted blobs for complex default values
//! - the manifest and the staged resource archives under `lib/`
//!
//! All work happens in a scratch directory created inside the output
//! directory. The packed artifact is moved into place only after every step
//! succeeded; on failure or cancellation the scratch directory is removed
//! and nothing is left behind.

mod manifest;
mod plan;
mod source;

pub use manifest::manifest;
pub use plan::{AdapterSpec, WiringPlan, WiringStep};
pub use source::{DefaultValue, adapter_source, bean_source, metadata_source};

use crate::config::ExportConfig;
use crate::formats::UnitMetadata;
use crate::graph::{CompositionUnit, Feature};
use crate::naming::{literal, lower_first, setter_name, simple_type_name};
use crate::primitives::{
    ARTIFACT_EXTENSION, LIBRARY_DIR, MANIFEST_PATH, METADATA_JSON_EXTENSION, METADATA_SUFFIX,
    PROPERTIES_DIR,
};
use crate::providers::{ArchiveBuild, BuildService, PostcardValueStore, ValuePersistence};
use crate::types::{ConstraintViolation, PropertyValue, WeldError};
use crate::validation::ConstraintValidator;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

static ARCHIVE_BUILD: ArchiveBuild = ArchiveBuild;
static POSTCARD_VALUES: PostcardValueStore = PostcardValueStore;

// =============================================================================
// CANCELLATION
// =============================================================================

/// Shared cancellation switch, checked between synthesis steps.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once `cancel` has been called.
    pub fn check(&self) -> Result<(), WeldError> {
        if self.is_cancelled() {
            Err(WeldError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// A successfully packaged unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArtifact {
    pub path: PathBuf,
    /// Entry paths written by synthesis (sources, blobs, manifest).
    pub generated: Vec<String>,
    /// Kept scratch directory, when sources are kept.
    pub sources: Option<PathBuf>,
}

/// Result of a synthesis request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    Packaged(PackagedArtifact),
    /// The unit failed validation; nothing was written.
    Rejected(Vec<ConstraintViolation>),
}

impl SynthesisOutcome {
    #[must_use]
    pub fn artifact(&self) -> Option<&PackagedArtifact> {
        match self {
            Self::Packaged(artifact) => Some(artifact),
            Self::Rejected(_) => None,
        }
    }

    #[must_use]
    pub fn violations(&self) -> &[ConstraintViolation] {
        match self {
            Self::Packaged(_) => &[],
            Self::Rejected(violations) => violations,
        }
    }
}

// =============================================================================
// SYNTHESIZER
// =============================================================================

/// Configured synthesis of one unit at a time.
pub struct ArtifactSynthesizer<'a> {
    config: &'a ExportConfig,
    validator: Option<&'a ConstraintValidator>,
    siblings: Vec<String>,
    build: &'a dyn BuildService,
    values: &'a dyn ValuePersistence,
    cancel: CancelFlag,
    overwrite: bool,
}

impl<'a> ArtifactSynthesizer<'a> {
    /// Synthesizer with the archive build service and postcard value store.
    #[must_use]
    pub fn new(config: &'a ExportConfig) -> Self {
        Self {
            config,
            validator: None,
            siblings: Vec::new(),
            build: &ARCHIVE_BUILD,
            values: &POSTCARD_VALUES,
            cancel: CancelFlag::new(),
            overwrite: false,
        }
    }

    /// Validate with `validator`; `siblings` are the other unit names of the run.
    #[must_use]
    pub fn with_validator(mut self, validator: &'a ConstraintValidator, siblings: Vec<String>) -> Self {
        self.validator = Some(validator);
        self.siblings = siblings;
        self
    }

    #[must_use]
    pub fn with_build(mut self, build: &'a dyn BuildService) -> Self {
        self.build = build;
        self
    }

    #[must_use]
    pub fn with_values(mut self, values: &'a dyn ValuePersistence) -> Self {
        self.values = values;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace an existing artifact instead of failing with `ResourceConflict`.
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Validate `unit` and, if clean, package it as `output_dir/artifact_name`.
    ///
    /// The `.jar` suffix is added when missing; the file holds whatever the
    /// build service packs. Violations are returned as
    /// `SynthesisOutcome::Rejected`; every other problem is an error. A failed
    /// run removes `output_dir` again when it created it.
    pub fn synthesize(
        &self,
        unit: &CompositionUnit,
        output_dir: &Path,
        artifact_name: &str,
    ) -> Result<SynthesisOutcome, WeldError> {
        let violations = match self.validator {
            Some(validator) => validator.validate(unit, &self.siblings),
            None => ConstraintValidator::new(self.config, BTreeSet::new()).validate(unit, &self.siblings),
        };
        if !violations.is_empty() {
            tracing::debug!(unit = %unit.name, violations = violations.len(), "synthesis rejected");
            return Ok(SynthesisOutcome::Rejected(violations));
        }

        let file_name = if artifact_name.ends_with(ARTIFACT_EXTENSION) {
            artifact_name.to_string()
        } else {
            format!("{}{}", artifact_name, ARTIFACT_EXTENSION)
        };
        let target = output_dir.join(&file_name);
        if target.exists() && !self.overwrite {
            return Err(WeldError::ResourceConflict(format!(
                "{} already exists",
                target.display()
            )));
        }
        self.cancel.check()?;

        let created = !output_dir.exists();
        fs::create_dir_all(output_dir)
            .map_err(|e| WeldError::io(&format!("creating {}", output_dir.display()), &e))?;
        let scratch = match tempfile::Builder::new().prefix(".weld-").tempdir_in(output_dir) {
            Ok(scratch) => scratch,
            Err(e) => {
                remove_created(output_dir, created);
                return Err(WeldError::io("creating scratch directory", &e));
            }
        };

        let staged = self.stage_and_pack(unit, scratch.path(), &file_name);
        let (packed, generated) = match staged {
            Ok(staged) => staged,
            Err(err) => {
                tracing::debug!(unit = %unit.name, error = %err, "synthesis failed; discarding scratch");
                discard(scratch, output_dir, created);
                return Err(err);
            }
        };

        if let Err(e) = fs::rename(&packed, &target) {
            discard(scratch, output_dir, created);
            return Err(WeldError::io(&format!("moving artifact to {}", target.display()), &e));
        }

        let sources = if self.config.keep_sources {
            let kept = scratch.keep();
            tracing::info!(path = %kept.display(), "kept generated sources");
            Some(kept)
        } else {
            if let Err(e) = scratch.close() {
                tracing::warn!(error = %e, "scratch cleanup failed");
            }
            None
        };

        tracing::info!(unit = %unit.name, artifact = %target.display(), "packaged unit");
        Ok(SynthesisOutcome::Packaged(PackagedArtifact {
            path: target,
            generated,
            sources,
        }))
    }

    /// Write the content tree under `scratch/content`, compile and pack it.
    /// Returns the packed file inside `scratch` and the generated entries.
    fn stage_and_pack(
        &self,
        unit: &CompositionUnit,
        scratch: &Path,
        file_name: &str,
    ) -> Result<(PathBuf, Vec<String>), WeldError> {
        let content = scratch.join("content");
        let mut staging = Staging::new(&content);
        let package = self.config.package_name();
        let bean_dir = self.config.bean_package.clone();

        // Resources
        let mut class_path = Vec::new();
        let mut staged_resources = Vec::new();
        let mut library: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for resource in unit.resources() {
            self.cancel.check()?;
            if !resource.is_file() {
                return Err(WeldError::MissingResource(resource));
            }
            let name = resource
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| WeldError::MissingResource(resource.clone()))?;
            let bytes = fs::read(&resource)
                .map_err(|e| WeldError::io(&format!("reading {}", resource.display()), &e))?;
            let Some(entry) = library_entry(&library, &name, &bytes) else {
                tracing::debug!(resource = %resource.display(), "identical resource already staged");
                continue;
            };
            staging.write(&entry, &bytes, false)?;
            staged_resources.push(content.join(&entry));
            class_path.push(entry.clone());
            library.insert(entry, bytes);
        }

        // Adapters
        let plan = WiringPlan::new(unit);
        let adapter_package = format!("{}.{}", package, crate::primitives::ADAPTERS_DIR);
        for spec in &plan.adapters {
            self.cancel.check()?;
            let entry = format!("{}/{}.java", self.config.adapters_dir(), spec.class_name);
            staging.write(&entry, adapter_source(spec, &adapter_package).as_bytes(), true)?;
        }

        // Frozen defaults
        let defaults = self.defaults(unit, &mut staging)?;

        // Classes and metadata
        self.cancel.check()?;
        let bean = bean_source(unit, &plan, &defaults, &package);
        staging.write(&format!("{}/{}.java", bean_dir, unit.name), bean.as_bytes(), true)?;
        staging.write(
            &format!("{}/{}{}.java", bean_dir, unit.name, METADATA_SUFFIX),
            metadata_source(unit, &package).as_bytes(),
            true,
        )?;
        let metadata = UnitMetadata::from_unit(unit, &self.config.bean_package).to_json()?;
        staging.write(
            &format!("{}/{}{}", bean_dir, unit.name, METADATA_JSON_EXTENSION),
            metadata.as_bytes(),
            true,
        )?;
        staging.write(
            MANIFEST_PATH,
            manifest(unit, &self.config.bean_package, &class_path).as_bytes(),
            true,
        )?;
        tracing::debug!(unit = %unit.name, files = staging.generated.len(), "staged sources");

        // Build
        self.cancel.check()?;
        let compiled = self.build.compile(&content, &staged_resources)?;
        tracing::debug!(unit = %unit.name, compiled = compiled.len(), "compiled sources");
        self.cancel.check()?;
        let packed = self.build.pack(&scratch.join(file_name), &content)?;
        self.cancel.check()?;

        Ok((packed, staging.generated))
    }

    /// Restore statements for every frozen exported property, persisting
    /// complex values as blobs.
    fn defaults(
        &self,
        unit: &CompositionUnit,
        staging: &mut Staging,
    ) -> Result<Vec<DefaultValue>, WeldError> {
        let mut defaults = Vec::new();
        for property in unit.exported_properties() {
            if !property.freeze_default {
                continue;
            }
            let node_name = unit
                .node(property.feature.node)
                .map(|n| n.name.clone())
                .unwrap_or_default();
            let setter = property
                .info
                .setter
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| setter_name(&property.info.name));

            match &property.info.value {
                None => {
                    tracing::debug!(
                        node = %node_name,
                        property = property.name(),
                        "no current value to freeze"
                    );
                }
                Some(PropertyValue::Complex(value)) => {
                    self.cancel.check()?;
                    let bytes = self.values.serialize(value).map_err(|reason| {
                        WeldError::ValueSerialization {
                            node: node_name.clone(),
                            property: property.name().to_string(),
                            reason,
                        }
                    })?;
                    let file = format!(
                        "{}_{}_{}.{}",
                        simple_type_name(&value.type_name).to_lowercase(),
                        lower_first(&node_name),
                        property.info.name,
                        self.values.extension()
                    );
                    staging.write(
                        &format!("{}/{}", self.config.properties_dir(), file),
                        &bytes,
                        true,
                    )?;
                    defaults.push(DefaultValue::Resource {
                        node: property.feature.node,
                        setter,
                        type_name: property.info.type_name.clone(),
                        resource: format!("{}/{}", PROPERTIES_DIR, file),
                    });
                }
                Some(value) => {
                    if let Some(literal) = literal(value) {
                        defaults.push(DefaultValue::Inline {
                            node: property.feature.node,
                            setter,
                            literal,
                        });
                    }
                }
            }
        }
        Ok(defaults)
    }
}

/// Entry under the library directory for a resource called `name`.
///
/// Returns `None` when the same bytes are already staged. Another file with
/// the same name is numbered (`parts.jar`, `parts-1.jar`, `parts-2.jar`).
fn library_entry(library: &BTreeMap<String, Vec<u8>>, name: &str, bytes: &[u8]) -> Option<String> {
    let mut entry = format!("{}/{}", LIBRARY_DIR, name);
    let mut counter = 0u32;
    while let Some(staged) = library.get(&entry) {
        if staged.as_slice() == bytes {
            return None;
        }
        counter = counter.saturating_add(1);
        entry = match name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => {
                format!("{}/{}-{}.{}", LIBRARY_DIR, stem, counter, extension)
            }
            _ => format!("{}/{}-{}", LIBRARY_DIR, name, counter),
        };
    }
    Some(entry)
}

/// Drop the scratch directory, then the output directory if this run made it.
fn discard(scratch: tempfile::TempDir, output_dir: &Path, created: bool) {
    if let Err(e) = scratch.close() {
        tracing::warn!(error = %e, "scratch cleanup failed");
    }
    remove_created(output_dir, created);
}

fn remove_created(output_dir: &Path, created: bool) {
    if created && let Err(e) = fs::remove_dir(output_dir) {
        tracing::warn!(path = %output_dir.display(), error = %e, "output directory cleanup failed");
    }
}

/// Writes files below the content root, refusing to replace any.
struct Staging {
    root: PathBuf,
    generated: Vec<String>,
}

impl Staging {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            generated: Vec::new(),
        }
    }

    /// Create `entry` (a `/`-separated path). `generated` marks files
    /// produced by synthesis rather than copied resources.
    fn write(&mut self, entry: &str, bytes: &[u8], generated: bool) -> Result<(), WeldError> {
        let path = entry
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| WeldError::io(&format!("creating {}", parent.display()), &e))?;
        }
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => WeldError::ResourceConflict(format!(
                    "{} is produced twice; maybe you have conflicting resources?",
                    entry
                )),
                _ => WeldError::io(&format!("writing {}", entry), &e),
            })?;
        file.write_all(bytes)
            .map_err(|e| WeldError::io(&format!("writing {}", entry), &e))?;
        if generated {
            self.generated.push(entry.to_string());
        }
        Ok(())
    }
}

/// Validate `unit` on its own and package it with default collaborators.
pub fn synthesize(
    unit: &CompositionUnit,
    output_dir: &Path,
    artifact_name: &str,
) -> Result<SynthesisOutcome, WeldError> {
    let config = ExportConfig::default();
    ArtifactSynthesizer::new(&config).synthesize(unit, output_dir, artifact_name)
}

// =============================================================================
// TESTS
// =============================================================================
