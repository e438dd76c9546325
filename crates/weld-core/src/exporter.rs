//! # Export Run
//!
//! One export run over a set of wrappers: partition, build and infer every
//! unit up front, then validate and synthesize on request.
//!
//! Failures while building or inferring a unit are recorded per unit and do
//! not stop the others. The same holds for a resource that does not exist or
//! cannot be listed: only the units depending on it are skipped.

use crate::builder::build_unit;
use crate::config::ExportConfig;
use crate::graph::CompositionUnit;
use crate::inference::InterfaceInferencer;
use crate::partition::GroupPartitioner;
use crate::providers::{BuildService, ComponentDescriptor, NodeSelector};
use crate::synthesis::{ArtifactSynthesizer, CancelFlag, SynthesisOutcome};
use crate::types::{ConstraintViolation, WeldError, Wrapper};
use crate::validation::ConstraintValidator;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// A unit that could not be built, inferred, or resolved against its resources.
#[derive(Debug)]
pub struct UnitFailure {
    /// Index of the group in partition order.
    pub index: usize,
    pub name: String,
    pub error: WeldError,
}

/// Units of one run plus the resources they depend on.
#[derive(Debug)]
pub struct Exporter {
    config: ExportConfig,
    units: Vec<CompositionUnit>,
    failures: Vec<UnitFailure>,
    resources: BTreeSet<PathBuf>,
    resource_names: BTreeSet<String>,
}

impl Exporter {
    /// Partition `wrappers` and prepare one unit per group.
    ///
    /// Units are named `<default_unit_name><index>`. A unit whose resources
    /// do not all exist is recorded as a failure. The entry names of the
    /// surviving units' resources, as listed by `build`, are what unit names
    /// are checked against.
    pub fn new<D, S>(
        wrappers: &[Wrapper],
        descriptor: &D,
        selector: &mut S,
        build: &dyn BuildService,
        config: ExportConfig,
    ) -> Result<Self, WeldError>
    where
        D: ComponentDescriptor + ?Sized,
        S: NodeSelector + ?Sized,
    {
        let groups = GroupPartitioner::partition(wrappers);
        let mut units = Vec::with_capacity(groups.len());
        let mut failures = Vec::new();
        let mut listings: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();

        for (index, group) in groups.iter().enumerate() {
            let name = config.unit_name(index);
            let prepared = build_unit(descriptor, group, &name).and_then(|mut unit| {
                InterfaceInferencer::infer_interfaces(&mut unit, selector)?;
                list_resources(&unit, build, &mut listings)?;
                Ok(unit)
            });
            match prepared {
                Ok(mut unit) => {
                    unit.change_support = config.change_support;
                    units.push(unit);
                }
                Err(error) => {
                    tracing::warn!(unit = %name, %error, "unit skipped");
                    failures.push(UnitFailure { index, name, error });
                }
            }
        }

        let resources: BTreeSet<PathBuf> = units.iter().flat_map(|u| u.resources()).collect();
        let resource_names: BTreeSet<String> = resources
            .iter()
            .filter_map(|r| listings.get(r))
            .flatten()
            .cloned()
            .collect();

        tracing::debug!(
            units = units.len(),
            failures = failures.len(),
            resources = resources.len(),
            "prepared export run"
        );
        Ok(Self {
            config,
            units,
            failures,
            resources,
            resource_names,
        })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn units(&self) -> &[CompositionUnit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [CompositionUnit] {
        &mut self.units
    }

    pub fn unit_mut(&mut self, name: &str) -> Option<&mut CompositionUnit> {
        self.units.iter_mut().find(|u| u.name == name)
    }

    pub fn failures(&self) -> &[UnitFailure] {
        &self.failures
    }

    pub fn resources(&self) -> &BTreeSet<PathBuf> {
        &self.resources
    }

    /// Validator carrying this run's package and resource entry names.
    #[must_use]
    pub fn validator(&self) -> ConstraintValidator {
        ConstraintValidator::new(&self.config, self.resource_names.clone())
    }

    /// Names of every unit except the `index`-th.
    #[must_use]
    pub fn sibling_names(&self, index: usize) -> Vec<String> {
        self.units
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, u)| u.name.clone())
            .collect()
    }

    /// Violations of the `index`-th unit; empty when it does not exist.
    pub fn validate(&self, index: usize) -> Vec<ConstraintViolation> {
        let validator = self.validator();
        self.units
            .get(index)
            .map(|unit| validator.validate(unit, &self.sibling_names(index)))
            .unwrap_or_default()
    }

    /// Every unit name with its violations, in unit order.
    pub fn validate_all(&self) -> Vec<(String, Vec<ConstraintViolation>)> {
        let validator = self.validator();
        self.units
            .iter()
            .enumerate()
            .map(|(i, unit)| (unit.name.clone(), validator.validate(unit, &self.sibling_names(i))))
            .collect()
    }

    /// Validate and package the `index`-th unit.
    pub fn export_unit(
        &self,
        index: usize,
        output_dir: &Path,
        artifact_name: &str,
        build: &dyn BuildService,
        cancel: CancelFlag,
        overwrite: bool,
    ) -> Result<SynthesisOutcome, WeldError> {
        let unit = self.units.get(index).ok_or_else(|| {
            WeldError::Config(format!("no unit at index {}", index))
        })?;
        let validator = self.validator();
        ArtifactSynthesizer::new(&self.config)
            .with_validator(&validator, self.sibling_names(index))
            .with_build(build)
            .with_cancel(cancel)
            .overwrite(overwrite)
            .synthesize(unit, output_dir, artifact_name)
    }
}

/// List the entries of every resource of `unit`, reusing earlier listings.
fn list_resources(
    unit: &CompositionUnit,
    build: &dyn BuildService,
    listings: &mut BTreeMap<PathBuf, Vec<String>>,
) -> Result<(), WeldError> {
    for resource in unit.resources() {
        if listings.contains_key(&resource) {
            continue;
        }
        if !resource.exists() {
            return Err(WeldError::MissingResource(resource));
        }
        let entries = build.list_entries(&resource)?;
        listings.insert(resource, entries);
    }
    Ok(())
}
