//! The cached parameter collection.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{HalError, Result};
use crate::params::types::{AccessMode, Parameter, ParameterImport, Visibility};

/// The slice of the device contract the collection needs: importing the
/// initial snapshot and re-reading one parameter's display value and access
/// mode. Device backends implement this as a supertrait of the full
/// contract.
pub trait ParameterPort {
    /// Snapshot every parameter the device reports, plus the names that
    /// failed to import.
    fn import_parameters(&mut self) -> Result<ParameterImport>;

    /// Current display value and access mode of one parameter.
    fn read_parameter(&mut self, name: &str) -> Result<(String, AccessMode)>;
}

/// A named, cached set of device parameters.
///
/// Built once from an import snapshot when a device is opened; individual
/// values and access flags are refreshed on demand by [`update`]. The
/// collection is rebuilt only if the device is reopened.
///
/// [`update`]: ParameterCollection::update
#[derive(Debug, Clone)]
pub struct ParameterCollection {
    name: String,
    parameters: Vec<Parameter>,
    index: HashMap<String, usize>,
    import_failures: Vec<String>,
}

impl ParameterCollection {
    /// Build the collection from a device's import snapshot.
    pub fn import<P>(name: impl Into<String>, port: &mut P) -> Result<Self>
    where
        P: ParameterPort + ?Sized,
    {
        let name = name.into();
        let snapshot = port.import_parameters()?;
        let mut parameters = Vec::with_capacity(snapshot.parameters.len());
        let mut index = HashMap::with_capacity(snapshot.parameters.len());
        for parameter in snapshot.parameters {
            if index.contains_key(&parameter.name) {
                warn!(
                    collection = %name,
                    parameter = %parameter.name,
                    "duplicate parameter in import snapshot skipped"
                );
                continue;
            }
            index.insert(parameter.name.clone(), parameters.len());
            parameters.push(parameter);
        }
        if !snapshot.failed.is_empty() {
            warn!(
                collection = %name,
                failed = snapshot.failed.len(),
                "some parameters failed to import"
            );
        }
        debug!(collection = %name, parameters = parameters.len(), "parameter import complete");
        Ok(Self {
            name,
            parameters,
            index,
            import_failures: snapshot.failed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names that failed during the initial import.
    pub fn import_failures(&self) -> &[String] {
        &self.import_failures
    }

    /// Look up a parameter; unknown names are a `KeyNotFound` error.
    pub fn get(&self, name: &str) -> Result<&Parameter> {
        self.get_opt(name).ok_or_else(|| {
            HalError::KeyNotFound(format!(
                "device does not implement parameter '{name}'"
            ))
        })
    }

    pub(crate) fn get_opt(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|i| &self.parameters[*i])
    }

    /// Re-read every known parameter's display value and access mode.
    ///
    /// Per-parameter failures are logged and skipped so one failing
    /// parameter does not abort the refresh. Intentionally sequential:
    /// later parameters may rely on earlier ones having been refreshed.
    /// Returns the number of parameters that refreshed cleanly.
    pub fn update<P>(&mut self, port: &mut P) -> usize
    where
        P: ParameterPort + ?Sized,
    {
        let mut refreshed = 0;
        for parameter in &mut self.parameters {
            match port.read_parameter(&parameter.name) {
                Ok((value, access)) => {
                    parameter.value = value;
                    parameter.access = access;
                    refreshed += 1;
                }
                Err(e) => {
                    warn!(
                        collection = %self.name,
                        parameter = %parameter.name,
                        error = %e,
                        "parameter refresh failed"
                    );
                }
            }
        }
        debug!(
            collection = %self.name,
            refreshed,
            total = self.parameters.len(),
            "parameter update complete"
        );
        refreshed
    }

    /// Overwrite one cached entry after a successful device write.
    pub(crate) fn set_cached(&mut self, name: &str, value: String, access: AccessMode) {
        if let Some(i) = self.index.get(name) {
            self.parameters[*i].value = value;
            self.parameters[*i].access = access;
        }
    }

    /// Parameters at or below the requested visibility tier, import order.
    pub fn to_list(&self, visibility: Visibility) -> Vec<&Parameter> {
        self.parameters
            .iter()
            .filter(|p| p.visibility <= visibility)
            .collect()
    }

    /// Sorted, deduplicated categories of the visible parameters.
    pub fn categories(&self, visibility: Visibility) -> Vec<String> {
        let mut categories: Vec<String> = self
            .parameters
            .iter()
            .filter(|p| p.visibility <= visibility)
            .map(|p| p.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Name/value pairs ordered so that a selector precedes every parameter
    /// it selects.
    ///
    /// Stable insertion: parameters are walked in import order and each is
    /// inserted at the earliest position among its listed dependents already
    /// present, or appended when none are.
    pub fn property_list(&self, visibility: Visibility) -> Vec<(String, String)> {
        let mut ordered: Vec<&Parameter> = Vec::with_capacity(self.parameters.len());
        for parameter in self.parameters.iter().filter(|p| p.visibility <= visibility) {
            let position = parameter
                .selected
                .iter()
                .filter_map(|dep| ordered.iter().position(|q| q.name == *dep))
                .min()
                .unwrap_or(ordered.len());
            ordered.insert(position, parameter);
        }
        ordered
            .into_iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect()
    }
}
