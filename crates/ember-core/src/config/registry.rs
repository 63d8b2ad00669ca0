//! Process-wide map from configuration name to typed variable.

use super::var::{downcast, ConfigVar, ConfigVarBase};
use crate::codec::{serialize_node, ConfigValue};
use crate::util::data::{flatten_with_branches, insert_path, load_document, load_document_file};
use ember_types::{ConfigName, EmberError, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of loading a document into the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Entries decoded and stored (including ones equal to the current value)
    pub applied: usize,
    /// Entries with no registered variable of that name
    pub unmatched: usize,
    /// Entries that failed to decode or were rejected by a listener
    pub failed: usize,
}

/// Registry of configuration variables.
///
/// The map itself is guarded by one lock that is only held for lookup,
/// creation and iteration; listener callbacks never run under it.
pub struct ConfigRegistry {
    vars: RwLock<BTreeMap<String, Arc<dyn ConfigVarBase>>>,
}

impl ConfigRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            vars: RwLock::new(BTreeMap::new()),
        }
    }

    /// Get the process-wide registry, constructing it on first access.
    pub fn global() -> &'static ConfigRegistry {
        static INSTANCE: Lazy<ConfigRegistry> = Lazy::new(ConfigRegistry::new);
        &INSTANCE
    }

    /// Get the variable `name`, creating it with `default_value` if absent.
    ///
    /// When the variable already exists, `default_value` and `description`
    /// are ignored.
    ///
    /// # Errors
    ///
    /// - `EmberError::InvalidName` if `name` has characters outside `[A-Za-z0-9._]`
    /// - `EmberError::TypeMismatch` if `name` is registered with another type
    pub fn lookup_or_create<T: ConfigValue>(
        &self,
        name: &str,
        default_value: T,
        description: &str,
    ) -> Result<Arc<ConfigVar<T>>> {
        let name = ConfigName::new(name).map_err(|e| {
            error!("Lookup name invalid: {}", name);
            e
        })?;

        let mut vars = self.vars.write();
        if let Some(existing) = vars.get(name.as_str()) {
            return match downcast::<T>(existing.clone()) {
                Some(var) => {
                    debug!("Lookup name={} exists", name);
                    Ok(var)
                }
                None => {
                    error!(
                        "Lookup name={} exists but type is {}, requested {}",
                        name,
                        existing.type_name(),
                        std::any::type_name::<T>()
                    );
                    Err(EmberError::TypeMismatch {
                        name: name.to_string(),
                        expected: std::any::type_name::<T>().to_string(),
                        actual: existing.type_name().to_string(),
                    })
                }
            };
        }

        let key = name.to_string();
        let var = Arc::new(ConfigVar::new(name, default_value, description));
        vars.insert(key, var.clone());
        Ok(var)
    }

    /// Find a variable by name and type.
    ///
    /// Returns `None` both when the name is unknown and when it holds a
    /// different type.
    pub fn find<T: ConfigValue>(&self, name: &str) -> Option<Arc<ConfigVar<T>>> {
        self.lookup_base(name).and_then(downcast::<T>)
    }

    /// Find a variable by name without knowing its type.
    pub fn lookup_base(&self, name: &str) -> Option<Arc<dyn ConfigVarBase>> {
        self.vars.read().get(&name.to_ascii_lowercase()).cloned()
    }

    /// Apply `callback` to every variable, in name order.
    pub fn visit<F>(&self, mut callback: F)
    where
        F: FnMut(&Arc<dyn ConfigVarBase>),
    {
        let vars = self.vars.read();
        for var in vars.values() {
            callback(var);
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.vars.read().keys().cloned().collect()
    }

    /// Number of registered variables.
    pub fn len(&self) -> usize {
        self.vars.read().len()
    }

    /// Whether no variable is registered.
    pub fn is_empty(&self) -> bool {
        self.vars.read().is_empty()
    }

    /// Update registered variables from a document.
    ///
    /// Every node is matched by its dotted, case-folded path. Scalars are
    /// passed to `from_string` as their raw text, mappings and sequences as
    /// re-serialized YAML. Unknown names are ignored; failures are logged and
    /// do not stop the remaining entries.
    pub fn load_from_document(&self, root: &Value) -> LoadSummary {
        let mut summary = LoadSummary::default();

        for (name, node) in flatten_with_branches(root) {
            let Some(var) = self.lookup_base(&name) else {
                if !node.is_mapping() {
                    summary.unmatched += 1;
                }
                continue;
            };

            let text = match serialize_node(&node) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Config {} could not be serialized: {}", name, e);
                    summary.failed += 1;
                    continue;
                }
            };

            match var.from_string(&text) {
                Ok(true) => summary.applied += 1,
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    error!("Config {} rejected by listener: {}", name, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Config loaded: {} applied, {} unmatched, {} failed",
            summary.applied, summary.unmatched, summary.failed
        );
        summary
    }

    /// Parse `content` as YAML and load it.
    ///
    /// Unquoted numbers are passed on as written, so `version: 1.10` gives a
    /// `String` variable `"1.10"`.
    pub fn load_from_str(&self, content: &str) -> Result<LoadSummary> {
        let root = load_document(content)?;
        Ok(self.load_from_document(&root))
    }

    /// Read a YAML file and load it.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<LoadSummary> {
        let path = path.as_ref();
        debug!("Loading config from {:?}", path);
        let root = load_document_file(path)?;
        Ok(self.load_from_document(&root))
    }

    /// Rebuild a nested document from every variable's current value.
    ///
    /// Variables whose value cannot be encoded are left out.
    pub fn to_document(&self) -> Value {
        let mut root = Value::Mapping(Mapping::new());
        self.visit(|var| match var.to_node() {
            Ok(node) => insert_path(&mut root, var.name(), node),
            Err(e) => warn!("Config {} skipped in export: {}", var.name(), e),
        });
        root
    }

    /// [`to_document`](Self::to_document) serialized as YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(&self.to_document()).map_err(Into::into)
    }
}

impl Default for ConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("names", &self.names())
            .finish()
    }
}
