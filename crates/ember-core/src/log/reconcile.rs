//! Hot reload of loggers from the `logs` configuration variable.
//!
//! The reconciler is a listener on the `logs` variable. Each time the set of
//! declared loggers changes it diffs the old and new declarations by logger
//! name and rebuilds only the loggers whose declaration changed. Loggers that
//! disappear from the set are muted, never removed.

use super::appender::LogAppender;
use super::format::PatternFormatter;
use super::logger::{LoggerManager, DEFAULT_PATTERN};
use crate::config::{ConfigRegistry, ConfigVar, ListenerId};
use ember_types::{LogLevel, LoggerDefinition, Result};
use once_cell::sync::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Name of the configuration variable holding the logger declarations.
pub const LOGS_CONFIG_NAME: &str = "logs";

/// Value type of the `logs` variable.
pub type LoggerDefinitions = BTreeSet<LoggerDefinition>;

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Loggers created or rebuilt
    pub updated: usize,
    /// Loggers muted because their declaration was removed
    pub removed: usize,
    /// Declarations that could not be applied
    pub failed: usize,
    /// Declarations identical to the previous ones
    pub unchanged: usize,
}

/// Applies logger declaration changes to a [`LoggerManager`].
#[derive(Debug, Clone)]
pub struct LogConfigReconciler {
    manager: Arc<LoggerManager>,
}

impl LogConfigReconciler {
    /// Reconciler driving `manager`.
    pub fn new(manager: Arc<LoggerManager>) -> Self {
        Self { manager }
    }

    /// The logger directory being driven.
    pub fn manager(&self) -> &Arc<LoggerManager> {
        &self.manager
    }

    /// Bring the live loggers from `old` to `new`.
    ///
    /// A declaration that fails to apply is logged and counted; the logger
    /// it names is left as it was and the rest of the set is still applied.
    pub fn reconcile(&self, old: &LoggerDefinitions, new: &LoggerDefinitions) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        let previous: BTreeMap<&str, &LoggerDefinition> =
            old.iter().map(|def| (def.name.as_str(), def)).collect();
        let current: BTreeSet<&str> = new.iter().map(|def| def.name.as_str()).collect();

        for def in new {
            if previous.get(def.name.as_str()) == Some(&def) {
                summary.unchanged += 1;
                continue;
            }
            match self.apply(def) {
                Ok(()) => {
                    debug!("Reconciled logger {}", def.name);
                    summary.updated += 1;
                }
                Err(e) => {
                    error!("Failed to apply logger definition '{}': {}", def.name, e);
                    summary.failed += 1;
                }
            }
        }

        for name in previous.keys().filter(|name| !current.contains(*name)) {
            let logger = self.manager.get_logger(name);
            logger.set_level(LogLevel::Off);
            logger.clear_appenders();
            debug!("Muted logger {}", name);
            summary.removed += 1;
        }

        info!(
            "Logger reconciliation: {} updated, {} removed, {} failed, {} unchanged",
            summary.updated, summary.removed, summary.failed, summary.unchanged
        );
        summary
    }

    /// Rebuild one logger from its declaration.
    ///
    /// Appenders are built before the logger is touched, so a bad appender
    /// declaration leaves the logger unchanged.
    fn apply(&self, def: &LoggerDefinition) -> Result<()> {
        let mut appenders = Vec::with_capacity(def.appenders.len());
        for appender_def in &def.appenders {
            let appender = LogAppender::from_definition(appender_def)?;
            if let Some(error) = appender.sink_error() {
                warn!("Logger {} has an unusable appender: {}", def.name, error);
            }
            if let Some(pattern) = &appender_def.pattern {
                let formatter = PatternFormatter::new(pattern.as_str());
                if formatter.is_error() {
                    warn!("Appender pattern for {} is malformed: '{}'", def.name, pattern);
                }
                appender.set_formatter(Arc::new(formatter));
            }
            appenders.push(appender);
        }

        let logger = self.manager.get_logger(&def.name);
        logger.set_level(def.level);
        logger.set_pattern(def.pattern.as_deref().unwrap_or(DEFAULT_PATTERN));
        logger.clear_appenders();
        for appender in appenders {
            logger.add_appender(appender);
        }
        Ok(())
    }
}

/// Register the `logs` variable in `registry` and attach a reconciler for
/// `manager` to it.
///
/// Declarations already stored in the variable are applied immediately.
pub fn install(
    registry: &ConfigRegistry,
    manager: Arc<LoggerManager>,
) -> Result<(Arc<ConfigVar<LoggerDefinitions>>, ListenerId)> {
    let var = registry.lookup_or_create::<LoggerDefinitions>(
        LOGS_CONFIG_NAME,
        LoggerDefinitions::new(),
        "logger declarations",
    )?;

    let reconciler = LogConfigReconciler::new(manager);
    let current = var.get_value();
    if !current.is_empty() {
        reconciler.reconcile(&LoggerDefinitions::new(), &current);
    }

    let id = var.add_listener(move |old, new| {
        reconciler.reconcile(old, new);
        Ok(())
    });
    Ok((var, id))
}

/// [`install`] on the global registry and global logger manager, once.
pub fn install_global() -> Result<Arc<ConfigVar<LoggerDefinitions>>> {
    static INSTALLED: OnceCell<Arc<ConfigVar<LoggerDefinitions>>> = OnceCell::new();
    INSTALLED
        .get_or_try_init(|| {
            install(ConfigRegistry::global(), LoggerManager::global()).map(|(var, _)| var)
        })
        .cloned()
}
