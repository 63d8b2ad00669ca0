//! A single named, typed configuration value.

use crate::codec::ConfigValue;
use ember_types::{ConfigName, Result};
use parking_lot::RwLock;
use serde_yaml::Value;
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Handle returned by [`ConfigVar::add_listener`].
///
/// Ids come from one process-wide counter and are never reused, even across
/// different variables.
pub type ListenerId = u64;

/// Change callback receiving `(old, new)`.
///
/// Returning an error vetoes the change: later listeners are skipped and the
/// stored value is left untouched.
pub type Listener<T> = Box<dyn Fn(&T, &T) -> Result<()> + Send + Sync>;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Type-erased view of a [`ConfigVar`], as stored in the registry.
pub trait ConfigVarBase: Send + Sync {
    /// Case-folded dotted name.
    fn name(&self) -> &str;

    /// Human description given at creation.
    fn description(&self) -> &str;

    /// Rust type name of the stored value.
    fn type_name(&self) -> &'static str;

    /// `TypeId` of the stored value, checked before downcasting.
    fn value_type_id(&self) -> TypeId;

    /// Current value as text; empty if it cannot be encoded.
    fn to_string(&self) -> String;

    /// Current value as a document node.
    fn to_node(&self) -> Result<Value>;

    /// Decode `text` and store it.
    ///
    /// Returns `Ok(false)` when the text does not decode (the value is kept),
    /// and `Err` only when a listener rejects the change.
    fn from_string(&self, text: &str) -> Result<bool>;

    /// Upcast for downcasting to the concrete `ConfigVar<T>`.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Downcast a type-erased variable to `ConfigVar<T>`.
///
/// Returns `None` if the variable holds a different type.
pub fn downcast<T: ConfigValue>(var: Arc<dyn ConfigVarBase>) -> Option<Arc<ConfigVar<T>>> {
    if var.value_type_id() != TypeId::of::<T>() {
        return None;
    }
    var.as_any().downcast::<ConfigVar<T>>().ok()
}

struct VarState<T> {
    value: T,
    // Keyed by id; ids are monotonic so iteration order is insertion order.
    listeners: BTreeMap<ListenerId, Listener<T>>,
}

/// A named configuration value of type `T`.
///
/// Reads take a shared lock and return a copy. Writes hold the exclusive lock
/// for the whole compare/notify/store sequence, so a listener must not call
/// back into the same variable.
pub struct ConfigVar<T: ConfigValue> {
    name: ConfigName,
    description: String,
    default_value: T,
    state: RwLock<VarState<T>>,
}

impl<T: ConfigValue> ConfigVar<T> {
    /// Create a variable holding `default_value`.
    pub fn new(name: ConfigName, default_value: T, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            state: RwLock::new(VarState {
                value: default_value.clone(),
                listeners: BTreeMap::new(),
            }),
            default_value,
        }
    }

    /// Copy of the current value.
    pub fn get_value(&self) -> T {
        self.state.read().value.clone()
    }

    /// Value the variable was created with.
    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Store a new value, notifying listeners first.
    ///
    /// Returns `Ok(false)` without notifying anyone if `value` equals the
    /// current value. If a listener fails, the error is returned and the old
    /// value stays in place.
    pub fn set_value(&self, value: T) -> Result<bool> {
        let mut state = self.state.write();
        if state.value == value {
            return Ok(false);
        }
        for listener in state.listeners.values() {
            listener(&state.value, &value)?;
        }
        state.value = value;
        Ok(true)
    }

    /// Set the value back to the default through the normal notify path.
    pub fn reset(&self) -> Result<bool> {
        self.set_value(self.default_value.clone())
    }

    /// Register a change listener.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T, &T) -> Result<()> + Send + Sync + 'static,
    {
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
        self.state.write().listeners.insert(id, Box::new(listener));
        id
    }

    /// Remove a listener. Returns `false` if the id is not registered here.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.state.write().listeners.remove(&id).is_some()
    }

    /// Remove every listener.
    pub fn clear_listeners(&self) {
        self.state.write().listeners.clear();
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.state.read().listeners.len()
    }
}

impl<T: ConfigValue> ConfigVarBase for ConfigVar<T> {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn to_string(&self) -> String {
        match self.get_value().encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Failed to convert {} ({}) to string: {}",
                    self.name,
                    std::any::type_name::<T>(),
                    e
                );
                String::new()
            }
        }
    }

    fn to_node(&self) -> Result<Value> {
        self.get_value().to_node()
    }

    fn from_string(&self, text: &str) -> Result<bool> {
        match T::decode(text) {
            Ok(value) => {
                self.set_value(value)?;
                Ok(true)
            }
            Err(e) => {
                warn!(
                    "Failed to convert string to {} for {}: {}",
                    std::any::type_name::<T>(),
                    self.name,
                    e
                );
                Ok(false)
            }
        }
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<T: ConfigValue + std::fmt::Debug> std::fmt::Debug for ConfigVar<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigVar")
            .field("name", &self.name)
            .field("value", &self.state.read().value)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::Thread;
    use ember_types::EmberError;
    use parking_lot::Mutex;
    use std::collections::BTreeSet;

    fn var<T: ConfigValue>(name: &str, value: T) -> Arc<ConfigVar<T>> {
        Arc::new(ConfigVar::new(ConfigName::new(name).unwrap(), value, "test"))
    }

    #[test]
    fn test_get_set() {
        let port = var("system.port", 8080i32);
        assert_eq!(port.get_value(), 8080);
        assert!(port.set_value(9090).unwrap());
        assert_eq!(port.get_value(), 9090);
        assert_eq!(*port.default_value(), 8080);
    }

    #[test]
    fn test_listeners_fire_in_order_before_store() {
        let port = var("system.port", 1i32);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        port.add_listener(move |old, new| {
            first.lock().push(format!("first {}->{}", old, new));
            Ok(())
        });
        let second = seen.clone();
        port.add_listener(move |old, new| {
            second.lock().push(format!("second {}->{}", old, new));
            Ok(())
        });

        port.set_value(2).unwrap();
        assert_eq!(*seen.lock(), vec!["first 1->2", "second 1->2"]);
    }

    #[test]
    fn test_same_value_is_noop() {
        let port = var("system.port", 1i32);
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        port.add_listener(move |_, _| {
            *counter.lock() += 1;
            Ok(())
        });

        assert!(port.set_value(5).unwrap());
        assert!(!port.set_value(5).unwrap());
        assert!(!port.set_value(5).unwrap());
        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn test_failing_listener_keeps_old_value() {
        let port = var("system.port", 1i32);
        let later = Arc::new(Mutex::new(false));
        port.add_listener(|_, new| {
            if *new < 0 {
                return Err(EmberError::Listener("negative port".to_string()));
            }
            Ok(())
        });
        let flag = later.clone();
        port.add_listener(move |_, _| {
            *flag.lock() = true;
            Ok(())
        });

        assert!(port.set_value(-1).is_err());
        assert_eq!(port.get_value(), 1);
        assert!(!*later.lock());
    }

    #[test]
    fn test_listener_ids_unique_across_vars() {
        let a = var("a", 0i32);
        let b = var("b", String::new());
        let id1 = a.add_listener(|_, _| Ok(()));
        let id2 = b.add_listener(|_, _| Ok(()));
        let id3 = a.add_listener(|_, _| Ok(()));
        assert!(id1 < id2 && id2 < id3);

        assert!(a.remove_listener(id1));
        assert!(!a.remove_listener(id1));
        assert!(!a.remove_listener(id2));
        let id4 = a.add_listener(|_, _| Ok(()));
        assert!(id4 > id3);

        a.clear_listeners();
        assert_eq!(a.listener_count(), 0);
        assert_eq!(b.listener_count(), 1);
    }

    #[test]
    fn test_from_string_failure_keeps_value() {
        let port = var("system.port", 8080i32);
        assert!(!port.from_string("not a number").unwrap());
        assert_eq!(port.get_value(), 8080);
        assert!(port.from_string("9000").unwrap());
        assert_eq!(port.get_value(), 9000);
        assert_eq!(ConfigVarBase::to_string(&*port), "9000");
    }

    #[test]
    fn test_reset_notifies() {
        let tags = var("system.tags", vec!["a".to_string()]);
        tags.set_value(vec!["b".to_string()]).unwrap();
        let fired = Arc::new(Mutex::new(false));
        let flag = fired.clone();
        tags.add_listener(move |_, new| {
            *flag.lock() = new == &vec!["a".to_string()];
            Ok(())
        });
        assert!(tags.reset().unwrap());
        assert!(*fired.lock());
    }

    #[test]
    fn test_downcast_checks_type() {
        let port: Arc<dyn ConfigVarBase> = var("system.port", 8080i32);
        assert!(downcast::<i32>(port.clone()).is_some());
        assert!(downcast::<i64>(port.clone()).is_none());
        assert!(downcast::<String>(port).is_none());
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_values() {
        let pair = var("system.pair", vec![0i64, 0i64]);
        let torn = Arc::new(AtomicU64::new(0));

        let seen = torn.clone();
        pair.add_listener(move |old, new| {
            if old[0] != old[1] || new[0] != new[1] {
                seen.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        });

        let mut threads = Vec::new();
        for writer in 0..4i64 {
            let pair = pair.clone();
            threads.push(
                Thread::spawn(format!("writer_{}", writer), move || {
                    for i in 0..200i64 {
                        let k = writer * 1000 + i;
                        pair.set_value(vec![k, k]).unwrap();
                    }
                })
                .unwrap(),
            );
        }
        for reader in 0..4 {
            let pair = pair.clone();
            let torn = torn.clone();
            threads.push(
                Thread::spawn(format!("reader_{}", reader), move || {
                    for _ in 0..500 {
                        let value = pair.get_value();
                        if value.len() != 2 || value[0] != value[1] {
                            torn.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
                .unwrap(),
            );
        }
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(torn.load(Ordering::SeqCst), 0);
        let last = pair.get_value();
        assert_eq!(last[0], last[1]);
    }

    #[test]
    fn test_concurrent_listener_ids_are_unique() {
        let a = var("a", 0i32);
        let b = var("b", String::new());
        let ids = Arc::new(Mutex::new(Vec::new()));

        let mut threads = Vec::new();
        for n in 0..8 {
            let (a, b, ids) = (a.clone(), b.clone(), ids.clone());
            threads.push(
                Thread::spawn(format!("subscriber_{}", n), move || {
                    for i in 0..50 {
                        let id = if (n + i) % 2 == 0 {
                            a.add_listener(|_, _| Ok(()))
                        } else {
                            b.add_listener(|_, _| Ok(()))
                        };
                        ids.lock().push(id);
                    }
                })
                .unwrap(),
            );
        }
        for thread in threads {
            thread.join().unwrap();
        }

        let ids = ids.lock();
        let unique: BTreeSet<ListenerId> = ids.iter().copied().collect();
        assert_eq!(ids.len(), 400);
        assert_eq!(unique.len(), 400);
        assert_eq!(a.listener_count() + b.listener_count(), 400);
    }
}
