//! Hooked global variable registry
//!
//! Global identifiers are indirected through registered getter/setter/
//! is-defined triples rather than read from storage directly. Hooks validate
//! writes before committing, so a failed write never alters the observable
//! value. Names without a hook fall back to the plain backing store.
//!
//! The registry is installed once at startup and read concurrently afterwards;
//! re-registration replaces an entry.

use crate::context::ThreadContext;
use crate::exception::ExceptionKind;
use crate::raise::{raise, RaiseRequest};
use crate::state::RuntimeState;
use crate::value::Value;
use crate::EngineResult;
use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Descriptor returned by the default is-defined check
const DEFINED_DESCRIPTOR: &str = "global-variable";

/// No-arg producer of the variable's value
pub type GetterFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Validator/mutator invoked on write; rejects before committing
pub type SetterFn = Arc<dyn Fn(&RuntimeState, &ThreadContext, Value) -> EngineResult<()> + Send + Sync>;

/// Is-defined check; returns a descriptive string or nothing
pub type DefinedFn = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// A registered getter/setter/is-defined triple
pub struct GlobalEntry {
    /// Produces the variable's value
    pub getter: GetterFn,

    /// Validates and commits a new value
    pub setter: SetterFn,

    /// Reports whether the variable counts as defined
    pub is_defined: DefinedFn,
}

/// Plain backing storage for variable values
///
/// Hook closures capture a handle to this store so hooked reads and writes
/// can share state with unhooked ones.
#[derive(Debug, Default)]
pub struct GlobalStore {
    values: RwLock<FxHashMap<String, Value>>,
}

impl GlobalStore {
    /// Create an empty store
    pub fn new() -> GlobalStore {
        GlobalStore::default()
    }

    /// Read a stored value, `Nil` when absent
    pub fn get(&self, name: &str) -> Value {
        self.values.read().get(name).cloned().unwrap_or(Value::Nil)
    }

    /// Read a stored value, `None` when absent
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    /// Store a value unconditionally
    pub fn set(&self, name: &str, value: Value) {
        self.values.write().insert(name.to_string(), value);
    }

    /// Whether a value is stored under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }
}

/// Registry mapping variable names to hook entries
pub struct GlobalRegistry {
    store: Arc<GlobalStore>,
    hooks: DashMap<String, Arc<GlobalEntry>>,
}

impl GlobalRegistry {
    /// Create an empty registry with a fresh backing store
    pub fn new() -> GlobalRegistry {
        GlobalRegistry {
            store: Arc::new(GlobalStore::new()),
            hooks: DashMap::new(),
        }
    }

    /// Handle to the backing store, for hook closures
    pub fn store(&self) -> Arc<GlobalStore> {
        self.store.clone()
    }

    /// Install or replace a hook entry with the default is-defined check
    pub fn register(&self, name: &str, getter: GetterFn, setter: SetterFn) {
        let is_defined: DefinedFn = Arc::new(|| Some(DEFINED_DESCRIPTOR.to_string()));
        self.register_with_defined(name, getter, setter, is_defined);
    }

    /// Install or replace a hook entry with an explicit is-defined check
    pub fn register_with_defined(
        &self,
        name: &str,
        getter: GetterFn,
        setter: SetterFn,
        is_defined: DefinedFn,
    ) {
        self.hooks.insert(
            name.to_string(),
            Arc::new(GlobalEntry {
                getter,
                setter,
                is_defined,
            }),
        );
    }

    /// Install a read-only variable: writes always fail, naming the variable
    pub fn register_read_only(&self, name: &str, getter: GetterFn) {
        let variable = name.to_string();
        let setter: SetterFn = Arc::new(move |state, ctx, _value| {
            Err(raise(
                state,
                ctx,
                RaiseRequest::Kind(ExceptionKind::ReadOnly),
                Some(format!("{} is a read-only variable.", variable)),
                None,
            ))
        });
        self.register(name, getter, setter);
    }

    /// Install a storage-backed variable with pass-through hooks
    pub fn register_value(&self, name: &str, initial: Value) {
        self.store.set(name, initial);

        let getter: GetterFn = {
            let store = self.store.clone();
            let name = name.to_string();
            Arc::new(move || store.get(&name))
        };
        let setter: SetterFn = {
            let store = self.store.clone();
            let name = name.to_string();
            Arc::new(move |_state, _ctx, value| {
                store.set(&name, value);
                Ok(())
            })
        };
        self.register(name, getter, setter);
    }

    /// Make `alias` share the entry currently registered under `existing`
    ///
    /// Returns false (and registers nothing) when `existing` has no entry.
    pub fn alias(&self, alias: &str, existing: &str) -> bool {
        match self.hooks.get(existing).map(|entry| entry.clone()) {
            Some(entry) => {
                self.hooks.insert(alias.to_string(), entry);
                true
            }
            None => false,
        }
    }

    /// Whether `name` has a hook entry
    pub fn is_hooked(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    /// Read a variable through its getter
    ///
    /// Hook getters are value-producing, so reads never fail; unhooked names
    /// read from the backing store, `Nil` when absent.
    pub fn read(&self, name: &str) -> Value {
        // Clone the hook out so the getter runs without a map guard held
        match self.hooks.get(name).map(|entry| entry.clone()) {
            Some(entry) => (entry.getter)(),
            None => self.store.get(name),
        }
    }

    /// Write a variable through its setter
    ///
    /// The setter validates before committing; a rejected value leaves the
    /// prior value observable. Unhooked names store directly.
    pub fn write(
        &self,
        state: &RuntimeState,
        ctx: &ThreadContext,
        name: &str,
        value: Value,
    ) -> EngineResult<()> {
        match self.hooks.get(name).map(|entry| entry.clone()) {
            Some(entry) => (entry.setter)(state, ctx, value),
            None => {
                self.store.set(name, value);
                Ok(())
            }
        }
    }

    /// Report whether `name` is defined, with a descriptor string
    pub fn is_defined(&self, name: &str) -> Option<String> {
        match self.hooks.get(name).map(|entry| entry.clone()) {
            Some(entry) => (entry.is_defined)(),
            None if self.store.contains(name) => Some(DEFINED_DESCRIPTOR.to_string()),
            None => None,
        }
    }
}

impl Default for GlobalRegistry {
    fn default() -> Self {
        Self::new()
    }
}
