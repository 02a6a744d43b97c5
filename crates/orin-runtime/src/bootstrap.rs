//! Standard global variable bindings.
//!
//! Installs the hooked variable set the rest of the runtime expects:
//! load-path and script-argument lists (read-only), the record and field
//! separators (string-or-nil), the verbosity and debug flags, and the
//! last-line slot. Registration happens once at startup.

use orin_engine::globals::{GetterFn, SetterFn};
use orin_engine::raise::{raise, RaiseRequest};
use orin_engine::state::DEBUG_VARIABLE;
use orin_engine::{ExceptionKind, RuntimeState, Value};
use std::sync::Arc;

/// Directories searched when loading code
pub const LOAD_PATH: &str = "$LOAD_PATH";

/// Features already loaded
pub const LOADED_FEATURES: &str = "$LOADED_FEATURES";

/// Script arguments
pub const ARGUMENTS: &str = "$*";

/// Input record separator, string or nil
pub const RECORD_SEPARATOR: &str = "$/";

/// Output field separator, string or nil
pub const FIELD_SEPARATOR: &str = "$,";

/// Verbosity: nil suppresses warnings, anything else coerces to a boolean
pub const VERBOSE: &str = "$VERBOSE";

/// Last line read, string only
pub const LAST_LINE: &str = "$_";

/// Startup configuration for a runtime instance
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Script arguments exposed through the read-only arguments variable
    pub arguments: Vec<String>,

    /// Initial verbosity: `None` is nil (warnings suppressed)
    pub verbose: Option<bool>,

    /// Start with the debug variable set
    pub debug: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        RuntimeOptions {
            arguments: Vec::new(),
            verbose: Some(false),
            debug: false,
        }
    }
}

/// Install the standard variable set into `state`'s registry
pub fn install_standard_globals(state: &RuntimeState, options: &RuntimeOptions) {
    let globals = state.globals();
    let store = globals.store();

    // Read-only list variables, backed by storage so runtime internals can
    // still grow them
    store.set(LOAD_PATH, Value::List(Vec::new()));
    globals.register_read_only(LOAD_PATH, store_getter(LOAD_PATH, state));
    globals.alias("$:", LOAD_PATH);
    globals.alias("$-I", LOAD_PATH);

    store.set(LOADED_FEATURES, Value::List(Vec::new()));
    globals.register_read_only(LOADED_FEATURES, store_getter(LOADED_FEATURES, state));
    globals.alias("$\"", LOADED_FEATURES);

    let arguments = Value::List(options.arguments.iter().map(Value::str).collect());
    store.set(ARGUMENTS, arguments);
    globals.register_read_only(ARGUMENTS, store_getter(ARGUMENTS, state));

    register_string_or_nil(state, RECORD_SEPARATOR);
    store.set(RECORD_SEPARATOR, Value::str("\n"));
    globals.alias("$-0", RECORD_SEPARATOR);

    register_string_or_nil(state, FIELD_SEPARATOR);

    register_verbose(state, options.verbose);
    globals.alias("$-v", VERBOSE);
    globals.alias("$-w", VERBOSE);

    globals.register_value(DEBUG_VARIABLE, Value::Bool(options.debug));
    globals.alias("$-d", DEBUG_VARIABLE);

    register_last_line(state);
}

/// Getter reading `name` straight from the backing store
fn store_getter(name: &'static str, state: &RuntimeState) -> GetterFn {
    let store = state.globals().store();
    Arc::new(move || store.get(name))
}

/// Hooked variable accepting a string or nil, rejecting everything else
fn register_string_or_nil(state: &RuntimeState, name: &'static str) {
    let globals = state.globals();
    let setter: SetterFn = {
        let store = globals.store();
        Arc::new(move |state, ctx, value| match value {
            Value::Str(_) | Value::Nil => {
                store.set(name, value);
                Ok(())
            }
            _ => Err(raise(
                state,
                ctx,
                RaiseRequest::Kind(ExceptionKind::TypeMismatch),
                Some(format!("{} must be a String", name)),
                None,
            )),
        })
    };
    globals.register(name, store_getter(name, state), setter);
}

/// The verbosity variable: nil passes through, anything else coerces to bool
fn register_verbose(state: &RuntimeState, initial: Option<bool>) {
    let globals = state.globals();
    let store = globals.store();

    let initial = match initial {
        Some(flag) => Value::Bool(flag),
        None => Value::Nil,
    };
    store.set(VERBOSE, initial);

    let setter: SetterFn = {
        let store = store.clone();
        Arc::new(move |_state, _ctx, value| {
            let coerced = match value {
                Value::Nil => Value::Nil,
                other => Value::Bool(other.is_truthy()),
            };
            store.set(VERBOSE, coerced);
            Ok(())
        })
    };
    globals.register(VERBOSE, store_getter(VERBOSE, state), setter);
}

/// The last-line variable only ever holds a string
fn register_last_line(state: &RuntimeState) {
    let globals = state.globals();
    let setter: SetterFn = {
        let store = globals.store();
        Arc::new(move |state, ctx, value| match value {
            Value::Str(_) => {
                store.set(LAST_LINE, value);
                Ok(())
            }
            other => Err(raise(
                state,
                ctx,
                RaiseRequest::Kind(ExceptionKind::TypeMismatch),
                Some(format!(
                    "$_ value need to be String ({} given)",
                    other.type_name()
                )),
                None,
            )),
        })
    };
    globals.register(LAST_LINE, store_getter(LAST_LINE, state), setter);
}
