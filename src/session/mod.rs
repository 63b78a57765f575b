//! Session state
//!
//! A session is an opaque id mapped to a flat JSON object of slot values.
//! The merge policy lives here as a pure function; stores only persist.

pub mod postgres;
pub mod store;

pub use postgres::PostgresSessionStore;
pub use store::{build_session_store, purge_interval, spawn_purge_task, InMemorySessionStore, SessionStore};

use serde_json::{Map, Value};

/// Slot name → raw value, exactly as extracted
pub type Session = Map<String, Value>;

/// `null` and blank strings carry no information and never overwrite a slot
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Shallow merge: each non-empty update overwrites its key, last write wins.
/// Returns a new session; `old` is left untouched.
pub fn merge(old: &Session, updates: &Session) -> Session {
    let mut merged = old.clone();
    for (key, value) in updates {
        if !is_empty_value(value) {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// The non-empty part of an update, i.e. what a merge would actually write
pub fn effective_updates(updates: &Session) -> Session {
    updates
        .iter()
        .filter(|(_, value)| !is_empty_value(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
