//! Pipeline context - shared state threaded through every step

use crate::core::step::StepError;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors raised when a step reads the context in a way that breaks the
/// producer/consumer contract between steps
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("required state key '{key}' is missing")]
    Missing { key: String },

    #[error("state key '{key}' holds a {found}, expected {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A stored value together with the name of its concrete type
struct Entry {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Execution context for a pipeline run
///
/// A string-keyed store of dynamically typed values. Steps write what they
/// produce and later steps read it back through the typed accessors, which
/// report a missing key or a type mismatch as a [`StateError`] instead of
/// panicking.
///
/// The context is owned by the engine for the duration of one run and is
/// only ever borrowed by one step at a time.
#[derive(Default)]
pub struct PipelineContext {
    values: HashMap<String, Entry>,

    /// The error that halted the run, if any
    error: Option<StepError>,
}

impl PipelineContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing whatever was stored under `key`
    pub fn put<T: Any + Send + Sync>(&mut self, key: &str, value: T) {
        self.values.insert(
            key.to_string(),
            Entry {
                value: Box::new(value),
                type_name: type_name::<T>(),
            },
        );
    }

    /// Borrow a value of type `T`
    pub fn get_ref<T: Any>(&self, key: &str) -> Result<&T, StateError> {
        let entry = self.values.get(key).ok_or_else(|| StateError::Missing {
            key: key.to_string(),
        })?;

        entry
            .value
            .downcast_ref::<T>()
            .ok_or_else(|| StateError::WrongType {
                key: key.to_string(),
                expected: type_name::<T>(),
                found: entry.type_name,
            })
    }

    /// Get a copy of a required value of type `T`
    pub fn get<T: Any + Clone>(&self, key: &str) -> Result<T, StateError> {
        self.get_ref::<T>(key).cloned()
    }

    /// Get a copy of an optional value
    ///
    /// An absent key is `Ok(None)`; a key holding the wrong type is still an error.
    pub fn get_optional<T: Any + Clone>(&self, key: &str) -> Result<Option<T>, StateError> {
        match self.get_ref::<T>(key) {
            Ok(value) => Ok(Some(value.clone())),
            Err(StateError::Missing { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check whether a key has been written
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove a key, returning whether it was present
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// All keys currently stored, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Record the error that halted the run
    pub fn set_error(&mut self, error: StepError) {
        self.error = Some(error);
    }

    /// The error that halted the run, if any
    pub fn error(&self) -> Option<&StepError> {
        self.error.as_ref()
    }

    /// Take ownership of the halting error
    pub fn take_error(&mut self) -> Option<StepError> {
        self.error.take()
    }
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(&str, &str)> = self
            .values
            .iter()
            .map(|(k, e)| (k.as_str(), e.type_name))
            .collect();
        entries.sort_unstable();

        f.debug_struct("PipelineContext")
            .field("values", &entries)
            .field("error", &self.error)
            .finish()
    }
}
