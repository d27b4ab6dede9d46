// Property store: named, typed, constrained value cells

mod accessor;


pub use accessor::{FnAccessor, PropertyAccessor, ValueCell};

use crate::notify::{Notifier, ThingEvent};
use crate::validation::{ThingValue, Validate, ValidationError};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("property '{0}' not found")]
    NotFound(String),

    #[error("invalid value for property '{name}': {source}")]
    InvalidValue {
        name: String,
        #[source]
        source: ValidationError,
    },

    #[error("property '{0}' is read-only")]
    ReadOnly(String),
}

/// A single property: validator and accessor are bound once, at build time
pub struct Property {
    name: String,
    validator: Arc<dyn Validate>,
    accessor: Box<dyn PropertyAccessor>,
    read_only: bool,
    /// Serializes validate-then-write for this property only
    write_lock: Mutex<()>,
}

impl Property {
    pub fn new(
        name: impl Into<String>,
        validator: Arc<dyn Validate>,
        accessor: Box<dyn PropertyAccessor>,
        read_only: bool,
    ) -> Self {
        Self {
            name: name.into(),
            validator,
            accessor,
            read_only,
            write_lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn validator(&self) -> &Arc<dyn Validate> {
        &self.validator
    }

    pub fn get(&self) -> ThingValue {
        self.accessor.get()
    }

    /// Validate and store a raw value; `on_change` runs before the write lock is released
    fn set(
        &self,
        raw: &Value,
        on_change: impl FnOnce(&ThingValue),
    ) -> Result<ThingValue, PropertyError> {
        if self.read_only {
            return Err(PropertyError::ReadOnly(self.name.clone()));
        }

        let _guard = self.write_lock.lock();

        let value = self
            .validator
            .validate(raw)
            .map_err(|source| PropertyError::InvalidValue {
                name: self.name.clone(),
                source,
            })?;

        self.accessor.set(value.clone());
        on_change(&value);

        Ok(value)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("validator", &self.validator)
            .field("read_only", &self.read_only)
            .finish()
    }
}

/// Per-Thing mapping from property name to its cell
///
/// The map itself is immutable after build, so lookups take no lock and
/// different properties never contend.
pub struct PropertyStore {
    properties: HashMap<String, Arc<Property>>,
    notifier: Notifier,
}

impl PropertyStore {
    pub fn new(properties: Vec<Property>, notifier: Notifier) -> Self {
        let properties = properties
            .into_iter()
            .map(|p| (p.name.clone(), Arc::new(p)))
            .collect();

        Self {
            properties,
            notifier,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn property(&self, name: &str) -> Option<&Arc<Property>> {
        self.properties.get(name)
    }

    /// Current value of a property
    pub fn get(&self, name: &str) -> Result<ThingValue, PropertyError> {
        self.properties
            .get(name)
            .map(|p| p.get())
            .ok_or_else(|| PropertyError::NotFound(name.to_string()))
    }

    /// Validate and assign a raw value, then publish `PropertyChanged`
    pub fn set(&self, name: &str, raw: &Value) -> Result<ThingValue, PropertyError> {
        let property = self
            .properties
            .get(name)
            .ok_or_else(|| PropertyError::NotFound(name.to_string()))?;

        let result = property.set(raw, |value| {
            self.notifier.publish(ThingEvent::PropertyChanged {
                name: name.to_string(),
                value: value.to_json(),
            });
        });

        match &result {
            Ok(value) => debug!(property = %name, value = ?value, "Property updated"),
            Err(e) => warn!(property = %name, error = %e, "Property update rejected"),
        }

        result
    }

    /// All current values, keyed by property name
    pub fn values(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .map(|(name, property)| (name.clone(), property.get().to_json()))
            .collect()
    }
}
