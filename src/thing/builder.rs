use super::{EventRegistry, Thing, ThingError};
use crate::action::{ActionDefinition, ActionRegistry};
use crate::notify::{Notifier, SubscriberSet};
use crate::property::{Property, PropertyAccessor, PropertyStore, ValueCell};
use crate::validation::Validate;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

const DEFAULT_EVENT_HISTORY: usize = 10;

enum Binding {
    Initial(Value),
    Accessor(Box<dyn PropertyAccessor>),
}

struct PropertyDecl {
    name: String,
    validator: Arc<dyn Validate>,
    binding: Binding,
    read_only: bool,
}

/// Declarative construction of a Thing
///
/// All properties, actions and events are fixed by `build`; accessors and
/// validators are bound once here.
pub struct ThingBuilder {
    name: String,
    title: Option<String>,
    description: Option<String>,
    properties: Vec<PropertyDecl>,
    actions: Vec<ActionDefinition>,
    events: Vec<String>,
    event_history: usize,
}

impl ThingBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            properties: Vec::new(),
            actions: Vec::new(),
            events: Vec::new(),
            event_history: DEFAULT_EVENT_HISTORY,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Writable property stored in the Thing, starting at `initial`
    pub fn property(
        mut self,
        name: impl Into<String>,
        validator: impl Validate + 'static,
        initial: Value,
    ) -> Self {
        self.properties.push(PropertyDecl {
            name: name.into(),
            validator: Arc::new(validator),
            binding: Binding::Initial(initial),
            read_only: false,
        });
        self
    }

    pub fn read_only_property(
        mut self,
        name: impl Into<String>,
        validator: impl Validate + 'static,
        initial: Value,
    ) -> Self {
        self.properties.push(PropertyDecl {
            name: name.into(),
            validator: Arc::new(validator),
            binding: Binding::Initial(initial),
            read_only: true,
        });
        self
    }

    /// Writable property backed by external storage
    pub fn property_with_accessor(
        mut self,
        name: impl Into<String>,
        validator: impl Validate + 'static,
        accessor: impl PropertyAccessor + 'static,
    ) -> Self {
        self.properties.push(PropertyDecl {
            name: name.into(),
            validator: Arc::new(validator),
            binding: Binding::Accessor(Box::new(accessor)),
            read_only: false,
        });
        self
    }

    pub fn action(mut self, definition: ActionDefinition) -> Self {
        self.actions.push(definition);
        self
    }

    pub fn event(mut self, name: impl Into<String>) -> Self {
        self.events.push(name.into());
        self
    }

    /// Occurrences kept per event name (0 keeps none)
    pub fn event_history(mut self, capacity: usize) -> Self {
        self.event_history = capacity;
        self
    }

    /// Validate the declaration and assemble the Thing
    ///
    /// Spawns the notification fan-out task when called inside a tokio runtime.
    pub fn build(self) -> Result<Arc<Thing>, ThingError> {
        ensure_unique(self.properties.iter().map(|p| p.name.as_str()))?;
        ensure_unique(self.actions.iter().map(|a| a.name()))?;
        ensure_unique(self.events.iter().map(String::as_str))?;

        let subscribers = Arc::new(SubscriberSet::new());
        let notifier = Notifier::spawn(&self.name, Arc::clone(&subscribers));

        let mut properties = Vec::with_capacity(self.properties.len());
        for decl in self.properties {
            let accessor: Box<dyn PropertyAccessor> = match decl.binding {
                Binding::Initial(initial) => {
                    let value = decl.validator.validate(&initial).map_err(|source| {
                        ThingError::InvalidValue {
                            name: decl.name.clone(),
                            source,
                        }
                    })?;
                    Box::new(ValueCell::new(value))
                }
                Binding::Accessor(accessor) => accessor,
            };
            properties.push(Property::new(
                decl.name,
                decl.validator,
                accessor,
                decl.read_only,
            ));
        }

        let thing = Thing {
            properties: PropertyStore::new(properties, notifier.clone()),
            actions: ActionRegistry::new(&self.name, self.actions, notifier.clone()),
            events: EventRegistry::new(self.events, self.event_history, notifier.clone()),
            name: self.name,
            title: self.title,
            description: self.description,
            subscribers,
            notifier,
        };

        info!(
            thing = %thing.name,
            properties = thing.properties.len(),
            "Thing built"
        );

        Ok(Arc::new(thing))
    }
}

fn ensure_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), ThingError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ThingError::DuplicateName(name.to_string()));
        }
    }
    Ok(())
}
