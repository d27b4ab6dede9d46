// Thing: the addressable entity owning properties, actions, events and subscribers

mod builder;
mod events;

#[cfg(test)]
mod tests;

pub use builder::ThingBuilder;
pub use events::{EventRecord, EventRegistry};

use crate::action::{ActionError, ActionInfo, ActionRegistry, ActionStatus};
use crate::notify::{Notifier, Subscriber, SubscriberId, SubscriberSet, ThingEvent};
use crate::property::{PropertyError, PropertyStore};
use crate::validation::{ThingValue, ValidationError};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Errors surfaced at the Thing boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThingError {
    #[error("thing '{0}' not found")]
    ThingNotFound(String),

    #[error("action '{0}' not found")]
    ActionNotFound(String),

    #[error("property '{0}' not found")]
    PropertyNotFound(String),

    #[error("event '{0}' not found")]
    EventNotFound(String),

    #[error("invalid value for '{name}': {source}")]
    InvalidValue {
        name: String,
        #[source]
        source: ValidationError,
    },

    #[error("invalid input for action '{action}': {reason}")]
    InvalidInput { action: String, reason: String },

    #[error("property '{0}' is read-only")]
    ReadOnly(String),

    #[error("action queue is full")]
    QueueFull,

    #[error("action queue is shut down")]
    QueueClosed,

    #[error("action invocation '{0}' not found")]
    ActionIdNotFound(String),

    #[error("duplicate name '{0}'")]
    DuplicateName(String),
}

impl From<PropertyError> for ThingError {
    fn from(e: PropertyError) -> Self {
        match e {
            PropertyError::NotFound(name) => ThingError::PropertyNotFound(name),
            PropertyError::InvalidValue { name, source } => {
                ThingError::InvalidValue { name, source }
            }
            PropertyError::ReadOnly(name) => ThingError::ReadOnly(name),
        }
    }
}

impl From<ActionError> for ThingError {
    fn from(e: ActionError) -> Self {
        let reason = e.to_string();
        match e {
            ActionError::NotFound(name) => ThingError::ActionNotFound(name),
            ActionError::InputNotObject { action }
            | ActionError::InvalidParameter { action, .. } => {
                ThingError::InvalidInput { action, reason }
            }
            ActionError::QueueFull => ThingError::QueueFull,
            ActionError::QueueClosed => ThingError::QueueClosed,
        }
    }
}

pub struct Thing {
    name: String,
    title: Option<String>,
    description: Option<String>,
    properties: PropertyStore,
    actions: ActionRegistry,
    events: EventRegistry,
    subscribers: Arc<SubscriberSet>,
    notifier: Notifier,
}

impl Thing {
    pub fn builder(name: impl Into<String>) -> ThingBuilder {
        ThingBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn href(&self) -> String {
        format!("/things/{}", self.name)
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    pub fn subscribers(&self) -> &SubscriberSet {
        &self.subscribers
    }

    pub fn get_property(&self, name: &str) -> Result<ThingValue, ThingError> {
        Ok(self.properties.get(name)?)
    }

    pub fn set_property(&self, name: &str, raw: &Value) -> Result<ThingValue, ThingError> {
        Ok(self.properties.set(name, raw)?)
    }

    pub fn property_values(&self) -> Map<String, Value> {
        self.properties.values()
    }

    /// Validate input and build a Pending invocation (not yet recorded or queued)
    pub fn create_action(&self, name: &str, raw: &Value) -> Result<Arc<ActionInfo>, ThingError> {
        Ok(self.actions.create(name, raw)?)
    }

    pub fn get_action(&self, name: &str, id: &Uuid) -> Result<Arc<ActionInfo>, ThingError> {
        if !self.actions.contains(name) {
            return Err(ThingError::ActionNotFound(name.to_string()));
        }
        self.actions
            .get(name, id)
            .ok_or_else(|| ThingError::ActionIdNotFound(id.to_string()))
    }

    /// Cancel an invocation and drop it from the history
    pub fn remove_action(&self, name: &str, id: &Uuid) -> Result<Arc<ActionInfo>, ThingError> {
        let info = self.get_action(name, id)?;
        info.cancel();

        let removed = self
            .actions
            .remove(name, id)
            .ok_or_else(|| ThingError::ActionIdNotFound(id.to_string()))?;

        info!(
            thing = %self.name,
            action = %name,
            action_id = %id,
            status = %removed.status(),
            "Action cancelled and removed"
        );

        Ok(removed)
    }

    pub fn raise_event(&self, name: &str, data: Value) -> Result<EventRecord, ThingError> {
        self.events
            .raise(name, data)
            .ok_or_else(|| ThingError::EventNotFound(name.to_string()))
    }

    /// Register a subscriber under a fresh id
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId::new();
        self.subscribers.insert(id, subscriber);
        id
    }

    /// Register a subscriber under a caller-chosen id; false if it was already present
    pub fn add_subscriber(&self, id: SubscriberId, subscriber: Arc<dyn Subscriber>) -> bool {
        self.subscribers.insert(id, subscriber)
    }

    /// Remove a subscriber; false if it was not registered
    pub fn unsubscribe(&self, id: &SubscriberId) -> bool {
        self.subscribers.remove(id)
    }

    /// Tear down: drop every subscriber and cancel unfinished invocations
    pub fn close(&self) {
        self.subscribers.clear();

        let mut cancelled = 0;
        for action in self.actions.all() {
            if action.status() != ActionStatus::Completed {
                action.cancel();
                cancelled += 1;
            }
        }

        info!(thing = %self.name, cancelled, "Thing closed");
    }

    pub(crate) fn publish(&self, event: ThingEvent) {
        self.notifier.publish(event);
    }

    /// Thing description: metadata plus links to every interaction
    pub fn describe(&self) -> Value {
        let href = self.href();

        let mut property_names: Vec<&str> = self.properties.names().collect();
        property_names.sort_unstable();
        let properties: Map<String, Value> = property_names
            .into_iter()
            .filter_map(|name| self.properties.property(name))
            .map(|property| {
                (
                    property.name().to_string(),
                    json!({
                        "readOnly": property.is_read_only(),
                        "links": [{"href": format!("{}/properties/{}", href, property.name())}],
                    }),
                )
            })
            .collect();

        let mut action_names: Vec<&str> = self.actions.names().collect();
        action_names.sort_unstable();
        let actions: Map<String, Value> = action_names
            .into_iter()
            .filter_map(|name| self.actions.definition(name))
            .map(|definition| {
                let input: Map<String, Value> = definition
                    .parameters()
                    .map(|(parameter, validator)| {
                        (
                            parameter.to_string(),
                            json!({"nullable": validator.is_nullable()}),
                        )
                    })
                    .collect();
                (
                    definition.name().to_string(),
                    json!({
                        "input": {"type": "object", "properties": input},
                        "links": [{"href": format!("{}/actions/{}", href, definition.name())}],
                    }),
                )
            })
            .collect();

        let mut event_names: Vec<&str> = self.events.names().collect();
        event_names.sort_unstable();
        let events: Map<String, Value> = event_names
            .into_iter()
            .map(|name| {
                (
                    name.to_string(),
                    json!({"links": [{"href": format!("{}/events/{}", href, name)}]}),
                )
            })
            .collect();

        let mut description = json!({
            "id": self.name,
            "href": href,
            "properties": properties,
            "actions": actions,
            "events": events,
            "links": [
                {"rel": "properties", "href": format!("{}/properties", href)},
                {"rel": "actions", "href": format!("{}/actions", href)},
                {"rel": "events", "href": format!("{}/events", href)},
                {"rel": "alternate", "href": format!("{}/ws", href)},
            ],
        });

        if let Some(object) = description.as_object_mut() {
            if let Some(title) = &self.title {
                object.insert("title".to_string(), json!(title));
            }
            if let Some(text) = &self.description {
                object.insert("description".to_string(), json!(text));
            }
        }

        description
    }
}

impl fmt::Debug for Thing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thing")
            .field("name", &self.name)
            .field("properties", &self.properties.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
