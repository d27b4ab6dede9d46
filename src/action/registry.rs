use super::{ActionError, ActionHandler, ActionInfo, ActionInput};
use crate::notify::{Notifier, ThingEvent};
use crate::validation::Validate;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// An action as declared on a Thing: its parameters and its unit of work
pub struct ActionDefinition {
    name: String,
    parameters: Vec<(String, Arc<dyn Validate>)>,
    handler: Arc<dyn ActionHandler>,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>, handler: Arc<dyn ActionHandler>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            handler,
        }
    }

    /// Declare an input parameter and its validator
    pub fn parameter(mut self, name: impl Into<String>, validator: impl Validate + 'static) -> Self {
        self.parameters.push((name.into(), Arc::new(validator)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, &Arc<dyn Validate>)> {
        self.parameters.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Bind a raw JSON payload to the declared parameters
    ///
    /// Missing parameters are validated as `null`; undeclared keys are ignored.
    pub(crate) fn bind_input(&self, raw: &Value) -> Result<ActionInput, ActionError> {
        let empty = serde_json::Map::new();
        let object = match raw {
            Value::Null => &empty,
            Value::Object(object) => object,
            _ => {
                return Err(ActionError::InputNotObject {
                    action: self.name.clone(),
                })
            }
        };

        let mut values = HashMap::with_capacity(self.parameters.len());
        for (parameter, validator) in &self.parameters {
            let supplied = object.get(parameter).unwrap_or(&Value::Null);
            let value = validator
                .validate(supplied)
                .map_err(|source| ActionError::InvalidParameter {
                    action: self.name.clone(),
                    parameter: parameter.clone(),
                    source,
                })?;
            values.insert(parameter.clone(), value);
        }

        Ok(ActionInput::new(values, raw.clone()))
    }
}

impl fmt::Debug for ActionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("name", &self.name)
            .field(
                "parameters",
                &self.parameters.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish()
    }
}

struct ActionSlot {
    definition: ActionDefinition,
    history: Mutex<Vec<Arc<ActionInfo>>>,
}

/// Per-Thing action definitions and invocation histories
///
/// Each action name has its own history lock: appends to one name never wait
/// on another, and notifications for a name go out in append order.
pub struct ActionRegistry {
    thing: String,
    slots: HashMap<String, ActionSlot>,
    notifier: Notifier,
}

impl ActionRegistry {
    pub fn new(thing: &str, definitions: Vec<ActionDefinition>, notifier: Notifier) -> Self {
        let slots = definitions
            .into_iter()
            .map(|definition| {
                (
                    definition.name.clone(),
                    ActionSlot {
                        definition,
                        history: Mutex::new(Vec::new()),
                    },
                )
            })
            .collect();

        Self {
            thing: thing.to_string(),
            slots,
            notifier,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn definition(&self, name: &str) -> Option<&ActionDefinition> {
        self.slots.get(name).map(|slot| &slot.definition)
    }

    fn slot(&self, name: &str) -> Result<&ActionSlot, ActionError> {
        self.slots
            .get(name)
            .ok_or_else(|| ActionError::NotFound(name.to_string()))
    }

    /// Build a Pending invocation from raw input; nothing is recorded yet
    pub fn create(&self, name: &str, raw: &Value) -> Result<Arc<ActionInfo>, ActionError> {
        let slot = self.slot(name)?;
        let input = slot.definition.bind_input(raw)?;

        Ok(Arc::new(ActionInfo::new(
            &self.thing,
            name,
            input,
            Arc::clone(&slot.definition.handler),
        )))
    }

    /// Record an invocation and announce it to subscribers
    pub fn append(&self, info: &Arc<ActionInfo>) -> Result<(), ActionError> {
        self.append_then(info, || Ok(()))
    }

    /// Record an invocation, then run `then` before the name's history lock
    /// is released
    ///
    /// The queue hands the job over inside `then`, so for one action name the
    /// history order is also the dequeue order.
    pub(crate) fn append_then<F>(&self, info: &Arc<ActionInfo>, then: F) -> Result<(), ActionError>
    where
        F: FnOnce() -> Result<(), ActionError>,
    {
        let slot = self.slot(info.name())?;

        let mut history = slot.history.lock();
        history.push(Arc::clone(info));
        self.notifier
            .publish(ThingEvent::ActionAdded(info.description()));
        if let Err(e) = then() {
            history.pop();
            self.notifier
                .publish(ThingEvent::ActionRemoved(info.description()));
            return Err(e);
        }

        debug!(
            thing = %self.thing,
            action = %info.name(),
            action_id = %info.id(),
            "Action appended to history"
        );

        Ok(())
    }

    /// Invocations of one action, oldest first
    pub fn history(&self, name: &str) -> Result<Vec<Arc<ActionInfo>>, ActionError> {
        Ok(self.slot(name)?.history.lock().clone())
    }

    pub fn get(&self, name: &str, id: &Uuid) -> Option<Arc<ActionInfo>> {
        self.slots
            .get(name)?
            .history
            .lock()
            .iter()
            .find(|info| info.id() == *id)
            .cloned()
    }

    /// Every recorded invocation, grouped by action name
    pub fn all(&self) -> Vec<Arc<ActionInfo>> {
        let mut names: Vec<&String> = self.slots.keys().collect();
        names.sort();

        names
            .into_iter()
            .filter_map(|name| self.slots.get(name))
            .flat_map(|slot| slot.history.lock().clone())
            .collect()
    }

    /// Drop one invocation from its history and announce the removal
    pub fn remove(&self, name: &str, id: &Uuid) -> Option<Arc<ActionInfo>> {
        let slot = self.slots.get(name)?;

        let mut history = slot.history.lock();
        let position = history.iter().position(|info| info.id() == *id)?;
        let removed = history.remove(position);
        self.notifier
            .publish(ThingEvent::ActionRemoved(removed.description()));

        debug!(
            thing = %self.thing,
            action = %name,
            action_id = %id,
            "Action removed from history"
        );

        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.slots
            .values()
            .map(|slot| slot.history.lock().len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
