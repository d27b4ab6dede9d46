// Boundary operations shared by the HTTP and WebSocket surfaces


use crate::action::{ActionInfo, ActionQueue, Services};
use crate::config::ActionsConfig;
use crate::notify::{Subscriber, SubscriberId};
use crate::registry::ThingRegistry;
use crate::thing::{EventRecord, Thing, ThingError};
use crate::validation::ThingValue;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Things plus the action queue that executes their invocations
pub struct ThingService {
    registry: ThingRegistry,
    queue: ActionQueue,
}

impl ThingService {
    pub fn new(registry: ThingRegistry, queue: ActionQueue) -> Self {
        Self { registry, queue }
    }

    /// Start the worker pool and serve the registry
    pub fn start(registry: ThingRegistry, config: &ActionsConfig, services: Services) -> Self {
        let queue = ActionQueue::start(config, Arc::new(services));
        Self::new(registry, queue)
    }

    pub fn registry(&self) -> &ThingRegistry {
        &self.registry
    }

    pub fn resolve(&self, thing_id: &str) -> Result<Arc<Thing>, ThingError> {
        self.registry.resolve(thing_id)
    }

    /// Validate input, record the invocation and queue it
    ///
    /// Returns once the invocation is queued; execution happens on a worker.
    pub async fn request_action(
        &self,
        thing_id: &str,
        action: &str,
        raw_input: &Value,
    ) -> Result<Arc<ActionInfo>, ThingError> {
        let thing = self.resolve(thing_id)?;
        let info = thing.create_action(action, raw_input)?;

        self.queue.submit(Arc::clone(&thing), Arc::clone(&info)).await?;

        info!(
            thing = %thing.name(),
            action = %action,
            action_id = %info.id(),
            "Action requested"
        );

        Ok(info)
    }

    pub fn get_property(&self, thing_id: &str, name: &str) -> Result<ThingValue, ThingError> {
        self.resolve(thing_id)?.get_property(name)
    }

    pub fn set_property(
        &self,
        thing_id: &str,
        name: &str,
        raw: &Value,
    ) -> Result<ThingValue, ThingError> {
        self.resolve(thing_id)?.set_property(name, raw)
    }

    pub fn properties(&self, thing_id: &str) -> Result<Map<String, Value>, ThingError> {
        Ok(self.resolve(thing_id)?.property_values())
    }

    /// Invocations of one action, or of every action when `name` is None
    pub fn actions(
        &self,
        thing_id: &str,
        name: Option<&str>,
    ) -> Result<Vec<Arc<ActionInfo>>, ThingError> {
        let thing = self.resolve(thing_id)?;
        match name {
            Some(name) => Ok(thing.actions().history(name)?),
            None => Ok(thing.actions().all()),
        }
    }

    pub fn get_action(
        &self,
        thing_id: &str,
        name: &str,
        action_id: &str,
    ) -> Result<Arc<ActionInfo>, ThingError> {
        let thing = self.resolve(thing_id)?;
        thing.get_action(name, &parse_action_id(action_id)?)
    }

    /// Cancel an invocation and remove it from its history
    pub fn remove_action(
        &self,
        thing_id: &str,
        name: &str,
        action_id: &str,
    ) -> Result<(), ThingError> {
        let thing = self.resolve(thing_id)?;
        thing.remove_action(name, &parse_action_id(action_id)?)?;
        Ok(())
    }

    pub fn raise_event(
        &self,
        thing_id: &str,
        name: &str,
        data: Value,
    ) -> Result<EventRecord, ThingError> {
        self.resolve(thing_id)?.raise_event(name, data)
    }

    /// Retained occurrences of one event, or of every event when `name` is None
    pub fn events(&self, thing_id: &str, name: Option<&str>) -> Result<Vec<EventRecord>, ThingError> {
        let thing = self.resolve(thing_id)?;
        match name {
            Some(name) => thing
                .events()
                .history(name)
                .ok_or_else(|| ThingError::EventNotFound(name.to_string())),
            None => Ok(thing.events().all()),
        }
    }

    pub fn subscribe(
        &self,
        thing_id: &str,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<SubscriberId, ThingError> {
        Ok(self.resolve(thing_id)?.subscribe(subscriber))
    }

    /// Idempotent: a repeated id keeps the first registration
    pub fn add_subscriber(
        &self,
        thing_id: &str,
        id: SubscriberId,
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<bool, ThingError> {
        Ok(self.resolve(thing_id)?.add_subscriber(id, subscriber))
    }

    /// Idempotent: removing an unknown id is not an error
    pub fn unsubscribe(&self, thing_id: &str, id: &SubscriberId) -> Result<bool, ThingError> {
        Ok(self.resolve(thing_id)?.unsubscribe(id))
    }

    /// Tear down every Thing, then stop the queue and wait for it to drain
    ///
    /// Unfinished invocations are cancelled first so the drain is prompt.
    pub async fn shutdown(&self) {
        self.registry.close();
        self.queue.shutdown().await;
        info!("Thing service stopped");
    }
}

fn parse_action_id(action_id: &str) -> Result<Uuid, ThingError> {
    Uuid::parse_str(action_id).map_err(|_| ThingError::ActionIdNotFound(action_id.to_string()))
}
