use super::{ActionContext, ActionHandler, Services};
use crate::notify::ThingEvent;
use crate::thing::Thing;
use crate::validation::ThingValue;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Invocation status: Pending -> Executing -> Completed
///
/// There is no failed state; a failed or cancelled invocation is Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Executing,
    Completed,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Pending => write!(f, "pending"),
            ActionStatus::Executing => write!(f, "executing"),
            ActionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Validated action parameters plus the raw payload they came from
#[derive(Debug, Clone, Default)]
pub struct ActionInput {
    values: HashMap<String, ThingValue>,
    raw: Value,
}

impl ActionInput {
    pub(crate) fn new(values: HashMap<String, ThingValue>, raw: Value) -> Self {
        Self { values, raw }
    }

    pub fn get(&self, name: &str) -> Option<&ThingValue> {
        self.values.get(name)
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Serializable view of an invocation, sent to subscribers and HTTP clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescription {
    #[serde(skip)]
    pub name: String,
    #[serde(skip)]
    pub id: Uuid,
    pub href: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub input: Value,
    pub status: ActionStatus,
    pub time_requested: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_completed: Option<DateTime<Utc>>,
}

struct ActionState {
    status: ActionStatus,
    time_completed: Option<DateTime<Utc>>,
    error: Option<String>,
}

/// One invocation of an action
pub struct ActionInfo {
    id: Uuid,
    name: String,
    /// Name of the owning Thing (back-reference by identity only)
    thing: String,
    input: ActionInput,
    time_requested: DateTime<Utc>,
    state: Mutex<ActionState>,
    cancellation: CancellationToken,
    handler: Arc<dyn ActionHandler>,
}

impl ActionInfo {
    pub(crate) fn new(
        thing: &str,
        name: &str,
        input: ActionInput,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.to_string(),
            thing: thing.to_string(),
            input,
            time_requested: Utc::now(),
            state: Mutex::new(ActionState {
                status: ActionStatus::Pending,
                time_completed: None,
                error: None,
            }),
            cancellation: CancellationToken::new(),
            handler,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn thing(&self) -> &str {
        &self.thing
    }

    pub fn input(&self) -> &ActionInput {
        &self.input
    }

    pub fn time_requested(&self) -> DateTime<Utc> {
        self.time_requested
    }

    pub fn status(&self) -> ActionStatus {
        self.state.lock().status
    }

    pub fn time_completed(&self) -> Option<DateTime<Utc>> {
        self.state.lock().time_completed
    }

    /// Failure recorded when the unit of work errored or panicked
    ///
    /// Diagnostic only: it is logged and kept here, never exposed as a status.
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    /// Signal the cancellation token; the unit of work decides when to stop
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn href(&self) -> String {
        format!("/things/{}/actions/{}/{}", self.thing, self.name, self.id)
    }

    pub fn description(&self) -> ActionDescription {
        let state = self.state.lock();
        ActionDescription {
            name: self.name.clone(),
            id: self.id,
            href: self.href(),
            input: self.input.raw.clone(),
            status: state.status,
            time_requested: self.time_requested,
            time_completed: state.time_completed,
        }
    }

    /// Pending -> Executing; false if the invocation already left Pending
    pub(crate) fn begin(&self) -> bool {
        let mut state = self.state.lock();
        if state.status != ActionStatus::Pending {
            return false;
        }
        state.status = ActionStatus::Executing;
        true
    }

    /// Any state -> Completed, exactly once
    pub(crate) fn complete(&self, error: Option<String>) -> bool {
        let mut state = self.state.lock();
        if state.status == ActionStatus::Completed {
            return false;
        }
        state.status = ActionStatus::Completed;
        state.time_completed = Some(Utc::now());
        state.error = error;
        true
    }

    /// Drive the invocation through its lifecycle
    ///
    /// Never fails: errors and panics from the unit of work are logged and
    /// folded into the Completed transition.
    pub async fn execute(self: Arc<Self>, thing: Arc<Thing>, services: Arc<Services>) {
        if !self.begin() {
            warn!(
                thing = %self.thing,
                action = %self.name,
                action_id = %self.id,
                status = %self.status(),
                "Action is not pending, skipping execution"
            );
            return;
        }

        thing.publish(ThingEvent::ActionStatusChanged(self.description()));

        info!(
            thing = %self.thing,
            action = %self.name,
            action_id = %self.id,
            "Executing action"
        );

        let ctx = ActionContext {
            action_id: self.id,
            thing: Arc::clone(&thing),
            input: self.input.clone(),
            cancellation: self.cancellation.clone(),
            services,
        };

        let outcome = AssertUnwindSafe(self.handler.execute(ctx))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(())) => {
                info!(
                    thing = %self.thing,
                    action = %self.name,
                    action_id = %self.id,
                    cancelled = self.is_cancelled(),
                    "Action executed"
                );
                None
            }
            Ok(Err(e)) => {
                error!(
                    thing = %self.thing,
                    action = %self.name,
                    action_id = %self.id,
                    error = %format!("{:#}", e),
                    "Error executing action"
                );
                Some(format!("{:#}", e))
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                error!(
                    thing = %self.thing,
                    action = %self.name,
                    action_id = %self.id,
                    panic = %message,
                    "Action panicked"
                );
                Some(message)
            }
        };

        if self.complete(failure) {
            thing.publish(ThingEvent::ActionStatusChanged(self.description()));
        }
    }
}

impl fmt::Debug for ActionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("thing", &self.thing)
            .field("status", &self.status())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "action panicked".to_string()
    }
}
