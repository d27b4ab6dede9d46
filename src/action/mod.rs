// Actions: per-Thing registry, invocation lifecycle and the shared execution queue

mod info;
mod queue;
mod registry;
mod services;


pub use info::{ActionDescription, ActionInfo, ActionInput, ActionStatus};
pub use queue::ActionQueue;
pub use registry::{ActionDefinition, ActionRegistry};
pub use services::Services;

use crate::thing::Thing;
use crate::validation::ValidationError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("action '{0}' not found")]
    NotFound(String),

    #[error("input for action '{action}' must be a JSON object")]
    InputNotObject { action: String },

    #[error("invalid parameter '{parameter}' for action '{action}': {source}")]
    InvalidParameter {
        action: String,
        parameter: String,
        #[source]
        source: ValidationError,
    },

    #[error("action queue is full")]
    QueueFull,

    #[error("action queue is shut down")]
    QueueClosed,
}

/// Everything a unit of work receives when a worker runs it
pub struct ActionContext {
    pub action_id: Uuid,
    pub thing: Arc<Thing>,
    pub input: ActionInput,
    /// Cooperative cancellation: the work must poll or await this to honor `cancel`
    pub cancellation: CancellationToken,
    pub services: Arc<Services>,
}

/// The unit of work behind an action
///
/// Errors and panics are caught by the lifecycle engine; they are logged and
/// the invocation still ends as `Completed`.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn execute(&self, ctx: ActionContext) -> anyhow::Result<()>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ActionHandler for FnHandler<F>
where
    F: Fn(ActionContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn execute(&self, ctx: ActionContext) -> anyhow::Result<()> {
        (self.0)(ctx).await
    }
}

/// Wrap an async closure as an action handler
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ActionHandler>
where
    F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}
