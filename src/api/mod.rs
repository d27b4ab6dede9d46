// HTTP and WebSocket APIs

pub mod actions;
pub mod error;
pub mod events;
pub mod properties;
pub mod things;
pub mod websocket;

pub use actions::create_actions_router;
pub use error::ApiError;
pub use events::create_events_router;
pub use properties::create_properties_router;
pub use things::create_things_router;
pub use websocket::{create_ws_router, ws_handler};

use crate::service::ThingService;
use axum::Router;
use std::sync::Arc;

/// Shared application state for every router
pub struct ApiState {
    pub service: Arc<ThingService>,
    /// Outbox size of each WebSocket subscriber
    pub subscriber_buffer: usize,
}

/// Create the complete router: Thing descriptions, properties, actions, events and WebSocket
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(create_things_router(Arc::clone(&state)))
        .merge(create_properties_router(Arc::clone(&state)))
        .merge(create_actions_router(Arc::clone(&state)))
        .merge(create_events_router(Arc::clone(&state)))
        .merge(create_ws_router(state))
}
