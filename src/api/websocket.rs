use super::{ApiError, ApiState};
use crate::subscription::ConnectionManager;
use axum::{
    extract::{ws::WebSocketUpgrade, Path, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

/// Thing lookup middleware
///
/// Runs as a tower layer BEFORE WebSocket upgrade extraction so an unknown
/// Thing gets a clean 404 instead of an upgrade error.
async fn ws_thing_exists(
    State(state): State<Arc<ApiState>>,
    Path(thing): Path<String>,
    req: Request,
    next: Next,
) -> Response {
    if let Err(e) = state.service.resolve(&thing) {
        return ApiError::from(e).into_response();
    }
    next.run(req).await
}

/// GET /things/:thing/ws - WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(thing): Path<String>,
    State(state): State<Arc<ApiState>>,
) -> Result<Response, ApiError> {
    let thing = state.service.resolve(&thing)?;
    info!(thing = %thing.name(), "WebSocket upgrade request received");

    let manager = ConnectionManager::new(
        thing,
        Arc::clone(&state.service),
        state.subscriber_buffer,
    );
    Ok(ws.on_upgrade(move |socket| manager.handle(socket)))
}

/// Create WebSocket router with the Thing lookup applied
pub fn create_ws_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/things/:thing/ws", get(ws_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), ws_thing_exists))
        .with_state(state)
}
