use super::{ApiError, ApiState};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::Value;
use std::sync::Arc;

/// Create Thing description router
pub fn create_things_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/things", get(list_things))
        .route("/things/:thing", get(get_thing))
        .with_state(state)
}

/// GET /things - Descriptions of every served Thing
async fn list_things(State(state): State<Arc<ApiState>>) -> Json<Vec<Value>> {
    let things = state
        .service
        .registry()
        .things()
        .iter()
        .map(|thing| thing.describe())
        .collect();

    Json(things)
}

/// GET /things/:thing - One Thing description
async fn get_thing(
    State(state): State<Arc<ApiState>>,
    Path(thing): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let thing = state.service.resolve(&thing)?;
    Ok(Json(thing.describe()))
}
