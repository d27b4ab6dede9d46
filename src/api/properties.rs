use super::{ApiError, ApiState};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Create property router
pub fn create_properties_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/things/:thing/properties", get(list_properties))
        .route(
            "/things/:thing/properties/:name",
            get(get_property).put(set_property),
        )
        .with_state(state)
}

/// GET /things/:thing/properties - All current values
async fn list_properties(
    State(state): State<Arc<ApiState>>,
    Path(thing): Path<String>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    Ok(Json(state.service.properties(&thing)?))
}

/// GET /things/:thing/properties/:name - `{"<name>": value}`
async fn get_property(
    State(state): State<Arc<ApiState>>,
    Path((thing, name)): Path<(String, String)>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let value = state.service.get_property(&thing, &name)?;

    let mut body = Map::new();
    body.insert(name, value.to_json());
    Ok(Json(body))
}

/// PUT /things/:thing/properties/:name - body `{"<name>": value}`
async fn set_property(
    State(state): State<Arc<ApiState>>,
    Path((thing, name)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let raw = body
        .get(&name)
        .ok_or_else(|| ApiError::BadRequest(format!("Body must contain '{}'", name)))?;

    let value = state.service.set_property(&thing, &name, raw)?;

    let mut response = Map::new();
    response.insert(name, value.to_json());
    Ok(Json(response))
}
