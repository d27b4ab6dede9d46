use super::{ApiError, ApiState};
use crate::thing::EventRecord;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Create event router
pub fn create_events_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/things/:thing/events", get(list_events))
        .route("/things/:thing/events/:name", get(list_event_history))
        .with_state(state)
}

fn keyed_record(record: &EventRecord) -> Value {
    let mut body = Map::new();
    body.insert(
        record.name.clone(),
        serde_json::to_value(record).unwrap_or(Value::Null),
    );
    Value::Object(body)
}

/// GET /things/:thing/events - Retained occurrences of every event
async fn list_events(
    State(state): State<Arc<ApiState>>,
    Path(thing): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let records = state.service.events(&thing, None)?;
    Ok(Json(records.iter().map(keyed_record).collect()))
}

/// GET /things/:thing/events/:name - Retained occurrences of one event
async fn list_event_history(
    State(state): State<Arc<ApiState>>,
    Path((thing, name)): Path<(String, String)>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let records = state.service.events(&thing, Some(&name))?;
    Ok(Json(records.iter().map(keyed_record).collect()))
}
