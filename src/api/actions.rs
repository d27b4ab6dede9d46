use super::{ApiError, ApiState};
use crate::action::ActionInfo;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Create action router
pub fn create_actions_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(
            "/things/:thing/actions",
            get(list_actions).post(request_any_action),
        )
        .route(
            "/things/:thing/actions/:name",
            get(list_action_history).post(request_action),
        )
        .route(
            "/things/:thing/actions/:name/:id",
            get(get_action).delete(remove_action),
        )
        .with_state(state)
}

/// `{"<name>": description}`
fn keyed_description(info: &ActionInfo) -> Value {
    let mut body = Map::new();
    body.insert(
        info.name().to_string(),
        serde_json::to_value(info.description()).unwrap_or(Value::Null),
    );
    Value::Object(body)
}

/// Split a request body `{"<name>": {"input": {...}}}` into name and input
fn parse_request(body: &Value) -> Result<(String, Value), ApiError> {
    let object = body
        .as_object()
        .filter(|object| object.len() == 1)
        .ok_or_else(|| {
            ApiError::BadRequest("Body must be an object with exactly one action".to_string())
        })?;

    let (name, request) = object
        .iter()
        .next()
        .ok_or_else(|| ApiError::BadRequest("Missing action".to_string()))?;

    let input = request.get("input").cloned().unwrap_or(Value::Null);
    Ok((name.clone(), input))
}

/// GET /things/:thing/actions - Every recorded invocation
async fn list_actions(
    State(state): State<Arc<ApiState>>,
    Path(thing): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let actions = state.service.actions(&thing, None)?;
    Ok(Json(actions.iter().map(|a| keyed_description(a)).collect()))
}

/// POST /things/:thing/actions - body `{"<name>": {"input": {...}}}`
async fn request_any_action(
    State(state): State<Arc<ApiState>>,
    Path(thing): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (name, input) = parse_request(&body)?;
    let info = state.service.request_action(&thing, &name, &input).await?;
    Ok((StatusCode::CREATED, Json(keyed_description(&info))))
}

/// GET /things/:thing/actions/:name - History of one action
async fn list_action_history(
    State(state): State<Arc<ApiState>>,
    Path((thing, name)): Path<(String, String)>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let actions = state.service.actions(&thing, Some(&name))?;
    Ok(Json(actions.iter().map(|a| keyed_description(a)).collect()))
}

/// POST /things/:thing/actions/:name - body `{"<name>": {"input": {...}}}`
async fn request_action(
    State(state): State<Arc<ApiState>>,
    Path((thing, name)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (requested, input) = parse_request(&body)?;
    if requested != name {
        return Err(ApiError::BadRequest(format!(
            "Body names action '{}' but the path names '{}'",
            requested, name
        )));
    }

    let info = state.service.request_action(&thing, &name, &input).await?;
    Ok((StatusCode::CREATED, Json(keyed_description(&info))))
}

/// GET /things/:thing/actions/:name/:id - One invocation
async fn get_action(
    State(state): State<Arc<ApiState>>,
    Path((thing, name, id)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let info = state.service.get_action(&thing, &name, &id)?;
    Ok(Json(keyed_description(&info)))
}

/// DELETE /things/:thing/actions/:name/:id - Cancel and remove an invocation
async fn remove_action(
    State(state): State<Arc<ApiState>>,
    Path((thing, name, id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    state.service.remove_action(&thing, &name, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
