use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Client -> Server message types
///
/// Every message carries a `data` object keyed by property, action or event name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "messageType", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    SetProperty(Map<String, Value>),
    GetProperty(Map<String, Value>),
    RequestAction(Map<String, Value>),
    AddEventSubscription(Map<String, Value>),
}

/// Server -> Client: direct reply to a `getProperty` request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyStatusMessage {
    pub message_type: &'static str,
    pub data: Map<String, Value>,
}

impl PropertyStatusMessage {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            message_type: "propertyStatus",
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorData {
    pub status: String,
    pub message: String,
}

/// Server -> Client: a request on this connection failed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub message_type: &'static str,
    pub data: ErrorData,
}

impl ErrorMessage {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message_type: "error",
            data: ErrorData {
                status: status.to_string(),
                message: message.into(),
            },
        }
    }
}
