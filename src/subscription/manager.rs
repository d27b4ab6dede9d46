use crate::api::ApiError;
use crate::notify::{ChannelSubscriber, SubscriberId};
use crate::service::ThingService;
use crate::subscription::protocol::{ClientMessage, ErrorMessage, PropertyStatusMessage};
use crate::thing::Thing;
use axum::extract::ws::{Message, WebSocket};
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Manages a single WebSocket connection subscribed to one Thing
pub struct ConnectionManager {
    id: SubscriberId,
    thing: Arc<Thing>,
    service: Arc<ThingService>,
    buffer: usize,
}

impl ConnectionManager {
    pub fn new(thing: Arc<Thing>, service: Arc<ThingService>, buffer: usize) -> Self {
        Self {
            id: SubscriberId::new(),
            thing,
            service,
            buffer,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Handle WebSocket connection lifecycle
    ///
    /// The connection is a subscriber of its Thing until the socket closes or
    /// the fan-out drops it for a full outbox.
    pub async fn handle(self, mut socket: WebSocket) {
        let (subscriber, mut outbox) = ChannelSubscriber::new(self.buffer);
        self.thing.add_subscriber(self.id, Arc::new(subscriber));

        info!(
            thing = %self.thing.name(),
            subscriber = %self.id,
            "WebSocket connection established"
        );

        loop {
            tokio::select! {
                // Handle incoming client messages
                Some(msg) = socket.recv() => {
                    match msg {
                        Ok(Message::Text(text)) => {
                            let mut failed = false;
                            for reply in self.handle_client_message(&text).await {
                                if let Err(e) = socket.send(Message::Text(reply)).await {
                                    error!(error = %e, "Failed to send reply");
                                    failed = true;
                                    break;
                                }
                            }
                            if failed {
                                break;
                            }
                        }
                        Ok(Message::Close(_)) => {
                            info!(subscriber = %self.id, "WebSocket client disconnected");
                            break;
                        }
                        Ok(Message::Ping(data)) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                error!(error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Ok(_) => {
                            // Ignore binary, pong messages
                        }
                        Err(e) => {
                            warn!(error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                // Forward notifications from the Thing's fan-out
                notification = outbox.recv() => {
                    match notification {
                        Some(message) => {
                            if let Err(e) = socket.send(Message::Text(message.to_string())).await {
                                error!(error = %e, "Failed to send notification");
                                break;
                            }
                        }
                        None => {
                            warn!(subscriber = %self.id, "Subscriber dropped by fan-out, closing");
                            break;
                        }
                    }
                }

                else => {
                    break;
                }
            }
        }

        self.thing.unsubscribe(&self.id);
        info!(subscriber = %self.id, "WebSocket connection closed");
    }

    /// Apply one client message and return the direct replies to send back
    ///
    /// Successful mutations produce no direct reply; their notifications reach
    /// this connection through the fan-out like every other subscriber.
    pub async fn handle_client_message(&self, text: &str) -> Vec<String> {
        let message: ClientMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "Unparsable client message");
                return vec![encode(&ErrorMessage::new(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid message: {}", e),
                ))];
            }
        };

        let thing = self.thing.name();
        let mut replies = Vec::new();

        match message {
            ClientMessage::SetProperty(data) => {
                for (name, value) in data {
                    if let Err(e) = self.service.set_property(thing, &name, &value) {
                        replies.push(error_reply(e));
                    }
                }
            }
            ClientMessage::GetProperty(data) => {
                let mut values = Map::new();
                for name in data.keys() {
                    match self.service.get_property(thing, name) {
                        Ok(value) => {
                            values.insert(name.clone(), value.to_json());
                        }
                        Err(e) => replies.push(error_reply(e)),
                    }
                }
                if !values.is_empty() {
                    replies.push(encode(&PropertyStatusMessage::new(values)));
                }
            }
            ClientMessage::RequestAction(data) => {
                for (name, body) in data {
                    let input = body.get("input").cloned().unwrap_or(Value::Null);
                    if let Err(e) = self.service.request_action(thing, &name, &input).await {
                        replies.push(error_reply(e));
                    }
                }
            }
            ClientMessage::AddEventSubscription(data) => {
                for name in data.keys() {
                    if !self.thing.events().contains(name) {
                        replies.push(encode(&ErrorMessage::new(
                            StatusCode::NOT_FOUND,
                            format!("event '{}' not found", name),
                        )));
                    }
                }
            }
        }

        replies
    }
}

fn error_reply(e: impl Into<ApiError>) -> String {
    let e = e.into();
    encode(&ErrorMessage::new(e.status(), e.to_string()))
}

fn encode<T: Serialize>(message: &T) -> String {
    serde_json::to_string(message).unwrap_or_else(|e| {
        error!(error = %e, "Failed to serialize reply");
        String::new()
    })
}
