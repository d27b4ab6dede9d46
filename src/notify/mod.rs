// Change notification fan-out
//
// Mutations publish a ThingEvent onto the Thing's notifier channel and return
// immediately. A per-Thing fan-out task turns each event into one Notification,
// serializes it once, and hands it to every live subscriber.

mod fanout;
mod subscriber;


pub use fanout::Notifier;
pub use subscriber::{ChannelSubscriber, DeliveryError, Subscriber, SubscriberId, SubscriberSet};

use crate::action::ActionDescription;
use crate::thing::EventRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State transitions raised by a Thing
#[derive(Debug, Clone)]
pub enum ThingEvent {
    ActionAdded(ActionDescription),
    ActionStatusChanged(ActionDescription),
    ActionRemoved(ActionDescription),
    PropertyChanged { name: String, value: Value },
    EventRaised(EventRecord),
}

/// Message kind on the live channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    ActionStatus,
    PropertyStatus,
    Event,
}

/// Canonical envelope delivered to subscribers: a kind plus a payload keyed by item name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message_type: MessageType,
    pub data: Map<String, Value>,
}

impl Notification {
    fn keyed(message_type: MessageType, name: &str, payload: Value) -> Self {
        let mut data = Map::new();
        data.insert(name.to_string(), payload);
        Self { message_type, data }
    }
}

impl From<&ThingEvent> for Notification {
    fn from(event: &ThingEvent) -> Self {
        match event {
            ThingEvent::ActionAdded(action)
            | ThingEvent::ActionStatusChanged(action)
            | ThingEvent::ActionRemoved(action) => Notification::keyed(
                MessageType::ActionStatus,
                &action.name,
                serde_json::to_value(action).unwrap_or(Value::Null),
            ),
            ThingEvent::PropertyChanged { name, value } => {
                Notification::keyed(MessageType::PropertyStatus, name, value.clone())
            }
            ThingEvent::EventRaised(record) => Notification::keyed(
                MessageType::Event,
                &record.name,
                serde_json::to_value(record).unwrap_or(Value::Null),
            ),
        }
    }
}
