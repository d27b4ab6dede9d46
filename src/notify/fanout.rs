use super::{Notification, SubscriberSet, ThingEvent};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Producer side of a Thing's notification channel
///
/// `publish` never blocks: events are queued for the fan-out task. Cloning is
/// cheap; the task stops once every clone is dropped.
#[derive(Clone)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<ThingEvent>>,
}

impl Notifier {
    /// Spawn the fan-out task for a Thing on the current tokio runtime
    ///
    /// Outside a runtime the notifier is detached and drops every event.
    pub fn spawn(thing: &str, subscribers: Arc<SubscriberSet>) -> Self {
        let Ok(runtime) = Handle::try_current() else {
            warn!(thing = %thing, "No tokio runtime, notifications disabled");
            return Self::detached();
        };

        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_fanout(thing.to_string(), rx, subscribers));

        Self { tx: Some(tx) }
    }

    /// Notifier without a fan-out task
    pub fn detached() -> Self {
        Self { tx: None }
    }

    /// True when events go nowhere
    pub fn is_detached(&self) -> bool {
        self.tx.is_none()
    }

    pub fn publish(&self, event: ThingEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                debug!("Fan-out task stopped, notification dropped");
            }
        }
    }
}

async fn run_fanout(
    thing: String,
    mut rx: mpsc::UnboundedReceiver<ThingEvent>,
    subscribers: Arc<SubscriberSet>,
) {
    debug!(thing = %thing, "Notification fan-out started");

    while let Some(event) = rx.recv().await {
        deliver(&thing, &subscribers, &event);
    }

    debug!(thing = %thing, "Notification fan-out stopped");
}

/// Serialize the event once and hand it to every subscriber
///
/// Subscribers whose delivery fails are removed from the set. Returns the
/// number of successful deliveries.
pub(crate) fn deliver(thing: &str, subscribers: &SubscriberSet, event: &ThingEvent) -> usize {
    if subscribers.is_empty() {
        return 0;
    }

    let notification = Notification::from(event);
    let message: Arc<str> = match serde_json::to_string(&notification) {
        Ok(json) => json.into(),
        Err(e) => {
            error!(thing = %thing, error = %e, "Failed to serialize notification");
            return 0;
        }
    };

    let mut delivered = 0;
    for (id, subscriber) in subscribers.snapshot() {
        match subscriber.deliver(Arc::clone(&message)) {
            Ok(()) => delivered += 1,
            Err(e) => {
                warn!(
                    thing = %thing,
                    subscriber = %id,
                    error = %e,
                    "Delivery failed, removing subscriber"
                );
                subscribers.remove(&id);
            }
        }
    }

    delivered
}
