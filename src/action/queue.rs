use super::{ActionError, ActionInfo, Services};
use crate::config::{ActionsConfig, FullQueuePolicy};
use crate::thing::Thing;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct Job {
    thing: Arc<Thing>,
    info: Arc<ActionInfo>,
}

#[derive(Clone)]
enum QueueSender {
    Unbounded(mpsc::UnboundedSender<Job>),
    Bounded {
        tx: mpsc::Sender<Job>,
        policy: FullQueuePolicy,
    },
}

enum QueueReceiver {
    Unbounded(mpsc::UnboundedReceiver<Job>),
    Bounded(mpsc::Receiver<Job>),
}

impl QueueReceiver {
    async fn recv(&mut self) -> Option<Job> {
        match self {
            QueueReceiver::Unbounded(rx) => rx.recv().await,
            QueueReceiver::Bounded(rx) => rx.recv().await,
        }
    }
}

/// A reserved queue slot; sending through it cannot fail for lack of space
enum Slot {
    Unbounded(mpsc::UnboundedSender<Job>),
    Bounded(mpsc::OwnedPermit<Job>),
}

impl Slot {
    fn send(self, job: Job) -> Result<(), ActionError> {
        match self {
            Slot::Unbounded(tx) => tx.send(job).map_err(|_| ActionError::QueueClosed),
            Slot::Bounded(permit) => {
                permit.send(job);
                Ok(())
            }
        }
    }
}

/// Global FIFO of pending actions drained by a fixed pool of workers
pub struct ActionQueue {
    sender: Mutex<Option<QueueSender>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ActionQueue {
    /// Create the queue and spawn its workers on the current runtime
    pub fn start(config: &ActionsConfig, services: Arc<Services>) -> Self {
        let (sender, receiver) = match config.bounded_capacity() {
            Some(capacity) => {
                let (tx, rx) = mpsc::channel(capacity);
                (
                    QueueSender::Bounded {
                        tx,
                        policy: config.full_policy,
                    },
                    QueueReceiver::Bounded(rx),
                )
            }
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
            }
        };

        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let worker_count = config.workers.max(1);

        let workers = (0..worker_count)
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let services = Arc::clone(&services);
                tokio::spawn(run_worker(worker, receiver, services))
            })
            .collect();

        info!(
            workers = worker_count,
            capacity = ?config.bounded_capacity(),
            policy = ?config.full_policy,
            "Action queue started"
        );

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    async fn reserve(&self) -> Result<Slot, ActionError> {
        // Clone out of the lock; the Block policy may await a slot
        let sender = self.sender.lock().clone().ok_or(ActionError::QueueClosed)?;

        match sender {
            QueueSender::Unbounded(tx) => {
                if tx.is_closed() {
                    return Err(ActionError::QueueClosed);
                }
                Ok(Slot::Unbounded(tx))
            }
            QueueSender::Bounded {
                tx,
                policy: FullQueuePolicy::Block,
            } => tx
                .reserve_owned()
                .await
                .map(Slot::Bounded)
                .map_err(|_| ActionError::QueueClosed),
            QueueSender::Bounded {
                tx,
                policy: FullQueuePolicy::Reject,
            } => tx.try_reserve_owned().map(Slot::Bounded).map_err(|e| match e {
                TrySendError::Full(_) => ActionError::QueueFull,
                TrySendError::Closed(_) => ActionError::QueueClosed,
            }),
        }
    }

    /// Record the invocation in its Thing's history and queue it for execution
    ///
    /// The queue slot is reserved first, so a rejected invocation is never
    /// recorded.
    pub async fn submit(&self, thing: Arc<Thing>, info: Arc<ActionInfo>) -> Result<(), ActionError> {
        let slot = match self.reserve().await {
            Ok(slot) => slot,
            Err(e) => {
                warn!(
                    thing = %thing.name(),
                    action = %info.name(),
                    action_id = %info.id(),
                    error = %e,
                    "Action rejected by queue"
                );
                return Err(e);
            }
        };

        let job = Job {
            thing: Arc::clone(&thing),
            info: Arc::clone(&info),
        };
        thing.actions().append_then(&info, move || slot.send(job))?;

        debug!(
            thing = %thing.name(),
            action = %info.name(),
            action_id = %info.id(),
            "Action queued"
        );

        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Stop accepting actions and wait for the workers to drain the queue
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "Action worker ended abnormally");
            }
        }

        info!("Action queue stopped");
    }
}

async fn run_worker(
    worker: usize,
    receiver: Arc<tokio::sync::Mutex<QueueReceiver>>,
    services: Arc<Services>,
) {
    debug!(worker, "Action worker started");

    loop {
        let job = receiver.lock().await.recv().await;
        let Some(Job { thing, info }) = job else {
            break;
        };
        info.execute(thing, Arc::clone(&services)).await;
    }

    debug!(worker, "Action worker stopped");
}
