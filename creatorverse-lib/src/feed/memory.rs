use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

use crate::feed::{ChangeEvent, ChangeFeed, FeedError, Subscription};

const CAPACITY: usize = 256;

/// An in-process change feed. Events handed to [`MemoryFeed::publish`] are fanned out to every
/// open [`Subscription`].
#[derive(Debug, Clone)]
pub struct MemoryFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    /// Deliver `event` to all current subscribers.
    pub fn publish(&self, event: ChangeEvent) {
        // No subscribers is not an error, the change is simply not observed
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MemoryFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeFeed for MemoryFeed {
    async fn subscribe(&self) -> Result<Subscription, FeedError> {
        let mut source = self.sender.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    received = source.recv() => match received {
                        Ok(event) => {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("Change feed subscriber lagged, {skipped} events were dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
            debug!("Memory feed worker stopped");
        });

        Ok(Subscription::new("memory:creators", rx, shutdown_tx))
    }
}
