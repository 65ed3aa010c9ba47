//! Change notifications for the `creators` table.
//!
//! A [`ChangeFeed`] pushes row level insert, update and delete events. Delivery is
//! at-least-once and carries no ordering guarantee relative to calls made through a
//! [`RecordStore`](crate::repository::store::RecordStore), so consumers must apply events keyed
//! by id.
//!
//! Subscribing returns a [`Subscription`] handle. Events are received through it until it is
//! released with [`Subscription::unsubscribe`] or dropped.

use std::{
    fmt::Debug,
    pin::Pin,
    task::{Context, Poll},
};

use async_trait::async_trait;
use futures_util::Stream;
use serde::Deserialize;
use strum::{Display, EnumString};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::repository::entities::{Creator, CreatorId};

mod memory;
mod realtime;

pub use memory::MemoryFeed;
pub use realtime::RealtimeFeed;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("Unable to connect to the change feed: {0}")]
    Connect(String),
    #[error("Unexpected message from the change feed: {0}")]
    Protocol(String),
    #[error("The change feed closed the subscription")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::Connect(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single row level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A new row, with its assigned id and timestamp
    Insert(Creator),
    /// The new values of an existing row
    Update(Creator),
    /// The id of a removed row
    Delete(CreatorId),
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Insert(_) => ChangeKind::Insert,
            ChangeEvent::Update(_) => ChangeKind::Update,
            ChangeEvent::Delete(_) => ChangeKind::Delete,
        }
    }

    /// Id of the affected row.
    pub fn id(&self) -> CreatorId {
        match self {
            ChangeEvent::Insert(creator) | ChangeEvent::Update(creator) => creator.id(),
            ChangeEvent::Delete(id) => *id,
        }
    }
}

#[async_trait]
pub trait ChangeFeed: Debug + Send + Sync {
    /// Open a subscription to every change on the `creators` table.
    async fn subscribe(&self) -> Result<Subscription, FeedError>;
}

/// An open change feed subscription.
///
/// The background task delivering events is told to stop as soon as the handle is released,
/// and the event channel is closed immediately, so nothing is received afterwards.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Subscription {
    pub(crate) fn new(
        topic: impl Into<String>,
        events: mpsc::UnboundedReceiver<ChangeEvent>,
        shutdown: oneshot::Sender<()>,
    ) -> Self {
        Self {
            topic: topic.into(),
            events,
            shutdown: Some(shutdown),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next event. Returns `None` once the feed has closed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Release the subscription.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // The worker may already be gone if the feed closed on its own
            let _ = shutdown.send(());
            self.events.close();
            debug!("Released subscription to {}", self.topic);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl Stream for Subscription {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}
