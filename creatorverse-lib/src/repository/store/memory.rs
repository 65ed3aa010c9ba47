use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    feed::{ChangeEvent, MemoryFeed},
    repository::{
        entities::{Creator, CreatorId, NewCreator},
        store::{RecordStore, Result, StoreError},
    },
};

/// A [`RecordStore`] that keeps its rows in memory.
///
/// Every successful mutation is echoed on the attached [`MemoryFeed`], the same way the hosted
/// database reports changes made through its API.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    rows: RwLock<Rows>,
    feed: MemoryFeed,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

#[derive(Debug, Default)]
struct Rows {
    creators: Vec<Creator>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The feed this store reports its changes on.
    pub fn feed(&self) -> MemoryFeed {
        self.inner.feed.clone()
    }

    /// Insert a row with a fixed creation time, without counting it as a call or publishing it.
    pub fn seed(&self, fields: NewCreator, created_at: DateTime<Utc>) -> Creator {
        self.inner.rows.write().push(fields, created_at)
    }

    /// Number of calls made through the [`RecordStore`] interface.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Make every following call fail, simulating a lost connection.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn begin(&self) -> Result<()> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);

        if self.inner.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Other("record store unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl Rows {
    fn push(&mut self, fields: NewCreator, created_at: DateTime<Utc>) -> Creator {
        self.next_id += 1;
        let creator = Creator::new(CreatorId(self.next_id), created_at, fields);
        self.creators.push(creator.clone());

        creator
    }

    fn find_mut(&mut self, id: CreatorId) -> Option<&mut Creator> {
        self.creators.iter_mut().find(|c| c.id() == id)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select_all(&self) -> Result<Vec<Creator>> {
        self.begin()?;

        let mut creators = self.inner.rows.read().creators.clone();
        creators.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });

        Ok(creators)
    }

    async fn select_by_id(&self, id: CreatorId) -> Result<Creator> {
        self.begin()?;

        self.inner
            .rows
            .read()
            .creators
            .iter()
            .find(|c| c.id() == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, fields: &NewCreator) -> Result<Creator> {
        self.begin()?;

        let creator = self.inner.rows.write().push(fields.clone(), Utc::now());
        debug!("Inserted creator {}", creator.id());
        self.inner.feed.publish(ChangeEvent::Insert(creator.clone()));

        Ok(creator)
    }

    async fn update(&self, id: CreatorId, fields: &NewCreator) -> Result<()> {
        self.begin()?;

        let updated = {
            let mut rows = self.inner.rows.write();
            let creator = rows.find_mut(id).ok_or(StoreError::NotFound)?;
            creator.apply(fields.clone());
            creator.clone()
        };
        debug!("Updated creator {id}");
        self.inner.feed.publish(ChangeEvent::Update(updated));

        Ok(())
    }

    async fn delete(&self, id: CreatorId) -> Result<()> {
        self.begin()?;

        let removed = {
            let mut rows = self.inner.rows.write();
            let before = rows.creators.len();
            rows.creators.retain(|c| c.id() != id);
            rows.creators.len() != before
        };

        // Deleting a missing row matches nothing, which is not an error
        if removed {
            debug!("Deleted creator {id}");
            self.inner.feed.publish(ChangeEvent::Delete(id));
        }

        Ok(())
    }
}
