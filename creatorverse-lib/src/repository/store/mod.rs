//! Record store access.
//!
//! A [`RecordStore`] is the remote `creators` table, queried and mutated over request/response
//! calls. [`RestStore`] talks to a PostgREST endpoint, [`MemoryStore`] keeps everything in
//! process.

use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

use crate::repository::entities::{Creator, CreatorId, NewCreator};

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("No record matches the given id")]
    NotFound,
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Other(err.to_string())
    }
}

#[async_trait]
pub trait RecordStore: Debug + Send + Sync {
    /// Every record, newest `created_at` first.
    async fn select_all(&self) -> Result<Vec<Creator>>;

    /// A single record. Fails with [`StoreError::NotFound`] if `id` doesn't exist.
    async fn select_by_id(&self, id: CreatorId) -> Result<Creator>;

    /// Insert a new record and return it with its assigned `id` and `created_at`.
    async fn insert(&self, fields: &NewCreator) -> Result<Creator>;

    /// Overwrite all editable fields of an existing record.
    async fn update(&self, id: CreatorId, fields: &NewCreator) -> Result<()>;

    async fn delete(&self, id: CreatorId) -> Result<()>;
}
