//! Creatorverse: a catalogue of content creators kept in a hosted database.
//!
//! The [`Repository`] is the entry point. It reads and writes creators through a
//! [`RecordStore`](repository::store::RecordStore) and opens change feed subscriptions through a
//! [`ChangeFeed`](feed::ChangeFeed). The list screen keeps its copy of the table current with a
//! [`ListSync`](list::ListSync).

use thiserror::Error;

use crate::{
    feed::FeedError,
    form::ValidationError,
    repository::{config::ConfigError, entities::CreatorId},
};

pub mod feed;
pub mod form;
pub mod fs;
pub mod list;
pub mod repository;

pub use repository::Repository;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Creator not found")]
    NotFound(CreatorId),
    #[error("Failed to load creators: {0}")]
    LoadList(String),
    #[error("Failed to load creator: {0}")]
    Load(String),
    #[error("Failed to add creator: {0}")]
    Add(String),
    #[error("Failed to update creator: {0}")]
    Update(String),
    #[error("Failed to delete creator: {0}")]
    Delete(String),
    #[error("Live updates unavailable: {0}")]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
