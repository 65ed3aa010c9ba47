use std::sync::Arc;

use tracing::{debug, error};

use crate::{
    Error, Result,
    feed::{ChangeFeed, MemoryFeed, RealtimeFeed, Subscription},
    form::{CreatorForm, EditForm},
    repository::{
        config::CoreConfig,
        store::{MemoryStore, RecordStore, RestStore, StoreError},
    },
};

pub mod config;
pub mod entities;
pub mod store;

pub use entities::{Creator, CreatorId, NewCreator};

/// Central access point for all creator data.
///
/// The [`Repository`] owns the record store and the change feed. Forms are validated here before anything is sent to the record store, and store
/// failures are turned into user facing [`Error`]s.
#[derive(Clone, Debug)]
pub struct Repository {
    store: Arc<dyn RecordStore>,
    feed: Arc<dyn ChangeFeed>,
}

impl Repository {
    /// Connect to the hosted backend described by `cfg`.
    pub fn new(cfg: CoreConfig) -> Result<Self> {
        let store = RestStore::new(&cfg)?;
        let feed = RealtimeFeed::new(&cfg)?;

        Ok(Self::with_backends(Arc::new(store), Arc::new(feed)))
    }

    /// Load the configuration from disk and the environment, then connect.
    pub fn load() -> Result<Self> {
        Self::new(CoreConfig::load()?)
    }

    /// A repository that keeps everything in process. Changes are echoed on the store's feed.
    pub fn in_memory(store: MemoryStore) -> Self {
        let feed: MemoryFeed = store.feed();
        Self::with_backends(Arc::new(store), Arc::new(feed))
    }

    pub fn with_backends(store: Arc<dyn RecordStore>, feed: Arc<dyn ChangeFeed>) -> Self {
        Self { store, feed }
    }

    /// Every creator, newest first.
    pub async fn creators(&self) -> Result<Vec<Creator>> {
        self.store.select_all().await.map_err(|e| {
            error!("Fetch creators error: {e}");
            Error::LoadList(e.to_string())
        })
    }

    pub async fn creator(&self, id: CreatorId) -> Result<Creator> {
        self.store.select_by_id(id).await.map_err(|e| {
            error!("Fetch creator {id} error: {e}");
            match e {
                StoreError::NotFound => Error::NotFound(id),
                StoreError::Other(message) => Error::Load(message),
            }
        })
    }

    /// Validate `form` and insert it. Nothing is sent if validation fails.
    pub async fn add_creator(&self, form: &CreatorForm) -> Result<Creator> {
        let fields = form.validate().inspect_err(|e| debug!("Rejected new creator: {e}"))?;

        let creator = self.store.insert(&fields).await.map_err(|e| {
            error!("Add creator error: {e}");
            Error::Add(e.to_string())
        })?;
        debug!("Created creator {} ({})", creator.name(), creator.id());

        Ok(creator)
    }

    /// Validate the draft of `form` and write all of its fields to creator `id`.
    ///
    /// Fails without calling the record store when the draft is unchanged or invalid.
    pub async fn update_creator(&self, id: CreatorId, form: &EditForm) -> Result<NewCreator> {
        let fields = form
            .submit()
            .inspect_err(|e| debug!("Rejected edit of creator {id}: {e}"))?;

        self.store.update(id, &fields).await.map_err(|e| {
            error!("Update creator {id} error: {e}");
            match e {
                StoreError::NotFound => Error::NotFound(id),
                StoreError::Other(message) => Error::Update(message),
            }
        })?;
        debug!("Updated creator {id}");

        Ok(fields)
    }

    pub async fn delete_creator(&self, id: CreatorId) -> Result<()> {
        self.store.delete(id).await.map_err(|e| {
            error!("Delete creator {id} error: {e}");
            Error::Delete(e.to_string())
        })?;
        debug!("Deleted creator {id}");

        Ok(())
    }

    /// Open a change feed subscription for the creators table.
    pub async fn subscribe(&self) -> Result<Subscription> {
        self.feed.subscribe().await.map_err(|e| {
            error!("Subscribe error: {e}");
            Error::Feed(e)
        })
    }

    #[cfg(test)]
    /// Return a mock version of a [`Repository`] backed by an empty in-memory store.
    pub(crate) fn mock() -> (Self, MemoryStore) {
        let store = MemoryStore::new();
        (Self::in_memory(store.clone()), store)
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::form::{Field, ValidationError};

    fn form(name: &str, url: &str) -> CreatorForm {
        CreatorForm {
            name: name.into(),
            url: url.into(),
            description: "Makes videos".into(),
            imageurl: String::new(),
        }
    }

    #[tokio::test]
    async fn test_add() {
        let (repo, _) = Repository::mock();

        let creator = repo
            .add_creator(&form("Veritasium", "https://youtube.com/@veritasium"))
            .await
            .unwrap();

        assert_eq!(repo.creator(creator.id()).await.unwrap(), creator);
        assert_eq!(repo.creators().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_invalid_url_makes_no_call() {
        let (repo, store) = Repository::mock();

        let result = repo.add_creator(&form("Veritasium", "not-a-url")).await;

        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidUrl))
        ));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_add_missing_name_makes_no_call() {
        let (repo, store) = Repository::mock();

        let result = repo.add_creator(&form("", "https://example.com")).await;

        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::Required(Field::Name)))
        ));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_add_failure() {
        let (repo, store) = Repository::mock();
        store.set_unavailable(true);

        let err = repo
            .add_creator(&form("Veritasium", "https://youtube.com/@veritasium"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to add creator: record store unavailable"
        );
    }

    #[tokio::test]
    async fn test_creator_not_found() {
        let (repo, _) = Repository::mock();

        let err = repo.creator(CreatorId(99)).await.unwrap_err();

        assert!(matches!(err, Error::NotFound(CreatorId(99))));
        assert_eq!(err.to_string(), "Creator not found");
    }

    #[tokio::test]
    async fn test_creators_load_failure() {
        let (repo, store) = Repository::mock();
        store.set_unavailable(true);

        let err = repo.creators().await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to load creators: record store unavailable"
        );
    }

    #[tokio::test]
    async fn test_update() {
        let (repo, store) = Repository::mock();
        let creator = store.seed(
            form("Veritasium", "https://youtube.com/@veritasium")
                .validate()
                .unwrap(),
            Utc::now(),
        );

        let mut edit = EditForm::new(&creator);
        edit.draft.set(Field::Description, "Science".into());
        repo.update_creator(creator.id(), &edit).await.unwrap();

        let updated = repo.creator(creator.id()).await.unwrap();
        assert_eq!(updated.description(), "Science");
        assert_eq!(updated.id(), creator.id());
    }

    #[tokio::test]
    async fn test_update_without_changes_makes_no_call() {
        let (repo, store) = Repository::mock();
        let creator = store.seed(
            form("Veritasium", "https://youtube.com/@veritasium")
                .validate()
                .unwrap(),
            Utc::now(),
        );

        let edit = EditForm::new(&creator);
        let result = repo.update_creator(creator.id(), &edit).await;

        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::NoChanges))
        ));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, store) = Repository::mock();
        let creator = store.seed(
            form("Veritasium", "https://youtube.com/@veritasium")
                .validate()
                .unwrap(),
            Utc::now(),
        );

        repo.delete_creator(creator.id()).await.unwrap();

        assert!(matches!(
            repo.creator(creator.id()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_new_requires_configuration() {
        assert!(matches!(
            Repository::new(CoreConfig::default()),
            Err(Error::Config(_))
        ));
    }
}
