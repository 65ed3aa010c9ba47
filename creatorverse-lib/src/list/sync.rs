use tracing::{debug, error, info};

use crate::{
    Repository, Result,
    feed::{ChangeEvent, Subscription},
    list::ListStore,
};

/// A [`ListStore`] kept in sync with the record store for as long as it is alive.
///
/// Starting a sync loads the list and opens a change feed subscription at the same time. The
/// subscription is released by [`ListSync::stop`] or when the sync is dropped.
#[derive(Debug)]
pub struct ListSync {
    store: ListStore,
    subscription: Option<Subscription>,
}

impl ListSync {
    /// Load the list and subscribe to changes.
    ///
    /// A failed load is returned as an error. A failed subscription is not: the list is still
    /// usable, it just won't update by itself.
    pub async fn start(repo: &Repository) -> Result<Self> {
        let (subscription, rows) = tokio::join!(repo.subscribe(), repo.creators());

        let subscription = subscription
            .inspect_err(|e| error!("List will not receive live updates: {e}"))
            .ok();

        let mut store = ListStore::new();
        // Events that raced the load are still in the subscription and get applied on top
        store.loaded::<crate::Error>(Ok(rows?));
        info!("Creator list started with {} entries", store.len());

        Ok(Self {
            store,
            subscription,
        })
    }

    pub fn store(&self) -> &ListStore {
        &self.store
    }

    /// Whether change feed events are being received.
    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    /// Wait for the next change feed event and apply it.
    ///
    /// Returns `None` once the subscription is closed or released.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        let event = self.subscription.as_mut()?.recv().await;

        match event {
            Some(event) => {
                let changed = self.store.apply(event.clone());
                debug!(
                    "Applied {} for creator {} (changed: {changed})",
                    event.kind(),
                    event.id()
                );
                Some(event)
            }
            None => {
                info!("Change feed closed");
                self.subscription = None;
                None
            }
        }
    }

    /// Release the change feed subscription. No events are applied afterwards.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::{Error, feed::{ChangeFeed, FeedError}, list::State};
    use crate::repository::{entities::{Creator, NewCreator}, store::{MemoryStore, RecordStore}};

    fn fields(name: &str) -> NewCreator {
        NewCreator {
            name: name.into(),
            url: format!("https://{}.example", name.to_lowercase()),
            description: format!("About {name}"),
            imageurl: None,
        }
    }

    fn names(sync: &ListSync) -> Vec<String> {
        sync.store()
            .creators()
            .iter()
            .map(|c| c.name().clone())
            .collect()
    }

    /// A repository holding A (newest) and B.
    fn seeded() -> (Repository, MemoryStore, Creator, Creator) {
        let store = MemoryStore::new();
        let t1 = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let a = store.seed(fields("A"), t1);
        let b = store.seed(fields("B"), t1 - Duration::hours(1));

        (Repository::in_memory(store.clone()), store, a, b)
    }

    #[tokio::test]
    async fn test_start_loads_newest_first() {
        let (repo, _, _, _) = seeded();

        let sync = ListSync::start(&repo).await.unwrap();

        assert_eq!(sync.store().state(), &State::Ready);
        assert!(sync.is_live());
        assert_eq!(names(&sync), ["A", "B"]);
    }

    #[tokio::test]
    async fn test_start_returns_load_error() {
        let (repo, store, _, _) = seeded();
        store.set_unavailable(true);

        let result = ListSync::start(&repo).await;

        assert!(matches!(result, Err(Error::LoadList(_))));
    }

    #[tokio::test]
    async fn test_start_without_feed() {
        let (_, store, _, _) = seeded();
        let feed = store.feed();

        #[derive(Debug)]
        struct Offline;

        #[async_trait]
        impl ChangeFeed for Offline {
            async fn subscribe(&self) -> std::result::Result<Subscription, FeedError> {
                Err(FeedError::Connect("offline".into()))
            }
        }

        let repo = Repository::with_backends(Arc::new(store), Arc::new(Offline));
        let mut sync = ListSync::start(&repo).await.unwrap();

        assert!(!sync.is_live());
        assert_eq!(names(&sync), ["A", "B"]);
        assert_eq!(sync.next_event().await, None);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_changes_are_applied() {
        let (repo, store, a, b) = seeded();
        let mut sync = ListSync::start(&repo).await.unwrap();

        // Another client adds C, then edits B
        let c = store.insert(&fields("C")).await.unwrap();
        store.update(b.id(), &fields("B2")).await.unwrap();

        assert_eq!(sync.next_event().await.map(|e| e.id()), Some(c.id()));
        assert_eq!(names(&sync), ["C", "A", "B"]);

        sync.next_event().await;
        assert_eq!(names(&sync), ["C", "A", "B2"]);
        assert!(sync.store().contains(a.id()));
    }

    #[tokio::test]
    async fn test_echo_of_remote_delete_after_removal() {
        let (repo, _, a, _) = seeded();
        let mut sync = ListSync::start(&repo).await.unwrap();

        let c = repo.add_creator(&fields("C").into()).await.unwrap();
        sync.next_event().await;
        assert_eq!(names(&sync), ["C", "A", "B"]);

        repo.delete_creator(a.id()).await.unwrap();
        assert_eq!(sync.next_event().await, Some(ChangeEvent::Delete(a.id())));
        assert_eq!(names(&sync), ["C", "B"]);
        assert!(sync.store().contains(c.id()));
    }

    #[tokio::test]
    async fn test_stop_releases_subscription() {
        let (repo, store, _, _) = seeded();
        let mut sync = ListSync::start(&repo).await.unwrap();
        assert_eq!(store.feed().subscriber_count(), 1);

        sync.stop();
        repo.add_creator(&fields("C").into()).await.unwrap();

        assert!(!sync.is_live());
        assert_eq!(sync.next_event().await, None);
        assert_eq!(names(&sync), ["A", "B"]);
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let (repo, store, _, _) = seeded();

        {
            let _sync = ListSync::start(&repo).await.unwrap();
            assert_eq!(store.feed().subscriber_count(), 1);
        }

        for _ in 0..100 {
            if store.feed().subscriber_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(store.feed().subscriber_count(), 0);
    }
}
