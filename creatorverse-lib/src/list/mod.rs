//! The creator list and its reconciliation rules.
//!
//! [`ListStore`] is the in-memory copy of the `creators` table shown on the list screen. It is
//! filled once from the record store and then kept current by applying change feed events and
//! local optimistic deletes. Every rule is keyed on the creator id, so an event may be applied
//! twice, or arrive after the local action that caused it, without duplicating entries.
//!
//! [`ListSync`] wires a store to a [`Repository`](crate::Repository) and owns the change feed
//! subscription for as long as the list is shown.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::{
    feed::ChangeEvent,
    repository::entities::{Creator, CreatorId},
};

mod sync;

pub use sync::ListSync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Loading,
    /// The initial load failed. Terminal until the list is reloaded.
    Error(String),
    Ready,
}

/// A record taken out of the list by [`ListStore::remove_local`], kept so the removal can be
/// undone if the remote delete fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    creator: Creator,
    index: usize,
}

impl Removal {
    pub fn creator(&self) -> &Creator {
        &self.creator
    }
}

#[derive(Debug, Clone)]
pub struct ListStore {
    state: State,
    creators: Vec<Creator>,
    /// Events received before the initial load finished
    pending: VecDeque<ChangeEvent>,
}

impl ListStore {
    pub fn new() -> Self {
        Self {
            state: State::Loading,
            creators: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Finish the initial load.
    ///
    /// On success the rows become the list, in the order given, and any events that arrived
    /// in the meantime are replayed on top of them. On failure the list enters the error state.
    pub fn loaded<E: ToString>(&mut self, result: Result<Vec<Creator>, E>) {
        match result {
            Ok(rows) => {
                self.creators = Vec::with_capacity(rows.len());
                for creator in rows {
                    // Guard against a snapshot that repeats an id
                    if !self.contains(creator.id()) {
                        self.creators.push(creator);
                    }
                }
                self.state = State::Ready;

                let pending = std::mem::take(&mut self.pending);
                if !pending.is_empty() {
                    debug!("Replaying {} change events received while loading", pending.len());
                }
                for event in pending {
                    self.apply(event);
                }
            }
            Err(e) => {
                self.creators.clear();
                self.pending.clear();
                self.state = State::Error(e.to_string());
            }
        }
    }

    /// Apply a change feed event. Returns `true` when the list changed.
    pub fn apply(&mut self, event: ChangeEvent) -> bool {
        match self.state {
            State::Loading => {
                self.pending.push_back(event);
                return false;
            }
            State::Error(_) => {
                warn!("Dropping {} event, the list failed to load", event.kind());
                return false;
            }
            State::Ready => {}
        }

        match event {
            ChangeEvent::Insert(creator) => {
                // A repeated insert moves the record to the front instead of duplicating it
                self.take(creator.id());
                self.creators.insert(0, creator);
                true
            }
            ChangeEvent::Update(creator) => match self.position(creator.id()) {
                Some(index) => {
                    if let Some(slot) = self.creators.get_mut(index) {
                        *slot = creator;
                    }
                    true
                }
                None => false,
            },
            ChangeEvent::Delete(id) => self.take(id).is_some(),
        }
    }

    /// Remove a record the user confirmed for deletion, ahead of the remote delete.
    ///
    /// A delete event for the same id arriving later is a no-op.
    pub fn remove_local(&mut self, id: CreatorId) -> Option<Removal> {
        if self.state != State::Ready {
            return None;
        }

        self.take(id)
            .map(|(index, creator)| Removal { creator, index })
    }

    /// Put back a record removed by [`ListStore::remove_local`] after the remote delete failed.
    ///
    /// Returns `false` if a record with the same id has reappeared in the meantime.
    pub fn restore(&mut self, removal: Removal) -> bool {
        if self.state != State::Ready || self.contains(removal.creator.id()) {
            return false;
        }

        let index = removal.index.min(self.creators.len());
        self.creators.insert(index, removal.creator);

        true
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn creators(&self) -> &[Creator] {
        &self.creators
    }

    pub fn get(&self, id: CreatorId) -> Option<&Creator> {
        self.creators.iter().find(|c| c.id() == id)
    }

    pub fn contains(&self, id: CreatorId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }

    fn position(&self, id: CreatorId) -> Option<usize> {
        self.creators.iter().position(|c| c.id() == id)
    }

    fn take(&mut self, id: CreatorId) -> Option<(usize, Creator)> {
        let index = self.position(id)?;
        Some((index, self.creators.remove(index)))
    }
}

impl Default for ListStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::repository::{entities::NewCreator, store::StoreError};

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn creator(id: i64, name: &str, created_at: DateTime<Utc>) -> Creator {
        Creator::new(
            CreatorId(id),
            created_at,
            NewCreator {
                name: name.into(),
                url: format!("https://{}.example", name.to_lowercase()),
                description: format!("About {name}"),
                imageurl: None,
            },
        )
    }

    fn names(store: &ListStore) -> Vec<&str> {
        store.creators().iter().map(|c| c.name().as_str()).collect()
    }

    fn ready(rows: Vec<Creator>) -> ListStore {
        let mut store = ListStore::new();
        store.loaded::<StoreError>(Ok(rows));
        store
    }

    fn a_and_b() -> ListStore {
        ready(vec![
            creator(1, "A", t1()),
            creator(2, "B", t1() - Duration::hours(1)),
        ])
    }

    #[test]
    fn test_load() {
        let store = a_and_b();

        assert_eq!(store.state(), &State::Ready);
        assert_eq!(names(&store), ["A", "B"]);
    }

    #[test]
    fn test_load_empty() {
        let store = ready(Vec::new());

        assert_eq!(store.state(), &State::Ready);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_error_is_terminal() {
        let mut store = ListStore::new();
        store.loaded::<StoreError>(Err(StoreError::Other("offline".into())));

        assert_eq!(store.state(), &State::Error("offline".into()));
        assert!(!store.apply(ChangeEvent::Insert(creator(1, "A", t1()))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_is_prepended() {
        let mut store = a_and_b();

        // Older than everything else, still goes first
        store.apply(ChangeEvent::Insert(creator(3, "C", t1() - Duration::days(30))));

        assert_eq!(names(&store), ["C", "A", "B"]);
    }

    #[test]
    fn test_repeated_insert_does_not_duplicate() {
        let mut store = a_and_b();

        store.apply(ChangeEvent::Insert(creator(3, "C", t1())));
        store.apply(ChangeEvent::Insert(creator(3, "C", t1())));

        assert_eq!(names(&store), ["C", "A", "B"]);
    }

    #[test]
    fn test_insert_of_existing_id_moves_it_first() {
        let mut store = a_and_b();

        store.apply(ChangeEvent::Insert(creator(2, "B2", t1())));

        assert_eq!(names(&store), ["B2", "A"]);
    }

    #[test]
    fn test_update_in_place() {
        let mut store = a_and_b();

        assert!(store.apply(ChangeEvent::Update(creator(2, "B2", t1()))));

        assert_eq!(names(&store), ["A", "B2"]);
    }

    #[test]
    fn test_update_missing_is_noop() {
        let mut store = a_and_b();

        assert!(!store.apply(ChangeEvent::Update(creator(9, "Z", t1()))));

        assert_eq!(names(&store), ["A", "B"]);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut store = a_and_b();

        assert!(!store.apply(ChangeEvent::Delete(CreatorId(9))));

        assert_eq!(names(&store), ["A", "B"]);
    }

    #[test]
    fn test_local_delete_then_echo() {
        let mut store = a_and_b();
        store.apply(ChangeEvent::Insert(creator(3, "C", t1())));
        assert_eq!(names(&store), ["C", "A", "B"]);

        let removal = store.remove_local(CreatorId(1)).unwrap();
        assert_eq!(removal.creator().name(), "A");
        assert_eq!(names(&store), ["C", "B"]);

        assert!(!store.apply(ChangeEvent::Delete(CreatorId(1))));
        assert_eq!(names(&store), ["C", "B"]);
    }

    #[test]
    fn test_restore_after_failed_delete() {
        let mut store = ready(vec![
            creator(1, "A", t1()),
            creator(2, "B", t1()),
            creator(3, "C", t1()),
        ]);

        let removal = store.remove_local(CreatorId(2)).unwrap();
        assert!(store.restore(removal));

        assert_eq!(names(&store), ["A", "B", "C"]);
    }

    #[test]
    fn test_restore_clamps_index() {
        let mut store = a_and_b();

        let removal = store.remove_local(CreatorId(2)).unwrap();
        store.apply(ChangeEvent::Delete(CreatorId(1)));

        assert!(store.restore(removal));
        assert_eq!(names(&store), ["B"]);
    }

    #[test]
    fn test_restore_skips_reappeared_record() {
        let mut store = a_and_b();

        let removal = store.remove_local(CreatorId(1)).unwrap();
        store.apply(ChangeEvent::Insert(creator(1, "A", t1())));

        assert!(!store.restore(removal));
        assert_eq!(names(&store), ["A", "B"]);
    }

    #[test]
    fn test_remove_local_missing() {
        let mut store = a_and_b();

        assert!(store.remove_local(CreatorId(7)).is_none());
    }

    #[test]
    fn test_events_during_load_are_replayed() {
        let mut store = ListStore::new();

        assert!(!store.apply(ChangeEvent::Insert(creator(3, "C", t1()))));
        assert!(!store.apply(ChangeEvent::Delete(CreatorId(2))));
        assert!(store.is_empty());

        // The snapshot already contains C, the replayed insert must not duplicate it
        store.loaded::<StoreError>(Ok(vec![
            creator(3, "C", t1()),
            creator(1, "A", t1() - Duration::hours(1)),
            creator(2, "B", t1() - Duration::hours(2)),
        ]));

        assert_eq!(names(&store), ["C", "A"]);
    }

    #[test]
    fn test_snapshot_with_duplicate_ids() {
        let store = ready(vec![creator(1, "A", t1()), creator(1, "A", t1())]);

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_interleaving_keeps_ids_unique() {
        let mut store = a_and_b();
        let mut live: HashSet<CreatorId> = [CreatorId(1), CreatorId(2)].into();

        // A deterministic mix of inserts, echoes, updates, local deletes and remote deletes
        for step in 0..200_i64 {
            let id = CreatorId(step % 7);
            match step % 5 {
                0 | 3 => {
                    store.apply(ChangeEvent::Insert(creator(id.0, "X", t1())));
                    live.insert(id);
                }
                1 => {
                    store.apply(ChangeEvent::Update(creator(id.0, "Y", t1())));
                }
                2 => {
                    store.remove_local(id);
                    live.remove(&id);
                }
                _ => {
                    store.apply(ChangeEvent::Delete(id));
                    live.remove(&id);
                }
            }

            let ids: HashSet<CreatorId> = store.creators().iter().map(|c| c.id()).collect();
            assert_eq!(ids.len(), store.len(), "duplicate id after step {step}");
            assert_eq!(ids, live, "stale or missing entry after step {step}");
        }
    }
}
