//! The note list the UI renders from, and the only thing that talks to the
//! store. Every mutation is sent to the store first; local state only changes
//! once the store has accepted it.

use super::{
    config::NOTE_PREFIX,
    models::{Note, NoteValue, Toast},
    store::NoteStore,
};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

/// Hands out `note:<epoch-millis>` keys that never repeat within a process,
/// even when two notes land in the same millisecond.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last_millis: i64,
}

impl IdGenerator {
    pub fn next_id(&mut self, now: DateTime<Utc>) -> (String, DateTime<Utc>) {
        let millis = now.timestamp_millis().max(self.last_millis + 1);
        self.last_millis = millis;
        let created_at = Utc.timestamp_millis_opt(millis).single().unwrap_or(now);

        (format!("{NOTE_PREFIX}{millis}"), created_at)
    }

    /// Never hand out `id` or anything before it. Keys that are not
    /// `note:<millis>` are ignored.
    pub fn observe(&mut self, id: &str) {
        let millis = id
            .strip_prefix(NOTE_PREFIX)
            .and_then(|m| m.parse::<i64>().ok());
        if let Some(millis) = millis {
            self.last_millis = self.last_millis.max(millis);
        }
    }
}

pub struct NoteList {
    store: Arc<dyn NoteStore>,
    notes: Vec<Note>,
    input: String,
    ids: IdGenerator,
}

impl NoteList {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        NoteList {
            store,
            notes: Vec::new(),
            input: String::new(),
            ids: IdGenerator::default(),
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Whatever is sitting in the "add a note" box.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn find(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Replace the local list with whatever the store holds. Returns `false`
    /// and leaves the list alone if the store could not be read.
    pub async fn list(&mut self) -> bool {
        let entries = match self.store.get_with_prefix(NOTE_PREFIX).await {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("could not list notes: {e:#}");
                return false;
            }
        };
        for entry in &entries {
            self.ids.observe(&entry.key);
        }
        self.notes = entries
            .into_iter()
            .filter_map(|entry| {
                match serde_json::from_value::<NoteValue>(entry.value) {
                    Ok(value) => Some(Note::from_value(entry.key, value)),
                    Err(e) => {
                        log::warn!("skipping malformed note {}: {e}", entry.key);
                        None
                    }
                }
            })
            .collect();
        log::debug!("listed {} notes", self.notes.len());

        true
    }

    pub async fn add(&mut self, text: &str) -> Option<Toast> {
        self.input = text.to_string();
        if text.trim().is_empty() {
            return Some(Toast::error("Error", "Note can't be empty"));
        }
        let (id, created_at) = self.ids.next_id(Utc::now());
        let note = Note {
            id,
            text: text.to_string(),
            created_at: Some(created_at),
            is_editing: false,
        };
        if !self.write(&note).await {
            return None;
        }
        log::info!("added {}", note.id);
        self.notes.push(note);
        self.input.clear();

        Some(Toast::success("Note added"))
    }

    /// Unknown ids are ignored; we never create notes from here.
    pub async fn update(&mut self, id: &str, new_text: &str) -> Option<Toast> {
        let updated = Note {
            text: new_text.to_string(),
            ..self.find(id)?.clone()
        };
        if !self.write(&updated).await {
            return None;
        }
        if let Some(note) = self.notes.iter_mut().find(|n| n.id == id) {
            note.text = updated.text;
        }
        log::info!("updated {id}");

        Some(Toast::success("Note updated"))
    }

    pub async fn delete(&mut self, id: &str) -> Option<Toast> {
        match self.store.delete(id).await {
            Ok(true) => {}
            Ok(false) => {
                log::warn!("could not delete {id}: not in store");
                return None;
            }
            Err(e) => {
                log::warn!("could not delete {id}: {e:#}");
                return None;
            }
        }
        self.notes.retain(|n| n.id != id);
        log::info!("deleted {id}");

        Some(Toast::success("Note deleted"))
    }

    /// Flip between viewing and editing. Returns `false` for unknown ids.
    pub fn toggle_edit(&mut self, id: &str) -> bool {
        match self.notes.iter_mut().find(|n| n.id == id) {
            Some(note) => {
                note.is_editing = !note.is_editing;
                true
            }
            None => false,
        }
    }

    /// Re-read one note from the store. A note that is gone from the store is
    /// dropped locally; one we have not seen yet is appended.
    pub async fn refresh(&mut self, id: &str) -> bool {
        let value = match self.store.get(id).await {
            Ok(value) => value,
            Err(e) => {
                log::warn!("could not read {id}: {e:#}");
                return false;
            }
        };
        let Some(value) = value else {
            self.notes.retain(|n| n.id != id);
            return true;
        };
        self.ids.observe(id);
        let fresh = match serde_json::from_value::<NoteValue>(value) {
            Ok(v) => Note::from_value(id.to_string(), v),
            Err(e) => {
                log::warn!("skipping malformed note {id}: {e}");
                return false;
            }
        };
        match self.notes.iter_mut().find(|n| n.id == id) {
            Some(note) => {
                *note = Note {
                    is_editing: note.is_editing,
                    ..fresh
                }
            }
            None => self.notes.push(fresh),
        }

        true
    }

    async fn write(&self, note: &Note) -> bool {
        let value = match serde_json::to_value(note.to_value()) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("could not serialize {}: {e}", note.id);
                return false;
            }
        };
        match self.store.set(&note.id, &value).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("could not write {}: {e:#}", note.id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Entry, ToastStatus},
        store::MemoryStore,
    };
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Wraps a `MemoryStore`, counting calls and failing on demand.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl FlakyStore {
        fn failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn check(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                bail!("store is down");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl NoteStore for FlakyStore {
        async fn get_with_prefix(&self, prefix: &str) -> Result<Vec<Entry>> {
            self.check()?;
            self.inner.get_with_prefix(prefix).await
        }
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            self.check()?;
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &Value) -> Result<()> {
            self.check()?;
            self.inner.set(key, value).await
        }
        async fn delete(&self, key: &str) -> Result<bool> {
            self.check()?;
            self.inner.delete(key).await
        }
    }

    fn setup() -> (Arc<FlakyStore>, NoteList) {
        let store = Arc::new(FlakyStore::default());
        let list = NoteList::new(store.clone());
        (store, list)
    }

    fn texts(list: &NoteList) -> Vec<&str> {
        list.notes().iter().map(|n| n.text.as_str()).collect()
    }

    #[test]
    fn test_ids_are_unique_within_a_millisecond() {
        let mut ids = IdGenerator::default();
        let now = Utc.timestamp_millis_opt(1_000).unwrap();

        let (a, _) = ids.next_id(now);
        let (b, b_created) = ids.next_id(now);

        assert_eq!(a, "note:1000");
        assert_eq!(b, "note:1001");
        assert_eq!(b_created.timestamp_millis(), 1001);
    }

    #[test]
    fn test_ids_follow_the_clock() {
        let mut ids = IdGenerator::default();
        ids.next_id(Utc.timestamp_millis_opt(1_000).unwrap());

        let (id, _) = ids.next_id(Utc.timestamp_millis_opt(5_000).unwrap());

        assert_eq!(id, "note:5000");
    }

    #[test]
    fn test_observed_ids_are_never_reissued() {
        let mut ids = IdGenerator::default();
        ids.observe("note:9000");
        ids.observe("note:not-a-number");
        ids.observe("note:5");

        let (id, _) = ids.next_id(Utc.timestamp_millis_opt(1_000).unwrap());

        assert_eq!(id, "note:9001");
    }

    #[tokio::test]
    async fn test_add_after_list_never_overwrites_stored_notes() {
        let (store, mut list) = setup();
        let future = Utc::now().timestamp_millis() + 60_000;
        let key = format!("note:{future}");
        store.inner.set(&key, &json!({"text": "kept"})).await.unwrap();
        list.list().await;

        list.add("new").await;

        assert_eq!(store.inner.len().await, 2);
        assert_eq!(
            store.inner.get(&key).await.unwrap().unwrap()["text"],
            json!("kept")
        );
        assert_eq!(list.notes()[1].id, format!("note:{}", future + 1));
    }

    #[tokio::test]
    async fn test_list_keeps_notes_with_foreign_timestamps() {
        let (store, mut list) = setup();
        store
            .inner
            .set("note:1", &json!({"text": "a", "createdAt": 1_689_326_813_589u64}))
            .await
            .unwrap();
        store
            .inner
            .set("note:2", &json!({"text": "b", "createdAt": "2023-07-14 09:26"}))
            .await
            .unwrap();
        store.inner.set("note:3", &json!({"text": "c"})).await.unwrap();

        assert!(list.list().await);

        assert_eq!(texts(&list), vec!["a", "b", "c"]);
        assert!(list.notes().iter().all(|n| n.created_at.is_none()));
    }

    #[tokio::test]
    async fn test_add_blank_never_touches_store() {
        let (store, mut list) = setup();

        for text in ["", "   ", "\n\t"] {
            let toast = list.add(text).await.expect("validation toast");
            assert_eq!(toast.status, ToastStatus::Error);
            assert_eq!(toast.description, Some("Note can't be empty"));
        }

        assert_eq!(store.calls(), 0);
        assert!(list.notes().is_empty());
    }

    #[tokio::test]
    async fn test_add_appends_and_clears_input() {
        let (store, mut list) = setup();

        let toast = list.add("buy milk").await.expect("success toast");

        assert_eq!(toast.title, "Note added");
        assert_eq!(texts(&list), vec!["buy milk"]);
        assert_eq!(list.input(), "");
        let id = &list.notes()[0].id;
        assert!(id.starts_with("note:"));
        assert_eq!(
            store.inner.get(id).await.unwrap().unwrap()["text"],
            json!("buy milk")
        );
    }

    #[tokio::test]
    async fn test_add_twice_quickly_keeps_both() {
        let (store, mut list) = setup();

        list.add("a").await;
        list.add("b").await;

        assert_eq!(texts(&list), vec!["a", "b"]);
        assert_eq!(store.inner.len().await, 2);
    }

    #[tokio::test]
    async fn test_add_failure_is_silent() {
        let (store, mut list) = setup();
        store.failing(true);

        assert_eq!(list.add("buy milk").await, None);
        assert!(list.notes().is_empty());
        assert_eq!(list.input(), "buy milk");
    }

    #[tokio::test]
    async fn test_list_maps_keys_to_ids_in_order() {
        let (store, mut list) = setup();
        store.inner.set("note:2", &json!({"text": "b"})).await.unwrap();
        store.inner.set("note:1", &json!({"text": "a"})).await.unwrap();

        assert!(list.list().await);

        let ids: Vec<&str> =
            list.notes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["note:1", "note:2"]);
        assert_eq!(texts(&list), vec!["a", "b"]);
        assert_eq!(list.notes()[0].created_at, None);
    }

    #[tokio::test]
    async fn test_list_replaces_wholesale_and_skips_junk() {
        let (store, mut list) = setup();
        list.add("local only").await;
        store.inner.delete(&list.notes()[0].id).await.unwrap();
        store.inner.set("note:1", &json!({"text": "a"})).await.unwrap();
        store.inner.set("note:2", &json!("not an object")).await.unwrap();

        list.list().await;

        assert_eq!(texts(&list), vec!["a"]);
    }

    #[tokio::test]
    async fn test_list_failure_keeps_local_state() {
        let (store, mut list) = setup();
        list.add("a").await;
        store.failing(true);

        assert!(!list.list().await);
        assert_eq!(texts(&list), vec!["a"]);
    }

    #[tokio::test]
    async fn test_update_applies_after_store_accepts() {
        let (store, mut list) = setup();
        list.add("a").await;
        let note = list.notes()[0].clone();

        let toast = list.update(&note.id, "b").await.expect("success toast");

        assert_eq!(toast.title, "Note updated");
        assert_eq!(texts(&list), vec!["b"]);
        let stored: NoteValue = serde_json::from_value(
            store.inner.get(&note.id).await.unwrap().unwrap(),
        )
        .unwrap();
        assert_eq!(stored.text, "b");
        assert_eq!(stored.created_at, note.created_at);
    }

    #[tokio::test]
    async fn test_update_failure_keeps_local_and_remote_in_step() {
        let (store, mut list) = setup();
        list.add("a").await;
        let id = list.notes()[0].id.clone();
        store.failing(true);

        assert_eq!(list.update(&id, "b").await, None);
        assert_eq!(texts(&list), vec!["a"]);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_a_noop() {
        let (store, mut list) = setup();

        assert_eq!(list.update("note:404", "b").await, None);
        assert_eq!(store.calls(), 0);
        assert_eq!(store.inner.len().await, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let (_store, mut list) = setup();
        list.add("a").await;
        list.add("b").await;
        list.add("c").await;
        let id = list.notes()[1].id.clone();

        let toast = list.delete(&id).await.expect("success toast");

        assert_eq!(toast.title, "Note deleted");
        assert_eq!(texts(&list), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_delete_missing_from_store_keeps_list() {
        let (store, mut list) = setup();
        list.add("a").await;
        let id = list.notes()[0].id.clone();
        store.inner.delete(&id).await.unwrap();

        assert_eq!(list.delete(&id).await, None);
        assert_eq!(texts(&list), vec!["a"]);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_list() {
        let (store, mut list) = setup();
        list.add("a").await;
        let id = list.notes()[0].id.clone();
        store.failing(true);

        assert_eq!(list.delete(&id).await, None);
        assert_eq!(texts(&list), vec!["a"]);
    }

    #[tokio::test]
    async fn test_toggle_edit_is_local() {
        let (store, mut list) = setup();
        list.add("a").await;
        let id = list.notes()[0].id.clone();
        let calls = store.calls();

        assert!(list.toggle_edit(&id));
        assert!(list.find(&id).unwrap().is_editing);
        assert!(list.toggle_edit(&id));
        assert!(!list.find(&id).unwrap().is_editing);
        assert!(!list.toggle_edit("note:404"));
        assert_eq!(store.calls(), calls);
    }

    #[tokio::test]
    async fn test_refresh_tracks_the_store() {
        let (store, mut list) = setup();
        list.add("a").await;
        let id = list.notes()[0].id.clone();
        list.toggle_edit(&id);
        store.inner.set(&id, &json!({"text": "changed"})).await.unwrap();
        store.inner.set("note:7", &json!({"text": "new"})).await.unwrap();

        assert!(list.refresh(&id).await);
        assert!(list.refresh("note:7").await);

        assert_eq!(texts(&list), vec!["changed", "new"]);
        assert!(list.find(&id).unwrap().is_editing);

        store.inner.delete("note:7").await.unwrap();
        assert!(list.refresh("note:7").await);
        assert_eq!(texts(&list), vec!["changed"]);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_local_state() {
        let (store, mut list) = setup();
        list.add("a").await;
        let id = list.notes()[0].id.clone();
        store.failing(true);

        assert!(!list.refresh(&id).await);
        assert_eq!(texts(&list), vec!["a"]);
    }
}
