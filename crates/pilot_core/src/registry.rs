//! The content registry: the ordered list of content items and its mirror in
//! the durable store.
//!
//! Every mutation rewrites the full list under [`CONTENT_HISTORY_KEY`] before
//! returning. A failed write is logged and the in-memory list stays
//! authoritative; the next successful mutation brings the store back in line.

use std::collections::HashSet;

use pilot_logging::{pilot_debug, pilot_error, pilot_info, pilot_warn};

use crate::{ContentId, ContentItem, ContentKind, ContentSeed, DurableStore};

/// Store key holding the JSON-encoded item list.
pub const CONTENT_HISTORY_KEY: &str = "contentHistory";
/// Store key marking that at least one ingestion completed.
pub const INGESTED_MARKER_KEY: &str = "documentUploaded";

const MARKER_VALUE: &str = "true";

#[derive(Debug)]
pub struct ContentRegistry<S: DurableStore> {
    items: Vec<ContentItem>,
    store: S,
}

impl<S: DurableStore> ContentRegistry<S> {
    /// Rebuild the registry from the store. A missing or unreadable record yields
    /// an empty registry.
    pub fn hydrate(store: S) -> Self {
        let items = match store.get(CONTENT_HISTORY_KEY) {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<ContentItem>>(&raw) {
                Ok(items) => dedupe_ids(items),
                Err(err) => {
                    pilot_warn!("Discarding corrupt content history record: {}", err);
                    Vec::new()
                }
            },
        };
        pilot_info!("Hydrated content registry with {} item(s)", items.len());
        Self { items, store }
    }

    /// Replace the list with one active item per seed entry, in seed order.
    pub fn initialize(&mut self, seed: impl IntoIterator<Item = ContentSeed>) {
        self.items.clear();
        for entry in seed {
            let id = self.fresh_id();
            self.items.push(ContentItem::new(id, entry.kind, entry.name));
        }
        self.persist();
    }

    pub fn add(&mut self, kind: ContentKind, name: impl Into<String>) -> ContentId {
        let id = self.fresh_id();
        let item = ContentItem::new(id.clone(), kind, name);
        pilot_debug!("Registering {:?} '{}' as {}", item.kind, item.name, item.id);
        self.items.push(item);
        self.persist();
        id
    }

    /// Flip the activation flag. Returns the new value, or `None` if the id is unknown.
    pub fn toggle_active(&mut self, id: &ContentId) -> Option<bool> {
        let item = self.items.iter_mut().find(|item| &item.id == id)?;
        item.active = !item.active;
        let active = item.active;
        self.persist();
        Some(active)
    }

    pub fn remove(&mut self, id: &ContentId) -> Option<ContentItem> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        let removed = self.items.remove(index);
        self.persist();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Items in insertion order.
    pub fn list(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn get(&self, id: &ContentId) -> Option<&ContentItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn active_items(&self) -> impl Iterator<Item = &ContentItem> {
        self.items.iter().filter(|item| item.active)
    }

    pub fn has_active_content(&self) -> bool {
        self.items.iter().any(|item| item.active)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ingested_marker(&self) -> bool {
        self.store.get(INGESTED_MARKER_KEY).is_some()
    }

    pub fn set_ingested_marker(&mut self) {
        if let Err(err) = self.store.set(INGESTED_MARKER_KEY, MARKER_VALUE) {
            pilot_error!("Failed to set ingestion marker: {}", err);
        }
    }

    pub fn clear_ingested_marker(&mut self) {
        if let Err(err) = self.store.remove(INGESTED_MARKER_KEY) {
            pilot_error!("Failed to clear ingestion marker: {}", err);
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn fresh_id(&self) -> ContentId {
        loop {
            let id = ContentId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn persist(&mut self) {
        let encoded = match serde_json::to_string(&self.items) {
            Ok(encoded) => encoded,
            Err(err) => {
                pilot_error!("Failed to encode content history: {}", err);
                return;
            }
        };
        if let Err(err) = self.store.set(CONTENT_HISTORY_KEY, &encoded) {
            pilot_error!("Failed to persist content history: {}", err);
        }
    }
}

fn dedupe_ids(items: Vec<ContentItem>) -> Vec<ContentItem> {
    let mut seen = HashSet::new();
    let before = items.len();
    let kept: Vec<_> = items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect();
    if kept.len() != before {
        pilot_warn!(
            "Dropped {} content item(s) with duplicate ids from history",
            before - kept.len()
        );
    }
    kept
}
