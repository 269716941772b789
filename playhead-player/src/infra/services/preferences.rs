use async_trait::async_trait;
use dashmap::DashMap;
use playhead_model::{ItemId, TrackSelection, UserId};

use super::{PreferenceStore, ServiceResult};

/// Process-local preference store, for hosts without persistent storage.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: DashMap<(UserId, ItemId), TrackSelection>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: UserId, item_id: ItemId) -> Option<TrackSelection> {
        self.entries.get(&(user_id, item_id)).map(|entry| *entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn load(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> ServiceResult<Option<TrackSelection>> {
        Ok(self.get(user_id, item_id))
    }

    async fn save(
        &self,
        user_id: UserId,
        item_id: ItemId,
        selection: TrackSelection,
    ) -> ServiceResult<()> {
        self.entries.insert((user_id, item_id), selection);
        Ok(())
    }
}
