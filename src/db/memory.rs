//! In-process review store, for embedding and tests.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::{ItemRecord, ReviewLog};
use crate::error::{Error, Result};

use super::ReviewStore;

#[derive(Debug, Default)]
struct MemoryState {
    items: BTreeMap<String, ItemRecord>,
    logs: Vec<ReviewLog>,
    last_log_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| Error::LockPoisoned)
    }
}

impl ReviewStore for MemoryStore {
    fn get_item(&self, id: &str) -> Result<Option<ItemRecord>> {
        Ok(self.lock()?.items.get(id).cloned())
    }

    fn insert_item(&self, record: &ItemRecord) -> Result<()> {
        let mut state = self.lock()?;
        if state.items.contains_key(&record.id) {
            return Err(Error::AlreadyExists(record.id.clone()));
        }
        state.items.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn save_item(&self, record: &ItemRecord) -> Result<()> {
        let mut state = self.lock()?;
        match state.items.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(Error::NotFound(record.id.clone())),
        }
    }

    fn delete_item(&self, id: &str) -> Result<bool> {
        let mut state = self.lock()?;
        state.logs.retain(|log| log.item_id != id);
        Ok(state.items.remove(id).is_some())
    }

    fn due_items(&self, now: &DateTime<Utc>, limit: usize) -> Result<Vec<ItemRecord>> {
        let state = self.lock()?;
        let mut due: Vec<ItemRecord> = state
            .items
            .values()
            .filter(|record| record.is_due_at(now))
            .cloned()
            .collect();
        // BTreeMap iteration already orders ties by id; sort_by_key is stable
        due.sort_by_key(|record| record.next_review);
        due.truncate(limit);
        Ok(due)
    }

    fn all_items(&self) -> Result<Vec<ItemRecord>> {
        Ok(self.lock()?.items.values().cloned().collect())
    }

    fn insert_review_log(&self, log: &ReviewLog) -> Result<i64> {
        let mut state = self.lock()?;
        state.last_log_id += 1;
        let id = state.last_log_id;
        state.logs.push(ReviewLog { id, ..log.clone() });
        Ok(id)
    }

    fn review_logs(&self, item_id: &str) -> Result<Vec<ReviewLog>> {
        let state = self.lock()?;
        let mut logs: Vec<ReviewLog> = state
            .logs
            .iter()
            .filter(|log| log.item_id == item_id)
            .cloned()
            .collect();
        logs.sort_by_key(|log| (log.reviewed_at, log.id));
        Ok(logs)
    }
}
