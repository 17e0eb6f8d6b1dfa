//! Free-form exercise history.
//!
//! History entries are logged by the user independently of any schedule and
//! are only ever visible to their owner.

use crate::questionnaire::MAX_PAIN_LEVEL;
use crate::store::RecordStore;
use crate::{Error, HistoryEntry, NewHistoryEntry, Result};
use uuid::Uuid;

/// Record a history entry for the requester
pub fn add_history<S: RecordStore>(
    store: &S,
    entry: NewHistoryEntry,
    requester: Uuid,
) -> Result<HistoryEntry> {
    if entry.user_id != requester {
        return Err(Error::Forbidden(
            "cannot add history for another user".into(),
        ));
    }
    if entry.exercise_name.trim().is_empty() {
        return Err(Error::Validation("exercise_name must not be empty".into()));
    }
    if entry.pain_level > MAX_PAIN_LEVEL {
        return Err(Error::Validation(format!(
            "pain_level {} is above {}",
            entry.pain_level, MAX_PAIN_LEVEL
        )));
    }

    store.transaction(|tables| {
        let stored = HistoryEntry {
            id: Uuid::new_v4(),
            entry,
        };
        tables.history.insert(stored.id, stored.clone());

        tracing::info!(
            "Logged '{}' for {} ({}s)",
            stored.entry.exercise_name,
            requester,
            stored.entry.duration_seconds
        );
        Ok(stored)
    })
}

/// A user's history, newest first
pub fn list_history<S: RecordStore>(
    store: &S,
    user_id: Uuid,
    requester: Uuid,
) -> Result<Vec<HistoryEntry>> {
    if user_id != requester {
        return Err(Error::Forbidden(
            "cannot read another user's history".into(),
        ));
    }

    store.read(|tables| {
        let mut entries: Vec<HistoryEntry> = tables
            .history
            .values()
            .filter(|h| h.entry.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.entry.performed_at.cmp(&a.entry.performed_at));
        Ok(entries)
    })
}

/// Delete one of the requester's history entries
pub fn delete_history<S: RecordStore>(store: &S, id: Uuid, requester: Uuid) -> Result<()> {
    store.transaction(|tables| {
        let owner = tables
            .history
            .get(&id)
            .map(|h| h.entry.user_id)
            .ok_or_else(|| Error::NotFound(format!("History entry {}", id)))?;

        if owner != requester {
            return Err(Error::Forbidden(
                "cannot delete another user's history".into(),
            ));
        }

        tables.history.remove(&id);
        tracing::info!("Deleted history entry {}", id);
        Ok(())
    })
}
