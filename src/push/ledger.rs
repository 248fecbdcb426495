use crate::error::StoreError;
use crate::ports::store::{self, NOTIFICATIONS_KEY, Store};
use crate::types::push::Notification;

use std::sync::{Arc, Mutex};

/// Bounded, most-recent-first notification history.
pub(crate) struct NotificationLedger {
    store: Arc<dyn Store>,
    max: usize,
    notifications: Mutex<Vec<Notification>>,
}

impl NotificationLedger {
    pub(crate) fn load(store: Arc<dyn Store>, max: usize) -> Result<Self, StoreError> {
        let mut notifications: Vec<Notification> =
            store::load_collection(store.as_ref(), NOTIFICATIONS_KEY)?;
        notifications.truncate(max);
        Ok(Self {
            store,
            max,
            notifications: Mutex::new(notifications),
        })
    }

    /// Inserts at the head and evicts from the tail in one step.
    pub(crate) fn record(&self, notification: Notification) -> Result<(), StoreError> {
        let mut guard = self.notifications.lock().expect("notification ledger lock");
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.push(notification);
        next.extend(guard.iter().cloned());
        next.truncate(self.max);
        store::replace_collection(self.store.as_ref(), NOTIFICATIONS_KEY, &next)?;
        *guard = next;
        Ok(())
    }

    pub(crate) fn list(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("notification ledger lock")
            .clone()
    }

    pub(crate) fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.notifications.lock().expect("notification ledger lock");
        store::replace_collection::<Notification>(self.store.as_ref(), NOTIFICATIONS_KEY, &[])?;
        guard.clear();
        Ok(())
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use time::OffsetDateTime;

    fn notification(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            title: "Notification".to_string(),
            message: format!("message {id}"),
            url: None,
            data: None,
            timestamp: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn ids(ledger: &NotificationLedger) -> Vec<String> {
        ledger.list().into_iter().map(|n| n.id).collect()
    }

    #[test]
    fn record__should_evict_oldest_beyond_capacity() {
        // Given
        let ledger = NotificationLedger::load(Arc::new(MemoryStore::default()), 2).expect("load");

        // When
        ledger.record(notification("A")).expect("record A");
        ledger.record(notification("B")).expect("record B");
        ledger.record(notification("C")).expect("record C");

        // Then
        assert_eq!(ids(&ledger), vec!["C", "B"]);
    }

    #[test]
    fn record__should_never_exceed_capacity() {
        // Given
        let ledger = NotificationLedger::load(Arc::new(MemoryStore::default()), 3).expect("load");

        // When / Then
        for i in 0..10 {
            ledger.record(notification(&i.to_string())).expect("record");
            assert!(ledger.list().len() <= 3);
        }
        assert_eq!(ids(&ledger), vec!["9", "8", "7"]);
    }

    #[test]
    fn record__should_persist_to_store() {
        // Given
        let store = Arc::new(MemoryStore::default());
        let ledger = NotificationLedger::load(store.clone(), 10).expect("load");

        // When
        ledger.record(notification("A")).expect("record A");
        ledger.record(notification("B")).expect("record B");

        // Then
        let reloaded = NotificationLedger::load(store, 10).expect("reload");
        assert_eq!(ids(&reloaded), vec!["B", "A"]);
    }

    #[test]
    fn clear__should_empty_ledger_and_store() {
        // Given
        let store = Arc::new(MemoryStore::default());
        let ledger = NotificationLedger::load(store.clone(), 10).expect("load");
        ledger.record(notification("A")).expect("record A");

        // When
        ledger.clear().expect("clear");

        // Then
        assert!(ledger.list().is_empty());
        assert!(store.load(NOTIFICATIONS_KEY).expect("load").is_empty());
    }
}
