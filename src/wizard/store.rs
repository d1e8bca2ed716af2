//! Selections store: holds the in-progress Selections for one wizard session.

use tokio::sync::watch;

use super::model::{Selections, SelectionsUpdate};

/// Owns the current [`Selections`] and publishes every new snapshot to
/// subscribers. Accepts any input; completeness is judged by the sequencer.
#[derive(Debug)]
pub struct SelectionsStore {
    current: Selections,
    tx: watch::Sender<Selections>,
}

impl Default for SelectionsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionsStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Selections::default());
        Self {
            current: Selections::default(),
            tx,
        }
    }

    /// Read-only view of the current selections.
    pub fn get(&self) -> &Selections {
        &self.current
    }

    /// Owned copy of the current selections.
    pub fn snapshot(&self) -> Selections {
        self.current.clone()
    }

    /// Merge a partial update into the current selections.
    pub fn update(&mut self, update: SelectionsUpdate) {
        self.current.apply(update);
        self.publish();
    }

    /// Clear every field.
    pub fn reset(&mut self) {
        self.current = Selections::default();
        self.publish();
    }

    /// Receiver that always observes the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Selections> {
        self.tx.subscribe()
    }

    fn publish(&self) {
        // No receivers is fine; the value is kept for later subscribers.
        self.tx.send_replace(self.current.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::model::{Plan, WebsiteType};

    #[test]
    fn starts_empty() {
        let store = SelectionsStore::new();
        assert_eq!(store.get(), &Selections::default());
    }

    #[test]
    fn update_sequence_keeps_last_write_per_field() {
        let mut store = SelectionsStore::new();
        store.update(SelectionsUpdate::default().theme("classic"));
        store.update(SelectionsUpdate::default().website_type(WebsiteType::Blog));
        store.update(SelectionsUpdate::default().theme("modern").plan(Plan::Basic));
        store.update(SelectionsUpdate::default());

        let s = store.snapshot();
        assert_eq!(s.theme.as_deref(), Some("modern"));
        assert_eq!(s.website_type, Some(WebsiteType::Blog));
        assert_eq!(s.plan, Some(Plan::Basic));
        assert!(s.description.is_none());
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = SelectionsStore::new();
        store.update(SelectionsUpdate::default().theme("modern").domain_name("a.io"));
        store.reset();
        assert_eq!(store.get(), &Selections::default());
    }

    #[tokio::test]
    async fn subscribers_see_new_snapshots() {
        let mut store = SelectionsStore::new();
        let mut rx = store.subscribe();

        store.update(SelectionsUpdate::default().domain_name("example.com"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().domain_name.as_deref(), Some("example.com"));

        store.reset();
        rx.changed().await.unwrap();
        assert!(rx.borrow().domain_name.is_none());
    }

    #[test]
    fn late_subscriber_gets_current_value() {
        let mut store = SelectionsStore::new();
        store.update(SelectionsUpdate::default().theme("modern"));
        let rx = store.subscribe();
        assert_eq!(rx.borrow().theme.as_deref(), Some("modern"));
    }
}
