//! In-memory subscriber store.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{page_from, ScanPage, SubscriberStore};
use crate::error::StoreError;
use crate::model::{DeliveryAddress, Subscriber, SubscriberId};

/// Subscriber store backed by a `BTreeMap`. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    subscribers: RwLock<BTreeMap<SubscriberId, DeliveryAddress>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `subscribers`.
    pub fn with_subscribers(subscribers: impl IntoIterator<Item = Subscriber>) -> Self {
        let map = subscribers
            .into_iter()
            .map(|s| (s.subscriber_id, s.delivery_address))
            .collect();
        Self {
            subscribers: RwLock::new(map),
        }
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Look up one subscriber's address.
    pub fn get(&self, subscriber_id: SubscriberId) -> Option<DeliveryAddress> {
        self.subscribers.read().get(&subscriber_id).cloned()
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn scan_page(
        &self,
        after: Option<SubscriberId>,
        limit: usize,
    ) -> Result<ScanPage, StoreError> {
        let lower = match after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };

        let subscribers = self.subscribers.read();
        let items = subscribers
            .range((lower, Bound::Unbounded))
            .map(|(&id, address)| Subscriber::new(id, address.clone()));
        Ok(page_from(items, limit))
    }

    async fn put(&self, subscriber: Subscriber) -> Result<(), StoreError> {
        self.subscribers
            .write()
            .insert(subscriber.subscriber_id, subscriber.delivery_address);
        Ok(())
    }

    async fn delete(&self, subscriber_id: SubscriberId) -> Result<(), StoreError> {
        self.subscribers.write().remove(&subscriber_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryStore::new();
        store.put(Subscriber::new(1, 100)).await.unwrap();
        store.put(Subscriber::new(1, 200)).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1), Some(DeliveryAddress::Chat(200)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::with_subscribers([Subscriber::new(1, 100)]);
        store.delete(1).await.unwrap();
        store.delete(1).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_scan_page_negative_ids_and_cursor() {
        let store = MemoryStore::with_subscribers([
            Subscriber::new(5, 5),
            Subscriber::new(-3, -3),
            Subscriber::new(0, "@zero"),
        ]);

        let first = store.scan_page(None, 2).await.unwrap();
        let ids: Vec<_> = first.subscribers.iter().map(|s| s.subscriber_id).collect();
        assert_eq!(ids, vec![-3, 0]);
        assert_eq!(first.next_after, Some(0));

        let second = store.scan_page(first.next_after, 2).await.unwrap();
        assert_eq!(second.subscribers, vec![Subscriber::new(5, 5)]);
        assert_eq!(second.next_after, None);
    }

    #[tokio::test]
    async fn test_shared_address_allowed() {
        let store = MemoryStore::new();
        store.put(Subscriber::new(1, 77)).await.unwrap();
        store.put(Subscriber::new(2, 77)).await.unwrap();
        assert_eq!(store.scan_all().await.unwrap().len(), 2);
    }
}
