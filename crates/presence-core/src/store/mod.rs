//! Subscriber storage.
//!
//! The router and the fan-out engine only see the [`SubscriberStore`] trait.
//! Two backends are provided: an in-memory map and a sled tree.

mod memory;
mod persistent;

pub use memory::MemoryStore;
pub use persistent::{SledStore, SledStoreConfig};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Subscriber, SubscriberId};

/// Page size used by [`SubscriberStore::scan_all`].
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 500;

/// One page of a subscriber scan, ordered by subscriber id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Subscribers in this page.
    pub subscribers: Vec<Subscriber>,
    /// Cursor for the next page; `None` when the scan is complete.
    pub next_after: Option<SubscriberId>,
}

/// Keyed table of subscribers.
///
/// `put` is an upsert and `delete` of a missing key succeeds, so both are
/// idempotent per key.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Return up to `limit` subscribers with ids greater than `after`.
    ///
    /// A `limit` of zero is treated as one, so a non-final page is never empty.
    async fn scan_page(
        &self,
        after: Option<SubscriberId>,
        limit: usize,
    ) -> Result<ScanPage, StoreError>;

    /// Insert or overwrite a subscriber.
    async fn put(&self, subscriber: Subscriber) -> Result<(), StoreError>;

    /// Remove a subscriber.
    async fn delete(&self, subscriber_id: SubscriberId) -> Result<(), StoreError>;

    /// Every subscriber, following pages until the scan is complete.
    async fn scan_all(&self) -> Result<Vec<Subscriber>, StoreError> {
        let mut subscribers = Vec::new();
        let mut after = None;

        loop {
            let page = self.scan_page(after, DEFAULT_SCAN_PAGE_SIZE).await?;
            let progressed = !page.subscribers.is_empty();
            subscribers.extend(page.subscribers);

            match page.next_after {
                Some(cursor) if progressed => after = Some(cursor),
                _ => break,
            }
        }

        Ok(subscribers)
    }
}

/// Number of items a backend reads to fill a page of `limit`: the page plus
/// one lookahead item.
pub(crate) fn fetch_count(limit: usize) -> usize {
    limit.max(1).saturating_add(1)
}

/// Build a page from an id-ordered iterator of at least [`fetch_count`] items
/// when more remain.
pub(crate) fn page_from<I>(items: I, limit: usize) -> ScanPage
where
    I: IntoIterator<Item = Subscriber>,
{
    let limit = limit.max(1);
    let mut subscribers: Vec<Subscriber> = items.into_iter().take(fetch_count(limit)).collect();
    let has_more = subscribers.len() > limit;
    subscribers.truncate(limit);

    let next_after = if has_more {
        subscribers.last().map(|s| s.subscriber_id)
    } else {
        None
    };

    ScanPage {
        subscribers,
        next_after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscribers(ids: &[i64]) -> Vec<Subscriber> {
        ids.iter().map(|&id| Subscriber::new(id, id * 10)).collect()
    }

    #[test]
    fn test_page_from_with_more() {
        let page = page_from(subscribers(&[1, 2, 3]), 2);
        assert_eq!(page.subscribers, subscribers(&[1, 2]));
        assert_eq!(page.next_after, Some(2));
    }

    #[test]
    fn test_page_from_last_page() {
        let page = page_from(subscribers(&[1, 2]), 2);
        assert_eq!(page.subscribers.len(), 2);
        assert_eq!(page.next_after, None);

        let empty = page_from(Vec::new(), 2);
        assert_eq!(empty, ScanPage::default());
    }

    #[test]
    fn test_page_from_limit_edges() {
        let page = page_from(subscribers(&[1, 2]), usize::MAX);
        assert_eq!(page.subscribers, subscribers(&[1, 2]));
        assert_eq!(page.next_after, None);

        let page = page_from(subscribers(&[1, 2]), 0);
        assert_eq!(page.subscribers, subscribers(&[1]));
        assert_eq!(page.next_after, Some(1));
    }

    #[tokio::test]
    async fn test_scan_page_limit_edges() {
        let store = MemoryStore::with_subscribers(subscribers(&[1, 2]));

        let all = store.scan_page(None, usize::MAX).await.unwrap();
        assert_eq!(all.subscribers, subscribers(&[1, 2]));
        assert_eq!(all.next_after, None);

        let first = store.scan_page(None, 0).await.unwrap();
        assert_eq!(first.subscribers, subscribers(&[1]));
        assert_eq!(first.next_after, Some(1));

        let sled = SledStore::open(SledStoreConfig::temporary()).unwrap();
        for subscriber in subscribers(&[1, 2]) {
            sled.put(subscriber).await.unwrap();
        }
        let first = sled.scan_page(None, 0).await.unwrap();
        assert_eq!(first.subscribers, subscribers(&[1]));
        assert_eq!(first.next_after, Some(1));
        let all = sled.scan_page(None, usize::MAX).await.unwrap();
        assert_eq!(all.subscribers.len(), 2);
        assert_eq!(all.next_after, None);
    }

    #[tokio::test]
    async fn test_scan_all_follows_pages() {
        let store = MemoryStore::new();
        for id in 0..(DEFAULT_SCAN_PAGE_SIZE as i64 * 2 + 7) {
            store.put(Subscriber::new(id, id)).await.unwrap();
        }

        let all = store.scan_all().await.unwrap();
        assert_eq!(all.len(), DEFAULT_SCAN_PAGE_SIZE * 2 + 7);
        assert!(all.windows(2).all(|w| w[0].subscriber_id < w[1].subscriber_id));
    }
}
