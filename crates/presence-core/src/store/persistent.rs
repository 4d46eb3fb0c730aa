//! sled-backed subscriber store.

use std::ops::Bound;
use std::path::PathBuf;

use async_trait::async_trait;
use sled::{Db, Tree};

use super::{fetch_count, page_from, ScanPage, SubscriberStore};
use crate::error::StoreError;
use crate::model::{DeliveryAddress, Subscriber, SubscriberId};

/// Tree holding `subscriber_id -> delivery address`.
const SUBSCRIBERS_TREE: &str = "subscribers";

/// Width of an encoded subscriber key.
const KEY_SIZE: usize = 8;

/// Configuration for [`SledStore`].
#[derive(Debug, Clone)]
pub struct SledStoreConfig {
    /// Path to the database directory.
    pub path: PathBuf,

    /// Page cache capacity in bytes.
    pub cache_capacity: u64,

    /// Flush to disk after every write instead of on sled's timer.
    pub flush_on_write: bool,

    /// Temporary database (deleted on drop).
    pub temporary: bool,
}

impl Default for SledStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./presence_data"),
            cache_capacity: 64 * 1024 * 1024, // 64MB
            flush_on_write: true,
            temporary: false,
        }
    }
}

impl SledStoreConfig {
    /// Create a new configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a temporary configuration for testing.
    pub fn temporary() -> Self {
        Self {
            path: PathBuf::from(""),
            temporary: true,
            ..Default::default()
        }
    }

    /// Set whether every write is flushed before returning.
    pub fn with_flush_on_write(mut self, flush: bool) -> Self {
        self.flush_on_write = flush;
        self
    }

    fn to_sled_config(&self) -> sled::Config {
        let config = sled::Config::new()
            .cache_capacity(self.cache_capacity)
            .use_compression(true);

        if self.temporary {
            config.temporary(true)
        } else {
            config.path(&self.path)
        }
    }
}

/// Subscriber store persisted in a sled tree.
///
/// Keys are the subscriber id as big-endian bytes with the sign bit flipped,
/// so byte order matches numeric order and range scans come back sorted.
/// Values are the JSON-encoded [`DeliveryAddress`].
pub struct SledStore {
    db: Db,
    tree: Tree,
    flush_on_write: bool,
}

impl SledStore {
    /// Open or create a store.
    pub fn open(config: SledStoreConfig) -> Result<Self, StoreError> {
        let db = config.to_sled_config().open()?;
        let tree = db.open_tree(SUBSCRIBERS_TREE)?;

        tracing::debug!(
            path = %config.path.display(),
            recovered = db.was_recovered(),
            subscribers = tree.len(),
            "subscriber store opened"
        );

        Ok(Self {
            db,
            tree,
            flush_on_write: config.flush_on_write,
        })
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    /// Flush the tree on the blocking pool when `flush_on_write` is set.
    async fn after_write(&self) -> Result<(), StoreError> {
        if !self.flush_on_write {
            return Ok(());
        }

        let tree = self.tree.clone();
        tokio::task::spawn_blocking(move || tree.flush())
            .await
            .map_err(|e| StoreError::Unavailable(format!("flush task failed: {e}")))??;
        Ok(())
    }
}

fn encode_key(id: SubscriberId) -> [u8; KEY_SIZE] {
    ((id as u64) ^ (1 << 63)).to_be_bytes()
}

fn decode_key(bytes: &[u8]) -> Result<SubscriberId, StoreError> {
    let raw: [u8; KEY_SIZE] = bytes
        .try_into()
        .map_err(|_| StoreError::InvalidKey(bytes.len()))?;
    Ok((u64::from_be_bytes(raw) ^ (1 << 63)) as i64)
}

fn decode_entry(key: &[u8], value: &[u8]) -> Result<Subscriber, StoreError> {
    let subscriber_id = decode_key(key)?;
    let delivery_address: DeliveryAddress = serde_json::from_slice(value)?;
    Ok(Subscriber {
        subscriber_id,
        delivery_address,
    })
}

#[async_trait]
impl SubscriberStore for SledStore {
    async fn scan_page(
        &self,
        after: Option<SubscriberId>,
        limit: usize,
    ) -> Result<ScanPage, StoreError> {
        let lower = match after {
            Some(id) => Bound::Excluded(encode_key(id)),
            None => Bound::Unbounded,
        };

        let mut entries = Vec::with_capacity(fetch_count(limit).min(1024));
        for item in self
            .tree
            .range::<[u8; KEY_SIZE], _>((lower, Bound::Unbounded))
            .take(fetch_count(limit))
        {
            let (key, value) = item?;
            entries.push(decode_entry(&key, &value)?);
        }

        Ok(page_from(entries, limit))
    }

    async fn put(&self, subscriber: Subscriber) -> Result<(), StoreError> {
        let value = serde_json::to_vec(&subscriber.delivery_address)?;
        self.tree
            .insert(encode_key(subscriber.subscriber_id), value)?;
        self.after_write().await
    }

    async fn delete(&self, subscriber_id: SubscriberId) -> Result<(), StoreError> {
        self.tree.remove(encode_key(subscriber_id))?;
        self.after_write().await
    }
}
