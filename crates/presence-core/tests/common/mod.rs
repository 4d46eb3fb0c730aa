//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use presence_core::{
    DeliveryAddress, MemoryStore, MessageSink, ScanPage, SinkError, StoreError, Subscriber,
    SubscriberId, SubscriberStore,
};

/// A store mutation as seen by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put(Subscriber),
    Delete(SubscriberId),
}

/// Memory store that records every mutation and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<StoreCall>>,
    fail_writes: bool,
    fail_scans: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscribers(subscribers: impl IntoIterator<Item = Subscriber>) -> Self {
        Self {
            inner: MemoryStore::with_subscribers(subscribers),
            ..Default::default()
        }
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn failing_scans(mut self) -> Self {
        self.fail_scans = true;
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl SubscriberStore for RecordingStore {
    async fn scan_page(
        &self,
        after: Option<SubscriberId>,
        limit: usize,
    ) -> Result<ScanPage, StoreError> {
        if self.fail_scans {
            return Err(StoreError::Unavailable("scan throttled".to_string()));
        }
        self.inner.scan_page(after, limit).await
    }

    async fn put(&self, subscriber: Subscriber) -> Result<(), StoreError> {
        self.calls.lock().push(StoreCall::Put(subscriber.clone()));
        if self.fail_writes {
            return Err(StoreError::Unavailable("put throttled".to_string()));
        }
        self.inner.put(subscriber).await
    }

    async fn delete(&self, subscriber_id: SubscriberId) -> Result<(), StoreError> {
        self.calls.lock().push(StoreCall::Delete(subscriber_id));
        if self.fail_writes {
            return Err(StoreError::Unavailable("delete throttled".to_string()));
        }
        self.inner.delete(subscriber_id).await
    }
}

/// Sink that records every attempt and fails for chosen addresses.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(DeliveryAddress, String)>>,
    failing: HashSet<DeliveryAddress>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(addresses: impl IntoIterator<Item = DeliveryAddress>) -> Self {
        Self {
            failing: addresses.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Every attempted send, including failed ones.
    pub fn sent(&self) -> Vec<(DeliveryAddress, String)> {
        self.sent.lock().clone()
    }

    pub fn texts_for(&self, address: &DeliveryAddress) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| to == address)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, address: &DeliveryAddress, text: &str) -> Result<(), SinkError> {
        self.sent.lock().push((address.clone(), text.to_string()));
        if self.failing.contains(address) {
            return Err(SinkError::Status(403));
        }
        Ok(())
    }
}
