use std::sync::{Arc, Mutex, PoisonError};

use crate::errors::RemoteStoreError;
use crate::log_record::Document;

/// Collection every ecosystem log record is appended to
pub const LOG_COLLECTION: &str = "ecosystem_logs";

/// Append-only document service used as an observability sink.
///
/// Implementations are shared read-only across loggers and may be called
/// from many threads at once. Any timeout is the implementation's concern.
pub trait RemoteStore: Send + Sync {
    fn append(&self, collection: &str, document: &Document) -> Result<(), RemoteStoreError>;
}

/// Shared handle to a remote store, handed to every logger at construction
pub type RemoteHandle = Arc<dyn RemoteStore>;

/// Remote store that keeps appended documents in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<(String, Document)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every appended `(collection, document)` pair, in append order
    pub fn documents(&self) -> Vec<(String, Document)> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn documents_in(&self, collection: &str) -> Vec<Document> {
        self.documents()
            .into_iter()
            .filter(|(name, _)| name == collection)
            .map(|(_, doc)| doc)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RemoteStore for MemoryStore {
    fn append(&self, collection: &str, document: &Document) -> Result<(), RemoteStoreError> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((collection.to_string(), document.clone()));
        Ok(())
    }
}
