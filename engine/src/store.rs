//! Document store contract and the in-memory implementation.
//!
//! A store is a dumb persistence layer: it knows about collections,
//! documents and field-equality filters, and nothing about allocation rules.

use crate::{Collection, Document, DocumentId, Filter, StoreError, StoredDocument};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence accessor for the three named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return its generated identifier.
    async fn insert_one(&self, collection: Collection, doc: Document) -> StoreResult<DocumentId>;

    /// First document matching `filter`, in store-native order.
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> StoreResult<Option<StoredDocument>>;

    /// All documents matching `filter`, in store-native order, up to `limit`.
    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<StoredDocument>>;

    /// Fetch a document by identifier.
    async fn find_by_id(
        &self,
        collection: Collection,
        id: &DocumentId,
    ) -> StoreResult<Option<StoredDocument>>;

    /// Replace the body of a document. Returns `false` when no document matched.
    async fn update_by_id(
        &self,
        collection: Collection,
        id: &DocumentId,
        doc: Document,
    ) -> StoreResult<bool>;

    /// Delete a document by identifier. Returns the number of deleted documents.
    async fn delete_by_id(&self, collection: Collection, id: &DocumentId) -> StoreResult<u64>;

    /// Delete the first document matching `filter`. Returns the deleted count.
    async fn delete_one(&self, collection: Collection, filter: &Filter) -> StoreResult<u64>;

    /// Number of documents matching `filter`.
    async fn count(&self, collection: Collection, filter: &Filter) -> StoreResult<u64>;

    /// Next value of the per-collection integer sequence, starting at 1.
    async fn next_sequence(&self, collection: Collection) -> StoreResult<i64>;
}

/// One collection held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
struct MemoryCollection {
    documents: Vec<StoredDocument>,
    sequence: i64,
}

impl MemoryCollection {
    fn position(&self, id: &DocumentId) -> Option<usize> {
        self.documents.iter().position(|d| &d.id == id)
    }

    fn matching<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a StoredDocument> {
        self.documents.iter().filter(move |d| filter.matches(&d.body))
    }
}

/// Process-local store, used for development and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let collections = Collection::ALL
            .into_iter()
            .map(|c| (c, MemoryCollection::default()))
            .collect();

        Self {
            collections: RwLock::new(collections),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: Collection, doc: Document) -> StoreResult<DocumentId> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection).or_default();

        let id = DocumentId::generate();
        coll.documents.push(StoredDocument {
            id: id.clone(),
            body: doc,
        });
        Ok(id)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> StoreResult<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|c| c.matching(filter).next().cloned()))
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        let Some(coll) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let matching = coll.matching(filter).cloned();
        Ok(match limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &DocumentId,
    ) -> StoreResult<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|c| c.documents.iter().find(|d| &d.id == id).cloned()))
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &DocumentId,
        doc: Document,
    ) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(&collection) else {
            return Ok(false);
        };

        match coll.position(id) {
            Some(pos) => {
                coll.documents[pos].body = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_id(&self, collection: Collection, id: &DocumentId) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(&collection) else {
            return Ok(0);
        };

        match coll.position(id) {
            Some(pos) => {
                coll.documents.remove(pos);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(&collection) else {
            return Ok(0);
        };

        match coll.documents.iter().position(|d| filter.matches(&d.body)) {
            Some(pos) => {
                coll.documents.remove(pos);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|c| c.matching(filter).count() as u64)
            .unwrap_or(0))
    }

    async fn next_sequence(&self, collection: Collection) -> StoreResult<i64> {
        let mut collections = self.collections.write().await;
        let coll = collections.entry(collection).or_default();
        coll.sequence += 1;
        Ok(coll.sequence)
    }
}
