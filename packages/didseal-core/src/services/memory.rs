//! In-memory collaborators
//!
//! Back the tests and the CLI. Nothing here survives the process.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::{DidResolver, MetadataStore, ObjectStore};
use crate::crypto::{PlaintextHash, StorageObjectId};
use crate::did::Did;
use crate::error::{Error, Result};

/// Default URL prefix for [`MemoryObjectStore`]
pub const DEFAULT_BASE_URL: &str = "memory://objects";

/// Object store backed by a `HashMap`
pub struct MemoryObjectStore {
    base_url: String,
    objects: RwLock<HashMap<StorageObjectId, Vec<u8>>>,
}

impl MemoryObjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create an empty store whose URLs start with `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Whether an object exists
    pub fn contains(&self, id: &StorageObjectId) -> bool {
        self.objects.read().contains_key(id)
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(&self, bytes: Vec<u8>, id: &StorageObjectId) -> Result<String> {
        self.objects.write().insert(id.clone(), bytes);
        Ok(format!("{}/{}", self.base_url, id))
    }

    async fn get_object(&self, id: &StorageObjectId) -> Result<Vec<u8>> {
        self.objects
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::StorageNotFound(format!("object {}", id)))
    }
}

/// Metadata store backed by a `HashMap`
#[derive(Default)]
pub struct MemoryMetadataStore {
    hashes: RwLock<HashMap<StorageObjectId, PlaintextHash>>,
}

impl MemoryMetadataStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded digests
    pub fn len(&self) -> usize {
        self.hashes.read().len()
    }

    /// Check if no digest has been recorded
    pub fn is_empty(&self) -> bool {
        self.hashes.read().is_empty()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn record_plaintext_hash(
        &self,
        id: &StorageObjectId,
        hash: &PlaintextHash,
    ) -> Result<()> {
        self.hashes.write().insert(id.clone(), hash.clone());
        Ok(())
    }

    async fn plaintext_hash(&self, id: &StorageObjectId) -> Result<Option<PlaintextHash>> {
        Ok(self.hashes.read().get(id).cloned())
    }
}

/// Resolver that serves pre-loaded DID documents
#[derive(Default)]
pub struct StaticDidResolver {
    documents: RwLock<HashMap<String, Value>>,
}

impl StaticDidResolver {
    /// Create a resolver with no documents
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `document` for `did`, replacing any earlier one
    pub fn insert(&self, did: &Did, document: Value) {
        self.documents.write().insert(did.to_string(), document);
    }
}

#[async_trait]
impl DidResolver for StaticDidResolver {
    async fn resolve_did(&self, did: &Did) -> Result<Value> {
        self.documents
            .read()
            .get(did.as_str())
            .cloned()
            .ok_or_else(|| Error::RemoteRejected(format!("404: DID {} not found", did)))
    }
}
