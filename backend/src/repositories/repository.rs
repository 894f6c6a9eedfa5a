//! Typed access to one collection with load-mutate-save serialised per collection.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{marker::PhantomData, sync::Arc};
use tokio::sync::{Mutex, MutexGuard};

use crate::db::{Collection, DocumentStore, StoreError};

/// A whole collection persisted as one document.
pub trait Document: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Repairs structural invariants after loading.
    fn normalize(&mut self) {}

    /// Recovers the readable records of a document that failed to decode as a whole.
    fn salvage(_raw: &Value) -> Option<Self> {
        None
    }
}

pub struct Repository<D> {
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
    _document: PhantomData<fn() -> D>,
}

impl<D: Document> Repository<D> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            _document: PhantomData,
        }
    }

    /// Snapshot read without taking the collection lock.
    pub async fn read(&self) -> Result<D, StoreError> {
        load_document(self.store.as_ref()).await
    }

    /// Exclusive access for a load-mutate-save sequence. Released on drop.
    pub async fn lock(&self) -> RepositoryGuard<'_, D> {
        RepositoryGuard {
            store: self.store.as_ref(),
            _guard: self.write_lock.lock().await,
            _document: PhantomData,
        }
    }
}

pub struct RepositoryGuard<'a, D> {
    store: &'a dyn DocumentStore,
    _guard: MutexGuard<'a, ()>,
    _document: PhantomData<fn() -> D>,
}

impl<D: Document> RepositoryGuard<'_, D> {
    pub async fn load(&self) -> Result<D, StoreError> {
        load_document(self.store).await
    }

    pub async fn save(&self, document: &D) -> Result<(), StoreError> {
        let value = serde_json::to_value(document)?;
        self.store.save(D::COLLECTION.key(), &value).await?;
        tracing::debug!(collection = %D::COLLECTION, "Saved collection");
        Ok(())
    }
}

async fn load_document<D: Document>(store: &dyn DocumentStore) -> Result<D, StoreError> {
    let raw = store.load(D::COLLECTION.key()).await?;
    let mut document = decode::<D>(raw);
    document.normalize();
    Ok(document)
}

fn decode<D: Document>(raw: Value) -> D {
    if raw.is_null() {
        return D::default();
    }
    match D::deserialize(&raw) {
        Ok(document) => document,
        Err(err) => match D::salvage(&raw) {
            Some(document) => {
                tracing::warn!(
                    collection = %D::COLLECTION,
                    error = %err,
                    "Collection partially unreadable; kept the readable records"
                );
                document
            }
            None => {
                tracing::warn!(
                    collection = %D::COLLECTION,
                    error = %err,
                    "Unreadable collection replaced with an empty one"
                );
                D::default()
            }
        },
    }
}

/// Decodes every value of a JSON object on its own, dropping the ones that fail.
pub(crate) fn salvage_object<T: DeserializeOwned>(
    collection: Collection,
    raw: &Value,
) -> Option<Vec<(String, T)>> {
    let object = raw.as_object()?;
    Some(
        object
            .iter()
            .filter_map(|(key, value)| {
                salvage_one(collection, key, value).map(|item| (key.clone(), item))
            })
            .collect(),
    )
}

/// Decodes every element of a JSON array on its own, dropping the ones that fail.
pub(crate) fn salvage_array<T: DeserializeOwned>(
    collection: Collection,
    raw: &Value,
) -> Option<Vec<T>> {
    let items = raw.as_array()?;
    Some(
        items
            .iter()
            .enumerate()
            .filter_map(|(index, value)| salvage_one(collection, &index.to_string(), value))
            .collect(),
    )
}

fn salvage_one<T: DeserializeOwned>(
    collection: Collection,
    key: &str,
    value: &Value,
) -> Option<T> {
    match T::deserialize(value) {
        Ok(item) => Some(item),
        Err(err) => {
            tracing::warn!(
                collection = %collection,
                key,
                error = %err,
                "Dropped unreadable record"
            );
            None
        }
    }
}
