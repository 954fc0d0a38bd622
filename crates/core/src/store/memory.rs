use std::{
    marker::PhantomData,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};

use super::{decode_documents, Collection, Document};
use crate::error::StoreError;

/// In-process collection backing the service tests.
///
/// Inserts answer with an `insertedId` acknowledgement and updates echo the
/// stored document, matching the two reply shapes the remote backend uses.
pub struct MemoryCollection<T> {
    name: String,
    documents: RwLock<Vec<Value>>,
    failure: RwLock<Option<String>>,
    update_calls: AtomicUsize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> MemoryCollection<T> {
    /// Empty collection with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
            update_calls: AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }

    /// Collection pre-populated with documents.
    pub fn with_documents(
        name: impl Into<String>,
        documents: impl IntoIterator<Item = T>,
    ) -> Result<Self, StoreError> {
        let collection = Self::new(name);
        {
            let mut stored = collection.documents.write();
            for document in documents {
                stored.push(with_id(serde_json::to_value(&document)?));
            }
        }
        Ok(collection)
    }

    /// Make the next call fail with the given backend message.
    pub fn fail_next(&self, message: Option<&str>) {
        *self.failure.write() = Some(message.unwrap_or_default().to_string());
    }

    /// Number of `update_one` calls received so far.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::Relaxed)
    }

    /// Raw stored documents.
    pub fn snapshot(&self) -> Vec<Value> {
        self.documents.read().clone()
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        match self.failure.write().take() {
            Some(message) if message.is_empty() => Err(StoreError::Remote(None)),
            Some(message) => Err(StoreError::Remote(Some(message))),
            None => Ok(()),
        }
    }
}

fn with_id(mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        let has_id = map.get("_id").map(Value::is_string).unwrap_or(false);
        if !has_id {
            map.insert(
                "_id".to_string(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }
    }
    value
}

#[async_trait]
impl<T: Document> Collection<T> for MemoryCollection<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self) -> Result<Vec<T>, StoreError> {
        self.take_failure()?;
        let documents = self.documents.read().clone();
        Ok(decode_documents(&self.name, documents))
    }

    async fn insert_one(&self, document: &T) -> Result<Option<Value>, StoreError> {
        self.take_failure()?;
        let stored = with_id(serde_json::to_value(document)?);
        let id = stored.get("_id").cloned().unwrap_or(Value::Null);
        self.documents.write().push(stored);
        Ok(Some(json!({ "insertedId": id })))
    }

    async fn update_one(&self, id: &str, patch: &Value) -> Result<Option<Value>, StoreError> {
        self.update_calls.fetch_add(1, Ordering::Relaxed);
        self.take_failure()?;
        let mut documents = self.documents.write();
        let target = documents
            .iter_mut()
            .find(|doc| doc.get("_id").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let (Value::Object(stored), Value::Object(fields)) = (&mut *target, patch) {
            for (key, value) in fields {
                stored.insert(key.clone(), value.clone());
            }
        }
        Ok(Some(target.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_update_round() {
        let collection: MemoryCollection<Value> = MemoryCollection::new("rentals");
        let echo = collection
            .insert_one(&json!({"status": "active"}))
            .await
            .unwrap()
            .unwrap();
        let id = echo["insertedId"].as_str().unwrap().to_string();

        let updated = collection
            .update_one(&id, &json!({"status": "returned"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["status"], json!("returned"));
        assert_eq!(collection.update_calls(), 1);

        let err = collection
            .update_one("missing", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let collection: MemoryCollection<Value> = MemoryCollection::new("games");
        collection.fail_next(Some("offline"));
        let err = collection.find().await.unwrap_err();
        assert_eq!(err.remote_message(), Some("offline"));
        assert!(collection.find().await.unwrap().is_empty());
    }
}
