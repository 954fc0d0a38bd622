//! Collection boundary to the document backend.
//!
//! Every record lives in a named remote collection reached through three
//! calls: `find`, `insert_one` and `update_one`. [`HttpCollection`] talks to
//! the real backend and [`MemoryCollection`] keeps documents in process.

mod http;
mod memory;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::StoreError;

pub use http::{ApiClient, HttpCollection};
pub use memory::MemoryCollection;

/// Collection holding the game catalog.
pub const GAMES: &str = "games";
/// Collection holding shop clients.
pub const CLIENTS: &str = "clients";
/// Collection holding rentals.
pub const RENTALS: &str = "rentals";
/// Collection holding the rental audit trail.
pub const RENTAL_EVENTS: &str = "rental_events";

/// A record stored in a collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Backend identifier, if assigned.
    fn id(&self) -> Option<&str>;
}

impl Document for Value {
    fn id(&self) -> Option<&str> {
        self.get("_id").and_then(Value::as_str)
    }
}

/// Remote collection of documents of type `T`.
#[async_trait]
pub trait Collection<T: Document>: Send + Sync {
    /// Collection name on the backend.
    fn name(&self) -> &str;

    /// Fetch every document.
    async fn find(&self) -> Result<Vec<T>, StoreError>;

    /// Insert a document, returning whatever the backend echoed back.
    async fn insert_one(&self, document: &T) -> Result<Option<Value>, StoreError>;

    /// Apply a partial update, returning whatever the backend echoed back.
    async fn update_one(&self, id: &str, patch: &Value) -> Result<Option<Value>, StoreError>;
}

/// Response body shared by every collection call.
///
/// Failures are reported in-band through `error`/`errorMsg` instead of an
/// HTTP status.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Result of `find`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Value>>,
    /// Result of `insert_one` and `update_one`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Value>,
    /// Error flag or error object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Human readable error description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl Envelope {
    /// Successful envelope around a single document.
    pub fn with_document(document: Value) -> Self {
        Self {
            document: Some(document),
            ..Self::default()
        }
    }

    /// Successful envelope around a document list.
    pub fn with_documents(documents: Vec<Value>) -> Self {
        Self {
            documents: Some(documents),
            ..Self::default()
        }
    }

    /// Whether the backend flagged this response as failed.
    pub fn is_error(&self) -> bool {
        match &self.error {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(text)) => !text.is_empty(),
            Some(_) => true,
        }
    }

    /// Convert an in-band failure into a [`StoreError`].
    pub fn into_result(self) -> Result<Self, StoreError> {
        if self.is_error() {
            let message = self.error_msg.clone().or_else(|| match &self.error {
                Some(Value::String(text)) => Some(text.clone()),
                Some(Value::Object(map)) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            });
            return Err(StoreError::Remote(message));
        }
        Ok(self)
    }
}

/// Decode a fetched document list, skipping documents that do not match `T`.
pub fn decode_documents<T: Document>(collection: &str, documents: Vec<Value>) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<T>(raw) {
            Ok(document) => Some(document),
            Err(err) => {
                warn!("Skipping malformed document in {collection}: {err}");
                None
            }
        })
        .collect()
}

/// Identifier carried by an insert or update echo.
///
/// Backends answer either with the stored document (`_id`) or with an
/// acknowledgement (`insertedId`).
pub fn resolve_document_id(document: Option<&Value>) -> Option<String> {
    let object = document?.as_object()?;
    object
        .get("_id")
        .and_then(Value::as_str)
        .or_else(|| object.get("insertedId").and_then(Value::as_str))
        .map(str::to_string)
}

/// Overlay a backend echo on top of a local document.
///
/// Fields present in `echo` win. The id is taken from the echo when it
/// carries one, then from `base`, and is generated locally as a last resort.
pub fn merge_document<T: Document>(base: &T, echo: Option<&Value>) -> Result<T, StoreError> {
    let mut merged = match serde_json::to_value(base)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    if let Some(Value::Object(fields)) = echo {
        for (key, value) in fields {
            if key == "insertedId" {
                continue;
            }
            merged.insert(key.clone(), value.clone());
        }
    }

    let id = resolve_document_id(echo)
        .or_else(|| base.id().map(str::to_string))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    merged.insert("_id".to_string(), Value::String(id));

    Ok(serde_json::from_value(Value::Object(merged))?)
}

/// Apply a JSON patch object field by field.
pub fn apply_patch<T: Document>(base: &T, patch: &Value) -> Result<T, StoreError> {
    let mut merged = match serde_json::to_value(base)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Value::Object(fields) = patch {
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(serde_json::from_value(Value::Object(merged))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_ids_from_either_shape() {
        assert_eq!(
            resolve_document_id(Some(&json!({"_id": "a1"}))).as_deref(),
            Some("a1")
        );
        assert_eq!(
            resolve_document_id(Some(&json!({"insertedId": "b2"}))).as_deref(),
            Some("b2")
        );
        assert_eq!(resolve_document_id(Some(&json!({"_id": 7}))), None);
        assert_eq!(resolve_document_id(Some(&json!("x"))), None);
        assert_eq!(resolve_document_id(None), None);
    }

    #[test]
    fn merge_prefers_echoed_fields() {
        let base = json!({"title": "Hades", "stock": 2});
        let echo = json!({"insertedId": "g9", "stock": 3});
        let merged = merge_document(&base, Some(&echo)).unwrap();
        assert_eq!(merged["_id"], json!("g9"));
        assert_eq!(merged["stock"], json!(3));
        assert_eq!(merged["title"], json!("Hades"));
        assert!(merged.get("insertedId").is_none());
    }

    #[test]
    fn merge_generates_missing_id() {
        let merged = merge_document(&json!({"title": "Celeste"}), None).unwrap();
        let id = merged["_id"].as_str().unwrap();
        assert_eq!(id.len(), 36);
    }

    #[test]
    fn envelope_error_flags() {
        let envelope: Envelope =
            serde_json::from_value(json!({"error": true, "errorMsg": "denied"})).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert_eq!(err.remote_message(), Some("denied"));

        let envelope: Envelope =
            serde_json::from_value(json!({"error": {"message": "boom"}})).unwrap();
        assert_eq!(envelope.into_result().unwrap_err().remote_message(), Some("boom"));

        let envelope: Envelope =
            serde_json::from_value(json!({"documents": [], "error": null})).unwrap();
        assert!(envelope.into_result().is_ok());
    }
}
