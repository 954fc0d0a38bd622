use std::{marker::PhantomData, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{decode_documents, Collection, Document, Envelope};
use crate::{config::AppConfig, error::StoreError};

/// Shared HTTP client for the document backend.
///
/// Clones share the access token, so signing in through one handle
/// authorizes every collection built from it.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Build a client from application configuration.
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Install or clear the bearer token sent with every request.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    /// Whether a bearer token is installed.
    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    /// Typed handle on a named collection.
    pub fn collection<T: Document>(&self, name: &str) -> HttpCollection<T> {
        HttpCollection {
            client: self.clone(),
            name: name.to_string(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut builder = self
            .http
            .request(method, url)
            .header("x-api-key", &self.api_key);
        if let Some(token) = self.token.read().as_deref() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    pub(crate) async fn send_raw<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(StatusCode, Vec<u8>), StoreError> {
        let mut builder = self.request(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?.to_vec();
        debug!("{method} {path} -> {status}");
        Ok((status, bytes))
    }

    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Envelope, StoreError> {
        let (status, bytes) = self.send_raw(method, path, body).await?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return if status.is_success() {
                Ok(Envelope::default())
            } else {
                Err(StoreError::Status(status.as_u16()))
            };
        }

        match serde_json::from_slice::<Envelope>(&bytes) {
            Ok(envelope) if status.is_success() => envelope.into_result(),
            Ok(envelope) => {
                let message = envelope.error_msg.clone();
                match envelope.into_result() {
                    Err(err) => Err(err),
                    Ok(_) if message.is_some() => Err(StoreError::Remote(message)),
                    Ok(_) => Err(StoreError::Status(status.as_u16())),
                }
            }
            Err(_) if !status.is_success() => Err(StoreError::Status(status.as_u16())),
            Err(err) => Err(StoreError::Decode(err)),
        }
    }
}

/// Collection reached over the backend's REST interface.
pub struct HttpCollection<T> {
    client: ApiClient,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> HttpCollection<T> {
    fn documents_path(&self) -> String {
        format!("collections/{}/documents", self.name)
    }
}

#[async_trait]
impl<T: Document> Collection<T> for HttpCollection<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self) -> Result<Vec<T>, StoreError> {
        let envelope = self
            .client
            .send::<Value>(Method::GET, &self.documents_path(), None)
            .await?;
        let documents = envelope.documents.unwrap_or_default();
        debug!("fetched {} documents from {}", documents.len(), self.name);
        Ok(decode_documents(&self.name, documents))
    }

    async fn insert_one(&self, document: &T) -> Result<Option<Value>, StoreError> {
        let envelope = self
            .client
            .send(Method::POST, &self.documents_path(), Some(document))
            .await?;
        Ok(envelope.document)
    }

    async fn update_one(&self, id: &str, patch: &Value) -> Result<Option<Value>, StoreError> {
        let path = format!("{}/{}", self.documents_path(), id);
        let envelope = self.client.send(Method::PATCH, &path, Some(patch)).await?;
        Ok(envelope.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Game, Money};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(server: &Server) -> ApiClient {
        let config = AppConfig {
            base_url: server.url(),
            api_key: "test-key".to_string(),
            ..AppConfig::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn find_decodes_documents_and_sends_api_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/collections/games/documents")
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::to_string(&Envelope::with_documents(vec![
                    json!({"_id": "g1", "title": "Hades", "platform": "Switch", "daily_price": 9.9, "stock": 2}),
                    json!({"_id": "g2", "title": "Celeste", "platform": "PC", "daily_price": 5, "stock": "many"}),
                ]))
                .unwrap(),
            )
            .create_async()
            .await;

        let games: HttpCollection<Game> = client_for(&server).collection("games");
        let found = games.find().await.unwrap();

        mock.assert_async().await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].daily_price, Money::from_cents(990));
    }

    #[tokio::test]
    async fn in_band_error_surfaces_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/collections/games/documents")
            .with_status(200)
            .with_body(json!({"error": true, "errorMsg": "permission denied"}).to_string())
            .create_async()
            .await;

        let games: HttpCollection<Game> = client_for(&server).collection("games");
        let game = Game {
            id: None,
            title: "Hades".to_string(),
            platform: "Switch".to_string(),
            daily_price: Money::from_cents(990),
            stock: 1,
            created_at: None,
        };
        let err = games.insert_one(&game).await.unwrap_err();
        assert_eq!(err.remote_message(), Some("permission denied"));
    }

    #[tokio::test]
    async fn update_sends_patch_with_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/collections/rentals/documents/r1")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::PartialJson(json!({"status": "returned"})))
            .with_status(200)
            .with_body(
                serde_json::to_string(&Envelope::with_document(
                    json!({"_id": "r1", "status": "returned"}),
                ))
                .unwrap(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        client.set_token(Some("tok".to_string()));
        let rentals: HttpCollection<Value> = client.collection("rentals");
        let echo = rentals
            .update_one("r1", &json!({"status": "returned"}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(echo.unwrap()["status"], json!("returned"));
    }

    #[tokio::test]
    async fn bare_http_failure_reports_status() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/collections/clients/documents")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let clients: HttpCollection<Value> = client_for(&server).collection("clients");
        let err = clients.find().await.unwrap_err();
        assert!(matches!(err, StoreError::Status(503)));
    }
}
