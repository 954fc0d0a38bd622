use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::{
    error::{Result, ValidationError},
    models::Client,
    store::{merge_document, Collection},
};

/// Shown when the client list cannot be fetched.
pub const LOAD_FAILED: &str = "Could not load clients.";
/// Shown when a new client cannot be saved.
pub const SAVE_FAILED: &str = "Could not save the client.";

/// Raw input for a new client. Only the name is required.
#[derive(Debug, Clone, Default)]
pub struct ClientForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub document_id: String,
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ClientForm {
    fn validate(&self) -> Result<Client, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingFields(vec!["name"]));
        }
        Ok(Client {
            id: None,
            name: name.to_string(),
            email: optional(&self.email),
            phone: optional(&self.phone),
            document_id: optional(&self.document_id),
            created_at: Some(Utc::now()),
        })
    }
}

/// Client registry backed by the `clients` collection.
#[derive(Clone)]
pub struct ClientDirectory {
    clients: Arc<dyn Collection<Client>>,
}

impl ClientDirectory {
    pub fn new(clients: Arc<dyn Collection<Client>>) -> Self {
        Self { clients }
    }

    pub async fn list(&self) -> Result<Vec<Client>> {
        Ok(self.clients.find().await?)
    }

    /// Validate and insert a new client, returning the stored record.
    pub async fn create(&self, form: &ClientForm) -> Result<Client> {
        let payload = form.validate()?;
        let echo = self.clients.insert_one(&payload).await?;
        let client = merge_document(&payload, echo.as_ref())?;
        info!("registered client {}", client.id.as_deref().unwrap_or_default());
        Ok(client)
    }
}
