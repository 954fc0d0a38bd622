use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Money;
use crate::store::Document;

/// Catalog entry available for rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Backend identifier, absent until inserted.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Game title.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
    /// Platform label (`PS5`, `Switch`, ...).
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub platform: String,
    /// Price charged per rental day.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub daily_price: Money,
    /// Copies available.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub stock: u32,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Label combining title and platform.
    pub fn display_name(&self) -> String {
        if self.platform.is_empty() {
            self.title.clone()
        } else {
            format!("{} · {}", self.title, self.platform)
        }
    }
}

impl Document for Game {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}
