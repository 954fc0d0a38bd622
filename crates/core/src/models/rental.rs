use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Money;
use crate::store::Document;

/// Lifecycle state of a rental.
///
/// Only `Active -> Returned` is ever written by this crate. `Overdue` is set
/// elsewhere and is only read and counted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    /// Game is out with the client.
    #[default]
    Active,
    /// Past its end date and not yet returned.
    Overdue,
    /// Game is back in the shop.
    Returned,
}

impl RentalStatus {
    /// Stored string form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Overdue => "overdue",
            Self::Returned => "returned",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lease of a game to a client.
///
/// `client_name`, `game_title` and `daily_price` are snapshots taken when the
/// rental is created and are not refreshed afterwards.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub game_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_title: Option<String>,
    /// Calendar date as entered.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub start_date: String,
    /// Calendar date as entered.
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub end_date: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: RentalStatus,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub daily_price: Money,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub total_days: i64,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub total_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returned_at: Option<DateTime<Utc>>,
}

impl Rental {
    /// Whether the game is still out.
    pub fn is_active(&self) -> bool {
        self.status == RentalStatus::Active
    }

    /// Client label with a fallback for rentals missing their snapshot.
    pub fn client_label(&self) -> &str {
        self.client_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown client")
    }

    /// Game label with a fallback for rentals missing their snapshot.
    pub fn game_label(&self) -> &str {
        self.game_title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or("Unknown game")
    }
}

impl Document for Rental {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}
