//! Shared domain models.
//!
//! Every record mirrors a document in one of the backend collections. Field
//! names follow the stored documents (`_id`, snake_case everywhere else).

mod client;
mod game;
mod money;
mod rental;
mod user;

pub use client::Client;
pub use game::Game;
pub use money::Money;
pub use rental::{Rental, RentalStatus};
pub use user::User;

use serde::{Deserialize, Deserializer};

/// Decode a field that the backend may store as `null`, using the type's
/// default in that case.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
