#![warn(clippy::all, missing_docs)]

//! Core domain logic for the game rental shop.
//!
//! This crate hosts the records, rental pricing, the collection client
//! boundary, staff authentication and the shop flows used by the
//! command-line frontend and any future ones.

pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod pricing;
pub mod services;
pub mod store;

pub use auth::AuthManager;
pub use config::AppConfig;
pub use error::{Alert, Error, StoreError, ValidationError};
pub use models::{Client, Game, Money, Rental, RentalStatus, User};
pub use pricing::{quote, RentalQuote};
pub use store::{ApiClient, Collection, HttpCollection, MemoryCollection};
