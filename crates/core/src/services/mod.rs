#![allow(missing_docs)]

//! Shop flows built on top of the collection boundary.

mod board;
pub mod catalog;
pub mod clients;
pub mod dashboard;
pub mod rentals;

pub use board::Board;
pub use catalog::{GameCatalog, GameForm};
pub use clients::{ClientDirectory, ClientForm};
pub use dashboard::{Dashboard, DashboardStats};
pub use rentals::{RentalData, RentalDesk, RentalForm};
