use std::sync::Arc;

use tracing::debug;

use crate::{
    error::{Alert, Error},
    models::{Game, Money, Rental, RentalStatus},
    store::Collection,
};

/// Number of entries shown in each "latest" list.
pub const LATEST_LIMIT: usize = 5;

/// Aggregated shop figures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    /// Games in the catalog.
    pub game_count: usize,
    /// Rentals currently out.
    pub active_rentals: usize,
    /// Rentals flagged as late.
    pub overdue_rentals: usize,
    /// Sum of every rental's total amount, returned or not.
    pub revenue: Money,
    /// First games in list order.
    pub latest_games: Vec<Game>,
    /// First rentals in list order.
    pub latest_rentals: Vec<Rental>,
}

impl DashboardStats {
    /// Compute figures from already loaded lists.
    pub fn from_lists(games: &[Game], rentals: &[Rental]) -> Self {
        Self {
            game_count: games.len(),
            active_rentals: count_status(rentals, RentalStatus::Active),
            overdue_rentals: count_status(rentals, RentalStatus::Overdue),
            revenue: rentals.iter().map(|rental| rental.total_amount).sum(),
            latest_games: games.iter().take(LATEST_LIMIT).cloned().collect(),
            latest_rentals: rentals.iter().take(LATEST_LIMIT).cloned().collect(),
        }
    }
}

/// Rentals in the given state.
pub fn count_status(rentals: &[Rental], status: RentalStatus) -> usize {
    rentals.iter().filter(|rental| rental.status == status).count()
}

/// Overview of catalog and rentals.
#[derive(Clone)]
pub struct Dashboard {
    games: Arc<dyn Collection<Game>>,
    rentals: Arc<dyn Collection<Rental>>,
}

impl Dashboard {
    pub fn new(games: Arc<dyn Collection<Game>>, rentals: Arc<dyn Collection<Rental>>) -> Self {
        Self { games, rentals }
    }

    /// Fetch both lists and aggregate them.
    ///
    /// A list that fails to load counts as empty and yields an alert.
    pub async fn load(&self) -> (DashboardStats, Vec<Alert>) {
        let (games, rentals) = tokio::join!(self.games.find(), self.rentals.find());
        let mut alerts = Vec::new();

        let games = games.unwrap_or_else(|err| {
            alerts.push(Error::from(err).alert(super::catalog::LOAD_FAILED));
            Vec::new()
        });
        let rentals = rentals.unwrap_or_else(|err| {
            alerts.push(Error::from(err).alert(super::rentals::LOAD_FAILED));
            Vec::new()
        });
        debug!(
            "dashboard over {} games and {} rentals",
            games.len(),
            rentals.len()
        );

        (DashboardStats::from_lists(&games, &rentals), alerts)
    }
}
