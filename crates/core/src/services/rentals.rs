use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::{Alert, Error, Result, ValidationError},
    models::{Client, Game, Rental, RentalStatus},
    pricing::{parse_calendar_date, quote},
    store::{apply_patch, merge_document, Collection},
};

/// Shown when the rental list cannot be fetched.
pub const LOAD_FAILED: &str = "Could not load rentals.";
/// Shown when a new rental cannot be saved.
pub const SAVE_FAILED: &str = "Could not register the rental.";
/// Shown when a rental cannot be closed.
pub const RETURN_FAILED: &str = "Could not close the rental.";

/// Raw input for a new rental.
#[derive(Debug, Clone, Default)]
pub struct RentalForm {
    pub client_id: String,
    pub game_id: String,
    pub start_date: String,
    pub end_date: String,
    pub notes: String,
}

impl RentalForm {
    /// Preselect the first client and game when nothing is chosen yet.
    pub fn default_selection(&mut self, games: &[Game], clients: &[Client]) {
        if self.client_id.is_empty() {
            if let Some(id) = clients.first().and_then(|client| client.id.clone()) {
                self.client_id = id;
            }
        }
        if self.game_id.is_empty() {
            if let Some(id) = games.first().and_then(|game| game.id.clone()) {
                self.game_id = id;
            }
        }
    }

}

/// Everything the rental flow shows, fetched together.
#[derive(Debug, Default)]
pub struct RentalData {
    pub rentals: Vec<Rental>,
    pub games: Vec<Game>,
    pub clients: Vec<Client>,
    /// One alert per list that failed to load.
    pub alerts: Vec<Alert>,
}

/// Rental registration and return handling.
#[derive(Clone)]
pub struct RentalDesk {
    rentals: Arc<dyn Collection<Rental>>,
    games: Arc<dyn Collection<Game>>,
    clients: Arc<dyn Collection<Client>>,
}

impl RentalDesk {
    pub fn new(
        rentals: Arc<dyn Collection<Rental>>,
        games: Arc<dyn Collection<Game>>,
        clients: Arc<dyn Collection<Client>>,
    ) -> Self {
        Self {
            rentals,
            games,
            clients,
        }
    }

    /// Fetch rentals, games and clients concurrently.
    ///
    /// A list that fails to load comes back empty with an alert attached.
    pub async fn load(&self) -> RentalData {
        let (rentals, games, clients) = tokio::join!(
            self.rentals.find(),
            self.games.find(),
            self.clients.find()
        );

        let mut alerts = Vec::new();
        let rentals = settle(rentals, LOAD_FAILED, &mut alerts);
        let games = settle(games, super::catalog::LOAD_FAILED, &mut alerts);
        let clients = settle(clients, super::clients::LOAD_FAILED, &mut alerts);

        RentalData {
            rentals,
            games,
            clients,
            alerts,
        }
    }

    /// Rentals only.
    pub async fn list(&self) -> Result<Vec<Rental>> {
        Ok(self.rentals.find().await?)
    }

    /// Validate the form, price it and insert the rental.
    ///
    /// All checks run before any network call: required fields, date
    /// parsing, interval order, then client and game lookup.
    pub async fn create(
        &self,
        form: &RentalForm,
        games: &[Game],
        clients: &[Client],
    ) -> Result<Rental> {
        let payload = build_rental(form, games, clients)?;
        let echo = self.rentals.insert_one(&payload).await?;
        let rental = merge_document(&payload, echo.as_ref())?;
        info!(
            "registered rental {} for {} days ({})",
            rental.id.as_deref().unwrap_or_default(),
            rental.total_days,
            rental.total_amount
        );
        Ok(rental)
    }

    /// Close a rental.
    ///
    /// The update is always sent, even for rentals already returned; the
    /// backend keeps the last write.
    pub async fn mark_returned(&self, rental: &Rental) -> Result<Rental> {
        let id = rental
            .id
            .as_deref()
            .ok_or_else(|| ValidationError::MissingFields(vec!["_id"]))?;
        if rental.status == RentalStatus::Returned {
            warn!("rental {id} is already returned, sending update anyway");
        }

        let patch = json!({
            "status": RentalStatus::Returned,
            "returned_at": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        let echo = self.rentals.update_one(id, &patch).await?;
        let patched = apply_patch(rental, &patch)?;
        let updated = merge_document(&patched, echo.as_ref())?;
        info!("rental {id} marked returned");
        Ok(updated)
    }
}

fn settle<T>(
    outcome: std::result::Result<Vec<T>, crate::error::StoreError>,
    default_message: &str,
    alerts: &mut Vec<Alert>,
) -> Vec<T> {
    match outcome {
        Ok(items) => items,
        Err(err) => {
            warn!("{default_message} {err}");
            alerts.push(Error::from(err).alert(default_message));
            Vec::new()
        }
    }
}

fn build_rental(
    form: &RentalForm,
    games: &[Game],
    clients: &[Client],
) -> Result<Rental, ValidationError> {
    let client_id = form.client_id.trim();
    let game_id = form.game_id.trim();
    let start_date = form.start_date.trim();
    let end_date = form.end_date.trim();

    let missing: Vec<&'static str> = [
        ("client_id", client_id),
        ("game_id", game_id),
        ("start_date", start_date),
        ("end_date", end_date),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| name)
    .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let start = parse_calendar_date(start_date)?;
    let end = parse_calendar_date(end_date)?;
    if end < start {
        return Err(ValidationError::InvertedInterval {
            start: start_date.to_string(),
            end: end_date.to_string(),
        });
    }

    let client = clients
        .iter()
        .find(|client| client.id.as_deref() == Some(client_id))
        .ok_or_else(|| ValidationError::UnknownSelection {
            kind: "client",
            id: client_id.to_string(),
        })?;
    let game = games
        .iter()
        .find(|game| game.id.as_deref() == Some(game_id))
        .ok_or_else(|| ValidationError::UnknownSelection {
            kind: "game",
            id: game_id.to_string(),
        })?;

    let priced = quote(start_date, end_date, game.daily_price)?;
    let notes = form.notes.trim();

    Ok(Rental {
        id: None,
        client_id: client_id.to_string(),
        client_name: Some(client.name.clone()),
        game_id: game_id.to_string(),
        game_title: Some(game.title.clone()),
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        status: RentalStatus::Active,
        daily_price: game.daily_price,
        total_days: priced.total_days,
        total_amount: priced.total_amount,
        notes: (!notes.is_empty()).then(|| notes.to_string()),
        created_at: Some(Utc::now()),
        returned_at: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Money, store::MemoryCollection};

    struct Fixture {
        rentals: Arc<MemoryCollection<Rental>>,
        games: Vec<Game>,
        clients: Vec<Client>,
        desk: RentalDesk,
    }

    fn fixture() -> Fixture {
        let games = vec![Game {
            id: Some("g1".to_string()),
            title: "Hades".to_string(),
            platform: "Switch".to_string(),
            daily_price: Money::from_cents(1000),
            stock: 2,
            created_at: None,
        }];
        let clients = vec![Client {
            id: Some("c1".to_string()),
            name: "Ana".to_string(),
            email: None,
            phone: None,
            document_id: None,
            created_at: None,
        }];
        let rentals = Arc::new(MemoryCollection::<Rental>::new("rentals"));
        let game_store =
            Arc::new(MemoryCollection::with_documents("games", games.clone()).unwrap());
        let client_store =
            Arc::new(MemoryCollection::with_documents("clients", clients.clone()).unwrap());
        let desk = RentalDesk::new(rentals.clone(), game_store, client_store);
        Fixture {
            rentals,
            games,
            clients,
            desk,
        }
    }

    fn form(start: &str, end: &str) -> RentalForm {
        RentalForm {
            client_id: "c1".to_string(),
            game_id: "g1".to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            notes: "  ".to_string(),
        }
    }

    #[tokio::test]
    async fn creates_priced_rental_with_snapshots() {
        let fx = fixture();
        let rental = fx
            .desk
            .create(&form("2024-01-01", "2024-01-03"), &fx.games, &fx.clients)
            .await
            .unwrap();

        assert_eq!(rental.total_days, 2);
        assert_eq!(rental.total_amount, Money::from_cents(2000));
        assert_eq!(rental.daily_price, Money::from_cents(1000));
        assert_eq!(rental.client_name.as_deref(), Some("Ana"));
        assert_eq!(rental.game_title.as_deref(), Some("Hades"));
        assert_eq!(rental.status, RentalStatus::Active);
        assert!(rental.notes.is_none());
        assert!(rental.id.is_some());
        assert_eq!(fx.rentals.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn inverted_interval_creates_nothing() {
        let fx = fixture();
        let err = fx
            .desk
            .create(&form("2024-01-03", "2024-01-01"), &fx.games, &fx.clients)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvertedInterval { .. })
        ));
        assert!(fx.rentals.snapshot().is_empty());
    }

    #[tokio::test]
    async fn checks_run_in_order() {
        let fx = fixture();
        let mut incomplete = form("", "2024-01-01");
        incomplete.game_id.clear();
        let err = build_rental(&incomplete, &fx.games, &fx.clients).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["game_id", "start_date"])
        );

        let mut unknown = form("01/02/2024", "2024-01-01");
        unknown.game_id = "nope".to_string();
        assert!(matches!(
            build_rental(&unknown, &fx.games, &fx.clients),
            Err(ValidationError::InvalidDate(_))
        ));

        unknown.start_date = "2024-01-01".to_string();
        assert_eq!(
            build_rental(&unknown, &fx.games, &fx.clients).unwrap_err(),
            ValidationError::UnknownSelection {
                kind: "game",
                id: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn mark_returned_twice_sends_two_updates() {
        let fx = fixture();
        let rental = fx
            .desk
            .create(&form("2024-01-01", "2024-01-01"), &fx.games, &fx.clients)
            .await
            .unwrap();
        assert_eq!(rental.total_days, 1);

        let returned = fx.desk.mark_returned(&rental).await.unwrap();
        assert_eq!(returned.status, RentalStatus::Returned);
        assert!(returned.returned_at.is_some());
        assert_eq!(returned.id, rental.id);
        assert_eq!(returned.total_amount, rental.total_amount);

        let again = fx.desk.mark_returned(&returned).await.unwrap();
        assert_eq!(again.status, RentalStatus::Returned);
        assert_eq!(fx.rentals.update_calls(), 2);
    }

    #[tokio::test]
    async fn unsaved_rental_cannot_be_returned() {
        let fx = fixture();
        let unsaved = build_rental(&form("2024-01-01", "2024-01-02"), &fx.games, &fx.clients)
            .unwrap();

        let err = fx.desk.mark_returned(&unsaved).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingFields(ref fields)) if fields == &vec!["_id"]
        ));
        assert_eq!(fx.rentals.update_calls(), 0);
    }

    #[tokio::test]
    async fn null_priced_game_rents_for_free() {
        let mut fx = fixture();
        fx.games = crate::store::decode_documents(
            "games",
            vec![json!({"_id": "g1", "title": "Hades", "platform": null, "daily_price": null})],
        );
        assert_eq!(fx.games.len(), 1);

        let rental = fx
            .desk
            .create(&form("2024-01-01", "2024-01-04"), &fx.games, &fx.clients)
            .await
            .unwrap();
        assert_eq!(rental.total_days, 3);
        assert_eq!(rental.total_amount, Money::ZERO);
    }

    #[tokio::test]
    async fn failed_return_surfaces_backend_message() {
        let fx = fixture();
        let rental = fx
            .desk
            .create(&form("2024-01-01", "2024-01-02"), &fx.games, &fx.clients)
            .await
            .unwrap();
        fx.rentals.fail_next(None);

        let err = fx.desk.mark_returned(&rental).await.unwrap_err();
        assert_eq!(err.alert(RETURN_FAILED).message, RETURN_FAILED);
        assert_eq!(fx.rentals.snapshot()[0]["status"], json!("active"));
    }

    #[tokio::test]
    async fn load_reports_each_failed_list() {
        let fx = fixture();
        fx.rentals.fail_next(Some("rentals offline"));

        let data = fx.desk.load().await;
        assert!(data.rentals.is_empty());
        assert_eq!(data.games.len(), 1);
        assert_eq!(data.clients.len(), 1);
        assert_eq!(data.alerts.len(), 1);
        assert_eq!(data.alerts[0].message, "rentals offline");

        let mut selection = RentalForm::default();
        selection.default_selection(&data.games, &data.clients);
        assert_eq!(selection.client_id, "c1");
        assert_eq!(selection.game_id, "g1");
    }
}
