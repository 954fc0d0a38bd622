use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::{
    error::{Result, ValidationError},
    models::{Game, Money},
    store::{merge_document, Collection},
};

/// Shown when the game list cannot be fetched.
pub const LOAD_FAILED: &str = "Could not load games. Try again shortly.";
/// Shown when a new game cannot be saved.
pub const SAVE_FAILED: &str = "Could not save the game.";

/// Raw input for a new catalog entry.
#[derive(Debug, Clone, Default)]
pub struct GameForm {
    pub title: String,
    pub platform: String,
    /// Decimal price, `.` or `,` as separator.
    pub daily_price: String,
    pub stock: String,
}

impl GameForm {
    fn validate(&self) -> Result<Game, ValidationError> {
        let title = self.title.trim();
        let platform = self.platform.trim();
        let price = self.daily_price.trim();
        let stock = self.stock.trim();

        let missing: Vec<&'static str> = [
            ("title", title),
            ("platform", platform),
            ("daily_price", price),
            ("stock", stock),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let daily_price: Money = price.parse()?;
        if daily_price.is_negative() {
            return Err(ValidationError::NegativePrice);
        }
        let stock: u32 = stock
            .parse()
            .map_err(|_| ValidationError::InvalidNumber(stock.to_string()))?;

        Ok(Game {
            id: None,
            title: title.to_string(),
            platform: platform.to_string(),
            daily_price,
            stock,
            created_at: Some(Utc::now()),
        })
    }
}

/// Game catalog backed by the `games` collection.
#[derive(Clone)]
pub struct GameCatalog {
    games: Arc<dyn Collection<Game>>,
}

impl GameCatalog {
    pub fn new(games: Arc<dyn Collection<Game>>) -> Self {
        Self { games }
    }

    /// Every game in the catalog.
    pub async fn list(&self) -> Result<Vec<Game>> {
        Ok(self.games.find().await?)
    }

    /// Validate and insert a new game, returning the stored record.
    pub async fn create(&self, form: &GameForm) -> Result<Game> {
        let payload = form.validate()?;
        let echo = self.games.insert_one(&payload).await?;
        let game = merge_document(&payload, echo.as_ref())?;
        info!(
            "added game {} ({})",
            game.title,
            game.id.as_deref().unwrap_or_default()
        );
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, store::MemoryCollection};

    fn form(title: &str, platform: &str, price: &str, stock: &str) -> GameForm {
        GameForm {
            title: title.to_string(),
            platform: platform.to_string(),
            daily_price: price.to_string(),
            stock: stock.to_string(),
        }
    }

    #[tokio::test]
    async fn creates_trimmed_game() {
        let store = Arc::new(MemoryCollection::<Game>::new("games"));
        let catalog = GameCatalog::new(store.clone());

        let game = catalog
            .create(&form("  Hades ", "Switch", "12,50", "3"))
            .await
            .unwrap();
        assert_eq!(game.title, "Hades");
        assert_eq!(game.daily_price, Money::from_cents(1250));
        assert!(game.id.is_some());
        assert!(game.created_at.is_some());

        let listed = catalog.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, game.id);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_insert() {
        let store = Arc::new(MemoryCollection::<Game>::new("games"));
        let catalog = GameCatalog::new(store.clone());

        let err = catalog.create(&form("Hades", " ", "", "2")).await.unwrap_err();
        match err {
            Error::Validation(ValidationError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["platform", "daily_price"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn bad_numbers_are_rejected() {
        let store = Arc::new(MemoryCollection::<Game>::new("games"));
        let catalog = GameCatalog::new(store);

        assert!(matches!(
            catalog.create(&form("A", "PC", "abc", "1")).await,
            Err(Error::Validation(ValidationError::InvalidNumber(_)))
        ));
        assert!(matches!(
            catalog.create(&form("A", "PC", "-3", "1")).await,
            Err(Error::Validation(ValidationError::NegativePrice))
        ));
        assert!(matches!(
            catalog.create(&form("A", "PC", "3", "two")).await,
            Err(Error::Validation(ValidationError::InvalidNumber(_)))
        ));
    }

    #[tokio::test]
    async fn backend_failure_keeps_message() {
        let store = Arc::new(MemoryCollection::<Game>::new("games"));
        store.fail_next(Some("read-only project"));
        let catalog = GameCatalog::new(store);

        let err = catalog.create(&form("A", "PC", "3", "1")).await.unwrap_err();
        assert_eq!(err.alert(SAVE_FAILED).message, "read-only project");
    }
}
