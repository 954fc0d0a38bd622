use std::{process::ExitCode, sync::Arc};

use anyhow::{bail, Result};
use rental_core::{
    error::Alert,
    format::{format_currency, format_date},
    pricing::quote,
    services::{
        catalog, clients, rentals, Board, ClientDirectory, ClientForm, Dashboard, GameCatalog,
        GameForm, RentalDesk, RentalForm,
    },
    store::{self, Collection},
    ApiClient, AuthManager, Client, Error, Game, Money, Rental, ValidationError,
};

use crate::args::Args;

const HELP: &str = "\
game-rental commands:
  login <email> <password>
  logout
  whoami
  games list
  games add <title> <platform> <daily_price> <stock>
  clients list
  clients add <name> [--email E] [--phone P] [--document D]
  rentals list
  rentals add <start> <end> [--client ID] [--game ID] [--notes N]
  rentals return <rental_id>
  quote <start> <end> <daily_price>
  dashboard
  users
  help";

/// Command dispatcher holding the backend handles.
pub struct Shell {
    client: ApiClient,
    auth: AuthManager,
}

fn show_alert(alert: &Alert) -> ExitCode {
    eprintln!("{alert}");
    ExitCode::FAILURE
}

fn fail(err: Error, default_message: &str) -> ExitCode {
    show_alert(&err.alert(default_message))
}

impl Shell {
    pub fn new(client: ApiClient, auth: AuthManager) -> Self {
        Self { client, auth }
    }

    fn games(&self) -> Arc<dyn Collection<Game>> {
        Arc::new(self.client.collection::<Game>(store::GAMES))
    }

    fn clients(&self) -> Arc<dyn Collection<Client>> {
        Arc::new(self.client.collection::<Client>(store::CLIENTS))
    }

    fn rentals(&self) -> Arc<dyn Collection<Rental>> {
        Arc::new(self.client.collection::<Rental>(store::RENTALS))
    }

    fn desk(&self) -> RentalDesk {
        RentalDesk::new(self.rentals(), self.games(), self.clients())
    }

    pub async fn dispatch(&self, raw: &[String]) -> Result<ExitCode> {
        let Some((command, rest)) = raw.split_first() else {
            println!("{HELP}");
            return Ok(ExitCode::SUCCESS);
        };
        let args = Args::parse(rest)?;

        match command.as_str() {
            "help" | "--help" | "-h" => {
                println!("{HELP}");
                return Ok(ExitCode::SUCCESS);
            }
            "login" => return self.login(&args).await,
            "quote" => return self.quote(&args),
            _ => {}
        }

        if self.auth.user().is_none() {
            eprintln!("Not signed in. Run `game-rental login <email> <password>` first.");
            return Ok(ExitCode::FAILURE);
        }

        match (command.as_str(), args.at(0)) {
            ("logout", _) => self.logout().await,
            ("whoami", _) => self.whoami(),
            ("games", "list") => self.list_games().await,
            ("games", "add") => self.add_game(&args).await,
            ("clients", "list") => self.list_clients().await,
            ("clients", "add") => self.add_client(&args).await,
            ("rentals", "list") => self.list_rentals().await,
            ("rentals", "add") => self.add_rental(&args).await,
            ("rentals", "return") => self.return_rental(&args).await,
            ("dashboard", _) => self.dashboard().await,
            ("users", _) => {
                println!("User and permission management is not available yet.");
                Ok(ExitCode::SUCCESS)
            }
            (other, sub) => bail!("unknown command `{other} {sub}` (try `game-rental help`)"),
        }
    }

    async fn login(&self, args: &Args) -> Result<ExitCode> {
        match self.auth.sign_in(args.at(0), args.at(1)).await {
            Ok(user) => {
                println!("Hello, {}.", user.greeting_name());
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(fail(err, "Sign-in failed.")),
        }
    }

    async fn logout(&self) -> Result<ExitCode> {
        match self.auth.sign_out().await {
            Ok(()) => {
                println!("Signed out.");
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(fail(err, "Signed out locally; the backend did not confirm.")),
        }
    }

    fn whoami(&self) -> Result<ExitCode> {
        if let Some(user) = self.auth.user() {
            println!(
                "{} <{}> ({})",
                user.greeting_name(),
                user.email.as_deref().unwrap_or("-"),
                user.id
            );
        }
        Ok(ExitCode::SUCCESS)
    }

    fn quote(&self, args: &Args) -> Result<ExitCode> {
        let price = match args.require(2, "daily_price")?.parse::<Money>() {
            Ok(price) => price,
            Err(err) => return Ok(fail(err.into(), "")),
        };
        match quote(args.require(0, "start")?, args.require(1, "end")?, price) {
            Ok(quote) => {
                println!(
                    "{} day(s) × {} = {}",
                    quote.total_days,
                    format_currency(Some(price)),
                    format_currency(Some(quote.total_amount))
                );
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(fail(err.into(), "")),
        }
    }

    async fn list_games(&self) -> Result<ExitCode> {
        let games = match GameCatalog::new(self.games()).list().await {
            Ok(games) => games,
            Err(err) => return Ok(fail(err, catalog::LOAD_FAILED)),
        };
        if games.is_empty() {
            println!("No games registered yet.");
        }
        for game in &games {
            println!(
                "{:<26} {:<32} {:<10} {:>12}  stock {}",
                game.id.as_deref().unwrap_or("-"),
                game.title,
                game.platform,
                format_currency(Some(game.daily_price)),
                game.stock
            );
        }
        Ok(ExitCode::SUCCESS)
    }

    async fn add_game(&self, args: &Args) -> Result<ExitCode> {
        let form = GameForm {
            title: args.at(1).to_string(),
            platform: args.at(2).to_string(),
            daily_price: args.at(3).to_string(),
            stock: args.at(4).to_string(),
        };
        match GameCatalog::new(self.games()).create(&form).await {
            Ok(game) => {
                println!(
                    "Added {} ({}).",
                    game.display_name(),
                    game.id.as_deref().unwrap_or("-")
                );
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(fail(err, catalog::SAVE_FAILED)),
        }
    }

    async fn list_clients(&self) -> Result<ExitCode> {
        let list = match ClientDirectory::new(self.clients()).list().await {
            Ok(list) => list,
            Err(err) => return Ok(fail(err, clients::LOAD_FAILED)),
        };
        if list.is_empty() {
            println!("No clients registered yet.");
        }
        for client in &list {
            println!(
                "{:<26} {:<32} {}",
                client.id.as_deref().unwrap_or("-"),
                client.name,
                client.contact().unwrap_or("-")
            );
        }
        Ok(ExitCode::SUCCESS)
    }

    async fn add_client(&self, args: &Args) -> Result<ExitCode> {
        let form = ClientForm {
            name: args.at(1).to_string(),
            email: args.option("email").to_string(),
            phone: args.option("phone").to_string(),
            document_id: args.option("document").to_string(),
        };
        match ClientDirectory::new(self.clients()).create(&form).await {
            Ok(client) => {
                println!(
                    "Registered {} ({}).",
                    client.name,
                    client.id.as_deref().unwrap_or("-")
                );
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(fail(err, clients::SAVE_FAILED)),
        }
    }

    async fn list_rentals(&self) -> Result<ExitCode> {
        let list = match self.desk().list().await {
            Ok(list) => list,
            Err(err) => return Ok(fail(err, rentals::LOAD_FAILED)),
        };
        if list.is_empty() {
            println!("No rentals found.");
        }
        for rental in &list {
            print_rental(rental);
        }
        Ok(ExitCode::SUCCESS)
    }

    async fn add_rental(&self, args: &Args) -> Result<ExitCode> {
        let desk = self.desk();
        let data = desk.load().await;
        for alert in &data.alerts {
            show_alert(alert);
        }

        let mut form = RentalForm {
            client_id: args.option("client").to_string(),
            game_id: args.option("game").to_string(),
            start_date: args.at(1).to_string(),
            end_date: args.at(2).to_string(),
            notes: args.option("notes").to_string(),
        };
        form.default_selection(&data.games, &data.clients);

        match desk.create(&form, &data.games, &data.clients).await {
            Ok(rental) => {
                println!("Rental registered.");
                print_rental(&rental);
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(fail(err, rentals::SAVE_FAILED)),
        }
    }

    async fn return_rental(&self, args: &Args) -> Result<ExitCode> {
        let id = args.require(1, "rental_id")?;
        let desk = self.desk();
        let mut board = Board::new();
        match desk.list().await {
            Ok(list) => board.replace(list),
            Err(err) => return Ok(fail(err, rentals::LOAD_FAILED)),
        }

        let Some(rental) = board.get(id).cloned() else {
            let err = ValidationError::UnknownSelection {
                kind: "rental",
                id: id.to_string(),
            };
            return Ok(fail(err.into(), rentals::RETURN_FAILED));
        };

        match desk.mark_returned(&rental).await {
            Ok(updated) => {
                board.apply_update(updated);
                if let Some(current) = board.get(id) {
                    print_rental(current);
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(fail(err, rentals::RETURN_FAILED)),
        }
    }

    async fn dashboard(&self) -> Result<ExitCode> {
        let (stats, alerts) = Dashboard::new(self.games(), self.rentals()).load().await;
        for alert in &alerts {
            show_alert(alert);
        }

        let name = self
            .auth
            .user()
            .map(|user| user.greeting_name().to_string())
            .unwrap_or_else(|| "Team".to_string());
        println!("Hello, {name}.");
        println!("Games registered : {}", stats.game_count);
        println!("Active rentals   : {}", stats.active_rentals);
        println!("Overdue rentals  : {}", stats.overdue_rentals);
        println!("Revenue          : {}", format_currency(Some(stats.revenue)));

        println!("\nLatest games");
        if stats.latest_games.is_empty() {
            println!("  No games registered yet.");
        }
        for game in &stats.latest_games {
            println!(
                "  {:<32} {:<10} {}",
                game.title,
                game.platform,
                format_currency(Some(game.daily_price))
            );
        }

        println!("\nLatest rentals");
        if stats.latest_rentals.is_empty() {
            println!("  No rentals found.");
        }
        for rental in &stats.latest_rentals {
            println!(
                "  {:<24} {:<32} {}",
                rental.client_label(),
                rental.game_label(),
                rental.status
            );
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn print_rental(rental: &Rental) {
    println!(
        "{:<26} {:<20} {:<24} {} → {}  {}d  {:>12}  {}",
        rental.id.as_deref().unwrap_or("-"),
        rental.client_label(),
        rental.game_label(),
        format_date(Some(rental.start_date.as_str())),
        format_date(Some(rental.end_date.as_str())),
        rental.total_days,
        format_currency(Some(rental.total_amount)),
        rental.status
    );
}
