// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cellarium - track the wines in your cellar.
//!
//! This is the binary entry point for the command-line client.

mod add;
mod catalog;
mod record;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use cellarium_config::CellarConfig;
use cellarium_core::{AuthObserver, BottleId, CatalogApi, CellarError, WineId};
use cellarium_flow::WizardOptions;
use clap::{Parser, Subcommand};
use colored::Colorize;

/// Cellarium - track the wines in your cellar.
#[derive(Parser, Debug)]
#[command(name = "cellarium", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and store the token pair.
    Login {
        #[arg(long, short)]
        username: String,
    },
    /// Forget the stored tokens.
    Logout,
    /// List wines, optionally filtered by a search term.
    Wines {
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Show one wine with its bottles.
    Wine { id: i64 },
    /// Record bottles bought for a wine.
    Bought(record::BoughtArgs),
    /// Record a tasting memory for a wine.
    Drank(record::DrankArgs),
    /// Walk through the add-wine wizard interactively.
    Add,
    /// Mark a bottle as consumed.
    Consume { bottle: i64 },
    /// Put a consumed bottle back in stock.
    UndoConsume { bottle: i64 },
    /// List stores.
    Stores,
    /// Add a store.
    StoreAdd { name: String },
    /// Search regions.
    Regions {
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => cellarium_config::load_and_validate_path(path),
        None => cellarium_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            cellarium_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let Some(command) = cli.command else {
        println!("cellarium: use --help for available commands");
        return;
    };

    if let Err(e) = run(command, &config).await {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &CellarConfig) -> Result<(), CellarError> {
    let observer: Arc<dyn AuthObserver> = Arc::new(session::LoginHint::default());
    let conn = cellarium_client::connect(config, observer)?;
    let api: Arc<dyn CatalogApi> = conn.api.clone();
    let options = wizard_options(config);

    match command {
        Commands::Login { username } => session::login(&conn.auth, username).await,
        Commands::Logout => {
            session::logout(&conn.auth);
            Ok(())
        }
        Commands::Wines { search } => catalog::list_wines(api.as_ref(), search.as_deref()).await,
        Commands::Wine { id } => catalog::show_wine(api.as_ref(), WineId(id)).await,
        Commands::Bought(args) => record::bought(api, options, args).await,
        Commands::Drank(args) => record::drank(api, options, args).await,
        Commands::Add => add::run(api, options).await,
        Commands::Consume { bottle } => catalog::consume(api.as_ref(), BottleId(bottle)).await,
        Commands::UndoConsume { bottle } => {
            catalog::undo_consume(api.as_ref(), BottleId(bottle)).await
        }
        Commands::Stores => catalog::list_stores(api.as_ref()).await,
        Commands::StoreAdd { name } => catalog::add_store(api.as_ref(), &name).await,
        Commands::Regions { search, country } => {
            catalog::list_regions(api.as_ref(), search.as_deref(), country.as_deref()).await
        }
    }
}

fn wizard_options(config: &CellarConfig) -> WizardOptions {
    WizardOptions {
        debounce: config.search.debounce(),
        max_results: config.search.max_results,
    }
}

/// Initialize the tracing subscriber. Logs go to stderr so listings on
/// stdout stay pipeable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cellarium={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn subcommands_use_kebab_case() {
        let cli = Cli::try_parse_from(["cellarium", "undo-consume", "12"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::UndoConsume { bottle: 12 })));

        let cli = Cli::try_parse_from(["cellarium", "store-add", "Wine Shop"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::StoreAdd { name }) if name == "Wine Shop"));
    }

    #[test]
    fn bought_parses_batch_options() {
        let cli = Cli::try_parse_from([
            "cellarium", "bought", "--wine", "4", "--count", "3", "--price", "19.90", "--date",
            "2026-03-01",
        ])
        .unwrap();
        let Some(Commands::Bought(args)) = cli.command else {
            panic!("expected bought");
        };
        assert_eq!(args.wine, 4);
        assert_eq!(args.count, 3);
        assert_eq!(args.price.as_deref(), Some("19.90"));
        assert_eq!(
            args.date,
            Some(chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
        );
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["cellarium", "stores", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn drank_requires_rating() {
        assert!(Cli::try_parse_from(["cellarium", "drank", "--wine", "1"]).is_err());
    }

    #[test]
    fn wizard_options_follow_search_config() {
        let config = cellarium_config::load_and_validate_str(
            "[search]\ndebounce_ms = 400\nmax_results = 5\n",
        )
        .unwrap();
        let options = wizard_options(&config);
        assert_eq!(options.debounce, std::time::Duration::from_millis(400));
        assert_eq!(options.max_results, 5);
    }
}
