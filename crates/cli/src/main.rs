//! Bayberry CLI - catalog inspection and state management tools.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted navigational state
//! bayberry state show
//!
//! # Reset the persisted navigational state
//! bayberry state clear
//!
//! # Print where the state record lives
//! bayberry state path
//!
//! # Fetch a category's product list from the configured API
//! bayberry fetch -c apparel
//!
//! # Run the scripted in-memory demo
//! bayberry demo
//! ```
//!
//! # Commands
//!
//! - `state` - Inspect or reset the persisted navigational state
//! - `fetch` - One-shot product list fetch against the configured API
//! - `demo` - Scripted walkthrough against an in-memory catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use bayberry_core::Category;

mod commands;

#[derive(Parser)]
#[command(name = "bayberry")]
#[command(author, version, about = "Bayberry catalog tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or reset persisted navigational state
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Fetch a category's product list from the configured API
    Fetch {
        /// Category to fetch (`apparel`, `prints`)
        #[arg(short, long, default_value = "apparel")]
        category: Category,
    },
    /// Run a scripted demo against an in-memory catalog
    Demo,
}

#[derive(Subcommand)]
enum StateAction {
    /// Print the stored record
    Show,
    /// Reset the stored record
    Clear,
    /// Print the record's path
    Path,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bayberry=info")),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::State { action } => match action {
            StateAction::Show => commands::state::show()?,
            StateAction::Clear => commands::state::clear()?,
            StateAction::Path => commands::state::path(),
        },
        Commands::Fetch { category } => commands::fetch::run(category).await?,
        Commands::Demo => commands::demo::run().await?,
    }
    Ok(())
}
