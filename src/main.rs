use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigCommand, DayCommand, EntryCommand, FoodCommand, MealCommand};
use foodlog::config::Config;
use foodlog::db::{EntryRepository, FoodRepository, MealRepository, Store};

#[derive(Parser)]
#[command(name = "foodlog")]
#[command(version)]
#[command(about = "Log meals and foods per day, in order", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the meals of a day
    Meal(MealCommand),

    /// Manage the food entries of a meal
    Entry(EntryCommand),

    /// Manage the local food catalogue
    Food(FoodCommand),

    /// Show a whole day
    Day(DayCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("foodlog=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Meal(cmd)) => {
            let store = Store::open(&config).await?;
            let meals = MealRepository::new(store.clone());
            let entries = EntryRepository::new(store);
            cmd.run(&meals, &entries).await?;
        }
        Some(Commands::Entry(cmd)) => {
            let store = Store::open(&config).await?;
            cmd.run(&EntryRepository::new(store)).await?;
        }
        Some(Commands::Food(cmd)) => {
            let store = Store::open(&config).await?;
            cmd.run(&FoodRepository::new(store.pool().clone())).await?;
        }
        Some(Commands::Day(cmd)) => {
            let store = Store::open(&config).await?;
            cmd.run(&MealRepository::new(store)).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
