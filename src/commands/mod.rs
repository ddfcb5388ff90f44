use chrono::NaiveDate;
use clap::ValueEnum;

mod config_cmd;
mod day;
mod entry;
mod food;
mod meal;

pub use config_cmd::ConfigCommand;
pub use day::DayCommand;
pub use entry::EntryCommand;
pub use food::FoodCommand;
pub use meal::MealCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parses a YYYY-MM-DD date argument.
pub(crate) fn parse_date(date: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", date))
}
