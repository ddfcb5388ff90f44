use clap::{Args, Subcommand};

use super::{parse_date, OutputFormat};
use foodlog::db::MealRepository;

#[derive(Args)]
pub struct DayCommand {
    #[command(subcommand)]
    pub command: DaySubcommand,
}

#[derive(Subcommand)]
pub enum DaySubcommand {
    /// Show a day's meals and entries in order
    Show {
        /// Date (YYYY-MM-DD)
        date: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl DayCommand {
    pub async fn run(&self, meals: &MealRepository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DaySubcommand::Show { date, format } => {
                let log = meals.day(parse_date(date)?).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&log)?),
                    OutputFormat::Text => print!("{}", log),
                }
                Ok(())
            }
        }
    }
}
