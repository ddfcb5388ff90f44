use clap::{Args, Subcommand};

use super::{parse_date, OutputFormat};
use foodlog::db::{EntryRepository, MealRepository};

#[derive(Args)]
pub struct MealCommand {
    #[command(subcommand)]
    pub command: MealSubcommand,
}

#[derive(Subcommand)]
pub enum MealSubcommand {
    /// Add a meal at the end of a day
    Add {
        /// Date (YYYY-MM-DD)
        date: String,

        /// Custom name (default: "Meal N")
        #[arg(long)]
        name: Option<String>,
    },

    /// List the meals of a day in order
    List {
        /// Date (YYYY-MM-DD)
        date: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Move a meal to a new position within its day
    Move {
        /// Meal ID
        id: i64,

        /// Target position (1 = first)
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },

    /// Give a meal a custom name
    Rename {
        /// Meal ID
        id: i64,

        /// New name
        name: String,
    },

    /// Delete an empty meal
    Delete {
        /// Meal ID
        id: i64,
    },

    /// Copy a meal's entries onto another day
    Copy {
        /// Source meal ID
        id: i64,

        /// Destination date (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Destination meal name, created if missing
        #[arg(long, default_value = "Meal 1")]
        name: String,
    },
}

impl MealCommand {
    pub async fn run(
        &self,
        meals: &MealRepository,
        entries: &EntryRepository,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            MealSubcommand::Add { date, name } => {
                let date = parse_date(date)?;
                let created = match name {
                    Some(name) => meals.create_named(date, name).await?,
                    None => meals.create(date).await?,
                };
                println!("Created meal:");
                println!("{}", created);
                Ok(())
            }

            MealSubcommand::List { date, format } => {
                let meals = meals.list_for_day(parse_date(date)?).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&meals)?);
                    }
                    OutputFormat::Text => {
                        if meals.is_empty() {
                            println!("No meals found");
                            return Ok(());
                        }
                        println!("{:<4}  {:<8}  NAME", "POS", "ID");
                        println!("{}", "-".repeat(40));
                        for meal in &meals {
                            println!("{:<4}  {:<8}  {}", meal.sort_order, meal.id, meal.name);
                        }
                    }
                }
                Ok(())
            }

            MealSubcommand::Move { id, position } => {
                let applied = meals.move_to(*id, *position).await?;
                println!("Moved meal {} to position {}", id, applied);
                Ok(())
            }

            MealSubcommand::Rename { id, name } => {
                let meal = meals.rename(*id, name).await?;
                println!("Renamed meal:");
                println!("{}", meal);
                Ok(())
            }

            MealSubcommand::Delete { id } => {
                meals.delete(*id).await?;
                println!("Deleted meal {}", id);
                Ok(())
            }

            MealSubcommand::Copy { id, to, name } => {
                let date = parse_date(to)?;
                let count = entries.copy_meal(*id, date, name).await?;
                println!("Copied {} entr(ies) to '{}' on {}", count, name, date);
                Ok(())
            }
        }
    }
}
