use clap::{Args, Subcommand};

use super::OutputFormat;
use foodlog::db::FoodRepository;
use foodlog::models::Food;

#[derive(Args)]
pub struct FoodCommand {
    #[command(subcommand)]
    pub command: FoodSubcommand,
}

#[derive(Subcommand)]
pub enum FoodSubcommand {
    /// Add or refresh a food in the local catalogue
    Add {
        /// Food ID (fdc_id)
        fdc_id: i64,

        /// Description
        description: String,

        /// Brand owner
        #[arg(long)]
        brand: Option<String>,

        /// Calories per 100 g
        #[arg(long, default_value_t = 0.0)]
        kcal: f64,

        /// Protein grams per 100 g
        #[arg(long, default_value_t = 0.0)]
        protein: f64,

        /// Carbohydrate grams per 100 g
        #[arg(long, default_value_t = 0.0)]
        carb: f64,

        /// Fat grams per 100 g
        #[arg(long, default_value_t = 0.0)]
        fat: f64,
    },

    /// List foods
    List {
        /// Include archived foods
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Archive a food so it can no longer be logged
    Archive {
        /// Food ID (fdc_id)
        fdc_id: i64,
    },

    /// Make an archived food available again
    Restore {
        /// Food ID (fdc_id)
        fdc_id: i64,
    },
}

impl FoodCommand {
    pub async fn run(&self, repo: &FoodRepository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            FoodSubcommand::Add {
                fdc_id,
                description,
                brand,
                kcal,
                protein,
                carb,
                fat,
            } => {
                if description.trim().is_empty() {
                    return Err("Food description cannot be empty".into());
                }
                let mut food =
                    Food::new(*fdc_id, description.trim()).with_macros(*kcal, *protein, *carb, *fat);
                if let Some(brand) = brand {
                    food = food.with_brand_owner(brand);
                }
                let saved = repo.upsert(&food).await?;
                println!("Saved food {}: {}", saved.fdc_id, saved.description);
                Ok(())
            }

            FoodSubcommand::List { all, format } => {
                let foods = repo.list(*all).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&foods)?);
                    }
                    OutputFormat::Text => {
                        if foods.is_empty() {
                            println!("No foods found");
                            return Ok(());
                        }
                        println!("{:<10}  {:<40}  KCAL/100G", "FDC_ID", "DESCRIPTION");
                        println!("{}", "-".repeat(66));
                        for food in &foods {
                            let marker = if food.archived { " (archived)" } else { "" };
                            println!(
                                "{:<10}  {:<40}  {:.0}{}",
                                food.fdc_id, food.description, food.kcal_per_100g, marker
                            );
                        }
                        println!("\nTotal: {} food(s)", foods.len());
                    }
                }
                Ok(())
            }

            FoodSubcommand::Archive { fdc_id } => {
                repo.set_archived(*fdc_id, true).await?;
                println!("Archived food {}", fdc_id);
                Ok(())
            }

            FoodSubcommand::Restore { fdc_id } => {
                repo.set_archived(*fdc_id, false).await?;
                println!("Restored food {}", fdc_id);
                Ok(())
            }
        }
    }
}
