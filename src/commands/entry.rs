use clap::{Args, Subcommand};

use foodlog::db::EntryRepository;
use foodlog::models::{EntryUpdate, NewEntry};

#[derive(Args)]
pub struct EntryCommand {
    #[command(subcommand)]
    pub command: EntrySubcommand,
}

#[derive(Subcommand)]
pub enum EntrySubcommand {
    /// Log a food at the end of a meal
    Add {
        /// Meal ID
        meal_id: i64,

        /// Food ID (fdc_id)
        fdc_id: i64,

        /// Quantity in grams
        #[arg(long, short)]
        quantity: f64,
    },

    /// Move an entry to a new position within its meal
    Move {
        /// Entry ID
        id: i64,

        /// Target position (1 = first)
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },

    /// Change an entry's quantity and/or position
    Update {
        /// Entry ID
        id: i64,

        /// New quantity in grams
        #[arg(long, short)]
        quantity: Option<f64>,

        /// New position
        #[arg(long, short, allow_negative_numbers = true)]
        position: Option<i64>,
    },

    /// Delete an entry
    Delete {
        /// Entry ID
        id: i64,
    },
}

impl EntryCommand {
    pub async fn run(&self, repo: &EntryRepository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            EntrySubcommand::Add {
                meal_id,
                fdc_id,
                quantity,
            } => {
                let entry = repo
                    .create(&NewEntry {
                        meal_id: *meal_id,
                        fdc_id: *fdc_id,
                        quantity_g: *quantity,
                    })
                    .await?;
                println!("Created entry:");
                println!("{}", entry);
                Ok(())
            }

            EntrySubcommand::Move { id, position } => {
                let applied = repo.move_to(*id, *position).await?;
                println!("Moved entry {} to position {}", id, applied);
                Ok(())
            }

            EntrySubcommand::Update {
                id,
                quantity,
                position,
            } => {
                if quantity.is_none() && position.is_none() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }
                let entry = repo
                    .update(
                        *id,
                        &EntryUpdate {
                            quantity_g: *quantity,
                            sort_order: *position,
                        },
                    )
                    .await?;
                println!("Updated entry:");
                println!("{}", entry);
                Ok(())
            }

            EntrySubcommand::Delete { id } => {
                repo.delete(*id).await?;
                println!("Deleted entry {}", id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: EntrySubcommand,
    }

    #[test]
    fn test_move_accepts_negative_position() {
        let cli = TestCli::try_parse_from(["foodlog", "move", "7", "-2"]).unwrap();
        assert!(matches!(
            cli.command,
            EntrySubcommand::Move {
                id: 7,
                position: -2
            }
        ));
    }

    #[test]
    fn test_update_accepts_negative_position() {
        let cli =
            TestCli::try_parse_from(["foodlog", "update", "7", "--position", "-1"]).unwrap();
        assert!(matches!(
            cli.command,
            EntrySubcommand::Update {
                id: 7,
                quantity: None,
                position: Some(-1)
            }
        ));
    }
}
