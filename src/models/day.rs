use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use super::Meal;

/// One logged food as shown in a day view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryLine {
    pub id: i64,
    pub fdc_id: i64,
    pub description: String,
    pub quantity_g: f64,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayMeal {
    #[serde(flatten)]
    pub meal: Meal,
    pub entries: Vec<EntryLine>,
}

/// All meals of a day in position order, each with its entries in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayLog {
    pub date: NaiveDate,
    pub meals: Vec<DayMeal>,
}

impl fmt::Display for DayLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.date)?;
        writeln!(f, "{}", "-".repeat(10))?;

        if self.meals.is_empty() {
            writeln!(f, "No meals logged")?;
            return Ok(());
        }

        for day_meal in &self.meals {
            writeln!(
                f,
                "{}. {} (#{})",
                day_meal.meal.sort_order, day_meal.meal.name, day_meal.meal.id
            )?;
            for entry in &day_meal.entries {
                writeln!(
                    f,
                    "   {}. {} - {}g (#{})",
                    entry.sort_order, entry.description, entry.quantity_g, entry.id
                )?;
            }
        }

        Ok(())
    }
}
