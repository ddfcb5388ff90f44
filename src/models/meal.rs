use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A meal within a day, ordered by `sort_order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    pub date: NaiveDate,
    pub name: String,
    pub sort_order: i64,
}

/// Partial update of a meal. A position change is applied before a rename,
/// so an explicit name always wins over the regenerated label.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealUpdate {
    pub name: Option<String>,
    pub sort_order: Option<i64>,
}

impl MealUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.sort_order.is_none()
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({}, position {})",
            self.id, self.name, self.date, self.sort_order
        )
    }
}
