use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{OrderError, OrderResult};

/// A quantity of one food logged in a meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FoodEntry {
    pub id: i64,
    pub meal_id: i64,
    pub fdc_id: i64,
    pub quantity_g: f64,
    pub sort_order: i64,
}

/// Fields a caller supplies to log a new entry; the position is allocated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntry {
    pub meal_id: i64,
    pub fdc_id: i64,
    pub quantity_g: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryUpdate {
    pub quantity_g: Option<f64>,
    pub sort_order: Option<i64>,
}

/// Rejects negative or non-finite gram amounts.
pub(crate) fn validate_quantity(quantity_g: f64) -> OrderResult<f64> {
    if quantity_g.is_finite() && quantity_g >= 0.0 {
        Ok(quantity_g)
    } else {
        Err(OrderError::InvalidInput(format!(
            "quantity_g must be a non-negative number, got {}",
            quantity_g
        )))
    }
}

impl fmt::Display for FoodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} food {} {}g (meal {}, position {})",
            self.id, self.fdc_id, self.quantity_g, self.meal_id, self.sort_order
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity(0.0).unwrap(), 0.0);
        assert_eq!(validate_quantity(150.5).unwrap(), 150.5);
        assert!(validate_quantity(-5.0).is_err());
        assert!(validate_quantity(f64::NAN).is_err());
        assert!(validate_quantity(f64::INFINITY).is_err());
    }

    #[test]
    fn test_entry_display() {
        let entry = FoodEntry {
            id: 3,
            meal_id: 1,
            fdc_id: 1234,
            quantity_g: 150.0,
            sort_order: 2,
        };
        assert_eq!(entry.to_string(), "#3 food 1234 150g (meal 1, position 2)");
    }
}
