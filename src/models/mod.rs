mod day;
mod food;
mod food_entry;
mod meal;

pub use day::{DayLog, DayMeal, EntryLine};
pub use food::Food;
pub(crate) use food_entry::validate_quantity;
pub use food_entry::{EntryUpdate, FoodEntry, NewEntry};
pub use meal::{Meal, MealUpdate};
