//! Food log core library
//!
//! Meals per day and food entries per meal, each kept in a dense,
//! gap-free `sort_order` sequence starting at 1.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod ordering;
pub mod server;

pub use config::{Config, ConfigError, ConfigSource, ConfigValue};
pub use db::{init_db, EntryRepository, FoodRepository, MealRepository, RetryPolicy, Store};
pub use error::{OrderError, OrderResult};
pub use models::{DayLog, EntryUpdate, Food, FoodEntry, Meal, MealUpdate, NewEntry};
pub use ordering::PositionPolicy;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
