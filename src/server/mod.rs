//! HTTP surface over the meal and entry repositories.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check
//! - `POST /api/meals`: Create a meal at the end of a day
//! - `PATCH /api/meals/{id}`: Move and/or rename a meal
//! - `DELETE /api/meals/{id}`: Delete an empty meal
//! - `POST /api/meals/{id}/copy_to`: Copy a meal's entries onto another day
//! - `POST /api/entries`: Log a food at the end of a meal
//! - `PATCH /api/entries/{id}`: Move an entry and/or change its quantity
//! - `DELETE /api/entries/{id}`: Delete an entry
//! - `GET /api/days/{date}`: Meals and entries of a day, in order
//! - `POST /api/foods`: Add or refresh a catalogue food

mod error;
mod handlers;

pub use error::ApiError;

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::db::{EntryRepository, FoodRepository, MealRepository, Store};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub meals: Arc<MealRepository>,
    pub entries: Arc<EntryRepository>,
    pub foods: FoodRepository,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            foods: FoodRepository::new(store.pool().clone()),
            meals: Arc::new(MealRepository::new(store.clone())),
            entries: Arc::new(EntryRepository::new(store)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/meals", post(handlers::create_meal))
        .route(
            "/api/meals/{id}",
            patch(handlers::update_meal).delete(handlers::delete_meal),
        )
        .route("/api/meals/{id}/copy_to", post(handlers::copy_meal))
        .route("/api/entries", post(handlers::create_entry))
        .route(
            "/api/entries/{id}",
            patch(handlers::update_entry).delete(handlers::delete_entry),
        )
        .route("/api/days/{date}", get(handlers::show_day))
        .route("/api/foods", post(handlers::upsert_food))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
