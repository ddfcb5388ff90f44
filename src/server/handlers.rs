use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::error::OrderError;
use crate::models::{DayLog, EntryUpdate, Food, FoodEntry, Meal, MealUpdate, NewEntry};

type ApiResult<T> = Result<T, ApiError>;

fn parse_date(date: &str) -> Result<NaiveDate, OrderError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| OrderError::InvalidInput(format!("invalid date '{}', use YYYY-MM-DD", date)))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
pub struct CreateMeal {
    date: String,
    name: Option<String>,
}

pub async fn create_meal(
    State(state): State<AppState>,
    Json(body): Json<CreateMeal>,
) -> ApiResult<(StatusCode, Json<Meal>)> {
    let date = parse_date(&body.date)?;
    let meal = match body.name {
        Some(name) => state.meals.create_named(date, &name).await?,
        None => state.meals.create(date).await?,
    };
    Ok((StatusCode::CREATED, Json(meal)))
}

pub async fn update_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<MealUpdate>,
) -> ApiResult<Json<Meal>> {
    let meal = if update.is_empty() {
        state
            .meals
            .get(id)
            .await?
            .ok_or_else(|| OrderError::not_found("meal", id))?
    } else {
        state.meals.update(id, &update).await?
    };
    Ok(Json(meal))
}

pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.meals.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct CopyMeal {
    date: String,
    meal_name: String,
}

#[derive(Serialize)]
pub struct CopyResult {
    message: &'static str,
    added_count: usize,
}

pub async fn copy_meal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CopyMeal>,
) -> ApiResult<(StatusCode, Json<CopyResult>)> {
    let date = parse_date(&body.date)?;
    let added_count = state.entries.copy_meal(id, date, &body.meal_name).await?;
    let message = if added_count == 0 {
        "Source meal has no entries to copy."
    } else {
        "Meal copied successfully."
    };
    Ok((
        StatusCode::CREATED,
        Json(CopyResult {
            message,
            added_count,
        }),
    ))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Json(body): Json<NewEntry>,
) -> ApiResult<(StatusCode, Json<FoodEntry>)> {
    let entry = state.entries.create(&body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<EntryUpdate>,
) -> ApiResult<Json<FoodEntry>> {
    Ok(Json(state.entries.update(id, &update).await?))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.entries.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn show_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<Json<DayLog>> {
    let date = parse_date(&date)?;
    Ok(Json(state.meals.day(date).await?))
}

pub async fn upsert_food(
    State(state): State<AppState>,
    Json(food): Json<Food>,
) -> ApiResult<(StatusCode, Json<Food>)> {
    if food.description.trim().is_empty() {
        return Err(OrderError::InvalidInput("food description cannot be empty".into()).into());
    }
    Ok((StatusCode::CREATED, Json(state.foods.upsert(&food).await?)))
}
