use chrono::NaiveDate;
use sqlx::SqliteConnection;

use super::Store;
use crate::error::{OrderError, OrderResult};
use crate::models::{DayLog, DayMeal, EntryLine, Meal, MealUpdate};
use crate::ordering::{self, label, Meals};

pub struct MealRepository {
    store: Store,
}

// Row types for database queries
#[derive(sqlx::FromRow)]
struct MealRow {
    id: i64,
    date: String,
    name: String,
    sort_order: i64,
}

#[derive(sqlx::FromRow)]
struct EntryLineRow {
    id: i64,
    meal_id: i64,
    fdc_id: i64,
    description: Option<String>,
    quantity_g: f64,
    sort_order: i64,
}

const DELETED_FOOD: &str = "[deleted item]";

impl MealRow {
    fn into_meal(self) -> Result<Meal, sqlx::Error> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Meal {
            id: self.id,
            date,
            name: self.name,
            sort_order: self.sort_order,
        })
    }
}

async fn fetch_meal(conn: &mut SqliteConnection, id: i64) -> Result<Option<Meal>, sqlx::Error> {
    let row: Option<MealRow> = sqlx::query_as("SELECT * FROM meals WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(MealRow::into_meal).transpose()
}

/// Appends a meal to the end of `date_key`'s list. Without a name the meal
/// gets the auto label of its position.
async fn insert_trailing(
    conn: &mut SqliteConnection,
    date_key: &String,
    name: Option<&str>,
) -> OrderResult<Meal> {
    let position = ordering::next_position::<Meals>(conn, date_key).await?;
    let auto = name.is_none();
    let meal_name = name
        .map(str::to_string)
        .unwrap_or_else(|| label::auto_label(position));

    let row: MealRow = sqlx::query_as(
        "INSERT INTO meals (date, name, auto_name, sort_order) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(date_key)
    .bind(&meal_name)
    .bind(auto)
    .bind(position)
    .fetch_one(&mut *conn)
    .await?;

    ordering::verify_dense::<Meals>(conn, date_key).await?;
    tracing::info!(id = row.id, date = %date_key, position, "created meal");
    Ok(row.into_meal()?)
}

/// Finds the first meal on `date_key` called `name`, creating it at the end
/// of the day if there is none.
pub(super) async fn find_or_create_in(
    conn: &mut SqliteConnection,
    date_key: &String,
    name: &str,
) -> OrderResult<Meal> {
    let existing: Option<MealRow> = sqlx::query_as(
        "SELECT * FROM meals WHERE date = ? AND name = ? ORDER BY sort_order LIMIT 1",
    )
    .bind(date_key)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    match existing {
        Some(row) => Ok(row.into_meal()?),
        None => insert_trailing(conn, date_key, Some(name)).await,
    }
}

fn validate_name(name: &str) -> OrderResult<()> {
    if name.trim().is_empty() {
        return Err(OrderError::InvalidInput("meal name cannot be empty".into()));
    }
    Ok(())
}

impl MealRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Creates a meal at the end of `date` labelled "Meal N".
    pub async fn create(&self, date: NaiveDate) -> OrderResult<Meal> {
        let date_key = date.to_string();
        self.store
            .transact("create meal", |conn| {
                let date_key = date_key.clone();
                Box::pin(async move { insert_trailing(conn, &date_key, None).await })
            })
            .await
    }

    /// Creates a meal at the end of `date` with a custom name.
    pub async fn create_named(&self, date: NaiveDate, name: &str) -> OrderResult<Meal> {
        validate_name(name)?;
        let date_key = date.to_string();
        self.store
            .transact("create meal", |conn| {
                let date_key = date_key.clone();
                let name = name.trim().to_string();
                Box::pin(async move { insert_trailing(conn, &date_key, Some(&name)).await })
            })
            .await
    }

    pub async fn find_or_create(&self, date: NaiveDate, name: &str) -> OrderResult<Meal> {
        validate_name(name)?;
        let date_key = date.to_string();
        self.store
            .transact("find or create meal", |conn| {
                let date_key = date_key.clone();
                let name = name.to_string();
                Box::pin(async move { find_or_create_in(conn, &date_key, &name).await })
            })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Meal>, sqlx::Error> {
        let mut conn = self.store.pool().acquire().await?;
        fetch_meal(&mut conn, id).await
    }

    pub async fn list_for_day(&self, date: NaiveDate) -> Result<Vec<Meal>, sqlx::Error> {
        let rows: Vec<MealRow> =
            sqlx::query_as("SELECT * FROM meals WHERE date = ? ORDER BY sort_order")
                .bind(date.to_string())
                .fetch_all(self.store.pool())
                .await?;
        rows.into_iter().map(MealRow::into_meal).collect()
    }

    /// Applies a position change and/or rename in one transaction.
    pub async fn update(&self, id: i64, update: &MealUpdate) -> OrderResult<Meal> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        let policy = self.store.position_policy();

        self.store
            .transact("update meal", |conn| {
                let update = update.clone();
                Box::pin(async move {
                    if let Some(position) = update.sort_order {
                        ordering::move_child::<Meals>(conn, id, position, policy).await?;
                    }
                    if let Some(name) = &update.name {
                        let result =
                            sqlx::query("UPDATE meals SET name = ?, auto_name = 0 WHERE id = ?")
                                .bind(name)
                                .bind(id)
                                .execute(&mut *conn)
                                .await?;
                        if result.rows_affected() == 0 {
                            return Err(OrderError::not_found("meal", id));
                        }
                    }
                    fetch_meal(conn, id)
                        .await?
                        .ok_or_else(|| OrderError::not_found("meal", id))
                })
            })
            .await
    }

    /// Moves a meal within its day and returns the applied position.
    pub async fn move_to(&self, id: i64, position: i64) -> OrderResult<i64> {
        let policy = self.store.position_policy();
        self.store
            .transact("move meal", |conn| {
                Box::pin(ordering::move_child::<Meals>(conn, id, position, policy))
            })
            .await
    }

    /// Gives a meal a custom name; its label is no longer regenerated.
    pub async fn rename(&self, id: i64, name: &str) -> OrderResult<Meal> {
        let update = MealUpdate {
            name: Some(name.to_string()),
            sort_order: None,
        };
        self.update(id, &update).await
    }

    /// Deletes an empty meal and renumbers the rest of its day.
    pub async fn delete(&self, id: i64) -> OrderResult<()> {
        self.store
            .transact("delete meal", |conn| {
                Box::pin(async move {
                    let has_entries: bool = sqlx::query_scalar(
                        "SELECT EXISTS(SELECT 1 FROM food_entries WHERE meal_id = ?)",
                    )
                    .bind(id)
                    .fetch_one(&mut *conn)
                    .await?;
                    if has_entries {
                        return Err(OrderError::HasEntries(id));
                    }
                    ordering::remove_child::<Meals>(conn, id).await
                })
            })
            .await
    }

    /// Meals of a day with their entries, both in position order.
    pub async fn day(&self, date: NaiveDate) -> OrderResult<DayLog> {
        let date_key = date.to_string();
        let mut tx = self.store.pool().begin().await?;

        let meal_rows: Vec<MealRow> =
            sqlx::query_as("SELECT * FROM meals WHERE date = ? ORDER BY sort_order")
                .bind(&date_key)
                .fetch_all(&mut *tx)
                .await?;

        let entry_rows: Vec<EntryLineRow> = sqlx::query_as(
            r#"
            SELECT e.id, e.meal_id, e.fdc_id, f.description, e.quantity_g, e.sort_order
            FROM food_entries e
            JOIN meals m ON m.id = e.meal_id
            LEFT JOIN foods f ON f.fdc_id = e.fdc_id
            WHERE m.date = ?
            ORDER BY e.meal_id, e.sort_order
            "#,
        )
        .bind(&date_key)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut meals = Vec::with_capacity(meal_rows.len());
        for row in meal_rows {
            let meal = row.into_meal()?;
            let entries = entry_rows
                .iter()
                .filter(|e| e.meal_id == meal.id)
                .map(|e| EntryLine {
                    id: e.id,
                    fdc_id: e.fdc_id,
                    description: e
                        .description
                        .clone()
                        .unwrap_or_else(|| DELETED_FOOD.to_string()),
                    quantity_g: e.quantity_g,
                    sort_order: e.sort_order,
                })
                .collect();
            meals.push(DayMeal { meal, entries });
        }

        Ok(DayLog { date, meals })
    }
}
