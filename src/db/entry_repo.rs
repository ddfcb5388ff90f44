use chrono::NaiveDate;
use sqlx::SqliteConnection;
use std::collections::BTreeSet;

use super::meal_repo::find_or_create_in;
use super::{FoodRepository, Store};
use crate::error::{OrderError, OrderResult};
use crate::models::{validate_quantity, EntryUpdate, FoodEntry, NewEntry};
use crate::ordering::{self, Entries};

pub struct EntryRepository {
    store: Store,
    foods: FoodRepository,
}

async fn fetch_entry(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<FoodEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM food_entries WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

async fn require_meal(conn: &mut SqliteConnection, meal_id: i64) -> OrderResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM meals WHERE id = ?)")
        .bind(meal_id)
        .fetch_one(&mut *conn)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(OrderError::not_found("meal", meal_id))
    }
}

/// Appends an entry to the end of `meal_id`.
async fn insert_trailing(
    conn: &mut SqliteConnection,
    meal_id: i64,
    fdc_id: i64,
    quantity_g: f64,
) -> OrderResult<FoodEntry> {
    let position = ordering::next_position::<Entries>(conn, &meal_id).await?;

    let entry: FoodEntry = sqlx::query_as(
        r#"
        INSERT INTO food_entries (meal_id, fdc_id, quantity_g, sort_order)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(meal_id)
    .bind(fdc_id)
    .bind(quantity_g)
    .bind(position)
    .fetch_one(&mut *conn)
    .await?;

    ordering::verify_dense::<Entries>(conn, &meal_id).await?;
    tracing::info!(id = entry.id, meal_id, position, "created entry");
    Ok(entry)
}

impl EntryRepository {
    pub fn new(store: Store) -> Self {
        let foods = FoodRepository::new(store.pool().clone());
        Self { store, foods }
    }

    /// Logs a food at the end of a meal.
    pub async fn create(&self, new_entry: &NewEntry) -> OrderResult<FoodEntry> {
        let quantity_g = validate_quantity(new_entry.quantity_g)?;
        self.foods.require_available(new_entry.fdc_id).await?;

        let (meal_id, fdc_id) = (new_entry.meal_id, new_entry.fdc_id);
        self.store
            .transact("create entry", |conn| {
                Box::pin(async move {
                    require_meal(conn, meal_id).await?;
                    insert_trailing(conn, meal_id, fdc_id, quantity_g).await
                })
            })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<FoodEntry>, sqlx::Error> {
        let mut conn = self.store.pool().acquire().await?;
        fetch_entry(&mut conn, id).await
    }

    pub async fn list_for_meal(&self, meal_id: i64) -> Result<Vec<FoodEntry>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM food_entries WHERE meal_id = ? ORDER BY sort_order")
            .bind(meal_id)
            .fetch_all(self.store.pool())
            .await
    }

    /// Changes quantity and/or position in one transaction; if either part
    /// fails neither is applied.
    pub async fn update(&self, id: i64, update: &EntryUpdate) -> OrderResult<FoodEntry> {
        let quantity_g = update.quantity_g.map(validate_quantity).transpose()?;
        let sort_order = update.sort_order;
        let policy = self.store.position_policy();

        self.store
            .transact("update entry", |conn| {
                Box::pin(async move {
                    if let Some(position) = sort_order {
                        ordering::move_child::<Entries>(conn, id, position, policy).await?;
                    }
                    if let Some(quantity_g) = quantity_g {
                        let result =
                            sqlx::query("UPDATE food_entries SET quantity_g = ? WHERE id = ?")
                                .bind(quantity_g)
                                .bind(id)
                                .execute(&mut *conn)
                                .await?;
                        if result.rows_affected() == 0 {
                            return Err(OrderError::not_found("entry", id));
                        }
                    }
                    fetch_entry(conn, id)
                        .await?
                        .ok_or_else(|| OrderError::not_found("entry", id))
                })
            })
            .await
    }

    /// Moves an entry within its meal and returns the applied position.
    pub async fn move_to(&self, id: i64, position: i64) -> OrderResult<i64> {
        let policy = self.store.position_policy();
        self.store
            .transact("move entry", |conn| {
                Box::pin(ordering::move_child::<Entries>(conn, id, position, policy))
            })
            .await
    }

    /// Deletes an entry and renumbers the rest of its meal.
    pub async fn delete(&self, id: i64) -> OrderResult<()> {
        self.store
            .transact("delete entry", |conn| {
                Box::pin(ordering::remove_child::<Entries>(conn, id))
            })
            .await
    }

    /// Appends copies of a meal's entries, in order, to the meal called
    /// `meal_name` on `date` (created if missing). Returns how many entries
    /// were copied.
    pub async fn copy_meal(
        &self,
        source_meal_id: i64,
        date: NaiveDate,
        meal_name: &str,
    ) -> OrderResult<usize> {
        if meal_name.trim().is_empty() {
            return Err(OrderError::InvalidInput("meal name cannot be empty".into()));
        }
        {
            let mut conn = self.store.pool().acquire().await?;
            require_meal(&mut conn, source_meal_id).await?;
        }

        let source = self.list_for_meal(source_meal_id).await?;
        if source.is_empty() {
            return Ok(0);
        }

        // Food lookups stay outside the ordering transaction.
        let fdc_ids: BTreeSet<i64> = source.iter().map(|e| e.fdc_id).collect();
        for fdc_id in fdc_ids {
            self.foods.require_available(fdc_id).await?;
        }

        let date_key = date.to_string();
        self.store
            .transact("copy meal", |conn| {
                let source = source.clone();
                let date_key = date_key.clone();
                let meal_name = meal_name.to_string();
                Box::pin(async move {
                    let dest = find_or_create_in(conn, &date_key, &meal_name).await?;
                    for entry in &source {
                        insert_trailing(conn, dest.id, entry.fdc_id, entry.quantity_g).await?;
                    }
                    tracing::info!(
                        source_meal_id,
                        dest_meal_id = dest.id,
                        count = source.len(),
                        "copied meal"
                    );
                    Ok(source.len())
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_db, MealRepository, RetryPolicy};
    use crate::models::Food;
    use std::time::Duration;
    use tempfile::TempDir;

    struct TestContext {
        entries: EntryRepository,
        meals: MealRepository,
        foods: FoodRepository,
        store: Store,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(temp_dir.path().join("test.db")).await.unwrap();
        let store = Store::new(pool.clone()).with_retry(RetryPolicy {
            attempts: 10,
            backoff: Duration::from_millis(5),
        });
        let foods = FoodRepository::new(pool);
        foods
            .upsert(&Food::new(1, "Test Food").with_macros(100.0, 10.0, 5.0, 2.0))
            .await
            .unwrap();
        TestContext {
            entries: EntryRepository::new(store.clone()),
            meals: MealRepository::new(store.clone()),
            foods,
            store,
            _temp_dir: temp_dir,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn new_entry(meal_id: i64, quantity_g: f64) -> NewEntry {
        NewEntry {
            meal_id,
            fdc_id: 1,
            quantity_g,
        }
    }

    async fn ids(repo: &EntryRepository, meal_id: i64) -> Vec<i64> {
        repo.list_for_meal(meal_id)
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect()
    }

    #[tokio::test]
    async fn test_entry_crud_flow() {
        let ctx = setup().await;
        let meal = ctx.meals.create(day(1)).await.unwrap();

        let first = ctx.entries.create(&new_entry(meal.id, 100.0)).await.unwrap();
        assert_eq!(first.sort_order, 1);
        let second = ctx.entries.create(&new_entry(meal.id, 50.0)).await.unwrap();
        assert_eq!(second.sort_order, 2);

        let updated = ctx
            .entries
            .update(
                first.id,
                &EntryUpdate {
                    quantity_g: Some(150.0),
                    sort_order: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.quantity_g, 150.0);
        assert_eq!(updated.sort_order, 1);

        // move second entry to top
        assert_eq!(ctx.entries.move_to(second.id, 1).await.unwrap(), 1);
        assert_eq!(ids(&ctx.entries, meal.id).await, vec![second.id, first.id]);

        ctx.entries.delete(second.id).await.unwrap();
        let remaining = ctx.entries.list_for_meal(meal.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, first.id);
        assert_eq!(remaining[0].sort_order, 1);
        assert_eq!(remaining[0].quantity_g, 150.0);
    }

    #[tokio::test]
    async fn test_negative_quantity_rejected() {
        let ctx = setup().await;
        let meal = ctx.meals.create(day(1)).await.unwrap();

        let result = ctx.entries.create(&new_entry(meal.id, -10.0)).await;
        assert!(matches!(result, Err(OrderError::InvalidInput(_))));

        let entry = ctx.entries.create(&new_entry(meal.id, 10.0)).await.unwrap();
        let result = ctx
            .entries
            .update(
                entry.id,
                &EntryUpdate {
                    quantity_g: Some(-5.0),
                    sort_order: None,
                },
            )
            .await;
        assert!(matches!(result, Err(OrderError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_requires_available_food_and_meal() {
        let ctx = setup().await;
        let meal = ctx.meals.create(day(1)).await.unwrap();

        let missing_food = NewEntry {
            meal_id: meal.id,
            fdc_id: 999,
            quantity_g: 10.0,
        };
        assert!(matches!(
            ctx.entries.create(&missing_food).await,
            Err(OrderError::FoodUnavailable(999))
        ));

        ctx.foods.set_archived(1, true).await.unwrap();
        assert!(matches!(
            ctx.entries.create(&new_entry(meal.id, 10.0)).await,
            Err(OrderError::FoodUnavailable(1))
        ));
        ctx.foods.set_archived(1, false).await.unwrap();

        assert!(matches!(
            ctx.entries.create(&new_entry(meal.id + 100, 10.0)).await,
            Err(OrderError::NotFound { kind: "meal", .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_middle_entry_reorders() {
        let ctx = setup().await;
        let meal = ctx.meals.create(day(1)).await.unwrap();
        let mut created = Vec::new();
        for qty in [100.0, 200.0, 300.0, 400.0] {
            created.push(ctx.entries.create(&new_entry(meal.id, qty)).await.unwrap());
        }

        ctx.entries.delete(created[2].id).await.unwrap();

        let positions: Vec<i64> = ctx
            .entries
            .list_for_meal(meal.id)
            .await
            .unwrap()
            .iter()
            .map(|e| e.sort_order)
            .collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_update_rolls_back_move_when_quantity_fails() {
        let ctx = setup().await;
        let meal = ctx.meals.create(day(1)).await.unwrap();
        let first = ctx.entries.create(&new_entry(meal.id, 100.0)).await.unwrap();
        let second = ctx.entries.create(&new_entry(meal.id, 50.0)).await.unwrap();

        sqlx::query(
            "CREATE TRIGGER fail_quantity BEFORE UPDATE OF quantity_g ON food_entries \
             BEGIN SELECT RAISE(ABORT, 'boom'); END",
        )
        .execute(ctx.store.pool())
        .await
        .unwrap();

        let result = ctx
            .entries
            .update(
                second.id,
                &EntryUpdate {
                    quantity_g: Some(75.0),
                    sort_order: Some(1),
                },
            )
            .await;
        assert!(matches!(result, Err(OrderError::Database(_))));

        let entries = ctx.entries.list_for_meal(meal.id).await.unwrap();
        assert_eq!(
            entries.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
        assert_eq!(
            entries.iter().map(|e| e.quantity_g).collect::<Vec<_>>(),
            vec![100.0, 50.0]
        );
    }

    #[tokio::test]
    async fn test_update_leaves_position_alone() {
        let ctx = setup().await;
        let meal = ctx.meals.create(day(1)).await.unwrap();
        ctx.entries.create(&new_entry(meal.id, 1.0)).await.unwrap();
        let second = ctx.entries.create(&new_entry(meal.id, 2.0)).await.unwrap();

        let updated = ctx
            .entries
            .update(
                second.id,
                &EntryUpdate {
                    quantity_g: Some(3.0),
                    sort_order: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.sort_order, 2);
    }

    #[tokio::test]
    async fn test_copy_meal_appends_in_order() {
        let ctx = setup().await;
        let source = ctx.meals.create(day(1)).await.unwrap();
        let dest = ctx.meals.create(day(2)).await.unwrap();
        ctx.entries.create(&new_entry(source.id, 100.0)).await.unwrap();
        ctx.entries.create(&new_entry(source.id, 150.0)).await.unwrap();
        ctx.entries.create(&new_entry(dest.id, 50.0)).await.unwrap();

        let added = ctx
            .entries
            .copy_meal(source.id, day(2), "Meal 1")
            .await
            .unwrap();
        assert_eq!(added, 2);

        let dest_entries = ctx.entries.list_for_meal(dest.id).await.unwrap();
        assert_eq!(
            dest_entries.iter().map(|e| e.sort_order).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(
            dest_entries.iter().map(|e| e.quantity_g).collect::<Vec<_>>(),
            vec![50.0, 100.0, 150.0]
        );
    }

    #[tokio::test]
    async fn test_copy_meal_creates_destination() {
        let ctx = setup().await;
        let source = ctx.meals.create(day(1)).await.unwrap();
        ctx.meals.create(day(3)).await.unwrap();
        ctx.entries.create(&new_entry(source.id, 80.0)).await.unwrap();

        let added = ctx
            .entries
            .copy_meal(source.id, day(3), "Leftovers")
            .await
            .unwrap();
        assert_eq!(added, 1);

        let meals = ctx.meals.list_for_day(day(3)).await.unwrap();
        assert_eq!(meals.len(), 2);
        assert_eq!(meals[1].name, "Leftovers");
        assert_eq!(meals[1].sort_order, 2);
        assert_eq!(ctx.entries.list_for_meal(meals[1].id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_copy_empty_meal() {
        let ctx = setup().await;
        let source = ctx.meals.create(day(1)).await.unwrap();

        let added = ctx
            .entries
            .copy_meal(source.id, day(2), "Meal 1")
            .await
            .unwrap();
        assert_eq!(added, 0);
        assert!(ctx.meals.list_for_day(day(2)).await.unwrap().is_empty());

        assert!(matches!(
            ctx.entries.copy_meal(source.id + 1, day(2), "Meal 1").await,
            Err(OrderError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_creates_stay_dense() {
        let ctx = setup().await;
        let meal = ctx.meals.create(day(1)).await.unwrap();

        let mut handles = Vec::new();
        for task in 0..3 {
            let repo = EntryRepository::new(ctx.store.clone());
            let meal_id = meal.id;
            handles.push(tokio::spawn(async move {
                for i in 0..3 {
                    repo.create(&new_entry(meal_id, (task * 10 + i) as f64))
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let positions: Vec<i64> = ctx
            .entries
            .list_for_meal(meal.id)
            .await
            .unwrap()
            .iter()
            .map(|e| e.sort_order)
            .collect();
        assert_eq!(positions, (1..=9).collect::<Vec<_>>());
    }
}
