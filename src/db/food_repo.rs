use sqlx::SqlitePool;

use crate::error::{OrderError, OrderResult};
use crate::models::Food;

/// Local food catalogue. Entries may only reference foods that are present
/// here and not archived.
#[derive(Clone)]
pub struct FoodRepository {
    pool: SqlitePool,
}

impl FoodRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a food or refreshes an existing one with the same `fdc_id`.
    pub async fn upsert(&self, food: &Food) -> Result<Food, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO foods (fdc_id, description, brand_owner, kcal_per_100g, protein_g_per_100g, carb_g_per_100g, fat_g_per_100g, archived)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(fdc_id) DO UPDATE SET
                description = excluded.description,
                brand_owner = excluded.brand_owner,
                kcal_per_100g = excluded.kcal_per_100g,
                protein_g_per_100g = excluded.protein_g_per_100g,
                carb_g_per_100g = excluded.carb_g_per_100g,
                fat_g_per_100g = excluded.fat_g_per_100g,
                archived = excluded.archived
            "#,
        )
        .bind(food.fdc_id)
        .bind(&food.description)
        .bind(&food.brand_owner)
        .bind(food.kcal_per_100g)
        .bind(food.protein_g_per_100g)
        .bind(food.carb_g_per_100g)
        .bind(food.fat_g_per_100g)
        .bind(food.archived)
        .execute(&self.pool)
        .await?;

        self.get(food.fdc_id)
            .await?
            .ok_or_else(|| sqlx::Error::RowNotFound)
    }

    pub async fn get(&self, fdc_id: i64) -> Result<Option<Food>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM foods WHERE fdc_id = ?")
            .bind(fdc_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list(&self, include_archived: bool) -> Result<Vec<Food>, sqlx::Error> {
        let sql = if include_archived {
            "SELECT * FROM foods ORDER BY description"
        } else {
            "SELECT * FROM foods WHERE archived = 0 ORDER BY description"
        };
        sqlx::query_as(sql).fetch_all(&self.pool).await
    }

    pub async fn set_archived(&self, fdc_id: i64, archived: bool) -> OrderResult<Food> {
        let result = sqlx::query("UPDATE foods SET archived = ? WHERE fdc_id = ?")
            .bind(archived)
            .bind(fdc_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(OrderError::not_found("food", fdc_id));
        }
        self.get(fdc_id)
            .await?
            .ok_or_else(|| OrderError::not_found("food", fdc_id))
    }

    /// Returns the food if it can be logged, or `FoodUnavailable`.
    pub async fn require_available(&self, fdc_id: i64) -> OrderResult<Food> {
        match self.get(fdc_id).await? {
            Some(food) if !food.archived => Ok(food),
            _ => Err(OrderError::FoodUnavailable(fdc_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    struct TestContext {
        repo: FoodRepository,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup_repo() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(temp_dir.path().join("test.db")).await.unwrap();
        TestContext {
            repo: FoodRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let ctx = setup_repo().await;
        let food = Food::new(100, "Greek Yogurt").with_macros(97.0, 9.0, 3.9, 5.0);

        let created = ctx.repo.upsert(&food).await.unwrap();
        assert_eq!(created, food);

        let refreshed = ctx
            .repo
            .upsert(&food.clone().with_brand_owner("Dairy Co"))
            .await
            .unwrap();
        assert_eq!(refreshed.brand_owner.as_deref(), Some("Dairy Co"));
        assert_eq!(ctx.repo.list(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_hides_archived() {
        let ctx = setup_repo().await;
        ctx.repo.upsert(&Food::new(1, "Apple")).await.unwrap();
        ctx.repo.upsert(&Food::new(2, "Banana")).await.unwrap();
        ctx.repo.set_archived(2, true).await.unwrap();

        let visible = ctx.repo.list(false).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].description, "Apple");

        let all = ctx.repo.list(true).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_require_available() {
        let ctx = setup_repo().await;
        ctx.repo.upsert(&Food::new(1, "Apple")).await.unwrap();

        assert!(ctx.repo.require_available(1).await.is_ok());
        assert!(matches!(
            ctx.repo.require_available(2).await,
            Err(OrderError::FoodUnavailable(2))
        ));

        ctx.repo.set_archived(1, true).await.unwrap();
        assert!(matches!(
            ctx.repo.require_available(1).await,
            Err(OrderError::FoodUnavailable(1))
        ));

        ctx.repo.set_archived(1, false).await.unwrap();
        assert!(ctx.repo.require_available(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_archive_unknown_food() {
        let ctx = setup_repo().await;
        assert!(matches!(
            ctx.repo.set_archived(5, true).await,
            Err(OrderError::NotFound { kind: "food", .. })
        ));
    }
}
