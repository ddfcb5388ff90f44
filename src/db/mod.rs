mod entry_repo;
mod food_repo;
mod meal_repo;

pub use entry_repo::EntryRepository;
pub use food_repo::FoodRepository;
pub use meal_repo::MealRepository;

use futures::future::BoxFuture;
use rand::Rng;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::error::{OrderError, OrderResult};
use crate::ordering::PositionPolicy;

/// Initialize the database connection pool and run migrations
pub async fn init_db(db_path: PathBuf) -> Result<SqlitePool, sqlx::Error> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// How often a conflicting transaction is re-run before giving up.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(20),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        let jitter = rand::rng().random_range(0..=self.backoff.as_millis() as u64);
        self.backoff * attempt + Duration::from_millis(jitter)
    }
}

/// Pool handle plus the policies every ordering operation runs under.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    retry: RetryPolicy,
    positions: PositionPolicy,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
            positions: PositionPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_position_policy(mut self, positions: PositionPolicy) -> Self {
        self.positions = positions;
        self
    }

    /// Opens the configured database and applies the configured policies.
    pub async fn open(config: &Config) -> Result<Self, sqlx::Error> {
        let pool = init_db(config.database_path.value.clone()).await?;
        Ok(Self::new(pool)
            .with_retry(RetryPolicy {
                attempts: config.retry_attempts.value,
                ..RetryPolicy::default()
            })
            .with_position_policy(config.position_policy.value))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn position_policy(&self) -> PositionPolicy {
        self.positions
    }

    /// Runs `f` in its own transaction and commits it.
    ///
    /// Any error rolls the whole transaction back; dropping the returned
    /// future before it completes does the same. Conflicts with concurrent
    /// writers re-run `f` from scratch in a fresh transaction until the
    /// retry budget is spent.
    pub async fn transact<T, F>(&self, op: &'static str, mut f: F) -> OrderResult<T>
    where
        F: for<'c> FnMut(&'c mut SqliteConnection) -> BoxFuture<'c, OrderResult<T>>,
    {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;

        loop {
            let mut tx = self.pool.begin().await?;
            let result = f(&mut *tx).await;
            let outcome = match result {
                Ok(value) => tx.commit().await.map(|_| value).map_err(OrderError::from),
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::warn!(op, "rollback failed: {}", rollback_err);
                    }
                    Err(err)
                }
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if err.is_conflict() && attempt < attempts => {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(op, attempt, ?delay, "conflicting write, retrying: {}", err);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) if err.is_conflict() => {
                    tracing::warn!(op, attempts, "giving up after conflicts: {}", err);
                    return Err(OrderError::Conflict { op, attempts });
                }
                Err(err) => return Err(err),
            }
        }
    }
}
