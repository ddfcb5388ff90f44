//! Order maintenance for parent/child collections.
//!
//! Every parent (a day for meals, a meal for entries) keeps its children at
//! dense positions `1..=N` under a `UNIQUE(parent, sort_order)` constraint.
//! The engine is generic over [`Collection`]; all functions take the open
//! transaction explicitly and never commit themselves.
//!
//! Writes are issued one row per statement so SQLite's eager uniqueness
//! check never sees two siblings on the same position. A row being moved is
//! parked at position 0 for the duration of its shift.

mod allocator;
mod gap;
pub mod label;
mod reorder;

pub use allocator::next_position;
pub use gap::remove_child;
pub use reorder::move_child;

use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqliteConnection};
use std::fmt;
use std::str::FromStr;

use crate::error::{OrderError, OrderResult};

/// Position a row is parked at while its siblings shift around it.
pub(crate) const PARKED: i64 = 0;

/// A table of children ordered within their parent.
pub trait Collection: Send + Sync + 'static {
    /// Key of the owning parent.
    type Parent: for<'r> sqlx::Decode<'r, Sqlite>
        + for<'q> sqlx::Encode<'q, Sqlite>
        + sqlx::Type<Sqlite>
        + Clone
        + fmt::Display
        + Send
        + Sync
        + Unpin
        + 'static;

    /// Singular name used in errors and logs.
    const NAME: &'static str;
    const TABLE: &'static str;
    const PARENT_COLUMN: &'static str;
    /// Column holding a position-derived display label, if the collection has one.
    const LABEL_COLUMN: Option<&'static str> = None;
    /// Boolean column marking a label as generated rather than caller-supplied.
    const AUTO_FLAG_COLUMN: Option<&'static str> = None;

    /// Label to store after a row moves from `old` to `new`.
    fn relabel(label: &str, _auto: bool, _old: i64, _new: i64) -> String {
        label.to_string()
    }
}

/// Meals within a day, keyed by ISO date.
#[derive(Debug, Clone, Copy)]
pub struct Meals;

impl Collection for Meals {
    type Parent = String;

    const NAME: &'static str = "meal";
    const TABLE: &'static str = "meals";
    const PARENT_COLUMN: &'static str = "date";
    const LABEL_COLUMN: Option<&'static str> = Some("name");
    const AUTO_FLAG_COLUMN: Option<&'static str> = Some("auto_name");

    fn relabel(label: &str, auto: bool, old: i64, new: i64) -> String {
        label::resync(label, auto, old, new)
    }
}

/// Food entries within a meal.
#[derive(Debug, Clone, Copy)]
pub struct Entries;

impl Collection for Entries {
    type Parent = i64;

    const NAME: &'static str = "entry";
    const TABLE: &'static str = "food_entries";
    const PARENT_COLUMN: &'static str = "meal_id";
}

/// What to do with a requested position outside `1..=N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionPolicy {
    /// Silently clamp into range.
    #[default]
    Clamp,
    /// Reject with [`OrderError::InvalidInput`].
    Reject,
}

impl PositionPolicy {
    /// Resolves `requested` against a sibling count of `count` (at least 1).
    pub fn resolve(self, requested: i64, count: i64) -> OrderResult<i64> {
        match self {
            PositionPolicy::Clamp => Ok(requested.clamp(1, count.max(1))),
            PositionPolicy::Reject if (1..=count).contains(&requested) => Ok(requested),
            PositionPolicy::Reject => Err(OrderError::InvalidInput(format!(
                "position {} is outside 1..={}",
                requested, count
            ))),
        }
    }
}

impl fmt::Display for PositionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionPolicy::Clamp => write!(f, "clamp"),
            PositionPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for PositionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clamp" => Ok(PositionPolicy::Clamp),
            "reject" => Ok(PositionPolicy::Reject),
            _ => Err(format!(
                "Invalid position policy '{}'. Valid options: clamp, reject",
                s
            )),
        }
    }
}

/// The ordering-relevant columns of one child row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SiblingRow {
    pub id: i64,
    pub sort_order: i64,
    pub label: Option<String>,
    pub auto_label: bool,
}

fn sibling_columns<C: Collection>() -> String {
    format!(
        "id, sort_order, {} AS label, {} AS auto_label",
        C::LABEL_COLUMN.unwrap_or("NULL"),
        C::AUTO_FLAG_COLUMN.unwrap_or("0")
    )
}

/// Loads a child and its parent key, or `NotFound`.
pub(crate) async fn fetch_child<C: Collection>(
    conn: &mut SqliteConnection,
    id: i64,
) -> OrderResult<(C::Parent, SiblingRow)> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?",
        sibling_columns::<C>(),
        C::TABLE
    );
    let row: Option<SiblingRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let row = row.ok_or_else(|| OrderError::not_found(C::NAME, id))?;

    let sql = format!("SELECT {} FROM {} WHERE id = ?", C::PARENT_COLUMN, C::TABLE);
    let parent: C::Parent = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    Ok((parent, row))
}

pub(crate) async fn sibling_count<C: Collection>(
    conn: &mut SqliteConnection,
    parent: &C::Parent,
) -> OrderResult<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?",
        C::TABLE,
        C::PARENT_COLUMN
    );
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(parent.clone())
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Siblings with `low <= sort_order <= high`, ascending or descending.
pub(crate) async fn siblings_between<C: Collection>(
    conn: &mut SqliteConnection,
    parent: &C::Parent,
    low: i64,
    high: i64,
    descending: bool,
) -> OrderResult<Vec<SiblingRow>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ? AND sort_order >= ? AND sort_order <= ? ORDER BY sort_order {}",
        sibling_columns::<C>(),
        C::TABLE,
        C::PARENT_COLUMN,
        if descending { "DESC" } else { "ASC" }
    );
    let rows = sqlx::query_as(&sql)
        .bind(parent.clone())
        .bind(low)
        .bind(high)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Moves a row to the park slot without touching its label.
pub(crate) async fn park<C: Collection>(conn: &mut SqliteConnection, id: i64) -> OrderResult<()> {
    let sql = format!("UPDATE {} SET sort_order = ? WHERE id = ?", C::TABLE);
    sqlx::query(&sql)
        .bind(PARKED)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Writes a single row's new position, regenerating its label if the
/// collection has one. `from` is the position the label was derived from.
pub(crate) async fn write_position<C: Collection>(
    conn: &mut SqliteConnection,
    row: &SiblingRow,
    from: i64,
    to: i64,
) -> OrderResult<()> {
    match (C::LABEL_COLUMN, row.label.as_deref()) {
        (Some(column), Some(label)) => {
            let label = C::relabel(label, row.auto_label, from, to);
            let sql = format!(
                "UPDATE {} SET sort_order = ?, {} = ? WHERE id = ?",
                C::TABLE,
                column
            );
            sqlx::query(&sql)
                .bind(to)
                .bind(label)
                .bind(row.id)
                .execute(&mut *conn)
                .await?;
        }
        _ => {
            let sql = format!("UPDATE {} SET sort_order = ? WHERE id = ?", C::TABLE);
            sqlx::query(&sql)
                .bind(to)
                .bind(row.id)
                .execute(&mut *conn)
                .await?;
        }
    }
    tracing::debug!(
        collection = C::NAME,
        id = row.id,
        from,
        to,
        "shifted position"
    );
    Ok(())
}

/// Checks that the children of `parent` sit exactly on `1..=N`.
///
/// A violation is never repaired here: it means the data was already
/// corrupt or the algorithm is wrong, and the caller's transaction must be
/// rolled back.
pub async fn verify_dense<C: Collection>(
    conn: &mut SqliteConnection,
    parent: &C::Parent,
) -> OrderResult<()> {
    let sql = format!(
        "SELECT sort_order FROM {} WHERE {} = ? ORDER BY sort_order",
        C::TABLE,
        C::PARENT_COLUMN
    );
    let positions: Vec<i64> = sqlx::query_scalar(&sql)
        .bind(parent.clone())
        .fetch_all(&mut *conn)
        .await?;

    let dense = positions
        .iter()
        .enumerate()
        .all(|(i, &pos)| pos == i as i64 + 1);
    if dense {
        return Ok(());
    }

    tracing::error!(
        collection = C::NAME,
        parent = %parent,
        ?positions,
        "ordering invariant violated"
    );
    Err(OrderError::InvariantViolation {
        collection: C::NAME,
        parent: parent.to_string(),
        expected: positions.len(),
        found: positions,
    })
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_clamp_policy() {
        let policy = PositionPolicy::Clamp;
        assert_eq!(policy.resolve(0, 4).unwrap(), 1);
        assert_eq!(policy.resolve(-3, 4).unwrap(), 1);
        assert_eq!(policy.resolve(999, 4).unwrap(), 4);
        assert_eq!(policy.resolve(2, 4).unwrap(), 2);
    }

    #[test]
    fn test_reject_policy() {
        let policy = PositionPolicy::Reject;
        assert_eq!(policy.resolve(4, 4).unwrap(), 4);
        assert!(matches!(
            policy.resolve(0, 4),
            Err(OrderError::InvalidInput(_))
        ));
        assert!(matches!(
            policy.resolve(5, 4),
            Err(OrderError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_position_policy_from_str() {
        assert_eq!(
            PositionPolicy::from_str("CLAMP").unwrap(),
            PositionPolicy::Clamp
        );
        assert_eq!(
            PositionPolicy::from_str("reject").unwrap(),
            PositionPolicy::Reject
        );
        assert!(PositionPolicy::from_str("strict").is_err());
        assert_eq!(PositionPolicy::default().to_string(), "clamp");
    }

    #[tokio::test]
    async fn test_fetch_child_returns_parent() {
        let ctx = setup().await;
        let meals = seed_meals(&ctx.pool, 2).await;
        let entries = seed_entries(&ctx.pool, meals[1], 1).await;

        let mut conn = ctx.pool.acquire().await.unwrap();
        let (parent, row) = fetch_child::<Meals>(&mut conn, meals[1]).await.unwrap();
        assert_eq!(parent, DAY);
        assert_eq!(row.sort_order, 2);
        assert_eq!(row.label.as_deref(), Some("Meal 2"));

        let (parent, row) = fetch_child::<Entries>(&mut conn, entries[0]).await.unwrap();
        assert_eq!(parent, meals[1]);
        assert!(row.label.is_none());

        let missing = fetch_child::<Entries>(&mut conn, 9999).await;
        assert!(matches!(missing, Err(OrderError::NotFound { kind: "entry", .. })));
    }

    #[tokio::test]
    async fn test_verify_dense_detects_gap() {
        let ctx = setup().await;
        insert_meal(&ctx.pool, DAY, "Meal 1", 1).await;
        insert_meal(&ctx.pool, DAY, "Meal 3", 3).await;

        let mut conn = ctx.pool.acquire().await.unwrap();
        let result = verify_dense::<Meals>(&mut conn, &DAY.to_string()).await;
        match result {
            Err(OrderError::InvariantViolation {
                expected, found, ..
            }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, vec![1, 3]);
            }
            other => panic!("expected invariant violation, got {:?}", other),
        }

        // An empty parent is trivially dense.
        verify_dense::<Entries>(&mut conn, &12345).await.unwrap();
    }
}
