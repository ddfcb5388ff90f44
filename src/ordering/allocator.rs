use sqlx::SqliteConnection;

use super::Collection;
use crate::error::OrderResult;

/// Next trailing position under `parent`: `max(sort_order) + 1`, or 1.
///
/// Must run in the same transaction as the insert that uses it. Two racing
/// allocations that read the same maximum collide on the unique constraint
/// and the loser is retried by the store.
pub async fn next_position<C: Collection>(
    conn: &mut SqliteConnection,
    parent: &C::Parent,
) -> OrderResult<i64> {
    let sql = format!(
        "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM {} WHERE {} = ?",
        C::TABLE,
        C::PARENT_COLUMN
    );
    let position: i64 = sqlx::query_scalar(&sql)
        .bind(parent.clone())
        .fetch_one(&mut *conn)
        .await?;
    tracing::debug!(collection = C::NAME, parent = %parent, position, "allocated position");
    Ok(position)
}
