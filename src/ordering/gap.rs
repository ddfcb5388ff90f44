use sqlx::SqliteConnection;

use super::{fetch_child, siblings_between, verify_dense, write_position, Collection};
use crate::error::OrderResult;

/// Deletes child `id` and closes the gap it leaves.
///
/// Siblings after the removed position move down by one, lowest first, each
/// in its own statement. Callers enforce cross-collection rules (a meal with
/// entries is refused before this is reached).
pub async fn remove_child<C: Collection>(conn: &mut SqliteConnection, id: i64) -> OrderResult<()> {
    let (parent, removed) = fetch_child::<C>(conn, id).await?;

    let sql = format!("DELETE FROM {} WHERE id = ?", C::TABLE);
    sqlx::query(&sql).bind(id).execute(&mut *conn).await?;

    let trailing = siblings_between::<C>(conn, &parent, removed.sort_order + 1, i64::MAX, false).await?;
    for row in &trailing {
        write_position::<C>(conn, row, row.sort_order, row.sort_order - 1).await?;
    }

    verify_dense::<C>(conn, &parent).await?;

    tracing::info!(
        collection = C::NAME,
        id,
        parent = %parent,
        position = removed.sort_order,
        shifted = trailing.len(),
        "removed"
    );
    Ok(())
}
