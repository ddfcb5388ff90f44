use sqlx::SqliteConnection;

use super::{
    fetch_child, park, sibling_count, siblings_between, verify_dense, write_position, Collection,
    PositionPolicy,
};
use crate::error::OrderResult;

/// Moves child `id` to `requested` within its parent and returns the
/// position it ended up at.
///
/// The mover is parked first, then the siblings between the old and new
/// position shift by one toward the vacated slot (nearest to the free slot
/// first), and the mover is written last. Every write is its own statement.
pub async fn move_child<C: Collection>(
    conn: &mut SqliteConnection,
    id: i64,
    requested: i64,
    policy: PositionPolicy,
) -> OrderResult<i64> {
    let (parent, mover) = fetch_child::<C>(conn, id).await?;
    let count = sibling_count::<C>(conn, &parent).await?;
    let target = policy.resolve(requested, count)?;
    let current = mover.sort_order;

    if target == current {
        tracing::debug!(collection = C::NAME, id, position = current, "move is a no-op");
        return Ok(current);
    }

    park::<C>(conn, id).await?;

    if target < current {
        // Moving earlier: [target, current) slides down the list, highest first.
        let window = siblings_between::<C>(conn, &parent, target, current - 1, true).await?;
        for row in &window {
            write_position::<C>(conn, row, row.sort_order, row.sort_order + 1).await?;
        }
    } else {
        // Moving later: (current, target] slides up the list, lowest first.
        let window = siblings_between::<C>(conn, &parent, current + 1, target, false).await?;
        for row in &window {
            write_position::<C>(conn, row, row.sort_order, row.sort_order - 1).await?;
        }
    }

    write_position::<C>(conn, &mover, current, target).await?;
    verify_dense::<C>(conn, &parent).await?;

    tracing::info!(
        collection = C::NAME,
        id,
        parent = %parent,
        from = current,
        to = target,
        "moved"
    );
    Ok(target)
}
