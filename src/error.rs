//! Error types shared by the ordering engine and the repositories.

use thiserror::Error;

/// Errors that can occur while creating, moving or removing ordered rows.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The referenced row (or its parent) does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Concurrent writers kept colliding and the retry budget ran out.
    #[error("{op} conflicted with a concurrent write after {attempts} attempt(s); retry later")]
    Conflict { op: &'static str, attempts: u32 },

    /// The committed sibling set would not have been exactly `1..=expected`.
    #[error(
        "ordering invariant violated for {collection} under {parent}: expected 1..={expected}, found {found:?}"
    )]
    InvariantViolation {
        collection: &'static str,
        parent: String,
        expected: usize,
        found: Vec<i64>,
    },

    /// A meal cannot be deleted while it still owns entries.
    #[error("Meal {0} has entries - delete or move them first")]
    HasEntries(i64),

    /// The food is unknown or archived.
    #[error("Food not available: {0}")]
    FoodUnavailable(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl OrderError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        OrderError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Returns true if the store rejected a write because of a concurrent
    /// writer: a uniqueness collision or a busy/locked database.
    pub fn is_conflict(&self) -> bool {
        match self {
            OrderError::Database(sqlx::Error::Database(e)) => {
                if e.is_unique_violation() {
                    return true;
                }
                // SQLite reports extended result codes; the low byte is the
                // primary code (5 = SQLITE_BUSY, 6 = SQLITE_LOCKED).
                e.code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| matches!(code & 0xff, 5 | 6))
                    .unwrap_or(false)
            }
            _ => false,
        }
    }

    /// Returns true if a caller may retry the whole operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::Conflict { .. }) || self.is_conflict()
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
