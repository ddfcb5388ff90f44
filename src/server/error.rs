use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::OrderError;

/// Error response body
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Wraps [`OrderError`] so handlers can return it with `?`.
#[derive(Debug)]
pub struct ApiError(pub OrderError);

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError(OrderError::Database(err))
    }
}

impl ApiError {
    fn status(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            err if err.is_retryable() => (StatusCode::CONFLICT, "conflict"),
            OrderError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            OrderError::HasEntries(_) => (StatusCode::CONFLICT, "has_entries"),
            OrderError::FoodUnavailable(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "food_unavailable")
            }
            OrderError::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_input"),
            OrderError::InvariantViolation { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invariant_violation")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorBody {
                error,
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (OrderError::not_found("meal", 1), StatusCode::NOT_FOUND),
            (
                OrderError::Conflict {
                    op: "move meal",
                    attempts: 3,
                },
                StatusCode::CONFLICT,
            ),
            (OrderError::HasEntries(1), StatusCode::CONFLICT),
            (
                OrderError::FoodUnavailable(1),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                OrderError::InvariantViolation {
                    collection: "entry",
                    parent: "1".into(),
                    expected: 2,
                    found: vec![1, 1],
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                OrderError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status().0, expected);
        }
    }

    #[tokio::test]
    async fn test_raw_unique_violation_maps_to_conflict() {
        let temp_dir = tempfile::tempdir().unwrap();
        let pool = crate::db::init_db(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let insert = "INSERT INTO meals (date, name, sort_order) VALUES ('2024-01-01', 'Meal 1', 1)";
        sqlx::query(insert).execute(&pool).await.unwrap();
        let err = sqlx::query(insert).execute(&pool).await.unwrap_err();

        let api_err = ApiError::from(err);
        assert!(api_err.0.is_retryable());
        assert_eq!(api_err.status(), (StatusCode::CONFLICT, "conflict"));
    }
}
