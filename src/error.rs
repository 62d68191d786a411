//! Error catalogue for the RAM API.
//!
//! Every variant carries a fixed reason code (`RAM-xxxx`) and maps to exactly
//! one HTTP status. API clients match on the reason code, so codes are never
//! reused or renumbered.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RamError {
    #[error("Execution request '{0}' not found")]
    ExecutionRequestNotFound(Uuid),

    #[error("Test run '{0}' not found")]
    TestRunNotFound(Uuid),

    #[error("Log record '{0}' not found")]
    LogRecordNotFound(Uuid),

    #[error("Execution request '{0}' is archived and cannot be modified")]
    ExecutionRequestArchived(Uuid),

    #[error("Failed to load file by path '{path}'")]
    FileLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Dictionary entry rejected: {0}")]
    DictionaryEntry(String),

    #[error("Test catalogue request failed: {0}")]
    Catalogue(String),

    #[error("Mail delivery failed: {0}")]
    MailDelivery(String),

    #[error("Defect '{0}' not found")]
    DefectNotFound(Uuid),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Chart filter '{filter}' expects {expected} argument(s), got {actual}")]
    ChartFilterArguments {
        filter: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown user setting type '{0}'")]
    UnknownUserSettingType(String),

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RamError {
    /// Machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            RamError::ExecutionRequestNotFound(_) => "RAM-0001",
            RamError::TestRunNotFound(_) => "RAM-0002",
            RamError::LogRecordNotFound(_) => "RAM-0003",
            RamError::ExecutionRequestArchived(_) => "RAM-0004",
            RamError::FileLoad { .. } => "RAM-0005",
            RamError::DictionaryEntry(_) => "RAM-1000",
            RamError::Catalogue(_) => "RAM-2000",
            RamError::MailDelivery(_) => "RAM-3000",
            RamError::DefectNotFound(_) => "RAM-5000",
            RamError::InvalidRequest(_) => "RAM-7000",
            RamError::ChartFilterArguments { .. } => "RAM-8000",
            RamError::UnknownUserSettingType(_) => "RAM-9000",
            RamError::Storage(_)
            | RamError::Pool(_)
            | RamError::Serialization(_)
            | RamError::Template(_)
            | RamError::Internal(_) => "RAM-9999",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RamError::ExecutionRequestNotFound(_)
            | RamError::TestRunNotFound(_)
            | RamError::LogRecordNotFound(_)
            | RamError::DefectNotFound(_)
            | RamError::UnknownUserSettingType(_) => StatusCode::NOT_FOUND,
            RamError::ExecutionRequestArchived(_) => StatusCode::CONFLICT,
            RamError::DictionaryEntry(_) | RamError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RamError::Catalogue(_) | RamError::MailDelivery(_) => StatusCode::BAD_GATEWAY,
            RamError::FileLoad { .. }
            | RamError::ChartFilterArguments { .. }
            | RamError::Storage(_)
            | RamError::Pool(_)
            | RamError::Serialization(_)
            | RamError::Template(_)
            | RamError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RamError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = self.reason();

        if status.is_server_error() {
            tracing::error!(%reason, error = %self, "request failed");
        } else {
            tracing::debug!(%reason, error = %self, "request rejected");
        }

        let body = Json(json!({
            "reason": reason,
            "message": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for RamError {
    fn from(err: anyhow::Error) -> Self {
        // Keep typed errors raised below an anyhow context.
        match err.downcast::<RamError>() {
            Ok(ram) => ram,
            Err(err) => RamError::Internal(format!("{:#}", err)),
        }
    }
}

/// Result type alias using RamError.
pub type RamResult<T> = Result<T, RamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_filter_error_catalogue_entry() {
        let err = RamError::ChartFilterArguments {
            filter: "period".to_string(),
            expected: 2,
            actual: 1,
        };
        assert_eq!(err.reason(), "RAM-8000");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "Chart filter 'period' expects 2 argument(s), got 1"
        );
    }

    #[test]
    fn test_file_load_error_catalogue_entry() {
        let err = RamError::FileLoad {
            path: "reports/missing.html".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.reason(), "RAM-0005");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("reports/missing.html"));
    }

    #[test]
    fn test_unknown_user_setting_is_not_found() {
        let err = RamError::UnknownUserSettingType("colors".to_string());
        assert_eq!(err.reason(), "RAM-9000");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_anyhow_keeps_typed_error() {
        let id = Uuid::new_v4();
        let wrapped = anyhow::Error::new(RamError::TestRunNotFound(id));
        let err: RamError = wrapped.into();
        assert_eq!(err.reason(), "RAM-0002");
    }

    #[tokio::test]
    async fn test_response_body_carries_reason() {
        let response = RamError::InvalidRequest("empty name".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), 10_000)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["reason"], "RAM-7000");
        assert_eq!(json["status"], 400);
    }
}
