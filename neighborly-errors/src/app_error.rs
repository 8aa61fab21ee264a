use serde::{Deserialize, Serialize};
use server_fn::ServerFnError;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sign-in required")]
    Unauthorized,

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),


    #[error("Duplicate report: {0}")]
    DuplicateReport(String),

    #[error("Rate limited for {0} seconds")]
    RateLimited(u64),

    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FromStr for AppError {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("Invalid input: ") {
            Ok(AppError::InvalidInput(rest.to_string()))
        } else if s.starts_with("Sign-in required") {
            Ok(AppError::Unauthorized)
        } else if let Some(rest) = s.strip_prefix("Not allowed: ") {
            Ok(AppError::Forbidden(rest.to_string()))
        } else if let Some(rest) = s.strip_prefix("Not found: ") {
            Ok(AppError::NotFound(rest.to_string()))
        } else if let Some(rest) = s.strip_prefix("Duplicate report: ") {
            Ok(AppError::DuplicateReport(rest.to_string()))
        } else if let Some(rest) = s.strip_prefix("Rate limited for ") {
            let secs = rest
                .split_whitespace()
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap_or(60);
            Ok(AppError::RateLimited(secs))
        } else if let Some(rest) = s.strip_prefix("Backend failure: ") {
            Ok(AppError::Backend(rest.to_string()))
        } else {
            Ok(AppError::Internal(s.to_string()))
        }
    }
}

impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::Unauthorized => "Please sign in to do that.".to_string(),
            Self::Forbidden(_) => "You are not allowed to do that.".to_string(),
            Self::NotFound(what) => format!("{} not found.", what),
            Self::DuplicateReport(_) => {
                "You already reported this in the last 48 hours.".to_string()
            }
            Self::RateLimited(secs) => format!("Too many requests. Try again in {} seconds.", secs),
            Self::Backend(_) => "The server could not reach its database. Try again later.".to_string(),
            Self::Internal(_) => "Something went wrong on our side. Try again later.".to_string(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Carries the error across a server function boundary as its display text.
    pub fn into_server_error(self) -> ServerFnError {
        ServerFnError::ServerError(self.to_string())
    }

    /// Recovers the error on the calling side. Transport failures become `Internal`.
    pub fn from_server_error(err: &ServerFnError) -> Self {
        match err {
            ServerFnError::ServerError(msg) => msg.parse().unwrap_or_else(|never| match never {}),
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[cfg(feature = "ssr")]
mod ssr_impl {
    use super::AppError;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;

    #[derive(serde::Serialize)]
    struct ErrorResponse {
        message: String,
    }

    impl AppError {
        pub fn status_code(&self) -> StatusCode {
            match self {
                AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                AppError::Unauthorized => StatusCode::UNAUTHORIZED,
                AppError::Forbidden(_) => StatusCode::FORBIDDEN,
                AppError::NotFound(_) => StatusCode::NOT_FOUND,
                AppError::DuplicateReport(_) => StatusCode::CONFLICT,
                AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                AppError::Backend(_) => StatusCode::BAD_GATEWAY,
                AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = self.status_code();
            let message = self.user_message();
            (status, Json(ErrorResponse { message })).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips_through_from_str() {
        let errors = [
            AppError::InvalidInput("content is empty".to_string()),
            AppError::Unauthorized,
            AppError::Forbidden("not the author".to_string()),
            AppError::NotFound("Comment".to_string()),
            AppError::DuplicateReport("already reported".to_string()),
            AppError::RateLimited(42),
            AppError::Backend("connection reset".to_string()),
        ];

        for err in errors {
            let parsed: AppError = err.to_string().parse().unwrap();
            assert_eq!(parsed, err);
        }
    }

    #[test]
    fn test_server_error_round_trip() {
        let err = AppError::RateLimited(12);
        let wire = err.clone().into_server_error();
        assert_eq!(AppError::from_server_error(&wire), err);

        let transport = ServerFnError::Request("connection reset".to_string());
        assert!(matches!(AppError::from_server_error(&transport), AppError::Internal(_)));
    }

    #[test]
    fn test_unknown_text_becomes_internal() {
        let parsed: AppError = "boom".parse().unwrap();
        assert_eq!(parsed, AppError::Internal("boom".to_string()));
    }
}
