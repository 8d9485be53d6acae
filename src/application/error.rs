use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        feed::FeedError, follows::FollowError, groups::GroupError, posts::PostError,
        repos::RepoError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Diagnostic chain attached to error responses for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn internal(source: &'static str, error: &dyn StdError) -> Self {
        Self::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            error,
        )
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

/// Map a repository error to a consistent HTTP error response.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Integrity { message } => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            message,
        ),
        RepoError::Timeout => HttpError::new(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            "Database timeout",
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            message,
        ),
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        const SOURCE: &str = "infra::http::feed_error_to_http_error";
        match error {
            FeedError::UnknownGroup(slug) => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown group",
                format!("Group `{slug}` does not exist"),
            ),
            FeedError::UnknownAuthor(username) => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown author",
                format!("Author `{username}` does not exist"),
            ),
            FeedError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<PostError> for HttpError {
    fn from(error: PostError) -> Self {
        const SOURCE: &str = "infra::http::post_error_to_http_error";
        match error {
            PostError::NotFound(id) => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Post not found",
                format!("Post {id} does not exist"),
            ),
            PostError::NotAuthor { .. } => {
                HttpError::from_error(SOURCE, StatusCode::FORBIDDEN, "Forbidden", &error)
            }
            PostError::Invalid(_) => HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Invalid submission",
                &error,
            ),
            PostError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<FollowError> for HttpError {
    fn from(error: FollowError) -> Self {
        const SOURCE: &str = "infra::http::follow_error_to_http_error";
        match error {
            FollowError::UnknownAuthor(username) => HttpError::new(
                SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown author",
                format!("Author `{username}` does not exist"),
            ),
            FollowError::SelfFollow => {
                HttpError::from_error(SOURCE, StatusCode::BAD_REQUEST, "Invalid follow", &error)
            }
            FollowError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
