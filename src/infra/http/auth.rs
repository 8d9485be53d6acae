//! Identity extractors.
//!
//! The upstream identity proxy puts the signed-in username in a trusted
//! header. Handlers take [`Viewer`] when anonymous access is fine and
//! [`Actor`] when it is not.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;
use url::form_urlencoded;

use crate::application::error::{HttpError, repo_error_to_http};
use crate::domain::entities::AuthorRecord;

use super::public::HttpState;

const MAX_USERNAME_LEN: usize = 150;

/// The signed-in author, when there is one.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<AuthorRecord>);

impl Viewer {
    pub fn author(&self) -> Option<&AuthorRecord> {
        self.0.as_ref()
    }
}

/// A signed-in author. Anonymous requests are sent to the login page.
#[derive(Debug, Clone)]
pub struct Actor(pub AuthorRecord);

impl FromRequestParts<HttpState> for Viewer {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        resolve_author(parts, state).await.map(Viewer)
    }
}

impl FromRequestParts<HttpState> for Actor {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_author(parts, state).await {
            Ok(Some(author)) => Ok(Actor(author)),
            Ok(None) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or_else(|| parts.uri.path());
                debug!(
                    target = "scribe::http::auth",
                    next = %next,
                    "anonymous request to a protected route"
                );
                Err(login_redirect(&state.auth.login_path, next).into_response())
            }
            Err(err) => Err(err.into_response()),
        }
    }
}

/// Redirect to the login page, asking it to come back to `next` afterwards.
pub fn login_redirect(login_path: &str, next: &str) -> Redirect {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    Redirect::to(&format!("{login_path}?{query}"))
}

async fn resolve_author(
    parts: &Parts,
    state: &HttpState,
) -> Result<Option<AuthorRecord>, HttpError> {
    const SOURCE: &str = "infra::http::auth::resolve_author";

    let Some(raw) = parts.headers.get(&state.auth.user_header) else {
        return Ok(None);
    };

    let username = raw
        .to_str()
        .map_err(|err| {
            HttpError::new(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Invalid identity header",
                err.to_string(),
            )
        })?
        .trim();

    if username.is_empty() {
        return Ok(None);
    }
    if !is_valid_username(username) {
        return Err(HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Invalid identity header",
            format!("`{username}` is not a valid username"),
        ));
    }

    state
        .authors
        .ensure_author(username)
        .await
        .map(Some)
        .map_err(|err| repo_error_to_http(SOURCE, err))
}

/// Letters, digits and `@.+-_`, at most 150 characters.
fn is_valid_username(username: &str) -> bool {
    username.chars().count() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|ch| ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn login_redirect_encodes_next() {
        let response = login_redirect("/auth/login/", "/create/?page=2").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/auth/login/?next=%2Fcreate%2F%3Fpage%3D2"
        );
    }

    #[test]
    fn usernames_follow_the_usual_alphabet() {
        assert!(is_valid_username("leo.tolstoy"));
        assert!(is_valid_username("anna+k@example"));
        assert!(!is_valid_username("two words"));
        assert!(!is_valid_username("slash/name"));
        assert!(!is_valid_username(&"x".repeat(151)));
    }
}
