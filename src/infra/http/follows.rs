use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::{
    application::{
        error::HttpError,
        follows::{FollowError, FollowOutcome},
    },
    domain::entities::AuthorRecord,
    presentation::views::render_not_found_response,
};

use super::{auth::Actor, public::HttpState};

pub(super) async fn follow_author(
    State(state): State<HttpState>,
    Actor(actor): Actor,
    Path(username): Path<String>,
) -> Response {
    let result = state.follows.follow(&actor, &username).await;
    follow_response(result, &actor, &username)
}

pub(super) async fn unfollow_author(
    State(state): State<HttpState>,
    Actor(actor): Actor,
    Path(username): Path<String>,
) -> Response {
    let result = state.follows.unfollow(&actor, &username).await;
    follow_response(result, &actor, &username)
}

fn follow_response(
    result: Result<FollowOutcome, FollowError>,
    actor: &AuthorRecord,
    username: &str,
) -> Response {
    let profile = format!("/profile/{username}/");
    match result {
        Ok(_) => Redirect::to(&profile).into_response(),
        Err(FollowError::SelfFollow) => {
            debug!(
                target = "scribe::http::follows",
                actor = %actor.username,
                "self-follow ignored"
            );
            Redirect::to(&profile).into_response()
        }
        Err(FollowError::UnknownAuthor(_)) => render_not_found_response(Some(actor)),
        Err(err) => HttpError::from(err).into_response(),
    }
}
