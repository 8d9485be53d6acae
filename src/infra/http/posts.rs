//! Post form handlers: create, edit and comment.

use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    application::{
        error::HttpError,
        posts::{FieldError, PostError, PostInput},
    },
    domain::entities::AuthorRecord,
    presentation::views::{
        LayoutContext, PostFormTemplate, PostFormView, render_not_found_response,
        render_template_response,
    },
};

use super::{auth::Actor, parse_id, public::HttpState};

const CREATE_ACTION: &str = "/create/";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PostForm {
    text: String,
    group: String,
    image: String,
}

impl PostForm {
    /// Convert the raw form, reporting a group value that is not an id.
    fn into_input(self) -> (PostInput, Vec<FieldError>) {
        let mut errors = Vec::new();
        let group = self.group.trim();
        let group_id = if group.is_empty() {
            None
        } else {
            match group.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push(FieldError::new(
                        "group",
                        "Select a valid choice. That choice is not one of the available choices.",
                    ));
                    None
                }
            }
        };

        let input = PostInput {
            text: self.text,
            group_id,
            image: Some(self.image).filter(|image| !image.trim().is_empty()),
        };
        (input, errors)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CommentForm {
    text: String,
}

pub(super) async fn create_form(State(state): State<HttpState>, Actor(actor): Actor) -> Response {
    match state.posts.list_groups().await {
        Ok(groups) => render_form(&actor, PostFormView::blank(CREATE_ACTION, &groups)),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn create_submit(
    State(state): State<HttpState>,
    Actor(actor): Actor,
    Form(form): Form<PostForm>,
) -> Response {
    let (input, errors) = form.into_input();
    if !errors.is_empty() {
        return rerender_form(&state, &actor, CREATE_ACTION, false, &input, &errors).await;
    }

    match state.posts.create_post(&actor, input.clone()).await {
        Ok(_) => Redirect::to(&profile_path(&actor)).into_response(),
        Err(PostError::Invalid(errors)) => {
            rerender_form(&state, &actor, CREATE_ACTION, false, &input, &errors).await
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn edit_form(
    State(state): State<HttpState>,
    Actor(actor): Actor,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(post_id) = parse_id(&raw_id) else {
        return render_not_found_response(Some(&actor));
    };

    let post = match state.posts.post_for_edit(&actor, post_id).await {
        Ok(post) => post,
        Err(err) => return edit_error_response(err, &actor, post_id),
    };

    match state.posts.list_groups().await {
        Ok(groups) => render_form(&actor, PostFormView::for_post(&post, &groups)),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn edit_submit(
    State(state): State<HttpState>,
    Actor(actor): Actor,
    Path(raw_id): Path<String>,
    Form(form): Form<PostForm>,
) -> Response {
    let Some(post_id) = parse_id(&raw_id) else {
        return render_not_found_response(Some(&actor));
    };
    let action = edit_path(post_id);

    let (input, errors) = form.into_input();
    if !errors.is_empty() {
        // Ownership still decides first; strangers never see the form.
        if let Err(err) = state.posts.post_for_edit(&actor, post_id).await {
            return edit_error_response(err, &actor, post_id);
        }
        return rerender_form(&state, &actor, &action, true, &input, &errors).await;
    }

    match state.posts.edit_post(&actor, post_id, input.clone()).await {
        Ok(_) => Redirect::to(&detail_path(post_id)).into_response(),
        Err(PostError::Invalid(errors)) => {
            rerender_form(&state, &actor, &action, true, &input, &errors).await
        }
        Err(err) => edit_error_response(err, &actor, post_id),
    }
}

pub(super) async fn add_comment(
    State(state): State<HttpState>,
    Actor(actor): Actor,
    Path(raw_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Response {
    let Some(post_id) = parse_id(&raw_id) else {
        return render_not_found_response(Some(&actor));
    };

    match state.posts.add_comment(&actor, post_id, &form.text).await {
        Ok(_) | Err(PostError::Invalid(_)) => Redirect::to(&detail_path(post_id)).into_response(),
        Err(PostError::NotFound(_)) => render_not_found_response(Some(&actor)),
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn edit_error_response(err: PostError, actor: &AuthorRecord, post_id: i64) -> Response {
    match err {
        PostError::NotAuthor { .. } => {
            debug!(
                target = "scribe::http::posts",
                post_id,
                actor = %actor.username,
                "edit denied, redirecting to detail"
            );
            Redirect::to(&detail_path(post_id)).into_response()
        }
        PostError::NotFound(_) => render_not_found_response(Some(actor)),
        err => HttpError::from(err).into_response(),
    }
}

async fn rerender_form(
    state: &HttpState,
    actor: &AuthorRecord,
    action: &str,
    is_edit: bool,
    input: &PostInput,
    errors: &[FieldError],
) -> Response {
    match state.posts.list_groups().await {
        Ok(groups) => render_form(
            actor,
            PostFormView::filled(action, is_edit, input, &groups, errors),
        ),
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn render_form(actor: &AuthorRecord, content: PostFormView) -> Response {
    let view = LayoutContext::new(Some(actor), content.title(), content);
    render_template_response(PostFormTemplate { view }, StatusCode::OK)
}

fn profile_path(author: &AuthorRecord) -> String {
    format!("/profile/{}/", author.username)
}

fn detail_path(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

fn edit_path(post_id: i64) -> String {
    format!("/posts/{post_id}/edit/")
}
