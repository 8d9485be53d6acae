use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    application::{
        error::HttpError,
        feed::{FeedError, FeedFilter, FeedPage, FeedScope, FeedService},
        follows::FollowService,
        pagination::PageRequest,
        posts::{PostError, PostService},
        repos::AuthorsRepo,
    },
    cache::{PageCacheState, page_cache_layer},
    config::AuthSettings,
    domain::entities::AuthorRecord,
    presentation::views::{
        FeedView, FollowTemplate, GroupFeedView, GroupTemplate, IndexTemplate, LayoutContext,
        PostDetailTemplate, PostDetailView, ProfileTemplate, ProfileView, feed_title,
        render_not_found_response, render_template_response,
    },
};

use super::{
    auth::{Actor, Viewer},
    follows, parse_id, posts,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub follows: Arc<FollowService>,
    pub authors: Arc<dyn AuthorsRepo>,
    pub auth: AuthSettings,
    pub cache: Option<PageCacheState>,
}

pub fn build_router(state: HttpState) -> Router {
    // Only the global feed tolerates serving a slightly stale page.
    let index_route = match state.cache.clone() {
        Some(cache) => get(index).layer(middleware::from_fn_with_state(cache, page_cache_layer)),
        None => get(index),
    };

    Router::new()
        .route("/", index_route)
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/profile/{username}/follow/", get(follows::follow_author))
        .route("/profile/{username}/unfollow/", get(follows::unfollow_author))
        .route("/follow/", get(follow_index))
        .route("/posts/{id}/", get(post_detail))
        .route("/create/", get(posts::create_form).post(posts::create_submit))
        .route(
            "/posts/{id}/edit/",
            get(posts::edit_form).post(posts::edit_submit),
        )
        .route("/posts/{id}/comment/", post(posts::add_comment))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

async fn index(
    State(state): State<HttpState>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.assemble_feed(FeedFilter::All, query.request()).await {
        Ok(feed) => {
            let view = LayoutContext::new(viewer.author(), feed_title(&feed), FeedView::from(&feed));
            render_template_response(IndexTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, viewer.author()),
    }
}

async fn group_posts(
    State(state): State<HttpState>,
    viewer: Viewer,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let feed = match state
        .feed
        .assemble_feed(FeedFilter::Group(slug), query.request())
        .await
    {
        Ok(feed) => feed,
        Err(err) => return feed_error_to_response(err, viewer.author()),
    };

    let FeedScope::Group(group) = &feed.scope else {
        return render_not_found_response(viewer.author());
    };
    let content = GroupFeedView::new(group, FeedView::from(&feed));
    let view = LayoutContext::new(viewer.author(), feed_title(&feed), content);
    render_template_response(GroupTemplate { view }, StatusCode::OK)
}

async fn profile(
    State(state): State<HttpState>,
    viewer: Viewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let feed = match state
        .feed
        .assemble_feed(FeedFilter::Author(username), query.request())
        .await
    {
        Ok(feed) => feed,
        Err(err) => return feed_error_to_response(err, viewer.author()),
    };

    match profile_view(&state, &feed, viewer.author()).await {
        Ok(Some(content)) => {
            let view = LayoutContext::new(viewer.author(), feed_title(&feed), content);
            render_template_response(ProfileTemplate { view }, StatusCode::OK)
        }
        Ok(None) => render_not_found_response(viewer.author()),
        Err(err) => err.into_response(),
    }
}

async fn profile_view(
    state: &HttpState,
    feed: &FeedPage,
    viewer: Option<&AuthorRecord>,
) -> Result<Option<ProfileView>, HttpError> {
    let FeedScope::Author { author, post_count } = &feed.scope else {
        return Ok(None);
    };

    let following = match viewer {
        Some(viewer) => state.follows.is_following(viewer.id, author.id).await?,
        None => false,
    };

    Ok(Some(ProfileView::new(
        author,
        *post_count,
        viewer,
        following,
        FeedView::from(feed),
    )))
}

async fn follow_index(
    State(state): State<HttpState>,
    Actor(actor): Actor,
    Query(query): Query<PageQuery>,
) -> Response {
    match state
        .feed
        .assemble_feed(FeedFilter::Followed(actor.id), query.request())
        .await
    {
        Ok(feed) => {
            let view = LayoutContext::new(Some(&actor), feed_title(&feed), FeedView::from(&feed));
            render_template_response(FollowTemplate { view }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err, Some(&actor)),
    }
}

async fn post_detail(
    State(state): State<HttpState>,
    viewer: Viewer,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(post_id) = parse_id(&raw_id) else {
        return render_not_found_response(viewer.author());
    };

    match state.posts.post_detail(post_id).await {
        Ok(detail) => {
            let title = PostDetailView::title(&detail);
            let content = PostDetailView::new(&detail, viewer.author());
            let view = LayoutContext::new(viewer.author(), title, content);
            render_template_response(PostDetailTemplate { view }, StatusCode::OK)
        }
        Err(PostError::NotFound(_)) => render_not_found_response(viewer.author()),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn fallback(viewer: Viewer) -> Response {
    render_not_found_response(viewer.author())
}

fn feed_error_to_response(err: FeedError, viewer: Option<&AuthorRecord>) -> Response {
    match err {
        FeedError::UnknownGroup(_) | FeedError::UnknownAuthor(_) => {
            let mut response = render_not_found_response(viewer);
            crate::application::error::ErrorReport::from_error(
                "infra::http::feed_error_to_response",
                StatusCode::NOT_FOUND,
                &err,
            )
            .attach(&mut response);
            response
        }
        err => HttpError::from(err).into_response(),
    }
}
