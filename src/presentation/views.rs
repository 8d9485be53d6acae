use crate::application::error::{ErrorReport, HttpError};
use crate::application::feed::{FeedPage, FeedScope};
use crate::application::pagination::Page;
use crate::application::posts::{FieldError, PostDetail, PostInput};
use crate::domain::entities::{AuthorRecord, CommentRecord, GroupRecord, PostSummary};
use crate::domain::posts::{HUMAN_DATE_FORMAT, title_excerpt};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(viewer: Option<&AuthorRecord>) -> Response {
    let view = LayoutContext::new(viewer, "Page not found", ErrorPageView::not_found());
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct ViewerView {
    pub username: String,
    pub label: String,
}

impl From<&AuthorRecord> for ViewerView {
    fn from(author: &AuthorRecord) -> Self {
        Self {
            username: author.username.clone(),
            label: author.label().to_string(),
        }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub viewer: Option<ViewerView>,
    pub title: String,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(viewer: Option<&AuthorRecord>, title: impl Into<String>, content: T) -> Self {
        Self {
            viewer: viewer.map(ViewerView::from),
            title: title.into(),
            content,
        }
    }
}

#[derive(Clone)]
pub struct PostCardView {
    pub id: i64,
    pub text: String,
    pub image: Option<String>,
    pub author_username: String,
    pub author_label: String,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub published: String,
    pub iso_date: String,
    pub detail_href: String,
}

impl From<&PostSummary> for PostCardView {
    fn from(post: &PostSummary) -> Self {
        Self {
            id: post.id,
            text: post.text.clone(),
            image: post.image.clone(),
            author_username: post.author_username.clone(),
            author_label: post.author_label().to_string(),
            group_slug: post.group_slug.clone(),
            group_title: post.group_title.clone(),
            published: human_date(post.created_at),
            iso_date: iso_date(post.created_at),
            detail_href: format!("/posts/{}/", post.id),
        }
    }
}

#[derive(Clone)]
pub struct PageLinkView {
    pub number: u64,
    pub href: String,
    pub is_current: bool,
}

#[derive(Clone)]
pub struct PaginatorView {
    pub number: u64,
    pub num_pages: u64,
    pub total_count: u64,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub pages: Vec<PageLinkView>,
}

impl PaginatorView {
    pub fn from_page<T>(page: &Page<T>, base_path: &str) -> Self {
        let href = |number: u64| format!("{base_path}?page={number}");
        Self {
            number: page.number,
            num_pages: page.num_pages,
            total_count: page.total_count,
            previous_href: page.previous_number().map(href),
            next_href: page.next_number().map(href),
            pages: (1..=page.num_pages)
                .map(|number| PageLinkView {
                    number,
                    href: href(number),
                    is_current: number == page.number,
                })
                .collect(),
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

pub struct FeedView {
    pub posts: Vec<PostCardView>,
    pub paginator: PaginatorView,
}

impl From<&FeedPage> for FeedView {
    fn from(feed: &FeedPage) -> Self {
        Self {
            posts: feed.page.items.iter().map(PostCardView::from).collect(),
            paginator: PaginatorView::from_page(&feed.page, &feed.base_path),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<FeedView>,
}

pub struct GroupFeedView {
    pub title: String,
    pub description: String,
    pub posts: Vec<PostCardView>,
    pub paginator: PaginatorView,
}

impl GroupFeedView {
    pub fn new(group: &GroupRecord, feed: FeedView) -> Self {
        Self {
            title: group.title.clone(),
            description: group.description.clone(),
            posts: feed.posts,
            paginator: feed.paginator,
        }
    }
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub view: LayoutContext<GroupFeedView>,
}

pub struct ProfileView {
    pub username: String,
    pub label: String,
    pub post_count: u64,
    pub following: bool,
    /// Follow controls are hidden for anonymous viewers and on one's own profile.
    pub show_follow_controls: bool,
    pub follow_href: String,
    pub unfollow_href: String,
    pub posts: Vec<PostCardView>,
    pub paginator: PaginatorView,
}

impl ProfileView {
    pub fn new(
        author: &AuthorRecord,
        post_count: u64,
        viewer: Option<&AuthorRecord>,
        following: bool,
        feed: FeedView,
    ) -> Self {
        Self {
            username: author.username.clone(),
            label: author.label().to_string(),
            post_count,
            following,
            show_follow_controls: viewer.is_some_and(|viewer| viewer.id != author.id),
            follow_href: format!("/profile/{}/follow/", author.username),
            unfollow_href: format!("/profile/{}/unfollow/", author.username),
            posts: feed.posts,
            paginator: feed.paginator,
        }
    }
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub view: LayoutContext<ProfileView>,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub view: LayoutContext<FeedView>,
}

/// Build the title and body for a feed page.
pub fn feed_title(feed: &FeedPage) -> String {
    match &feed.scope {
        FeedScope::All => "Latest posts".to_string(),
        FeedScope::Group(group) => format!("Group: {}", group.title),
        FeedScope::Author { author, .. } => format!("Profile: {}", author.label()),
        FeedScope::Followed => "Authors you follow".to_string(),
    }
}

#[derive(Clone)]
pub struct CommentView {
    pub author_username: String,
    pub text: String,
    pub published: String,
}

impl From<&CommentRecord> for CommentView {
    fn from(comment: &CommentRecord) -> Self {
        Self {
            author_username: comment.author_username.clone(),
            text: comment.text.clone(),
            published: human_date(comment.created_at),
        }
    }
}

pub struct PostDetailView {
    pub post: PostCardView,
    pub author_post_count: u64,
    pub comments: Vec<CommentView>,
    pub can_edit: bool,
    pub can_comment: bool,
    pub edit_href: String,
    pub comment_action: String,
}

impl PostDetailView {
    pub fn new(detail: &PostDetail, viewer: Option<&AuthorRecord>) -> Self {
        let post = PostCardView::from(&detail.post);
        Self {
            edit_href: format!("/posts/{}/edit/", post.id),
            comment_action: format!("/posts/{}/comment/", post.id),
            can_edit: viewer.is_some_and(|author| author.id == detail.post.author_id),
            can_comment: viewer.is_some(),
            author_post_count: detail.author_post_count,
            comments: detail.comments.iter().map(CommentView::from).collect(),
            post,
        }
    }

    pub fn title(detail: &PostDetail) -> String {
        format!("Post {}", title_excerpt(&detail.post.text))
    }
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailView>,
}

#[derive(Clone)]
pub struct GroupOptionView {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

pub struct PostFormView {
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub image: String,
    pub groups: Vec<GroupOptionView>,
    pub form_errors: Vec<String>,
    pub text_errors: Vec<String>,
    pub group_errors: Vec<String>,
    pub image_errors: Vec<String>,
}

impl PostFormView {
    pub fn blank(action: impl Into<String>, groups: &[GroupRecord]) -> Self {
        Self::filled(action, false, &PostInput::default(), groups, &[])
    }

    pub fn for_post(post: &PostSummary, groups: &[GroupRecord]) -> Self {
        let input = PostInput {
            text: post.text.clone(),
            group_id: post.group_id,
            image: post.image.clone(),
        };
        Self::filled(format!("/posts/{}/edit/", post.id), true, &input, groups, &[])
    }

    pub fn filled(
        action: impl Into<String>,
        is_edit: bool,
        input: &PostInput,
        groups: &[GroupRecord],
        errors: &[FieldError],
    ) -> Self {
        let messages_for = |field: &str| {
            errors
                .iter()
                .filter(|error| error.field == field)
                .map(|error| error.message.clone())
                .collect::<Vec<_>>()
        };

        Self {
            is_edit,
            action: action.into(),
            text: input.text.clone(),
            image: input.image.clone().unwrap_or_default(),
            groups: groups
                .iter()
                .map(|group| GroupOptionView {
                    id: group.id,
                    title: group.title.clone(),
                    selected: input.group_id == Some(group.id),
                })
                .collect(),
            form_errors: messages_for("__all__"),
            text_errors: messages_for("text"),
            group_errors: messages_for("group"),
            image_errors: messages_for("image"),
        }
    }

    pub fn title(&self) -> &'static str {
        if self.is_edit { "Edit post" } else { "New post" }
    }
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist.".to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to the latest posts".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

fn human_date(value: OffsetDateTime) -> String {
    value
        .format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| iso_date(value))
}

fn iso_date(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_default()
}
