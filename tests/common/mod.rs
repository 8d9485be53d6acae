//! In-memory repositories and request helpers shared by the integration tests.
#![allow(dead_code)]

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use scribe::{
    application::{
        feed::FeedService,
        follows::FollowService,
        pagination::{PageWindow, Paginator},
        posts::PostService,
        repos::{
            AuthorsRepo, CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams,
            FollowsRepo, GroupsRepo, HealthRepo, PostQueryFilter, PostsRepo, PostsWriteRepo,
            RepoError, UpdatePostParams,
        },
    },
    cache::{PageCacheConfig, PageCacheState},
    config::AuthSettings,
    domain::entities::{
        AuthorRecord, CommentRecord, FollowRecord, GroupRecord, PostRecord, PostSummary,
    },
    infra::http::{AdminState, HttpState, build_admin_router, build_router},
};
use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const USER_HEADER: &str = "x-forwarded-user";

pub const EPOCH: OffsetDateTime = datetime!(2024-01-01 0:00 UTC);

#[derive(Default)]
struct Inner {
    next_id: i64,
    ticks: i64,
    authors: Vec<AuthorRecord>,
    groups: Vec<GroupRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    follows: Vec<FollowRecord>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Every write lands one second after the previous one.
    fn now(&mut self) -> OffsetDateTime {
        self.ticks += 1;
        EPOCH + Duration::seconds(self.ticks)
    }

    fn author(&self, id: i64) -> Option<&AuthorRecord> {
        self.authors.iter().find(|author| author.id == id)
    }

    fn summary(&self, post: &PostRecord) -> PostSummary {
        let author = self.author(post.author_id);
        let group = post
            .group_id
            .and_then(|id| self.groups.iter().find(|group| group.id == id));
        PostSummary {
            id: post.id,
            text: post.text.clone(),
            image: post.image.clone(),
            created_at: post.created_at,
            author_id: post.author_id,
            author_username: author.map(|a| a.username.clone()).unwrap_or_default(),
            author_display_name: author.map(|a| a.display_name.clone()).unwrap_or_default(),
            group_id: post.group_id,
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
        }
    }

    fn matches(&self, post: &PostRecord, filter: &PostQueryFilter) -> bool {
        if let Some(group_id) = filter.group_id
            && post.group_id != Some(group_id)
        {
            return false;
        }
        if let Some(author_id) = filter.author_id
            && post.author_id != author_id
        {
            return false;
        }
        if let Some(follower_id) = filter.followed_by {
            return self
                .follows
                .iter()
                .any(|f| f.follower_id == follower_id && f.author_id == post.author_id);
        }
        true
    }
}

/// Repository double backed by vectors behind one lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn author(&self, username: &str) -> AuthorRecord {
        self.ensure_author(username).await.unwrap()
    }

    pub async fn group(&self, title: &str, slug: &str) -> GroupRecord {
        self.create_group(CreateGroupParams {
            title: title.to_string(),
            slug: slug.to_string(),
            description: format!("All about {title}"),
        })
        .await
        .unwrap()
    }

    pub async fn post(&self, author: &AuthorRecord, group: Option<&GroupRecord>, text: &str) -> PostRecord {
        self.create_post(CreatePostParams {
            author_id: author.id,
            group_id: group.map(|g| g.id),
            text: text.to_string(),
            image: None,
        })
        .await
        .unwrap()
    }

    /// Stores a post with a fixed timestamp instead of the next tick.
    pub async fn post_at(
        &self,
        author: &AuthorRecord,
        text: &str,
        created_at: OffsetDateTime,
    ) -> PostRecord {
        let mut post = self.post(author, None, text).await;
        let mut inner = self.inner.lock().await;
        if let Some(stored) = inner.posts.iter_mut().find(|p| p.id == post.id) {
            stored.created_at = created_at;
        }
        post.created_at = created_at;
        post
    }

    pub async fn post_count(&self) -> usize {
        self.inner.lock().await.posts.len()
    }

    pub async fn post_text(&self, id: i64) -> Option<String> {
        let inner = self.inner.lock().await;
        inner.posts.iter().find(|p| p.id == id).map(|p| p.text.clone())
    }

    pub async fn comment_count(&self, post_id: i64) -> usize {
        let inner = self.inner.lock().await;
        inner.comments.iter().filter(|c| c.post_id == post_id).count()
    }

    pub async fn follow_count(&self) -> usize {
        self.inner.lock().await.follows.len()
    }
}

#[async_trait]
impl AuthorsRepo for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<AuthorRecord>, RepoError> {
        Ok(self.inner.lock().await.author(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AuthorRecord>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner.authors.iter().find(|a| a.username == username).cloned())
    }

    async fn ensure_author(&self, username: &str) -> Result<AuthorRecord, RepoError> {
        let mut inner = self.inner.lock().await;
        if let Some(author) = inner.authors.iter().find(|a| a.username == username) {
            return Ok(author.clone());
        }
        let author = AuthorRecord {
            id: inner.next_id(),
            username: username.to_string(),
            display_name: String::new(),
            created_at: inner.now(),
        };
        inner.authors.push(author.clone());
        Ok(author)
    }
}

#[async_trait]
impl GroupsRepo for MemoryStore {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let mut groups = self.inner.lock().await.groups.clone();
        groups.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(groups)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<GroupRecord>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut inner = self.inner.lock().await;
        if inner.groups.iter().any(|g| g.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "post_groups_slug_key".to_string(),
            });
        }
        let group = GroupRecord {
            id: inner.next_id(),
            title: params.title,
            slug: params.slug,
            description: params.description,
            created_at: inner.now(),
        };
        inner.groups.push(group.clone());
        Ok(group)
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn count_posts(&self, filter: &PostQueryFilter) -> Result<u64, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner.posts.iter().filter(|p| inner.matches(p, filter)).count() as u64)
    }

    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        window: PageWindow,
    ) -> Result<Vec<PostSummary>, RepoError> {
        let inner = self.inner.lock().await;
        let mut posts: Vec<&PostRecord> =
            inner.posts.iter().filter(|p| inner.matches(p, filter)).collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(posts
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .map(|p| inner.summary(p))
            .collect())
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostSummary>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner.posts.iter().find(|p| p.id == id).map(|p| inner.summary(p)))
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut inner = self.inner.lock().await;
        let post = PostRecord {
            id: inner.next_id(),
            author_id: params.author_id,
            group_id: params.group_id,
            text: params.text,
            image: params.image,
            created_at: inner.now(),
        };
        inner.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut inner = self.inner.lock().await;
        let post = inner
            .posts
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.group_id = params.group_id;
        post.text = params.text;
        post.image = params.image;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let mut inner = self.inner.lock().await;
        let before = inner.posts.len();
        inner.posts.retain(|p| p.id != id);
        if inner.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        inner.comments.retain(|c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryStore {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut inner = self.inner.lock().await;
        let author_username = inner
            .author(params.author_id)
            .map(|a| a.username.clone())
            .ok_or_else(|| RepoError::InvalidInput {
                message: "unknown author".to_string(),
            })?;
        let comment = CommentRecord {
            id: inner.next_id(),
            post_id: params.post_id,
            author_id: params.author_id,
            author_username,
            text: params.text,
            created_at: inner.now(),
        };
        inner.comments.push(comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl FollowsRepo for MemoryStore {
    async fn follow(
        &self,
        follower_id: i64,
        author_id: i64,
    ) -> Result<Option<FollowRecord>, RepoError> {
        let mut inner = self.inner.lock().await;
        if follower_id == author_id {
            return Err(RepoError::Integrity {
                message: "follows_no_self_follow".to_string(),
            });
        }
        if inner
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.author_id == author_id)
        {
            return Ok(None);
        }
        let follow = FollowRecord {
            id: inner.next_id(),
            follower_id,
            author_id,
            created_at: inner.now(),
        };
        inner.follows.push(follow.clone());
        Ok(Some(follow))
    }

    async fn unfollow(&self, follower_id: i64, author_id: i64) -> Result<bool, RepoError> {
        let mut inner = self.inner.lock().await;
        let before = inner.follows.len();
        inner
            .follows
            .retain(|f| !(f.follower_id == follower_id && f.author_id == author_id));
        Ok(inner.follows.len() != before)
    }

    async fn is_following(&self, follower_id: i64, author_id: i64) -> Result<bool, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.author_id == author_id))
    }
}

#[async_trait]
impl HealthRepo for MemoryStore {
    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

pub fn feed_service(store: &Arc<MemoryStore>, page_size: u32) -> FeedService {
    FeedService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Paginator::new(NonZeroU32::new(page_size).unwrap()),
    )
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub public: Router,
    pub admin: Router,
}

impl TestApp {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self::with_cache(store, None)
    }

    pub fn with_cache(store: Arc<MemoryStore>, cache: Option<PageCacheConfig>) -> Self {
        let auth = AuthSettings::default();
        let cache = cache.map(|config| PageCacheState::new(config, auth.user_header.clone()));

        let http_state = HttpState {
            feed: Arc::new(feed_service(&store, 10)),
            posts: Arc::new(PostService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            follows: Arc::new(FollowService::new(store.clone(), store.clone())),
            authors: store.clone(),
            auth,
            cache: cache.clone(),
        };
        let admin_state = AdminState {
            cache,
            health: store.clone(),
        };

        Self {
            public: build_router(http_state),
            admin: build_admin_router(admin_state),
            store,
        }
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> Response<Body> {
        send(&self.public, request("GET", uri, user).body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, user: Option<&str>, form: &str) -> Response<Body> {
        let request = request("POST", uri, user)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        send(&self.public, request).await
    }

    pub async fn admin_post(&self, uri: &str) -> Response<Body> {
        send(&self.admin, request("POST", uri, None).body(Body::empty()).unwrap()).await
    }
}

fn request(method: &str, uri: &str, user: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    builder
}

async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(axum::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}
