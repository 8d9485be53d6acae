//! Repository tests against a real Postgres.
//!
//! Run with `DATABASE_URL` pointing at a server where the test user may create
//! databases, then `cargo test -- --ignored`.

use scribe::application::pagination::PageWindow;
use scribe::application::repos::{
    AuthorsRepo, CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams,
    FollowsRepo, GroupsRepo, PostQueryFilter, PostsRepo, PostsWriteRepo, RepoError,
    UpdatePostParams,
};
use scribe::infra::db::PostgresRepositories;
use sqlx::PgPool;

fn window(limit: u32) -> PageWindow {
    PageWindow { offset: 0, limit }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn ensure_author_is_idempotent(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);

    let first = repos.ensure_author("leo").await.expect("create author");
    let second = repos.ensure_author("leo").await.expect("reuse author");
    assert_eq!(first.id, second.id);

    let found = repos
        .find_by_username("leo")
        .await
        .expect("lookup author")
        .expect("author exists");
    assert_eq!(found.id, first.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn feed_queries_filter_and_order(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let leo = repos.ensure_author("leo").await.expect("leo");
    let ana = repos.ensure_author("ana").await.expect("ana");
    let cats = repos
        .create_group(CreateGroupParams {
            title: "Cats".into(),
            slug: "cats".into(),
            description: String::new(),
        })
        .await
        .expect("create group");

    let mut ids = Vec::new();
    for n in 0..3 {
        let post = repos
            .create_post(CreatePostParams {
                author_id: leo.id,
                group_id: (n % 2 == 0).then_some(cats.id),
                text: format!("leo {n}"),
                image: None,
            })
            .await
            .expect("create post");
        ids.push(post.id);
    }

    let all = repos
        .list_posts(&PostQueryFilter::all(), window(10))
        .await
        .expect("list all");
    let listed: Vec<_> = all.iter().map(|p| p.id).collect();
    ids.reverse();
    assert_eq!(listed, ids);

    assert_eq!(
        repos
            .count_posts(&PostQueryFilter::group(cats.id))
            .await
            .expect("count group"),
        2
    );
    assert_eq!(
        repos
            .count_posts(&PostQueryFilter::followed_by(ana.id))
            .await
            .expect("count followed before follow"),
        0
    );

    repos.follow(ana.id, leo.id).await.expect("follow");
    assert_eq!(
        repos
            .count_posts(&PostQueryFilter::followed_by(ana.id))
            .await
            .expect("count followed"),
        3
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn follows_are_unique_and_never_self_referential(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let leo = repos.ensure_author("leo").await.expect("leo");
    let ana = repos.ensure_author("ana").await.expect("ana");

    assert!(repos.follow(ana.id, leo.id).await.expect("follow").is_some());
    assert!(repos.follow(ana.id, leo.id).await.expect("refollow").is_none());
    assert!(repos.is_following(ana.id, leo.id).await.expect("check"));

    let err = repos.follow(leo.id, leo.id).await.expect_err("self follow");
    assert!(matches!(err, RepoError::Integrity { .. }));

    assert!(repos.unfollow(ana.id, leo.id).await.expect("unfollow"));
    assert!(!repos.unfollow(ana.id, leo.id).await.expect("unfollow again"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn posts_update_and_comments_follow_their_post(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let leo = repos.ensure_author("leo").await.expect("leo");
    let post = repos
        .create_post(CreatePostParams {
            author_id: leo.id,
            group_id: None,
            text: "draft".into(),
            image: None,
        })
        .await
        .expect("create post");

    let updated = repos
        .update_post(UpdatePostParams {
            id: post.id,
            group_id: None,
            text: "final".into(),
            image: Some("posts/cat.png".into()),
        })
        .await
        .expect("update post");
    assert_eq!(updated.text, "final");
    assert_eq!(updated.created_at, post.created_at);

    let comment = repos
        .create_comment(CreateCommentParams {
            post_id: post.id,
            author_id: leo.id,
            text: "first!".into(),
        })
        .await
        .expect("create comment");
    assert_eq!(comment.author_username, "leo");

    let comments = repos.list_for_post(post.id).await.expect("list comments");
    assert_eq!(comments.len(), 1);

    repos.delete_post(post.id).await.expect("delete post");
    assert!(repos.find_post(post.id).await.expect("find").is_none());
    assert!(repos.list_for_post(post.id).await.expect("list").is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_group_slug_is_reported(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let params = CreateGroupParams {
        title: "Cats".into(),
        slug: "cats".into(),
        description: String::new(),
    };
    repos.create_group(params.clone()).await.expect("first group");

    let err = repos.create_group(params).await.expect_err("duplicate slug");
    assert!(matches!(err, RepoError::Duplicate { .. }));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn equal_timestamps_list_in_id_order(pool: PgPool) {
    let repos = PostgresRepositories::new(pool.clone());
    let leo = repos.ensure_author("leo").await.expect("leo");

    let mut ids = Vec::new();
    for n in 0..3 {
        let post = repos
            .create_post(CreatePostParams {
                author_id: leo.id,
                group_id: None,
                text: format!("tie {n}"),
                image: None,
            })
            .await
            .expect("create post");
        ids.push(post.id);
    }

    sqlx::query("UPDATE posts SET created_at = TIMESTAMPTZ '2024-01-01 12:00:00+00'")
        .execute(&pool)
        .await
        .expect("pin timestamps");

    let listed: Vec<_> = repos
        .list_posts(&PostQueryFilter::all(), window(10))
        .await
        .expect("list all")
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(listed, ids);
}
