mod common;

use common::{EPOCH, MemoryStore, feed_service};
use scribe::application::feed::{FeedError, FeedFilter, FeedScope};
use scribe::application::pagination::PageRequest;
use scribe::application::repos::FollowsRepo;
use time::Duration;

#[tokio::test]
async fn twenty_four_posts_split_into_ten_ten_four() {
    let store = MemoryStore::new();
    let leo = store.author("leo").await;
    for n in 0..24 {
        store.post(&leo, None, &format!("post {n}")).await;
    }
    let feed = feed_service(&store, 10);

    let mut sizes = Vec::new();
    for number in 1..=3 {
        let page = feed
            .assemble_feed(FeedFilter::All, PageRequest::number(number))
            .await
            .unwrap();
        assert_eq!(page.page.num_pages, 3);
        assert_eq!(page.page.total_count, 24);
        sizes.push(page.page.items.len());
    }
    assert_eq!(sizes, vec![10, 10, 4]);
}

#[tokio::test]
async fn newest_posts_come_first() {
    let store = MemoryStore::new();
    let leo = store.author("leo").await;
    store.post(&leo, None, "first").await;
    store.post(&leo, None, "second").await;
    store.post(&leo, None, "third").await;

    let page = feed_service(&store, 10)
        .assemble_feed(FeedFilter::All, PageRequest::first())
        .await
        .unwrap();
    let texts: Vec<_> = page.page.items.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn equal_timestamps_fall_back_to_id_order() {
    let store = MemoryStore::new();
    let leo = store.author("leo").await;
    let shared = EPOCH + Duration::days(1);
    let newest = store.post_at(&leo, "newest", shared + Duration::seconds(1)).await;
    let tie_a = store.post_at(&leo, "tie a", shared).await;
    let tie_b = store.post_at(&leo, "tie b", shared).await;
    let tie_c = store.post_at(&leo, "tie c", shared).await;

    let page = feed_service(&store, 10)
        .assemble_feed(FeedFilter::All, PageRequest::first())
        .await
        .unwrap();
    let ids: Vec<i64> = page.page.items.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![newest.id, tie_a.id, tie_b.id, tie_c.id]);
}

#[tokio::test]
async fn out_of_range_and_garbage_pages_resolve() {
    let store = MemoryStore::new();
    let leo = store.author("leo").await;
    for n in 0..24 {
        store.post(&leo, None, &format!("post {n}")).await;
    }
    let feed = feed_service(&store, 10);

    let past_end = feed
        .assemble_feed(FeedFilter::All, PageRequest::number(99))
        .await
        .unwrap();
    assert_eq!(past_end.page.number, 3);
    assert_eq!(past_end.page.items.len(), 4);

    let garbage = feed
        .assemble_feed(FeedFilter::All, PageRequest::parse(Some("abc")))
        .await
        .unwrap();
    assert_eq!(garbage.page.number, 1);
    assert_eq!(garbage.page.items.len(), 10);
}

#[tokio::test]
async fn empty_feed_has_a_single_page() {
    let store = MemoryStore::new();
    let page = feed_service(&store, 10)
        .assemble_feed(FeedFilter::All, PageRequest::number(5))
        .await
        .unwrap();
    assert_eq!(page.page.number, 1);
    assert_eq!(page.page.num_pages, 1);
    assert!(page.page.items.is_empty());
}

#[tokio::test]
async fn every_feed_uses_the_same_page_size() {
    let store = MemoryStore::new();
    let leo = store.author("leo").await;
    let ana = store.author("ana").await;
    let cats = store.group("Cats", "cats").await;
    for n in 0..13 {
        store.post(&leo, Some(&cats), &format!("cat post {n}")).await;
    }
    store.follow(ana.id, leo.id).await.unwrap();
    let feed = feed_service(&store, 10);

    for filter in [
        FeedFilter::All,
        FeedFilter::Group("cats".into()),
        FeedFilter::Author("leo".into()),
        FeedFilter::Followed(ana.id),
    ] {
        let page = feed
            .assemble_feed(filter.clone(), PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.page.items.len(), 10, "first page of {filter:?}");
        assert_eq!(page.page.num_pages, 2, "page count of {filter:?}");
    }
}

#[tokio::test]
async fn group_feed_only_shows_its_own_posts() {
    let store = MemoryStore::new();
    let leo = store.author("leo").await;
    let cats = store.group("Cats", "cats").await;
    let dogs = store.group("Dogs", "dogs").await;
    let cat_post = store.post(&leo, Some(&cats), "meow").await;
    store.post(&leo, Some(&dogs), "woof").await;
    store.post(&leo, None, "no group").await;
    let feed = feed_service(&store, 10);

    let page = feed
        .assemble_feed(FeedFilter::Group("cats".into()), PageRequest::first())
        .await
        .unwrap();
    let ids: Vec<_> = page.page.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![cat_post.id]);
    assert!(matches!(page.scope, FeedScope::Group(ref group) if group.slug == "cats"));
    assert_eq!(page.base_path, "/group/cats/");
}

#[tokio::test]
async fn followed_feed_fans_out_to_followers_only() {
    let store = MemoryStore::new();
    let writer = store.author("writer").await;
    let fan = store.author("fan").await;
    let stranger = store.author("stranger").await;
    store.follow(fan.id, writer.id).await.unwrap();
    let post = store.post(&writer, None, "hello followers").await;
    let feed = feed_service(&store, 10);

    let fan_page = feed
        .assemble_feed(FeedFilter::Followed(fan.id), PageRequest::first())
        .await
        .unwrap();
    assert!(fan_page.page.items.iter().any(|p| p.id == post.id));

    let stranger_page = feed
        .assemble_feed(FeedFilter::Followed(stranger.id), PageRequest::first())
        .await
        .unwrap();
    assert!(stranger_page.page.items.is_empty());
}

#[tokio::test]
async fn author_feed_reports_post_count() {
    let store = MemoryStore::new();
    let leo = store.author("leo").await;
    let ana = store.author("ana").await;
    for n in 0..12 {
        store.post(&leo, None, &format!("leo {n}")).await;
    }
    store.post(&ana, None, "ana").await;

    let page = feed_service(&store, 10)
        .assemble_feed(FeedFilter::Author("leo".into()), PageRequest::number(2))
        .await
        .unwrap();
    match page.scope {
        FeedScope::Author { author, post_count } => {
            assert_eq!(author.username, "leo");
            assert_eq!(post_count, 12);
        }
        other => panic!("unexpected scope: {other:?}"),
    }
    assert_eq!(page.page.items.len(), 2);
}

#[tokio::test]
async fn unknown_group_and_author_are_reported() {
    let store = MemoryStore::new();
    let feed = feed_service(&store, 10);

    assert!(matches!(
        feed.assemble_feed(FeedFilter::Group("nope".into()), PageRequest::first())
            .await,
        Err(FeedError::UnknownGroup(slug)) if slug == "nope"
    ));
    assert!(matches!(
        feed.assemble_feed(FeedFilter::Author("ghost".into()), PageRequest::first())
            .await,
        Err(FeedError::UnknownAuthor(name)) if name == "ghost"
    ));
}
