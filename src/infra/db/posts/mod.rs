mod read;
mod write;

use time::OffsetDateTime;

use crate::domain::entities::{PostRecord, PostSummary};

const POST_SUMMARY_SELECT: &str = "SELECT p.id, p.text, p.image, p.created_at, p.author_id, \
     a.username AS author_username, a.display_name AS author_display_name, \
     p.group_id, g.slug AS group_slug, g.title AS group_title \
     FROM posts p \
     INNER JOIN authors a ON a.id = p.author_id \
     LEFT JOIN post_groups g ON g.id = p.group_id \
     WHERE 1=1 ";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    author_id: i64,
    group_id: Option<i64>,
    text: String,
    image: Option<String>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            group_id: row.group_id,
            text: row.text,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostSummaryRow {
    id: i64,
    text: String,
    image: Option<String>,
    created_at: OffsetDateTime,
    author_id: i64,
    author_username: String,
    author_display_name: String,
    group_id: Option<i64>,
    group_slug: Option<String>,
    group_title: Option<String>,
}

impl From<PostSummaryRow> for PostSummary {
    fn from(row: PostSummaryRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            image: row.image,
            created_at: row.created_at,
            author_id: row.author_id,
            author_username: row.author_username,
            author_display_name: row.author_display_name,
            group_id: row.group_id,
            group_slug: row.group_slug,
            group_title: row.group_title,
        }
    }
}
