use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::post::Post;
use crate::infra::db::Db;

pub(crate) const POST_COLUMNS: &str = "id, author_id, title, body, created_at";

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub author_id: Option<Uuid>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Post>, i64)> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.db.pool())
            .await?;

        Ok((rows.iter().map(post_from_row).collect(), count))
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    pub async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let row = sqlx::query(&format!(
            "INSERT INTO posts (author_id, title, body) VALUES ($1, $2, $3) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(new_post.author_id)
        .bind(new_post.title)
        .bind(new_post.body)
        .fetch_one(self.db.pool())
        .await?;

        Ok(post_from_row(&row))
    }

    pub async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "UPDATE posts \
             SET author_id = COALESCE($2, author_id), \
                 title = COALESCE($3, title), \
                 body = COALESCE($4, body) \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(post_id)
        .bind(changes.author_id)
        .bind(changes.title)
        .bind(changes.body)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    pub async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub(crate) fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        title: row.get("title"),
        body: row.get("body"),
        created_at: row.get("created_at"),
    }
}
