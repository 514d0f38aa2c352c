use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::engagement::Comment;
use crate::infra::db::Db;

pub(crate) const COMMENT_COLUMNS: &str = "id, author_id, post_id, body, created_at";

#[derive(Debug, Clone)]
pub struct NewComment {
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct CommentChanges {
    pub author_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub body: Option<String>,
}

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Comment>, i64)> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(self.db.pool())
            .await?;

        Ok((rows.iter().map(comment_from_row).collect(), count))
    }

    pub async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(comment_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(comment_from_row))
    }

    pub async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        let row = sqlx::query(&format!(
            "INSERT INTO comments (author_id, post_id, body) VALUES ($1, $2, $3) \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(new_comment.author_id)
        .bind(new_comment.post_id)
        .bind(new_comment.body)
        .fetch_one(self.db.pool())
        .await?;

        Ok(comment_from_row(&row))
    }

    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        changes: CommentChanges,
    ) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!(
            "UPDATE comments \
             SET author_id = COALESCE($2, author_id), \
                 post_id = COALESCE($3, post_id), \
                 body = COALESCE($4, body) \
             WHERE id = $1 \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(comment_id)
        .bind(changes.author_id)
        .bind(changes.post_id)
        .bind(changes.body)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(comment_from_row))
    }

    pub async fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub(crate) fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        author_id: row.get("author_id"),
        post_id: row.get("post_id"),
        body: row.get("body"),
        created_at: row.get("created_at"),
    }
}
