use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::chat::{Chat, Message};
use crate::infra::db::Db;

const CHAT_COLUMNS: &str = "id, title, created_at";
const MESSAGE_COLUMNS: &str = "id, chat_id, author_id, body, created_at";

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub chat_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct MessageChanges {
    pub chat_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub body: Option<String>,
}

#[derive(Clone)]
pub struct ChatService {
    db: Db,
}

impl ChatService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list_chats(&self, limit: i64, offset: i64) -> Result<(Vec<Chat>, i64)> {
        let rows = sqlx::query(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chats")
            .fetch_one(self.db.pool())
            .await?;

        Ok((rows.iter().map(chat_from_row).collect(), count))
    }

    pub async fn get_chat(&self, chat_id: Uuid) -> Result<Option<Chat>> {
        let row = sqlx::query(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1"))
            .bind(chat_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(chat_from_row))
    }

    pub async fn create_chat(&self, title: String) -> Result<Chat> {
        let row = sqlx::query(&format!(
            "INSERT INTO chats (title) VALUES ($1) RETURNING {CHAT_COLUMNS}"
        ))
        .bind(title)
        .fetch_one(self.db.pool())
        .await?;

        Ok(chat_from_row(&row))
    }

    pub async fn rename_chat(&self, chat_id: Uuid, title: Option<String>) -> Result<Option<Chat>> {
        let row = sqlx::query(&format!(
            "UPDATE chats SET title = COALESCE($2, title) WHERE id = $1 \
             RETURNING {CHAT_COLUMNS}"
        ))
        .bind(chat_id)
        .bind(title)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(chat_from_row))
    }

    /// Messages of the chat are removed by `ON DELETE CASCADE`.
    pub async fn delete_chat(&self, chat_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(chat_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_messages(&self, limit: i64, offset: i64) -> Result<(Vec<Message>, i64)> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(self.db.pool())
            .await?;

        Ok((rows.iter().map(message_from_row).collect(), count))
    }

    pub async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>> {
        let row = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(message_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(message_from_row))
    }

    pub async fn create_message(&self, new_message: NewMessage) -> Result<Message> {
        let row = sqlx::query(&format!(
            "INSERT INTO messages (chat_id, author_id, body) VALUES ($1, $2, $3) \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(new_message.chat_id)
        .bind(new_message.author_id)
        .bind(new_message.body)
        .fetch_one(self.db.pool())
        .await?;

        Ok(message_from_row(&row))
    }

    pub async fn update_message(
        &self,
        message_id: Uuid,
        changes: MessageChanges,
    ) -> Result<Option<Message>> {
        let row = sqlx::query(&format!(
            "UPDATE messages \
             SET chat_id = COALESCE($2, chat_id), \
                 author_id = COALESCE($3, author_id), \
                 body = COALESCE($4, body) \
             WHERE id = $1 \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .bind(changes.chat_id)
        .bind(changes.author_id)
        .bind(changes.body)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(message_from_row))
    }

    pub async fn delete_message(&self, message_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(message_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn chat_from_row(row: &PgRow) -> Chat {
    Chat {
        id: row.get("id"),
        title: row.get("title"),
        created_at: row.get("created_at"),
    }
}

fn message_from_row(row: &PgRow) -> Message {
    Message {
        id: row.get("id"),
        chat_id: row.get("chat_id"),
        author_id: row.get("author_id"),
        body: row.get("body"),
        created_at: row.get("created_at"),
    }
}
