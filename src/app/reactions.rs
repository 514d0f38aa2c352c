use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::engagement::{Reaction, ReactionValue};
use crate::infra::db::Db;

pub(crate) const REACTION_COLUMNS: &str = "id, author_id, post_id, value::text AS value";

#[derive(Debug, Clone)]
pub struct NewReaction {
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub value: ReactionValue,
}

#[derive(Debug, Clone, Default)]
pub struct ReactionChanges {
    pub author_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub value: Option<ReactionValue>,
}

#[derive(Clone)]
pub struct ReactionService {
    db: Db,
}

impl ReactionService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Reaction>, i64)> {
        let rows = sqlx::query(&format!(
            "SELECT {REACTION_COLUMNS} FROM reactions \
             ORDER BY id DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reactions")
            .fetch_one(self.db.pool())
            .await?;

        let reactions = rows
            .iter()
            .map(reaction_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok((reactions, count))
    }

    pub async fn get_reaction(&self, reaction_id: Uuid) -> Result<Option<Reaction>> {
        let row = sqlx::query(&format!(
            "SELECT {REACTION_COLUMNS} FROM reactions WHERE id = $1"
        ))
        .bind(reaction_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(reaction_from_row).transpose()
    }

    pub async fn create_reaction(&self, new_reaction: NewReaction) -> Result<Reaction> {
        let row = sqlx::query(&format!(
            "INSERT INTO reactions (author_id, post_id, value) \
             VALUES ($1, $2, $3::reaction_value) \
             RETURNING {REACTION_COLUMNS}"
        ))
        .bind(new_reaction.author_id)
        .bind(new_reaction.post_id)
        .bind(new_reaction.value.as_db())
        .fetch_one(self.db.pool())
        .await?;

        reaction_from_row(&row)
    }

    pub async fn update_reaction(
        &self,
        reaction_id: Uuid,
        changes: ReactionChanges,
    ) -> Result<Option<Reaction>> {
        let row = sqlx::query(&format!(
            "UPDATE reactions \
             SET author_id = COALESCE($2, author_id), \
                 post_id = COALESCE($3, post_id), \
                 value = COALESCE($4::reaction_value, value) \
             WHERE id = $1 \
             RETURNING {REACTION_COLUMNS}"
        ))
        .bind(reaction_id)
        .bind(changes.author_id)
        .bind(changes.post_id)
        .bind(changes.value.map(|value| value.as_db()))
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(reaction_from_row).transpose()
    }

    pub async fn delete_reaction(&self, reaction_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reactions WHERE id = $1")
            .bind(reaction_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub(crate) fn reaction_from_row(row: &PgRow) -> Result<Reaction> {
    let value: String = row.get("value");
    let value = ReactionValue::from_db(&value)
        .ok_or_else(|| anyhow!("unknown reaction value: {}", value))?;

    Ok(Reaction {
        id: row.get("id"),
        author_id: row.get("author_id"),
        post_id: row.get("post_id"),
        value,
    })
}
