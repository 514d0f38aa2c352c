use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::app::passwords::hash_password;
use crate::domain::user::User;
use crate::infra::db::Db;

pub(crate) const USER_COLUMNS: &str = "id, first_name, last_name, username, email, password, \
     is_staff, is_superuser, is_active, date_joined, last_login";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
}

/// Partial update; `None` keeps the stored value. `password` is plaintext and
/// gets hashed before it reaches the database.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             ORDER BY date_joined DESC, id DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.db.pool())
            .await?;

        Ok((rows.iter().map(user_from_row).collect(), count))
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let password_hash = hash_password(&new_user.password)?;
        let row = sqlx::query(&format!(
            "INSERT INTO users \
                (first_name, last_name, username, email, password, is_staff, is_superuser, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.username)
        .bind(new_user.email)
        .bind(password_hash)
        .bind(new_user.is_staff)
        .bind(new_user.is_superuser)
        .bind(new_user.is_active)
        .fetch_one(self.db.pool())
        .await?;

        Ok(user_from_row(&row))
    }

    pub async fn update_user(&self, user_id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let password_hash = match changes.password {
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };

        let row = sqlx::query(&format!(
            "UPDATE users \
             SET first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name), \
                 username = COALESCE($4, username), \
                 email = COALESCE($5, email), \
                 password = COALESCE($6, password), \
                 is_staff = COALESCE($7, is_staff), \
                 is_superuser = COALESCE($8, is_superuser), \
                 is_active = COALESCE($9, is_active) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.username)
        .bind(changes.email)
        .bind(password_hash)
        .bind(changes.is_staff)
        .bind(changes.is_superuser)
        .bind(changes.is_active)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Posts, comments, reactions and messages go with the user through
    /// `ON DELETE CASCADE`.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub(crate) fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        username: row.get("username"),
        email: row.get("email"),
        password: row.get("password"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        date_joined: row.get("date_joined"),
        last_login: row.get("last_login"),
    }
}
