use std::collections::HashMap;

use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::admin::filters::{ChangeListRequest, FilterSpec};
use crate::admin::options::{FilterChoice, ListFilter, ModelOptions, RelatedTarget};
use crate::admin::rows::{CommentListing, PostListing, ReactionListing};
use crate::app::comments::{comment_from_row, COMMENT_COLUMNS};
use crate::app::posts::post_from_row;
use crate::app::reactions::reaction_from_row;
use crate::app::users::{user_from_row, USER_COLUMNS};
use crate::domain::engagement::Comment;
use crate::domain::user::User;
use crate::infra::db::Db;

pub const AUTOCOMPLETE_PAGE_SIZE: i64 = 20;

/// Where a list view reads from. Filter and search columns of the model's
/// options must resolve against `from`.
struct ListingSource {
    select: &'static str,
    from: &'static str,
    order_by: &'static str,
}

const USERS: ListingSource = ListingSource {
    select: USER_COLUMNS,
    from: "users",
    order_by: "users.date_joined DESC, users.id DESC",
};

const POSTS: ListingSource = ListingSource {
    select: "posts.id, posts.author_id, posts.title, posts.body, posts.created_at, \
             users.username AS author_username",
    from: "posts JOIN users ON users.id = posts.author_id",
    order_by: "posts.created_at DESC, posts.id DESC",
};

const COMMENTS: ListingSource = ListingSource {
    select: "comments.id, comments.author_id, comments.post_id, comments.body, comments.created_at, \
             users.username AS author_username, posts.title AS post_title",
    from: "comments \
           JOIN users ON users.id = comments.author_id \
           JOIN posts ON posts.id = comments.post_id",
    order_by: "comments.created_at DESC, comments.id DESC",
};

const REACTIONS: ListingSource = ListingSource {
    select: "reactions.id, reactions.author_id, reactions.post_id, reactions.value::text AS value, \
             users.username AS author_username, posts.title AS post_title",
    from: "reactions \
           JOIN users ON users.id = reactions.author_id \
           JOIN posts ON posts.id = reactions.post_id",
    order_by: "reactions.id DESC",
};

#[derive(Clone)]
pub struct AdminService {
    db: Db,
}

impl AdminService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list_users(
        &self,
        options: &ModelOptions,
        request: &ChangeListRequest,
    ) -> Result<(Vec<User>, i64)> {
        let (rows, total) = self.fetch_page(&USERS, options, request).await?;
        Ok((rows.iter().map(user_from_row).collect(), total))
    }

    /// One query for the page of posts and one for all of their comments.
    pub async fn list_posts(
        &self,
        options: &ModelOptions,
        request: &ChangeListRequest,
    ) -> Result<(Vec<PostListing>, i64)> {
        let (rows, total) = self.fetch_page(&POSTS, options, request).await?;

        let post_ids: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();
        let mut comments = self.prefetch_comments(&post_ids).await?;

        let listings = rows
            .iter()
            .map(|row| {
                let post = post_from_row(row);
                PostListing {
                    author_username: row.get("author_username"),
                    comments: comments.remove(&post.id).unwrap_or_default(),
                    post,
                }
            })
            .collect();

        Ok((listings, total))
    }

    pub async fn list_comments(
        &self,
        options: &ModelOptions,
        request: &ChangeListRequest,
    ) -> Result<(Vec<CommentListing>, i64)> {
        let (rows, total) = self.fetch_page(&COMMENTS, options, request).await?;
        let listings = rows
            .iter()
            .map(|row| CommentListing {
                comment: comment_from_row(row),
                author_username: row.get("author_username"),
                post_title: row.get("post_title"),
            })
            .collect();
        Ok((listings, total))
    }

    pub async fn list_reactions(
        &self,
        options: &ModelOptions,
        request: &ChangeListRequest,
    ) -> Result<(Vec<ReactionListing>, i64)> {
        let (rows, total) = self.fetch_page(&REACTIONS, options, request).await?;
        let mut listings = Vec::with_capacity(rows.len());
        for row in &rows {
            listings.push(ReactionListing {
                reaction: reaction_from_row(row)?,
                author_username: row.get("author_username"),
                post_title: row.get("post_title"),
            });
        }
        Ok((listings, total))
    }

    /// Counted in the database at call time.
    pub async fn comment_count(&self, post_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    pub async fn prefetch_comments(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Comment>>> {
        let mut grouped: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE post_id = ANY($1) \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(post_ids.to_vec())
        .fetch_all(self.db.pool())
        .await?;

        for row in &rows {
            let comment = comment_from_row(row);
            grouped.entry(comment.post_id).or_default().push(comment);
        }
        Ok(grouped)
    }

    pub async fn filter_specs(
        &self,
        options: &ModelOptions,
        request: &ChangeListRequest,
    ) -> Result<Vec<FilterSpec>> {
        let mut specs = Vec::with_capacity(options.list_filter.len());
        for filter in &options.list_filter {
            let choices = match filter {
                ListFilter::Boolean { .. } => vec![
                    FilterChoice::new("All", ""),
                    FilterChoice::new("Yes", "1"),
                    FilterChoice::new("No", "0"),
                ],
                ListFilter::DateRange { .. } => Vec::new(),
                ListFilter::Related {
                    table,
                    column,
                    target,
                    ..
                } => self.related_choices(table, column, *target).await?,
                ListFilter::Choice { choices, .. } => choices.clone(),
            };

            specs.push(FilterSpec {
                title: filter.title(),
                kind: filter.kind(),
                parameters: filter.parameters(),
                choices,
                selected: request.selected(filter),
            });
        }
        Ok(specs)
    }

    /// Users matching the user admin's search fields, ordered by username.
    /// Returns whether another page exists.
    pub async fn autocomplete_users(
        &self,
        user_options: &ModelOptions,
        term: &str,
        page: i64,
    ) -> Result<(Vec<User>, bool)> {
        let request = ChangeListRequest {
            query: Some(term.to_string()),
            terms: term.split_whitespace().map(str::to_string).collect(),
            filters: Vec::new(),
            page,
            per_page: AUTOCOMPLETE_PAGE_SIZE,
        };
        let source = ListingSource {
            order_by: "users.username ASC, users.id ASC",
            ..USERS
        };

        let (rows, total) = self.fetch_page(&source, user_options, &request).await?;
        let more = total > page.saturating_mul(AUTOCOMPLETE_PAGE_SIZE);
        Ok((rows.iter().map(user_from_row).collect(), more))
    }

    async fn related_choices(
        &self,
        table: &str,
        column: &str,
        target: RelatedTarget,
    ) -> Result<Vec<FilterChoice>> {
        let rows = sqlx::query(&format!(
            "SELECT DISTINCT t.id, t.{label} AS label \
             FROM {table} JOIN {target} t ON t.id = {column} \
             ORDER BY label, t.id",
            label = target.label_column(),
            target = target.table(),
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                let label: String = row.get("label");
                FilterChoice::new(label, id.to_string())
            })
            .collect())
    }

    async fn fetch_page(
        &self,
        source: &ListingSource,
        options: &ModelOptions,
        request: &ChangeListRequest,
    ) -> Result<(Vec<PgRow>, i64)> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE TRUE",
            source.select, source.from
        ));
        request.push_conditions(options, &mut builder);
        builder
            .push(" ORDER BY ")
            .push(source.order_by)
            .push(" LIMIT ")
            .push_bind(request.per_page)
            .push(" OFFSET ")
            .push_bind(request.offset());
        let rows = builder.build().fetch_all(self.db.pool()).await?;

        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE TRUE", source.from));
        request.push_conditions(options, &mut count);
        let total: i64 = count.build().fetch_one(self.db.pool()).await?.try_get(0)?;

        Ok((rows, total))
    }
}
