//! Back-office configuration for users, posts, comments and reactions.

pub mod display;
pub mod filters;
pub mod options;
pub mod rows;
pub mod site;

use serde_json::{json, Value};

use crate::admin::display::{get_body, get_comment_count, timestamp};
use crate::admin::options::{
    Column, FilterChoice, ListFilter, ModelAdmin, ModelOptions, RelatedTarget, SearchField,
};
use crate::admin::rows::{CommentListing, PostListing, ReactionListing};
use crate::admin::site::{AdminSite, GROUP_MODEL_KEY};
use crate::domain::engagement::ReactionValue;
use crate::domain::user::User;

pub const APP_LABEL: &str = "general";

/// The configured site: the four domain models, without `auth.group`.
pub fn site() -> AdminSite {
    let mut site = AdminSite::new(user_admin(), post_admin(), comment_admin(), reaction_admin());
    site.unregister(GROUP_MODEL_KEY);
    site
}

fn author_filter(table: &'static str, column: &'static str) -> ListFilter {
    ListFilter::Related {
        parameter: "author",
        table,
        column,
        target: RelatedTarget::User,
    }
}

fn post_filter(table: &'static str, column: &'static str) -> ListFilter {
    ListFilter::Related {
        parameter: "post",
        table,
        column,
        target: RelatedTarget::Post,
    }
}

pub fn user_admin() -> ModelAdmin<User> {
    let mut options = ModelOptions::new(APP_LABEL, "user");
    options.verbose_name_plural = "users";
    options.fields = vec![
        "first_name",
        "last_name",
        "username",
        "password",
        "email",
        "is_staff",
    ];
    options.readonly_fields = vec!["date_joined", "last_login"];
    options.search_fields = vec![
        SearchField::new("id", "users.id::text"),
        SearchField::new("username", "users.username"),
        SearchField::new("email", "users.email"),
    ];
    options.list_filter = vec![
        ListFilter::Boolean {
            field: "is_staff",
            column: "users.is_staff",
        },
        ListFilter::Boolean {
            field: "is_superuser",
            column: "users.is_superuser",
        },
        ListFilter::Boolean {
            field: "is_active",
            column: "users.is_active",
        },
        ListFilter::DateRange {
            field: "date_joined",
            column: "users.date_joined",
        },
    ];

    ModelAdmin::new(
        options,
        vec![
            Column::new("id", "ID", |u: &User| json!(u.id)),
            Column::new("first_name", "first name", |u: &User| json!(u.first_name)),
            Column::new("last_name", "last name", |u: &User| json!(u.last_name)),
            Column::new("username", "username", |u: &User| json!(u.username)),
            Column::new("email", "email address", |u: &User| json!(u.email)),
            Column::new("is_staff", "staff status", |u: &User| json!(u.is_staff)),
            Column::new("is_superuser", "superuser status", |u: &User| {
                json!(u.is_superuser)
            }),
            Column::new("is_active", "active", |u: &User| json!(u.is_active)),
            Column::new("date_joined", "date joined", |u: &User| timestamp(u.date_joined)),
        ],
    )
}

pub fn post_admin() -> ModelAdmin<PostListing> {
    let mut options = ModelOptions::new(APP_LABEL, "post");
    options.verbose_name_plural = "posts";
    options.fields = vec!["author", "title", "body"];
    options.search_fields = vec![
        SearchField::new("id", "posts.id::text"),
        SearchField::new("title", "posts.title"),
        SearchField::new("author__username", "users.username"),
    ];
    options.list_filter = vec![
        author_filter("posts", "posts.author_id"),
        ListFilter::DateRange {
            field: "created_at",
            column: "posts.created_at",
        },
    ];
    options.autocomplete_fields = vec!["author"];

    ModelAdmin::new(
        options,
        vec![
            Column::new("id", "ID", |p: &PostListing| json!(p.post.id)),
            Column::new("author", "author", |p: &PostListing| json!(p.author_username)),
            Column::new("title", "title", |p: &PostListing| json!(p.post.title)),
            Column::new("get_body", "body", |p: &PostListing| json!(get_body(&p.post))),
            Column::new("created_at", "created at", |p: &PostListing| {
                timestamp(p.post.created_at)
            }),
            Column::new("get_comment_count", "comments", |p: &PostListing| {
                json!(get_comment_count(p))
            }),
        ],
    )
}

pub fn comment_admin() -> ModelAdmin<CommentListing> {
    let mut options = ModelOptions::new(APP_LABEL, "comment");
    options.verbose_name_plural = "comments";
    options.list_display_links = vec!["id"];
    options.fields = vec!["author", "post", "body"];
    options.list_filter = vec![
        post_filter("comments", "comments.post_id"),
        author_filter("comments", "comments.author_id"),
    ];
    options.raw_id_fields = vec!["author"];

    ModelAdmin::new(
        options,
        vec![
            Column::new("id", "ID", |c: &CommentListing| json!(c.comment.id)),
            Column::new("author", "author", |c: &CommentListing| json!(c.author_username)),
            Column::new("post", "post", |c: &CommentListing| json!(c.post_title)),
            Column::new("created_at", "created at", |c: &CommentListing| {
                timestamp(c.comment.created_at)
            }),
        ],
    )
}

pub fn reaction_admin() -> ModelAdmin<ReactionListing> {
    let mut options = ModelOptions::new(APP_LABEL, "reaction");
    options.verbose_name_plural = "reactions";
    options.fields = vec!["author", "post", "value"];
    options.list_filter = vec![
        post_filter("reactions", "reactions.post_id"),
        author_filter("reactions", "reactions.author_id"),
        ListFilter::Choice {
            field: "value",
            column: "reactions.value::text",
            choices: ReactionValue::ALL
                .iter()
                .map(|value| FilterChoice::new(value.label(), value.as_db()))
                .collect(),
        },
    ];

    ModelAdmin::new(
        options,
        vec![
            Column::new("id", "ID", |r: &ReactionListing| json!(r.reaction.id)),
            Column::new("author", "author", |r: &ReactionListing| json!(r.author_username)),
            Column::new("post", "post", |r: &ReactionListing| json!(r.post_title)),
            Column::new("value", "value", |r: &ReactionListing| {
                Value::String(r.reaction.value.as_db().to_string())
            }),
        ],
    )
}
