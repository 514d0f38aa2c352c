//! The admin registry.
//!
//! An [`AdminSite`] is built once at startup and kept in the application
//! state. A fresh site lists the framework's own `auth.group` model, the same
//! way the stock admin registers it before any application configuration runs;
//! [`crate::admin::site`] takes it back out.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::admin::filters::{ChangeListRequest, FilterSpec};
use crate::admin::options::{ModelAdmin, ModelOptions};
use crate::admin::rows::{CommentListing, PostListing, ReactionListing};
use crate::domain::user::User;

pub const GROUP_MODEL_KEY: &str = "auth.group";

#[derive(Debug, Clone, Serialize)]
pub struct ModelMeta {
    pub app_label: &'static str,
    pub model_name: &'static str,
    pub verbose_name_plural: &'static str,
}

impl ModelMeta {
    pub fn key(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }
}

impl From<&ModelOptions> for ModelMeta {
    fn from(options: &ModelOptions) -> Self {
        Self {
            app_label: options.app_label,
            model_name: options.model_name,
            verbose_name_plural: options.verbose_name_plural,
        }
    }
}

pub struct AdminSite {
    registry: Vec<ModelMeta>,
    pub users: ModelAdmin<User>,
    pub posts: ModelAdmin<PostListing>,
    pub comments: ModelAdmin<CommentListing>,
    pub reactions: ModelAdmin<ReactionListing>,
}

impl AdminSite {
    pub fn new(
        users: ModelAdmin<User>,
        posts: ModelAdmin<PostListing>,
        comments: ModelAdmin<CommentListing>,
        reactions: ModelAdmin<ReactionListing>,
    ) -> Self {
        let mut site = Self {
            registry: vec![ModelMeta {
                app_label: "auth",
                model_name: "group",
                verbose_name_plural: "groups",
            }],
            users,
            posts,
            comments,
            reactions,
        };

        let metas = [
            ModelMeta::from(&site.users.options),
            ModelMeta::from(&site.posts.options),
            ModelMeta::from(&site.comments.options),
            ModelMeta::from(&site.reactions.options),
        ];
        for meta in metas {
            site.register(meta);
        }
        site
    }

    /// Registering a key twice replaces the earlier entry in place.
    pub fn register(&mut self, meta: ModelMeta) {
        let key = meta.key();
        match self.registry.iter_mut().find(|existing| existing.key() == key) {
            Some(existing) => *existing = meta,
            None => self.registry.push(meta),
        }
    }

    pub fn unregister(&mut self, key: &str) -> bool {
        let before = self.registry.len();
        self.registry.retain(|meta| meta.key() != key);
        self.registry.len() != before
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.registry.iter().any(|meta| meta.key() == key)
    }

    pub fn models(&self) -> &[ModelMeta] {
        &self.registry
    }

    pub fn index(&self, admin_prefix: &str) -> AdminIndex {
        AdminIndex {
            models: self
                .registry
                .iter()
                .map(|meta| IndexEntry {
                    key: meta.key(),
                    url: format!("{}/{}/{}/", admin_prefix, meta.app_label, meta.model_name),
                    meta: meta.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminIndex {
    pub models: Vec<IndexEntry>,
}

#[derive(Debug, Serialize)]
pub struct IndexEntry {
    pub key: String,
    pub url: String,
    #[serde(flatten)]
    pub meta: ModelMeta,
}

#[derive(Debug, Serialize)]
pub struct ColumnHeader {
    pub name: &'static str,
    pub label: &'static str,
    pub link: bool,
}

#[derive(Debug, Serialize)]
pub struct ChangeListRow {
    pub id: Uuid,
    pub cells: Vec<Value>,
}

/// The rendered list view of one model.
#[derive(Debug, Serialize)]
pub struct ChangeList {
    pub model: String,
    pub verbose_name_plural: &'static str,
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<ChangeListRow>,
    pub filters: Vec<FilterSpec>,
    pub search_fields: Vec<&'static str>,
    pub query: Option<String>,
    pub page: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl<T> ModelAdmin<T> {
    pub fn changelist(
        &self,
        rows: &[T],
        row_id: fn(&T) -> Uuid,
        total: i64,
        request: &ChangeListRequest,
        filters: Vec<FilterSpec>,
    ) -> ChangeList {
        let links = self.link_columns();
        let per_page = request.per_page.max(1);
        let num_pages = ((total + per_page - 1) / per_page).max(1);

        ChangeList {
            model: self.options.key(),
            verbose_name_plural: self.options.verbose_name_plural,
            columns: self
                .list_display
                .iter()
                .map(|column| ColumnHeader {
                    name: column.name,
                    label: column.label,
                    link: links.contains(&column.name),
                })
                .collect(),
            rows: rows
                .iter()
                .map(|row| ChangeListRow {
                    id: row_id(row),
                    cells: self.list_display.iter().map(|column| column.value(row)).collect(),
                })
                .collect(),
            filters,
            search_fields: self.options.search_fields.iter().map(|f| f.name).collect(),
            query: request.query.clone(),
            page: request.page,
            num_pages,
            total,
        }
    }
}
