pub mod admin;
pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use std::sync::Arc;

use crate::admin::site::AdminSite;
use crate::config::AppConfig;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub admin: Arc<AdminSite>,
    pub admin_token: Option<String>,
    pub api_prefix: String,
    pub admin_prefix: String,
}

impl AppState {
    pub fn new(db: Db, config: &AppConfig) -> Self {
        Self {
            db,
            admin: Arc::new(admin::site()),
            admin_token: config.admin_token.clone(),
            api_prefix: config.api_prefix.clone(),
            admin_prefix: config.admin_prefix.clone(),
        }
    }
}
