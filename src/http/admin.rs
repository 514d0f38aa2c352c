//! HTTP surface of the admin site: index, list views, change views and the
//! related-field autocomplete. Every route requires [`AdminToken`].

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_extractor_with_state,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::admin::filters::{page_offset, ChangeListRequest};
use crate::admin::options::{ListFilter, ModelAdmin, ModelOptions, RelatedTarget};
use crate::admin::rows::{CommentListing, PostListing, ReactionListing};
use crate::admin::site::{AdminIndex, AdminSite, ChangeList};
use crate::app::admin::{AdminService, AUTOCOMPLETE_PAGE_SIZE};
use crate::domain::user::User;
use crate::http::auth::AdminToken;
use crate::http::handlers::{CommentViewSet, PostViewSet, ReactionViewSet, UserViewSet};
use crate::http::viewsets::ViewSet;
use crate::http::AppError;
use crate::AppState;

/// A viewset with an admin list view on top of it. Change and delete go
/// through the viewset so the API's validation applies to admin edits too.
#[axum::async_trait]
pub(crate) trait AdminModel: ViewSet {
    type Row: Send + Sync + 'static;

    fn model_admin(site: &AdminSite) -> &ModelAdmin<Self::Row>;

    fn row_id(row: &Self::Row) -> Uuid;

    async fn load(
        service: &AdminService,
        options: &ModelOptions,
        request: &ChangeListRequest,
    ) -> anyhow::Result<(Vec<Self::Row>, i64)>;
}

#[axum::async_trait]
impl AdminModel for UserViewSet {
    type Row = User;

    fn model_admin(site: &AdminSite) -> &ModelAdmin<User> {
        &site.users
    }

    fn row_id(row: &User) -> Uuid {
        row.id
    }

    async fn load(
        service: &AdminService,
        options: &ModelOptions,
        request: &ChangeListRequest,
    ) -> anyhow::Result<(Vec<User>, i64)> {
        service.list_users(options, request).await
    }
}

#[axum::async_trait]
impl AdminModel for PostViewSet {
    type Row = PostListing;

    fn model_admin(site: &AdminSite) -> &ModelAdmin<PostListing> {
        &site.posts
    }

    fn row_id(row: &PostListing) -> Uuid {
        row.post.id
    }

    async fn load(
        service: &AdminService,
        options: &ModelOptions,
        request: &ChangeListRequest,
    ) -> anyhow::Result<(Vec<PostListing>, i64)> {
        service.list_posts(options, request).await
    }
}

#[axum::async_trait]
impl AdminModel for CommentViewSet {
    type Row = CommentListing;

    fn model_admin(site: &AdminSite) -> &ModelAdmin<CommentListing> {
        &site.comments
    }

    fn row_id(row: &CommentListing) -> Uuid {
        row.comment.id
    }

    async fn load(
        service: &AdminService,
        options: &ModelOptions,
        request: &ChangeListRequest,
    ) -> anyhow::Result<(Vec<CommentListing>, i64)> {
        service.list_comments(options, request).await
    }
}

#[axum::async_trait]
impl AdminModel for ReactionViewSet {
    type Row = ReactionListing;

    fn model_admin(site: &AdminSite) -> &ModelAdmin<ReactionListing> {
        &site.reactions
    }

    fn row_id(row: &ReactionListing) -> Uuid {
        row.reaction.id
    }

    async fn load(
        service: &AdminService,
        options: &ModelOptions,
        request: &ChangeListRequest,
    ) -> anyhow::Result<(Vec<ReactionListing>, i64)> {
        service.list_reactions(options, request).await
    }
}

/// Admin routes with their full paths under `state.admin_prefix`.
pub(crate) fn router(state: &AppState) -> Router<AppState> {
    let prefix = state.admin_prefix.as_str();
    Router::new()
        .route(&format!("{}/", prefix), get(index))
        .route(&format!("{}/autocomplete/", prefix), get(autocomplete))
        .merge(model_routes::<UserViewSet>(prefix, &state.admin.users.options))
        .merge(model_routes::<PostViewSet>(prefix, &state.admin.posts.options))
        .merge(model_routes::<CommentViewSet>(prefix, &state.admin.comments.options))
        .merge(model_routes::<ReactionViewSet>(prefix, &state.admin.reactions.options))
        .route_layer(from_extractor_with_state::<AdminToken, AppState>(
            state.clone(),
        ))
}

fn model_routes<M: AdminModel>(prefix: &str, options: &ModelOptions) -> Router<AppState> {
    let base = format!("{}/{}/{}/", prefix, options.app_label, options.model_name);
    Router::new().route(&base, get(changelist::<M>)).route(
        &format!("{}:id/", base),
        get(change_view::<M>).patch(change::<M>).delete(delete::<M>),
    )
}

async fn index(State(state): State<AppState>) -> Json<AdminIndex> {
    Json(state.admin.index(&state.admin_prefix))
}

async fn changelist<M: AdminModel>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ChangeList>, AppError> {
    let admin = M::model_admin(&state.admin);
    let request = ChangeListRequest::parse(&admin.options, &params)
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let service = AdminService::new(state.db.clone());
    let (rows, total) = M::load(&service, &admin.options, &request)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, model = %admin.options.key(), "failed to load changelist");
            AppError::internal("failed to load changelist")
        })?;
    let filters = service
        .filter_specs(&admin.options, &request)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, model = %admin.options.key(), "failed to load filters");
            AppError::internal("failed to load changelist")
        })?;

    Ok(Json(admin.changelist(&rows, M::row_id, total, &request, filters)))
}

#[derive(Debug, Serialize)]
pub struct ChangeForm {
    pub model: String,
    pub id: Uuid,
    pub fields: Map<String, Value>,
    pub readonly_fields: Map<String, Value>,
}

/// Fields missing from the serialized record (the password) render as null.
fn change_form<R: Serialize>(
    options: &ModelOptions,
    id: Uuid,
    record: &R,
) -> Result<ChangeForm, AppError> {
    let value = serde_json::to_value(record).map_err(|err| {
        tracing::error!(error = ?err, model = %options.key(), id = %id, "failed to render record");
        AppError::internal("failed to render record")
    })?;
    let project = |names: &[&'static str]| -> Map<String, Value> {
        names
            .iter()
            .map(|name| {
                let field = value.get(*name).cloned().unwrap_or(Value::Null);
                (name.to_string(), field)
            })
            .collect()
    };

    Ok(ChangeForm {
        model: options.key(),
        id,
        fields: project(options.fields.as_slice()),
        readonly_fields: project(options.readonly_fields.as_slice()),
    })
}

fn not_found<M: AdminModel>() -> AppError {
    AppError::not_found(format!("{} not found", M::NAME))
}

async fn change_view<M: AdminModel>(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ChangeForm>, AppError> {
    let options = &M::model_admin(&state.admin).options;
    let record = M::retrieve(&state, id).await?.ok_or_else(not_found::<M>)?;
    Ok(Json(change_form(options, id, &record)?))
}

async fn change<M: AdminModel>(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<ChangeForm>, AppError> {
    let options = &M::model_admin(&state.admin).options;
    if let Some(field) = body.keys().find(|key| !options.is_editable(key)) {
        return Err(AppError::bad_request(format!("field is not editable: {}", field)));
    }

    let changed: Vec<String> = body.keys().cloned().collect();
    let patch: M::Patch = serde_json::from_value(Value::Object(body))
        .map_err(|err| AppError::bad_request(format!("invalid payload: {}", err)))?;
    let record = M::partial_update(&state, id, patch)
        .await?
        .ok_or_else(not_found::<M>)?;

    tracing::info!(model = %options.key(), id = %id, fields = ?changed, "admin change saved");
    Ok(Json(change_form(options, id, &record)?))
}

async fn delete<M: AdminModel>(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    if !M::destroy(&state, id).await? {
        return Err(not_found::<M>());
    }
    tracing::info!(
        model = %M::model_admin(&state.admin).options.key(),
        id = %id,
        "admin object deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct AutocompleteQuery {
    pub app_label: String,
    pub model_name: String,
    pub field_name: String,
    #[serde(default)]
    pub term: String,
    pub page: Option<i64>,
}

#[derive(Serialize)]
pub struct AutocompleteResult {
    pub id: Uuid,
    pub text: String,
}

#[derive(Serialize)]
pub struct AutocompletePagination {
    pub more: bool,
}

#[derive(Serialize)]
pub struct AutocompleteResponse {
    pub results: Vec<AutocompleteResult>,
    pub pagination: AutocompletePagination,
}

/// The model that a source model's autocomplete field points at, taken from
/// the related filter on the same parameter.
fn autocomplete_target(options: &ModelOptions, field_name: &str) -> Option<RelatedTarget> {
    if !options.autocomplete_fields.iter().any(|field| *field == field_name) {
        return None;
    }
    options.list_filter.iter().find_map(|filter| match filter {
        ListFilter::Related {
            parameter, target, ..
        } if *parameter == field_name => Some(*target),
        _ => None,
    })
}

async fn autocomplete(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> Result<Json<AutocompleteResponse>, AppError> {
    let site = &state.admin;
    let source = [
        &site.users.options,
        &site.posts.options,
        &site.comments.options,
        &site.reactions.options,
    ]
    .into_iter()
    .find(|options| {
        options.app_label == query.app_label && options.model_name == query.model_name
    })
    .ok_or_else(|| AppError::forbidden("unknown autocomplete source"))?;

    match autocomplete_target(source, &query.field_name) {
        Some(RelatedTarget::User) => {}
        _ => return Err(AppError::forbidden("field does not support autocomplete")),
    }

    let page = query.page.unwrap_or(1);
    if page_offset(page, AUTOCOMPLETE_PAGE_SIZE).is_none() {
        return Err(AppError::bad_request(format!("invalid page: {}", page)));
    }

    let (users, more) = AdminService::new(state.db.clone())
        .autocomplete_users(&site.users.options, query.term.trim(), page)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to autocomplete users");
            AppError::internal("failed to autocomplete")
        })?;

    Ok(Json(AutocompleteResponse {
        results: users
            .into_iter()
            .map(|user| AutocompleteResult {
                id: user.id,
                text: user.username,
            })
            .collect(),
        pagination: AutocompletePagination { more },
    }))
}
