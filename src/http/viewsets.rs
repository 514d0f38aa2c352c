//! Generic CRUD handlers shared by every API resource.
//!
//! A resource implements [`ViewSet`]; [`mount`] then wires the conventional
//! six operations onto `/{prefix}/` and `/{prefix}/:id/`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::AppError;
use crate::AppState;

pub const DEFAULT_PAGE_SIZE: i64 = 30;
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub count: i64,
    pub next_offset: Option<i64>,
}

#[axum::async_trait]
pub trait ViewSet: Send + Sync + 'static {
    type Record: Serialize + Send + 'static;
    /// Body of `create` and of the full `update`.
    type Create: DeserializeOwned + Send + 'static;
    /// Body of `partial_update`; every field optional.
    type Patch: DeserializeOwned + Send + 'static;

    /// Singular name used in error messages, e.g. `"post"`.
    const NAME: &'static str;

    async fn list(
        state: &AppState,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Self::Record>, i64), AppError>;

    async fn create(state: &AppState, payload: Self::Create) -> Result<Self::Record, AppError>;

    async fn retrieve(state: &AppState, id: Uuid) -> Result<Option<Self::Record>, AppError>;

    async fn update(
        state: &AppState,
        id: Uuid,
        payload: Self::Create,
    ) -> Result<Option<Self::Record>, AppError>;

    async fn partial_update(
        state: &AppState,
        id: Uuid,
        payload: Self::Patch,
    ) -> Result<Option<Self::Record>, AppError>;

    async fn destroy(state: &AppState, id: Uuid) -> Result<bool, AppError>;
}

pub fn mount<V: ViewSet>(prefix: &str) -> Router<AppState> {
    Router::new()
        .route(&format!("/{}/", prefix), get(list::<V>).post(create::<V>))
        .route(
            &format!("/{}/:id/", prefix),
            get(retrieve::<V>)
                .put(update::<V>)
                .patch(partial_update::<V>)
                .delete(destroy::<V>),
        )
}

fn not_found<V: ViewSet>() -> AppError {
    AppError::not_found(format!("{} not found", V::NAME))
}

pub async fn list<V: ViewSet>(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<V::Record>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::bad_request("limit must be between 1 and 200"));
    }
    let offset = query.offset.unwrap_or(0);
    if offset < 0 {
        return Err(AppError::bad_request("offset must not be negative"));
    }

    let (items, count) = V::list(&state, limit, offset).await?;
    let next_offset = offset.checked_add(limit).filter(|next| *next < count);

    Ok(Json(ListResponse {
        items,
        count,
        next_offset,
    }))
}

pub async fn create<V: ViewSet>(
    State(state): State<AppState>,
    Json(payload): Json<V::Create>,
) -> Result<(StatusCode, Json<V::Record>), AppError> {
    let record = V::create(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn retrieve<V: ViewSet>(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<V::Record>, AppError> {
    match V::retrieve(&state, id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(not_found::<V>()),
    }
}

pub async fn update<V: ViewSet>(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<V::Create>,
) -> Result<Json<V::Record>, AppError> {
    match V::update(&state, id, payload).await? {
        Some(record) => Ok(Json(record)),
        None => Err(not_found::<V>()),
    }
}

pub async fn partial_update<V: ViewSet>(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<V::Patch>,
) -> Result<Json<V::Record>, AppError> {
    match V::partial_update(&state, id, payload).await? {
        Some(record) => Ok(Json(record)),
        None => Err(not_found::<V>()),
    }
}

pub async fn destroy<V: ViewSet>(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    if V::destroy(&state, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found::<V>())
    }
}
