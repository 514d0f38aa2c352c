use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::chats::{ChatService, MessageChanges, NewMessage};
use crate::app::comments::{CommentChanges, CommentService, NewComment};
use crate::app::posts::{NewPost, PostChanges, PostService};
use crate::app::reactions::{NewReaction, ReactionChanges, ReactionService};
use crate::app::users::{NewUser, UserChanges, UserService};
use crate::domain::chat::{Chat, Message};
use crate::domain::engagement::{Comment, Reaction, ReactionValue};
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::http::viewsets::ViewSet;
use crate::http::AppError;
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_USERNAME_LEN: usize = 150;
const MAX_TITLE_LEN: usize = 255;
const MAX_BODY_LEN: usize = 1000;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

fn read_failure(err: anyhow::Error, message: &'static str) -> AppError {
    tracing::error!(error = ?err, "{}", message);
    AppError::internal(message)
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{} cannot be empty", field)));
    }
    Ok(())
}

fn require_max_chars(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::bad_request(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

// ============================================================================
// Users
// ============================================================================

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

fn validate_username(username: &str) -> Result<(), AppError> {
    require_text("username", username)?;
    require_max_chars("username", username, MAX_USERNAME_LEN)
}

fn validate_email(email: &str) -> Result<(), AppError> {
    require_text("email", email)?;
    if !email.contains('@') {
        return Err(AppError::bad_request("email must be a valid email address"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.trim().len() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at least 8 characters"));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }
    Ok(())
}

impl UserPayload {
    fn validate(&self) -> Result<(), AppError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

impl UserPatch {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        Ok(())
    }
}

impl From<UserPayload> for UserChanges {
    fn from(payload: UserPayload) -> Self {
        Self {
            first_name: Some(payload.first_name),
            last_name: Some(payload.last_name),
            username: Some(payload.username),
            email: Some(payload.email),
            password: Some(payload.password),
            is_staff: Some(payload.is_staff),
            is_superuser: Some(payload.is_superuser),
            is_active: Some(payload.is_active),
        }
    }
}

impl From<UserPatch> for UserChanges {
    fn from(patch: UserPatch) -> Self {
        Self {
            first_name: patch.first_name,
            last_name: patch.last_name,
            username: patch.username,
            email: patch.email,
            password: patch.password,
            is_staff: patch.is_staff,
            is_superuser: patch.is_superuser,
            is_active: patch.is_active,
        }
    }
}

pub struct UserViewSet;

#[axum::async_trait]
impl ViewSet for UserViewSet {
    type Record = User;
    type Create = UserPayload;
    type Patch = UserPatch;

    const NAME: &'static str = "user";

    async fn list(state: &AppState, limit: i64, offset: i64) -> Result<(Vec<User>, i64), AppError> {
        UserService::new(state.db.clone())
            .list(limit, offset)
            .await
            .map_err(|err| read_failure(err, "failed to list users"))
    }

    async fn create(state: &AppState, payload: UserPayload) -> Result<User, AppError> {
        payload.validate()?;
        let new_user = NewUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            username: payload.username,
            email: payload.email,
            password: payload.password,
            is_staff: payload.is_staff,
            is_superuser: payload.is_superuser,
            is_active: payload.is_active,
        };
        UserService::new(state.db.clone())
            .create_user(new_user)
            .await
            .map_err(|err| AppError::from_write(err, "failed to create user"))
    }

    async fn retrieve(state: &AppState, id: Uuid) -> Result<Option<User>, AppError> {
        UserService::new(state.db.clone())
            .get_user(id)
            .await
            .map_err(|err| read_failure(err, "failed to fetch user"))
    }

    async fn update(
        state: &AppState,
        id: Uuid,
        payload: UserPayload,
    ) -> Result<Option<User>, AppError> {
        payload.validate()?;
        UserService::new(state.db.clone())
            .update_user(id, payload.into())
            .await
            .map_err(|err| AppError::from_write(err, "failed to update user"))
    }

    async fn partial_update(
        state: &AppState,
        id: Uuid,
        payload: UserPatch,
    ) -> Result<Option<User>, AppError> {
        payload.validate()?;
        UserService::new(state.db.clone())
            .update_user(id, payload.into())
            .await
            .map_err(|err| AppError::from_write(err, "failed to update user"))
    }

    async fn destroy(state: &AppState, id: Uuid) -> Result<bool, AppError> {
        let deleted = UserService::new(state.db.clone())
            .delete_user(id)
            .await
            .map_err(|err| read_failure(err, "failed to delete user"))?;
        if deleted {
            tracing::info!(user_id = %id, "user deleted");
        }
        Ok(deleted)
    }
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Deserialize)]
pub struct PostPayload {
    pub author: Uuid,
    pub title: String,
    pub body: String,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PostPatch {
    pub author: Option<Uuid>,
    pub title: Option<String>,
    pub body: Option<String>,
}

fn validate_title(title: &str) -> Result<(), AppError> {
    require_text("title", title)?;
    require_max_chars("title", title, MAX_TITLE_LEN)
}

impl PostPatch {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(body) = &self.body {
            require_text("body", body)?;
        }
        Ok(())
    }
}

pub struct PostViewSet;

#[axum::async_trait]
impl ViewSet for PostViewSet {
    type Record = Post;
    type Create = PostPayload;
    type Patch = PostPatch;

    const NAME: &'static str = "post";

    async fn list(state: &AppState, limit: i64, offset: i64) -> Result<(Vec<Post>, i64), AppError> {
        PostService::new(state.db.clone())
            .list(limit, offset)
            .await
            .map_err(|err| read_failure(err, "failed to list posts"))
    }

    async fn create(state: &AppState, payload: PostPayload) -> Result<Post, AppError> {
        validate_title(&payload.title)?;
        require_text("body", &payload.body)?;
        let new_post = NewPost {
            author_id: payload.author,
            title: payload.title,
            body: payload.body,
        };
        PostService::new(state.db.clone())
            .create_post(new_post)
            .await
            .map_err(|err| AppError::from_write(err, "failed to create post"))
    }

    async fn retrieve(state: &AppState, id: Uuid) -> Result<Option<Post>, AppError> {
        PostService::new(state.db.clone())
            .get_post(id)
            .await
            .map_err(|err| read_failure(err, "failed to fetch post"))
    }

    async fn update(
        state: &AppState,
        id: Uuid,
        payload: PostPayload,
    ) -> Result<Option<Post>, AppError> {
        let patch = PostPatch {
            author: Some(payload.author),
            title: Some(payload.title),
            body: Some(payload.body),
        };
        Self::partial_update(state, id, patch).await
    }

    async fn partial_update(
        state: &AppState,
        id: Uuid,
        payload: PostPatch,
    ) -> Result<Option<Post>, AppError> {
        payload.validate()?;
        let changes = PostChanges {
            author_id: payload.author,
            title: payload.title,
            body: payload.body,
        };
        PostService::new(state.db.clone())
            .update_post(id, changes)
            .await
            .map_err(|err| AppError::from_write(err, "failed to update post"))
    }

    async fn destroy(state: &AppState, id: Uuid) -> Result<bool, AppError> {
        PostService::new(state.db.clone())
            .delete_post(id)
            .await
            .map_err(|err| read_failure(err, "failed to delete post"))
    }
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Deserialize)]
pub struct CommentPayload {
    pub author: Uuid,
    pub post: Uuid,
    pub body: String,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CommentPatch {
    pub author: Option<Uuid>,
    pub post: Option<Uuid>,
    pub body: Option<String>,
}

fn validate_body(body: &str) -> Result<(), AppError> {
    require_text("body", body)?;
    require_max_chars("body", body, MAX_BODY_LEN)
}

pub struct CommentViewSet;

#[axum::async_trait]
impl ViewSet for CommentViewSet {
    type Record = Comment;
    type Create = CommentPayload;
    type Patch = CommentPatch;

    const NAME: &'static str = "comment";

    async fn list(
        state: &AppState,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Comment>, i64), AppError> {
        CommentService::new(state.db.clone())
            .list(limit, offset)
            .await
            .map_err(|err| read_failure(err, "failed to list comments"))
    }

    async fn create(state: &AppState, payload: CommentPayload) -> Result<Comment, AppError> {
        validate_body(&payload.body)?;
        let new_comment = NewComment {
            author_id: payload.author,
            post_id: payload.post,
            body: payload.body,
        };
        CommentService::new(state.db.clone())
            .create_comment(new_comment)
            .await
            .map_err(|err| AppError::from_write(err, "failed to create comment"))
    }

    async fn retrieve(state: &AppState, id: Uuid) -> Result<Option<Comment>, AppError> {
        CommentService::new(state.db.clone())
            .get_comment(id)
            .await
            .map_err(|err| read_failure(err, "failed to fetch comment"))
    }

    async fn update(
        state: &AppState,
        id: Uuid,
        payload: CommentPayload,
    ) -> Result<Option<Comment>, AppError> {
        let patch = CommentPatch {
            author: Some(payload.author),
            post: Some(payload.post),
            body: Some(payload.body),
        };
        Self::partial_update(state, id, patch).await
    }

    async fn partial_update(
        state: &AppState,
        id: Uuid,
        payload: CommentPatch,
    ) -> Result<Option<Comment>, AppError> {
        if let Some(body) = &payload.body {
            validate_body(body)?;
        }
        let changes = CommentChanges {
            author_id: payload.author,
            post_id: payload.post,
            body: payload.body,
        };
        CommentService::new(state.db.clone())
            .update_comment(id, changes)
            .await
            .map_err(|err| AppError::from_write(err, "failed to update comment"))
    }

    async fn destroy(state: &AppState, id: Uuid) -> Result<bool, AppError> {
        CommentService::new(state.db.clone())
            .delete_comment(id)
            .await
            .map_err(|err| read_failure(err, "failed to delete comment"))
    }
}

// ============================================================================
// Reactions
// ============================================================================

#[derive(Deserialize)]
pub struct ReactionPayload {
    pub author: Uuid,
    pub post: Uuid,
    pub value: ReactionValue,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ReactionPatch {
    pub author: Option<Uuid>,
    pub post: Option<Uuid>,
    pub value: Option<ReactionValue>,
}

pub struct ReactionViewSet;

#[axum::async_trait]
impl ViewSet for ReactionViewSet {
    type Record = Reaction;
    type Create = ReactionPayload;
    type Patch = ReactionPatch;

    const NAME: &'static str = "reaction";

    async fn list(
        state: &AppState,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Reaction>, i64), AppError> {
        ReactionService::new(state.db.clone())
            .list(limit, offset)
            .await
            .map_err(|err| read_failure(err, "failed to list reactions"))
    }

    async fn create(state: &AppState, payload: ReactionPayload) -> Result<Reaction, AppError> {
        let new_reaction = NewReaction {
            author_id: payload.author,
            post_id: payload.post,
            value: payload.value,
        };
        ReactionService::new(state.db.clone())
            .create_reaction(new_reaction)
            .await
            .map_err(|err| AppError::from_write(err, "failed to create reaction"))
    }

    async fn retrieve(state: &AppState, id: Uuid) -> Result<Option<Reaction>, AppError> {
        ReactionService::new(state.db.clone())
            .get_reaction(id)
            .await
            .map_err(|err| read_failure(err, "failed to fetch reaction"))
    }

    async fn update(
        state: &AppState,
        id: Uuid,
        payload: ReactionPayload,
    ) -> Result<Option<Reaction>, AppError> {
        let patch = ReactionPatch {
            author: Some(payload.author),
            post: Some(payload.post),
            value: Some(payload.value),
        };
        Self::partial_update(state, id, patch).await
    }

    async fn partial_update(
        state: &AppState,
        id: Uuid,
        payload: ReactionPatch,
    ) -> Result<Option<Reaction>, AppError> {
        let changes = ReactionChanges {
            author_id: payload.author,
            post_id: payload.post,
            value: payload.value,
        };
        ReactionService::new(state.db.clone())
            .update_reaction(id, changes)
            .await
            .map_err(|err| AppError::from_write(err, "failed to update reaction"))
    }

    async fn destroy(state: &AppState, id: Uuid) -> Result<bool, AppError> {
        ReactionService::new(state.db.clone())
            .delete_reaction(id)
            .await
            .map_err(|err| read_failure(err, "failed to delete reaction"))
    }
}

// ============================================================================
// Chats & Messages
// ============================================================================

#[derive(Deserialize)]
pub struct ChatPayload {
    pub title: String,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ChatPatch {
    pub title: Option<String>,
}

pub struct ChatViewSet;

#[axum::async_trait]
impl ViewSet for ChatViewSet {
    type Record = Chat;
    type Create = ChatPayload;
    type Patch = ChatPatch;

    const NAME: &'static str = "chat";

    async fn list(state: &AppState, limit: i64, offset: i64) -> Result<(Vec<Chat>, i64), AppError> {
        ChatService::new(state.db.clone())
            .list_chats(limit, offset)
            .await
            .map_err(|err| read_failure(err, "failed to list chats"))
    }

    async fn create(state: &AppState, payload: ChatPayload) -> Result<Chat, AppError> {
        validate_title(&payload.title)?;
        ChatService::new(state.db.clone())
            .create_chat(payload.title)
            .await
            .map_err(|err| AppError::from_write(err, "failed to create chat"))
    }

    async fn retrieve(state: &AppState, id: Uuid) -> Result<Option<Chat>, AppError> {
        ChatService::new(state.db.clone())
            .get_chat(id)
            .await
            .map_err(|err| read_failure(err, "failed to fetch chat"))
    }

    async fn update(
        state: &AppState,
        id: Uuid,
        payload: ChatPayload,
    ) -> Result<Option<Chat>, AppError> {
        let patch = ChatPatch {
            title: Some(payload.title),
        };
        Self::partial_update(state, id, patch).await
    }

    async fn partial_update(
        state: &AppState,
        id: Uuid,
        payload: ChatPatch,
    ) -> Result<Option<Chat>, AppError> {
        if let Some(title) = &payload.title {
            validate_title(title)?;
        }
        ChatService::new(state.db.clone())
            .rename_chat(id, payload.title)
            .await
            .map_err(|err| AppError::from_write(err, "failed to update chat"))
    }

    async fn destroy(state: &AppState, id: Uuid) -> Result<bool, AppError> {
        ChatService::new(state.db.clone())
            .delete_chat(id)
            .await
            .map_err(|err| read_failure(err, "failed to delete chat"))
    }
}

#[derive(Deserialize)]
pub struct MessagePayload {
    pub chat: Uuid,
    pub author: Uuid,
    pub body: String,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MessagePatch {
    pub chat: Option<Uuid>,
    pub author: Option<Uuid>,
    pub body: Option<String>,
}

pub struct MessageViewSet;

#[axum::async_trait]
impl ViewSet for MessageViewSet {
    type Record = Message;
    type Create = MessagePayload;
    type Patch = MessagePatch;

    const NAME: &'static str = "message";

    async fn list(
        state: &AppState,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Message>, i64), AppError> {
        ChatService::new(state.db.clone())
            .list_messages(limit, offset)
            .await
            .map_err(|err| read_failure(err, "failed to list messages"))
    }

    async fn create(state: &AppState, payload: MessagePayload) -> Result<Message, AppError> {
        validate_body(&payload.body)?;
        let new_message = NewMessage {
            chat_id: payload.chat,
            author_id: payload.author,
            body: payload.body,
        };
        ChatService::new(state.db.clone())
            .create_message(new_message)
            .await
            .map_err(|err| AppError::from_write(err, "failed to create message"))
    }

    async fn retrieve(state: &AppState, id: Uuid) -> Result<Option<Message>, AppError> {
        ChatService::new(state.db.clone())
            .get_message(id)
            .await
            .map_err(|err| read_failure(err, "failed to fetch message"))
    }

    async fn update(
        state: &AppState,
        id: Uuid,
        payload: MessagePayload,
    ) -> Result<Option<Message>, AppError> {
        let patch = MessagePatch {
            chat: Some(payload.chat),
            author: Some(payload.author),
            body: Some(payload.body),
        };
        Self::partial_update(state, id, patch).await
    }

    async fn partial_update(
        state: &AppState,
        id: Uuid,
        payload: MessagePatch,
    ) -> Result<Option<Message>, AppError> {
        if let Some(body) = &payload.body {
            validate_body(body)?;
        }
        let changes = MessageChanges {
            chat_id: payload.chat,
            author_id: payload.author,
            body: payload.body,
        };
        ChatService::new(state.db.clone())
            .update_message(id, changes)
            .await
            .map_err(|err| AppError::from_write(err, "failed to update message"))
    }

    async fn destroy(state: &AppState, id: Uuid) -> Result<bool, AppError> {
        ChatService::new(state.db.clone())
            .delete_message(id)
            .await
            .map_err(|err| read_failure(err, "failed to delete message"))
    }
}
