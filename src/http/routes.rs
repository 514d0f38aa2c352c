use axum::{routing::get, Router};

use crate::http::handlers::{
    self, ChatViewSet, CommentViewSet, MessageViewSet, PostViewSet, ReactionViewSet, UserViewSet,
};
use crate::http::viewsets::mount;
use crate::AppState;

/// One resource registered on the API router.
#[derive(Clone, Copy)]
pub struct ResourceRoute {
    /// URL segment, e.g. `posts` in `/posts/`.
    pub prefix: &'static str,
    /// Base of the route names, `{basename}-list` and `{basename}-detail`.
    pub basename: &'static str,
    mount: fn(&str) -> Router<AppState>,
}

/// A named operation exposed by a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub method: &'static str,
    pub path: String,
}

const LIST_METHODS: [&str; 2] = ["GET", "POST"];
const DETAIL_METHODS: [&str; 4] = ["GET", "PUT", "PATCH", "DELETE"];

impl ResourceRoute {
    pub fn list_path(&self) -> String {
        format!("/{}/", self.prefix)
    }

    pub fn detail_path(&self) -> String {
        format!("/{}/:id/", self.prefix)
    }

    pub fn list_name(&self) -> String {
        format!("{}-list", self.basename)
    }

    pub fn detail_name(&self) -> String {
        format!("{}-detail", self.basename)
    }

    pub fn operations(&self) -> Vec<Operation> {
        let list = LIST_METHODS.iter().map(|method| Operation {
            name: self.list_name(),
            method: *method,
            path: self.list_path(),
        });
        let detail = DETAIL_METHODS.iter().map(|method| Operation {
            name: self.detail_name(),
            method: *method,
            path: self.detail_path(),
        });
        list.chain(detail).collect()
    }

    pub fn router(&self) -> Router<AppState> {
        (self.mount)(self.prefix)
    }
}

pub fn api_routes() -> Vec<ResourceRoute> {
    vec![
        ResourceRoute {
            prefix: "users",
            basename: "users",
            mount: mount::<UserViewSet>,
        },
        ResourceRoute {
            prefix: "posts",
            basename: "posts",
            mount: mount::<PostViewSet>,
        },
        ResourceRoute {
            prefix: "comments",
            basename: "comments",
            mount: mount::<CommentViewSet>,
        },
        ResourceRoute {
            prefix: "reaction",
            basename: "reaction",
            mount: mount::<ReactionViewSet>,
        },
        ResourceRoute {
            prefix: "chats",
            basename: "chats",
            mount: mount::<ChatViewSet>,
        },
        ResourceRoute {
            prefix: "messages",
            basename: "messages",
            mount: mount::<MessageViewSet>,
        },
    ]
}

pub fn api() -> Router<AppState> {
    api_routes()
        .iter()
        .fold(Router::new(), |router, route| router.merge(route.router()))
}

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}
