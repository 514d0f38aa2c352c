use serde::Serialize;

use crate::domain::engagement::{Comment, Reaction};
use crate::domain::post::Post;

/// A post as loaded for the list view. The author's username comes from the
/// same row, the comments from one batched query for the whole page.
#[derive(Debug, Clone, Serialize)]
pub struct PostListing {
    pub post: Post,
    pub author_username: String,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentListing {
    pub comment: Comment,
    pub author_username: String,
    pub post_title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactionListing {
    pub reaction: Reaction,
    pub author_username: String,
    pub post_title: String,
}
