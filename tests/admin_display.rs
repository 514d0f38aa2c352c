//! Admin Display Tests
//!
//! Computed list-view values, checked without a database.

use agora::admin::display::{get_body, get_comment_count, truncate_body, BODY_DISPLAY_MAX_CHARS};
use agora::admin::post_admin;
use agora::admin::rows::PostListing;
use agora::domain::engagement::Comment;
use agora::domain::post::Post;
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

fn post_with_body(body: &str) -> Post {
    Post {
        id: Uuid::new_v4(),
        author_id: Uuid::new_v4(),
        title: "title".into(),
        body: body.into(),
        created_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn comment_on(post: &Post) -> Comment {
    Comment {
        id: Uuid::new_v4(),
        author_id: post.author_id,
        post_id: post.id,
        body: "comment".into(),
        created_at: OffsetDateTime::UNIX_EPOCH,
    }
}

#[test]
fn short_body_is_unchanged() {
    assert_eq!(get_body(&post_with_body("short")), "short");
}

#[test]
fn long_body_is_cut_with_ellipsis() {
    let shown = get_body(&post_with_body(&"a".repeat(70)));

    assert_eq!(shown, format!("{}...", "a".repeat(61)));
    assert_eq!(shown.chars().count(), BODY_DISPLAY_MAX_CHARS);
}

#[test]
fn body_at_the_limit_is_unchanged() {
    let body = "b".repeat(64);
    assert_eq!(truncate_body(&body), body);

    let over = "b".repeat(65);
    assert_eq!(truncate_body(&over), format!("{}...", "b".repeat(61)));
}

#[test]
fn truncation_counts_characters_not_bytes() {
    let body = "é".repeat(64);
    assert_eq!(truncate_body(&body), body);

    let shown = truncate_body(&"日".repeat(80));
    assert_eq!(shown.chars().count(), 64);
    assert!(shown.starts_with(&"日".repeat(61)));
    assert!(shown.ends_with("..."));
}

#[test]
fn empty_body_is_unchanged() {
    assert_eq!(truncate_body(""), "");
}

#[test]
fn comment_count_uses_prefetched_comments() {
    let post = post_with_body("body");
    let listing = PostListing {
        comments: vec![comment_on(&post), comment_on(&post)],
        author_username: "author".into(),
        post,
    };

    assert_eq!(get_comment_count(&listing), 2);
}

#[test]
fn post_columns_render_computed_values() {
    let admin = post_admin();
    let post = post_with_body(&"z".repeat(100));
    let listing = PostListing {
        comments: vec![comment_on(&post)],
        author_username: "writer".into(),
        post,
    };

    let cells: Vec<_> = admin
        .list_display
        .iter()
        .map(|column| (column.name, column.value(&listing)))
        .collect();

    assert_eq!(cells[1], ("author", json!("writer")));
    assert_eq!(cells[3], ("get_body", json!(format!("{}...", "z".repeat(61)))));
    assert_eq!(cells[4], ("created_at", json!("1970-01-01T00:00:00Z")));
    assert_eq!(cells[5], ("get_comment_count", json!(1)));
}
