//! Computed values shown in the admin list views.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::admin::rows::PostListing;
use crate::domain::post::Post;

pub const BODY_DISPLAY_MAX_CHARS: usize = 64;
const BODY_DISPLAY_KEPT_CHARS: usize = 61;
const ELLIPSIS: &str = "...";

/// The post body, cut to 61 characters plus `...` once it exceeds 64.
pub fn get_body(post: &Post) -> String {
    truncate_body(&post.body)
}

pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= BODY_DISPLAY_MAX_CHARS {
        return body.to_string();
    }
    let mut display: String = body.chars().take(BODY_DISPLAY_KEPT_CHARS).collect();
    display.push_str(ELLIPSIS);
    display
}

/// Counted from the prefetched comments; no query per row.
pub fn get_comment_count(listing: &PostListing) -> usize {
    listing.comments.len()
}

pub fn timestamp(value: OffsetDateTime) -> Value {
    value
        .format(&Rfc3339)
        .map(Value::String)
        .unwrap_or(Value::Null)
}
