//! Admin Tests
//!
//! Covers the admin index, list views (search, filters, pagination), change
//! views, the author autocomplete and token checks.

mod common;

use std::collections::HashMap;

use agora::admin::filters::ChangeListRequest;
use agora::admin::post_admin;
use agora::app::admin::AdminService;
use agora::app::passwords::verify_password;
use axum::http::{Method, StatusCode};
use common::{app, unique, DEFAULT_PASSWORD};
use serde_json::{json, Value};
use time::OffsetDateTime;
use uuid::Uuid;

fn row_ids(changelist: &Value) -> Vec<String> {
    changelist["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap().to_string())
        .collect()
}

fn today() -> String {
    OffsetDateTime::now_utc().date().to_string()
}

// ===========================================================================
// Access
// ===========================================================================

#[tokio::test]
async fn admin_requires_token() {
    let app = app().await;

    let resp = app.get("/admin/").await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error_message(), "missing admin token");

    let resp = app
        .request(
            Method::GET,
            "/admin/general/user/",
            None,
            &[("x-admin-token", "wrong-token")],
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error_message(), "invalid admin token");
}

#[tokio::test]
async fn index_lists_models_without_groups() {
    let app = app().await;
    let resp = app.get_admin("/admin/").await;

    assert_eq!(resp.status, StatusCode::OK);
    let keys: Vec<String> = resp.json()["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|model| model["key"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        keys,
        vec!["general.user", "general.post", "general.comment", "general.reaction"]
    );
    assert_eq!(resp.json()["models"][1]["url"], "/admin/general/post/");
}

// ===========================================================================
// User list
// ===========================================================================

#[tokio::test]
async fn user_changelist_search() {
    let app = app().await;
    let user = app.create_user("admin_search").await;
    app.create_user("admin_search_other").await;

    let resp = app
        .get_admin(&format!("/admin/general/user/?q={}", user.username))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["model"], "general.user");
    assert_eq!(body["total"], 1);
    assert_eq!(row_ids(&body), vec![user.id.to_string()]);

    let labels: Vec<&str> = body["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|column| column["label"].as_str().unwrap())
        .collect();
    assert_eq!(
        labels,
        vec![
            "ID",
            "first name",
            "last name",
            "username",
            "email address",
            "staff status",
            "superuser status",
            "active",
            "date joined",
        ]
    );
    assert_eq!(body["columns"][0]["link"], true);
    assert_eq!(body["search_fields"], json!(["id", "username", "email"]));
}

#[tokio::test]
async fn user_changelist_search_requires_every_term() {
    let app = app().await;
    let user = app.create_user("admin_terms").await;

    let resp = app
        .get_admin(&format!(
            "/admin/general/user/?q={}+example.com",
            user.username
        ))
        .await;
    assert_eq!(resp.json()["total"], 1);

    let resp = app
        .get_admin(&format!(
            "/admin/general/user/?q={}+nomatchanywhere",
            user.username
        ))
        .await;
    assert_eq!(resp.json()["total"], 0);
}

#[tokio::test]
async fn user_changelist_search_escapes_wildcards() {
    let app = app().await;
    let resp = app.get_admin("/admin/general/user/?q=%25%25%25").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["total"], 0);
}

#[tokio::test]
async fn user_changelist_boolean_filter() {
    let app = app().await;
    let prefix = unique("admin_staff");
    let staff = app
        .create_user_with(&prefix, json!({ "is_staff": true }))
        .await;
    let regular = app.create_user(&prefix).await;

    let resp = app
        .get_admin(&format!("/admin/general/user/?q={}&is_staff__exact=1", prefix))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(row_ids(&resp.json()), vec![staff.id.to_string()]);

    let resp = app
        .get_admin(&format!("/admin/general/user/?q={}&is_staff__exact=0", prefix))
        .await;
    assert_eq!(row_ids(&resp.json()), vec![regular.id.to_string()]);

    let filters = resp.json()["filters"].clone();
    assert_eq!(filters[0]["title"], "is_staff");
    assert_eq!(filters[0]["kind"], "boolean");
    assert_eq!(filters[0]["selected"]["is_staff__exact"], "0");
}

#[tokio::test]
async fn user_changelist_invalid_filter_value() {
    let app = app().await;
    let resp = app
        .get_admin("/admin/general/user/?is_active__exact=maybe")
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.error_message(),
        "invalid value for is_active__exact: maybe"
    );
}

#[tokio::test]
async fn user_changelist_date_range_filter() {
    let app = app().await;
    let user = app.create_user("admin_joined").await;
    let today = today();

    let resp = app
        .get_admin(&format!(
            "/admin/general/user/?q={}&date_joined__range__gte={}&date_joined__range__lte={}",
            user.username, today, today
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["total"], 1);

    let resp = app
        .get_admin(&format!(
            "/admin/general/user/?q={}&date_joined__range__lte=2000-01-01",
            user.username
        ))
        .await;
    assert_eq!(resp.json()["total"], 0);

    let resp = app
        .get_admin("/admin/general/user/?date_joined__range__gte=yesterday")
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_changelist_pagination() {
    let app = app().await;
    let user = app.create_user("admin_pages").await;

    let resp = app
        .get_admin(&format!("/admin/general/user/?q={}&p=2", user.username))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["page"], 2);
    assert_eq!(resp.json()["num_pages"], 1);
    assert!(row_ids(&resp.json()).is_empty());

    let resp = app.get_admin("/admin/general/user/?p=0").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ===========================================================================
// Post list
// ===========================================================================

#[tokio::test]
async fn post_changelist_truncates_body_and_counts_comments() {
    let app = app().await;
    let author = app.create_user("admin_poster").await;
    let long_post = app.create_post(author.id, "long", &"a".repeat(70)).await;
    let short_post = app.create_post(author.id, "short", "short").await;
    for body in ["one", "two", "three"] {
        app.create_comment(author.id, long_post, body).await;
    }

    let resp = app
        .get_admin(&format!("/admin/general/post/?author={}", author.id))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["total"], 2);

    let rows = body["rows"].as_array().unwrap();
    let row = |id: Uuid| {
        rows.iter()
            .find(|row| row["id"] == id.to_string().as_str())
            .unwrap()
            .clone()
    };

    let long_row = row(long_post);
    assert_eq!(long_row["cells"][1], author.username.as_str());
    assert_eq!(long_row["cells"][3], format!("{}...", "a".repeat(61)).as_str());
    assert_eq!(long_row["cells"][5], 3);

    let short_row = row(short_post);
    assert_eq!(short_row["cells"][3], "short");
    assert_eq!(short_row["cells"][5], 0);

    assert_eq!(body["filters"][0]["selected"]["author"], author.id.to_string().as_str());
}

#[tokio::test]
async fn post_changelist_searches_author_username() {
    let app = app().await;
    let author = app.create_user("admin_by_author").await;
    let post = app.create_post(author.id, "untitled", "body").await;

    let resp = app
        .get_admin(&format!("/admin/general/post/?q={}", author.username))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(row_ids(&resp.json()), vec![post.to_string()]);
}

#[tokio::test]
async fn post_changelist_related_filter_choices() {
    let app = app().await;
    let author = app.create_user("admin_choices").await;
    app.create_post(author.id, "choice", "body").await;

    let resp = app
        .get_admin(&format!("/admin/general/post/?author={}", author.id))
        .await;
    let choices = resp.json()["filters"][0]["choices"].clone();
    assert!(choices
        .as_array()
        .unwrap()
        .iter()
        .any(|choice| choice["value"] == author.id.to_string().as_str()
            && choice["display"] == author.username.as_str()));

    let resp = app.get_admin("/admin/general/post/?author=not-a-uuid").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ===========================================================================
// Comment and reaction lists
// ===========================================================================

#[tokio::test]
async fn comment_changelist_filters_by_post() {
    let app = app().await;
    let author = app.create_user("admin_commenter").await;
    let post = app.create_post(author.id, "discussed", "body").await;
    let other = app.create_post(author.id, "ignored", "body").await;
    let comment = app.create_comment(author.id, post, "on topic").await;
    app.create_comment(author.id, other, "off topic").await;

    let resp = app
        .get_admin(&format!("/admin/general/comment/?post={}", post))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(row_ids(&body), vec![comment.to_string()]);
    assert_eq!(body["rows"][0]["cells"][1], author.username.as_str());
    assert_eq!(body["rows"][0]["cells"][2], "discussed");
    assert_eq!(body["filters"][0]["title"], "post");
    assert_eq!(body["filters"][1]["title"], "author");
}

#[tokio::test]
async fn reaction_changelist_filters_by_value() {
    let app = app().await;
    let author = app.create_user("admin_reactor").await;
    let post = app.create_post(author.id, "reacted", "body").await;
    let love = app.create_reaction(author.id, post, "love").await;
    app.create_reaction(author.id, post, "angry").await;

    let resp = app
        .get_admin(&format!(
            "/admin/general/reaction/?author={}&value__exact=love",
            author.id
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(row_ids(&body), vec![love.to_string()]);
    assert_eq!(body["rows"][0]["cells"][3], "love");

    let value_filter = body["filters"][2].clone();
    assert_eq!(value_filter["kind"], "choice");
    assert_eq!(value_filter["choices"].as_array().unwrap().len(), 6);

    let resp = app
        .get_admin("/admin/general/reaction/?value__exact=meh")
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ===========================================================================
// Change views
// ===========================================================================

#[tokio::test]
async fn user_change_view_hides_password() {
    let app = app().await;
    let user = app.create_user("admin_view").await;

    let resp = app
        .get_admin(&format!("/admin/general/user/{}/", user.id))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["fields"]["username"], user.username.as_str());
    assert!(body["fields"]["password"].is_null());
    assert!(body["readonly_fields"]["date_joined"].is_string());
    assert!(body["readonly_fields"]["last_login"].is_null());
    assert!(body["fields"].get("is_superuser").is_none());
}

#[tokio::test]
async fn admin_patch_rejects_non_editable_fields() {
    let app = app().await;
    let user = app.create_user("admin_readonly").await;

    let resp = app
        .patch_admin(
            &format!("/admin/general/user/{}/", user.id),
            json!({ "is_superuser": true }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "field is not editable: is_superuser");

    let resp = app
        .patch_admin(
            &format!("/admin/general/user/{}/", user.id),
            json!({ "date_joined": "2020-01-01T00:00:00Z" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_patch_updates_editable_fields() {
    let app = app().await;
    let user = app.create_user("admin_edit").await;

    let resp = app
        .patch_admin(
            &format!("/admin/general/user/{}/", user.id),
            json!({ "first_name": "Edited", "is_staff": true, "password": "changed-by-admin" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["fields"]["first_name"], "Edited");
    assert_eq!(resp.json()["fields"]["is_staff"], true);

    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert!(verify_password("changed-by-admin", &stored).unwrap());
    assert!(!verify_password(DEFAULT_PASSWORD, &stored).unwrap());
}

#[tokio::test]
async fn admin_patch_post_title() {
    let app = app().await;
    let author = app.create_user("admin_post_edit").await;
    let post = app.create_post(author.id, "before", "body").await;

    let resp = app
        .patch_admin(
            &format!("/admin/general/post/{}/", post),
            json!({ "title": "after" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["fields"]["title"], "after");
    assert_eq!(resp.json()["fields"]["author"], author.id.to_string().as_str());
}

#[tokio::test]
async fn admin_delete_comment() {
    let app = app().await;
    let author = app.create_user("admin_deleter").await;
    let post = app.create_post(author.id, "moderated", "body").await;
    let comment = app.create_comment(author.id, post, "spam").await;

    let resp = app
        .delete_admin(&format!("/admin/general/comment/{}/", comment))
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .get_admin(&format!("/admin/general/comment/{}/", comment))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ===========================================================================
// Autocomplete
// ===========================================================================

#[tokio::test]
async fn autocomplete_post_author() {
    let app = app().await;
    let prefix = unique("admin_auto");
    let first = app.create_user(&prefix).await;
    let second = app.create_user(&prefix).await;

    let resp = app
        .get_admin(&format!(
            "/admin/autocomplete/?app_label=general&model_name=post&field_name=author&term={}",
            prefix
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let mut texts: Vec<String> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|result| result["text"].as_str().unwrap().to_string())
        .collect();
    texts.sort();
    let mut expected = vec![first.username, second.username];
    expected.sort();
    assert_eq!(texts, expected);
    assert_eq!(body["pagination"]["more"], false);
}

#[tokio::test]
async fn autocomplete_rejects_unconfigured_fields() {
    let app = app().await;

    let resp = app
        .get_admin("/admin/autocomplete/?app_label=general&model_name=comment&field_name=author")
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app
        .get_admin("/admin/autocomplete/?app_label=auth&model_name=group&field_name=author")
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

// ===========================================================================
// Service-level helpers
// ===========================================================================

#[tokio::test]
async fn comment_count_reflects_current_comments() {
    let app = app().await;
    let author = app.create_user("admin_count").await;
    let post = app.create_post(author.id, "counted", "body").await;
    let service = AdminService::new(app.state.db.clone());

    assert_eq!(service.comment_count(post).await.unwrap(), 0);

    let comment = app.create_comment(author.id, post, "one").await;
    app.create_comment(author.id, post, "two").await;
    assert_eq!(service.comment_count(post).await.unwrap(), 2);

    app.delete(&format!("/api/comments/{}/", comment)).await;
    assert_eq!(service.comment_count(post).await.unwrap(), 1);
}

#[tokio::test]
async fn prefetch_groups_comments_by_post() {
    let app = app().await;
    let author = app.create_user("admin_prefetch").await;
    let first = app.create_post(author.id, "first", "body").await;
    let second = app.create_post(author.id, "second", "body").await;
    let silent = app.create_post(author.id, "silent", "body").await;
    app.create_comment(author.id, first, "a").await;
    app.create_comment(author.id, first, "b").await;
    app.create_comment(author.id, second, "c").await;

    let service = AdminService::new(app.state.db.clone());
    let grouped = service
        .prefetch_comments(&[first, second, silent])
        .await
        .unwrap();

    assert_eq!(grouped.get(&first).map(Vec::len), Some(2));
    assert_eq!(grouped.get(&second).map(Vec::len), Some(1));
    assert!(grouped.get(&silent).is_none());
    assert!(service.prefetch_comments(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn post_pages_carry_their_own_comments() {
    let app = app().await;
    let author = app.create_user("admin_paged").await;
    let mut expected = HashMap::new();
    for (index, comments) in [0usize, 1, 2, 3, 4].into_iter().enumerate() {
        let post = app
            .create_post(author.id, &format!("paged {}", index), "body")
            .await;
        for n in 0..comments {
            app.create_comment(author.id, post, &format!("c{}", n)).await;
        }
        expected.insert(post, comments);
    }

    let options = post_admin().options;
    let params = HashMap::from([("author".to_string(), author.id.to_string())]);
    let service = AdminService::new(app.state.db.clone());

    for per_page in [2, 5] {
        let mut request = ChangeListRequest::parse(&options, &params).unwrap();
        request.per_page = per_page;

        let mut seen = HashMap::new();
        loop {
            let (listings, total) = service.list_posts(&options, &request).await.unwrap();
            assert_eq!(total, 5);
            assert!(listings.len() as i64 <= per_page);
            if listings.is_empty() {
                break;
            }
            for listing in &listings {
                assert!(listing.comments.iter().all(|c| c.post_id == listing.post.id));
                seen.insert(listing.post.id, listing.comments.len());
            }
            request.page += 1;
        }

        assert_eq!(seen, expected, "per_page {}", per_page);
    }
}
