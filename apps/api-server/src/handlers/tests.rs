//! End-to-end tests over the in-memory store.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use scribe_core::ports::{AuthError, PasswordService, TokenService};
use scribe_core::services::BlogSettings;
use scribe_infra::{JwtConfig, JwtTokenService};

use crate::state::AppState;

struct PlainPasswords;

impl PasswordService for PlainPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash == format!("plain:{password}"))
    }
}

macro_rules! test_app {
    () => {{
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig::default()));
        let state = AppState::in_memory(Arc::new(PlainPasswords), BlogSettings::default());
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(tokens))
                .app_data(super::json_config())
                .app_data(super::query_config())
                .configure(super::configure_routes),
        )
        .await
    }};
}

/// Register `name` and return `(bearer header value, user id)`.
macro_rules! register {
    ($app:expr, $name:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "email": format!("{}@example.com", $name),
                "username": $name,
                "password": "correct-horse",
                "password_confirm": "correct-horse",
                "first_name": "Test",
            }))
            .to_request();
        let res = test::call_service($app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(res).await;
        (
            format!("Bearer {}", body["access_token"].as_str().unwrap()),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }};
}

/// Send a request and return `(status, json body or Null)`.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let res = test::call_service($app, $req.to_request()).await;
        let status = res.status();
        let bytes = test::read_body(res).await;
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }};
}

macro_rules! create_post {
    ($app:expr, $auth:expr, $body:expr) => {{
        let (status, body) = send!(
            $app,
            test::TestRequest::post()
                .uri("/api/v1/posts")
                .insert_header((header::AUTHORIZATION, $auth.as_str()))
                .set_json($body)
        );
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }};
}

#[actix_rt::test]
async fn register_login_and_me() {
    let app = test_app!();
    let (auth, user_id) = register!(&app, "ada");

    let (status, body) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "ada@example.com", "password": "correct-horse" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["user"]["last_login"].is_string());

    let (status, body) = send!(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header((header::AUTHORIZATION, auth.as_str()))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id.as_str());
    assert_eq!(body["full_name"], "Test");
    assert_eq!(body["is_verified"], false);
}

#[actix_rt::test]
async fn registration_errors_use_problem_bodies() {
    let app = test_app!();
    register!(&app, "ada");

    let (status, body) = send!(
        &app,
        test::TestRequest::post().uri("/api/auth/register").set_json(json!({
            "email": "bob@example.com",
            "username": "bob",
            "password": "correct-horse",
            "password_confirm": "battery-staple",
        }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["type"], "about:blank");

    let (status, _) = send!(
        &app,
        test::TestRequest::post().uri("/api/auth/register").set_json(json!({
            "email": "ada@example.com",
            "username": "ada2",
            "password": "correct-horse",
            "password_confirm": "correct-horse",
        }))
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "ada@example.com", "password": "wrong-password" }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn malformed_json_is_a_problem_400() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json");
    let (status, body) = send!(&app, req);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Bad Request");
    assert_eq!(body["instance"], "/api/auth/login");
}

#[actix_rt::test]
async fn rejections_carry_the_request_id() {
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig::default()));
    let state = AppState::in_memory(Arc::new(PlainPasswords), BlogSettings::default());
    let app = test::init_service(
        App::new()
            .wrap(crate::observability::RequestIdMiddleware)
            .app_data(web::Data::new(state))
            .app_data(web::Data::new(tokens))
            .app_data(super::json_config())
            .app_data(super::query_config())
            .configure(super::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("X-Request-ID", "req-42"))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json");
    let (status, body) = send!(&app, req);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["request_id"], "req-42");
}

#[actix_rt::test]
async fn drafts_are_hidden_from_other_listings() {
    let app = test_app!();
    let (ada, _) = register!(&app, "ada");
    let (bob, _) = register!(&app, "bob");

    let (status, _) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .set_json(json!({ "title": "Nope", "content": "anonymous" }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    create_post!(&app, ada, json!({ "title": "Draft", "content": "secret" }));
    create_post!(
        &app,
        ada,
        json!({ "title": "Live", "content": "hello", "status": "published" })
    );

    let (_, anonymous) = send!(&app, test::TestRequest::get().uri("/api/v1/posts"));
    assert_eq!(anonymous["count"], 1);
    assert_eq!(anonymous["results"][0]["title"], "Live");

    let (_, as_bob) = send!(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/posts?status=draft")
            .insert_header((header::AUTHORIZATION, bob.as_str()))
    );
    assert_eq!(as_bob["count"], 0);

    let (_, as_ada) = send!(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/posts?status=draft")
            .insert_header((header::AUTHORIZATION, ada.as_str()))
    );
    assert_eq!(as_ada["count"], 1);

    let (_, mine) = send!(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/posts/my_posts")
            .insert_header((header::AUTHORIZATION, ada.as_str()))
    );
    assert_eq!(mine["count"], 2);
}

#[actix_rt::test]
async fn listing_rejects_unknown_ordering_and_status() {
    let app = test_app!();

    for uri in [
        "/api/v1/posts?ordering=-title",
        "/api/v1/posts?status=scheduled",
        "/api/v1/posts?views_count__gte=lots",
        "/api/v1/posts?page=18446744073709551615",
        "/api/v1/comments?page=9223372036854775807",
    ] {
        let (status, body) = send!(&app, test::TestRequest::get().uri(uri));
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["status"], 400);
    }

    let (status, body) = send!(&app, test::TestRequest::get().uri("/api/v1/posts?page=7"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
}

#[actix_rt::test]
async fn retrieval_counts_views_and_likes_toggle() {
    let app = test_app!();
    let (ada, _) = register!(&app, "ada");
    let (bob, _) = register!(&app, "bob");
    let post_id = create_post!(
        &app,
        ada,
        json!({ "title": "Counted", "content": "body", "status": "published" })
    );
    let uri = format!("/api/v1/posts/{post_id}");

    send!(&app, test::TestRequest::get().uri(&uri));
    let (status, body) = send!(&app, test::TestRequest::get().uri(&uri));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["views_count"], 2);
    assert_eq!(body["is_liked"], false);

    let like_uri = format!("{uri}/like");
    let (status, _) = send!(&app, test::TestRequest::post().uri(&like_uri));
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send!(
        &app,
        test::TestRequest::post()
            .uri(&like_uri)
            .insert_header((header::AUTHORIZATION, bob.as_str()))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["liked"], true);
    assert_eq!(body["likes_count"], 1);

    let (_, body) = send!(
        &app,
        test::TestRequest::get()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, bob.as_str()))
    );
    assert_eq!(body["is_liked"], true);
    assert_eq!(body["likes_count"], 1);

    let (status, body) = send!(
        &app,
        test::TestRequest::post()
            .uri(&like_uri)
            .insert_header((header::AUTHORIZATION, bob.as_str()))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], false);
    assert_eq!(body["likes_count"], 0);
}

#[actix_rt::test]
async fn only_the_author_may_change_a_post() {
    let app = test_app!();
    let (ada, _) = register!(&app, "ada");
    let (bob, _) = register!(&app, "bob");
    let post_id = create_post!(&app, ada, json!({ "title": "Mine", "content": "body" }));
    let uri = format!("/api/v1/posts/{post_id}");

    let (status, _) = send!(
        &app,
        test::TestRequest::patch()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, bob.as_str()))
            .set_json(json!({ "title": "Stolen" }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send!(
        &app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, bob.as_str()))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send!(
        &app,
        test::TestRequest::patch()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, ada.as_str()))
            .set_json(json!({ "status": "published", "views_count": 1000 }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Mine");
    assert_eq!(body["views_count"], 0);
    assert!(body["published_at"].is_string());

    let (status, _) = send!(
        &app,
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, ada.as_str()))
    );
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send!(&app, test::TestRequest::get().uri(&uri));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn comments_replies_and_moderation() {
    let app = test_app!();
    let (ada, _) = register!(&app, "ada");
    let (bob, _) = register!(&app, "bob");
    let post_id = create_post!(
        &app,
        ada,
        json!({ "title": "Discuss", "content": "body", "status": "published" })
    );

    let (status, parent) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/comments")
            .insert_header((header::AUTHORIZATION, bob.as_str()))
            .set_json(json!({ "post_id": post_id, "content": "First!" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    let parent_id = parent["id"].as_str().unwrap().to_string();

    let (status, reply) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/comments")
            .insert_header((header::AUTHORIZATION, ada.as_str()))
            .set_json(json!({ "post_id": post_id, "content": "Thanks", "parent_id": parent_id }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["is_reply"], true);

    let (_, replies) = send!(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/comments/{parent_id}/replies"))
    );
    assert_eq!(replies.as_array().map(Vec::len), Some(1));

    // Bob wrote the comment but does not own the post.
    let moderate_uri = format!("/api/v1/comments/{parent_id}/moderate");
    let (status, _) = send!(
        &app,
        test::TestRequest::post()
            .uri(&moderate_uri)
            .insert_header((header::AUTHORIZATION, bob.as_str()))
            .set_json(json!({ "is_approved": false }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send!(
        &app,
        test::TestRequest::post()
            .uri(&moderate_uri)
            .insert_header((header::AUTHORIZATION, ada.as_str()))
            .set_json(json!({ "is_approved": false }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_approved"], false);

    let (_, approved) = send!(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/comments?post={post_id}&is_approved=true"))
    );
    assert_eq!(approved["count"], 1);

    let (status, _) = send!(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/v1/comments/{parent_id}"))
            .insert_header((header::AUTHORIZATION, ada.as_str()))
            .set_json(json!({ "content": "edited by someone else" }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn taxonomy_counts_published_posts_only() {
    let app = test_app!();
    let (ada, _) = register!(&app, "ada");

    let (status, category) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/categories")
            .insert_header((header::AUTHORIZATION, ada.as_str()))
            .set_json(json!({ "name": "Systems Programming" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(category["slug"], "systems-programming");
    let category_id = category["id"].as_str().unwrap().to_string();

    let (_, tag) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/tags")
            .insert_header((header::AUTHORIZATION, ada.as_str()))
            .set_json(json!({ "name": "Rust" }))
    );
    let tag_id = tag["id"].as_str().unwrap().to_string();

    create_post!(
        &app,
        ada,
        json!({
            "title": "Published", "content": "body", "status": "published",
            "category_id": category_id, "tag_ids": [tag_id],
        })
    );
    create_post!(
        &app,
        ada,
        json!({ "title": "Draft", "content": "body", "category_id": category_id })
    );

    let (_, category) = send!(
        &app,
        test::TestRequest::get().uri(&format!("/api/v1/categories/{category_id}"))
    );
    assert_eq!(category["posts_count"], 1);

    let (_, posts) = send!(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/categories/{category_id}/posts"))
            .insert_header((header::AUTHORIZATION, ada.as_str()))
    );
    assert_eq!(posts["count"], 1);

    let (_, by_tag) = send!(&app, test::TestRequest::get().uri("/api/v1/posts?tags=rust"));
    assert_eq!(by_tag["count"], 1);
    assert_eq!(by_tag["results"][0]["tags"][0]["slug"], "rust");

    let (status, _) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/tags")
            .insert_header((header::AUTHORIZATION, ada.as_str()))
            .set_json(json!({ "name": "Rust" }))
    );
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn taxonomy_listings_search_order_and_paginate() {
    let app = test_app!();
    let (ada, _) = register!(&app, "ada");

    let mut ids = Vec::new();
    for (name, description) in [("Go", "Cloud tooling"), ("Rust", ""), ("Web", "Rust on the server")] {
        let (status, body) = send!(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/categories")
                .insert_header((header::AUTHORIZATION, ada.as_str()))
                .set_json(json!({ "name": name, "description": description }))
        );
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["id"].as_str().unwrap().to_string());
    }
    for title in ["First", "Second"] {
        create_post!(
            &app,
            ada,
            json!({ "title": title, "content": "body", "status": "published", "category_id": ids[2] })
        );
    }
    create_post!(
        &app,
        ada,
        json!({ "title": "Third", "content": "body", "status": "published", "category_id": ids[0] })
    );

    let names = |body: &Value| -> Vec<String> {
        body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, body) = send!(&app, test::TestRequest::get().uri("/api/v1/categories"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(names(&body), ["Go", "Rust", "Web"]);

    let (_, body) = send!(&app, test::TestRequest::get().uri("/api/v1/categories?search=RUST"));
    assert_eq!(body["count"], 2);
    assert_eq!(names(&body), ["Rust", "Web"]);

    let (_, body) = send!(
        &app,
        test::TestRequest::get().uri("/api/v1/categories?ordering=-post_count")
    );
    assert_eq!(names(&body), ["Web", "Go", "Rust"]);
    assert_eq!(body["results"][0]["posts_count"], 2);

    let (_, body) = send!(&app, test::TestRequest::get().uri("/api/v1/categories?page=2"));
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"], json!([]));

    let (status, _) = send!(&app, test::TestRequest::get().uri("/api/v1/categories?ordering=slug"));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for name in ["tokio", "serde"] {
        send!(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/tags")
                .insert_header((header::AUTHORIZATION, ada.as_str()))
                .set_json(json!({ "name": name }))
        );
    }
    let (_, body) = send!(&app, test::TestRequest::get().uri("/api/v1/tags?search=TOK"));
    assert_eq!(body["count"], 1);
    assert_eq!(names(&body), ["tokio"]);

    let (status, _) = send!(&app, test::TestRequest::get().uri("/api/v1/tags?ordering=-post_count"));
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn fixed_segments_are_not_ids() {
    let app = test_app!();
    for uri in [
        "/api/v1/posts/featured",
        "/api/v1/posts/popular",
        "/api/v1/posts/trending",
    ] {
        let (status, _) = send!(&app, test::TestRequest::get().uri(uri));
        assert_eq!(status, StatusCode::OK, "{uri}");
    }

    let (status, _) = send!(&app, test::TestRequest::get().uri("/api/v1/posts/my_posts"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn users_edit_only_themselves() {
    let app = test_app!();
    let (ada, ada_id) = register!(&app, "ada");
    let (bob, _) = register!(&app, "bob");

    let (status, _) = send!(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/v1/users/{ada_id}"))
            .insert_header((header::AUTHORIZATION, bob.as_str()))
            .set_json(json!({ "bio": "hijacked" }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send!(
        &app,
        test::TestRequest::patch()
            .uri("/api/v1/users/me")
            .insert_header((header::AUTHORIZATION, ada.as_str()))
            .set_json(json!({ "location": "London", "avatar": null }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "London");

    let (_, listing) = send!(&app, test::TestRequest::get().uri("/api/v1/users?search=ad"));
    assert_eq!(listing["count"], 1);
}

#[actix_rt::test]
async fn stats_are_open_and_aggregate() {
    let app = test_app!();
    let (ada, _) = register!(&app, "ada");
    create_post!(
        &app,
        ada,
        json!({ "title": "One", "content": "body", "status": "published" })
    );
    create_post!(&app, ada, json!({ "title": "Two", "content": "body" }));

    let (status, body) = send!(&app, test::TestRequest::get().uri("/api/v1/analytics"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"]["total_posts"], 2);
    assert_eq!(body["posts"]["published_posts"], 1);
    assert_eq!(body["posts"]["draft_posts"], 1);
    assert_eq!(body["users"]["total_users"], 1);
    assert_eq!(body["users"]["verified_users"], 0);

    let (_, users) = send!(&app, test::TestRequest::get().uri("/api/v1/analytics/user_stats"));
    assert_eq!(users["total_users"], 1);
}
