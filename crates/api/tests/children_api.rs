//! HTTP-level integration tests for the `/children` endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get, get_auth, post_json_auth, register};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create_child(pool: &PgPool, token: &str, name: &str, age: i32) -> Value {
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/children",
        json!({ "name": name, "age": age, "interests": "dinosaurs and trains" }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_and_list_children(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "kids@example.com").await;

    let child = create_child(&pool, &token, "  Mia  ", 6).await;
    assert_eq!(child["name"], "Mia");
    assert_eq!(child["age"], 6);
    assert_eq!(child["interests"], "dinosaurs and trains");
    create_child(&pool, &token, "Leo", 4).await;

    let response = get_auth(common::build_test_app(pool), "/api/v1/children", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn children_are_scoped_to_their_parent(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner@example.com").await;
    let other = register(common::build_test_app(pool.clone()), "other@example.com").await;
    let child = create_child(&pool, &owner, "Mia", 6).await;
    let id = child["id"].as_i64().unwrap();

    let response = get_auth(common::build_test_app(pool.clone()), "/api/v1/children", &other).await;
    assert_eq!(body_json(response).await["data"], json!([]));

    let response = delete_auth(
        common::build_test_app(pool),
        &format!("/api/v1/children/{id}"),
        &other,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn child_input_is_validated(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "valid@example.com").await;

    for body in [
        json!({ "name": "Mia", "age": 1, "interests": "trains" }),
        json!({ "name": "Mia", "age": 13, "interests": "trains" }),
        json!({ "name": "   ", "age": 6, "interests": "trains" }),
        json!({ "name": "Mia", "age": 6, "interests": "x" }),
    ] {
        let response =
            post_json_auth(common::build_test_app(pool.clone()), "/api/v1/children", body, &token)
                .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_a_child_keeps_its_stories(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "keep@example.com").await;
    let child = create_child(&pool, &token, "Mia", 6).await;
    let child_id = child["id"].as_i64().unwrap();

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/stories",
        json!({
            "prompt": "A fox who collects lanterns",
            "sections": 2,
            "generate_images": false,
            "child_id": child_id,
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let story = body_json(response).await["data"].clone();
    assert_eq!(story["child_id"], child_id);
    // Age 6 maps to the 6-8 group when no age group is given.
    assert_eq!(story["age_group"], "6-8");
    let story_id = story["story_id"].as_i64().unwrap();

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/children/{child_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/stories/{story_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["child_id"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn children_require_auth(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/children").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
