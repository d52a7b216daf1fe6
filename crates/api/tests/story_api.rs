//! HTTP-level integration tests for story generation and the per-story
//! sub-resources: illustrations, narration, report, learning pack, exports.
//!
//! The provider is a deterministic in-process double (see `common`), so
//! these tests exercise persistence, media storage, and status handling
//! rather than model output.

mod common;

use std::io::Read;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use common::{
    body_bytes, body_json, create_story, delete_auth, get, get_auth, post_json_auth,
    put_json_auth, register, wait_for_status, MockProvider, FAKE_AUDIO, FAKE_PNG,
};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn generate_story_without_images(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "gen@example.com").await;

    let story = create_story(common::build_test_app(pool), &token, 3).await;
    assert_eq!(story["title"], "The Lantern Fox");
    assert_eq!(story["status"], "ready");
    assert_eq!(story["age_group"], "3-5");
    assert_eq!(story["language"], "en");
    assert_eq!(story["style"], "default");

    let sections = story["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 3);
    for (i, section) in sections.iter().enumerate() {
        assert_eq!(section["id"], i as i64 + 1);
        assert!(section["text"].as_str().unwrap().contains("lantern"));
        assert!(section["image_url"].is_null());
        assert!(section["audio_url"].is_null());
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn generate_story_with_images_stores_media(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "img@example.com").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/stories",
        json!({
            "prompt": "A fox who collects lanterns",
            "sections": 2,
            "title": "  Night Lights ",
            "image_style": "watercolor",
            "image_size": " 512X512 ",
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let story = body_json(response).await["data"].clone();
    let story_id = story["story_id"].as_i64().unwrap();
    assert_eq!(story["title"], "Night Lights");
    assert_eq!(story["status"], "ready");

    let first_url = story["sections"][0]["image_url"].as_str().unwrap().to_string();
    assert_eq!(first_url, format!("/media/story_{story_id}/sec_1.png"));
    assert_eq!(
        story["sections"][1]["image_url"],
        format!("/media/story_{story_id}/sec_2.png")
    );

    // The same app serves the stored file.
    let response = get(app, &first_url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, FAKE_PNG);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unsafe_prompt_is_rejected_before_generation(pool: PgPool) {
    let provider = Arc::new(MockProvider::default());
    let token = register(common::build_test_app(pool.clone()), "unsafe@example.com").await;

    let response = post_json_auth(
        common::build_test_app_with(pool, provider.clone()),
        "/api/v1/stories",
        json!({ "prompt": "A pirate with a knife", "generate_images": false }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("knife"));
    assert_eq!(provider.completion_calls.load(Ordering::SeqCst), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn story_request_is_validated(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "bad@example.com").await;

    for body in [
        json!({ "prompt": "ab" }),
        json!({ "prompt": "A fox", "sections": 11 }),
        json!({ "prompt": "A fox", "sections": 0 }),
        json!({ "prompt": "A fox", "image_size": "huge" }),
        json!({ "prompt": "A fox", "language": "x" }),
    ] {
        let response =
            post_json_auth(common::build_test_app(pool.clone()), "/api/v1/stories", body, &token)
                .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // Unknown fields are a deserialization failure.
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/stories",
        json!({ "prompt": "A fox", "colour": "red" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/stories",
        json!({ "prompt": "A fox", "child_id": 999_999 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn provider_failure_is_bad_gateway_and_saves_nothing(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "down@example.com").await;

    let response = post_json_auth(
        common::build_test_app_with(pool.clone(), Arc::new(MockProvider::failing())),
        "/api/v1/stories",
        json!({ "prompt": "A fox who collects lanterns" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "PROVIDER_ERROR");
    assert!(json["error"].as_str().unwrap().starts_with("Failed to generate story"));

    let response = get_auth(common::build_test_app(pool), "/api/v1/stories", &token).await;
    assert_eq!(body_json(response).await["data"], json!([]));
}

// ---------------------------------------------------------------------------
// Read and delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_is_newest_first_with_usage(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "list@example.com").await;
    let first = create_story(common::build_test_app(pool.clone()), &token, 1).await;
    let second = create_story(common::build_test_app(pool.clone()), &token, 1).await;

    let response = get_auth(common::build_test_app(pool), "/api/v1/stories", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["story_id"], second["story_id"]);
    assert_eq!(items[1]["story_id"], first["story_id"]);
    assert_eq!(items[0]["model"], "story-test-model");
    assert_eq!(items[0]["total_tokens"], 500);
    assert!(items[0].get("sections").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stories_are_private_to_their_parent(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "mine@example.com").await;
    let other = register(common::build_test_app(pool.clone()), "yours@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &owner, 2).await;
    let uri = format!("/api/v1/stories/{}", story["story_id"]);

    let response = get_auth(common::build_test_app(pool.clone()), &uri, &other).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(common::build_test_app(pool.clone()), &uri, &other).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(common::build_test_app(pool), &uri, &owner).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_story(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "del@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 2).await;
    let uri = format!("/api/v1/stories/{}", story["story_id"]);

    let response = delete_auth(common::build_test_app(pool.clone()), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(common::build_test_app(pool), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Illustrations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn illustrate_all_sections(pool: PgPool) {
    let provider = Arc::new(MockProvider::default());
    let token = register(common::build_test_app(pool.clone()), "all@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 3).await;

    let response = post_json_auth(
        common::build_test_app_with(pool, provider.clone()),
        &format!("/api/v1/stories/{}/images", story["story_id"]),
        json!({ "size": "256x256" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ready");
    let sections = json["data"]["sections"].as_array().unwrap();
    assert!(sections.iter().all(|s| s["image_url"].is_string()));
    assert_eq!(provider.image_calls.load(Ordering::SeqCst), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_illustration_leaves_story_ready(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "fail@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 2).await;
    let uri = format!("/api/v1/stories/{}", story["story_id"]);

    let response = post_json_auth(
        common::build_test_app_with(pool.clone(), Arc::new(MockProvider::failing())),
        &format!("{uri}/images"),
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = get_auth(common::build_test_app(pool), &uri, &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ready");
    assert!(json["data"]["sections"][0]["image_url"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn timed_out_illustration_resets_status(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "slowimg@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 2).await;
    let story_id = story["story_id"].as_i64().unwrap();

    let response = post_json_auth(
        common::build_test_app_with_timeout(pool.clone(), Arc::new(MockProvider::hanging()), 1),
        &format!("/api/v1/stories/{story_id}/images"),
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    let story = wait_for_status(&pool, &token, story_id, "ready").await;
    assert!(story["sections"][0]["image_url"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn illustrate_one_section(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "one@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 3).await;
    let story_id = story["story_id"].as_i64().unwrap();

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/stories/{story_id}/sections/2/image"),
        json!({ "image_style": "crayon" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], 2);
    assert_eq!(
        json["data"]["image_url"],
        format!("/media/story_{story_id}/sec_2.png")
    );

    let response = post_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/stories/{story_id}/sections/9/image"),
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Section 9 not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn standalone_image(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "solo@example.com").await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/images",
        json!({ "image_prompt": "A happy owl reading a book" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let url = body_json(response).await["data"]["image_url"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(url.starts_with("/media/img_"));
    assert!(url.ends_with("/sec_0.png"));

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/images",
        json!({ "image_prompt": "ab" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Narration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn narrate_story(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "tts@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 2).await;
    let story_id = story["story_id"].as_i64().unwrap();
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/stories/{story_id}/tts"),
        json!({ "format": " WAV " }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ready");
    let audio_url = json["data"]["sections"][1]["audio_url"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(audio_url, format!("/media/story_{story_id}/sec_2.wav"));

    let response = get(app, &audio_url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, FAKE_AUDIO);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_narration_leaves_story_ready(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "ttsfail@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 2).await;
    let uri = format!("/api/v1/stories/{}", story["story_id"]);

    let response = post_json_auth(
        common::build_test_app_with(pool.clone(), Arc::new(MockProvider::failing())),
        &format!("{uri}/tts"),
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "PROVIDER_ERROR");

    let response = get_auth(common::build_test_app(pool), &uri, &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ready");
    assert!(json["data"]["sections"][0]["audio_url"].is_null());
    assert!(json["data"]["sections"][1]["audio_url"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn timed_out_narration_resets_status(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "slowtts@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 1).await;
    let story_id = story["story_id"].as_i64().unwrap();

    let response = post_json_auth(
        common::build_test_app_with_timeout(pool.clone(), Arc::new(MockProvider::hanging()), 1),
        &format!("/api/v1/stories/{story_id}/tts"),
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    let story = wait_for_status(&pool, &token, story_id, "ready").await;
    assert!(story["sections"][0]["audio_url"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn narration_options_are_validated(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "ttsbad@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 1).await;
    let uri = format!("/api/v1/stories/{}/tts", story["story_id"]);

    for body in [json!({ "format": "ogg" }), json!({ "voice": "no spaces!" })] {
        let response = post_json_auth(common::build_test_app(pool.clone()), &uri, body, &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn report_is_computed_then_cached(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "report@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 2).await;
    let uri = format!("/api/v1/stories/{}/report", story["story_id"]);

    let response = get_auth(common::build_test_app(pool.clone()), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await["data"].clone();
    assert_eq!(first["story_id"], story["story_id"]);
    assert!(first["metrics"]["word_count"].as_u64().unwrap() > 0);
    assert!(first["metrics"]["flesch_kincaid_grade"].is_number());
    assert_eq!(first["flags"]["blocked_terms_in_story"], json!([]));
    assert_eq!(first["notes"].as_array().unwrap().len(), 2);

    let response = get_auth(common::build_test_app(pool), &uri, &token).await;
    let second = body_json(response).await["data"].clone();
    assert_eq!(second["generated_at"], first["generated_at"]);
}

// ---------------------------------------------------------------------------
// Learning pack
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn learning_pack_lifecycle(pool: PgPool) {
    let provider = Arc::new(MockProvider::default());
    let token = register(common::build_test_app(pool.clone()), "learn@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 2).await;
    let uri = format!("/api/v1/stories/{}/learning", story["story_id"]);

    let response = get_auth(common::build_test_app(pool.clone()), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Learning pack not found");

    let response = post_json_auth(
        common::build_test_app_with(pool.clone(), provider.clone()),
        &uri,
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let pack = body_json(response).await["data"].clone();
    assert!(pack["summary"].as_str().unwrap().contains("lanterns"));
    assert_eq!(pack["questions"].as_array().unwrap().len(), 3);
    assert_eq!(pack["vocabulary"][0]["word"], "lantern");
    assert_eq!(provider.completion_calls.load(Ordering::SeqCst), 1);

    // A second POST returns the stored pack without calling the provider.
    let response = post_json_auth(
        common::build_test_app_with(pool.clone(), provider.clone()),
        &uri,
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(provider.completion_calls.load(Ordering::SeqCst), 1);

    let response = post_json_auth(
        common::build_test_app_with(pool.clone(), provider.clone()),
        &format!("{uri}?refresh=true"),
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(provider.completion_calls.load(Ordering::SeqCst), 2);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &uri,
        json!({
            "summary": "  Edited summary.  ",
            "questions": [{ "question": " Why? ", "answer": " Because. " }],
            "vocabulary": [],
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(common::build_test_app(pool), &uri, &token).await;
    let pack = body_json(response).await["data"].clone();
    assert_eq!(pack["summary"], "Edited summary.");
    assert_eq!(pack["questions"][0]["question"], "Why?");
    assert_eq!(pack["vocabulary"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn learning_pack_provider_failure_is_bad_gateway(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "learnfail@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 1).await;

    let response = post_json_auth(
        common::build_test_app_with(pool, Arc::new(MockProvider::failing())),
        &format!("/api/v1/stories/{}/learning", story["story_id"]),
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "PROVIDER_ERROR");
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn zip_export_includes_story_json_and_images(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "zip@example.com").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/stories",
        json!({ "prompt": "A fox who collects lanterns", "sections": 2 }),
        &token,
    )
    .await;
    let story = body_json(response).await["data"].clone();

    let response = get_auth(
        app,
        &format!("/api/v1/stories/{}/export/zip", story["story_id"]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"the_lantern_fox_story.zip\""
    );

    let bytes = body_bytes(response).await;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut image = Vec::new();
    archive
        .by_name("images/chapter_01.png")
        .unwrap()
        .read_to_end(&mut image)
        .unwrap();
    assert_eq!(image, FAKE_PNG);

    let mut json = String::new();
    archive
        .by_name("story.json")
        .unwrap()
        .read_to_string(&mut json)
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(json["title"], "The Lantern Fox");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pdf_export(pool: PgPool) {
    let token = register(common::build_test_app(pool.clone()), "pdf@example.com").await;
    let story = create_story(common::build_test_app(pool.clone()), &token, 2).await;

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/stories/{}/export/pdf", story["story_id"]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"the_lantern_fox.pdf\""
    );
    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF-"));
}
