//! End-to-end handler tests over in-memory backends.
//!
//! Run with: `cargo test -p medialake-api --test media_api`

mod helpers;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use bytes::Bytes;
use helpers::{multipart_body, multipart_content_type, test_app};
use medialake_api::state::AppState;
use medialake_core::models::{Bucket, Group};
use medialake_storage::keys;
use tower::ServiceExt;
use uuid::Uuid;

const BODY_LIMIT: usize = 64 * 1024 * 1024;

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    use image::{DynamicImage, ImageFormat, RgbaImage};
    let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
    let mut buffer = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

#[tokio::test]
async fn test_health_ok() {
    let (app, _state) = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["metadata"], "healthy");
    assert_eq!(body["storage"], "healthy");
}

#[tokio::test]
async fn test_upload_document_and_poll_readiness() {
    let (app, _state) = test_app().await;
    let user = Uuid::new_v4();

    let body = multipart_body(&[("report.pdf", "application/pdf", b"%PDF-1.4 data")]);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/media/upload")
                .header(header::CONTENT_TYPE, multipart_content_type())
                .header("x-user-id", user.to_string())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = json_body(response).await;
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);
    let files = report["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["group"], "docs");
    let id = files[0]["id"].as_str().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/media/uploads/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let upload = json_body(response).await;
    assert_eq!(upload["status"], "ready");
    assert_eq!(upload["user_id"], user.to_string());
}

#[tokio::test]
async fn test_upload_image_generates_retrievable_preview() {
    let (app, _state) = test_app().await;

    let png = png_bytes(64, 48);
    let body = multipart_body(&[("photo.png", "image/png", &png)]);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/media/upload")
                .header(header::CONTENT_TYPE, multipart_content_type())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let report = json_body(response).await;
    let files = report["files"].as_array().unwrap();
    assert!(files[0]["preview_url"].as_str().is_some());
    let id = files[0]["id"].as_str().unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/media/{}.thumb.png", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "image/png"
    );
}

#[tokio::test]
async fn test_upload_without_files_rejected() {
    let (app, _state) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/media/upload")
                .header(header::CONTENT_TYPE, multipart_content_type())
                .body(Body::from(multipart_body(&[])))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unsupported_file_reported_not_stored() {
    let (app, _state) = test_app().await;

    let body = multipart_body(&[("tool.exe", "application/x-msdownload", b"MZ")]);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/media/upload")
                .header(header::CONTENT_TYPE, multipart_content_type())
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    // Partial-success contract: rejected files land in `errors`, not in an
    // HTTP failure.
    assert_eq!(response.status(), StatusCode::OK);
    let report = json_body(response).await;
    assert_eq!(report["files"].as_array().unwrap().len(), 0);
    let errors = report["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["status"], 415);
}

#[tokio::test]
async fn test_get_media_streams_document() {
    let (app, state) = test_app().await;
    let user = Uuid::new_v4();
    let id = Uuid::new_v4();
    let key = keys::primary_key(id, "pdf");

    state
        .metadata
        .insert_upload(id, user, Group::Docs)
        .await
        .unwrap();
    state
        .metadata
        .insert_document(id, "application/pdf")
        .await
        .unwrap();
    state
        .gateway
        .put(
            Bucket::Docs,
            &key,
            "application/pdf",
            Bytes::from_static(b"%PDF-1.4 report"),
        )
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/media/{}", key))
                .header("x-user-id", user.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap(),
        "inline"
    );
    let body = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&body[..], b"%PDF-1.4 report");

    // ?download switches to a named attachment.
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/media/{}?download=summary", key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap(),
        "attachment; filename=\"summary.pdf\""
    );
}

#[tokio::test]
async fn test_get_media_mode_group() {
    let (app, state) = test_app().await;
    let id = Uuid::new_v4();

    state
        .metadata
        .insert_upload(id, Uuid::new_v4(), Group::Videos)
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/media/{}?mode=group", keys::primary_key(id, "mp4")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["group"], "videos");
}

#[tokio::test]
async fn test_get_media_foreign_user_forbidden() {
    let (app, state) = test_app().await;
    let id = Uuid::new_v4();

    state
        .metadata
        .insert_upload(id, Uuid::new_v4(), Group::Docs)
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/media/{}", keys::primary_key(id, "pdf")))
                .header("x-user-id", Uuid::new_v4().to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_get_media_unknown_id_not_found() {
    let (app, _state) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/media/{}", keys::primary_key(Uuid::new_v4(), "pdf")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

async fn seed_video(state: &Arc<AppState>, data: &'static [u8]) -> String {
    let id = Uuid::new_v4();
    let key = keys::primary_key(id, "mp4");
    state
        .metadata
        .insert_upload(id, Uuid::new_v4(), Group::Videos)
        .await
        .unwrap();
    state.metadata.insert_video(id, "video/mp4").await.unwrap();
    state
        .gateway
        .put(Bucket::Videos, &key, "video/mp4", Bytes::from_static(data))
        .await
        .unwrap();
    key
}

#[tokio::test]
async fn test_stream_full_object_200() {
    let (app, state) = test_app().await;
    let key = seed_video(&state, b"0123456789").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/media/stream/{}", key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCEPT_RANGES].to_str().unwrap(),
        "bytes"
    );
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH].to_str().unwrap(),
        "10"
    );
    let body = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&body[..], b"0123456789");
}

#[tokio::test]
async fn test_stream_explicit_range_206() {
    let (app, state) = test_app().await;
    let key = seed_video(&state, b"0123456789").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/media/stream/{}", key))
                .header(header::RANGE, "bytes=2-5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE].to_str().unwrap(),
        "bytes 2-5/10"
    );
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH].to_str().unwrap(),
        "4"
    );
    let body = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&body[..], b"2345");
}

#[tokio::test]
async fn test_stream_malformed_range_rejected() {
    let (app, state) = test_app().await;
    let key = seed_video(&state, b"0123456789").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/media/stream/{}", key))
                .header(header::RANGE, "bytes=-5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stream_non_video_not_found() {
    let (app, state) = test_app().await;
    let id = Uuid::new_v4();
    let key = keys::primary_key(id, "pdf");

    state
        .metadata
        .insert_upload(id, Uuid::new_v4(), Group::Docs)
        .await
        .unwrap();
    state
        .metadata
        .insert_document(id, "application/pdf")
        .await
        .unwrap();
    state
        .gateway
        .put(
            Bucket::Docs,
            &key,
            "application/pdf",
            Bytes::from_static(b"%PDF-1.4"),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/media/stream/{}", key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_archive_returns_zip_attachment() {
    let (app, state) = test_app().await;
    let user = Uuid::new_v4();
    let id = Uuid::new_v4();
    let key = keys::primary_key(id, "pdf");

    state
        .metadata
        .insert_upload(id, user, Group::Docs)
        .await
        .unwrap();
    state
        .metadata
        .insert_document(id, "application/pdf")
        .await
        .unwrap();
    state
        .gateway
        .put(
            Bucket::Docs,
            &key,
            "application/pdf",
            Bytes::from_static(b"%PDF-1.4 report"),
        )
        .await
        .unwrap();

    let payload = serde_json::json!([{ "id": key, "name": "report" }]);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/media/archive")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-user-id", user.to_string())
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "application/zip"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap(),
        "attachment; filename=\"archive.zip\""
    );
    let body = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&body[..2], b"PK");
}

#[tokio::test]
async fn test_archive_empty_body_rejected() {
    let (app, _state) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/media/archive")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("[]"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_archive_malformed_body_rejected() {
    let (app, _state) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/media/archive")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"id\": 42}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "INVALID_INPUT");
}
