// Siteboard - a small site-catalogue CRUD API built with Rust
// Copyright (C) 2025 Siteboard Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! End-to-end tests of the site CRUD API against the real router, with an
//! in-memory database and a temporary uploads directory.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;
use tower::ServiceExt;

use siteboard_web::{routes, AppState, Config};

const BOUNDARY: &str = "SiteboardTestBoundary1234567890";

async fn test_app() -> (Router, TempDir) {
    // A single connection keeps the in-memory database shared across requests
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    siteboard_db::init::apply_schema(&pool).await.unwrap();

    let uploads = TempDir::new().unwrap();
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        uploads_dir: uploads.path().to_string_lossy().to_string(),
        max_upload_size: 10_485_760,
        public_url: "http://localhost:3000".to_string(),
        token_secret: "test-secret".to_string(),
    };

    let app = routes::create_router(AppState::new(pool, config));
    (app, uploads)
}

fn site_fields(name: &str) -> Vec<(String, String)> {
    vec![
        ("sitename".to_string(), name.to_string()),
        ("sitetitle".to_string(), format!("{} title", name)),
        ("siteaddress".to_string(), format!("{} address", name)),
        ("sitedescription".to_string(), format!("{} description", name)),
        (
            "videos".to_string(),
            "https://example.com/video.mp4".to_string(),
        ),
        ("category".to_string(), "heritage".to_string()),
    ]
}

fn multipart_body(fields: &[(String, String)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    for (filename, content_type, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(method: Method, uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn create_site(app: &Router, name: &str, files: &[(&str, &str, &[u8])]) -> (StatusCode, Value) {
    let body = multipart_body(&site_fields(name), files);
    send(app, multipart_request(Method::POST, "/api/sites", body)).await
}

#[tokio::test]
async fn test_index_is_plain_text() {
    let (app, _uploads) = test_app().await;

    let response = app.clone().oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Siteboard API is running");
}

#[tokio::test]
async fn test_list_empty_table() {
    let (app, _uploads) = test_app().await;

    let (status, json) = send(&app, get_request("/api/sites")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sites"], serde_json::json!([]));
}

#[tokio::test]
async fn test_create_then_list_matches_upload_count() {
    let (app, _uploads) = test_app().await;

    let files: &[(&str, &str, &[u8])] = &[
        ("a.jpg", "image/jpeg", b"jpeg-bytes"),
        ("b.png", "image/png", b"png-bytes"),
    ];
    let (status, json) = create_site(&app, "harbour", files).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Site created successfully");
    assert!(json["id"].as_i64().unwrap() > 0);

    let (status, json) = send(&app, get_request("/api/sites")).await;
    assert_eq!(status, StatusCode::OK);

    let sites = json["sites"].as_array().unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0]["sitename"], "harbour");
    assert!(sites[0].get("videos").is_none());

    let images: Vec<&str> = sites[0]["images"]
        .as_str()
        .unwrap()
        .split(',')
        .filter(|s| !s.is_empty())
        .collect();
    assert_eq!(images.len(), 2);
    assert!(images[0].ends_with("-a.jpg"));
    assert!(images[1].ends_with("-b.png"));
}

#[tokio::test]
async fn test_create_writes_files_to_uploads_dir() {
    let (app, uploads) = test_app().await;

    let files: &[(&str, &str, &[u8])] = &[("a.jpg", "image/jpeg", b"jpeg-bytes")];
    let (status, json) = create_site(&app, "harbour", files).await;
    assert_eq!(status, StatusCode::CREATED);

    let id = json["id"].as_i64().unwrap();
    let (_, json) = send(&app, get_request(&format!("/api/sites/{id}"))).await;
    let filename = json["site"]["images"].as_str().unwrap().to_string();

    // On disk, and served under the public upload path
    assert!(uploads.path().join(&filename).exists());
    let response = app
        .clone()
        .oneshot(get_request(&format!("/uploads/{filename}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"jpeg-bytes");
}

#[tokio::test]
async fn test_create_with_zero_images_is_rejected() {
    let (app, _uploads) = test_app().await;

    let (status, json) = create_site(&app, "bare", &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "No images uploaded");

    // No row persisted
    let (_, json) = send(&app, get_request("/api/sites")).await;
    assert_eq!(json["sites"], serde_json::json!([]));
}

#[tokio::test]
async fn test_create_with_disallowed_mime_is_rejected() {
    let (app, _uploads) = test_app().await;

    let files: &[(&str, &str, &[u8])] = &[("doc.pdf", "application/pdf", b"%PDF-1.4")];
    let (status, json) = create_site(&app, "pdfsite", files).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("Invalid file type"));

    let (_, json) = send(&app, get_request("/api/sites")).await;
    assert_eq!(json["sites"], serde_json::json!([]));
}

#[tokio::test]
async fn test_create_with_missing_fields_is_rejected() {
    let (app, _uploads) = test_app().await;

    let mut fields = site_fields("partial");
    fields.retain(|(name, _)| name != "sitetitle");
    let files: &[(&str, &str, &[u8])] = &[("a.jpg", "image/jpeg", b"jpeg-bytes")];
    let body = multipart_body(&fields, files);

    let (status, _) = send(&app, multipart_request(Method::POST, "/api/sites", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_site_returns_all_fields() {
    let (app, _uploads) = test_app().await;

    let files: &[(&str, &str, &[u8])] = &[("a.jpg", "image/jpeg", b"jpeg-bytes")];
    let (_, json) = create_site(&app, "harbour", files).await;
    let id = json["id"].as_i64().unwrap();

    let (status, json) = send(&app, get_request(&format!("/api/sites/{id}"))).await;
    assert_eq!(status, StatusCode::OK);

    let site = &json["site"];
    assert_eq!(site["id"], id);
    assert_eq!(site["sitename"], "harbour");
    assert_eq!(site["sitetitle"], "harbour title");
    assert_eq!(site["siteaddress"], "harbour address");
    assert_eq!(site["sitedescription"], "harbour description");
    assert_eq!(site["videos"], "https://example.com/video.mp4");
    assert_eq!(site["category"], "heritage");
    assert!(site.get("createdat").is_some());
}

#[tokio::test]
async fn test_get_missing_site_returns_404() {
    let (app, _uploads) = test_app().await;

    let (status, json) = send(&app, get_request("/api/sites/999999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Site not found");
}

#[tokio::test]
async fn test_update_without_images_preserves_image_list() {
    let (app, _uploads) = test_app().await;

    let files: &[(&str, &str, &[u8])] = &[
        ("a.jpg", "image/jpeg", b"jpeg-bytes"),
        ("b.jpg", "image/jpeg", b"more-jpeg-bytes"),
    ];
    let (_, json) = create_site(&app, "pier", files).await;
    let id = json["id"].as_i64().unwrap();

    let (_, json) = send(&app, get_request(&format!("/api/sites/{id}"))).await;
    let images_before = json["site"]["images"].as_str().unwrap().to_string();

    // Update scalars only, no files
    let body = multipart_body(&site_fields("pier-renamed"), &[]);
    let (status, json) = send(
        &app,
        multipart_request(Method::PUT, &format!("/api/sites/{id}"), body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Site updated successfully");

    let (_, json) = send(&app, get_request(&format!("/api/sites/{id}"))).await;
    assert_eq!(json["site"]["sitename"], "pier-renamed");
    assert_eq!(json["site"]["images"].as_str().unwrap(), images_before);
}

#[tokio::test]
async fn test_update_with_new_images_replaces_list() {
    let (app, _uploads) = test_app().await;

    let files: &[(&str, &str, &[u8])] = &[("a.jpg", "image/jpeg", b"jpeg-bytes")];
    let (_, json) = create_site(&app, "pier", files).await;
    let id = json["id"].as_i64().unwrap();

    let new_files: &[(&str, &str, &[u8])] = &[("c.gif", "image/gif", b"GIF89a")];
    let body = multipart_body(&site_fields("pier"), new_files);
    let (status, _) = send(
        &app,
        multipart_request(Method::PUT, &format!("/api/sites/{id}"), body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, get_request(&format!("/api/sites/{id}"))).await;
    let images = json["site"]["images"].as_str().unwrap();
    assert!(images.ends_with("-c.gif"));
    assert!(!images.contains("a.jpg"));
}

#[tokio::test]
async fn test_update_missing_site_returns_404() {
    let (app, _uploads) = test_app().await;

    let body = multipart_body(&site_fields("ghost"), &[]);
    let (status, _) = send(
        &app,
        multipart_request(Method::PUT, "/api/sites/999999", body),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_removes_row_and_files() {
    let (app, uploads) = test_app().await;

    let files: &[(&str, &str, &[u8])] = &[
        ("a.jpg", "image/jpeg", b"jpeg-bytes"),
        ("b.png", "image/png", b"png-bytes"),
    ];
    let (_, json) = create_site(&app, "doomed", files).await;
    let id = json["id"].as_i64().unwrap();

    let (_, json) = send(&app, get_request(&format!("/api/sites/{id}"))).await;
    let filenames: Vec<String> = json["site"]["images"]
        .as_str()
        .unwrap()
        .split(',')
        .map(|s| s.to_string())
        .collect();
    for filename in &filenames {
        assert!(uploads.path().join(filename).exists());
    }

    let (status, json) = send(&app, delete_request(&format!("/api/sites/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Site deleted successfully");

    // Row is gone
    let (status, _) = send(&app, get_request(&format!("/api/sites/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Files are gone, both on disk and from the public upload path
    for filename in &filenames {
        assert!(!uploads.path().join(filename).exists());
        let response = app
            .clone()
            .oneshot(get_request(&format!("/uploads/{filename}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_delete_missing_site_returns_404() {
    let (app, _uploads) = test_app().await;

    let (status, json) = send(&app, delete_request("/api/sites/999999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Site not found");
}

#[tokio::test]
async fn test_delete_tolerates_already_missing_file() {
    let (app, uploads) = test_app().await;

    let files: &[(&str, &str, &[u8])] = &[("a.jpg", "image/jpeg", b"jpeg-bytes")];
    let (_, json) = create_site(&app, "halfgone", files).await;
    let id = json["id"].as_i64().unwrap();

    let (_, json) = send(&app, get_request(&format!("/api/sites/{id}"))).await;
    let filename = json["site"]["images"].as_str().unwrap().to_string();
    std::fs::remove_file(uploads.path().join(&filename)).unwrap();

    let (status, _) = send(&app, delete_request(&format!("/api/sites/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rejected_upload_leaves_earlier_files_on_disk() {
    // No rollback of files written before a later part fails validation
    let (app, uploads) = test_app().await;

    let files: &[(&str, &str, &[u8])] = &[
        ("a.jpg", "image/jpeg", b"jpeg-bytes"),
        ("doc.pdf", "application/pdf", b"%PDF-1.4"),
    ];
    let (status, _) = create_site(&app, "partial", files).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No row persisted, but the first file was written before the rejection
    let (_, json) = send(&app, get_request("/api/sites")).await;
    assert_eq!(json["sites"], serde_json::json!([]));

    let written: Vec<_> = std::fs::read_dir(uploads.path()).unwrap().collect();
    assert_eq!(written.len(), 1);
}
