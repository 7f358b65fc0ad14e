mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use storefront_api::auth::Role;
use storefront_api::images::{HttpImageHost, ImageError, ImageHost};

const API_SECRET: &str = "cdn-secret";

#[derive(Clone, Default)]
struct FakeCdn {
    uploads: Arc<Mutex<Vec<(String, String, usize)>>>,
    destroyed: Arc<Mutex<Vec<String>>>,
}

fn expected_signature(params: &[(&str, &str)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by_key(|(key, _)| *key);
    let payload = sorted.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join("&");
    hex::encode(Sha256::digest(format!("{}{}", payload, API_SECRET).as_bytes()))
}

async fn read_form(mut multipart: Multipart) -> (HashMap<String, String>, Option<(String, String, usize)>) {
    let mut fields = HashMap::new();
    let mut file = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let len = field.bytes().await.unwrap().len();
            file = Some((file_name, content_type, len));
        } else {
            fields.insert(name, field.text().await.unwrap());
        }
    }
    (fields, file)
}

async fn upload(State(cdn): State<FakeCdn>, multipart: Multipart) -> (StatusCode, Json<Value>) {
    let (fields, file) = read_form(multipart).await;
    let signature = expected_signature(&[
        ("folder", fields["folder"].as_str()),
        ("public_id", fields["public_id"].as_str()),
        ("timestamp", fields["timestamp"].as_str()),
    ]);
    if fields.get("signature") != Some(&signature) || fields.get("api_key").map(String::as_str) != Some("cdn-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": { "message": "bad signature" } })));
    }

    cdn.uploads.lock().unwrap().extend(file);
    let public_id = format!("{}/{}", fields["folder"], fields["public_id"]);
    (
        StatusCode::OK,
        Json(json!({
            "secure_url": format!("https://cdn.example.com/{}.png", public_id),
            "public_id": public_id,
        })),
    )
}

async fn destroy(State(cdn): State<FakeCdn>, multipart: Multipart) -> Json<Value> {
    let (fields, _) = read_form(multipart).await;
    let public_id = fields["public_id"].clone();
    let mut destroyed = cdn.destroyed.lock().unwrap();
    let result = if destroyed.contains(&public_id) { "not found" } else { "ok" };
    destroyed.push(public_id);
    Json(json!({ "result": result }))
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn spawn_cdn() -> Result<(String, FakeCdn)> {
    let cdn = FakeCdn::default();
    let router = Router::new()
        .route("/upload", post(upload))
        .route("/destroy", post(destroy))
        .route("/broken", post(broken))
        .with_state(cdn.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let base = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok((base, cdn))
}

fn host(base: &str, upload_path: &str) -> Result<HttpImageHost> {
    Ok(HttpImageHost::new(
        &format!("{}{}", base, upload_path),
        &format!("{}/destroy", base),
        "cdn-key".to_string(),
        API_SECRET.to_string(),
        "products".to_string(),
        Duration::from_secs(5),
    )?)
}

#[tokio::test]
async fn uploads_are_signed_and_parsed() -> Result<()> {
    let (base, cdn) = spawn_cdn().await?;
    let host = host(&base, "/upload")?;

    let uploaded = host.upload(vec![0x89, b'P', b'N', b'G'], "lamp.png", "image/png").await?;
    assert!(uploaded.public_id.starts_with("products/"));
    assert_eq!(uploaded.url, format!("https://cdn.example.com/{}.png", uploaded.public_id));

    let uploads = cdn.uploads.lock().unwrap().clone();
    assert_eq!(uploads, vec![("lamp.png".to_string(), "image/png".to_string(), 4)]);
    Ok(())
}

#[tokio::test]
async fn destroying_twice_is_not_an_error() -> Result<()> {
    let (base, cdn) = spawn_cdn().await?;
    let host = host(&base, "/upload")?;

    host.destroy("products/abc").await?;
    host.destroy("products/abc").await?;
    assert_eq!(cdn.destroyed.lock().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn upstream_failures_carry_the_status() -> Result<()> {
    let (base, _cdn) = spawn_cdn().await?;
    let host = host(&base, "/broken")?;

    match host.upload(vec![1, 2, 3], "lamp.png", "image/png").await {
        Err(ImageError::Upstream { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("exploded"));
        }
        other => panic!("expected upstream error, got {:?}", other.map(|u| u.public_id)),
    }
    Ok(())
}

#[tokio::test]
async fn empty_files_never_leave_the_process() -> Result<()> {
    let (base, cdn) = spawn_cdn().await?;
    let host = host(&base, "/upload")?;

    assert!(matches!(host.upload(Vec::new(), "empty.png", "image/png").await, Err(ImageError::Empty)));
    assert!(cdn.uploads.lock().unwrap().is_empty());
    Ok(())
}

fn image_form(bytes: Vec<u8>, mime: &str) -> Result<Form> {
    Ok(Form::new().part("file", Part::bytes(bytes).file_name("lamp.png").mime_str(mime)?))
}

#[tokio::test]
async fn upload_route_checks_the_file_before_the_host() -> Result<()> {
    let server = common::spawn_without_db().await?;
    let staff = common::token(Role::Employee, 1);
    let url = server.url("/api/products/7/images");

    let res = server
        .client
        .post(&url)
        .bearer_auth(&staff)
        .multipart(image_form(b"plain text".to_vec(), "text/plain")?)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let res = server
        .client
        .post(&url)
        .bearer_auth(&staff)
        .multipart(image_form(Vec::new(), "image/png")?)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .post(&url)
        .bearer_auth(&staff)
        .multipart(Form::new().text("note", "no file here"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["field_errors"]["file"].is_string());

    // Valid image, but no image host configured
    let res = server
        .client
        .post(&url)
        .bearer_auth(&staff)
        .multipart(image_form(vec![1, 2, 3], "image/png")?)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn upload_route_is_staff_only() -> Result<()> {
    let server = common::spawn_without_db().await?;

    let res = server
        .client
        .post(server.url("/api/products/7/images"))
        .bearer_auth(common::token(Role::Customer, 3))
        .multipart(image_form(vec![1, 2, 3], "image/png")?)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn oversized_uploads_are_refused() -> Result<()> {
    let limit = storefront_api::config::config().api.max_request_size_bytes;
    let server = common::spawn_without_db().await?;

    let res = server
        .client
        .post(server.url("/api/products/7/images"))
        .bearer_auth(common::token(Role::Employee, 1))
        .multipart(image_form(vec![0u8; limit + 1], "image/png")?)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    Ok(())
}
