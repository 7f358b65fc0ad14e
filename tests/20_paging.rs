mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use storefront_api::auth::Role;

async fn get_json(server: &common::TestServer, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
    let mut request = server.client.get(server.url(path));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let res = request.send().await?;
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    Ok((status, body))
}

#[tokio::test]
async fn page_size_and_number_must_be_positive() -> Result<()> {
    let server = common::spawn_without_db().await?;

    let (status, body) = get_json(&server, "/api/products?pageSize=0", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["pageSize"].is_string());

    let (status, body) = get_json(&server, "/api/categories?pageNumber=-2", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["pageNumber"].is_string());
    Ok(())
}

#[tokio::test]
async fn non_numeric_paging_is_a_bad_request() -> Result<()> {
    let server = common::spawn_without_db().await?;

    let (status, body) = get_json(&server, "/api/products?pageSize=ten", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn ids_must_be_positive_integers() -> Result<()> {
    let server = common::spawn_without_db().await?;

    let (status, body) = get_json(&server, "/api/products/0", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["id"].is_string());

    let (status, _) = get_json(&server, "/api/categories/abc", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let staff = common::token(Role::Employee, 1);
    let (status, _) = get_json(&server, "/api/orders/-5", Some(&staff)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn filter_ids_must_be_positive() -> Result<()> {
    let server = common::spawn_without_db().await?;

    let (status, body) = get_json(&server, "/api/products?categoryId=0", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["categoryId"].is_string());

    let staff = common::token(Role::Admin, 1);
    let (status, body) = get_json(&server, "/api/orders?customerId=-1", Some(&staff)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["customerId"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_order_status_is_rejected() -> Result<()> {
    let server = common::spawn_without_db().await?;
    let staff = common::token(Role::Employee, 1);

    let (status, _) = get_json(&server, "/api/orders?status=Lost", Some(&staff)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}
