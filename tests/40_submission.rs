mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn submission_routes_need_no_token() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/api/v1/submission/unknown-form")).await?;

    // NOT_FOUND with a database, a 5xx envelope without one; never UNAUTHORIZED
    let status = res.status();
    assert!(
        status == StatusCode::NOT_FOUND || status.is_server_error(),
        "unexpected status: {}",
        status
    );
    let body = res.json::<serde_json::Value>().await?;
    common::error_code(&body);
    Ok(())
}

#[tokio::test]
async fn submit_requires_a_uuid_response_id() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .put(server.url("/api/v1/submission/unknown-form/responses/42"))
        .json(&json!({ "answers": {} }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(common::error_code(&body), "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn upload_request_must_be_json() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/v1/submission/unknown-form/uploads"))
        .json(&json!({ "filename": "a.pdf" }))
        .send()
        .await?;

    // contentType is required
    assert!(res.status().is_client_error(), "unexpected status: {}", res.status());
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(common::error_code(&body), "INVALID_JSON");
    Ok(())
}
