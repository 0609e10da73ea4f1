mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/api/v1/teams")).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(common::error_code(&body), "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn malformed_and_foreign_tokens_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for header in ["Bearer not-a-jwt", "Token abc", "Bearer "] {
        let res = client
            .get(server.url("/api/v1/teams"))
            .header("Authorization", header)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "header {header:?}");
    }

    let foreign = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &serde_json::json!({ "sub": "user-1", "exp": chrono::Utc::now().timestamp() + 600 }),
        &jsonwebtoken::EncodingKey::from_secret(b"some-other-secret"),
    )?;
    let res = client
        .get(server.url("/api/v1/teams"))
        .bearer_auth(foreign)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/v1/teams"))
        .bearer_auth(common::token("user-1", -3600))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn valid_token_reaches_path_validation() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .get(server.url("/api/v1/forms/not-a-uuid"))
        .bearer_auth(common::token("user-1", 600))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(common::error_code(&body), "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn invalid_json_body_uses_the_error_envelope() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/v1/teams"))
        .bearer_auth(common::token("user-1", 600))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(common::error_code(&body), "INVALID_JSON");
    Ok(())
}
