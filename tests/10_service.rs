mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/")).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["data"]["endpoints"]["submission"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_reports_database_state() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/health")).await?;

    // OK with a database, SERVICE_UNAVAILABLE without one
    let status = res.status();
    assert!(
        status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        status
    );

    let body = res.json::<serde_json::Value>().await?;
    if status == StatusCode::SERVICE_UNAVAILABLE {
        assert_eq!(common::error_code(&body), "SERVICE_UNAVAILABLE");
        assert_eq!(body["data"]["status"], "degraded");
    } else {
        assert_eq!(body["data"]["status"], "ok");
    }
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_not_found() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/api/v1/nothing-here")).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
