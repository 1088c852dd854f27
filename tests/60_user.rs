mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{Reply, TestServer};

async fn list_users(server: &TestServer, token: &str, filter: Value) -> Result<Reply> {
    server
        .post(
            "/user/get/all",
            Some(token),
            json!({ "filter": filter, "sortBy": "password" }),
        )
        .await
}

#[tokio::test]
async fn password_hashes_cannot_be_filtered_or_sorted() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;
    server.login_as("victim@example.com").await?;

    let res = list_users(
        &server,
        &token,
        json!({ "email": "victim@example.com", "password": { "startsWith": "$argon2" } }),
    )
    .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["totalRecords"], 1);

    let res = list_users(
        &server,
        &token,
        json!({ "email": "victim@example.com", "password": { "startsWith": "not-a-hash" } }),
    )
    .await?;
    assert_eq!(res.body["totalRecords"], 1);
    assert!(res.body["records"][0].get("password").is_none());

    let res = list_users(&server, &token, json!({ "password": "anything" })).await?;
    assert_eq!(res.body["totalRecords"], 2);
    assert_eq!(res.body["records"][0]["email"], "admin@example.com");
    assert_eq!(res.body["records"][1]["email"], "victim@example.com");
    Ok(())
}
