mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn names(body: &Value) -> Vec<String> {
    body["records"]
        .as_array()
        .map(|a| a.iter().filter_map(|r| r["name"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

async fn seeded() -> Result<(common::TestServer, String)> {
    let server = common::spawn().await?;
    let token = server.token().await?;
    for name in ["Ash", "Birch", "Cedar", "Deodar", "Elm"] {
        let res = server.post("/user-type/create", Some(&token), json!({ "name": name })).await?;
        anyhow::ensure!(res.status == StatusCode::OK, "seed failed: {}", res.body);
    }
    Ok((server, token))
}

#[tokio::test]
async fn pages_skip_and_limit() -> Result<()> {
    let (server, token) = seeded().await?;

    let res = server
        .post(
            "/user-type/get/all",
            Some(&token),
            json!({ "sortBy": "name", "order": "asc", "page": 2, "pageSize": 2 }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["totalRecords"], 5);
    assert_eq!(names(&res.body), vec!["Cedar", "Deodar"]);

    let last = server
        .post(
            "/user-type/get/all",
            Some(&token),
            json!({ "sortBy": "name", "order": "desc", "page": "3", "pageSize": "2" }),
        )
        .await?;
    assert_eq!(names(&last.body), vec!["Ash"]);
    Ok(())
}

#[tokio::test]
async fn default_order_is_creation_order() -> Result<()> {
    let (server, token) = seeded().await?;
    let res = server.post("/user-type/get/all", Some(&token), json!({})).await?;
    assert_eq!(names(&res.body), vec!["Ash", "Birch", "Cedar", "Deodar", "Elm"]);
    Ok(())
}

#[tokio::test]
async fn filters_combine_with_the_active_scope() -> Result<()> {
    let (server, token) = seeded().await?;

    let res = server
        .post(
            "/user-type/get/all",
            Some(&token),
            json!({ "filter": { "name": { "contains": "d" } }, "sortBy": "name" }),
        )
        .await?;
    assert_eq!(names(&res.body), vec!["Cedar", "Deodar"]);
    assert_eq!(res.body["totalRecords"], 2);

    let res = server
        .post(
            "/user-type/get/all",
            Some(&token),
            json!({ "filter": { "name": { "in": ["Ash", "Elm"] } }, "sortBy": "name" }),
        )
        .await?;
    assert_eq!(names(&res.body), vec!["Ash", "Elm"]);

    // isActive in the client filter cannot widen the scope
    let options = server.get("/user-type/options", Some(&token)).await?;
    let ash = options.body["records"][0]["value"].as_str().unwrap_or_default().to_string();
    server
        .post(&format!("/user-type/toggle/status?id={}", ash), Some(&token), json!({}))
        .await?;
    let res = server
        .post(
            "/user-type/get/all",
            Some(&token),
            json!({ "filter": { "isActive": false } }),
        )
        .await?;
    assert_eq!(res.body["totalRecords"], 0);
    Ok(())
}

#[tokio::test]
async fn malformed_filters_are_400() -> Result<()> {
    let (server, token) = seeded().await?;
    let res = server
        .post("/user-type/get/all", Some(&token), json!({ "filter": ["not", "an", "object"] }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}
