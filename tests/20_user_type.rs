mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn names_are_unique_case_insensitively() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;

    let first = server.post("/user-type/create", Some(&token), json!({ "name": "Admin" })).await?;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["record"]["isActive"], true);

    let second = server.post("/user-type/create", Some(&token), json!({ "name": "ADMIN" })).await?;
    assert_eq!(second.status, StatusCode::FORBIDDEN);
    assert_eq!(second.body["isSuccess"], false);
    assert_eq!(second.body["message"], "User type already exists");
    Ok(())
}

#[tokio::test]
async fn toggled_off_records_leave_listings_and_free_the_name() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;

    let created = server.post("/user-type/create", Some(&token), json!({ "name": "Staff" })).await?;
    let id = created.body["record"]["id"].as_str().unwrap_or_default().to_string();

    let toggled = server
        .post(&format!("/user-type/toggle/status?id={}", id), Some(&token), json!({}))
        .await?;
    assert_eq!(toggled.status, StatusCode::OK);
    assert_eq!(toggled.body["record"]["isActive"], false);

    let list = server.post("/user-type/get/all", Some(&token), json!({})).await?;
    assert_eq!(list.body["totalRecords"], 0);

    // still fetchable by id
    let fetched = server.get(&format!("/user-type?id={}", id), Some(&token)).await?;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["record"]["name"], "Staff");

    let again = server.post("/user-type/create", Some(&token), json!({ "name": "staff" })).await?;
    assert_eq!(again.status, StatusCode::OK);

    // restoring the original would now collide
    let restore = server
        .post(&format!("/user-type/toggle/status?id={}", id), Some(&token), json!({}))
        .await?;
    assert_eq!(restore.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn update_and_options() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;

    for name in ["beta", "Alpha"] {
        server.post("/user-type/create", Some(&token), json!({ "name": name })).await?;
    }
    let options = server.get("/user-type/options", Some(&token)).await?;
    let labels: Vec<&str> = options.body["records"]
        .as_array()
        .map(|a| a.iter().filter_map(|o| o["label"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(labels, vec!["Alpha", "beta"]);

    let id = options.body["records"][0]["value"].as_str().unwrap_or_default().to_string();
    let updated = server
        .post("/user-type/update", Some(&token), json!({ "id": id, "name": "Alpha Prime" }))
        .await?;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["record"]["name"], "Alpha Prime");

    let clash = server
        .post("/user-type/update", Some(&token), json!({ "id": id, "name": "BETA" }))
        .await?;
    assert_eq!(clash.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn bad_ids_are_400() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;

    let missing = server.get("/user-type", Some(&token)).await?;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let unknown = server
        .get("/user-type?id=0190a5a0-0000-7000-8000-000000000000", Some(&token))
        .await?;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.body["message"], "User type not found");
    Ok(())
}
