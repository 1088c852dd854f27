mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn create_trims_and_rejects_duplicates() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;

    let res = server
        .post("/category/create", Some(&token), json!({ "name": "  Laminates ", "taxRate": 18 }))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["record"]["name"], "Laminates");

    let dup = server
        .post("/category/create", Some(&token), json!({ "name": "laminates" }))
        .await?;
    assert_eq!(dup.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn invalid_bodies_are_400() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;

    let res = server
        .post("/category/create", Some(&token), json!({ "name": "Tax", "taxRate": 250 }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Tax rate must be between 0 and 100");

    let res = server.post("/category/create", Some(&token), json!({ "taxRate": 5 })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn toggle_is_blocked_while_a_price_references_it() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;
    let category_id = server.category(&token, "Doors", &["Color"]).await?;

    let price = server
        .post(
            "/category-price/create",
            Some(&token),
            json!({
                "categoryId": category_id,
                "fieldValues": [{ "field": "Color", "values": ["Red"] }]
            }),
        )
        .await?;
    assert_eq!(price.status, StatusCode::OK);

    let toggle = server
        .post(&format!("/category/toggle/status?id={}", category_id), Some(&token), json!({}))
        .await?;
    assert_eq!(toggle.status, StatusCode::BAD_REQUEST);

    let fetched = server.get(&format!("/category?id={}", category_id), Some(&token)).await?;
    assert_eq!(fetched.body["record"]["isActive"], true);

    // once the price list is gone the category can be deactivated
    let price_id = price.body["record"]["id"].as_str().unwrap_or_default().to_string();
    server
        .post(&format!("/category-price/toggle/status?id={}", price_id), Some(&token), json!({}))
        .await?;
    let toggle = server
        .post(&format!("/category/toggle/status?id={}", category_id), Some(&token), json!({}))
        .await?;
    assert_eq!(toggle.status, StatusCode::OK);
    assert_eq!(toggle.body["record"]["isActive"], false);
    Ok(())
}

#[tokio::test]
async fn update_is_partial() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;
    let id = server.category(&token, "Panels", &["Thickness"]).await?;

    let res = server
        .post("/category/update", Some(&token), json!({ "id": id, "discount": 5, "isActive": false }))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    let record = &res.body["record"];
    assert_eq!(record["name"], "Panels");
    assert_eq!(record["discount"], 5.0);
    assert_eq!(record["taxCode"], "HSN44");
    assert_eq!(record["isActive"], true);
    Ok(())
}
