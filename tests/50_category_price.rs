mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn item_names(items: &Value) -> Vec<String> {
    items
        .as_array()
        .map(|a| a.iter().filter_map(|i| i["name"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn color_size() -> Value {
    json!([
        { "field": "Color", "values": ["Red", "Blue"] },
        { "field": "Size", "values": ["S", "M"] }
    ])
}

#[tokio::test]
async fn generate_previews_the_cross_product_in_field_order() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;
    let category_id = server.category(&token, "Shirts", &["Color", "Size"]).await?;

    let res = server
        .post(
            "/category-price/generate",
            Some(&token),
            json!({ "categoryId": category_id, "fieldValues": color_size() }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(item_names(&res.body["records"]), vec!["Red, S", "Red, M", "Blue, S", "Blue, M"]);
    assert_eq!(res.body["records"][0]["taxRate"], 18.0);
    assert_eq!(res.body["records"][0]["taxCode"], "HSN44");

    // nothing was stored
    let list = server.post("/category-price/get/all", Some(&token), json!({})).await?;
    assert_eq!(list.body["totalRecords"], 0);
    Ok(())
}

#[tokio::test]
async fn one_active_price_list_per_category() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;
    let category_id = server.category(&token, "Shirts", &["Color", "Size"]).await?;
    let body = json!({ "categoryId": category_id, "fieldValues": color_size() });

    let first = server.post("/category-price/create", Some(&token), body.clone()).await?;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["record"]["categoryName"], "Shirts");
    assert_eq!(item_names(&first.body["record"]["items"]).len(), 4);

    let second = server.post("/category-price/create", Some(&token), body).await?;
    assert_eq!(second.status, StatusCode::FORBIDDEN);

    let options = server.get("/category-price/options", Some(&token)).await?;
    assert_eq!(options.body["records"][0]["label"], "Shirts");
    Ok(())
}

#[tokio::test]
async fn update_keeps_prices_of_surviving_items() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;
    let category_id = server.category(&token, "Shirts", &["Color", "Size"]).await?;

    let created = server
        .post(
            "/category-price/create",
            Some(&token),
            json!({
                "categoryId": category_id,
                "fieldValues": [
                    { "field": "Color", "values": ["Red"] },
                    { "field": "Size", "values": ["S"] }
                ],
                "items": [{ "name": "Red, S", "taxRate": 18, "taxCode": "HSN44", "purchasePrice": 120 }]
            }),
        )
        .await?;
    let id = created.body["record"]["id"].as_str().unwrap_or_default().to_string();

    let updated = server
        .post(
            "/category-price/update",
            Some(&token),
            json!({ "id": id, "fieldValues": color_size() }),
        )
        .await?;
    assert_eq!(updated.status, StatusCode::OK);
    let items = &updated.body["record"]["items"];
    assert_eq!(item_names(items), vec!["Red, S", "Red, M", "Blue, S", "Blue, M"]);
    assert_eq!(items[0]["purchasePrice"], 120.0);
    assert_eq!(items[1]["purchasePrice"], 0.0);
    Ok(())
}

#[tokio::test]
async fn items_are_created_from_the_active_price_list() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;
    let category_id = server.category(&token, "Shirts", &["Color", "Size"]).await?;
    let price = server
        .post(
            "/category-price/create",
            Some(&token),
            json!({ "categoryId": category_id, "fieldValues": color_size() }),
        )
        .await?;
    assert_eq!(price.status, StatusCode::OK);

    let request = json!({
        "categoryId": category_id,
        "fieldValues": [
            { "field": "Size", "values": ["M"] },
            { "field": "Color", "values": ["Red", "Blue"] }
        ]
    });
    let res = server.post("/category-item/create", Some(&token), request.clone()).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["record"]["succeeded"], 2);
    let mut created: Vec<String> = res.body["records"]
        .as_array()
        .map(|a| a.iter().filter_map(|r| r["itemName"].as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    created.sort();
    assert_eq!(created, vec!["Blue, M", "Red, M"]);
    assert_eq!(res.body["records"][0]["categoryName"], "Shirts");

    let again = server.post("/category-item/create", Some(&token), request).await?;
    assert_eq!(again.status, StatusCode::FORBIDDEN);

    // the price list is now referenced by active items
    let price_id = price.body["record"]["id"].as_str().unwrap_or_default().to_string();
    let toggle = server
        .post(&format!("/category-price/toggle/status?id={}", price_id), Some(&token), json!({}))
        .await?;
    assert_eq!(toggle.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn veneer_sizes_get_sequential_codes() -> Result<()> {
    let server = common::spawn().await?;
    let token = server.token().await?;
    let category_id = server.category(&token, "Veneer", &[]).await?;

    let a = server
        .post(
            "/veneer-size/create",
            Some(&token),
            json!({ "height": 8, "width": 4, "categoryId": category_id }),
        )
        .await?;
    assert_eq!(a.status, StatusCode::OK);
    assert_eq!(a.body["record"]["code"], "V001");
    assert_eq!(a.body["record"]["categoryName"], "Veneer");

    let dup = server
        .post(
            "/veneer-size/create",
            Some(&token),
            json!({ "height": 8.0, "width": 4.0, "categoryId": category_id }),
        )
        .await?;
    assert_eq!(dup.status, StatusCode::FORBIDDEN);

    let b = server
        .post(
            "/veneer-size/create",
            Some(&token),
            json!({ "height": 7, "width": 3, "categoryId": category_id }),
        )
        .await?;
    assert_eq!(b.body["record"]["code"], "V002");

    let options = server.get("/veneer-size/options", Some(&token)).await?;
    let labels: Vec<&str> = options.body["records"]
        .as_array()
        .map(|a| a.iter().filter_map(|o| o["label"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(labels, vec!["7x3", "8x4"]);
    Ok(())
}
