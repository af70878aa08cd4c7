mod common;

use common::{add_address, register_and_login, spawn_app};
use reqwest::StatusCode;
use serde_json::Value;

async fn list_addresses(app: &common::TestApp, token: &str) -> Vec<Value> {
    let response = app
        .client
        .get(app.url("/user/address"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to list addresses");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.json::<Value>().await.expect("Bad address body");
    body["data"].as_array().expect("Data not an array").clone()
}

async fn default_address_of(app: &common::TestApp, token: &str) -> Value {
    let response = app
        .client
        .get(app.url("/user/profile"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to fetch profile");
    let body = response.json::<Value>().await.expect("Bad profile body");
    body["data"]["default_address"].clone()
}

#[tokio::test]
async fn new_default_clears_previous_default() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "alice@example.com", "Secret15").await;

    let first = add_address(&app, &token, "Home", true).await;
    assert_eq!(default_address_of(&app, &token).await, first);

    let second = add_address(&app, &token, "Work", true).await;
    assert_eq!(default_address_of(&app, &token).await, second);

    let addresses = list_addresses(&app, &token).await;
    assert_eq!(addresses.len(), 2);
    for address in &addresses {
        let should_be_default = address["aid"] == second.as_str();
        assert_eq!(address["is_default"].as_bool(), Some(should_be_default));
    }
}

#[tokio::test]
async fn non_default_address_leaves_default_alone() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "bob", "bob@example.com", "Secret15").await;

    let first = add_address(&app, &token, "Home", true).await;
    add_address(&app, &token, "Work", false).await;

    assert_eq!(default_address_of(&app, &token).await, first);
}

#[tokio::test]
async fn edit_address_can_take_over_default() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "carol", "carol@example.com", "Secret15").await;

    add_address(&app, &token, "Home", true).await;
    let second = add_address(&app, &token, "Work", false).await;

    let response = app
        .client
        .put(app.url(&format!("/user/address/{second}")))
        .query(&[("is_default", true)])
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "name": "Office",
            "phone": "0987654321",
            "address": "Office street",
        }))
        .send()
        .await
        .expect("Failed to edit address");
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(default_address_of(&app, &token).await, second);
    let addresses = list_addresses(&app, &token).await;
    let edited = addresses
        .iter()
        .find(|a| a["aid"] == second.as_str())
        .expect("Edited address missing");
    assert_eq!(edited["name"], "Office");
    assert_eq!(edited["is_default"], true);
}

#[tokio::test]
async fn deleting_default_clears_user_reference() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "dave", "dave@example.com", "Secret15").await;

    let aid = add_address(&app, &token, "Home", true).await;

    let response = app
        .client
        .delete(app.url(&format!("/user/address/{aid}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to delete address");
    assert_eq!(response.status(), StatusCode::OK);

    assert!(default_address_of(&app, &token).await.is_null());
    assert!(list_addresses(&app, &token).await.is_empty());

    // Deleting it again is a 404.
    let response = app
        .client
        .delete(app.url(&format!("/user/address/{aid}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send delete request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn addresses_are_scoped_to_their_owner() {
    let app = spawn_app().await;
    let owner = register_and_login(&app, "erin", "erin@example.com", "Secret15").await;
    let other = register_and_login(&app, "frank", "frank@example.com", "Secret15").await;

    let aid = add_address(&app, &owner, "Home", false).await;

    let response = app
        .client
        .get(app.url(&format!("/user/address/{aid}")))
        .bearer_auth(&other)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .client
        .get(app.url(&format!("/user/address/{aid}")))
        .bearer_auth(&owner)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.json::<Value>().await.expect("Bad address body");
    assert_eq!(body["data"]["name"], "Home");
}
