mod common;

use common::{create_commodity, register_and_login, spawn_app};
use reqwest::StatusCode;
use serde_json::Value;

async fn cart_items(app: &common::TestApp, token: &str) -> Vec<Value> {
    let response = app
        .client
        .get(app.url("/cart/all"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to list cart");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.json::<Value>().await.expect("Bad cart body");
    body["data"].as_array().expect("Data not an array").clone()
}

async fn add(app: &common::TestApp, token: &str, cid: &str) -> reqwest::Response {
    app.client
        .post(app.url(&format!("/cart/add/{cid}")))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send add request")
}

#[tokio::test]
async fn adding_twice_bumps_quantity() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "alice", "alice@example.com", "Secret15").await;
    let cid = create_commodity(&app, &token, "Teapot", 19.99, vec![]).await;

    assert_eq!(add(&app, &token, &cid).await.status(), StatusCode::CREATED);
    assert_eq!(add(&app, &token, &cid).await.status(), StatusCode::CREATED);

    let items = cart_items(&app, &token).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["cid"], cid.as_str());
    assert_eq!(items[0]["name"], "Teapot");
    assert_eq!(items[0]["quantity"], 2);
}

#[tokio::test]
async fn adding_unknown_commodity_is_not_found() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "bob", "bob@example.com", "Secret15").await;

    let response = add(&app, &token, "no-such-commodity").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn removing_decrements_then_deletes() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "carol", "carol@example.com", "Secret15").await;
    let cid = create_commodity(&app, &token, "Mug", 4.5, vec![]).await;

    add(&app, &token, &cid).await;
    add(&app, &token, &cid).await;

    let response = app
        .client
        .delete(app.url(&format!("/cart/remove/{cid}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send remove request");
    assert_eq!(response.status(), StatusCode::OK);
    let items = cart_items(&app, &token).await;
    assert_eq!(items[0]["quantity"], 1);

    // Removing at quantity one drops the row entirely.
    let response = app
        .client
        .delete(app.url(&format!("/cart/remove/{cid}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send remove request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cart_items(&app, &token).await.is_empty());

    // Nothing left to remove.
    let response = app
        .client
        .delete(app.url(&format!("/cart/remove/{cid}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send remove request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn remove_all_skips_the_countdown() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "dave", "dave@example.com", "Secret15").await;
    let cid = create_commodity(&app, &token, "Kettle", 30.0, vec![]).await;

    for _ in 0..3 {
        add(&app, &token, &cid).await;
    }

    let response = app
        .client
        .delete(app.url(&format!("/cart/remove/{cid}")))
        .query(&[("remove_all", true)])
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send remove request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cart_items(&app, &token).await.is_empty());
}

#[tokio::test]
async fn clearing_the_cart_empties_it() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "erin", "erin@example.com", "Secret15").await;
    let first = create_commodity(&app, &token, "Plate", 2.0, vec![]).await;
    let second = create_commodity(&app, &token, "Bowl", 3.0, vec![]).await;

    add(&app, &token, &first).await;
    add(&app, &token, &second).await;
    assert_eq!(cart_items(&app, &token).await.len(), 2);

    let response = app
        .client
        .delete(app.url("/cart/all"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send clear request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cart_items(&app, &token).await.is_empty());
}

#[tokio::test]
async fn carts_are_private_to_each_user() {
    let app = spawn_app().await;
    let admin = register_and_login(&app, "root", "root@example.com", "Secret15").await;
    let other = register_and_login(&app, "frank", "frank@example.com", "Secret15").await;
    let cid = create_commodity(&app, &admin, "Spoon", 1.0, vec![]).await;

    add(&app, &admin, &cid).await;

    assert!(cart_items(&app, &other).await.is_empty());

    // The other user has no such row to remove.
    let response = app
        .client
        .delete(app.url(&format!("/cart/remove/{cid}")))
        .bearer_auth(&other)
        .send()
        .await
        .expect("Failed to send remove request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
