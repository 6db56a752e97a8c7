mod common;

use common::{TEST_PASSWORD, TEST_USERNAME, TestContext, spawn_app};
use reqwest::StatusCode;
use serde_json::{Value, json};

/// A cookie-keeping client, the way the browser frontend talks to the API.
fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

async fn login(client: &reqwest::Client, address: &str) {
    let response = client
        .post(format!("{}/api/login", address))
        .json(&json!({ "username": TEST_USERNAME, "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();
    let address = spawn_app(ctx.state.clone()).await;

    let response = reqwest::get(format!("{}/health", address))
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let ctx = TestContext::new();
    ctx.seed_user().await;
    let address = spawn_app(ctx.state.clone()).await;
    let client = browser();

    let probe = |client: &reqwest::Client| {
        client
            .get(format!("{}/api/isauthenticated", address))
            .send()
    };

    assert_eq!(
        probe(&client).await.unwrap().status(),
        StatusCode::UNAUTHORIZED
    );

    login(&client, &address).await;
    assert_eq!(probe(&client).await.unwrap().status(), StatusCode::OK);

    let response = client
        .post(format!("{}/api/logout", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        probe(&client).await.unwrap().status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_subscriber_crud_flow() {
    let ctx = TestContext::new();
    ctx.seed_user().await;
    let address = spawn_app(ctx.state.clone()).await;
    let client = browser();
    login(&client, &address).await;
    let base = format!("{}/api/subscriber", address);

    // Create
    let created: Value = client
        .post(&base)
        .json(&json!({ "email": "  reader@example.com ", "name": "Reader" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["email"], "reader@example.com");

    // Fetch
    let fetched: Value = client
        .get(format!("{}/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["data"], created["data"]);

    // Update only `subscribed`
    let updated: Value = client
        .put(format!("{}/{}", base, id))
        .json(&json!({ "subscribed": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["data"]["subscribed"], json!(true));
    assert_eq!(updated["data"]["name"], "Reader");
    assert_eq!(updated["data"]["email"], "reader@example.com");

    // Invalid update
    let response = client
        .put(format!("{}/{}", base, id))
        .json(&json!({ "email": "broken" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // List
    let list: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(list["rows"].as_array().unwrap().len(), 1);

    // Remove
    let removed = client
        .delete(format!("{}/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"][0]["msg"], "Subscriber not found.");
}

#[tokio::test]
async fn test_category_pagination() {
    let mut ctx = TestContext::new();
    ctx.state.config.page_size = 2;
    ctx.seed_user().await;
    let address = spawn_app(ctx.state.clone()).await;
    let client = browser();
    login(&client, &address).await;

    for name in ["news", "guides", "reviews"] {
        let response = client
            .post(format!("{}/api/category", address))
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let names = |body: Value| -> Vec<String> {
        body["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["name"].as_str().unwrap().to_string())
            .collect()
    };

    let all: Value = client
        .get(format!("{}/api/category", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(all), vec!["news", "guides", "reviews"]);

    let page2: Value = client
        .get(format!("{}/api/category?page=2", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(page2), vec!["reviews"]);

    let response = client
        .get(format!("{}/api/category?page=0", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
