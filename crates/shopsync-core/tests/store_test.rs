//! Category store, end to end against a mock backend.

use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopsync_api::{Anonymous, Category};
use shopsync_core::{Storefront, StorefrontConfig};

async fn setup() -> (MockServer, Storefront<Anonymous>) {
    let server = MockServer::start().await;
    let config = StorefrontConfig::new(server.uri());
    let storefront = Storefront::new(&config, Anonymous).expect("client should build");
    (server, storefront)
}

fn category_json(name: &str, slug: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "name": name,
        "slug": slug,
        "productCount": 3,
    })
}

#[tokio::test]
async fn test_refresh_populates_categories() {
    let (server, storefront) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": [category_json("Sneakers", "sneakers"), category_json("Boots", "boots")],
            "count": 2,
        })))
        .expect(1)
        .mount(&server)
        .await;

    storefront.refresh_categories().await;

    let state = storefront.categories();
    assert_eq!(state.items.len(), 2);
    assert_eq!(state.count, 2);
    assert_eq!(state.items[0].name, "Sneakers");
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_backend_failure_empties_the_store_and_sets_the_message() {
    let (server, storefront) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": [category_json("Sneakers", "sneakers")],
            "count": 1,
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "message": "Network Error", "code": "ERR_UPSTREAM" })),
        )
        .mount(&server)
        .await;

    storefront.refresh_categories().await;
    assert_eq!(storefront.categories().count, 1);

    storefront.refresh_categories().await;
    let state = storefront.categories();
    assert!(state.items.is_empty());
    assert_eq!(state.count, 0);
    assert_eq!(state.error.as_deref(), Some("Network Error"));
}

#[tokio::test]
async fn test_error_without_message_falls_back_to_a_generic_one() {
    let (server, storefront) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(500).set_body_string(""))
        .mount(&server)
        .await;

    storefront.refresh_categories().await;

    // The status line stands in when the backend sends no message.
    let state = storefront.categories();
    assert_eq!(state.error.as_deref(), Some("500 Internal Server Error"));
}

#[tokio::test]
async fn test_clear_error_keeps_the_rest_of_the_state() {
    let (server, storefront) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;

    storefront.refresh_categories().await;
    assert!(storefront.categories().error.is_some());

    storefront.clear_category_error();
    let state = storefront.categories();
    assert!(state.error.is_none());
    assert!(state.items.is_empty());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_set_categories_bypasses_the_network() {
    let (_server, storefront) = setup().await;

    let category = Category {
        id: Uuid::new_v4(),
        name: "Hats".into(),
        slug: "hats".into(),
        image_url: None,
        product_count: None,
    };
    storefront.set_categories(vec![category.clone()]);

    let state = storefront.categories();
    assert_eq!(*state.items, vec![category]);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_subscribers_see_loading_then_data() {
    let (server, storefront) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "categories": [category_json("Sneakers", "sneakers")],
            "count": 1,
        })))
        .mount(&server)
        .await;

    let mut stream = storefront.subscribe_categories();
    let worker = storefront.clone();
    let handle = tokio::spawn(async move { worker.refresh_categories().await });

    let mid = stream.changed().await.expect("store alive");
    assert!(mid.loading);
    assert!(mid.error.is_none());

    let done = stream.changed().await.expect("store alive");
    assert!(!done.loading);
    assert_eq!(done.count, 1);

    handle.await.expect("refresh task");
}
