#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopsync_api::{
    Anonymous, ApiClient, Error, SalesPeriod, StaticTokenProvider, TokenProvider, TopSellersQuery,
    TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup<P: TokenProvider>(tokens: P) -> (MockServer, ApiClient<P>) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&server.uri(), &TransportConfig::default(), tokens).unwrap();
    (server, client)
}

fn static_token(token: &str) -> StaticTokenProvider {
    StaticTokenProvider::new(SecretString::from(token.to_owned()))
}

fn categories_body() -> serde_json::Value {
    json!({
        "categories": [
            {
                "id": "7e6cb1f0-5c1a-4b6e-9f37-2f8a01d1e9aa",
                "name": "Sneakers",
                "slug": "sneakers"
            },
            {
                "id": "0b9a3c44-11d2-4f5e-8a6b-90c1d2e3f4a5",
                "name": "Outerwear",
                "slug": "outerwear",
                "imageUrl": "https://cdn.example.com/outerwear.jpg",
                "productCount": 42
            }
        ],
        "count": 2
    })
}

// ── Credential attachment ───────────────────────────────────────────

#[tokio::test]
async fn test_stored_credential_is_sent_as_bearer_header() {
    let (server, client) = setup(static_token("tok-123")).await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(categories_body()))
        .expect(1)
        .mount(&server)
        .await;

    client.list_categories().await.unwrap();
}

#[tokio::test]
async fn test_missing_credential_sends_no_auth_header() {
    let (server, client) = setup(Anonymous).await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(categories_body()))
        .mount(&server)
        .await;

    client.list_categories().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        !requests[0].headers.contains_key("authorization"),
        "unauthenticated request must not carry an Authorization header"
    );
}

#[tokio::test]
async fn test_requests_are_json_content_type() {
    let (server, client) = setup(Anonymous).await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(categories_body()))
        .expect(1)
        .mount(&server)
        .await;

    client.list_categories().await.unwrap();
}

// ── Category resource ───────────────────────────────────────────────

#[tokio::test]
async fn test_list_categories_success() {
    let (server, client) = setup(static_token("tok-123")).await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(categories_body()))
        .mount(&server)
        .await;

    let resp = client.list_categories().await.unwrap();

    assert_eq!(resp.count, 2);
    assert_eq!(resp.categories.len(), 2);
    assert_eq!(resp.categories[0].name, "Sneakers");
    assert_eq!(resp.categories[1].product_count, Some(42));
}

#[tokio::test]
async fn test_list_categories_defaults_when_fields_omitted() {
    let (server, client) = setup(Anonymous).await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let resp = client.list_categories().await.unwrap();

    assert!(resp.categories.is_empty());
    assert_eq!(resp.count, 0);
}

// ── Top sellers ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_top_sellers_sends_query_params() {
    let (server, client) = setup(static_token("tok-123")).await;

    Mock::given(method("GET"))
        .and(path("/v1/products/top-sellers"))
        .and(query_param("period", "month"))
        .and(query_param("limit", "5"))
        .and(query_param("category", "sneakers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{
                "id": "3f1c2d4e-5a6b-4c7d-8e9f-0a1b2c3d4e5f",
                "name": "Trail Runner",
                "priceCents": 12900,
                "unitsSold": 812
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = TopSellersQuery {
        period: SalesPeriod::Month,
        limit: 5,
        category: Some("sneakers".into()),
    };
    let resp = client.top_sellers(&query).await.unwrap();

    assert_eq!(resp.products.len(), 1);
    assert_eq!(resp.products[0].price_cents, 12900);
}

// ── Error propagation ───────────────────────────────────────────────

#[tokio::test]
async fn test_structured_error_body_is_surfaced() {
    let (server, client) = setup(Anonymous).await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Network Error",
            "code": "ERR_UPSTREAM"
        })))
        .mount(&server)
        .await;

    let err = client.list_categories().await.unwrap_err();

    match err {
        Error::Api {
            message,
            code,
            status,
        } => {
            assert_eq!(message, "Network Error");
            assert_eq!(code.as_deref(), Some("ERR_UPSTREAM"));
            assert_eq!(status, 500);
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_message_falls_back_to_status_text() {
    let (server, client) = setup(Anonymous).await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = client.list_categories().await.unwrap_err();

    match err {
        Error::Api {
            message, status, ..
        } => {
            assert_eq!(status, 503);
            assert!(!message.is_empty());
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_dedicated_variant() {
    let (server, client) = setup(static_token("expired")).await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list_categories().await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized), "got: {err:?}");
}

#[tokio::test]
async fn test_malformed_body_reports_deserialization_error() {
    let (server, client) = setup(Anonymous).await;

    Mock::given(method("GET"))
        .and(path("/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.list_categories().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got: {err:?}");
}
