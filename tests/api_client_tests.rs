use std::sync::Arc;

use modista::api::types::{AdvancedSearch, PriceRange, ProductSearchParams, SortBy, TrendingParams};
use modista::api::{ApiClient, ApiError};
use modista::core::conversation::{ConversationId, Sender};
use modista::core::storage::{ACCESS_TOKEN_KEY, MemoryStorage, REFRESH_TOKEN_KEY, Storage, save_raw};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

// ============================================================================
// Helper Functions
// ============================================================================

/// A client pointed at `server` whose storage already holds a token pair.
fn logged_in_client(server: &MockServer) -> (ApiClient, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    save_raw(storage.as_ref(), ACCESS_TOKEN_KEY, "old-access");
    save_raw(storage.as_ref(), REFRESH_TOKEN_KEY, "refresh-1");
    let client = ApiClient::new(server.uri(), storage.clone());
    (client, storage)
}

fn chat_body(conversation_id: i64) -> serde_json::Value {
    json!({
        "conversation_id": conversation_id,
        "user_message": {"id": 10, "text": "wide leg jeans?", "timestamp": "2024-05-01T10:00:00Z"},
        "ai_message": {"id": 11, "text": "Here are three picks", "timestamp": "2024-05-01T10:00:02Z"},
        "products": [
            {"id": 3, "name": "Wide Leg Jean", "brand": "Acme", "category": "Jeans",
             "department": "Women", "retail_price": "59.00", "sku": "AC-3"}
        ],
        "user_context": {"favorite_brand": "Acme"}
    })
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_authenticate_persists_token_pair() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .and(body_json(json!({"username": "ada", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "a-1", "refresh": "r-1"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let client = ApiClient::new(mock_server.uri(), storage.clone());
    assert!(!client.is_authenticated());

    let pair = client.authenticate("ada", "pw").await.unwrap();
    assert_eq!(pair.access, "a-1");
    assert!(client.is_authenticated());
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("a-1"));
    assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r-1"));

    // A fresh client over the same storage picks the session back up
    let restored = ApiClient::new(mock_server.uri(), storage);
    assert!(restored.status().has_refresh_token);
}

#[tokio::test]
async fn test_authenticate_rejected_reports_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"detail": "No active account found with the given credentials"}),
        ))
        .mount(&mock_server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let client = ApiClient::new(mock_server.uri(), storage.clone());

    let err = client.authenticate("ada", "wrong").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Auth("No active account found with the given credentials".to_string())
    );
    assert!(!client.is_authenticated());
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_authenticate_without_detail_uses_generic_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let client = ApiClient::new(mock_server.uri(), storage);
    let err = client.authenticate("ada", "pw").await.unwrap_err();
    assert_eq!(err, ApiError::Auth("Authentication failed".to_string()));
}

#[tokio::test]
async fn test_authenticate_server_error_is_not_an_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let client = ApiClient::new(mock_server.uri(), storage);
    let err = client.authenticate("ada", "pw").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Api {
            status: 502,
            detail: "API Error: 502".to_string()
        }
    );
    assert!(!err.is_auth());
}

#[tokio::test]
async fn test_logout_clears_tokens() {
    let mock_server = MockServer::start().await;
    let (client, storage) = logged_in_client(&mock_server);

    client.logout();
    assert!(!client.is_authenticated());
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap(), None);
}

// ============================================================================
// Refresh-and-retry
// ============================================================================

#[tokio::test]
async fn test_expired_access_token_is_refreshed_and_request_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat/"))
        .and(header("authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .and(body_json(json!({"refresh": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new-access"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/chat/"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(4)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, storage) = logged_in_client(&mock_server);
    let exchange = client.send_chat_message("wide leg jeans?", None).await.unwrap();

    assert_eq!(exchange.conversation_id, ConversationId::from("4"));
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("new-access"));
    // The refresh token is kept
    assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_second_unauthorized_is_not_retried_again() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token invalid"})))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new-access"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _storage) = logged_in_client(&mock_server);
    let err = client.conversation_history().await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Api {
            status: 401,
            detail: "Token invalid".to_string()
        }
    );
}

#[tokio::test]
async fn test_rejected_refresh_clears_tokens() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user/preferences/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is blacklisted"})))
        .mount(&mock_server)
        .await;

    let (client, storage) = logged_in_client(&mock_server);
    let err = client.user_preferences().await.unwrap_err();

    assert!(err.is_auth());
    assert_eq!(err.to_string(), "Token refresh failed");
    assert!(!client.is_authenticated());
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap(), None);
}

// ============================================================================
// Error details
// ============================================================================

#[tokio::test]
async fn test_error_detail_fallback_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations/1/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Conversation missing"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/2/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Database down"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/3/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&mock_server)
        .await;

    let (client, _storage) = logged_in_client(&mock_server);

    let detail = |err: ApiError| match err {
        ApiError::Api { status, detail } => (status, detail),
        other => panic!("expected Api error, got {other:?}"),
    };
    assert_eq!(
        detail(client.conversation_details(&ConversationId::from("1")).await.unwrap_err()),
        (404, "Conversation missing".to_string())
    );
    assert_eq!(
        detail(client.conversation_details(&ConversationId::from("2")).await.unwrap_err()),
        (500, "Database down".to_string())
    );
    assert_eq!(
        detail(client.conversation_details(&ConversationId::from("3")).await.unwrap_err()),
        (502, "API Error: 502".to_string())
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let storage = Arc::new(MemoryStorage::new());
    save_raw(storage.as_ref(), ACCESS_TOKEN_KEY, "a");
    // Nothing listens on port 1
    let client = ApiClient::new("http://127.0.0.1:1", storage);

    let err = client.send_chat_message("hi", None).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
}

// ============================================================================
// Endpoints
// ============================================================================

#[tokio::test]
async fn test_send_chat_message_parses_exchange() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat/"))
        .and(body_json(json!({"text": "wide leg jeans?", "conversation_id": "4"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(4)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _storage) = logged_in_client(&mock_server);
    let exchange = client
        .send_chat_message("wide leg jeans?", Some(&ConversationId::from("4")))
        .await
        .unwrap();

    assert_eq!(exchange.user_message.sender, Sender::User);
    assert_eq!(exchange.user_message.id.as_str(), "10");
    assert_eq!(exchange.ai_message.sender, Sender::Assistant);
    assert_eq!(exchange.ai_message.content, "Here are three picks");
    assert_eq!(exchange.ai_message.products.len(), 1);
    assert_eq!(exchange.ai_message.products[0].retail_price, 59.0);
    assert_eq!(exchange.user_context, Some(json!({"favorite_brand": "Acme"})));
}

#[tokio::test]
async fn test_search_products_sends_only_set_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products/search/"))
        .and(query_param("q", "linen shirt"))
        .and(query_param("brand", "Acme"))
        .and(query_param("max_price", "40"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"id": "p-1", "name": "Linen Shirt", "retail_price": 35}],
            "total_count": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _storage) = logged_in_client(&mock_server);
    let params = ProductSearchParams {
        q: Some("linen shirt".to_string()),
        brand: Some("Acme".to_string()),
        category: Some("  ".to_string()),
        max_price: Some(40.0),
        limit: Some(20),
        ..Default::default()
    };
    let response = client.search_products(&params).await.unwrap();

    assert_eq!(response.total_count, 1);
    assert_eq!(response.products[0].id, "p-1");
    assert_eq!(response.products[0].brand, "");
    assert!(response.suggestions.is_empty());

    let requests = mock_server.received_requests().await.unwrap();
    assert!(!requests[0].url.query().unwrap_or_default().contains("category"));
}

#[tokio::test]
async fn test_advanced_search_posts_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/products/search/"))
        .and(body_json(json!({
            "brands": ["Acme"],
            "price_range": {"max": 100.0},
            "sort_by": "price_asc",
            "limit": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": [], "total_count": 0})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _storage) = logged_in_client(&mock_server);
    let search = AdvancedSearch {
        brands: vec!["Acme".to_string()],
        price_range: Some(PriceRange {
            min: None,
            max: Some(100.0),
        }),
        sort_by: Some(SortBy::PriceAsc),
        limit: Some(5),
        ..Default::default()
    };
    let response = client.advanced_product_search(&search).await.unwrap();
    assert_eq!(response.total_count, 0);
}

#[tokio::test]
async fn test_trending_products() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/products/trending/"))
        .and(query_param("category", "Dresses"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trending_products": [{"id": 8, "name": "Slip Dress", "retail_price": "79.99"}],
            "timeframe": "30 days",
            "category": "Dresses",
            "total_trending": 1
        })))
        .mount(&mock_server)
        .await;

    let (client, _storage) = logged_in_client(&mock_server);
    let params = TrendingParams {
        category: Some("Dresses".to_string()),
        timeframe_days: None,
        limit: Some(10),
    };
    let response = client.trending_products(&params).await.unwrap();
    assert_eq!(response.trending_products[0].name, "Slip Dress");
    assert_eq!(response.timeframe, "30 days");
}

#[tokio::test]
async fn test_user_preferences_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user/preferences/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "preferences": {
                "favorite_categories": [{"name": "Jeans", "count": 3}],
                "favorite_brands": [],
                "price_range": {"min": 20.0, "max": 90.0, "avg": 48.5},
                "total_orders": 5,
                "total_spent": 242.5
            },
            "recommendations": []
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/user/preferences/"))
        .and(body_json(json!({"sizes": ["M"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Preferences updated"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _storage) = logged_in_client(&mock_server);
    let response = client.user_preferences().await.unwrap();
    assert_eq!(response.preferences.total_orders, 5);
    assert_eq!(response.preferences.favorite_categories[0].name, "Jeans");
    assert_eq!(response.preferences.price_range.map(|r| r.avg), Some(48.5));

    let updated = client
        .update_user_preferences(&json!({"sizes": ["M"]}))
        .await
        .unwrap();
    assert_eq!(updated["message"], "Preferences updated");
}

#[tokio::test]
async fn test_conversation_history_and_details() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{"id": 21, "title": "Summer wedding outfit", "started_at": "2024-04-30T09:00:00Z"}],
            "total_count": 1
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/conversations/21/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 21,
            "title": "",
            "messages": [
                {"id": 1, "text": "What should I wear to a summer wedding?", "sender": "user", "timestamp": "2024-04-30T09:00:00Z"},
                {"id": 2, "text": "A linen suit works well.", "sender": "ai", "timestamp": "2024-04-30T09:00:03Z"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let (client, _storage) = logged_in_client(&mock_server);
    let list = client.conversation_history().await.unwrap();
    assert_eq!(list.total_count, 1);
    assert_eq!(list.conversations[0].id, "21");

    let details = client
        .conversation_details(&ConversationId::from("21"))
        .await
        .unwrap()
        .into_conversation();
    assert_eq!(details.id, ConversationId::from("21"));
    assert_eq!(details.message_count, 2);
    assert_eq!(details.messages[0].sender, Sender::User);
    assert_eq!(details.messages[1].sender, Sender::Assistant);
    // Blank remote title falls back to the first user message
    assert!(details.title.starts_with("What should I wear"));
}

#[tokio::test]
async fn test_delete_conversation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/conversations/21/"))
        .and(header("authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Conversation deleted"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _storage) = logged_in_client(&mock_server);
    let response = client
        .delete_conversation(&ConversationId::from("21"))
        .await
        .unwrap();
    assert_eq!(response.message.as_deref(), Some("Conversation deleted"));
}
