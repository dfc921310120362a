//! # Backend Client
//!
//! Authenticated HTTP calls against the fashion backend.
//!
//! Every authenticated request carries `Authorization: Bearer <access>`.
//! A 401 triggers exactly one refresh-and-retry cycle; the second response
//! is final whatever it is.
//!
//! ```text
//! request ──► 2xx ─────────────────────────────► Ok
//!    │
//!    ├──► 401 ──► refresh ──► retry ──► 2xx ───► Ok
//!    │              │           └────► other ──► ApiError::Api
//!    │              └─ fails ──────────────────► ApiError::Auth (tokens cleared)
//!    └──► other ───────────────────────────────► ApiError::Api
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::tokens::TokenStore;
use super::types::{
    AdvancedSearch, ChatRequest, ChatResponse, ConversationListResponse, Credentials,
    DeleteResponse, ErrorBody, PreferencesResponse, ProductSearchParams, ProductSearchResponse,
    RefreshRequest, RefreshResponse, RemoteConversation, TokenPair, TrendingParams,
    TrendingResponse,
};
use crate::core::backend::{ChatBackend, ChatExchange};
use crate::core::conversation::ConversationId;
use crate::core::storage::Storage;

/// Method, query string and optional JSON body of an authenticated call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

/// Snapshot for the title bar and debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientStatus {
    pub authenticated: bool,
    pub has_refresh_token: bool,
    pub base_url: String,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    /// Build a client against `base_url`, restoring any tokens from `storage`.
    pub fn new(base_url: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            tokens: TokenStore::load(storage),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }

    pub fn status(&self) -> ClientStatus {
        ClientStatus {
            authenticated: self.tokens.is_authenticated(),
            has_refresh_token: self.tokens.refresh().is_some(),
            base_url: self.base_url.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Exchange credentials for a token pair and persist it.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        debug!("POST /api/token/ for '{}'", username);
        let response = self
            .http
            .post(self.url("/api/token/"))
            .json(&Credentials { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
                let detail = read_detail(response)
                    .await
                    .unwrap_or_else(|| "Authentication failed".to_string());
                warn!("Authentication rejected: {}", detail);
                return Err(ApiError::Auth(detail));
            }
            let detail = read_detail(response)
                .await
                .unwrap_or_else(|| format!("API Error: {}", status.as_u16()));
            warn!("Token endpoint failed ({}): {}", status, detail);
            return Err(ApiError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let pair: TokenPair = response.json().await?;
        self.tokens.save(&pair.access, &pair.refresh);
        info!("Authenticated as '{}'", username);
        Ok(pair)
    }

    /// Trade the stored refresh token for a new access token.
    /// Clears all tokens when there is no refresh token or the server rejects it.
    pub async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let Some(refresh) = self.tokens.refresh() else {
            self.tokens.clear();
            return Err(ApiError::Auth("No refresh token available".to_string()));
        };

        debug!("POST /api/token/refresh/");
        let response = self
            .http
            .post(self.url("/api/token/refresh/"))
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Token refresh rejected (HTTP {})", response.status().as_u16());
            self.tokens.clear();
            return Err(ApiError::Auth("Token refresh failed".to_string()));
        }

        let RefreshResponse { access } = response.json().await?;
        self.tokens.set_access(&access);
        info!("Access token refreshed");
        Ok(access)
    }

    pub fn logout(&self) {
        info!("Logging out");
        self.tokens.clear();
    }

    // ------------------------------------------------------------------
    // Authenticated transport
    // ------------------------------------------------------------------

    /// Send an authenticated request, refreshing the access token once on 401.
    pub async fn request(&self, path: &str, options: &RequestOptions) -> Result<Response, ApiError> {
        let mut access = self
            .tokens
            .access()
            .ok_or_else(|| ApiError::Auth("Please login first".to_string()))?;
        let mut refreshed = false;

        loop {
            debug!("{} {}", options.method, path);
            let mut builder = self
                .http
                .request(options.method.clone(), self.url(path))
                .bearer_auth(&access);
            if !options.query.is_empty() {
                builder = builder.query(&options.query);
            }
            if let Some(body) = &options.body {
                builder = builder.json(body);
            }
            let response = builder.send().await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !refreshed {
                info!("Access token rejected on {}, refreshing", path);
                access = self.refresh_access_token().await?;
                refreshed = true;
                continue;
            }

            if !status.is_success() {
                let detail = read_detail(response)
                    .await
                    .unwrap_or_else(|| format!("API Error: {}", status.as_u16()));
                warn!("{} {} failed (HTTP {}): {}", options.method, path, status.as_u16(), detail);
                return Err(ApiError::Api {
                    status: status.as_u16(),
                    detail,
                });
            }

            return Ok(response);
        }
    }

    async fn json<T: DeserializeOwned>(&self, path: &str, options: &RequestOptions) -> Result<T, ApiError> {
        let response = self.request(path, options).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    // ------------------------------------------------------------------
    // Endpoints
    // ------------------------------------------------------------------

    /// Post a chat message; `None` starts a new conversation on the backend.
    pub async fn send_chat_message(
        &self,
        text: &str,
        conversation_id: Option<&ConversationId>,
    ) -> Result<ChatExchange, ApiError> {
        let body = to_body(&ChatRequest {
            text,
            conversation_id: conversation_id.map(ConversationId::as_str),
        })?;
        let response: ChatResponse = self.json("/api/chat/", &RequestOptions::post(body)).await?;
        debug!(
            "Chat response for conversation {} ({} products)",
            response.conversation_id,
            response.products.len()
        );
        Ok(response.into())
    }

    pub async fn search_products(&self, params: &ProductSearchParams) -> Result<ProductSearchResponse, ApiError> {
        let options = RequestOptions::get().with_query(params.to_query());
        let response: ProductSearchResponse = self.json("/api/products/search/", &options).await?;
        info!("Product search matched {} items", response.total_count);
        Ok(response)
    }

    pub async fn advanced_product_search(&self, search: &AdvancedSearch) -> Result<ProductSearchResponse, ApiError> {
        let options = RequestOptions::post(to_body(search)?);
        self.json("/api/products/search/", &options).await
    }

    pub async fn trending_products(&self, params: &TrendingParams) -> Result<TrendingResponse, ApiError> {
        let options = RequestOptions::get().with_query(params.to_query());
        self.json("/api/products/trending/", &options).await
    }

    pub async fn user_preferences(&self) -> Result<PreferencesResponse, ApiError> {
        self.json("/api/user/preferences/", &RequestOptions::get()).await
    }

    pub async fn update_user_preferences(
        &self,
        preferences: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        self.json("/api/user/preferences/", &RequestOptions::post(preferences.clone()))
            .await
    }

    pub async fn conversation_history(&self) -> Result<ConversationListResponse, ApiError> {
        self.json("/api/conversations/", &RequestOptions::get()).await
    }

    pub async fn conversation_details(&self, id: &ConversationId) -> Result<RemoteConversation, ApiError> {
        self.json(&format!("/api/conversations/{id}/"), &RequestOptions::get())
            .await
    }

    pub async fn delete_conversation(&self, id: &ConversationId) -> Result<DeleteResponse, ApiError> {
        self.json(&format!("/api/conversations/{id}/"), &RequestOptions::delete())
            .await
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn send_chat_message(
        &self,
        text: &str,
        conversation_id: Option<&ConversationId>,
    ) -> Result<ChatExchange, ApiError> {
        ApiClient::send_chat_message(self, text, conversation_id).await
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Best-effort extraction of the server's error message.
async fn read_detail(response: Response) -> Option<String> {
    let text = response.text().await.ok()?;
    serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(ErrorBody::into_detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStorage;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8000/", Arc::new(MemoryStorage::new()));
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/api/chat/"), "http://localhost:8000/api/chat/");
    }

    #[test]
    fn test_status_reflects_tokens() {
        let client = ApiClient::new("http://localhost:8000", Arc::new(MemoryStorage::new()));
        assert_eq!(
            client.status(),
            ClientStatus {
                authenticated: false,
                has_refresh_token: false,
                base_url: "http://localhost:8000".to_string(),
            }
        );
        client.tokens.save("a", "r");
        assert!(client.status().authenticated);
        client.logout();
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_request_without_token_is_auth_error() {
        let client = ApiClient::new("http://127.0.0.1:9", Arc::new(MemoryStorage::new()));
        let result = client.request("/api/conversations/", &RequestOptions::get()).await;
        assert_eq!(result.err(), Some(ApiError::Auth("Please login first".to_string())));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_clears_tokens() {
        let client = ApiClient::new("http://127.0.0.1:9", Arc::new(MemoryStorage::new()));
        client.tokens.set_access("stale");
        let result = client.refresh_access_token().await;
        assert!(matches!(result, Err(ApiError::Auth(_))));
        assert!(!client.is_authenticated());
    }
}
