//! Wire types for the fashion backend.
//!
//! The backend serializes primary keys as numbers and decimals as strings,
//! so ids and prices go through lenient deserializers that accept both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::backend::ChatExchange;
use crate::core::conversation::{Conversation, ConversationId, Message, MessageId, Sender, derive_title};

// ============================================================================
// Lenient scalars
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Accepts `17` or `"17"` and yields `"17"`.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => n.to_string(),
        NumberOrString::Float(n) => n.to_string(),
        NumberOrString::Str(s) => s,
    })
}

/// Accepts `49.99` or `"49.99"`.
fn price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => Ok(n as f64),
        NumberOrString::Float(n) => Ok(n),
        NumberOrString::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// Authentication
// ============================================================================

#[derive(Serialize, Debug)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Deserialize, Debug)]
pub(crate) struct RefreshResponse {
    pub access: String,
}

/// Any of the error shapes the backend produces.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ErrorBody {
    pub detail: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_detail(self) -> Option<String> {
        self.detail.or(self.message).or(self.error)
    }
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Serialize, Debug)]
pub(crate) struct ChatRequest<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<&'a str>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WireMessage {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// `"user"` or `"ai"`; absent on the chat endpoint.
    #[serde(default)]
    pub sender: Option<String>,
}

impl WireMessage {
    fn into_message(self, sender: Sender) -> Message {
        Message {
            id: MessageId::from(self.id),
            content: self.text,
            sender,
            timestamp: self.timestamp,
            products: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    #[serde(deserialize_with = "id_string")]
    pub conversation_id: String,
    pub user_message: WireMessage,
    pub ai_message: WireMessage,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub user_context: Option<serde_json::Value>,
}

impl From<ChatResponse> for ChatExchange {
    fn from(response: ChatResponse) -> Self {
        let mut ai_message = response.ai_message.into_message(Sender::Assistant);
        ai_message.products = response.products;
        ChatExchange {
            conversation_id: ConversationId::from(response.conversation_id),
            user_message: response.user_message.into_message(Sender::User),
            ai_message,
            user_context: response.user_context,
        }
    }
}

// ============================================================================
// Products
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub department: String,
    #[serde(deserialize_with = "price")]
    pub retail_price: f64,
    #[serde(default)]
    pub sku: String,
}

/// Query parameters for `GET /api/products/search/`. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductSearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub department: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: Option<u32>,
}

impl ProductSearchParams {
    pub fn query(text: impl Into<String>) -> Self {
        Self {
            q: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push_text(&mut pairs, "q", &self.q);
        push_text(&mut pairs, "category", &self.category);
        push_text(&mut pairs, "brand", &self.brand);
        push_text(&mut pairs, "department", &self.department);
        if let Some(min) = self.min_price {
            pairs.push(("min_price".to_string(), min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price".to_string(), max.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

fn push_text(pairs: &mut Vec<(String, String)>, key: &str, value: &Option<String>) {
    if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        pairs.push((key.to_string(), value.to_string()));
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ProductSearchResponse {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total_count: u64,
    /// Popular categories, sent when nothing matched.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    PriceAsc,
    PriceDesc,
    Name,
    Brand,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Body for `POST /api/products/search/`.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct AdvancedSearch {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub brands: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Query parameters for `GET /api/products/trending/`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendingParams {
    pub category: Option<String>,
    pub timeframe_days: Option<u32>,
    pub limit: Option<u32>,
}

impl TrendingParams {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push_text(&mut pairs, "category", &self.category);
        if let Some(days) = self.timeframe_days {
            pairs.push(("timeframe".to_string(), days.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct TrendingResponse {
    #[serde(default)]
    pub trending_products: Vec<Product>,
    #[serde(default)]
    pub timeframe: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub total_trending: u64,
}

// ============================================================================
// Preferences
// ============================================================================

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct NamedCount {
    pub name: String,
    pub count: u64,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PriceStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Preferences {
    #[serde(default)]
    pub favorite_categories: Vec<NamedCount>,
    #[serde(default)]
    pub favorite_brands: Vec<NamedCount>,
    #[serde(default)]
    pub price_range: Option<PriceStats>,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_spent: f64,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PreferencesResponse {
    /// Set when the user has no order history.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub recommendations: Vec<Product>,
}

// ============================================================================
// Conversation history
// ============================================================================

#[derive(Deserialize, Debug, Clone)]
pub struct RemoteConversation {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

impl RemoteConversation {
    /// Convert into the local conversation record shown in the sidebar.
    pub fn into_conversation(self) -> Conversation {
        let messages: Vec<Message> = self
            .messages
            .into_iter()
            .map(|m| {
                let sender = match m.sender.as_deref() {
                    Some("user") => Sender::User,
                    _ => Sender::Assistant,
                };
                m.into_message(sender)
            })
            .collect();
        let last_updated = messages
            .last()
            .map(|m| m.timestamp)
            .or(self.started_at)
            .unwrap_or_else(Utc::now);
        let title = if self.title.trim().is_empty() {
            derive_title(&messages)
        } else {
            self.title
        };
        Conversation {
            id: ConversationId::from(self.id),
            title,
            message_count: messages.len(),
            messages,
            last_updated,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ConversationListResponse {
    #[serde(default)]
    pub conversations: Vec<RemoteConversation>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct DeleteResponse {
    #[serde(default)]
    pub message: Option<String>,
}
