//! # Backend API
//!
//! Typed access to the fashion assistant backend: authentication, chat,
//! product search, preferences and conversation history.

pub mod client;
pub mod error;
pub mod tokens;
pub mod types;

pub use client::{ApiClient, ClientStatus, RequestOptions};
pub use error::ApiError;
pub use types::{Product, TokenPair};
