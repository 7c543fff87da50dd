//! HTTP networking module
//!
//! Provides the single pooled HTTP client used for provider requests and image downloads.

mod client;
mod user_agent;

pub use client::{HttpClient, ProviderRequest, ProviderResponse};
pub use user_agent::{accept_json, generate_user_agent};
