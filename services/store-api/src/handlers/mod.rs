//! HTTP handlers

mod auth;
mod health;
mod store;

use serde::Serialize;

pub use auth::{login_with_cookies, ping};
pub use health::{health, ready};
pub use store::{store_data, store_raw};

/// Success envelope shared by the JSON API routes
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub status: u16,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn ok(message: &'static str, data: T) -> Self {
        Self {
            status: 200,
            message,
            data: Some(data),
        }
    }
}
