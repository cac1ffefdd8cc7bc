pub mod api;
pub mod auth;
pub mod client;

pub use auth::{DeviceCode, DevicePoll, TokenGrant, PENDING_STATUSES};
pub use client::TraktClient;
