pub mod api;
pub mod client;

pub use api::CREATED_WITH;
pub use client::TogglClient;
