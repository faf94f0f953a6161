pub mod client;
pub mod download;
pub mod usage;

pub use client::{TikTokClient, TikTokConfig};
