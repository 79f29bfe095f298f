pub mod client;
pub mod narrative;

pub use client::LlmClient;
