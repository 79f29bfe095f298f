//! BattleBottle - Tactical recommendation backend

pub mod advisor;
pub mod aggregate;
pub mod api;
pub mod core;
pub mod llm;
pub mod service;
pub mod store;

pub use service::AdvisorService;
