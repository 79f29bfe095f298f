pub mod config;
pub mod error;
pub mod types;

pub use config::NarrativeConfig;
pub use error::{AdvisorError, Result};
pub use types::{Outcome, Position, RecordId, ScenarioKey};
