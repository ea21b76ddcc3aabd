pub mod agents;
pub mod continuation;
pub mod engine;
pub mod error;
pub mod scoring;
pub mod types;

pub use engine::{ArbitrationConfig, ArbitrationEngine};
pub use error::ArbitrationError;
pub use types::{AnalysisRequest, AnalysisType, ArbitrationBundle, DecisionTier};
