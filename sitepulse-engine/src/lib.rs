pub mod audit;
pub mod canonical;
pub mod dedupe;
pub mod duplicates;
pub mod graph;
pub mod issues;
pub mod score;

pub use audit::{AuditEngine, AuditOutcome, EngineConfig};
pub use canonical::{CanonicalConfig, Canonicalizer, UrlError};
pub use duplicates::{DuplicateAnalysis, DuplicateGroup, DuplicateType};
pub use graph::{LinkGraphBuilder, PageGraph};
pub use score::{CategoryScores, ScoreEngine, ScoringConfig};
