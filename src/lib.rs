pub mod analysis;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod export;
pub mod store;
pub mod transcript;

pub use analysis::{AnalysisReport, Analyzer};
pub use config::Config;
pub use error::AnalysisError;
pub use store::EmbeddingCache;
pub use transcript::{FormatRegistry, MessageStore};
