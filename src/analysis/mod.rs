//! Analysis result types
//!
//! - The `AudioAnalysis` aggregate and its input/output value types
//! - Diagnostic metadata

pub mod metadata;
pub mod result;

pub use metadata::{AnalysisMetadata, AppropriatenessRecord};
pub use result::{AudioAnalysis, Lyric, Metadata, Mood};
