//! Error types for the segmentation engine

use std::fmt;

/// Errors that can occur during audio segmentation
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Audio decoding error
    DecodingError(String),

    /// Processing error during analysis
    ProcessingError(String),

    /// Agglomerative clustering could not produce a usable labelling
    ///
    /// Contained by the structure segmenter, which falls back to uniform segmentation.
    ClusteringError(String),

    /// An external collaborator (beat detector, mood classifier, ...) failed
    CollaboratorError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::ClusteringError(msg) => write!(f, "Clustering error: {}", msg),
            AnalysisError::CollaboratorError(msg) => write!(f, "Collaborator error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<symphonia::core::errors::Error> for AnalysisError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AnalysisError::DecodingError(err.to_string())
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::DecodingError(err.to_string())
    }
}
