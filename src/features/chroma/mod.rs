//! Chroma extraction modules
//!
//! Extract pitch-class distribution (12 semitones) from audio:
//! - Chroma vector computation
//! - L2 normalization and frame-to-frame similarity

pub mod extractor;
pub mod normalization;

pub use extractor::extract_chroma;
pub use normalization::{cosine_similarity, l2_normalize};
