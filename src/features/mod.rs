//! Feature extraction modules
//!
//! Low-level signal features shared by the breakpoint detectors and the structure segmenter:
//! - Frame-wise RMS energy
//! - STFT chroma and spectral centroid

pub mod chroma;
pub mod frames;
pub mod spectral;
