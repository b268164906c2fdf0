//! Audio I/O modules
//!
//! Audio file decoding using Symphonia.

pub mod decoder;

pub use decoder::{decode_audio, DecodedAudio};
