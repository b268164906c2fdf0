//! Audio decoding using Symphonia

use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::{downmix_interleaved, ChannelMixMode};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded PCM audio, still interleaved
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved f32 samples in [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count
    pub channels: usize,
}

impl DecodedAudio {
    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        (self.samples.len() / self.channels) as f32 / self.sample_rate as f32
    }

    /// Mix down to mono
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if the buffer is not a whole number of frames
    pub fn to_mono(&self, mode: ChannelMixMode) -> Result<Vec<f32>, AnalysisError> {
        downmix_interleaved(&self.samples, self.channels, mode)
    }
}

/// Decode audio file to PCM samples
///
/// Supports every container/codec enabled in Symphonia's feature set (mp3, wav, flac, ogg
/// vorbis, aac/m4a). Corrupted packets are skipped.
///
/// # Arguments
///
/// * `path` - Path to audio file
///
/// # Returns
///
/// Interleaved samples with their sample rate and channel count
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` if the file cannot be opened, probed or decoded
pub fn decode_audio(path: impl AsRef<Path>) -> Result<DecodedAudio, AnalysisError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::DecodingError("No supported audio tracks found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
        AnalysisError::DecodingError("Track does not declare a sample rate".to_string())
    })?;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<f32> = Vec::new();
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(0);
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count();
                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                // Corrupted packet
                skipped += 1;
                log::debug!("Skipping undecodable packet: {}", msg);
            }
            Err(e) => return Err(e.into()),
        }
    }

    if channels == 0 {
        return Err(AnalysisError::DecodingError(
            "Could not determine channel count".to_string(),
        ));
    }

    if skipped > 0 {
        log::warn!("Skipped {} corrupted packets in {}", skipped, path.display());
    }

    log::debug!(
        "Decoded {} frames, {} channels at {} Hz",
        samples.len() / channels,
        channels,
        sample_rate
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_decoding_error() {
        let err = decode_audio("/nonexistent/track.wav").unwrap_err();
        assert!(matches!(err, AnalysisError::DecodingError(_)));
    }

    #[test]
    fn test_decoded_audio_helpers() {
        let audio = DecodedAudio {
            samples: vec![0.5, -0.5, 1.0, 0.0],
            sample_rate: 2,
            channels: 2,
        };
        assert_eq!(audio.duration(), 1.0);
        assert_eq!(audio.to_mono(ChannelMixMode::Average).unwrap(), vec![0.0, 0.5]);
    }
}
