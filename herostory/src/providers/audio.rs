//! WAV encoding for raw PCM.

use crate::errors::GenerationError;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

fn encoding_error(err: hound::Error) -> GenerationError {
    GenerationError::work(format!("wav encoding failed: {err}"))
}

/// Wraps 16-bit little-endian mono PCM in a WAV container.
///
/// A trailing odd byte is dropped.
pub fn pcm16_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, GenerationError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.len()));
    let mut writer = WavWriter::new(&mut cursor, spec).map_err(encoding_error)?;
    for frame in pcm.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([frame[0], frame[1]]))
            .map_err(encoding_error)?;
    }
    writer.finalize().map_err(encoding_error)?;
    Ok(cursor.into_inner())
}

/// Sample rate of an ElevenLabs `pcm_<rate>` output format.
pub fn pcm_sample_rate(output_format: &str) -> Option<u32> {
    output_format.strip_prefix("pcm_")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    #[test]
    fn test_pcm_round_trips_through_reader() {
        let samples: [i16; 4] = [0, 1000, -1000, i16::MAX];
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let wav = pcm16_to_wav(&pcm, 22_050).unwrap();
        let mut reader = WavReader::new(Cursor::new(wav)).unwrap();

        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.spec().channels, 1);
        let decoded: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_pcm_sample_rate() {
        assert_eq!(pcm_sample_rate("pcm_44100"), Some(44_100));
        assert_eq!(pcm_sample_rate("pcm_fast"), None);
        assert_eq!(pcm_sample_rate("mp3_44100_128"), None);
    }
}
