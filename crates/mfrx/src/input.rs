//! Recorded 8 kHz telephony audio.

use std::path::Path;

use anyhow::{bail, Context};
use mfrx_dtmf::SAMPLE_RATE_HZ;
use tracing::{debug, warn};

/// Read a mono 16-bit 8 kHz WAV file.
pub fn read_wav(path: &Path) -> anyhow::Result<Vec<i16>> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels != 1 {
        bail!("{}: expected mono audio, found {} channels", path.display(), spec.channels);
    }
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        bail!(
            "{}: expected 16-bit integer samples, found {} bits ({:?})",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        );
    }
    if spec.sample_rate as f32 != SAMPLE_RATE_HZ {
        bail!(
            "{}: expected {} Hz, found {} Hz",
            path.display(),
            SAMPLE_RATE_HZ,
            spec.sample_rate
        );
    }
    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("decoding {}", path.display()))?;
    debug!(path = %path.display(), samples = samples.len(), "read wav");
    Ok(samples)
}

/// Read headerless signed 16-bit little-endian PCM.
pub fn read_raw(path: &Path) -> anyhow::Result<Vec<i16>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if bytes.len() % 2 != 0 {
        warn!(path = %path.display(), "odd byte count, trailing byte ignored");
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn reads_mono_8k_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.wav");
        write_wav(&path, 1, 8000, &[0, 1, -1, i16::MAX, i16::MIN]);
        assert_eq!(read_wav(&path).unwrap(), vec![0, 1, -1, i16::MAX, i16::MIN]);
    }

    #[test]
    fn rejects_wrong_rate_and_layout() {
        let dir = tempfile::tempdir().unwrap();
        let stereo = dir.path().join("stereo.wav");
        write_wav(&stereo, 2, 8000, &[0, 0]);
        assert!(read_wav(&stereo).unwrap_err().to_string().contains("mono"));

        let wideband = dir.path().join("16k.wav");
        write_wav(&wideband, 1, 16000, &[0]);
        assert!(read_wav(&wideband).unwrap_err().to_string().contains("16000 Hz"));
    }

    #[test]
    fn reads_raw_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.raw");
        std::fs::write(&path, [0x01, 0x00, 0xff, 0xff, 0x00, 0x80, 0x7f]).unwrap();
        assert_eq!(read_raw(&path).unwrap(), vec![1, -1, i16::MIN]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_raw(&dir.path().join("nope.raw")).is_err());
        assert!(read_wav(&dir.path().join("nope.wav")).is_err());
    }
}
