//! RIFF/WAVE encoder for mono 16-bit PCM.
//!
//! The 44-byte header is written up front, sized for the number of samples
//! the caller declares. Sample data is appended little-endian afterwards.
//!
//! | Offset | Field         | Value              |
//! |--------|---------------|--------------------|
//! | 0      | ChunkID       | `RIFF`             |
//! | 4      | ChunkSize     | 36 + data size     |
//! | 8      | Format        | `WAVE`             |
//! | 12     | Subchunk1ID   | `fmt `             |
//! | 16     | Subchunk1Size | 16                 |
//! | 20     | AudioFormat   | 1 (PCM)            |
//! | 22     | NumChannels   | 1                  |
//! | 24     | SampleRate    | sample rate        |
//! | 28     | ByteRate      | sample rate * 2    |
//! | 32     | BlockAlign    | 2                  |
//! | 34     | BitsPerSample | 16                 |
//! | 36     | Subchunk2ID   | `data`             |
//! | 40     | Subchunk2Size | sample count * 2   |

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Size of the header in bytes.
pub const HEADER_LEN: usize = 44;

const NUM_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = NUM_CHANNELS * BITS_PER_SAMPLE / 8;

/// Samples per write when streaming silence.
const SILENCE_CHUNK: usize = 4096;

/// Errors that can occur while encoding.
#[derive(Debug, Error)]
pub enum WavError {
    /// Output file could not be created
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Writing to the output failed
    #[error("failed to write WAV data: {0}")]
    Io(#[from] io::Error),
    /// Declared data does not fit the 32-bit size fields
    #[error("{samples} samples do not fit in a WAV data chunk")]
    TooLarge { samples: u64 },
    /// Operation on a writer that was already closed
    #[error("WAV writer is already closed")]
    Closed,
}

/// Header fields for a mono 16-bit PCM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    sample_rate: u32,
    num_samples: u32,
}

impl WavHeader {
    /// Builds a header for `sample_rate * duration_secs` samples.
    ///
    /// # Errors
    ///
    /// Returns `WavError::TooLarge` if the RIFF chunk size would overflow 32 bits
    pub fn new(sample_rate: u32, duration_secs: u64) -> Result<Self, WavError> {
        let samples = (sample_rate as u64).saturating_mul(duration_secs);
        let data_size = samples.saturating_mul(BLOCK_ALIGN as u64);
        if data_size > u32::MAX as u64 - 36 || sample_rate as u64 * 2 > u32::MAX as u64 {
            return Err(WavError::TooLarge { samples });
        }
        Ok(Self {
            sample_rate,
            num_samples: samples as u32,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples the header declares.
    pub fn num_samples(&self) -> u32 {
        self.num_samples
    }

    /// Size of the sample data in bytes.
    pub fn data_size(&self) -> u32 {
        self.num_samples * BLOCK_ALIGN as u32
    }

    /// RIFF chunk size: everything after the first 8 bytes.
    pub fn chunk_size(&self) -> u32 {
        36 + self.data_size()
    }

    /// Serializes the header.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let byte_rate = self.sample_rate * BLOCK_ALIGN as u32;

        let mut header = [0u8; HEADER_LEN];
        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&self.chunk_size().to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");

        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&16u32.to_le_bytes());
        header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
        header[22..24].copy_from_slice(&NUM_CHANNELS.to_le_bytes());
        header[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
        header[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
        header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&self.data_size().to_le_bytes());
        header
    }
}

/// Streaming WAV writer.
///
/// The header goes out when the writer is constructed. Samples can then be
/// appended any number of times until [`WavWriter::close`] is called; after
/// that every operation fails with `WavError::Closed`. A writer dropped
/// without `close` still flushes what it can.
pub struct WavWriter<W: Write> {
    /// `None` once closed.
    inner: Option<W>,
    header: WavHeader,
    samples_written: u64,
}

impl WavWriter<BufWriter<File>> {
    /// Creates `path` and writes the header.
    ///
    /// # Arguments
    ///
    /// * `path` - Output file path
    /// * `sample_rate` - Sample rate in Hz
    /// * `duration_secs` - Length the header declares, in seconds
    ///
    /// # Errors
    ///
    /// Returns error if the sizes overflow or the file cannot be created
    pub fn create<P: AsRef<Path>>(
        path: P,
        sample_rate: u32,
        duration_secs: u32,
    ) -> Result<Self, WavError> {
        let path = path.as_ref();
        let header = WavHeader::new(sample_rate, duration_secs.into())?;
        let file = File::create(path).map_err(|source| WavError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_header(BufWriter::new(file), header)
    }
}

impl<W: Write> WavWriter<W> {
    /// Wraps any writer and writes the header to it.
    ///
    /// # Errors
    ///
    /// Returns error if the sizes overflow or the header write fails
    pub fn new(inner: W, sample_rate: u32, duration_secs: u32) -> Result<Self, WavError> {
        let header = WavHeader::new(sample_rate, duration_secs.into())?;
        Self::with_header(inner, header)
    }

    fn with_header(mut inner: W, header: WavHeader) -> Result<Self, WavError> {
        inner.write_all(&header.to_bytes())?;
        Ok(Self {
            inner: Some(inner),
            header,
            samples_written: 0,
        })
    }

    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    /// Number of samples appended so far.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Appends samples as little-endian 16-bit words.
    ///
    /// # Errors
    ///
    /// Returns error if the writer is closed or the write fails
    pub fn write_samples(&mut self, samples: &[i16]) -> Result<(), WavError> {
        let inner = self.inner.as_mut().ok_or(WavError::Closed)?;

        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        inner.write_all(&bytes)?;

        self.samples_written += samples.len() as u64;
        Ok(())
    }

    /// Flushes and releases the output.
    ///
    /// # Errors
    ///
    /// Returns error if already closed or the flush fails. The output is
    /// released either way.
    pub fn close(&mut self) -> Result<(), WavError> {
        let mut inner = self.inner.take().ok_or(WavError::Closed)?;

        if self.samples_written != self.header.num_samples() as u64 {
            tracing::warn!(
                "WAV header declares {} samples but {} were written",
                self.header.num_samples(),
                self.samples_written
            );
        }

        inner.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for WavWriter<W> {
    fn drop(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            if let Err(e) = inner.flush() {
                tracing::error!("Failed to flush unclosed WAV writer: {}", e);
            }
        }
    }
}

/// Writes a silent WAV file of `duration_secs` seconds.
///
/// # Errors
///
/// Returns error if the file cannot be created or written
pub fn write_silence<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    duration_secs: u32,
) -> Result<(), WavError> {
    let mut writer = WavWriter::create(path.as_ref(), sample_rate, duration_secs)?;

    let zeros = [0i16; SILENCE_CHUNK];
    let mut remaining = writer.header().num_samples() as usize;
    let mut written = Ok(());
    while remaining > 0 && written.is_ok() {
        let n = remaining.min(SILENCE_CHUNK);
        written = writer.write_samples(&zeros[..n]);
        remaining -= n;
    }

    let closed = writer.close();
    written?;
    closed?;

    tracing::info!(
        "Wrote {}s of silence to {:?}",
        duration_secs,
        path.as_ref()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn read_u32(data: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ])
    }

    fn read_u16(data: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([data[offset], data[offset + 1]])
    }

    #[test]
    fn test_header_layout() {
        let header = WavHeader::new(44100, 1).unwrap().to_bytes();

        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(read_u32(&header, 4), 88236);
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(read_u32(&header, 16), 16);
        assert_eq!(read_u16(&header, 20), 1);
        assert_eq!(read_u16(&header, 22), 1);
        assert_eq!(read_u32(&header, 24), 44100);
        assert_eq!(read_u32(&header, 28), 88200);
        assert_eq!(read_u16(&header, 32), 2);
        assert_eq!(read_u16(&header, 34), 16);
        assert_eq!(&header[36..40], b"data");
        assert_eq!(read_u32(&header, 40), 88200);
    }

    #[test]
    fn test_header_too_large() {
        assert!(matches!(
            WavHeader::new(u32::MAX, 1),
            Err(WavError::TooLarge { .. })
        ));
        assert!(matches!(
            WavHeader::new(48000, 100_000),
            Err(WavError::TooLarge { .. })
        ));
        assert!(matches!(
            WavHeader::new(8000, u64::MAX),
            Err(WavError::TooLarge { samples: u64::MAX })
        ));
        assert!(WavHeader::new(48000, 3600).is_ok());
    }

    #[test]
    fn test_samples_little_endian() {
        let mut buf = Vec::new();
        {
            let mut writer = WavWriter::new(&mut buf, 4, 1).unwrap();
            writer.write_samples(&[0x0102, -2]).unwrap();
            writer.write_samples(&[i16::MIN, i16::MAX]).unwrap();
            writer.close().unwrap();
        }
        assert_eq!(buf.len(), HEADER_LEN + 8);
        assert_eq!(
            &buf[HEADER_LEN..],
            &[0x02, 0x01, 0xFE, 0xFF, 0x00, 0x80, 0xFF, 0x7F]
        );
    }

    #[test]
    fn test_closed_writer_rejects_operations() {
        let mut buf = Vec::new();
        let mut writer = WavWriter::new(&mut buf, 8000, 1).unwrap();
        writer.close().unwrap();
        assert!(writer.is_closed());
        assert!(matches!(writer.write_samples(&[1]), Err(WavError::Closed)));
        assert!(matches!(writer.close(), Err(WavError::Closed)));
    }

    #[test]
    fn test_write_failure_is_reported() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        assert!(matches!(
            WavWriter::new(Broken, 8000, 1),
            Err(WavError::Io(_))
        ));
    }

    #[test]
    fn test_create_in_missing_directory() {
        let path = std::env::temp_dir()
            .join("scoremix_no_such_dir")
            .join("out.wav");
        assert!(matches!(
            WavWriter::create(&path, 8000, 1),
            Err(WavError::Create { .. })
        ));
    }

    #[test]
    fn test_file_readable_by_hound() {
        let path = std::env::temp_dir().join("scoremix_wav_hound.wav");
        let samples: Vec<i16> = (0..8000).map(|i| (i % 200) as i16 - 100).collect();

        let mut writer = WavWriter::create(&path, 8000, 1).unwrap();
        writer.write_samples(&samples).unwrap();
        writer.close().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_silence() {
        let path = std::env::temp_dir().join("scoremix_silence.wav");
        write_silence(&path, 44100, 3).unwrap();

        let data = fs::read(&path).unwrap();
        assert_eq!(data.len(), HEADER_LEN + 44100 * 3 * 2);
        assert_eq!(read_u32(&data, 40), 44100 * 3 * 2);
        assert!(data[HEADER_LEN..].iter().all(|&b| b == 0));

        fs::remove_file(&path).unwrap();
    }
}
