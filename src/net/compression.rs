//! Batch compression. Bedrock batches are raw deflate streams, with no zlib header.
use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};
use std::io::{Read, Write};
use thiserror::Error;

pub const DEFAULT_LEVEL: u32 = 7;
pub const DEFAULT_MAX_DECOMPRESSION_SIZE: usize = 2 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Compression failed: {0}")]
    Compress(std::io::Error),

    #[error("Decompression failed: {0}")]
    Decompress(std::io::Error),

    #[error("Decompressed data exceeds the maximum size of {0} bytes")]
    TooLarge(usize),

    #[error("Invalid compression level {0}, expected 0 to 9")]
    InvalidLevel(u32),
}

/// Something able to compress packet batches. Implementations are shared between jobs and must
/// hold no per-call state.
pub trait Compressor: Send + Sync {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;
}

#[derive(Debug, Clone, Copy)]
pub struct ZlibCompressor {
    level: u32,
    max_decompression_size: usize,
}

impl ZlibCompressor {
    pub fn new(level: u32, max_decompression_size: usize) -> Result<Self, CompressionError> {
        if level > 9 {
            return Err(CompressionError::InvalidLevel(level));
        }
        Ok(Self {
            level,
            max_decompression_size,
        })
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn max_decompression_size(&self) -> usize {
        self.max_decompression_size
    }
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            max_decompression_size: DEFAULT_MAX_DECOMPRESSION_SIZE,
        }
    }
}

impl Compressor for ZlibCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(self.level));
        encoder
            .write_all(data)
            .map_err(CompressionError::Compress)?;
        encoder.finish().map_err(CompressionError::Compress)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        // Read one byte past the cap so an oversized payload is detected instead of truncated.
        let limit = self.max_decompression_size as u64 + 1;
        let mut decoder = DeflateDecoder::new(data).take(limit);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(CompressionError::Decompress)?;

        if decompressed.len() > self.max_decompression_size {
            return Err(CompressionError::TooLarge(self.max_decompression_size));
        }
        Ok(decompressed)
    }
}
