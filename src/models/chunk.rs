use thiserror::Error;

/// Invalid chunking parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("chunk_size must be > 0")]
    NonPositiveSize,
    #[error("chunk_overlap must be >= 0")]
    NegativeOverlap,
    #[error("chunk_overlap must be smaller than chunk_size")]
    OverlapTooLarge,
}

/// Configuration for overlapping chunk generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Items per chunk
    pub chunk_size: i64,
    /// Items shared between adjacent chunks
    pub chunk_overlap: i64,
}

impl ChunkConfig {
    pub fn new(chunk_size: i64, chunk_overlap: i64) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Check the parameters, returning the step between chunk starts
    pub fn validate(&self) -> Result<usize, ChunkError> {
        if self.chunk_size <= 0 {
            return Err(ChunkError::NonPositiveSize);
        }
        if self.chunk_overlap < 0 {
            return Err(ChunkError::NegativeOverlap);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkError::OverlapTooLarge);
        }
        Ok((self.chunk_size - self.chunk_overlap) as usize)
    }
}

/// Split items into overlapping chunks.
///
/// Chunks start at 0 and advance by `chunk_size - chunk_overlap`; generation
/// stops once a chunk reaches the end of the input. Every item lands in at
/// least one chunk and empty chunks are never produced.
pub fn build_chunks<T: Clone>(
    items: &[T],
    chunk_size: i64,
    chunk_overlap: i64,
) -> Result<Vec<Vec<T>>, ChunkError> {
    let step = ChunkConfig::new(chunk_size, chunk_overlap).validate()?;
    let size = chunk_size as usize;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < items.len() {
        let end = (start + size).min(items.len());
        chunks.push(items[start..end].to_vec());
        if start + size >= items.len() {
            break;
        }
        start += step;
    }
    Ok(chunks)
}
