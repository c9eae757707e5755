//! Accumulation buffer with bounded tail search.
//!
//! Completion markers are only ever expected near the end of the stream, so
//! the scan surface is the last `search_depth` bytes rather than the whole
//! accumulated document. For multi-megabyte configurations this keeps the
//! per-chunk cost constant instead of quadratic.

use regex::bytes::Regex;

/// Buffer for accumulating committed output with an efficient tail scan.
#[derive(Debug)]
pub struct ScanBuffer {
    /// The accumulated, marker-free output.
    buffer: Vec<u8>,

    /// How many bytes from the end form the scan surface.
    search_depth: usize,
}

impl ScanBuffer {
    /// Create a new buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Append committed data.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// The last `search_depth` bytes (or everything, if shorter).
    pub fn tail(&self) -> &[u8] {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        &self.buffer[start..]
    }

    /// Search only the tail of the buffer for the pattern.
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        pattern.find(self.tail())
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for ScanBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = ScanBuffer::new(100);
        buffer.extend(b"config system global");
        assert_eq!(buffer.as_slice(), b"config system global");
    }

    #[test]
    fn test_tail_search() {
        let mut buffer = ScanBuffer::new(20);

        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nFGT-01 #");

        let pattern = Regex::new(r"FGT-01 #").unwrap();
        assert!(buffer.search_tail(&pattern).is_some());
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = ScanBuffer::new(10);

        // Marker followed by enough filler to push it out of the tail.
        buffer.extend(b"FGT-01 #");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"FGT-01 #").unwrap();
        assert!(buffer.search_tail(&pattern).is_none());
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = ScanBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), b"test data");
        assert!(buffer.is_empty());
    }
}
