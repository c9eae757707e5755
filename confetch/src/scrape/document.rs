//! Finalized configuration document.

use std::path::Path;

/// A retrieved configuration snapshot.
///
/// Produced exactly once per successful fetch attempt, either by the
/// scrape engine at completion-marker time or directly from a REST
/// payload, and immutable from then on.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    content: String,
}

impl ConfigDocument {
    /// Wrap an already-complete payload (REST retrieval path).
    pub fn from_payload(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// The document text.
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Document size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }

    /// Write the document to a file as a single text artifact.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.content)
    }
}

impl std::fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
