//! Chunk-to-document scrape engine.
//!
//! The engine consumes raw device chunks and decides three things per feed:
//! how many pager continuations the caller must send, what text is committed
//! to the document, and whether the completion marker has appeared. Marker
//! detection never depends on chunk boundaries: a short holdback tail stays
//! unscanned between feeds, so a marker cut in half by the transport is
//! reassembled before it can leak into the document.

use log::trace;
use memchr::memmem;
use regex::bytes::Regex;

use super::buffer::ScanBuffer;
use super::document::ConfigDocument;

/// Per-vendor whitespace policy, applied to committed text.
///
/// This is fetcher configuration, not part of the engine contract: devices
/// with a disabled pager emit line-aligned chunks, which is what the
/// line-oriented cleanup assumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizePolicy {
    /// Collapse runs of spaces into one.
    pub collapse_spaces: bool,

    /// Trim line ends and drop blank lines.
    pub strip_blank_lines: bool,
}

impl NormalizePolicy {
    /// Keep chunks byte-for-byte.
    pub const RAW: Self = Self {
        collapse_spaces: false,
        strip_blank_lines: false,
    };

    /// Collapse space runs and drop blank lines.
    pub const COMPACT: Self = Self {
        collapse_spaces: true,
        strip_blank_lines: true,
    };

    fn is_raw(&self) -> bool {
        !self.collapse_spaces && !self.strip_blank_lines
    }

    /// Apply the policy to a committed slice.
    pub fn apply(&self, text: &str) -> String {
        if self.is_raw() {
            return text.to_string();
        }

        let collapsed;
        let text = if self.collapse_spaces {
            collapsed = collapse_space_runs(text);
            collapsed.as_str()
        } else {
            text
        };

        if !self.strip_blank_lines {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

fn collapse_space_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for c in text.chars() {
        if c == ' ' {
            if !prev_space {
                out.push(c);
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    out
}

/// What one feed produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedOutcome {
    /// Pager continuation keystrokes the caller must send, one per
    /// pagination marker removed during this feed.
    pub continuations: u32,

    /// Whether the completion marker has been observed and the document
    /// finalized.
    pub finalized: bool,
}

/// Scrape engine: chunk sequence in, finalized document out.
///
/// The matching surface for both markers is the accumulated stream, never a
/// single chunk. Pagination markers are removed before text is committed, so
/// their literal bytes cannot appear in the final document; the completion
/// marker (the returning prompt) remains part of the document, matching what
/// the device actually printed.
pub struct ScrapeEngine {
    /// Completion predicate, matched against the tail scan surface.
    completion: Regex,

    /// Pagination marker bytes, if the vendor pages output.
    page_marker: Option<Vec<u8>>,

    /// Bytes held back from commit so a straddling pagination marker can
    /// still be removed (marker length minus one).
    holdback: usize,

    /// Whitespace policy for committed text.
    normalize: NormalizePolicy,

    /// Committed, marker-free document text.
    buffer: ScanBuffer,

    /// Received but not yet committed bytes.
    pending: Vec<u8>,

    finalized: bool,
}

impl ScrapeEngine {
    /// Default completion scan depth, in bytes.
    const SEARCH_DEPTH: usize = 1000;

    /// Create an engine that completes on a literal marker substring.
    pub fn new(
        completion_marker: &str,
        pagination_marker: Option<&str>,
        normalize: NormalizePolicy,
    ) -> Self {
        let pattern = regex::escape(completion_marker);
        // Escaping a literal cannot produce an invalid pattern.
        let completion = Regex::new(&pattern).expect("escaped literal is a valid pattern");
        Self::with_pattern(completion, pagination_marker, normalize)
    }

    /// Create an engine with a compiled completion pattern.
    pub fn with_pattern(
        completion: Regex,
        pagination_marker: Option<&str>,
        normalize: NormalizePolicy,
    ) -> Self {
        let page_marker = pagination_marker
            .filter(|m| !m.is_empty())
            .map(|m| m.as_bytes().to_vec());
        let holdback = page_marker.as_ref().map_or(0, |m| m.len() - 1);
        let depth = Self::SEARCH_DEPTH.max(completion.as_str().len() * 4);

        Self {
            completion,
            page_marker,
            holdback,
            normalize,
            buffer: ScanBuffer::new(depth),
            pending: Vec::new(),
            finalized: false,
        }
    }

    /// Feed one chunk of device output.
    ///
    /// Returns how many continuation keystrokes the caller owes the session
    /// and whether the document finalized. Feeding after finalization is a
    /// no-op: the document is immutable once the completion marker is seen.
    pub fn feed(&mut self, chunk: &[u8]) -> FeedOutcome {
        if self.finalized {
            return FeedOutcome {
                continuations: 0,
                finalized: true,
            };
        }

        self.pending.extend_from_slice(chunk);

        // Strip pagination markers from the undecided tail. Removal can
        // join two halves of a later marker, so rescan until clean.
        let mut continuations = 0u32;
        if let Some(marker) = &self.page_marker {
            while let Some(pos) = memmem::find(&self.pending, marker) {
                self.pending.drain(pos..pos + marker.len());
                continuations += 1;
            }
        }

        // The completion scan surface is the committed tail plus everything
        // still pending, so a marker straddling the commit point is found.
        let mut scan = Vec::with_capacity(self.buffer.tail().len() + self.pending.len());
        scan.extend_from_slice(self.buffer.tail());
        scan.extend_from_slice(&self.pending);

        if self.completion.is_match(&scan) {
            let rest = std::mem::take(&mut self.pending);
            self.commit(&rest);
            self.finalized = true;
            trace!("completion marker observed, document finalized");
        } else if self.pending.len() > self.holdback {
            let cut = self.pending.len() - self.holdback;
            let committed: Vec<u8> = self.pending.drain(..cut).collect();
            self.commit(&committed);
        }

        FeedOutcome {
            continuations,
            finalized: self.finalized,
        }
    }

    fn commit(&mut self, slice: &[u8]) {
        if slice.is_empty() {
            return;
        }
        if self.normalize.is_raw() {
            self.buffer.extend(slice);
        } else {
            let text = String::from_utf8_lossy(slice);
            let cleaned = self.normalize.apply(&text);
            self.buffer.extend(cleaned.as_bytes());
        }
    }

    /// Whether the completion marker has been observed.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Bytes committed so far.
    pub fn committed_len(&self) -> usize {
        self.buffer.len()
    }

    /// Consume the engine and produce the finalized document.
    ///
    /// Returns `None` if the completion marker was never observed.
    pub fn into_document(mut self) -> Option<ConfigDocument> {
        if !self.finalized {
            return None;
        }
        let bytes = self.buffer.take();
        let content = String::from_utf8_lossy(&bytes).into_owned();
        Some(ConfigDocument::from_payload(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(engine: &mut ScrapeEngine, chunks: &[&str]) -> u32 {
        let mut continuations = 0;
        for chunk in chunks {
            let outcome = engine.feed(chunk.as_bytes());
            continuations += outcome.continuations;
            if outcome.finalized {
                break;
            }
        }
        continuations
    }

    #[test]
    fn test_pager_strip_and_completion() {
        let mut engine = ScrapeEngine::new("DONE>", Some("--MORE--"), NormalizePolicy::RAW);

        let continuations = feed_all(&mut engine, &["first--MORE--second", "DONE>"]);

        assert_eq!(continuations, 1);
        assert!(engine.is_finalized());
        let doc = engine.into_document().unwrap();
        assert_eq!(doc.as_str(), "firstsecondDONE>");
    }

    #[test]
    fn test_pagination_marker_split_across_chunks() {
        let mut engine = ScrapeEngine::new("FGT #", Some("--More--"), NormalizePolicy::RAW);

        // Marker cut exactly at a chunk boundary.
        let continuations = feed_all(&mut engine, &["line one\n--Mo", "re--line two\n", "FGT #"]);

        assert_eq!(continuations, 1);
        let doc = engine.into_document().unwrap();
        assert_eq!(doc.as_str(), "line one\nline two\nFGT #");
        assert!(!doc.as_str().contains("--More--"));
    }

    #[test]
    fn test_completion_marker_split_across_chunks() {
        let mut engine = ScrapeEngine::new("admin@sw1>", None, NormalizePolicy::RAW);

        let out = engine.feed(b"config text\nadmin@");
        assert!(!out.finalized);
        let out = engine.feed(b"sw1>");
        assert!(out.finalized);

        let doc = engine.into_document().unwrap();
        assert_eq!(doc.as_str(), "config text\nadmin@sw1>");
    }

    #[test]
    fn test_multiple_pager_stops() {
        let mut engine = ScrapeEngine::new("END#", Some("--More--"), NormalizePolicy::RAW);

        let continuations = feed_all(
            &mut engine,
            &["a--More--", "b--More--", "c--More--", "END#"],
        );

        assert_eq!(continuations, 3);
        let doc = engine.into_document().unwrap();
        assert_eq!(doc.as_str(), "abcEND#");
    }

    #[test]
    fn test_marker_rejoined_by_removal() {
        // Removing one marker must not let a marker formed by the join
        // survive into the document.
        let mut engine = ScrapeEngine::new("END#", Some("XX"), NormalizePolicy::RAW);
        let out = engine.feed(b"aXXXXb");
        assert_eq!(out.continuations, 2);
        engine.feed(b"END#");
        let doc = engine.into_document().unwrap();
        assert_eq!(doc.as_str(), "abEND#");
    }

    #[test]
    fn test_not_finalized_without_completion() {
        let mut engine = ScrapeEngine::new("PROMPT>", None, NormalizePolicy::RAW);
        engine.feed(b"partial output with no prompt");
        assert!(!engine.is_finalized());
        assert!(engine.into_document().is_none());
    }

    #[test]
    fn test_feed_after_finalize_is_ignored() {
        let mut engine = ScrapeEngine::new("DONE", None, NormalizePolicy::RAW);
        engine.feed(b"xDONE");
        let out = engine.feed(b"late noise");
        assert_eq!(out.continuations, 0);
        assert!(out.finalized);
        assert_eq!(engine.into_document().unwrap().as_str(), "xDONE");
    }

    #[test]
    fn test_compact_normalization() {
        let mut engine = ScrapeEngine::new("admin@sw1>", None, NormalizePolicy::COMPACT);

        feed_all(
            &mut engine,
            &["set interfaces   ge-0/0/0  unit 0\n\n   \n", "admin@sw1>"],
        );

        let doc = engine.into_document().unwrap();
        assert_eq!(doc.as_str(), "set interfaces ge-0/0/0 unit 0\nadmin@sw1>\n");
    }

    #[test]
    fn test_normalize_policy_apply() {
        let policy = NormalizePolicy::COMPACT;
        assert_eq!(
            policy.apply("a   b\n\n  c  \n"),
            "a b\nc\n"
        );
        assert_eq!(NormalizePolicy::RAW.apply("a   b\n\n"), "a   b\n\n");
    }

    #[test]
    fn test_long_output_completion_in_tail_only() {
        // The completion scan is bounded; a prompt-like string buried long
        // before the end must not be what terminates the scrape.
        let mut engine = ScrapeEngine::new("REALEND#", None, NormalizePolicy::RAW);
        let filler = "x".repeat(5000);
        engine.feed(filler.as_bytes());
        assert!(!engine.is_finalized());
        engine.feed(b"REALEND#");
        assert!(engine.is_finalized());
        let doc = engine.into_document().unwrap();
        assert_eq!(doc.size_bytes(), 5000 + 8);
    }
}
