//! Plain-text exposition format encode and parse.
//!
//! Samples are keyed by metric name plus a canonically sorted label set,
//! so two serializations of the same sample with different label orders
//! parse to the same key. This is what lets the reconciler look values up
//! without caring how the gateway happened to order labels.

use std::collections::HashMap;

use log::debug;

use crate::error::MetricsError;

/// Canonical sample identity: metric name plus sorted labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleKey {
    name: String,
    labels: Vec<(String, String)>,
}

impl SampleKey {
    /// Build a key; labels are sorted by label name.
    pub fn new(name: impl Into<String>, labels: &[(&str, &str)]) -> Self {
        let mut labels: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        labels.sort();
        Self {
            name: name.into(),
            labels,
        }
    }

    /// Metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sorted labels.
    pub fn labels(&self) -> &[(String, String)] {
        &self.labels
    }

    /// This key with additional labels merged in (grouping-key
    /// augmentation for remote lookups).
    pub fn with_extra(&self, extra: &[(&str, &str)]) -> Self {
        let mut labels = self.labels.clone();
        for (k, v) in extra {
            labels.push((k.to_string(), v.to_string()));
        }
        labels.sort();
        labels.dedup();
        Self {
            name: self.name.clone(),
            labels,
        }
    }

    /// This key with the named labels removed (stripping the grouping key
    /// from a gateway-exported sample).
    pub fn without(&self, label_names: &[&str]) -> Self {
        let labels = self
            .labels
            .iter()
            .filter(|(k, _)| !label_names.contains(&k.as_str()))
            .cloned()
            .collect();
        Self {
            name: self.name.clone(),
            labels,
        }
    }

    /// Whether this key carries every given label with the given value.
    pub fn has_labels(&self, required: &[(&str, &str)]) -> bool {
        required.iter().all(|(rk, rv)| {
            self.labels
                .iter()
                .any(|(k, v)| k == rk && v == rv)
        })
    }
}

/// A parsed exposition document: sample key to value.
#[derive(Debug, Default)]
pub struct Snapshot {
    samples: HashMap<SampleKey, f64>,
}

impl Snapshot {
    /// An empty snapshot (collector unreachable, degraded mode).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse exposition text.
    ///
    /// Unparseable individual lines are skipped; a body with sample-like
    /// lines but not one valid sample is a parse failure (a proxy error
    /// page, not an exposition document).
    pub fn parse(text: &str) -> Result<Self, MetricsError> {
        let mut samples = HashMap::new();
        let mut candidates = 0usize;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            candidates += 1;
            match parse_sample_line(line) {
                Some((key, value)) => {
                    samples.insert(key, value);
                }
                None => debug!("skipping unparseable exposition line: {:?}", line),
            }
        }

        if samples.is_empty() && candidates > 0 {
            return Err(MetricsError::Parse(format!(
                "no valid samples in {candidates} non-comment lines"
            )));
        }

        Ok(Self { samples })
    }

    /// Look up a sample value.
    pub fn value(&self, key: &SampleKey) -> Option<f64> {
        self.samples.get(key).copied()
    }

    /// Iterate all samples.
    pub fn iter(&self) -> impl Iterator<Item = (&SampleKey, f64)> {
        self.samples.iter().map(|(k, v)| (k, *v))
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the snapshot holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Parse one `name{label="v",...} value` line.
fn parse_sample_line(line: &str) -> Option<(SampleKey, f64)> {
    let (name_part, rest) = match line.find('{') {
        Some(brace) => {
            let close = find_closing_brace(line, brace)?;
            (&line[..brace], &line[close + 1..])
        }
        None => {
            let split = line.find(char::is_whitespace)?;
            (&line[..split], &line[split..])
        }
    };

    let name = name_part.trim();
    if name.is_empty() || !is_valid_metric_name(name) {
        return None;
    }

    let labels = match line.find('{') {
        Some(brace) => {
            let close = find_closing_brace(line, brace)?;
            parse_labels(&line[brace + 1..close])?
        }
        None => Vec::new(),
    };

    // Value, optionally followed by a timestamp.
    let value_token = rest.split_whitespace().next()?;
    let value = parse_value(value_token)?;

    let borrowed: Vec<(&str, &str)> = labels
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    Some((SampleKey::new(name, &borrowed), value))
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Find the `}` terminating the label block, skipping quoted values.
fn find_closing_brace(line: &str, open: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open + 1) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_quotes => escaped = true,
            b'"' => in_quotes = !in_quotes,
            b'}' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parse the interior of a label block: `k1="v1",k2="v2"`.
fn parse_labels(block: &str) -> Option<Vec<(String, String)>> {
    let mut labels = Vec::new();
    let mut rest = block.trim();

    while !rest.is_empty() {
        let eq = rest.find('=')?;
        let key = rest[..eq].trim().to_string();
        rest = rest[eq + 1..].trim_start();
        if !rest.starts_with('"') {
            return None;
        }

        let mut value = String::new();
        let mut chars = rest[1..].char_indices();
        let mut consumed = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, other)) => value.push(other),
                    None => return None,
                },
                '"' => {
                    consumed = Some(i + 2); // opening quote + closing quote
                    break;
                }
                _ => value.push(c),
            }
        }
        labels.push((key, value));

        rest = rest[consumed?..].trim_start();
        rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    }

    Some(labels)
}

fn parse_value(token: &str) -> Option<f64> {
    match token {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => token.parse::<f64>().ok(),
    }
}

/// Escape a label value for exposition output.
pub fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Escape help text for a `# HELP` line.
pub fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Render one sample line from sorted labels.
pub fn format_sample(name: &str, labels: &[(String, String)], value: f64) -> String {
    if labels.is_empty() {
        return format!("{name} {value}");
    }
    let rendered: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label_value(v)))
        .collect();
    format!("{name}{{{}}} {value}", rendered.join(","))
}
