//! `Server-Timing` header parsing.
//!
//! Grammar handled: `name[;dur=<ms>][;desc=<text>][, ...]`. Parsing is total:
//! fragments that cannot be understood are dropped, never reported.

use indexmap::IndexMap;

/// One entry of a timing header.
#[derive(Debug, Clone, PartialEq)]
pub enum TimingMetric {
    /// Entry carrying a `dur=` value.
    Measured {
        name: String,
        description: Option<String>,
        duration_ms: f64,
    },
    /// Entry with no usable duration.
    Marker {
        name: String,
        description: Option<String>,
    },
}

impl TimingMetric {
    pub fn measured(name: impl Into<String>, description: Option<&str>, duration_ms: f64) -> Self {
        TimingMetric::Measured {
            name: name.into(),
            description: description.map(str::to_string),
            duration_ms,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TimingMetric::Measured { name, .. } | TimingMetric::Marker { name, .. } => name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            TimingMetric::Measured { description, .. } | TimingMetric::Marker { description, .. } => {
                description.as_deref()
            }
        }
    }

    pub fn duration_ms(&self) -> Option<f64> {
        match self {
            TimingMetric::Measured { duration_ms, .. } => Some(*duration_ms),
            TimingMetric::Marker { .. } => None,
        }
    }

    /// Key used in the metrics mapping: `name` or `name (desc)`.
    pub fn display_key(&self) -> String {
        match self.description() {
            Some(desc) => format!("{} ({})", self.name(), desc),
            None => self.name().to_string(),
        }
    }
}

/// Parse one timing header value.
pub fn parse(header: &str) -> Vec<TimingMetric> {
    header.split(',').filter_map(parse_entry).collect()
}

/// Parse several header values (repeated headers) into one sequence.
pub fn parse_all<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<TimingMetric> {
    values.into_iter().flat_map(parse).collect()
}

fn parse_entry(entry: &str) -> Option<TimingMetric> {
    let mut attributes = entry.split(';');
    let name = attributes.next()?.trim();
    if name.is_empty() {
        return None;
    }

    let mut duration_ms = None;
    let mut description = None;
    for attribute in attributes {
        let Some((key, value)) = attribute.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "dur" => {
                duration_ms = unquote(value).parse::<f64>().ok().filter(|d| d.is_finite());
            }
            "desc" => {
                let value = unquote(value);
                if !value.is_empty() {
                    description = Some(value.to_string());
                }
            }
            _ => {}
        }
    }

    let name = name.to_string();
    Some(match duration_ms {
        Some(duration_ms) => TimingMetric::Measured {
            name,
            description,
            duration_ms,
        },
        None => TimingMetric::Marker { name, description },
    })
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Outward metrics mapping: display key → duration (`None` for markers).
pub fn metrics_map(metrics: &[TimingMetric]) -> IndexMap<String, Option<f64>> {
    metrics
        .iter()
        .map(|m| (m.display_key(), m.duration_ms()))
        .collect()
}
