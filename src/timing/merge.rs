//! Reconciliation of sidecar and edge timings into one outward header.

use std::time::{Duration, Instant};

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::timing::parser::{parse_all, TimingMetric};

/// Outward timing header; `http` has no constant for it.
pub const SERVER_TIMING: HeaderName = HeaderName::from_static("server-timing");

/// Combine sidecar metrics with edge metrics. Both sources are kept in order.
pub fn merge(inner: Vec<TimingMetric>, outer: Vec<TimingMetric>) -> Vec<TimingMetric> {
    let mut merged = inner;
    merged.extend(outer);
    merged
}

/// Render metrics as a `Server-Timing` value. Markers carry no value and are
/// skipped, as is any entry that cannot travel in a header value.
pub fn render(metrics: &[TimingMetric]) -> Option<String> {
    let entries: Vec<String> = metrics
        .iter()
        .filter_map(|metric| {
            let entry = render_entry(metric)?;
            if HeaderValue::from_str(&entry).is_err() {
                tracing::debug!(metric = %metric.name(), "Skipping unrepresentable timing entry");
                return None;
            }
            Some(entry)
        })
        .collect();

    if entries.is_empty() {
        None
    } else {
        Some(entries.join(", "))
    }
}

fn render_entry(metric: &TimingMetric) -> Option<String> {
    let duration = metric.duration_ms()?;
    let mut entry = format!("{};dur={}", metric.name(), format_duration(duration));
    if let Some(desc) = metric.description() {
        let escaped = desc.replace('\\', "\\\\").replace('"', "\\\"");
        entry.push_str(&format!(";desc=\"{escaped}\""));
    }
    Some(entry)
}

fn format_duration(ms: f64) -> String {
    let rounded = (ms * 1000.0).round() / 1000.0;
    format!("{rounded}")
}

/// Strip every internal timing header from `headers`, merge their metrics with
/// `edge`, and write a single outward `Server-Timing` header.
///
/// Returns the merged sequence, markers included.
pub fn apply_to_response(
    headers: &mut HeaderMap,
    inner_headers: &[HeaderName],
    edge: Vec<TimingMetric>,
) -> Vec<TimingMetric> {
    let mut harvested = Vec::new();
    for name in inner_headers {
        let values: Vec<String> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect();
        headers.remove(name);
        harvested.extend(values);
    }
    // Removing the outward header too keeps it single-valued whatever the config says.
    headers.remove(SERVER_TIMING);

    let merged = merge(parse_all(harvested.iter().map(String::as_str)), edge);
    if let Some(rendered) = render(&merged) {
        match HeaderValue::from_str(&rendered) {
            Ok(value) => {
                headers.insert(SERVER_TIMING, value);
            }
            Err(e) => tracing::debug!(error = %e, "Dropping unrepresentable Server-Timing value"),
        }
    }
    merged
}

/// Measures the phases the edge itself spends on a request.
#[derive(Debug)]
pub struct EdgeTimer {
    started: Instant,
    metrics: Vec<TimingMetric>,
}

impl EdgeTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            metrics: Vec::new(),
        }
    }

    /// Add an externally measured phase.
    pub fn record(&mut self, name: &str, description: &str, elapsed: Duration) {
        self.metrics.push(TimingMetric::measured(
            name,
            Some(description),
            elapsed.as_secs_f64() * 1000.0,
        ));
    }

    /// Finish with an `edge-total` metric covering the whole request.
    pub fn finish(mut self) -> Vec<TimingMetric> {
        let total = self.started.elapsed();
        self.record("edge-total", "edge total", total);
        self.metrics
    }
}
