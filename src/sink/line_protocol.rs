//! InfluxDB line protocol encoding.
//!
//! `measurement,tag=value,... value=<n>i <timestamp>` with tags in key order.

use std::fmt::Write;

use crate::point::MetricPoint;

/// Encode one point as a line (no trailing newline).
pub fn encode_point(point: &MetricPoint) -> String {
    let mut line = escape(&point.measurement, &[',', ' ']);
    for (key, value) in &point.tags {
        let _ = write!(
            line,
            ",{}={}",
            escape(key, &[',', '=', ' ']),
            escape(value, &[',', '=', ' '])
        );
    }
    let _ = write!(line, " value={}i {}", point.fields.value, point.timestamp);
    line
}

/// Encode a batch, one point per line.
pub fn encode_batch(points: &[MetricPoint]) -> String {
    points
        .iter()
        .map(encode_point)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape(raw: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(raw.len() + 1);
    for c in raw.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    // A trailing backslash would escape the following separator.
    if raw.ends_with('\\') {
        out.push('\\');
    }
    out
}
