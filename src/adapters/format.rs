//! pt-BR rendering of metric values, deltas and quarter labels.

use crate::domain::metric::{DeltaKind, MetricKey, MetricKind};
use crate::domain::period::Quarter;

/// Rendering of an undefined value.
pub const UNDEFINED: &str = "-";

/// `1234567.891` with 2 decimals becomes `1.234.567,89`.
pub fn format_number(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let digits = int_part.len();
    let mut grouped = String::with_capacity(digits + digits / 3 + decimals + 2);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if let Some(frac) = frac_part {
        grouped.push(',');
        grouped.push_str(frac);
    }

    let is_zero = !fixed.bytes().any(|b| (b'1'..=b'9').contains(&b));
    if value < 0.0 && !is_zero {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Formats a metric value by kind. Percentages are stored as ratios.
pub fn format_value(value: Option<f64>, kind: MetricKind) -> String {
    let Some(v) = value else {
        return UNDEFINED.to_string();
    };
    match kind {
        MetricKind::Count => format_number(v, 0),
        MetricKind::Currency => format!("R$ {}", format_number(v, 2)),
        MetricKind::Percentage => format!("{}%", format_number(v * 100.0, 2)),
    }
}

pub fn format_metric(value: Option<f64>, metric: MetricKey) -> String {
    format_value(value, metric.kind())
}

/// Signed delta with a `%` or ` p.p.` suffix. Both kinds arrive already
/// scaled to percent.
pub fn format_delta(delta: Option<f64>, kind: DeltaKind) -> String {
    let Some(d) = delta else {
        return UNDEFINED.to_string();
    };
    let suffix = match kind {
        DeltaKind::Relative => "%",
        DeltaKind::PercentagePoints => " p.p.",
    };
    let body = format_number(d, 2);
    if body.starts_with('-') {
        format!("{body}{suffix}")
    } else {
        format!("+{body}{suffix}")
    }
}

/// Short axis label: 2024-Q1 becomes `1T24`.
pub fn quarter_label(quarter: Quarter) -> String {
    format!("{}T{:02}", quarter.index(), quarter.year().rem_euclid(100))
}
