//! Splits an inclusive numeric range into contiguous blocks by percentage.

use serde::Serialize;

use crate::error::{ToolkitError, ToolkitResult};

const PERCENT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSegment {
    pub start: i64,
    pub end: i64,
    pub count: u64,
    pub percentage: f64,
}

fn invalid(msg: impl Into<String>) -> ToolkitError {
    ToolkitError::InvalidRange(msg.into())
}

/// Parses `"50, 30%; 20"` style input.
pub fn parse_percentages(input: &str) -> ToolkitResult<Vec<f64>> {
    let values = input
        .split(|ch: char| ch == ',' || ch == ';' || ch.is_whitespace())
        .map(|token| token.trim().trim_end_matches('%'))
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| invalid(format!("'{token}' is not a percentage")))
        })
        .collect::<ToolkitResult<Vec<_>>>()?;
    if values.is_empty() {
        return Err(invalid("at least one percentage is required"));
    }
    Ok(values)
}

/// Splits `start..=end` so block `i` holds `floor(total * p_i / 100)` numbers and
/// the last block absorbs the rounding remainder.
pub fn split_range(start: i64, end: i64, percentages: &[f64]) -> ToolkitResult<Vec<RangeSegment>> {
    if start > end {
        return Err(invalid("start must be less than or equal to end"));
    }
    if percentages.is_empty() {
        return Err(invalid("at least one percentage is required"));
    }
    if let Some(bad) = percentages.iter().find(|p| !p.is_finite() || **p <= 0.0) {
        return Err(invalid(format!("percentage {bad} must be greater than zero")));
    }
    let sum: f64 = percentages.iter().sum();
    if (sum - 100.0).abs() > PERCENT_TOLERANCE {
        return Err(invalid(format!("percentages add up to {sum}, expected 100")));
    }

    let total = (i128::from(end) - i128::from(start) + 1) as u128;
    let mut segments = Vec::with_capacity(percentages.len());
    let mut next = i128::from(start);
    let mut assigned: u128 = 0;
    for (idx, &pct) in percentages.iter().enumerate() {
        // `assigned <= total` holds on every iteration because of the overshoot check below.
        let remaining = total - assigned;
        let count = if idx + 1 == percentages.len() {
            remaining
        } else {
            ((total as f64) * pct / 100.0).floor() as u128
        };
        if count == 0 {
            return Err(invalid(format!(
                "range of {total} numbers is too small for a {pct}% block"
            )));
        }
        if count > remaining {
            return Err(invalid(format!(
                "a {pct}% block needs {count} numbers but only {remaining} remain"
            )));
        }
        let seg_end = next + count as i128 - 1;
        segments.push(RangeSegment {
            start: next as i64,
            end: seg_end as i64,
            count: count as u64,
            percentage: pct,
        });
        assigned += count;
        next = seg_end + 1;
    }
    Ok(segments)
}
