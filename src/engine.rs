use serde::Serialize;
use serde_json::Value;

use crate::models::{Assignment, Config};

/// 1-decimal rounding used for displayed grades: `floor(10x + 0.5) / 10`.
pub fn round1(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

/// 2-decimal rounding used for subject averages.
pub fn round2(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GradeResult {
    pub note: f64,
    /// Percentage of max points, 0..100, one decimal.
    pub percentage: f64,
    pub label: String,
}

/// Convert raw points to a grade on a named linear scale.
///
/// Each scale maps its configured pass threshold to 4.0 and 100% to 6.0:
/// `note = a*p + b` with `a = 2/(1-t)`, `b = 6 - a` (the 60% scale is
/// `5p + 1`, the 50% scale `4p + 2`). Unknown scale names use the 60%
/// coefficients. Returns `None` when points is absent/non-finite/negative or
/// max_points is absent/non-positive; 0 points is valid and grades 1.0.
pub fn grade_for_points(
    points: Option<f64>,
    max_points: Option<f64>,
    scale_type: &str,
    config: &Config,
) -> Option<GradeResult> {
    let points = points.filter(|p| p.is_finite() && *p >= 0.0)?;
    let max_points = max_points.filter(|m| m.is_finite() && *m > 0.0)?;

    let threshold = config
        .scale_threshold(scale_type)
        .filter(|t| *t > 0.0 && *t < 1.0)
        .unwrap_or(0.6);
    let a = 2.0 / (1.0 - threshold);
    let b = 6.0 - a;

    let percentage = points / max_points;
    let note = (a * percentage + b).clamp(1.0, 6.0);

    Some(GradeResult {
        note: round1(note),
        percentage: round1(percentage * 100.0),
        label: config.scale_label(scale_type).unwrap_or_default(),
    })
}

/// Grade cells come from hand-edited grids; accept numbers and numeric
/// strings, skip anything else.
fn grade_value(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|g| g.is_finite())
}

/// Weighted mean of the student's grades in one subject:
/// `sum(grade*weight) / sum(weight)`, two decimals. `None` when the student
/// has no graded assignment there.
pub fn weighted_average(assignments: &[Assignment], student_id: &str, subject: &str) -> Option<f64> {
    let mut total_weighted = 0.0;
    let mut total_weight = 0.0;

    for a in assignments {
        if a.subject != subject {
            continue;
        }
        let Some(grade) = a.grades.get(student_id).and_then(grade_value) else {
            continue;
        };
        let weight = if a.weight > 0.0 { a.weight } else { 1.0 };
        total_weighted += grade * weight;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        Some(round2(total_weighted / total_weight))
    } else {
        None
    }
}

/// Report-card rounding to the nearest half grade; absent values pass
/// through unchanged.
pub fn round_to_half(value: Option<f64>) -> Option<f64> {
    value.map(|v| (v * 2.0).round() / 2.0)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Trend {
    pub direction: TrendDirection,
    pub delta: f64,
}

/// Compare the two most recent (by assignment date) grades of a student in a
/// subject. A ±0.2 dead zone counts as flat. `None` with fewer than two
/// graded assignments.
pub fn trend(assignments: &[Assignment], student_id: &str, subject: &str) -> Option<Trend> {
    let mut graded: Vec<(&str, f64)> = assignments
        .iter()
        .filter(|a| a.subject == subject)
        .filter_map(|a| {
            let grade = a.grades.get(student_id).and_then(grade_value)?;
            Some((a.date.as_deref().unwrap_or(""), grade))
        })
        .collect();

    if graded.len() < 2 {
        return None;
    }
    // ISO-8601 dates order lexically; undated entries sort oldest.
    graded.sort_by(|a, b| b.0.cmp(a.0));

    let newest = graded[0].1;
    let previous = graded[1].1;
    let delta = newest - previous;

    let direction = if delta > 0.2 {
        TrendDirection::Up
    } else if delta < -0.2 {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    };
    Some(Trend { direction, delta })
}
