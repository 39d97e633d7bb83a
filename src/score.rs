//! Timetable quality score.
//!
//! | Part | Max | Rule |
//! |------|-----|------|
//! | Completeness | 40 | share of required periods actually placed |
//! | Distribution | 30 | minus 5 per subject whose busiest and quietest used day differ by more than one |
//! | Constraints | 30 | minus 5 per violation |
//!
//! The total is clamped to `0..=100`.

use serde::Serialize;

use crate::allocator::UnallocatedEntry;
use crate::data::TheorySubject;
use crate::grid::ScheduleGrid;
use crate::validator::Violation;

pub const COMPLETENESS_WEIGHT: f64 = 40.0;
pub const DISTRIBUTION_WEIGHT: f64 = 30.0;
pub const CONSTRAINT_WEIGHT: f64 = 30.0;
const PENALTY: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub completeness: f64,
    pub distribution: f64,
    pub constraints: f64,
    pub total: f64,
}

/// Scores a finished grid.
///
/// `violations` should come from [`crate::validator::validate`] on the same
/// grid and subjects.
pub fn evaluate(
    grid: &ScheduleGrid,
    subjects: &[TheorySubject],
    unallocated: &[UnallocatedEntry],
    violations: &[Violation],
) -> ScoreBreakdown {
    let completeness = completeness(subjects, unallocated);
    let distribution = distribution(grid, subjects);
    let constraints = (CONSTRAINT_WEIGHT - PENALTY * violations.len() as f64).max(0.0);

    ScoreBreakdown {
        completeness,
        distribution,
        constraints,
        total: (completeness + distribution + constraints).clamp(0.0, 100.0),
    }
}

fn completeness(subjects: &[TheorySubject], unallocated: &[UnallocatedEntry]) -> f64 {
    let needed: u64 = subjects.iter().map(|s| u64::from(s.periods_per_week)).sum();
    if needed == 0 {
        return COMPLETENESS_WEIGHT;
    }
    let missing: u64 = unallocated.iter().map(|u| u64::from(u.remaining)).sum();
    let allocated = needed.saturating_sub(missing);
    COMPLETENESS_WEIGHT * allocated as f64 / needed as f64
}

fn distribution(grid: &ScheduleGrid, subjects: &[TheorySubject]) -> f64 {
    let uneven = subjects
        .iter()
        .filter(|subject| {
            let counts = grid.day_counts(&subject.name);
            let max = counts.iter().copied().max().unwrap_or(0);
            let min = counts.iter().copied().filter(|&c| c > 0).min().unwrap_or(0);
            max - min > 1
        })
        .count();
    (DISTRIBUTION_WEIGHT - PENALTY * uneven as f64).max(0.0)
}

/// Coarse rating for displaying a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QualityBand {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl QualityBand {
    pub fn of(score: f64) -> Self {
        if score >= 90.0 {
            QualityBand::Excellent
        } else if score >= 75.0 {
            QualityBand::Good
        } else if score >= 60.0 {
            QualityBand::Fair
        } else {
            QualityBand::NeedsImprovement
        }
    }
}
