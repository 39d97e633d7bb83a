//! Post-hoc constraint check over a finished grid.
//!
//! Reads only the grid and the subject names; it never relies on what the
//! allocator believed it placed.

use serde::Serialize;
use std::fmt;

use crate::allocator::MAX_PERIODS_PER_DAY;
use crate::data::{Day, TheorySubject};
use crate::grid::ScheduleGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// More than two periods of one subject on a day.
    MaxPerDay,
    /// Two periods of one subject on a day in different sessions.
    SessionSplit,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::MaxPerDay => write!(f, "max_per_day"),
            ViolationKind::SessionSplit => write!(f, "session_split"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub subject: String,
    pub day: Day,
    pub count: usize,
    pub message: String,
}

/// Scans `grid` for per-day cap and session-split violations.
///
/// All `max_per_day` entries come first, then all `session_split` entries,
/// each in subject-then-day order. An empty list means every constraint holds.
pub fn validate(grid: &ScheduleGrid, subjects: &[TheorySubject]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for subject in subjects {
        for day in Day::ALL {
            let count = grid.count_on_day(&subject.name, day);
            if count > MAX_PERIODS_PER_DAY {
                violations.push(Violation {
                    kind: ViolationKind::MaxPerDay,
                    subject: subject.name.clone(),
                    day,
                    count,
                    message: format!(
                        "{} appears {} times on {} (max: {})",
                        subject.name, count, day, MAX_PERIODS_PER_DAY
                    ),
                });
            }
        }
    }

    for subject in subjects {
        for day in Day::ALL {
            let periods = grid.periods_of(&subject.name, day);
            if let [first, second] = periods[..] {
                if first.session() != second.session() {
                    violations.push(Violation {
                        kind: ViolationKind::SessionSplit,
                        subject: subject.name.clone(),
                        day,
                        count: 2,
                        message: format!("{} on {} spans both sessions", subject.name, day),
                    });
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Period, Slot};
    use crate::grid::Cell;

    fn put(grid: &mut ScheduleGrid, name: &str, day: Day, periods: &[u8]) {
        for &p in periods {
            grid.set(Slot::new(day, Period::new(p).unwrap()), Cell::subject(name));
        }
    }

    fn subjects() -> Vec<TheorySubject> {
        vec![
            TheorySubject::new("Maths", "MA101", 4, 4),
            TheorySubject::new("Physics", "PH101", 3, 3),
        ]
    }

    #[test]
    fn test_clean_grid_has_no_violations() {
        let mut grid = ScheduleGrid::new();
        put(&mut grid, "Maths", Day::Monday, &[1, 2]);
        put(&mut grid, "Maths", Day::Tuesday, &[6]);
        put(&mut grid, "Physics", Day::Monday, &[5, 8]);
        grid.fill_empty(Cell::Library);

        assert!(validate(&grid, &subjects()).is_empty());
    }

    #[test]
    fn test_max_per_day() {
        let mut grid = ScheduleGrid::new();
        put(&mut grid, "Maths", Day::Thursday, &[1, 2, 3]);

        let violations = validate(&grid, &subjects());

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MaxPerDay);
        assert_eq!(violations[0].day, Day::Thursday);
        assert_eq!(violations[0].count, 3);
        assert_eq!(violations[0].message, "Maths appears 3 times on Thursday (max: 2)");
    }

    #[test]
    fn test_session_split() {
        let mut grid = ScheduleGrid::new();
        put(&mut grid, "Physics", Day::Friday, &[4, 5]);

        let violations = validate(&grid, &subjects());

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::SessionSplit);
        assert_eq!(violations[0].subject, "Physics");
        assert_eq!(violations[0].message, "Physics on Friday spans both sessions");
    }

    #[test]
    fn test_cap_violations_listed_before_splits() {
        let mut grid = ScheduleGrid::new();
        put(&mut grid, "Maths", Day::Monday, &[1, 5]);
        put(&mut grid, "Physics", Day::Tuesday, &[1, 2, 3]);

        let kinds: Vec<ViolationKind> = validate(&grid, &subjects())
            .into_iter()
            .map(|v| v.kind)
            .collect();

        assert_eq!(kinds, vec![ViolationKind::MaxPerDay, ViolationKind::SessionSplit]);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let mut grid = ScheduleGrid::new();
        put(&mut grid, "Maths", Day::Monday, &[1, 5]);
        put(&mut grid, "Maths", Day::Wednesday, &[1, 2, 3, 4]);
        let snapshot = grid.clone();

        let first = validate(&grid, &subjects());
        let second = validate(&grid, &subjects());

        assert_eq!(first, second);
        assert_eq!(grid, snapshot);
    }

    #[test]
    fn test_kind_wire_name() {
        assert_eq!(
            serde_json::to_value(ViolationKind::SessionSplit).unwrap(),
            "session_split"
        );
    }
}
