use itertools::Itertools;
use log::{trace, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::data::{Day, LabSubject, Session};
use crate::grid::ScheduleGrid;

/// Two labs booked into the same day and session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabConflict {
    pub first: String,
    pub second: String,
    pub day: Day,
    pub session: Session,
}

impl fmt::Display for LabConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} and {} both on {} {}",
            self.first, self.second, self.day, self.session
        )
    }
}

/// Every unordered pair of labs sharing a day and session, in input order.
pub fn find_conflicts(labs: &[LabSubject]) -> Vec<LabConflict> {
    labs.iter()
        .tuple_combinations()
        .filter(|(a, b)| a.day == b.day && a.session == b.session)
        .map(|(a, b)| LabConflict {
            first: a.name.clone(),
            second: b.name.clone(),
            day: a.day,
            session: a.session,
        })
        .collect()
}

/// Writes every lab block into a fresh grid.
///
/// The batch is all-or-nothing: if any two labs collide no grid is built and
/// the full conflict list is returned.
pub fn place_labs(labs: &[LabSubject]) -> Result<ScheduleGrid, Vec<LabConflict>> {
    let conflicts = find_conflicts(labs);
    if !conflicts.is_empty() {
        for conflict in &conflicts {
            warn!("Lab conflict: {}", conflict);
        }
        return Err(conflicts);
    }

    let mut grid = ScheduleGrid::new();
    for lab in labs {
        trace!("Placing lab {} on {} {}", lab.name, lab.day, lab.session);
        grid.fill_session(lab.day, lab.session, &lab.name);
    }
    Ok(grid)
}

/// Sessions taken by labs, grouped per day.
pub fn lab_sessions(labs: &[LabSubject]) -> HashMap<Day, Vec<Session>> {
    labs.iter().map(|lab| (lab.day, lab.session)).into_group_map()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Period, Slot};

    #[test]
    fn test_place_labs_writes_blocks() {
        let labs = vec![
            LabSubject::new("Physics Lab", "PH1302", Day::Monday, Session::Forenoon),
            LabSubject::new("Chemistry Lab", "CH1302", Day::Monday, Session::Afternoon),
            LabSubject::new("Workshop", "ME1302", Day::Thursday, Session::Afternoon),
        ];

        let grid = place_labs(&labs).unwrap();

        assert_eq!(grid.count_on_day("Physics Lab", Day::Monday), 4);
        assert_eq!(grid.count_on_day("Chemistry Lab", Day::Monday), 4);
        assert_eq!(grid.occurrences("Workshop"), 4);
        assert!(grid.is_free(Slot::new(Day::Thursday, Period::ALL[3])));
        assert!(grid.get(Slot::new(Day::Thursday, Period::ALL[4])).holds("Workshop"));
        assert_eq!(grid.cells().filter(|(_, c)| c.is_empty()).count(), 28);
    }

    #[test]
    fn test_same_day_and_session_is_rejected() {
        let labs = vec![
            LabSubject::new("Physics Lab", "PH1302", Day::Monday, Session::Forenoon),
            LabSubject::new("Chemistry Lab", "CH1302", Day::Monday, Session::Forenoon),
        ];

        let conflicts = place_labs(&labs).unwrap_err();

        assert_eq!(
            conflicts,
            vec![LabConflict {
                first: "Physics Lab".into(),
                second: "Chemistry Lab".into(),
                day: Day::Monday,
                session: Session::Forenoon,
            }]
        );
    }

    #[test]
    fn test_every_pair_is_reported() {
        let labs = vec![
            LabSubject::new("A", "A1", Day::Friday, Session::Afternoon),
            LabSubject::new("B", "B1", Day::Friday, Session::Afternoon),
            LabSubject::new("C", "C1", Day::Friday, Session::Afternoon),
            LabSubject::new("D", "D1", Day::Friday, Session::Forenoon),
        ];

        let pairs: Vec<(String, String)> = find_conflicts(&labs)
            .into_iter()
            .map(|c| (c.first, c.second))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "B".to_string()),
                ("A".to_string(), "C".to_string()),
                ("B".to_string(), "C".to_string()),
            ]
        );
    }

    #[test]
    fn test_conflict_display() {
        let conflict = LabConflict {
            first: "Physics Lab".into(),
            second: "Chemistry Lab".into(),
            day: Day::Monday,
            session: Session::Forenoon,
        };
        assert_eq!(
            conflict.to_string(),
            "Physics Lab and Chemistry Lab both on Monday FN"
        );
    }
}
