//! Read-only metrics over a finished timetable.

use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::data::{Day, LabSubject, Session, TeacherId, TheorySubject};
use crate::grid::{Cell, ScheduleGrid};

const SLOTS_PER_WEEK: usize = 40;
const SLOTS_PER_DAY: usize = 8;
const SLOTS_PER_SESSION_WEEK: usize = 20;

/// Subject name to teacher for every subject that has one.
pub fn subject_teachers(
    theory: &[TheorySubject],
    labs: &[LabSubject],
) -> HashMap<String, TeacherId> {
    let theory = theory
        .iter()
        .filter_map(|s| s.teacher_id.clone().map(|t| (s.name.clone(), t)));
    let labs = labs
        .iter()
        .filter_map(|l| l.teacher_id.clone().map(|t| (l.name.clone(), t)));
    theory.chain(labs).collect()
}

/// Periods per week for each teacher, counted through `subject_teachers`.
///
/// Library and empty cells, and subjects with no known teacher, are skipped.
pub fn teacher_workload(
    grid: &ScheduleGrid,
    subject_teachers: &HashMap<String, TeacherId>,
) -> BTreeMap<TeacherId, u32> {
    let mut workload = BTreeMap::new();
    for (_, cell) in grid.cells() {
        if let Some(teacher) = cell.subject_name().and_then(|s| subject_teachers.get(s)) {
            *workload.entry(teacher.clone()).or_insert(0) += 1;
        }
    }
    workload
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Utilization {
    pub filled: usize,
    pub library: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLoad {
    pub day: Day,
    pub filled: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLoad {
    pub forenoon: usize,
    pub afternoon: usize,
    pub forenoon_percent: f64,
    pub afternoon_percent: f64,
}

/// Forenoon/afternoon split of one subject's periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDistribution {
    pub subject: String,
    pub forenoon: usize,
    pub afternoon: usize,
    pub total: usize,
    pub balance: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridAnalytics {
    pub utilization: Utilization,
    pub daily_load: Vec<DailyLoad>,
    pub session_load: SessionLoad,
    pub subjects: Vec<SubjectDistribution>,
}

impl GridAnalytics {
    pub fn calculate(grid: &ScheduleGrid) -> Self {
        Self {
            utilization: utilization(grid),
            daily_load: daily_load(grid),
            session_load: session_load(grid),
            subjects: subject_distribution(grid),
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64 * 100.0
}

pub fn utilization(grid: &ScheduleGrid) -> Utilization {
    let (filled, library) = grid.cells().fold((0, 0), |(filled, library), (_, cell)| match cell {
        Cell::Subject(_) => (filled + 1, library),
        Cell::Library => (filled, library + 1),
        Cell::Empty => (filled, library),
    });
    Utilization {
        filled,
        library,
        percent: percent(filled, SLOTS_PER_WEEK),
    }
}

pub fn daily_load(grid: &ScheduleGrid) -> Vec<DailyLoad> {
    Day::ALL
        .into_iter()
        .map(|day| {
            let filled = grid
                .row(day)
                .iter()
                .filter(|c| c.subject_name().is_some())
                .count();
            DailyLoad {
                day,
                filled,
                percent: percent(filled, SLOTS_PER_DAY),
            }
        })
        .collect()
}

pub fn session_load(grid: &ScheduleGrid) -> SessionLoad {
    let counts = grid
        .cells()
        .filter(|(_, cell)| cell.subject_name().is_some())
        .map(|(slot, _)| slot.period.session())
        .counts();
    let forenoon = counts.get(&Session::Forenoon).copied().unwrap_or(0);
    let afternoon = counts.get(&Session::Afternoon).copied().unwrap_or(0);
    SessionLoad {
        forenoon,
        afternoon,
        forenoon_percent: percent(forenoon, SLOTS_PER_SESSION_WEEK),
        afternoon_percent: percent(afternoon, SLOTS_PER_SESSION_WEEK),
    }
}

/// Per-subject split in order of first appearance.
pub fn subject_distribution(grid: &ScheduleGrid) -> Vec<SubjectDistribution> {
    let mut order: Vec<&str> = Vec::new();
    let mut tally: HashMap<&str, (usize, usize)> = HashMap::new();

    for (slot, cell) in grid.cells() {
        let Some(name) = cell.subject_name() else {
            continue;
        };
        let entry = tally.entry(name).or_insert_with(|| {
            order.push(name);
            (0, 0)
        });
        match slot.period.session() {
            Session::Forenoon => entry.0 += 1,
            Session::Afternoon => entry.1 += 1,
        }
    }

    order
        .into_iter()
        .map(|name| {
            let (forenoon, afternoon) = tally[name];
            SubjectDistribution {
                subject: name.to_string(),
                forenoon,
                afternoon,
                total: forenoon + afternoon,
                balance: forenoon.abs_diff(afternoon),
            }
        })
        .collect()
}
