use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::allocator::UnallocatedEntry;
use crate::analytics::GridAnalytics;
use crate::grid::{LIBRARY, ScheduleGrid};
use crate::score::{QualityBand, ScoreBreakdown};
use crate::validator::Violation;

// Type aliases for clarity
pub type TeacherId = String;

/// Per-teacher set of slots in which that teacher's subjects may not be placed.
pub type ExclusionMap = HashMap<TeacherId, HashSet<Slot>>;

/// A teaching day of the fixed weekly template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Zero-based row index in the grid.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Half of a teaching day. FN covers periods 1-4, AN covers periods 5-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Session {
    #[serde(rename = "FN")]
    Forenoon,
    #[serde(rename = "AN")]
    Afternoon,
}

impl Session {
    /// The four periods making up this session, in order.
    pub fn periods(self) -> [Period; 4] {
        match self {
            Session::Forenoon => [Period(1), Period(2), Period(3), Period(4)],
            Session::Afternoon => [Period(5), Period(6), Period(7), Period(8)],
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Forenoon => write!(f, "FN"),
            Session::Afternoon => write!(f, "AN"),
        }
    }
}

/// Rejected period number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("period must be between 1 and 8, got {0}")]
pub struct InvalidPeriod(pub u8);

/// One of the eight daily periods, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Period(u8);

impl Period {
    pub const PER_DAY: u8 = 8;

    pub const ALL: [Period; 8] = [
        Period(1),
        Period(2),
        Period(3),
        Period(4),
        Period(5),
        Period(6),
        Period(7),
        Period(8),
    ];

    pub fn new(number: u8) -> Result<Self, InvalidPeriod> {
        if (1..=Self::PER_DAY).contains(&number) {
            Ok(Period(number))
        } else {
            Err(InvalidPeriod(number))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based column index in the grid.
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn session(self) -> Session {
        if self.0 <= 4 {
            Session::Forenoon
        } else {
            Session::Afternoon
        }
    }
}

impl TryFrom<u8> for Period {
    type Error = InvalidPeriod;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Period::new(value)
    }
}

impl From<Period> for u8 {
    fn from(period: Period) -> Self {
        period.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A (day, period) coordinate in the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct Slot {
    pub day: Day,
    pub period: Period,
}

impl Slot {
    pub fn new(day: Day, period: Period) -> Self {
        Self { day, period }
    }

    /// All 40 slots, day-major.
    pub fn all() -> impl Iterator<Item = Slot> {
        Day::ALL
            .into_iter()
            .flat_map(|day| Period::ALL.into_iter().map(move |period| Slot { day, period }))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.period)
    }
}

/// Whether a subject is taught as lectures or as a lab block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Theory,
    Lab,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectKind::Theory => write!(f, "theory"),
            SubjectKind::Lab => write!(f, "lab"),
        }
    }
}

/// A lecture subject needing a number of single periods each week.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TheorySubject {
    pub name: String,
    pub code: String,
    pub credit: u32,
    pub periods_per_week: u32,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub confirmed: bool,
}

impl TheorySubject {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        credit: u32,
        periods_per_week: u32,
    ) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            credit,
            periods_per_week,
            teacher_id: None,
            confirmed: false,
        }
    }

    pub fn with_teacher(mut self, teacher: impl Into<TeacherId>) -> Self {
        self.teacher_id = Some(teacher.into());
        self
    }
}

/// A lab occupying one fixed four-period session block.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabSubject {
    pub name: String,
    pub code: String,
    pub day: Day,
    pub session: Session,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub confirmed: bool,
}

impl LabSubject {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        day: Day,
        session: Session,
    ) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            day,
            session,
            floor: None,
            teacher_id: None,
            confirmed: false,
        }
    }

    pub fn with_teacher(mut self, teacher: impl Into<TeacherId>) -> Self {
        self.teacher_id = Some(teacher.into());
        self
    }

    pub fn with_floor(mut self, floor: impl Into<String>) -> Self {
        self.floor = Some(floor.into());
        self
    }
}

/// A subject name that cannot appear in a timetable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubjectNameError {
    #[error("subject name must not be empty")]
    Empty,
    #[error("'{0}' is reserved for free periods")]
    Reserved(String),
    #[error("subject '{0}' appears more than once")]
    Duplicate(String),
}

/// Rejects names that would be mistaken for an empty or Library cell.
pub fn check_subject_name(name: &str) -> Result<(), SubjectNameError> {
    if name.trim().is_empty() {
        return Err(SubjectNameError::Empty);
    }
    if name == LIBRARY {
        return Err(SubjectNameError::Reserved(name.to_string()));
    }
    Ok(())
}

/// Checks every name and that no name is shared across theory and labs.
///
/// Grid cells carry only the subject name, so two subjects with one name
/// would be counted as one by the per-day rules.
pub fn check_subject_names(
    theory: &[TheorySubject],
    labs: &[LabSubject],
) -> Result<(), SubjectNameError> {
    let mut seen = HashSet::new();
    let names = theory
        .iter()
        .map(|s| s.name.as_str())
        .chain(labs.iter().map(|l| l.name.as_str()));
    for name in names {
        check_subject_name(name)?;
        if !seen.insert(name) {
            return Err(SubjectNameError::Duplicate(name.to_string()));
        }
    }
    Ok(())
}

/// The complete input for a stateless solve request.
///
/// Every subject in the request is scheduled. The `teacherId` and
/// `confirmed` fields are carried for workload reporting only; a stateless
/// caller has already chosen what to schedule.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingInput {
    #[serde(default)]
    pub theory: Vec<TheorySubject>,
    #[serde(default)]
    pub labs: Vec<LabSubject>,
    #[serde(default)]
    pub exclusions: ExclusionMap,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub iterations: Option<usize>,
}

/// The final output of a generation run, ready for reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOutput {
    pub grid: ScheduleGrid,
    pub unallocated: Vec<UnallocatedEntry>,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub quality: QualityBand,
    pub violations: Vec<Violation>,
    pub workload: BTreeMap<TeacherId, u32>,
    pub analytics: GridAnalytics,
    pub iterations: usize,
    pub seed: u64,
}
