use serde::{Deserialize, Serialize};

use crate::data::{Day, Period, Session, Slot};

/// Cell text used for periods left free after allocation.
pub const LIBRARY: &str = "Library";

/// Contents of one grid cell.
///
/// On the wire a cell is a plain string: `""` when empty, `"Library"`, or the
/// subject name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Cell {
    #[default]
    Empty,
    Library,
    Subject(String),
}

impl Cell {
    pub fn subject(name: impl Into<String>) -> Self {
        Cell::Subject(name.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Subject name held by this cell, if any.
    pub fn subject_name(&self) -> Option<&str> {
        match self {
            Cell::Subject(name) => Some(name),
            _ => None,
        }
    }

    pub fn holds(&self, name: &str) -> bool {
        self.subject_name() == Some(name)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" => Cell::Empty,
            LIBRARY => Cell::Library,
            _ => Cell::Subject(value),
        }
    }
}

impl From<Cell> for String {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => String::new(),
            Cell::Library => LIBRARY.to_string(),
            Cell::Subject(name) => name,
        }
    }
}

/// The 5 × 8 weekly timetable. Rows are days, columns are periods.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ScheduleGrid {
    cells: [[Cell; 8]; 5],
}

impl ScheduleGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> &Cell {
        &self.cells[slot.day.index()][slot.period.index()]
    }

    pub fn set(&mut self, slot: Slot, cell: Cell) {
        self.cells[slot.day.index()][slot.period.index()] = cell;
    }

    pub fn is_free(&self, slot: Slot) -> bool {
        self.get(slot).is_empty()
    }

    /// The eight cells of one day.
    pub fn row(&self, day: Day) -> &[Cell; 8] {
        &self.cells[day.index()]
    }

    /// Every cell with its coordinate, day-major.
    pub fn cells(&self) -> impl Iterator<Item = (Slot, &Cell)> {
        Slot::all().map(move |slot| (slot, self.get(slot)))
    }

    /// Periods on `day` holding `name`, in period order.
    pub fn periods_of(&self, name: &str, day: Day) -> Vec<Period> {
        Period::ALL
            .into_iter()
            .filter(|&period| self.get(Slot::new(day, period)).holds(name))
            .collect()
    }

    pub fn count_on_day(&self, name: &str, day: Day) -> usize {
        self.row(day).iter().filter(|cell| cell.holds(name)).count()
    }

    /// Occurrences of `name` per day, indexed by `Day::index`.
    pub fn day_counts(&self, name: &str) -> [usize; 5] {
        Day::ALL.map(|day| self.count_on_day(name, day))
    }

    pub fn occurrences(&self, name: &str) -> usize {
        self.cells().filter(|(_, cell)| cell.holds(name)).count()
    }

    /// Writes `name` into all four periods of a session block.
    pub fn fill_session(&mut self, day: Day, session: Session, name: &str) {
        for period in session.periods() {
            self.set(Slot::new(day, period), Cell::subject(name));
        }
    }

    /// Replaces every empty cell with `cell`, returning how many were filled.
    pub fn fill_empty(&mut self, cell: Cell) -> usize {
        let mut filled = 0;
        for row in self.cells.iter_mut() {
            for target in row.iter_mut().filter(|c| c.is_empty()) {
                *target = cell.clone();
                filled += 1;
            }
        }
        filled
    }

    pub fn has_empty(&self) -> bool {
        self.cells().any(|(_, cell)| cell.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(day: Day, period: u8) -> Slot {
        Slot::new(day, Period::new(period).unwrap())
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = ScheduleGrid::new();
        assert_eq!(grid.cells().count(), 40);
        assert!(grid.cells().all(|(_, cell)| cell.is_empty()));
    }

    #[test]
    fn test_fill_session_and_counts() {
        let mut grid = ScheduleGrid::new();
        grid.fill_session(Day::Wednesday, Session::Afternoon, "Physics Lab");

        assert_eq!(grid.count_on_day("Physics Lab", Day::Wednesday), 4);
        assert_eq!(grid.occurrences("Physics Lab"), 4);
        assert_eq!(
            grid.periods_of("Physics Lab", Day::Wednesday)
                .iter()
                .map(|p| p.number())
                .collect::<Vec<_>>(),
            vec![5, 6, 7, 8]
        );
        assert!(grid.is_free(slot(Day::Wednesday, 4)));
    }

    #[test]
    fn test_fill_empty_leaves_subjects() {
        let mut grid = ScheduleGrid::new();
        grid.set(slot(Day::Monday, 1), Cell::subject("Maths"));

        let filled = grid.fill_empty(Cell::Library);

        assert_eq!(filled, 39);
        assert!(!grid.has_empty());
        assert!(grid.get(slot(Day::Monday, 1)).holds("Maths"));
        assert_eq!(grid.get(slot(Day::Monday, 2)), &Cell::Library);
    }

    #[test]
    fn test_cell_wire_format() {
        let mut grid = ScheduleGrid::new();
        grid.set(slot(Day::Monday, 1), Cell::subject("Maths"));
        grid.set(slot(Day::Monday, 2), Cell::Library);

        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json[0][0], "Maths");
        assert_eq!(json[0][1], "Library");
        assert_eq!(json[0][2], "");

        let back: ScheduleGrid = serde_json::from_value(json).unwrap();
        assert_eq!(back, grid);
    }
}
