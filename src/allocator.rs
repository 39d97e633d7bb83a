//! Randomized greedy placement of theory subjects.
//!
//! Subjects are handled largest-first. Each one gets a shuffled list of the
//! slots it may legally use, then takes periods one at a time, always on the
//! day where it currently has the fewest periods. A subject may hold at most
//! two periods per day, and two periods on one day must share a session.

use itertools::Itertools;
use log::{trace, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::data::{Day, ExclusionMap, LabSubject, Session, Slot, TheorySubject};
use crate::grid::{Cell, ScheduleGrid};
use crate::labs::lab_sessions;

/// Periods one subject may take on a single day.
pub const MAX_PERIODS_PER_DAY: usize = 2;

/// A subject whose weekly periods could not all be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnallocatedEntry {
    pub subject: String,
    pub needed: u32,
    pub allocated: u32,
    pub remaining: u32,
}

/// Grid after theory placement, plus whatever could not be placed.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub grid: ScheduleGrid,
    pub unallocated: Vec<UnallocatedEntry>,
}

/// Places `subjects` into `grid`, which must already hold the lab blocks.
///
/// Every cell still empty afterwards becomes Library. The only randomness is
/// the shuffle of each subject's candidate slots, so a seeded `rng` makes the
/// result reproducible.
pub fn allocate_theory<R: Rng + ?Sized>(
    mut grid: ScheduleGrid,
    subjects: &[TheorySubject],
    labs: &[LabSubject],
    exclusions: &ExclusionMap,
    rng: &mut R,
) -> Allocation {
    let lab_days = lab_sessions(labs);
    let mut unallocated = Vec::new();

    for subject in subjects
        .iter()
        .sorted_by_key(|s| Reverse(s.periods_per_week))
    {
        let mut candidates = candidate_slots(&grid, &lab_days, subject, exclusions);
        candidates.shuffle(rng);
        trace!(
            "{}: {} candidate slots for {} periods",
            subject.name,
            candidates.len(),
            subject.periods_per_week
        );

        let allocated = place_subject(&mut grid, subject, candidates);
        if allocated < subject.periods_per_week {
            warn!(
                "{}: allocated {}/{} periods",
                subject.name, allocated, subject.periods_per_week
            );
            unallocated.push(UnallocatedEntry {
                subject: subject.name.clone(),
                needed: subject.periods_per_week,
                allocated,
                remaining: subject.periods_per_week - allocated,
            });
        }
    }

    grid.fill_empty(Cell::Library);
    Allocation { grid, unallocated }
}

/// Free slots a subject may use, day-major, before shuffling.
///
/// Days with a lab only offer the session the lab does not occupy. Slots
/// where the subject's teacher is excluded are dropped.
fn candidate_slots(
    grid: &ScheduleGrid,
    lab_days: &HashMap<Day, Vec<Session>>,
    subject: &TheorySubject,
    exclusions: &ExclusionMap,
) -> Vec<Slot> {
    let blocked = subject
        .teacher_id
        .as_ref()
        .and_then(|teacher| exclusions.get(teacher));

    Slot::all()
        .filter(|slot| match lab_days.get(&slot.day) {
            Some(sessions) => !sessions.contains(&slot.period.session()),
            None => true,
        })
        .filter(|&slot| grid.is_free(slot))
        .filter(|slot| blocked.is_none_or(|set| !set.contains(slot)))
        .collect()
}

fn place_subject(
    grid: &mut ScheduleGrid,
    subject: &TheorySubject,
    mut remaining: Vec<Slot>,
) -> u32 {
    let mut day_count = [0usize; 5];
    let mut day_session: [Option<Session>; 5] = [None; 5];
    let max_attempts = remaining.len() * 3;
    let mut attempts = 0;
    let mut allocated = 0;

    while allocated < subject.periods_per_week && attempts < max_attempts {
        attempts += 1;

        // min_by_key keeps the first of equal keys, so shuffle order breaks ties
        let chosen = remaining
            .iter()
            .copied()
            .filter(|&slot| {
                let d = slot.day.index();
                day_count[d] < MAX_PERIODS_PER_DAY
                    && grid.is_free(slot)
                    && (day_count[d] == 0 || day_session[d] == Some(slot.period.session()))
            })
            .min_by_key(|slot| day_count[slot.day.index()]);

        let Some(slot) = chosen else {
            break;
        };

        grid.set(slot, Cell::subject(&subject.name));
        let d = slot.day.index();
        day_count[d] += 1;
        day_session[d] = Some(slot.period.session());
        allocated += 1;
        remaining.retain(|s| *s != slot);
        trace!("{}: placed at {}", subject.name, slot);
    }

    allocated
}
