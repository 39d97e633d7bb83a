//! Planning workspace: the subjects being configured, who teaches them, and
//! when each teacher is unavailable.
//!
//! A subject only takes part in generation once a teacher has been assigned
//! to it through [`Planner::assign_teacher`], which is also the only way its
//! `confirmed` flag becomes true.

use log::info;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::analytics::{subject_teachers, teacher_workload};
use crate::data::{
    ExclusionMap, LabSubject, SchedulingOutput, Slot, SubjectKind, TeacherId, TheorySubject,
    check_subject_name,
};
use crate::grid::ScheduleGrid;
use crate::registry::{Availability, RegistryError, TeacherRecord, TeacherRegistry};
use crate::solver::{GenerationError, GenerationInput, OptimizerConfig, optimize, report};
use crate::validator::{Violation, validate};

/// Multiplier turning the generation counter into a default seed.
const SEED_STEP: u64 = 42;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlannerError {
    #[error("unknown subject '{0}'")]
    UnknownSubject(String),
    #[error("subject '{0}' already exists")]
    DuplicateSubject(String),
    #[error("invalid subject: {0}")]
    InvalidSubject(String),
    #[error("subject '{0}' already has a confirmed teacher")]
    AlreadyConfirmed(String),
    #[error("subject '{0}' has no confirmed teacher")]
    NotConfirmed(String),
    #[error("nothing to schedule: no subject has a confirmed teacher")]
    NothingConfirmed,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// A teacher's assignments and remaining capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherStatus {
    pub teacher_id: TeacherId,
    #[serde(flatten)]
    pub record: TeacherRecord,
    pub availability: Availability,
}

#[derive(Debug, Clone, Copy)]
enum SubjectRef {
    Theory(usize),
    Lab(usize),
}

#[derive(Debug, Clone, Default)]
pub struct Planner {
    theory: Vec<TheorySubject>,
    labs: Vec<LabSubject>,
    registry: TeacherRegistry,
    exclusions: ExclusionMap,
    config: OptimizerConfig,
    generation_count: u64,
}

impl Planner {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn theory_subjects(&self) -> &[TheorySubject] {
        &self.theory
    }

    pub fn lab_subjects(&self) -> &[LabSubject] {
        &self.labs
    }

    pub fn generation_count(&self) -> u64 {
        self.generation_count
    }

    fn find(&self, name: &str) -> Option<SubjectRef> {
        if let Some(i) = self.theory.iter().position(|s| s.name == name) {
            return Some(SubjectRef::Theory(i));
        }
        self.labs
            .iter()
            .position(|l| l.name == name)
            .map(SubjectRef::Lab)
    }

    fn check_new_name(&self, name: &str) -> Result<(), PlannerError> {
        check_subject_name(name).map_err(|err| PlannerError::InvalidSubject(err.to_string()))?;
        if self.find(name).is_some() {
            return Err(PlannerError::DuplicateSubject(name.to_string()));
        }
        Ok(())
    }

    /// Registers a theory subject. It starts unassigned.
    pub fn add_theory_subject(&mut self, mut subject: TheorySubject) -> Result<(), PlannerError> {
        self.check_new_name(&subject.name)?;
        if subject.periods_per_week == 0 {
            return Err(PlannerError::InvalidSubject(format!(
                "'{}' needs at least one period per week",
                subject.name
            )));
        }
        subject.teacher_id = None;
        subject.confirmed = false;
        self.theory.push(subject);
        Ok(())
    }

    /// Registers a lab subject. It starts unassigned.
    pub fn add_lab_subject(&mut self, mut lab: LabSubject) -> Result<(), PlannerError> {
        self.check_new_name(&lab.name)?;
        lab.teacher_id = None;
        lab.confirmed = false;
        self.labs.push(lab);
        Ok(())
    }

    /// Deletes a subject, releasing its teacher if it had one.
    pub fn remove_subject(&mut self, name: &str) -> Result<(), PlannerError> {
        let teacher = match self.find(name) {
            Some(SubjectRef::Theory(i)) => self.theory.remove(i).teacher_id,
            Some(SubjectRef::Lab(i)) => self.labs.remove(i).teacher_id,
            None => return Err(PlannerError::UnknownSubject(name.to_string())),
        };
        if let Some(teacher) = teacher {
            self.registry.unassign(&teacher, name);
        }
        Ok(())
    }

    /// Assigns `teacher` to `subject` and confirms the subject.
    pub fn assign_teacher(&mut self, subject: &str, teacher: &str) -> Result<(), PlannerError> {
        let found = self
            .find(subject)
            .ok_or_else(|| PlannerError::UnknownSubject(subject.to_string()))?;
        let (confirmed, kind) = match found {
            SubjectRef::Theory(i) => (self.theory[i].confirmed, SubjectKind::Theory),
            SubjectRef::Lab(i) => (self.labs[i].confirmed, SubjectKind::Lab),
        };
        if confirmed {
            return Err(PlannerError::AlreadyConfirmed(subject.to_string()));
        }

        self.registry.assign(teacher, subject, kind)?;
        match found {
            SubjectRef::Theory(i) => {
                self.theory[i].teacher_id = Some(teacher.to_string());
                self.theory[i].confirmed = true;
            }
            SubjectRef::Lab(i) => {
                self.labs[i].teacher_id = Some(teacher.to_string());
                self.labs[i].confirmed = true;
            }
        }
        info!("Confirmed {} '{}' with teacher '{}'", kind, subject, teacher);
        Ok(())
    }

    /// Releases the teacher of `subject`, returning who it was.
    pub fn unassign_teacher(&mut self, subject: &str) -> Result<TeacherId, PlannerError> {
        let found = self
            .find(subject)
            .ok_or_else(|| PlannerError::UnknownSubject(subject.to_string()))?;
        let (teacher_id, confirmed) = match found {
            SubjectRef::Theory(i) => {
                let s = &mut self.theory[i];
                (&mut s.teacher_id, &mut s.confirmed)
            }
            SubjectRef::Lab(i) => {
                let l = &mut self.labs[i];
                (&mut l.teacher_id, &mut l.confirmed)
            }
        };
        if !*confirmed {
            return Err(PlannerError::NotConfirmed(subject.to_string()));
        }
        let Some(teacher) = teacher_id.take() else {
            return Err(PlannerError::NotConfirmed(subject.to_string()));
        };
        *confirmed = false;

        self.registry.unassign(&teacher, subject);
        info!("Released '{}' from '{}'", teacher, subject);
        Ok(teacher)
    }

    pub fn teacher(&self, teacher: &str) -> TeacherStatus {
        TeacherStatus {
            teacher_id: teacher.to_string(),
            record: self.registry.query(teacher),
            availability: self.registry.availability(teacher),
        }
    }

    /// Replaces the slots in which `teacher` must not be scheduled.
    ///
    /// An empty set clears the teacher's exclusions.
    pub fn set_exclusions(&mut self, teacher: &str, slots: HashSet<Slot>) {
        if slots.is_empty() {
            self.exclusions.remove(teacher);
        } else {
            self.exclusions.insert(teacher.to_string(), slots);
        }
    }

    pub fn exclusions(&self, teacher: &str) -> Option<&HashSet<Slot>> {
        self.exclusions.get(teacher)
    }

    pub fn confirmed_theory(&self) -> Vec<TheorySubject> {
        self.theory.iter().filter(|s| s.confirmed).cloned().collect()
    }

    pub fn confirmed_labs(&self) -> Vec<LabSubject> {
        self.labs.iter().filter(|l| l.confirmed).cloned().collect()
    }

    /// Runs the optimizer over the confirmed subjects.
    ///
    /// Without an explicit seed each call uses the next seed in a fixed
    /// sequence, so repeated calls give different timetables while a fresh
    /// planner replays the same ones.
    pub fn generate(
        &mut self,
        seed: Option<u64>,
        iterations: Option<usize>,
    ) -> Result<SchedulingOutput, PlannerError> {
        let theory = self.confirmed_theory();
        let labs = self.confirmed_labs();
        if theory.is_empty() && labs.is_empty() {
            return Err(PlannerError::NothingConfirmed);
        }

        let config = match iterations {
            Some(n) => self.config.with_iterations(n),
            None => self.config,
        };
        config.validate()?;

        self.generation_count += 1;
        let seed = seed.unwrap_or(self.generation_count * SEED_STEP);
        info!("Generation attempt #{}", self.generation_count);

        let input = GenerationInput {
            theory: &theory,
            labs: &labs,
            exclusions: &self.exclusions,
        };
        let schedule = optimize(&input, &config, seed)?;
        Ok(report(schedule, &theory, &labs))
    }

    /// Checks a grid against the confirmed theory subjects.
    pub fn validate(&self, grid: &ScheduleGrid) -> Vec<Violation> {
        validate(grid, &self.confirmed_theory())
    }

    pub fn subject_teacher_map(&self) -> HashMap<String, TeacherId> {
        subject_teachers(&self.confirmed_theory(), &self.confirmed_labs())
    }

    pub fn workload(&self, grid: &ScheduleGrid) -> BTreeMap<TeacherId, u32> {
        teacher_workload(grid, &self.subject_teacher_map())
    }
}
