//! Teacher capacity tracking.
//!
//! A teacher may hold at most two subjects, in any mix of theory and lab.
//! Records exist only while a teacher holds at least one subject.

use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use crate::data::{SubjectKind, TeacherId};

/// Maximum number of subjects one teacher may hold.
pub const MAX_SUBJECTS_PER_TEACHER: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("teacher '{teacher}' already holds the maximum of 2 subjects")]
    CapacityExceeded { teacher: TeacherId },
}

/// How much room a teacher has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Availability {
    Available,
    OneSlotLeft,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AssignedSubject {
    subject: String,
    kind: SubjectKind,
}

/// Snapshot of one teacher's assignments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRecord {
    pub count: usize,
    pub subjects: Vec<String>,
    pub types: Vec<SubjectKind>,
}

#[derive(Debug, Clone, Default)]
pub struct TeacherRegistry {
    assignments: HashMap<TeacherId, Vec<AssignedSubject>>,
}

impl TeacherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn count(&self, teacher: &str) -> usize {
        self.assignments.get(teacher).map_or(0, Vec::len)
    }

    /// Whether `teacher` can take one more subject of `kind`.
    ///
    /// Any second subject is accepted regardless of the first one's kind,
    /// so `kind` does not change the answer today.
    pub fn can_assign(&self, teacher: &str, _kind: SubjectKind) -> bool {
        self.count(teacher) < MAX_SUBJECTS_PER_TEACHER
    }

    /// Records `subject` against `teacher`.
    ///
    /// A teacher already at capacity is refused and the registry is left
    /// untouched.
    pub fn assign(
        &mut self,
        teacher: &str,
        subject: &str,
        kind: SubjectKind,
    ) -> Result<(), RegistryError> {
        if !self.can_assign(teacher, kind) {
            return Err(RegistryError::CapacityExceeded {
                teacher: teacher.to_string(),
            });
        }
        let entries = self.assignments.entry(teacher.to_string()).or_default();
        entries.push(AssignedSubject {
            subject: subject.to_string(),
            kind,
        });
        debug!(
            "Assigned {} subject '{}' to '{}' ({}/{})",
            kind,
            subject,
            teacher,
            entries.len(),
            MAX_SUBJECTS_PER_TEACHER
        );
        Ok(())
    }

    /// Removes the first entry for `subject`. Returns false if there was none.
    pub fn unassign(&mut self, teacher: &str, subject: &str) -> bool {
        let Some(entries) = self.assignments.get_mut(teacher) else {
            return false;
        };
        let Some(idx) = entries.iter().position(|e| e.subject == subject) else {
            return false;
        };
        entries.remove(idx);
        if entries.is_empty() {
            self.assignments.remove(teacher);
        }
        debug!("Unassigned '{}' from '{}'", subject, teacher);
        true
    }

    pub fn query(&self, teacher: &str) -> TeacherRecord {
        match self.assignments.get(teacher) {
            Some(entries) => TeacherRecord {
                count: entries.len(),
                subjects: entries.iter().map(|e| e.subject.clone()).collect(),
                types: entries.iter().map(|e| e.kind).collect(),
            },
            None => TeacherRecord::default(),
        }
    }

    pub fn availability(&self, teacher: &str) -> Availability {
        match self.count(teacher) {
            0 => Availability::Available,
            1 => Availability::OneSlotLeft,
            _ => Availability::Full,
        }
    }

    /// Filters `candidates` down to teachers that can still take a subject.
    pub fn available_teachers<'a>(
        &self,
        candidates: &'a [TeacherId],
        kind: SubjectKind,
    ) -> Vec<&'a TeacherId> {
        candidates
            .iter()
            .filter(|t| self.can_assign(t, kind))
            .collect()
    }

    /// Teachers currently holding at least one subject.
    pub fn teachers(&self) -> impl Iterator<Item = &TeacherId> {
        self.assignments.keys()
    }
}
