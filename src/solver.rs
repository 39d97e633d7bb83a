use itertools::Itertools;
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::allocator::{UnallocatedEntry, allocate_theory};
use crate::analytics::{GridAnalytics, subject_teachers, teacher_workload};
use crate::data::{
    ExclusionMap, LabSubject, SchedulingInput, SchedulingOutput, SubjectNameError, TheorySubject,
    check_subject_names,
};
use crate::grid::ScheduleGrid;
use crate::labs::{LabConflict, place_labs};
use crate::score::{QualityBand, ScoreBreakdown, evaluate};
use crate::validator::{Violation, validate};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("lab conflicts: {}", .0.iter().join("; "))]
    LabConflicts(Vec<LabConflict>),
    #[error(
        "iteration budget must be between {} and {}, got {requested}",
        OptimizerConfig::MIN_ITERATIONS,
        OptimizerConfig::MAX_ITERATIONS
    )]
    InvalidIterations { requested: usize },
    #[error("no candidate timetable was produced")]
    NoCandidate,
    #[error("invalid input: {0}")]
    InvalidInput(#[from] SubjectNameError),
}

/// Multi-restart settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizerConfig {
    pub max_iterations: usize,
    /// A new best at or above this score with nothing unallocated ends the run.
    pub early_exit_score: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            early_exit_score: 95.0,
        }
    }
}

impl OptimizerConfig {
    pub const MIN_ITERATIONS: usize = 10;
    pub const MAX_ITERATIONS: usize = 200;

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if (Self::MIN_ITERATIONS..=Self::MAX_ITERATIONS).contains(&self.max_iterations) {
            Ok(())
        } else {
            Err(GenerationError::InvalidIterations {
                requested: self.max_iterations,
            })
        }
    }
}

/// Confirmed inputs for one generation run.
#[derive(Debug, Clone, Copy)]
pub struct GenerationInput<'a> {
    pub theory: &'a [TheorySubject],
    pub labs: &'a [LabSubject],
    pub exclusions: &'a ExclusionMap,
}

/// One complete, scored attempt.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub grid: ScheduleGrid,
    pub unallocated: Vec<UnallocatedEntry>,
    pub violations: Vec<Violation>,
    pub breakdown: ScoreBreakdown,
}

impl Candidate {
    pub fn score(&self) -> f64 {
        self.breakdown.total
    }
}

/// Best candidate of a run plus how the run went.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub best: Candidate,
    pub seed: u64,
    pub iterations: usize,
    /// Best score seen after each iteration.
    pub score_trace: Vec<f64>,
}

/// Builds one candidate from scratch using its own seeded generator.
pub fn generate_candidate(
    input: &GenerationInput<'_>,
    seed: u64,
) -> Result<Candidate, Vec<LabConflict>> {
    let lab_grid = place_labs(input.labs)?;
    Ok(attempt(input, &lab_grid, seed))
}

fn attempt(input: &GenerationInput<'_>, lab_grid: &ScheduleGrid, seed: u64) -> Candidate {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let allocation = allocate_theory(
        lab_grid.clone(),
        input.theory,
        input.labs,
        input.exclusions,
        &mut rng,
    );
    let violations = validate(&allocation.grid, input.theory);
    let breakdown = evaluate(
        &allocation.grid,
        input.theory,
        &allocation.unallocated,
        &violations,
    );
    Candidate {
        grid: allocation.grid,
        unallocated: allocation.unallocated,
        violations,
        breakdown,
    }
}

/// Runs up to `config.max_iterations` independent attempts and keeps the best.
///
/// Lab conflicts do not depend on the seed, so they are checked once up front
/// and abort the whole run. Each iteration draws its own seed from a master
/// generator seeded with `seed`; the same inputs and seed always give the
/// same result.
pub fn optimize(
    input: &GenerationInput<'_>,
    config: &OptimizerConfig,
    seed: u64,
) -> Result<Schedule, GenerationError> {
    let start_time = Instant::now();
    config.validate()?;
    info!(
        "Generating timetable with {} theory subjects and {} labs, up to {} iterations (seed {})",
        input.theory.len(),
        input.labs.len(),
        config.max_iterations,
        seed
    );

    let lab_grid = place_labs(input.labs).map_err(GenerationError::LabConflicts)?;

    let mut master = ChaCha8Rng::seed_from_u64(seed);
    let mut best: Option<Candidate> = None;
    let mut score_trace = Vec::with_capacity(config.max_iterations);

    for iteration in 0..config.max_iterations {
        let candidate = attempt(input, &lab_grid, master.random());
        let score = candidate.score();

        match &best {
            Some(current) if score <= current.score() => {
                score_trace.push(current.score());
                continue;
            }
            _ => {}
        }

        debug!(
            "Iteration {}: new best score {:.1} ({} unallocated)",
            iteration + 1,
            score,
            candidate.unallocated.len()
        );
        let done = score >= config.early_exit_score && candidate.unallocated.is_empty();
        best = Some(candidate);
        score_trace.push(score);
        if done {
            info!("Early exit after {} iterations", iteration + 1);
            break;
        }
    }

    let best = best.ok_or(GenerationError::NoCandidate)?;
    if !best.unallocated.is_empty() {
        warn!(
            "Best timetable leaves {} subject(s) partially allocated",
            best.unallocated.len()
        );
    }
    info!(
        "Best score {:.1} found in {:.2?}",
        best.score(),
        start_time.elapsed()
    );

    Ok(Schedule {
        best,
        seed,
        iterations: score_trace.len(),
        score_trace,
    })
}

/// Solves a self-contained request, filling in defaults for missing settings.
///
/// Every subject in the request is scheduled regardless of its `confirmed`
/// flag. Subject names must be non-empty, not `Library`, and unique.
pub fn solve(
    input: &SchedulingInput,
    defaults: &OptimizerConfig,
) -> Result<SchedulingOutput, GenerationError> {
    check_subject_names(&input.theory, &input.labs)?;
    let config = match input.iterations {
        Some(iterations) => defaults.with_iterations(iterations),
        None => *defaults,
    };
    let seed = input.seed.unwrap_or_else(rand::random);
    let generation = GenerationInput {
        theory: &input.theory,
        labs: &input.labs,
        exclusions: &input.exclusions,
    };

    let schedule = optimize(&generation, &config, seed)?;
    Ok(report(schedule, &input.theory, &input.labs))
}

/// Packages a run result with the derived metrics reporting needs.
pub fn report(
    schedule: Schedule,
    theory: &[TheorySubject],
    labs: &[LabSubject],
) -> SchedulingOutput {
    let Schedule {
        best,
        seed,
        iterations,
        ..
    } = schedule;
    let workload = teacher_workload(&best.grid, &subject_teachers(theory, labs));
    let analytics = GridAnalytics::calculate(&best.grid);
    let score = best.score();

    SchedulingOutput {
        grid: best.grid,
        unallocated: best.unallocated,
        score,
        breakdown: best.breakdown,
        quality: QualityBand::of(score),
        violations: best.violations,
        workload,
        analytics,
        iterations,
        seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Day, Session};

    fn sample_theory() -> Vec<TheorySubject> {
        vec![
            TheorySubject::new("Engineering Mathematics", "MA3151", 4, 4).with_teacher("Dr. Priya"),
            TheorySubject::new("Engineering Physics", "PH3151", 3, 3).with_teacher("Dr. Kumar"),
            TheorySubject::new("Engineering Chemistry", "CY3151", 3, 3)
                .with_teacher("Prof. Lakshmi"),
            TheorySubject::new("Problem Solving", "GE3151", 3, 3).with_teacher("Dr. Ravi"),
            TheorySubject::new("Heritage of Tamils", "GE3152", 1, 1).with_teacher("Prof. Meena"),
        ]
    }

    fn sample_labs() -> Vec<LabSubject> {
        vec![
            LabSubject::new("Physics Lab", "BS3171", Day::Tuesday, Session::Afternoon)
                .with_teacher("Dr. Kumar"),
            LabSubject::new("Programming Lab", "GE3171", Day::Thursday, Session::Forenoon)
                .with_teacher("Dr. Ravi"),
        ]
    }

    #[test]
    fn test_optimize_produces_full_grid() {
        let theory = sample_theory();
        let labs = sample_labs();
        let exclusions = ExclusionMap::new();
        let input = GenerationInput {
            theory: &theory,
            labs: &labs,
            exclusions: &exclusions,
        };

        let schedule = optimize(&input, &OptimizerConfig::default(), 42).unwrap();

        assert!(!schedule.best.grid.has_empty());
        assert!(schedule.best.unallocated.is_empty());
        assert!(schedule.best.violations.is_empty());
        assert!(schedule.iterations >= 1 && schedule.iterations <= 50);
        assert_eq!(schedule.score_trace.len(), schedule.iterations);
        assert!((0.0..=100.0).contains(&schedule.best.score()));
    }

    #[test]
    fn test_best_score_is_monotonic() {
        let theory = sample_theory();
        let labs = sample_labs();
        let exclusions = ExclusionMap::new();
        let input = GenerationInput {
            theory: &theory,
            labs: &labs,
            exclusions: &exclusions,
        };
        // unreachable threshold keeps every iteration
        let config = OptimizerConfig {
            max_iterations: 200,
            early_exit_score: 101.0,
        };

        let schedule = optimize(&input, &config, 9).unwrap();

        assert_eq!(schedule.iterations, 200);
        assert!(schedule.score_trace.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(schedule.score_trace.last().copied(), Some(schedule.best.score()));
    }

    #[test]
    fn test_early_exit_on_clean_schedule() {
        let theory = vec![TheorySubject::new("Maths", "MA101", 4, 4)];
        let exclusions = ExclusionMap::new();
        let input = GenerationInput {
            theory: &theory,
            labs: &[],
            exclusions: &exclusions,
        };

        let schedule = optimize(&input, &OptimizerConfig::default(), 1).unwrap();

        assert_eq!(schedule.iterations, 1);
        assert_eq!(schedule.best.breakdown.completeness, 40.0);
        assert_eq!(schedule.best.score(), 100.0);
        assert_eq!(schedule.best.grid.occurrences("Maths"), 4);
    }

    #[test]
    fn test_lab_conflict_aborts_run() {
        let theory = sample_theory();
        let labs = vec![
            LabSubject::new("Physics Lab", "BS3171", Day::Monday, Session::Forenoon),
            LabSubject::new("Chemistry Lab", "CY3161", Day::Monday, Session::Forenoon),
        ];
        let exclusions = ExclusionMap::new();
        let input = GenerationInput {
            theory: &theory,
            labs: &labs,
            exclusions: &exclusions,
        };

        let err = optimize(&input, &OptimizerConfig::default(), 5).unwrap_err();

        let GenerationError::LabConflicts(conflicts) = err else {
            panic!("expected lab conflicts, got {err:?}");
        };
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].first, "Physics Lab");
        assert_eq!(conflicts[0].second, "Chemistry Lab");
        assert_eq!(conflicts[0].day, Day::Monday);
        assert_eq!(conflicts[0].session, Session::Forenoon);
        assert!(generate_candidate(&input, 5).is_err());
    }

    #[test]
    fn test_iteration_budget_is_validated() {
        let exclusions = ExclusionMap::new();
        let input = GenerationInput {
            theory: &[],
            labs: &[],
            exclusions: &exclusions,
        };

        for bad in [0, 9, 201] {
            let config = OptimizerConfig::default().with_iterations(bad);
            assert_eq!(
                optimize(&input, &config, 0).unwrap_err(),
                GenerationError::InvalidIterations { requested: bad }
            );
        }
        let config = OptimizerConfig::default().with_iterations(10);
        assert!(optimize(&input, &config, 0).is_ok());
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let theory = sample_theory();
        let labs = sample_labs();
        let exclusions = ExclusionMap::new();
        let input = GenerationInput {
            theory: &theory,
            labs: &labs,
            exclusions: &exclusions,
        };

        let a = optimize(&input, &OptimizerConfig::default(), 2024).unwrap();
        let b = optimize(&input, &OptimizerConfig::default(), 2024).unwrap();

        assert_eq!(a.best.grid, b.best.grid);
        assert_eq!(a.score_trace, b.score_trace);
    }

    #[test]
    fn test_solve_reports_workload_and_analytics() {
        let input = SchedulingInput {
            theory: sample_theory(),
            labs: sample_labs(),
            seed: Some(7),
            iterations: Some(20),
            ..Default::default()
        };

        let output = solve(&input, &OptimizerConfig::default()).unwrap();

        assert_eq!(output.seed, 7);
        // Dr. Kumar: 3 physics periods + 4 lab periods
        assert_eq!(output.workload.get("Dr. Kumar"), Some(&7));
        assert_eq!(output.workload.get("Dr. Ravi"), Some(&7));
        assert_eq!(output.analytics.utilization.filled, 22);
        assert_eq!(output.analytics.utilization.library, 18);
        assert_eq!(output.quality, QualityBand::of(output.score));
    }

    #[test]
    fn test_solve_rejects_ambiguous_names() {
        let twice = SchedulingInput {
            theory: vec![
                TheorySubject::new("Maths", "MA3151", 4, 5),
                TheorySubject::new("Maths", "MA3152", 4, 5),
            ],
            seed: Some(1),
            iterations: Some(10),
            ..Default::default()
        };
        assert_eq!(
            solve(&twice, &OptimizerConfig::default()).unwrap_err(),
            GenerationError::InvalidInput(SubjectNameError::Duplicate("Maths".into()))
        );

        let shared = SchedulingInput {
            theory: vec![TheorySubject::new("Physics", "PH3151", 3, 3)],
            labs: vec![LabSubject::new("Physics", "BS3171", Day::Monday, Session::Forenoon)],
            ..Default::default()
        };
        assert!(matches!(
            solve(&shared, &OptimizerConfig::default()),
            Err(GenerationError::InvalidInput(SubjectNameError::Duplicate(_)))
        ));

        for (name, expected) in [
            ("", SubjectNameError::Empty),
            ("Library", SubjectNameError::Reserved("Library".into())),
        ] {
            let input = SchedulingInput {
                theory: vec![TheorySubject::new(name, "X", 1, 2)],
                ..Default::default()
            };
            assert_eq!(
                solve(&input, &OptimizerConfig::default()).unwrap_err(),
                GenerationError::InvalidInput(expected)
            );
        }
    }

    #[test]
    fn test_solve_schedules_unconfirmed_subjects() {
        let input = SchedulingInput {
            theory: vec![TheorySubject::new("Maths", "MA3151", 4, 4)],
            labs: vec![LabSubject::new(
                "Physics Lab",
                "BS3171",
                Day::Friday,
                Session::Forenoon,
            )],
            seed: Some(3),
            ..Default::default()
        };
        assert!(input.theory.iter().all(|s| !s.confirmed));

        let output = solve(&input, &OptimizerConfig::default()).unwrap();

        assert_eq!(output.grid.occurrences("Maths"), 4);
        assert_eq!(output.grid.occurrences("Physics Lab"), 4);
        assert!(output.unallocated.is_empty());
    }
}
