//! Weekly timetable generation for a 5-day, 8-period teaching week.
//!
//! Labs are fixed into half-day blocks first, then theory subjects are
//! spread over the remaining periods by a randomized greedy allocator. The
//! [`solver`] repeats that construction with fresh seeds and keeps the
//! best-scoring timetable. [`planner::Planner`] holds the configuration
//! being edited (subjects, teacher assignments, teacher exclusions) and
//! [`server`] exposes both over HTTP.

pub mod allocator;
pub mod analytics;
pub mod config;
pub mod data;
pub mod grid;
pub mod labs;
pub mod planner;
pub mod registry;
pub mod score;
pub mod server;
pub mod solver;
pub mod validator;
