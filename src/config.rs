use clap::Parser;
use std::net::SocketAddr;

use crate::solver::OptimizerConfig;

/// Command-line and environment settings for the HTTP service.
#[derive(Debug, Clone, Parser)]
#[command(name = "timetable_solver", version, about = "Weekly timetable generator service")]
pub struct Config {
    /// Address the HTTP server binds to.
    #[arg(long, env = "TIMETABLE_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, env = "TIMETABLE_LOG", default_value = "info")]
    pub log_level: String,

    /// Default optimization iterations per generation run.
    #[arg(
        long,
        env = "TIMETABLE_ITERATIONS",
        default_value_t = 50,
        value_parser = clap::value_parser!(u16).range(10..=200)
    )]
    pub iterations: u16,
}

impl Config {
    pub fn optimizer(&self) -> OptimizerConfig {
        OptimizerConfig::default().with_iterations(usize::from(self.iterations))
    }
}
