//! Resume ATS scoring library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod processing;
pub mod output;

pub use config::{Config, ScoringConfig};
pub use error::{Result, ScorerError};
pub use output::report::FinalReport;
pub use processing::engine::{ScoreRequest, ScoringEngine};
