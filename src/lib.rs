//! Nurse-to-task rostering over a weekly horizon.
//!
//! Given recurring tasks (time window, nurses required, active weekdays)
//! and shift templates (capacity, window, break, cost weight, active
//! weekdays), computes how many nurses from each shift cover each task on
//! each day, subject to coverage, capacity, break exclusivity and an
//! optional minimum number of nurses per day.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Shift`, `Roster`, `Schedule`,
//!   `TimeWindow`, `DaySet`
//! - **`validation`**: Typed loading of tabular rows with field-level errors
//! - **`compiler`**: Integer linear model formulation and eligibility rules
//! - **`objective`**: Cost, headcount and feasibility objectives
//! - **`solver`**: Solve driver, backends (`microlp`, Gurobi), greedy
//!   incumbent, infeasibility diagnosis
//! - **`projection`**: Solution projection, coverage and utilisation views,
//!   audit, KPIs
//! - **`config`**: Solve parameters (builder or TOML)
//! - **`error`**: Error taxonomy
//!
//! # Example
//!
//! ```
//! use u_roster::config::SolveConfig;
//! use u_roster::models::Row;
//! use u_roster::solver::{SolveStatus, SolverDriver};
//! use u_roster::validation;
//!
//! let tasks = vec![Row::new()
//!     .with("name", "Rounds")
//!     .with("start", "09:00")
//!     .with("end", "11:00")
//!     .with("nurses_required", "2")
//!     .with("active_days", "weekdays")];
//! let shifts = vec![Row::new()
//!     .with("name", "Day")
//!     .with("max_nurses", "3")
//!     .with("start", "08:00")
//!     .with("end", "16:00")
//!     .with("break_start", "12:00")
//!     .with("break_duration", "30")
//!     .with("active_days", "weekdays")];
//!
//! let roster = validation::load(&tasks, &shifts).unwrap();
//! let report = SolverDriver::new(SolveConfig::new()).solve(&roster).unwrap();
//! assert_eq!(report.status, SolveStatus::Optimal);
//! ```
//!
//! # References
//!
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review of
//!   applications, methods and models"

pub mod compiler;
pub mod config;
pub mod error;
pub mod models;
pub mod objective;
pub mod projection;
pub mod solver;
pub mod validation;

pub use config::SolveConfig;
pub use error::{Result, SchedulingError};
pub use models::Roster;
pub use solver::{SolveReport, SolveStatus, SolverDriver};
