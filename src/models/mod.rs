//! Nurse rostering domain models.
//!
//! Provides the core data types for representing rostering problems and
//! their solutions.
//!
//! # Domain Mappings
//!
//! | u-roster | Job-shop analogue | Meaning |
//! |----------|-------------------|---------|
//! | Task | Activity | Work needing N nurses in a daily window |
//! | Shift | Resource | Nurse work period with capacity and break |
//! | Weekday | Planning period | Scope of one coverage decision |
//! | Schedule | Schedule | Nurses per (shift, task, day) |

mod day;
mod roster;
mod row;
mod schedule;
mod shift;
mod task;
mod time;

pub use day::{DaySet, Weekday};
pub use roster::Roster;
pub use row::Row;
pub use schedule::{Assignment, Schedule, Standby, Violation, ViolationType};
pub use shift::Shift;
pub use task::Task;
pub use time::{TimeOfDay, TimeWindow, MINUTES_PER_DAY};
