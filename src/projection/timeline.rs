//! 15-minute coverage timeline.
//!
//! Each day is split into 96 blocks. Demand in a block is the sum of
//! `nurses_required` over tasks whose window touches the block; supply is
//! the number of rostered nurses whose shift is working (not on break) in
//! the block. Blocks where supply falls short of demand point at times of
//! day where the roster is thin.

use serde::Serialize;

use crate::models::{Roster, Schedule, TimeOfDay, TimeWindow, Weekday, MINUTES_PER_DAY};

/// Block length in minutes.
pub const BLOCK_MINUTES: u32 = 15;

const BLOCKS_PER_DAY: usize = (MINUTES_PER_DAY / BLOCK_MINUTES) as usize;

/// Supply and demand per block for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTimeline {
    /// Day.
    pub day: Weekday,
    /// Nurses working per block.
    pub supply: Vec<u32>,
    /// Nurses required per block.
    pub demand: Vec<u32>,
}

impl DayTimeline {
    fn empty(day: Weekday) -> Self {
        Self {
            day,
            supply: vec![0; BLOCKS_PER_DAY],
            demand: vec![0; BLOCKS_PER_DAY],
        }
    }

    /// Window covered by block `index`.
    pub fn block_window(index: usize) -> TimeWindow {
        let start = index as u32 * BLOCK_MINUTES;
        TimeWindow::from_minutes(start, start + BLOCK_MINUTES)
    }

    /// Blocks where supply is below demand, as `(block start, missing nurses)`.
    pub fn shortfalls(&self) -> Vec<(TimeOfDay, u32)> {
        self.supply
            .iter()
            .zip(&self.demand)
            .enumerate()
            .filter(|(_, (supply, demand))| supply < demand)
            .map(|(i, (supply, demand))| (Self::block_window(i).start, demand - supply))
            .collect()
    }

    /// Peak demand over the day.
    pub fn peak_demand(&self) -> u32 {
        self.demand.iter().copied().max().unwrap_or(0)
    }
}

/// Weekly 15-minute supply/demand view of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageTimeline {
    days: Vec<DayTimeline>,
}

impl CoverageTimeline {
    /// Builds the timeline for every weekday.
    pub fn build(roster: &Roster, schedule: &Schedule) -> Self {
        let days = Weekday::ALL
            .into_iter()
            .map(|day| {
                let mut line = DayTimeline::empty(day);
                for &t in &roster.tasks_on(day) {
                    let task = &roster.tasks()[t];
                    add_window(&mut line.demand, &task.window, task.nurses_required);
                }
                for &s in &roster.shifts_on(day) {
                    let shift = &roster.shifts()[s];
                    let load = schedule.shift_load(&shift.name, day);
                    if load == 0 {
                        continue;
                    }
                    for piece in shift.availability() {
                        add_window(&mut line.supply, &piece, load);
                    }
                }
                line
            })
            .collect();
        Self { days }
    }

    /// Timeline of one day.
    pub fn day(&self, day: Weekday) -> &DayTimeline {
        &self.days[day.index()]
    }

    /// All days, Monday first.
    pub fn days(&self) -> &[DayTimeline] {
        &self.days
    }

    /// Total short blocks over the week.
    pub fn shortfall_blocks(&self) -> usize {
        self.days.iter().map(|d| d.shortfalls().len()).sum()
    }
}

/// Adds `count` to every block the window touches.
fn add_window(blocks: &mut [u32], window: &TimeWindow, count: u32) {
    if window.is_empty() {
        return;
    }
    let first = (window.start.minutes() / BLOCK_MINUTES) as usize;
    let last = ((window.end.minutes() - 1) / BLOCK_MINUTES) as usize;
    for block in blocks.iter_mut().take(last + 1).skip(first) {
        *block = block.saturating_add(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, DaySet, Shift, Task};

    fn t(h: u32, m: u32) -> TimeOfDay {
        TimeOfDay::hm(h, m).unwrap()
    }

    #[test]
    fn test_add_window_partial_blocks() {
        let mut blocks = vec![0; BLOCKS_PER_DAY];
        add_window(&mut blocks, &TimeWindow::new(t(9, 10), t(9, 31)), 2);
        assert_eq!(blocks[36], 2); // 09:00
        assert_eq!(blocks[37], 2); // 09:15
        assert_eq!(blocks[38], 2); // 09:30
        assert_eq!(blocks[39], 0);
        assert_eq!(blocks.iter().sum::<u32>(), 6);
    }

    #[test]
    fn test_timeline_shows_break_gap() {
        let monday = DaySet::of(&[Weekday::Monday]);
        let roster = Roster::new(
            vec![Task::new("Ward", t(11, 0), t(14, 0)).with_nurses(2).on_days(monday)],
            vec![Shift::new("Day", t(8, 0), t(16, 0), 3)
                .with_break(t(12, 0), 30)
                .on_days(monday)],
        )
        .unwrap();
        let mut schedule = Schedule::new();
        schedule.add_assignment(Assignment::new("Day", "Ward", Weekday::Monday, 2));

        let timeline = CoverageTimeline::build(&roster, &schedule);
        let monday_line = timeline.day(Weekday::Monday);
        assert_eq!(monday_line.peak_demand(), 2);
        assert_eq!(
            monday_line.shortfalls(),
            vec![(t(12, 0), 2), (t(12, 15), 2)]
        );
        assert_eq!(timeline.shortfall_blocks(), 2);
        assert_eq!(timeline.day(Weekday::Tuesday).peak_demand(), 0);
    }

    #[test]
    fn test_end_of_day_window() {
        let mut blocks = vec![0; BLOCKS_PER_DAY];
        add_window(&mut blocks, &TimeWindow::new(t(23, 45), TimeOfDay::END_OF_DAY), 1);
        assert_eq!(blocks[BLOCKS_PER_DAY - 1], 1);
    }
}
