//! Input loading and validation for rostering problems.
//!
//! Turns raw task and shift [`Row`]s into typed records and checks the
//! invariants every later stage relies on. Detects:
//! - Missing required fields
//! - Unparseable times, numbers and day lists
//! - Empty or inverted windows (start ≥ end)
//! - Negative or fractional nurse counts
//! - Durations outside the task window
//! - Breaks that leave the shift window
//! - Duplicate task or shift names
//!
//! All problems in the input are reported, not just the first one, and
//! each names the table, row and field it came from.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::models::{DaySet, Roster, Row, Shift, Task, TimeOfDay, TimeWindow, Weekday};

/// Validation result carrying every detected error.
pub type ValidationResult<T = ()> = Result<T, Vec<ValidationError>>;

/// Which input table a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    /// Row from the task table.
    Task,
    /// Row from the shift table.
    Shift,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Task => f.write_str("task"),
            RecordKind::Shift => f.write_str("shift"),
        }
    }
}

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{record} row {row}, field '{field}': {message}")]
pub struct ValidationError {
    /// Source table.
    pub record: RecordKind,
    /// Zero-based row index within its table.
    pub row: usize,
    /// Offending field.
    pub field: String,
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationErrorKind {
    /// A required field is absent or blank.
    MissingField,
    /// A time field is not `HH:MM`.
    InvalidTime,
    /// A numeric field cannot be parsed.
    InvalidNumber,
    /// A day list or day flag cannot be parsed.
    InvalidDays,
    /// Window start is not before its end.
    EmptyWindow,
    /// A count is negative.
    NegativeCount,
    /// A value is outside its allowed range.
    OutOfRange,
    /// The break window is not inside the shift window.
    BreakOutsideShift,
    /// Two records share a name.
    DuplicateName,
}

impl ValidationError {
    fn new(
        record: RecordKind,
        row: usize,
        field: impl Into<String>,
        kind: ValidationErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            record,
            row,
            field: field.into(),
            kind,
            message: message.into(),
        }
    }
}

const TASK_NAME: &[&str] = &["name", "task"];
const TASK_DURATION: &[&str] = &["duration", "duration_min"];
const TASK_NURSES: &[&str] = &["nurses_required", "required_nurses"];
const SHIFT_NAME: &[&str] = &["name", "shift"];
const SHIFT_BREAK: &[&str] = &["break_start", "break"];
const DAY_LIST: &[&str] = &["active_days", "days"];

/// Loads and validates both input tables.
///
/// # Errors
/// Returns all row-level and cross-record problems found.
pub fn load(task_rows: &[Row], shift_rows: &[Row]) -> ValidationResult<Roster> {
    let tasks = load_tasks(task_rows);
    let shifts = load_shifts(shift_rows);
    match (tasks, shifts) {
        (Ok(tasks), Ok(shifts)) => Roster::new(tasks, shifts),
        (tasks, shifts) => {
            let mut errors = tasks.err().unwrap_or_default();
            errors.extend(shifts.err().unwrap_or_default());
            Err(errors)
        }
    }
}

/// Parses task rows.
///
/// Fields: `name` (or `task`), `start`, `end`, optional `duration`
/// (or `duration_min`, defaults to the window length), `nurses_required`
/// (or `required_nurses`), and `active_days` or per-day flag columns.
pub fn load_tasks(rows: &[Row]) -> ValidationResult<Vec<Task>> {
    let mut tasks = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let mut reader = RowReader::new(RecordKind::Task, index, row);
        if let Some(task) = read_task(&mut reader) {
            tasks.push(task);
        }
        errors.extend(reader.errors);
    }
    if errors.is_empty() {
        Ok(tasks)
    } else {
        Err(errors)
    }
}

/// Parses shift rows.
///
/// Fields: `name` (or `shift`), `max_nurses`, `start`, `end`, optional
/// `break_start` (or `break`; a time of day or minutes after shift start),
/// optional `break_duration` (minutes, default 0), optional `weight`
/// (default 1.0), and `active_days` or per-day flag columns.
pub fn load_shifts(rows: &[Row]) -> ValidationResult<Vec<Shift>> {
    let mut shifts = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let mut reader = RowReader::new(RecordKind::Shift, index, row);
        if let Some(shift) = read_shift(&mut reader) {
            shifts.push(shift);
        }
        errors.extend(reader.errors);
    }
    if errors.is_empty() {
        Ok(shifts)
    } else {
        Err(errors)
    }
}

/// Checks record invariants on typed tasks and shifts.
///
/// Checks:
/// 1. Names are non-empty and unique per table
/// 2. Windows are non-empty
/// 3. Tasks need at least one nurse and have a duration within their window
/// 4. Breaks lie within their shift window
/// 5. Weights are finite
pub fn validate_records(tasks: &[Task], shifts: &[Shift]) -> ValidationResult {
    use ValidationErrorKind::*;

    let mut errors = Vec::new();

    let mut task_names = HashSet::new();
    for (row, task) in tasks.iter().enumerate() {
        let err = |field: &str, kind, message: String| {
            ValidationError::new(RecordKind::Task, row, field, kind, message)
        };
        if task.name.trim().is_empty() {
            errors.push(err("name", MissingField, "task name is empty".into()));
        } else if !task_names.insert(task.name.as_str()) {
            errors.push(err(
                "name",
                DuplicateName,
                format!("duplicate task name '{}'", task.name),
            ));
        }
        if task.window.is_empty() {
            errors.push(err(
                "end",
                EmptyWindow,
                format!("task '{}' window {} is empty", task.name, task.window),
            ));
        }
        if task.nurses_required == 0 {
            errors.push(err(
                "nurses_required",
                OutOfRange,
                format!("task '{}' must require at least one nurse", task.name),
            ));
        }
        if task.duration_min == 0 || task.duration_min > task.window.duration_min() {
            errors.push(err(
                "duration",
                OutOfRange,
                format!(
                    "task '{}' duration {} min must be within 1..={} min",
                    task.name,
                    task.duration_min,
                    task.window.duration_min()
                ),
            ));
        }
    }

    let mut shift_names = HashSet::new();
    for (row, shift) in shifts.iter().enumerate() {
        let err = |field: &str, kind, message: String| {
            ValidationError::new(RecordKind::Shift, row, field, kind, message)
        };
        if shift.name.trim().is_empty() {
            errors.push(err("name", MissingField, "shift name is empty".into()));
        } else if !shift_names.insert(shift.name.as_str()) {
            errors.push(err(
                "name",
                DuplicateName,
                format!("duplicate shift name '{}'", shift.name),
            ));
        }
        if shift.window.is_empty() {
            errors.push(err(
                "end",
                EmptyWindow,
                format!("shift '{}' window {} is empty", shift.name, shift.window),
            ));
        }
        if shift.has_break() && !shift.window.contains(&shift.break_window) {
            errors.push(err(
                "break_start",
                BreakOutsideShift,
                format!(
                    "shift '{}' break {} is outside {}",
                    shift.name, shift.break_window, shift.window
                ),
            ));
        }
        if !shift.weight.is_finite() {
            errors.push(err(
                "weight",
                InvalidNumber,
                format!("shift '{}' weight must be finite", shift.name),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn read_task(reader: &mut RowReader<'_>) -> Option<Task> {
    let name = reader.text(TASK_NAME);
    let window = reader.window();
    let nurses = reader.count(TASK_NURSES);
    let days = reader.days();
    let duration = reader.optional_count(TASK_DURATION);

    let (name, window, nurses, days, duration) = (name?, window?, nurses?, days?, duration?);
    if nurses == 0 {
        reader.fail(
            TASK_NURSES[0],
            ValidationErrorKind::OutOfRange,
            "at least one nurse is required",
        );
        return None;
    }
    let duration = duration.unwrap_or_else(|| window.duration_min());
    if duration == 0 || duration > window.duration_min() {
        reader.fail(
            TASK_DURATION[0],
            ValidationErrorKind::OutOfRange,
            format!(
                "duration {duration} min must be within 1..={} min",
                window.duration_min()
            ),
        );
        return None;
    }
    Some(
        Task::new(name, window.start, window.end)
            .with_nurses(nurses)
            .with_duration(duration)
            .on_days(days),
    )
}

fn read_shift(reader: &mut RowReader<'_>) -> Option<Shift> {
    let name = reader.text(SHIFT_NAME);
    let window = reader.window();
    let max_nurses = reader.count(&["max_nurses"]);
    let days = reader.days();
    let weight = reader.weight();
    let break_duration = reader.optional_count(&["break_duration"]);

    let (name, window, max_nurses, days, weight, break_duration) = (
        name?,
        window?,
        max_nurses?,
        days?,
        weight?,
        break_duration?.unwrap_or(0),
    );

    let shift = Shift::new(name, window.start, window.end, max_nurses)
        .with_weight(weight)
        .on_days(days);
    if break_duration == 0 {
        return Some(shift);
    }

    let Some((field, text)) = reader.row.get_any(SHIFT_BREAK) else {
        reader.fail(
            SHIFT_BREAK[0],
            ValidationErrorKind::MissingField,
            "break_duration is set but break_start is missing",
        );
        return None;
    };
    let break_start = if text.contains(':') {
        TimeOfDay::parse(text)
    } else {
        text.parse::<u32>()
            .ok()
            .and_then(|offset| window.start.minutes().checked_add(offset))
            .and_then(TimeOfDay::from_minutes)
    };
    let Some(break_start) = break_start else {
        reader.fail(
            field,
            ValidationErrorKind::InvalidTime,
            format!("'{text}' is neither HH:MM nor a minute offset within the day"),
        );
        return None;
    };
    let break_end = break_start.minutes().checked_add(break_duration);
    if break_start < window.start || break_end.map_or(true, |end| end > window.end.minutes()) {
        reader.fail(
            field,
            ValidationErrorKind::BreakOutsideShift,
            format!(
                "break {break_start} (+{break_duration} min) is outside {window}"
            ),
        );
        return None;
    }
    Some(shift.with_break(break_start, break_duration))
}

/// Field accessor that records errors against one row.
struct RowReader<'a> {
    record: RecordKind,
    index: usize,
    row: &'a Row,
    errors: Vec<ValidationError>,
}

impl<'a> RowReader<'a> {
    fn new(record: RecordKind, index: usize, row: &'a Row) -> Self {
        Self {
            record,
            index,
            row,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, field: &str, kind: ValidationErrorKind, message: impl Into<String>) {
        self.errors
            .push(ValidationError::new(self.record, self.index, field, kind, message));
    }

    fn required(&mut self, aliases: &[&'a str]) -> Option<(&'a str, &'a str)> {
        let found = self.row.get_any(aliases);
        if found.is_none() {
            self.fail(
                aliases[0],
                ValidationErrorKind::MissingField,
                format!("required field '{}' is missing", aliases[0]),
            );
        }
        found
    }

    fn text(&mut self, aliases: &[&'a str]) -> Option<String> {
        self.required(aliases).map(|(_, v)| v.to_string())
    }

    fn time(&mut self, field: &'a str) -> Option<TimeOfDay> {
        let (field, text) = self.required(&[field])?;
        let parsed = TimeOfDay::parse(text);
        if parsed.is_none() {
            self.fail(
                field,
                ValidationErrorKind::InvalidTime,
                format!("'{text}' is not a valid HH:MM time"),
            );
        }
        parsed
    }

    fn window(&mut self) -> Option<TimeWindow> {
        let start = self.time("start");
        let end = self.time("end");
        let (start, end) = (start?, end?);
        if start >= end {
            self.fail(
                "end",
                ValidationErrorKind::EmptyWindow,
                format!("start {start} must be before end {end}"),
            );
            return None;
        }
        Some(TimeWindow::new(start, end))
    }

    fn parse_count(&mut self, field: &str, text: &str) -> Option<u32> {
        let value = match text.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                self.fail(
                    field,
                    ValidationErrorKind::InvalidNumber,
                    format!("'{text}' is not a number"),
                );
                return None;
            }
        };
        if value < 0.0 {
            self.fail(
                field,
                ValidationErrorKind::NegativeCount,
                format!("{text} must not be negative"),
            );
            return None;
        }
        if value.fract().abs() > 1e-9 || value > f64::from(u32::MAX) {
            self.fail(
                field,
                ValidationErrorKind::InvalidNumber,
                format!("{text} is not a whole number"),
            );
            return None;
        }
        Some(value.round() as u32)
    }

    fn count(&mut self, aliases: &[&'a str]) -> Option<u32> {
        let (field, text) = self.required(aliases)?;
        self.parse_count(field, text)
    }

    /// Outer `None` = error, inner `None` = absent.
    fn optional_count(&mut self, aliases: &[&'a str]) -> Option<Option<u32>> {
        match self.row.get_any(aliases) {
            None => Some(None),
            Some((field, text)) => self.parse_count(field, text).map(Some),
        }
    }

    fn weight(&mut self) -> Option<f64> {
        let Some(text) = self.row.get("weight") else {
            return Some(1.0);
        };
        match text.parse::<f64>() {
            Ok(w) if w.is_finite() => Some(w),
            _ => {
                self.fail(
                    "weight",
                    ValidationErrorKind::InvalidNumber,
                    format!("'{text}' is not a finite number"),
                );
                None
            }
        }
    }

    /// Reads `active_days`, falling back to per-day flag columns.
    fn days(&mut self) -> Option<DaySet> {
        if let Some((field, text)) = self.row.get_any(DAY_LIST) {
            let parsed = DaySet::parse(text);
            if parsed.is_none() {
                self.fail(
                    field,
                    ValidationErrorKind::InvalidDays,
                    format!("'{text}' is not a list of weekdays"),
                );
            }
            return parsed;
        }

        if !Weekday::ALL.iter().any(|d| self.row.has(d.name())) {
            self.fail(
                DAY_LIST[0],
                ValidationErrorKind::MissingField,
                "either 'active_days' or per-day flag columns are required",
            );
            return None;
        }

        let mut days = DaySet::empty();
        let mut ok = true;
        for day in Weekday::ALL {
            match self.row.get(day.name()).map(parse_flag) {
                None | Some(Some(false)) => {}
                Some(Some(true)) => days = days.with(day),
                Some(None) => {
                    ok = false;
                    self.fail(
                        day.name(),
                        ValidationErrorKind::InvalidDays,
                        "day flag must be 0/1 or true/false",
                    );
                }
            }
        }
        ok.then_some(days)
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" | "y" | "x" => Some(true),
        "0" | "0.0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_row() -> Row {
        Row::new()
            .with("name", "Rounds")
            .with("start", "09:00")
            .with("end", "17:00")
            .with("duration", "480")
            .with("nurses_required", "2")
            .with("active_days", "weekdays")
    }

    fn shift_row() -> Row {
        Row::new()
            .with("name", "Day")
            .with("max_nurses", "3")
            .with("start", "08:00")
            .with("end", "16:00")
            .with("break_start", "12:00")
            .with("break_duration", "30")
            .with("weight", "1.5")
            .with("active_days", "all")
    }

    fn kinds(errors: &[ValidationError]) -> Vec<ValidationErrorKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_input() {
        let roster = load(&[task_row()], &[shift_row()]).unwrap();
        let task = &roster.tasks()[0];
        assert_eq!(task.nurses_required, 2);
        assert_eq!(task.days, DaySet::weekdays());
        let shift = &roster.shifts()[0];
        assert_eq!(shift.break_window.to_string(), "12:00-12:30");
        assert_eq!(shift.weight, 1.5);
    }

    #[test]
    fn test_alias_columns_and_day_flags() {
        // Column names and day flags as exported by the dashboard.
        let mut task = Row::new()
            .with("task", "Meds")
            .with("start", "08:00:00")
            .with("end", "09:00:00")
            .with("duration_min", "30")
            .with("required_nurses", "1.0");
        for day in Weekday::ALL {
            task.insert(day.name(), if day == Weekday::Sunday { "0" } else { "1" });
        }
        let tasks = load_tasks(&[task]).unwrap();
        assert_eq!(tasks[0].name, "Meds");
        assert_eq!(tasks[0].duration_min, 30);
        assert_eq!(tasks[0].days.len(), 6);
        assert!(!tasks[0].days.contains(Weekday::Sunday));
    }

    #[test]
    fn test_duration_defaults_to_window() {
        let row = task_row().with("duration", "");
        let tasks = load_tasks(&[row]).unwrap();
        assert_eq!(tasks[0].duration_min, 480);
        assert!(tasks[0].is_fixed());
    }

    #[test]
    fn test_break_offset_form() {
        let row = shift_row().with("break_start", "240");
        let shifts = load_shifts(&[row]).unwrap();
        assert_eq!(shifts[0].break_window.to_string(), "12:00-12:30");
    }

    #[test]
    fn test_missing_field() {
        let row = task_row().with("start", "");
        let errors = load_tasks(&[row]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::MissingField]);
        assert_eq!(errors[0].field, "start");
        assert_eq!(errors[0].row, 0);
    }

    #[test]
    fn test_unparseable_time() {
        let row = shift_row().with("end", "4pm");
        let errors = load_shifts(&[row]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidTime]);
        assert_eq!(errors[0].record, RecordKind::Shift);
    }

    #[test]
    fn test_start_not_before_end() {
        let row = task_row().with("start", "17:00");
        let errors = load_tasks(&[row]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::EmptyWindow]);
    }

    #[test]
    fn test_negative_counts() {
        let errors = load_tasks(&[task_row().with("nurses_required", "-1")]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::NegativeCount]);

        let errors = load_shifts(&[shift_row().with("max_nurses", "-2")]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::NegativeCount]);
    }

    #[test]
    fn test_zero_nurses_required() {
        let errors = load_tasks(&[task_row().with("nurses_required", "0")]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::OutOfRange]);
    }

    #[test]
    fn test_zero_capacity_shift_is_valid() {
        let shifts = load_shifts(&[shift_row().with("max_nurses", "0")]).unwrap();
        assert_eq!(shifts[0].max_nurses, 0);
    }

    #[test]
    fn test_fractional_count() {
        let errors = load_tasks(&[task_row().with("nurses_required", "1.5")]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidNumber]);
    }

    #[test]
    fn test_duration_longer_than_window() {
        let errors = load_tasks(&[task_row().with("duration", "500")]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::OutOfRange]);
    }

    #[test]
    fn test_break_outside_shift() {
        let errors = load_shifts(&[shift_row().with("break_start", "15:45")]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::BreakOutsideShift]);
    }

    #[test]
    fn test_oversized_numbers_are_rejected() {
        let errors = load_tasks(&[task_row().with("start", "71582789:00")]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidTime]);
        assert_eq!(errors[0].field, "start");

        let errors = load_shifts(&[shift_row().with("break_start", "4294967295")]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidTime]);

        let errors =
            load_shifts(&[shift_row().with("break_duration", "4294967295")]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::BreakOutsideShift]);
    }

    #[test]
    fn test_break_duration_without_start() {
        let row = shift_row().with("break_start", "");
        let errors = load_shifts(&[row]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::MissingField]);
    }

    #[test]
    fn test_invalid_days() {
        let errors = load_tasks(&[task_row().with("active_days", "mon,someday")]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidDays]);

        let row = Row::new()
            .with("name", "X")
            .with("start", "09:00")
            .with("end", "10:00")
            .with("nurses_required", "1");
        let errors = load_tasks(&[row.clone()]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::MissingField]);

        let errors = load_tasks(&[row.with("monday", "maybe")]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::InvalidDays]);
    }

    #[test]
    fn test_duplicate_names() {
        let errors = load(&[task_row(), task_row()], &[shift_row()]).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::DuplicateName]);
        assert_eq!(errors[0].row, 1);
    }

    #[test]
    fn test_multiple_errors_across_tables() {
        let errors = load(
            &[task_row().with("start", "xx"), task_row().with("name", "B").with("end", "")],
            &[shift_row().with("weight", "heavy")],
        )
        .unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[1].row, 1);
        assert_eq!(errors[2].record, RecordKind::Shift);
    }

    #[test]
    fn test_error_display_names_location() {
        let errors = load_tasks(&[task_row().with("end", "25:00")]).unwrap_err();
        let text = errors[0].to_string();
        assert!(text.contains("task row 0"));
        assert!(text.contains("'end'"));
    }

    #[test]
    fn test_validate_records_typed() {
        let t = |h| TimeOfDay::hm(h, 0).unwrap();
        let tasks = vec![Task::new("A", t(9), t(10)).with_duration(90)];
        let shifts = vec![
            Shift::new("S", t(8), t(12), 2).with_break(t(11), 90),
            Shift::new("W", t(8), t(12), 2).with_weight(f64::NAN),
        ];
        let errors = validate_records(&tasks, &shifts).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                ValidationErrorKind::OutOfRange,
                ValidationErrorKind::BreakOutsideShift,
                ValidationErrorKind::InvalidNumber,
            ]
        );
    }
}
