//! Weekdays and day sets.
//!
//! Every task and shift is scoped to the subset of the week on which it
//! is active. A [`DaySet`] stores that subset as a 7-bit mask.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar weekday. Ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Zero-based index (Monday = 0).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Weekday for a zero-based index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Lower-case English name, as used for flag columns.
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    /// Parses a full or three-letter name, case-insensitively.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.trim().to_ascii_lowercase();
        if lower.len() < 3 {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|day| day.name() == lower || day.name()[..3] == lower)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        write!(f, "{}{}", name[..1].to_ascii_uppercase(), &name[1..])
    }
}

/// A set of weekdays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaySet(u8);

impl DaySet {
    const MASK: u8 = 0b0111_1111;

    /// The empty set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Every day of the week.
    pub fn all() -> Self {
        Self(Self::MASK)
    }

    /// Monday to Friday.
    pub fn weekdays() -> Self {
        Self(0b0001_1111)
    }

    /// Saturday and Sunday.
    pub fn weekend() -> Self {
        Self(0b0110_0000)
    }

    /// Builds a set from individual days.
    pub fn of(days: &[Weekday]) -> Self {
        days.iter().fold(Self::empty(), |set, &day| set.with(day))
    }

    /// Returns a copy with `day` added.
    pub fn with(self, day: Weekday) -> Self {
        Self(self.0 | (1 << day.index()))
    }

    /// Whether the set contains `day`.
    #[inline]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.index()) != 0
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of days in the set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Days in the set, Monday first.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        Weekday::ALL.into_iter().filter(move |&day| self.contains(day))
    }

    /// Union of two sets.
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Parses a day list.
    ///
    /// Accepts the keywords `all`, `daily`, `weekdays`, `weekend`, `none`
    /// (or an empty string), or a list of day names separated by commas,
    /// semicolons, `|` or whitespace.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim().to_ascii_lowercase();
        match trimmed.as_str() {
            "" | "none" => return Some(Self::empty()),
            "all" | "daily" => return Some(Self::all()),
            "weekdays" => return Some(Self::weekdays()),
            "weekend" | "weekends" => return Some(Self::weekend()),
            _ => {}
        }
        trimmed
            .split(|c: char| c == ',' || c == ';' || c == '|' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .try_fold(Self::empty(), |set, token| Weekday::parse(token).map(|d| set.with(d)))
    }
}

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, day| set.with(day))
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|d| d.name()[..3].to_string()).collect();
        write!(f, "{}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_parse() {
        assert_eq!(Weekday::parse("Monday"), Some(Weekday::Monday));
        assert_eq!(Weekday::parse("sun"), Some(Weekday::Sunday));
        assert_eq!(Weekday::parse(" WED "), Some(Weekday::Wednesday));
        assert_eq!(Weekday::parse("mo"), None);
        assert_eq!(Weekday::parse("funday"), None);
    }

    #[test]
    fn test_weekday_display() {
        assert_eq!(Weekday::Thursday.to_string(), "Thursday");
        assert_eq!(Weekday::from_index(6), Some(Weekday::Sunday));
        assert_eq!(Weekday::from_index(7), None);
    }

    #[test]
    fn test_dayset_keywords() {
        assert_eq!(DaySet::parse("all"), Some(DaySet::all()));
        assert_eq!(DaySet::parse("Weekdays").unwrap().len(), 5);
        assert!(DaySet::parse("weekend").unwrap().contains(Weekday::Saturday));
        assert!(DaySet::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_dayset_list() {
        let set = DaySet::parse("mon; Wed,friday").unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains(Weekday::Wednesday));
        assert!(!set.contains(Weekday::Tuesday));
        assert_eq!(set.to_string(), "mon,wed,fri");
        assert!(DaySet::parse("mon, blursday").is_none());
    }

    #[test]
    fn test_dayset_iter_order() {
        let set = DaySet::of(&[Weekday::Sunday, Weekday::Monday]);
        let days: Vec<Weekday> = set.iter().collect();
        assert_eq!(days, vec![Weekday::Monday, Weekday::Sunday]);
        assert_eq!(set.union(DaySet::weekdays()).len(), 6);
    }
}
