use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Weekday;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Time of day in minutes since midnight, parsed from strict 24-hour `"HH:mm"`.
///
/// Session end times computed by adding a duration may pass 24:00; those values
/// only ever exist in memory for interval comparisons and are never parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn new(hour: u16, minute: u16) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(ClockTime(hour * 60 + minute))
    }

    pub const fn minutes_from_midnight(self) -> u16 {
        self.0
    }

    pub fn plus_minutes(self, minutes: u16) -> ClockTime {
        ClockTime(self.0.saturating_add(minutes))
    }

    pub fn from_naive(time: chrono::NaiveTime) -> ClockTime {
        use chrono::Timelike;
        ClockTime(time.hour() as u16 * 60 + time.minute() as u16)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = AvailabilityError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || AvailabilityError::InvalidTime {
            value: raw.to_string(),
        };

        let (hour, minute) = raw.split_once(':').ok_or_else(invalid)?;
        if hour.len() != 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        ClockTime::new(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(DeError::custom)
    }
}

/// Day of the recurring weekly availability grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// Identifier wrapper for availability slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub String);

static SLOT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_slot_id() -> SlotId {
    let id = SLOT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SlotId(format!("slot-{id:06}"))
}

/// One contiguous window of declared availability, recurring weekly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: SlotId,
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeSlot {
    /// True iff `[start, end)` falls entirely inside this slot.
    pub fn contains(&self, start: ClockTime, end: ClockTime) -> bool {
        self.start <= start && end <= self.end
    }

    fn overlaps(&self, start: ClockTime, end: ClockTime) -> bool {
        self.start < end && start < self.end
    }
}

/// Validation errors raised by the availability model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("'{value}' is not a valid 24-hour HH:mm time")]
    InvalidTime { value: String },
    #[error("slot end {end} must be after start {start}")]
    InvalidRange { start: ClockTime, end: ClockTime },
    #[error("slot {start}-{end} overlaps existing slot {existing:?} on {day:?}")]
    Overlap {
        day: DayOfWeek,
        start: ClockTime,
        end: ClockTime,
        existing: SlotId,
    },
}

/// A tutor's recurring weekly free time: day of week mapped to slots sorted by
/// start time. Days with no slots carry no entry. Slots on one day never
/// overlap; `add_slot` rejects ranges that would break that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyAvailability {
    days: BTreeMap<DayOfWeek, Vec<TimeSlot>>,
}

impl WeeklyAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots declared for `day`, sorted by start ascending. Never fails.
    pub fn slots_for_day(&self, day: DayOfWeek) -> &[TimeSlot] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Insert a validated slot, keeping the day's list sorted by start.
    pub fn add_slot(
        &mut self,
        day: DayOfWeek,
        start: ClockTime,
        end: ClockTime,
    ) -> Result<TimeSlot, AvailabilityError> {
        if end <= start {
            return Err(AvailabilityError::InvalidRange { start, end });
        }

        if let Some(existing) = self
            .slots_for_day(day)
            .iter()
            .find(|slot| slot.overlaps(start, end))
        {
            return Err(AvailabilityError::Overlap {
                day,
                start,
                end,
                existing: existing.id.clone(),
            });
        }

        let slot = TimeSlot {
            id: next_slot_id(),
            start,
            end,
        };
        let slots = self.days.entry(day).or_default();
        slots.push(slot.clone());
        slots.sort_by_key(|slot| slot.start);
        Ok(slot)
    }

    /// Remove a slot by id. Returns false when the id is not present.
    pub fn remove_slot(&mut self, day: DayOfWeek, slot_id: &SlotId) -> bool {
        let Some(slots) = self.days.get_mut(&day) else {
            return false;
        };
        let before = slots.len();
        slots.retain(|slot| &slot.id != slot_id);
        let removed = slots.len() < before;
        if slots.is_empty() {
            self.days.remove(&day);
        }
        removed
    }

    /// True iff some declared slot fully contains `[start, end)`.
    pub fn is_available(&self, day: DayOfWeek, start: ClockTime, end: ClockTime) -> bool {
        if end <= start {
            return false;
        }
        self.slots_for_day(day)
            .iter()
            .any(|slot| slot.contains(start, end))
    }

    pub fn has_slots_on(&self, day: DayOfWeek) -> bool {
        !self.slots_for_day(day).is_empty()
    }

    pub fn has_any_slot(&self) -> bool {
        self.days.values().any(|slots| !slots.is_empty())
    }
}
