use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::availability::{ClockTime, DayOfWeek};
use super::catalog::SubjectId;
use super::domain::{DeliveryMode, StudentId, TutorId};
use super::money::Money;

/// Bookable session lengths. Serialized as the raw minute count (30/60/120).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum SessionDuration {
    ThirtyMinutes,
    OneHour,
    TwoHours,
}

impl SessionDuration {
    pub const ALL: [SessionDuration; 3] = [
        SessionDuration::ThirtyMinutes,
        SessionDuration::OneHour,
        SessionDuration::TwoHours,
    ];

    pub const fn minutes(self) -> u16 {
        match self {
            SessionDuration::ThirtyMinutes => 30,
            SessionDuration::OneHour => 60,
            SessionDuration::TwoHours => 120,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SessionDuration::ThirtyMinutes => "30 min",
            SessionDuration::OneHour => "1 hour",
            SessionDuration::TwoHours => "2 hours",
        }
    }
}

impl From<SessionDuration> for u32 {
    fn from(duration: SessionDuration) -> u32 {
        duration.minutes() as u32
    }
}

impl TryFrom<u32> for SessionDuration {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        match minutes {
            30 => Ok(SessionDuration::ThirtyMinutes),
            60 => Ok(SessionDuration::OneHour),
            120 => Ok(SessionDuration::TwoHours),
            other => Err(format!("{other} is not a bookable duration (30/60/120)")),
        }
    }
}

/// Session lifecycle states, with the original raw values on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    /// Allowed lifecycle moves: pending -> confirmed | cancelled,
    /// confirmed -> in_progress | cancelled, in_progress -> completed.
    /// Completed and cancelled are terminal.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Pending, SessionStatus::Confirmed)
                | (SessionStatus::Pending, SessionStatus::Cancelled)
                | (SessionStatus::Confirmed, SessionStatus::InProgress)
                | (SessionStatus::Confirmed, SessionStatus::Cancelled)
                | (SessionStatus::InProgress, SessionStatus::Completed)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("session cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: SessionStatus,
    pub to: SessionStatus,
}

/// Identifier wrapper for booked sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("sess-{id:06}"))
}

/// A booked (or requested) tutoring session. Created pending by the booking
/// engine; later flows move it through the lifecycle via `transition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutoringSession {
    pub id: SessionId,
    pub student_id: StudentId,
    pub tutor_id: TutorId,
    pub subject_id: SubjectId,
    pub duration: SessionDuration,
    pub scheduled_date_time: NaiveDateTime,
    pub delivery_mode: DeliveryMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    pub total_amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_payment_intent_id: Option<String>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TutoringSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        student_id: StudentId,
        tutor_id: TutorId,
        subject_id: SubjectId,
        duration: SessionDuration,
        scheduled_date_time: NaiveDateTime,
        delivery_mode: DeliveryMode,
        total_amount: Money,
        location: Option<String>,
    ) -> Self {
        TutoringSession {
            id: next_session_id(),
            student_id,
            tutor_id,
            subject_id,
            duration,
            scheduled_date_time,
            delivery_mode,
            location,
            meeting_link: None,
            total_amount,
            stripe_payment_intent_id: None,
            status: SessionStatus::Pending,
            created_at: Utc::now(),
            notes: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.scheduled_date_time.date()
    }

    pub fn weekday(&self) -> DayOfWeek {
        DayOfWeek::from(self.scheduled_date_time.weekday())
    }

    pub fn start_time(&self) -> ClockTime {
        ClockTime::from_naive(self.scheduled_date_time.time())
    }

    pub fn end_time(&self) -> ClockTime {
        self.start_time().plus_minutes(self.duration.minutes())
    }

    /// True for every state that still holds the time window. Cancelled
    /// sessions release their slot.
    pub fn holds_slot(&self) -> bool {
        self.status != SessionStatus::Cancelled
    }

    /// True iff this session's `[start, end)` window overlaps the given window
    /// on the same calendar date.
    pub fn overlaps_window(&self, date: NaiveDate, start: ClockTime, end: ClockTime) -> bool {
        self.date() == date && self.start_time() < end && start < self.end_time()
    }

    pub fn transition(&mut self, next: SessionStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
