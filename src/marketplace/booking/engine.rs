use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::marketplace::availability::{ClockTime, DayOfWeek};
use crate::marketplace::catalog::SubjectId;
use crate::marketplace::domain::{DeliveryMode, StudentId, Tutor};
use crate::marketplace::payment::Payment;
use crate::marketplace::session::{SessionDuration, SessionId, TutoringSession};

use super::pricing::PricingPolicy;

/// What a student asks for when booking a session. The student identity is
/// supplied separately by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub tutor_id: crate::marketplace::domain::TutorId,
    pub subject_id: SubjectId,
    pub duration: SessionDuration,
    pub scheduled_date_time: NaiveDateTime,
    pub delivery_mode: DeliveryMode,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<String>,
}

impl BookingRequest {
    pub fn weekday(&self) -> DayOfWeek {
        DayOfWeek::from(self.scheduled_date_time.weekday())
    }

    pub fn start_time(&self) -> ClockTime {
        ClockTime::from_naive(self.scheduled_date_time.time())
    }

    pub fn end_time(&self) -> ClockTime {
        self.start_time().plus_minutes(self.duration.minutes())
    }
}

/// Typed booking denials. Never silently corrected; retry policy belongs to
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("tutor has no availability covering {day:?} {start}-{end}")]
    NotAvailable {
        day: DayOfWeek,
        start: ClockTime,
        end: ClockTime,
    },
    #[error("requested window overlaps existing session {existing:?}")]
    Conflict { existing: SessionId },
}

/// Validates booking requests against availability and existing sessions and
/// prices them. Pure: constructs objects, performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct BookingEngine {
    pricing: PricingPolicy,
}

impl BookingEngine {
    pub fn new(pricing: PricingPolicy) -> Self {
        BookingEngine { pricing }
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    /// Validate the request against the tutor's declared availability and the
    /// tutor's committed sessions. On success, returns the pending session
    /// with its computed total; no session is constructed on failure.
    pub fn validate_booking(
        &self,
        tutor: &Tutor,
        student_id: StudentId,
        request: &BookingRequest,
        existing_sessions: &[TutoringSession],
    ) -> Result<TutoringSession, BookingError> {
        let day = request.weekday();
        let start = request.start_time();
        let end = request.end_time();

        if !tutor.availability.is_available(day, start, end) {
            return Err(BookingError::NotAvailable { day, start, end });
        }

        let date = request.scheduled_date_time.date();
        if let Some(existing) = existing_sessions
            .iter()
            .find(|session| session.holds_slot() && session.overlaps_window(date, start, end))
        {
            return Err(BookingError::Conflict {
                existing: existing.id.clone(),
            });
        }

        let total = self.pricing.session_total(tutor.hourly_rate, request.duration);
        Ok(TutoringSession::new(
            student_id,
            tutor.id.clone(),
            request.subject_id.clone(),
            request.duration,
            request.scheduled_date_time,
            request.delivery_mode,
            total,
            request.location.clone(),
        ))
    }

    /// Build the pending payment record for a validated session. Charging is
    /// the processor collaborator's job.
    pub fn create_payment(&self, session: &TutoringSession, payment_intent_ref: &str) -> Payment {
        let split = self.pricing.fee_split(session.total_amount);
        Payment::new(session, payment_intent_ref, split)
    }
}
