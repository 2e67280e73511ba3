use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::availability::{AvailabilityError, ClockTime, DayOfWeek, SlotId, TimeSlot};
use super::booking::{BookingEngine, BookingError, BookingRequest, PricingPolicy};
use super::domain::{Student, Tutor, TutorId, UserType};
use super::money::Money;
use super::payment::{Payment, PaymentError, PaymentProcessor};
use super::repository::{IdentityProvider, MarketplaceRepository, RepositoryError};
use super::search::{search_tutors, SearchContext, TutorSearchFilter};
use super::session::{SessionDuration, TutoringSession};

/// Application facade composing the repository, payment processor, and
/// identity collaborators around the pure booking and search engines.
pub struct MarketplaceService<R, P, I> {
    repository: Arc<R>,
    processor: Arc<P>,
    identity: Arc<I>,
    engine: BookingEngine,
}

/// Price breakdown offered to a student before they confirm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuote {
    pub tutor_id: TutorId,
    pub hourly_rate: Money,
    pub duration: SessionDuration,
    pub total_amount: Money,
    pub platform_fee: Money,
    pub tutor_earnings: Money,
}

/// Committed booking: the stored session plus its payment record. The payment
/// status reflects the processor outcome (a decline is a recorded outcome,
/// not a transport failure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub session: TutoringSession,
    pub payment: Payment,
}

/// Error raised by the marketplace service.
#[derive(Debug, thiserror::Error)]
pub enum BookingServiceError {
    #[error("caller is not authenticated")]
    Unauthenticated,
    #[error("booking requires a student account")]
    StudentRoleRequired,
    #[error(transparent)]
    Availability(#[from] AvailabilityError),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl<R, P, I> MarketplaceService<R, P, I>
where
    R: MarketplaceRepository + 'static,
    P: PaymentProcessor + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(
        repository: Arc<R>,
        processor: Arc<P>,
        identity: Arc<I>,
        pricing: PricingPolicy,
    ) -> Self {
        MarketplaceService {
            repository,
            processor,
            identity,
            engine: BookingEngine::new(pricing),
        }
    }

    /// List tutors matching the filter and optional free-text query, in the
    /// repository's collection order.
    pub fn search(
        &self,
        filter: &TutorSearchFilter,
        query: Option<&str>,
        context: &SearchContext,
    ) -> Result<Vec<Tutor>, BookingServiceError> {
        let tutors = self.repository.tutors()?;
        let matched = search_tutors(&tutors, filter, query, context)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        info!(
            candidates = tutors.len(),
            matched = matched.len(),
            "tutor search evaluated"
        );
        Ok(matched)
    }

    /// Price a prospective session without touching availability.
    pub fn quote(
        &self,
        tutor_id: &TutorId,
        duration: SessionDuration,
    ) -> Result<BookingQuote, BookingServiceError> {
        let tutor = self
            .repository
            .tutor(tutor_id)?
            .ok_or(RepositoryError::NotFound)?;

        let total = self.engine.pricing().session_total(tutor.hourly_rate, duration);
        let split = self.engine.pricing().fee_split(total);
        Ok(BookingQuote {
            tutor_id: tutor.id,
            hourly_rate: tutor.hourly_rate,
            duration,
            total_amount: total,
            platform_fee: split.platform_fee,
            tutor_earnings: split.tutor_earnings,
        })
    }

    /// Book a session for the signed-in student: validate against the tutor's
    /// availability and committed sessions, commit, then record the payment.
    pub fn book(
        &self,
        request: &BookingRequest,
    ) -> Result<BookingConfirmation, BookingServiceError> {
        let student = self.require_student()?;
        let tutor = self
            .repository
            .tutor(&request.tutor_id)?
            .ok_or(RepositoryError::NotFound)?;

        let committed = self.repository.sessions_for_tutor(&tutor.id)?;
        let session =
            self.engine
                .validate_booking(&tutor, student.id.clone(), request, &committed)?;

        let stored = self.commit_session(&tutor, &student, request, session)?;

        let mut payment = self
            .engine
            .create_payment(&stored, &format!("pi_{}", stored.id.0));
        let outcome = self.processor.charge(payment.amount, &payment.id.0)?;
        payment.record_outcome(&outcome);
        let payment = self.repository.insert_payment(payment)?;

        info!(
            session = %stored.id.0,
            tutor = %stored.tutor_id.0,
            amount = %stored.total_amount,
            payment_status = ?payment.status,
            "session booked"
        );

        Ok(BookingConfirmation {
            session: stored,
            payment,
        })
    }

    /// Declare a new weekly availability window for a tutor and persist it.
    pub fn add_availability(
        &self,
        tutor_id: &TutorId,
        day: DayOfWeek,
        start: ClockTime,
        end: ClockTime,
    ) -> Result<TimeSlot, BookingServiceError> {
        let mut tutor = self
            .repository
            .tutor(tutor_id)?
            .ok_or(RepositoryError::NotFound)?;
        let slot = tutor.availability.add_slot(day, start, end)?;
        self.repository.update_tutor(tutor)?;
        Ok(slot)
    }

    /// Withdraw a declared window. Returns false when the slot id is unknown.
    pub fn remove_availability(
        &self,
        tutor_id: &TutorId,
        day: DayOfWeek,
        slot_id: &SlotId,
    ) -> Result<bool, BookingServiceError> {
        let mut tutor = self
            .repository
            .tutor(tutor_id)?
            .ok_or(RepositoryError::NotFound)?;
        let removed = tutor.availability.remove_slot(day, slot_id);
        if removed {
            self.repository.update_tutor(tutor)?;
        }
        Ok(removed)
    }

    fn require_student(&self) -> Result<Student, BookingServiceError> {
        let caller = self
            .identity
            .current_user()
            .ok_or(BookingServiceError::Unauthenticated)?;
        if caller.user_type != UserType::Student {
            return Err(BookingServiceError::StudentRoleRequired);
        }
        self.repository
            .student_for_user(&caller.user_id)?
            .ok_or(BookingServiceError::Repository(RepositoryError::NotFound))
    }

    /// Transactional insert with one optimistic retry: when the repository
    /// reports a conflict, re-validate against the latest committed session
    /// set and try once more; a second conflict surfaces to the caller.
    fn commit_session(
        &self,
        tutor: &Tutor,
        student: &Student,
        request: &BookingRequest,
        session: TutoringSession,
    ) -> Result<TutoringSession, BookingServiceError> {
        match self.repository.insert_session(session) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Conflict) => {
                warn!(
                    tutor = %tutor.id.0,
                    "booking window raced a concurrent commit; re-validating"
                );
                let committed = self.repository.sessions_for_tutor(&tutor.id)?;
                let session = self.engine.validate_booking(
                    tutor,
                    student.id.clone(),
                    request,
                    &committed,
                )?;
                self.repository
                    .insert_session(session)
                    .map_err(BookingServiceError::from)
            }
            Err(other) => Err(other.into()),
        }
    }
}
