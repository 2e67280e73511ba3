use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::marketplace::availability::{ClockTime, DayOfWeek};
use crate::marketplace::booking::{BookingRequest, PricingPolicy};
use crate::marketplace::catalog::SubjectId;
use crate::marketplace::domain::{
    DeliveryMode, EducationLevel, Student, Tutor, TutorId, User, UserId, UserType, YearLevel,
};
use crate::marketplace::money::Money;
use crate::marketplace::payment::{ChargeOutcome, Payment, PaymentError, PaymentProcessor};
use crate::marketplace::repository::{
    IdentityProvider, InMemoryMarketplace, MarketplaceRepository, RepositoryError, StaticIdentity,
};
use crate::marketplace::router::marketplace_router;
use crate::marketplace::service::MarketplaceService;
use crate::marketplace::session::{SessionDuration, TutoringSession};

pub(super) fn time(raw: &str) -> ClockTime {
    raw.parse().expect("valid time literal")
}

pub(super) fn subjects(ids: &[&str]) -> BTreeSet<SubjectId> {
    ids.iter().map(|id| SubjectId::new(id)).collect()
}

/// Verified maths/physics tutor in Bondi, Monday and Saturday availability.
pub(super) fn maths_tutor() -> Tutor {
    let user = User::new("Priya", "+61400000101", UserType::Tutor);
    let mut tutor = Tutor::new(
        user.id,
        subjects(&["math-advanced", "physics"]),
        EducationLevel::University,
        Money::from_cents(4500),
        DeliveryMode::Both,
        "Bondi",
    )
    .with_coordinates(-33.8915, 151.2767);
    tutor
        .availability
        .add_slot(DayOfWeek::Monday, time("16:00"), time("19:00"))
        .expect("fixture slot");
    tutor
        .availability
        .add_slot(DayOfWeek::Saturday, time("09:00"), time("12:00"))
        .expect("fixture slot");
    tutor.rating = 4.8;
    tutor.total_sessions = 32;
    tutor.is_verified = true;
    tutor
}

/// Online-only English tutor in Manly, Tuesday evenings, no coordinates.
pub(super) fn english_tutor() -> Tutor {
    let user = User::new("Tom", "+61400000102", UserType::Tutor);
    let mut tutor = Tutor::new(
        user.id,
        subjects(&["english-advanced"]),
        EducationLevel::HighSchool,
        Money::from_cents(4000),
        DeliveryMode::Online,
        "Manly",
    );
    tutor
        .availability
        .add_slot(DayOfWeek::Tuesday, time("17:00"), time("20:00"))
        .expect("fixture slot");
    tutor.rating = 4.0;
    tutor.total_sessions = 11;
    tutor
}

/// In-person chemistry tutor in Parramatta with no declared availability.
pub(super) fn chemistry_tutor() -> Tutor {
    let user = User::new("Lena", "+61400000103", UserType::Tutor);
    let mut tutor = Tutor::new(
        user.id,
        subjects(&["chemistry"]),
        EducationLevel::GapYear,
        Money::from_cents(3500),
        DeliveryMode::InPerson,
        "Parramatta",
    )
    .with_coordinates(-33.8150, 151.0011);
    tutor.rating = 3.5;
    tutor
}

pub(super) fn tutor_fixtures() -> Vec<Tutor> {
    vec![maths_tutor(), english_tutor(), chemistry_tutor()]
}

pub(super) fn student_fixture() -> (User, Student) {
    let user = User::new("Zoe", "+61400000104", UserType::Student);
    let student = Student::new(
        user.id.clone(),
        YearLevel::Year12,
        subjects(&["math-advanced"]),
    );
    (user, student)
}

/// Booking request on Monday 2026-09-07, inside the maths tutor's 16:00-19:00
/// window when started at 16:00.
pub(super) fn monday_request(
    tutor_id: TutorId,
    hour: u32,
    minute: u32,
    duration: SessionDuration,
) -> BookingRequest {
    let scheduled = NaiveDate::from_ymd_opt(2026, 9, 7)
        .expect("valid date")
        .and_hms_opt(hour, minute, 0)
        .expect("valid time");
    BookingRequest {
        tutor_id,
        subject_id: SubjectId::new("math-advanced"),
        duration,
        scheduled_date_time: scheduled,
        delivery_mode: DeliveryMode::Online,
        location: None,
    }
}

pub(super) type TestService =
    MarketplaceService<InMemoryMarketplace, RecordingProcessor, StaticIdentity>;

/// Service wired with the fixture tutors, a signed-in student, and a
/// processor that approves and records every charge.
pub(super) fn build_service() -> (TestService, Arc<InMemoryMarketplace>, Arc<RecordingProcessor>) {
    let (user, student) = student_fixture();
    let repository = Arc::new(InMemoryMarketplace::seeded(tutor_fixtures(), vec![student]));
    let processor = Arc::new(RecordingProcessor::default());
    let identity = Arc::new(StaticIdentity::signed_in(user.id, user.user_type));
    let service = MarketplaceService::new(
        repository.clone(),
        processor.clone(),
        identity,
        PricingPolicy::default(),
    );
    (service, repository, processor)
}

pub(super) fn service_with_identity(
    identity: StaticIdentity,
) -> MarketplaceService<InMemoryMarketplace, RecordingProcessor, StaticIdentity> {
    let (_, student) = student_fixture();
    MarketplaceService::new(
        Arc::new(InMemoryMarketplace::seeded(tutor_fixtures(), vec![student])),
        Arc::new(RecordingProcessor::default()),
        Arc::new(identity),
        PricingPolicy::default(),
    )
}

#[derive(Default)]
pub(super) struct RecordingProcessor {
    charges: Mutex<Vec<(Money, String)>>,
}

impl RecordingProcessor {
    pub(super) fn charges(&self) -> Vec<(Money, String)> {
        self.charges.lock().expect("processor mutex poisoned").clone()
    }
}

impl PaymentProcessor for RecordingProcessor {
    fn charge(&self, amount: Money, reference: &str) -> Result<ChargeOutcome, PaymentError> {
        self.charges
            .lock()
            .expect("processor mutex poisoned")
            .push((amount, reference.to_string()));
        Ok(ChargeOutcome::Succeeded {
            payment_intent_id: format!("pi_live_{reference}"),
        })
    }
}

pub(super) struct DecliningProcessor;

impl PaymentProcessor for DecliningProcessor {
    fn charge(&self, _amount: Money, _reference: &str) -> Result<ChargeOutcome, PaymentError> {
        Ok(ChargeOutcome::Declined {
            reason: "insufficient funds".to_string(),
        })
    }
}

pub(super) struct OfflineProcessor;

impl PaymentProcessor for OfflineProcessor {
    fn charge(&self, _amount: Money, _reference: &str) -> Result<ChargeOutcome, PaymentError> {
        Err(PaymentError::GatewayUnavailable(
            "gateway timeout".to_string(),
        ))
    }
}

/// Delegating repository whose first `insert_session` reports a conflict, to
/// exercise the service's re-validate-and-retry path.
pub(super) struct FlakyRepository {
    inner: InMemoryMarketplace,
    tripped: AtomicBool,
}

impl FlakyRepository {
    pub(super) fn seeded(tutors: Vec<Tutor>, students: Vec<Student>) -> Self {
        FlakyRepository {
            inner: InMemoryMarketplace::seeded(tutors, students),
            tripped: AtomicBool::new(false),
        }
    }
}

impl MarketplaceRepository for FlakyRepository {
    fn tutors(&self) -> Result<Vec<Tutor>, RepositoryError> {
        self.inner.tutors()
    }

    fn tutor(&self, id: &TutorId) -> Result<Option<Tutor>, RepositoryError> {
        self.inner.tutor(id)
    }

    fn update_tutor(&self, tutor: Tutor) -> Result<(), RepositoryError> {
        self.inner.update_tutor(tutor)
    }

    fn student_for_user(&self, user_id: &UserId) -> Result<Option<Student>, RepositoryError> {
        self.inner.student_for_user(user_id)
    }

    fn sessions_for_tutor(&self, id: &TutorId) -> Result<Vec<TutoringSession>, RepositoryError> {
        self.inner.sessions_for_tutor(id)
    }

    fn insert_session(
        &self,
        session: TutoringSession,
    ) -> Result<TutoringSession, RepositoryError> {
        if !self.tripped.swap(true, Ordering::SeqCst) {
            return Err(RepositoryError::Conflict);
        }
        self.inner.insert_session(session)
    }

    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        self.inner.insert_payment(payment)
    }
}

pub(super) struct UnavailableRepository;

impl MarketplaceRepository for UnavailableRepository {
    fn tutors(&self) -> Result<Vec<Tutor>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn tutor(&self, _id: &TutorId) -> Result<Option<Tutor>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_tutor(&self, _tutor: Tutor) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn student_for_user(&self, _user_id: &UserId) -> Result<Option<Student>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn sessions_for_tutor(&self, _id: &TutorId) -> Result<Vec<TutoringSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_session(
        &self,
        _session: TutoringSession,
    ) -> Result<TutoringSession, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_payment(&self, _payment: Payment) -> Result<Payment, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn router_with<R, P, I>(service: MarketplaceService<R, P, I>) -> axum::Router
where
    R: MarketplaceRepository + 'static,
    P: PaymentProcessor + 'static,
    I: IdentityProvider + 'static,
{
    marketplace_router(Arc::new(service))
}

pub(super) fn post_json<T: serde::Serialize>(
    uri: &str,
    payload: &T,
) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(payload).expect("payload serializes"),
        ))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
