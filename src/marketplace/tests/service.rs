use std::sync::Arc;

use super::common::*;

use crate::marketplace::availability::{AvailabilityError, DayOfWeek};
use crate::marketplace::booking::{BookingEngine, BookingError, PricingPolicy};
use crate::marketplace::domain::UserType;
use crate::marketplace::money::Money;
use crate::marketplace::payment::PaymentStatus;
use crate::marketplace::repository::{MarketplaceRepository, RepositoryError, StaticIdentity};
use crate::marketplace::service::{BookingServiceError, MarketplaceService};
use crate::marketplace::session::{SessionDuration, SessionStatus};

#[test]
fn booking_inside_availability_confirms_and_charges() {
    let (service, repository, processor) = build_service();
    let tutor = repository.tutors().expect("tutors")[0].clone();

    let request = monday_request(tutor.id.clone(), 16, 0, SessionDuration::OneHour);
    let confirmation = service.book(&request).expect("booking succeeds");

    assert_eq!(confirmation.session.status, SessionStatus::Pending);
    assert_eq!(confirmation.session.total_amount, Money::from_cents(4500));
    assert_eq!(confirmation.payment.status, PaymentStatus::Succeeded);
    assert_eq!(confirmation.payment.platform_fee, Money::from_cents(180));
    assert_eq!(confirmation.payment.tutor_earnings, Money::from_cents(4320));

    assert_eq!(processor.charges().len(), 1);
    assert!(repository.session(&confirmation.session.id).is_some());
    assert_eq!(repository.payments().len(), 1);
}

#[test]
fn booking_outside_availability_is_rejected_without_side_effects() {
    let (service, repository, processor) = build_service();
    let tutor = repository.tutors().expect("tutors")[0].clone();

    // Monday 13:00 falls outside the declared 16:00-19:00 window.
    let request = monday_request(tutor.id.clone(), 13, 0, SessionDuration::OneHour);
    let err = service.book(&request).expect_err("window not covered");

    assert!(matches!(
        err,
        BookingServiceError::Booking(BookingError::NotAvailable { .. })
    ));
    assert!(processor.charges().is_empty());
    assert!(repository
        .sessions_for_tutor(&tutor.id)
        .expect("sessions")
        .is_empty());
    assert!(repository.payments().is_empty());
}

#[test]
fn second_booking_over_the_same_window_conflicts() {
    let (service, repository, processor) = build_service();
    let tutor = repository.tutors().expect("tutors")[0].clone();

    let first = service
        .book(&monday_request(tutor.id.clone(), 16, 0, SessionDuration::OneHour))
        .expect("first booking succeeds");

    let overlapping = monday_request(tutor.id.clone(), 16, 30, SessionDuration::TwoHours);
    let err = service.book(&overlapping).expect_err("window already taken");

    match err {
        BookingServiceError::Booking(BookingError::Conflict { existing }) => {
            assert_eq!(existing, first.session.id)
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(processor.charges().len(), 1);
    assert_eq!(repository.payments().len(), 1);
}

#[test]
fn back_to_back_bookings_do_not_conflict() {
    let (service, repository, _) = build_service();
    let tutor = repository.tutors().expect("tutors")[0].clone();

    service
        .book(&monday_request(tutor.id.clone(), 16, 0, SessionDuration::OneHour))
        .expect("first hour");
    service
        .book(&monday_request(tutor.id.clone(), 17, 0, SessionDuration::OneHour))
        .expect("adjacent hour shares only the boundary");

    assert_eq!(
        repository
            .sessions_for_tutor(&tutor.id)
            .expect("sessions")
            .len(),
        2
    );
}

#[test]
fn cancelled_session_releases_its_window() {
    let engine = BookingEngine::new(PricingPolicy::default());
    let tutor = maths_tutor();
    let (_, student) = student_fixture();
    let request = monday_request(tutor.id.clone(), 16, 0, SessionDuration::OneHour);

    let mut held = engine
        .validate_booking(&tutor, student.id.clone(), &request, &[])
        .expect("window free");
    held.transition(SessionStatus::Cancelled)
        .expect("pending -> cancelled");

    engine
        .validate_booking(&tutor, student.id, &request, &[held])
        .expect("cancelled session no longer holds the window");
}

#[test]
fn anonymous_caller_cannot_book() {
    let service = service_with_identity(StaticIdentity::anonymous());
    let tutor = maths_tutor();

    let err = service
        .book(&monday_request(tutor.id, 16, 0, SessionDuration::OneHour))
        .expect_err("no caller");
    assert!(matches!(err, BookingServiceError::Unauthenticated));
}

#[test]
fn tutor_account_cannot_book() {
    let tutor_caller = crate::marketplace::domain::User::new(
        "Priya",
        "+61400000105",
        UserType::Tutor,
    );
    let service =
        service_with_identity(StaticIdentity::signed_in(tutor_caller.id, tutor_caller.user_type));
    let tutor = maths_tutor();

    let err = service
        .book(&monday_request(tutor.id, 16, 0, SessionDuration::OneHour))
        .expect_err("wrong role");
    assert!(matches!(err, BookingServiceError::StudentRoleRequired));
}

#[test]
fn declined_charge_still_confirms_with_failed_payment() {
    let (user, student) = student_fixture();
    let repository = Arc::new(crate::marketplace::repository::InMemoryMarketplace::seeded(
        tutor_fixtures(),
        vec![student],
    ));
    let service = MarketplaceService::new(
        repository.clone(),
        Arc::new(DecliningProcessor),
        Arc::new(StaticIdentity::signed_in(user.id, user.user_type)),
        PricingPolicy::default(),
    );
    let tutor = repository.tutors().expect("tutors")[0].clone();

    let confirmation = service
        .book(&monday_request(tutor.id, 16, 0, SessionDuration::OneHour))
        .expect("a decline is a recorded outcome, not an error");

    assert_eq!(confirmation.payment.status, PaymentStatus::Failed);
    assert!(confirmation.payment.processed_at.is_some());
    assert_eq!(repository.payments().len(), 1);
}

#[test]
fn gateway_outage_surfaces_as_payment_error() {
    let (user, student) = student_fixture();
    let repository = Arc::new(crate::marketplace::repository::InMemoryMarketplace::seeded(
        tutor_fixtures(),
        vec![student],
    ));
    let service = MarketplaceService::new(
        repository.clone(),
        Arc::new(OfflineProcessor),
        Arc::new(StaticIdentity::signed_in(user.id, user.user_type)),
        PricingPolicy::default(),
    );
    let tutor = repository.tutors().expect("tutors")[0].clone();

    let err = service
        .book(&monday_request(tutor.id, 16, 0, SessionDuration::OneHour))
        .expect_err("transport failure propagates");
    assert!(matches!(err, BookingServiceError::Payment(_)));
}

#[test]
fn commit_conflict_retries_once_and_succeeds() {
    let (user, student) = student_fixture();
    let repository = Arc::new(FlakyRepository::seeded(tutor_fixtures(), vec![student]));
    let service = MarketplaceService::new(
        repository.clone(),
        Arc::new(RecordingProcessor::default()),
        Arc::new(StaticIdentity::signed_in(user.id, user.user_type)),
        PricingPolicy::default(),
    );
    let tutor = repository.tutors().expect("tutors")[0].clone();

    let confirmation = service
        .book(&monday_request(tutor.id.clone(), 16, 0, SessionDuration::OneHour))
        .expect("retry lands the session after the raced commit");
    assert_eq!(
        repository
            .sessions_for_tutor(&tutor.id)
            .expect("sessions")
            .len(),
        1
    );
    assert_eq!(confirmation.payment.status, PaymentStatus::Succeeded);
}

#[test]
fn unavailable_repository_surfaces_storage_error() {
    let (user, _) = student_fixture();
    let service = MarketplaceService::new(
        Arc::new(UnavailableRepository),
        Arc::new(RecordingProcessor::default()),
        Arc::new(StaticIdentity::signed_in(user.id, user.user_type)),
        PricingPolicy::default(),
    );
    let tutor = maths_tutor();

    let err = service
        .book(&monday_request(tutor.id, 16, 0, SessionDuration::OneHour))
        .expect_err("storage offline");
    assert!(matches!(
        err,
        BookingServiceError::Repository(RepositoryError::Unavailable(_))
    ));
}

#[test]
fn quote_prices_without_touching_availability() {
    let (service, repository, _) = build_service();
    let tutors = repository.tutors().expect("tutors");

    let quote = service
        .quote(&tutors[0].id, SessionDuration::TwoHours)
        .expect("quote succeeds");
    assert_eq!(quote.total_amount, Money::from_cents(9000));
    assert_eq!(quote.platform_fee, Money::from_cents(360));
    assert_eq!(quote.tutor_earnings, Money::from_cents(8640));

    // The chemistry tutor has no declared slots; quoting still works.
    let quote = service
        .quote(&tutors[2].id, SessionDuration::ThirtyMinutes)
        .expect("availability is not consulted for quotes");
    assert_eq!(quote.total_amount, Money::from_cents(1750));
}

#[test]
fn quote_for_unknown_tutor_is_not_found() {
    let (service, _, _) = build_service();
    let err = service
        .quote(
            &crate::marketplace::domain::TutorId("tutor-999999".to_string()),
            SessionDuration::OneHour,
        )
        .expect_err("unknown tutor");
    assert!(matches!(
        err,
        BookingServiceError::Repository(RepositoryError::NotFound)
    ));
}

#[test]
fn availability_changes_persist_through_the_repository() {
    let (service, repository, _) = build_service();
    let tutor = repository.tutors().expect("tutors")[0].clone();

    let slot = service
        .add_availability(&tutor.id, DayOfWeek::Friday, time("14:00"), time("16:00"))
        .expect("new window accepted");
    let stored = repository
        .tutor(&tutor.id)
        .expect("lookup")
        .expect("tutor present");
    assert!(stored.availability.has_slots_on(DayOfWeek::Friday));

    assert!(service
        .remove_availability(&tutor.id, DayOfWeek::Friday, &slot.id)
        .expect("removal"));
    let stored = repository
        .tutor(&tutor.id)
        .expect("lookup")
        .expect("tutor present");
    assert!(!stored.availability.has_slots_on(DayOfWeek::Friday));

    assert!(!service
        .remove_availability(&tutor.id, DayOfWeek::Friday, &slot.id)
        .expect("second removal is a no-op"));
}

#[test]
fn overlapping_availability_is_rejected() {
    let (service, repository, _) = build_service();
    let tutor = repository.tutors().expect("tutors")[0].clone();

    let err = service
        .add_availability(&tutor.id, DayOfWeek::Monday, time("16:30"), time("18:00"))
        .expect_err("overlaps the declared 16:00-19:00 window");
    assert!(matches!(
        err,
        BookingServiceError::Availability(AvailabilityError::Overlap { .. })
    ));
}
