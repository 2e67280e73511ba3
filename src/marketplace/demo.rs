//! Seed data for running the service without a real backend.

use std::collections::BTreeSet;

use super::availability::{ClockTime, DayOfWeek};
use super::catalog::SubjectId;
use super::domain::{
    DeliveryMode, EducationLevel, Student, Tutor, User, UserType, YearLevel,
};
use super::money::Money;
use super::payment::{ChargeOutcome, PaymentError, PaymentProcessor};

/// Processor stand-in that approves every charge, for local runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApproveProcessor;

impl PaymentProcessor for AutoApproveProcessor {
    fn charge(&self, _amount: Money, reference: &str) -> Result<ChargeOutcome, PaymentError> {
        Ok(ChargeOutcome::Succeeded {
            payment_intent_id: format!("pi_demo_{reference}"),
        })
    }
}

fn time(raw: &str) -> ClockTime {
    raw.parse().expect("seed time literals are valid")
}

fn subjects(ids: &[&str]) -> BTreeSet<SubjectId> {
    ids.iter().map(|id| SubjectId::new(id)).collect()
}

/// Three Sydney tutors with declared weekly availability.
pub fn sample_tutors() -> Vec<Tutor> {
    let mut tutors = Vec::new();

    let user = User::new("Priya", "+61400000011", UserType::Tutor);
    let mut tutor = Tutor::new(
        user.id,
        subjects(&["math-advanced", "physics"]),
        EducationLevel::University,
        Money::from_cents(4500),
        DeliveryMode::Both,
        "Bondi",
    )
    .with_coordinates(-33.8915, 151.2767);
    for day in [DayOfWeek::Monday, DayOfWeek::Wednesday] {
        tutor
            .availability
            .add_slot(day, time("16:00"), time("19:00"))
            .expect("seed slots are disjoint");
    }
    tutor
        .availability
        .add_slot(DayOfWeek::Saturday, time("09:00"), time("12:00"))
        .expect("seed slots are disjoint");
    tutor.rating = 4.8;
    tutor.total_sessions = 32;
    tutor.is_verified = true;
    tutors.push(tutor);

    let user = User::new("Tom", "+61400000012", UserType::Tutor);
    let mut tutor = Tutor::new(
        user.id,
        subjects(&["english-advanced", "modern-history"]),
        EducationLevel::University,
        Money::from_cents(4000),
        DeliveryMode::Online,
        "Manly",
    );
    for day in [DayOfWeek::Tuesday, DayOfWeek::Thursday] {
        tutor
            .availability
            .add_slot(day, time("17:00"), time("20:00"))
            .expect("seed slots are disjoint");
    }
    tutor.rating = 4.5;
    tutor.total_sessions = 18;
    tutors.push(tutor);

    let user = User::new("Lena", "+61400000013", UserType::Tutor);
    let mut tutor = Tutor::new(
        user.id,
        subjects(&["chemistry", "biology"]),
        EducationLevel::GapYear,
        Money::from_cents(3500),
        DeliveryMode::InPerson,
        "Parramatta",
    )
    .with_coordinates(-33.8150, 151.0011);
    tutor
        .availability
        .add_slot(DayOfWeek::Sunday, time("10:00"), time("14:00"))
        .expect("seed slots are disjoint");
    tutors.push(tutor);

    tutors
}

/// A registered student to act as the signed-in caller.
pub fn sample_student() -> (User, Student) {
    let user = User::new("Zoe", "+61400000021", UserType::Student);
    let student = Student::new(
        user.id.clone(),
        YearLevel::Year12,
        subjects(&["math-advanced", "chemistry"]),
    );
    (user, student)
}
