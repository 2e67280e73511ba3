use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::availability::WeeklyAvailability;
use super::catalog::SubjectId;
use super::money::Money;

/// Identifier wrappers for the people aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TutorId(pub String);

static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static STUDENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TUTOR_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_user_id() -> UserId {
    UserId(format!(
        "user-{:06}",
        USER_SEQUENCE.fetch_add(1, Ordering::Relaxed)
    ))
}

fn next_student_id() -> StudentId {
    StudentId(format!(
        "student-{:06}",
        STUDENT_SEQUENCE.fetch_add(1, Ordering::Relaxed)
    ))
}

fn next_tutor_id() -> TutorId {
    TutorId(format!(
        "tutor-{:06}",
        TUTOR_SEQUENCE.fetch_add(1, Ordering::Relaxed)
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Tutor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum YearLevel {
    #[serde(rename = "Year 7")]
    Year7,
    #[serde(rename = "Year 8")]
    Year8,
    #[serde(rename = "Year 9")]
    Year9,
    #[serde(rename = "Year 10")]
    Year10,
    #[serde(rename = "Year 11")]
    Year11,
    #[serde(rename = "Year 12")]
    Year12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EducationLevel {
    #[serde(rename = "High School")]
    HighSchool,
    #[serde(rename = "University")]
    University,
    #[serde(rename = "Gap Year")]
    GapYear,
}

/// Whether a session happens in person, online, or either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    #[serde(rename = "In Person")]
    InPerson,
    #[serde(rename = "Online")]
    Online,
    #[serde(rename = "Both")]
    Both,
}

impl DeliveryMode {
    /// True when a tutor offering `self` can serve a request for `wanted`.
    /// `Both` covers everything.
    pub fn covers(self, wanted: DeliveryMode) -> bool {
        self == DeliveryMode::Both || self == wanted
    }
}

/// Registered account shared by students and tutors. Immutable after signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone_number: String,
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl User {
    pub fn new(first_name: &str, phone_number: &str, user_type: UserType) -> Self {
        User {
            id: next_user_id(),
            first_name: first_name.to_string(),
            last_name: None,
            email: None,
            phone_number: phone_number.to_string(),
            user_type,
            created_at: Utc::now(),
            is_active: true,
        }
    }
}

/// Student registration profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub user_id: UserId,
    pub year_level: YearLevel,
    pub subjects: BTreeSet<SubjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
}

impl Student {
    pub fn new(user_id: UserId, year_level: YearLevel, subjects: BTreeSet<SubjectId>) -> Self {
        Student {
            id: next_student_id(),
            user_id,
            year_level,
            subjects,
            suburb: None,
        }
    }
}

/// Tutor profile. Availability is mutated over time by the tutor; the payment
/// connection fields flip once when the payout account is linked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tutor {
    pub id: TutorId,
    pub user_id: UserId,
    pub subjects: BTreeSet<SubjectId>,
    pub education_level: EducationLevel,
    pub hourly_rate: Money,
    pub delivery_mode: DeliveryMode,
    pub suburb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub is_verified: bool,
    pub is_stripe_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_account_id: Option<String>,
    pub availability: WeeklyAvailability,
    pub rating: f64,
    pub total_sessions: u32,
}

impl Tutor {
    pub fn new(
        user_id: UserId,
        subjects: BTreeSet<SubjectId>,
        education_level: EducationLevel,
        hourly_rate: Money,
        delivery_mode: DeliveryMode,
        suburb: &str,
    ) -> Self {
        Tutor {
            id: next_tutor_id(),
            user_id,
            subjects,
            education_level,
            hourly_rate,
            delivery_mode,
            suburb: suburb.to_string(),
            latitude: None,
            longitude: None,
            bio: None,
            profile_image_url: None,
            is_verified: false,
            is_stripe_connected: false,
            stripe_account_id: None,
            availability: WeeklyAvailability::new(),
            rating: 0.0,
            total_sessions: 0,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn teaches(&self, subject: &SubjectId) -> bool {
        self.subjects.contains(subject)
    }

    /// Link the payout account. A second call replaces the account id; the
    /// connected flag never flips back.
    pub fn connect_payment_account(&mut self, account_id: &str) {
        self.is_stripe_connected = true;
        self.stripe_account_id = Some(account_id.to_string());
    }

    /// Fold a completed session's review into the running average rating.
    pub fn record_completed_session(&mut self, session_rating: f64) {
        let rated = self.total_sessions as f64;
        self.rating = (self.rating * rated + session_rating) / (rated + 1.0);
        self.total_sessions += 1;
    }
}
