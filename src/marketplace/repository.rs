use std::collections::HashMap;
use std::sync::Mutex;

use super::domain::{Student, Tutor, TutorId, UserId, UserType};
use super::payment::Payment;
use super::session::{SessionId, TutoringSession};

/// Error enumeration for repository failures. `Unavailable` is the opaque
/// pass-through for whatever the storage backend reports.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record conflicts with committed state")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction so the marketplace service can be exercised without a
/// real backend. `insert_session` owns the transactional check-and-insert:
/// implementations must re-check the overlap invariant against committed state
/// atomically and answer `Conflict` when it would be violated.
pub trait MarketplaceRepository: Send + Sync {
    fn tutors(&self) -> Result<Vec<Tutor>, RepositoryError>;
    fn tutor(&self, id: &TutorId) -> Result<Option<Tutor>, RepositoryError>;
    fn update_tutor(&self, tutor: Tutor) -> Result<(), RepositoryError>;
    fn student_for_user(&self, user_id: &UserId) -> Result<Option<Student>, RepositoryError>;
    fn sessions_for_tutor(&self, id: &TutorId) -> Result<Vec<TutoringSession>, RepositoryError>;
    fn insert_session(&self, session: TutoringSession)
        -> Result<TutoringSession, RepositoryError>;
    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError>;
}

/// Who is calling, as supplied by the identity collaborator at call time.
/// The core never stores credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub user_type: UserType,
}

/// Identity seam: resolves the caller for operations that require one.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<CurrentUser>;
}

/// Fixed identity used by the demo wiring and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<CurrentUser>,
}

impl StaticIdentity {
    pub fn signed_in(user_id: UserId, user_type: UserType) -> Self {
        StaticIdentity {
            user: Some(CurrentUser { user_id, user_type }),
        }
    }

    pub fn anonymous() -> Self {
        StaticIdentity::default()
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<CurrentUser> {
        self.user.clone()
    }
}

#[derive(Default)]
struct MarketplaceState {
    tutors: Vec<Tutor>,
    students: Vec<Student>,
    sessions: HashMap<TutorId, Vec<TutoringSession>>,
    payments: Vec<Payment>,
}

/// Mutex-guarded in-memory repository. The session insert re-validates the
/// overlap invariant while holding the lock, which is what gives the
/// at-most-one-booking-per-window guarantee a real backend would provide with
/// a transaction.
#[derive(Default)]
pub struct InMemoryMarketplace {
    state: Mutex<MarketplaceState>,
}

impl InMemoryMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(tutors: Vec<Tutor>, students: Vec<Student>) -> Self {
        InMemoryMarketplace {
            state: Mutex::new(MarketplaceState {
                tutors,
                students,
                sessions: HashMap::new(),
                payments: Vec::new(),
            }),
        }
    }

    pub fn payments(&self) -> Vec<Payment> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        state.payments.clone()
    }

    pub fn session(&self, id: &SessionId) -> Option<TutoringSession> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        state
            .sessions
            .values()
            .flatten()
            .find(|session| &session.id == id)
            .cloned()
    }
}

impl MarketplaceRepository for InMemoryMarketplace {
    fn tutors(&self) -> Result<Vec<Tutor>, RepositoryError> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        Ok(state.tutors.clone())
    }

    fn tutor(&self, id: &TutorId) -> Result<Option<Tutor>, RepositoryError> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        Ok(state.tutors.iter().find(|tutor| &tutor.id == id).cloned())
    }

    fn update_tutor(&self, tutor: Tutor) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        match state.tutors.iter_mut().find(|stored| stored.id == tutor.id) {
            Some(stored) => {
                *stored = tutor;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn student_for_user(&self, user_id: &UserId) -> Result<Option<Student>, RepositoryError> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        Ok(state
            .students
            .iter()
            .find(|student| &student.user_id == user_id)
            .cloned())
    }

    fn sessions_for_tutor(&self, id: &TutorId) -> Result<Vec<TutoringSession>, RepositoryError> {
        let state = self.state.lock().expect("marketplace mutex poisoned");
        Ok(state.sessions.get(id).cloned().unwrap_or_default())
    }

    fn insert_session(
        &self,
        session: TutoringSession,
    ) -> Result<TutoringSession, RepositoryError> {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        let committed = state.sessions.entry(session.tutor_id.clone()).or_default();

        let window_taken = committed.iter().any(|existing| {
            existing.holds_slot()
                && existing.overlaps_window(
                    session.date(),
                    session.start_time(),
                    session.end_time(),
                )
        });
        if window_taken {
            return Err(RepositoryError::Conflict);
        }

        committed.push(session.clone());
        Ok(session)
    }

    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        let mut state = self.state.lock().expect("marketplace mutex poisoned");
        state.payments.push(payment.clone());
        Ok(payment)
    }
}
