//! Tutoring marketplace domain: catalog, availability, search, booking,
//! pricing, and the collaborator seams around them.

pub mod availability;
pub mod booking;
pub mod catalog;
pub mod demo;
pub mod domain;
pub mod messaging;
pub mod money;
pub mod payment;
pub mod repository;
pub mod router;
pub mod search;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use availability::{
    AvailabilityError, ClockTime, DayOfWeek, SlotId, TimeSlot, WeeklyAvailability,
};
pub use booking::{BookingEngine, BookingError, BookingRequest, FeeSplit, PricingPolicy};
pub use catalog::{Subject, SubjectId};
pub use domain::{
    DeliveryMode, EducationLevel, Student, StudentId, Tutor, TutorId, User, UserId, UserType,
    YearLevel,
};
pub use messaging::{
    conversation_id_for, Conversation, ConversationId, Message, MessageId, MessageType,
};
pub use money::Money;
pub use payment::{
    ChargeOutcome, Payment, PaymentError, PaymentId, PaymentProcessor, PaymentStatus,
};
pub use repository::{
    CurrentUser, IdentityProvider, InMemoryMarketplace, MarketplaceRepository, RepositoryError,
    StaticIdentity,
};
pub use router::marketplace_router;
pub use search::{GeoPoint, SearchContext, TutorSearchFilter, DEFAULT_NEARBY_RADIUS_KM};
pub use service::{BookingConfirmation, BookingQuote, BookingServiceError, MarketplaceService};
pub use session::{
    InvalidTransition, SessionDuration, SessionId, SessionStatus, TutoringSession,
};
