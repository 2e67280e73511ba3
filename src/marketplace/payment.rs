use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::booking::FeeSplit;
use super::domain::{StudentId, TutorId};
use super::money::Money;
use super::session::{SessionId, TutoringSession};

/// Identifier wrapper for payment records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaymentId(pub String);

static PAYMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_payment_id() -> PaymentId {
    let id = PAYMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PaymentId(format!("pay-{id:06}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Refunded,
}

/// Payment record created alongside a session at booking confirmation. The
/// core only constructs and updates this record; moving real money is the
/// processor collaborator's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub session_id: SessionId,
    pub student_id: StudentId,
    pub tutor_id: TutorId,
    pub amount: Money,
    pub stripe_payment_intent_id: String,
    pub platform_fee: Money,
    pub tutor_earnings: Money,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn new(session: &TutoringSession, payment_intent_ref: &str, split: FeeSplit) -> Self {
        Payment {
            id: next_payment_id(),
            session_id: session.id.clone(),
            student_id: session.student_id.clone(),
            tutor_id: session.tutor_id.clone(),
            amount: session.total_amount,
            stripe_payment_intent_id: payment_intent_ref.to_string(),
            platform_fee: split.platform_fee,
            tutor_earnings: split.tutor_earnings,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Record the processor's callback outcome.
    pub fn record_outcome(&mut self, outcome: &ChargeOutcome) {
        match outcome {
            ChargeOutcome::Succeeded { payment_intent_id } => {
                self.status = PaymentStatus::Succeeded;
                self.stripe_payment_intent_id = payment_intent_id.clone();
            }
            ChargeOutcome::Declined { .. } => {
                self.status = PaymentStatus::Failed;
            }
        }
        self.processed_at = Some(Utc::now());
    }
}

/// Result of asking the processor collaborator to charge a card. A decline is
/// a normal business outcome, distinct from a transport-level `PaymentError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeOutcome {
    Succeeded { payment_intent_id: String },
    Declined { reason: String },
}

/// Opaque pass-through failure from the payment processor collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
}

/// Outbound seam to the payment gateway. The core never implements the
/// gateway protocol itself.
pub trait PaymentProcessor: Send + Sync {
    fn charge(&self, amount: Money, reference: &str) -> Result<ChargeOutcome, PaymentError>;
}
