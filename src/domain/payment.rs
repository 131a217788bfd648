use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment status as reported by the payment service.
///
/// Anything the service reports besides COMPLETED or FAILED is treated as
/// still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Failed,
    #[serde(other)]
    Pending,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }
}

/// Response of the pay-for-ticket command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentReceipt {
    pub id: String,
}

/// Response of a payment status lookup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentReport {
    pub status: PaymentStatus,
}

/// A single payment submitted by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAttempt {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl PaymentAttempt {
    pub fn pending(payment_id: impl Into<String>) -> Self {
        Self {
            payment_id: payment_id.into(),
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Lifecycle of one booking attempt.
///
/// `Idle -> Submitting -> Polling -> {Succeeded | PaymentFailed | TimedOut}`,
/// with `Submitting -> SubmitFailed` when the command itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttemptPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Succeeded,
    PaymentFailed,
    TimedOut,
    SubmitFailed,
}

impl AttemptPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptPhase::Succeeded
                | AttemptPhase::PaymentFailed
                | AttemptPhase::TimedOut
                | AttemptPhase::SubmitFailed
        )
    }

    /// An attempt is outstanding while it is being submitted or polled.
    pub fn is_active(&self) -> bool {
        matches!(self, AttemptPhase::Submitting | AttemptPhase::Polling)
    }

    pub fn can_transition_to(&self, next: AttemptPhase) -> bool {
        use AttemptPhase::*;
        match (self, next) {
            (Idle, Submitting) => true,
            (Submitting, Polling | SubmitFailed) => true,
            (Polling, Succeeded | PaymentFailed | TimedOut) => true,
            // Cancelling a poll loop abandons the attempt.
            (Polling, Idle) => true,
            // Every new attempt starts over from a settled orchestrator.
            (current, Idle) if current.is_terminal() => true,
            _ => false,
        }
    }
}

impl fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttemptPhase::Idle => "IDLE",
            AttemptPhase::Submitting => "SUBMITTING",
            AttemptPhase::Polling => "POLLING",
            AttemptPhase::Succeeded => "SUCCESS",
            AttemptPhase::PaymentFailed => "PAYMENT_FAILED",
            AttemptPhase::TimedOut => "TIMEOUT",
            AttemptPhase::SubmitFailed => "FAILED_SUBMIT",
        };
        f.write_str(name)
    }
}

/// Where the user should be sent once an attempt settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Open the ticket list.
    ViewTickets,
    /// Stay on the booking form so the user can try again.
    RetryBooking,
}

/// Terminal result of a poll loop.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Success {
        payment_id: String,
    },
    PaymentFailed {
        payment_id: String,
    },
    /// The ceiling was reached without a terminal status. `last_error` is set
    /// when the final check itself failed.
    TimedOut {
        payment_id: String,
        attempts: u32,
        last_error: Option<String>,
    },
}

impl BookingOutcome {
    pub fn payment_id(&self) -> &str {
        match self {
            BookingOutcome::Success { payment_id }
            | BookingOutcome::PaymentFailed { payment_id }
            | BookingOutcome::TimedOut { payment_id, .. } => payment_id,
        }
    }

    pub fn phase(&self) -> AttemptPhase {
        match self {
            BookingOutcome::Success { .. } => AttemptPhase::Succeeded,
            BookingOutcome::PaymentFailed { .. } => AttemptPhase::PaymentFailed,
            BookingOutcome::TimedOut { .. } => AttemptPhase::TimedOut,
        }
    }

    /// A timeout while the payment is still pending is a soft success: the
    /// backend may complete the booking later, so the user is sent to check
    /// their tickets.
    pub fn next_step(&self) -> NextStep {
        match self {
            BookingOutcome::Success { .. } => NextStep::ViewTickets,
            BookingOutcome::TimedOut {
                last_error: None, ..
            } => NextStep::ViewTickets,
            BookingOutcome::TimedOut { .. } | BookingOutcome::PaymentFailed { .. } => {
                NextStep::RetryBooking
            }
        }
    }

    /// Message shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            BookingOutcome::Success { .. } => "Ticket booked successfully!",
            BookingOutcome::PaymentFailed { .. } => "Payment failed. Please try again.",
            BookingOutcome::TimedOut {
                last_error: None, ..
            } => "Payment is taking longer than expected. Please check your tickets.",
            BookingOutcome::TimedOut { .. } => {
                "Could not confirm the payment status. Please check your tickets before retrying."
            }
        }
    }
}
