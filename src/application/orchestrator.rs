use crate::domain::booking::{BookingDraft, PayForTicketRequest};
use crate::domain::money::Amount;
use crate::domain::payment::{AttemptPhase, BookingOutcome, PaymentAttempt, PaymentStatus};
use crate::domain::ports::{PaymentServiceBox, SleeperBox};
use crate::domain::session::Session;
use crate::error::{BookingError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// How often and how long to wait for a payment to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Caller side of a poll loop cancellation.
#[derive(Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Loop side of a poll loop cancellation.
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the paired handle cancels. Never resolves if every
    /// handle is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                if *self.receiver.borrow() {
                    return;
                }
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Creates a connected cancel handle/signal pair.
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (
        CancelHandle {
            sender: Arc::new(sender),
        },
        CancelSignal { receiver },
    )
}

/// Puts the orchestrator back to `Idle` when a submission future is dropped
/// before the payment service answers. No payment id was recorded, so the
/// attempt cannot be polled and must not block the next submission.
struct SubmitRollback<'a> {
    phase: &'a mut AttemptPhase,
    answered: bool,
}

impl Drop for SubmitRollback<'_> {
    fn drop(&mut self) {
        if !self.answered && *self.phase == AttemptPhase::Submitting {
            warn!("submission dropped before the payment service answered");
            *self.phase = AttemptPhase::Idle;
        }
    }
}

/// Drives a single ticket purchase from submission to a terminal outcome.
///
/// The orchestrator owns at most one [`PaymentAttempt`] at a time. It submits
/// the pay-for-ticket command, then polls the payment service every
/// `policy.interval` until the payment completes, fails, or `policy.max_attempts`
/// checks have been made.
///
/// Time and the payment service are injected, so the whole workflow runs
/// without a UI host or real delays.
pub struct BookingOrchestrator {
    payments: PaymentServiceBox,
    sleeper: SleeperBox,
    policy: PollPolicy,
    phase: AttemptPhase,
    attempt: Option<PaymentAttempt>,
}

impl BookingOrchestrator {
    /// Creates a new `BookingOrchestrator` with the default poll policy
    /// (2000 ms interval, 30 attempts).
    ///
    /// # Arguments
    ///
    /// * `payments` - The payment service to submit to and poll.
    /// * `sleeper` - The time source between status checks.
    pub fn new(payments: PaymentServiceBox, sleeper: SleeperBox) -> Self {
        Self {
            payments,
            sleeper,
            policy: PollPolicy::default(),
            phase: AttemptPhase::Idle,
            attempt: None,
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    pub fn attempt(&self) -> Option<&PaymentAttempt> {
        self.attempt.as_ref()
    }

    fn transition(&mut self, next: AttemptPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(BookingError::InternalError(
                format!("illegal attempt transition {} -> {}", self.phase, next).into(),
            ));
        }
        debug!(from = %self.phase, to = %next, "attempt phase change");
        self.phase = next;
        Ok(())
    }

    /// Submits the pay-for-ticket command for `draft` at `price`.
    ///
    /// Invalid drafts and anonymous sessions are rejected before any network
    /// call. A failed command ends the attempt in `FAILED_SUBMIT`; it is never
    /// retried automatically.
    pub async fn submit(
        &mut self,
        session: &Session,
        draft: &BookingDraft,
        price: Amount,
    ) -> Result<PaymentAttempt> {
        if self.phase.is_active() {
            return Err(BookingError::AttemptInProgress);
        }
        draft.validate()?;
        let user_id = session.user_id().ok_or(BookingError::Unauthenticated)?;
        let request = PayForTicketRequest::from_draft(user_id, draft, price)?;

        if self.phase.is_terminal() {
            self.transition(AttemptPhase::Idle)?;
        }
        self.attempt = None;
        self.transition(AttemptPhase::Submitting)?;

        info!(
            route_id = %request.route_id,
            schedule_id = %request.schedule_id,
            amount = %request.amount,
            currency = %request.currency,
            "submitting pay-for-ticket"
        );

        let response = {
            let mut rollback = SubmitRollback {
                phase: &mut self.phase,
                answered: false,
            };
            let response = self.payments.pay_for_ticket(&request).await;
            rollback.answered = true;
            response
        };

        match response {
            Ok(receipt) => {
                let attempt = PaymentAttempt::pending(receipt.id);
                info!(payment_id = %attempt.payment_id, "payment initiated");
                self.attempt = Some(attempt.clone());
                self.transition(AttemptPhase::Polling)?;
                Ok(attempt)
            }
            Err(e) => {
                warn!(error = %e, "pay-for-ticket failed");
                self.transition(AttemptPhase::SubmitFailed)?;
                Err(match e {
                    BookingError::Unauthorized(message) => BookingError::Unauthorized(message),
                    other => BookingError::SubmissionError(other.to_string()),
                })
            }
        }
    }

    /// Polls the status of the attempt started by [`submit`](Self::submit)
    /// until it reaches a terminal outcome.
    ///
    /// Returns `Ok(None)` when `cancel` fires: no further checks are made and
    /// no outcome is produced. Status lookup errors are tolerated until the
    /// attempt ceiling.
    pub async fn poll_until_terminal(
        &mut self,
        payment_id: &str,
        cancel: &mut CancelSignal,
    ) -> Result<Option<BookingOutcome>> {
        let awaiting = self.phase == AttemptPhase::Polling
            && self
                .attempt
                .as_ref()
                .is_some_and(|a| a.payment_id == payment_id);
        if !awaiting {
            return Err(BookingError::ValidationError(format!(
                "No payment awaiting confirmation with id {payment_id}"
            )));
        }

        let policy = self.policy;
        let mut last_error: Option<String> = None;

        for attempt in 1..=policy.max_attempts {
            let cancelled = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                _ = self.sleeper.sleep(policy.interval) => false,
            };
            if cancelled {
                return self.abandon(payment_id);
            }

            let report = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                report = self.payments.get_payment(payment_id) => Some(report),
            };
            let Some(report) = report else {
                return self.abandon(payment_id);
            };

            match report {
                Ok(report) => {
                    last_error = None;
                    debug!(payment_id, attempt, status = ?report.status, "payment status");
                    if let Some(current) = self.attempt.as_mut() {
                        current.status = report.status;
                    }
                    match report.status {
                        PaymentStatus::Completed => {
                            return self.settle(BookingOutcome::Success {
                                payment_id: payment_id.to_string(),
                            });
                        }
                        PaymentStatus::Failed => {
                            return self.settle(BookingOutcome::PaymentFailed {
                                payment_id: payment_id.to_string(),
                            });
                        }
                        PaymentStatus::Pending => {}
                    }
                }
                Err(e) => {
                    let e = BookingError::PollError(e.to_string());
                    warn!(payment_id, attempt, error = %e, "payment status check failed");
                    last_error = Some(e.to_string());
                }
            }
        }

        self.settle(BookingOutcome::TimedOut {
            payment_id: payment_id.to_string(),
            attempts: policy.max_attempts,
            last_error,
        })
    }

    /// Submits and then waits for the outcome.
    ///
    /// `cancel` also covers the submission: the orchestrator returns to
    /// `Idle` and `Ok(None)` is returned. A submission cancelled in flight may
    /// still have reached the payment service.
    pub async fn book(
        &mut self,
        session: &Session,
        draft: &BookingDraft,
        price: Amount,
        cancel: &mut CancelSignal,
    ) -> Result<Option<BookingOutcome>> {
        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            attempt = self.submit(session, draft, price) => Some(attempt),
        };
        let Some(attempt) = submitted else {
            info!("booking cancelled before the payment was accepted");
            return Ok(None);
        };
        let attempt = attempt?;
        self.poll_until_terminal(&attempt.payment_id, cancel).await
    }

    fn settle(&mut self, outcome: BookingOutcome) -> Result<Option<BookingOutcome>> {
        self.transition(outcome.phase())?;
        info!(payment_id = outcome.payment_id(), outcome = %self.phase, "booking attempt settled");
        Ok(Some(outcome))
    }

    fn abandon(&mut self, payment_id: &str) -> Result<Option<BookingOutcome>> {
        info!(payment_id, "payment polling cancelled");
        self.transition(AttemptPhase::Idle)?;
        self.attempt = None;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{PaymentReceipt, PaymentReport};
    use crate::domain::ports::{PaymentService, Sleeper};
    use crate::domain::session::UserProfile;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    #[derive(Clone, Default)]
    struct FakePayments {
        statuses: Arc<Mutex<VecDeque<PaymentStatus>>>,
        submissions: Arc<Mutex<Vec<PayForTicketRequest>>>,
        polls: Arc<AtomicU32>,
        reject_submission: bool,
        stall_next_submission: Arc<AtomicBool>,
    }

    impl FakePayments {
        fn with_statuses(statuses: &[PaymentStatus]) -> Self {
            let fake = Self::default();
            fake.statuses.lock().unwrap().extend(statuses.iter().copied());
            fake
        }
    }

    #[async_trait]
    impl PaymentService for FakePayments {
        async fn pay_for_ticket(&self, request: &PayForTicketRequest) -> Result<PaymentReceipt> {
            self.submissions.lock().unwrap().push(request.clone());
            if self.stall_next_submission.swap(false, Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.reject_submission {
                return Err(BookingError::ServiceError {
                    status: 400,
                    message: "Missing scheduleId".to_string(),
                });
            }
            Ok(PaymentReceipt {
                id: "pay_1".to_string(),
            })
        }

        async fn get_payment(&self, _payment_id: &str) -> Result<PaymentReport> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let status = self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(PaymentStatus::Pending);
            Ok(PaymentReport { status })
        }
    }

    #[derive(Clone, Default)]
    struct InstantSleeper {
        slept: Arc<Mutex<Vec<Duration>>>,
    }

    #[async_trait]
    impl Sleeper for InstantSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    fn session() -> Session {
        Session::authenticated(
            "token".to_string(),
            UserProfile {
                id: "u1".to_string(),
                email: "jane@x.com".to_string(),
                role: None,
                name: Some("Jane Doe".to_string()),
                phone: None,
            },
        )
    }

    fn draft() -> BookingDraft {
        BookingDraft::new("R1")
            .with_schedule("S1")
            .with_passenger("Jane Doe", "jane@x.com")
    }

    fn price() -> Amount {
        Amount::new(dec!(25.00)).unwrap()
    }

    #[tokio::test]
    async fn test_completed_on_fourth_poll() {
        let payments = FakePayments::with_statuses(&[
            PaymentStatus::Pending,
            PaymentStatus::Pending,
            PaymentStatus::Pending,
            PaymentStatus::Completed,
        ]);
        let sleeper = InstantSleeper::default();
        let mut orchestrator =
            BookingOrchestrator::new(Box::new(payments.clone()), Box::new(sleeper.clone()));
        let (_handle, mut signal) = cancellation();

        let outcome = orchestrator
            .book(&session(), &draft(), price(), &mut signal)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Some(BookingOutcome::Success {
                payment_id: "pay_1".to_string()
            })
        );
        assert_eq!(payments.polls.load(Ordering::SeqCst), 4);
        assert_eq!(payments.submissions.lock().unwrap().len(), 1);
        assert_eq!(
            *sleeper.slept.lock().unwrap(),
            vec![DEFAULT_POLL_INTERVAL; 4]
        );
        assert_eq!(orchestrator.phase(), AttemptPhase::Succeeded);
        assert_eq!(
            orchestrator.attempt().unwrap().status,
            PaymentStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_pending_until_ceiling_times_out() {
        let payments = FakePayments::default();
        let mut orchestrator = BookingOrchestrator::new(
            Box::new(payments.clone()),
            Box::new(InstantSleeper::default()),
        );
        let (_handle, mut signal) = cancellation();

        let outcome = orchestrator
            .book(&session(), &draft(), price(), &mut signal)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            outcome,
            BookingOutcome::TimedOut {
                payment_id: "pay_1".to_string(),
                attempts: 30,
                last_error: None,
            }
        );
        assert_eq!(payments.polls.load(Ordering::SeqCst), 30);
        assert_eq!(orchestrator.phase(), AttemptPhase::TimedOut);
    }

    #[tokio::test]
    async fn test_invalid_draft_makes_no_call() {
        let payments = FakePayments::default();
        let mut orchestrator = BookingOrchestrator::new(
            Box::new(payments.clone()),
            Box::new(InstantSleeper::default()),
        );
        let draft = BookingDraft::new("R1")
            .with_schedule("S1")
            .with_passenger("", "jane@x.com");

        let result = orchestrator.submit(&session(), &draft, price()).await;

        assert!(matches!(result, Err(BookingError::ValidationError(_))));
        assert!(payments.submissions.lock().unwrap().is_empty());
        assert_eq!(orchestrator.phase(), AttemptPhase::Idle);
    }

    #[tokio::test]
    async fn test_anonymous_session_rejected() {
        let payments = FakePayments::default();
        let mut orchestrator = BookingOrchestrator::new(
            Box::new(payments.clone()),
            Box::new(InstantSleeper::default()),
        );

        let result = orchestrator
            .submit(&Session::anonymous(), &draft(), price())
            .await;

        assert!(matches!(result, Err(BookingError::Unauthenticated)));
        assert!(payments.submissions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_submission_does_not_poll() {
        let payments = FakePayments {
            reject_submission: true,
            ..FakePayments::default()
        };
        let mut orchestrator = BookingOrchestrator::new(
            Box::new(payments.clone()),
            Box::new(InstantSleeper::default()),
        );
        let (_handle, mut signal) = cancellation();

        let result = orchestrator
            .book(&session(), &draft(), price(), &mut signal)
            .await;

        assert!(matches!(result, Err(BookingError::SubmissionError(_))));
        assert_eq!(payments.polls.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.phase(), AttemptPhase::SubmitFailed);
        assert!(orchestrator.attempt().is_none());
    }

    #[tokio::test]
    async fn test_new_attempt_after_terminal_outcome() {
        let payments = FakePayments::with_statuses(&[PaymentStatus::Failed]);
        let mut orchestrator = BookingOrchestrator::new(
            Box::new(payments.clone()),
            Box::new(InstantSleeper::default()),
        );
        let (_handle, mut signal) = cancellation();

        let first = orchestrator
            .book(&session(), &draft(), price(), &mut signal)
            .await
            .unwrap();
        assert!(matches!(first, Some(BookingOutcome::PaymentFailed { .. })));

        payments
            .statuses
            .lock()
            .unwrap()
            .push_back(PaymentStatus::Completed);
        let second = orchestrator
            .book(&session(), &draft(), price(), &mut signal)
            .await
            .unwrap();
        assert!(matches!(second, Some(BookingOutcome::Success { .. })));
        assert_eq!(payments.submissions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_rejected_while_polling() {
        let payments = FakePayments::default();
        let mut orchestrator = BookingOrchestrator::new(
            Box::new(payments.clone()),
            Box::new(InstantSleeper::default()),
        );

        orchestrator.submit(&session(), &draft(), price()).await.unwrap();
        assert_eq!(orchestrator.phase(), AttemptPhase::Polling);

        let second = orchestrator.submit(&session(), &draft(), price()).await;
        assert!(matches!(second, Err(BookingError::AttemptInProgress)));
        assert_eq!(payments.submissions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_poll_requires_matching_attempt() {
        let mut orchestrator = BookingOrchestrator::new(
            Box::new(FakePayments::default()),
            Box::new(InstantSleeper::default()),
        );
        let (_handle, mut signal) = cancellation();

        let result = orchestrator.poll_until_terminal("pay_9", &mut signal).await;
        assert!(matches!(result, Err(BookingError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_tick() {
        let payments = FakePayments::default();
        let mut orchestrator = BookingOrchestrator::new(
            Box::new(payments.clone()),
            Box::new(InstantSleeper::default()),
        );
        let (handle, mut signal) = cancellation();

        let attempt = orchestrator.submit(&session(), &draft(), price()).await.unwrap();
        handle.cancel();
        let outcome = orchestrator
            .poll_until_terminal(&attempt.payment_id, &mut signal)
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert!(signal.is_cancelled());
        assert_eq!(payments.polls.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.phase(), AttemptPhase::Idle);
    }

    #[tokio::test]
    async fn test_dropped_submission_does_not_block_next_attempt() {
        let payments = FakePayments::with_statuses(&[PaymentStatus::Completed]);
        payments.stall_next_submission.store(true, Ordering::SeqCst);
        let mut orchestrator = BookingOrchestrator::new(
            Box::new(payments.clone()),
            Box::new(InstantSleeper::default()),
        );

        let stalled = tokio::time::timeout(
            Duration::from_millis(20),
            orchestrator.submit(&session(), &draft(), price()),
        )
        .await;
        assert!(stalled.is_err());
        assert_eq!(orchestrator.phase(), AttemptPhase::Idle);
        assert!(orchestrator.attempt().is_none());

        let (_handle, mut signal) = cancellation();
        let outcome = orchestrator
            .book(&session(), &draft(), price(), &mut signal)
            .await
            .unwrap();

        assert_eq!(outcome.map(|o| o.phase()), Some(AttemptPhase::Succeeded));
        assert_eq!(payments.submissions.lock().unwrap().len(), 2);
    }
}
