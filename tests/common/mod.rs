#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use transit_booking::application::orchestrator::CancelHandle;
use transit_booking::domain::booking::{BookingDraft, PayForTicketRequest};
use transit_booking::domain::money::Amount;
use transit_booking::domain::payment::{PaymentReceipt, PaymentReport, PaymentStatus};
use transit_booking::domain::ports::{PaymentService, Sleeper};
use transit_booking::domain::session::{Session, UserProfile};
use transit_booking::error::{BookingError, Result};

/// One scripted answer of the payment status endpoint.
#[derive(Debug, Clone)]
pub enum Tick {
    Status(PaymentStatus),
    Error(String),
    /// The status request never answers.
    Hang,
}

/// Payment service answering status checks from a script.
///
/// Once the script runs out every check answers PENDING.
#[derive(Clone, Default)]
pub struct ScriptedPaymentService {
    script: Arc<Mutex<VecDeque<Tick>>>,
    submissions: Arc<Mutex<Vec<PayForTicketRequest>>>,
    polls: Arc<AtomicU32>,
    stall_submission: bool,
}

impl ScriptedPaymentService {
    pub fn new(script: impl IntoIterator<Item = Tick>) -> Self {
        let service = Self::default();
        service.script.lock().unwrap().extend(script);
        service
    }

    /// `pending` PENDING answers followed by `status`.
    pub fn settling_after(pending: usize, status: PaymentStatus) -> Self {
        Self::new(
            std::iter::repeat_n(Tick::Status(PaymentStatus::Pending), pending)
                .chain(std::iter::once(Tick::Status(status))),
        )
    }

    /// The pay-for-ticket call is recorded but never answers.
    pub fn stalling_submission() -> Self {
        Self {
            stall_submission: true,
            ..Self::default()
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<PayForTicketRequest> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentService for ScriptedPaymentService {
    async fn pay_for_ticket(&self, request: &PayForTicketRequest) -> Result<PaymentReceipt> {
        self.submissions.lock().unwrap().push(request.clone());
        if self.stall_submission {
            std::future::pending::<()>().await;
        }
        Ok(PaymentReceipt {
            id: "pay_1".to_string(),
        })
    }

    async fn get_payment(&self, _payment_id: &str) -> Result<PaymentReport> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let tick = self.script.lock().unwrap().pop_front();
        match tick {
            Some(Tick::Status(status)) => Ok(PaymentReport { status }),
            Some(Tick::Hang) => std::future::pending().await,
            Some(Tick::Error(message)) => Err(BookingError::ServiceError {
                status: 503,
                message,
            }),
            None => Ok(PaymentReport {
                status: PaymentStatus::Pending,
            }),
        }
    }
}

/// Virtual clock: records every requested sleep and returns at once.
///
/// With `cancel_on` set, the sleeper fires the cancel handle during that
/// sleep (1-based).
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
    cancel_on: Option<(u32, CancelHandle)>,
}

impl RecordingSleeper {
    pub fn cancelling_on(sleep: u32, handle: CancelHandle) -> Self {
        Self {
            cancel_on: Some((sleep, handle)),
            ..Self::default()
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }

    pub fn virtual_elapsed(&self) -> Duration {
        self.slept.lock().unwrap().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut slept = self.slept.lock().unwrap();
            slept.push(duration);
            slept.len() as u32
        };
        if let Some((on, handle)) = &self.cancel_on {
            if *on == count {
                handle.cancel();
            }
        }
    }
}

pub fn jane() -> UserProfile {
    UserProfile {
        id: "u1".to_string(),
        email: "jane@x.com".to_string(),
        role: Some("USER".to_string()),
        name: Some("Jane Doe".to_string()),
        phone: None,
    }
}

pub fn jane_session() -> Session {
    Session::authenticated("jwt-1".to_string(), jane())
}

pub fn jane_draft() -> BookingDraft {
    BookingDraft::new("R1")
        .with_schedule("S1")
        .with_passenger("Jane Doe", "jane@x.com")
}

pub fn fare() -> Amount {
    Amount::new(dec!(25.00)).unwrap()
}
