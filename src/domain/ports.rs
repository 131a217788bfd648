use super::booking::PayForTicketRequest;
use super::money::Balance;
use super::payment::{PaymentReceipt, PaymentReport};
use super::route::Route;
use super::session::{AuthGrant, Credentials, ProfileUpdate, Registration, UserProfile};
use super::ticket::{Ticket, TicketQuery};
use super::wallet::{TopUpReceipt, TopUpRequest, WalletTransaction};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// The payment service: accepts pay-for-ticket commands and reports their
/// asynchronous status.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn pay_for_ticket(&self, request: &PayForTicketRequest) -> Result<PaymentReceipt>;
    async fn get_payment(&self, payment_id: &str) -> Result<PaymentReport>;
}

/// Read-only route and schedule data.
#[async_trait]
pub trait RouteCatalog: Send + Sync {
    async fn list_routes(&self) -> Result<Vec<Route>>;
    async fn get_route(&self, route_id: &str) -> Result<Option<Route>>;
}

#[async_trait]
pub trait TicketingService: Send + Sync {
    async fn my_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>>;
}

#[async_trait]
pub trait WalletService: Send + Sync {
    async fn balance(&self, user_id: &str) -> Result<Balance>;
    async fn top_up(&self, request: &TopUpRequest) -> Result<TopUpReceipt>;
    async fn transactions(&self, user_id: &str, limit: u32) -> Result<Vec<WalletTransaction>>;
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant>;
    async fn register(&self, registration: &Registration) -> Result<AuthGrant>;
    async fn profile(&self) -> Result<UserProfile>;
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<()>;
}

/// A durable client-side key-value slot (token, cached user).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Time source for the poll loop, injected so it can run on virtual time.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub type PaymentServiceBox = Box<dyn PaymentService>;
pub type RouteCatalogBox = Box<dyn RouteCatalog>;
pub type TicketingServiceBox = Box<dyn TicketingService>;
pub type WalletServiceBox = Box<dyn WalletService>;
pub type AuthServiceBox = Box<dyn AuthService>;
pub type SleeperBox = Box<dyn Sleeper>;
/// The session slot is shared by every HTTP adapter and the session manager.
pub type SessionStoreRef = Arc<dyn SessionStore>;
