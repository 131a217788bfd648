use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Reserved,
    Confirmed,
    Cancelled,
    Used,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TicketStatus::Reserved => "RESERVED",
            TicketStatus::Confirmed => "CONFIRMED",
            TicketStatus::Cancelled => "CANCELLED",
            TicketStatus::Used => "USED",
            TicketStatus::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// A ticket materialized by the ticketing service after a completed payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    #[serde(default)]
    pub route_name: Option<String>,
    pub status: TicketStatus,
    #[serde(default)]
    pub origin_stop: Option<String>,
    #[serde(default)]
    pub destination_stop: Option<String>,
    #[serde(default)]
    pub departure_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seat_number: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
}

/// Filters for the "my tickets" query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketQuery {
    pub status: Option<TicketStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Figures shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TicketSummary {
    pub total_tickets: usize,
    pub upcoming_trips: usize,
    pub total_spent: Decimal,
}

impl TicketSummary {
    pub fn from_tickets(tickets: &[Ticket], now: DateTime<Utc>) -> Self {
        Self {
            total_tickets: tickets.len(),
            upcoming_trips: tickets
                .iter()
                .filter(|t| t.departure_time.is_some_and(|d| d > now))
                .count(),
            total_spent: tickets.iter().filter_map(|t| t.price).sum(),
        }
    }
}
