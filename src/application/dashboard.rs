use crate::domain::money::Balance;
use crate::domain::ports::{TicketingServiceBox, WalletServiceBox};
use crate::domain::session::Session;
use crate::domain::ticket::{Ticket, TicketQuery, TicketSummary};
use crate::error::{BookingError, Result};
use chrono::Utc;

/// Number of recent tickets shown on the dashboard.
pub const RECENT_TICKETS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub balance: Balance,
    pub summary: TicketSummary,
    pub recent_tickets: Vec<Ticket>,
}

/// Tickets and the overview combining them with the wallet.
pub struct TicketDesk {
    ticketing: TicketingServiceBox,
    wallet: WalletServiceBox,
}

impl TicketDesk {
    pub fn new(ticketing: TicketingServiceBox, wallet: WalletServiceBox) -> Self {
        Self { ticketing, wallet }
    }

    pub async fn my_tickets(&self, session: &Session, query: &TicketQuery) -> Result<Vec<Ticket>> {
        if !session.is_authenticated() {
            return Err(BookingError::Unauthenticated);
        }
        self.ticketing.my_tickets(query).await
    }

    /// Refreshes the cached balance and summarizes the most recent tickets.
    pub async fn dashboard(&self, session: &mut Session) -> Result<DashboardView> {
        let user_id = session.user_id().ok_or(BookingError::Unauthenticated)?;
        let balance = self.wallet.balance(user_id).await?;
        session.set_balance(balance);

        let recent_tickets = self
            .ticketing
            .my_tickets(&TicketQuery {
                limit: Some(RECENT_TICKETS),
                ..TicketQuery::default()
            })
            .await?;

        Ok(DashboardView {
            balance,
            summary: TicketSummary::from_tickets(&recent_tickets, Utc::now()),
            recent_tickets,
        })
    }
}
