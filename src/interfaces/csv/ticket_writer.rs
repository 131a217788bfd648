use crate::application::dashboard::DashboardView;
use crate::domain::ticket::Ticket;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct TicketRow<'a> {
    id: &'a str,
    route: &'a str,
    status: String,
    origin: &'a str,
    destination: &'a str,
    departure: String,
    seat: &'a str,
    price: String,
}

impl<'a> From<&'a Ticket> for TicketRow<'a> {
    fn from(ticket: &'a Ticket) -> Self {
        Self {
            id: &ticket.id,
            route: ticket.route_name.as_deref().unwrap_or(""),
            status: ticket.status.to_string(),
            origin: ticket.origin_stop.as_deref().unwrap_or(""),
            destination: ticket.destination_stop.as_deref().unwrap_or(""),
            departure: ticket
                .departure_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            seat: ticket.seat_number.as_deref().unwrap_or(""),
            price: ticket
                .price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_default(),
        }
    }
}

/// Writes tickets and the dashboard summary as CSV.
///
/// The dashboard is two CSV blocks with different headers, so each block gets
/// its own `csv::Writer` over the shared sink.
pub struct TicketWriter<W: Write> {
    sink: W,
}

impl<W: Write> TicketWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn write_tickets(&mut self, tickets: &[Ticket]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(&mut self.sink);
        for ticket in tickets {
            writer.serialize(TicketRow::from(ticket))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// A `metric,value` block followed by a blank line and the recent tickets.
    pub fn write_dashboard(&mut self, view: &DashboardView) -> Result<()> {
        let metrics = [
            ("balance", format!("{:.2}", view.balance.0)),
            ("total_tickets", view.summary.total_tickets.to_string()),
            ("upcoming_trips", view.summary.upcoming_trips.to_string()),
            ("total_spent", format!("{:.2}", view.summary.total_spent)),
        ];

        let mut writer = csv::Writer::from_writer(&mut self.sink);
        writer.write_record(["metric", "value"])?;
        for (metric, value) in &metrics {
            writer.write_record([*metric, value.as_str()])?;
        }
        writer.flush()?;
        drop(writer);

        if view.recent_tickets.is_empty() {
            return Ok(());
        }

        writeln!(self.sink)?;
        self.write_tickets(&view.recent_tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Balance;
    use crate::domain::ticket::{TicketStatus, TicketSummary};
    use rust_decimal_macros::dec;

    fn ticket() -> Ticket {
        Ticket {
            id: "t1".to_string(),
            route_name: Some("Downtown Express".to_string()),
            status: TicketStatus::Confirmed,
            origin_stop: Some("Central".to_string()),
            destination_stop: None,
            departure_time: None,
            seat_number: Some("12A".to_string()),
            price: Some(dec!(25)),
        }
    }

    #[test]
    fn test_write_tickets() {
        let mut out = Vec::new();
        TicketWriter::new(&mut out).write_tickets(&[ticket()]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("id,route,status,origin,destination,departure,seat,price\n"));
        assert!(text.contains("t1,Downtown Express,CONFIRMED,Central,,,12A,25.00"));
    }

    #[test]
    fn test_write_dashboard() {
        let view = DashboardView {
            balance: Balance::new(dec!(40)),
            summary: TicketSummary {
                total_tickets: 1,
                upcoming_trips: 0,
                total_spent: dec!(25),
            },
            recent_tickets: vec![ticket()],
        };
        let mut out = Vec::new();
        TicketWriter::new(&mut out).write_dashboard(&view).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("balance,40.00\n"));
        assert!(text.contains("total_spent,25.00\n\nid,route"));
        assert!(text.ends_with("t1,Downtown Express,CONFIRMED,Central,,,12A,25.00\n"));
    }

    #[test]
    fn test_dashboard_without_tickets_has_no_trailing_block() {
        let view = DashboardView {
            balance: Balance::ZERO,
            summary: TicketSummary {
                total_tickets: 0,
                upcoming_trips: 0,
                total_spent: dec!(0),
            },
            recent_tickets: vec![],
        };
        let mut out = Vec::new();
        TicketWriter::new(&mut out).write_dashboard(&view).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "metric,value\nbalance,0.00\ntotal_tickets,0\nupcoming_trips,0\ntotal_spent,0.00\n"
        );
    }
}
