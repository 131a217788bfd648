use super::{ApiClient, DataEnvelope};
use crate::domain::ports::TicketingService;
use crate::domain::ticket::{Ticket, TicketQuery};
use crate::error::Result;
use async_trait::async_trait;

pub struct HttpTicketingService {
    client: ApiClient,
}

impl HttpTicketingService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn query_params(query: &TicketQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(status) = query.status {
        params.push(("status", status.to_string()));
    }
    if let Some(page) = query.page {
        params.push(("page", page.to_string()));
    }
    if let Some(limit) = query.limit {
        params.push(("limit", limit.to_string()));
    }
    params
}

#[async_trait]
impl TicketingService for HttpTicketingService {
    async fn my_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
        let envelope: DataEnvelope<Vec<Ticket>> = self
            .client
            .get("/api/tickets/queries/my-tickets", &query_params(query))
            .await?;
        Ok(envelope.data.unwrap_or_default())
    }
}
