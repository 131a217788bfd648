use super::ApiClient;
use crate::domain::booking::PayForTicketRequest;
use crate::domain::payment::{PaymentReceipt, PaymentReport};
use crate::domain::ports::PaymentService;
use crate::error::Result;
use async_trait::async_trait;

pub struct HttpPaymentService {
    client: ApiClient,
}

impl HttpPaymentService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PaymentService for HttpPaymentService {
    async fn pay_for_ticket(&self, request: &PayForTicketRequest) -> Result<PaymentReceipt> {
        self.client.post("/payments/pay-for-ticket", request).await
    }

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentReport> {
        self.client
            .get(&format!("/payments/{payment_id}"), &[])
            .await
    }
}
