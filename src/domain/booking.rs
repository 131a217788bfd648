use super::money::{Amount, Currency};
use super::route::Route;
use super::session::UserProfile;
use crate::error::BookingError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Fare charged when the route catalog carries no price.
pub const DEFAULT_TICKET_PRICE: Decimal = dec!(25.00);

/// User-entered booking details, prior to payment submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingDraft {
    pub route_id: String,
    pub schedule_id: Option<String>,
    pub seat_number: Option<String>,
    pub passenger_name: String,
    pub passenger_email: String,
    pub passenger_phone: Option<String>,
}

impl BookingDraft {
    pub fn new(route_id: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            ..Self::default()
        }
    }

    /// Starts a draft for `route`, preselecting its first schedule and
    /// prefilling the passenger from the signed-in user.
    pub fn for_route(route: &Route, user: Option<&UserProfile>) -> Self {
        let mut draft = Self::new(route.id.clone());
        draft.schedule_id = route.default_schedule().map(|s| s.id.clone());
        if let Some(user) = user {
            draft.passenger_name = user.name.clone().unwrap_or_default();
            draft.passenger_email = user.email.clone();
            draft.passenger_phone = user.phone.clone();
        }
        draft
    }

    pub fn with_schedule(mut self, schedule_id: impl Into<String>) -> Self {
        self.schedule_id = Some(schedule_id.into());
        self
    }

    pub fn with_passenger(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.passenger_name = name.into();
        self.passenger_email = email.into();
        self
    }

    pub fn with_seat(mut self, seat: impl Into<String>) -> Self {
        self.seat_number = Some(seat.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.passenger_phone = Some(phone.into());
        self
    }

    /// Checks the draft can be submitted. Runs before any network call.
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.route_id.trim().is_empty() {
            return Err(BookingError::ValidationError(
                "Please select a route".to_string(),
            ));
        }
        if non_blank(&self.schedule_id).is_none() {
            return Err(BookingError::ValidationError(
                "Please select a schedule".to_string(),
            ));
        }
        if self.passenger_name.trim().is_empty() || self.passenger_email.trim().is_empty() {
            return Err(BookingError::ValidationError(
                "Passenger name and email are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// The pay-for-ticket command as sent to the payment service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayForTicketRequest {
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub route_id: String,
    pub schedule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_number: Option<String>,
    pub passenger_name: String,
    pub passenger_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passenger_phone: Option<String>,
    pub currency: Currency,
}

impl PayForTicketRequest {
    /// Builds the command from a validated draft. Blank optional fields are
    /// dropped rather than sent as empty strings.
    pub fn from_draft(
        user_id: &str,
        draft: &BookingDraft,
        price: Amount,
    ) -> Result<Self, BookingError> {
        draft.validate()?;
        let schedule_id = non_blank(&draft.schedule_id).ok_or_else(|| {
            BookingError::ValidationError("Please select a schedule".to_string())
        })?;

        Ok(Self {
            user_id: user_id.to_string(),
            amount: price.value(),
            route_id: draft.route_id.trim().to_string(),
            schedule_id,
            seat_number: non_blank(&draft.seat_number),
            passenger_name: draft.passenger_name.trim().to_string(),
            passenger_email: draft.passenger_email.trim().to_string(),
            passenger_phone: non_blank(&draft.passenger_phone),
            currency: Currency::Usd,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
