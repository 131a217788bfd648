//! HTTP adapters for the backend services.
//!
//! Every adapter goes through [`ApiClient`], which attaches the bearer token
//! from the session slot to each request and maps error responses onto
//! `BookingError`.

pub mod graphql;
pub mod payment;
pub mod ticketing;
pub mod user;
pub mod wallet;

use crate::domain::ports::SessionStoreRef;
use crate::domain::session::TOKEN_KEY;
use crate::error::{BookingError, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// `{ "data": ... }` wrapper used by the wallet and ticketing services.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// The `reqwest` client every service adapter is built on.
pub fn http_client() -> Result<Client> {
    Ok(Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// JSON client bound to one service base URL.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    sessions: SessionStoreRef,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, sessions: SessionStoreRef) -> Result<Self> {
        Ok(Self::with_client(http_client()?, base_url, sessions))
    }

    /// Shares one connection pool between several service clients.
    pub fn with_client(http: Client, base_url: impl Into<String>, sessions: SessionStoreRef) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            sessions,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A missing token does not stop the request; the service answers 401.
    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match self.sessions.get(TOKEN_KEY).await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        debug!(base_url = %self.base_url, path, "GET");
        let request = self.authorize(self.http.get(self.url(path)).query(query)).await?;
        Self::decode(request.send().await?).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(base_url = %self.base_url, path, "POST");
        let request = self.authorize(self.http.post(self.url(path)).json(body)).await?;
        Self::decode(request.send().await?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(base_url = %self.base_url, path, "PUT");
        let request = self.authorize(self.http.put(self.url(path)).json(body)).await?;
        Self::decode(request.send().await?).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

        if status == StatusCode::UNAUTHORIZED {
            Err(BookingError::Unauthorized(message))
        } else {
            Err(BookingError::ServiceError {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Pulls a human-readable message out of an error body: `error` (string or
/// `{message}`), then `message`, then the first GraphQL error, then the raw
/// text.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };

    let from_error = match value.get("error") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(Value::Object(error)) => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };

    from_error
        .or_else(|| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| {
            value
                .get("errors")
                .and_then(|errors| errors.get(0))
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
}
