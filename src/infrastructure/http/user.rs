use super::ApiClient;
use crate::domain::ports::AuthService;
use crate::domain::session::{AuthGrant, Credentials, ProfileUpdate, Registration, UserProfile};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub struct HttpAuthService {
    client: ApiClient,
}

impl HttpAuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant> {
        self.client.post("/auth/login", credentials).await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant> {
        self.client.post("/auth/register", registration).await
    }

    /// The profile comes either wrapped as `{ "profile": ... }` or bare.
    async fn profile(&self) -> Result<UserProfile> {
        let body: Value = self.client.get("/users/me", &[]).await?;
        let profile = if body.get("profile").is_some_and(Value::is_object) {
            body["profile"].clone()
        } else {
            body
        };
        Ok(serde_json::from_value(profile)?)
    }

    /// The response body is not used: the accepted fields are applied locally.
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        let _: Value = self.client.put("/users/me", update).await?;
        Ok(())
    }
}
