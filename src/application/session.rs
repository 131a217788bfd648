use crate::domain::ports::{AuthServiceBox, SessionStoreRef};
use crate::domain::session::{
    AuthGrant, Credentials, ProfileUpdate, Registration, Session, TOKEN_KEY, USER_KEY,
    UserProfile,
};
use crate::error::{BookingError, Result};
use tracing::{info, warn};

/// Signs users in and out and keeps the durable session slot in sync.
pub struct SessionManager {
    auth: AuthServiceBox,
    store: SessionStoreRef,
}

impl SessionManager {
    pub fn new(auth: AuthServiceBox, store: SessionStoreRef) -> Self {
        Self { auth, store }
    }

    /// Rebuilds the session from the slot. A corrupt cached user is dropped
    /// rather than failing the whole client.
    pub async fn restore(&self) -> Result<Session> {
        let token = self.store.get(TOKEN_KEY).await?;
        let user = match self.store.get(USER_KEY).await? {
            Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable cached user");
                    self.store.remove(USER_KEY).await?;
                    None
                }
            },
            None => None,
        };

        Ok(Session {
            token,
            user,
            balance: None,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(BookingError::ValidationError(
                "Email and password are required".to_string(),
            ));
        }

        let grant = self
            .auth
            .login(&Credentials {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;

        let Some(session) = self.persist(grant).await? else {
            return Err(BookingError::ServiceError {
                status: 200,
                message: "Login response did not include a token".to_string(),
            });
        };
        info!(user_id = session.user_id(), "logged in");
        Ok(session)
    }

    /// Registers a new account. When the service signs the user in straight
    /// away the returned session is authenticated; otherwise it is anonymous
    /// and the caller should log in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
        phone: Option<String>,
    ) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(BookingError::ValidationError(
                "Email and password are required".to_string(),
            ));
        }

        let grant = self
            .auth
            .register(&Registration {
                email: email.trim().to_string(),
                password: password.to_string(),
                name: name.filter(|n| !n.trim().is_empty()),
                phone: phone.filter(|p| !p.trim().is_empty()),
            })
            .await?;

        let user_id = grant.user.id.clone();
        let session = self.persist(grant).await?.unwrap_or_default();
        info!(user_id, signed_in = session.is_authenticated(), "registered");
        Ok(session)
    }

    pub async fn logout(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY).await?;
        self.store.remove(USER_KEY).await?;
        info!("logged out");
        Ok(())
    }

    /// Fetches the current profile and merges it into the session and slot.
    pub async fn refresh_profile(&self, session: &mut Session) -> Result<UserProfile> {
        if !session.is_authenticated() {
            return Err(BookingError::Unauthenticated);
        }

        let fresh = self.auth.profile().await?;
        let profile = match session.user.take() {
            Some(mut current) => {
                current.merge(fresh);
                current
            }
            None => fresh,
        };

        self.store
            .put(USER_KEY, &serde_json::to_string(&profile)?)
            .await?;
        session.user = Some(profile.clone());
        Ok(profile)
    }

    /// Sends the edited name and phone, then applies them to the cached user.
    /// Blank values are dropped; an edit with nothing left is rejected.
    pub async fn update_profile(
        &self,
        session: &mut Session,
        name: Option<String>,
        phone: Option<String>,
    ) -> Result<UserProfile> {
        let update = ProfileUpdate {
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            phone: phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        };
        if update.is_empty() {
            return Err(BookingError::ValidationError(
                "Nothing to update: give a name or phone".to_string(),
            ));
        }
        let Some(profile) = session.user.as_mut() else {
            return Err(BookingError::Unauthenticated);
        };

        self.auth.update_profile(&update).await?;
        profile.apply(&update);

        self.store
            .put(USER_KEY, &serde_json::to_string(&*profile)?)
            .await?;
        info!(user_id = %profile.id, "profile updated");
        Ok(profile.clone())
    }

    async fn persist(&self, grant: AuthGrant) -> Result<Option<Session>> {
        let Some(token) = grant.token else {
            return Ok(None);
        };
        self.store.put(TOKEN_KEY, &token).await?;
        self.store
            .put(USER_KEY, &serde_json::to_string(&grant.user)?)
            .await?;
        Ok(Some(Session::authenticated(token, grant.user)))
    }
}
