use super::money::{Amount, Balance};
use serde::{Deserialize, Serialize};

/// Key of the durable slot holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Key of the durable slot holding the serialized [`UserProfile`].
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UserProfile {
    /// Applies an edit the user service has accepted.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = Some(name.clone());
        }
        if let Some(phone) = &update.phone {
            self.phone = Some(phone.clone());
        }
    }

    /// Overwrites the fields present in `update`, keeping the rest.
    pub fn merge(&mut self, update: UserProfile) {
        self.email = update.email;
        if update.role.is_some() {
            self.role = update.role;
        }
        if update.name.is_some() {
            self.name = update.name;
        }
        if update.phone.is_some() {
            self.phone = update.phone;
        }
    }
}

/// Login payload for the user service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration payload for the user service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Editable profile fields. Absent fields are left untouched by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none()
    }
}

/// What the user service hands back on login or registration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthGrant {
    pub user: UserProfile,
    #[serde(default)]
    pub token: Option<String>,
}

/// Result of comparing a price against the cached wallet balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Affordability {
    Sufficient,
    Insufficient { shortfall: Balance },
    /// No balance has been fetched yet.
    Unknown,
}

/// Client-side session context.
///
/// Holds who the user is, the token the services know them by and the last
/// wallet balance seen. Passed explicitly to the application services.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub balance: Option<Balance>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: String, user: UserProfile) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
            balance: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn set_balance(&mut self, balance: Balance) {
        self.balance = Some(balance);
    }

    /// Applies a local balance change, seeding the cache when it is empty.
    pub fn credit(&mut self, amount: Balance) {
        self.balance = Some(match self.balance {
            Some(current) => current + amount,
            None => amount,
        });
    }

    /// Advisory check only: the payment service does the authoritative one.
    pub fn affordability(&self, price: Amount) -> Affordability {
        match self.balance {
            None => Affordability::Unknown,
            Some(balance) if balance >= Balance::from(price) => Affordability::Sufficient,
            Some(balance) => Affordability::Insufficient {
                shortfall: Balance::from(price) - balance,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn jane() -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            email: "jane@x.com".to_string(),
            role: Some("USER".to_string()),
            name: Some("Jane Doe".to_string()),
            phone: None,
        }
    }

    #[test]
    fn test_anonymous_session() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert!(session.user_id().is_none());
    }

    #[test]
    fn test_affordability() {
        let price = Amount::new(dec!(25.00)).unwrap();
        let mut session = Session::authenticated("t".to_string(), jane());
        assert_eq!(session.affordability(price), Affordability::Unknown);

        session.set_balance(Balance::new(dec!(30)));
        assert_eq!(session.affordability(price), Affordability::Sufficient);

        session.set_balance(Balance::new(dec!(25)));
        assert_eq!(session.affordability(price), Affordability::Sufficient);

        session.set_balance(Balance::new(dec!(10)));
        assert_eq!(
            session.affordability(price),
            Affordability::Insufficient {
                shortfall: Balance::new(dec!(15))
            }
        );
    }

    #[test]
    fn test_credit_seeds_empty_cache() {
        let mut session = Session::anonymous();
        session.credit(Balance::new(dec!(5)));
        assert_eq!(session.balance, Some(Balance::new(dec!(5))));
        session.credit(Balance::new(dec!(2.5)));
        assert_eq!(session.balance, Some(Balance::new(dec!(7.5))));
    }

    #[test]
    fn test_profile_update_wire_shape() {
        let mut profile = jane();
        let update = ProfileUpdate {
            name: None,
            phone: Some("+1 555".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "phone": "+1 555" })
        );
        assert!(ProfileUpdate::default().is_empty());

        profile.apply(&update);
        assert_eq!(profile.name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.phone.as_deref(), Some("+1 555"));
    }

    #[test]
    fn test_profile_merge_keeps_missing_fields() {
        let mut profile = jane();
        profile.merge(UserProfile {
            id: "u1".to_string(),
            email: "jane@y.com".to_string(),
            role: None,
            name: None,
            phone: Some("+1 555".to_string()),
        });
        assert_eq!(profile.email, "jane@y.com");
        assert_eq!(profile.name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.phone.as_deref(), Some("+1 555"));
        assert_eq!(profile.role.as_deref(), Some("USER"));
    }
}
