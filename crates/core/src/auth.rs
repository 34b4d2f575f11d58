use serde::{Deserialize, Serialize};

/// Identity asserted by the authentication layer after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    username: String,
    groups: Vec<String>,
}

impl AuthenticatedIdentity {
    /// Creates an identity from the authenticated username and the groups
    /// reported by the identity provider.
    #[must_use]
    pub fn new(username: impl Into<String>, groups: Vec<String>) -> Self {
        Self {
            username: username.into(),
            groups,
        }
    }

    /// Returns the authenticated username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the groups asserted by the identity provider.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        self.groups.as_slice()
    }
}
