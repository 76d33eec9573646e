use serde::{Deserialize, Serialize};

/// Authenticated participant identity supplied by the app's auth layer.
///
/// Presence channels are keyed by `user_id`; without an identity no
/// presence channel is established.
#[derive(Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
    /// Optional auth JWT for authenticated connections.
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("display_name", &self.display_name)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Identity {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            access_token: None,
        }
    }

    /// Create an identity from an auth session.
    pub fn from_auth_session(
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            access_token: Some(access_token.into()),
        }
    }
}
