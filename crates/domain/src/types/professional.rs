//! Professional (calendar owner) types

use serde::{Deserialize, Serialize};

/// A clinic professional whose calendar can be linked to an external provider.
///
/// The stored refresh token is the only durable credential; access tokens are
/// derived on demand and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: String,
    /// Owning user account; authorization flows require the caller to match.
    pub user_id: String,
    pub display_name: String,
    /// IANA time zone name used when rendering calendar event payloads.
    pub time_zone: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_refresh_token: Option<String>,
}

impl Professional {
    /// Whether the professional has a linked calendar credential.
    #[must_use]
    pub fn calendar_connected(&self) -> bool {
        self.calendar_refresh_token.is_some()
    }
}
