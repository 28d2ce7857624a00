//! Data exchanged with the upstream mail API and kept by the session.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

/// The active mailbox: upstream account id, address, and bearer token.
///
/// This is the record persisted between runs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub address: String,
    pub token: String,
}

impl Credential {
    pub fn new(id: impl Into<String>, address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// A mail domain offered by the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    #[serde(default)]
    pub id: String,
    pub domain: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Sender of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: String,
}

/// One entry in the inbox listing.
///
/// `seen` is tracked locally; upstream read state is never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub id: String,
    #[serde(default)]
    pub from: Address,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub seen: bool,
}

/// A full message, fetched on selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetail {
    #[serde(flatten)]
    pub summary: MessageSummary,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub html: Vec<String>,
}

impl MessageDetail {
    pub fn id(&self) -> &str {
        &self.summary.id
    }
}

/// Upstream list payload: either a bare array or a hydra collection.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Collection<T> {
    Hydra {
        #[serde(rename = "hydra:member")]
        member: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> Collection<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Collection::Hydra { member } => member,
            Collection::Bare(items) => items,
        }
    }
}

/// Body for account creation and token requests.
#[derive(Debug, Serialize)]
pub struct AccountRequest {
    pub address: String,
    #[serde(serialize_with = "expose_password")]
    pub password: SecretString,
}

impl AccountRequest {
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: SecretString::from(password.into()),
        }
    }
}

fn expose_password<S: Serializer>(password: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(password.expose_secret())
}

/// Reply to account creation.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub address: String,
}

/// Reply to a token request.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}
