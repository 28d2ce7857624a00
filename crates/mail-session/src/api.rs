//! The upstream mail API as seen by the session.

use async_trait::async_trait;

use crate::error::SessionError;
use crate::types::{Account, AccountRequest, Domain, MessageDetail, MessageSummary, TokenResponse};

/// Operations the session needs from the mail provisioning service.
///
/// [`RelayClient`](crate::RelayClient) talks to the relay over HTTP; tests
/// substitute in-memory implementations. This trait is object-safe.
#[async_trait]
pub trait MailApi: Send + Sync {
    /// List the domains new mailboxes can be created under.
    async fn domains(&self) -> Result<Vec<Domain>, SessionError>;

    /// Create a mailbox account.
    async fn create_account(&self, request: &AccountRequest) -> Result<Account, SessionError>;

    /// Exchange address and password for a bearer token.
    async fn token(&self, request: &AccountRequest) -> Result<TokenResponse, SessionError>;

    /// List messages in the mailbox owning `token`.
    async fn messages(&self, token: &str) -> Result<Vec<MessageSummary>, SessionError>;

    /// Fetch one message in full.
    async fn message(&self, token: &str, id: &str) -> Result<MessageDetail, SessionError>;

    /// Delete one message.
    async fn delete_message(&self, token: &str, id: &str) -> Result<(), SessionError>;
}
