//! Disposable mailbox session controller.
//!
//! This crate drives one disposable mailbox through the mail relay:
//!
//! - Creating a mailbox (domain lookup, account creation, token exchange)
//! - Persisting the resulting credential and restoring it on the next run
//! - Polling the inbox on a fixed interval
//! - Opening and deleting messages, with a local "seen" flag
//!
//! # Example
//!
//! ```no_run
//! use mail_session::{Session, SessionConfig};
//!
//! # async fn example() -> Result<(), mail_session::SessionError> {
//! let config = SessionConfig::from_env()?;
//! let session = Session::from_config(&config)?;
//!
//! // Restore the last mailbox or create a new one, then start polling
//! let credential = session.start().await?;
//! println!("Your address: {}", credential.address);
//!
//! for message in session.messages().await {
//!     println!("{}: {}", message.from.address, message.subject);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod generate;
pub mod session;
pub mod store;
pub mod types;

pub use api::MailApi;
pub use client::RelayClient;
pub use config::SessionConfig;
pub use error::SessionError;
pub use session::{Phase, Session, SessionSnapshot};
pub use store::CredentialStore;
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
