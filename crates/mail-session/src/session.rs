//! Mailbox session controller.
//!
//! A [`Session`] owns the active credential and the in-memory inbox. It moves
//! through `Absent -> Creating -> Ready`, and back to `Creating` whenever a
//! new address is requested. Inbox refreshes run on a background task while
//! a credential is active.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::api::MailApi;
use crate::client::RelayClient;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::generate::{mailbox_address, random_password, random_username};
use crate::store::CredentialStore;
use crate::types::{AccountRequest, Credential, MessageDetail, MessageSummary};

/// Where the session is in its credential lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No mailbox yet.
    Absent,
    /// A new mailbox is being created. Any previous credential stays active.
    Creating,
    /// A credential is active.
    Ready,
}

/// Point-in-time copy of the session state, for rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub credential: Option<Credential>,
    pub messages: Vec<MessageSummary>,
    pub selected: Option<MessageDetail>,
    /// Message of the last failed credential acquisition.
    pub last_error: Option<String>,
    /// An inbox refresh is in flight.
    pub refreshing: bool,
}

struct SessionState {
    phase: Phase,
    credential: Option<Credential>,
    messages: Vec<MessageSummary>,
    /// Ids opened during this mailbox's lifetime. Overlaid onto every listing.
    seen: HashSet<String>,
    selected: Option<MessageDetail>,
    last_error: Option<String>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: Phase::Absent,
            credential: None,
            messages: Vec::new(),
            seen: HashSet::new(),
            selected: None,
            last_error: None,
        }
    }

    /// Make `credential` active with an empty inbox.
    fn activate(&mut self, credential: Credential) {
        self.phase = Phase::Ready;
        self.credential = Some(credential);
        self.messages.clear();
        self.seen.clear();
        self.selected = None;
        self.last_error = None;
    }

    fn is_active(&self, credential: &Credential) -> bool {
        self.credential.as_ref() == Some(credential)
    }

    fn apply_listing(&mut self, mut messages: Vec<MessageSummary>) {
        for message in &mut messages {
            message.seen = self.seen.contains(&message.id);
        }
        self.messages = messages;
    }

    fn mark_seen(&mut self, id: &str) {
        self.seen.insert(id.to_string());
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.seen = true;
        }
    }

    fn snapshot(&self, refreshing: bool) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            credential: self.credential.clone(),
            messages: self.messages.clone(),
            selected: self.selected.clone(),
            last_error: self.last_error.clone(),
            refreshing,
        }
    }
}

struct Inner<A> {
    api: A,
    store: CredentialStore,
    poll_interval: Duration,
    state: RwLock<SessionState>,
    poller: Mutex<Option<JoinHandle<()>>>,
    /// Inbox listings in flight.
    refreshing: AtomicUsize,
}

impl<A> Inner<A> {
    fn replace_poller(&self, handle: Option<JoinHandle<()>>) {
        let mut poller = self.poller.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = poller.take() {
            old.abort();
        }
        *poller = handle;
    }
}

/// Counts one in-flight refresh until dropped, including when the refresh
/// future is cancelled.
struct RefreshGuard<'a>(&'a AtomicUsize);

impl<'a> RefreshGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<A> Drop for Inner<A> {
    fn drop(&mut self) {
        self.replace_poller(None);
    }
}

/// Handle to a mailbox session. Clones share the same state.
///
/// Polling stops once the last handle is dropped.
pub struct Session<A: MailApi> {
    inner: Arc<Inner<A>>,
}

impl<A: MailApi> Clone for Session<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Session<RelayClient> {
    /// Create a session talking to the relay described by `config`.
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        let api = RelayClient::new(&config.relay_url)?;
        let store = CredentialStore::new(&config.storage_dir);
        Ok(Self::new(api, store, config.poll_interval))
    }
}

impl<A: MailApi + 'static> Session<A> {
    /// Create a session with no credential. Nothing runs until [`start`](Self::start).
    pub fn new(api: A, store: CredentialStore, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                store,
                poll_interval,
                state: RwLock::new(SessionState::new()),
                poller: Mutex::new(None),
                refreshing: AtomicUsize::new(0),
            }),
        }
    }

    /// The API this session talks to.
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    /// The credential store.
    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    /// Restore the persisted credential, or create a mailbox if there is none,
    /// then start polling.
    pub async fn start(&self) -> Result<Credential, SessionError> {
        let credential = match self.restore().await? {
            Some(credential) => credential,
            None => self.acquire().await?,
        };
        self.start_polling();
        Ok(credential)
    }

    /// Load the persisted credential and make it active.
    ///
    /// The token is not checked against upstream; an expired one shows up as
    /// failing refreshes.
    pub async fn restore(&self) -> Result<Option<Credential>, SessionError> {
        let Some(credential) = self.inner.store.load().await? else {
            debug!("No persisted mailbox");
            return Ok(None);
        };

        info!(address = %credential.address, "Restored mailbox");
        self.inner.state.write().await.activate(credential.clone());
        Ok(Some(credential))
    }

    /// Create a new mailbox and make it the active credential.
    ///
    /// Either every step succeeds and the new credential is persisted and
    /// active with an empty inbox, or nothing changes apart from
    /// `last_error`.
    pub async fn acquire(&self) -> Result<Credential, SessionError> {
        let previous_phase = {
            let mut state = self.inner.state.write().await;
            if state.phase == Phase::Creating {
                return Err(SessionError::AcquireInProgress);
            }
            let previous = state.phase;
            state.phase = Phase::Creating;
            state.last_error = None;
            previous
        };

        match self.create_mailbox().await {
            Ok(credential) => {
                info!(address = %credential.address, "Mailbox ready");
                self.inner.state.write().await.activate(credential.clone());
                Ok(credential)
            }
            Err(e) => {
                error!(error = %e, "Failed to create mailbox");
                let mut state = self.inner.state.write().await;
                state.phase = previous_phase;
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Replace the active mailbox with a new one and restart polling.
    ///
    /// On failure the previous mailbox stays active and keeps being polled.
    pub async fn new_address(&self) -> Result<Credential, SessionError> {
        let credential = self.acquire().await?;
        self.start_polling();
        Ok(credential)
    }

    /// Forget the active mailbox, locally and on disk, and stop polling.
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.stop_polling();
        self.inner.store.clear().await?;
        *self.inner.state.write().await = SessionState::new();
        info!("Mailbox cleared");
        Ok(())
    }

    async fn create_mailbox(&self) -> Result<Credential, SessionError> {
        let api = &self.inner.api;

        let domain = api
            .domains()
            .await?
            .into_iter()
            .next()
            .ok_or(SessionError::NoDomains)?;

        let address = mailbox_address(&random_username(), &domain.domain);
        let request = AccountRequest::new(address.clone(), random_password());

        let account = api.create_account(&request).await.map_err(|e| match e {
            SessionError::Upstream { message, .. } => SessionError::AccountCreation(message),
            other => SessionError::AccountCreation(other.to_string()),
        })?;
        debug!(id = %account.id, %address, "Account created");

        let token = api
            .token(&request)
            .await?
            .token
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::MissingToken)?;

        let credential = Credential::new(account.id, address, token);
        self.inner.store.save(&credential).await?;
        Ok(credential)
    }

    /// Fetch the inbox listing once and replace the in-memory list.
    ///
    /// A listing that arrives after its credential was replaced is dropped.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let credential = self.credential().await.ok_or(SessionError::NoCredential)?;

        let result = {
            let _guard = RefreshGuard::new(&self.inner.refreshing);
            self.inner.api.messages(&credential.token).await
        };

        let mut state = self.inner.state.write().await;
        if !state.is_active(&credential) {
            debug!(address = %credential.address, "Dropping listing for replaced mailbox");
            return Ok(());
        }

        let messages = result?;
        debug!(count = messages.len(), "Inbox refreshed");
        state.apply_listing(messages);
        Ok(())
    }

    /// Load a message in full, select it, and mark it seen.
    ///
    /// Failures are logged and leave the state untouched.
    pub async fn open_message(&self, id: &str) -> Option<MessageDetail> {
        let Some(credential) = self.credential().await else {
            warn!(id, "Cannot open message without a mailbox");
            return None;
        };

        let mut detail = match self.inner.api.message(&credential.token, id).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(id, error = %e, "Failed to load message");
                return None;
            }
        };

        let mut state = self.inner.state.write().await;
        if !state.is_active(&credential) {
            debug!(id, "Dropping message for replaced mailbox");
            return None;
        }

        state.mark_seen(id);
        detail.summary.seen = true;
        state.selected = Some(detail.clone());
        Some(detail)
    }

    /// Close the message detail view.
    pub async fn close_message(&self) {
        self.inner.state.write().await.selected = None;
    }

    /// Delete a message upstream, then drop it from the list and from the
    /// detail view if it is open.
    ///
    /// Returns whether the deletion went through. Failures are logged only.
    pub async fn delete_message(&self, id: &str) -> bool {
        let Some(credential) = self.credential().await else {
            warn!(id, "Cannot delete message without a mailbox");
            return false;
        };

        if let Err(e) = self.inner.api.delete_message(&credential.token, id).await {
            warn!(id, error = %e, "Failed to delete message");
            return false;
        }

        let mut state = self.inner.state.write().await;
        state.messages.retain(|m| m.id != id);
        if state.selected.as_ref().is_some_and(|d| d.id() == id) {
            state.selected = None;
        }
        debug!(id, "Message deleted");
        true
    }

    /// Start refreshing the inbox now and then every poll interval.
    ///
    /// Replaces any running poller. Failed refreshes are logged and the loop
    /// carries on; it ends when the credential is cleared or the session dropped.
    pub fn start_polling(&self) {
        let weak: Weak<Inner<A>> = Arc::downgrade(&self.inner);
        let interval = self.inner.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let session = Session { inner };

                match session.refresh().await {
                    Ok(()) => {}
                    Err(SessionError::NoCredential) => {
                        debug!("No mailbox, polling stopped");
                        break;
                    }
                    Err(e) => warn!(error = %e, "Inbox refresh failed"),
                }
            }
        });

        self.inner.replace_poller(Some(handle));
        debug!(interval_ms = interval.as_millis() as u64, "Polling started");
    }

    /// Stop the background poller, if running.
    pub fn stop_polling(&self) {
        self.inner.replace_poller(None);
    }

    /// Whether a poller is running.
    pub fn is_polling(&self) -> bool {
        let poller = self.inner.poller.lock().unwrap_or_else(|e| e.into_inner());
        poller.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// The active credential.
    pub async fn credential(&self) -> Option<Credential> {
        self.inner.state.read().await.credential.clone()
    }

    /// The current lifecycle phase.
    pub async fn phase(&self) -> Phase {
        self.inner.state.read().await.phase
    }

    /// The in-memory inbox listing.
    pub async fn messages(&self) -> Vec<MessageSummary> {
        self.inner.state.read().await.messages.clone()
    }

    /// The message open in the detail view.
    pub async fn selected(&self) -> Option<MessageDetail> {
        self.inner.state.read().await.selected.clone()
    }

    /// Copy of the whole session state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let refreshing = self.inner.refreshing.load(Ordering::SeqCst) > 0;
        self.inner.state.read().await.snapshot(refreshing)
    }
}
