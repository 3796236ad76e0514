//! Exclusive access to a browser session.
//!
//! A [`SessionLock`] is the single owner of the browser handle. Runs
//! acquire a [`SessionGuard`] for their whole browser interaction, so two
//! runs never drive the same browser at once. The lock is an ordinary value
//! passed to whoever needs it; there is no global state.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::errors::ScrapeResult;
use crate::ports::SessionConnector;

/// How browser sessions are shared between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrowserPolicy {
    /// One browser, connected on first use and reused by every run.
    #[default]
    Shared,
    /// A fresh browser per lease, quit when the lease is released.
    PerRun,
}

impl FromStr for BrowserPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "per-run" | "per_run" => Ok(Self::PerRun),
            other => Err(format!("unknown browser policy: {other}")),
        }
    }
}

impl fmt::Display for BrowserPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shared => "shared",
            Self::PerRun => "per-run",
        })
    }
}

/// Lazily connected, exclusively leased browser session.
pub struct SessionLock<C: SessionConnector> {
    connector: Arc<C>,
    slot: Arc<Mutex<Option<C::Session>>>,
    policy: BrowserPolicy,
}

impl<C: SessionConnector> Clone for SessionLock<C> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            slot: Arc::clone(&self.slot),
            policy: self.policy,
        }
    }
}

impl<C: SessionConnector> SessionLock<C> {
    pub fn new(connector: C, policy: BrowserPolicy) -> Self {
        Self {
            connector: Arc::new(connector),
            slot: Arc::new(Mutex::new(None)),
            policy,
        }
    }

    pub const fn policy(&self) -> BrowserPolicy {
        self.policy
    }

    /// Wait for exclusive access, connecting first if no session exists.
    pub async fn acquire(&self) -> ScrapeResult<SessionGuard<C>> {
        let mut slot = Arc::clone(&self.slot).lock_owned().await;
        if slot.is_none() {
            tracing::debug!(target: "lyubitori.browser", policy = %self.policy, "Connecting browser session");
            *slot = Some(self.connector.connect().await?);
        }
        Ok(SessionGuard {
            slot,
            connector: Arc::clone(&self.connector),
            policy: self.policy,
        })
    }

    /// Lease the session only if one is connected and no run holds it.
    ///
    /// Never connects and never waits.
    pub fn try_acquire_idle(&self) -> Option<SessionGuard<C>> {
        let slot = Arc::clone(&self.slot).try_lock_owned().ok()?;
        slot.is_some().then(|| SessionGuard {
            slot,
            connector: Arc::clone(&self.connector),
            policy: self.policy,
        })
    }

    /// Whether a session is currently connected. Waits for any active lease.
    pub async fn is_connected(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Quit the held session, if any.
    pub async fn shutdown(&self) {
        let session = self.slot.lock().await.take();
        if let Some(session) = session {
            self.connector.disconnect(session).await;
        }
    }
}

/// Exclusive lease on a connected session.
///
/// Dropping the guard returns the session to the lock without quitting it.
/// Call [`SessionGuard::release`] to apply the per-run policy.
pub struct SessionGuard<C: SessionConnector> {
    slot: OwnedMutexGuard<Option<C::Session>>,
    connector: Arc<C>,
    policy: BrowserPolicy,
}

impl<C: SessionConnector> SessionGuard<C> {
    /// End the lease. Under [`BrowserPolicy::PerRun`] the session is quit.
    pub async fn release(mut self) {
        if self.policy == BrowserPolicy::PerRun {
            if let Some(session) = self.slot.take() {
                self.connector.disconnect(session).await;
            }
        }
    }

    /// End the lease and quit the session regardless of policy.
    ///
    /// Used when the session is known to be broken.
    pub async fn discard(mut self) {
        if let Some(session) = self.slot.take() {
            self.connector.disconnect(session).await;
        }
    }
}

impl<C: SessionConnector> Deref for SessionGuard<C> {
    type Target = C::Session;

    fn deref(&self) -> &Self::Target {
        self.slot
            .as_ref()
            .expect("session slot is filled for the lifetime of a guard")
    }
}
