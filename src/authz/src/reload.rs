//! Reload notification and the background consumer that acts on it
//!
//! Writers call [`ReloadSignal::notify`] after changing authority or
//! role-authority data. Notifications go through a bounded channel with a
//! drop-if-full policy: `notify` never waits, and a notification that finds
//! the queue full is discarded because an already queued reload of the same
//! data will pick up the change. The [`ReloadWorker`] drains the channel,
//! coalesces queued notifications per target and runs one full load per
//! target.

use crate::cache::{AuthorityCache, RoleAuthorityIndex};
use crate::error::Result;
use crate::store::AuthorityStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Which cache a reload refreshes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReloadTarget {
    /// The authority list
    Authorities,
    /// The role -> authority index
    RoleAuthorities,
}

/// Receiving half of a reload channel
pub type ReloadReceiver = mpsc::Receiver<ReloadTarget>;

/// Non-blocking, fire-and-forget reload notifier
#[derive(Debug, Clone)]
pub struct ReloadSignal {
    sender: mpsc::Sender<ReloadTarget>,
}

impl ReloadSignal {
    /// Create a signal with room for `capacity` pending notifications
    pub fn channel(capacity: usize) -> (Self, ReloadReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Request a reload of `target`
    ///
    /// Returns whether the notification was queued. Never blocks.
    pub fn notify(&self, target: ReloadTarget) -> bool {
        match self.sender.try_send(target) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!(?target, "Reload queue full, notification dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(?target, "Reload consumer gone, notification dropped");
                false
            }
        }
    }
}

/// Background consumer of reload notifications
pub struct ReloadWorker {
    store: Arc<dyn AuthorityStore>,
    authorities: Arc<AuthorityCache>,
    role_index: Arc<RoleAuthorityIndex>,
}

impl ReloadWorker {
    pub fn new(
        store: Arc<dyn AuthorityStore>,
        authorities: Arc<AuthorityCache>,
        role_index: Arc<RoleAuthorityIndex>,
    ) -> Self {
        Self {
            store,
            authorities,
            role_index,
        }
    }

    /// Run one load per target
    ///
    /// Every target is attempted; the first failure is returned.
    pub async fn handle(&self, targets: &BTreeSet<ReloadTarget>) -> Result<()> {
        let mut first_error = None;

        for target in targets {
            let result = match target {
                ReloadTarget::Authorities => self.authorities.load(self.store.as_ref()).await,
                ReloadTarget::RoleAuthorities => self.role_index.load(self.store.as_ref()).await,
            };

            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Consume notifications until every [`ReloadSignal`] is dropped
    pub async fn run(self, mut receiver: ReloadReceiver) {
        info!("Reload worker started");

        while let Some(first) = receiver.recv().await {
            let mut targets = BTreeSet::from([first]);
            while let Ok(next) = receiver.try_recv() {
                targets.insert(next);
            }

            debug!(?targets, "Reloading");
            if let Err(e) = self.handle(&targets).await {
                error!(error = %e, "Reload failed, keeping previous cache contents");
            }
        }

        info!("Reload worker stopped");
    }

    /// Run the worker on the tokio runtime
    pub fn spawn(self, receiver: ReloadReceiver) -> JoinHandle<()> {
        tokio::spawn(self.run(receiver))
    }
}
