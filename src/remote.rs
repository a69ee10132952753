//! Server confirmation for tree edits.
//!
//! Every mutation is validated locally, its nodes are marked pending, and it
//! is only applied once the [`Remote`] accepts it. A rejected mutation leaves
//! the tree untouched.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{GridError, Result};
use crate::tree::{GridState, Mutation, TreeChange};

/// Where mutations get confirmed before they are applied.
#[async_trait]
pub trait Remote: Send + Sync {
    async fn confirm(&self, mutation: &Mutation) -> Result<()>;
}

/// Accepts everything after a simulated round trip.
#[derive(Debug, Clone, Default)]
pub struct LocalRemote {
    latency: Duration,
}

impl LocalRemote {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl Remote for LocalRemote {
    async fn confirm(&self, mutation: &Mutation) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        debug!(%mutation, "confirmed");
        Ok(())
    }
}

/// Rejects every edit. Used for read-only listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyRemote;

#[async_trait]
impl Remote for ReadOnlyRemote {
    async fn confirm(&self, mutation: &Mutation) -> Result<()> {
        Err(GridError::Rejected(format!(
            "cannot {}: listing is read-only",
            mutation.verb()
        )))
    }
}

/// Build the remote selected by configuration.
pub fn from_config(read_only: bool, latency_ms: u64) -> Arc<dyn Remote> {
    if read_only {
        Arc::new(ReadOnlyRemote)
    } else {
        Arc::new(LocalRemote::new(Duration::from_millis(latency_ms)))
    }
}

/// Validate, mark pending, wait for the remote, then apply.
///
/// The pending mark is cleared whatever the outcome.
pub async fn confirm_and_apply(
    state: &mut GridState,
    remote: &dyn Remote,
    mutation: Mutation,
) -> Result<Option<TreeChange>> {
    state.validate(&mutation)?;
    state.mark_pending(&mutation)?;
    let confirmed = remote.confirm(&mutation).await;
    state.clear_pending(&mutation);
    match confirmed {
        Ok(()) => state.apply(mutation),
        Err(e) => {
            warn!(%mutation, error = %e, "mutation rejected");
            Err(e)
        }
    }
}
