//! The [`Tracker`] service.
//!
//! Each submitted event runs one read-modify-write cycle against the store:
//! load the state and its revision, apply the event, save against that
//! revision. When the save conflicts the whole cycle is repeated on the fresh
//! state, so a concurrent update is never overwritten.

use tracing::{debug, info, instrument, warn};

use super::TrackerError;
use super::retry::{RetryConfig, RetryOutcome, retry_with_backoff};
use crate::config::{ConfigError, TrackerConfig};
use crate::events::{ReleaseEvent, parse_event};
use crate::persistence::{FileStore, StateStore};
use crate::state::{EventApplier, TrackerState};
use crate::status::{RepoSnapshot, TrackerSummary, build_snapshot, build_summary};

/// Applies release events to state held in a [`StateStore`].
#[derive(Debug)]
pub struct Tracker<S> {
    store: S,
    applier: EventApplier,
    retry: RetryConfig,
}

impl Tracker<FileStore> {
    /// A tracker over the configured state directory and graph.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, ConfigError> {
        Ok(Tracker::new(config.file_store()?)
            .with_applier(config.applier())
            .with_retry(config.retry_config()))
    }
}

impl<S: StateStore> Tracker<S> {
    pub fn new(store: S) -> Self {
        Tracker {
            store,
            applier: EventApplier::default(),
            retry: RetryConfig::DEFAULT,
        }
    }

    pub fn with_applier(mut self, applier: EventApplier) -> Self {
        self.applier = applier;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies one event and returns the resulting per-repo rows.
    ///
    /// An invalid event is rejected before the store is touched.
    #[instrument(skip_all, fields(event_type = event.kind(), repo = %event.repo()))]
    pub async fn submit(&self, event: &ReleaseEvent) -> Result<Vec<RepoSnapshot>, TrackerError> {
        let event = event.normalized().inspect_err(|e| {
            warn!(error = %e, "Rejected event");
        })?;

        let outcome = retry_with_backoff(self.retry, TrackerError::is_conflict, || {
            self.apply_once(&event)
        })
        .await;

        match outcome {
            RetryOutcome::Success(state) => Ok(build_snapshot(&state)),
            RetryOutcome::ExhaustedRetries { attempts, .. } => {
                warn!(attempts, "Giving up on event after repeated conflicts");
                Err(TrackerError::ConflictRetriesExhausted { attempts })
            }
            RetryOutcome::Failed(e) => Err(e),
        }
    }

    /// Parses a JSON payload and submits it.
    pub async fn submit_json(&self, payload: &[u8]) -> Result<Vec<RepoSnapshot>, TrackerError> {
        let event = parse_event(payload).inspect_err(|e| {
            warn!(error = %e, "Rejected event payload");
        })?;
        self.submit(&event).await
    }

    async fn apply_once(&self, event: &ReleaseEvent) -> Result<TrackerState, TrackerError> {
        let stored = self.store.load().await?;
        let next = self.applier.apply(&stored.state, event)?;
        let revision = self.store.save(&next, stored.revision).await?;
        debug!(revision, "Applied event");
        Ok(next)
    }

    pub async fn state(&self) -> Result<TrackerState, TrackerError> {
        Ok(self.store.load().await?.state)
    }

    pub async fn snapshot(&self) -> Result<Vec<RepoSnapshot>, TrackerError> {
        Ok(build_snapshot(&self.state().await?))
    }

    pub async fn summary(&self) -> Result<TrackerSummary, TrackerError> {
        Ok(build_summary(&self.state().await?))
    }

    /// Drops all tracked state.
    #[instrument(skip_all)]
    pub async fn reset(&self) -> Result<(), TrackerError> {
        self.store.reset().await?;
        info!("Tracker state reset");
        Ok(())
    }
}
