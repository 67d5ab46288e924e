//! Periodic refresh of the [`MetricsCache`].
//!
//! One refresh runs at a time. A tick that fires while a refresh is still in
//! flight is dropped, not queued. Every attempt ends with a complete entry in
//! the cache: live data on success, the previous entry marked cached on
//! failure, or the fallback dataset if nothing live was ever seen.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use batchwatch_sources::{FetchError, RawRow, SourceClient, SourceRef};
use batchwatch_types::SourceKind;
use chrono::Utc;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::{CachedEntry, MetricsCache};
use crate::data::{MappedRow, Pipeline};

/// Why a row was not accepted even though the fetch succeeded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Mismatch {
    #[error("row has {actual} cells but the schema expects {expected}")]
    RowWidth { expected: usize, actual: usize },

    #[error("{defaulted} of {total} fields fell back to defaults")]
    TooManyDefaults { defaulted: usize, total: usize },
}

/// A refresh attempt that did not produce live data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(#[from] Mismatch),
}

impl RefreshError {
    pub fn is_auth(&self) -> bool {
        matches!(self, RefreshError::Fetch(err) if err.is_auth())
    }
}

/// Why a refresh did not run at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another refresh is still running.
    InFlight,
    /// Credentials were rejected; waiting for [`Refresher::reconfigure`].
    AuthSuspended,
}

/// Result of one call to [`Refresher::refresh_now`].
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A live snapshot was committed.
    Live,
    /// The attempt failed; the cache now serves cached or fallback data.
    Stale(RefreshError),
    Skipped(SkipReason),
}

/// Timing and acceptance limits for refreshes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshPolicy {
    pub interval: Duration,
    pub fetch_timeout: Duration,
    /// Rows with a larger share of defaulted fields are rejected.
    pub max_defaulted_ratio: f64,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            fetch_timeout: Duration::from_secs(10),
            max_defaulted_ratio: 0.5,
        }
    }
}

/// Clears the in-flight flag when a refresh ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The installed client and how many times it has been replaced.
#[derive(Debug)]
struct ClientSlot {
    client: Arc<dyn SourceClient>,
    generation: u64,
}

/// Drives fetch, map and classify into a [`MetricsCache`].
///
/// The refresher is the only writer of its cache.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use batchwatch::cache::{RefreshPolicy, Refresher};
/// use batchwatch::data::Pipeline;
/// use batchwatch_sources::{ChannelSource, SourceRef};
/// use batchwatch_types::SourceKind;
///
/// # tokio_test::block_on(async {
/// let (_tx, client) = ChannelSource::create("example");
/// let source = SourceRef::new("sheet", None, "H2:AD2".parse().unwrap());
/// let refresher = Refresher::new(
///     Arc::new(client),
///     source,
///     Pipeline::master_sheet().unwrap(),
///     RefreshPolicy::default(),
/// );
///
/// // Nothing fetched yet: readers get the fallback dataset
/// assert_eq!(refresher.cache().get().source_kind, SourceKind::Fallback);
/// # });
/// ```
#[derive(Debug)]
pub struct Refresher {
    cache: Arc<MetricsCache>,
    client: Mutex<ClientSlot>,
    source: SourceRef,
    pipeline: Pipeline,
    policy: RefreshPolicy,
    in_flight: AtomicBool,
    auth_suspended: AtomicBool,
}

impl Refresher {
    /// Create a refresher whose cache starts with the fallback dataset.
    pub fn new(
        client: Arc<dyn SourceClient>,
        source: SourceRef,
        pipeline: Pipeline,
        policy: RefreshPolicy,
    ) -> Self {
        let snapshot = pipeline.fallback();
        let (kpis, zones) = pipeline.evaluate(&snapshot, None);
        let seed = CachedEntry {
            snapshot,
            kpis,
            zones,
            source_kind: SourceKind::Fallback,
            fetched_at: Utc::now(),
            last_error: None,
            defaulted: Vec::new(),
        };

        Self {
            cache: Arc::new(MetricsCache::new(seed)),
            client: Mutex::new(ClientSlot {
                client,
                generation: 0,
            }),
            source,
            pipeline,
            policy,
            in_flight: AtomicBool::new(false),
            auth_suspended: AtomicBool::new(false),
        }
    }

    /// The cache this refresher writes to.
    pub fn cache(&self) -> Arc<MetricsCache> {
        self.cache.clone()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Whether fetching is paused after an authentication failure.
    pub fn is_suspended(&self) -> bool {
        self.auth_suspended.load(Ordering::Acquire)
    }

    /// Install a new client and resume fetching.
    ///
    /// A refresh still running on the replaced client cannot suspend the new
    /// one, even if its credentials are rejected.
    pub fn reconfigure(&self, client: Arc<dyn SourceClient>) {
        info!(client = client.description(), "Source client reconfigured");
        let mut slot = self.client.lock();
        slot.client = client;
        slot.generation += 1;
        self.auth_suspended.store(false, Ordering::Release);
    }

    /// Suspend fetching if the client of `generation` is still installed.
    fn suspend(&self, generation: u64) -> bool {
        let slot = self.client.lock();
        if slot.generation != generation {
            return false;
        }
        self.auth_suspended.store(true, Ordering::Release);
        true
    }

    /// Run one refresh cycle now, unless one is already running.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        if self.is_suspended() {
            debug!("Skipping refresh: credentials were rejected");
            return RefreshOutcome::Skipped(SkipReason::AuthSuspended);
        }
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!("Skipping refresh: previous refresh still running");
            return RefreshOutcome::Skipped(SkipReason::InFlight);
        };

        let (client, generation) = {
            let slot = self.client.lock();
            (slot.client.clone(), slot.generation)
        };

        match self.attempt(client.as_ref()).await {
            Ok(mapped) => {
                self.commit(mapped);
                RefreshOutcome::Live
            }
            Err(err) => {
                if err.is_auth() && self.suspend(generation) {
                    error!(
                        error = %err,
                        "Source rejected credentials; fetching suspended until reconfigured"
                    );
                } else if err.is_auth() {
                    warn!(error = %err, "Replaced client rejected credentials; not suspending");
                } else {
                    warn!(error = %err, "Refresh failed; serving stale data");
                }
                self.cache.store(self.cache.get().degraded(err.to_string()));
                RefreshOutcome::Stale(err)
            }
        }
    }

    async fn attempt(&self, client: &dyn SourceClient) -> Result<MappedRow, RefreshError> {
        let row = self.fetch(client).await?;

        let schema = self.pipeline.schema();
        if row.len() != schema.width() {
            return Err(Mismatch::RowWidth {
                expected: schema.width(),
                actual: row.len(),
            }
            .into());
        }

        let mapped = self.pipeline.map(&row);
        if mapped.defaulted_ratio() > self.policy.max_defaulted_ratio {
            return Err(Mismatch::TooManyDefaults {
                defaulted: mapped.defaulted.len(),
                total: mapped.total,
            }
            .into());
        }
        if !mapped.defaulted.is_empty() {
            debug!(fields = ?mapped.defaulted, "Some cells fell back to defaults");
        }

        Ok(mapped)
    }

    async fn fetch(&self, client: &dyn SourceClient) -> Result<RawRow, FetchError> {
        let limit = self.policy.fetch_timeout;
        match tokio::time::timeout(limit, client.fetch(&self.source)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::timeout(limit)),
        }
    }

    fn commit(&self, mapped: MappedRow) {
        let previous = self.cache.get();
        let (kpis, zones) = self
            .pipeline
            .evaluate(&mapped.snapshot, previous.live_snapshot());

        info!(
            fields = mapped.total,
            defaulted = mapped.defaulted.len(),
            "Committed live snapshot"
        );

        self.cache.store(CachedEntry {
            snapshot: mapped.snapshot,
            kpis,
            zones,
            source_kind: SourceKind::Live,
            fetched_at: Utc::now(),
            last_error: None,
            defaulted: mapped.defaulted,
        });
    }

    /// Start refreshing on the policy interval, beginning immediately.
    ///
    /// Each tick runs its refresh on its own task so a slow fetch cannot
    /// delay the timer; overlapping ticks are skipped by [`refresh_now`].
    ///
    /// [`refresh_now`]: Refresher::refresh_now
    pub fn start(self: &Arc<Self>) -> RefreshHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let this = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.policy.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let this = this.clone();
                        tokio::spawn(async move {
                            this.refresh_now().await;
                        });
                    }
                    res = stop_rx.changed() => {
                        // A dropped handle closes the channel
                        if res.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Refresh loop stopped");
        });

        RefreshHandle { stop_tx }
    }
}

/// Handle for the background refresh loop.
///
/// Call `stop()` or drop the handle to end the loop.
pub struct RefreshHandle {
    stop_tx: watch::Sender<bool>,
}

impl RefreshHandle {
    /// Stop the refresh loop. A refresh already running is allowed to finish.
    pub fn stop(self) {
        let _ = self.stop_tx.send(true);
    }
}
