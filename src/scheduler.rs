//! Refresh scheduling
//!
//! A single per-minute tick decides whether to refresh: once at the market
//! close, and otherwise every `refresh_interval` while the market is open.
//! Folding both triggers into one decision means the close minute can never
//! start two refreshes. A close refresh that finds another cycle still
//! running is held back and retried on each following tick until it runs.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::jobs::{CycleOutcome, MarketCapRefresher};
use crate::market_hours::{is_market_close_minute, is_market_open};

/// Every minute, at second zero
const TICK_SCHEDULE: &str = "0 * * * * *";

/// Tolerance for cron jitter when comparing elapsed time to the interval
const TICK_SLACK_SECS: i64 = 30;

/// What a scheduler tick should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    Idle,
    /// The market is open and the refresh interval has elapsed
    IntervalRefresh,
    /// The regular session just closed
    CloseRefresh,
}

/// Decide what to do at `now`, given when the scheduler last triggered a refresh
pub fn decide(now: DateTime<Utc>, last_trigger: DateTime<Utc>, interval: Duration) -> ScheduleDecision {
    if is_market_close_minute(now) {
        return ScheduleDecision::CloseRefresh;
    }

    let elapsed = now - last_trigger + Duration::seconds(TICK_SLACK_SECS);
    if is_market_open(now) && elapsed >= interval {
        ScheduleDecision::IntervalRefresh
    } else {
        ScheduleDecision::Idle
    }
}

/// Drives [`MarketCapRefresher`] from a per-minute cron tick
pub struct RefreshScheduler {
    refresher: Arc<MarketCapRefresher>,
    interval: Duration,
    state: Mutex<TickState>,
}

struct TickState {
    /// Last tick whose refresh actually ran
    last_trigger: DateTime<Utc>,
    /// A close refresh was skipped because a cycle was in flight
    close_pending: bool,
}

impl RefreshScheduler {
    /// Interval refreshes are counted from `started_at`
    pub fn new(refresher: Arc<MarketCapRefresher>, started_at: DateTime<Utc>) -> Self {
        let interval = Duration::from_std(refresher.config().refresh_interval())
            .unwrap_or_else(|_| Duration::minutes(20));

        Self {
            refresher,
            interval,
            state: Mutex::new(TickState {
                last_trigger: started_at,
                close_pending: false,
            }),
        }
    }

    /// Handle one tick at `now`, running a refresh cycle if one is due
    pub async fn tick(&self, now: DateTime<Utc>) -> ScheduleDecision {
        let (decision, previous_trigger) = {
            let mut state = self.state.lock();
            let mut decision = decide(now, state.last_trigger, self.interval);
            if state.close_pending {
                decision = ScheduleDecision::CloseRefresh;
            }

            let previous_trigger = state.last_trigger;
            if decision != ScheduleDecision::Idle {
                state.last_trigger = now;
                state.close_pending = false;
            }
            (decision, previous_trigger)
        };

        if decision == ScheduleDecision::Idle {
            tracing::trace!("Scheduler tick: nothing to do");
            return decision;
        }

        tracing::info!("Scheduler triggering market cap refresh ({:?})", decision);
        let outcome = self.refresher.run_refresh_cycle().await;

        if outcome == CycleOutcome::AlreadyRunning {
            let mut state = self.state.lock();
            if state.last_trigger == now {
                state.last_trigger = previous_trigger;
            }
            if decision == ScheduleDecision::CloseRefresh {
                state.close_pending = true;
                tracing::info!("Close refresh deferred until the running cycle finishes");
            }
        } else {
            tracing::debug!("Scheduled refresh finished: {:?}", outcome);
        }

        decision
    }

    /// Register the per-minute tick with `scheduler`
    pub async fn register(self: Arc<Self>, scheduler: &JobScheduler) -> Result<(), JobSchedulerError> {
        let this = Arc::clone(&self);

        let job = Job::new_async(TICK_SCHEDULE, move |_uuid, _lock| {
            let this = Arc::clone(&this);

            Box::pin(async move {
                this.tick(Utc::now()).await;
            })
        })?;

        scheduler.add(job).await?;

        tracing::info!(
            "Market cap refresh scheduled (every {} min while open, and at the close)",
            self.interval.num_minutes()
        );

        Ok(())
    }
}
