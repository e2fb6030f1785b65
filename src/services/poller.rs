use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Period between poll ticks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Hard bound on how long one `start` keeps polling.
pub const POLL_DEADLINE: Duration = Duration::from_secs(5 * 60);

/// Shortest period a timer accepts; tokio intervals reject zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// The single live recurring timer of a scheduler.
struct PollHandle {
    job_id: String,
    deadline: Instant,
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    fn shutdown(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

#[derive(Default)]
struct Slot {
    current: Option<PollHandle>,
    next_generation: u64,
}

/// Owns at most one recurring poll timer.
///
/// `start` tears the previous timer down under the same lock that installs
/// the new one, so two timers never coexist.
#[derive(Clone)]
pub struct PollScheduler {
    slot: Arc<Mutex<Slot>>,
    period: Duration,
    lifetime: Duration,
}

impl PollScheduler {
    pub fn new(period: Duration, lifetime: Duration) -> Self {
        if period < MIN_PERIOD {
            tracing::warn!(?period, min = ?MIN_PERIOD, "poll period too short, clamping");
        }
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            period: period.max(MIN_PERIOD),
            lifetime,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arm a timer calling `on_tick(job_id)` every period until stopped,
    /// superseded, or the deadline passes. Must be called inside a tokio runtime.
    pub fn start<F>(&self, job_id: &str, on_tick: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let mut slot = self.slot();
        if let Some(previous) = slot.current.take() {
            tracing::debug!(job_id = %previous.job_id, "replacing search poll");
            previous.shutdown();
        }

        let generation = slot.next_generation;
        slot.next_generation += 1;

        let start = Instant::now();
        let deadline = start + self.lifetime;
        let cancel = CancellationToken::new();
        let plan = TimerPlan {
            job_id: job_id.to_string(),
            generation,
            first_tick: start + self.period,
            period: self.period,
            deadline,
        };
        let task = tokio::spawn(run_timer(
            Arc::downgrade(&self.slot),
            plan,
            cancel.clone(),
            on_tick,
        ));

        slot.current = Some(PollHandle {
            job_id: job_id.to_string(),
            deadline,
            generation,
            cancel,
            task,
        });
        metrics::counter!("search_polls_started_total").increment(1);
        tracing::debug!(job_id, "search poll started");
    }

    /// Cancel the live timer, if any. Returns the job it was bound to.
    pub fn stop(&self) -> Option<String> {
        let handle = self.slot().current.take()?;
        let job_id = handle.job_id.clone();
        handle.shutdown();
        tracing::debug!(job_id = %job_id, "search poll stopped");
        Some(job_id)
    }

    /// Cancel the live timer only if it polls `job_id`.
    pub fn stop_if_bound_to(&self, job_id: &str) -> bool {
        let mut slot = self.slot();
        match slot.current.take() {
            Some(handle) if handle.job_id == job_id => {
                handle.shutdown();
                tracing::debug!(job_id, "search poll stopped");
                true
            }
            other => {
                slot.current = other;
                false
            }
        }
    }

    pub fn active_job(&self) -> Option<String> {
        self.slot().current.as_ref().map(|handle| handle.job_id.clone())
    }

    pub fn is_active(&self) -> bool {
        self.slot().current.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.slot().current.as_ref().map(|handle| handle.deadline)
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.shutdown();
        }
    }
}

struct TimerPlan {
    job_id: String,
    generation: u64,
    first_tick: Instant,
    period: Duration,
    deadline: Instant,
}

async fn run_timer<F>(slot: Weak<Mutex<Slot>>, plan: TimerPlan, cancel: CancellationToken, on_tick: F)
where
    F: Fn(String) + Send + Sync + 'static,
{
    let TimerPlan {
        job_id,
        generation,
        first_tick,
        period,
        deadline,
    } = plan;
    let mut ticker = time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = time::sleep_until(deadline) => break,
            _ = ticker.tick() => {
                tracing::trace!(job_id = %job_id, "search poll tick");
                on_tick(job_id.clone());
            }
        }
    }

    // Deadline reached: release the slot unless a newer timer already owns it.
    let Some(shared) = slot.upgrade() else {
        return;
    };
    let mut slot = shared.lock().unwrap_or_else(PoisonError::into_inner);
    if slot
        .current
        .as_ref()
        .is_some_and(|handle| handle.generation == generation)
    {
        slot.current = None;
        metrics::counter!("search_polls_expired_total").increment(1);
        tracing::info!(job_id = %job_id, "search poll deadline reached");
    }
}
