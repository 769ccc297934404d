use chrono::{DateTime, Timelike, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval_at, sleep, Duration, Instant};
use tracing::{error, info};

use crate::cycle::Cycle;
use crate::domain::HOUR_MS;

/// Outcome counters for the refresh loop.
#[derive(Debug, Clone, Default)]
pub struct CycleStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub run_count: u64,
    pub success_count: u64,
    pub error_count: u64,
}

/// Owns cycle timing: one immediate run at startup, a steady interval,
/// and a one-time re-alignment to the next wall-clock hour boundary that
/// resets the interval's phase. A failed cycle is logged and the loop
/// waits for the next scheduled tick; there is no fast-retry path.
pub struct RefreshScheduler {
    cycle: Arc<dyn Cycle>,
    period: Duration,
    status: Arc<RwLock<CycleStatus>>,
}

impl RefreshScheduler {
    pub fn new(cycle: Arc<dyn Cycle>, period: Duration) -> Self {
        Self {
            cycle,
            period,
            status: Arc::new(RwLock::new(CycleStatus::default())),
        }
    }

    pub async fn status(&self) -> CycleStatus {
        self.status.read().await.clone()
    }

    /// Runs forever. The alignment delay is taken from the wall clock
    /// once, here; the loop itself is driven purely by tokio time.
    pub async fn run(&self) {
        self.run_with_alignment(delay_until_next_hour(Utc::now()))
            .await
    }

    pub async fn run_with_alignment(&self, align_after: Duration) {
        self.run_cycle().await;

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        let align = sleep(align_after);
        tokio::pin!(align);
        let mut aligned = false;

        loop {
            tokio::select! {
                _ = &mut align, if !aligned => {
                    aligned = true;
                    info!("re-aligning refresh interval to the hour boundary");
                    self.run_cycle().await;
                    // restart the steady timer from this instant so
                    // subsequent ticks stay phase-aligned to the hour
                    ticker = interval_at(Instant::now() + self.period, self.period);
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }

    async fn run_cycle(&self) {
        let now = Utc::now();
        {
            let mut status = self.status.write().await;
            status.last_run = Some(now);
            status.run_count += 1;
        }

        match self.cycle.run().await {
            Ok(()) => {
                let mut status = self.status.write().await;
                status.last_success = Some(now);
                status.success_count += 1;
                status.last_error = None;
            }
            Err(e) => {
                let mut status = self.status.write().await;
                status.error_count += 1;
                status.last_error = Some(e.to_string());
                error!(error = %e, "publication cycle failed");
            }
        }
    }
}

/// Time remaining until the next wall-clock hour boundary. Never zero: a
/// start exactly on the boundary aligns to the following hour.
pub fn delay_until_next_hour(now: DateTime<Utc>) -> Duration {
    let ms_into_hour = (now.minute() as i64 * 60 + now.second() as i64) * 1000
        + now.timestamp_subsec_millis() as i64;
    Duration::from_millis((HOUR_MS - ms_into_hour) as u64)
}
