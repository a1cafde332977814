//! Runs each registered job on its own fixed period.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use {
    tokio::{
        sync::Mutex,
        task::JoinHandle,
        time::{MissedTickBehavior, interval},
    },
    tracing::{debug, error, info},
};

use crate::{
    Error, Result,
    job::{Job, JobKind},
};

struct Registration {
    job: Arc<dyn Job>,
    period: Duration,
}

/// One tokio task per job. A job's next tick starts only after its previous
/// tick has returned, so ticks of the same job never overlap.
#[derive(Default)]
pub struct Scheduler {
    registrations: Mutex<Vec<Registration>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job` to run every `period`, starting immediately on `start`.
    pub async fn schedule(&self, job: Arc<dyn Job>, period: Duration) -> Result<()> {
        let kind = job.kind();
        if period.is_zero() {
            return Err(Error::InvalidPeriod { kind });
        }
        let mut registrations = self.registrations.lock().await;
        if registrations.iter().any(|r| r.job.kind() == kind) {
            return Err(Error::AlreadyScheduled { kind });
        }
        registrations.push(Registration { job, period });
        Ok(())
    }

    /// Spawn the trigger loops.
    pub async fn start(&self) -> Result<()> {
        let mut handles = self.handles.lock().await;
        if !handles.is_empty() {
            return Err(Error::AlreadyRunning);
        }

        let registrations = self.registrations.lock().await;
        for registration in registrations.iter() {
            let job = Arc::clone(&registration.job);
            let period = registration.period;
            info!(job = %job.kind(), period_secs = period.as_secs_f64(), "scheduling job");
            handles.push(tokio::spawn(trigger_loop(job, period)));
        }
        Ok(())
    }

    /// Abort every trigger loop. A tick in progress is dropped at its next
    /// await point.
    pub async fn stop(&self) {
        let mut handles = self.handles.lock().await;
        for handle in handles.drain(..) {
            handle.abort();
        }
        info!("scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        !self.handles.lock().await.is_empty()
    }

    pub async fn scheduled(&self) -> Vec<JobKind> {
        let registrations = self.registrations.lock().await;
        registrations.iter().map(|r| r.job.kind()).collect()
    }
}

async fn trigger_loop(job: Arc<dyn Job>, period: Duration) {
    let kind = job.kind();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let started = Instant::now();
        match job.execute().await {
            Ok(()) => {
                debug!(job = %kind, elapsed_ms = started.elapsed().as_millis() as u64, "tick finished");
            },
            Err(e) => {
                error!(job = %kind, error = %e, "tick failed");
            },
        }
    }
}
