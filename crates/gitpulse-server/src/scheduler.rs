//! Background job scheduler.
//!
//! Registers the daily collection job at server startup. The collector's
//! single-flight slot makes overlap with manual triggers safe: whichever
//! arrives second is rejected.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use gitpulse_collector::{Collector, TriggerOutcome};

/// Builds and starts the scheduler with the daily collection job.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(collector: Arc<Collector>) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    // 00:05 UTC daily, shortly after the trend index rolls its rankings over.
    let job = Job::new_async("0 5 0 * * *", move |_uuid, _lock| {
        let collector = Arc::clone(&collector);

        Box::pin(async move {
            let date = Utc::now().date_naive();
            match collector.trigger(date) {
                TriggerOutcome::Started => {
                    tracing::info!(%date, "scheduler: daily collection started");
                }
                TriggerOutcome::AlreadyRunning => {
                    tracing::info!(%date, "scheduler: collection already in flight; skipping");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}
