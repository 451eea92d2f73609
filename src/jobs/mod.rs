/// Background job scheduler
use crate::context::AppContext;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

pub mod reaper;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::expired_proposal_cleanup_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Cleanup expired proposals (runs daily by default)
    ///
    /// The cleanup is also reachable through the HTTP trigger for external
    /// schedulers; this in-process loop covers deployments without one.
    async fn expired_proposal_cleanup_job(scheduler: Arc<Self>) {
        let period = Duration::from_secs(scheduler.context.config.backend.cleanup_interval_secs);
        let mut interval = interval(period);

        loop {
            interval.tick().await;
            info!("Running expired proposal cleanup");

            let ctx = &scheduler.context;
            match reaper::run_cleanup(ctx.records.as_ref(), ctx.objects.as_ref(), ctx.bucket())
                .await
            {
                Ok(report) => {
                    if report.cleaned > 0 {
                        info!("{}", report.message);
                    } else {
                        info!("Proposal cleanup: nothing to do");
                    }
                    if let Some(errors) = &report.errors {
                        error!("Proposal cleanup had {} record failures", errors.len());
                    }
                }
                Err(e) => error!("Failed to clean up expired proposals: {}", e),
            }
        }
    }
}
