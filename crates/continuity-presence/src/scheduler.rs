//! Cron tick service wrapping tokio-cron-scheduler.
//!
//! Runs the per-tenant presence evaluation and the topic decay pass on
//! their configured schedules, with graceful shutdown via a shared
//! CancellationToken.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::PresenceError;
use crate::jitter::JitterConfig;

/// Validate a 6-field cron expression (sec min hour day month weekday).
pub fn validate_cron_expression(expr: &str) -> Result<(), PresenceError> {
    match Job::new_async(expr, |_uuid, _lock| Box::pin(async {})) {
        Ok(_) => Ok(()),
        Err(e) => Err(PresenceError::InvalidCron(format!("'{}': {}", expr, e))),
    }
}

/// Lifecycle wrapper around the job scheduler.
pub struct TickScheduler {
    scheduler: JobScheduler,
    jitter: JitterConfig,
    shutdown_token: CancellationToken,
    is_running: AtomicBool,
}

impl TickScheduler {
    /// Create a stopped scheduler; call `start()` to begin executing jobs.
    pub async fn new(jitter: JitterConfig) -> Result<Self, PresenceError> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler,
            jitter,
            shutdown_token: CancellationToken::new(),
            is_running: AtomicBool::new(false),
        })
    }

    /// Start executing scheduled jobs.
    pub async fn start(&self) -> Result<(), PresenceError> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(PresenceError::AlreadyRunning);
        }
        self.scheduler.start().await?;
        info!("Tick scheduler started");
        Ok(())
    }

    /// Signal all jobs to stop and shut the scheduler down.
    pub async fn shutdown(&mut self) -> Result<(), PresenceError> {
        if !self.is_running.load(Ordering::SeqCst) {
            return Err(PresenceError::NotRunning);
        }

        self.shutdown_token.cancel();
        if let Err(e) = self.scheduler.shutdown().await {
            warn!("Error during scheduler shutdown: {}", e);
        }
        self.is_running.store(false, Ordering::SeqCst);
        info!("Tick scheduler stopped");
        Ok(())
    }

    /// Token jobs should watch to exit cleanly on shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Whether the scheduler is currently running.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Register a recurring job.
    ///
    /// The job function receives the shutdown token; jitter (when
    /// configured) is applied before each firing. Returns the job id.
    pub async fn add_cron_job<F, Fut>(
        &self,
        name: &str,
        cron_expr: &str,
        job_fn: F,
    ) -> Result<uuid::Uuid, PresenceError>
    where
        F: Fn(CancellationToken) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        validate_cron_expression(cron_expr)?;

        let job_name = name.to_string();
        let shutdown_token = self.shutdown_token.clone();
        let jitter = self.jitter.clone();

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let name = job_name.clone();
            let token = shutdown_token.clone();
            let jitter = jitter.clone();
            let job_fn = job_fn.clone();

            Box::pin(async move {
                jitter.apply().await;
                if token.is_cancelled() {
                    return;
                }

                let start = std::time::Instant::now();
                job_fn(token).await;
                info!(
                    job = %name,
                    duration_ms = start.elapsed().as_millis(),
                    "Tick completed"
                );
            })
        })
        .map_err(|e| PresenceError::InvalidCron(e.to_string()))?;

        let uuid = self.scheduler.add(job).await?;
        info!(job = %name, uuid = %uuid, cron = %cron_expr, "Job registered");
        Ok(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    #[test]
    fn test_validate_cron_expression() {
        assert!(validate_cron_expression("0 */15 * * * *").is_ok());
        assert!(validate_cron_expression("0 30 4 * * *").is_ok());
        assert!(validate_cron_expression("not a cron").is_err());
        assert!(validate_cron_expression("").is_err());
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let scheduler = TickScheduler::new(JitterConfig::default()).await.unwrap();
        scheduler.start().await.unwrap();
        assert!(matches!(
            scheduler.start().await,
            Err(PresenceError::AlreadyRunning)
        ));
    }

    #[tokio::test]
    async fn test_shutdown_without_start_fails() {
        let mut scheduler = TickScheduler::new(JitterConfig::default()).await.unwrap();
        assert!(matches!(
            scheduler.shutdown().await,
            Err(PresenceError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn test_job_runs() {
        let scheduler = TickScheduler::new(JitterConfig::default()).await.unwrap();
        let counter = Arc::new(AtomicU32::new(0));

        let job_counter = counter.clone();
        scheduler
            .add_cron_job("counter", "* * * * * *", move |_token| {
                let counter = job_counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await
            .unwrap();

        scheduler.start().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2_500)).await;
        assert!(counter.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_shutdown_token_visible_to_jobs() {
        let mut scheduler = TickScheduler::new(JitterConfig::default()).await.unwrap();
        scheduler.start().await.unwrap();
        let token = scheduler.shutdown_token();
        assert!(!token.is_cancelled());
        scheduler.shutdown().await.unwrap();
        assert!(token.is_cancelled());
    }
}
