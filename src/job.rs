//! Status polling for async insights jobs.
//!
//! A job starts out `Running` as soon as it is created and ends in either
//! `Completed` or `Failed`. Any status string other than the two terminal
//! literals counts as still running.

use crate::config::Config;
use crate::constants::{
    JOB_STATUS_COMPLETED, JOB_STATUS_FAILED, POLL_INTERVAL_SECS, POLL_MAX_ATTEMPTS,
};
use crate::facebook::{FacebookAPI, FacebookApiError};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn from_async_status(status: &str) -> Self {
        match status {
            JOB_STATUS_COMPLETED => Self::Completed,
            JOB_STATUS_FAILED => Self::Failed,
            _ => Self::Running,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    async_status: String,
    #[serde(default)]
    async_percent_completion: Option<f64>,
}

/// How often to check a job and how many non-terminal checks to tolerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` keeps polling until the job is terminal.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(POLL_INTERVAL_SECS),
            max_attempts: Some(POLL_MAX_ATTEMPTS),
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.poll_max_attempts,
        }
    }
}

impl FacebookAPI {
    pub async fn get_job_status(&self, job_id: &str) -> Result<JobStatus, FacebookApiError> {
        let url = self.endpoint(&[job_id], &[]);

        let body = self.transport.get(&url).await?;
        let response: JobStatusResponse =
            serde_json::from_slice(&body).map_err(|e| FacebookApiError::InvalidResponse {
                context: format!("status of job {job_id}"),
                source: e,
            })?;

        tracing::info!(
            job_id,
            status = %response.async_status,
            percent = response.async_percent_completion,
            "job status"
        );

        Ok(JobStatus::from_async_status(&response.async_status))
    }

    /// Waits one interval before every status check until the job is terminal.
    ///
    /// Status check errors are returned as-is and never retried. Cancelling
    /// `cancel` interrupts the wait between checks.
    pub async fn wait_for_job_completion(
        &self,
        job_id: &str,
        account_name: &str,
        cancel: &CancellationToken,
    ) -> Result<(), FacebookApiError> {
        let policy = self.poll_policy;
        let mut attempts = 0u32;

        loop {
            if let Some(max) = policy.max_attempts {
                if attempts >= max {
                    tracing::warn!(job_id, account = account_name, attempts, "giving up on job");
                    return Err(FacebookApiError::PollLimitExceeded {
                        job_id: job_id.to_string(),
                        attempts,
                    });
                }
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(FacebookApiError::Cancelled),
                () = self.clock.sleep(policy.interval) => {}
            }
            attempts += 1;

            let status = self.get_job_status(job_id).await.map_err(|e| {
                tracing::error!(
                    job_id,
                    account = account_name,
                    error = %e,
                    "error checking job status"
                );
                e
            })?;

            match status {
                JobStatus::Completed => return Ok(()),
                JobStatus::Failed => {
                    return Err(FacebookApiError::JobFailed {
                        job_id: job_id.to_string(),
                    })
                }
                JobStatus::Running => {}
            }
        }
    }
}
