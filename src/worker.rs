use crate::clock::Clock;
use crate::facebook::{FacebookAPI, FacebookApiError};
use crate::models::EnrichedInsight;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct AccountOutcome {
    pub account_id: String,
    pub account_name: String,
    pub result: Result<Vec<EnrichedInsight>, FacebookApiError>,
}

#[derive(Debug)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub listing_error: Option<FacebookApiError>,
    pub outcomes: Vec<AccountOutcome>,
}

impl SweepReport {
    pub fn insight_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(Vec::len)
            .sum()
    }

    pub fn failed_accounts(&self) -> Vec<&AccountOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err()).collect()
    }

    pub fn outcome(&self, account_id: &str) -> Option<&AccountOutcome> {
        self.outcomes.iter().find(|o| o.account_id == account_id)
    }
}

/// Time left until the next sweep should start. A sweep that overran the
/// period is followed immediately by the next one.
pub fn next_sweep_delay(
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
    interval: Duration,
) -> Duration {
    let elapsed = (now - started_at).to_std().unwrap_or_default();
    interval.saturating_sub(elapsed)
}

pub struct SweepWorker {
    api: Arc<FacebookAPI>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl SweepWorker {
    pub fn new(api: Arc<FacebookAPI>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self { api, clock, interval }
    }

    /// One pass over every account. Accounts are processed one at a time and a
    /// failing account never stops the others.
    pub async fn run_sweep(&self, cancel: &CancellationToken) -> SweepReport {
        let started_at = self.clock.now();
        tracing::info!("fetching ad accounts");

        let accounts = match self.api.get_ad_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch ad accounts");
                return SweepReport {
                    started_at,
                    listing_error: Some(e),
                    outcomes: Vec::new(),
                };
            }
        };

        let mut outcomes = Vec::with_capacity(accounts.len());
        for account in &accounts {
            if cancel.is_cancelled() {
                tracing::info!("sweep cancelled, skipping remaining accounts");
                break;
            }

            let result = self.api.fetch_ad_insights(account, cancel).await;
            match &result {
                Ok(insights) => tracing::info!(
                    account_id = %account.id,
                    account = %account.name,
                    count = insights.len(),
                    "fetched insights"
                ),
                Err(e) => tracing::error!(
                    account_id = %account.id,
                    account = %account.name,
                    error = %e,
                    "failed to fetch insights"
                ),
            }

            outcomes.push(AccountOutcome {
                account_id: account.id.clone(),
                account_name: account.name.clone(),
                result,
            });
        }

        SweepReport {
            started_at,
            listing_error: None,
            outcomes,
        }
    }

    /// Sweeps immediately, then once per interval measured from each sweep's
    /// start, until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            let report = self.run_sweep(&cancel).await;
            tracing::info!(
                accounts = report.outcomes.len(),
                insights = report.insight_count(),
                failed = report.failed_accounts().len(),
                "sweep finished"
            );

            let delay = next_sweep_delay(report.started_at, self.clock.now(), self.interval);
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = self.clock.sleep(delay) => {}
            }
        }

        tracing::info!("sweep worker stopped");
    }
}
