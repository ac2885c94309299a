use crate::clock::{Clock, TokioClock};
use crate::config::Config;
use crate::constants::{
    FB_ACCOUNT_FIELDS, FB_INSIGHT_BREAKDOWNS, FB_INSIGHT_DATE_PRESET, FB_INSIGHT_FIELDS,
    FB_INSIGHT_LEVEL, FB_INSIGHT_LIMIT,
};
use crate::job::PollPolicy;
use crate::models::{AdAccount, AdInsight, EnrichedInsight};
use crate::pager::{decode_records, Pager};
use crate::transport::{HttpTransport, Transport};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Error, Debug)]
pub enum FacebookApiError {
    #[error("API request failed: {0}")]
    RequestFailed(String),
    #[error("API returned status {status} for {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },
    #[error("Invalid response from {context}: {source}")]
    InvalidResponse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Missing {field} in {context}")]
    MissingField { context: String, field: &'static str },
    #[error("Malformed item {index} in {context}")]
    MalformedItem { context: String, index: usize },
    #[error("Malformed {context}: {reason}")]
    MalformedPage { context: String, reason: String },
    #[error("Insights job {job_id} failed")]
    JobFailed { job_id: String },
    #[error("Insights job {job_id} still running after {attempts} status checks")]
    PollLimitExceeded { job_id: String, attempts: u32 },
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Operation cancelled")]
    Cancelled,
}

impl FacebookApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::RequestFailed(_) | Self::UnexpectedStatus { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Self::InvalidResponse { .. }
                | Self::MissingField { .. }
                | Self::MalformedItem { .. }
                | Self::MalformedPage { .. }
        )
    }
}

#[derive(Debug, Deserialize)]
struct JobCreated {
    #[serde(default)]
    report_run_id: String,
}

pub struct FacebookAPI {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) poll_policy: PollPolicy,
    access_token: String,
    graph_url: Url,
    api_version: String,
}

impl FacebookAPI {
    pub fn from_config(config: &Config) -> Result<Self, FacebookApiError> {
        Self::with_parts(
            Arc::new(HttpTransport::new()),
            Arc::new(TokioClock),
            config.access_token.clone(),
            config.graph_url.clone(),
            config.api_version.clone(),
            PollPolicy::from_config(config),
        )
    }

    pub fn with_parts(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        access_token: String,
        graph_url: Url,
        api_version: String,
        poll_policy: PollPolicy,
    ) -> Result<Self, FacebookApiError> {
        if graph_url.cannot_be_a_base() {
            return Err(FacebookApiError::InvalidBaseUrl(graph_url.to_string()));
        }

        Ok(Self {
            transport,
            clock,
            poll_policy,
            access_token,
            graph_url,
            api_version,
        })
    }

    /// `{graph_url}/{version}/{segments..}?{query}&access_token=..`
    pub(crate) fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.graph_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(&self.api_version).extend(segments);
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("access_token", &self.access_token);
        }
        url
    }

    pub async fn get_ad_accounts(&self) -> Result<Vec<AdAccount>, FacebookApiError> {
        let url = self.endpoint(&["me", "adaccounts"], &[("fields", FB_ACCOUNT_FIELDS)]);

        let records = Pager::new(self.transport.as_ref()).fetch_all(url).await?;
        let accounts: Vec<AdAccount> = decode_records(records, "ad accounts")?;

        tracing::info!(count = accounts.len(), "fetched ad accounts");
        Ok(accounts)
    }

    /// Starts an async insights report for yesterday, one row per ad and hour.
    pub async fn create_insights_job(&self, account_id: &str) -> Result<String, FacebookApiError> {
        let act = format!("act_{account_id}");
        let url = self.endpoint(&[act.as_str(), "insights"], &[]);

        let fields = [
            ("level", FB_INSIGHT_LEVEL),
            ("limit", FB_INSIGHT_LIMIT),
            ("fields", FB_INSIGHT_FIELDS),
            ("use_unified_attribution_setting", "true"),
            ("date_preset", FB_INSIGHT_DATE_PRESET),
            ("breakdowns", FB_INSIGHT_BREAKDOWNS),
        ];

        let body = self.transport.post_form(&url, &fields).await?;
        let created: JobCreated =
            serde_json::from_slice(&body).map_err(|e| FacebookApiError::InvalidResponse {
                context: format!("insights job creation for account {account_id}"),
                source: e,
            })?;

        if created.report_run_id.is_empty() {
            return Err(FacebookApiError::MissingField {
                context: format!("insights job creation for account {account_id}"),
                field: "report_run_id",
            });
        }

        tracing::info!(account_id, job_id = %created.report_run_id, "created insights job");
        Ok(created.report_run_id)
    }

    pub async fn fetch_insights_results(
        &self,
        job_id: &str,
    ) -> Result<Vec<AdInsight>, FacebookApiError> {
        let url = self.endpoint(&[job_id, "insights"], &[]);

        let records = Pager::new(self.transport.as_ref()).fetch_all(url).await?;
        decode_records(records, &format!("insights of job {job_id}"))
    }

    /// Runs the whole report workflow for one account: submit, poll, fetch, enrich.
    /// Either every row comes back tagged with the account or nothing does.
    pub async fn fetch_ad_insights(
        &self,
        account: &AdAccount,
        cancel: &CancellationToken,
    ) -> Result<Vec<EnrichedInsight>, FacebookApiError> {
        if account.id.is_empty() {
            return Err(FacebookApiError::MissingField {
                context: format!("ad account {:?}", account.name),
                field: "account_id",
            });
        }

        tracing::info!(account_id = %account.id, account = %account.name, "fetching ad insights");

        let job_id = self.create_insights_job(&account.id).await?;
        self.wait_for_job_completion(&job_id, &account.name, cancel).await?;
        let insights = self.fetch_insights_results(&job_id).await?;

        Ok(insights
            .into_iter()
            .map(|insight| EnrichedInsight::new(insight, account))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::ManualClock;
    use crate::transport::test_support::ScriptedTransport;
    use serde_json::json;
    use std::time::Duration;

    fn api_with(transport: Arc<ScriptedTransport>, clock: Arc<ManualClock>) -> FacebookAPI {
        FacebookAPI::with_parts(
            transport,
            clock,
            "secret-token".to_string(),
            Url::parse("https://graph.test").unwrap(),
            "v18.0".to_string(),
            PollPolicy {
                interval: Duration::from_secs(3),
                max_attempts: Some(10),
            },
        )
        .unwrap()
    }

    fn account(id: &str, offset: i32) -> AdAccount {
        AdAccount {
            id: id.to_string(),
            name: format!("Account {id}"),
            timezone_offset_hours_utc: offset,
            timezone_name: "Asia/Bangkok".to_string(),
        }
    }

    fn insight(ad_id: &str) -> serde_json::Value {
        json!({
            "ad_id": ad_id,
            "account_name": "Shop",
            "spend": "1.00",
            "impressions": "10",
            "campaign_id": "c",
            "adset_id": "s",
            "ad_name": "ad",
            "date_start": "2026-10-13",
            "date_stop": "2026-10-13",
            "hourly_stats_aggregated_by_advertiser_time_zone": "00:00:00 - 00:59:59"
        })
    }

    #[test]
    fn endpoint_appends_version_segments_and_token() {
        let api = api_with(Arc::new(ScriptedTransport::new()), Arc::new(ManualClock::new()));
        let url = api.endpoint(&["act_42", "insights"], &[("fields", "a,b")]);
        assert_eq!(
            url.as_str(),
            "https://graph.test/v18.0/act_42/insights?fields=a%2Cb&access_token=secret-token"
        );
    }

    #[test]
    fn transport_errors_do_not_leak_the_token() {
        let err = FacebookApiError::UnexpectedStatus {
            endpoint: "/v18.0/me/adaccounts".to_string(),
            status: 400,
        };
        assert!(!err.to_string().contains("secret-token"));
    }

    #[tokio::test]
    async fn create_job_posts_fixed_report_configuration() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_post("/v18.0/act_42/insights", json!({"report_run_id": "777"}));
        let api = api_with(transport.clone(), Arc::new(ManualClock::new()));

        let job_id = api.create_insights_job("42").await.unwrap();

        assert_eq!(job_id, "777");
        let forms = transport.forms("/v18.0/act_42/insights");
        assert_eq!(forms.len(), 1);
        let field = |name: &str| {
            forms[0]
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(field("level").as_deref(), Some("ad"));
        assert_eq!(field("limit").as_deref(), Some("300"));
        assert_eq!(field("date_preset").as_deref(), Some("yesterday"));
        assert_eq!(
            field("breakdowns").as_deref(),
            Some("hourly_stats_aggregated_by_advertiser_time_zone")
        );
        assert_eq!(
            field("fields").as_deref(),
            Some(
                "ad_id,account_name,outbound_clicks,spend,cost_per_inline_link_click,\
                 cost_per_unique_outbound_click,cost_per_unique_inline_link_click,\
                 cost_per_unique_click,campaign_id,adset_id,impressions,actions,ad_name"
            )
        );
    }

    #[test]
    fn from_config_uses_configured_graph_url_and_version() {
        let config = Config::from_lookup(|key| match key {
            "FB_ACCESS_TOKEN" => Some("secret-token".to_string()),
            "FB_GRAPH_URL" => Some("https://graph.test".to_string()),
            "FB_API_VERSION" => Some("v19.0".to_string()),
            _ => None,
        })
        .unwrap();

        let api = FacebookAPI::from_config(&config).unwrap();

        assert_eq!(
            api.endpoint(&["me", "adaccounts"], &[]).as_str(),
            "https://graph.test/v19.0/me/adaccounts?access_token=secret-token"
        );
        assert_eq!(api.poll_policy.max_attempts, Some(600));
    }

    #[tokio::test]
    async fn create_job_without_report_run_id_is_a_parse_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_post("/v18.0/act_42/insights", json!({"id": "777"}));
        let api = api_with(transport, Arc::new(ManualClock::new()));

        let err = api.create_insights_job("42").await.unwrap_err();

        assert!(matches!(err, FacebookApiError::MissingField { field: "report_run_id", .. }));
    }

    #[tokio::test]
    async fn create_job_with_invalid_json_is_a_parse_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_post("/v18.0/act_42/insights", json!("not an object"));
        let api = api_with(transport, Arc::new(ManualClock::new()));

        let err = api.create_insights_job("42").await.unwrap_err();

        assert!(err.is_parse());
    }

    #[tokio::test]
    async fn create_job_transport_failure_propagates() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_post_status("/v18.0/act_42/insights", 403);
        let api = api_with(transport, Arc::new(ManualClock::new()));

        let err = api.create_insights_job("42").await.unwrap_err();

        assert!(matches!(err, FacebookApiError::UnexpectedStatus { status: 403, .. }));
    }

    #[tokio::test]
    async fn accounts_are_decoded_across_pages() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_get(
            "/v18.0/me/adaccounts",
            json!({
                "data": [{
                    "account_id": "1",
                    "name": "One",
                    "timezone_offset_hours_utc": 7,
                    "timezone_name": "Asia/Bangkok"
                }],
                "paging": {"next": "https://graph.test/v18.0/me/adaccounts-page-2"}
            }),
        );
        transport.on_get(
            "/v18.0/me/adaccounts-page-2",
            json!({"data": [{
                "account_id": "2",
                "name": "Two",
                "timezone_offset_hours_utc": 0,
                "timezone_name": "UTC"
            }]}),
        );
        let api = api_with(transport, Arc::new(ManualClock::new()));

        let accounts = api.get_ad_accounts().await.unwrap();

        assert_eq!(
            accounts,
            vec![
                AdAccount {
                    id: "1".into(),
                    name: "One".into(),
                    timezone_offset_hours_utc: 7,
                    timezone_name: "Asia/Bangkok".into(),
                },
                AdAccount {
                    id: "2".into(),
                    name: "Two".into(),
                    timezone_offset_hours_utc: 0,
                    timezone_name: "UTC".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn undecodable_insight_fails_the_whole_batch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_get(
            "/v18.0/777/insights",
            json!({"data": [insight("1"), {"ad_id": 5}]}),
        );
        let api = api_with(transport, Arc::new(ManualClock::new()));

        let err = api.fetch_insights_results("777").await.unwrap_err();

        assert!(err.is_parse());
    }

    #[tokio::test]
    async fn fetch_ad_insights_enriches_every_row() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_post("/v18.0/act_42/insights", json!({"report_run_id": "777"}));
        transport.on_get(
            "/v18.0/777",
            json!({"async_status": "Job Running", "async_percent_completion": 40}),
        );
        transport.on_get(
            "/v18.0/777",
            json!({"async_status": "Job Completed", "async_percent_completion": 100}),
        );
        transport.on_get(
            "/v18.0/777/insights",
            json!({"data": [insight("1"), insight("2")]}),
        );
        let api = api_with(transport.clone(), Arc::new(ManualClock::new()));

        let rows = api
            .fetch_ad_insights(&account("42", -5), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.account_id == "42" && r.timezone_offset_hours_utc == -5));
        assert_eq!(transport.get_count("/v18.0/777"), 2);
    }

    #[tokio::test]
    async fn account_without_id_is_rejected_before_any_request() {
        let transport = Arc::new(ScriptedTransport::new());
        let api = api_with(transport.clone(), Arc::new(ManualClock::new()));

        let err = api
            .fetch_ad_insights(&account("", 0), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, FacebookApiError::MissingField { field: "account_id", .. }));
        assert_eq!(transport.post_count("/v18.0/act_/insights"), 0);
    }
}
