#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use marketing_insights_worker::clock::TokioClock;
use marketing_insights_worker::facebook::FacebookAPI;
use marketing_insights_worker::job::PollPolicy;
use marketing_insights_worker::transport::HttpTransport;
use url::Url;

pub const TOKEN: &str = "test-token";

pub fn test_api(base_url: &str) -> FacebookAPI {
    FacebookAPI::with_parts(
        Arc::new(HttpTransport::new()),
        Arc::new(TokioClock),
        TOKEN.to_string(),
        Url::parse(base_url).expect("mock server uri"),
        "v18.0".to_string(),
        PollPolicy {
            interval: Duration::from_millis(5),
            max_attempts: Some(20),
        },
    )
    .expect("api construction should not fail")
}

pub fn account(id: &str, offset: i32) -> serde_json::Value {
    serde_json::json!({
        "account_id": id,
        "name": format!("Account {id}"),
        "timezone_offset_hours_utc": offset,
        "timezone_name": "America/New_York"
    })
}

pub fn insight(ad_id: &str) -> serde_json::Value {
    serde_json::json!({
        "ad_id": ad_id,
        "account_name": "Shop",
        "outbound_clicks": [{"action_type": "outbound_click", "value": "4"}],
        "spend": "3.21",
        "cost_per_unique_click": "0.80",
        "campaign_id": "c-1",
        "adset_id": "s-1",
        "impressions": "240",
        "actions": [
            {"action_type": "link_click", "value": "4"},
            {"action_type": "page_engagement", "value": "6"}
        ],
        "ad_name": "Autumn sale",
        "date_start": "2026-10-13",
        "date_stop": "2026-10-13",
        "hourly_stats_aggregated_by_advertiser_time_zone": "14:00:00 - 14:59:59"
    })
}
