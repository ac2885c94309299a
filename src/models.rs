use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AdAccount {
    #[serde(rename = "account_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub timezone_offset_hours_utc: i32,
    #[serde(default)]
    pub timezone_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ActionMetric {
    pub action_type: String,
    pub value: String,
}

/// One insight row as returned by the report job. Metrics the API omits stay `None`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AdInsight {
    pub ad_id: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_clicks: Option<Vec<ActionMetric>>,
    #[serde(default)]
    pub spend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_inline_link_click: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_unique_outbound_click: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_unique_inline_link_click: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_unique_click: Option<String>,
    #[serde(default)]
    pub campaign_id: String,
    #[serde(default)]
    pub adset_id: String,
    #[serde(default)]
    pub impressions: String, // Facebook returns it as a string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionMetric>>,
    #[serde(default)]
    pub ad_name: String,
    pub date_start: String,
    pub date_stop: String,
    #[serde(default, rename = "hourly_stats_aggregated_by_advertiser_time_zone")]
    pub hourly_stats: String,
}

/// An insight row tagged with the account it was fetched for.
///
/// Only built by [`EnrichedInsight::new`], which the account pipeline calls
/// with a validated account, so the account id is never empty.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct EnrichedInsight {
    #[serde(flatten)]
    pub insight: AdInsight,
    pub account_id: String,
    pub timezone_offset_hours_utc: i32,
}

impl EnrichedInsight {
    pub(crate) fn new(insight: AdInsight, account: &AdAccount) -> Self {
        Self {
            insight,
            account_id: account.id.clone(),
            timezone_offset_hours_utc: account.timezone_offset_hours_utc,
        }
    }
}
