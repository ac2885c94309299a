// API Versions
pub const FACEBOOK_API_VERSION: &str = "v18.0";

// API Base URLs
pub const FACEBOOK_BASE_URL: &str = "https://graph.facebook.com";

// Server Settings
pub const DEFAULT_APP_PORT: u16 = 8080;
pub const LIVENESS_MESSAGE: &str = "Marketing insights worker is running";

// Worker Settings
pub const SWEEP_INTERVAL_SECS: u64 = 600; // 10 minutes
pub const POLL_INTERVAL_SECS: u64 = 3;
pub const POLL_MAX_ATTEMPTS: u32 = 600; // 30 minutes at the default interval

// Facebook API Fields
pub const FB_ACCOUNT_FIELDS: &str = "account_id,name,timezone_offset_hours_utc,timezone_name";
pub const FB_INSIGHT_FIELDS: &str = concat!(
    "ad_id,account_name,outbound_clicks,spend,",
    "cost_per_inline_link_click,cost_per_unique_outbound_click,",
    "cost_per_unique_inline_link_click,cost_per_unique_click,",
    "campaign_id,adset_id,impressions,actions,ad_name",
);

// Insights job request
pub const FB_INSIGHT_LEVEL: &str = "ad";
pub const FB_INSIGHT_LIMIT: &str = "300";
pub const FB_INSIGHT_DATE_PRESET: &str = "yesterday";
pub const FB_INSIGHT_BREAKDOWNS: &str = "hourly_stats_aggregated_by_advertiser_time_zone";

// Async job statuses
pub const JOB_STATUS_COMPLETED: &str = "Job Completed";
pub const JOB_STATUS_FAILED: &str = "Job Failed";
