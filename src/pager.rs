//! Cursor pagination over Graph API list responses.
//!
//! Every list endpoint answers with the same envelope:
//!
//! ```text
//! { "data": [ {...}, {...} ], "paging": { "next": "https://graph.facebook.com/...&after=X" } }
//! ```
//!
//! The page body must be a JSON object. A `data` that is not an array counts
//! as an empty page and a `paging.next` that is not a string ends the walk.
//! The pager hands back the untyped records. Callers decode the records into
//! their own types with [`decode_records`].

use crate::facebook::FacebookApiError;
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

pub type RawRecord = Map<String, Value>;

/// What to do with a `data` item that is not a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedItemPolicy {
    #[default]
    Skip,
    Reject,
}

/// Reads `paging.next`; missing, empty or non-string values mean there is no next page.
fn next_url(page: &RawRecord) -> Option<&str> {
    page.get("paging")
        .and_then(|paging| paging.get("next"))
        .and_then(Value::as_str)
        .filter(|next| !next.is_empty())
}

pub struct Pager<'a> {
    transport: &'a dyn Transport,
    policy: MalformedItemPolicy,
}

impl<'a> Pager<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            policy: MalformedItemPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MalformedItemPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetches `start` and every page linked from it, returning all records in
    /// visiting order. The first failing page aborts the whole walk.
    pub async fn fetch_all(&self, start: Url) -> Result<Vec<RawRecord>, FacebookApiError> {
        let mut records = Vec::new();
        let mut next = Some(start);
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let body = self.transport.get(&url).await?;
            let context = format!("page {} of {}", pages + 1, url.path());
            let page: Value =
                serde_json::from_slice(&body).map_err(|e| FacebookApiError::InvalidResponse {
                    context: context.clone(),
                    source: e,
                })?;
            let Value::Object(mut page) = page else {
                return Err(FacebookApiError::MalformedPage {
                    context,
                    reason: "body is not a JSON object".to_string(),
                });
            };
            pages += 1;

            let next_raw = next_url(&page).map(str::to_owned);
            let items = match page.remove("data") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(record) => records.push(record),
                    _ if self.policy == MalformedItemPolicy::Skip => {
                        tracing::debug!(page = pages, index, "skipping non-object item");
                    }
                    _ => return Err(FacebookApiError::MalformedItem { context, index }),
                }
            }

            if let Some(raw) = next_raw {
                let parsed = Url::parse(&raw).map_err(|e| FacebookApiError::MalformedPage {
                    context,
                    reason: format!("invalid paging.next URL: {e}"),
                })?;
                next = Some(parsed);
            }
        }

        tracing::debug!(pages, records = records.len(), "pagination finished");
        Ok(records)
    }
}

/// Decodes every record into `T`; the first record that does not fit fails the batch.
pub fn decode_records<T: DeserializeOwned>(
    records: Vec<RawRecord>,
    context: &str,
) -> Result<Vec<T>, FacebookApiError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value(Value::Object(record)).map_err(|e| {
                FacebookApiError::InvalidResponse {
                    context: format!("{context} item {index}"),
                    source: e,
                }
            })
        })
        .collect()
}
