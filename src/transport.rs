use crate::facebook::FacebookApiError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use url::Url;

/// Raw HTTP access to the Graph API. Implementations fail on network errors
/// and on any non-success status; bodies are returned untouched.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, FacebookApiError>;

    async fn post_form(
        &self,
        url: &Url,
        fields: &[(&str, &str)],
    ) -> Result<Vec<u8>, FacebookApiError>;
}

#[derive(Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    async fn read_body(url: &Url, response: Response) -> Result<Vec<u8>, FacebookApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FacebookApiError::UnexpectedStatus {
                endpoint: url.path().to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FacebookApiError::RequestFailed(e.without_url().to_string()))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, FacebookApiError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FacebookApiError::RequestFailed(e.without_url().to_string()))?;

        Self::read_body(url, response).await
    }

    async fn post_form(
        &self,
        url: &Url,
        fields: &[(&str, &str)],
    ) -> Result<Vec<u8>, FacebookApiError> {
        let response = self
            .client
            .post(url.clone())
            .form(fields)
            .send()
            .await
            .map_err(|e| FacebookApiError::RequestFailed(e.without_url().to_string()))?;

        Self::read_body(url, response).await
    }
}
