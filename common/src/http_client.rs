use crate::errors::AppError;
use reqwest::Client;
use std::time::Duration;
use tracing::{Instrument, error, info, instrument, warn};

/// HTTP client for upstream JSON APIs with a per-request timeout and
/// optional retry with exponential backoff
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            max_retries,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Fetch JSON from URL. With `max_retries == 0` this is a single attempt.
    pub async fn get_json<T>(&self, url: &str) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.get_json_with_query(url, &[]).await
    }

    /// Fetch JSON from `url` with `query` appended as encoded pairs. Query
    /// values never appear in logs or error messages, so credentials such as
    /// API keys belong here rather than in `url`.
    #[instrument(skip(self, query), fields(url = %url))]
    pub async fn get_json_with_query<T>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            let span = tracing::info_span!("http_request", attempt = attempt + 1);

            match self.fetch_with_timeout(url, query).instrument(span).await {
                Ok(response) => {
                    info!(attempt = attempt + 1, "Upstream request successful");
                    return Ok(response);
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "Upstream request failed");
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let backoff = Duration::from_millis(2_u64.pow(attempt) * 100);
                        warn!(
                            backoff_ms = backoff.as_millis(),
                            "Retrying with exponential backoff"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        if self.max_retries > 0 {
            error!(attempts = self.max_retries + 1, "All retry attempts exhausted");
        }
        Err(last_error.unwrap_or_else(|| AppError::internal("Unknown error after retries")))
    }

    async fn fetch_with_timeout<T>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        // reqwest errors carry the full URL, query string included
        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| AppError::timeout(format!("Request to {} timed out", url)))?
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::timeout(format!("Request to {} timed out", url))
                } else {
                    AppError::NetworkError(e.without_url())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(
                status.as_u16(),
                format!("upstream responded with {}", status),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::NetworkError(e.without_url()))?;
        let json: T = serde_json::from_str(&text).map_err(AppError::ParseError)?;

        Ok(json)
    }
}
