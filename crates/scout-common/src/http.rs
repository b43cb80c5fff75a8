/// Page fetching over plain HTTP GET.
///
/// One request per call and no retries. A non-2xx response is returned as
/// `CommonError::Status` so the caller can skip that page and keep going.
use std::time::Duration;

use tracing::debug;

use crate::error::CommonError;

#[derive(Clone)]
pub struct PageFetcher {
    http: reqwest::Client,
}

impl PageFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, CommonError> {
        let http = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// GET `url` and return the response body as text.
    pub async fn get_text(&self, url: &str) -> Result<String, CommonError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        debug!(url, status = status.as_u16(), "page fetched");

        if !status.is_success() {
            return Err(CommonError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}
