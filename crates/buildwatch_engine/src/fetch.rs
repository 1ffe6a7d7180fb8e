use std::time::Duration;

use buildwatch_core::{PollFailure, PollOutcome, PollRequest};
use reqwest::header::{ACCEPT, AUTHORIZATION};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Larger response bodies fail the poll instead of being buffered.
    pub max_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
            max_bytes: 256 * 1024,
        }
    }
}

/// Runs one status query. Every failure is folded into the returned outcome.
#[async_trait::async_trait]
pub trait StatusClient: Send + Sync {
    async fn fetch(&self, request: &PollRequest) -> PollOutcome;
}

#[derive(Debug, Clone)]
pub struct ReqwestStatusClient {
    client: reqwest::Client,
    max_bytes: u64,
}

impl ReqwestStatusClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self {
            client,
            max_bytes: settings.max_bytes,
        })
    }
}

#[async_trait::async_trait]
impl StatusClient for ReqwestStatusClient {
    async fn fetch(&self, request: &PollRequest) -> PollOutcome {
        let url = match reqwest::Url::parse(&request.url) {
            Ok(url) => url,
            Err(err) => return PollOutcome::Failed(PollFailure::InvalidUrl(err.to_string())),
        };

        let mut builder = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(value) = request.authorization.as_deref() {
            builder = builder.header(AUTHORIZATION, value);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return PollOutcome::Failed(map_reqwest_error(err)),
        };

        let status = response.status().as_u16();
        match self.read_body(response).await {
            Ok(body) => PollOutcome::Response { status, body },
            Err(failure) => PollOutcome::Failed(failure),
        }
    }
}

impl ReqwestStatusClient {
    async fn read_body(&self, mut response: reqwest::Response) -> Result<Vec<u8>, PollFailure> {
        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(PollFailure::TooLarge {
                    max_bytes: self.max_bytes,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(map_reqwest_error)? {
            if body.len() as u64 + chunk.len() as u64 > self.max_bytes {
                return Err(PollFailure::TooLarge {
                    max_bytes: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> PollFailure {
    if err.is_timeout() {
        return PollFailure::Timeout;
    }
    PollFailure::Network(err.to_string())
}
