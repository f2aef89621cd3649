use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::infra::metrics;
use crate::shared::error::ConsoleError;
use crate::shared::types::ApiEnvelope;
use crate::shared::utils::measure_latency;

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Absolute base URL without a trailing slash.
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

/// Thin JSON client for the console backend. Every call unwraps the
/// `{code, message, data}` envelope before handing data back.
#[derive(Clone)]
pub struct ConsoleHttp {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ConsoleHttp {
    pub fn new(settings: ClientSettings) -> Result<Self, ConsoleError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url,
            token: settings.token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T, Q>(&self, path: &'static str, query: &Q) -> Result<T, ConsoleError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.client.get(self.url(path)).query(query);
        self.execute(path, request).await
    }

    pub async fn post<T, B>(&self, path: &'static str, body: &B) -> Result<T, ConsoleError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.client.post(self.url(path)).json(body);
        self.execute(path, request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<T>(&self, path: &'static str, request: RequestBuilder) -> Result<T, ConsoleError>
    where
        T: DeserializeOwned,
    {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        match measure_latency(|| send_enveloped::<T>(request)).await {
            Ok((data, elapsed_ms)) => {
                metrics::observe_request(path, elapsed_ms);
                debug!(endpoint = path, elapsed_ms, "console request completed");
                Ok(data)
            }
            Err(err) => {
                metrics::record_api_error(err.kind());
                warn!(endpoint = path, kind = err.kind(), %err, "console request failed");
                Err(err)
            }
        }
    }
}

async fn send_enveloped<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ConsoleError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ConsoleError::Status {
            status: status.as_u16(),
            body: truncate(body),
        });
    }
    let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
    envelope.into_result()
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
