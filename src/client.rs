use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

use crate::models::Student;
use crate::transform::transform_students;

pub const RESULTS_URL: &str =
    "https://iacg-lumosity-games-backend-production.up.railway.app/api/results";
pub const RECOMPUTE_URL: &str =
    "https://iacg-lumosity-games-backend-production.up.railway.app/api/lumosity-stats";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("API request failed with status {status}")]
    Http { status: u16 },
    #[error("invalid data format from API: {0}")]
    Format(&'static str),
    #[error("response body is not valid JSON")]
    Decode(#[from] serde_json::Error),
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpReply, FetchError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("lpi-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpReply, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source: Box::new(source),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport)?.to_vec();
        Ok(HttpReply { status, body })
    }
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub results: String,
    pub recompute: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            results: RESULTS_URL.to_string(),
            recompute: RECOMPUTE_URL.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct StudentClient {
    transport: Arc<dyn HttpTransport>,
    endpoints: Endpoints,
}

impl StudentClient {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Fetches and normalizes the current result set.
    ///
    /// Failures are logged and returned; substituting fallback data is left
    /// to the caller.
    pub async fn fetch_student_data(&self) -> Result<Vec<Student>, FetchError> {
        let result = self.fetch_envelope().await;
        if let Err(err) = &result {
            error!(error = %err, url = %self.endpoints.results, "failed to fetch or process student data");
        }
        result
    }

    async fn fetch_envelope(&self) -> Result<Vec<Student>, FetchError> {
        let reply = self.transport.get(&self.endpoints.results).await?;
        if !reply.is_success() {
            return Err(FetchError::Http {
                status: reply.status,
            });
        }

        let envelope: Value = serde_json::from_slice(&reply.body)?;
        if envelope.get("success").and_then(Value::as_bool) != Some(true) {
            error!(response = %envelope, "results API did not report success");
            return Err(FetchError::Format("success flag is not set"));
        }

        let Some(data) = envelope.get("data").filter(|data| data.is_array()) else {
            error!(response = %envelope, "results API data is not an array");
            return Err(FetchError::Format("data is not an array"));
        };

        let students = transform_students(data);
        debug!(students = students.len(), "received student results");
        Ok(students)
    }

    /// Asks the backend to recompute its stats. The response body is ignored.
    pub async fn trigger_recompute(&self) -> Result<(), FetchError> {
        let reply = self.transport.get(&self.endpoints.recompute).await?;
        if reply.is_success() {
            Ok(())
        } else {
            Err(FetchError::Http {
                status: reply.status,
            })
        }
    }
}
