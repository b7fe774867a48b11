use super::{AnalysisBackend, ServiceError};
use crate::model::{AnalysisRequest, AnalysisResult, ClientConfig, ErrorBody, ServiceStatus};
use async_trait::async_trait;
use bytes::Bytes;
use rand::RngCore;
use reqwest::{Client, Response, Url};
use std::net::IpAddr;
use tracing::{debug, info, warn};

/// HTTP client for the analysis and artifact endpoints.
pub struct ServiceClient {
    http: Client,
    base_url: Url,
}

impl ServiceClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self, ServiceError> {
        let base_url = parse_base_url(&cfg.base_url)?;
        let mut builder = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout);
        // Loopback services are reached directly, bypassing any configured proxy.
        if is_loopback(&base_url) {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Query the readiness document served at the service root.
    pub async fn status(&self) -> Result<ServiceStatus, ServiceError> {
        let url = self.base_url.clone();
        debug!(%url, "checking service status");
        let resp = self.http.get(url).send().await?;
        let body = ensure_success(resp).await?;
        serde_json::from_slice(&body).map_err(ServiceError::Malformed)
    }

    /// Fetch a generated report artifact by filename.
    pub async fn fetch_report(&self, filename: &str) -> Result<Bytes, ServiceError> {
        let url = crate::download::report_url(&self.base_url, filename)?;
        info!(%url, "fetching report artifact");
        let resp = self.http.get(url).send().await?;
        ensure_success(resp).await
    }
}

#[async_trait]
impl AnalysisBackend for ServiceClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ServiceError> {
        let url = self.endpoint("analyze")?;
        let request_id = gen_request_id();
        info!(drug = request.drug(), %request_id, "dispatching analysis");

        let resp = self
            .http
            .post(url)
            .header("X-Request-Id", &request_id)
            .json(request)
            .send()
            .await?;
        let body = ensure_success(resp).await?;

        serde_json::from_slice::<AnalysisResult>(&body).map_err(|e| {
            warn!(%request_id, error = %e, "analysis result did not match the expected shape");
            ServiceError::Malformed(e)
        })
    }
}

/// Read the whole body; a non-2xx status becomes `ServiceError::Api` carrying the
/// structured `error` field when the body has one.
async fn ensure_success(resp: Response) -> Result<Bytes, ServiceError> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if status.is_success() {
        return Ok(body);
    }
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error);
    warn!(status = status.as_u16(), ?message, "service returned an error status");
    Err(ServiceError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Generate a random correlation ID for one analysis request.
fn gen_request_id() -> String {
    let mut b = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut b);
    format!("{:016x}", u64::from_le_bytes(b))
}

fn parse_base_url(raw: &str) -> Result<Url, ServiceError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| ServiceError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ServiceError::InvalidUrl(raw.to_string()));
    }
    // Keep any path prefix when joining endpoint names onto the base.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn is_loopback(url: &Url) -> bool {
    let host = url
        .host_str()
        .unwrap_or_default()
        .trim_start_matches('[')
        .trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
}
