use std::time::Duration;

use pipeline_core::{ActionResponse, ApiRequest, PostKind, QueueSnapshot};
use pipeline_logging::{pipeline_debug, pipeline_warn};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::{ApiError, FailureKind, HealthReport, QueueQuery, MALFORMED_RESPONSE_MESSAGE};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            health_timeout: Duration::from_secs(5),
        }
    }
}

/// The backend's content endpoints.
#[async_trait::async_trait]
pub trait ContentApi: Send + Sync {
    async fn fetch_queue(&self, query: &QueueQuery) -> Result<QueueSnapshot, ApiError>;

    async fn send(&self, request: &ApiRequest) -> Result<ActionResponse, ApiError>;

    async fn health(&self) -> Result<HealthReport, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestContentApi {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestContentApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::new(FailureKind::InvalidUrl, "base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        timeout: Option<Duration>,
    ) -> Result<T, ApiError> {
        pipeline_debug!("{} {}", method, url);
        let mut builder = self.client.request(method, url.clone());
        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| map_reqwest_error(&self.base, err))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| map_reqwest_error(&self.base, err))?;

        if !status.is_success() {
            let message = error_message(status, &bytes);
            pipeline_warn!("{} answered {}: {}", url, status, message);
            return Err(ApiError::new(FailureKind::HttpStatus(status.as_u16()), message));
        }

        serde_json::from_slice(&bytes).map_err(|err| {
            pipeline_warn!("Could not parse response from {}: {}", url, err);
            ApiError::new(FailureKind::Malformed, MALFORMED_RESPONSE_MESSAGE)
        })
    }
}

#[async_trait::async_trait]
impl ContentApi for ReqwestContentApi {
    async fn fetch_queue(&self, query: &QueueQuery) -> Result<QueueSnapshot, ApiError> {
        let mut url = self.endpoint(&["api", "content", "queue"])?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        self.execute(Method::GET, url, None, None).await
    }

    async fn send(&self, request: &ApiRequest) -> Result<ActionResponse, ApiError> {
        let id = request.post_id().to_string();
        let url = self.endpoint(&["api", "content", id.as_str(), action_segment(request)])?;
        let body = request_body(request)?;
        self.execute(Method::POST, url, body, None).await
    }

    async fn health(&self) -> Result<HealthReport, ApiError> {
        let url = self.endpoint(&["api", "health"])?;
        self.execute(Method::GET, url, None, Some(self.settings.health_timeout))
            .await
    }
}

/// Validates a backend base URL.
pub fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| ApiError::new(FailureKind::InvalidUrl, format!("{raw}: {err}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::new(
            FailureKind::InvalidUrl,
            format!("{raw}: expected an http(s) base url"),
        ));
    }
    Ok(url)
}

fn action_segment(request: &ApiRequest) -> &'static str {
    match request {
        ApiRequest::Approve { .. } => "approve",
        ApiRequest::ApproveVideo { .. } => "approve-video",
        ApiRequest::Reject { .. } => "reject",
        ApiRequest::Regenerate {
            kind: PostKind::Text,
            ..
        } => "regenerate-text",
        ApiRequest::Regenerate {
            kind: PostKind::Video,
            ..
        } => "regenerate-video",
        ApiRequest::GenerateVideo { .. } => "generate-video",
    }
}

fn request_body(request: &ApiRequest) -> Result<Option<Vec<u8>>, ApiError> {
    let value = match request {
        // The approve route requires a JSON object even when empty.
        ApiRequest::Approve { .. } => serde_json::json!({}),
        ApiRequest::Regenerate { options, .. } => serde_json::to_value(options)
            .map_err(|err| ApiError::new(FailureKind::Malformed, err.to_string()))?,
        ApiRequest::ApproveVideo { .. }
        | ApiRequest::Reject { .. }
        | ApiRequest::GenerateVideo { .. } => return Ok(None),
    };
    serde_json::to_vec(&value)
        .map(Some)
        .map_err(|err| ApiError::new(FailureKind::Malformed, err.to_string()))
}

/// Picks `detail`, then `message`, then the status line.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let from_body = serde_json::from_slice::<Value>(body).ok().and_then(|value| {
        ["detail", "message"]
            .into_iter()
            .find_map(|key| match value.get(key) {
                Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
                Some(Value::Null) | None => None,
                Some(Value::String(_)) => None,
                Some(other) => Some(other.to_string()),
            })
    });
    from_body.unwrap_or_else(|| status.to_string())
}

fn map_reqwest_error(base: &Url, err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(
            FailureKind::Timeout,
            format!("Backend at {base} did not answer in time"),
        );
    }
    ApiError::new(
        FailureKind::Network,
        format!("Cannot reach backend at {base}: {err}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail_then_message() {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(error_message(status, br#"{"detail": "locked"}"#), "locked");
        assert_eq!(
            error_message(status, br#"{"message": "nope", "detail": null}"#),
            "nope"
        );
        assert_eq!(
            error_message(status, b"<html>oops</html>"),
            "500 Internal Server Error"
        );
        assert_eq!(
            error_message(StatusCode::UNPROCESSABLE_ENTITY, br#"{"detail": [{"msg": "bad"}]}"#),
            r#"[{"msg":"bad"}]"#
        );
    }

    #[test]
    fn base_url_must_be_http() {
        assert!(parse_base_url("http://localhost:8000").is_ok());
        assert_eq!(
            parse_base_url("mailto:me@example.com").unwrap_err().kind,
            FailureKind::InvalidUrl
        );
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let api = ReqwestContentApi::new(ClientSettings {
            base_url: "http://example.com/backend/".into(),
            ..ClientSettings::default()
        })
        .unwrap();
        let url = api.endpoint(&["api", "content", "7", "approve"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/backend/api/content/7/approve");
    }
}
