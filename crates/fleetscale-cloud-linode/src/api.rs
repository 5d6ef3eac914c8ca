//! Linode API v4 client
//!
//! Bearer-token client covering the handful of endpoints the provider needs.

use crate::error::{LinodeError, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const LINODE_API_BASE: &str = "https://api.linode.com/v4";

/// Linode API client
pub struct LinodeApi {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

/// Authenticated user profile
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Instance as returned by the API
///
/// Fields the provider depends on are optional so that an incomplete
/// response can be reported instead of failing deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct LinodeInstance {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub ipv4: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Request body for `POST /linode/instances`
#[derive(Debug, Clone, Serialize)]
pub struct CreateInstanceBody {
    pub label: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub region: String,
    pub image: String,
    pub authorized_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_pass: Option<String>,
    pub booted: bool,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiErrors {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    reason: String,
    #[serde(default)]
    field: Option<String>,
}

/// Extract a readable message from an error response body
///
/// Linode reports failures as `{"errors": [{"reason": ..., "field": ...}]}`.
pub fn api_error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrors>(body)
        && !parsed.errors.is_empty()
    {
        return parsed
            .errors
            .iter()
            .map(|e| match &e.field {
                Some(field) => format!("{}: {}", field, e.reason),
                None => e.reason.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}

impl LinodeApi {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            base_url: LINODE_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return the body of a successful response
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(StatusCode, String)> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Linode API responded {}", status);
        Ok((status, body))
    }

    fn check(status: StatusCode, body: String) -> Result<String> {
        if status.is_success() {
            Ok(body)
        } else {
            Err(LinodeError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            })
        }
    }

    /// Fetch the profile of the token owner
    pub async fn profile(&self) -> Result<Profile> {
        let (status, body) = self.send(self.client.get(self.url("/profile"))).await?;
        let body = Self::check(status, body)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Create an instance
    pub async fn create_instance(&self, body: &CreateInstanceBody) -> Result<LinodeInstance> {
        tracing::debug!(
            "Creating Linode {} ({} in {})",
            body.label,
            body.instance_type,
            body.region
        );
        let (status, text) = self
            .send(self.client.post(self.url("/linode/instances")).json(body))
            .await?;
        let text = Self::check(status, text)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Look up an instance by its label
    pub async fn find_instance_by_label(&self, label: &str) -> Result<Option<LinodeInstance>> {
        let filter = serde_json::json!({ "label": label }).to_string();
        let (status, body) = self
            .send(
                self.client
                    .get(self.url("/linode/instances"))
                    .header("X-Filter", filter),
            )
            .await?;
        let body = Self::check(status, body)?;
        let page: Page<LinodeInstance> = serde_json::from_str(&body)?;
        Ok(page.data.into_iter().find(|i| i.label == label))
    }

    /// Delete an instance; returns `false` if it was already gone
    pub async fn delete_instance(&self, id: &str) -> Result<bool> {
        let (status, body) = self
            .send(
                self.client
                    .delete(self.url(&format!("/linode/instances/{}", id))),
            )
            .await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(status, body)?;
        Ok(true)
    }
}
