//! Composio REST client.

use super::{ConnectionRequest, ConnectionStatus, Integrations, ToolInvocation, ToolSpec};
use crate::config::IntegrationSettings;
use crate::error::{PokeError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Timeout for platform requests.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Client for the Composio v3 API.
pub struct ComposioClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    auth_config_id: Option<String>,
    tool_slugs: Vec<String>,
}

impl ComposioClient {
    /// Create a client using `COMPOSIO_API_KEY` from the environment.
    pub fn from_env(settings: &IntegrationSettings) -> Result<Self> {
        let api_key = std::env::var("COMPOSIO_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PokeError::Config("COMPOSIO_API_KEY not set".to_string()))?;
        Self::new(settings, api_key)
    }

    /// Create a client with an explicit API key.
    pub fn new(settings: &IntegrationSettings, api_key: String) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| PokeError::Config(format!("Invalid integration base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(PokeError::Config(format!(
                "Invalid integration base_url: {}",
                settings.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key,
            auth_config_id: settings.auth_config_id.clone(),
            tool_slugs: settings.tools.clone(),
        })
    }

    /// Build an API URL from path segments under the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v3"]).extend(segments);
        }
        url
    }

    async fn has_active_account(&self, user_id: &str) -> Result<bool> {
        let response = self
            .http
            .get(self.endpoint(&["connected_accounts"]))
            .header("x-api-key", &self.api_key)
            .query(&[("user_ids", user_id), ("statuses", "ACTIVE")])
            .send()
            .await?;
        let page: Page<AccountItem> = read_json(response, "list connected accounts").await?;
        Ok(page.items.iter().any(|a| a.status == ConnectionStatus::Active))
    }
}

#[async_trait]
impl Integrations for ComposioClient {
    #[instrument(skip(self))]
    async fn tools_for(&self, user_id: &str) -> Result<Vec<ToolSpec>> {
        if !self.has_active_account(user_id).await? {
            return Err(PokeError::NoLinkedAccount(user_id.to_string()));
        }
        if self.tool_slugs.is_empty() {
            return Ok(Vec::new());
        }

        let slugs = self.tool_slugs.join(",");
        let limit = self.tool_slugs.len().to_string();
        let response = self
            .http
            .get(self.endpoint(&["tools"]))
            .header("x-api-key", &self.api_key)
            .query(&[("tool_slugs", slugs.as_str()), ("limit", limit.as_str())])
            .send()
            .await?;
        let page: Page<ToolItem> = read_json(response, "list tools").await?;

        let tools: Vec<ToolSpec> = page.items.into_iter().map(ToolSpec::from).collect();
        debug!("Got {} tools for {}", tools.len(), user_id);
        Ok(tools)
    }

    #[instrument(skip(self, call), fields(tool = %call.name))]
    async fn execute_tool(&self, user_id: &str, call: &ToolInvocation) -> Result<String> {
        let arguments: serde_json::Value = if call.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.arguments)
                .map_err(|e| PokeError::InvalidInput(format!("Invalid tool arguments: {}", e)))?
        };

        let response = self
            .http
            .post(self.endpoint(&["tools", "execute", &call.name]))
            .header("x-api-key", &self.api_key)
            .json(&ExecuteRequest { user_id, arguments })
            .send()
            .await?;
        let result: ExecuteResponse = read_json(response, "execute tool").await?;
        result.into_output()
    }

    #[instrument(skip(self))]
    async fn initiate_connection(
        &self,
        user_id: &str,
        auth_config_id: Option<&str>,
    ) -> Result<ConnectionRequest> {
        let auth_config_id = auth_config_id
            .filter(|id| !id.is_empty())
            .or(self.auth_config_id.as_deref())
            .ok_or_else(|| PokeError::Config("No auth config id configured".to_string()))?;

        let body = serde_json::json!({
            "auth_config": { "id": auth_config_id },
            "connection": { "user_id": user_id },
        });

        let response = self
            .http
            .post(self.endpoint(&["connected_accounts"]))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let created: CreatedAccount = read_json(response, "initiate connection").await?;

        Ok(ConnectionRequest {
            connection_id: created.id,
            redirect_url: created.redirect_url,
        })
    }

    #[instrument(skip(self))]
    async fn connection_status(&self, connection_id: &str) -> Result<ConnectionStatus> {
        let response = self
            .http
            .get(self.endpoint(&["connected_accounts", connection_id]))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PokeError::ConnectionNotFound(connection_id.to_string()));
        }

        let account: AccountItem = read_json(response, "connection status").await?;
        Ok(account.status)
    }
}

/// Decode a JSON body, turning non-success statuses into errors.
async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("Integration {} failed with {}: {}", operation, status, body);
        return Err(PokeError::Integration(format!("{} returned {}", operation, status)));
    }
    Ok(response.json().await?)
}

// === Wire types ===

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct AccountItem {
    status: ConnectionStatus,
}

#[derive(Deserialize)]
struct CreatedAccount {
    id: String,
    #[serde(default, alias = "redirect_uri")]
    redirect_url: Option<String>,
}

#[derive(Deserialize)]
struct ToolItem {
    slug: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    input_parameters: Option<serde_json::Value>,
}

impl From<ToolItem> for ToolSpec {
    fn from(item: ToolItem) -> Self {
        ToolSpec {
            name: item.slug,
            description: item.description.unwrap_or_default(),
            parameters: item
                .input_parameters
                .unwrap_or_else(|| serde_json::json!({ "type": "object", "properties": {} })),
        }
    }
}

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    user_id: &'a str,
    arguments: serde_json::Value,
}

#[derive(Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    successful: bool,
    #[serde(default)]
    error: Option<String>,
}

impl ExecuteResponse {
    fn into_output(self) -> Result<String> {
        if !self.successful {
            return Err(PokeError::Integration(
                self.error.unwrap_or_else(|| "tool execution failed".to_string()),
            ));
        }
        Ok(match self.data {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str) -> IntegrationSettings {
        IntegrationSettings {
            base_url: base_url.to_string(),
            ..IntegrationSettings::default()
        }
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = ComposioClient::new(&settings("https://example.test"), "k".into()).unwrap();
        let url = client.endpoint(&["connected_accounts", "ca_123"]);
        assert_eq!(url.as_str(), "https://example.test/api/v3/connected_accounts/ca_123");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client =
            ComposioClient::new(&settings("https://example.test/proxy/"), "k".into()).unwrap();
        let url = client.endpoint(&["tools"]);
        assert_eq!(url.as_str(), "https://example.test/proxy/api/v3/tools");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = ComposioClient::new(&settings("not a url"), "k".into()).err().unwrap();
        assert!(matches!(err, PokeError::Config(_)));
    }

    #[test]
    fn test_tool_item_to_spec() {
        let page: Page<ToolItem> = serde_json::from_value(serde_json::json!({
            "items": [
                {
                    "slug": "GMAIL_GET_PROFILE",
                    "description": "Get the Gmail profile",
                    "input_parameters": { "type": "object", "properties": { "user_id": { "type": "string" } } }
                },
                { "slug": "COMPOSIO_SEARCH_SEARCH" }
            ]
        }))
        .unwrap();

        let specs: Vec<ToolSpec> = page.items.into_iter().map(ToolSpec::from).collect();
        assert_eq!(specs[0].name, "GMAIL_GET_PROFILE");
        assert_eq!(specs[0].parameters["properties"]["user_id"]["type"], "string");
        assert_eq!(specs[1].description, "");
        assert_eq!(specs[1].parameters["type"], "object");
    }

    #[test]
    fn test_execute_response_output() {
        let ok: ExecuteResponse = serde_json::from_value(serde_json::json!({
            "data": { "email": "a@b.dev" },
            "successful": true,
            "error": null
        }))
        .unwrap();
        assert_eq!(ok.into_output().unwrap(), r#"{"email":"a@b.dev"}"#);

        let failed: ExecuteResponse = serde_json::from_value(serde_json::json!({
            "data": {},
            "successful": false,
            "error": "rate limited"
        }))
        .unwrap();
        let err = failed.into_output().unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_created_account_accepts_redirect_alias() {
        let created: CreatedAccount =
            serde_json::from_str(r#"{"id": "ca_1", "redirect_uri": "https://auth.test/x"}"#).unwrap();
        assert_eq!(created.redirect_url.as_deref(), Some("https://auth.test/x"));
    }
}
