//! Sandboxed execution of HTTP tools
//!
//! Every call re-runs egress validation against the rendered URL, so a
//! config that was valid when stored cannot be steered at an internal
//! host through its arguments.

pub mod egress;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};
use switchyard_core::{ConfigurationProvider, Error, Result, SecretProvider};

pub use transport::{HostResolver, HttpTransport, OutboundRequest, OutboundResponse, ReqwestTransport, TokioResolver};

use crate::execution::{AuthConfig, BodyConfig, ExecutionConfig, ResponseMode, normalize_allowed_hosts};

pub struct HttpSandbox {
    transport: Arc<dyn HttpTransport>,
    resolver: Arc<dyn HostResolver>,
    secrets: Arc<dyn SecretProvider>,
    configuration: Arc<dyn ConfigurationProvider>,
}

impl HttpSandbox {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        resolver: Arc<dyn HostResolver>,
        secrets: Arc<dyn SecretProvider>,
        configuration: Arc<dyn ConfigurationProvider>,
    ) -> Self {
        Self {
            transport,
            resolver,
            secrets,
            configuration,
        }
    }

    /// Run one HTTP tool call
    ///
    /// Returns `{"status": "success", "http_status": <code>, "data": <value>}`.
    pub async fn execute(
        &self,
        company: &str,
        tool_name: &str,
        config: &ExecutionConfig,
        input: &Map<String, Value>,
    ) -> Result<Value> {
        let request = &config.request;

        let mut query = build_query(&request.query_params, input);
        let url = render_path(&request.url, &request.path_params, input)?;

        let allowed_hosts = self.allowed_hosts(company, config)?;
        let target = egress::validate_target(&url, &allowed_hosts, self.resolver.as_ref()).await?;

        let mut headers: Vec<(String, String)> =
            request.headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        self.apply_auth(company, &config.auth, &mut headers, &mut query)?;

        let json = build_body(&request.body, input)?;

        tracing::info!(company = %company, tool = %tool_name, method = %request.method, host = %target.host, "calling http tool");
        let response = self
            .transport
            .send(OutboundRequest {
                method: request.method,
                url,
                query,
                headers,
                json,
                timeout: Duration::from_millis(request.timeout_ms),
                max_body_bytes: config.response.max_response_bytes,
                resolved_addrs: target.addrs,
            })
            .await?;

        build_result(tool_name, config, response)
    }

    /// Tool allow-list if set, otherwise the company's
    fn allowed_hosts(&self, company: &str, config: &ExecutionConfig) -> Result<Vec<String>> {
        if let Some(hosts) = &config.security.allowed_hosts {
            return Ok(hosts.clone());
        }
        match self.configuration.http_allowed_hosts(company) {
            Some(hosts) => normalize_allowed_hosts(&Value::from(hosts)),
            None => Ok(Vec::new()),
        }
    }

    fn apply_auth(
        &self,
        company: &str,
        auth: &AuthConfig,
        headers: &mut Vec<(String, String)>,
        query: &mut Vec<(String, String)>,
    ) -> Result<()> {
        match auth {
            AuthConfig::None => {}
            AuthConfig::Bearer { secret_ref } => {
                let secret = self.secret(company, secret_ref)?;
                headers.push(("Authorization".to_owned(), format!("Bearer {secret}")));
            }
            AuthConfig::ApiKeyHeader {
                secret_ref,
                header_name,
            } => {
                let secret = self.secret(company, secret_ref)?;
                headers.push((header_name.clone(), secret));
            }
            AuthConfig::ApiKeyQuery {
                secret_ref,
                query_param,
            } => {
                let secret = self.secret(company, secret_ref)?;
                query.push((query_param.clone(), secret));
            }
            AuthConfig::Basic {
                username_secret_ref,
                password_secret_ref,
            } => {
                let username = self.secret(company, username_secret_ref)?;
                let password = self.secret(company, password_secret_ref)?;
                let token = STANDARD.encode(format!("{username}:{password}"));
                headers.push(("Authorization".to_owned(), format!("Basic {token}")));
            }
        }
        Ok(())
    }

    fn secret(&self, company: &str, reference: &str) -> Result<String> {
        if reference.trim().is_empty() {
            return Err(Error::InvalidParameter("Missing required auth secret reference".to_owned()));
        }
        self.secrets
            .get_secret(company, reference)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::ApiKey(format!("Secret '{reference}' not found")))
    }
}

/// Text form used in URLs: strings verbatim, everything else as JSON
fn url_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn build_query(query_params: &indexmap::IndexMap<String, String>, input: &Map<String, Value>) -> Vec<(String, String)> {
    query_params
        .iter()
        .filter_map(|(param, key)| match input.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some((param.clone(), url_text(value))),
        })
        .collect()
}

fn render_path(
    template: &str,
    path_params: &indexmap::IndexMap<String, String>,
    input: &Map<String, Value>,
) -> Result<String> {
    path_params.iter().try_fold(template.to_owned(), |url, (placeholder, key)| {
        let value = input
            .get(key)
            .ok_or_else(|| Error::MissingParameter(format!("Missing required path parameter '{key}'")))?;
        Ok(url.replace(&format!("{{{placeholder}}}"), &urlencoding::encode(&url_text(value))))
    })
}

fn build_body(body: &BodyConfig, input: &Map<String, Value>) -> Result<Option<Value>> {
    match body {
        BodyConfig::None => Ok(None),
        BodyConfig::FullArgs => Ok(Some(Value::Object(input.clone()))),
        BodyConfig::JsonMap(mapping) => {
            let payload = mapping
                .iter()
                .map(|(out_key, in_key)| {
                    input
                        .get(in_key)
                        .map(|value| (out_key.clone(), value.clone()))
                        .ok_or_else(|| Error::MissingParameter(format!("Missing required body parameter '{in_key}'")))
                })
                .collect::<Result<Map<String, Value>>>()?;
            Ok(Some(Value::Object(payload)))
        }
    }
}

fn build_result(tool_name: &str, config: &ExecutionConfig, response: OutboundResponse) -> Result<Value> {
    let response_cfg = &config.response;

    let data = match response_cfg.mode {
        ResponseMode::Raw => Value::String(response.body),
        ResponseMode::Json | ResponseMode::Text => {
            serde_json::from_str(&response.body).unwrap_or(Value::String(response.body))
        }
    };

    let size = serde_json::to_vec(&data).map_or(usize::MAX, |bytes| bytes.len());
    if size > response_cfg.max_response_bytes {
        return Err(Error::Request(format!("HTTP tool '{tool_name}' response too large")));
    }

    if !response_cfg.success_status_codes.contains(&response.status) {
        return Err(Error::Request(format!(
            "HTTP tool '{tool_name}' failed with status {}",
            response.status
        )));
    }

    let mut value = match &response_cfg.extract_path {
        Some(path) if response_cfg.mode != ResponseMode::Raw => extract_path(data, path)?,
        _ => data,
    };

    if response_cfg.mode == ResponseMode::Text && !value.is_string() {
        value = Value::String(value.to_string());
    }

    Ok(json!({
        "status": "success",
        "http_status": response.status,
        "data": value,
    }))
}

/// Walk a dotted path; list segments are integer indices
pub fn extract_path(data: Value, path: &str) -> Result<Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(data, |current, segment| match current {
            Value::Array(mut items) => {
                let index: usize = segment.parse().map_err(|_| {
                    Error::InvalidParameter(format!("Invalid extract_path segment '{segment}' for list"))
                })?;
                if index >= items.len() {
                    return Err(Error::InvalidParameter(format!("extract_path index '{index}' out of range")));
                }
                Ok(items.swap_remove(index))
            }
            Value::Object(mut map) => map
                .remove(segment)
                .ok_or_else(|| Error::InvalidParameter(format!("extract_path key '{segment}' not found in response"))),
            other => Err(Error::InvalidParameter(format!(
                "Cannot traverse extract_path over {}",
                json_type(&other)
            ))),
        })
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
