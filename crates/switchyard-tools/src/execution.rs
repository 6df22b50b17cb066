//! Versioned execution contract for HTTP tools
//!
//! Stored configs arrive as JSON; [`ExecutionConfig::parse`] validates
//! every block up front so the sandbox only ever sees a well-formed,
//! typed config.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use switchyard_core::{Error, Result};
use url::Url;

use crate::sandbox::egress;

pub const CONFIG_VERSION: u64 = 1;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MAX_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the outbound body is built from the call arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyConfig {
    None,
    /// All arguments, verbatim
    FullArgs,
    /// Output key to input key
    JsonMap(IndexMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub method: HttpMethod,
    /// URL template with `{placeholder}` path segments
    pub url: String,
    /// Placeholder to input key
    pub path_params: IndexMap<String, String>,
    /// Query parameter to input key
    pub query_params: IndexMap<String, String>,
    pub headers: IndexMap<String, String>,
    pub body: BodyConfig,
    pub timeout_ms: u64,
}

/// Authentication scheme; every field is a secret reference unless noted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    None,
    Bearer {
        secret_ref: String,
    },
    ApiKeyHeader {
        secret_ref: String,
        header_name: String,
    },
    ApiKeyQuery {
        secret_ref: String,
        query_param: String,
    },
    Basic {
        username_secret_ref: String,
        password_secret_ref: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Json,
    Text,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseConfig {
    pub mode: ResponseMode,
    /// Dotted path such as `data.items.0.id`
    pub extract_path: Option<String>,
    pub success_status_codes: Vec<u16>,
    pub max_response_bytes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Lower-cased host patterns; `*.suffix` wildcards allowed
    pub allowed_hosts: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    pub request: RequestConfig,
    pub auth: AuthConfig,
    pub response: ResponseConfig,
    pub security: SecurityConfig,
}

impl ExecutionConfig {
    /// Validate a stored JSON config
    ///
    /// Absent blocks or fields are `MissingParameter`; present but
    /// malformed values are `InvalidParameter`.
    pub fn parse(value: &Value) -> Result<Self> {
        let config = value
            .as_object()
            .ok_or_else(|| invalid("execution_config must be an object"))?;

        match config.get("version") {
            None | Some(Value::Null) => return Err(missing("execution_config.version")),
            Some(version) if version.as_u64() == Some(CONFIG_VERSION) => {}
            Some(version) => return Err(invalid(format!("unsupported execution_config.version {version}"))),
        }

        let request = block(config, "request")?.ok_or_else(|| missing("execution_config.request"))?;

        Ok(Self {
            request: parse_request(request)?,
            auth: block(config, "auth")?.map_or(Ok(AuthConfig::None), parse_auth)?,
            response: parse_response(block(config, "response")?)?,
            security: parse_security(block(config, "security")?)?,
        })
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidParameter(message.into())
}

fn missing(message: impl Into<String>) -> Error {
    Error::MissingParameter(message.into())
}

/// Optional nested object; `null` counts as absent
fn block<'a>(parent: &'a Map<String, Value>, key: &str) -> Result<Option<&'a Map<String, Value>>> {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(invalid(format!("{key} must be an object"))),
    }
}

fn required_str(parent: &Map<String, Value>, key: &str, path: &str) -> Result<String> {
    match parent.get(key) {
        None | Some(Value::Null) => Err(missing(format!("{path}.{key}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Err(missing(format!("{path}.{key}"))),
        Some(Value::String(s)) => Ok(s.trim().to_owned()),
        Some(_) => Err(invalid(format!("{path}.{key} must be a string"))),
    }
}

fn string_map(parent: &Map<String, Value>, key: &str, path: &str) -> Result<IndexMap<String, String>> {
    let Some(map) = block(parent, key).map_err(|_| invalid(format!("{path}.{key} must be an object")))? else {
        return Ok(IndexMap::new());
    };

    map.iter()
        .map(|(k, v)| match v {
            Value::String(s) => Ok((k.clone(), s.clone())),
            _ => Err(invalid(format!("{path}.{key}.{k} must be a string"))),
        })
        .collect()
}

fn parse_request(request: &Map<String, Value>) -> Result<RequestConfig> {
    let method_name = required_str(request, "method", "request")?;
    let method =
        HttpMethod::parse(&method_name).ok_or_else(|| invalid(format!("HTTP method '{method_name}' is not supported")))?;

    let url = required_str(request, "url", "request")?;
    let parsed = Url::parse(&url).map_err(|_| invalid("HTTP tools require an absolute HTTPS URL"))?;
    if parsed.scheme() != "https" || parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("HTTP tools require an absolute HTTPS URL"));
    }
    if let Some(host) = parsed.host().filter(|host| !egress::is_public_literal(host)) {
        return Err(invalid(format!("HTTP tool target host '{host}' is not allowed")));
    }

    let timeout_ms = match request.get("timeout_ms") {
        None | Some(Value::Null) => DEFAULT_TIMEOUT_MS,
        Some(value) => value
            .as_u64()
            .filter(|ms| (1..=MAX_TIMEOUT_MS).contains(ms))
            .ok_or_else(|| invalid(format!("request.timeout_ms must be between 1 and {MAX_TIMEOUT_MS}")))?,
    };

    Ok(RequestConfig {
        method,
        url,
        path_params: string_map(request, "path_params", "request")?,
        query_params: string_map(request, "query_params", "request")?,
        headers: string_map(request, "headers", "request")?,
        body: parse_body(block(request, "body")?)?,
        timeout_ms,
    })
}

fn parse_body(body: Option<&Map<String, Value>>) -> Result<BodyConfig> {
    let Some(body) = body else {
        return Ok(BodyConfig::None);
    };

    let mode = match body.get("mode") {
        None | Some(Value::Null) => "none".to_owned(),
        Some(Value::String(mode)) => mode.trim().to_ascii_lowercase(),
        Some(_) => return Err(invalid("request.body.mode must be a string")),
    };

    match mode.as_str() {
        "none" => Ok(BodyConfig::None),
        "full_args" => Ok(BodyConfig::FullArgs),
        "json_map" => {
            if matches!(body.get("json_map"), None | Some(Value::Null)) {
                return Err(missing("request.body.json_map"));
            }
            Ok(BodyConfig::JsonMap(string_map(body, "json_map", "request.body")?))
        }
        other => Err(invalid(format!("Invalid request body mode '{other}'"))),
    }
}

fn parse_auth(auth: &Map<String, Value>) -> Result<AuthConfig> {
    let auth_type = match auth.get("type") {
        None | Some(Value::Null) => "none".to_owned(),
        Some(Value::String(t)) => t.trim().to_ascii_lowercase(),
        Some(_) => return Err(invalid("auth.type must be a string")),
    };

    match auth_type.as_str() {
        "none" => Ok(AuthConfig::None),
        "bearer" => Ok(AuthConfig::Bearer {
            secret_ref: required_str(auth, "secret_ref", "auth")?,
        }),
        "api_key_header" => Ok(AuthConfig::ApiKeyHeader {
            secret_ref: required_str(auth, "secret_ref", "auth")?,
            header_name: required_str(auth, "header_name", "auth")?,
        }),
        "api_key_query" => Ok(AuthConfig::ApiKeyQuery {
            secret_ref: required_str(auth, "secret_ref", "auth")?,
            query_param: required_str(auth, "query_param", "auth")?,
        }),
        "basic" => Ok(AuthConfig::Basic {
            username_secret_ref: required_str(auth, "username_secret_ref", "auth")?,
            password_secret_ref: required_str(auth, "password_secret_ref", "auth")?,
        }),
        other => Err(invalid(format!("Unsupported auth type '{other}'"))),
    }
}

fn parse_response(response: Option<&Map<String, Value>>) -> Result<ResponseConfig> {
    let empty = Map::new();
    let response = response.unwrap_or(&empty);

    let mode = match response.get("mode") {
        None | Some(Value::Null) => ResponseMode::Json,
        Some(Value::String(mode)) => match mode.trim().to_ascii_lowercase().as_str() {
            "json" => ResponseMode::Json,
            "text" => ResponseMode::Text,
            "raw" => ResponseMode::Raw,
            other => return Err(invalid(format!("Unsupported response mode '{other}'"))),
        },
        Some(_) => return Err(invalid("response.mode must be a string")),
    };

    let extract_path = match response.get("extract_path") {
        None | Some(Value::Null) => None,
        Some(Value::String(path)) if path.trim().is_empty() => None,
        Some(Value::String(path)) => Some(path.trim().to_owned()),
        Some(_) => return Err(invalid("response.extract_path must be a string")),
    };

    let success_status_codes: Vec<u16> = match response.get("success_status_codes") {
        None | Some(Value::Null) => vec![200],
        Some(Value::Array(codes)) if !codes.is_empty() => codes
            .iter()
            .map(|code| {
                code.as_u64()
                    .filter(|c| (100..=599).contains(c))
                    .and_then(|c| u16::try_from(c).ok())
                    .ok_or_else(|| invalid(format!("invalid status code {code} in response.success_status_codes")))
            })
            .collect::<Result<_>>()?,
        Some(_) => return Err(invalid("response.success_status_codes must be a non-empty list of status codes")),
    };

    let max_response_bytes = match response.get("max_response_bytes") {
        None | Some(Value::Null) => DEFAULT_MAX_RESPONSE_BYTES,
        Some(value) => value
            .as_u64()
            .filter(|bytes| *bytes > 0)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or_else(|| invalid("response.max_response_bytes must be a positive integer"))?,
    };

    Ok(ResponseConfig {
        mode,
        extract_path,
        success_status_codes,
        max_response_bytes,
    })
}

fn parse_security(security: Option<&Map<String, Value>>) -> Result<SecurityConfig> {
    let Some(security) = security else {
        return Ok(SecurityConfig::default());
    };

    match security.get("allow_private_network") {
        None | Some(Value::Null | Value::Bool(false)) => {}
        Some(Value::Bool(true)) => return Err(invalid("security.allow_private_network is not permitted")),
        Some(_) => return Err(invalid("security.allow_private_network must be a boolean")),
    }

    let allowed_hosts = match security.get("allowed_hosts") {
        None | Some(Value::Null) => None,
        Some(value) => Some(normalize_allowed_hosts(value)?),
    };

    Ok(SecurityConfig { allowed_hosts })
}

/// Validate and lower-case a host allow-list
pub fn normalize_allowed_hosts(value: &Value) -> Result<Vec<String>> {
    let Value::Array(entries) = value else {
        return Err(invalid("allowed_hosts must be a list of host patterns"));
    };

    entries
        .iter()
        .map(|entry| match entry {
            Value::String(host) if !host.trim().is_empty() => Ok(host.trim().to_lowercase()),
            _ => Err(invalid("allowed_hosts must contain non-empty strings")),
        })
        .collect()
}
