//! Shared HTTP client, error taxonomy, and the single transport entry point.

use std::fmt::{self, Display, Formatter};

use amrest_config::{ConfigError, Settings};
use anyhow::anyhow;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::exit::{self, EXIT_USAGE, Outcome};
use crate::request::ResourceRequest;
use crate::tree::FilterPathError;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

/// Errors that end an invocation without a normal result.
///
/// A 4xx response is not represented here: its decoded body is the result
/// of the invocation and only the exit code reflects the failure.
#[derive(Debug)]
pub(crate) enum CliError {
    /// Login was rejected or did not yield a session token.
    Authentication {
        status: Option<u16>,
        body: Option<Value>,
        reason: String,
    },
    /// No response was obtained (connection refused, DNS failure, timeout).
    Transport { url: String, source: reqwest::Error },
    /// The server answered with a 5xx status; the body is never parsed.
    Server { status: u16, body: String },
    /// A body that had to be JSON was not.
    Decode { context: &'static str, detail: String },
    /// The requested output path does not exist in the result.
    FilterPath(FilterPathError),
    /// Arguments or payload were unusable; nothing was sent.
    Validation(String),
    /// Settings could not be resolved.
    Config(ConfigError),
    /// Local plumbing failed (stdin, client construction, prompts).
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) fn decode(context: &'static str, detail: impl Display) -> Self {
        Self::Decode {
            context,
            detail: detail.to_string(),
        }
    }

    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            Self::Authentication {
                status: Some(status),
                ..
            } if *status >= 400 => exit::exit_code(Outcome::Response(*status)),
            Self::Server { status, .. } => exit::exit_code(Outcome::Response(*status)),
            Self::Transport { .. } => exit::exit_code(Outcome::TransportFailure),
            Self::Validation(_) | Self::Config(_) => EXIT_USAGE,
            Self::Authentication { .. }
            | Self::Decode { .. }
            | Self::FilterPath(_)
            | Self::Failure(_) => 1,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Authentication { status, reason, .. } => status.map_or_else(
                || format!("authentication failed: {reason}"),
                |status| format!("authentication failed: {reason} (status {status})"),
            ),
            Self::Transport { url, source } => format!("opening URL failed: {url}: {source}"),
            Self::Server { status, body } if body.is_empty() => {
                format!("HTTP server error (status {status})")
            }
            Self::Server { status, body } => format!("HTTP server error (status {status}): {body}"),
            Self::Decode { context, detail } => format!("failed to decode {context}: {detail}"),
            Self::FilterPath(err) => format!("JSON filter failed: {err}"),
            Self::Validation(message) => message.clone(),
            Self::Config(err) => err.to_string(),
            Self::Failure(err) => format!("{err:#}"),
        }
    }

    /// Body that should still be printed even though the invocation failed.
    pub(crate) const fn printable_body(&self) -> Option<&Value> {
        match self {
            Self::Authentication { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<FilterPathError> for CliError {
    fn from(err: FilterPathError) -> Self {
        Self::FilterPath(err)
    }
}

/// HTTP client configured from resolved settings.
#[derive(Clone)]
pub(crate) struct CliDependencies {
    pub(crate) client: Client,
}

impl CliDependencies {
    /// Build the client used for every request of this invocation.
    pub(crate) fn from_settings(settings: &Settings, trace_id: &str) -> CliResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        if settings.accept_invalid_certs {
            debug!("TLS certificate verification disabled");
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .default_headers(default_headers)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        Ok(Self { client })
    }
}

/// Status and body of a response below 500.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub(crate) status: u16,
    pub(crate) body: Vec<u8>,
}

/// Send one request. Transport failures and 5xx statuses become errors; every
/// other status is handed back for normalization.
pub(crate) async fn send(client: &Client, request: &ResourceRequest) -> CliResult<RawResponse> {
    debug!(method = %request.method, url = %request.url, "sending request");

    let mut builder = client
        .request(request.method.clone(), request.url.clone())
        .headers(request.headers.clone());
    if let Some(body) = &request.body {
        builder = builder.body(body.to_string());
    }

    let transport_error = |source| CliError::Transport {
        url: request.url.to_string(),
        source,
    };
    let response = builder.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;
    debug!(status = status.as_u16(), bytes = body.len(), "received response");

    if status.is_server_error() || status.as_u16() >= 600 {
        return Err(CliError::Server {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).trim().to_string(),
        });
    }

    Ok(RawResponse {
        status: status.as_u16(),
        body: body.to_vec(),
    })
}

pub(crate) const fn is_client_error(status: u16) -> bool {
    status >= StatusCode::BAD_REQUEST.as_u16()
}
