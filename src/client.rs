//! Typed access to the registry's command endpoints.
//!
//! Every call issues exactly one request and blocks until the full response
//! is read. Requests go through a [`Transport`], which owns authentication
//! and the wire; [`HttpTransport`] is the production implementation.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{ClientConfig, ResolvedConfig, HTTP_TIMEOUT};
use crate::error::{ClientError, ConfigError, TransportError};
use crate::types::Command;

/// Status and body of a registry response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Body as text, for error reports.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends an authenticated request to a path under the application root.
///
/// `path` starts with `/` and is relative to `{api_root}/applications/{id}`.
/// Any failure to obtain a complete response, timeouts included, is a
/// `TransportError`; HTTP error statuses are not.
pub trait Transport {
    fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, TransportError>;
}

/// Blocking HTTP transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    config: ResolvedConfig,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns `ConfigError::HttpClient` if the HTTP client cannot be built.
    pub fn new(config: ResolvedConfig) -> Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::HttpClient {
                message: e.to_string(),
            })?;
        Ok(Self { client, config })
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, TransportError> {
        let url = format!("{}{}", self.config.application_url(), path);

        let mut request = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, &self.config.authorization)
            .header(USER_AGENT, &self.config.user_agent)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();

        Ok(RawResponse { status, body })
    }
}

/// Client for one application's commands, global or guild-scoped.
pub struct RegistryClient<T = HttpTransport> {
    transport: T,
}

impl RegistryClient<HttpTransport> {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is incomplete or
    /// contradictory.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let resolved = config.resolve()?;
        for warning in config.warnings() {
            tracing::warn!("{warning}");
        }
        Ok(Self::with_transport(HttpTransport::new(resolved)?))
    }
}

impl<T: Transport> RegistryClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// List all commands in a scope. `guild_id` of `None` (or empty) means global.
    ///
    /// # Errors
    ///
    /// `Transport` on network failure, `Api` on any status but 200, `Decode`
    /// if the body is not a JSON array of commands.
    pub fn list(&self, guild_id: Option<&str>) -> Result<Vec<Command>, ClientError> {
        let path = collection_path(guild_id);
        let response = self.call(Method::GET, &path, None)?;
        expect_status(Method::GET, &path, &response, &[200])?;
        decode(&path, &response)
    }

    /// Fetch one command by id.
    ///
    /// # Errors
    ///
    /// Same as [`RegistryClient::list`], decoding a single command.
    pub fn get(&self, guild_id: Option<&str>, command_id: &str) -> Result<Command, ClientError> {
        let path = item_path(guild_id, command_id);
        let response = self.call(Method::GET, &path, None)?;
        expect_status(Method::GET, &path, &response, &[200])?;
        decode(&path, &response)
    }

    /// Create a command, or update the existing command with the same name.
    ///
    /// Always a POST to the collection; the registry matches on name.
    ///
    /// # Errors
    ///
    /// `Api` on any status but 200 or 201; otherwise as [`RegistryClient::list`].
    pub fn upsert(&self, guild_id: Option<&str>, command: &Command) -> Result<Command, ClientError> {
        let path = collection_path(guild_id);
        let body = serde_json::to_vec(command).map_err(|source| ClientError::Encode {
            path: path.clone(),
            source,
        })?;
        let response = self.call(Method::POST, &path, Some(body))?;
        expect_status(Method::POST, &path, &response, &[200, 201])?;
        decode(&path, &response)
    }

    /// Delete a command by id.
    ///
    /// # Errors
    ///
    /// `Api` on any status but 204, including 200 and 404.
    pub fn delete(&self, guild_id: Option<&str>, command_id: &str) -> Result<(), ClientError> {
        let path = item_path(guild_id, command_id);
        let response = self.call(Method::DELETE, &path, None)?;
        expect_status(Method::DELETE, &path, &response, &[204])
    }

    fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, ClientError> {
        debug!(%method, path, "registry request");
        let response = self
            .transport
            .send(method.clone(), path, body)
            .map_err(|source| ClientError::Transport {
                method: method.to_string(),
                path: path.to_string(),
                source,
            })?;
        debug!(%method, path, status = response.status, "registry response");
        Ok(response)
    }
}

/// `/commands`, or `/guilds/{id}/commands` for a guild scope.
pub fn collection_path(guild_id: Option<&str>) -> String {
    match guild_id.filter(|g| !g.is_empty()) {
        Some(guild_id) => format!("/guilds/{guild_id}/commands"),
        None => "/commands".to_string(),
    }
}

pub fn item_path(guild_id: Option<&str>, command_id: &str) -> String {
    format!("{}/{}", collection_path(guild_id), command_id)
}

fn expect_status(
    method: Method,
    path: &str,
    response: &RawResponse,
    accepted: &[u16],
) -> Result<(), ClientError> {
    if accepted.contains(&response.status) {
        Ok(())
    } else {
        Err(ClientError::Api {
            method: method.to_string(),
            path: path.to_string(),
            status: response.status,
            body: response.body_text(),
        })
    }
}

fn decode<D: DeserializeOwned>(path: &str, response: &RawResponse) -> Result<D, ClientError> {
    serde_json::from_slice(&response.body).map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
}
