//! Client configuration and credential resolution.

use std::time::Duration;

use crate::error::ConfigError;
use crate::validator::validate_snowflake;

/// Registry API root used when none is configured.
pub const DEFAULT_API_ROOT: &str = "https://discord.com/api/v9";

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "DiscordBot (https://crates.io/crates/discord-commands, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Per-request timeout for the HTTP transport.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings needed to talk to the registry.
///
/// Exactly one of `bot_token` and `client_credentials_token` must be set.
#[derive(Clone, Default)]
pub struct ClientConfig {
    pub application_id: String,
    pub bot_token: Option<String>,
    pub client_credentials_token: Option<String>,
    pub api_root: Option<String>,
    pub user_agent: Option<String>,
}

// Tokens stay out of debug output.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("application_id", &self.application_id)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field(
                "client_credentials_token",
                &self.client_credentials_token.as_ref().map(|_| "<redacted>"),
            )
            .field("api_root", &self.api_root)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Config authenticating as a bot, against the default API root.
    pub fn bot(application_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            bot_token: Some(token.into()),
            api_root: Some(DEFAULT_API_ROOT.to_string()),
            ..Self::default()
        }
    }

    /// Config authenticating with a client credentials grant, against the
    /// default API root. The grant must carry the
    /// `applications.commands.update` scope.
    pub fn client_credentials(application_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            client_credentials_token: Some(token.into()),
            api_root: Some(DEFAULT_API_ROOT.to_string()),
            ..Self::default()
        }
    }

    pub fn api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = Some(api_root.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Check every setting and produce the immutable form used by the client.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for missing or contradictory settings.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let authorization = self.auth_header()?;

        if self.application_id.is_empty() {
            return Err(ConfigError::MissingApplicationId);
        }
        if !validate_snowflake(&self.application_id, "application_id").is_ok() {
            return Err(ConfigError::InvalidApplicationId {
                value: self.application_id.clone(),
            });
        }

        let api_root = non_empty(&self.api_root).ok_or(ConfigError::MissingApiRoot)?;
        if api_root.ends_with('/') {
            return Err(ConfigError::TrailingSlash {
                value: api_root.to_string(),
            });
        }

        Ok(ResolvedConfig {
            application_id: self.application_id.clone(),
            authorization,
            api_root: api_root.to_string(),
            user_agent: non_empty(&self.user_agent)
                .unwrap_or(DEFAULT_USER_AGENT)
                .to_string(),
        })
    }

    /// Build the `authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` unless exactly one token is set.
    pub fn auth_header(&self) -> Result<String, ConfigError> {
        match (
            non_empty(&self.bot_token),
            non_empty(&self.client_credentials_token),
        ) {
            (Some(token), None) => Ok(format!("Bot {token}")),
            (None, Some(token)) => Ok(format!("Bearer {token}")),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingCredentials),
            (None, None) => Err(ConfigError::MissingCredentials),
        }
    }

    /// Non-fatal concerns about this configuration.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(root) = non_empty(&self.api_root) {
            if root != DEFAULT_API_ROOT {
                warnings.push(format!(
                    "api_root is not default ({root}), this is extremely unsupported behavior"
                ));
            }
        }
        warnings
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Validated configuration held by a [`crate::RegistryClient`].
#[derive(Clone)]
pub struct ResolvedConfig {
    pub application_id: String,
    pub(crate) authorization: String,
    pub api_root: String,
    pub user_agent: String,
}

impl ResolvedConfig {
    /// Base URL of the application's command collections.
    pub fn application_url(&self) -> String {
        format!("{}/applications/{}", self.api_root, self.application_id)
    }
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("application_id", &self.application_id)
            .field("authorization", &"<redacted>")
            .field("api_root", &self.api_root)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_token_header() {
        let config = ClientConfig::bot("42", "abc");
        assert_eq!(config.auth_header().unwrap(), "Bot abc");
    }

    #[test]
    fn client_credentials_header() {
        let config = ClientConfig::client_credentials("42", "xyz");
        assert_eq!(config.auth_header().unwrap(), "Bearer xyz");
    }

    #[test]
    fn missing_credentials() {
        let config = ClientConfig {
            application_id: "42".into(),
            api_root: Some(DEFAULT_API_ROOT.into()),
            ..ClientConfig::default()
        };
        assert_eq!(config.resolve().unwrap_err(), ConfigError::MissingCredentials);
    }

    #[test]
    fn empty_token_counts_as_missing() {
        let config = ClientConfig::bot("42", "");
        assert_eq!(config.resolve().unwrap_err(), ConfigError::MissingCredentials);
    }

    #[test]
    fn conflicting_credentials() {
        let mut config = ClientConfig::bot("42", "abc");
        config.client_credentials_token = Some("xyz".into());
        assert_eq!(
            config.resolve().unwrap_err(),
            ConfigError::ConflictingCredentials
        );
    }

    #[test]
    fn missing_application_id() {
        let config = ClientConfig::bot("", "abc");
        assert_eq!(
            config.resolve().unwrap_err(),
            ConfigError::MissingApplicationId
        );
    }

    #[test]
    fn non_snowflake_application_id() {
        let config = ClientConfig::bot("my-app", "abc");
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidApplicationId { .. })
        ));
    }

    #[test]
    fn missing_api_root() {
        let mut config = ClientConfig::bot("42", "abc");
        config.api_root = None;
        assert_eq!(config.resolve().unwrap_err(), ConfigError::MissingApiRoot);
    }

    #[test]
    fn api_root_trailing_slash() {
        let config = ClientConfig::bot("42", "abc").api_root("http://localhost:1234/");
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::TrailingSlash { .. })
        ));
    }

    #[test]
    fn defaults_user_agent() {
        let resolved = ClientConfig::bot("42", "abc").resolve().unwrap();
        assert_eq!(resolved.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(
            resolved.application_url(),
            "https://discord.com/api/v9/applications/42"
        );
    }

    #[test]
    fn custom_api_root_warns() {
        assert!(ClientConfig::bot("42", "abc").warnings().is_empty());

        let config = ClientConfig::bot("42", "abc").api_root("http://localhost:1234");
        assert_eq!(config.warnings().len(), 1);
    }

    #[test]
    fn debug_redacts_tokens() {
        let config = ClientConfig::bot("42", "super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));

        let resolved = config.resolve().unwrap();
        assert!(!format!("{resolved:?}").contains("super-secret"));
    }
}
