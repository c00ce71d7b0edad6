//! Centralized configuration for Vidloop.
//!
//! The base URL is baked in at build time from `VIDEO_BASE_URL`; everything
//! else has a default here and can be overridden from the environment.

use std::time::Duration;

use url::Url;

use crate::{Result, VidloopError};

/// Path requested relative to the base URL.
pub const VIDEO_ENDPOINT_PATH: &str = "video_url.json";

/// Base URL compiled into the binary.
pub const DEFAULT_BASE_URL: &str = match option_env!("VIDEO_BASE_URL") {
    Some(url) => url,
    None => "http://localhost:8080/",
};

/// Central configuration for all Vidloop components.
#[derive(Debug, Clone, Default)]
pub struct VidloopConfig {
    pub network: NetworkConfig,
    pub player: PlayerConfig,
}

/// Endpoint and HTTP client settings.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Base URL the endpoint path is joined onto
    pub base_url: String,
    /// Whole-request timeout for the fetch
    pub request_timeout: Duration,
    /// TCP connect timeout for the connectivity probe
    pub probe_timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
    /// Skip the connectivity probe before fetching
    pub skip_probe: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(3),
            user_agent: concat!("vidloop/", env!("CARGO_PKG_VERSION")),
            skip_probe: false,
        }
    }
}

impl NetworkConfig {
    /// Resolves the full endpoint URL.
    ///
    /// A base URL without a trailing slash is treated as a directory, so
    /// `http://host/api` resolves to `http://host/api/video_url.json`.
    ///
    /// # Errors
    /// - `VidloopError::Configuration` - Base URL does not parse or is not http(s)
    pub fn endpoint(&self) -> Result<Url> {
        let mut base = Url::parse(self.base_url.trim()).map_err(|e| {
            VidloopError::Configuration {
                reason: format!("invalid base URL '{}': {e}", self.base_url),
            }
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(VidloopError::Configuration {
                reason: format!("unsupported URL scheme '{}'", base.scheme()),
            });
        }

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        base.join(VIDEO_ENDPOINT_PATH)
            .map_err(|e| VidloopError::Configuration {
                reason: format!("cannot build endpoint URL: {e}"),
            })
    }
}

/// External player settings.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Player executable
    pub command: String,
    /// Extra arguments passed before the media URL
    pub extra_args: Vec<String>,
    /// How long to wait for the player's IPC socket to appear
    pub ipc_connect_timeout: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: "mpv".to_string(),
            extra_args: Vec::new(),
            ipc_connect_timeout: Duration::from_secs(5),
        }
    }
}

impl VidloopConfig {
    /// Creates configuration with environment variable overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Applies overrides from any key/value lookup.
    ///
    /// Unparseable values are ignored and the current setting is kept.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup("VIDLOOP_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.network.base_url = base_url;
            }
        }

        if let Some(timeout) = lookup("VIDLOOP_REQUEST_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                self.network.request_timeout = Duration::from_secs(seconds);
            }
        }

        if let Some(skip) = lookup("VIDLOOP_SKIP_PROBE") {
            if let Ok(skip) = skip.parse::<bool>() {
                self.network.skip_probe = skip;
            }
        }

        if let Some(command) = lookup("VIDLOOP_PLAYER") {
            if !command.trim().is_empty() {
                self.player.command = command;
            }
        }
    }

    /// Checks that the configuration can be used to build the pipeline.
    ///
    /// # Errors
    /// - `VidloopError::Configuration` - Invalid base URL or empty player command
    pub fn validate(&self) -> Result<()> {
        self.network.endpoint()?;

        if self.player.command.trim().is_empty() {
            return Err(VidloopError::Configuration {
                reason: "player command is empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn network(base_url: &str) -> NetworkConfig {
        NetworkConfig {
            base_url: base_url.to_string(),
            ..NetworkConfig::default()
        }
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let url = network("https://cdn.example.com/videos/").endpoint().unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/videos/video_url.json");
    }

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let url = network("http://127.0.0.1:9000/api").endpoint().unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/api/video_url.json");

        let url = network("http://127.0.0.1:9000").endpoint().unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/video_url.json");
    }

    #[test]
    fn test_endpoint_rejects_bad_urls() {
        assert!(network("not a url").endpoint().is_err());
        assert!(network("ftp://files.example.com/").endpoint().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("VIDLOOP_BASE_URL", "https://override.test/"),
            ("VIDLOOP_REQUEST_TIMEOUT", "5"),
            ("VIDLOOP_SKIP_PROBE", "true"),
            ("VIDLOOP_PLAYER", "vlc"),
        ]);

        let mut config = VidloopConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.network.base_url, "https://override.test/");
        assert_eq!(config.network.request_timeout, Duration::from_secs(5));
        assert!(config.network.skip_probe);
        assert_eq!(config.player.command, "vlc");
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = VidloopConfig::default();
        config.apply_overrides(|key| match key {
            "VIDLOOP_REQUEST_TIMEOUT" => Some("soon".to_string()),
            "VIDLOOP_SKIP_PROBE" => Some("maybe".to_string()),
            _ => None,
        });

        assert_eq!(config.network.request_timeout, Duration::from_secs(30));
        assert!(!config.network.skip_probe);
    }

    #[test]
    fn test_validate() {
        let mut config = VidloopConfig::default();
        config.network.base_url = "http://localhost:8080/".to_string();
        assert!(config.validate().is_ok());

        config.player.command = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
