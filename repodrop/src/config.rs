//! Application configuration management.
//!
//! Configuration is loaded from an optional YAML file with environment variable overrides. The
//! configuration file path defaults to `config.yaml` but can be specified via `-f` flag or
//! `REPODROP_CONFIG` environment variable. A missing file is not an error: a serverless-style
//! deployment usually configures everything through the environment.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `REPODROP_` override YAML values
//! 3. **GitHub variables** - `GITHUB_TOKEN`, `GITHUB_OWNER`, `GITHUB_REPO`, `GITHUB_BRANCH` and
//!    `BASE_URL` override everything else
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `REPODROP_GITHUB__API_URL=http://localhost:9000` sets the `github.api_url` field.
//!
//! ## Missing credentials
//!
//! The token, owner, repository and public base URL are required to serve uploads, but their
//! absence does not fail [`Config::load`]. The server starts anyway and answers every upload with
//! a server configuration error until it is redeployed with the missing values; see
//! [`Config::upload_target`].
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! GITHUB_TOKEN=ghp_xxx
//! GITHUB_OWNER=octocat
//! GITHUB_REPO=cdn
//! GITHUB_BRANCH=assets          # optional, defaults to main
//! BASE_URL=https://cdn.example.com
//!
//! # Server and upload options
//! REPODROP_PORT=8080
//! REPODROP_UPLOAD__MAX_FILE_SIZE=10485760
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::content_store::RepoTarget;
use crate::errors::Error;

/// Environment variables read without the `REPODROP_` prefix, mapped onto `github.*`.
const GITHUB_ENV_VARS: &[&str] = &["GITHUB_TOKEN", "GITHUB_OWNER", "GITHUB_REPO", "GITHUB_BRANCH"];

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "REPODROP_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Public base URL that serves the repository contents (e.g., "https://cdn.example.com").
    /// Download links are built as `{base_url}/{generated name}`.
    pub base_url: Option<String>,
    /// Target repository and API settings
    pub github: GithubConfig,
    /// Multipart handling options
    pub upload: UploadConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// GitHub contents API settings.
///
/// `Debug` masks the token so the config can be logged at startup.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubConfig {
    /// Personal access token sent as `Authorization: token ...`
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Repository owner (user or organisation). Also used as the `User-Agent`.
    pub owner: Option<String>,
    /// Repository name
    pub repo: Option<String>,
    /// Branch the upload commits land on
    pub branch: String,
    /// Base URL of the GitHub REST API. Overridden for GitHub Enterprise or tests.
    pub api_url: String,
    /// Timeout for the commit request
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            owner: None,
            repo: None,
            branch: "main".to_string(),
            api_url: "https://api.github.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Multipart upload options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Multipart field that carries the file
    pub field_name: String,
    /// Optional cap on the buffered file size in bytes. Unset means unbounded.
    pub max_file_size: Option<u64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            field_name: "files[]".to_string(),
            max_file_size: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            base_url: None,
            github: GithubConfig::default(),
            upload: UploadConfig::default(),
            enable_otel_export: false,
        }
    }
}

/// Everything a single upload needs to reach its destination, resolved from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub repo: RepoTarget,
    pub base_url: String,
}

impl UploadTarget {
    /// Public download URL for a stored file
    pub fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.strip_suffix('/').unwrap_or(&self.base_url), name)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from the config file and environment.
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Structural validation. Missing credentials are deliberately not checked here.
    pub fn validate(&self) -> Result<(), Error> {
        if self.upload.field_name.is_empty() {
            return Err(Error::InvalidConfiguration {
                message: "upload.field_name must not be empty".to_string(),
            });
        }

        match Url::parse(&self.github.api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => {}
            Ok(_) => {
                return Err(Error::InvalidConfiguration {
                    message: format!("github.api_url must be an http(s) URL, got '{}'", self.github.api_url),
                });
            }
            Err(e) => {
                return Err(Error::InvalidConfiguration {
                    message: format!("github.api_url '{}' is not a valid URL: {}", self.github.api_url, e),
                });
            }
        }

        if self.upload.max_file_size == Some(0) {
            return Err(Error::InvalidConfiguration {
                message: "upload.max_file_size must be greater than zero when set".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // REPODROP_CONFIG names the file itself, not a setting
            .merge(Env::prefixed("REPODROP_").ignore(&["config"]).split("__"))
            // Plain GITHUB_* variables land under the github section
            .merge(
                Env::raw()
                    .only(GITHUB_ENV_VARS)
                    .map(|key| format!("github.{}", key.as_str()["GITHUB_".len()..].to_ascii_lowercase()).into()),
            )
            .merge(Env::raw().only(&["BASE_URL"]))
    }

    /// Names of the required settings that are absent or blank.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if non_empty(&self.github.token).is_none() {
            missing.push("GITHUB_TOKEN");
        }
        if non_empty(&self.github.owner).is_none() {
            missing.push("GITHUB_OWNER");
        }
        if non_empty(&self.github.repo).is_none() {
            missing.push("GITHUB_REPO");
        }
        if non_empty(&self.base_url).is_none() {
            missing.push("BASE_URL");
        }
        missing
    }

    /// Resolve the upload destination, failing if any required setting is missing.
    pub fn upload_target(&self) -> Result<UploadTarget, Error> {
        match (
            non_empty(&self.github.token),
            non_empty(&self.github.owner),
            non_empty(&self.github.repo),
            non_empty(&self.base_url),
        ) {
            (Some(token), Some(owner), Some(repo), Some(base_url)) => Ok(UploadTarget {
                repo: RepoTarget {
                    token: token.to_string(),
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    branch: self.github.branch.clone(),
                },
                base_url: base_url.to_string(),
            }),
            _ => Err(Error::MissingConfiguration {
                missing: self.missing_settings(),
            }),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = Config::load(&args("does-not-exist.yaml"))?;

            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.port, 3000);
            assert_eq!(config.github.branch, "main");
            assert_eq!(config.github.api_url, "https://api.github.com");
            assert_eq!(config.github.timeout, Duration::from_secs(30));
            assert_eq!(config.upload.field_name, "files[]");
            assert_eq!(config.upload.max_file_size, None);
            assert!(config.base_url.is_none());

            Ok(())
        });
    }

    #[test]
    fn test_github_env_vars() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("GITHUB_TOKEN", "ghp_test");
            jail.set_env("GITHUB_OWNER", "octocat");
            jail.set_env("GITHUB_REPO", "cdn");
            jail.set_env("BASE_URL", "https://cdn.example.com");

            let config = Config::load(&args("config.yaml"))?;

            assert_eq!(config.github.token.as_deref(), Some("ghp_test"));
            assert_eq!(config.github.owner.as_deref(), Some("octocat"));
            assert_eq!(config.github.repo.as_deref(), Some("cdn"));
            assert_eq!(config.base_url.as_deref(), Some("https://cdn.example.com"));
            // Branch not set, default applies
            assert_eq!(config.github.branch, "main");
            assert!(config.missing_settings().is_empty());

            Ok(())
        });
    }

    #[test]
    fn test_github_branch_env_var() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("GITHUB_BRANCH", "assets");

            let config = Config::load(&args("config.yaml"))?;
            assert_eq!(config.github.branch, "assets");

            Ok(())
        });
    }

    #[test]
    fn test_yaml_with_env_override() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "test.yaml",
                r#"
port: 8080
base_url: https://files.example.org
github:
  owner: yaml-owner
  repo: yaml-repo
  timeout: 5s
upload:
  max_file_size: 1048576
"#,
            )?;

            jail.set_env("REPODROP_HOST", "127.0.0.1");
            jail.set_env("REPODROP_GITHUB__API_URL", "http://localhost:9000");
            jail.set_env("GITHUB_OWNER", "env-owner");

            let config = Config::load(&args("test.yaml"))?;

            // Env vars should override
            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.github.api_url, "http://localhost:9000");
            assert_eq!(config.github.owner.as_deref(), Some("env-owner"));

            // YAML values should be preserved
            assert_eq!(config.port, 8080);
            assert_eq!(config.github.repo.as_deref(), Some("yaml-repo"));
            assert_eq!(config.github.timeout, Duration::from_secs(5));
            assert_eq!(config.upload.max_file_size, Some(1_048_576));
            assert_eq!(config.base_url.as_deref(), Some("https://files.example.org"));

            Ok(())
        });
    }

    #[test]
    fn test_unknown_field_rejected() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("test.yaml", "github:\n  ownr: typo\n")?;

            assert!(Config::load(&args("test.yaml")).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let mut config = Config::default();
        config.github.api_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration { .. })));

        config.github.api_url = "ftp://example.com".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_empty_field_name_rejected() {
        let mut config = Config::default();
        config.upload.field_name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_file_size_rejected() {
        let mut config = Config::default();
        config.upload.max_file_size = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_credentials_do_not_fail_load() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = Config::load(&args("config.yaml"))?;
            assert_eq!(
                config.missing_settings(),
                vec!["GITHUB_TOKEN", "GITHUB_OWNER", "GITHUB_REPO", "BASE_URL"]
            );
            assert!(matches!(config.upload_target(), Err(Error::MissingConfiguration { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut config = Config::default();
        config.github.token = Some("token".to_string());
        config.github.owner = Some("owner".to_string());
        config.github.repo = Some("  ".to_string());
        config.base_url = Some("https://cdn.example.com".to_string());

        assert_eq!(config.missing_settings(), vec!["GITHUB_REPO"]);
        assert!(config.upload_target().is_err());
    }

    #[test]
    fn test_upload_target_and_public_url() {
        let mut config = Config::default();
        config.github.token = Some("token".to_string());
        config.github.owner = Some("owner".to_string());
        config.github.repo = Some("repo".to_string());
        config.github.branch = "assets".to_string();
        config.base_url = Some("https://cdn.example.com/".to_string());

        let target = config.upload_target().unwrap();
        assert_eq!(target.repo.owner, "owner");
        assert_eq!(target.repo.repo, "repo");
        assert_eq!(target.repo.branch, "assets");
        // A single trailing slash on the base URL is not doubled
        assert_eq!(target.public_url("ab3f9.png"), "https://cdn.example.com/ab3f9.png");
    }

    #[test]
    fn test_github_debug_masks_token() {
        let mut config = Config::default();
        config.github.token = Some("ghp_secret".to_string());
        config.github.owner = Some("octocat".to_string());

        let printed = format!("{config:?}");
        assert!(!printed.contains("ghp_secret"), "{printed}");
        assert!(printed.contains("***"));
        assert!(printed.contains("octocat"));
    }

    #[test]
    fn test_bind_address() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }
}
