use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::portal::ProgressExtractor;

/// Environment variable holding the portal user identifier.
pub const USER_ID_VAR: &str = "ILIAD_USER_ID";
/// Environment variable holding the portal password.
pub const PASSWORD_VAR: &str = "ILIAD_PASSWORD";
/// Environment variable holding the monthly data allowance in GB.
pub const DATA_GB_VAR: &str = "ILIAD_DATA_GB";
/// Environment variable enabling debug diagnostics.
pub const DEBUG_VAR: &str = "DEBUG";

const DEFAULT_PORTAL_URL: &str = "https://www.iliad.it/account/";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn default_portal_url() -> String {
    DEFAULT_PORTAL_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_login_markers() -> Vec<String> {
    vec!["conso-progress".to_string(), "Consumi".to_string()]
}

fn default_progress_selectors() -> Vec<String> {
    ProgressExtractor::DEFAULT_SELECTORS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Errors raised while turning file and environment settings into a
/// [`ResolvedConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field} '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("ILIAD_DATA_GB must be a non-negative integer, got '{0}'")]
    InvalidDataAllowance(String),

    #[error("{0} must contain at least one entry")]
    EmptyList(&'static str),
}

/// Snapshot of the process environment.
///
/// Taken once at startup so the rest of the program never reads variables
/// ad hoc. Empty values are treated as unset.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Capture the current process environment. Variables that are not
    /// valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    /// Build an environment from explicit pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a variable, returning `None` for missing or empty values.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Whether `key` holds one of the truthy values `1`, `true` or `yes`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }
}

/// Portal endpoints and scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Page that serves the login form and accepts the credential POST.
    #[serde(default = "default_portal_url")]
    pub login_url: String,

    /// Page that shows the usage progress bar once logged in.
    ///
    /// Currently the same page as `login_url`, but kept separate in case the
    /// portal splits them.
    #[serde(default = "default_portal_url")]
    pub account_url: String,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Substrings whose presence in the login response marks a successful login.
    #[serde(default = "default_login_markers")]
    pub login_markers: Vec<String>,

    /// CSS selectors tried in order to locate the usage progress bar.
    #[serde(default = "default_progress_selectors")]
    pub progress_selectors: Vec<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_url: default_portal_url(),
            account_url: default_portal_url(),
            user_agent: default_user_agent(),
            login_markers: default_login_markers(),
            progress_selectors: default_progress_selectors(),
        }
    }
}

/// Application configuration as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Portal settings.
    pub portal: PortalConfig,

    /// Monthly data allowance in GB. Overridden by `ILIAD_DATA_GB`.
    pub data_gb: Option<u64>,

    /// Print form and response diagnostics. Also enabled by `DEBUG`.
    pub debug: bool,
}

impl Config {
    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load config from `path`, falling back to defaults when the file is
    /// missing. Other read errors are reported.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to read config file: {}", path.display())),
        }
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./iliad-usage.toml` if it exists in current directory
/// 2. `~/.config/iliad-usage/config.toml` (XDG config directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("iliad-usage.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("iliad-usage").join("config.toml");
    }

    local_config
}

/// Validated configuration with environment overrides applied.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub login_url: Url,
    pub account_url: Url,
    pub user_agent: String,
    pub login_markers: Vec<String>,
    pub progress_selectors: Vec<String>,
    /// Monthly allowance in GB; `None` means a percentage-only report.
    pub total_capacity_gb: Option<u64>,
    pub debug: bool,
}

impl ResolvedConfig {
    /// Merge file settings with the environment. Environment values win.
    pub fn resolve(config: Config, env: &Env) -> Result<Self, ConfigError> {
        let portal = config.portal;

        let login_url = parse_url("login_url", &portal.login_url)?;
        let account_url = parse_url("account_url", &portal.account_url)?;

        if portal.login_markers.is_empty() {
            return Err(ConfigError::EmptyList("login_markers"));
        }
        if portal.progress_selectors.is_empty() {
            return Err(ConfigError::EmptyList("progress_selectors"));
        }

        let total_capacity_gb = match env.get(DATA_GB_VAR) {
            Some(raw) => Some(parse_data_allowance(raw)?),
            None => config.data_gb,
        };

        Ok(Self {
            login_url,
            account_url,
            user_agent: portal.user_agent,
            login_markers: portal.login_markers,
            progress_selectors: portal.progress_selectors,
            total_capacity_gb,
            debug: config.debug || env.flag(DEBUG_VAR),
        })
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|err| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

fn parse_data_allowance(raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidDataAllowance(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_share_one_portal_url() -> anyhow::Result<()> {
        let resolved = ResolvedConfig::resolve(Config::default(), &Env::default())?;

        assert_eq!(resolved.login_url.as_str(), DEFAULT_PORTAL_URL);
        assert_eq!(resolved.account_url, resolved.login_url);
        assert_eq!(resolved.login_markers, vec!["conso-progress", "Consumi"]);
        assert_eq!(resolved.progress_selectors.len(), 2);
        assert_eq!(resolved.total_capacity_gb, None);
        assert!(!resolved.debug);
        Ok(())
    }

    #[test]
    fn test_env_data_allowance_overrides_file() -> anyhow::Result<()> {
        let config = Config {
            data_gb: Some(50),
            ..Config::default()
        };
        let env = Env::from_pairs([(DATA_GB_VAR, "150")]);

        let resolved = ResolvedConfig::resolve(config, &env)?;
        assert_eq!(resolved.total_capacity_gb, Some(150));
        Ok(())
    }

    #[test]
    fn test_empty_data_allowance_is_unset() -> anyhow::Result<()> {
        let env = Env::from_pairs([(DATA_GB_VAR, "")]);
        let resolved = ResolvedConfig::resolve(Config::default(), &env)?;
        assert_eq!(resolved.total_capacity_gb, None);
        Ok(())
    }

    #[test]
    fn test_invalid_data_allowance_is_rejected() {
        let env = Env::from_pairs([(DATA_GB_VAR, "lots")]);
        let err = ResolvedConfig::resolve(Config::default(), &env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDataAllowance(ref v) if v == "lots"));
    }

    #[test]
    fn test_debug_flag_values() {
        for value in ["1", "true", "TRUE", "Yes"] {
            assert!(Env::from_pairs([(DEBUG_VAR, value)]).flag(DEBUG_VAR), "{value}");
        }
        for value in ["0", "no", "on", ""] {
            assert!(!Env::from_pairs([(DEBUG_VAR, value)]).flag(DEBUG_VAR), "{value}");
        }
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let config = Config {
            portal: PortalConfig {
                account_url: "not a url".to_string(),
                ..PortalConfig::default()
            },
            ..Config::default()
        };

        let err = ResolvedConfig::resolve(config, &Env::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidUrl {
                field: "account_url",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_selector_list_is_rejected() {
        let config = Config {
            portal: PortalConfig {
                progress_selectors: Vec::new(),
                ..PortalConfig::default()
            },
            ..Config::default()
        };

        let err = ResolvedConfig::resolve(config, &Env::default()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyList("progress_selectors")));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("iliad-usage.toml");
        let mut file = std::fs::File::create(&path)?;
        writeln!(
            file,
            r#"
data_gb = 100

[portal]
account_url = "https://example.com/account/"
"#
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.data_gb, Some(100));
        assert_eq!(config.portal.account_url, "https://example.com/account/");
        assert_eq!(config.portal.login_url, DEFAULT_PORTAL_URL);
        assert_eq!(config.portal.user_agent, DEFAULT_USER_AGENT);
        assert!(!config.debug);
        Ok(())
    }

    #[test]
    fn test_from_toml_rejects_wrong_types() {
        assert!(Config::from_toml("data_gb = \"lots\"").is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let config = Config::load_or_default(&dir.path().join("missing.toml"))?;
        assert_eq!(config.data_gb, None);
        assert_eq!(config.portal.login_markers, default_login_markers());
        Ok(())
    }
}
