/// Gateway settings
use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "FBM";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewaySettings {
    #[serde(default)]
    pub backend: BackendSettings,
}

/// Remote backend endpoint and credentials
#[derive(Clone, Deserialize, Serialize)]
pub struct BackendSettings {
    /// Project URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub api_url: String,

    /// Access key sent as `apikey` and bearer token
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_table")]
    pub table: String,
}

impl BackendSettings {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            table: default_table(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(GatewayError::Config(
                "Backend URL is required (set FBM_BACKEND__API_URL)".to_string(),
            ));
        }

        if self.api_key.trim().is_empty() {
            return Err(GatewayError::Config(
                "Backend access key is required (set FBM_BACKEND__API_KEY)".to_string(),
            ));
        }

        let url = self.api_url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(GatewayError::Config(format!(
                "Backend URL must start with http:// or https://, got {}",
                url
            )));
        }

        if self.table.trim().is_empty() {
            return Err(GatewayError::Config("Table name cannot be empty".to_string()));
        }

        Ok(())
    }
}

// The key is a credential.
impl fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSettings")
            .field("api_url", &self.api_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("table", &self.table)
            .finish()
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self::new(String::new(), String::new())
    }
}

fn default_table() -> String {
    "FBM_API".to_string()
}

impl GatewaySettings {
    /// Load configuration from file and environment
    ///
    /// Reads `path` if given (it must exist), otherwise `config.toml` in the
    /// working directory when present. Environment variables prefixed with
    /// `FBM_` override file values, with `__` between nested keys:
    /// `FBM_BACKEND__API_URL`, `FBM_BACKEND__API_KEY`, `FBM_BACKEND__TABLE`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, environment())
    }

    pub(crate) fn load_with(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        settings = settings.add_source(env);

        let config = settings.build()?;
        let loaded: GatewaySettings = config.try_deserialize()?;

        Ok(loaded)
    }

    /// Load and validate in one step.
    pub fn load_validated(path: Option<&Path>) -> Result<Self> {
        let settings = Self::load(path)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.backend.validate()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
