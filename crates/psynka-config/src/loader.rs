use std::path::Path;

use psynka_common::{Error, Result};
use tracing::{debug, info};

use crate::model::MigrateConfig;

/// Loads a `MigrateConfig` from disk and the environment.
///
/// File format is chosen by extension (`.yml`/`.yaml` or `.toml`). The
/// Supabase URL and service-role key can always be supplied or overridden
/// via `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY`, so the key never
/// has to be written into a file.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `path`, then apply env overrides and validate.
    pub fn load(path: &Path) -> Result<MigrateConfig> {
        let config = Self::load_unvalidated(path)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load without the URL/key validation, for paths that never touch
    /// the backend (dry runs).
    pub fn load_unvalidated(path: &Path) -> Result<MigrateConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let mut config: MigrateConfig = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error: {e}")))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("config loaded from {}", path.display());
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Build a config from defaults and the environment alone, for runs
    /// without a config file.
    pub fn from_env() -> Result<MigrateConfig> {
        let config = Self::from_env_unvalidated();
        Self::validate(&config)?;
        Ok(config)
    }

    /// Defaults plus env overrides, no validation.
    pub fn from_env_unvalidated() -> MigrateConfig {
        let mut config = MigrateConfig::default();
        Self::apply_env_overrides(&mut config);
        config
    }

    fn apply_env_overrides(config: &mut MigrateConfig) {
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            if !url.is_empty() {
                debug!("supabase url taken from SUPABASE_URL");
                config.supabase.url = url;
            }
        }
        if let Ok(key) = std::env::var("SUPABASE_SERVICE_ROLE_KEY") {
            if !key.is_empty() {
                debug!("service role key taken from SUPABASE_SERVICE_ROLE_KEY");
                config.supabase.service_role_key = key;
            }
        }
    }

    fn validate(config: &MigrateConfig) -> Result<()> {
        if config.supabase.url.is_empty() {
            return Err(Error::Config(
                "supabase url is not set (config file or SUPABASE_URL)".into(),
            ));
        }
        url::Url::parse(&config.supabase.url)
            .map_err(|e| Error::Config(format!("invalid supabase url: {e}")))?;
        if config.supabase.service_role_key.is_empty() {
            return Err(Error::Config(
                "service role key is not set (config file or SUPABASE_SERVICE_ROLE_KEY)".into(),
            ));
        }
        if config.supabase.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if config.migration.expected_tables.is_empty() {
            return Err(Error::Config("expected_tables must not be empty".into()));
        }
        Ok(())
    }
}
