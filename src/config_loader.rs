use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use tracing::error;

use crate::config::{EcosystemConfig, FirebaseConfig};
use crate::errors::{ConfigError, ConfigResult};

pub const DEFAULT_CONFIG_FILE: &str = "ecosystem.toml";

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "ECOSYSTEM_CONFIG";

const LOG_LEVELS: [&str; 6] = ["DEBUG", "INFO", "WARNING", "WARN", "ERROR", "CRITICAL"];

/// Load configuration from defaults, the config file, then the environment
pub fn load_config() -> ConfigResult<EcosystemConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
    load_config_from(path)
}

/// Same as [`load_config`] with an explicit config file. A missing file is
/// not an error; its layer is simply empty.
pub fn load_config_from<P: AsRef<Path>>(path: P) -> ConfigResult<EcosystemConfig> {
    let figment = Figment::from(Serialized::defaults(EcosystemConfig::default()))
        .merge(Toml::file(path.as_ref()))
        .merge(
            Env::raw()
                .only(&[
                    "trading_mode",
                    "exchange_name",
                    "log_level",
                    "log_file",
                    "remote_timeout_secs",
                ])
                .map(|key| {
                    if key.as_str().eq_ignore_ascii_case("trading_mode") {
                        "mode".into()
                    } else {
                        key.into()
                    }
                }),
        )
        .merge(Env::prefixed("FIREBASE_").map(|key| format!("firebase.{key}").into()));

    let mut config: EcosystemConfig = figment.extract()?;
    config.firebase = extract_firebase(&figment);
    validate(&config)?;

    Ok(config)
}

/// Credential problems never fail startup; they leave the store unconfigured.
fn extract_firebase(figment: &Figment) -> FirebaseConfig {
    match figment.extract_inner::<FirebaseConfig>("firebase") {
        Ok(mut firebase) => {
            firebase.normalize_private_key();
            firebase
        }
        Err(e) => {
            error!("Invalid Firebase configuration, running in local mode: {}", e);
            FirebaseConfig::default()
        }
    }
}

fn validate(config: &EcosystemConfig) -> ConfigResult<()> {
    if config.exchange_name.trim().is_empty() {
        return Err(ConfigError::invalid("exchange_name", "must not be empty"));
    }

    let level = config.log_level.trim().to_uppercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::invalid(
            "log_level",
            format!("unknown level '{}'", config.log_level),
        ));
    }

    if config.remote_timeout_secs == 0 {
        return Err(ConfigError::invalid("remote_timeout_secs", "must be at least 1"));
    }

    Ok(())
}
