pub mod db;
pub mod password;
pub mod token;

use crate::config::AppConfig;

/// Environment-driven config, validated the same way the server does at startup.
pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env();
    config.validate()?;
    Ok(config)
}
