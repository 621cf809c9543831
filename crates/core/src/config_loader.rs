use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from built-in defaults, the TOML file at `path`
    /// (if present), and `APP_`-prefixed environment variables, in that order.
    ///
    /// Nested keys use a double underscore, e.g. `APP_MONITOR__POLL_INTERVAL_SECS`.
    ///
    /// # Errors
    ///
    /// Returns an error if a source exists but cannot be parsed.
    pub fn load(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Self::base(path).extract()?;
        tracing::debug!(path, "Loaded configuration");
        Ok(config)
    }

    /// Same as [`ConfigLoader::load`], with `Config.{profile}.toml` from the
    /// same directory layered over the base file.
    ///
    /// # Errors
    ///
    /// Returns an error if a source exists but cannot be parsed.
    pub fn load_with_profile(path: &str, profile: &str) -> Result<AppConfig> {
        let profile_path = std::path::Path::new(path)
            .with_file_name(format!("Config.{profile}.toml"));

        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Toml::file(profile_path))
            .merge(Env::prefixed("APP_").split("__"))
            .extract()?;

        tracing::debug!(path, profile, "Loaded configuration");
        Ok(config)
    }

    fn base(path: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("APP_").split("__"))
    }
}
