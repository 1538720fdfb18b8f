// src/config.rs
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {field}: {value:?}")]
    Invalid { field: &'static str, value: String },
    #[error("reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One year. Longer schedules are rejected rather than handed to the timer.
pub const MAX_INTERVAL_HOURS: f64 = 24.0 * 365.0;

/// Parameters of one composition run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComposerConfig {
    #[serde(default = "d_min_tvl")]            pub min_tvl: f64,
    #[serde(default = "d_max_days")]           pub max_days_to_expiry: u32,
    #[serde(default = "d_max_components")]     pub max_components: usize,
    #[serde(default = "d_interval_hours")]     pub interval_hours: f64,
    #[serde(default)]                          pub dry_run: bool,
    #[serde(default = "d_protocol")]           pub protocol: String,
    #[serde(default = "d_page_size")]          pub page_size: u32,
}
fn d_min_tvl() -> f64 { 20_000.0 }
fn d_max_days() -> u32 { 7 }
fn d_max_components() -> usize { 5 }
fn d_interval_hours() -> f64 { 72.0 }
fn d_protocol() -> String { "polymarket".into() }
fn d_page_size() -> u32 { 100 }

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            min_tvl: d_min_tvl(),
            max_days_to_expiry: d_max_days(),
            max_components: d_max_components(),
            interval_hours: d_interval_hours(),
            dry_run: false,
            protocol: d_protocol(),
            page_size: d_page_size(),
        }
    }
}

impl ComposerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_tvl.is_finite() || self.min_tvl < 0.0 {
            return Err(invalid("min_tvl", self.min_tvl));
        }
        if self.max_components == 0 {
            return Err(invalid("max_components", self.max_components));
        }
        if self.page_size == 0 {
            return Err(invalid("page_size", self.page_size));
        }
        if !self.interval_hours.is_finite() || self.interval_hours > MAX_INTERVAL_HOURS {
            return Err(invalid("interval_hours", self.interval_hours));
        }
        if self.protocol.trim().is_empty() {
            return Err(ConfigError::Missing("protocol"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "d_base_url")]           pub base_url: String,
    #[serde(default = "d_timeout_ms")]         pub timeout_ms: u64,
    #[serde(default = "d_user_agent")]         pub user_agent: String,
}
fn d_base_url() -> String { "https://api.polynance.ag".into() }
fn d_timeout_ms() -> u64 { 10_000 }
fn d_user_agent() -> String { concat!("index-composer/", env!("CARGO_PKG_VERSION")).into() }

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { base_url: d_base_url(), timeout_ms: d_timeout_ms(), user_agent: d_user_agent() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]                          pub api_key: Option<String>,
    #[serde(default = "d_environment")]        pub environment: String,
    #[serde(default = "d_bind")]               pub bind: String,
}
fn d_environment() -> String { "development".into() }
fn d_bind() -> String { "127.0.0.1:8080".into() }

impl Default for AdminConfig {
    fn default() -> Self {
        Self { api_key: None, environment: d_environment(), bind: d_bind() }
    }
}

impl AdminConfig {
    /// Bearer auth on the manual trigger is only enforced in production.
    pub fn auth_required(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth_required() && self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Missing("ADMIN_API_KEY"));
        }
        if self.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(invalid("bind", &self.bind));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "d_level")]              pub level: String,
    #[serde(default = "d_format")]             pub format: String, // "compact" | "json"
}
fn d_level() -> String { "info".into() }
fn d_format() -> String { "compact".into() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: d_level(), format: d_format() }
    }
}

impl LoggingConfig {
    /// Install the global subscriber. `RUST_LOG` wins over the configured level.
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
        match self.format.as_str() {
            "json" => builder.json().init(),
            _ => builder.compact().init(),
        }
    }
}

/// Process-wide settings, built once at startup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]                          pub composer: ComposerConfig,
    #[serde(default)]                          pub provider: ProviderConfig,
    #[serde(default)]                          pub admin: AdminConfig,
    #[serde(default)]                          pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    /// Overlay variables from `lookup` on top of the current values.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let c = &mut self.composer;
        set_parsed(&lookup, "COMPOSER_MIN_TVL", "min_tvl", &mut c.min_tvl)?;
        set_parsed(
            &lookup,
            "COMPOSER_MAX_DAYS_TO_EXPIRY",
            "max_days_to_expiry",
            &mut c.max_days_to_expiry,
        )?;
        set_parsed(&lookup, "COMPOSER_MAX_COMPONENTS", "max_components", &mut c.max_components)?;
        set_parsed(&lookup, "COMPOSER_INTERVAL_HRS", "interval_hours", &mut c.interval_hours)?;
        set_parsed(&lookup, "COMPOSER_PAGE_SIZE", "page_size", &mut c.page_size)?;
        if let Some(v) = lookup("COMPOSER_PROTOCOL") { c.protocol = v; }

        let p = &mut self.provider;
        if let Some(v) = lookup("POLYNANCE_API_URL") { p.base_url = v; }
        set_parsed(&lookup, "POLYNANCE_TIMEOUT_MS", "timeout_ms", &mut p.timeout_ms)?;

        let a = &mut self.admin;
        if let Some(v) = lookup("ADMIN_API_KEY") { a.api_key = Some(v); }
        if let Some(v) = lookup("COMPOSER_ENV") { a.environment = v; }
        if let Some(v) = lookup("COMPOSER_BIND") { a.bind = v; }

        if let Some(v) = lookup("COMPOSER_LOG_LEVEL") { self.logging.level = v; }
        if let Some(v) = lookup("COMPOSER_LOG_FORMAT") { self.logging.format = v; }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.composer.validate()?;
        self.admin.validate()?;
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("POLYNANCE_API_URL"));
        }
        Ok(())
    }
}

#[inline]
pub fn ms(d: u64) -> Duration { Duration::from_millis(d) }

fn invalid(field: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid { field, value: value.to_string() }
}

fn set_parsed<F, T>(
    lookup: &F,
    key: &str,
    field: &'static str,
    slot: &mut T,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *slot = raw.trim().parse().map_err(|_| ConfigError::Invalid { field, value: raw.clone() })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = ComposerConfig::default();
        assert_eq!(c.min_tvl, 20_000.0);
        assert_eq!(c.max_days_to_expiry, 7);
        assert_eq!(c.max_components, 5);
        assert_eq!(c.interval_hours, 72.0);
        assert!(!c.dry_run);
        assert_eq!(c.page_size, 100);
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn env_overrides_defaults() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[
            ("COMPOSER_MIN_TVL", "5000"),
            ("COMPOSER_MAX_DAYS_TO_EXPIRY", "14"),
            ("COMPOSER_MAX_COMPONENTS", "3"),
            ("COMPOSER_INTERVAL_HRS", "0.5"),
        ]))
        .unwrap();
        assert_eq!(cfg.composer.min_tvl, 5000.0);
        assert_eq!(cfg.composer.max_days_to_expiry, 14);
        assert_eq!(cfg.composer.max_components, 3);
        assert_eq!(cfg.composer.interval_hours, 0.5);
    }

    #[test]
    fn malformed_env_value_is_rejected() {
        let mut cfg = AppConfig::default();
        let err = cfg.apply_env(env(&[("COMPOSER_MAX_COMPONENTS", "five")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_components", .. }));
    }

    #[test]
    fn zero_components_fails_validation() {
        let mut cfg = AppConfig::default();
        cfg.composer.max_components = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "max_components", .. })
        ));
    }

    #[test]
    fn interval_hours_is_bounded() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("COMPOSER_INTERVAL_HRS", "1e300")])).unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "interval_hours", .. })
        ));

        cfg.composer.interval_hours = MAX_INTERVAL_HOURS;
        assert!(cfg.validate().is_ok());
        cfg.composer.interval_hours = 0.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn production_requires_admin_key() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("COMPOSER_ENV", "production")])).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing("ADMIN_API_KEY"))));

        cfg.apply_env(env(&[("ADMIN_API_KEY", "s3cret")])).unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn toml_layer_fills_unset_fields_with_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [composer]
            min_tvl = 1000.0
            max_components = 2

            [admin]
            bind = "0.0.0.0:9000"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.composer.min_tvl, 1000.0);
        assert_eq!(cfg.composer.max_components, 2);
        assert_eq!(cfg.composer.max_days_to_expiry, 7);
        assert_eq!(cfg.admin.bind, "0.0.0.0:9000");
        assert_eq!(cfg.provider, ProviderConfig::default());
    }
}
