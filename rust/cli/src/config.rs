use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Directory holding one persisted shard file per user.
    pub store_dir: String,
    /// Default user for commands invoked without --user.
    pub user: Option<String>,
    /// Statistics cache time-to-live in seconds.
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigSources {
    pub store_dir: ValueSource,
    pub user: ValueSource,
    pub cache_ttl_secs: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            store_dir: ValueSource::Default,
            user: ValueSource::Default,
            cache_ttl_secs: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: Config,
    pub sources: ConfigSources,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: ".railbird".into(),
            user: None,
            cache_ttl_secs: 600,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub fn load() -> Result<Config, ConfigError> {
    load_with_sources().map(|resolved| resolved.config)
}

pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    let mut cfg = Config::default();
    let mut sources = ConfigSources::default();

    if let Ok(path) = std::env::var("RAILBIRD_CONFIG") {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.store_dir {
            cfg.store_dir = v;
            sources.store_dir = ValueSource::File;
        }
        if let Some(v) = f.user {
            cfg.user = Some(v);
            sources.user = ValueSource::File;
        }
        if let Some(v) = f.cache_ttl_secs {
            cfg.cache_ttl_secs = v;
            sources.cache_ttl_secs = ValueSource::File;
        }
    }

    if let Ok(dir) = std::env::var("RAILBIRD_STORE")
        && !dir.is_empty()
    {
        cfg.store_dir = dir;
        sources.store_dir = ValueSource::Env;
    }
    if let Ok(user) = std::env::var("RAILBIRD_USER")
        && !user.is_empty()
    {
        cfg.user = Some(user);
        sources.user = ValueSource::Env;
    }
    if let Ok(ttl) = std::env::var("RAILBIRD_CACHE_TTL")
        && !ttl.is_empty()
    {
        cfg.cache_ttl_secs = ttl
            .parse()
            .map_err(|_| ConfigError::Invalid("Invalid cache_ttl_secs".into()))?;
        sources.cache_ttl_secs = ValueSource::Env;
    }

    validate(&cfg)?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    store_dir: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    cache_ttl_secs: Option<u64>,
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.store_dir.is_empty() {
        return Err(ConfigError::Invalid(
            "Invalid configuration: store_dir must not be empty".into(),
        ));
    }
    if cfg.cache_ttl_secs == 0 {
        return Err(ConfigError::Invalid(
            "Invalid configuration: cache_ttl_secs must be >=1".into(),
        ));
    }
    Ok(())
}
