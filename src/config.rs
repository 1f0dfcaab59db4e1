use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
  #[serde(default)]
  pub daemon: DaemonSettings,
  #[serde(default)]
  pub watcher: WatcherSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DaemonSettings {
  #[serde(default = "default_uri")]
  pub uri: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WatcherSettings {
  #[serde(default = "default_enabled")]
  pub enabled: bool,
  #[serde(default = "default_interval_secs")]
  pub interval_secs: u64,
  /// First height to report; the current tip when unset.
  #[serde(default)]
  pub start_height: Option<u64>,
}

fn default_uri() -> String {
  "http://127.0.0.1:18081".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_enabled() -> bool {
  true
}

fn default_interval_secs() -> u64 {
  10
}

impl Default for DaemonSettings {
  fn default() -> Self {
    Self {
      uri: default_uri(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl Default for WatcherSettings {
  fn default() -> Self {
    Self {
      enabled: default_enabled(),
      interval_secs: default_interval_secs(),
      start_height: None,
    }
  }
}

impl Settings {
  pub fn new() -> Result<Self, config::ConfigError> {
    let default_config_path = "./config.toml";
    let env_prefix = "XMR"; // e.g. XMR_DAEMON__URI=http://node:18081
    
    let builder = config::Config::builder()
      .add_source(config::File::with_name(default_config_path).required(false))
      .add_source(config::Environment::with_prefix(env_prefix).separator("__"));
    
    Self::from_config(builder.build()?)
  }

  fn from_config(source: config::Config) -> Result<Self, config::ConfigError> {
    let settings: Settings = source.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
  }

  /// Both durations must be non-zero.
  fn validate(&self) -> Result<(), config::ConfigError> {
    if self.daemon.timeout_secs == 0 {
      return Err(config::ConfigError::Message("daemon.timeout_secs must be at least 1".to_string()));
    }
    if self.watcher.interval_secs == 0 {
      return Err(config::ConfigError::Message("watcher.interval_secs must be at least 1".to_string()));
    }
    Ok(())
  }
}
