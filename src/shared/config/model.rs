use std::env;

use serde::Deserialize;

/// Tool settings, loadable from an optional TOML file. Every field has a
/// default so the tool runs without a config file; CLI flags override these
/// values, and the dispatcher receives its configuration explicitly rather
/// than through a process-global.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_stdout_level")]
    pub stdout_level: String,
    #[serde(default = "default_file_level")]
    pub file_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            stdout_level: default_stdout_level(),
            file_level: default_file_level(),
        }
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_stdout_level() -> String {
    "info".to_string()
}

fn default_file_level() -> String {
    "debug".to_string()
}

#[derive(Debug, Deserialize)]
pub struct MergeConfig {
    /// Target cumulative input size per merge group, in MB.
    #[serde(default = "default_target_size_mb")]
    pub target_size_mb: u64,
    /// Compression settings forced when inputs disagree.
    #[serde(default = "default_fallback_compression")]
    pub fallback_compression: u32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            target_size_mb: default_target_size_mb(),
            fallback_compression: default_fallback_compression(),
        }
    }
}

fn default_target_size_mb() -> u64 {
    4000
}

fn default_fallback_compression() -> u32 {
    crate::engine::store::format::FALLBACK_COMPRESSION
}

#[derive(Debug, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            concurrency: default_concurrency(),
            retries: default_retries(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_backend() -> String {
    "local".to_string()
}

fn default_concurrency() -> usize {
    10
}

fn default_retries() -> u32 {
    2
}

fn default_poll_interval_ms() -> u64 {
    200
}

/// Loads settings from `<name>.toml`. The path comes from, in order: the
/// explicit argument, the `TREEMERGE_CONFIG` environment variable, or
/// `treemerge`. A missing file yields the defaults.
pub fn load_settings(path: Option<&str>) -> Result<Settings, config::ConfigError> {
    let config_path = path
        .map(|p| p.to_string())
        .or_else(|| env::var("TREEMERGE_CONFIG").ok())
        .unwrap_or_else(|| "treemerge".to_string());

    let settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(&config_path).required(false))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
