use crate::gprs_common_rs::packet::core::exceptions::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub timestamps: bool,
    pub color: bool,
}
impl Default for LogConfig {
    fn default() -> Self { Self { level: "info".into(), timestamps: true, color: true } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// 種別コードを読むヘッダ位置（バイト）
    pub classifier_offset: usize,
    /// デコード1回あたりの上限時間
    pub decode_timeout_ms: u64,
    /// バッチ処理の同時実行数
    pub max_concurrent: usize,
    /// 正規化済みパケットとフィールド記述子を debug ログに出す
    pub debug_packets: bool,
}
impl Default for DispatchConfig {
    fn default() -> Self { Self { classifier_offset: 0, decode_timeout_ms: 1000, max_concurrent: 16, debug_packets: false } }
}
impl DispatchConfig {
    pub fn decode_timeout(&self) -> Duration { Duration::from_millis(self.decode_timeout_ms) }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// 同梱スキーマの代わりに使うレイアウト JSON
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GprsConfig {
    pub logging: LogConfig,
    pub dispatch: DispatchConfig,
    pub schema: SchemaConfig,
}

pub struct ConfigLoader { config_paths: Vec<PathBuf>, env_prefix: String }
impl ConfigLoader {
    pub fn new() -> Self { Self { config_paths: vec![PathBuf::from("gprs.config.json"), PathBuf::from("gprs.config.toml")], env_prefix: "GPRS_".into() } }
    pub fn with_paths(paths: Vec<PathBuf>) -> Self { Self { config_paths: paths, env_prefix: "GPRS_".into() } }
    pub fn with_env_prefix(mut self, prefix: String) -> Self { self.env_prefix = prefix; self }

    /// 最初に見つかった設定ファイル → 環境変数の順で適用して検証する
    pub fn load(&self) -> Result<GprsConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    pub fn load_with<F: Fn(&str) -> Option<String>>(&self, lookup: F) -> Result<GprsConfig, ConfigError> {
        let mut config = GprsConfig::default();
        for path in &self.config_paths {
            if path.exists() {
                config = self.load_from_file(path)?;
                log::debug!("config loaded from {:?}", path);
                break;
            }
        }
        config = self.apply_overrides(config, lookup)?;
        self.validate_config(&config)?;
        Ok(config)
    }

    pub fn load_from_file(&self, path: &Path) -> Result<GprsConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(format!("{:?}: {}", path, e)))?;
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| ConfigError::Parse(format!("JSON: {}", e))),
            Some("toml") => toml::from_str(&content).map_err(|e| ConfigError::Parse(format!("TOML: {}", e))),
            _ => Err(ConfigError::Parse(format!("unsupported config file format: {:?}", path))),
        }
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(&self, mut config: GprsConfig, lookup: F) -> Result<GprsConfig, ConfigError> {
        let key = |name: &str| format!("{}{}", self.env_prefix, name);
        if let Some(level) = lookup(&key("LOG_LEVEL")) { config.logging.level = level; }
        if let Some(v) = lookup(&key("LOG_COLOR")) { config.logging.color = parse_env(&key("LOG_COLOR"), &v)?; }
        if let Some(v) = lookup(&key("CLASSIFIER_OFFSET")) { config.dispatch.classifier_offset = parse_env(&key("CLASSIFIER_OFFSET"), &v)?; }
        if let Some(v) = lookup(&key("DECODE_TIMEOUT_MS")) { config.dispatch.decode_timeout_ms = parse_env(&key("DECODE_TIMEOUT_MS"), &v)?; }
        if let Some(v) = lookup(&key("MAX_CONCURRENT")) { config.dispatch.max_concurrent = parse_env(&key("MAX_CONCURRENT"), &v)?; }
        if let Some(v) = lookup(&key("DEBUG_PACKETS")) { config.dispatch.debug_packets = parse_env(&key("DEBUG_PACKETS"), &v)?; }
        if let Some(path) = lookup(&key("SCHEMA_PATH")) { config.schema.path = Some(path); }
        Ok(config)
    }

    fn validate_config(&self, config: &GprsConfig) -> Result<(), ConfigError> {
        match config.logging.level.to_lowercase().as_str() { "trace"|"debug"|"info"|"warn"|"error"|"off" => {}, _ => return Err(ConfigError::Invalid("log level must be one of: trace, debug, info, warn, error, off".into())) }
        if config.dispatch.max_concurrent == 0 { return Err(ConfigError::Invalid("dispatch.max_concurrent must be greater than 0".into())); }
        if config.dispatch.decode_timeout_ms == 0 { return Err(ConfigError::Invalid("dispatch.decode_timeout_ms must be greater than 0".into())); }
        Ok(())
    }

    pub fn save_config(&self, config: &GprsConfig, path: &Path) -> Result<(), ConfigError> {
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse(e.to_string()))?,
            Some("toml") => toml::to_string_pretty(config).map_err(|e| ConfigError::Parse(e.to_string()))?,
            _ => return Err(ConfigError::Parse(format!("unsupported config file format: {:?}", path))),
        };
        fs::write(path, content).map_err(|e| ConfigError::Read(e.to_string()))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self { Self::new() }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnv { key: key.to_string(), value: value.to_string() })
}
