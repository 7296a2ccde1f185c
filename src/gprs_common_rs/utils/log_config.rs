use super::config_loader::LogConfig;
use crate::gprs_common_rs::packet::core::exceptions::ConfigError;
use chrono::Local;
use log::{Level, LevelFilter};
use std::io::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel { Off, Error, Warn, Info, Debug, Trace }
impl FromStr for LogLevel {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { match s.to_lowercase().as_str(){"off"=>Ok(LogLevel::Off),"error"=>Ok(LogLevel::Error),"warn"=>Ok(LogLevel::Warn),"info"=>Ok(LogLevel::Info),"debug"=>Ok(LogLevel::Debug),"trace"=>Ok(LogLevel::Trace),_=>Err(ConfigError::Invalid(format!("Invalid log level: {}", s)))} }
}
impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter { match self { LogLevel::Off=>LevelFilter::Off, LogLevel::Error=>LevelFilter::Error, LogLevel::Warn=>LevelFilter::Warn, LogLevel::Info=>LevelFilter::Info, LogLevel::Debug=>LevelFilter::Debug, LogLevel::Trace=>LevelFilter::Trace } }
}

/// 1行ログのフォーマッタ: `[時刻] [LEVEL] [module] message`
#[derive(Debug, Clone)]
pub struct UnifiedLogFormatter { include_timestamps: bool, color_enabled: bool }
impl UnifiedLogFormatter {
    pub fn new()->Self{ Self{ include_timestamps:true, color_enabled:true } }
    pub fn with_timestamps(mut self, en:bool)->Self{ self.include_timestamps=en; self }
    pub fn with_colors(mut self, en:bool)->Self{ self.color_enabled=en; self }
    pub fn format(&self, level: Level, module: &str, message: &str)->String{
        let mut parts=Vec::new();
        if self.include_timestamps { parts.push(format!("[{}]", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))); }
        let level_str = if self.color_enabled { match level { Level::Trace=>format!("\x1b[37m{}\x1b[0m", level), Level::Debug=>format!("\x1b[36m{}\x1b[0m", level), Level::Info=>format!("\x1b[32m{}\x1b[0m", level), Level::Warn=>format!("\x1b[33m{}\x1b[0m", level), Level::Error=>format!("\x1b[31m{}\x1b[0m", level) } } else { level.to_string() };
        parts.push(format!("[{}]", level_str));
        parts.push(format!("[{}]", module));
        parts.push(message.to_string());
        parts.join(" ")
    }
}
impl Default for UnifiedLogFormatter { fn default() -> Self { Self::new() } }

/// env_logger を設定に従って初期化する
///
/// RUST_LOG が設定されていればそちらのフィルタを優先する。既に初期化済みなら false。
pub fn init_logging(config: &LogConfig) -> Result<bool, ConfigError> {
    let level: LogLevel = config.level.parse()?;
    let formatter = UnifiedLogFormatter::new().with_timestamps(config.timestamps).with_colors(config.color);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.to_level_filter());
    if let Ok(filters) = std::env::var("RUST_LOG") { builder.parse_filters(&filters); }
    builder.format(move |buf, record| {
        writeln!(buf, "{}", formatter.format(record.level(), record.module_path().unwrap_or(record.target()), &record.args().to_string()))
    });
    Ok(builder.try_init().is_ok())
}
