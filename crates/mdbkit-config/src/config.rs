use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Log verbosity level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Every frame and state change.
    Trace,
    /// Commands sent and frame sizes.
    Debug,
    /// Process lifecycle (default).
    #[default]
    Info,
    /// Halt notices and unclosed sessions.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Filter directive understood by `tracing-subscriber`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// How the debugger is launched and how its output is framed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebuggerConfig {
    /// Program to run; looked up on `PATH`.
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Extra arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Regex marking the end of every response.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Regex marking the acknowledgement that follows a halt notice.
    #[serde(default = "default_halted_pattern")]
    pub halted_pattern: String,
    /// Substring announcing that the target stopped on its own.
    #[serde(default = "default_halt_marker")]
    pub halt_marker: String,
    /// Substring that suppresses halt handling when present.
    #[serde(default = "default_quit_exclusion")]
    pub quit_exclusion: String,
    /// Default receive deadline in milliseconds; 0 waits forever.
    #[serde(default)]
    pub receive_timeout_ms: u64,
}

fn default_executable() -> String {
    "mdb".to_string()
}
fn default_prompt() -> String {
    "^>".to_string()
}
fn default_halted_pattern() -> String {
    "HALTED\\r?\\n".to_string()
}
fn default_halt_marker() -> String {
    "Stop at".to_string()
}
fn default_quit_exclusion() -> String {
    "quit".to_string()
}

impl DebuggerConfig {
    /// The receive deadline, or `None` for no limit.
    pub fn receive_timeout(&self) -> Option<Duration> {
        (self.receive_timeout_ms > 0).then(|| Duration::from_millis(self.receive_timeout_ms))
    }
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            args: Vec::new(),
            prompt: default_prompt(),
            halted_pattern: default_halted_pattern(),
            halt_marker: default_halt_marker(),
            quit_exclusion: default_quit_exclusion(),
            receive_timeout_ms: 0,
        }
    }
}

/// Logging settings.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level written.
    #[serde(default)]
    pub level: LogLevel,
    /// Log file; the platform default when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// `[debugger]`
    #[serde(default)]
    pub debugger: DebuggerConfig,
    /// `[log]`
    #[serde(default)]
    pub log: LogConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_mdb() {
        let cfg = Config::default();
        assert_eq!(cfg.debugger.executable, "mdb");
        assert!(cfg.debugger.args.is_empty());
        assert_eq!(cfg.debugger.prompt, "^>");
        assert_eq!(cfg.debugger.halted_pattern, "HALTED\\r?\\n");
        assert_eq!(cfg.debugger.halt_marker, "Stop at");
        assert_eq!(cfg.debugger.quit_exclusion, "quit");
        assert_eq!(cfg.debugger.receive_timeout(), None);
        assert_eq!(cfg.log.level, LogLevel::Info);
        assert!(cfg.log.file.is_none());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            "[debugger]\nexecutable = \"/opt/microchip/mdb.sh\"\nreceive_timeout_ms = 2500\n",
        )
        .unwrap();
        assert_eq!(cfg.debugger.executable, "/opt/microchip/mdb.sh");
        assert_eq!(cfg.debugger.prompt, "^>");
        assert_eq!(
            cfg.debugger.receive_timeout(),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn log_level_parses_snake_case() {
        let cfg: Config = toml::from_str("[log]\nlevel = \"debug\"\nfile = \"/tmp/m.log\"\n").unwrap();
        assert_eq!(cfg.log.level, LogLevel::Debug);
        assert_eq!(cfg.log.level.as_filter(), "debug");
        assert_eq!(cfg.log.file, Some(PathBuf::from("/tmp/m.log")));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let result: Result<Config, _> = toml::from_str("[log]\nlevel = \"loud\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let mut cfg = Config::default();
        cfg.debugger.args = vec!["--quiet".into()];
        let text = toml::to_string(&cfg).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
