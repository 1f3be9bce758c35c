//! Process logging for the share view.
//!
//! # Responsibility
//! - Start rolling file logs from [`ShareViewConfig`], once per process.
//! - Own the redaction helpers that request logging goes through.
//!
//! # Invariants
//! - Logging stays off unless `log_dir` is configured.
//! - Starting again with the same settings is a no-op; different settings are
//!   rejected.
//! - Starting logging never panics.
//! - Share tokens reach log lines only as [`RedactedToken`]; record contents
//!   never do.

use crate::config::ShareViewConfig;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const LOG_FILE_BASENAME: &str = "medshare";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 4 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;
const TOKEN_PREFIX_CHARS: usize = 4;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Level and directory the process logs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: &'static str,
    pub dir: PathBuf,
}

impl LogSettings {
    /// Resolves settings from config; `Ok(None)` when logging is off.
    pub fn from_config(config: &ShareViewConfig) -> Result<Option<Self>, LoggingError> {
        let Some(dir) = config.log_dir.as_ref() else {
            return Ok(None);
        };
        if !dir.is_absolute() {
            return Err(LoggingError::RelativeDir(dir.clone()));
        }
        let level = match config.log_level.as_deref() {
            Some(level) => parse_level(level)?,
            None => default_log_level(),
        };
        Ok(Some(Self {
            level,
            dir: dir.clone(),
        }))
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    RelativeDir(PathBuf),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    AlreadyActive {
        active: LogSettings,
        requested: LogSettings,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeDir(dir) => {
                write!(f, "log_dir must be an absolute path, got `{}`", dir.display())
            }
            Self::CreateDir { dir, source } => {
                write!(f, "failed to create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyActive { active, requested } => write!(
                f,
                "logging already active with level `{}` at `{}`; refusing level `{}` at `{}`",
                active.level,
                active.dir.display(),
                requested.level,
                requested.dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            Self::UnsupportedLevel(_) | Self::RelativeDir(_) | Self::AlreadyActive { .. } => None,
        }
    }
}

/// Starts process logging as configured.
///
/// Returns `Ok(false)` when `config` has no `log_dir`, `Ok(true)` once the
/// configured logger is active.
///
/// # Errors
/// - `UnsupportedLevel` / `RelativeDir` for settings that cannot be used.
/// - `CreateDir` / `Backend` when the log files cannot be set up.
/// - `AlreadyActive` when a logger with other settings is running.
pub fn init_logging(config: &ShareViewConfig) -> Result<bool, LoggingError> {
    let Some(settings) = LogSettings::from_config(config)? else {
        return Ok(false);
    };

    let active = ACTIVE_LOGGER.get_or_try_init(|| start_logger(&settings))?;
    if active.settings != settings {
        return Err(LoggingError::AlreadyActive {
            active: active.settings.clone(),
            requested: settings,
        });
    }
    Ok(true)
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

pub(crate) fn parse_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        _ => Err(LoggingError::UnsupportedLevel(level.trim().to_string())),
    }
}

/// Share token as it may appear in a log line: a short prefix, then `***`.
#[derive(Debug, Clone, Copy)]
pub struct RedactedToken<'a>(&'a str);

impl Display for RedactedToken<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for ch in self.0.chars().take(TOKEN_PREFIX_CHARS) {
            write!(f, "{ch}")?;
        }
        f.write_str("***")
    }
}

pub fn redact_token(token: &str) -> RedactedToken<'_> {
    RedactedToken(token)
}

fn start_logger(settings: &LogSettings) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|source| LoggingError::CreateDir {
        dir: settings.dir.clone(),
        source,
    })?;

    let handle = Logger::try_with_str(settings.level)
        .map_err(LoggingError::Backend)?
        .log_to_file(
            FileSpec::default()
                .directory(settings.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(LoggingError::Backend)?;

    install_panic_hook();

    info!(
        "event=logging_start module=logging status=ok level={} log_dir={} version={} platform={}",
        settings.level,
        settings.dir.display(),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    Ok(ActiveLogger {
        settings: settings.clone(),
        _handle: handle,
    })
}

// Runs once: `start_logger` only succeeds once per process.
fn install_panic_hook() {
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
            *message
        } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
            message.as_str()
        } else {
            "non-string panic payload"
        };
        error!(
            "event=panic_captured module=logging status=error location={} payload={}",
            location,
            one_line(payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

/// Flattens `value` to a single line of at most `max_chars` characters.
fn one_line(value: &str, max_chars: usize) -> String {
    let mut line: String = value
        .chars()
        .take(max_chars)
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
        .collect();
    if value.chars().nth(max_chars).is_some() {
        line.push_str("...");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::{
        init_logging, one_line, parse_level, redact_token, LogSettings, LoggingError,
    };
    use crate::config::ShareViewConfig;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_log_dir(suffix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "medshare-logging-{suffix}-{}-{nanos}",
            std::process::id()
        ))
    }

    fn config_with(level: Option<&str>, dir: Option<PathBuf>) -> ShareViewConfig {
        ShareViewConfig {
            log_level: level.map(str::to_string),
            log_dir: dir,
            ..ShareViewConfig::default()
        }
    }

    #[test]
    fn parse_level_accepts_aliases_and_rejects_unknown() {
        assert_eq!(parse_level("INFO").expect("INFO should parse"), "info");
        assert_eq!(parse_level(" warning ").expect("warning should parse"), "warn");
        let err = parse_level("verbose").expect_err("unknown level must fail");
        assert!(matches!(err, LoggingError::UnsupportedLevel(level) if level == "verbose"));
    }

    #[test]
    fn config_without_log_dir_leaves_logging_off() {
        let enabled = init_logging(&ShareViewConfig::default())
            .expect("missing log_dir is not an error");
        assert!(!enabled);
    }

    #[test]
    fn settings_resolve_default_level_and_reject_relative_dir() {
        let dir = unique_log_dir("settings");
        let settings = LogSettings::from_config(&config_with(None, Some(dir.clone())))
            .expect("absolute dir is accepted")
            .expect("log_dir turns logging on");
        assert_eq!(settings.level, super::default_log_level());
        assert_eq!(settings.dir, dir);

        let err = LogSettings::from_config(&config_with(None, Some(PathBuf::from("logs"))))
            .expect_err("relative dir must be rejected");
        assert!(matches!(err, LoggingError::RelativeDir(_)));
    }

    #[test]
    fn redacted_token_keeps_short_prefix_only() {
        assert_eq!(redact_token("abcdefgh").to_string(), "abcd***");
        assert_eq!(redact_token("ab").to_string(), "ab***");
    }

    #[test]
    fn one_line_flattens_and_caps_payload() {
        let line = one_line("line1\nline2\rline3", 8);
        assert_eq!(line, "line1 li...");
        assert_eq!(one_line("short", 8), "short");
    }

    // The only test that starts the process-wide logger.
    #[test]
    fn configured_logging_starts_once_and_rejects_other_settings() {
        let dir = unique_log_dir("active");
        let config = config_with(Some("Warning"), Some(dir.clone()));

        assert!(init_logging(&config).expect("first start should succeed"));
        assert!(dir.is_dir());
        assert!(init_logging(&config).expect("same settings should be a no-op"));

        let err = init_logging(&config_with(Some("debug"), Some(dir.clone())))
            .expect_err("level change must be rejected");
        assert!(matches!(
            err,
            LoggingError::AlreadyActive { ref active, .. } if active.level == "warn"
        ));

        let err = init_logging(&config_with(Some("warn"), Some(unique_log_dir("other"))))
            .expect_err("directory change must be rejected");
        assert!(err.to_string().contains("refusing"));
    }
}
