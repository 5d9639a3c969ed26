//! Run log for bosprobe
//!
//! Every run writes one log file, `bosprobe<YYYYmmddHHMMSS>_<NNNNN>.log`, in
//! the log directory. The file receives every entry and every raw block
//! (network tool output, the final report); the terminal receives the entries
//! at or above the configured level. When the file cannot be created the run
//! continues with everything going to stdout, and [`RunLog::persisted`]
//! reports that nothing was saved.

use crate::error::AppError;
use crate::models::ProbeConfig;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - detailed information for debugging
    Debug = 1,
    /// Info level - general application information
    Info = 2,
    /// Warning level - potentially harmful situations
    Warn = 3,
    /// Error level - error events but application can continue
    Error = 4,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",    // White
            LogLevel::Debug => "\x1b[36m",    // Cyan
            LogLevel::Info => "\x1b[32m",     // Green
            LogLevel::Warn => "\x1b[33m",     // Yellow
            LogLevel::Error => "\x1b[31m",    // Red
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }

    /// Terminal threshold for the configured verbosity
    pub fn for_config(config: &ProbeConfig) -> Self {
        if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp when log entry was created
    pub timestamp: DateTime<Utc>,
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Component that logged the entry
    pub logger: String,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
}

/// Shared logging context
#[derive(Debug, Default)]
struct LogContext {
    /// Correlation ID for the whole run
    session_id: Option<String>,
}

/// Dual-target run log: file plus terminal
pub struct RunLog {
    /// Minimum level echoed to the terminal
    min_level: LogLevel,
    use_color: bool,
    /// Terminal format; the file always gets the plain console format
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
}

impl RunLog {
    /// Create the run log file in `dir`. Never fails: without a file the log
    /// degrades to stdout.
    pub fn create(dir: &Path, config: &ProbeConfig) -> Self {
        let path = dir.join(Self::file_name(Local::now(), random_suffix()));
        let file = File::create(&path).ok();
        let path = file.as_ref().map(|_| path);
        Self::build(config, file, path)
    }

    /// A log that never touches the filesystem
    pub fn terminal_only(config: &ProbeConfig) -> Self {
        Self::build(config, None, None)
    }

    fn build(config: &ProbeConfig, file: Option<File>, path: Option<PathBuf>) -> Self {
        let session_id = Uuid::new_v4().to_string();
        Self {
            min_level: LogLevel::for_config(config),
            use_color: config.enable_color,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name: crate::PKG_NAME.to_string(),
            context: Arc::new(RwLock::new(LogContext {
                session_id: Some(session_id),
            })),
            file: file.map(Mutex::new),
            path,
        }
    }

    /// `bosprobe<YYYYmmddHHMMSS>_<suffix>.log`
    pub fn file_name(now: DateTime<Local>, suffix: u32) -> String {
        format!("{}{}_{:05}.log", crate::PKG_NAME, now.format("%Y%m%d%H%M%S"), suffix)
    }

    /// Whether output is being saved to a file
    pub fn persisted(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn session_id(&self) -> Option<String> {
        self.context.read().await.session_id.clone()
    }

    /// Header with version, platform and the sanitized command line
    pub async fn write_basic_info(&self, command_line: &str) {
        let session = self.session_id().await.unwrap_or_default();
        let mut header = String::new();
        let now = Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z");
        header.push_str(&format!("Time:         {}\n", now));
        header.push_str(&format!("Version:      {} {}\n", crate::PKG_NAME, crate::VERSION));
        if let Some(built) = option_env!("BUILD_TIME") {
            header.push_str(&format!("Built:        {}\n", built));
        }
        if let Some(commit) = option_env!("GIT_COMMIT") {
            header.push_str(&format!("Commit:       {}\n", commit));
        }
        header.push_str(&format!(
            "Platform:     {}/{} ({})\n",
            std::env::consts::OS,
            std::env::consts::ARCH,
            option_env!("TARGET_TRIPLE").unwrap_or("unknown")
        ));
        header.push_str(&format!("Session:      {}\n", session));
        header.push_str(&format!("Command line: {}", command_line));

        self.block(LogLevel::Debug, "basic info", &header).await;
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    /// Convenience methods for different log levels
    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    /// Check if a log level would reach the terminal
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Raw multi-line block, e.g. tool output
    pub async fn block(&self, level: LogLevel, title: &str, body: &str) {
        let text = format!(
            "----- {} [{}] -----\n{}\n",
            title,
            Local::now().format("%H:%M:%S%.3f"),
            body.trim_end()
        );
        self.write_file(&text);
        if !self.persisted() || self.would_log(level) {
            let _ = write!(io::stdout(), "{}", text);
        }
    }

    /// Text that always reaches both the file and stdout
    pub async fn print(&self, text: &str) {
        self.write_file(text);
        let mut stdout = io::stdout();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    /// Like [`RunLog::print`], with a styled variant for the terminal
    pub async fn print_styled(&self, plain: &str, styled: &str) {
        self.write_file(plain);
        let mut stdout = io::stdout();
        let _ = stdout.write_all(styled.as_bytes());
        let _ = stdout.flush();
    }

    fn write_file(&self, text: &str) {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.write_all(text.as_bytes());
                if !text.ends_with('\n') {
                    let _ = file.write_all(b"\n");
                }
            }
        }
    }

    /// Write log entry to output
    async fn write_entry(&self, mut entry: LogEntry) {
        // Add context fields
        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry.fields.insert(
                "session_id".to_string(),
                serde_json::Value::String(session_id.clone()),
            );
        }
        drop(context);

        self.write_file(&self.format_console(&entry, false));

        if self.persisted() && !self.would_log(entry.level) {
            return;
        }

        let output = match self.format {
            LogFormat::Console => self.format_console(&entry, self.use_color),
            LogFormat::Json => self.format_json(&entry),
        };

        // Without a file everything goes to stdout; otherwise warnings to stderr
        if self.persisted() && entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    /// Format log entry for console output
    fn format_console(&self, entry: &LogEntry, use_color: bool) -> String {
        let timestamp = entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!(
            "{} {} [{}] {}",
            timestamp, formatted_level, entry.logger, entry.message
        );

        // Session id is in the header; keep lines short
        let mut fields: Vec<String> = entry
            .fields
            .iter()
            .filter(|(k, _)| k.as_str() != "session_id")
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if !fields.is_empty() {
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        output
    }

    /// Format log entry as JSON
    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!(
                "{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}",
                entry.message
            ),
        }
    }
}

fn random_suffix() -> u32 {
    (Uuid::new_v4().as_u128() % 90_000) as u32 + 10_000
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    log: &'a RunLog,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(log: &'a RunLog, level: LogLevel, message: String) -> Self {
        Self {
            log,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: log.name.clone(),
                fields: HashMap::new(),
            },
        }
    }

    /// Override the component name
    pub fn component(mut self, name: &str) -> Self {
        self.entry.logger = name.to_string();
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_exit_code", error.exit_code())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.log.write_entry(self.entry).await;
    }
}
