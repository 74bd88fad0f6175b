//! Lumen3D log records and sinks
//!
//! Every subsystem reports through the `engine_*!` macros, which route into
//! whichever `Logger` is installed on `Engine`. The stock sink prints colored
//! lines to the console and drops anything below its minimum severity; error
//! records also carry the file and line that raised them.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Destination for engine log records
///
/// # Example
///
/// ```no_run
/// use lumen_3d_engine::lumen3d::log::{Logger, LogEntry};
///
/// struct FrameLogger;
///
/// impl Logger for FrameLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{}", entry.format_plain());
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Receive one record; called with the global logger lock held for reading
    fn log(&self, entry: &LogEntry);
}

/// One record as handed to a `Logger`
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Wall-clock time the record was built
    pub timestamp: SystemTime,

    /// Source component (e.g., "lumen3d::renderer", "lumen3d::vulkan::swapchain")
    pub source: String,

    /// Rendered message text
    pub message: String,

    /// Set by `engine_error!` and the error macros
    pub file: Option<&'static str>,

    /// Paired with `file`
    pub line: Option<u32>,
}

impl LogEntry {
    /// Short uppercase label, padded to five characters
    pub fn severity_label(&self) -> &'static str {
        match self.severity {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    /// Uncolored line: `[timestamp] [SEV] [source] message (file:line)`
    pub fn format_plain(&self) -> String {
        let datetime: DateTime<Local> = self.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");
        match (self.file, self.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, self.severity_label(), self.source, self.message, file, line
            ),
            _ => format!(
                "[{}] [{}] [{}] {}",
                timestamp, self.severity_label(), self.source, self.message
            ),
        }
    }
}

/// How loud a record is, ordered from Trace to Error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose information (per-draw, per-barrier)
    Trace,

    /// Development information (per-frame decisions)
    Debug,

    /// Important events (device picked, swapchain recreated)
    Info,

    /// Recoverable problems (missing texture, clamped MSAA)
    Warn,

    /// Fatal problems, logged with file:line
    Error,
}

/// Default logger using colored console output
///
/// Entries below `min_severity` are dropped. Format:
/// - plain: `[timestamp] [SEVERITY] [source] message`
/// - with a call site: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger {
    pub min_severity: LogSeverity,
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self { min_severity: LogSeverity::Debug }
    }
}

impl DefaultLogger {
    pub fn with_min_severity(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    pub fn accepts(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if !self.accepts(entry.severity) {
            return;
        }

        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let label = entry.severity_label();
        let severity_str = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };
        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity_str, source, entry.message, file, line
            );
        } else {
            println!("[{}] [{}] [{}] {}", timestamp, severity_str, source, entry.message);
        }
    }
}

// ===== MACROS =====

/// Log a TRACE message
///
/// ```no_run
/// # use lumen_3d_engine::engine_trace;
/// engine_trace!("lumen3d::renderer", "barrier {} -> {}", "ColorAttachment", "ShaderReadOnly");
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::lumen3d::Engine::log(
            $crate::lumen3d::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::lumen3d::Engine::log(
            $crate::lumen3d::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
///
/// ```no_run
/// # use lumen_3d_engine::engine_info;
/// engine_info!("lumen3d::renderer", "Swapchain recreated at {}x{}", 1920, 1080);
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::lumen3d::Engine::log(
            $crate::lumen3d::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::lumen3d::Engine::log(
            $crate::lumen3d::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// ERROR record tagged with the call site
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::lumen3d::Engine::log_detailed(
            $crate::lumen3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
