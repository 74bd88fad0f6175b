/// Validation layer messenger - colored output, filters, statistics
///
/// Messages from VK_LAYER_KHRONOS_validation arrive on `vulkan_debug_callback`.
/// They are filtered by severity and category, counted, grouped by repeat
/// count and written to the console and/or a log file.
///
/// `panic_on_error` never unwinds through the driver: the first error is
/// parked and surfaced as an `Err` by the next `submit_frame`.

use ash::vk;
use colored::*;
use lumen_3d_engine::lumen3d::render::{DebugMessageFilter, DebugOutput, DebugSeverity, ValidationStats};
use rustc_hash::FxHashMap;
use std::ffi::CStr;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

static DEBUG_CONFIG: Mutex<Option<DebugConfig>> = Mutex::new(None);

static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Occurrence count per message text
static MESSAGE_TRACKER: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

/// First error seen while `panic_on_error` is set
static FATAL_ERROR: Mutex<Option<String>> = Mutex::new(None);

/// Debug configuration for the callback
#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub severity: DebugSeverity,
    pub output: DebugOutput,
    pub message_filter: DebugMessageFilter,
    pub break_on_error: bool,
    pub panic_on_error: bool,
    pub enable_stats: bool,
}

struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn counter(&self, level: Level) -> &AtomicU32 {
        match level {
            Level::Error => &self.errors,
            Level::Warning => &self.warnings,
            Level::Info => &self.info,
            Level::Verbose => &self.verbose,
        }
    }

    fn snapshot(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for level in [Level::Error, Level::Warning, Level::Info, Level::Verbose] {
            self.counter(level).store(0, Ordering::Relaxed);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
    Error,
    Warning,
    Info,
    Verbose,
}

impl Level {
    pub(crate) fn from_vk(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            Level::Error
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            Level::Warning
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            Level::Info
        } else {
            Level::Verbose
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warning => "WARNING",
            Level::Info => "INFO",
            Level::Verbose => "VERBOSE",
        }
    }

    fn colored_label(&self) -> ColoredString {
        match self {
            Level::Error => self.label().red().bold(),
            Level::Warning => self.label().yellow().bold(),
            Level::Info => self.label().cyan(),
            Level::Verbose => self.label().bright_black(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Severity mask requested from the messenger for `severity`
pub(crate) fn severity_flags(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    type F = vk::DebugUtilsMessageSeverityFlagsEXT;
    match severity {
        DebugSeverity::ErrorsOnly => F::ERROR,
        DebugSeverity::ErrorsAndWarnings => F::ERROR | F::WARNING,
        DebugSeverity::All => F::ERROR | F::WARNING | F::INFO | F::VERBOSE,
    }
}

/// Whether a message passes the configured severity and category filters
pub(crate) fn accepts(
    config: &DebugConfig,
    level: Level,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
) -> bool {
    let severity_ok = match config.severity {
        DebugSeverity::ErrorsOnly => level == Level::Error,
        DebugSeverity::ErrorsAndWarnings => matches!(level, Level::Error | Level::Warning),
        DebugSeverity::All => true,
    };
    let category_ok = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        config.message_filter.show_validation
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        config.message_filter.show_performance
    } else {
        config.message_filter.show_general
    };
    severity_ok && category_ok
}

fn type_label(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// Install the callback configuration and reset statistics
pub fn init_debug_config(config: DebugConfig) {
    VALIDATION_STATS.reset();
    *lock(&MESSAGE_TRACKER) = Some(FxHashMap::default());
    *lock(&FATAL_ERROR) = None;
    *lock(&DEBUG_CONFIG) = Some(config);
}

/// Stop handling messages (called before the messenger is destroyed)
pub fn cleanup_debug_config() {
    *lock(&DEBUG_CONFIG) = None;
}

/// Current validation statistics
pub fn get_validation_stats() -> ValidationStats {
    VALIDATION_STATS.snapshot()
}

/// Take the error parked by `panic_on_error`, if any
pub(crate) fn take_fatal_error() -> Option<String> {
    lock(&FATAL_ERROR).take()
}

/// Print a summary of the validation messages seen so far
pub fn print_validation_stats_report() {
    let stats = get_validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics ===".bright_blue().bold());
    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }
    println!("  {} {}", "Total:".white().bold(), stats.total());

    if let Some(tracker) = lock(&MESSAGE_TRACKER).as_ref() {
        let repeated = tracker.values().filter(|&&count| count > 1).count();
        if repeated > 0 {
            println!("\n  {} message(s) appeared more than once", repeated);
        }
    }
    println!("{}\n", "=============================".bright_blue().bold());
}

unsafe fn c_str_or<'a>(ptr: *const std::os::raw::c_char, fallback: &'a str) -> std::borrow::Cow<'a, str> {
    if ptr.is_null() {
        std::borrow::Cow::Borrowed(fallback)
    } else {
        CStr::from_ptr(ptr).to_string_lossy()
    }
}

/// Messenger callback registered at instance creation
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let Some(config) = lock(&DEBUG_CONFIG).clone() else {
        return vk::FALSE;
    };

    let level = Level::from_vk(message_severity);
    if !accepts(&config, level, message_type) {
        return vk::FALSE;
    }

    let callback_data = &*p_callback_data;
    let message_id_name = c_str_or(callback_data.p_message_id_name, "Unknown");
    let message = c_str_or(callback_data.p_message, "No message");
    let type_str = type_label(message_type);

    let occurrences = if config.enable_stats {
        VALIDATION_STATS.counter(level).fetch_add(1, Ordering::Relaxed);
        let mut tracker = lock(&MESSAGE_TRACKER);
        let counts = tracker.get_or_insert_with(FxHashMap::default);
        let count = counts.entry(message.to_string()).or_insert(0);
        *count += 1;
        *count
    } else {
        1
    };
    let repeat = if occurrences > 1 { format!(" [x{}]", occurrences) } else { String::new() };

    let console_output = format!(
        "{} {} [{}]{}\n  |- {}: {}\n  '- {}\n",
        "[VULKAN".bright_blue().bold(),
        format!("{}]", level.colored_label()).bright_blue().bold(),
        type_str.bright_black(),
        repeat.yellow(),
        "Message ID".bright_black(),
        message_id_name.white(),
        message.white()
    );
    let file_output = format!(
        "[VULKAN {}] [{}]{}\n  |- Message ID: {}\n  '- {}\n",
        level.label(),
        type_str,
        repeat,
        message_id_name,
        message
    );

    match &config.output {
        DebugOutput::Console => eprint!("{}", console_output),
        DebugOutput::File(path) => write_to_file(path, &file_output),
        DebugOutput::Both(path) => {
            eprint!("{}", console_output);
            write_to_file(path, &file_output);
        }
    }

    if level == Level::Error {
        if config.panic_on_error {
            let mut fatal = lock(&FATAL_ERROR);
            if fatal.is_none() {
                *fatal = Some(format!("{} [{}]: {}", message_id_name, type_str, message));
            }
        }
        if config.break_on_error {
            eprintln!(
                "\n{}\n  Context: {} [{}]\n  Message: {}\n",
                "BREAK ON VALIDATION ERROR - aborting".red().bold(),
                message_id_name.yellow(),
                type_str.cyan(),
                message.white()
            );
            std::process::abort();
        }
    }

    vk::FALSE
}

fn write_to_file(path: &str, message: &str) {
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{}", message);
    }
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
