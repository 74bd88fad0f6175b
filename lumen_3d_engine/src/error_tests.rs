//! Unit tests for error.rs
//!
//! Tests Error variants, their Display text, and the logging error macros.

use crate::error::{Error, Result};
use crate::lumen3d::Engine;
use crate::lumen3d::log::{Logger, LogEntry, LogSeverity};
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkQueueSubmit failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("vkQueueSubmit failed"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_layout_transition_display() {
    let err = Error::LayoutTransition("PresentSrc -> TransferDst".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Layout transition error"));
    assert!(display.contains("PresentSrc -> TransferDst"));
}

#[test]
fn test_invalid_state_and_unsupported_display() {
    let state = Error::InvalidState("begin_present called twice".to_string());
    assert_eq!(format!("{}", state), "Invalid state: begin_present called twice");

    let unsupported = Error::Unsupported("linear blit".to_string());
    assert_eq!(format!("{}", unsupported), "Unsupported: linear blit");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::InvalidResource("geometry_normal".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::InvalidResource("geometry_albedo".to_string()));
}

#[test]
fn test_result_question_mark_propagation() {
    fn inner() -> Result<u32> {
        Err(Error::InitializationFailed("no suitable GPU".to_string()))
    }
    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }

    match outer() {
        Err(Error::InitializationFailed(msg)) => assert_eq!(msg, "no suitable GPU"),
        other => panic!("unexpected result: {:?}", other),
    }
}

// ============================================================================
// MACRO TESTS
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String, Option<u32>)>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source != "lumen3d::test" {
            return;
        }
        self.entries
            .lock()
            .unwrap()
            .push((entry.severity, entry.message.clone(), entry.line));
    }
}

fn capture() -> Arc<Mutex<Vec<(LogSeverity, String, Option<u32>)>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

#[test]
#[serial]
fn test_engine_err_logs_and_builds_backend_error() {
    let entries = capture();

    let err = crate::engine_err!("lumen3d::test", "allocation {} failed", 7);
    assert_eq!(err, Error::BackendError("allocation 7 failed".to_string()));

    let logged = entries.lock().unwrap().clone();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].0, LogSeverity::Error);
    assert_eq!(logged[0].1, "allocation 7 failed");
    assert!(logged[0].2.is_some(), "error logs carry a line number");

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let entries = capture();

    fn fails() -> Result<()> {
        crate::engine_bail!("lumen3d::test", "device lost");
    }

    assert!(matches!(fails(), Err(Error::BackendError(ref m)) if m == "device lost"));
    assert_eq!(entries.lock().unwrap().len(), 1);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_warn_logs_at_warn_level() {
    let entries = capture();

    fn fails() -> Result<()> {
        crate::engine_bail_warn!("lumen3d::test", "texture {} missing", "brick.png");
    }

    assert!(fails().is_err());
    let logged = entries.lock().unwrap().clone();
    assert_eq!(logged[0].0, LogSeverity::Warn);
    assert_eq!(logged[0].1, "texture brick.png missing");
    assert_eq!(logged[0].2, None);

    Engine::reset_logger();
}
