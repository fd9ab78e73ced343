// violet ignore chunk
//! ## Features
//!
//! - Leveled logging (verbose, debug, info, success, warn, error)
//! - Multi-line message support with consistent prefixes
//! - Every message is mirrored as a `tracing` event under the `bentley` target
//! - Console echo can be switched off once a tracing subscriber prints instead
//! - Banner display for startup announcements
//!
//! ## Usage
//!
//! Functions: `info()`, `warn()`, `error()`, `debug()`, `success()`, `verbose()`
//!
//! Macros take either a message expression or a format string:
//! `bentley::info!("loaded {} images", count)`.

use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

static CONSOLE: AtomicBool = AtomicBool::new(true);

/// Severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
  Verbose,
  Debug,
  Info,
  Success,
  Warn,
  Error,
}

impl Level {
  /// Short tag printed inside the prefix brackets
  pub fn tag(self) -> &'static str {
    match self {
      Level::Verbose => "verb",
      Level::Debug => "debug",
      Level::Info => "info",
      Level::Success => "sccs",
      Level::Warn => "warn",
      Level::Error => "error",
    }
  }

  fn color(self) -> Color {
    match self {
      Level::Verbose => Color::Cyan,
      Level::Debug => Color::Magenta,
      Level::Info => Color::Blue,
      Level::Success => Color::Green,
      Level::Warn => Color::Yellow,
      Level::Error => Color::Red,
    }
  }
}

/// Enable or disable the coloured stderr echo.
///
/// Servers that install a `tracing` fmt subscriber turn this off so each
/// message is printed once, by the subscriber.
pub fn set_console(enabled: bool) {
  CONSOLE.store(enabled, Ordering::Relaxed);
}

/// Whether the coloured stderr echo is active
pub fn console_enabled() -> bool {
  CONSOLE.load(Ordering::Relaxed)
}

/// Core output function, one stderr line per message line
pub fn log(message: &str) {
  for line in message.lines() {
    eprintln!("{line}");
  }
}

/// Format a colored prefix for log messages
fn format_prefix(color: Color, prefix: &str) -> String {
  let pad = 7usize.saturating_sub(prefix.len() + 2);
  format!("[{}]{:<width$}", prefix.color(color).bold(), "", width = pad)
}

fn mirror(level: Level, message: &str) {
  match level {
    Level::Verbose => tracing::trace!(target: "bentley", "{message}"),
    Level::Debug => tracing::debug!(target: "bentley", "{message}"),
    Level::Info | Level::Success => tracing::info!(target: "bentley", "{message}"),
    Level::Warn => tracing::warn!(target: "bentley", "{message}"),
    Level::Error => tracing::error!(target: "bentley", "{message}"),
  }
}

/// Emit a message at the given level
pub fn emit(level: Level, message: &str) {
  mirror(level, message);

  if !console_enabled() {
    return;
  }

  let prefix = format_prefix(level.color(), level.tag());
  for line in message.lines() {
    log(&format!("{prefix} {line}"));
  }
}

pub fn verbose(message: &str) {
  emit(Level::Verbose, message);
}

/// Debug level logging - detailed diagnostic information
pub fn debug(message: &str) {
  emit(Level::Debug, message);
}

/// Info level logging - general information
pub fn info(message: &str) {
  emit(Level::Info, message);
}

/// Success level logging - something completed successfully
pub fn success(message: &str) {
  emit(Level::Success, message);
}

/// Warning level logging - something needs attention
pub fn warn(message: &str) {
  emit(Level::Warn, message);
}

/// Error level logging - something went wrong
pub fn error(message: &str) {
  emit(Level::Error, message);
}

/// Create a banner line of the specified length and character
pub fn banner_line(length: usize, char: char) -> String {
  char.to_string().repeat(length)
}

/// Announce something important, framed by banner lines
pub fn announce(message: &str) {
  mirror(Level::Info, message);

  if !console_enabled() {
    return;
  }

  let banner = banner_line(50, '-');
  log(&banner.blue().bold().to_string());
  log(&message.blue().bold().to_string());
  log(&banner.blue().bold().to_string());
}

/// Macros for coverage-excluded logging - these expand with LCOV_EXCL_LINE at call sites
#[macro_export]
macro_rules! info {
  ($fmt:literal, $($arg:tt)+) => {
    $crate::info(&format!($fmt, $($arg)+)); // LCOV_EXCL_LINE
  };
  ($fmt:literal) => {
    $crate::info(&format!($fmt)); // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::info($msg); // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! warn {
  ($fmt:literal, $($arg:tt)+) => {
    $crate::warn(&format!($fmt, $($arg)+)); // LCOV_EXCL_LINE
  };
  ($fmt:literal) => {
    $crate::warn(&format!($fmt)); // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::warn($msg); // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! error {
  ($fmt:literal, $($arg:tt)+) => {
    $crate::error(&format!($fmt, $($arg)+)); // LCOV_EXCL_LINE
  };
  ($fmt:literal) => {
    $crate::error(&format!($fmt)); // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::error($msg); // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! verbose {
  ($fmt:literal, $($arg:tt)+) => {
    $crate::verbose(&format!($fmt, $($arg)+)); // LCOV_EXCL_LINE
  };
  ($fmt:literal) => {
    $crate::verbose(&format!($fmt)); // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::verbose($msg); // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! debug {
  ($fmt:literal, $($arg:tt)+) => {
    $crate::debug(&format!($fmt, $($arg)+)); // LCOV_EXCL_LINE
  };
  ($fmt:literal) => {
    $crate::debug(&format!($fmt)); // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::debug($msg); // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! success {
  ($fmt:literal, $($arg:tt)+) => {
    $crate::success(&format!($fmt, $($arg)+)); // LCOV_EXCL_LINE
  };
  ($fmt:literal) => {
    $crate::success(&format!($fmt)); // LCOV_EXCL_LINE
  };
  ($msg:expr) => {
    $crate::success($msg); // LCOV_EXCL_LINE
  };
}
