//! Colored console logging shared by every component.
//!
//! Status output goes through [`log`] with a colored level tag; wire-level
//! detail uses the `log` facade directly (`log::debug!`) so it can be
//! silenced independently of the operator-facing lines.

use colored::Colorize;

/// Severity of an operator-facing log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Prints a tagged line to stdout (stderr for warnings and errors).
pub fn log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Info => println!("{} {message}", "[INFO]".cyan().bold()),
        LogLevel::Success => println!("{} {message}", "[OK]".green().bold()),
        LogLevel::Warning => eprintln!("{} {message}", "[WARN]".yellow().bold()),
        LogLevel::Error => eprintln!("{} {message}", "[ERROR]".red().bold()),
    }
}
