pub mod build;
pub mod completions;
pub mod convert;
pub mod crc;
pub mod list;
pub mod man_pages;

use indicatif::{ProgressBar, ProgressStyle};
use pbpack_core::{CoreError, ErrorKind};
use std::fmt;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_NOT_FOUND: u8 = 3;
pub const EXIT_IO_ERROR: u8 = 4;

/// A failed command: the message for stderr and the process exit code.
#[derive(Debug)]
pub struct Failure {
    pub code: u8,
    pub message: String,
}

impl Failure {
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Configuration => EXIT_CONFIG_ERROR,
        ErrorKind::NotFound => EXIT_NOT_FOUND,
        ErrorKind::Io => EXIT_IO_ERROR,
    }
}

impl From<CoreError> for Failure {
    fn from(e: CoreError) -> Self {
        Self::new(exit_code(e.kind()), e.to_string())
    }
}

impl From<pbpack_format::FormatError> for Failure {
    fn from(e: pbpack_format::FormatError) -> Self {
        CoreError::from(e).into()
    }
}

impl From<pbpack_image::ImageError> for Failure {
    fn from(e: pbpack_image::ImageError) -> Self {
        CoreError::from(e).into()
    }
}

pub fn io_failure(action: &str, path: &std::path::Path, e: &std::io::Error) -> Failure {
    Failure::new(
        EXIT_IO_ERROR,
        format!("failed to {action} '{}': {e}", path.display()),
    )
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, Failure> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Failure::new(EXIT_FAILURE, format!("JSON serialization failed: {e}")))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✗ {msg}"));
}

fn finish(pb: &ProgressBar, msg: String) {
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        pb.set_style(style);
    }
    pb.finish_with_message(msg);
}

pub fn colorize_check(ok: bool) -> String {
    use console::Style;
    if ok {
        Style::new().green().apply_to("ok").to_string()
    } else {
        Style::new().red().bold().apply_to("mismatch").to_string()
    }
}
