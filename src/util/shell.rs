//! Status output for the CLI.
//!
//! Status lines go to stderr with a right-aligned, optionally colored
//! label, so stdout carries only the plan itself.

use std::fmt::Display;
use std::io::{self, IsTerminal};

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    Always,
    Never,
}

/// Status labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Loading,
    Checking,
    Planning,
    Consolidated,
    Finished,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Loading => "Loading",
            Status::Checking => "Checking",
            Status::Planning => "Planning",
            Status::Consolidated => "Consolidated",
            Status::Finished => "Finished",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            // In-progress: bold cyan
            Status::Loading | Status::Checking | Status::Planning => "\x1b[1;36m",
            // Success: bold green
            Status::Consolidated | Status::Finished => "\x1b[1;32m",
        }
    }
}

const STATUS_WIDTH: usize = 12;

/// Shell for status output.
#[derive(Debug, Clone)]
pub struct Shell {
    use_color: bool,
    quiet: bool,
}

impl Shell {
    pub fn new(color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        Shell {
            use_color,
            quiet: false,
        }
    }

    /// Suppress status lines, e.g. when stdout is machine-readable.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status line.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.quiet {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }
}
