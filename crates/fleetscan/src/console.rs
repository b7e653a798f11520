//! Terminal front-end: renders status events on stdout.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;

use fleetscan_core::{StatusColor, StatusEvent, StatusSink};

use crate::cli::ColorMode;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub struct Console {
    color: bool,
}

impl Console {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            color: should_color(mode),
        }
    }

    pub fn prompt(&self) {
        let mut out = io::stdout().lock();
        let _ = write!(out, "{}", self.paint("serial> ", StatusColor::Grey));
        let _ = out.flush();
    }

    fn paint(&self, text: &str, color: StatusColor) -> String {
        if !self.color {
            return text.to_owned();
        }
        match color {
            StatusColor::Red => text.red().bold().to_string(),
            StatusColor::Green => text.green().bold().to_string(),
            StatusColor::Orange => text.yellow().bold().to_string(),
            StatusColor::Grey => text.dimmed().to_string(),
        }
    }

    fn render(&self, event: StatusEvent) -> Option<String> {
        match event {
            StatusEvent::Clear => None,
            StatusEvent::Serial { value } => {
                let label = if self.color {
                    value.bold().to_string()
                } else {
                    value
                };
                Some(format!("── {label}"))
            }
            StatusEvent::Status { value, color } => {
                Some(format!("   {}", self.paint(&value, color)))
            }
            StatusEvent::Log { value } => {
                Some(format!("   {}", self.paint(&value, StatusColor::Grey)))
            }
            StatusEvent::AuditPath { value } => Some(format!("Audit sheet: {value}")),
        }
    }
}

impl StatusSink for Console {
    fn emit(&self, event: StatusEvent) {
        if let Some(line) = self.render(event) {
            let _ = writeln!(io::stdout().lock(), "{line}");
        }
    }
}
