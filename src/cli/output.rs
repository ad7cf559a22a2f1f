//! Colored terminal output for operator feedback.
//!
//! Mirrors the step/success/warning/error vocabulary of the deployment
//! workflow. Write failures to the console are ignored on purpose:
//! status output is best-effort and never aborts a pipeline.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Manager for colored terminal output.
#[derive(Debug, Clone)]
pub struct OutputManager {
    quiet: bool,
}

impl OutputManager {
    /// Creates an output manager writing to stdout/stderr.
    pub fn new() -> Self {
        Self { quiet: false }
    }

    /// Creates a silent output manager (used by tests).
    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    fn colored(&self, color: Color, bold: bool, message: &str) {
        if self.quiet {
            return;
        }
        let mut stream = StandardStream::stdout(ColorChoice::Auto);
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(color)).set_bold(bold);
        let _ = stream.set_color(&spec);
        let _ = writeln!(stream, "{}", message);
        let _ = stream.reset();
    }

    /// Prints a numbered pipeline step header.
    pub fn step(&self, number: u8, message: &str) {
        self.colored(Color::Blue, false, &format!("\n[Step {}] {}", number, message));
        self.plain(&"-".repeat(50));
    }

    /// Prints a success line.
    pub fn success(&self, message: &str) {
        self.colored(Color::Green, false, &format!("✓ {}", message));
    }

    /// Prints a warning line.
    pub fn warn(&self, message: &str) {
        self.colored(Color::Yellow, true, &format!("⚠ {}", message));
    }

    /// Prints an error line.
    pub fn error(&self, message: &str) {
        self.colored(Color::Red, false, &format!("✗ {}", message));
    }

    /// Prints an uncolored line.
    pub fn plain(&self, message: &str) {
        if self.quiet {
            return;
        }
        println!("{}", message);
    }

    /// Prints a banner with the given title.
    pub fn banner(&self, title: &str) {
        let rule = "=".repeat(50);
        self.colored(Color::Green, false, &format!("\n{}", rule));
        self.colored(Color::Green, false, title);
        self.colored(Color::Green, false, &rule);
    }
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new()
    }
}
