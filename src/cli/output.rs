//! Colored terminal output for Gitflow runs.
//!
//! Every line goes through one buffered writer so a marker and its message
//! are printed together. Errors go to stderr and ignore `--quiet`.

use crate::console::Console;
use std::io::{self, Write};
use termcolor::{Buffer, BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for colored terminal output
#[derive(Debug)]
pub struct OutputManager {
    stdout: BufferWriter,
    verbose: bool,
    quiet: bool,
}

fn spec(color: Color, bold: bool) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color)).set_bold(bold);
    spec
}

/// Write `marker message` into `buffer`, coloring the marker and optionally the message
fn write_marked(
    buffer: &mut Buffer,
    marker: &str,
    marker_spec: &ColorSpec,
    body_spec: Option<&ColorSpec>,
    message: &str,
) -> io::Result<()> {
    buffer.set_color(marker_spec)?;
    write!(buffer, "{}", marker)?;
    buffer.reset()?;
    if let Some(body_spec) = body_spec {
        buffer.set_color(body_spec)?;
    }
    writeln!(buffer, " {}", message)?;
    buffer.reset()
}

impl OutputManager {
    /// Output honoring `--verbose` and `--quiet`
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            stdout: BufferWriter::stdout(ColorChoice::Auto),
            verbose,
            quiet,
        }
    }

    fn marked(
        &self,
        marker: &str,
        marker_spec: ColorSpec,
        body_spec: Option<ColorSpec>,
        message: &str,
    ) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut buffer = self.stdout.buffer();
        write_marked(&mut buffer, marker, &marker_spec, body_spec.as_ref(), message)?;
        self.stdout.print(&buffer)
    }

    fn plain(&self, line: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut buffer = self.stdout.buffer();
        writeln!(buffer, "{}", line)?;
        self.stdout.print(&buffer)
    }

    /// Gitflow progress line
    pub fn info(&self, message: &str) -> io::Result<()> {
        self.marked("ℹ", spec(Color::Cyan, false), None, message)
    }

    /// Print a success message
    pub fn success(&self, message: &str) -> io::Result<()> {
        self.marked("✓", spec(Color::Green, true), None, message)
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) -> io::Result<()> {
        self.marked(
            "⚠",
            spec(Color::Yellow, true),
            Some(spec(Color::Yellow, false)),
            message,
        )
    }

    /// Print an error message to stderr, even when quiet
    pub fn error(&self, message: &str) {
        let stderr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = stderr.buffer();
        let written = write_marked(
            &mut buffer,
            "✗",
            &spec(Color::Red, true),
            Some(&spec(Color::Red, false)),
            message,
        )
        .and_then(|()| stderr.print(&buffer));
        if written.is_err() {
            println!("[STDERR ERROR] ✗ {}", message);
        }
    }

    /// Print a message only in verbose mode
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.verbose {
            return Ok(());
        }
        self.marked(
            "→",
            spec(Color::Blue, false),
            Some(spec(Color::White, false)),
            message,
        )
    }

    /// Print a section header preceded by a blank line
    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut buffer = self.stdout.buffer();
        writeln!(buffer)?;
        buffer.set_color(&spec(Color::Cyan, true))?;
        writeln!(buffer, "═══ {} ═══", title)?;
        buffer.reset()?;
        self.stdout.print(&buffer)
    }

    /// Print a line indented under the previous one
    pub fn indent(&self, message: &str) -> io::Result<()> {
        self.plain(&format!("    {}", message))
    }

    /// Print a plain line
    pub fn println(&self, message: &str) -> io::Result<()> {
        self.plain(message)
    }

    /// Whether normal output is suppressed
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl Console for OutputManager {
    fn println(&self, message: &str) {
        let _ = self.info(message);
    }

    fn warn(&self, message: &str) {
        let _ = OutputManager::warn(self, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marked_line_layout() {
        let mut buffer = Buffer::no_color();
        write_marked(
            &mut buffer,
            "✓",
            &spec(Color::Green, true),
            None,
            "Build #3 finished: SUCCESS",
        )
        .unwrap();
        assert_eq!(
            String::from_utf8_lossy(buffer.as_slice()),
            "✓ Build #3 finished: SUCCESS\n"
        );
    }

    #[test]
    fn test_quiet_suppresses_normal_output() {
        let output = OutputManager::new(true, true);
        assert!(output.is_quiet());
        assert!(output.info("hidden").is_ok());
        assert!(output.verbose("hidden").is_ok());
    }
}
