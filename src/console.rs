//! Console sink for the Gitflow messages of a run.

/// Destination of the human readable lines an action prints
pub trait Console {
    /// Print one line
    fn println(&self, line: &str);

    /// Print a line that needs attention
    fn warn(&self, line: &str) {
        self.println(line);
    }
}

/// Console that only forwards to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogConsole;

impl Console for LogConsole {
    fn println(&self, line: &str) {
        log::info!("{}", line);
    }

    fn warn(&self, line: &str) {
        log::warn!("{}", line);
    }
}
