use crate::error::LoadError;
use colored::Colorize;

/// Sink for errors that stop configuration loading
pub trait Reporter {
    fn report(&self, error: &LoadError);
}

impl<F> Reporter for F
where
    F: Fn(&LoadError),
{
    fn report(&self, error: &LoadError) {
        self(error)
    }
}

/// Logs the error through `tracing` and prints a summary to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, error: &LoadError) {
        tracing::error!(stage = error.stage(), error = %error, "configuration failed to load");
        eprintln!("{} {}", "Configuration error:".red().bold(), error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_closure_reporter_receives_error() {
        let seen = RefCell::new(Vec::new());
        let reporter = |e: &LoadError| seen.borrow_mut().push(e.stage());

        reporter.report(&LoadError::InvalidArguments { count: 4 });

        assert_eq!(*seen.borrow(), vec!["arguments"]);
    }

    #[test]
    fn test_tracing_reporter_does_not_panic() {
        TracingReporter.report(&LoadError::UnsupportedType { field: "hosts" });
    }
}
