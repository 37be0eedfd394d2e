//! Logging collaborator
//!
//! [`Logger`] is created by the caller and handed to every client constructor. It controls
//! verbosity and tags each event with the component that produced it; the events themselves
//! go through `tracing`, so the embedding process decides where they end up.

use std::time::{Duration, Instant};

/// Logger responsible for all diagnostic output of a client
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    pub component: &'static str,
    pub start_time: Instant,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            component: "devops",
            start_time: Instant::now(),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            component: "devops",
            start_time: Instant::now(),
        }
    }

    /// Same settings, different component tag
    pub fn with_component(&self, component: &'static str) -> Self {
        Self {
            component,
            ..self.clone()
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            tracing::debug!(component = self.component, "{}", message);
        }
    }

    /// Detailed information (only shown in verbose mode)
    pub fn detail(&self, message: &str) {
        if self.verbose && !self.quiet {
            tracing::trace!(component = self.component, "{}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            tracing::info!(component = self.component, "{}", message);
        }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            tracing::info!(component = self.component, outcome = "ok", "{}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            tracing::warn!(component = self.component, "{}", message);
        }
    }

    /// Errors are reported even in quiet mode
    pub fn error(&self, message: &str) {
        tracing::error!(component = self.component, "{}", message);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Format byte counts in human-readable units
    pub fn format_size(&self, bytes: u64) -> String {
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else if bytes < 1024 * 1024 * 1024 {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        } else {
            format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
        }
    }

    pub fn format_duration(&self, duration: Duration) -> String {
        let millis = duration.as_millis();
        if millis < 1000 {
            format!("{}ms", millis)
        } else {
            let secs = duration.as_secs();
            if secs < 60 {
                format!("{:.1}s", duration.as_secs_f64())
            } else {
                format!("{}m{}s", secs / 60, secs % 60)
            }
        }
    }
}

/// Install a `tracing` subscriber for binaries; libraries never call this.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        let logger = Logger::new_quiet();
        assert_eq!(logger.format_size(512), "512 B");
        assert_eq!(logger.format_size(1536), "1.5 KB");
        assert_eq!(logger.format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_duration() {
        let logger = Logger::new(false);
        assert_eq!(logger.format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(logger.format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(logger.format_duration(Duration::from_secs(125)), "2m5s");
    }

    #[test]
    fn test_with_component_keeps_verbosity() {
        let logger = Logger::new(true).with_component("registry");
        assert!(logger.verbose);
        assert!(!logger.quiet);
        assert_eq!(logger.component, "registry");
    }
}
