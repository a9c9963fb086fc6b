//! Named loggers on top of `tracing`.
//!
//! Every deployed block instance gets a [`Logger`] named after it, derived
//! from the deployer's logger with [`Logger::sub_logger`]. Events carry the
//! logger name in the `logger` field.

use std::fmt;
use std::sync::Arc;

/// Name of the deployer's root logger.
pub const ROOT_LOGGER: &str = "kernel";

/// A cheap, cloneable named logger.
#[derive(Clone, PartialEq, Eq)]
pub struct Logger {
    name: Arc<str>,
}

impl Logger {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    /// A logger whose name is this logger's name followed by `.name`.
    pub fn sub_logger(&self, name: &str) -> Logger {
        Logger::new(format!("{}.{}", self.name, name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trace(&self, message: impl fmt::Display) {
        tracing::trace!(logger = %self.name, "{}", message);
    }

    pub fn debug(&self, message: impl fmt::Display) {
        tracing::debug!(logger = %self.name, "{}", message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        tracing::info!(logger = %self.name, "{}", message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        tracing::warn!(logger = %self.name, "{}", message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        tracing::error!(logger = %self.name, "{}", message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new(ROOT_LOGGER)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Logger({})", self.name)
    }
}

impl fmt::Display for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Capability of receiving a logger at deployment time.
pub trait Logging {
    /// Hand over the logger scoped to the owning block instance.
    fn logger(&mut self, logger: Logger);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_logger_names_nest() {
        let root = Logger::default();
        let app = root.sub_logger("app");
        let db = app.sub_logger("db");
        assert_eq!(app.name(), "kernel.app");
        assert_eq!(db.name(), "kernel.app.db");
        assert_eq!(format!("{:?}", db), "Logger(kernel.app.db)");
    }

    #[test]
    fn logging_without_subscriber_is_harmless() {
        let logger = Logger::new("quiet");
        logger.trace("t");
        logger.debug(format_args!("{} wirings", 2));
        logger.info("i");
        logger.warn("w");
        logger.error("e");
    }
}
