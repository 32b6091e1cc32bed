use log::{Level, Log, Metadata, Record};

/// Logger for services running under systemd.
///
/// Each line is prefixed with the syslog priority so the journal picks up
/// the level. Errors go to stderr, everything else to stdout.
pub struct SystemdLogger {
    level: log::LevelFilter,
}

impl SystemdLogger {
    pub fn new(level: log::LevelFilter) -> Self {
        Self { level }
    }

    /// Install as the global logger.
    pub fn init(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(level)))?;
        log::set_max_level(level);

        Ok(())
    }

    fn priority(level: Level) -> &'static str {
        match level {
            Level::Error => "<3>",
            Level::Warn => "<4>",
            Level::Info => "<6>",
            Level::Debug => "<7>",
            Level::Trace => "<7>",
        }
    }
}

impl Log for SystemdLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let priority = Self::priority(record.level());

        if record.level() == Level::Error {
            eprintln!("{}{}", priority, record.args());
        } else {
            println!("{}{}", priority, record.args());
        }
    }

    fn flush(&self) {}
}
