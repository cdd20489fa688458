use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Logger for the systemd journal.
///
/// Prefixes every line with the `<N>` severity marker the journal parses.
pub struct SystemdLogger;

static LOGGER: SystemdLogger = SystemdLogger;

impl SystemdLogger {
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_logger(&LOGGER)?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for SystemdLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let level = match record.level() {
            Level::Error => "<3>",
            Level::Warn => "<4>",
            Level::Info => "<6>",
            Level::Debug => "<7>",
            Level::Trace => "<7>",
        };

        if record.level() == Level::Error {
            eprintln!("{}{}", level, record.args());
        } else {
            println!("{}{}", level, record.args());
        }
    }

    fn flush(&self) {}
}
