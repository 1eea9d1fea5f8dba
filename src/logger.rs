use slog::Drain;
use slog_term::{CompactFormat, TermDecorator};
use std::io;
use std::sync::Mutex;
use time::OffsetDateTime;

use slog::*;

use crate::helpers::datetime::Timezone;

pub struct Logger {
    logger: slog::Logger,
}

fn new_drain(level: Level) -> Fuse<Mutex<Fuse<LevelFilter<CompactFormat<TermDecorator>>>>> {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator)
        .use_custom_timestamp(|w: &mut dyn io::Write| {
            write!(
                w,
                "{}",
                OffsetDateTime::now_utc()
                    .to_localtime()
                    .to_formatted_string()
            )
        })
        .build()
        .filter_level(level)
        .fuse();
    Mutex::new(drain).fuse()
}

fn level_from_u8(log_level: u8) -> Level {
    match log_level {
        0 => Level::Critical,
        1 => Level::Error,
        2 => Level::Warning,
        3 => Level::Info,
        4 => Level::Debug,
        5 => Level::Trace,
        // Default to debug
        _ => Level::Debug,
    }
}

impl Logger {
    pub fn new(log_level: u8) -> Self {
        let drain = new_drain(level_from_u8(log_level));
        let logger = slog::Logger::root(drain, slog::o!("version" => env!("CARGO_PKG_VERSION")));
        Logger { logger }
    }

    pub fn set_global(&self) -> &Self {
        // slog_stdlog uses the logger from slog_scope, so set a logger there
        let _guard = slog_scope::set_global_logger(self.logger.clone());
        // https://github.com/slog-rs/slog/issues/249
        _guard.cancel_reset();
        slog_stdlog::init().unwrap();
        self
    }
}
