use anyhow::{anyhow, Result};
use env_logger::{fmt::Formatter, Builder, Env, Target};
use log::Level;
use std::io::Write;

/// Compact stderr logger. The level comes from `RUST_LOG`, `info` if unset.
pub fn init_logger() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Never)
        .target(Target::Stderr)
        .format(|buf: &mut Formatter, record| {
            writeln!(
                buf,
                "{} {} {}",
                buf.timestamp_millis(),
                level_tag(record.level()),
                record.args()
            )
        })
        .try_init()
        .map_err(|e| anyhow!("logger init failed: {}", e))
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}
