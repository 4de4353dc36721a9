use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config::{LogConfig, LogFormat};
use crate::error::ObserveError;

/// Install the process-wide tracing subscriber.
///
/// May be called once per process; a second call reports
/// [`ObserveError::AlreadyInitialized`].
pub fn init_logger(cfg: &LogConfig) -> Result<(), ObserveError> {
    let filter = mk_filter(&cfg.level)?;
    match cfg.format {
        LogFormat::Text => {
            let layer = fmt::layer()
                .with_ansi(cfg.ansi)
                .with_target(cfg.with_target)
                .with_timer(mk_timer());
            install(tracing_subscriber::registry().with(filter).with(layer))
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(cfg.with_target)
                .with_timer(mk_timer());
            install(tracing_subscriber::registry().with(filter).with(layer))
        }
        LogFormat::Journald => mk_journald(filter),
    }
}

fn mk_filter(level: &str) -> Result<EnvFilter, ObserveError> {
    EnvFilter::try_new(level).map_err(|_| ObserveError::InvalidLevel(level.to_string()))
}

fn mk_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn install<S>(subscriber: S) -> Result<(), ObserveError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(|e| {
        let s = e.to_string();
        if s.contains("SetGlobalDefaultError") {
            ObserveError::AlreadyInitialized
        } else {
            ObserveError::Init(s)
        }
    })
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn mk_journald(filter: EnvFilter) -> Result<(), ObserveError> {
    let journald = tracing_journald::layer()
        .map_err(|e| ObserveError::Init(format!("journald: {e}")))?;
    install(tracing_subscriber::registry().with(filter).with(journald))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn mk_journald(_filter: EnvFilter) -> Result<(), ObserveError> {
    Err(ObserveError::JournaldUnavailable)
}
