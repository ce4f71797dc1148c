use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Library crates that log once per frame on the transmit and receive paths.
const LINK_TARGETS: [&str; 3] = ["mcuspi_transport", "mcuspi_frame", "mcuspi_session"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::from_level(Level::ERROR),
            LogLevel::Warn => LevelFilter::from_level(Level::WARN),
            LogLevel::Info => LevelFilter::from_level(Level::INFO),
            LogLevel::Debug => LevelFilter::from_level(Level::DEBUG),
            LogLevel::Trace => LevelFilter::from_level(Level::TRACE),
        }
    }
}

/// Per-target filter: `level` for the CLI itself, `link_level` (falling
/// back to `level`) for the transport, frame and session crates.
pub fn build_filter(level: LogLevel, link_level: Option<LogLevel>) -> Targets {
    let link = link_level.unwrap_or(level).as_filter();
    LINK_TARGETS
        .iter()
        .fold(Targets::new().with_default(level.as_filter()), |targets, name| {
            targets.with_target(*name, link)
        })
}

/// Install the stderr subscriber. Thread names are kept so events from a
/// `<session>-rx` receive worker can be told apart from caller events.
pub fn init_logging(format: LogFormat, level: LogLevel, link_level: Option<LogLevel>) {
    let filter = build_filter(level, link_level);
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true);

    // A second install (tests) keeps the first subscriber.
    let _ = match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt)
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt.json())
            .with(filter)
            .try_init(),
    };
}
