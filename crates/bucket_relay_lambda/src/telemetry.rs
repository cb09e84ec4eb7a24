use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";
const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(setting) if setting.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Installs the global subscriber for a Lambda binary. Filtering follows
/// `RUST_LOG` (default `info`). Timestamps are left to the log collector.
pub fn init_tracing() {
    let format = LogFormat::from_setting(std::env::var(LOG_FORMAT_VAR).ok().as_deref());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Json => {
            let installed = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_target(false)
                .without_time()
                .json()
                .try_init();
            if let Err(error) = installed {
                eprintln!("tracing subscriber was not installed: {error}");
            }
        }
        LogFormat::Text => {
            let subscriber = text_subscriber(filter, std::io::stdout);
            if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
                eprintln!("tracing subscriber was not installed: {error}");
            }
        }
    }
}

/// Plain-text subscriber. Lines carry no level, target or time, so an event
/// without fields prints its message as the whole line and space-delimited
/// metric filters can match on its first and last words.
pub fn text_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .without_time()
        .finish()
}
