//! Subscriber construction.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{TelemetryError, TelemetryResult};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human friendly.
    Pretty,
    /// Single line, abbreviated.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
    /// Single line with every field.
    Full,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            _ => Err(TelemetryError::InvalidFormat(s.to_owned())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
            Self::Full => "full",
        };
        f.write_str(name)
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error.
    #[default]
    Stderr,
    /// Daily-rotated files in `directory`, named `{prefix}.YYYY-MM-DD`.
    File {
        /// Directory the files are written to. Created if missing.
        directory: PathBuf,
        /// File name prefix.
        prefix: String,
    },
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Base level applied to every target (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
    /// Line format.
    pub format: LogFormat,
    /// Extra `target=level` directives layered over the base level.
    pub directives: Vec<String>,
    /// Output destination.
    pub target: LogTarget,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    /// Create a configuration with the given base level and defaults otherwise.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            directives: Vec::new(),
            target: LogTarget::default(),
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Add a `target=level` directive.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Set the output destination.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Build the filter: base level, then configured directives, then any
    /// directives from `RUST_LOG`, later entries taking precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if the level or any directive fails to parse.
    pub fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter =
            EnvFilter::try_new(&self.level).map_err(|e| TelemetryError::InvalidLevel {
                level: self.level.clone(),
                message: e.to_string(),
            })?;

        let from_env = std::env::var("RUST_LOG").unwrap_or_default();
        let env_directives = from_env.split(',').map(str::trim).filter(|d| !d.is_empty());
        for raw in self.directives.iter().map(String::as_str).chain(env_directives) {
            filter = filter.add_directive(parse_directive(raw)?);
        }
        Ok(filter)
    }
}

fn parse_directive(raw: &str) -> TelemetryResult<Directive> {
    raw.parse().map_err(|e: tracing_subscriber::filter::ParseError| {
        TelemetryError::InvalidDirective {
            directive: raw.to_owned(),
            message: e.to_string(),
        }
    })
}

fn format_layer<S>(
    format: LogFormat,
    writer: BoxMakeWriter,
    ansi: bool,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);
    match format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Full => layer.boxed(),
    }
}

/// Install the global `tracing` subscriber described by `config`.
///
/// # Errors
///
/// Returns an error if the filter is invalid, the log directory cannot be
/// created, or a global subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.build_filter()?;

    let (writer, ansi) = match &config.target {
        LogTarget::Stdout => (BoxMakeWriter::new(std::io::stdout), true),
        LogTarget::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LogTarget::File { directory, prefix } => {
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, prefix);
            (BoxMakeWriter::new(appender), false)
        },
    };

    tracing_subscriber::registry()
        .with(format_layer::<Registry>(config.format, writer, ansi))
        .with(filter)
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// Install a compact `info`-level subscriber writing to stderr.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn format_display_round_trips() {
        for format in [LogFormat::Pretty, LogFormat::Compact, LogFormat::Json, LogFormat::Full] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
    }

    #[test]
    fn builder_collects_directives() {
        let config = LogConfig::new("debug")
            .with_format(LogFormat::Json)
            .with_directive("keystone_plugin=trace");
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.directives, vec!["keystone_plugin=trace".to_owned()]);
        assert_eq!(config.target, LogTarget::Stderr);
    }

    #[test]
    fn valid_filter_builds() {
        let config = LogConfig::new("warn").with_directive("keystone_plugin=debug");
        assert!(config.build_filter().is_ok());
    }

    #[test]
    fn bad_directive_is_rejected() {
        let config = LogConfig::new("info").with_directive("keystone_plugin=loud");
        let err = config.build_filter().unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidDirective { .. }), "got {err:?}");
    }

    #[test]
    fn file_target_installs_once() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let config = LogConfig::new("info").with_target(LogTarget::File {
            directory: logs.clone(),
            prefix: "keystone.log".into(),
        });

        setup_logging(&config).unwrap();
        assert!(logs.is_dir());

        let again = setup_logging(&config).unwrap_err();
        assert!(matches!(again, TelemetryError::InitError(_)));
    }
}
