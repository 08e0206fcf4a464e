//! Log setup for the command line tool.
//!
//! Settings come from three places, in increasing priority: the built-in
//! defaults, the `log` section of the configuration file and the
//! `--log-*` command line arguments.

use serde::{de::Error as _, Deserialize, Deserializer};
use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use structopt::StructOpt;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

const LEVELS: &[&str] = &["off", "trace", "debug", "info", "warn", "error"];

#[derive(Debug, Copy, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Default,
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(LogFormat::Default),
            "plain" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Where the events are written. A file can only come from the
/// configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            other => Err(format!("unknown log output '{}'", other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot open log file '{}'", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("a global log subscriber is already installed")]
    AlreadyInstalled(#[source] tracing_subscriber::util::TryInitError),
}

/// `log` section of the configuration file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    #[serde(default, deserialize_with = "deserialize_level")]
    pub level: Option<LevelFilter>,
    pub format: Option<LogFormat>,
    pub output: Option<LogOutput>,
}

fn deserialize_level<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<LevelFilter>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|level| {
            level
                .parse()
                .map_err(|_| D::Error::unknown_variant(&level, LEVELS))
        })
        .transpose()
}

fn parse_level(level: &str) -> Result<LevelFilter, String> {
    level
        .parse()
        .map_err(|_| format!("unknown log level '{}'", level))
}

#[derive(Debug, Default, StructOpt)]
pub struct CliSettings {
    /// minimum severity of the log messages (default "info")
    #[structopt(long, parse(try_from_str = parse_level), possible_values = LEVELS)]
    pub log_level: Option<LevelFilter>,

    /// format of the log messages: "default", "plain" or "json" (default "default")
    #[structopt(long)]
    pub log_format: Option<LogFormat>,

    /// where the log messages go: "stdout" or "stderr" (default "stderr").
    /// A log file can be set in the configuration file.
    #[structopt(long)]
    pub log_output: Option<LogOutput>,
}

/// The resolved settings, plus the overrides that could not be logged yet
/// because no subscriber was installed when they were resolved.
#[derive(Debug)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
    pub output: LogOutput,
    pub overridden: Vec<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: LevelFilter::INFO,
            format: LogFormat::Default,
            output: LogOutput::Stderr,
            overridden: Vec::new(),
        }
    }
}

impl LogSettings {
    pub fn new(command_line: &CliSettings, file: Option<&FileSettings>) -> LogSettings {
        let mut settings = LogSettings::default();

        if let Some(file) = file {
            settings.level = file.level.unwrap_or(settings.level);
            settings.format = file.format.unwrap_or(settings.format);
            if let Some(output) = &file.output {
                settings.output = output.clone();
            }
        }

        let overridden = &mut settings.overridden;
        apply(overridden, "level", &mut settings.level, command_line.log_level);
        apply(overridden, "format", &mut settings.format, command_line.log_format);
        apply(overridden, "output", &mut settings.output, command_line.log_output.clone());

        settings
    }

    /// Install the global subscriber.
    ///
    /// Pending events are flushed when the returned guard is dropped.
    pub fn init_log(self) -> Result<(WorkerGuard, Vec<String>), Error> {
        let (writer, guard) = match &self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
            LogOutput::File(path) => {
                let file = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| Error::File {
                        path: path.clone(),
                        source,
                    })?;
                tracing_appender::non_blocking(file)
            }
        };

        install(self.level, self.format, writer)?;
        Ok((guard, self.overridden))
    }
}

fn apply<T: PartialEq + Debug>(
    overridden: &mut Vec<String>,
    name: &str,
    current: &mut T,
    command_line: Option<T>,
) {
    if let Some(value) = command_line {
        if *current != value {
            overridden.push(format!(
                "log {} overridden from command line: {:?} replaced with {:?}",
                name, current, value
            ));
            *current = value;
        }
    }
}

fn install(level: LevelFilter, format: LogFormat, writer: NonBlocking) -> Result<(), Error> {
    use tracing_subscriber::prelude::*;

    let layer = tracing_subscriber::fmt::Layer::new()
        .with_level(true)
        .with_writer(writer);
    let registry = tracing_subscriber::registry().with(level);
    let installed = match format {
        LogFormat::Default | LogFormat::Plain => registry.with(layer).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    };
    installed.map_err(Error::AlreadyInstalled)
}
