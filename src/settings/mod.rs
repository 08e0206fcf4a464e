pub mod logging;

use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_OBJCOPY: &str = "rust-objcopy";
pub const DEFAULT_ARCHITECTURE: &str = "riscv64";
pub const DEFAULT_BINARY_SUFFIX: &str = ".bin";
pub const DEFAULT_COPY_SUFFIX: &str = ".elf";

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read configuration file '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed configuration file")]
    Format(#[from] serde_yaml::Error),
    #[error("the {0} suffix must not be empty")]
    EmptySuffix(&'static str),
}

/// Content of the YAML file given with `--config`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub objcopy: Option<PathBuf>,
    pub architecture: Option<String>,
    pub binary_suffix: Option<String>,
    pub copy_suffix: Option<String>,
    pub log: Option<logging::FileSettings>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, Error> {
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// `None` when no configuration file was given.
    pub fn load_opt(path: Option<&Path>) -> Result<Option<Config>, Error> {
        path.map(Config::load).transpose()
    }
}

/// Everything the converter needs to know about the external tool and the
/// names of the files it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSettings {
    pub objcopy: PathBuf,
    pub architecture: String,
    pub binary_suffix: String,
    pub copy_suffix: String,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        ConvertSettings {
            objcopy: PathBuf::from(DEFAULT_OBJCOPY),
            architecture: DEFAULT_ARCHITECTURE.to_owned(),
            binary_suffix: DEFAULT_BINARY_SUFFIX.to_owned(),
            copy_suffix: DEFAULT_COPY_SUFFIX.to_owned(),
        }
    }
}

/// Values given on the command line, they win over the configuration file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub objcopy: Option<PathBuf>,
    pub architecture: Option<String>,
    pub binary_suffix: Option<String>,
    pub copy_suffix: Option<String>,
}

impl ConvertSettings {
    pub fn new(command_line: Overrides, file: Option<&Config>) -> Result<Self, Error> {
        let mut settings = ConvertSettings::default();

        if let Some(cfg) = file {
            if let Some(objcopy) = &cfg.objcopy {
                settings.objcopy = objcopy.clone();
            }
            if let Some(architecture) = &cfg.architecture {
                settings.architecture = architecture.clone();
            }
            if let Some(suffix) = &cfg.binary_suffix {
                settings.binary_suffix = suffix.clone();
            }
            if let Some(suffix) = &cfg.copy_suffix {
                settings.copy_suffix = suffix.clone();
            }
        }

        if let Some(objcopy) = command_line.objcopy {
            settings.objcopy = objcopy;
        }
        if let Some(architecture) = command_line.architecture {
            settings.architecture = architecture;
        }
        if let Some(suffix) = command_line.binary_suffix {
            settings.binary_suffix = suffix;
        }
        if let Some(suffix) = command_line.copy_suffix {
            settings.copy_suffix = suffix;
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.binary_suffix.is_empty() {
            return Err(Error::EmptySuffix("binary"));
        }
        if self.copy_suffix.is_empty() {
            return Err(Error::EmptySuffix("copy"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::NamedTempFile;

    #[test]
    fn defaults_match_the_riscv_layout() {
        let settings = ConvertSettings::new(Overrides::default(), None).unwrap();
        assert_eq!(settings.objcopy, PathBuf::from("rust-objcopy"));
        assert_eq!(settings.architecture, "riscv64");
        assert_eq!(settings.binary_suffix, ".bin");
        assert_eq!(settings.copy_suffix, ".elf");
    }

    #[test]
    fn file_overrides_defaults_and_command_line_overrides_file() {
        let file: Config = serde_yaml::from_str(
            r#"
            objcopy: llvm-objcopy
            architecture: riscv32
            copy_suffix: .orig
            "#,
        )
        .unwrap();
        let command_line = Overrides {
            architecture: Some("aarch64".to_owned()),
            ..Overrides::default()
        };

        let settings = ConvertSettings::new(command_line, Some(&file)).unwrap();

        assert_eq!(settings.objcopy, PathBuf::from("llvm-objcopy"));
        assert_eq!(settings.architecture, "aarch64");
        assert_eq!(settings.binary_suffix, ".bin");
        assert_eq!(settings.copy_suffix, ".orig");
    }

    #[test]
    fn empty_suffix_is_rejected() {
        let command_line = Overrides {
            binary_suffix: Some(String::new()),
            ..Overrides::default()
        };
        let error = ConvertSettings::new(command_line, None).unwrap_err();
        assert!(matches!(error, Error::EmptySuffix("binary")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str("strip: false");
        assert!(result.is_err());
    }

    #[test]
    fn load_reads_log_section() {
        let file = NamedTempFile::new("elfbin.yaml").unwrap();
        file.write_str("architecture: riscv64\nlog:\n  level: debug\n  format: json\n")
            .unwrap();

        let config = Config::load(file.path()).unwrap();
        let log = config.log.unwrap();

        assert_eq!(log.level, Some(tracing::level_filters::LevelFilter::DEBUG));
        assert_eq!(log.format, Some(logging::LogFormat::Json));
        assert_eq!(log.output, None);
    }

    #[test]
    fn missing_file_names_the_path() {
        let error = Config::load(Path::new("does/not/exist.yaml")).unwrap_err();
        assert!(error.to_string().contains("does/not/exist.yaml"));
    }
}
