pub mod convert;
pub mod settings;

use settings::logging::{CliSettings, LogSettings};
use settings::Config;
use std::error::Error;
use std::path::PathBuf;
use structopt::StructOpt;

/// Turn built ELF images into raw binaries
#[derive(StructOpt)]
#[structopt(name = "elfbin", rename_all = "kebab-case")]
pub struct ElfBin {
    /// YAML configuration file, values given on the command line take
    /// precedence over the ones in this file.
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    #[structopt(flatten)]
    log: CliSettings,

    #[structopt(subcommand)]
    command: Option<ElfBinCommand>,
}

/// Turn built ELF images into raw binaries
#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case")]
pub enum ElfBinCommand {
    /// Convert each image with objcopy and keep an `.elf` copy next to it
    Convert(convert::Convert),
}

impl ElfBin {
    pub fn exec(self) -> Result<(), Box<dyn Error>> {
        use std::io::Write as _;

        let config = Config::load_opt(self.config.as_deref())?;
        let log_file = config.as_ref().and_then(|config| config.log.as_ref());
        let (guard, overridden) = LogSettings::new(&self.log, log_file).init_log()?;
        for msg in &overridden {
            tracing::info!("{}", msg);
        }

        if let Some(cmd) = self.command {
            cmd.exec(config.as_ref())
        } else {
            // exit skips destructors, flush the log writer first
            drop(guard);
            writeln!(std::io::stderr(), "No command, try `--help'")?;
            std::process::exit(1);
        }
    }
}

impl ElfBinCommand {
    pub fn exec(self, config: Option<&Config>) -> Result<(), Box<dyn Error>> {
        match self {
            ElfBinCommand::Convert(convert) => convert.exec(config)?,
        };
        Ok(())
    }
}
