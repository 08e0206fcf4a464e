//! Turn built ELF images into raw binaries.
//!
//! Every image goes through two steps, in the order the images were given:
//! the external objcopy tool writes `<image><binary suffix>`, then the image
//! itself is copied to `<image><copy suffix>`. The tool's exit status never
//! stops the batch, a failed copy does.

mod image;
mod objcopy;

pub use self::image::{parse_images, ElfImage};
pub use self::objcopy::{ObjcopyInvocation, SystemRunner, ToolOutcome, ToolRunner};

use crate::settings::{self, Config, ConvertSettings, Overrides};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::PathBuf;
use structopt::StructOpt;
use thiserror::Error;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case")]
pub struct Convert {
    /// objcopy program to run, a name looked up in PATH or a path.
    /// If not configured anywhere, defaults to "rust-objcopy".
    #[structopt(long, parse(from_os_str))]
    objcopy: Option<PathBuf>,

    /// value of `--binary-architecture` given to objcopy.
    /// If not configured anywhere, defaults to "riscv64".
    #[structopt(long)]
    architecture: Option<String>,

    /// suffix appended to each image to name the raw binary (default ".bin")
    #[structopt(long)]
    binary_suffix: Option<String>,

    /// suffix appended to each image to name its copy (default ".elf")
    #[structopt(long)]
    copy_suffix: Option<String>,

    /// whitespace separated list of the ELF images to process
    #[structopt(name = "ELFS", parse(from_os_str))]
    elfs: Option<OsString>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid settings")]
    Settings(#[from] settings::Error),
    #[error("cannot copy '{}' to '{}'", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Convert {
    pub fn exec(self, config: Option<&Config>) -> Result<(), Error> {
        let overrides = Overrides {
            objcopy: self.objcopy,
            architecture: self.architecture,
            binary_suffix: self.binary_suffix,
            copy_suffix: self.copy_suffix,
        };
        let settings = ConvertSettings::new(overrides, config)?;
        let elfs = self.elfs.unwrap_or_default();
        BatchConverter::new(SystemRunner, settings).run(&elfs)
    }
}

pub struct BatchConverter<R> {
    runner: R,
    settings: ConvertSettings,
}

impl<R: ToolRunner> BatchConverter<R> {
    pub fn new(runner: R, settings: ConvertSettings) -> Self {
        Self { runner, settings }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn run<S: AsRef<OsStr> + ?Sized>(&mut self, elfs: &S) -> Result<(), Error> {
        let images = parse_images(elfs);
        for image in &images {
            self.process(image)?;
        }
        tracing::info!(count = images.len(), "all images processed");
        Ok(())
    }

    pub fn process(&mut self, image: &ElfImage) -> Result<(), Error> {
        let span = tracing::info_span!("image", path = %image.path().display());
        let _enter = span.enter();

        let invocation = ObjcopyInvocation::new(&self.settings.objcopy)
            .architecture(self.settings.architecture.as_str())
            .input(image.path())
            .output(image.binary_output(&self.settings.binary_suffix));
        tracing::debug!(command = %invocation, "running objcopy");

        match self.runner.run(&invocation) {
            ToolOutcome::Success => {}
            ToolOutcome::Failed { code } => {
                tracing::warn!(?code, "objcopy failed, the raw binary may be missing");
            }
            ToolOutcome::Unavailable(error) => tracing::warn!(
                program = %self.settings.objcopy.display(),
                %error,
                "cannot run objcopy, the raw binary was not produced"
            ),
        }

        let copy = image.copy_output(&self.settings.copy_suffix);
        fs::copy(image.path(), &copy).map_err(|source| Error::Copy {
            from: image.path().to_path_buf(),
            to: copy.clone(),
            source,
        })?;
        tracing::info!(copy = %copy.display(), "image processed");
        Ok(())
    }
}
