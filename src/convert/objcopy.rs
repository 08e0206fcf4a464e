use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Command;

/// One call of the external tool turning an ELF image into a raw binary:
///
/// `<objcopy> --binary-architecture=<arch> <input> --strip-all -O binary <output>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjcopyInvocation {
    program: PathBuf,
    architecture: String,
    input: PathBuf,
    output: PathBuf,
}

impl ObjcopyInvocation {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            architecture: String::new(),
            input: PathBuf::new(),
            output: PathBuf::new(),
        }
    }

    pub fn architecture<S: Into<String>>(mut self, architecture: S) -> Self {
        self.architecture = architecture.into();
        self
    }

    pub fn input<P: Into<PathBuf>>(mut self, input: P) -> Self {
        self.input = input.into();
        self
    }

    pub fn output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = output.into();
        self
    }

    pub fn args(&self) -> Vec<OsString> {
        let mut architecture = OsString::from("--binary-architecture=");
        architecture.push(&self.architecture);
        vec![
            architecture,
            self.input.clone().into_os_string(),
            OsString::from("--strip-all"),
            OsString::from("-O"),
            OsString::from("binary"),
            self.output.clone().into_os_string(),
        ]
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.args());
        command
    }
}

impl fmt::Display for ObjcopyInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in self.args() {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How a call of the external tool ended.
#[derive(Debug)]
pub enum ToolOutcome {
    Success,
    /// `code` is `None` when the tool was killed by a signal.
    Failed { code: Option<i32> },
    /// The tool could not be started at all, usually because it is not
    /// installed.
    Unavailable(io::Error),
}

/// Runs the external conversion tool.
pub trait ToolRunner {
    fn run(&mut self, invocation: &ObjcopyInvocation) -> ToolOutcome;
}

/// Spawns the tool as a child process and waits for it to exit.
///
/// The child inherits stdout and stderr so the tool's own diagnostics reach
/// the user.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&mut self, invocation: &ObjcopyInvocation) -> ToolOutcome {
        match invocation.to_command().status() {
            Ok(status) if status.success() => ToolOutcome::Success,
            Ok(status) => ToolOutcome::Failed {
                code: status.code(),
            },
            Err(error) => ToolOutcome::Unavailable(error),
        }
    }
}
