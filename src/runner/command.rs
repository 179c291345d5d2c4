//! Command description and captured result

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

/// A command line plus any extra environment variables for the child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Program given as a filesystem path (e.g. an extracted binary)
    pub fn from_path(program: &Path) -> Self {
        Self::new(program.display().to_string())
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn envs<I>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.envs.extend(envs);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_envs(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.envs
            .iter()
            .map(|(k, v)| (OsStr::new(k.as_str()), OsStr::new(v.as_str())))
    }
}

/// Environment values are left out: they may carry credentials.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,

    /// Combined stdout and stderr (empty in interactive mode)
    pub output: String,
}

impl CommandOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            output: output.into(),
        }
    }

    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            output: output.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}
