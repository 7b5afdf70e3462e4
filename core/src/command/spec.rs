use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A structured external command: program, ordered arguments and where its
/// output streams go. Never rendered through a local shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// File receiving stdout; `None` discards it.
    pub stdout: Option<PathBuf>,
    /// Log file receiving stderr; `None` inherits the caller's stderr.
    pub stderr: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout: None,
            stderr: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path_string(path))
    }

    /// Appends `flag value`.
    pub fn flag(self, flag: &str, value: impl fmt::Display) -> Self {
        self.arg(flag).arg(value.to_string())
    }

    /// Appends `flag value` only when a value is present.
    pub fn flag_opt<T: fmt::Display>(self, flag: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.flag(flag, value),
            None => self,
        }
    }

    pub fn stdout_to(mut self, path: &Path) -> Self {
        self.stdout = Some(path.to_path_buf());
        self
    }

    pub fn stderr_to(mut self, path: &Path) -> Self {
        self.stderr = Some(path.to_path_buf());
        self
    }

    /// Executable name without its directory, used in failure reports.
    pub fn tool_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.clone())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

pub(crate) fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Executables of the external toolchain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolPaths {
    pub table_segmenter: String,
    pub sound_segmenter: String,
    pub projector: String,
    pub filter: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            table_segmenter: "mkcsvseg".to_string(),
            sound_segmenter: "mkfftseg".to_string(),
            projector: "toorpia".to_string(),
            filter: "/usr/local/bin/filter".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_optional_flag_is_skipped() {
        let spec = CommandSpec::new("mkfftseg")
            .flag_opt("-hp", None::<f64>)
            .flag_opt("-lp", Some(8000.0))
            .flag("-wl", 1024);
        assert_eq!(spec.args, vec!["-lp", "8000", "-wl", "1024"]);
    }

    #[test]
    fn tool_name_strips_directory() {
        assert_eq!(CommandSpec::new("/usr/local/bin/filter").tool_name(), "filter");
        assert_eq!(CommandSpec::new("toorpia").tool_name(), "toorpia");
    }

    #[test]
    fn display_joins_arguments() {
        let spec = CommandSpec::new("toorpia").arg("-m").arg("base");
        assert_eq!(spec.to_string(), "toorpia -m base");
    }
}
