//! Execution gateways: where built commands run and where their files live.
//!
//! [`LocalGateway`] spawns tools on this machine. [`RemoteGateway`] relays
//! the same commands through a [`RemoteTransport`] into a service container.
//! Both expose the [`Workspace`] file operations the resolver relies on, so a
//! configuration resolves the same way whichever side the files live on.

pub mod local;
pub mod remote;

pub use local::LocalGateway;
pub use remote::{RemoteGateway, RemoteSettings, RemoteTransport, SshTransport};

use crate::command::CommandSpec;
use crate::materializer::{parse_coordinates, Coordinates};
use crate::prelude::{PipelineError, PipelineResult};
use crate::telemetry::MetricsRecorder;
use std::path::Path;

/// Access level checked by [`Workspace::probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Exists,
    Read,
    Write,
}

/// File operations on the side of the gateway where tools run.
pub trait Workspace {
    fn probe(&self, path: &Path, access: Access) -> PipelineResult<bool>;
    /// Creates `path` and any missing parents.
    fn ensure_dir(&self, path: &Path) -> PipelineResult<()>;
    /// Removes `path`; a missing file is not an error.
    fn remove_file(&self, path: &Path) -> PipelineResult<()>;
    fn rename(&self, from: &Path, to: &Path) -> PipelineResult<()>;
}

/// Raw result of a captured command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub(crate) fn status_text(&self) -> String {
        match self.status {
            Some(code) => format!("exit status: {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

pub trait ExecutionGateway: Workspace {
    /// Runs `spec` to completion, redirecting its output as `spec` describes.
    fn run(&self, spec: &CommandSpec) -> PipelineResult<()>;

    /// Runs `spec` and returns its stdout and stderr instead of redirecting them.
    fn capture(&self, spec: &CommandSpec) -> PipelineResult<CapturedOutput>;

    /// Reads a two-column coordinate file produced by the projector.
    fn read_coordinates(&self, path: &Path) -> PipelineResult<Coordinates>;

    fn metrics(&self) -> &MetricsRecorder;

    /// Swaps `staged` in place of `target`: remove the original, then rename.
    fn replace(&self, staged: &Path, target: &Path) -> PipelineResult<()> {
        self.remove_file(target)?;
        self.rename(staged, target)
    }
}

/// Fails with [`PipelineError::NotFound`] or [`PipelineError::PermissionDenied`]
/// unless `path` exists and is readable.
pub fn require_readable<W: Workspace + ?Sized>(workspace: &W, path: &Path) -> PipelineResult<()> {
    if !workspace.probe(path, Access::Exists)? {
        return Err(PipelineError::NotFound(path.to_path_buf()));
    }
    if !workspace.probe(path, Access::Read)? {
        return Err(PipelineError::PermissionDenied {
            path: path.to_path_buf(),
            reason: "not readable",
        });
    }
    Ok(())
}

/// Parses coordinates out of captured stdout.
///
/// Unlike reading a local file, an empty capture is an error: the command was
/// expected to emit coordinates, so the captured stderr is surfaced instead.
pub fn coordinates_from_capture(
    spec: &CommandSpec,
    output: &CapturedOutput,
) -> PipelineResult<Coordinates> {
    if !output.success() {
        return Err(PipelineError::ExternalToolFailure {
            tool: spec.tool_name(),
            status: output.status_text(),
            log: None,
        });
    }
    let coordinates = parse_coordinates(&output.stdout)?;
    if coordinates.is_empty() {
        return Err(PipelineError::MalformedOutput(format!(
            "`{spec}` returned no coordinates; stderr: {}",
            output.stderr.trim()
        )));
    }
    Ok(coordinates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_capture_surfaces_stderr() {
        let spec = CommandSpec::new("cat").arg("analysis/xy.dat");
        let output = CapturedOutput {
            status: Some(0),
            stdout: String::new(),
            stderr: "cat: analysis/xy.dat: No such file or directory\n".into(),
        };
        let err = coordinates_from_capture(&spec, &output).unwrap_err();
        match err {
            PipelineError::MalformedOutput(message) => {
                assert!(message.contains("No such file or directory"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn failed_capture_is_tool_failure() {
        let spec = CommandSpec::new("/usr/local/bin/toorpia");
        let output = CapturedOutput {
            status: Some(3),
            ..Default::default()
        };
        let err = coordinates_from_capture(&spec, &output).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ExternalToolFailure { ref tool, .. } if tool == "toorpia"
        ));
    }

    #[test]
    fn capture_parses_pairs() {
        let spec = CommandSpec::new("cat");
        let output = CapturedOutput {
            status: Some(0),
            stdout: "0.5 1.5\n-2 3e2\n".into(),
            stderr: String::new(),
        };
        let coords = coordinates_from_capture(&spec, &output).unwrap();
        assert_eq!(coords.x, vec![0.5, -2.0]);
        assert_eq!(coords.y, vec![1.5, 300.0]);
    }
}
