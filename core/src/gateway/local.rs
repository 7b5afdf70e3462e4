use crate::command::CommandSpec;
use crate::gateway::{Access, CapturedOutput, ExecutionGateway, Workspace};
use crate::materializer::{read_coordinates, Coordinates};
use crate::prelude::{PipelineError, PipelineResult};
use crate::telemetry::MetricsRecorder;
use log::{debug, error, info};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Runs tools as local subprocesses, blocking until each one exits.
#[derive(Default)]
pub struct LocalGateway {
    metrics: MetricsRecorder,
}

impl LocalGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        command
    }

    fn create(path: &Path) -> PipelineResult<File> {
        File::create(path).map_err(|source| PipelineError::io(path, source))
    }
}

impl Workspace for LocalGateway {
    fn probe(&self, path: &Path, access: Access) -> PipelineResult<bool> {
        let exists = path
            .try_exists()
            .map_err(|source| PipelineError::io(path, source))?;
        if !exists {
            return Ok(false);
        }
        Ok(match access {
            Access::Exists => true,
            Access::Read if path.is_dir() => fs::read_dir(path).is_ok(),
            Access::Read => File::open(path).is_ok(),
            Access::Write if path.is_dir() => tempfile::Builder::new()
                .prefix(".write-probe")
                .tempfile_in(path)
                .is_ok(),
            Access::Write => OpenOptions::new().append(true).open(path).is_ok(),
        })
    }

    fn ensure_dir(&self, path: &Path) -> PipelineResult<()> {
        if path.as_os_str().is_empty() || path.is_dir() {
            return Ok(());
        }
        debug!("creating directory {}", path.display());
        fs::create_dir_all(path).map_err(|source| PipelineError::io(path, source))
    }

    fn remove_file(&self, path: &Path) -> PipelineResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PipelineError::io(path, source)),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> PipelineResult<()> {
        fs::rename(from, to).map_err(|source| PipelineError::io(from, source))
    }
}

impl ExecutionGateway for LocalGateway {
    fn run(&self, spec: &CommandSpec) -> PipelineResult<()> {
        info!("running {spec}");
        let mut command = Self::command(spec);
        command.stdout(match &spec.stdout {
            Some(path) => Stdio::from(Self::create(path)?),
            None => Stdio::null(),
        });
        command.stderr(match &spec.stderr {
            Some(path) => Stdio::from(Self::create(path)?),
            None => Stdio::inherit(),
        });

        self.metrics.record_command();
        let status = command.status().map_err(|source| {
            self.metrics.record_failure();
            PipelineError::Spawn {
                program: spec.program.clone(),
                source,
            }
        })?;
        if !status.success() {
            self.metrics.record_failure();
            let failure = PipelineError::ExternalToolFailure {
                tool: spec.tool_name(),
                status: status.to_string(),
                log: spec.stderr.clone(),
            };
            error!("{failure}");
            return Err(failure);
        }
        Ok(())
    }

    fn capture(&self, spec: &CommandSpec) -> PipelineResult<CapturedOutput> {
        info!("capturing {spec}");
        self.metrics.record_command();
        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| {
                self.metrics.record_failure();
                PipelineError::Spawn {
                    program: spec.program.clone(),
                    source,
                }
            })?;
        if !output.status.success() {
            self.metrics.record_failure();
        }
        Ok(CapturedOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn read_coordinates(&self, path: &Path) -> PipelineResult<Coordinates> {
        read_coordinates(path)
    }

    fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_distinguishes_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = LocalGateway::new();
        let file = dir.path().join("segments.csv");
        assert!(!gateway.probe(&file, Access::Exists).unwrap());
        fs::write(&file, b"1,2\n").unwrap();
        assert!(gateway.probe(&file, Access::Exists).unwrap());
        assert!(gateway.probe(&file, Access::Read).unwrap());
        assert!(gateway.probe(dir.path(), Access::Write).unwrap());
    }

    #[test]
    fn replace_swaps_staged_file_in() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = LocalGateway::new();
        let target = dir.path().join("segments.csv");
        let staged = dir.path().join("masked_segment.csv");
        fs::write(&target, b"raw\n").unwrap();
        fs::write(&staged, b"filtered\n").unwrap();

        gateway.replace(&staged, &target).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "filtered\n");
        assert!(!staged.exists());
    }

    #[test]
    fn removing_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        LocalGateway::new()
            .remove_file(&dir.path().join("absent"))
            .unwrap();
    }

    #[test]
    fn unknown_program_is_spawn_error() {
        let gateway = LocalGateway::new();
        let spec = CommandSpec::new("definitely-not-an-installed-tool-7f3a");
        assert!(matches!(
            gateway.run(&spec),
            Err(PipelineError::Spawn { .. })
        ));
        assert_eq!(gateway.metrics().snapshot().failures, 1);
    }

    #[cfg(unix)]
    #[test]
    fn run_redirects_stdout_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("xy.dat");
        let log = dir.path().join("xy.dat.log");
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg("echo '1.0 2.0'; echo warning >&2")
            .stdout_to(&out)
            .stderr_to(&log);

        let gateway = LocalGateway::new();
        gateway.run(&spec).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "1.0 2.0\n");
        assert_eq!(fs::read_to_string(&log).unwrap(), "warning\n");
        assert_eq!(gateway.read_coordinates(&out).unwrap().x, vec![1.0]);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_reports_log_path() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("segments.csv.log");
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg("exit 3")
            .stdout_to(&dir.path().join("segments.csv"))
            .stderr_to(&log);

        match LocalGateway::new().run(&spec) {
            Err(PipelineError::ExternalToolFailure { tool, log: Some(path), .. }) => {
                assert_eq!(tool, "sh");
                assert_eq!(path, log);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn capture_collects_streams() {
        let spec = CommandSpec::new("sh").arg("-c").arg("echo 4 5; echo oops >&2");
        let output = LocalGateway::new().capture(&spec).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "4 5\n");
        assert_eq!(output.stderr, "oops\n");
    }
}
