use crate::command::CommandSpec;
use crate::gateway::{coordinates_from_capture, Access, CapturedOutput, ExecutionGateway, Workspace};
use crate::materializer::Coordinates;
use crate::prelude::{PipelineError, PipelineResult};
use crate::telemetry::MetricsRecorder;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const DEFAULT_COMPOSE_CMD: &str = "docker compose";
const SERVICE_NAME: &str = "toorpia";

/// Capability to run one shell command string on the remote host.
pub trait RemoteTransport {
    fn execute(&self, command: &str) -> io::Result<CapturedOutput>;
}

/// Plain `ssh user@host <command>` transport.
pub struct SshTransport {
    destination: String,
}

impl SshTransport {
    pub fn new(user: &str, host: &str) -> Self {
        Self {
            destination: format!("{user}@{host}"),
        }
    }
}

impl RemoteTransport for SshTransport {
    fn execute(&self, command: &str) -> io::Result<CapturedOutput> {
        let output = Command::new("ssh")
            .arg(&self.destination)
            .arg(command)
            .stdin(Stdio::null())
            .output()?;
        Ok(CapturedOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Where the analysis service runs and which user it runs tools as.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteSettings {
    pub ssh_user: String,
    pub ssh_host: String,
    /// Directory holding the compose project on the remote host.
    pub service_dir: PathBuf,
    #[serde(default)]
    pub compose_cmd: Option<String>,
    /// Numeric UID the tools run as inside the container.
    pub analysis_user: String,
    /// Working directory inside the container.
    pub working_dir: PathBuf,
}

impl RemoteSettings {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.ssh_user.is_empty() || self.ssh_host.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "ssh_user and ssh_host must be specified".into(),
            ));
        }
        if !self.service_dir.is_absolute() {
            return Err(PipelineError::InvalidConfig(format!(
                "service_dir must be an absolute path: {}",
                self.service_dir.display()
            )));
        }
        if !self.working_dir.is_absolute() {
            return Err(PipelineError::InvalidConfig(format!(
                "working_dir must be an absolute path: {}",
                self.working_dir.display()
            )));
        }
        if self.analysis_user.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "analysis_user must be specified".into(),
            ));
        }
        if !self.analysis_user.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(PipelineError::InvalidConfig(format!(
                "analysis_user must be specified as a UID: {}",
                self.analysis_user
            )));
        }
        Ok(())
    }

    fn compose_cmd(&self) -> &str {
        self.compose_cmd
            .as_deref()
            .filter(|cmd| !cmd.trim().is_empty())
            .unwrap_or(DEFAULT_COMPOSE_CMD)
    }
}

/// Relays commands into the analysis service container on a remote host.
///
/// Each command runs as `sh -c` inside the container, so redirections and
/// relative paths resolve against the container's working directory.
pub struct RemoteGateway<T: RemoteTransport> {
    transport: T,
    prefix: String,
    metrics: MetricsRecorder,
}

impl RemoteGateway<SshTransport> {
    pub fn connect(settings: &RemoteSettings) -> PipelineResult<Self> {
        Self::with_transport(
            settings,
            SshTransport::new(&settings.ssh_user, &settings.ssh_host),
        )
    }
}

impl<T: RemoteTransport> RemoteGateway<T> {
    pub fn with_transport(settings: &RemoteSettings, transport: T) -> PipelineResult<Self> {
        settings.validate()?;
        let prefix = format!(
            "cd {}; {} exec -T -u {} -w {} {}",
            shell_quote(&settings.service_dir.to_string_lossy()),
            settings.compose_cmd(),
            settings.analysis_user,
            shell_quote(&settings.working_dir.to_string_lossy()),
            SERVICE_NAME,
        );
        Ok(Self {
            transport,
            prefix,
            metrics: MetricsRecorder::new(),
        })
    }

    /// Full command string handed to the transport for `inner`.
    pub fn remote_command(&self, inner: &str) -> String {
        format!("{} sh -c {}", self.prefix, shell_quote(inner))
    }

    fn execute(&self, inner: &str) -> PipelineResult<CapturedOutput> {
        let command = self.remote_command(inner);
        self.metrics.record_command();
        self.transport.execute(&command).map_err(|source| {
            self.metrics.record_failure();
            PipelineError::Spawn {
                program: "remote transport".into(),
                source,
            }
        })
    }

    /// Runs a shell utility whose non-zero exit is always a failure.
    fn utility(&self, words: &[&str]) -> PipelineResult<()> {
        let output = self.execute(&quote_words(words))?;
        if !output.success() {
            self.metrics.record_failure();
            return Err(PipelineError::ExternalToolFailure {
                tool: words.first().copied().unwrap_or_default().to_string(),
                status: format!("{}: {}", output.status_text(), output.stderr.trim()),
                log: None,
            });
        }
        Ok(())
    }
}

impl<T: RemoteTransport> Workspace for RemoteGateway<T> {
    fn probe(&self, path: &Path, access: Access) -> PipelineResult<bool> {
        let flag = match access {
            Access::Exists => "-e",
            Access::Read => "-r",
            Access::Write => "-w",
        };
        let path = path.to_string_lossy();
        let output = self.execute(&quote_words(&["test", flag, &path]))?;
        // `test` itself is silent; stderr on exit 1 means the exec wrapper failed.
        match output.status {
            Some(0) => Ok(true),
            Some(1) if output.stderr.trim().is_empty() => Ok(false),
            _ => {
                self.metrics.record_failure();
                Err(PipelineError::ExternalToolFailure {
                    tool: "test".into(),
                    status: format!("{}: {}", output.status_text(), output.stderr.trim()),
                    log: None,
                })
            }
        }
    }

    fn ensure_dir(&self, path: &Path) -> PipelineResult<()> {
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        self.utility(&["mkdir", "-p", &path.to_string_lossy()])
    }

    fn remove_file(&self, path: &Path) -> PipelineResult<()> {
        self.utility(&["rm", "-f", &path.to_string_lossy()])
    }

    fn rename(&self, from: &Path, to: &Path) -> PipelineResult<()> {
        self.utility(&["mv", "-f", &from.to_string_lossy(), &to.to_string_lossy()])
    }
}

impl<T: RemoteTransport> ExecutionGateway for RemoteGateway<T> {
    fn run(&self, spec: &CommandSpec) -> PipelineResult<()> {
        let mut inner = quote_spec(spec);
        match &spec.stdout {
            Some(path) => inner.push_str(&format!(" > {}", shell_quote(&path.to_string_lossy()))),
            None => inner.push_str(" > /dev/null"),
        }
        if let Some(path) = &spec.stderr {
            inner.push_str(&format!(" 2> {}", shell_quote(&path.to_string_lossy())));
        }
        info!("running remotely: {inner}");

        let output = self.execute(&inner)?;
        if !output.success() {
            self.metrics.record_failure();
            let failure = PipelineError::ExternalToolFailure {
                tool: spec.tool_name(),
                status: output.status_text(),
                log: spec.stderr.clone(),
            };
            error!("{failure}");
            return Err(failure);
        }
        Ok(())
    }

    fn capture(&self, spec: &CommandSpec) -> PipelineResult<CapturedOutput> {
        info!("capturing remotely: {spec}");
        let output = self.execute(&quote_spec(spec))?;
        if !output.success() {
            self.metrics.record_failure();
        }
        Ok(output)
    }

    fn read_coordinates(&self, path: &Path) -> PipelineResult<Coordinates> {
        let spec = CommandSpec::new("cat").path_arg(path);
        let output = self.capture(&spec)?;
        coordinates_from_capture(&spec, &output)
    }

    fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }
}

fn quote_spec(spec: &CommandSpec) -> String {
    let mut words = vec![spec.program.as_str()];
    words.extend(spec.args.iter().map(String::as_str));
    quote_words(&words)
}

fn quote_words(words: &[&str]) -> String {
    words
        .iter()
        .map(|word| shell_quote(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quotes `word` for a POSIX shell, leaving plain words untouched.
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=+,@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
