use crate::launcher::ProcessVisualizer;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::info;
use piacore::gateway::{ExecutionGateway, LocalGateway, RemoteGateway, RemoteSettings};
use piacore::pipeline::{NullVisualizer, Pipeline, Visualizer};
use piacore::telemetry::Metrics;
use piacore::{Coordinates, PipelineOptions, SegmentTarget};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    TypeWeight,
    Basemap,
    OpenBasemap,
    Addplot,
    Filter(SegmentTarget),
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Self::TypeWeight => "type-weight",
            Self::Basemap => "basemap",
            Self::OpenBasemap => "open-basemap",
            Self::Addplot => "addplot",
            Self::Filter(_) => "filter",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    TypeWeight(PathBuf),
    Coordinates(Coordinates),
    Filtered,
}

pub struct WorkflowResult {
    pub outcome: Outcome,
    pub metrics: Metrics,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, operation: Operation) -> anyhow::Result<WorkflowResult> {
        match &self.config.remote {
            Some(settings) => {
                let gateway =
                    RemoteGateway::connect(settings).context("configuring remote gateway")?;
                info!("running {} on {}", operation.name(), settings.ssh_host);
                self.run(
                    Pipeline::new(gateway),
                    &self.remote_options(settings),
                    operation,
                )
            }
            None => {
                let pipeline =
                    Pipeline::new(LocalGateway::new()).with_visualizer(self.visualizer());
                self.run(pipeline, &self.config.options, operation)
            }
        }
    }

    fn run<G: ExecutionGateway>(
        &self,
        pipeline: Pipeline<G>,
        options: &PipelineOptions,
        operation: Operation,
    ) -> anyhow::Result<WorkflowResult> {
        let pipeline = pipeline.with_tools(self.config.tools.clone().unwrap_or_default());
        let outcome = match operation {
            Operation::TypeWeight => pipeline.create_type_weight(options).map(Outcome::TypeWeight),
            Operation::Basemap => pipeline.create_basemap(options).map(Outcome::Coordinates),
            Operation::OpenBasemap => pipeline.open_basemap(options).map(Outcome::Coordinates),
            Operation::Addplot => pipeline.addplot(options).map(Outcome::Coordinates),
            Operation::Filter(target) => pipeline
                .apply_filter(options, target)
                .map(|()| Outcome::Filtered),
        };

        let metrics = pipeline.gateway().metrics().snapshot();
        info!(
            "{}: {} commands run, {} failed",
            operation.name(),
            metrics.commands,
            metrics.failures
        );
        let outcome = outcome.with_context(|| format!("running {}", operation.name()))?;
        Ok(WorkflowResult { outcome, metrics })
    }

    fn visualizer(&self) -> Box<dyn Visualizer> {
        match &self.config.launchers {
            Some(launchers) if !launchers.enabled => Box::new(NullVisualizer),
            launchers => Box::new(ProcessVisualizer::new(launchers.clone().unwrap_or_default())),
        }
    }

    /// Options for a remote run; the container's working directory is the default.
    fn remote_options(&self, settings: &RemoteSettings) -> PipelineOptions {
        let mut options = self.config.options.clone();
        if options.working_dir.is_none() {
            options.working_dir = Some(settings.working_dir.clone());
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::LauncherConfig;
    use piacore::command::ToolPaths;
    use std::fs;
    use std::path::Path;

    fn local_config(dir: &Path, rawdata: &str, tool: &str) -> WorkflowConfig {
        let raw = dir.join(rawdata);
        fs::write(&raw, b"raw\n").unwrap();
        let mut cfg = WorkflowConfig::from_options(PipelineOptions {
            working_dir: Some(dir.join("analysis")),
            ..PipelineOptions::with_rawdata([raw])
        });
        cfg.tools = Some(ToolPaths {
            table_segmenter: tool.into(),
            sound_segmenter: tool.into(),
            projector: tool.into(),
            filter: tool.into(),
        });
        cfg.launchers = Some(LauncherConfig {
            enabled: false,
            ..LauncherConfig::default()
        });
        cfg
    }

    #[cfg(unix)]
    #[test]
    fn runner_executes_basemap_locally() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(local_config(dir.path(), "signal.wav", "true"));
        let result = runner.execute(Operation::Basemap).unwrap();

        assert_eq!(result.outcome, Outcome::Coordinates(Coordinates::default()));
        assert_eq!(result.metrics.commands, 2);
        assert_eq!(result.metrics.failures, 0);
        assert!(dir.path().join("analysis/segments.csv").exists());
        assert!(dir.path().join("analysis/segments.csv.log").exists());
    }

    #[cfg(unix)]
    #[test]
    fn tool_failure_is_reported_with_operation() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(local_config(dir.path(), "signal.wav", "false"));
        let err = runner.execute(Operation::Basemap).err().unwrap();
        let message = format!("{err:#}");
        assert!(message.starts_with("running basemap"));
        assert!(message.contains("false command failed"));
        assert!(!dir.path().join("analysis/xy.dat").exists());
    }

    #[cfg(unix)]
    #[test]
    fn type_weight_returns_generated_path() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(local_config(dir.path(), "plant.csv", "true"));
        let result = runner.execute(Operation::TypeWeight).unwrap();
        assert_eq!(
            result.outcome,
            Outcome::TypeWeight(dir.path().join("analysis/type_weight.csv"))
        );
    }

    #[test]
    fn ambiguous_csv_fails_before_running_tools() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(local_config(dir.path(), "plant.csv", "true"));
        let err = runner.execute(Operation::Basemap).err().unwrap();
        assert!(format!("{err:#}").contains("cannot infer rawdata type"));
    }

    #[test]
    fn remote_runs_default_to_container_working_dir() {
        let settings = RemoteSettings {
            ssh_user: "pia".into(),
            ssh_host: "analysis.local".into(),
            service_dir: "/srv/toorpia".into(),
            compose_cmd: None,
            analysis_user: "1000".into(),
            working_dir: "/work".into(),
        };
        let runner = Runner::new(WorkflowConfig::from_options(PipelineOptions::with_rawdata([
            "/work/signal.wav",
        ])));
        assert_eq!(
            runner.remote_options(&settings).working_dir,
            Some(PathBuf::from("/work"))
        );
    }
}
