use crate::launcher::LauncherConfig;
use anyhow::Context;
use piacore::command::ToolPaths;
use piacore::gateway::RemoteSettings;
use piacore::PipelineOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything a run needs besides the operation itself.
///
/// Without a `remote` section tools run on this machine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowConfig {
    pub options: PipelineOptions,
    pub remote: Option<RemoteSettings>,
    pub tools: Option<ToolPaths>,
    pub launchers: Option<LauncherConfig>,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_options(options: PipelineOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Layers command-line options over the ones loaded from YAML.
    pub fn with_overrides(mut self, overrides: PipelineOptions) -> Self {
        self.options.merge(overrides);
        self
    }
}
