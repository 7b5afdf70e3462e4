pub mod process;

pub use process::ProcessVisualizer;

use serde::{Deserialize, Serialize};

/// Executables used to open the visualization front ends.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// When false, no front end is ever started.
    pub enabled: bool,
    pub map_inspector: String,
    pub monitoring_scope: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            map_inspector: "map_inspector".to_string(),
            monitoring_scope: "monitoring_scope".to_string(),
        }
    }
}
