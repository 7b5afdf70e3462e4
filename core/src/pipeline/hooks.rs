use log::debug;
use std::path::PathBuf;

/// Inputs handed to the map inspector front end.
#[derive(Debug, Clone, PartialEq)]
pub struct MapInspectorRequest {
    pub segment: PathBuf,
    pub xy: PathBuf,
    pub status: PathBuf,
    /// Add-plot coordinates overlaid on the base map.
    pub addplot: Option<PathBuf>,
    pub sharable: bool,
    pub working_dir: PathBuf,
    /// Raw CSV shown next to the map; only set for single-file runs.
    pub rawcsv: Option<PathBuf>,
}

/// Inputs handed to the monitoring scope front end.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringScopeRequest {
    pub base_xy: PathBuf,
    pub add_segment: PathBuf,
    pub add_xy: PathBuf,
    pub status: PathBuf,
    pub sharable: bool,
}

/// Fire-and-forget launchers for the visualization front ends.
///
/// Implementations must not fail the pipeline; a launcher that cannot start
/// reports the problem through the log instead.
pub trait Visualizer {
    fn open_map_inspector(&self, request: &MapInspectorRequest);
    fn open_monitoring_scope(&self, request: &MonitoringScopeRequest);
}

/// Visualizer that launches nothing.
pub struct NullVisualizer;

impl Visualizer for NullVisualizer {
    fn open_map_inspector(&self, request: &MapInspectorRequest) {
        debug!("map inspector not launched for {}", request.xy.display());
    }

    fn open_monitoring_scope(&self, request: &MonitoringScopeRequest) {
        debug!("monitoring scope not launched for {}", request.add_xy.display());
    }
}
