//! The user-facing operations: resolve, build, execute, materialize.
//!
//! Each operation resolves its options completely before the first external
//! command starts. Once commands run, the first failure halts the operation
//! and files already written are left in place.

pub mod hooks;

pub use hooks::{MapInspectorRequest, MonitoringScopeRequest, NullVisualizer, Visualizer};

use crate::command::{
    add_projection_command, base_projection_command, filter_command, segment_command,
    type_weight_command, ToolPaths,
};
use crate::config::{FilterPlan, PipelineOptions, ResolvedConfig, Resolver, SegmentTarget};
use crate::gateway::ExecutionGateway;
use crate::materializer::Coordinates;
use crate::prelude::{PipelineError, PipelineResult};
use crate::telemetry::LogManager;
use std::path::PathBuf;

pub struct Pipeline<G: ExecutionGateway> {
    gateway: G,
    tools: ToolPaths,
    visualizer: Box<dyn Visualizer>,
    logger: LogManager,
}

impl<G: ExecutionGateway> Pipeline<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            tools: ToolPaths::default(),
            visualizer: Box::new(NullVisualizer),
            logger: LogManager::for_component("pipeline"),
        }
    }

    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_visualizer(mut self, visualizer: Box<dyn Visualizer>) -> Self {
        self.visualizer = visualizer;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    fn resolver(&self) -> Resolver<'_, G> {
        Resolver::new(&self.gateway)
    }

    /// Generates the type weight file for table data and returns its path.
    ///
    /// A stale file at the target path is removed first.
    pub fn create_type_weight(&self, options: &PipelineOptions) -> PipelineResult<PathBuf> {
        let plan = self.resolver().resolve_type_weight(options)?;
        self.gateway.remove_file(&plan.type_weight)?;
        self.gateway.run(&type_weight_command(&plan, &self.tools))?;
        self.logger.record(&format!(
            "type weight written to {}; edit and save it before creating a base map",
            plan.type_weight.display()
        ));
        Ok(plan.type_weight)
    }

    /// Extracts base segments, projects them and returns the base map coordinates.
    pub fn create_basemap(&self, options: &PipelineOptions) -> PipelineResult<Coordinates> {
        let config = self.resolver().resolve_basemap(options)?;
        self.gateway
            .run(&segment_command(&config, &config.base.segment, &self.tools))?;
        if let Some(plan) = FilterPlan::for_config(&config, SegmentTarget::Base) {
            self.run_filter(&plan)?;
        }
        self.gateway
            .run(&base_projection_command(&config.base, &self.tools))?;

        if config.visualization.map_inspector {
            self.visualizer
                .open_map_inspector(&base_map_request(&config));
        }
        self.gateway.read_coordinates(&config.base.xy)
    }

    /// Reopens an existing base map without running any tool.
    pub fn open_basemap(&self, options: &PipelineOptions) -> PipelineResult<Coordinates> {
        let basemap = self.resolver().resolve_existing_basemap(options)?;
        if basemap.visualization.map_inspector {
            self.visualizer.open_map_inspector(&MapInspectorRequest {
                segment: basemap.base.segment.clone(),
                xy: basemap.base.xy.clone(),
                status: basemap.base.status.clone(),
                addplot: None,
                sharable: basemap.visualization.map_inspector_sharable,
                working_dir: basemap.working_dir.clone(),
                rawcsv: basemap.single_rawdata().map(PathBuf::from),
            });
        }
        self.gateway.read_coordinates(&basemap.base.xy)
    }

    /// Projects new data onto an existing base map and returns its coordinates.
    pub fn addplot(&self, options: &PipelineOptions) -> PipelineResult<Coordinates> {
        let config = self.resolver().resolve_addplot(options)?;
        let Some(add) = config.add.as_ref() else {
            return Err(PipelineError::MissingPrecondition(
                "add-plot outputs were not resolved".into(),
            ));
        };
        self.gateway
            .run(&segment_command(&config, &add.segment, &self.tools))?;
        if let Some(plan) = FilterPlan::for_config(&config, SegmentTarget::Add) {
            self.run_filter(&plan)?;
        }
        self.gateway
            .run(&add_projection_command(&config.base, add, &self.tools))?;

        let toggles = config.visualization;
        if toggles.map_inspector {
            self.visualizer.open_map_inspector(&MapInspectorRequest {
                segment: config.base.segment.clone(),
                xy: config.base.xy.clone(),
                status: add.status_mi.clone(),
                addplot: Some(add.xy.clone()),
                sharable: toggles.map_inspector_sharable,
                working_dir: config.working_dir.clone(),
                rawcsv: None,
            });
        }
        if toggles.monitoring_scope {
            self.visualizer
                .open_monitoring_scope(&MonitoringScopeRequest {
                    base_xy: config.base.xy.clone(),
                    add_segment: add.segment.clone(),
                    add_xy: add.xy.clone(),
                    status: add.status_ms.clone(),
                    sharable: toggles.monitoring_scope_sharable,
                });
        }
        self.gateway.read_coordinates(&add.xy)
    }

    /// Filters an existing segment file in place.
    pub fn apply_filter(
        &self,
        options: &PipelineOptions,
        target: SegmentTarget,
    ) -> PipelineResult<()> {
        let plan = self.resolver().resolve_filter(options, target)?;
        self.run_filter(&plan)
    }

    fn run_filter(&self, plan: &FilterPlan) -> PipelineResult<()> {
        self.gateway.run(&filter_command(plan, &self.tools))?;
        self.gateway.replace(&plan.staged, &plan.segment)?;
        self.logger
            .record(&format!("filtered {} in place", plan.segment.display()));
        Ok(())
    }
}

fn base_map_request(config: &ResolvedConfig) -> MapInspectorRequest {
    MapInspectorRequest {
        segment: config.base.segment.clone(),
        xy: config.base.xy.clone(),
        status: config.base.status.clone(),
        addplot: None,
        sharable: config.visualization.map_inspector_sharable,
        working_dir: config.working_dir.clone(),
        rawcsv: config.single_rawdata().map(PathBuf::from),
    }
}
