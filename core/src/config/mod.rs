//! Option normalization: [`PipelineOptions`] in, [`ResolvedConfig`] out.

pub mod options;
pub mod resolved;
pub mod resolver;

pub use options::{PipelineOptions, WindowFunction};
pub use resolved::{
    log_path, AddOutputs, BaseOutputs, DataSettings, ExistingBasemap, FilterPlan, ResolvedConfig,
    SegmentTarget, SoundSettings, TableSettings, TypeWeightPlan, VisualizationToggles,
};
pub use resolver::{infer_data_type, Resolver};
