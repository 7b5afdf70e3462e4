pub mod builder;
pub mod spec;

pub use builder::{
    add_projection_command, base_projection_command, filter_command, segment_command,
    type_weight_command,
};
pub use spec::{CommandSpec, ToolPaths};
