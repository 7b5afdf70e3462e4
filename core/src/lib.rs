//! Core of the toorPIA analysis orchestrator.
//!
//! Options are resolved into complete configurations, turned into structured
//! tool invocations, executed through a local or remote gateway, and the
//! resulting coordinate files are read back into memory.

pub mod command;
pub mod config;
pub mod gateway;
pub mod materializer;
pub mod pipeline;
pub mod prelude;
pub mod telemetry;

pub use config::{PipelineOptions, ResolvedConfig, SegmentTarget};
pub use gateway::{ExecutionGateway, LocalGateway, RemoteGateway};
pub use materializer::Coordinates;
pub use pipeline::Pipeline;
pub use prelude::{PipelineError, PipelineResult, RawDataType};
