use crate::config::options::WindowFunction;
use crate::prelude::{RawDataType, SourceFormat};
use std::path::{Path, PathBuf};

pub const DEFAULT_WORKING_DIR: &str = "analysis";
pub const DEFAULT_DATA_INDEX: u32 = 1;
pub const DEFAULT_SAMPLING_RATE: u32 = 48_000;
pub const DEFAULT_WINDOW_LENGTH: u32 = 65_536;
pub const DEFAULT_WINDOW_SIZE: u32 = 1;
pub const DEFAULT_REDUCE_FACTOR: u32 = 1;

/// Settings for table-mode segment extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSettings {
    pub type_weight: PathBuf,
    pub window_size: u32,
    pub reduce_factor: u32,
}

/// Settings for sound-mode segment extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundSettings {
    /// Column to read; only meaningful for CSV-sourced sound data.
    pub data_index: Option<u32>,
    pub sampling_rate: u32,
    pub window_length: u32,
    pub window_function: Option<WindowFunction>,
    pub high_pass_filter: Option<f64>,
    pub low_pass_filter: Option<f64>,
    pub n_moving_average: Option<u32>,
    pub segment_overlap_ratio: Option<u32>,
    pub multi_filter_option: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSettings {
    Table(TableSettings),
    Sound(SoundSettings),
}

impl DataSettings {
    pub fn data_type(&self) -> RawDataType {
        match self {
            Self::Table(_) => RawDataType::Table,
            Self::Sound(_) => RawDataType::Sound,
        }
    }

    pub fn as_sound(&self) -> Option<&SoundSettings> {
        match self {
            Self::Sound(sound) => Some(sound),
            Self::Table(_) => None,
        }
    }
}

/// Files produced by a base map run.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseOutputs {
    pub segment: PathBuf,
    pub xy: PathBuf,
    pub status: PathBuf,
}

/// Files produced by an add-plot run.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOutputs {
    pub segment: PathBuf,
    pub xy: PathBuf,
    pub status_mi: PathBuf,
    pub status_ms: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisualizationToggles {
    pub map_inspector: bool,
    pub map_inspector_sharable: bool,
    pub monitoring_scope: bool,
    pub monitoring_scope_sharable: bool,
}

/// Fully specified configuration for one segment-extraction pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub rawdata: Vec<PathBuf>,
    pub source: SourceFormat,
    pub working_dir: PathBuf,
    pub data: DataSettings,
    pub base: BaseOutputs,
    /// Present only for add-plot runs.
    pub add: Option<AddOutputs>,
    pub visualization: VisualizationToggles,
    /// Informational notices raised while defaulting options.
    pub notices: Vec<String>,
}

impl ResolvedConfig {
    pub fn data_type(&self) -> RawDataType {
        self.data.data_type()
    }

    /// The single raw CSV handed to the map inspector, if exactly one file was given.
    pub fn single_rawdata(&self) -> Option<&Path> {
        single(&self.rawdata)
    }
}

fn single(rawdata: &[PathBuf]) -> Option<&Path> {
    match rawdata {
        [only] => Some(only.as_path()),
        _ => None,
    }
}

/// Inputs for generating a type weight file.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeWeightPlan {
    pub rawdata: Vec<PathBuf>,
    pub working_dir: PathBuf,
    pub type_weight: PathBuf,
}

/// An existing base map, reopened without running any tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingBasemap {
    pub rawdata: Vec<PathBuf>,
    pub working_dir: PathBuf,
    pub base: BaseOutputs,
    pub visualization: VisualizationToggles,
}

impl ExistingBasemap {
    pub fn single_rawdata(&self) -> Option<&Path> {
        single(&self.rawdata)
    }
}

/// Which segment file a filter or extraction step targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentTarget {
    Base,
    Add,
}

pub const MASKED_SEGMENT_NAME: &str = "masked_segment.csv";

/// In-place multi-band filtering of one segment file.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPlan {
    pub segment: PathBuf,
    /// Where the filtered rows are written before replacing `segment`.
    pub staged: PathBuf,
    pub multi_filter_option: String,
    pub sampling_rate: u32,
}

impl FilterPlan {
    /// Filter step for `target`, if the configuration asks for one.
    pub fn for_config(config: &ResolvedConfig, target: SegmentTarget) -> Option<Self> {
        let sound = config.data.as_sound()?;
        let multi_filter_option = sound.multi_filter_option.clone()?;
        let segment = match target {
            SegmentTarget::Base => config.base.segment.clone(),
            SegmentTarget::Add => config.add.as_ref()?.segment.clone(),
        };
        Some(Self {
            segment,
            staged: config.working_dir.join(MASKED_SEGMENT_NAME),
            multi_filter_option,
            sampling_rate: sound.sampling_rate,
        })
    }
}

/// Log companion holding the stderr of the command that writes `output`.
pub fn log_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".log");
    PathBuf::from(name)
}
