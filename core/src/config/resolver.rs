use crate::config::options::PipelineOptions;
use crate::config::resolved::{
    AddOutputs, BaseOutputs, DataSettings, ExistingBasemap, FilterPlan, ResolvedConfig,
    SegmentTarget, SoundSettings, TableSettings, TypeWeightPlan, VisualizationToggles,
    DEFAULT_DATA_INDEX, DEFAULT_REDUCE_FACTOR, DEFAULT_SAMPLING_RATE, DEFAULT_WINDOW_LENGTH,
    DEFAULT_WINDOW_SIZE, DEFAULT_WORKING_DIR, MASKED_SEGMENT_NAME,
};
use crate::gateway::{require_readable, Access, Workspace};
use crate::prelude::{PipelineError, PipelineResult, RawDataType, SourceFormat};
use crate::telemetry::LogManager;
use std::path::{Path, PathBuf};

/// Decides the data type of the raw data from its extension and the options.
///
/// WAV input is always sound. CSV input honours an explicit `rawdata_type`;
/// otherwise a `type_weight` selects table and any of `data_index`,
/// `sampling_rate` or `window_length` selects sound. Anything else is
/// ambiguous.
pub fn infer_data_type(options: &PipelineOptions) -> PipelineResult<(SourceFormat, RawDataType)> {
    let first = options
        .rawdata
        .first()
        .ok_or_else(|| PipelineError::InvalidConfig("rawdata is not specified".into()))?;
    let source =
        SourceFormat::detect(first).ok_or_else(|| PipelineError::UnrecognizedType(first.clone()))?;
    if let Some(other) = options
        .rawdata
        .iter()
        .skip(1)
        .find(|path| SourceFormat::detect(path) != Some(source))
    {
        return Err(PipelineError::InvalidConfig(format!(
            "rawdata files must share one format: {} does not match {}",
            other.display(),
            first.display()
        )));
    }

    let explicit = options
        .rawdata_type
        .as_deref()
        .filter(|value| !value.is_empty())
        .map(RawDataType::parse)
        .transpose()?;

    let data_type = match source {
        SourceFormat::Wav => {
            if explicit == Some(RawDataType::Table) {
                return Err(PipelineError::InvalidConfig(format!(
                    "wav data cannot be processed as table: {}",
                    first.display()
                )));
            }
            RawDataType::Sound
        }
        SourceFormat::Csv => match explicit {
            Some(data_type) => data_type,
            None if options.type_weight.is_some() => RawDataType::Table,
            None if options.has_sound_hint() => RawDataType::Sound,
            None => return Err(PipelineError::AmbiguousType(first.clone())),
        },
    };
    Ok((source, data_type))
}

/// Normalizes [`PipelineOptions`] into fully specified configurations.
///
/// Every check runs against the supplied [`Workspace`], so the same options
/// resolve identically against a local directory or a remote container.
pub struct Resolver<'a, W: Workspace + ?Sized> {
    workspace: &'a W,
    logger: LogManager,
}

struct Common {
    rawdata: Vec<PathBuf>,
    source: SourceFormat,
    working_dir: PathBuf,
    data: DataSettings,
    notices: Vec<String>,
}

impl<'a, W: Workspace + ?Sized> Resolver<'a, W> {
    pub fn new(workspace: &'a W) -> Self {
        Self {
            workspace,
            logger: LogManager::new(),
        }
    }

    /// Inputs for `create_type_weight`. The data must resolve to table.
    pub fn resolve_type_weight(&self, options: &PipelineOptions) -> PipelineResult<TypeWeightPlan> {
        self.check_rawdata(options)?;
        let working_dir = self.resolve_working_dir(options)?;
        let type_weight = options
            .type_weight
            .clone()
            .unwrap_or_else(|| working_dir.join("type_weight.csv"));

        let with_weight = PipelineOptions {
            type_weight: Some(type_weight.clone()),
            ..options.clone()
        };
        let (_, data_type) = infer_data_type(&with_weight)?;
        if data_type == RawDataType::Sound {
            return Err(PipelineError::InvalidConfig(
                "rawdata_type is sound, so type_weight is not needed".into(),
            ));
        }
        self.ensure_parent(&type_weight)?;

        Ok(TypeWeightPlan {
            rawdata: options.rawdata.clone(),
            working_dir,
            type_weight,
        })
    }

    pub fn resolve_basemap(&self, options: &PipelineOptions) -> PipelineResult<ResolvedConfig> {
        let common = self.resolve_common(options)?;
        let base = base_outputs(options, &common.working_dir);
        for path in [&base.segment, &base.xy, &base.status] {
            self.ensure_parent(path)?;
        }
        Ok(assemble(options, common, base, None))
    }

    /// Like [`Self::resolve_basemap`], but the base map must already exist.
    pub fn resolve_addplot(&self, options: &PipelineOptions) -> PipelineResult<ResolvedConfig> {
        if options.working_dir.is_none() {
            return Err(PipelineError::InvalidConfig(
                "working_dir must be specified to add plots to a base map".into(),
            ));
        }
        let common = self.resolve_common(options)?;
        let base = self.check_basemap(options, &common.working_dir)?;
        let add = add_outputs(options, &common.working_dir);
        for path in [&add.segment, &add.xy, &add.status_mi, &add.status_ms] {
            self.ensure_parent(path)?;
        }
        Ok(assemble(options, common, base, Some(add)))
    }

    /// Locates an existing base map without touching the raw data.
    pub fn resolve_existing_basemap(
        &self,
        options: &PipelineOptions,
    ) -> PipelineResult<ExistingBasemap> {
        let working_dir = options.working_dir.clone().ok_or_else(|| {
            PipelineError::InvalidConfig("working_dir is not specified".into())
        })?;
        let base = self.check_basemap(options, &working_dir)?;
        Ok(ExistingBasemap {
            rawdata: options.rawdata.clone(),
            working_dir,
            base,
            visualization: visualization(options),
        })
    }

    /// Inputs for filtering an existing segment file in place.
    pub fn resolve_filter(
        &self,
        options: &PipelineOptions,
        target: SegmentTarget,
    ) -> PipelineResult<FilterPlan> {
        let common = self.resolve_common(options)?;
        let DataSettings::Sound(sound) = &common.data else {
            return Err(PipelineError::InvalidConfig(
                "filter cannot apply to table type data".into(),
            ));
        };
        let multi_filter_option = sound.multi_filter_option.clone().ok_or_else(|| {
            PipelineError::InvalidConfig("multi_filter_option is required for filtering".into())
        })?;
        let segment = match target {
            SegmentTarget::Base => base_outputs(options, &common.working_dir).segment,
            SegmentTarget::Add => add_outputs(options, &common.working_dir).segment,
        };
        if !self.workspace.probe(&segment, Access::Exists)? {
            return Err(PipelineError::MissingPrecondition(format!(
                "segment file {} does not exist; create it before filtering",
                segment.display()
            )));
        }
        Ok(FilterPlan {
            segment,
            staged: common.working_dir.join(MASKED_SEGMENT_NAME),
            multi_filter_option,
            sampling_rate: sound.sampling_rate,
        })
    }

    fn resolve_common(&self, options: &PipelineOptions) -> PipelineResult<Common> {
        self.check_rawdata(options)?;
        let (source, data_type) = infer_data_type(options)?;
        let working_dir = self.resolve_working_dir(options)?;
        let mut notices = Vec::new();
        let data = match data_type {
            RawDataType::Table => DataSettings::Table(self.table_settings(options)?),
            RawDataType::Sound => {
                DataSettings::Sound(self.sound_settings(options, source, &mut notices))
            }
        };
        Ok(Common {
            rawdata: options.rawdata.clone(),
            source,
            working_dir,
            data,
            notices,
        })
    }

    fn check_rawdata(&self, options: &PipelineOptions) -> PipelineResult<()> {
        if options.rawdata.is_empty() {
            return Err(PipelineError::InvalidConfig("rawdata is not specified".into()));
        }
        for path in &options.rawdata {
            require_readable(self.workspace, path)?;
        }
        Ok(())
    }

    fn resolve_working_dir(&self, options: &PipelineOptions) -> PipelineResult<PathBuf> {
        let working_dir = options
            .working_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKING_DIR));
        self.workspace.ensure_dir(&working_dir)?;
        if !self.workspace.probe(&working_dir, Access::Write)? {
            return Err(PipelineError::PermissionDenied {
                path: working_dir,
                reason: "directory not writable",
            });
        }
        Ok(working_dir)
    }

    fn table_settings(&self, options: &PipelineOptions) -> PipelineResult<TableSettings> {
        let type_weight = options.type_weight.clone().ok_or_else(|| {
            PipelineError::MissingPrecondition(
                "type_weight is not specified; run create_type_weight first".into(),
            )
        })?;
        if !self.workspace.probe(&type_weight, Access::Exists)? {
            return Err(PipelineError::NotFound(type_weight));
        }
        if options.has_sound_hint() {
            self.logger
                .warn("data_index, sampling_rate and window_length are ignored for table data");
        }
        Ok(TableSettings {
            type_weight,
            window_size: options.window_size.unwrap_or(DEFAULT_WINDOW_SIZE),
            reduce_factor: options.reduce_factor.unwrap_or(DEFAULT_REDUCE_FACTOR),
        })
    }

    fn sound_settings(
        &self,
        options: &PipelineOptions,
        source: SourceFormat,
        notices: &mut Vec<String>,
    ) -> SoundSettings {
        let data_index = match source {
            SourceFormat::Csv => Some(options.data_index.unwrap_or_else(|| {
                self.notify(
                    notices,
                    format!("data_index is not specified, so set it to {DEFAULT_DATA_INDEX} (default)"),
                );
                DEFAULT_DATA_INDEX
            })),
            SourceFormat::Wav => {
                if options.data_index.is_some() {
                    let message = "data_index is not applicable to wav data, so it is dropped";
                    self.logger.warn(message);
                    notices.push(message.to_string());
                }
                None
            }
        };
        let sampling_rate = options.sampling_rate.unwrap_or_else(|| {
            self.notify(
                notices,
                format!("sampling_rate is not specified, so set it to {DEFAULT_SAMPLING_RATE} Hz (default)"),
            );
            DEFAULT_SAMPLING_RATE
        });
        let window_length = options.window_length.unwrap_or_else(|| {
            self.notify(
                notices,
                format!("window_length is not specified, so set it to {DEFAULT_WINDOW_LENGTH} (default)"),
            );
            DEFAULT_WINDOW_LENGTH
        });

        SoundSettings {
            data_index,
            sampling_rate,
            window_length,
            window_function: options.window_function,
            high_pass_filter: options.high_pass_filter,
            low_pass_filter: options.low_pass_filter,
            n_moving_average: options.n_moving_average,
            segment_overlap_ratio: options.segment_overlap_ratio,
            multi_filter_option: options
                .multi_filter_option
                .clone()
                .filter(|bands| !bands.trim().is_empty()),
        }
    }

    fn notify(&self, notices: &mut Vec<String>, message: String) {
        self.logger.record(&message);
        notices.push(message);
    }

    fn check_basemap(
        &self,
        options: &PipelineOptions,
        working_dir: &Path,
    ) -> PipelineResult<BaseOutputs> {
        if !self.workspace.probe(working_dir, Access::Read)? {
            return Err(PipelineError::PermissionDenied {
                path: working_dir.to_path_buf(),
                reason: "directory not readable",
            });
        }
        let base = base_outputs(options, working_dir);
        require_readable(self.workspace, &base.segment)?;
        require_readable(self.workspace, &base.xy)?;
        Ok(base)
    }

    fn ensure_parent(&self, path: &Path) -> PipelineResult<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.workspace.ensure_dir(parent),
            _ => Ok(()),
        }
    }
}

fn base_outputs(options: &PipelineOptions, working_dir: &Path) -> BaseOutputs {
    let or_default = |value: &Option<PathBuf>, name: &str| {
        value.clone().unwrap_or_else(|| working_dir.join(name))
    };
    BaseOutputs {
        segment: or_default(&options.base_segment, "segments.csv"),
        xy: or_default(&options.base_xy, "xy.dat"),
        status: or_default(&options.status_mi, "status.mi"),
    }
}

fn add_outputs(options: &PipelineOptions, working_dir: &Path) -> AddOutputs {
    let or_default = |value: &Option<PathBuf>, name: &str| {
        value.clone().unwrap_or_else(|| working_dir.join(name))
    };
    AddOutputs {
        segment: or_default(&options.add_segment, "segments-add.csv"),
        xy: or_default(&options.add_xy, "xy-add.dat"),
        status_mi: or_default(&options.add_status_mi, "status-add.mi"),
        status_ms: or_default(&options.status_ms, "status.ms"),
    }
}

fn visualization(options: &PipelineOptions) -> VisualizationToggles {
    VisualizationToggles {
        map_inspector: options.map_inspector.unwrap_or(true),
        map_inspector_sharable: options.map_inspector_sharable.unwrap_or(false),
        monitoring_scope: options.monitoring_scope.unwrap_or(false),
        monitoring_scope_sharable: options.monitoring_scope_sharable.unwrap_or(false),
    }
}

fn assemble(
    options: &PipelineOptions,
    common: Common,
    base: BaseOutputs,
    add: Option<AddOutputs>,
) -> ResolvedConfig {
    ResolvedConfig {
        rawdata: common.rawdata,
        source: common.source,
        working_dir: common.working_dir,
        data: common.data,
        base,
        add,
        visualization: visualization(options),
        notices: common.notices,
    }
}
