use crate::command::spec::{CommandSpec, ToolPaths};
use crate::config::{
    log_path, AddOutputs, BaseOutputs, DataSettings, FilterPlan, ResolvedConfig, SoundSettings,
    TableSettings, TypeWeightPlan,
};
use crate::prelude::SourceFormat;
use std::path::{Path, PathBuf};

/// `mkcsvseg -o <type_weight> <rawdata…>`; the segments themselves are discarded.
pub fn type_weight_command(plan: &TypeWeightPlan, tools: &ToolPaths) -> CommandSpec {
    let spec = CommandSpec::new(tools.table_segmenter.as_str())
        .arg("-o")
        .path_arg(&plan.type_weight);
    with_rawdata(spec, &plan.rawdata).stderr_to(&log_path(&plan.type_weight))
}

/// Segment extraction for the configured data type, writing rows to `output`.
pub fn segment_command(config: &ResolvedConfig, output: &Path, tools: &ToolPaths) -> CommandSpec {
    let spec = match &config.data {
        DataSettings::Table(table) => {
            table_flags(CommandSpec::new(tools.table_segmenter.as_str()), table)
        }
        DataSettings::Sound(sound) => sound_flags(
            CommandSpec::new(tools.sound_segmenter.as_str()),
            sound,
            config.source,
        ),
    };
    with_rawdata(spec, &config.rawdata)
        .stdout_to(output)
        .stderr_to(&log_path(output))
}

fn table_flags(spec: CommandSpec, table: &TableSettings) -> CommandSpec {
    spec.arg("-o")
        .path_arg(&table.type_weight)
        .flag("-ws", table.window_size)
        .flag("-rf", table.reduce_factor)
}

fn sound_flags(spec: CommandSpec, sound: &SoundSettings, source: SourceFormat) -> CommandSpec {
    let data_index = match source {
        SourceFormat::Csv => sound.data_index,
        SourceFormat::Wav => None,
    };
    spec.flag_opt("-di", data_index)
        .flag("-wl", sound.window_length)
        .flag("-sr", sound.sampling_rate)
        .flag_opt("-hp", sound.high_pass_filter)
        .flag_opt("-lp", sound.low_pass_filter)
        .flag_opt("-nm", sound.n_moving_average)
        .flag_opt("-wf", sound.window_function.map(|window| window.as_str()))
        .flag_opt("-ol", sound.segment_overlap_ratio)
}

fn with_rawdata(spec: CommandSpec, rawdata: &[PathBuf]) -> CommandSpec {
    rawdata.iter().fold(spec, |spec, path| spec.path_arg(path))
}

/// `toorpia -m base <segment>`, writing the base map coordinates.
pub fn base_projection_command(base: &BaseOutputs, tools: &ToolPaths) -> CommandSpec {
    CommandSpec::new(tools.projector.as_str())
        .arg("-m")
        .arg("base")
        .path_arg(&base.segment)
        .stdout_to(&base.xy)
        .stderr_to(&log_path(&base.xy))
}

/// `toorpia -m add <base_segment> <base_xy> <add_segment>`.
///
/// The projector reads its positionals as base-then-incremental, so the order
/// is fixed.
pub fn add_projection_command(
    base: &BaseOutputs,
    add: &AddOutputs,
    tools: &ToolPaths,
) -> CommandSpec {
    CommandSpec::new(tools.projector.as_str())
        .arg("-m")
        .arg("add")
        .path_arg(&base.segment)
        .path_arg(&base.xy)
        .path_arg(&add.segment)
        .stdout_to(&add.xy)
        .stderr_to(&log_path(&add.xy))
}

/// `filter -f <bands> --sr <rate> <segment>`, writing into the staging file.
pub fn filter_command(plan: &FilterPlan, tools: &ToolPaths) -> CommandSpec {
    CommandSpec::new(tools.filter.as_str())
        .flag("-f", &plan.multi_filter_option)
        .flag("--sr", plan.sampling_rate)
        .path_arg(&plan.segment)
        .stdout_to(&plan.staged)
        .stderr_to(&log_path(&plan.staged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{VisualizationToggles, WindowFunction};

    fn base_outputs() -> BaseOutputs {
        BaseOutputs {
            segment: PathBuf::from("analysis/segments.csv"),
            xy: PathBuf::from("analysis/xy.dat"),
            status: PathBuf::from("analysis/status.mi"),
        }
    }

    fn sound_config(source: SourceFormat, rawdata: &str) -> ResolvedConfig {
        ResolvedConfig {
            rawdata: vec![PathBuf::from(rawdata)],
            source,
            working_dir: PathBuf::from("analysis"),
            data: DataSettings::Sound(SoundSettings {
                data_index: Some(2),
                sampling_rate: 44_100,
                window_length: 4096,
                window_function: None,
                high_pass_filter: None,
                low_pass_filter: None,
                n_moving_average: None,
                segment_overlap_ratio: None,
                multi_filter_option: None,
            }),
            base: base_outputs(),
            add: None,
            visualization: VisualizationToggles::default(),
            notices: Vec::new(),
        }
    }

    #[test]
    fn table_extraction_uses_type_weight() {
        let mut config = sound_config(SourceFormat::Csv, "plant.csv");
        config.data = DataSettings::Table(TableSettings {
            type_weight: PathBuf::from("analysis/type_weight.csv"),
            window_size: 3,
            reduce_factor: 10,
        });
        let spec = segment_command(
            &config,
            Path::new("analysis/segments.csv"),
            &ToolPaths::default(),
        );
        assert_eq!(spec.program, "mkcsvseg");
        assert_eq!(
            spec.args,
            vec!["-o", "analysis/type_weight.csv", "-ws", "3", "-rf", "10", "plant.csv"]
        );
        assert_eq!(spec.stdout, Some(PathBuf::from("analysis/segments.csv")));
        assert_eq!(spec.stderr, Some(PathBuf::from("analysis/segments.csv.log")));
    }

    #[test]
    fn csv_sound_extraction_passes_data_index() {
        let config = sound_config(SourceFormat::Csv, "mic.csv");
        let spec = segment_command(&config, Path::new("out.csv"), &ToolPaths::default());
        assert_eq!(spec.program, "mkfftseg");
        assert_eq!(
            spec.args,
            vec!["-di", "2", "-wl", "4096", "-sr", "44100", "mic.csv"]
        );
    }

    #[test]
    fn wav_sound_extraction_never_passes_data_index() {
        let config = sound_config(SourceFormat::Wav, "mic.wav");
        let spec = segment_command(&config, Path::new("out.csv"), &ToolPaths::default());
        assert!(!spec.args.iter().any(|arg| arg == "-di"));
    }

    #[test]
    fn optional_sound_flags_follow_fixed_order() {
        let mut config = sound_config(SourceFormat::Wav, "mic.wav");
        if let DataSettings::Sound(sound) = &mut config.data {
            sound.high_pass_filter = Some(20.0);
            sound.low_pass_filter = Some(18_000.5);
            sound.n_moving_average = Some(197);
            sound.window_function = Some(WindowFunction::Hamming);
            sound.segment_overlap_ratio = Some(50);
        }
        let spec = segment_command(&config, Path::new("out.csv"), &ToolPaths::default());
        assert_eq!(
            spec.args,
            vec![
                "-wl", "4096", "-sr", "44100", "-hp", "20", "-lp", "18000.5", "-nm", "197", "-wf",
                "hamming", "-ol", "50", "mic.wav"
            ]
        );
    }

    #[test]
    fn add_projection_orders_base_before_increment() {
        let add = AddOutputs {
            segment: PathBuf::from("analysis/segments-add.csv"),
            xy: PathBuf::from("analysis/xy-add.dat"),
            status_mi: PathBuf::from("analysis/status-add.mi"),
            status_ms: PathBuf::from("analysis/status.ms"),
        };
        let spec = add_projection_command(&base_outputs(), &add, &ToolPaths::default());
        assert_eq!(
            spec.args,
            vec![
                "-m",
                "add",
                "analysis/segments.csv",
                "analysis/xy.dat",
                "analysis/segments-add.csv"
            ]
        );
        assert_eq!(spec.stdout, Some(PathBuf::from("analysis/xy-add.dat")));
    }

    #[test]
    fn base_projection_takes_single_segment_file() {
        let spec = base_projection_command(&base_outputs(), &ToolPaths::default());
        assert_eq!(spec.args, vec!["-m", "base", "analysis/segments.csv"]);
        assert_eq!(spec.stderr, Some(PathBuf::from("analysis/xy.dat.log")));
    }

    #[test]
    fn filter_writes_to_staging_file() {
        let plan = FilterPlan {
            segment: PathBuf::from("analysis/segments.csv"),
            staged: PathBuf::from("analysis/masked_segment.csv"),
            multi_filter_option: ":300,4000:5000".into(),
            sampling_rate: 48_000,
        };
        let spec = filter_command(&plan, &ToolPaths::default());
        assert_eq!(spec.program, "/usr/local/bin/filter");
        assert_eq!(
            spec.args,
            vec!["-f", ":300,4000:5000", "--sr", "48000", "analysis/segments.csv"]
        );
        assert_eq!(spec.stdout, Some(PathBuf::from("analysis/masked_segment.csv")));
    }

    #[test]
    fn type_weight_generation_discards_segments() {
        let plan = TypeWeightPlan {
            rawdata: vec![PathBuf::from("a.csv"), PathBuf::from("b.csv.gz")],
            working_dir: PathBuf::from("analysis"),
            type_weight: PathBuf::from("analysis/type_weight.csv"),
        };
        let spec = type_weight_command(&plan, &ToolPaths::default());
        assert_eq!(
            spec.args,
            vec!["-o", "analysis/type_weight.csv", "a.csv", "b.csv.gz"]
        );
        assert_eq!(spec.stdout, None);
        assert_eq!(spec.stderr, Some(PathBuf::from("analysis/type_weight.csv.log")));
    }
}
