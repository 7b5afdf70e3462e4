use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use piacore::config::WindowFunction;
use piacore::{PipelineOptions, SegmentTarget};
use serde_json::json;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::runner::{Operation, Outcome, Runner, WorkflowResult};

mod launcher;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "toorPIA analysis pipeline driver")]
struct Args {
    /// Load options, tools, launchers and remote settings from YAML
    #[arg(long, global = true)]
    workflow: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(flatten)]
    overrides: OptionOverrides,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate type_weight.csv for table data
    TypeWeight,
    /// Extract base segments and project them into a base map
    Basemap,
    /// Reopen an existing base map
    OpenBasemap,
    /// Project new data onto an existing base map
    Addplot,
    /// Filter an existing segment file in place
    Filter {
        #[arg(long, value_enum, default_value_t = Target::Base)]
        target: Target,
    },
    /// Print the parameter reference
    Params,
}

#[derive(Clone, Copy, ValueEnum)]
enum Target {
    Base,
    Add,
}

/// Per-option overrides layered over the workflow file.
#[derive(ClapArgs)]
struct OptionOverrides {
    #[arg(long, global = true, num_args = 1..)]
    rawdata: Vec<PathBuf>,
    #[arg(long, global = true)]
    rawdata_type: Option<String>,
    #[arg(long, global = true)]
    data_index: Option<u32>,
    #[arg(long, global = true)]
    sampling_rate: Option<u32>,
    #[arg(long, global = true)]
    window_length: Option<u32>,
    #[arg(long, global = true, value_parser = parse_window_function)]
    window_function: Option<WindowFunction>,
    #[arg(long, global = true)]
    high_pass_filter: Option<f64>,
    #[arg(long, global = true)]
    low_pass_filter: Option<f64>,
    #[arg(long, global = true)]
    n_moving_average: Option<u32>,
    #[arg(long, global = true)]
    segment_overlap_ratio: Option<u32>,
    #[arg(long, global = true)]
    multi_filter_option: Option<String>,
    #[arg(long, global = true)]
    type_weight: Option<PathBuf>,
    #[arg(long, global = true)]
    window_size: Option<u32>,
    #[arg(long, global = true)]
    reduce_factor: Option<u32>,
    #[arg(long, global = true)]
    working_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    base_segment: Option<PathBuf>,
    #[arg(long, global = true)]
    base_xy: Option<PathBuf>,
    #[arg(long, global = true)]
    status_mi: Option<PathBuf>,
    #[arg(long, global = true)]
    add_segment: Option<PathBuf>,
    #[arg(long, global = true)]
    add_xy: Option<PathBuf>,
    #[arg(long, global = true)]
    add_status_mi: Option<PathBuf>,
    #[arg(long, global = true)]
    status_ms: Option<PathBuf>,
    /// Do not open the map inspector
    #[arg(long, global = true, default_value_t = false)]
    no_map_inspector: bool,
    #[arg(long, global = true, default_value_t = false)]
    map_inspector_sharable: bool,
    /// Open the monitoring scope after an add-plot
    #[arg(long, global = true, default_value_t = false)]
    monitoring_scope: bool,
    #[arg(long, global = true, default_value_t = false)]
    monitoring_scope_sharable: bool,
}

impl OptionOverrides {
    fn into_options(self) -> PipelineOptions {
        PipelineOptions {
            rawdata: self.rawdata,
            rawdata_type: self.rawdata_type,
            data_index: self.data_index,
            sampling_rate: self.sampling_rate,
            window_length: self.window_length,
            window_function: self.window_function,
            high_pass_filter: self.high_pass_filter,
            low_pass_filter: self.low_pass_filter,
            n_moving_average: self.n_moving_average,
            segment_overlap_ratio: self.segment_overlap_ratio,
            multi_filter_option: self.multi_filter_option,
            type_weight: self.type_weight,
            window_size: self.window_size,
            reduce_factor: self.reduce_factor,
            working_dir: self.working_dir,
            base_segment: self.base_segment,
            base_xy: self.base_xy,
            status_mi: self.status_mi,
            add_segment: self.add_segment,
            add_xy: self.add_xy,
            add_status_mi: self.add_status_mi,
            status_ms: self.status_ms,
            map_inspector: self.no_map_inspector.then_some(false),
            map_inspector_sharable: self.map_inspector_sharable.then_some(true),
            monitoring_scope: self.monitoring_scope.then_some(true),
            monitoring_scope_sharable: self.monitoring_scope_sharable.then_some(true),
        }
    }
}

fn parse_window_function(value: &str) -> Result<WindowFunction, String> {
    match value {
        "hanning" => Ok(WindowFunction::Hanning),
        "hamming" => Ok(WindowFunction::Hamming),
        other => Err(format!("unknown window function `{other}` (hanning or hamming)")),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let operation = match args.command {
        Command::TypeWeight => Operation::TypeWeight,
        Command::Basemap => Operation::Basemap,
        Command::OpenBasemap => Operation::OpenBasemap,
        Command::Addplot => Operation::Addplot,
        Command::Filter { target } => Operation::Filter(match target {
            Target::Base => SegmentTarget::Base,
            Target::Add => SegmentTarget::Add,
        }),
        Command::Params => {
            print!("{}", PipelineOptions::describe());
            return Ok(());
        }
    };

    let workflow_config = match &args.workflow {
        Some(path) => WorkflowConfig::load(path)?,
        None => WorkflowConfig::default(),
    }
    .with_overrides(args.overrides.into_options());

    let runner = Runner::new(workflow_config);
    let result = runner.execute(operation)?;
    report(&result, args.json)
}

fn report(result: &WorkflowResult, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        let value = match &result.outcome {
            Outcome::TypeWeight(path) => json!({ "type_weight": path }),
            Outcome::Coordinates(coords) => json!({ "x": coords.x, "y": coords.y }),
            Outcome::Filtered => json!({ "status": "filtered" }),
        };
        let text = serde_json::to_string_pretty(&value).context("encoding result as JSON")?;
        println!("{text}");
        return Ok(());
    }

    match &result.outcome {
        Outcome::TypeWeight(path) => println!(
            "Type weight written to {}; edit and save it before creating a base map.",
            path.display()
        ),
        Outcome::Coordinates(coords) => {
            println!("{} points", coords.len());
            for (x, y) in coords.pairs().take(5) {
                println!("  {x} {y}");
            }
        }
        Outcome::Filtered => println!("Segment file filtered."),
    }
    println!(
        "commands run: {}, failed: {}",
        result.metrics.commands, result.metrics.failures
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_parse_into_options() {
        let args = Args::try_parse_from([
            "pia",
            "--rawdata",
            "a.wav",
            "b.wav",
            "--window-function",
            "hamming",
            "--no-map-inspector",
            "basemap",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::Basemap));
        let options = args.overrides.into_options();
        assert_eq!(options.rawdata.len(), 2);
        assert_eq!(options.window_function, Some(WindowFunction::Hamming));
        assert_eq!(options.map_inspector, Some(false));
        assert_eq!(options.monitoring_scope, None);
    }

    #[test]
    fn filter_target_defaults_to_base() {
        let args = Args::try_parse_from(["pia", "filter"]).unwrap();
        assert!(matches!(args.command, Command::Filter { target: Target::Base }));
        let args = Args::try_parse_from(["pia", "filter", "--target", "add"]).unwrap();
        assert!(matches!(args.command, Command::Filter { target: Target::Add }));
    }

    #[test]
    fn unknown_window_function_is_rejected() {
        assert!(Args::try_parse_from(["pia", "--window-function", "blackman", "basemap"]).is_err());
    }
}
